//! Connection pool prewarming
//!
//! Opens up to `min_active` handles concurrently right after `init`, so the
//! first records do not pay the connect cost. Failures are logged and the
//! remaining slots are still attempted.

use std::sync::Arc;
use tracing::{Level, debug, error, info, warn};

use super::connector::Connector;
use super::resource_pool::PoolInner;

/// Open and enqueue one handle, returning whether it landed in the queue
async fn prewarm_one<C: Connector>(pool: Arc<PoolInner<C>>, slot: usize) -> bool {
    if pool.is_closed() || !pool.try_reserve() {
        return false;
    }

    match pool.create_handle().await {
        Ok(handle) => match pool.idle.push(handle) {
            Ok(()) => {
                debug!(pool = %pool.connector.name(), slot, "Prewarmed connection");
                true
            }
            Err(handle) => {
                pool.discard(handle);
                false
            }
        },
        Err(e) => {
            if e.log_level() == Level::ERROR {
                error!(pool = %pool.connector.name(), slot, error = %e, "Failed to create connection while prewarming");
            } else {
                warn!(pool = %pool.connector.name(), slot, error = %e, "Failed to create connection while prewarming");
            }
            false
        }
    }
}

/// Prewarm `pool` up to its `min_active` floor
pub(super) async fn prewarm<C: Connector>(pool: Arc<PoolInner<C>>) -> usize {
    let target = pool.config.min_active;
    if target == 0 {
        return 0;
    }

    let tasks: Vec<_> = (0..target)
        .map(|slot| tokio::spawn(prewarm_one(Arc::clone(&pool), slot)))
        .collect();

    let mut created = 0;
    for task in tasks {
        if let Ok(true) = task.await {
            created += 1;
        }
    }

    info!(
        pool = %pool.connector.name(),
        created,
        target,
        "Pool prewarming complete"
    );
    created
}
