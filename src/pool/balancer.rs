//! Background idle balancer
//!
//! Periodically retires handles that sat idle longer than `max_idle_time`,
//! never going below `min_active` live handles and never touching handles
//! on loan. The task holds only a weak reference so it never keeps a
//! dropped pool alive.

use std::sync::Weak;
use tokio::sync::broadcast;
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

use super::connector::Connector;
use super::resource_pool::PoolInner;

pub(super) fn spawn<C: Connector>(
    pool: Weak<PoolInner<C>>,
    interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
    name: String,
) {
    tokio::spawn(run(pool, interval, shutdown_rx, name));
}

async fn run<C: Connector>(
    pool: Weak<PoolInner<C>>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    name: String,
) {
    info!(
        pool = %name,
        interval_secs = interval.as_secs_f64(),
        "Starting idle balancer"
    );

    loop {
        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown_rx.recv() => break,
        }

        let Some(inner) = pool.upgrade() else {
            break;
        };
        if inner.is_closed() {
            break;
        }

        let retired = inner.balance_idle();
        if retired > 0 {
            debug!(
                pool = %name,
                retired,
                idle = inner.idle.len(),
                "Retired idle connections"
            );
        }
    }

    info!(pool = %name, "Idle balancer stopped");
}
