//! One ingestion worker: an accept loop and the pool it owns

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant, sleep};
use tracing::{debug, error, info, warn};

use super::session::Session;
use crate::config::PoolConfig;
use crate::constants::timeout::SHUTDOWN_GRACE;
use crate::counters::ServerCounters;
use crate::network::tune_client_stream;
use crate::pool::{Connector, ResourcePool};
use crate::store::InsertTarget;

pub(super) struct Worker<C: Connector> {
    index: usize,
    pool: ResourcePool<C>,
    counters: ServerCounters,
}

impl<C: Connector> Worker<C> {
    pub(super) fn new(
        index: usize,
        connector: C,
        pool_config: PoolConfig,
        target: InsertTarget,
        counters: ServerCounters,
    ) -> Self {
        Self {
            index,
            pool: ResourcePool::new(connector, pool_config, target),
            counters,
        }
    }

    /// Accept clients until shutdown, then drain sessions and close the pool
    ///
    /// Must run inside the worker's runtime.
    pub(super) async fn run(
        self,
        listener: std::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let listener = TcpListener::from_std(listener)
            .with_context(|| format!("Worker {} failed to register listener", self.index))?;
        self.pool.init();
        info!(worker = self.index, pool = %self.pool.name(), "Worker accepting clients");

        let session_shutdown = shutdown.clone();
        let mut sessions = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.wait_for(|&stop| stop) => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tune_client_stream(&stream);
                        let session = Session::new(peer, self.pool.clone(), self.counters.clone());
                        let shutdown = session_shutdown.clone();
                        sessions.spawn(async move {
                            if let Err(e) = session.run(stream, shutdown).await {
                                debug!(client = %peer, error = %e, "Session ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(worker = self.index, error = %e, "Failed to accept client");
                    }
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        error!(worker = self.index, error = %e, "Session task failed");
                    }
                }
            }
        }

        info!(worker = self.index, sessions = sessions.len(), "Worker shutting down");
        drop(listener);
        self.drain(sessions).await;
        self.pool.close().await;
        info!(worker = self.index, "Worker stopped");
        Ok(())
    }

    /// Wait for sessions and in-flight writes, bounded by the shutdown grace
    async fn drain(&self, mut sessions: JoinSet<()>) {
        let deadline = Instant::now() + SHUTDOWN_GRACE;

        while !sessions.is_empty() {
            match tokio::time::timeout_at(deadline, sessions.join_next()).await {
                Ok(_) => {}
                Err(_) => {
                    warn!(worker = self.index, remaining = sessions.len(), "Aborting sessions after grace period");
                    sessions.abort_all();
                    break;
                }
            }
        }

        while self.pool.query_stats().in_flight() > 0 && Instant::now() < deadline {
            sleep(Duration::from_millis(20)).await;
        }
        let in_flight = self.pool.query_stats().in_flight();
        if in_flight > 0 {
            warn!(worker = self.index, in_flight, "Writes still pending at shutdown");
        }
    }
}
