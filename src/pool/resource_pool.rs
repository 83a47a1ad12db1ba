//! Bounded pool of storage handles
//!
//! The pool keeps at most `max_active` live handles. Idle handles wait in a
//! FIFO queue; a borrower takes the oldest idle handle, creates a new one
//! while below the ceiling, or waits up to `max_wait_time` for a return.
//! A background balancer retires handles idle longer than `max_idle_time`
//! while more than `min_active` are live.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{Level, debug, error, info, warn};

use super::balancer;
use super::connector::Connector;
use super::error::PoolError;
use super::handle::Handle;
use super::idle_queue::{IdleQueue, PopError};
use super::prewarming;
use super::stats::{QueryStats, QueryStatsSnapshot};
use crate::config::PoolConfig;
use crate::record::IngestionRecord;
use crate::store::InsertTarget;

/// Cloneable handle to one pool; clones share the same state
pub struct ResourcePool<C: Connector> {
    inner: Arc<PoolInner<C>>,
}

pub(super) struct PoolInner<C: Connector> {
    pub(super) connector: Arc<C>,
    pub(super) config: PoolConfig,
    target: InsertTarget,
    pub(super) idle: IdleQueue<Handle<C::Connection>>,
    live: AtomicUsize,
    initialized: AtomicBool,
    closed: AtomicBool,
    stats: QueryStats,
    shutdown_tx: broadcast::Sender<()>,
}

impl<C: Connector> Clone for ResourcePool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> std::fmt::Debug for ResourcePool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("connector", &self.inner.connector)
            .field("live", &self.connection_count())
            .field("idle", &self.idle_count())
            .field("max_active", &self.inner.config.max_active)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<C: Connector> ResourcePool<C> {
    /// Create an empty pool; nothing is opened until [`init`](Self::init)
    pub fn new(connector: C, config: PoolConfig, target: InsertTarget) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(PoolInner {
                connector: Arc::new(connector),
                idle: IdleQueue::new(config.max_active.get()),
                config,
                target,
                live: AtomicUsize::new(0),
                initialized: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                stats: QueryStats::default(),
                shutdown_tx,
            }),
        }
    }

    /// Name of the underlying connector, used in logs
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.connector.name()
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.inner.connector
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Start the balancer and prewarm up to `min_active` handles
    ///
    /// Returns `false` if the pool was already initialized.
    pub fn init(&self) -> bool {
        if self
            .inner
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        balancer::spawn(
            Arc::downgrade(&self.inner),
            self.inner.config.balance_interval(),
            self.inner.shutdown_tx.subscribe(),
            self.name().to_string(),
        );
        tokio::spawn(prewarming::prewarm(Arc::clone(&self.inner)));

        info!(
            pool = %self.name(),
            min_active = self.inner.config.min_active,
            max_active = %self.inner.config.max_active,
            "Connection pool initialized"
        );
        true
    }

    /// Take a handle out of the pool
    ///
    /// # Errors
    ///
    /// - [`PoolError::NotInitialized`] before `init`, [`PoolError::Closed`] after `close`
    /// - [`PoolError::BorrowTimeout`] when the pool stays exhausted for `max_wait_time`
    /// - [`PoolError::Connect`] when a new handle cannot be opened
    pub async fn borrow(&self) -> Result<Handle<C::Connection>, PoolError> {
        let inner = &self.inner;
        inner.ensure_open()?;

        loop {
            let handle = if let Some(handle) = inner.idle.try_pop() {
                handle
            } else if inner.try_reserve() {
                return inner.create_handle().await;
            } else {
                let timeout = inner.config.max_wait_time;
                match inner.idle.pop(timeout).await {
                    Ok(handle) => handle,
                    Err(PopError::Timeout) => {
                        return Err(PoolError::BorrowTimeout {
                            timeout,
                            idle: inner.idle.len(),
                            live: inner.live.load(Ordering::Acquire),
                        });
                    }
                    Err(PopError::Closed) => return Err(PoolError::Closed),
                }
            };

            if inner.closed.load(Ordering::Acquire) {
                inner.discard(handle);
                return Err(PoolError::Closed);
            }

            if let Some(handle) = inner.check_out(handle).await {
                return Ok(handle);
            }

            // The stale handle freed its slot; replace it unless a
            // concurrent borrower took the slot first.
            if inner.try_reserve() {
                return inner.create_handle().await;
            }
        }
    }

    /// Give a borrowed handle back
    ///
    /// Returns `Ok(false)` when the handle was discarded instead of queued
    /// (pool closed or queue full).
    ///
    /// # Errors
    ///
    /// [`PoolError::ForeignHandle`] if the handle came from another connector,
    /// [`PoolError::NotInitialized`] before `init`.
    pub fn return_handle(&self, mut handle: Handle<C::Connection>) -> Result<bool, PoolError> {
        let inner = &self.inner;
        if !inner.connector.validate(handle.connection()) {
            return Err(PoolError::ForeignHandle);
        }
        if !inner.initialized.load(Ordering::Acquire) {
            return Err(PoolError::NotInitialized);
        }
        if inner.closed.load(Ordering::Acquire) || inner.idle.is_full() {
            inner.discard(handle);
            return Ok(false);
        }

        handle.touch();
        match inner.idle.push(handle) {
            Ok(()) => Ok(true),
            Err(handle) => {
                inner.discard(handle);
                Ok(false)
            }
        }
    }

    /// Stop the balancer and disconnect every idle handle
    ///
    /// Returns `false` if the pool was never initialized or is already closed.
    /// Handles on loan are disconnected when they are returned.
    pub async fn close(&self) -> bool {
        let inner = &self.inner;
        if !inner.initialized.load(Ordering::Acquire) {
            return false;
        }
        if inner.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let drained = inner.shut_down();
        let disconnected = drained.len();
        for handle in drained {
            inner.live.fetch_sub(1, Ordering::AcqRel);
            inner.connector.disconnect(handle.into_inner()).await;
        }

        info!(
            pool = %self.name(),
            disconnected,
            on_loan = inner.live.load(Ordering::Acquire),
            "Connection pool closed"
        );
        true
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Live handles, idle or on loan
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }

    /// Handles waiting in the idle queue
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.inner.idle.len()
    }

    #[must_use]
    pub fn query_stats(&self) -> QueryStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Write one record, logging and counting any failure
    ///
    /// Never returns an error: the outcome is reported as `true` when the
    /// row was written and reflected in [`query_stats`](Self::query_stats).
    pub async fn save_record(&self, record: &IngestionRecord) -> bool {
        let inner = &self.inner;
        inner.stats.record_attempt();

        let mut handle = match self.borrow().await {
            Ok(handle) => handle,
            Err(e) => {
                inner.stats.record_failure();
                if e.log_level() == Level::ERROR {
                    error!(pool = %self.name(), error = %e, "Failed to borrow a connection for the record");
                } else {
                    warn!(pool = %self.name(), error = %e, "Failed to borrow a connection for the record");
                }
                return false;
            }
        };

        let lost = match inner
            .connector
            .insert(handle.connection_mut(), &inner.target, record)
            .await
        {
            Ok(rows) => {
                inner.stats.record_success();
                debug!(pool = %self.name(), rows, "Link statistics saved");
                None
            }
            Err(e) => {
                inner.stats.record_failure();
                error!(pool = %self.name(), error = %e, "Failed to save link statistics");
                Some(e.is_disconnect())
            }
        };
        let saved = lost.is_none();

        // A failed write on a handle that still answers is returned for reuse.
        let discard = match lost {
            None => false,
            Some(true) => true,
            Some(false) => !inner.connector.is_connected(handle.connection_mut()).await,
        };
        if discard {
            inner.discard(handle);
        } else if let Err(e) = self.return_handle(handle) {
            warn!(pool = %self.name(), error = %e, "Failed to return connection after write");
        }
        saved
    }

    /// Run one balancer pass now, returning the number of handles retired
    pub fn balance_idle(&self) -> usize {
        self.inner.balance_idle()
    }
}

impl<C: Connector> PoolInner<C> {
    fn ensure_open(&self) -> Result<(), PoolError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(PoolError::NotInitialized);
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    pub(super) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Claim a live slot if the ceiling allows it
    pub(super) fn try_reserve(&self) -> bool {
        let max = self.config.max_active.get();
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < max).then_some(live + 1)
            })
            .is_ok()
    }

    /// Open a handle for a slot already claimed by `try_reserve`
    pub(super) async fn create_handle(&self) -> Result<Handle<C::Connection>, PoolError> {
        match self.connector.connect().await {
            Ok(conn) => Ok(Handle::new(conn)),
            Err(e) => {
                self.live.fetch_sub(1, Ordering::AcqRel);
                Err(PoolError::Connect(e))
            }
        }
    }

    /// Probe and reset a handle taken from the idle queue
    async fn check_out(&self, mut handle: Handle<C::Connection>) -> Option<Handle<C::Connection>> {
        if !self.connector.is_connected(handle.connection_mut()).await {
            debug!(pool = %self.connector.name(), "Discarding disconnected idle connection");
            self.discard(handle);
            return None;
        }
        if let Err(e) = self.connector.reset(handle.connection_mut()).await {
            warn!(pool = %self.connector.name(), error = %e, "Connection reset failed, discarding");
            self.discard(handle);
            return None;
        }
        Some(handle)
    }

    /// Release a handle's slot and disconnect it in the background
    pub(super) fn discard(&self, handle: Handle<C::Connection>) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        spawn_disconnect(Arc::clone(&self.connector), handle.into_inner());
    }

    /// Stop the balancer, close the queue and take every idle handle
    fn shut_down(&self) -> Vec<Handle<C::Connection>> {
        let _ = self.shutdown_tx.send(());
        self.idle.close();
        self.idle.drain()
    }

    pub(super) fn balance_idle(&self) -> usize {
        let now = Instant::now();
        let mut kept = Vec::new();
        let mut retired = 0;

        while !self.is_closed() && self.live.load(Ordering::Acquire) > self.config.min_active {
            let Some(handle) = self.idle.try_pop() else {
                break;
            };
            if handle.idle_for(now) < self.config.max_idle_time {
                kept.push(handle);
            } else {
                self.discard(handle);
                retired += 1;
            }
        }

        for handle in kept {
            if let Err(handle) = self.idle.push(handle) {
                self.discard(handle);
            }
        }
        retired
    }
}

impl<C: Connector> Drop for PoolInner<C> {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for handle in self.shut_down() {
            self.live.fetch_sub(1, Ordering::AcqRel);
            spawn_disconnect(Arc::clone(&self.connector), handle.into_inner());
        }
    }
}

/// Disconnect on the current runtime, or just drop the connection outside one
fn spawn_disconnect<C: Connector>(connector: Arc<C>, conn: C::Connection) {
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(async move {
                connector.disconnect(conn).await;
            });
        }
        Err(_) => drop(conn),
    }
}

#[cfg(test)]
mod tests;
