//! A pooled connection with its idle bookkeeping

use tokio::time::{Duration, Instant};

/// One live storage connection owned by the pool or by a single borrower
///
/// `last_active_at` is the monotonic time the handle was last returned to
/// the pool; the idle balancer retires handles by comparing it to `now`.
#[derive(Debug)]
pub struct Handle<C> {
    conn: C,
    last_active_at: Instant,
}

impl<C> Handle<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self {
            conn,
            last_active_at: Instant::now(),
        }
    }

    #[must_use]
    #[inline]
    pub fn connection(&self) -> &C {
        &self.conn
    }

    #[inline]
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    #[must_use]
    pub fn last_active_at(&self) -> Instant {
        self.last_active_at
    }

    /// How long the handle has been idle as of `now`
    #[must_use]
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active_at)
    }

    pub(crate) fn touch(&mut self) {
        self.last_active_at = Instant::now();
    }

    pub(crate) fn into_inner(self) -> C {
        self.conn
    }
}
