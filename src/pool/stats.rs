//! Lock-free query counters kept by each pool

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters of record writes attempted through a pool
#[derive(Debug, Default)]
pub struct QueryStats {
    all: AtomicU64,
    success: AtomicU64,
    fail: AtomicU64,
}

/// Point-in-time copy of [`QueryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryStatsSnapshot {
    pub all_query: u64,
    pub success_query: u64,
    pub fail_query: u64,
}

impl QueryStats {
    #[inline]
    pub(crate) fn record_attempt(&self) {
        self.all.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_failure(&self) {
        self.fail.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> QueryStatsSnapshot {
        QueryStatsSnapshot {
            all_query: self.all.load(Ordering::Relaxed),
            success_query: self.success.load(Ordering::Relaxed),
            fail_query: self.fail.load(Ordering::Relaxed),
        }
    }
}

impl QueryStatsSnapshot {
    /// Attempts that have neither succeeded nor failed yet
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.all_query
            .saturating_sub(self.success_query)
            .saturating_sub(self.fail_query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = QueryStats::default();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_success();
        stats.record_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.all_query, 3);
        assert_eq!(snap.success_query, 1);
        assert_eq!(snap.fail_query, 1);
        assert_eq!(snap.in_flight(), 1);
    }
}
