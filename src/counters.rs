//! Process-wide ingestion counters
//!
//! Lock-free atomics shared by every worker. All counters are monotonic
//! except `current_clients`, which a [`SessionGuard`] raises on connect and
//! lowers on drop, so a session ending in an I/O error still decrements it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default)]
pub struct ServerCounters {
    inner: Arc<CountersInner>,
}

#[derive(Debug, Default)]
struct CountersInner {
    received_messages: AtomicU64,
    current_clients: AtomicU64,
    all_connected_clients: AtomicU64,
    all_closed_client: AtomicU64,
}

/// Point-in-time copy of [`ServerCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountersSnapshot {
    pub received_messages: u64,
    pub current_clients: u64,
    pub all_connected_clients: u64,
    pub all_closed_client: u64,
}

impl ServerCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a newly accepted client; the returned guard counts its close
    #[must_use = "dropping the guard immediately counts the client as closed"]
    pub fn client_connected(&self) -> SessionGuard {
        self.inner.current_clients.fetch_add(1, Ordering::Relaxed);
        self.inner.all_connected_clients.fetch_add(1, Ordering::Relaxed);
        SessionGuard {
            counters: self.clone(),
        }
    }

    #[inline]
    pub fn message_received(&self) {
        self.inner.received_messages.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            received_messages: self.inner.received_messages.load(Ordering::Relaxed),
            current_clients: self.inner.current_clients.load(Ordering::Relaxed),
            all_connected_clients: self.inner.all_connected_clients.load(Ordering::Relaxed),
            all_closed_client: self.inner.all_closed_client.load(Ordering::Relaxed),
        }
    }

    fn client_closed(&self) {
        self.inner.all_closed_client.fetch_add(1, Ordering::Relaxed);
        self.inner.current_clients.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Marks one open client session
#[derive(Debug)]
pub struct SessionGuard {
    counters: ServerCounters,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.counters.client_closed();
    }
}
