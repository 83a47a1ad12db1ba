//! Core types for connection tracking and configuration
//!
//! This module provides unique identifiers and validated value types
//! used throughout the server.

pub mod config;
pub mod validated;

pub use config::{MaxActive, Port, WorkerCount, duration_secs_serde, parse_secs};
pub use validated::{HostName, SchemaName, TableName, ValidationError};

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Unique identifier for client connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generate a new unique client ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique identity of a connector
///
/// Connectors stamp their id into every connection they open so a pool can
/// tell its own handles from ones produced elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorId(u64);

static NEXT_CONNECTOR_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectorId {
    /// Allocate a fresh id, never equal to any earlier one
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connector#{}", self.0)
    }
}
