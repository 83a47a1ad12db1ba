//! Resource pool errors

use std::time::Duration;
use thiserror::Error;

use crate::connection_error::ConnectError;

/// Errors returned by [`ResourcePool`](super::ResourcePool) operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Creating a new handle failed
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// No handle became available within `max_wait_time`
    #[error(
        "Borrow the connection timeout in {:.2}(s), connections in pool: {idle}, all connections: {live}",
        .timeout.as_secs_f64()
    )]
    BorrowTimeout {
        timeout: Duration,
        idle: usize,
        live: usize,
    },

    /// `init` has not been called
    #[error("connection pool is not initialized, call init() first")]
    NotInitialized,

    /// The pool was closed
    #[error("connection pool is closed")]
    Closed,

    /// A handle produced by another connector was returned
    #[error("connection of unexpected origin returned to the pool")]
    ForeignHandle,
}

impl PoolError {
    /// Check if this error means the pool was exhausted
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::BorrowTimeout { .. })
    }

    /// Level this error should be logged at
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Self::Connect(e) => e.log_level(),
            Self::ForeignHandle => tracing::Level::ERROR,
            _ => tracing::Level::WARN,
        }
    }
}
