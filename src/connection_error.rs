//! Storage connection error types
//!
//! This module provides the error types reported by storage connectors,
//! making it easier to diagnose and handle different failure scenarios.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while opening a storage connection
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectError {
    /// SQLite refused to open or prepare the database file
    #[error("failed to open SQLite database '{path}': {source}")]
    Sqlite {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// PostgreSQL refused the connection or the handshake failed
    #[error("failed to connect to PostgreSQL at {host}:{port}: {source}")]
    Postgres {
        host: String,
        port: u16,
        #[source]
        source: tokio_postgres::Error,
    },

    /// The backend did not answer within the connect timeout
    #[error("connecting to {backend} timed out after {:.2}s", .timeout.as_secs_f64())]
    Timeout { backend: String, timeout: Duration },

    /// A blocking connect task panicked or was cancelled
    #[error("connect task for {backend} failed: {source}")]
    Join {
        backend: String,
        #[source]
        source: tokio::task::JoinError,
    },

    /// Connector refused by test doubles or misconfiguration
    #[error("connection refused by {backend}: {reason}")]
    Refused { backend: String, reason: String },
}

impl ConnectError {
    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Self::Join { .. } => tracing::Level::ERROR,
            _ => tracing::Level::WARN,
        }
    }
}

/// Errors that can occur while writing a record through an open connection
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("SQLite statement failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("PostgreSQL statement failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The connection was already closed or lost in an earlier failure
    #[error("connection is closed")]
    Disconnected,

    /// A blocking statement task panicked or was cancelled
    #[error("statement task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Failure injected by test doubles
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Check if the error means the connection itself is unusable
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Disconnected | Self::Join(_) => true,
            Self::Postgres(e) => e.is_closed(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_timeout_error_message() {
        let err = ConnectError::Timeout {
            backend: "postgres".to_string(),
            timeout: Duration::from_millis(1500),
        };

        let msg = err.to_string();
        assert!(msg.contains("postgres"));
        assert!(msg.contains("1.50s"));
        assert_eq!(err.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_sqlite_connect_error_source() {
        let err = ConnectError::Sqlite {
            path: "/nonexistent/db.sqlite".to_string(),
            source: rusqlite::Error::InvalidQuery,
        };

        assert!(err.to_string().contains("/nonexistent/db.sqlite"));
        assert!(err.source().is_some());
        assert_eq!(err.log_level(), tracing::Level::WARN);
    }

    #[tokio::test]
    async fn test_join_failure_logs_as_error() {
        let source = tokio::spawn(async { panic!("connect task panicked") })
            .await
            .unwrap_err();
        let err = ConnectError::Join {
            backend: "sqlite:test.db".to_string(),
            source,
        };
        assert_eq!(err.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_refused_error() {
        let err = ConnectError::Refused {
            backend: "mock".to_string(),
            reason: "down".to_string(),
        };
        assert_eq!(err.to_string(), "connection refused by mock: down");
    }

    #[test]
    fn test_store_error_from_sqlite() {
        let err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn test_store_error_disconnected() {
        assert!(StoreError::Disconnected.is_disconnect());
        assert!(!StoreError::Rejected("nope".into()).is_disconnect());
    }
}
