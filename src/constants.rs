//! Constants used throughout the ingestion server
//!
//! This module centralizes magic numbers and configuration values
//! to improve maintainability and reduce duplication.

use std::time::Duration;

/// Buffer size constants for the client protocol
pub mod buffer {
    /// Bytes requested from the socket per read (8KB)
    pub const READ_CHUNK: usize = 8 * 1024;

    /// Largest incomplete JSON value kept while waiting for more bytes (64KB)
    ///
    /// A client that streams more than this without ever closing a value
    /// has its pending bytes discarded and counted as one malformed message.
    pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

    /// Initial capacity of the per-session pending buffer
    pub const PENDING_INITIAL: usize = 1024;
}

/// Socket constants
pub mod socket {
    /// Listen backlog for the shared ingestion socket
    pub const LISTEN_BACKLOG: i32 = 1024;
}

/// Timeout constants
pub mod timeout {
    use super::Duration;

    /// How long the status client waits for connect and reply
    pub const STATUS_PROBE: Duration = Duration::from_secs(3);

    /// Grace period for sessions to finish after a shutdown signal
    pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
}

/// Connection pool constants
pub mod pool {
    use super::Duration;

    /// Default number of handles opened by `init` and kept by the balancer
    pub const DEFAULT_MIN_ACTIVE: usize = 20;

    /// Default ceiling on live handles
    pub const DEFAULT_MAX_ACTIVE: usize = 100;

    /// Default borrow wait before giving up
    pub const DEFAULT_MAX_WAIT_TIME: Duration = Duration::from_secs(5);

    /// Default idle age after which surplus handles are retired
    pub const DEFAULT_MAX_IDLE_TIME: Duration = Duration::from_secs(30);

    /// Default balancer period
    pub const DEFAULT_IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(15);

    /// The balancer never runs more often than this
    pub const MIN_IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(10);
}

/// Storage backend constants
pub mod store {
    use super::Duration;

    /// Default timeout for establishing a storage connection
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Value stored in `browser`/`os` when a user agent is not recognized
    pub const UNKNOWN_FAMILY: &str = "Other";
}

#[cfg(test)]
#[allow(clippy::assertions_on_constants)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sizes() {
        assert!(buffer::MAX_MESSAGE_BYTES >= buffer::READ_CHUNK);
        assert!(buffer::PENDING_INITIAL <= buffer::MAX_MESSAGE_BYTES);
    }

    #[test]
    fn test_pool_defaults() {
        assert!(pool::DEFAULT_MIN_ACTIVE <= pool::DEFAULT_MAX_ACTIVE);
        assert!(pool::DEFAULT_IDLE_CHECK_INTERVAL >= pool::MIN_IDLE_CHECK_INTERVAL);
        assert!(pool::DEFAULT_MAX_IDLE_TIME > pool::DEFAULT_IDLE_CHECK_INTERVAL);
        assert_eq!(pool::MIN_IDLE_CHECK_INTERVAL, Duration::from_secs(10));
    }

    #[test]
    fn test_timeouts() {
        assert!(timeout::STATUS_PROBE.as_secs() > 0);
        assert!(store::DEFAULT_CONNECT_TIMEOUT.as_secs() > 0);
    }
}
