//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde deserialization.

use crate::constants;
use crate::types::{HostName, MaxActive, Port, SchemaName, TableName, WorkerCount};
use std::path::PathBuf;
use std::time::Duration;

/// Default bind address for the ingestion socket
#[inline]
pub fn server_host() -> HostName {
    HostName::new("127.0.0.1".to_string()).expect("literal host is non-empty")
}

/// Default ingestion socket port (8100)
#[inline]
pub fn server_port() -> Port {
    Port::SOCKET_SERVER
}

/// Default number of worker threads
#[inline]
pub fn workers() -> WorkerCount {
    WorkerCount::DEFAULT
}

/// Production mode keeps console logging at warnings and above
#[inline]
pub fn is_production() -> bool {
    true
}

/// Default period of the status monitor log line
#[inline]
pub fn status_interval() -> Duration {
    Duration::from_secs(5)
}

#[inline]
pub fn database_host() -> HostName {
    HostName::new("127.0.0.1".to_string()).expect("literal host is non-empty")
}

#[inline]
pub fn database_port() -> Port {
    Port::POSTGRES
}

#[inline]
pub fn database_name() -> String {
    "api_test".to_string()
}

#[inline]
pub fn database_username() -> String {
    "postgres".to_string()
}

#[inline]
pub fn schema() -> SchemaName {
    SchemaName::new("public".to_string()).expect("literal schema is a valid identifier")
}

#[inline]
pub fn table() -> TableName {
    TableName::new("links_statics".to_string()).expect("literal table is a valid identifier")
}

#[inline]
pub fn sqlite_path() -> PathBuf {
    PathBuf::from("linkstats.db")
}

#[inline]
pub fn connect_timeout() -> Duration {
    constants::store::DEFAULT_CONNECT_TIMEOUT
}

#[inline]
pub fn min_active() -> usize {
    constants::pool::DEFAULT_MIN_ACTIVE
}

#[inline]
pub fn max_active() -> MaxActive {
    MaxActive::DEFAULT
}

#[inline]
pub fn max_wait_time() -> Duration {
    constants::pool::DEFAULT_MAX_WAIT_TIME
}

#[inline]
pub fn max_idle_time() -> Duration {
    constants::pool::DEFAULT_MAX_IDLE_TIME
}

#[inline]
pub fn idle_check_interval() -> Duration {
    constants::pool::DEFAULT_IDLE_CHECK_INTERVAL
}

/// Default dashboard bind address (all interfaces)
#[inline]
pub fn dashboard_host() -> HostName {
    HostName::new("0.0.0.0".to_string()).expect("literal host is non-empty")
}

#[inline]
pub fn dashboard_port() -> Port {
    Port::DASHBOARD
}
