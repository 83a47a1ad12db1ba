//! Configuration type definitions
//!
//! This module contains all the core configuration structures used by the server,
//! the storage connectors and the dashboard.

use super::defaults;
use crate::constants::pool::MIN_IDLE_CHECK_INTERVAL;
use crate::types::{
    HostName, MaxActive, Port, SchemaName, TableName, WorkerCount, duration_secs_serde,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage backend that receives the records
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through the native async driver
    #[default]
    Postgres,
    /// SQLite file through the synchronous client on the blocking pool
    Sqlite,
}

impl StorageBackend {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(format!(
                "unknown database backend '{}' (expected 'postgres' or 'sqlite')",
                other
            )),
        }
    }
}

/// Main configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Ingestion socket settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Per-worker connection pool settings
    #[serde(default)]
    pub pool: PoolConfig,
    /// Status dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Ingestion socket settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: HostName,
    pub port: Port,
    /// Worker threads, each with its own runtime and pool
    pub workers: WorkerCount,
    pub is_production: bool,
    /// Log a counter snapshot every `status_interval`
    pub status_monitoring: bool,
    #[serde(with = "duration_secs_serde")]
    pub status_interval: Duration,
    /// Also write logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::server_host(),
            port: defaults::server_port(),
            workers: defaults::workers(),
            is_production: defaults::is_production(),
            status_monitoring: false,
            status_interval: defaults::status_interval(),
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` string the listener binds to
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Storage backend settings
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub host: HostName,
    pub port: Port,
    pub name: String,
    pub username: String,
    pub password: String,
    pub schema: SchemaName,
    pub table: TableName,
    /// Database file used by the SQLite backend
    pub sqlite_path: PathBuf,
    #[serde(with = "duration_secs_serde")]
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            host: defaults::database_host(),
            port: defaults::database_port(),
            name: defaults::database_name(),
            username: defaults::database_username(),
            password: String::new(),
            schema: defaults::schema(),
            table: defaults::table(),
            sqlite_path: defaults::sqlite_path(),
            connect_timeout: defaults::connect_timeout(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("sqlite_path", &self.sqlite_path)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Connection pool settings
///
/// `min_active` is the floor kept by the idle balancer and the number of
/// handles opened at startup; `max_active` is the hard ceiling on live handles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    pub min_active: usize,
    pub max_active: MaxActive,
    /// How long a borrower waits for a handle when the pool is exhausted
    #[serde(with = "duration_secs_serde")]
    pub max_wait_time: Duration,
    /// Idle age after which surplus handles are retired
    #[serde(with = "duration_secs_serde")]
    pub max_idle_time: Duration,
    #[serde(with = "duration_secs_serde")]
    pub idle_check_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_active: defaults::min_active(),
            max_active: defaults::max_active(),
            max_wait_time: defaults::max_wait_time(),
            max_idle_time: defaults::max_idle_time(),
            idle_check_interval: defaults::idle_check_interval(),
        }
    }
}

impl PoolConfig {
    /// Period actually used by the idle balancer
    #[must_use]
    pub fn balance_interval(&self) -> Duration {
        self.idle_check_interval.max(MIN_IDLE_CHECK_INTERVAL)
    }
}

/// Status dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub host: HostName,
    pub port: Port,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: defaults::dashboard_host(),
            port: defaults::dashboard_port(),
        }
    }
}

impl DashboardConfig {
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
