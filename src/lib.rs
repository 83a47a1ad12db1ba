//! # linkstats
//!
//! A TCP ingestion server for link analytics events. Clients stream JSON
//! objects carrying a user agent, a URL and an IP; every event is
//! acknowledged immediately and written to SQLite or PostgreSQL in the
//! background through a bounded, per-worker connection pool.
//!
//! ## Modules
//!
//! - [`pool`]: the generic [`ResourcePool`] and its [`Connector`] seam
//! - [`store`]: SQLite and PostgreSQL connectors
//! - [`normalize`]: user-agent and URL normalization into an [`IngestionRecord`]
//! - [`protocol`]: JSON stream framing, messages and replies
//! - [`server`]: multi-worker accept loops and client sessions
//! - [`dashboard`]: HTTP status dashboard
//! - [`config`]: TOML + environment configuration

pub mod args;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod counters;
pub mod dashboard;
pub mod logging;
pub mod network;
pub mod normalize;
pub mod pool;
pub mod protocol;
pub mod record;
pub mod runtime;
pub mod server;
pub mod status_client;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_macros;

pub use config::{Config, ConfigSource, StorageBackend, load_config};
pub use connection_error::{ConnectError, StoreError};
pub use counters::{CountersSnapshot, ServerCounters};
pub use normalize::{RawEvent, normalize_event};
pub use pool::{Connector, PoolError, ResourcePool};
pub use protocol::StatusSnapshot;
pub use record::IngestionRecord;
pub use server::{Server, ServerHandle};
