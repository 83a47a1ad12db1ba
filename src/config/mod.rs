//! Configuration module
//!
//! This module handles all configuration types and loading
//! for the ingestion server and the dashboard.

mod defaults;
mod loading;
mod types;
mod validation;

// Re-export public types
pub use loading::{
    ConfigSource, ENV_VARS, apply_env_overrides, create_default_config, has_env_overrides,
    load_config, load_config_file, load_dotenv, parse_bool,
};
pub use types::{
    Config, DashboardConfig, DatabaseConfig, PoolConfig, ServerConfig, StorageBackend,
};
