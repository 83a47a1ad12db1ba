//! Configuration loading from files and environment variables
//!
//! Values are layered: built-in defaults, then the TOML file (when present),
//! then environment variables. The environment layer uses the variable names
//! existing deployments already export (`SOCKET_SERVER_PORT`, `LINKS_TABLE`, ...),
//! and `.env` files are folded into the process environment by the binaries
//! through `dotenvy` before loading starts.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::types::Config;
use crate::types::parse_secs;

/// Where the base configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from a TOML file
    File(PathBuf),
    /// File absent, built-in defaults used
    Defaults,
}

impl ConfigSource {
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::File(path) => format!("configuration file '{}'", path.display()),
            Self::Defaults => "built-in defaults".to_string(),
        }
    }
}

/// Environment variables understood by [`apply_env_overrides`]
pub const ENV_VARS: &[&str] = &[
    "SOCKET_SERVER_HOST",
    "SOCKET_SERVER_PORT",
    "SOCKET_WORKER_NUMBER",
    "IS_PRODUCTION",
    "STATUS_MONITORING",
    "STATUS_INTERVAL",
    "LOG_FILE",
    "DATABASE_BACKEND",
    "DATABASE_HOST",
    "DATABASE_PORT",
    "DATABASE_NAME",
    "DATABASE_USERNAME",
    "DATABASE_PASSWORD",
    "DATABASE_SCHEMA",
    "LINKS_TABLE",
    "SQLITE_PATH",
    "DATABASE_CONNECT_TIMEOUT",
    "POOL_MIN_ACTIVE",
    "POOL_MAX_ACTIVE",
    "POOL_MAX_WAIT_TIME",
    "POOL_MAX_IDLE_TIME",
    "POOL_IDLE_CHECK_INTERVAL",
    "DASHBOARD_HOST",
    "DASHBOARD_PORT",
];

/// Load configuration from a TOML file
pub fn load_config_file(config_path: &Path) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            config_path.display(),
            e
        )
    })?;

    toml::from_str(&config_content).map_err(|e| {
        anyhow::anyhow!(
            "Failed to parse config file '{}': {}",
            config_path.display(),
            e
        )
    })
}

/// Load configuration with all layers applied and validate it
///
/// A missing file is not an error: defaults are used and the environment
/// still applies. A file that exists but does not parse is an error.
pub fn load_config(config_path: &Path) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = if config_path.exists() {
        (
            load_config_file(config_path)?,
            ConfigSource::File(config_path.to_path_buf()),
        )
    } else {
        (Config::default(), ConfigSource::Defaults)
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;

    Ok((config, source))
}

/// Fold a `.env` file from the working directory (or a parent) into the
/// process environment, returning its path when one was found
///
/// Variables already set in the environment are left untouched.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e).context("Failed to load .env file"),
    }
}

/// Parse a boolean flag the way deployment scripts write them
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow::anyhow!("invalid boolean '{}'", other)),
    }
}

/// Apply environment overrides through `lookup`
///
/// Taking the lookup as a closure keeps this testable without touching
/// the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    macro_rules! parse_into {
        ($key:literal, $target:expr) => {
            if let Some(raw) = get($key) {
                $target = raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("{}", e))
                    .with_context(|| format!("invalid value for {}: '{}'", $key, raw))?;
            }
        };
    }

    macro_rules! secs_into {
        ($key:literal, $target:expr) => {
            if let Some(raw) = get($key) {
                $target = parse_secs(&raw)
                    .map_err(|e| anyhow::anyhow!(e))
                    .with_context(|| format!("invalid value for {}", $key))?;
            }
        };
    }

    macro_rules! bool_into {
        ($key:literal, $target:expr) => {
            if let Some(raw) = get($key) {
                $target = parse_bool(&raw).with_context(|| format!("invalid value for {}", $key))?;
            }
        };
    }

    parse_into!("SOCKET_SERVER_HOST", config.server.host);
    parse_into!("SOCKET_SERVER_PORT", config.server.port);
    parse_into!("SOCKET_WORKER_NUMBER", config.server.workers);
    bool_into!("IS_PRODUCTION", config.server.is_production);
    bool_into!("STATUS_MONITORING", config.server.status_monitoring);
    secs_into!("STATUS_INTERVAL", config.server.status_interval);
    if let Some(path) = get("LOG_FILE") {
        config.server.log_file = Some(PathBuf::from(path));
    }

    parse_into!("DATABASE_BACKEND", config.database.backend);
    parse_into!("DATABASE_HOST", config.database.host);
    parse_into!("DATABASE_PORT", config.database.port);
    if let Some(name) = get("DATABASE_NAME") {
        config.database.name = name;
    }
    if let Some(username) = get("DATABASE_USERNAME") {
        config.database.username = username;
    }
    // An empty password is a legitimate value
    if let Some(password) = lookup("DATABASE_PASSWORD") {
        config.database.password = password;
    }
    parse_into!("DATABASE_SCHEMA", config.database.schema);
    parse_into!("LINKS_TABLE", config.database.table);
    if let Some(path) = get("SQLITE_PATH") {
        config.database.sqlite_path = PathBuf::from(path);
    }
    secs_into!("DATABASE_CONNECT_TIMEOUT", config.database.connect_timeout);

    parse_into!("POOL_MIN_ACTIVE", config.pool.min_active);
    parse_into!("POOL_MAX_ACTIVE", config.pool.max_active);
    secs_into!("POOL_MAX_WAIT_TIME", config.pool.max_wait_time);
    secs_into!("POOL_MAX_IDLE_TIME", config.pool.max_idle_time);
    secs_into!("POOL_IDLE_CHECK_INTERVAL", config.pool.idle_check_interval);

    parse_into!("DASHBOARD_HOST", config.dashboard.host);
    parse_into!("DASHBOARD_PORT", config.dashboard.port);

    Ok(())
}

/// Check whether any configuration variable is set in the process environment
#[must_use]
pub fn has_env_overrides() -> bool {
    ENV_VARS.iter().any(|key| std::env::var_os(key).is_some())
}

/// Create a default configuration file body for `--init`-style bootstrapping
#[must_use]
pub fn create_default_config() -> String {
    toml::to_string_pretty(&Config::default()).unwrap_or_default()
}
