//! Configuration loading from TOML files and environment lookups

use linkstats::config::{
    Config, ConfigSource, StorageBackend, apply_env_overrides, create_default_config,
    load_config_file,
};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
[server]
host = "0.0.0.0"
port = 9100
workers = 4
is_production = false
status_monitoring = true
status_interval = 10

[database]
backend = "sqlite"
sqlite_path = "/tmp/links.db"
table = "link_hits"

[pool]
min_active = 2
max_active = 8
max_wait_time = 1

[dashboard]
port = 8090
"#,
    );

    let config = load_config_file(file.path()).unwrap();
    assert_eq!(config.server.listen_addr(), "0.0.0.0:9100");
    assert_eq!(config.server.workers.get(), 4);
    assert!(!config.server.is_production);
    assert!(config.server.status_monitoring);
    assert_eq!(config.server.status_interval, Duration::from_secs(10));
    assert_eq!(config.database.backend, StorageBackend::Sqlite);
    assert_eq!(config.database.table.as_str(), "link_hits");
    assert_eq!(config.pool.min_active, 2);
    assert_eq!(config.pool.max_active.get(), 8);
    assert_eq!(config.pool.max_wait_time, Duration::from_secs(1));
    assert_eq!(config.dashboard.port.get(), 8090);
    config.validate().unwrap();
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config("[server]\nport = 9200\n");
    let config = load_config_file(file.path()).unwrap();
    assert_eq!(config.server.port.get(), 9200);
    assert_eq!(config.database, Config::default().database);
    assert_eq!(config.pool, Config::default().pool);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let file = write_config("[server\nport = ");
    let err = load_config_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn test_zero_workers_rejected() {
    let file = write_config("[server]\nworkers = 0\n");
    assert!(load_config_file(file.path()).is_err());
}

#[test]
fn test_min_above_max_fails_validation() {
    let file = write_config("[pool]\nmin_active = 10\nmax_active = 5\n");
    let config = load_config_file(file.path()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_file_reads_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_default_config_round_trips() {
    let body = create_default_config();
    let file = write_config(&body);
    assert_eq!(load_config_file(file.path()).unwrap(), Config::default());
}

#[test]
fn test_env_layer_over_file() {
    let file = write_config("[server]\nport = 9300\n[database]\nbackend = \"sqlite\"\n");
    let mut config = load_config_file(file.path()).unwrap();

    let env: HashMap<&str, &str> = [
        ("SOCKET_SERVER_PORT", "9400"),
        ("DATABASE_BACKEND", "postgres"),
        ("POOL_MAX_ACTIVE", "12"),
    ]
    .into_iter()
    .collect();
    apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();

    assert_eq!(config.server.port.get(), 9400);
    assert_eq!(config.database.backend, StorageBackend::Postgres);
    assert_eq!(config.pool.max_active.get(), 12);
}

#[test]
fn test_config_source_description() {
    assert_eq!(ConfigSource::Defaults.description(), "built-in defaults");
    assert!(
        ConfigSource::File("linkstats.toml".into())
            .description()
            .contains("linkstats.toml")
    );
}
