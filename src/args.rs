//! Command-line arguments for the linkstats binaries
//!
//! Every flag can also be set through a `LINKSTATS_*` environment variable.
//! Flags override the configuration file and the deployment environment
//! variables read by [`load_config`](crate::config::load_config).

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::types::{HostName, Port, WorkerCount};

/// Arguments of the ingestion server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Link statistics ingestion server", long_about = None)]
pub struct ServerArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "linkstats.toml", env = "LINKSTATS_CONFIG")]
    pub config: PathBuf,

    /// Host to bind to (overrides config file)
    #[arg(long, env = "LINKSTATS_HOST")]
    pub host: Option<HostName>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "LINKSTATS_PORT")]
    pub port: Option<Port>,

    /// Number of worker threads, each with its own pool (overrides config file)
    #[arg(short, long, env = "LINKSTATS_WORKERS")]
    pub workers: Option<WorkerCount>,

    /// Query a running server for its status, print it and exit
    #[arg(long)]
    pub status: bool,
}

impl ServerArgs {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }
    }
}

/// Arguments of the status dashboard
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Link statistics status dashboard", long_about = None)]
pub struct DashboardArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "linkstats.toml", env = "LINKSTATS_CONFIG")]
    pub config: PathBuf,

    /// Host to bind the dashboard to (overrides config file)
    #[arg(long, env = "LINKSTATS_DASHBOARD_HOST")]
    pub host: Option<HostName>,

    /// Port to serve the dashboard on (overrides config file)
    #[arg(short, long, env = "LINKSTATS_DASHBOARD_PORT")]
    pub port: Option<Port>,
}

impl DashboardArgs {
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.dashboard.host = host.clone();
        }
        if let Some(port) = self.port {
            config.dashboard.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_server_args_definition() {
        ServerArgs::command().debug_assert();
        DashboardArgs::command().debug_assert();
    }

    #[test]
    fn test_server_args_defaults() {
        let args = ServerArgs::try_parse_from(["linkstats"]).unwrap();
        assert_eq!(args.config, PathBuf::from("linkstats.toml"));
        assert!(args.host.is_none());
        assert!(!args.status);
    }

    #[test]
    fn test_server_args_override_config() {
        let args = ServerArgs::try_parse_from([
            "linkstats",
            "--host",
            "0.0.0.0",
            "--port",
            "9100",
            "--workers",
            "4",
        ])
        .unwrap();
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.server.host.as_str(), "0.0.0.0");
        assert_eq!(config.server.port.get(), 9100);
        assert_eq!(config.server.workers.get(), 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServerArgs::try_parse_from(["linkstats", "--port", "0"]).is_err());
        assert!(ServerArgs::try_parse_from(["linkstats", "--workers", "0"]).is_err());
        assert!(ServerArgs::try_parse_from(["linkstats", "--host", ""]).is_err());
    }

    #[test]
    fn test_dashboard_args() {
        let args = DashboardArgs::try_parse_from(["linkstats-dashboard", "-p", "9105"]).unwrap();
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.dashboard.port.get(), 9105);
        assert_eq!(config.dashboard.host.as_str(), "0.0.0.0");
    }
}
