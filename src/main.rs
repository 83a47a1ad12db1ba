use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use linkstats::args::ServerArgs;
use linkstats::config::{Config, load_config, load_dotenv};
use linkstats::constants::timeout::STATUS_PROBE;
use linkstats::logging::init_logging;
use linkstats::network::{bind_listener, resolve_addr};
use linkstats::runtime::shutdown_signal;
use linkstats::server::run_status_monitor;
use linkstats::status_client::query_status;
use linkstats::{Server, ServerCounters};

fn main() -> Result<()> {
    let dotenv = load_dotenv()?;
    let args = ServerArgs::parse();

    let (mut config, source) = load_config(&args.config)?;
    args.apply_to(&mut config);

    let _log_guard = init_logging(
        config.server.is_production,
        config.server.log_file.as_deref(),
    )?;
    info!("Loaded configuration from {}", source.description());
    for warning in config.warnings() {
        warn!("{}", warning);
    }
    if let Some(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    if args.status {
        return print_status(&config);
    }
    run_server(config)
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")
}

fn print_status(config: &Config) -> Result<()> {
    let addr = resolve_addr(&config.server.listen_addr())?;
    let snapshot = current_thread_runtime()?.block_on(query_status(addr, STATUS_PROBE))?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn run_server(config: Config) -> Result<()> {
    let addr = resolve_addr(&config.server.listen_addr())?;
    let listener = bind_listener(addr)?;
    let counters = ServerCounters::new();

    let handle = Server::new(config.clone(), counters.clone()).start(listener)?;

    current_thread_runtime()?.block_on(async {
        if config.server.status_monitoring {
            tokio::spawn(run_status_monitor(
                counters,
                config.server.status_interval,
                handle.subscribe_shutdown(),
            ));
        }
        shutdown_signal().await;
        info!("Shutdown signal received, stopping workers...");
    });

    handle.shutdown();
    handle.join()?;
    info!("Shutdown complete");
    Ok(())
}
