use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use linkstats::args::DashboardArgs;
use linkstats::config::{load_config, load_dotenv};
use linkstats::constants::timeout::STATUS_PROBE;
use linkstats::dashboard;
use linkstats::logging::init_logging;
use linkstats::network::resolve_addr;
use linkstats::runtime::shutdown_signal;

fn main() -> Result<()> {
    load_dotenv()?;
    let args = DashboardArgs::parse();

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

    let addr = resolve_addr(&config.dashboard.listen_addr())?;
    let server_addr = resolve_addr(&config.server.listen_addr())?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?
        .block_on(dashboard::serve(
            addr,
            server_addr,
            STATUS_PROBE,
            shutdown_signal(),
        ))
}
