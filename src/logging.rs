//! Centralized logging setup (stdout plus an optional log file)

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub fn default_directive(is_production: bool) -> &'static str {
    if is_production { "warn" } else { "debug" }
}

fn env_filter(is_production: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(is_production)))
}

/// Initialize logging to stdout and, when `log_file` is set, to that file
///
/// `RUST_LOG` wins when set; otherwise production logs warnings only and
/// development logs everything down to debug. Keep the returned guard alive
/// for the program lifetime or buffered file lines are lost.
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init_logging(is_production: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(env_filter(is_production));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path '{}' has no file name", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter(is_production));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "warn");
        assert_eq!(default_directive(false), "debug");
    }
}
