//! Tokio runtime configuration and shutdown handling
//!
//! Every worker thread runs its own current-thread runtime, optionally
//! pinned to one CPU core.

use anyhow::Result;
use tracing::error;

/// Runtime configuration for one worker thread
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Index of the worker, also the CPU core it is pinned to
    worker_index: usize,
    /// Whether to enable CPU pinning (Linux only)
    enable_cpu_pinning: bool,
}

impl RuntimeConfig {
    #[must_use]
    pub fn for_worker(worker_index: usize) -> Self {
        Self {
            worker_index,
            enable_cpu_pinning: true,
        }
    }

    /// Disable CPU pinning
    #[must_use]
    pub fn without_cpu_pinning(mut self) -> Self {
        self.enable_cpu_pinning = false;
        self
    }

    #[must_use]
    pub const fn worker_index(&self) -> usize {
        self.worker_index
    }

    #[must_use]
    pub const fn cpu_pinning(&self) -> bool {
        self.enable_cpu_pinning
    }

    /// Build the current-thread runtime for this worker
    ///
    /// Must be called on the worker thread itself, since pinning applies to
    /// the calling thread.
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        if self.enable_cpu_pinning {
            let cores = std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1);
            pin_to_cpu_core(self.worker_index % cores);
        }

        Ok(rt)
    }
}

/// Pin the calling thread to one CPU core
///
/// This is a best-effort operation - failures are logged but not fatal.
#[cfg(target_os = "linux")]
fn pin_to_cpu_core(core: usize) {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpu_set = CpuSet::new();
    if let Err(e) = cpu_set.set(core) {
        tracing::warn!("Cannot pin worker to CPU core {}: {}", core, e);
        return;
    }

    match sched_setaffinity(Pid::from_raw(0), &cpu_set) {
        Ok(()) => tracing::debug!("Pinned worker thread to CPU core {}", core),
        Err(e) => tracing::warn!(
            "Failed to set CPU affinity: {}, continuing without pinning",
            e
        ),
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu_core(_core: usize) {
    tracing::debug!("CPU pinning not available on this platform");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_for_worker() {
        let config = RuntimeConfig::for_worker(3);
        assert_eq!(config.worker_index(), 3);
        assert!(config.cpu_pinning());
        assert!(!config.without_cpu_pinning().cpu_pinning());
    }

    #[test]
    fn test_build_runtime_runs_futures() {
        let rt = RuntimeConfig::for_worker(0)
            .without_cpu_pinning()
            .build_runtime()
            .unwrap();
        assert_eq!(rt.block_on(async { 40 + 2 }), 42);
    }

    #[test]
    fn test_build_runtime_with_pinning_on_own_thread() {
        std::thread::spawn(|| {
            let rt = RuntimeConfig::for_worker(0).build_runtime().unwrap();
            rt.block_on(tokio::task::yield_now());
        })
        .join()
        .unwrap();
    }
}
