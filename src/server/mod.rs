//! Multi-worker ingestion server
//!
//! [`Server::start`] spawns one OS thread per worker. Each thread builds its
//! own current-thread runtime and its own [`ResourcePool`](crate::pool::ResourcePool),
//! and accepts from a clone of the shared listening socket. Counters are the
//! only state shared between workers.

mod monitor;
mod session;
mod worker;

pub use monitor::run_status_monitor;

use anyhow::{Context, Result, anyhow};
use std::net::{SocketAddr, TcpListener};
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{error, info};

use self::worker::Worker;
use crate::config::{Config, StorageBackend};
use crate::counters::ServerCounters;
use crate::pool::Connector;
use crate::runtime::RuntimeConfig;
use crate::store::{InsertTarget, PostgresConnector, SqliteConnector};

#[derive(Debug)]
pub struct Server {
    config: Config,
    counters: ServerCounters,
    cpu_pinning: bool,
}

impl Server {
    #[must_use]
    pub fn new(config: Config, counters: ServerCounters) -> Self {
        Self {
            config,
            counters,
            cpu_pinning: true,
        }
    }

    /// Disable pinning worker threads to CPU cores
    #[must_use]
    pub fn without_cpu_pinning(mut self) -> Self {
        self.cpu_pinning = false;
        self
    }

    #[must_use]
    pub fn counters(&self) -> &ServerCounters {
        &self.counters
    }

    /// Start workers for the configured storage backend
    ///
    /// # Errors
    /// Returns error if the listener cannot be cloned or a thread cannot be spawned
    pub fn start(self, listener: TcpListener) -> Result<ServerHandle> {
        let database = self.config.database.clone();
        info!(backend = %database.backend, workers = %self.config.server.workers, "Starting ingestion server");
        match database.backend {
            StorageBackend::Postgres => {
                self.start_with(listener, move || PostgresConnector::from_config(&database))
            }
            StorageBackend::Sqlite => {
                self.start_with(listener, move || SqliteConnector::from_config(&database))
            }
        }
    }

    /// Start workers whose pools use connectors built by `make_connector`
    ///
    /// # Errors
    /// Returns error if the listener cannot be cloned or a thread cannot be spawned
    pub fn start_with<C, F>(self, listener: TcpListener, make_connector: F) -> Result<ServerHandle>
    where
        C: Connector,
        F: Fn() -> C,
    {
        let local_addr = listener.local_addr()?;
        let target = InsertTarget::from_config(&self.config.database);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut workers = Vec::with_capacity(self.config.server.workers.get());

        for index in 0..self.config.server.workers.get() {
            let listener = listener
                .try_clone()
                .context("Failed to clone listening socket")?;
            let mut runtime = RuntimeConfig::for_worker(index);
            if !self.cpu_pinning {
                runtime = runtime.without_cpu_pinning();
            }
            let worker = Worker::new(
                index,
                make_connector(),
                self.config.pool.clone(),
                target.clone(),
                self.counters.clone(),
            );
            let shutdown = shutdown_rx.clone();

            let handle = std::thread::Builder::new()
                .name(format!("linkstats-worker-{}", index))
                .spawn(move || -> Result<()> {
                    let rt = runtime.build_runtime()?;
                    rt.block_on(worker.run(listener, shutdown))
                })
                .with_context(|| format!("Failed to spawn worker thread {}", index))?;
            workers.push(handle);
        }

        info!("Ingestion server listening on {}", local_addr);
        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            workers,
        })
    }
}

/// Running server; dropping it without [`join`](Self::join) detaches the workers
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<Result<()>>>,
}

impl ServerHandle {
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A receiver that observes this server's shutdown
    #[must_use]
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Tell every worker to stop accepting and wind down
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Block until every worker thread has exited
    ///
    /// # Errors
    /// Returns the first worker error, or an error if a worker panicked
    pub fn join(self) -> Result<()> {
        let mut first_error = None;
        for (index, worker) in self.workers.into_iter().enumerate() {
            let result = worker
                .join()
                .map_err(|_| anyhow!("Worker {} panicked", index))
                .and_then(|r| r);
            if let Err(e) = result {
                error!(worker = index, error = %e, "Worker failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
