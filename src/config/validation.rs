//! Configuration validation
//!
//! This module provides validation logic for the configuration to ensure
//! all settings are valid before the server starts.

use anyhow::Result;
use std::time::Duration;

use super::types::{Config, PoolConfig, StorageBackend};
use crate::constants::pool::MIN_IDLE_CHECK_INTERVAL;

impl Config {
    /// Validate configuration for correctness
    ///
    /// Non-zero counts, ports and SQL identifiers are enforced by their types.
    /// This checks the remaining semantic constraints:
    /// - `min_active` does not exceed `max_active`
    /// - the status monitor has a usable period
    pub fn validate(&self) -> Result<()> {
        validate_pool(&self.pool)?;

        if self.server.status_monitoring && self.server.status_interval.is_zero() {
            return Err(anyhow::anyhow!(
                "status_interval must be greater than 0 when status_monitoring is enabled"
            ));
        }

        Ok(())
    }

    /// Settings that are accepted but probably not what the operator meant
    ///
    /// Returned rather than logged so the binaries can report them once
    /// logging is initialized.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.database.backend == StorageBackend::Sqlite && self.server.workers.get() > 1 {
            warnings.push(format!(
                "SQLite backend with {} workers: writers serialize on the database file lock",
                self.server.workers
            ));
        }

        if self.pool.idle_check_interval < MIN_IDLE_CHECK_INTERVAL {
            warnings.push(format!(
                "pool.idle_check_interval {:?} is below the minimum; the balancer runs every {:?}",
                self.pool.idle_check_interval, MIN_IDLE_CHECK_INTERVAL
            ));
        }

        if self.pool.max_wait_time == Duration::ZERO {
            warnings.push(
                "pool.max_wait_time is 0: borrows fail immediately when the pool is exhausted"
                    .to_string(),
            );
        }

        warnings
    }
}

fn validate_pool(pool: &PoolConfig) -> Result<()> {
    if pool.min_active > pool.max_active.get() {
        return Err(anyhow::anyhow!(
            "pool.min_active ({}) cannot exceed pool.max_active ({})",
            pool.min_active,
            pool.max_active
        ));
    }
    Ok(())
}
