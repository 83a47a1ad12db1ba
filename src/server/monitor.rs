//! Periodic status logging

use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use crate::counters::ServerCounters;

/// Log the counter snapshot every `interval` until shutdown
pub async fn run_status_monitor(
    counters: ServerCounters,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.wait_for(|&stop| stop) => break,
            _ = ticker.tick() => {
                let snap = counters.snapshot();
                info!(
                    received_messages = snap.received_messages,
                    current_clients = snap.current_clients,
                    all_connected_clients = snap.all_connected_clients,
                    all_closed_client = snap.all_closed_client,
                    "Server status"
                );
            }
        }
    }
}
