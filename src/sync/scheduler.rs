use std::time::Duration;
use tokio::time::interval;

use crate::common::AppState;
use crate::sync::worker;

/// Periodically upload pending records to the relay.
///
/// A failed tick is logged and left for the next one; there is no retry
/// within a tick.
pub async fn run_pending_sync(state: AppState) {
    let interval_secs = state.config.sync_pending_interval_seconds;
    let batch_size = state.config.sync_batch_size;

    tracing::info!(interval_secs, batch_size, "Starting pending sync scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        // First tick completes immediately
        ticker.tick().await;

        if let Err(e) = worker::sync_pending(&state.store, state.relay.as_ref(), batch_size).await {
            tracing::error!(error = %e, "Pending sync failed");
        }
    }
}

/// Periodically delete records older than the retention window.
pub async fn run_retention_sweep(state: AppState) {
    let interval_secs = state.config.retention_sweep_interval_seconds;
    let retention_days = state.config.retention_days;

    tracing::info!(interval_secs, retention_days, "Starting retention sweep scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        ticker.tick().await;

        if let Err(e) = worker::sweep_retention(&state.store, retention_days).await {
            tracing::error!(error = %e, "Retention sweep failed");
        }
    }
}
