use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::relay::Relay;
use crate::store::TelemetryStore;

/// Upload the oldest batch of pending records and mark them synced.
///
/// Returns the number of records that moved to `SYNCED`. On upload failure
/// nothing is marked and the records are picked up again next time.
///
/// # Errors
///
/// Returns an error if the store query, the upload or the sync update fails.
pub async fn sync_pending(
    store: &TelemetryStore,
    relay: &dyn Relay,
    batch_size: u64,
) -> AppResult<u64> {
    let pending = store.pending_batch(batch_size).await?;

    if pending.is_empty() {
        tracing::debug!("No pending telemetry to sync");
        return Ok(0);
    }

    tracing::info!(count = pending.len(), "Uploading pending telemetry");
    relay.upload_logs(&pending).await?;

    let ids: HashSet<Uuid> = pending.iter().map(|log| log.id).collect();
    let synced = store.mark_synced(&ids).await?;

    tracing::info!(count = synced, "Pending telemetry synced");
    Ok(synced)
}

/// Delete records older than `retention_days`, regardless of sync state.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn sweep_retention(store: &TelemetryStore, retention_days: i64) -> AppResult<u64> {
    let cutoff = Utc::now() - Duration::days(retention_days);
    let deleted = store.delete_old_logs(cutoff).await?;

    if deleted > 0 {
        tracing::info!(count = deleted, cutoff = %cutoff, "Retention sweep deleted old telemetry");
    } else {
        tracing::debug!(cutoff = %cutoff, "Retention sweep found nothing to delete");
    }
    Ok(deleted)
}

/// Rows changed by each normalization migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct NormalizationReport {
    pub status_response_commands: u64,
    pub unknown_motor_statuses: u64,
}

/// Run both legacy-token normalizations.
///
/// # Errors
///
/// Returns an error if either update fails.
pub async fn normalize_legacy_tokens(store: &TelemetryStore) -> AppResult<NormalizationReport> {
    let report = NormalizationReport {
        status_response_commands: store.fix_status_response_command().await?,
        unknown_motor_statuses: store.fix_unknown_motor_status().await?,
    };

    tracing::info!(
        status_response_commands = report.status_response_commands,
        unknown_motor_statuses = report.unknown_motor_statuses,
        "Legacy telemetry tokens normalized"
    );
    Ok(report)
}
