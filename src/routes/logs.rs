use axum::{
    extract::{Query, State},
    http::header::{self, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::AppState;
use crate::entity::{telemetry_logs, Command, MotorStatus, SyncState};
use crate::error::{AppError, AppResult};

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogResponse {
    pub id: Uuid,
    /// Ingestion time
    pub timestamp: DateTime<Utc>,
    pub motor_status: MotorStatus,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub water_level: Option<f64>,
    pub mode: Option<String>,
    pub clock: Option<String>,
    /// Seconds
    pub run_time: Option<i64>,
    pub command: Command,
    pub device_identifier: String,
    pub raw_message: String,
    pub sync_state: SyncState,
}

impl From<telemetry_logs::Model> for LogResponse {
    fn from(log: telemetry_logs::Model) -> Self {
        Self {
            id: log.id,
            timestamp: log.recorded_at(),
            motor_status: log.motor_status,
            voltage: log.voltage,
            current: log.current,
            water_level: log.water_level,
            mode: log.mode,
            clock: log.clock,
            run_time: log.run_time,
            command: log.command,
            device_identifier: log.device_identifier,
            raw_message: log.raw_message,
            sync_state: log.sync_state,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogsQuery {
    /// Inclusive lower bound (ISO 8601)
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound (ISO 8601)
    pub end: Option<DateTime<Utc>>,
    /// Output format: json (default) or csv
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LatestQuery {
    /// Only consider records at or after this time
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteQuery {
    /// Delete every record strictly older than this time
    pub before: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkSyncedRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkSyncedResponse {
    /// Records that moved from PENDING to SYNCED
    pub updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: u64,
}

fn wants_csv(query_format: &str, headers: &HeaderMap) -> bool {
    if query_format != "json" {
        return query_format.eq_ignore_ascii_case("csv");
    }

    headers
        .get(header::ACCEPT)
        .and_then(|accept| accept.to_str().ok())
        .is_some_and(|accept| accept.contains("text/csv"))
}

/// Header row, in `LogResponse` field order.
const CSV_COLUMNS: [&str; 13] = [
    "id",
    "timestamp",
    "motor_status",
    "voltage",
    "current",
    "water_level",
    "mode",
    "clock",
    "run_time",
    "command",
    "device_identifier",
    "raw_message",
    "sync_state",
];

fn csv_header() -> Result<Vec<u8>, std::io::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS).map_err(std::io::Error::other)?;
    writer.into_inner().map_err(|e| std::io::Error::other(e.to_string()))
}

/// Serialize one log as a CSV line, with the header row when `with_header`.
fn csv_line(log: &LogResponse, with_header: bool) -> Result<Vec<u8>, std::io::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(Vec::new());
    writer.serialize(log).map_err(std::io::Error::other)?;
    writer.into_inner().map_err(|e| std::io::Error::other(e.to_string()))
}

fn build_csv_response(logs: Vec<LogResponse>) -> AppResult<Response> {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Vec<u8>, std::io::Error>>(100);

    tokio::spawn(async move {
        if logs.is_empty() {
            let _ = tx.send(csv_header()).await;
            return;
        }
        for (i, log) in logs.iter().enumerate() {
            if tx.send(csv_line(log, i == 0)).await.is_err() {
                break;
            }
        }
    });

    let stream = ReceiverStream::new(rx);
    let body = axum::body::Body::from_stream(stream);

    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"))
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// List telemetry logs
///
/// Returns all logs, or those within the inclusive `start`/`end` range,
/// newest first.
#[utoipa::path(
    get,
    path = "/api/logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Logs retrieved successfully", body = Vec<LogResponse>),
        (status = 400, description = "Invalid time range"),
    ),
    tag = "logs"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let logs = match (query.start, query.end) {
        (None, None) => state.store.list_all().await?,
        (start, end) => {
            let start = start.unwrap_or(DateTime::<Utc>::MIN_UTC);
            let end = end.unwrap_or(DateTime::<Utc>::MAX_UTC);
            if start > end {
                return Err(AppError::BadRequest(
                    "start must not be after end".to_string(),
                ));
            }
            state.store.list_between(start, end).await?
        }
    };

    let logs: Vec<LogResponse> = logs.into_iter().map(LogResponse::from).collect();

    if wants_csv(&query.format, &headers) {
        return build_csv_response(logs);
    }

    Ok(Json(logs).into_response())
}

/// Most recent telemetry log
#[utoipa::path(
    get,
    path = "/api/logs/latest",
    params(LatestQuery),
    responses(
        (status = 200, description = "Latest log", body = LogResponse),
        (status = 404, description = "No matching log"),
    ),
    tag = "logs"
)]
pub async fn latest_log(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> AppResult<Json<LogResponse>> {
    state
        .store
        .latest(query.since)
        .await?
        .map(|log| Json(log.into()))
        .ok_or_else(|| AppError::NotFound("No telemetry logs".to_string()))
}

/// Logs not yet relayed
#[utoipa::path(
    get,
    path = "/api/logs/pending",
    responses(
        (status = 200, description = "Pending logs, oldest first", body = Vec<LogResponse>),
    ),
    tag = "logs"
)]
pub async fn pending_logs(State(state): State<AppState>) -> AppResult<Json<Vec<LogResponse>>> {
    let logs = state.store.list_pending().await?;
    Ok(Json(logs.into_iter().map(LogResponse::from).collect()))
}

/// Mark logs as synced
///
/// Unknown ids and logs that are already synced are ignored.
#[utoipa::path(
    post,
    path = "/api/logs/sync",
    request_body = MarkSyncedRequest,
    responses(
        (status = 200, description = "Sync state updated", body = MarkSyncedResponse),
    ),
    tag = "logs"
)]
pub async fn mark_synced(
    State(state): State<AppState>,
    Json(request): Json<MarkSyncedRequest>,
) -> AppResult<Json<MarkSyncedResponse>> {
    let ids: HashSet<Uuid> = request.ids.into_iter().collect();
    let updated = state.store.mark_synced(&ids).await?;
    Ok(Json(MarkSyncedResponse { updated }))
}

/// Retention sweep
///
/// Deletes every log strictly older than `before`, whether synced or not.
#[utoipa::path(
    delete,
    path = "/api/logs",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Old logs deleted", body = DeleteResponse),
    ),
    tag = "logs"
)]
pub async fn delete_old_logs(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> AppResult<Json<DeleteResponse>> {
    let deleted = state.store.delete_old_logs(query.before).await?;
    Ok(Json(DeleteResponse { deleted }))
}
