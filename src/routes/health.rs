use axum::{extract::State, http::StatusCode};
use sea_orm::ConnectionTrait;

use crate::common::AppState;

/// Health check endpoint
///
/// Returns 200 OK when the local store answers a trivial query, 503 otherwise.
/// This endpoint is not rate-limited and suitable for liveness probes.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Local store unavailable"),
    ),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> StatusCode {
    let db = state.store.connection();
    let probe = sea_orm::Statement::from_string(db.get_database_backend(), "SELECT 1");

    match db.execute(probe).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
