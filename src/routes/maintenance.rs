use axum::{extract::State, Json};

use crate::common::AppState;
use crate::error::AppResult;
use crate::sync::worker::{self, NormalizationReport};

/// Run the legacy-token normalizations
///
/// Safe to call repeatedly; a second run reports zero changed rows.
#[utoipa::path(
    post,
    path = "/api/maintenance/normalize",
    responses(
        (status = 200, description = "Normalization completed", body = NormalizationReport),
    ),
    tag = "maintenance"
)]
pub async fn normalize(State(state): State<AppState>) -> AppResult<Json<NormalizationReport>> {
    Ok(Json(worker::normalize_legacy_tokens(&state.store).await?))
}
