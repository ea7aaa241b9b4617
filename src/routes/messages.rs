use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::AppState;
use crate::ingest::InboundMessage;

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    /// Messages handed to the dispatcher. Out-of-scope senders are counted too;
    /// they are dropped silently afterwards.
    pub accepted: usize,
}

/// Deliver inbound device messages
///
/// Processing happens in the background; the response never reflects
/// filtering, parsing or storage outcomes.
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = IngestRequest,
    responses(
        (status = 202, description = "Messages accepted for processing", body = IngestResponse),
    ),
    tag = "ingest"
)]
pub async fn ingest_messages(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> (StatusCode, Json<IngestResponse>) {
    let accepted = request.messages.len();

    // Handles are dropped: the spawned work runs detached.
    let _ = state
        .dispatcher
        .dispatch(
            request.messages,
            state.registry.as_ref(),
            state.notifier.clone(),
        )
        .await;

    (StatusCode::ACCEPTED, Json(IngestResponse { accepted }))
}
