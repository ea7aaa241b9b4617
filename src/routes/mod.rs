pub mod health;
pub mod logs;
pub mod maintenance;
pub mod messages;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        messages::ingest_messages,
        logs::list_logs,
        logs::latest_log,
        logs::pending_logs,
        logs::mark_synced,
        logs::delete_old_logs,
        maintenance::normalize,
    ),
    components(
        schemas(
            crate::ingest::InboundMessage,
            messages::IngestRequest,
            messages::IngestResponse,
            logs::LogResponse,
            logs::MarkSyncedRequest,
            logs::MarkSyncedResponse,
            logs::DeleteResponse,
            crate::sync::worker::NormalizationReport,
            crate::entity::MotorStatus,
            crate::entity::Command,
            crate::entity::SyncState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "ingest", description = "Inbound device messages"),
        (name = "logs", description = "Stored telemetry and sync state"),
        (name = "maintenance", description = "Historical data fixups"),
    ),
    info(
        title = "Motor Telemetry API",
        description = "Telemetry ingestion for SMS-reporting motor controllers",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let ingest_routes_base = Router::new().route("/messages", post(messages::ingest_messages));

    let ingest_routes = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        ingest_routes_base
    } else {
        tracing::info!(
            ingest_rate = %format!("{}/s burst {}", config.rate_limit_ingest_per_second, config.rate_limit_ingest_burst),
            "Rate limiting configured"
        );

        let ingest_limiter = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(config.rate_limit_ingest_per_second.max(1))
            .burst_size(config.rate_limit_ingest_burst.max(1))
            .finish()
            .expect("Failed to create ingest rate limiter");

        ingest_routes_base.layer(GovernorLayer {
            config: Arc::new(ingest_limiter),
        })
    };

    let log_routes = Router::new()
        .route(
            "/logs",
            get(logs::list_logs).delete(logs::delete_old_logs),
        )
        .route("/logs/latest", get(logs::latest_log))
        .route("/logs/pending", get(logs::pending_logs))
        .route("/logs/sync", post(logs::mark_synced))
        .route("/maintenance/normalize", post(maintenance::normalize));

    let api_routes = Router::new()
        .merge(ingest_routes)
        .merge(log_routes)
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB body limit

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
