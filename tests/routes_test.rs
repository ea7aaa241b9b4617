//! HTTP surface, driven through the router without a socket.

mod support;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use motor_telemetry::common::AppState;
use motor_telemetry::config::Config;
use motor_telemetry::registry::StaticRegistry;
use motor_telemetry::routes::build_router;
use motor_telemetry::store::TelemetryStore;

use support::{memory_store, RecordingNotifier, RecordingRelay};

const PUMP: &str = "+919876543210";

async fn app() -> (Router, TelemetryStore) {
    let store = memory_store().await;
    let config = Config {
        disable_rate_limiting: true,
        ..Config::default()
    };
    let state = AppState::new(
        store.clone(),
        config,
        Arc::new(RecordingRelay::default()),
        Arc::new(StaticRegistry::new([PUMP])),
        Arc::new(RecordingNotifier::default()),
    );
    (build_router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Background persistence is detached from the request; poll until it lands.
async fn wait_for_logs(store: &TelemetryStore, count: usize) {
    for _ in 0..100 {
        if store.list_all().await.unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {count} stored logs");
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _) = app().await;

    let (status, _) = send(&app, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn ingest_accepts_batch_and_stores_known_senders() {
    let (app, store) = app().await;
    let body = json!({
        "messages": [
            { "sender": PUMP, "body": "Motor: ON Voltage:12.5 Current:2.3" },
            { "sender": "stranger", "body": "Motor: ON" },
        ]
    });

    let (status, bytes) = send(&app, post_json("/api/messages", &body)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let response: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(response["accepted"], 2);

    wait_for_logs(&store, 1).await;
    let (status, bytes) = send(&app, get("/api/logs")).await;
    assert_eq!(status, StatusCode::OK);
    let logs: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["motor_status"], "ON");
    assert_eq!(logs[0]["voltage"], 12.5);
    assert_eq!(logs[0]["water_level"], Value::Null);
    assert_eq!(logs[0]["sync_state"], "PENDING");
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let (app, _) = app().await;

    let (status, _) = send(
        &app,
        get("/api/logs?start=2026-02-01T00:00:00Z&end=2026-01-01T00:00:00Z"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn latest_on_empty_store_is_not_found() {
    let (app, _) = app().await;

    let (status, bytes) = send(&app, get("/api/logs/latest")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn mark_synced_then_pending_is_empty() {
    let (app, store) = app().await;
    let ingest = json!({ "messages": [{ "sender": PUMP, "body": "Motor: OFF" }] });
    send(&app, post_json("/api/messages", &ingest)).await;
    wait_for_logs(&store, 1).await;

    let id = store.list_all().await.unwrap()[0].id;
    let (status, bytes) = send(&app, post_json("/api/logs/sync", &json!({ "ids": [id] }))).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["updated"], 1);

    let (_, bytes) = send(&app, get("/api/logs/pending")).await;
    let pending: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(pending, json!([]));
}

#[tokio::test]
async fn csv_export_has_header_and_one_row_per_log() {
    let (app, store) = app().await;
    let ingest = json!({
        "messages": [
            { "sender": PUMP, "body": "Motor: ON" },
            { "sender": PUMP, "body": "Motor: OFF" },
        ]
    });
    send(&app, post_json("/api/messages", &ingest)).await;
    wait_for_logs(&store, 2).await;

    let response = app.clone().oneshot(get("/api/logs?format=csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,timestamp,motor_status"));
}

#[tokio::test]
async fn empty_csv_export_still_has_header() {
    let (app, _) = app().await;

    let request = Request::builder()
        .uri("/api/logs")
        .header(header::ACCEPT, "text/csv")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        "id,timestamp,motor_status,voltage,current,water_level,mode,clock,\
         run_time,command,device_identifier,raw_message,sync_state"
    );
}

#[tokio::test]
async fn delete_and_normalize_report_counts() {
    let (app, _) = app().await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/logs?before=2000-01-01T00:00:00Z")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap()["deleted"], 0);

    let (status, bytes) = send(&app, post_json("/api/maintenance/normalize", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&bytes).unwrap(),
        json!({ "status_response_commands": 0, "unknown_motor_statuses": 0 })
    );
}
