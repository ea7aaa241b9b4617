//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use motor_telemetry::entity::{telemetry_logs, Command, MotorStatus, SyncState};
use motor_telemetry::error::{AppError, AppResult};
use motor_telemetry::notify::Notifier;
use motor_telemetry::registry::{DeviceRegistry, DeviceSet};
use motor_telemetry::relay::{Relay, RelayEvent};
use motor_telemetry::store::TelemetryStore;

/// Fresh in-memory SQLite store with the real migrations applied.
pub async fn memory_store() -> TelemetryStore {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // A single pooled connection keeps the in-memory database alive and shared.
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect to sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("apply migrations");
    TelemetryStore::new(db)
}

/// A stored row with explicit values, for seeding legacy or time-shifted data.
pub fn log_at(
    timestamp: DateTime<Utc>,
    command: Command,
    motor_status: MotorStatus,
    sync_state: SyncState,
) -> telemetry_logs::Model {
    telemetry_logs::Model {
        id: Uuid::new_v4(),
        timestamp: timestamp.timestamp_millis(),
        motor_status,
        voltage: None,
        current: None,
        water_level: None,
        mode: None,
        clock: None,
        run_time: None,
        command,
        device_identifier: "+15550100".to_string(),
        raw_message: "legacy".to_string(),
        sync_state,
    }
}

#[derive(Default)]
pub struct RecordingRelay {
    pub events: Mutex<Vec<RelayEvent>>,
    pub uploads: Mutex<Vec<Vec<Uuid>>>,
    pub fail: bool,
}

impl RecordingRelay {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<RelayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Vec<Uuid>> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Relay for RecordingRelay {
    async fn send_event(&self, event: &RelayEvent) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Relay("unreachable".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn upload_logs(&self, logs: &[telemetry_logs::Model]) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Relay("unreachable".to_string()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push(logs.iter().map(|log| log.id).collect());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub records: Mutex<Vec<telemetry_logs::Model>>,
    pub unparsed: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn records(&self) -> Vec<telemetry_logs::Model> {
        self.records.lock().unwrap().clone()
    }

    pub fn unparsed(&self) -> Vec<(String, String)> {
        self.unparsed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_record(&self, record: &telemetry_logs::Model) {
        self.records.lock().unwrap().push(record.clone());
    }

    async fn notify_unparsed(&self, sender: &str, body: &str) {
        self.unparsed
            .lock()
            .unwrap()
            .push((sender.to_string(), body.to_string()));
    }
}

pub struct UnreachableRegistry;

#[async_trait]
impl DeviceRegistry for UnreachableRegistry {
    async fn known_devices(&self) -> AppResult<DeviceSet> {
        Err(AppError::Registry("connection refused".to_string()))
    }
}

pub fn ids(records: &[&telemetry_logs::Model]) -> HashSet<Uuid> {
    records.iter().map(|r| r.id).collect()
}
