//! Local persistence for telemetry records and their sync state.
//!
//! Writes go through a single async lock so that concurrent inserts,
//! updates, sync transitions and deletions never interleave on a row.
//! Reads do not take the lock.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Alias, Expr, OnConflict, SimpleExpr},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entity::telemetry_logs::{self, Column, Entity, Model};
use crate::entity::{Command, MotorStatus, SyncState};
use crate::error::{AppError, AppResult};
use crate::parser::TelemetryFields;

/// Batch size for bulk inserts
const BATCH_SIZE: usize = 500;

/// Everything needed to create a record; the store assigns id, timestamp
/// and the initial `PENDING` state.
#[derive(Debug, Clone)]
pub struct NewTelemetryLog {
    pub device_identifier: String,
    pub raw_message: String,
    pub fields: TelemetryFields,
}

impl NewTelemetryLog {
    #[must_use]
    pub fn new(device_identifier: &str, raw_message: &str, fields: TelemetryFields) -> Self {
        Self {
            device_identifier: device_identifier.to_string(),
            raw_message: raw_message.to_string(),
            fields,
        }
    }
}

/// Full-row active model for an upsert by id.
fn replacement_row(record: Model) -> telemetry_logs::ActiveModel {
    telemetry_logs::ActiveModel {
        id: Set(record.id),
        timestamp: Set(record.timestamp),
        motor_status: Set(record.motor_status),
        voltage: Set(record.voltage),
        current: Set(record.current),
        water_level: Set(record.water_level),
        mode: Set(record.mode),
        clock: Set(record.clock),
        run_time: Set(record.run_time),
        command: Set(record.command),
        device_identifier: Set(record.device_identifier),
        raw_message: Set(record.raw_message),
        sync_state: Set(record.sync_state),
    }
}

/// `SYNCED` when the existing row is synced, otherwise the incoming state.
fn kept_sync_state() -> SimpleExpr {
    Expr::case(
        Expr::col((Entity, Column::SyncState)).eq(SyncState::Synced),
        SyncState::Synced,
    )
    .finally(Expr::col((Alias::new("excluded"), Column::SyncState)))
    .into()
}

#[derive(Clone)]
pub struct TelemetryStore {
    db: DatabaseConnection,
    write_lock: Arc<Mutex<()>>,
}

impl TelemetryStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create a new `PENDING` record stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn create(&self, new: NewTelemetryLog) -> AppResult<Model> {
        let fields = new.fields;
        let record = telemetry_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            timestamp: Set(Utc::now().timestamp_millis()),
            motor_status: Set(fields.motor_status),
            voltage: Set(fields.voltage),
            current: Set(fields.current),
            water_level: Set(fields.water_level),
            mode: Set(fields.mode),
            clock: Set(fields.clock),
            run_time: Set(fields.run_time),
            command: Set(Command::for_status(fields.motor_status)),
            device_identifier: Set(new.device_identifier),
            raw_message: Set(new.raw_message),
            sync_state: Set(SyncState::Pending),
        };

        let _guard = self.write_lock.lock().await;
        Ok(record.insert(&self.db).await?)
    }

    /// Insert one record, replacing any existing row with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn insert(&self, record: Model) -> AppResult<()> {
        self.insert_many(vec![record]).await.map(|_| ())
    }

    /// Insert records, replacing existing rows with the same id.
    /// An existing `SYNCED` row keeps its state. Returns the number of rows
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if any database write fails.
    pub async fn insert_many(&self, records: Vec<Model>) -> AppResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let models: Vec<telemetry_logs::ActiveModel> =
            records.into_iter().map(replacement_row).collect();

        let _guard = self.write_lock.lock().await;
        let mut written = 0;
        for chunk in models.chunks(BATCH_SIZE) {
            written += Entity::insert_many(chunk.to_vec())
                .on_conflict(
                    OnConflict::column(Column::Id)
                        .update_columns([
                            Column::Timestamp,
                            Column::MotorStatus,
                            Column::Voltage,
                            Column::Current,
                            Column::WaterLevel,
                            Column::Mode,
                            Column::Clock,
                            Column::RunTime,
                            Column::Command,
                            Column::DeviceIdentifier,
                            Column::RawMessage,
                        ])
                        .value(Column::SyncState, kept_sync_state())
                        .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await?;
        }

        Ok(written)
    }

    /// Update an existing record in place.
    ///
    /// Only the mutable columns (`motor_status`, `command`, `sync_state`) are
    /// written, and a `SYNCED` record is never moved back to `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no record has this id.
    pub async fn update(&self, record: Model) -> AppResult<Model> {
        let _guard = self.write_lock.lock().await;

        let existing = Entity::find_by_id(record.id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Telemetry log '{}' not found", record.id)))?;

        let sync_state = match existing.sync_state {
            SyncState::Synced => SyncState::Synced,
            SyncState::Pending => record.sync_state,
        };

        let mut active: telemetry_logs::ActiveModel = existing.into();
        active.motor_status = Set(record.motor_status);
        active.command = Set(record.command);
        active.sync_state = Set(sync_state);

        Ok(active.update(&self.db).await?)
    }

    /// All records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all(&self) -> AppResult<Vec<Model>> {
        Ok(Entity::find()
            .order_by_desc(Column::Timestamp)
            .all(&self.db)
            .await?)
    }

    /// Records whose timestamp lies within `[start, end]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Model>> {
        Ok(Entity::find()
            .filter(Column::Timestamp.gte(start.timestamp_millis()))
            .filter(Column::Timestamp.lte(end.timestamp_millis()))
            .order_by_desc(Column::Timestamp)
            .all(&self.db)
            .await?)
    }

    /// The most recent record, optionally only among those at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn latest(&self, since: Option<DateTime<Utc>>) -> AppResult<Option<Model>> {
        let mut query = Entity::find();
        if let Some(since) = since {
            query = query.filter(Column::Timestamp.gte(since.timestamp_millis()));
        }

        Ok(query
            .order_by_desc(Column::Timestamp)
            .one(&self.db)
            .await?)
    }

    /// All records not yet relayed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_pending(&self) -> AppResult<Vec<Model>> {
        Ok(Entity::find()
            .filter(Column::SyncState.eq(SyncState::Pending))
            .order_by_asc(Column::Timestamp)
            .all(&self.db)
            .await?)
    }

    /// The oldest `limit` pending records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending_batch(&self, limit: u64) -> AppResult<Vec<Model>> {
        Ok(Entity::find()
            .filter(Column::SyncState.eq(SyncState::Pending))
            .order_by_asc(Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    /// Move every listed `PENDING` record to `SYNCED`.
    ///
    /// Unknown ids and already synced records are left untouched. Returns the
    /// number of records that changed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_synced(&self, ids: &HashSet<Uuid>) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;
        let result = Entity::update_many()
            .col_expr(Column::SyncState, Expr::value(SyncState::Synced))
            .filter(Column::Id.is_in(ids.iter().copied()))
            .filter(Column::SyncState.eq(SyncState::Pending))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Retention sweep: delete every record strictly older than `cutoff`,
    /// pending or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_old_logs(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let _guard = self.write_lock.lock().await;
        let result = Entity::delete_many()
            .filter(Column::Timestamp.lt(cutoff.timestamp_millis()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Rewrite the legacy `STATUS_RESPONSE` command to `STATUS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn fix_status_response_command(&self) -> AppResult<u64> {
        let _guard = self.write_lock.lock().await;
        let result = Entity::update_many()
            .col_expr(Column::Command, Expr::value(Command::Status))
            .filter(Column::Command.eq(Command::StatusResponse))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Rewrite the legacy `UNKNOWN` motor status to `STATUS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn fix_unknown_motor_status(&self) -> AppResult<u64> {
        let _guard = self.write_lock.lock().await;
        let result = Entity::update_many()
            .col_expr(Column::MotorStatus, Expr::value(MotorStatus::Status))
            .filter(Column::MotorStatus.eq(MotorStatus::Unknown))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
