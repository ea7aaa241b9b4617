use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One parsed inbound message.
///
/// `timestamp` is ingestion time in Unix epoch milliseconds. Only
/// `motor_status`, `command` and `sync_state` are ever rewritten after the
/// row is created.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "telemetry_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub timestamp: i64,
    pub motor_status: MotorStatus,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub water_level: Option<f64>,
    pub mode: Option<String>,
    pub clock: Option<String>,
    pub run_time: Option<i64>,
    pub command: Command,
    pub device_identifier: String,
    #[sea_orm(column_type = "Text")]
    pub raw_message: String,
    pub sync_state: SyncState,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Ingestion time as a UTC instant.
    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MotorStatus {
    #[sea_orm(string_value = "ON")]
    #[serde(rename = "ON")]
    On,
    #[sea_orm(string_value = "OFF")]
    #[serde(rename = "OFF")]
    Off,
    /// Fallback when the message carries no recognizable motor token.
    #[sea_orm(string_value = "STATUS")]
    #[serde(rename = "STATUS")]
    Status,
    /// Legacy fallback token, rewritten to `STATUS` by normalization.
    #[sea_orm(string_value = "UNKNOWN")]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl MotorStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Status => "STATUS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for MotorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Command {
    #[sea_orm(string_value = "MOTOR_ON")]
    #[serde(rename = "MOTOR_ON")]
    MotorOn,
    #[sea_orm(string_value = "MOTOR_OFF")]
    #[serde(rename = "MOTOR_OFF")]
    MotorOff,
    #[sea_orm(string_value = "STATUS")]
    #[serde(rename = "STATUS")]
    Status,
    /// Legacy token, rewritten to `STATUS` by normalization.
    #[sea_orm(string_value = "STATUS_RESPONSE")]
    #[serde(rename = "STATUS_RESPONSE")]
    StatusResponse,
}

impl Command {
    /// Command implied by the motor state a device reported.
    #[must_use]
    pub fn for_status(status: MotorStatus) -> Self {
        match status {
            MotorStatus::On => Self::MotorOn,
            MotorStatus::Off => Self::MotorOff,
            MotorStatus::Status | MotorStatus::Unknown => Self::Status,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MotorOn => "MOTOR_ON",
            Self::MotorOff => "MOTOR_OFF",
            Self::Status => "STATUS",
            Self::StatusResponse => "STATUS_RESPONSE",
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SyncState {
    #[sea_orm(string_value = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SYNCED")]
    #[serde(rename = "SYNCED")]
    Synced,
}
