//! Field extraction engine.
//!
//! Turns the free-form text a motor controller sends into structured
//! telemetry. Every field has its own recognizer; recognizers are
//! case-insensitive, ignore field order and never depend on each other.
//!
//! A missing label or a malformed number only leaves that field empty.
//! Extraction as a whole fails only on an internal fault, in which case the
//! caller routes the message down the unparsed path.

mod recognizers;

use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

use crate::entity::MotorStatus;

/// Structured fields recognized in a message body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryFields {
    /// Always present; `STATUS` when no motor token was found.
    pub motor_status: MotorStatus,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub water_level: Option<f64>,
    pub mode: Option<String>,
    /// Either an `ON`/`OFF` token or a time of day, whichever the device sent.
    pub clock: Option<String>,
    /// Seconds.
    pub run_time: Option<i64>,
}

impl Default for TelemetryFields {
    fn default() -> Self {
        Self {
            motor_status: MotorStatus::Status,
            voltage: None,
            current: None,
            water_level: None,
            mode: None,
            clock: None,
            run_time: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Field recognizer panicked: {0}")]
    Internal(String),
}

/// Extract telemetry fields from `text`.
///
/// # Errors
///
/// Returns `ExtractionError::Internal` only if a recognizer faults. A text
/// with no recognizable field still yields `Ok` with every optional field empty.
pub fn extract(text: &str) -> Result<TelemetryFields, ExtractionError> {
    panic::catch_unwind(AssertUnwindSafe(|| recognize(text))).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ExtractionError::Internal(reason)
    })
}

fn recognize(text: &str) -> TelemetryFields {
    TelemetryFields {
        motor_status: recognizers::motor_status(text).unwrap_or(MotorStatus::Status),
        voltage: recognizers::voltage(text),
        current: recognizers::current(text),
        water_level: recognizers::water_level(text),
        mode: recognizers::mode(text),
        clock: recognizers::clock(text),
        run_time: recognizers::run_time(text),
    }
}
