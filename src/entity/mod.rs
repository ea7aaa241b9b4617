pub mod telemetry_logs;

pub use telemetry_logs::{Command, MotorStatus, SyncState};
