//! Notification collaborators. Rendering and delivery belong to the
//! implementation; the pipeline only hands records over.

use async_trait::async_trait;

use crate::entity::telemetry_logs;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// A message was parsed and stored.
    async fn notify_record(&self, record: &telemetry_logs::Model);

    /// A message from a known device could not be parsed.
    async fn notify_unparsed(&self, sender: &str, body: &str);
}

/// Emits notifications as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_record(&self, record: &telemetry_logs::Model) {
        tracing::info!(
            id = %record.id,
            sender = %record.device_identifier,
            motor_status = %record.motor_status,
            voltage = ?record.voltage,
            current = ?record.current,
            water_level = ?record.water_level,
            "Motor telemetry received"
        );
    }

    async fn notify_unparsed(&self, sender: &str, body: &str) {
        tracing::info!(sender = %sender, body = %body, "Unparsed device message");
    }
}
