use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::relay::{Relay, RelayEvent};

/// Event type relayed when a device message has been accepted.
pub const MESSAGE_RECEIVED: &str = "message received";

/// Best-effort, fire-and-forget relay of events.
///
/// Each forward runs in its own task. A failure is logged inside that task
/// and then dropped: there is no retry, no queue and no timeout.
#[derive(Clone)]
pub struct SyncForwarder {
    relay: Arc<dyn Relay>,
}

impl SyncForwarder {
    #[must_use]
    pub fn new(relay: Arc<dyn Relay>) -> Self {
        Self { relay }
    }

    /// Spawn the forward. The returned handle never carries an outcome; it is
    /// only useful to wait for completion.
    pub fn forward(
        &self,
        event_type: &str,
        motor_status: &str,
        device_identifier: &str,
    ) -> JoinHandle<()> {
        let relay = Arc::clone(&self.relay);
        let event = RelayEvent {
            event_type: event_type.to_string(),
            motor_status: motor_status.to_string(),
            device_identifier: device_identifier.to_string(),
        };

        tokio::spawn(async move {
            match relay.send_event(&event).await {
                Ok(()) => tracing::debug!(
                    event_type = %event.event_type,
                    sender = %event.device_identifier,
                    "Event forwarded"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    event_type = %event.event_type,
                    sender = %event.device_identifier,
                    "Failed to forward event, dropping it"
                ),
            }
        })
    }
}
