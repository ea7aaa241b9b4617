//! Relay of telemetry to the remote endpoint.

pub mod client;
pub mod forwarder;

pub use client::HttpRelay;
pub use forwarder::{SyncForwarder, MESSAGE_RECEIVED};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::telemetry_logs;
use crate::error::AppResult;

/// Event published for every accepted inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEvent {
    pub event_type: String,
    pub motor_status: String,
    pub device_identifier: String,
}

/// Remote relay collaborator.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Publish a single event.
    async fn send_event(&self, event: &RelayEvent) -> AppResult<()>;

    /// Upload stored records to the authoritative remote store.
    async fn upload_logs(&self, logs: &[telemetry_logs::Model]) -> AppResult<()>;
}
