//! Ingestion dispatch: filter, extract, then forward and persist
//! concurrently.
//!
//! Every failure is logged where it happens. Nothing is returned to the
//! delivery adapter except the handles of the spawned work, which carry no
//! outcome.

use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::ingest::filter::is_in_scope;
use crate::notify::Notifier;
use crate::parser::{self, ExtractionError, TelemetryFields};
use crate::registry::{DeviceRegistry, DeviceSet};
use crate::relay::{SyncForwarder, MESSAGE_RECEIVED};
use crate::store::{NewTelemetryLog, TelemetryStore};

/// One message as handed over by the delivery adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct InboundMessage {
    /// Sender identifier, compared verbatim against the device registry.
    pub sender: String,
    /// Message text, stored unmodified.
    pub body: String,
}

impl InboundMessage {
    #[must_use]
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }
}

/// Turns a message body into telemetry fields.
pub type Extractor = fn(&str) -> Result<TelemetryFields, ExtractionError>;

#[derive(Clone)]
pub struct Dispatcher {
    store: TelemetryStore,
    forwarder: SyncForwarder,
    extract: Extractor,
}

impl Dispatcher {
    #[must_use]
    pub fn new(store: TelemetryStore, forwarder: SyncForwarder) -> Self {
        Self {
            store,
            forwarder,
            extract: parser::extract,
        }
    }

    /// Replace the field extractor used for every message.
    #[must_use]
    pub fn with_extractor(mut self, extract: Extractor) -> Self {
        self.extract = extract;
        self
    }

    /// Process a delivered batch.
    ///
    /// The registry is read once and used as a snapshot for the whole batch.
    /// Messages are handled in delivery order, but the work spawned for them
    /// runs without any ordering guarantee.
    pub async fn dispatch(
        &self,
        messages: Vec<InboundMessage>,
        registry: &dyn DeviceRegistry,
        notifier: Arc<dyn Notifier>,
    ) -> Vec<JoinHandle<()>> {
        let known = match registry.known_devices().await {
            Ok(known) => known,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    count = messages.len(),
                    "Failed to read device registry, dropping batch"
                );
                return Vec::new();
            }
        };

        let mut handles = Vec::with_capacity(messages.len() * 2);
        for message in messages {
            self.dispatch_one(message, &known, &notifier, &mut handles);
        }
        handles
    }

    fn dispatch_one(
        &self,
        message: InboundMessage,
        known: &DeviceSet,
        notifier: &Arc<dyn Notifier>,
        handles: &mut Vec<JoinHandle<()>>,
    ) {
        if !is_in_scope(&message.sender, known) {
            tracing::debug!(sender = %message.sender, "Dropping message from unknown sender");
            return;
        }

        let fields = match (self.extract)(&message.body) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(error = %e, sender = %message.sender, "Failed to parse message");
                let notifier = Arc::clone(notifier);
                handles.push(tokio::spawn(async move {
                    notifier.notify_unparsed(&message.sender, &message.body).await;
                }));
                return;
            }
        };

        handles.push(self.forwarder.forward(
            MESSAGE_RECEIVED,
            fields.motor_status.as_str(),
            &message.sender,
        ));

        let store = self.store.clone();
        let notifier = Arc::clone(notifier);
        let new_log = NewTelemetryLog::new(&message.sender, &message.body, fields);
        handles.push(tokio::spawn(async move {
            match store.create(new_log).await {
                Ok(record) => {
                    tracing::debug!(id = %record.id, sender = %record.device_identifier, "Telemetry stored");
                    notifier.notify_record(&record).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, sender = %message.sender, "Failed to store telemetry");
                }
            }
        }));
    }
}
