use std::sync::Arc;

use crate::config::Config;
use crate::ingest::Dispatcher;
use crate::notify::Notifier;
use crate::registry::DeviceRegistry;
use crate::relay::{Relay, SyncForwarder};
use crate::store::TelemetryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: TelemetryStore,
    pub config: Arc<Config>,
    pub relay: Arc<dyn Relay>,
    pub registry: Arc<dyn DeviceRegistry>,
    pub notifier: Arc<dyn Notifier>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        store: TelemetryStore,
        config: Config,
        relay: Arc<dyn Relay>,
        registry: Arc<dyn DeviceRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let forwarder = SyncForwarder::new(Arc::clone(&relay));
        let dispatcher = Dispatcher::new(store.clone(), forwarder);

        Self {
            store,
            config: Arc::new(config),
            relay,
            registry,
            notifier,
            dispatcher,
        }
    }
}
