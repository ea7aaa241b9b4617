//! Device registry collaborators.
//!
//! The registry is read once per dispatch call and treated as a snapshot for
//! the rest of that call.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub type DeviceSet = Arc<HashSet<String>>;

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Current set of known device identifiers.
    async fn known_devices(&self) -> AppResult<DeviceSet>;
}

/// Fixed registry, typically loaded from `KNOWN_DEVICES`.
pub struct StaticRegistry {
    devices: DeviceSet,
}

impl StaticRegistry {
    #[must_use]
    pub fn new<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: Arc::new(devices.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl DeviceRegistry for StaticRegistry {
    async fn known_devices(&self) -> AppResult<DeviceSet> {
        Ok(Arc::clone(&self.devices))
    }
}

/// Entries accepted from the registry endpoint: bare strings or objects
/// carrying an `identifier`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegistryEntry {
    Bare(String),
    Device { identifier: String },
}

impl RegistryEntry {
    fn into_identifier(self) -> String {
        match self {
            Self::Bare(id) | Self::Device { identifier: id } => id,
        }
    }
}

/// Registry backed by an HTTP endpoint returning a JSON array of devices.
/// The fetched set is cached for `REGISTRY_CACHE_TTL_SECONDS`.
pub struct HttpRegistry {
    http_client: Client,
    url: String,
    cache: Cache<(), DeviceSet>,
}

impl HttpRegistry {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(url: &str, config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.registry_cache_ttl_seconds))
            .build();

        Ok(Self {
            http_client,
            url: url.to_string(),
            cache,
        })
    }

    async fn fetch(&self) -> AppResult<DeviceSet> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::Registry(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Registry(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let entries: Vec<RegistryEntry> = response
            .json()
            .await
            .map_err(|e| AppError::Registry(format!("Failed to parse response: {e}")))?;

        let devices: HashSet<String> = entries
            .into_iter()
            .map(RegistryEntry::into_identifier)
            .collect();

        tracing::debug!(count = devices.len(), "Device registry refreshed");
        Ok(Arc::new(devices))
    }
}

#[async_trait]
impl DeviceRegistry for HttpRegistry {
    async fn known_devices(&self) -> AppResult<DeviceSet> {
        if let Some(devices) = self.cache.get(&()).await {
            return Ok(devices);
        }

        let devices = self.fetch().await?;
        self.cache.insert((), Arc::clone(&devices)).await;
        Ok(devices)
    }
}

/// Pick the registry implementation from configuration.
///
/// # Errors
///
/// Returns an error if the HTTP registry client cannot be constructed.
pub fn from_config(config: &Config) -> AppResult<Arc<dyn DeviceRegistry>> {
    match &config.registry_url {
        Some(url) => {
            tracing::info!(url = %url, "Using HTTP device registry");
            Ok(Arc::new(HttpRegistry::new(url, config)?))
        }
        None => {
            tracing::info!(count = config.known_devices.len(), "Using static device registry");
            Ok(Arc::new(StaticRegistry::new(config.known_devices.iter().cloned())))
        }
    }
}
