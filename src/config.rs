use std::collections::HashSet;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Remote relay
    pub relay_base_url: String,
    pub relay_bearer_token: Option<String>,

    // Device registry
    pub registry_url: Option<String>,
    pub known_devices: HashSet<String>,
    pub registry_cache_ttl_seconds: u64,

    // Background sync and retention
    pub sync_pending_interval_seconds: u64,
    pub sync_batch_size: u64,
    pub retention_days: i64,
    pub retention_sweep_interval_seconds: u64,
    pub run_normalization_on_startup: bool,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_ingest_per_second: u64,
    pub rate_limit_ingest_burst: u32,

    // Application metadata
    pub deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://telemetry.db?mode=rwc".to_string(),
            relay_base_url: "http://localhost:8080".to_string(),
            relay_bearer_token: None,
            registry_url: None,
            known_devices: HashSet::new(),
            registry_cache_ttl_seconds: 60,
            sync_pending_interval_seconds: 300,
            sync_batch_size: 100,
            retention_days: 30,
            retention_sweep_interval_seconds: 86_400,
            run_normalization_on_startup: true,
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,
            disable_rate_limiting: false,
            rate_limit_ingest_per_second: 10,
            rate_limit_ingest_burst: 60,
            deployment: Deployment::Local,
        }
    }
}

/// Parse an optional variable, keeping `default` when it is unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma separated identifier list. Entries are trimmed of
/// surrounding whitespace only; the identifiers themselves are kept verbatim.
#[must_use]
pub fn parse_device_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),

            // Remote relay
            relay_base_url: non_empty("RELAY_BASE_URL")
                .ok_or(ConfigError::Missing("RELAY_BASE_URL"))?,
            relay_bearer_token: non_empty("RELAY_BEARER_TOKEN"),

            // Device registry
            registry_url: non_empty("REGISTRY_URL"),
            known_devices: env::var("KNOWN_DEVICES")
                .map(|raw| parse_device_list(&raw))
                .unwrap_or_default(),
            registry_cache_ttl_seconds: env_or(
                "REGISTRY_CACHE_TTL_SECONDS",
                defaults.registry_cache_ttl_seconds,
            ),

            // Background sync and retention
            sync_pending_interval_seconds: env_or(
                "SYNC_PENDING_INTERVAL_SECONDS",
                defaults.sync_pending_interval_seconds,
            ),
            sync_batch_size: env_or("SYNC_BATCH_SIZE", defaults.sync_batch_size),
            retention_days: env_or("RETENTION_DAYS", defaults.retention_days),
            retention_sweep_interval_seconds: env_or(
                "RETENTION_SWEEP_INTERVAL_SECONDS",
                defaults.retention_sweep_interval_seconds,
            ),
            run_normalization_on_startup: env_or(
                "RUN_NORMALIZATION_ON_STARTUP",
                defaults.run_normalization_on_startup,
            ),

            // API settings
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: env_or("API_PORT", defaults.api_port),

            // Rate limiting
            disable_rate_limiting: env_or("DISABLE_RATE_LIMITING", defaults.disable_rate_limiting),
            rate_limit_ingest_per_second: env_or(
                "RATE_LIMIT_INGEST_PER_SECOND",
                defaults.rate_limit_ingest_per_second,
            ),
            rate_limit_ingest_burst: env_or(
                "RATE_LIMIT_INGEST_BURST",
                defaults.rate_limit_ingest_burst,
            ),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
