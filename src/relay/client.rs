use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;

use crate::config::Config;
use crate::entity::telemetry_logs;
use crate::error::{AppError, AppResult};
use crate::relay::{Relay, RelayEvent};

/// JSON relay over HTTP.
///
/// The client is built without a request timeout; a hung endpoint holds the
/// calling task until the connection is dropped by the peer.
pub struct HttpRelay {
    http_client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

#[derive(Serialize)]
struct LogsUpload<'a> {
    logs: &'a [telemetry_logs::Model],
}

impl HttpRelay {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.relay_base_url.trim_end_matches('/').to_string(),
            bearer_token: config.relay_bearer_token.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> AppResult<Response> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .authorized(self.http_client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Relay(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Relay("Rate limited (429)".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::Relay(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl Relay for HttpRelay {
    /// POST `{base}/events`.
    async fn send_event(&self, event: &RelayEvent) -> AppResult<()> {
        self.post_json("/events", event).await.map(|_| ())
    }

    /// POST `{base}/logs` with `{"logs": [...]}`.
    async fn upload_logs(&self, logs: &[telemetry_logs::Model]) -> AppResult<()> {
        if logs.is_empty() {
            return Ok(());
        }
        self.post_json("/logs", &LogsUpload { logs }).await.map(|_| ())
    }
}
