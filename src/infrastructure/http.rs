//! HTTP transport for admitted payloads.
//!
//! Serializes the payload to JSON and POSTs it to a fixed endpoint, passing
//! the submission credential as the `Authorization` header. A non-2xx answer
//! is a delivery failure; nothing here retries.

use crate::application::ports::{Transport, TransportError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Document creation endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// URL every payload is posted to
    pub endpoint: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl HttpTransportConfig {
    /// Create a config posting to `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Posts JSON payloads with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for the default endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a transport from explicit configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Other(format!("unable to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    /// Create a transport reusing an existing client.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// The URL payloads are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<P> Transport<P> for HttpTransport
where
    P: Serialize + Send + Sync + 'static,
{
    async fn send(&self, payload: &P, credential: &str) -> Result<(), TransportError> {
        let body =
            serde_json::to_vec(payload).map_err(|e| TransportError::Serialize(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, credential)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(TransportError::Status {
            code: status.as_u16(),
            body,
        })
    }
}
