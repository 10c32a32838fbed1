//! HTTP transport adapter.
//!
//! Turns a named-channel call into a single POST against the fixed invoke
//! endpoint and maps the outcome into the normalized result envelope. The
//! adapter is deliberately thin: no retries, no coalescing, and no timeout
//! beyond what the underlying client enforces. Each call is one independent
//! request.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::BridgeConfig;
use crate::envelope::InvokeEnvelope;
use crate::errors::{IpcError, Result};

/// Request/response half of the IPC surface.
///
/// The bridge, the push emulator, and typed clients all reach the backend
/// through this trait, so tests can substitute a scripted double without an
/// HTTP server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `channel` with `args` and return the backend's raw JSON value.
    async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value>;
}

/// [`Transport`] implementation backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport from `config`, constructing a fresh HTTP client.
    ///
    /// Validates the configuration up front so later `invoke` calls have no
    /// synchronous failure mode.
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| IpcError::Config(format!("failed to build HTTP client: {err}")))?;
        Self::with_client(config, client)
    }

    /// Build a transport reusing an existing `reqwest` client.
    pub fn with_client(config: &BridgeConfig, client: reqwest::Client) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    /// Full URL of the invoke endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value> {
        if channel.trim().is_empty() {
            return Err(IpcError::EmptyChannel);
        }

        let envelope = InvokeEnvelope::new(channel, args);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|err| IpcError::network(channel, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IpcError::http(
                channel,
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
            ));
        }

        // Read the body fully before parsing so a connection dropped
        // mid-body maps to a network failure, not a decode failure.
        let body = response
            .text()
            .await
            .map_err(|err| IpcError::network(channel, err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| IpcError::decode(channel, err.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
