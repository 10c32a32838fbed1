//! Bridge configuration.
//!
//! Carries the invoke endpoint location and the push-emulated channel table.
//! The table is deliberately explicit data rather than code: which channels
//! are emulated, which backend channel each one polls, and at what cadence
//! are all adjustable without touching the emulator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{IpcError, Result};

/// Default backend origin the studio ships with.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";

/// The single fixed invoke path. Channel identity travels in the body.
pub const DEFAULT_INVOKE_PATH: &str = "/ipc";

/// One entry of the push-emulated channel table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollChannelSpec {
    /// Emulated channel name listeners subscribe to.
    pub channel: String,
    /// Backend channel the poll task invokes each tick.
    pub source: String,
    /// Fixed poll cadence in milliseconds.
    pub interval_ms: u64,
}

impl PollChannelSpec {
    /// Build a table entry.
    #[must_use]
    pub fn new(channel: impl Into<String>, source: impl Into<String>, interval_ms: u64) -> Self {
        Self {
            channel: channel.into(),
            source: source.into(),
            interval_ms,
        }
    }

    /// Poll cadence as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Configuration for the web IPC bridge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Backend origin, scheme included (e.g. `http://127.0.0.1:5001`).
    pub base_url: String,
    /// Relative path of the invoke endpoint.
    pub invoke_path: String,
    /// Push-emulated channel table.
    pub poll_channels: Vec<PollChannelSpec>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            invoke_path: DEFAULT_INVOKE_PATH.to_string(),
            poll_channels: vec![
                PollChannelSpec::new("system-usage", "get-system-usage", 2_000),
                PollChannelSpec::new("training-status", "get-training-status", 3_000),
            ],
        }
    }
}

impl BridgeConfig {
    /// Full invoke endpoint URL (base origin joined with the invoke path).
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.invoke_path
        )
    }

    /// Look up the poll-table entry for an emulated channel.
    #[must_use]
    pub fn poll_spec(&self, channel: &str) -> Option<&PollChannelSpec> {
        self.poll_channels.iter().find(|spec| spec.channel == channel)
    }

    /// Validate the configuration.
    ///
    /// Rejects a base URL without an http(s) scheme, an invoke path that is
    /// not root-relative, and poll-table entries that are empty, have a zero
    /// interval, or duplicate an emulated channel name.
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(IpcError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if !self.invoke_path.starts_with('/') {
            return Err(IpcError::Config(format!(
                "invoke_path must start with '/', got '{}'",
                self.invoke_path
            )));
        }
        for spec in &self.poll_channels {
            if spec.channel.trim().is_empty() || spec.source.trim().is_empty() {
                return Err(IpcError::Config(
                    "poll channel and source names must not be empty".to_string(),
                ));
            }
            if spec.interval_ms == 0 {
                return Err(IpcError::Config(format!(
                    "poll interval for '{}' must be greater than zero",
                    spec.channel
                )));
            }
            let occurrences = self
                .poll_channels
                .iter()
                .filter(|other| other.channel == spec.channel)
                .count();
            if occurrences > 1 {
                return Err(IpcError::Config(format!(
                    "duplicate poll channel '{}'",
                    spec.channel
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
