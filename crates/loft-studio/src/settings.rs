//! Studio settings loading.
//!
//! Settings live in `~/.loft/settings.json`. Loading is a three-layer merge:
//! compiled defaults, then the settings file (deep-merged so partial files
//! work), then `LOFT_*` environment variables. Invalid env values are logged
//! and ignored rather than failing startup.

use std::path::{Path, PathBuf};

use loft_ipc::config::BridgeConfig;
use loft_ipc::detect::{DeployMode, HostEnvironment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when loading or parsing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Top-level studio settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioSettings {
    /// Where and how the studio is deployed.
    pub deploy: DeploySettings,
    /// IPC bridge configuration (endpoint + poll table).
    pub bridge: BridgeConfig,
}

/// Deployment settings: how the studio decides between native IPC and the
/// HTTP bridge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploySettings {
    /// Deployment mode. `cloud` always uses the HTTP bridge.
    pub mode: DeployMode,
    /// Forces the HTTP bridge when `true`, even where detection would pick
    /// the native channel. `false` and unset both defer to detection.
    pub force_web_ipc: Option<bool>,
    /// Host descriptor reported to environment detection. Defaults to a
    /// browser-style string so a plain studio build uses the HTTP bridge.
    pub host_descriptor: String,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            mode: DeployMode::Desktop,
            force_web_ipc: None,
            host_descriptor: default_host_descriptor(),
        }
    }
}

fn default_host_descriptor() -> String {
    format!(
        "LoftStudio/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

impl StudioSettings {
    /// Build the [`HostEnvironment`] these settings describe.
    ///
    /// The studio binary never holds a native channel itself; when one is
    /// available the embedding shell attaches it before install.
    #[must_use]
    pub fn host_environment(&self) -> HostEnvironment {
        let mut env =
            HostEnvironment::browser(self.deploy.host_descriptor.clone(), self.deploy.mode);
        if let Some(force) = self.deploy.force_web_ipc {
            env = env.with_force_emulation(force);
        }
        env
    }
}

/// Resolve the settings file path (`~/.loft/settings.json`).
#[must_use]
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".loft").join("settings.json")
}

/// Load settings from the default path.
pub fn load_settings() -> Result<StudioSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path.
///
/// A missing file yields the defaults. A present file is deep-merged over
/// the defaults, so partial files only override the keys they mention.
/// `LOFT_*` environment variables are applied last.
pub fn load_settings_from_path(path: &Path) -> Result<StudioSettings> {
    let mut merged = serde_json::to_value(StudioSettings::default())?;

    if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let file_value: Value = serde_json::from_str(&raw)?;
        deep_merge(&mut merged, &file_value);
        tracing::debug!(path = %path.display(), "settings file merged over defaults");
    } else {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
    }

    let mut settings: StudioSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursively merge `source` into `target`.
///
/// Objects merge key by key; explicit `null` values in `source` are skipped
/// so a file cannot accidentally blank a default. Arrays and scalars replace
/// the target value wholesale.
fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                if source_value.is_null() {
                    continue;
                }
                match target_map.get_mut(key) {
                    Some(target_value) => deep_merge(target_value, source_value),
                    None => {
                        let _ = target_map.insert(key.clone(), source_value.clone());
                    }
                }
            }
        }
        (target_slot, source_value) => {
            *target_slot = source_value.clone();
        }
    }
}

fn apply_env_overrides(settings: &mut StudioSettings) {
    // ── Deploy ──────────────────────────────────────────────────────────────
    if let Some(mode) = read_env_deploy_mode("LOFT_DEPLOY_MODE") {
        settings.deploy.mode = mode;
    }
    if let Some(force) = read_env_bool("LOFT_WEB_IPC") {
        settings.deploy.force_web_ipc = Some(force);
    }
    if let Some(descriptor) = read_env_string("LOFT_HOST_DESCRIPTOR") {
        settings.deploy.host_descriptor = descriptor;
    }

    // ── Backend ─────────────────────────────────────────────────────────────
    if let Some(url) = read_env_string("LOFT_BACKEND_URL") {
        settings.bridge.base_url = url;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Env parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_deploy_mode(value: &str) -> Option<DeployMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "desktop" => Some(DeployMode::Desktop),
        "cloud" => Some(DeployMode::Cloud),
        _ => None,
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match parse_bool(&value) {
        Some(parsed) => Some(parsed),
        None => {
            tracing::warn!(key = name, value = %value, "invalid boolean env var, ignoring");
            None
        }
    }
}

fn read_env_deploy_mode(name: &str) -> Option<DeployMode> {
    let value = std::env::var(name).ok()?;
    match parse_deploy_mode(&value) {
        Some(parsed) => Some(parsed),
        None => {
            tracing::warn!(key = name, value = %value, "invalid deploy mode env var, ignoring");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
