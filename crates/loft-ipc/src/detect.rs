//! Host environment detection.
//!
//! Decides whether the web bridge should be installed at all. A host that
//! already provides a native IPC channel is always left untouched; otherwise
//! emulation activates when the build forces it, when the deployment mode is
//! cloud, or when the host identification string does not look like the
//! native desktop shell.
//!
//! Detection itself is pure; the installation guard in [`crate::bridge`]
//! makes sure it is evaluated at most once per slot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bridge::IpcSurface;

/// Marker substring the native desktop shell embeds in its host descriptor.
pub const NATIVE_SHELL_MARKER: &str = "LoftShell";

/// Where this build is meant to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    /// Desktop build; a native shell is expected to host the app.
    #[default]
    Desktop,
    /// Cloud build; only HTTP reaches the backend.
    Cloud,
}

/// Everything detection needs to know about the host, assembled by the
/// composition root.
pub struct HostEnvironment {
    /// Native IPC channel supplied by the host shell, when present.
    pub native: Option<Arc<dyn IpcSurface>>,
    /// Host identification string (the user-agent analogue).
    pub descriptor: String,
    /// Deployment mode this build was configured for.
    pub mode: DeployMode,
    /// Explicit emulation override; only an affirmative value has effect.
    pub force_emulation: Option<bool>,
}

impl HostEnvironment {
    /// Environment for a browser host with no native channel.
    #[must_use]
    pub fn browser(descriptor: impl Into<String>, mode: DeployMode) -> Self {
        Self {
            native: None,
            descriptor: descriptor.into(),
            mode,
            force_emulation: None,
        }
    }

    /// Attach the host's native IPC channel.
    #[must_use]
    pub fn with_native(mut self, native: Arc<dyn IpcSurface>) -> Self {
        self.native = Some(native);
        self
    }

    /// Set the explicit emulation override flag.
    #[must_use]
    pub fn with_force_emulation(mut self, force: bool) -> Self {
        self.force_emulation = Some(force);
        self
    }

    /// Whether the web bridge should be installed for this host.
    ///
    /// A present native channel always wins. Otherwise any of the force
    /// flag, cloud mode, or a descriptor without the native-shell marker
    /// activates emulation.
    #[must_use]
    pub fn should_emulate(&self) -> bool {
        let emulate = if self.native.is_some() {
            false
        } else {
            self.force_emulation == Some(true)
                || self.mode == DeployMode::Cloud
                || !self.descriptor.contains(NATIVE_SHELL_MARKER)
        };
        debug!(
            descriptor = %self.descriptor,
            mode = ?self.mode,
            native = self.native.is_some(),
            emulate,
            "host environment evaluated"
        );
        emulate
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
