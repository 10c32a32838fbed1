//! # loft-studio
//!
//! Studio shell binary — loads settings, installs the IPC surface, and keeps
//! it alive for the hosted UI until ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use loft_ipc::bridge::{IpcSlot, WebIpcBridge};
use loft_studio::channels;
use loft_studio::client::StudioClient;
use loft_studio::settings;

/// Loft fine-tuning studio shell.
#[derive(Parser, Debug)]
#[command(name = "loft-studio", about = "Loft fine-tuning studio shell")]
struct Cli {
    /// Settings file path (defaults to `~/.loft/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Backend origin override (e.g. `http://127.0.0.1:5001`).
    #[arg(long)]
    base_url: Option<String>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_filter)),
        )
        .init();

    // Settings: defaults, then file, then LOFT_* env, then CLI flags on top.
    let settings_path = args.settings.unwrap_or_else(settings::settings_path);
    let mut settings = settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    if let Some(base_url) = args.base_url {
        settings.bridge.base_url = base_url;
    }

    tracing::info!(
        endpoint = %settings.bridge.endpoint(),
        mode = ?settings.deploy.mode,
        "starting studio shell"
    );

    // Install the IPC surface once for the process. The shell binary never
    // holds a native channel, so detection lands on the HTTP bridge; a
    // shell-style descriptor with no native channel is a configuration error
    // and install reports it as such.
    let slot = IpcSlot::new();
    let bridge_config = settings.bridge.clone();
    let surface = slot
        .install(settings.host_environment(), move || {
            Ok(WebIpcBridge::new(&bridge_config)?.with_contracts(channels::studio_contracts()))
        })
        .context("failed to install the IPC surface")?;
    let client = StudioClient::new(surface);
    startup_probe(&client).await;

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Startup probe: backend readiness plus the recents the landing page
/// renders. A failing probe is logged, never fatal; the backend may come up
/// later.
async fn startup_probe(client: &StudioClient) {
    match client.backend_status().await {
        Ok(status) if status.ready => {
            tracing::info!(version = ?status.version, "backend ready");
        }
        Ok(status) => {
            tracing::warn!(detail = ?status.detail, "backend not ready yet");
        }
        Err(err) => {
            tracing::warn!(error = %err, "backend status unavailable");
        }
    }
    match client.recent_projects().await {
        Ok(recents) => {
            tracing::info!(count = recents.len(), "recent projects loaded");
        }
        Err(err) => {
            tracing::warn!(error = %err, "recent projects probe failed");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loft_ipc::bridge::{IpcSurface, Subscription};
    use loft_ipc::registry::Listener;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["loft-studio"]);
        assert!(cli.settings.is_none());
        assert!(cli.base_url.is_none());
        assert_eq!(cli.log_filter, "info");
    }

    #[test]
    fn cli_accepts_overrides() {
        let cli = Cli::parse_from([
            "loft-studio",
            "--settings",
            "/tmp/studio.json",
            "--base-url",
            "http://10.0.0.9:5001",
            "--log-filter",
            "loft_ipc=debug",
        ]);
        assert_eq!(cli.settings.unwrap(), PathBuf::from("/tmp/studio.json"));
        assert_eq!(cli.base_url.as_deref(), Some("http://10.0.0.9:5001"));
        assert_eq!(cli.log_filter, "loft_ipc=debug");
    }

    /// Answers every channel with a payload no typed wrapper can decode.
    struct JunkSurface {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IpcSurface for JunkSurface {
        async fn invoke(
            &self,
            _channel: &str,
            _args: Vec<Value>,
        ) -> loft_ipc::errors::Result<Value> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(42))
        }
        fn on(&self, channel: &str, _listener: Listener) -> Subscription {
            Subscription::new(channel, 0)
        }
        fn remove_listener(&self, _subscription: &Subscription) {}
        fn send(&self, _channel: &str, _args: Vec<Value>) {}
    }

    #[tokio::test]
    async fn startup_probe_tolerates_an_unusable_backend() {
        let surface = Arc::new(JunkSurface {
            calls: AtomicUsize::new(0),
        });
        let client = StudioClient::new(Arc::clone(&surface) as Arc<dyn IpcSurface>);

        startup_probe(&client).await;

        // Both probe arms ran to completion despite undecodable payloads.
        assert_eq!(surface.calls.load(Ordering::SeqCst), 2);
    }
}
