//! Typed client over the IPC surface.
//!
//! Thin wrappers that turn raw channel payloads into typed values. The
//! client is surface-agnostic: it behaves identically over the native
//! channel and the HTTP bridge, because it only ever talks to
//! [`IpcSurface`].

use std::sync::Arc;

use loft_ipc::bridge::{IpcSurface, Subscription};
use loft_ipc::errors::IpcError;
use loft_ipc::registry::Listener;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::channels;

/// Errors surfaced by the typed client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying IPC call failed.
    #[error(transparent)]
    Ipc(#[from] IpcError),
    /// The backend answered with a payload the client could not decode.
    #[error("channel '{channel}' returned an unexpected payload: {message}")]
    Payload {
        /// Channel whose payload failed to decode.
        channel: String,
        /// Decoder description of the mismatch.
        message: String,
    },
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// One entry of the recent projects list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProject {
    /// Absolute path of the project folder.
    pub path: String,
    /// Display name shown on the landing page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// When the project was last opened, if the backend recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<String>,
}

impl RecentProject {
    /// Descriptor for the project folder at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            last_opened: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Readiness envelope of the training backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    /// Whether the backend is ready to accept work.
    pub ready: bool,
    /// Backend version string, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Human-readable detail for the not-ready case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Acknowledgement envelope for project creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAck {
    /// Whether the operation succeeded backend-side.
    pub success: bool,
    /// Path of the created project folder, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Failure description, on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Acknowledgement envelope for project deletion.
///
/// The backend prunes the deleted path from the recents list and answers
/// with the pruned list, saving the UI a follow-up fetch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    /// Whether the folder was deleted.
    pub success: bool,
    /// Recents list after pruning, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<RecentProject>>,
    /// Failure description, on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Acknowledgement envelope for training job launches.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAck {
    /// Whether the job was accepted.
    pub success: bool,
    /// Identifier of the launched job, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Failure description, on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Typed facade over the studio's channel vocabulary.
pub struct StudioClient {
    ipc: Arc<dyn IpcSurface>,
}

impl StudioClient {
    /// Wrap an installed IPC surface.
    #[must_use]
    pub fn new(ipc: Arc<dyn IpcSurface>) -> Self {
        Self { ipc }
    }

    /// The raw surface, for callers that need an untyped channel.
    #[must_use]
    pub fn surface(&self) -> Arc<dyn IpcSurface> {
        Arc::clone(&self.ipc)
    }

    /// Recent projects for the landing page.
    ///
    /// Degrades to an empty list when the call fails in transport, so the
    /// landing page renders with no backend running. Decode failures still
    /// surface; a reachable backend speaking the wrong shape is a bug worth
    /// seeing.
    pub async fn recent_projects(&self) -> Result<Vec<RecentProject>> {
        match self
            .ipc
            .invoke(channels::GET_RECENT_PROJECTS, Vec::new())
            .await
        {
            Ok(value) => decode(channels::GET_RECENT_PROJECTS, value),
            Err(err) if err.is_transport() => {
                warn!(error = %err, "recent projects unavailable, starting with an empty list");
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Move `project` to the front of the recents list.
    ///
    /// Returns the updated list, already pruned to the backend's cap.
    pub async fn add_recent_project(&self, project: &RecentProject) -> Result<Vec<RecentProject>> {
        let descriptor = serde_json::to_value(project).map_err(|err| ClientError::Payload {
            channel: channels::ADD_RECENT_PROJECT.to_string(),
            message: err.to_string(),
        })?;
        let value = self
            .ipc
            .invoke(channels::ADD_RECENT_PROJECT, vec![descriptor])
            .await?;
        decode(channels::ADD_RECENT_PROJECT, value)
    }

    /// Scaffold a new fine-tuning project named `name`.
    ///
    /// A refused creation is data, not an error: the ack carries
    /// `success: false` plus the backend's reason.
    pub async fn create_project(&self, name: &str) -> Result<ProjectAck> {
        let value = self
            .ipc
            .invoke(
                channels::CREATE_NEW_PROJECT,
                vec![Value::String(name.to_string())],
            )
            .await?;
        decode(channels::CREATE_NEW_PROJECT, value)
    }

    /// Delete the project folder at `path`.
    pub async fn delete_project(&self, path: &str) -> Result<DeleteAck> {
        let value = self
            .ipc
            .invoke(
                channels::DELETE_PROJECT_FOLDER,
                vec![Value::String(path.to_string())],
            )
            .await?;
        decode(channels::DELETE_PROJECT_FOLDER, value)
    }

    /// UI language persisted by the backend.
    pub async fn language(&self) -> Result<String> {
        let value = self.ipc.invoke(channels::GET_LANGUAGE, Vec::new()).await?;
        decode(channels::GET_LANGUAGE, value)
    }

    /// Persist the UI language.
    pub async fn set_language(&self, language: &str) -> Result<()> {
        let _ = self
            .ipc
            .invoke(
                channels::SET_LANGUAGE,
                vec![Value::String(language.to_string())],
            )
            .await?;
        Ok(())
    }

    /// UI theme persisted by the backend.
    pub async fn theme(&self) -> Result<String> {
        let value = self.ipc.invoke(channels::GET_THEME, Vec::new()).await?;
        decode(channels::GET_THEME, value)
    }

    /// Persist the UI theme.
    pub async fn set_theme(&self, theme: &str) -> Result<()> {
        let _ = self
            .ipc
            .invoke(channels::SET_THEME, vec![Value::String(theme.to_string())])
            .await?;
        Ok(())
    }

    /// Host platform string, as the backend reports it.
    pub async fn platform(&self) -> Result<String> {
        let value = self.ipc.invoke(channels::GET_PLATFORM, Vec::new()).await?;
        decode(channels::GET_PLATFORM, value)
    }

    /// Readiness of the training backend.
    pub async fn backend_status(&self) -> Result<BackendStatus> {
        let value = self
            .ipc
            .invoke(channels::GET_BACKEND_STATUS, Vec::new())
            .await?;
        decode(channels::GET_BACKEND_STATUS, value)
    }

    /// Launch a training job described by `config`.
    pub async fn run_training_job(&self, config: Value) -> Result<JobAck> {
        let value = self
            .ipc
            .invoke(channels::RUN_TRAINING_JOB, vec![config])
            .await?;
        decode(channels::RUN_TRAINING_JOB, value)
    }

    /// Subscribe to CPU/GPU/memory samples.
    pub fn watch_system_usage(&self, listener: Listener) -> Subscription {
        self.ipc.on(channels::SYSTEM_USAGE, listener)
    }

    /// Subscribe to training progress updates.
    pub fn watch_training_status(&self, listener: Listener) -> Subscription {
        self.ipc.on(channels::TRAINING_STATUS, listener)
    }

    /// Drop a subscription created by one of the watch methods.
    pub fn unwatch(&self, subscription: &Subscription) {
        self.ipc.remove_listener(subscription);
    }
}

fn decode<T: DeserializeOwned>(channel: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| ClientError::Payload {
        channel: channel.to_string(),
        message: err.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use loft_ipc::envelope::PushEvent;
    use parking_lot::Mutex;
    use serde_json::json;

    type Responder = Box<dyn Fn(&str, &[Value]) -> loft_ipc::errors::Result<Value> + Send + Sync>;

    /// Surface double that answers from a closure and records every call.
    struct MockSurface {
        responder: Responder,
        invocations: Mutex<Vec<(String, Vec<Value>)>>,
        listeners: Mutex<Vec<(String, Listener)>>,
        removed: Mutex<Vec<(String, u64)>>,
        next_id: AtomicU64,
    }

    impl MockSurface {
        fn returning(value: Value) -> Arc<Self> {
            Self::with(move |_, _| Ok(value.clone()))
        }

        fn failing(err_fn: impl Fn(&str) -> IpcError + Send + Sync + 'static) -> Arc<Self> {
            Self::with(move |channel, _| Err(err_fn(channel)))
        }

        fn with(
            responder: impl Fn(&str, &[Value]) -> loft_ipc::errors::Result<Value>
                + Send
                + Sync
                + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                responder: Box::new(responder),
                invocations: Mutex::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            })
        }

        fn invocations(&self) -> Vec<(String, Vec<Value>)> {
            self.invocations.lock().clone()
        }

        /// Push a payload to every listener on `channel`, as the bridge would.
        fn push(&self, channel: &str, payload: &Value) {
            let event = PushEvent::new(channel);
            for (registered, listener) in self.listeners.lock().iter() {
                if registered == channel {
                    listener(&event, payload);
                }
            }
        }
    }

    #[async_trait]
    impl IpcSurface for MockSurface {
        async fn invoke(&self, channel: &str, args: Vec<Value>) -> loft_ipc::errors::Result<Value> {
            self.invocations
                .lock()
                .push((channel.to_string(), args.clone()));
            (self.responder)(channel, &args)
        }

        fn on(&self, channel: &str, listener: Listener) -> Subscription {
            self.listeners.lock().push((channel.to_string(), listener));
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            Subscription::new(channel, id)
        }

        fn remove_listener(&self, subscription: &Subscription) {
            self.removed
                .lock()
                .push((subscription.channel().to_string(), subscription.id()));
        }

        fn send(&self, channel: &str, args: Vec<Value>) {
            self.invocations.lock().push((channel.to_string(), args));
        }
    }

    fn client(surface: &Arc<MockSurface>) -> StudioClient {
        StudioClient::new(Arc::clone(surface) as Arc<dyn IpcSurface>)
    }

    // ── recent projects ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn recent_projects_decodes_entries() {
        let surface = MockSurface::returning(json!([
            {"path": "/work/sdxl-style", "name": "sdxl-style"},
            {"path": "/work/bert-finetune"},
        ]));
        let projects = client(&surface).recent_projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].path, "/work/sdxl-style");
        assert_eq!(projects[0].name.as_deref(), Some("sdxl-style"));
        assert!(projects[1].name.is_none());
    }

    #[tokio::test]
    async fn recent_projects_degrades_when_backend_unreachable() {
        let surface =
            MockSurface::failing(|channel| IpcError::network(channel, "connection refused"));
        let projects = client(&surface).recent_projects().await.unwrap();
        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn recent_projects_surfaces_decode_failure() {
        let surface = MockSurface::returning(json!({"not": "a list"}));
        let err = client(&surface).recent_projects().await.unwrap_err();
        assert!(matches!(err, ClientError::Payload { .. }));
    }

    #[tokio::test]
    async fn add_recent_project_sends_the_descriptor_object() {
        let surface = MockSurface::returning(json!([{"path": "/work/new"}]));
        let project = RecentProject::new("/work/new").with_name("new");

        let updated = client(&surface)
            .add_recent_project(&project)
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        let calls = surface.invocations();
        assert_eq!(calls[0].0, channels::ADD_RECENT_PROJECT);
        assert_eq!(calls[0].1[0]["path"], "/work/new");
        assert_eq!(calls[0].1[0]["name"], "new");
    }

    // ── project lifecycle ────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_project_returns_the_new_path() {
        let surface =
            MockSurface::returning(json!({"success": true, "path": "/output/20250102_10-30-00"}));
        let ack = client(&surface).create_project("sdxl-style").await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.path.as_deref(), Some("/output/20250102_10-30-00"));
    }

    #[tokio::test]
    async fn create_project_failure_is_data_not_an_error() {
        let surface = MockSurface::returning(json!({"success": false, "error": "disk full"}));
        let ack = client(&surface).create_project("sdxl-style").await.unwrap();
        assert!(!ack.success);
        assert_eq!(ack.error.as_deref(), Some("disk full"));
    }

    #[tokio::test]
    async fn delete_project_returns_the_pruned_recents() {
        let surface = MockSurface::returning(json!({
            "success": true,
            "projects": [{"path": "/work/keep"}],
        }));
        let ack = client(&surface).delete_project("/work/gone").await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.projects.unwrap()[0].path, "/work/keep");
    }

    // ── preferences and host ─────────────────────────────────────────────────

    #[tokio::test]
    async fn preferences_are_plain_strings() {
        let surface = MockSurface::returning(json!("zh"));
        assert_eq!(client(&surface).language().await.unwrap(), "zh");

        let surface = MockSurface::returning(json!("dark"));
        assert_eq!(client(&surface).theme().await.unwrap(), "dark");
    }

    #[tokio::test]
    async fn setters_pass_the_value_and_discard_the_ack() {
        let surface = MockSurface::returning(json!({"success": true}));
        client(&surface).set_language("en").await.unwrap();
        client(&surface).set_theme("light").await.unwrap();

        let calls = surface.invocations();
        assert_eq!(calls[0].0, channels::SET_LANGUAGE);
        assert_eq!(calls[0].1, vec![json!("en")]);
        assert_eq!(calls[1].0, channels::SET_THEME);
        assert_eq!(calls[1].1, vec![json!("light")]);
    }

    #[tokio::test]
    async fn platform_and_status_decode() {
        let surface = MockSurface::returning(json!("linux"));
        assert_eq!(client(&surface).platform().await.unwrap(), "linux");

        let surface =
            MockSurface::returning(json!({"ready": false, "detail": "loading base model"}));
        let status = client(&surface).backend_status().await.unwrap();
        assert!(!status.ready);
        assert_eq!(status.detail.as_deref(), Some("loading base model"));
    }

    #[tokio::test]
    async fn run_training_job_acks_with_job_id() {
        let surface = MockSurface::returning(json!({"success": true, "jobId": "job-7"}));
        let ack = client(&surface)
            .run_training_job(json!({"epochs": 10}))
            .await
            .unwrap();
        assert!(ack.success);
        assert_eq!(ack.job_id.as_deref(), Some("job-7"));

        let calls = surface.invocations();
        assert_eq!(calls[0].1[0]["epochs"], 10);
    }

    #[tokio::test]
    async fn ipc_errors_pass_through_untouched() {
        let surface = MockSurface::failing(|channel| IpcError::http(channel, 503, "Service Unavailable"));
        let err = client(&surface).backend_status().await.unwrap_err();
        assert!(matches!(err, ClientError::Ipc(IpcError::Http { status: 503, .. })));
    }

    // ── subscriptions ────────────────────────────────────────────────────────

    #[test]
    fn watch_registers_on_the_usage_channel() {
        let surface = MockSurface::returning(json!(null));
        let studio = client(&surface);

        let received: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let sub = studio.watch_system_usage(Arc::new(move |_, payload| {
            sink.lock().push(payload.clone());
        }));
        assert_eq!(sub.channel(), channels::SYSTEM_USAGE);

        surface.push(channels::SYSTEM_USAGE, &json!({"cpu": 42.0}));
        assert_eq!(received.lock()[0]["cpu"], 42.0);
    }

    #[test]
    fn unwatch_removes_by_handle() {
        let surface = MockSurface::returning(json!(null));
        let studio = client(&surface);

        let sub = studio.watch_training_status(Arc::new(|_, _| {}));
        studio.unwatch(&sub);

        let removed = surface.removed.lock();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, channels::TRAINING_STATUS);
        assert_eq!(removed[0].1, sub.id());
    }
}
