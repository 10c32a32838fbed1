//! The bridge facade and its installation guard.
//!
//! [`WebIpcBridge`] ties the transport adapter, subscription registry, and
//! push emulator together behind the same four-operation surface a native
//! IPC channel offers: `invoke`, `on`, `remove_listener`, `send`. Collaborators
//! hold it as an [`IpcSurface`] trait object, so native and emulated hosts
//! are interchangeable at every call site.
//!
//! [`IpcSlot`] is the composition root's installation guard: it holds the
//! process's single IPC surface, evaluates host detection at most once, and
//! makes repeated installation a no-op that returns the existing surface.

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::detect::HostEnvironment;
use crate::emulator::PushEmulator;
use crate::errors::{IpcError, Result};
use crate::registry::{ChannelState, Listener, ListenerId, RemovalOutcome, SubscriptionRegistry};
use crate::schema::ContractRegistry;
use crate::transport::{HttpTransport, Transport};

/// Handle identifying one listener registration.
///
/// Returned by [`IpcSurface::on`]; pass it back to
/// [`IpcSurface::remove_listener`] to dispose the registration. Dropping the
/// handle without removing it keeps the listener (and any polling it pins)
/// alive.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use = "without this handle the listener cannot be removed"]
pub struct Subscription {
    channel: String,
    id: ListenerId,
}

impl Subscription {
    /// Build a handle from its parts.
    pub fn new(channel: impl Into<String>, id: ListenerId) -> Self {
        Self {
            channel: channel.into(),
            id,
        }
    }

    /// Channel the listener is registered on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Registration id within the channel.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

/// The IPC surface collaborators program against.
///
/// Implemented by [`WebIpcBridge`] for browser hosts and by whatever channel
/// object the native shell supplies on desktop.
#[async_trait]
pub trait IpcSurface: Send + Sync {
    /// Invoke `channel` with `args` and return the backend's raw JSON value.
    async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value>;

    /// Register `listener` on `channel` and return its disposal handle.
    fn on(&self, channel: &str, listener: Listener) -> Subscription;

    /// Remove the registration identified by `subscription`.
    ///
    /// Removing a handle that was never registered or was already removed is
    /// a no-op.
    fn remove_listener(&self, subscription: &Subscription);

    /// Fire-and-forget invoke; the result is discarded and failures are
    /// swallowed. Never blocks the caller.
    fn send(&self, channel: &str, args: Vec<Value>);
}

/// Web implementation of the native IPC surface, speaking HTTP only.
///
/// `on` and `send` spawn onto the ambient tokio runtime, so the bridge must
/// be used from within one.
pub struct WebIpcBridge {
    transport: Arc<dyn Transport>,
    registry: Arc<SubscriptionRegistry>,
    emulator: PushEmulator,
    contracts: ContractRegistry,
    /// Serializes a listener change together with its poll-task change; the
    /// registry and the task map must agree whenever no call is in flight.
    transitions: Mutex<()>,
}

impl WebIpcBridge {
    /// Build a bridge over a fresh HTTP transport configured by `config`.
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        Self::with_transport(config, transport)
    }

    /// Build a bridge over an existing transport (test doubles included).
    pub fn with_transport(config: &BridgeConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(SubscriptionRegistry::new());
        let emulator = PushEmulator::new(
            Arc::clone(&transport),
            Arc::clone(&registry),
            config.poll_channels.clone(),
        );
        Ok(Self {
            transport,
            registry,
            emulator,
            contracts: ContractRegistry::new(),
            transitions: Mutex::new(()),
        })
    }

    /// Attach a channel contract registry, replacing any previous one.
    #[must_use]
    pub fn with_contracts(mut self, contracts: ContractRegistry) -> Self {
        self.contracts = contracts;
        self
    }

    /// Invoke `channel` with `args`.
    ///
    /// The request is checked against the channel's contract before any I/O;
    /// the response is passed through unmodified, with contract mismatches
    /// only logged.
    pub async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value> {
        self.contracts.check_request(channel, &args)?;
        let value = self.transport.invoke(channel, args).await?;
        if let Some(mismatch) = self.contracts.response_mismatch(channel, &value) {
            warn!(channel = %channel, mismatch = %mismatch, "response violates channel contract");
        }
        Ok(value)
    }

    /// Register `listener` on `channel`.
    ///
    /// Entering the polling state (first listener on a push-emulated
    /// channel) arms the channel's poll task; arming is idempotent. The
    /// registration and the arm land as one transition.
    pub fn on(&self, channel: &str, listener: Listener) -> Subscription {
        let _guard = self.transitions.lock();
        let id = self.registry.add(channel, listener);
        if self.emulator.is_emulated(channel) {
            let _ = self.emulator.arm(channel);
        }
        Subscription::new(channel, id)
    }

    /// Remove the registration identified by `subscription`.
    ///
    /// Removing the last listener for a channel disarms its poll task before
    /// this returns; the removal and the disarm land as one transition, so a
    /// concurrent `on` observes either both or neither. Unknown handles are
    /// a logged no-op.
    pub fn remove_listener(&self, subscription: &Subscription) {
        let _guard = self.transitions.lock();
        match self
            .registry
            .remove(subscription.channel(), subscription.id())
        {
            RemovalOutcome::Removed { remaining: 0 } => {
                let _ = self.emulator.disarm(subscription.channel());
            }
            RemovalOutcome::Removed { .. } | RemovalOutcome::NotFound => {}
        }
    }

    /// Fire-and-forget invoke for parity with the native surface.
    ///
    /// A contract violation drops the call before any I/O; transport
    /// failures are logged and swallowed.
    pub fn send(&self, channel: &str, args: Vec<Value>) {
        if let Err(err) = self.contracts.check_request(channel, &args) {
            debug!(channel = %channel, error = %err, "send dropped by contract check");
            return;
        }
        let transport = Arc::clone(&self.transport);
        let channel = channel.to_string();
        let _ = tokio::spawn(async move {
            if let Err(err) = transport.invoke(&channel, args).await {
                debug!(channel = %channel, error = %err, "send failed, result discarded");
            }
        });
    }

    /// Lifecycle state of `channel`.
    #[must_use]
    pub fn channel_state(&self, channel: &str) -> ChannelState {
        self.registry
            .state(channel, self.emulator.is_emulated(channel))
    }

    /// Number of listeners registered on `channel`.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.registry.listener_count(channel)
    }

    /// Number of currently armed poll tasks.
    #[must_use]
    pub fn poll_task_count(&self) -> usize {
        self.emulator.armed_count()
    }
}

#[async_trait]
impl IpcSurface for WebIpcBridge {
    async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value> {
        Self::invoke(self, channel, args).await
    }

    fn on(&self, channel: &str, listener: Listener) -> Subscription {
        Self::on(self, channel, listener)
    }

    fn remove_listener(&self, subscription: &Subscription) {
        Self::remove_listener(self, subscription);
    }

    fn send(&self, channel: &str, args: Vec<Value>) {
        Self::send(self, channel, args);
    }
}

/// Installation guard owning the process's single IPC surface.
pub struct IpcSlot {
    cell: OnceLock<Arc<dyn IpcSurface>>,
}

impl IpcSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Install the IPC surface for `env`, building the web bridge through
    /// `make_bridge` only when emulation is required.
    ///
    /// The first call decides: a supplied native channel is installed
    /// untouched; otherwise the bridge factory runs once. Every later call
    /// returns the already-installed surface without re-evaluating detection
    /// or duplicating bridge state.
    pub fn install<F>(&self, env: HostEnvironment, make_bridge: F) -> Result<Arc<dyn IpcSurface>>
    where
        F: FnOnce() -> Result<WebIpcBridge>,
    {
        if let Some(existing) = self.cell.get() {
            debug!("ipc surface already installed, reusing");
            return Ok(Arc::clone(existing));
        }

        let surface: Arc<dyn IpcSurface> = if env.should_emulate() {
            let bridge = make_bridge()?;
            info!("web IPC bridge installed, push emulation active");
            Arc::new(bridge)
        } else if let Some(native) = env.native {
            debug!("native IPC channel present, left untouched");
            native
        } else {
            return Err(IpcError::NativeChannelMissing);
        };

        if self.cell.set(Arc::clone(&surface)).is_err() {
            // Lost a race with a concurrent install; the winner is authoritative.
            if let Some(existing) = self.cell.get() {
                return Ok(Arc::clone(existing));
            }
        }
        Ok(surface)
    }

    /// The installed surface, if any.
    #[must_use]
    pub fn installed(&self) -> Option<Arc<dyn IpcSurface>> {
        self.cell.get().cloned()
    }

    /// Whether a surface has been installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl Default for IpcSlot {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
