//! # loft-ipc
//!
//! Web IPC compatibility bridge for the Loft studio: gives a browser-hosted
//! client the same four-operation IPC surface the native desktop shell
//! provides (`invoke`, `on`, `remove_listener`, `send`) using nothing but
//! HTTP.
//!
//! Request/response calls become POSTs to a single fixed endpoint with the
//! channel name in the body. Server push does not exist over plain HTTP, so
//! a fixed allow-list of channels is emulated by polling a backend source
//! channel on a per-channel cadence and fanning results out to listeners as
//! synthetic events. Polling for a channel runs exactly while it has
//! listeners.
//!
//! # Usage
//!
//! ```no_run
//! use loft_ipc::{BridgeConfig, DeployMode, HostEnvironment, IpcSlot, WebIpcBridge};
//!
//! let slot = IpcSlot::new();
//! let env = HostEnvironment::browser("Mozilla/5.0 (X11; Linux x86_64)", DeployMode::Cloud);
//! let surface = slot.install(env, || WebIpcBridge::new(&BridgeConfig::default()))?;
//! # Ok::<(), loft_ipc::IpcError>(())
//! ```

#![deny(unsafe_code)]

pub mod bridge;
pub mod config;
pub mod detect;
pub mod emulator;
pub mod envelope;
pub mod errors;
pub mod registry;
pub mod schema;
pub mod transport;

pub use bridge::{IpcSlot, IpcSurface, Subscription, WebIpcBridge};
pub use config::{BridgeConfig, DEFAULT_BASE_URL, DEFAULT_INVOKE_PATH, PollChannelSpec};
pub use detect::{DeployMode, HostEnvironment, NATIVE_SHELL_MARKER};
pub use emulator::PushEmulator;
pub use envelope::{InvokeEnvelope, PushEvent, is_error_payload};
pub use errors::{IpcError, Result};
pub use registry::{ChannelState, Listener, ListenerId, RemovalOutcome, SubscriptionRegistry};
pub use schema::{ChannelContract, ContractRegistry, ValueKind};
pub use transport::{HttpTransport, Transport};
