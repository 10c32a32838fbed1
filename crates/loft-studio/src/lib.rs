//! # loft-studio
//!
//! Studio-side glue over [`loft_ipc`]: the channel vocabulary of the
//! fine-tuning backend, a typed client for it, and the settings layer the
//! shell binary composes everything from.
//!
//! The crate never assumes which IPC surface it is running on. Everything
//! goes through [`loft_ipc::IpcSurface`], so the same client code works in
//! the native desktop shell and in a plain browser tab.

#![deny(unsafe_code)]

pub mod channels;
pub mod client;
pub mod settings;

pub use client::{
    BackendStatus, ClientError, DeleteAck, JobAck, ProjectAck, RecentProject, StudioClient,
};
pub use settings::{
    DeploySettings, SettingsError, StudioSettings, load_settings, load_settings_from_path,
    settings_path,
};
