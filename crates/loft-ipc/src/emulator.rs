//! Push emulation via periodic polling.
//!
//! Browser hosts have no event push from the backend, so a fixed allow-list
//! of channels is emulated: each maps to a backend source channel that is
//! polled on a fixed cadence, with results fanned out to registered
//! listeners as synthetic events.
//!
//! The arming invariant: a poll task exists for a channel iff the channel is
//! in the table and the registry holds at least one listener for it. The
//! bridge drives `arm`/`disarm` off listener-count transitions; both are
//! idempotent so out-of-order or repeated calls cannot double-poll a
//! channel.
//!
//! A tick that fails — transport error or a backend payload carrying the
//! `error` convention — is logged and swallowed; polling continues at the
//! same cadence. There is no backoff and no circuit breaker, and dropping
//! the emulator does not stop armed tasks: listener removal is the only
//! disposal path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::PollChannelSpec;
use crate::envelope::is_error_payload;
use crate::registry::SubscriptionRegistry;
use crate::transport::Transport;

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Manages the per-channel poll tasks behind push emulation.
pub struct PushEmulator {
    transport: Arc<dyn Transport>,
    registry: Arc<SubscriptionRegistry>,
    table: HashMap<String, PollChannelSpec>,
    tasks: Mutex<HashMap<String, PollTask>>,
}

impl PushEmulator {
    /// Create an emulator over `table`, polling through `transport` and
    /// emitting through `registry`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<SubscriptionRegistry>,
        table: impl IntoIterator<Item = PollChannelSpec>,
    ) -> Self {
        Self {
            transport,
            registry,
            table: table
                .into_iter()
                .map(|spec| (spec.channel.clone(), spec))
                .collect(),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `channel` is in the push-emulated set.
    #[must_use]
    pub fn is_emulated(&self, channel: &str) -> bool {
        self.table.contains_key(channel)
    }

    /// Table entry for `channel`, if it is push-emulated.
    #[must_use]
    pub fn spec(&self, channel: &str) -> Option<&PollChannelSpec> {
        self.table.get(channel)
    }

    /// Arm the poll task for `channel`.
    ///
    /// Returns `true` if a task was started; `false` if the channel is not
    /// push-emulated or a task is already running (arming is idempotent).
    /// Must be called from within a tokio runtime.
    pub fn arm(&self, channel: &str) -> bool {
        let Some(spec) = self.table.get(channel) else {
            return false;
        };
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(channel) {
            return false;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_poll_loop(
            spec.clone(),
            Arc::clone(&self.transport),
            Arc::clone(&self.registry),
            cancel.clone(),
        ));
        let _ = tasks.insert(channel.to_string(), PollTask { cancel, handle });
        debug!(channel, interval_ms = spec.interval_ms, "poll task armed");
        true
    }

    /// Disarm the poll task for `channel`, if one is running.
    ///
    /// The task is removed and cancelled before this returns; an in-flight
    /// poll request is aborted so no emission can follow a disarm.
    pub fn disarm(&self, channel: &str) -> bool {
        let task = self.tasks.lock().remove(channel);
        match task {
            Some(task) => {
                task.cancel.cancel();
                task.handle.abort();
                debug!(channel, "poll task disarmed");
                true
            }
            None => false,
        }
    }

    /// Whether a poll task is currently running for `channel`.
    #[must_use]
    pub fn is_armed(&self, channel: &str) -> bool {
        self.tasks.lock().contains_key(channel)
    }

    /// Number of currently armed poll tasks.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.tasks.lock().len()
    }
}

/// Poll `spec.source` on the fixed cadence and fan results out to
/// `spec.channel`'s listeners until cancelled.
async fn run_poll_loop(
    spec: PollChannelSpec,
    transport: Arc<dyn Transport>,
    registry: Arc<SubscriptionRegistry>,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(spec.interval());
    // A slow backend delays the next tick rather than bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(channel = %spec.channel, "poll loop cancelled");
                return;
            }
            _ = ticker.tick() => {
                let outcome = tokio::select! {
                    () = cancel.cancelled() => return,
                    result = transport.invoke(&spec.source, Vec::new()) => result,
                };
                match outcome {
                    Ok(payload) if is_error_payload(&payload) => {
                        debug!(
                            channel = %spec.channel,
                            source = %spec.source,
                            "backend reported an error, tick skipped"
                        );
                    }
                    Ok(payload) => {
                        let _ = registry.emit(&spec.channel, &payload);
                    }
                    Err(err) => {
                        warn!(
                            channel = %spec.channel,
                            source = %spec.source,
                            error = %err,
                            "poll tick failed"
                        );
                    }
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
