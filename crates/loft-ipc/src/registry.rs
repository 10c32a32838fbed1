//! Per-channel listener registry.
//!
//! Tracks, for each channel name, the ordered list of active listeners.
//! Ordering is delivery order: listeners fire in the order they were
//! registered. A channel whose last listener is removed vanishes from the
//! map entirely — entry presence is what keeps push emulation armed, so an
//! empty-but-present entry would leak a poll task.
//!
//! Removal is by listener id, not closure identity. Registering the same
//! closure twice yields two independent registrations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::envelope::PushEvent;

/// Identifier assigned to one listener registration.
pub type ListenerId = u64;

/// Callback invoked for each emitted event on a subscribed channel.
pub type Listener = Arc<dyn Fn(&PushEvent, &Value) + Send + Sync>;

/// Lifecycle state of one channel, derived from the listener count and the
/// channel's membership in the push-emulated set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// No listeners; no registry entry, no poll task.
    Absent,
    /// At least one listener on a channel that is not push-emulated;
    /// nothing ever emits to it.
    Idle,
    /// At least one listener on a push-emulated channel; exactly one poll
    /// task is active.
    Polling,
}

impl ChannelState {
    /// Derive the state from a listener count and emulated-set membership.
    #[must_use]
    pub fn of(listener_count: usize, emulated: bool) -> Self {
        match (listener_count, emulated) {
            (0, _) => Self::Absent,
            (_, false) => Self::Idle,
            (_, true) => Self::Polling,
        }
    }
}

/// Outcome of a removal attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The registration existed and was removed; `remaining` listeners are
    /// still registered on the channel.
    Removed {
        /// Listeners left on the channel after removal.
        remaining: usize,
    },
    /// No such registration; the call was a no-op.
    NotFound,
}

struct ListenerEntry {
    id: ListenerId,
    callback: Listener,
}

/// Ordered listener lists keyed by channel name.
pub struct SubscriptionRegistry {
    channels: Mutex<HashMap<String, Vec<ListenerEntry>>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append `listener` to `channel`'s list and return its registration id.
    pub fn add(&self, channel: &str, listener: Listener) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut channels = self.channels.lock();
        channels
            .entry(channel.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                callback: listener,
            });
        debug!(channel = %channel, listener_id = id, "listener registered");
        id
    }

    /// Remove the registration `id` from `channel`.
    ///
    /// Removing an id that was never registered (or already removed) is a
    /// no-op. When the last listener goes, the channel entry is deleted.
    pub fn remove(&self, channel: &str, id: ListenerId) -> RemovalOutcome {
        let mut channels = self.channels.lock();
        let Some(entries) = channels.get_mut(channel) else {
            debug!(channel = %channel, listener_id = id, "remove on unknown channel ignored");
            return RemovalOutcome::NotFound;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            debug!(channel = %channel, listener_id = id, "remove of unknown listener ignored");
            return RemovalOutcome::NotFound;
        }
        let remaining = entries.len();
        if remaining == 0 {
            let _ = channels.remove(channel);
        }
        debug!(channel = %channel, listener_id = id, remaining, "listener removed");
        RemovalOutcome::Removed { remaining }
    }

    /// Emit `payload` to every listener on `channel`, in registration order.
    ///
    /// Listeners run outside the registry lock, so a callback may re-enter
    /// the registry (subscribe, unsubscribe) without deadlocking. Returns
    /// the number of listeners invoked.
    pub fn emit(&self, channel: &str, payload: &Value) -> usize {
        let snapshot: Vec<Listener> = {
            let channels = self.channels.lock();
            match channels.get(channel) {
                Some(entries) => entries
                    .iter()
                    .map(|entry| Arc::clone(&entry.callback))
                    .collect(),
                None => Vec::new(),
            }
        };
        if snapshot.is_empty() {
            return 0;
        }
        let event = PushEvent::new(channel);
        for listener in &snapshot {
            listener(&event, payload);
        }
        debug!(channel = %channel, recipients = snapshot.len(), "push event emitted");
        snapshot.len()
    }

    /// Number of listeners currently registered on `channel`.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .get(channel)
            .map_or(0, std::vec::Vec::len)
    }

    /// Number of channels with at least one listener.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Lifecycle state of `channel` given its emulated-set membership.
    #[must_use]
    pub fn state(&self, channel: &str, emulated: bool) -> ChannelState {
        ChannelState::of(self.listener_count(channel), emulated)
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
