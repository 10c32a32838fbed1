//! Wire-format types for the invoke endpoint and the synthetic push event.
//!
//! The invoke wire shape is the compatibility contract with the backend:
//! every call is a POST whose body is `{"channel": string, "args": [...]}`
//! and whose response body is backend-defined JSON the bridge never
//! reinterprets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for the single invoke endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvokeEnvelope {
    /// Channel name the call targets.
    pub channel: String,
    /// Positional arguments; serialized even when empty.
    pub args: Vec<Value>,
}

impl InvokeEnvelope {
    /// Build an envelope for `channel` with `args`.
    #[must_use]
    pub fn new(channel: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            channel: channel.into(),
            args,
        }
    }
}

/// Synthetic event handed to listeners in place of a native IPC event.
///
/// Native channels pass an event object as the first listener argument; the
/// bridge fabricates this placeholder so listener signatures stay identical
/// across native and emulated hosts.
#[derive(Clone, Debug)]
pub struct PushEvent {
    /// Emulated channel the event was delivered on.
    pub channel: String,
    /// When the bridge produced the emission.
    pub received_at: DateTime<Utc>,
}

impl PushEvent {
    /// Create an event for `channel` stamped with the current UTC time.
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            received_at: Utc::now(),
        }
    }
}

/// Whether a backend payload encodes failure under the backend's own
/// convention: a JSON object whose `error` key holds a non-null value.
///
/// `invoke` callers receive such payloads untouched; only the poll loop
/// consults this to suppress emission for the tick.
#[must_use]
pub fn is_error_payload(payload: &Value) -> bool {
    payload
        .as_object()
        .and_then(|obj| obj.get("error"))
        .is_some_and(|err| !err.is_null())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_to_wire_shape() {
        let envelope = InvokeEnvelope::new("create-new-project", vec![json!("alpha")]);
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            wire,
            json!({"channel": "create-new-project", "args": ["alpha"]})
        );
    }

    #[test]
    fn envelope_serializes_empty_args_as_array() {
        let envelope = InvokeEnvelope::new("get-theme", Vec::new());
        let wire = serde_json::to_string(&envelope).unwrap();
        assert!(wire.contains("\"args\":[]"));
    }

    #[test]
    fn envelope_roundtrips() {
        let envelope = InvokeEnvelope::new("run-training-job", vec![json!({"epochs": 3})]);
        let back: InvokeEnvelope =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(back.channel, "run-training-job");
        assert_eq!(back.args, vec![json!({"epochs": 3})]);
    }

    #[test]
    fn push_event_carries_channel() {
        let event = PushEvent::new("training-status");
        assert_eq!(event.channel, "training-status");
    }

    #[test]
    fn error_payload_detection() {
        assert!(is_error_payload(&json!({"error": "Unknown channel: x"})));
        assert!(is_error_payload(&json!({"error": {"code": 1}})));
        assert!(!is_error_payload(&json!({"error": null})));
        assert!(!is_error_payload(&json!({"success": true})));
        assert!(!is_error_payload(&json!([1, 2, 3])));
        assert!(!is_error_payload(&json!("error")));
        assert!(!is_error_payload(&json!(null)));
    }
}
