//! Per-channel message contracts.
//!
//! Channels are stringly-typed on the wire; this module pairs the bridge's
//! pass-through behavior with a verifiable contract. A contract constrains
//! the argument list (arity and JSON kind per position) and optionally the
//! response kind. Channels without a registered contract stay fully opaque:
//! the bridge forwards them unchecked, matching native-channel behavior.
//!
//! Enforcement is boundary-only and asymmetric. Request mismatches fail the
//! call before any I/O; response mismatches are reported to the caller of
//! [`ContractRegistry::response_mismatch`] for logging while the payload
//! still passes through unmodified.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::{IpcError, Result};

/// JSON value kinds a contract can constrain a position to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool,
    /// JSON number.
    Number,
    /// JSON string.
    String,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// Any JSON value; the position is present but unconstrained.
    Any,
}

impl ValueKind {
    /// Whether `value` satisfies this kind.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    /// Human-readable name used in mismatch messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    /// Kind name of an actual value, for mismatch messages.
    #[must_use]
    pub fn of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Contract for one named channel.
#[derive(Clone, Debug)]
pub struct ChannelContract {
    /// Expected argument kinds, one per position; length fixes the arity.
    pub args: Vec<ValueKind>,
    /// Expected response kind; [`ValueKind::Any`] leaves it unconstrained.
    pub response: ValueKind,
}

impl ChannelContract {
    /// Contract with the given argument kinds and an unconstrained response.
    #[must_use]
    pub fn new(args: Vec<ValueKind>) -> Self {
        Self {
            args,
            response: ValueKind::Any,
        }
    }

    /// Contract for a channel that takes no arguments.
    #[must_use]
    pub fn no_args() -> Self {
        Self::new(Vec::new())
    }

    /// Constrain the response kind.
    #[must_use]
    pub fn with_response(mut self, response: ValueKind) -> Self {
        self.response = response;
        self
    }
}

/// Registry of named channel contracts.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: HashMap<String, ChannelContract>,
}

impl ContractRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the contract for `channel`.
    pub fn register(&mut self, channel: impl Into<String>, contract: ChannelContract) {
        let channel = channel.into();
        tracing::debug!(channel = %channel, arity = contract.args.len(), "registered channel contract");
        let _ = self.contracts.insert(channel, contract);
    }

    /// Look up the contract for `channel`, if one was registered.
    #[must_use]
    pub fn contract(&self, channel: &str) -> Option<&ChannelContract> {
        self.contracts.get(channel)
    }

    /// Number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether no contracts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Check an outgoing argument list against `channel`'s contract.
    ///
    /// Channels without a contract always pass.
    pub fn check_request(&self, channel: &str, args: &[Value]) -> Result<()> {
        let Some(contract) = self.contracts.get(channel) else {
            return Ok(());
        };
        if args.len() != contract.args.len() {
            return Err(IpcError::schema(
                channel,
                format!(
                    "expected {} argument{}, got {}",
                    contract.args.len(),
                    if contract.args.len() == 1 { "" } else { "s" },
                    args.len()
                ),
            ));
        }
        for (index, (kind, value)) in contract.args.iter().zip(args).enumerate() {
            if !kind.matches(value) {
                return Err(IpcError::schema(
                    channel,
                    format!(
                        "argument {index} must be {}, got {}",
                        kind.name(),
                        ValueKind::of(value)
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Describe a response-kind mismatch for `channel`, if any.
    ///
    /// Returns `None` when the channel has no contract, the response kind is
    /// unconstrained, or the value matches. The caller logs the description;
    /// the payload is passed through either way.
    #[must_use]
    pub fn response_mismatch(&self, channel: &str, value: &Value) -> Option<String> {
        let contract = self.contracts.get(channel)?;
        if contract.response.matches(value) {
            return None;
        }
        Some(format!(
            "response must be {}, got {}",
            contract.response.name(),
            ValueKind::of(value)
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
