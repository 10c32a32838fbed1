//! Bridge error types.
//!
//! Every failure a caller can observe from the bridge is normalized into
//! [`IpcError`]. Backend-authored error payloads are *not* represented here:
//! a well-formed response whose body encodes failure is passed through to
//! the caller untouched, exactly as a native channel would deliver it.

use thiserror::Error;

/// Errors surfaced by the bridge to its immediate caller.
#[derive(Debug, Error)]
pub enum IpcError {
    /// A channel name was empty or all whitespace.
    #[error("channel name must not be empty")]
    EmptyChannel,
    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {status} {status_text} for channel '{channel}'")]
    Http {
        /// Channel the request was issued for.
        channel: String,
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, empty when the server sent none.
        status_text: String,
    },
    /// The request never produced an HTTP response (DNS, refused, reset).
    #[error("request for channel '{channel}' failed: {message}")]
    Network {
        /// Channel the request was issued for.
        channel: String,
        /// Underlying transport error message.
        message: String,
    },
    /// The backend answered 2xx but the body was not valid JSON.
    #[error("response for channel '{channel}' is not valid JSON: {message}")]
    Decode {
        /// Channel the request was issued for.
        channel: String,
        /// Parser error message.
        message: String,
    },
    /// The arguments did not match the channel's registered contract.
    #[error("arguments for channel '{channel}' rejected: {message}")]
    Schema {
        /// Channel the call targeted.
        channel: String,
        /// What the contract expected versus what was passed.
        message: String,
    },
    /// The bridge configuration was rejected at construction time.
    #[error("invalid bridge configuration: {0}")]
    Config(String),
    /// The host identifies as a native shell but supplied no native channel.
    #[error("host reports a native shell but no native channel was provided")]
    NativeChannelMissing,
}

impl IpcError {
    /// Build an [`IpcError::Http`] for `channel`.
    #[must_use]
    pub fn http(channel: impl Into<String>, status: u16, status_text: impl Into<String>) -> Self {
        Self::Http {
            channel: channel.into(),
            status,
            status_text: status_text.into(),
        }
    }

    /// Build an [`IpcError::Network`] for `channel`.
    #[must_use]
    pub fn network(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Build an [`IpcError::Decode`] for `channel`.
    #[must_use]
    pub fn decode(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Build an [`IpcError::Schema`] for `channel`.
    #[must_use]
    pub fn schema(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Machine-readable error code for logs and structured clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyChannel => "EMPTY_CHANNEL",
            Self::Http { .. } => "HTTP_STATUS",
            Self::Network { .. } => "NETWORK",
            Self::Decode { .. } => "DECODE",
            Self::Schema { .. } => "SCHEMA_MISMATCH",
            Self::Config(_) => "CONFIG_INVALID",
            Self::NativeChannelMissing => "NATIVE_CHANNEL_MISSING",
        }
    }

    /// Whether this is a transport-level failure (HTTP status, network,
    /// or decode) as opposed to a usage or configuration error.
    ///
    /// Clients that degrade gracefully when the backend is unreachable key
    /// off this distinction.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Network { .. } | Self::Decode { .. }
        )
    }
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, IpcError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display() {
        let err = IpcError::http("get-theme", 500, "Internal Server Error");
        assert_eq!(
            err.to_string(),
            "backend returned HTTP 500 Internal Server Error for channel 'get-theme'"
        );
    }

    #[test]
    fn network_error_display() {
        let err = IpcError::network("get-theme", "connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert!(err.to_string().contains("get-theme"));
    }

    #[test]
    fn decode_error_display() {
        let err = IpcError::decode("get-theme", "expected value at line 1");
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn schema_error_display() {
        let err = IpcError::schema("create-new-project", "expected 1 argument, got 0");
        assert!(err.to_string().contains("create-new-project"));
        assert!(err.to_string().contains("expected 1 argument"));
    }

    #[test]
    fn empty_channel_display() {
        assert_eq!(
            IpcError::EmptyChannel.to_string(),
            "channel name must not be empty"
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(IpcError::EmptyChannel.code(), "EMPTY_CHANNEL");
        assert_eq!(IpcError::http("c", 404, "Not Found").code(), "HTTP_STATUS");
        assert_eq!(IpcError::network("c", "x").code(), "NETWORK");
        assert_eq!(IpcError::decode("c", "x").code(), "DECODE");
        assert_eq!(IpcError::schema("c", "x").code(), "SCHEMA_MISMATCH");
        assert_eq!(IpcError::Config("x".into()).code(), "CONFIG_INVALID");
        assert_eq!(
            IpcError::NativeChannelMissing.code(),
            "NATIVE_CHANNEL_MISSING"
        );
    }

    #[test]
    fn transport_classification() {
        assert!(IpcError::http("c", 500, "Internal Server Error").is_transport());
        assert!(IpcError::network("c", "refused").is_transport());
        assert!(IpcError::decode("c", "bad json").is_transport());
        assert!(!IpcError::EmptyChannel.is_transport());
        assert!(!IpcError::schema("c", "arity").is_transport());
        assert!(!IpcError::Config("bad url".into()).is_transport());
        assert!(!IpcError::NativeChannelMissing.is_transport());
    }
}
