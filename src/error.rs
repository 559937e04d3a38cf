//! Error types for payout and subscription operations.
//!
//! Every fallible operation in the crate returns [`PayrailError`]. The
//! variants separate local precondition failures, explicit gateway
//! rejections, and transport-class failures, because each propagates
//! differently: precondition failures never reach the gateway, rejections
//! are never retried, and only transport failures are eligible for retry.

use thiserror::Error;

/// The error type for all payout and subscription operations.
#[derive(Debug, Error)]
pub enum PayrailError {
    /// A local precondition failed before any gateway call was made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The operation is not allowed in the current state.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A required record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The gateway explicitly rejected the request (`status: false` in the
    /// response envelope). Carries the gateway's own message. Never retried.
    #[error("Gateway rejected {operation}: {message}")]
    Provider { operation: String, message: String },

    /// The gateway could not be reached or answered outside its contract
    /// (connection failure, timeout, 5xx). Eligible for retry.
    #[error("Gateway unreachable during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// The retry budget for an operation was exhausted.
    #[error("{operation} failed after {attempts} attempts")]
    ServiceUnavailable { operation: String, attempts: u32 },

    /// The backing store reported a failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An invariant was violated or a response could not be decoded.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PayrailError>;

impl PayrailError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn provider(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a retry policy may re-attempt the failed operation.
    ///
    /// Only transport-class failures qualify. Gateway rejections are
    /// terminal: the gateway saw the request and said no.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this error was caused by the caller (4xx-class).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Forbidden(_) | Self::NotFound(_) | Self::Provider { .. }
        )
    }

    /// The canonical HTTP status for this error kind.
    ///
    /// The crate owns no HTTP layer; this is the mapping an upstream
    /// request handler is expected to apply.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Provider { .. } => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Transport { .. } => 502,
            Self::ServiceUnavailable { .. } => 503,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }
}
