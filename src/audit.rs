//! Audit logging for payout operations.
//!
//! Money movement deserves a durable trail beyond ordinary logs. The
//! orchestrator emits one event per lifecycle step through this trait;
//! implementations must never fail the operation that produced the event.

use std::fmt;

/// Audit event types for the payout lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutAuditEvent {
    /// A transfer was accepted by the gateway and recorded locally.
    PayoutInitiated {
        user_id: String,
        reference: String,
        amount: i64,
        points: u32,
    },
    /// A transfer was finalized and its record updated.
    PayoutFinalized {
        user_id: String,
        transfer_code: String,
        status: String,
    },
    /// A one-time passcode was re-sent for a pending transfer.
    PayoutOtpResent { transfer_code: String },
}

impl fmt::Display for PayoutAuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayoutInitiated {
                user_id,
                reference,
                amount,
                points,
            } => {
                write!(
                    f,
                    "Payout initiated: user={user_id}, reference={reference}, amount={amount}, points={points}"
                )
            }
            Self::PayoutFinalized {
                user_id,
                transfer_code,
                status,
            } => {
                write!(
                    f,
                    "Payout finalized: user={user_id}, transfer={transfer_code}, status={status}"
                )
            }
            Self::PayoutOtpResent { transfer_code } => {
                write!(f, "Payout OTP resent: transfer={transfer_code}")
            }
        }
    }
}

/// Trait for audit logging backends.
///
/// Implementations should handle their own failures (e.g. log to stderr)
/// rather than surfacing them; an audit failure must not fail a payout.
#[allow(async_fn_in_trait)]
pub trait PayoutAuditLogger: Send + Sync {
    /// Record a payout audit event.
    async fn log(&self, event: PayoutAuditEvent);
}

/// No-op audit logger for when auditing is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

impl PayoutAuditLogger for NoOpAuditLogger {
    async fn log(&self, _event: PayoutAuditEvent) {}
}

/// Audit logger emitting events through `tracing` at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl PayoutAuditLogger for TracingAuditLogger {
    async fn log(&self, event: PayoutAuditEvent) {
        tracing::info!(
            target: "payrail::audit",
            event_type = %event_kind(&event),
            "{}", event
        );
    }
}

/// The event kind as a string for structured logging.
fn event_kind(event: &PayoutAuditEvent) -> &'static str {
    match event {
        PayoutAuditEvent::PayoutInitiated { .. } => "payout_initiated",
        PayoutAuditEvent::PayoutFinalized { .. } => "payout_finalized",
        PayoutAuditEvent::PayoutOtpResent { .. } => "payout_otp_resent",
    }
}
