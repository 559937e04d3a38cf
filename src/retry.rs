//! Retry policy for gateway operations.
//!
//! Gateway calls can fail transiently; this module provides the single
//! retry mechanism shared by any operation that needs one. The policy is
//! explicit about its three inputs: how many attempts are allowed, how long
//! to wait between them, and which errors qualify for another attempt
//! (decided by [`PayrailError::is_retryable`]).

use std::future::Future;
use std::time::Duration;

use crate::error::{PayrailError, Result};

/// How long to wait before the next attempt.
#[derive(Debug, Clone)]
pub enum Backoff {
    /// The same delay between every attempt.
    Fixed(Duration),
    /// `base * 2^attempt`, capped at `cap`, with up to 25% added jitter.
    Exponential { base: Duration, cap: Duration },
}

impl Backoff {
    /// Delay before the attempt following `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { base, cap } => {
                let base_ms = base.as_millis() as u64;
                let cap_ms = cap.as_millis() as u64;
                let delay_ms = base_ms
                    .saturating_mul(2_u64.saturating_pow(attempt))
                    .min(cap_ms);
                let jitter = if delay_ms > 0 {
                    fastrand::u64(0..=delay_ms / 4)
                } else {
                    0
                };
                Duration::from_millis(delay_ms.saturating_add(jitter))
            }
        }
    }
}

/// A bounded retry policy for transient gateway failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// A policy with a fixed delay between attempts.
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(delay),
        }
    }

    /// A policy with exponential backoff and jitter.
    #[must_use]
    pub fn exponential(max_attempts: u32, base: Duration, cap: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { base, cap },
        }
    }

    /// Total number of attempts this policy allows.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Drive `op` until it succeeds, fails terminally, or the budget runs out.
    ///
    /// Non-retryable errors (gateway rejections, local failures) are
    /// returned as-is from the attempt that produced them. Exhausting the
    /// budget on retryable errors returns
    /// [`PayrailError::ServiceUnavailable`].
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            target: "payrail::retry",
                            operation,
                            attempts = attempt,
                            error = %err,
                            "retry budget exhausted"
                        );
                        return Err(PayrailError::ServiceUnavailable {
                            operation: operation.to_string(),
                            attempts: attempt,
                        });
                    }

                    let delay = self.backoff.delay(attempt - 1);
                    tracing::warn!(
                        target: "payrail::retry",
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient gateway failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
