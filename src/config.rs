//! Payout configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Configuration for the payout path.
///
/// The point-to-cash conversion is a deployment constant, not something
/// derived per call: one reward point is worth `point_rate` major currency
/// units, and the gateway expects amounts in subunits (kobo for NGN).
#[derive(Debug, Clone)]
pub struct PayoutConfig {
    /// Major currency units paid out per reward point.
    pub point_rate: i64,
    /// Subunits per major currency unit.
    pub currency_subunit: i64,
    /// Retry policy applied to transfer initiation.
    pub initiate_retry: RetryPolicy,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            point_rate: 50,
            currency_subunit: 100,
            initiate_retry: RetryPolicy::fixed(3, Duration::from_secs(1)),
        }
    }
}

impl PayoutConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the payout value of one reward point, in major currency units.
    #[must_use]
    pub fn point_rate(mut self, rate: i64) -> Self {
        self.point_rate = rate;
        self
    }

    /// Set the number of subunits per major currency unit.
    #[must_use]
    pub fn currency_subunit(mut self, subunit: i64) -> Self {
        self.currency_subunit = subunit;
        self
    }

    /// Set the retry policy for transfer initiation.
    #[must_use]
    pub fn initiate_retry(mut self, policy: RetryPolicy) -> Self {
        self.initiate_retry = policy;
        self
    }

    /// The transfer amount, in currency subunits, for a point quantity.
    #[must_use]
    pub fn payout_amount(&self, points: u32) -> i64 {
        i64::from(points) * self.point_rate * self.currency_subunit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_conversion() {
        let config = PayoutConfig::default();
        // 10 points at 50 NGN each, in kobo.
        assert_eq!(config.payout_amount(10), 50_000);
        assert_eq!(config.payout_amount(0), 0);
    }

    #[test]
    fn test_builder_overrides() {
        let config = PayoutConfig::new().point_rate(25).currency_subunit(1);
        assert_eq!(config.payout_amount(4), 100);
        assert_eq!(config.initiate_retry.max_attempts(), 3);
    }
}
