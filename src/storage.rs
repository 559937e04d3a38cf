//! Storage traits for payout data.
//!
//! Implement these traits to persist customers, transfer records, and the
//! point ledger in your database. An in-memory implementation is provided
//! for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A user's payout destination as registered with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BankDetails {
    /// Recipient handle returned by the gateway.
    pub recipient_code: String,
    /// Account holder name as submitted at registration.
    pub account_name: String,
    /// Bank account number.
    pub account_number: String,
    /// Bank sort code.
    pub bank_code: String,
}

/// The local record linking a user to a gateway-side customer identity.
///
/// At most one per user. Created lazily on first need, never deleted, and
/// updated in place when bank details are registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    /// Local record id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Numeric customer id assigned by the gateway.
    pub gateway_id: u64,
    /// Customer code assigned by the gateway.
    pub customer_code: String,
    /// Payout destination, once registered.
    pub bank_details: Option<BankDetails>,
}

/// Lifecycle status of a transfer, as reported by the gateway.
///
/// The status is provider-sourced: it is decoded from the gateway's
/// response and never invented locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Accepted, awaiting processing.
    Pending,
    /// Awaiting one-time-passcode confirmation.
    Otp,
    /// Funds delivered.
    Success,
    /// Transfer failed.
    Failed,
    /// Transfer was reversed after completion.
    Reversed,
}

impl TransferStatus {
    /// Parse from the gateway's status string.
    ///
    /// Unknown strings decode to `Pending`: a surprise value must not look
    /// settled, because settled records are terminal and trigger the
    /// ledger debit.
    #[must_use]
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "pending" => Self::Pending,
            "otp" => Self::Otp,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "reversed" => Self::Reversed,
            _ => Self::Pending,
        }
    }

    /// Convert to the gateway's string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Otp => "otp",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Reversed => "reversed",
        }
    }

    /// Whether the transfer has reached a settled state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Reversed)
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable record of one accepted payout attempt.
///
/// Created only after the gateway acknowledges initiation. The `points`
/// quantity is fixed at creation and is the sole source of truth for the
/// ledger debit at finalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferRecord {
    /// Numeric transfer id assigned by the gateway.
    pub gateway_id: u64,
    /// Current lifecycle status.
    pub status: TransferStatus,
    /// Transfer amount in currency subunits.
    pub amount: i64,
    /// Idempotency reference sent with the initiation.
    pub reference: String,
    /// Reward points being redeemed. Immutable after creation.
    pub points: u32,
    /// Transfer code assigned by the gateway, used for finalization.
    pub transfer_code: String,
    /// When the gateway reported the transfer complete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Owning user.
    pub user_id: String,
    /// Owning customer record.
    pub customer_id: String,
}

/// The caller's user type, seen through the fields this crate needs.
///
/// Implement this for your User model; the crate never owns user data.
pub trait UserAccount: Send + Sync {
    /// Stable identifier for the user.
    fn user_id(&self) -> &str;

    /// Full display name, used for gateway customer and recipient records.
    fn full_name(&self) -> &str;

    /// Email address, used for gateway customer and transaction records.
    fn email(&self) -> &str;
}

/// Persistence for customers and transfer records.
///
/// Implement this trait against your database. All methods are invoked from
/// async contexts and may run concurrently for different users.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Look up the customer record for a user, if one exists.
    async fn find_customer_by_user(&self, user_id: &str) -> Result<Option<Customer>>;

    /// Persist a newly created customer record.
    async fn create_customer(&self, customer: &Customer) -> Result<()>;

    /// Attach or replace the bank details on a customer record.
    async fn set_bank_details(&self, customer_id: &str, details: &BankDetails) -> Result<()>;

    /// Persist a newly accepted transfer record.
    async fn create_transfer(&self, record: &TransferRecord) -> Result<()>;

    /// Look up a transfer record by the gateway's transfer id.
    async fn find_transfer_by_gateway_id(&self, gateway_id: u64) -> Result<Option<TransferRecord>>;

    /// Update the status (and completion time) of a transfer record.
    async fn update_transfer_status(
        &self,
        gateway_id: u64,
        status: TransferStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
}

/// The user's redeemable point balance.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current point balance for a user.
    async fn point_balance(&self, user_id: &str) -> Result<i64>;

    /// Debit points from a user's balance.
    async fn decrement_points(&self, user_id: &str, points: i64) -> Result<()>;
}

/// In-memory store for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// In-memory [`PayoutStore`] and [`LedgerStore`] for tests.
    ///
    /// Wraps its data in `Arc` so clones share state across managers.
    #[derive(Default, Clone)]
    pub struct InMemoryPayoutStore {
        inner: Arc<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        customers: RwLock<HashMap<String, Customer>>,
        transfers: RwLock<HashMap<u64, TransferRecord>>,
        points: RwLock<HashMap<String, i64>>,
    }

    impl InMemoryPayoutStore {
        /// Create an empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a user's point balance.
        pub fn seed_points(&self, user_id: &str, points: i64) {
            self.inner
                .points
                .write()
                .unwrap()
                .insert(user_id.to_string(), points);
        }

        /// Current balance without going through the trait (for assertions).
        #[must_use]
        pub fn points_of(&self, user_id: &str) -> i64 {
            self.inner
                .points
                .read()
                .unwrap()
                .get(user_id)
                .copied()
                .unwrap_or(0)
        }

        /// All transfer records for a user (for assertions).
        #[must_use]
        pub fn transfers_of(&self, user_id: &str) -> Vec<TransferRecord> {
            self.inner
                .transfers
                .read()
                .unwrap()
                .values()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl PayoutStore for InMemoryPayoutStore {
        async fn find_customer_by_user(&self, user_id: &str) -> Result<Option<Customer>> {
            Ok(self
                .inner
                .customers
                .read()
                .unwrap()
                .values()
                .find(|c| c.user_id == user_id)
                .cloned())
        }

        async fn create_customer(&self, customer: &Customer) -> Result<()> {
            self.inner
                .customers
                .write()
                .unwrap()
                .insert(customer.id.clone(), customer.clone());
            Ok(())
        }

        async fn set_bank_details(&self, customer_id: &str, details: &BankDetails) -> Result<()> {
            let mut customers = self.inner.customers.write().unwrap();
            match customers.get_mut(customer_id) {
                Some(customer) => {
                    customer.bank_details = Some(details.clone());
                    Ok(())
                }
                None => Err(crate::error::PayrailError::storage(format!(
                    "no customer record {customer_id}"
                ))),
            }
        }

        async fn create_transfer(&self, record: &TransferRecord) -> Result<()> {
            self.inner
                .transfers
                .write()
                .unwrap()
                .insert(record.gateway_id, record.clone());
            Ok(())
        }

        async fn find_transfer_by_gateway_id(
            &self,
            gateway_id: u64,
        ) -> Result<Option<TransferRecord>> {
            Ok(self
                .inner
                .transfers
                .read()
                .unwrap()
                .get(&gateway_id)
                .cloned())
        }

        async fn update_transfer_status(
            &self,
            gateway_id: u64,
            status: TransferStatus,
            completed_at: Option<DateTime<Utc>>,
        ) -> Result<()> {
            let mut transfers = self.inner.transfers.write().unwrap();
            match transfers.get_mut(&gateway_id) {
                Some(record) => {
                    record.status = status;
                    record.completed_at = completed_at;
                    Ok(())
                }
                None => Err(crate::error::PayrailError::storage(format!(
                    "no transfer record for gateway id {gateway_id}"
                ))),
            }
        }
    }

    #[async_trait]
    impl LedgerStore for InMemoryPayoutStore {
        async fn point_balance(&self, user_id: &str) -> Result<i64> {
            Ok(self.points_of(user_id))
        }

        async fn decrement_points(&self, user_id: &str, points: i64) -> Result<()> {
            let mut balances = self.inner.points.write().unwrap();
            *balances.entry(user_id.to_string()).or_insert(0) -= points;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_status_from_gateway() {
        assert_eq!(TransferStatus::from_gateway("pending"), TransferStatus::Pending);
        assert_eq!(TransferStatus::from_gateway("otp"), TransferStatus::Otp);
        assert_eq!(TransferStatus::from_gateway("success"), TransferStatus::Success);
        assert_eq!(TransferStatus::from_gateway("failed"), TransferStatus::Failed);
        assert_eq!(TransferStatus::from_gateway("reversed"), TransferStatus::Reversed);
        // Surprise values must not look settled.
        assert_eq!(TransferStatus::from_gateway("blocked"), TransferStatus::Pending);
    }

    #[test]
    fn test_transfer_status_terminal() {
        assert!(TransferStatus::Success.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Reversed.is_terminal());
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Otp.is_terminal());
    }

    #[tokio::test]
    async fn test_in_memory_store_roundtrip() {
        use test::InMemoryPayoutStore;

        let store = InMemoryPayoutStore::new();

        assert!(store.find_customer_by_user("u1").await.unwrap().is_none());

        let customer = Customer {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            gateway_id: 77,
            customer_code: "CUS_abc".to_string(),
            bank_details: None,
        };
        store.create_customer(&customer).await.unwrap();

        let loaded = store.find_customer_by_user("u1").await.unwrap().unwrap();
        assert_eq!(loaded.customer_code, "CUS_abc");
        assert!(loaded.bank_details.is_none());

        let details = BankDetails {
            recipient_code: "RCP_xyz".to_string(),
            account_name: "Ada Obi".to_string(),
            account_number: "0001234567".to_string(),
            bank_code: "058".to_string(),
        };
        store.set_bank_details("c1", &details).await.unwrap();
        let loaded = store.find_customer_by_user("u1").await.unwrap().unwrap();
        assert_eq!(loaded.bank_details.unwrap().recipient_code, "RCP_xyz");

        let record = TransferRecord {
            gateway_id: 9001,
            status: TransferStatus::Otp,
            amount: 50_000,
            reference: "ref-1".to_string(),
            points: 10,
            transfer_code: "TRF_1".to_string(),
            completed_at: None,
            user_id: "u1".to_string(),
            customer_id: "c1".to_string(),
        };
        store.create_transfer(&record).await.unwrap();

        store
            .update_transfer_status(9001, TransferStatus::Success, Some(Utc::now()))
            .await
            .unwrap();
        let loaded = store.find_transfer_by_gateway_id(9001).await.unwrap().unwrap();
        assert_eq!(loaded.status, TransferStatus::Success);
        assert!(loaded.completed_at.is_some());
        assert_eq!(loaded.points, 10);
    }

    #[tokio::test]
    async fn test_in_memory_ledger() {
        use test::InMemoryPayoutStore;

        let store = InMemoryPayoutStore::new();
        store.seed_points("u1", 100);

        assert_eq!(store.point_balance("u1").await.unwrap(), 100);
        store.decrement_points("u1", 10).await.unwrap();
        assert_eq!(store.point_balance("u1").await.unwrap(), 90);
        assert_eq!(store.point_balance("unknown").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_transfer_fails() {
        use test::InMemoryPayoutStore;

        let store = InMemoryPayoutStore::new();
        let err = store
            .update_transfer_status(1, TransferStatus::Success, None)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::PayrailError::Storage(_)));
    }
}
