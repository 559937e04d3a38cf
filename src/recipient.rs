//! Recipient registry: registering payout destinations with the gateway.
//!
//! The supported payout rail is NUBAN bank accounts in NGN. Registration
//! creates the user's customer record if needed, registers the account with
//! the gateway, and persists the returned recipient code onto the customer.

use serde::{Deserialize, Serialize};

use crate::customer::{CustomerRegistry, PaystackCustomerClient};
use crate::error::Result;
use crate::storage::{BankDetails, PayoutStore, UserAccount};
use crate::validation::{validate_account_number, validate_bank_code};

/// Recipient type for the supported payout rail.
const RECIPIENT_TYPE: &str = "nuban";
/// Settlement currency for the supported payout rail.
const RECIPIENT_CURRENCY: &str = "NGN";

/// Request to register a transfer recipient at the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRecipientRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
}

/// The handle the gateway assigns to a registered recipient.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipientHandle {
    pub recipient_code: String,
}

/// Gateway recipient operations.
#[allow(async_fn_in_trait)]
pub trait PaystackRecipientClient: Send + Sync {
    /// Register a transfer recipient at the gateway.
    async fn create_recipient(&self, request: CreateRecipientRequest) -> Result<RecipientHandle>;
}

/// Registers payout destinations and persists them onto the customer.
pub struct RecipientRegistry<S, C>
where
    S: PayoutStore,
    C: PaystackCustomerClient + PaystackRecipientClient,
{
    store: S,
    client: C,
    customers: CustomerRegistry<S, C>,
}

impl<S, C> RecipientRegistry<S, C>
where
    S: PayoutStore + Clone,
    C: PaystackCustomerClient + PaystackRecipientClient + Clone,
{
    /// Create a new registry.
    #[must_use]
    pub fn new(store: S, client: C) -> Self {
        Self {
            customers: CustomerRegistry::new(store.clone(), client.clone()),
            store,
            client,
        }
    }

    /// Register a user's bank account as a payout destination.
    ///
    /// Validates the account number and bank code locally, resolves or
    /// creates the user's customer record, registers the recipient with the
    /// gateway, and persists the returned recipient code plus the holder
    /// name, account number, and bank code onto the customer.
    pub async fn register(
        &self,
        user: &impl UserAccount,
        account_number: &str,
        bank_code: &str,
    ) -> Result<BankDetails> {
        validate_account_number(account_number)?;
        validate_bank_code(bank_code)?;

        let customer = self.customers.ensure(user).await?;

        let handle = self
            .client
            .create_recipient(CreateRecipientRequest {
                kind: RECIPIENT_TYPE.to_string(),
                name: user.full_name().to_string(),
                account_number: account_number.to_string(),
                bank_code: bank_code.to_string(),
                currency: RECIPIENT_CURRENCY.to_string(),
            })
            .await?;

        let details = BankDetails {
            recipient_code: handle.recipient_code,
            account_name: user.full_name().to_string(),
            account_number: account_number.to_string(),
            bank_code: bank_code.to_string(),
        };
        self.store.set_bank_details(&customer.id, &details).await?;

        tracing::info!(
            target: "payrail::recipient",
            user_id = %customer.user_id,
            recipient_code = %details.recipient_code,
            "payout destination registered"
        );
        Ok(details)
    }
}

/// Mock recipient client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use crate::error::PayrailError;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, RwLock};

    /// Mock recipient client recording every registration request.
    #[derive(Default, Clone)]
    pub struct MockRecipientClient {
        inner: Arc<MockInner>,
    }

    #[derive(Default)]
    struct MockInner {
        counter: AtomicU64,
        reject: AtomicBool,
        requests: RwLock<Vec<CreateRecipientRequest>>,
    }

    impl MockRecipientClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the mock reject every registration, as the gateway does for
        /// an unresolvable account.
        pub fn reject_registrations(&self) {
            self.inner.reject.store(true, Ordering::SeqCst);
        }

        /// Every registration request seen (for assertions).
        #[must_use]
        pub fn requests(&self) -> Vec<CreateRecipientRequest> {
            self.inner.requests.read().unwrap().clone()
        }
    }

    impl PaystackRecipientClient for MockRecipientClient {
        async fn create_recipient(
            &self,
            request: CreateRecipientRequest,
        ) -> Result<RecipientHandle> {
            if self.inner.reject.load(Ordering::SeqCst) {
                return Err(PayrailError::provider(
                    "create_recipient",
                    "Could not resolve account name. Check parameters or try again",
                ));
            }
            let n = self.inner.counter.fetch_add(1, Ordering::SeqCst);
            self.inner.requests.write().unwrap().push(request);
            Ok(RecipientHandle {
                recipient_code: format!("RCP_mock_{n}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test::MockPaystackClient;
    use crate::error::PayrailError;
    use crate::storage::test::InMemoryPayoutStore;

    struct TestUser;

    impl UserAccount for TestUser {
        fn user_id(&self) -> &str {
            "u1"
        }

        fn full_name(&self) -> &str {
            "Ada Obi"
        }

        fn email(&self) -> &str {
            "ada@example.com"
        }
    }

    #[tokio::test]
    async fn test_register_persists_bank_details() {
        let store = InMemoryPayoutStore::new();
        let gateway = MockPaystackClient::new();
        let registry = RecipientRegistry::new(store.clone(), gateway.clone());

        let details = registry.register(&TestUser, "0001234567", "058").await.unwrap();
        assert_eq!(details.account_name, "Ada Obi");
        assert!(details.recipient_code.starts_with("RCP_mock_"));

        // The customer was created lazily and carries the details.
        let customer = store.find_customer_by_user("u1").await.unwrap().unwrap();
        assert_eq!(customer.bank_details.unwrap(), details);

        // The gateway saw the fixed rail parameters.
        let request = &gateway.recipients.requests()[0];
        assert_eq!(request.kind, "nuban");
        assert_eq!(request.currency, "NGN");
        assert_eq!(request.bank_code, "058");
    }

    #[tokio::test]
    async fn test_invalid_account_number_skips_gateway() {
        let gateway = MockPaystackClient::new();
        let registry = RecipientRegistry::new(InMemoryPayoutStore::new(), gateway.clone());

        let err = registry.register(&TestUser, "12345", "058").await.unwrap_err();
        assert!(matches!(err, PayrailError::Validation(_)));
        assert_eq!(gateway.customers.create_calls(), 0);
        assert!(gateway.recipients.requests().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_rejection_propagates() {
        let store = InMemoryPayoutStore::new();
        let gateway = MockPaystackClient::new();
        gateway.recipients.reject_registrations();
        let registry = RecipientRegistry::new(store.clone(), gateway);

        let err = registry.register(&TestUser, "0001234567", "058").await.unwrap_err();
        assert!(matches!(err, PayrailError::Provider { .. }));

        // No bank details were persisted.
        let customer = store.find_customer_by_user("u1").await.unwrap().unwrap();
        assert!(customer.bank_details.is_none());
    }
}
