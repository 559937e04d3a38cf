//! Customer registry: mapping users to gateway customer identities.
//!
//! Customers are created lazily on first need and reused forever after;
//! calling [`CustomerRegistry::ensure`] twice for the same user never
//! creates a second gateway customer.

use serde::{Deserialize, Serialize};

use crate::error::{PayrailError, Result};
use crate::storage::{Customer, PayoutStore, UserAccount};

/// Request to create a customer at the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// The identity the gateway assigns to a new customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerHandle {
    pub id: u64,
    pub customer_code: String,
}

/// Gateway customer operations.
#[allow(async_fn_in_trait)]
pub trait PaystackCustomerClient: Send + Sync {
    /// Create a customer at the gateway.
    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<CustomerHandle>;
}

/// Lazy, idempotent user-to-customer mapping.
pub struct CustomerRegistry<S: PayoutStore, C: PaystackCustomerClient> {
    store: S,
    client: C,
}

impl<S: PayoutStore, C: PaystackCustomerClient> CustomerRegistry<S, C> {
    /// Create a new registry.
    #[must_use]
    pub fn new(store: S, client: C) -> Self {
        Self { store, client }
    }

    /// Get the customer record for a user, creating one if needed.
    ///
    /// The gateway is only contacted when no local record exists. The full
    /// name is split into first and last tokens; anything beyond the second
    /// token is discarded, and a single-token name gets an empty last name.
    pub async fn ensure(&self, user: &impl UserAccount) -> Result<Customer> {
        if let Some(existing) = self.store.find_customer_by_user(user.user_id()).await? {
            return Ok(existing);
        }

        let (first_name, last_name) = split_full_name(user.full_name());
        let handle = self
            .client
            .create_customer(CreateCustomerRequest {
                email: user.email().to_string(),
                first_name,
                last_name,
            })
            .await?;

        let customer = Customer {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.user_id().to_string(),
            gateway_id: handle.id,
            customer_code: handle.customer_code,
            bank_details: None,
        };
        self.store.create_customer(&customer).await?;

        tracing::info!(
            target: "payrail::customer",
            user_id = %customer.user_id,
            customer_code = %customer.customer_code,
            "gateway customer created"
        );
        Ok(customer)
    }

    /// Look up a user's customer record without creating one.
    pub async fn find(&self, user_id: &str) -> Result<Option<Customer>> {
        self.store.find_customer_by_user(user_id).await
    }

    /// Read-only lookup that fails when no record exists.
    pub async fn get(&self, user_id: &str) -> Result<Customer> {
        self.find(user_id).await?.ok_or_else(|| {
            PayrailError::not_found(format!("no customer record for user {user_id}"))
        })
    }
}

/// Split a display name into the first two whitespace-separated tokens.
fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.next().unwrap_or("").to_string();
    (first, last)
}

/// Mock customer client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, RwLock};

    /// Mock customer client recording every creation request.
    #[derive(Default, Clone)]
    pub struct MockCustomerClient {
        inner: Arc<MockInner>,
    }

    #[derive(Default)]
    struct MockInner {
        counter: AtomicU64,
        requests: RwLock<Vec<CreateCustomerRequest>>,
    }

    impl MockCustomerClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of customers created so far.
        #[must_use]
        pub fn create_calls(&self) -> u64 {
            self.inner.counter.load(Ordering::SeqCst)
        }

        /// Every creation request seen (for assertions).
        #[must_use]
        pub fn requests(&self) -> Vec<CreateCustomerRequest> {
            self.inner.requests.read().unwrap().clone()
        }
    }

    impl PaystackCustomerClient for MockCustomerClient {
        async fn create_customer(&self, request: CreateCustomerRequest) -> Result<CustomerHandle> {
            let n = self.inner.counter.fetch_add(1, Ordering::SeqCst);
            self.inner.requests.write().unwrap().push(request);
            Ok(CustomerHandle {
                id: 1000 + n,
                customer_code: format!("CUS_mock_{n}"),
            })
        }
    }
}
