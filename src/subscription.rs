//! Subscription management: purchase, list, and cancel.
//!
//! Purchase initializes a card transaction at the gateway and returns the
//! redirect handle for the caller to complete client-side; confirmation
//! arrives asynchronously through the gateway's webhook, which is outside
//! this crate. No local transaction record is persisted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customer::{CustomerRegistry, PaystackCustomerClient};
use crate::error::Result;
use crate::plans::{PaystackPlanClient, PlanCatalog};
use crate::storage::{PayoutStore, UserAccount};
use crate::validation::validate_plan_code;

/// The only payment channel offered at checkout.
const PAYMENT_CHANNELS: &[&str] = &["card"];

/// Lifecycle state of a subscription, as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionState {
    Active,
    NonRenewing,
    Attention,
    Completed,
    Cancelled,
}

impl SubscriptionState {
    /// Parse from the gateway's status string.
    ///
    /// Unknown strings decode to `Cancelled`, which keeps them out of user
    /// listings.
    #[must_use]
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "non-renewing" => Self::NonRenewing,
            "attention" => Self::Attention,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Cancelled,
        }
    }

    /// Convert to the gateway's string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::NonRenewing => "non-renewing",
            Self::Attention => "attention",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subscription as the gateway reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDetail {
    pub id: u64,
    pub subscription_code: String,
    pub email_token: String,
    pub status: String,
    /// Price in currency subunits.
    pub amount: i64,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub next_payment_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    /// Card authorization descriptor, passed through untouched.
    #[serde(default)]
    pub authorization: serde_json::Value,
}

/// The subset of subscription fields exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSnapshot {
    pub state: SubscriptionState,
    pub id: u64,
    pub start: Option<i64>,
    pub email_token: String,
    pub amount: i64,
    pub next_payment_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub authorization: serde_json::Value,
}

impl SubscriptionSnapshot {
    fn from_detail(detail: SubscriptionDetail, state: SubscriptionState) -> Self {
        Self {
            state,
            id: detail.id,
            start: detail.start,
            email_token: detail.email_token,
            amount: detail.amount,
            next_payment_date: detail.next_payment_date,
            created_at: detail.created_at,
            authorization: detail.authorization,
        }
    }
}

/// Request to initialize a checkout transaction.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransactionRequest {
    pub email: String,
    /// Amount in currency subunits.
    pub amount: i64,
    pub plan: String,
    pub channels: Vec<String>,
}

/// Request to disable a subscription.
#[derive(Debug, Clone, Serialize)]
pub struct DisableSubscriptionRequest {
    pub code: String,
    pub token: String,
}

/// The gateway's handle for a transaction awaiting client-side completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Gateway subscription and transaction operations.
#[allow(async_fn_in_trait)]
pub trait PaystackSubscriptionClient: Send + Sync {
    /// Fetch one subscription by its code.
    async fn fetch_subscription(&self, subscription_code: &str) -> Result<SubscriptionDetail>;

    /// List subscriptions for a gateway customer id.
    async fn list_subscriptions(&self, customer_id: u64) -> Result<Vec<SubscriptionDetail>>;

    /// Disable a subscription.
    async fn disable_subscription(&self, request: DisableSubscriptionRequest) -> Result<()>;

    /// Initialize a checkout transaction.
    async fn initialize_transaction(
        &self,
        request: InitializeTransactionRequest,
    ) -> Result<TransactionHandle>;
}

/// Purchase, list, and cancel subscriptions for a customer.
pub struct SubscriptionManager<S, C>
where
    S: PayoutStore,
    C: PaystackCustomerClient + PaystackPlanClient + PaystackSubscriptionClient,
{
    customers: CustomerRegistry<S, C>,
    catalog: PlanCatalog<C>,
    client: C,
}

impl<S, C> SubscriptionManager<S, C>
where
    S: PayoutStore + Clone,
    C: PaystackCustomerClient + PaystackPlanClient + PaystackSubscriptionClient + Clone,
{
    /// Create a new manager.
    #[must_use]
    pub fn new(store: S, client: C) -> Self {
        Self {
            customers: CustomerRegistry::new(store, client.clone()),
            catalog: PlanCatalog::new(client.clone()),
            client,
        }
    }

    /// Start a subscription purchase.
    ///
    /// Resolves or creates the customer, checks that the plan is still
    /// available, and initializes a card transaction for the plan amount.
    /// Returns the gateway's redirect handle; payment completes client-side.
    pub async fn purchase(
        &self,
        user: &impl UserAccount,
        plan_code: &str,
    ) -> Result<TransactionHandle> {
        validate_plan_code(plan_code)?;

        let customer = self.customers.ensure(user).await?;
        let plan = self.catalog.plan(plan_code).await?;
        if !plan.is_available() {
            return Err(crate::error::PayrailError::forbidden(
                "this plan is not available for subscription",
            ));
        }

        let handle = self
            .client
            .initialize_transaction(InitializeTransactionRequest {
                email: user.email().to_string(),
                amount: plan.amount,
                plan: plan.plan_code.clone(),
                channels: PAYMENT_CHANNELS.iter().map(|c| (*c).to_string()).collect(),
            })
            .await?;

        tracing::info!(
            target: "payrail::subscription",
            user_id = %customer.user_id,
            plan = %plan.plan_code,
            reference = %handle.reference,
            "checkout transaction initialized"
        );
        Ok(handle)
    }

    /// The user's current subscriptions, filtered to `active` and
    /// `non-renewing`. Returns an empty list when the user has no customer
    /// record yet.
    pub async fn subscriptions(&self, user_id: &str) -> Result<Vec<SubscriptionSnapshot>> {
        let Some(customer) = self.customers.find(user_id).await? else {
            return Ok(Vec::new());
        };

        let details = self.client.list_subscriptions(customer.gateway_id).await?;
        Ok(details
            .into_iter()
            .filter_map(|detail| {
                let state = SubscriptionState::from_gateway(&detail.status);
                matches!(
                    state,
                    SubscriptionState::Active | SubscriptionState::NonRenewing
                )
                .then(|| SubscriptionSnapshot::from_detail(detail, state))
            })
            .collect())
    }

    /// Cancel a subscription by its code.
    ///
    /// The gateway requires the subscription's email token alongside its
    /// code, so the subscription is fetched first to recover it.
    pub async fn cancel(&self, subscription_code: &str) -> Result<()> {
        let detail = self.client.fetch_subscription(subscription_code).await?;
        self.client
            .disable_subscription(DisableSubscriptionRequest {
                code: detail.subscription_code.clone(),
                token: detail.email_token,
            })
            .await?;

        tracing::info!(
            target: "payrail::subscription",
            subscription_code = %detail.subscription_code,
            "subscription cancelled"
        );
        Ok(())
    }
}

/// Mock subscription client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use crate::error::PayrailError;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, RwLock};

    /// Mock subscription client backed by seeded subscription details.
    #[derive(Default, Clone)]
    pub struct MockSubscriptionClient {
        inner: Arc<MockInner>,
    }

    #[derive(Default)]
    struct MockInner {
        subscriptions: RwLock<Vec<SubscriptionDetail>>,
        init_counter: AtomicU64,
        init_requests: RwLock<Vec<InitializeTransactionRequest>>,
        disable_requests: RwLock<Vec<DisableSubscriptionRequest>>,
    }

    impl MockSubscriptionClient {
        /// Create an empty mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a subscription.
        pub fn add_subscription(&self, detail: SubscriptionDetail) {
            self.inner.subscriptions.write().unwrap().push(detail);
        }

        /// Number of transactions initialized.
        #[must_use]
        pub fn initialize_calls(&self) -> u64 {
            self.inner.init_counter.load(Ordering::SeqCst)
        }

        /// Every initialization request seen (for assertions).
        #[must_use]
        pub fn initialize_requests(&self) -> Vec<InitializeTransactionRequest> {
            self.inner.init_requests.read().unwrap().clone()
        }

        /// Every disable request seen (for assertions).
        #[must_use]
        pub fn disable_requests(&self) -> Vec<DisableSubscriptionRequest> {
            self.inner.disable_requests.read().unwrap().clone()
        }
    }

    /// Build a subscription detail for tests.
    #[must_use]
    pub fn subscription(id: u64, code: &str, status: &str) -> SubscriptionDetail {
        SubscriptionDetail {
            id,
            subscription_code: code.to_string(),
            email_token: format!("tok_{id}"),
            status: status.to_string(),
            amount: 250_000,
            start: Some(1_700_000_000),
            next_payment_date: None,
            created_at: None,
            authorization: serde_json::json!({"last4": "4081"}),
        }
    }

    impl PaystackSubscriptionClient for MockSubscriptionClient {
        async fn fetch_subscription(&self, subscription_code: &str) -> Result<SubscriptionDetail> {
            self.inner
                .subscriptions
                .read()
                .unwrap()
                .iter()
                .find(|s| s.subscription_code == subscription_code)
                .cloned()
                .ok_or_else(|| PayrailError::provider("fetch_subscription", "subscription not found"))
        }

        async fn list_subscriptions(&self, _customer_id: u64) -> Result<Vec<SubscriptionDetail>> {
            Ok(self.inner.subscriptions.read().unwrap().clone())
        }

        async fn disable_subscription(&self, request: DisableSubscriptionRequest) -> Result<()> {
            let known = self
                .inner
                .subscriptions
                .read()
                .unwrap()
                .iter()
                .any(|s| s.subscription_code == request.code && s.email_token == request.token);
            if !known {
                return Err(PayrailError::provider(
                    "disable_subscription",
                    "Subscription with code not found or already inactive",
                ));
            }
            self.inner.disable_requests.write().unwrap().push(request);
            Ok(())
        }

        async fn initialize_transaction(
            &self,
            request: InitializeTransactionRequest,
        ) -> Result<TransactionHandle> {
            let n = self.inner.init_counter.fetch_add(1, Ordering::SeqCst);
            self.inner.init_requests.write().unwrap().push(request);
            Ok(TransactionHandle {
                authorization_url: format!("https://checkout.paystack.com/mock{n}"),
                access_code: format!("access_mock_{n}"),
                reference: format!("ref_mock_{n}"),
            })
        }
    }
}
