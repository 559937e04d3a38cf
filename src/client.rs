//! Consolidated gateway client types.
//!
//! Individual managers depend on narrow per-concern traits; this module
//! provides the unified bound for when one value must serve them all, plus
//! a comprehensive mock for integration-style tests.

use crate::customer::PaystackCustomerClient;
use crate::plans::PaystackPlanClient;
use crate::recipient::PaystackRecipientClient;
use crate::subscription::PaystackSubscriptionClient;
use crate::transfer::PaystackTransferClient;

/// A type that implements every gateway client trait.
///
/// Use this bound when wiring one client through the whole system.
/// Managers keep their narrow bounds so test doubles stay small.
pub trait FullPaystackClient:
    PaystackCustomerClient
    + PaystackPlanClient
    + PaystackSubscriptionClient
    + PaystackRecipientClient
    + PaystackTransferClient
{
}

/// Blanket implementation for any type implementing all traits.
impl<T> FullPaystackClient for T where
    T: PaystackCustomerClient
        + PaystackPlanClient
        + PaystackSubscriptionClient
        + PaystackRecipientClient
        + PaystackTransferClient
{
}

/// Comprehensive mock gateway client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use crate::customer::test::MockCustomerClient;
    use crate::customer::{CreateCustomerRequest, CustomerHandle};
    use crate::error::Result;
    use crate::plans::test::MockPlanClient;
    use crate::plans::Plan;
    use crate::recipient::test::MockRecipientClient;
    use crate::recipient::{CreateRecipientRequest, RecipientHandle};
    use crate::subscription::test::MockSubscriptionClient;
    use crate::subscription::{
        DisableSubscriptionRequest, InitializeTransactionRequest, SubscriptionDetail,
        TransactionHandle,
    };
    use crate::transfer::test::MockTransferClient;
    use crate::transfer::{
        FinalizeTransferRequest, InitiateTransferRequest, ResendOtpRequest, TransferReply,
    };

    /// A mock implementing every gateway client trait.
    ///
    /// The per-concern mocks are exposed as public fields for seeding and
    /// assertions. For unit tests, prefer the individual mocks.
    #[derive(Default, Clone)]
    pub struct MockPaystackClient {
        pub customers: MockCustomerClient,
        pub plans: MockPlanClient,
        pub subscriptions: MockSubscriptionClient,
        pub recipients: MockRecipientClient,
        pub transfers: MockTransferClient,
    }

    impl MockPaystackClient {
        /// Create a mock client that accepts everything.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl PaystackCustomerClient for MockPaystackClient {
        async fn create_customer(&self, request: CreateCustomerRequest) -> Result<CustomerHandle> {
            self.customers.create_customer(request).await
        }
    }

    impl PaystackPlanClient for MockPaystackClient {
        async fn fetch_plan(&self, plan_code: &str) -> Result<Plan> {
            self.plans.fetch_plan(plan_code).await
        }

        async fn list_plans(&self) -> Result<Vec<Plan>> {
            self.plans.list_plans().await
        }
    }

    impl PaystackSubscriptionClient for MockPaystackClient {
        async fn fetch_subscription(&self, subscription_code: &str) -> Result<SubscriptionDetail> {
            self.subscriptions.fetch_subscription(subscription_code).await
        }

        async fn list_subscriptions(&self, customer_id: u64) -> Result<Vec<SubscriptionDetail>> {
            self.subscriptions.list_subscriptions(customer_id).await
        }

        async fn disable_subscription(&self, request: DisableSubscriptionRequest) -> Result<()> {
            self.subscriptions.disable_subscription(request).await
        }

        async fn initialize_transaction(
            &self,
            request: InitializeTransactionRequest,
        ) -> Result<TransactionHandle> {
            self.subscriptions.initialize_transaction(request).await
        }
    }

    impl PaystackRecipientClient for MockPaystackClient {
        async fn create_recipient(
            &self,
            request: CreateRecipientRequest,
        ) -> Result<RecipientHandle> {
            self.recipients.create_recipient(request).await
        }
    }

    impl PaystackTransferClient for MockPaystackClient {
        async fn initiate_transfer(
            &self,
            request: InitiateTransferRequest,
        ) -> Result<TransferReply> {
            self.transfers.initiate_transfer(request).await
        }

        async fn finalize_transfer(
            &self,
            request: FinalizeTransferRequest,
        ) -> Result<TransferReply> {
            self.transfers.finalize_transfer(request).await
        }

        async fn resend_transfer_otp(&self, request: ResendOtpRequest) -> Result<()> {
            self.transfers.resend_transfer_otp(request).await
        }
    }
}
