//! Payrail - payout and subscription orchestration for Paystack
//!
//! Payrail turns user-facing requests ("buy this plan", "cash out my
//! reward points") into correctly sequenced Paystack calls, with durable
//! local bookkeeping so money movement and point balances stay consistent
//! under partial failure.
//!
//! # Features
//!
//! - **Customers**: lazy, idempotent mapping of users to gateway customers
//! - **Plans**: read-through plan catalog with purchase-time availability gating
//! - **Subscriptions**: purchase, list (active/non-renewing), cancel
//! - **Payouts**: OTP-finalized bank transfers with bounded retry, a fixed
//!   idempotency reference, per-user serialization, and a point ledger
//!   debited exactly once per confirmed transfer
//! - **Testing**: mock gateway clients and an in-memory store behind the
//!   `test-gateway` feature
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use payrail::{
//!     LivePaystackClient, PayoutConfig, TransferOrchestrator, TracingAuditLogger,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     payrail::init_tracing();
//!
//!     let client = LivePaystackClient::with_default_config(secret_key).unwrap();
//!     let orchestrator =
//!         TransferOrchestrator::new(store, ledger, client, PayoutConfig::default())
//!             .with_audit_logger(TracingAuditLogger);
//!
//!     let record = orchestrator.initiate_payout("user-1", 10).await?;
//!     // ... user receives the OTP out of band ...
//!     orchestrator.finalize_transfer("user-1", &record.transfer_code, &otp).await?;
//! }
//! ```

#![allow(async_fn_in_trait)] // client traits are consumed generically, not as trait objects

pub mod audit;
pub mod client;
pub mod config;
pub mod customer;
mod error;
pub mod live_client;
pub mod plans;
pub mod recipient;
pub mod retry;
pub mod storage;
pub mod subscription;
pub mod transfer;
pub mod validation;

// Error exports
pub use error::{PayrailError, Result};

// Config exports
pub use config::PayoutConfig;

// Retry exports
pub use retry::{Backoff, RetryPolicy};

// Storage exports
pub use storage::{
    BankDetails, Customer, LedgerStore, PayoutStore, TransferRecord, TransferStatus, UserAccount,
};

// Customer exports
pub use customer::{CreateCustomerRequest, CustomerHandle, CustomerRegistry, PaystackCustomerClient};

// Plan exports
pub use plans::{PaystackPlanClient, Plan, PlanCatalog};

// Recipient exports
pub use recipient::{
    CreateRecipientRequest, PaystackRecipientClient, RecipientHandle, RecipientRegistry,
};

// Subscription exports
pub use subscription::{
    DisableSubscriptionRequest, InitializeTransactionRequest, PaystackSubscriptionClient,
    SubscriptionDetail, SubscriptionManager, SubscriptionSnapshot, SubscriptionState,
    TransactionHandle,
};

// Transfer exports
pub use transfer::{
    FinalizeTransferRequest, InitiateTransferRequest, PaystackTransferClient, ResendOtpRequest,
    TransferOrchestrator, TransferReply,
};

// Audit exports
pub use audit::{NoOpAuditLogger, PayoutAuditEvent, PayoutAuditLogger, TracingAuditLogger};

// Client exports
pub use client::FullPaystackClient;

// Live client exports
pub use live_client::{InvalidSecretKeyError, LivePaystackClient, LivePaystackClientConfig};

// Test exports
#[cfg(any(test, feature = "test-gateway"))]
pub use client::test::MockPaystackClient;

#[cfg(any(test, feature = "test-gateway"))]
pub use storage::test::InMemoryPayoutStore;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults
///
/// Call this early in your application, before wiring up the managers.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "payrail=debug")
/// - `PAYRAIL_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("PAYRAIL_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
