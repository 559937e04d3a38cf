//! Transfer orchestration: the payout state machine.
//!
//! A payout moves through `Requested → Initiating → Initiated(pending OTP)
//! → Finalizing → Finalized | Failed`. Initiation is the only retried step,
//! and only for transport-class failures; a gateway rejection is terminal.
//! The point ledger is debited in exactly one place: a finalization whose
//! reported status is `success`, by the point quantity recorded on the
//! transfer at initiation.
//!
//! Payouts for the same user are serialized through a per-user critical
//! section so the balance check cannot race; payouts for different users
//! never contend.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::audit::{NoOpAuditLogger, PayoutAuditEvent, PayoutAuditLogger};
use crate::config::PayoutConfig;
use crate::error::{PayrailError, Result};
use crate::storage::{LedgerStore, PayoutStore, TransferRecord, TransferStatus};

/// Transfers are funded from the gateway balance.
const TRANSFER_SOURCE: &str = "balance";
/// Reason tag sent when re-requesting an OTP.
const OTP_REASON: &str = "transfer";

/// Request to initiate a transfer.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateTransferRequest {
    pub source: String,
    /// Amount in currency subunits.
    pub amount: i64,
    /// Idempotency reference. The gateway deduplicates by this value, so
    /// every retry of one payout attempt must carry the same reference.
    pub reference: String,
    /// Recipient code of the payout destination.
    pub recipient: String,
}

/// Request to finalize a transfer with its one-time passcode.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeTransferRequest {
    pub transfer_code: String,
    pub otp: String,
}

/// Request to re-send the one-time passcode for a transfer.
#[derive(Debug, Clone, Serialize)]
pub struct ResendOtpRequest {
    pub transfer_code: String,
    pub reason: String,
}

/// The gateway's view of a transfer, returned from initiation and
/// finalization.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferReply {
    pub id: u64,
    pub transfer_code: String,
    pub reference: String,
    /// Amount in currency subunits.
    pub amount: i64,
    pub status: String,
    #[serde(default)]
    pub transferred_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Gateway transfer operations.
#[allow(async_fn_in_trait)]
pub trait PaystackTransferClient: Send + Sync {
    /// Initiate a transfer to a registered recipient.
    async fn initiate_transfer(&self, request: InitiateTransferRequest) -> Result<TransferReply>;

    /// Finalize a transfer with its one-time passcode.
    async fn finalize_transfer(&self, request: FinalizeTransferRequest) -> Result<TransferReply>;

    /// Re-send the one-time passcode for a transfer.
    async fn resend_transfer_otp(&self, request: ResendOtpRequest) -> Result<()>;
}

/// Registry of per-user critical sections.
///
/// Entries are created on first use and kept for the process lifetime; the
/// map itself is only locked long enough to clone the entry out.
#[derive(Default)]
struct UserLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    async fn for_user(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(user_id.to_string()).or_default().clone()
    }
}

/// Executes the payout workflow against the gateway and the local stores.
pub struct TransferOrchestrator<S, L, C, A = NoOpAuditLogger>
where
    S: PayoutStore,
    L: LedgerStore,
    C: PaystackTransferClient,
    A: PayoutAuditLogger,
{
    store: S,
    ledger: L,
    client: C,
    config: PayoutConfig,
    audit: A,
    locks: UserLocks,
}

impl<S, L, C> TransferOrchestrator<S, L, C, NoOpAuditLogger>
where
    S: PayoutStore,
    L: LedgerStore,
    C: PaystackTransferClient,
{
    /// Create a new orchestrator with no audit logging.
    #[must_use]
    pub fn new(store: S, ledger: L, client: C, config: PayoutConfig) -> Self {
        Self {
            store,
            ledger,
            client,
            config,
            audit: NoOpAuditLogger,
            locks: UserLocks::default(),
        }
    }
}

impl<S, L, C, A> TransferOrchestrator<S, L, C, A>
where
    S: PayoutStore,
    L: LedgerStore,
    C: PaystackTransferClient,
    A: PayoutAuditLogger,
{
    /// Replace the audit logger.
    #[must_use]
    pub fn with_audit_logger<B: PayoutAuditLogger>(
        self,
        audit: B,
    ) -> TransferOrchestrator<S, L, C, B> {
        TransferOrchestrator {
            store: self.store,
            ledger: self.ledger,
            client: self.client,
            config: self.config,
            audit,
            locks: self.locks,
        }
    }

    /// Initiate a payout of `points` reward points to the user's registered
    /// bank account.
    ///
    /// Preconditions are checked before any gateway call: the user must
    /// have a customer record with registered bank details and a point
    /// balance covering the request. The transfer amount is computed from
    /// the configured conversion rate, and a single idempotency reference
    /// is generated up front and reused across every retry attempt.
    ///
    /// Initiation is retried on transport failures per the configured
    /// policy. A gateway rejection fails immediately with no retry, and an
    /// exhausted budget fails with [`PayrailError::ServiceUnavailable`]; in
    /// both cases no record is created. On success the gateway's view of
    /// the transfer is persisted verbatim and returned.
    pub async fn initiate_payout(&self, user_id: &str, points: u32) -> Result<TransferRecord> {
        if points == 0 {
            return Err(PayrailError::validation(
                "point quantity must be greater than zero",
            ));
        }

        let section = self.locks.for_user(user_id).await;
        let _serial = section.lock().await;

        let customer = self
            .store
            .find_customer_by_user(user_id)
            .await?
            .ok_or_else(|| {
                PayrailError::validation("purchase a subscription before redeeming points")
            })?;
        let bank = customer.bank_details.as_ref().ok_or_else(|| {
            PayrailError::validation("register bank details before redeeming points")
        })?;

        let balance = self.ledger.point_balance(user_id).await?;
        if balance < i64::from(points) {
            return Err(PayrailError::validation(format!(
                "insufficient point balance: have {balance}, need {points}"
            )));
        }

        let request = InitiateTransferRequest {
            source: TRANSFER_SOURCE.to_string(),
            amount: self.config.payout_amount(points),
            reference: uuid::Uuid::new_v4().to_string(),
            recipient: bank.recipient_code.clone(),
        };

        let reply = self
            .config
            .initiate_retry
            .run("initiate_transfer", || {
                let request = request.clone();
                async move { self.client.initiate_transfer(request).await }
            })
            .await?;

        let record = TransferRecord {
            gateway_id: reply.id,
            status: TransferStatus::from_gateway(&reply.status),
            amount: reply.amount,
            reference: reply.reference,
            points,
            transfer_code: reply.transfer_code,
            completed_at: reply.transferred_at,
            user_id: user_id.to_string(),
            customer_id: customer.id.clone(),
        };
        self.store.create_transfer(&record).await?;

        self.audit
            .log(PayoutAuditEvent::PayoutInitiated {
                user_id: record.user_id.clone(),
                reference: record.reference.clone(),
                amount: record.amount,
                points,
            })
            .await;
        tracing::info!(
            target: "payrail::transfer",
            user_id,
            transfer_code = %record.transfer_code,
            amount = record.amount,
            "transfer initiated"
        );
        Ok(record)
    }

    /// Finalize a pending payout with its one-time passcode.
    ///
    /// The gateway is asked to finalize first; its response carries the
    /// transfer id used to locate the local record. The record's status is
    /// updated to whatever the gateway reported, and when that status is
    /// `success` the user's ledger is debited by the point quantity stored
    /// on the record at initiation. A record that is already terminal is
    /// returned unchanged, so repeating a finalization cannot debit twice.
    pub async fn finalize_transfer(
        &self,
        user_id: &str,
        transfer_code: &str,
        otp: &str,
    ) -> Result<TransferRecord> {
        let section = self.locks.for_user(user_id).await;
        let _serial = section.lock().await;

        let reply = self
            .client
            .finalize_transfer(FinalizeTransferRequest {
                transfer_code: transfer_code.to_string(),
                otp: otp.to_string(),
            })
            .await?;

        let record = self
            .store
            .find_transfer_by_gateway_id(reply.id)
            .await?
            .filter(|record| record.user_id == user_id)
            .ok_or_else(|| {
                PayrailError::not_found(format!(
                    "no transfer record for gateway transfer {}",
                    reply.id
                ))
            })?;

        if record.status.is_terminal() {
            return Ok(record);
        }

        let status = TransferStatus::from_gateway(&reply.status);
        self.store
            .update_transfer_status(reply.id, status, reply.transferred_at)
            .await?;

        if status == TransferStatus::Success {
            self.ledger
                .decrement_points(&record.user_id, i64::from(record.points))
                .await?;
        }

        let updated = TransferRecord {
            status,
            completed_at: reply.transferred_at,
            ..record
        };
        self.audit
            .log(PayoutAuditEvent::PayoutFinalized {
                user_id: updated.user_id.clone(),
                transfer_code: updated.transfer_code.clone(),
                status: status.as_str().to_string(),
            })
            .await;
        tracing::info!(
            target: "payrail::transfer",
            user_id,
            transfer_code = %updated.transfer_code,
            status = %status,
            "transfer finalized"
        );
        Ok(updated)
    }

    /// Ask the gateway to re-send the one-time passcode for a transfer.
    ///
    /// A single pass-through call: no retry, and a rejection propagates as
    /// a provider error.
    pub async fn resend_otp(&self, transfer_code: &str) -> Result<()> {
        self.client
            .resend_transfer_otp(ResendOtpRequest {
                transfer_code: transfer_code.to_string(),
                reason: OTP_REASON.to_string(),
            })
            .await?;

        self.audit
            .log(PayoutAuditEvent::PayoutOtpResent {
                transfer_code: transfer_code.to_string(),
            })
            .await;
        Ok(())
    }
}

/// Mock transfer client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
    use std::sync::RwLock;

    /// Mock transfer client with scriptable failure behavior.
    ///
    /// Initiated transfers are remembered by transfer code so a later
    /// finalization can settle them with the configured status.
    #[derive(Clone)]
    pub struct MockTransferClient {
        inner: Arc<MockInner>,
    }

    struct MockInner {
        next_id: AtomicU64,
        initiate_counter: AtomicU32,
        finalize_counter: AtomicU32,
        resend_counter: AtomicU32,
        transient_failures: AtomicU32,
        reject_initiations: AtomicBool,
        reject_resend: AtomicBool,
        finalize_status: RwLock<String>,
        initiated: RwLock<HashMap<String, TransferReply>>,
        references: RwLock<Vec<String>>,
    }

    impl Default for MockTransferClient {
        fn default() -> Self {
            Self {
                inner: Arc::new(MockInner {
                    next_id: AtomicU64::new(9000),
                    initiate_counter: AtomicU32::new(0),
                    finalize_counter: AtomicU32::new(0),
                    resend_counter: AtomicU32::new(0),
                    transient_failures: AtomicU32::new(0),
                    reject_initiations: AtomicBool::new(false),
                    reject_resend: AtomicBool::new(false),
                    finalize_status: RwLock::new("success".to_string()),
                    initiated: RwLock::new(HashMap::new()),
                    references: RwLock::new(Vec::new()),
                }),
            }
        }
    }

    impl MockTransferClient {
        /// Create a new mock client that accepts everything.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the next `n` initiations with a transport error.
        pub fn fail_transiently(&self, n: u32) {
            self.inner.transient_failures.store(n, Ordering::SeqCst);
        }

        /// Reject every initiation, as the gateway does for a business
        /// error such as an insufficient balance.
        pub fn reject_initiations(&self) {
            self.inner.reject_initiations.store(true, Ordering::SeqCst);
        }

        /// Reject OTP re-send requests.
        pub fn reject_resend(&self) {
            self.inner.reject_resend.store(true, Ordering::SeqCst);
        }

        /// Status reported by subsequent finalizations.
        pub fn set_finalize_status(&self, status: &str) {
            *self.inner.finalize_status.write().unwrap() = status.to_string();
        }

        /// Number of initiation attempts seen, including failed ones.
        #[must_use]
        pub fn initiate_calls(&self) -> u32 {
            self.inner.initiate_counter.load(Ordering::SeqCst)
        }

        /// Number of finalization calls seen.
        #[must_use]
        pub fn finalize_calls(&self) -> u32 {
            self.inner.finalize_counter.load(Ordering::SeqCst)
        }

        /// Number of OTP re-send calls seen.
        #[must_use]
        pub fn resend_calls(&self) -> u32 {
            self.inner.resend_counter.load(Ordering::SeqCst)
        }

        /// The idempotency reference from every initiation attempt, in
        /// order, including attempts that failed.
        #[must_use]
        pub fn references(&self) -> Vec<String> {
            self.inner.references.read().unwrap().clone()
        }
    }

    impl PaystackTransferClient for MockTransferClient {
        async fn initiate_transfer(
            &self,
            request: InitiateTransferRequest,
        ) -> Result<TransferReply> {
            self.inner.initiate_counter.fetch_add(1, Ordering::SeqCst);
            self.inner
                .references
                .write()
                .unwrap()
                .push(request.reference.clone());

            if self.inner.reject_initiations.load(Ordering::SeqCst) {
                return Err(PayrailError::provider(
                    "initiate_transfer",
                    "Your balance is not enough to fulfil this request",
                ));
            }

            let remaining = self.inner.transient_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.inner
                    .transient_failures
                    .store(remaining - 1, Ordering::SeqCst);
                return Err(PayrailError::transport(
                    "initiate_transfer",
                    "connection reset by peer",
                ));
            }

            let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
            let reply = TransferReply {
                id,
                transfer_code: format!("TRF_mock_{id}"),
                reference: request.reference,
                amount: request.amount,
                status: "otp".to_string(),
                transferred_at: None,
            };
            self.inner
                .initiated
                .write()
                .unwrap()
                .insert(reply.transfer_code.clone(), reply.clone());
            Ok(reply)
        }

        async fn finalize_transfer(
            &self,
            request: FinalizeTransferRequest,
        ) -> Result<TransferReply> {
            self.inner.finalize_counter.fetch_add(1, Ordering::SeqCst);

            let status = self.inner.finalize_status.read().unwrap().clone();
            let mut initiated = self.inner.initiated.write().unwrap();
            let reply = initiated
                .get_mut(&request.transfer_code)
                .ok_or_else(|| {
                    PayrailError::provider("finalize_transfer", "Transfer code is invalid")
                })?;

            reply.status = status.clone();
            reply.transferred_at = (status == "success").then(chrono::Utc::now);
            Ok(reply.clone())
        }

        async fn resend_transfer_otp(&self, _request: ResendOtpRequest) -> Result<()> {
            self.inner.resend_counter.fetch_add(1, Ordering::SeqCst);
            if self.inner.reject_resend.load(Ordering::SeqCst) {
                return Err(PayrailError::provider(
                    "resend_transfer_otp",
                    "OTP could not be resent",
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::MockTransferClient;
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::storage::test::InMemoryPayoutStore;
    use crate::storage::{BankDetails, Customer};
    use std::time::Duration;

    fn quick_config() -> PayoutConfig {
        PayoutConfig::new().initiate_retry(RetryPolicy::fixed(3, Duration::from_millis(1)))
    }

    fn orchestrator(
        store: InMemoryPayoutStore,
        client: MockTransferClient,
    ) -> TransferOrchestrator<InMemoryPayoutStore, InMemoryPayoutStore, MockTransferClient> {
        TransferOrchestrator::new(store.clone(), store, client, quick_config())
    }

    async fn seed_customer(store: &InMemoryPayoutStore, user_id: &str, with_bank: bool) {
        let customer = Customer {
            id: format!("cust-{user_id}"),
            user_id: user_id.to_string(),
            gateway_id: 1,
            customer_code: format!("CUS_{user_id}"),
            bank_details: with_bank.then(|| BankDetails {
                recipient_code: format!("RCP_{user_id}"),
                account_name: "Ada Obi".to_string(),
                account_number: "0001234567".to_string(),
                bank_code: "058".to_string(),
            }),
        };
        store.create_customer(&customer).await.unwrap();
    }

    #[tokio::test]
    async fn test_initiate_without_customer() {
        let store = InMemoryPayoutStore::new();
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store, client.clone());

        let err = orchestrator.initiate_payout("u1", 10).await.unwrap_err();
        assert!(matches!(err, PayrailError::Validation(_)));
        assert_eq!(client.initiate_calls(), 0);
    }

    #[tokio::test]
    async fn test_initiate_without_bank_details() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", false).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store, client.clone());

        let err = orchestrator.initiate_payout("u1", 10).await.unwrap_err();
        assert!(matches!(err, PayrailError::Validation(_)));
        assert_eq!(client.initiate_calls(), 0);
    }

    #[tokio::test]
    async fn test_initiate_zero_points() {
        let orchestrator = orchestrator(InMemoryPayoutStore::new(), MockTransferClient::new());
        let err = orchestrator.initiate_payout("u1", 0).await.unwrap_err();
        assert!(matches!(err, PayrailError::Validation(_)));
    }

    #[tokio::test]
    async fn test_initiate_insufficient_balance() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 5);
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store, client.clone());

        let err = orchestrator.initiate_payout("u1", 10).await.unwrap_err();
        assert!(matches!(err, PayrailError::Validation(_)));
        assert_eq!(client.initiate_calls(), 0);
    }

    #[tokio::test]
    async fn test_initiate_success_records_transfer() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store.clone(), client.clone());

        let record = orchestrator.initiate_payout("u1", 10).await.unwrap();

        assert_eq!(record.points, 10);
        assert_eq!(record.amount, 50_000);
        assert_eq!(record.status, TransferStatus::Otp);
        assert!(record.completed_at.is_none());
        assert_eq!(client.initiate_calls(), 1);

        let stored = store
            .find_transfer_by_gateway_id(record.gateway_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, record);
        // Initiation never touches the ledger.
        assert_eq!(store.points_of("u1"), 100);
    }

    #[tokio::test]
    async fn test_retry_bound_exhausted() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        client.fail_transiently(10);
        let orchestrator = orchestrator(store.clone(), client.clone());

        let err = orchestrator.initiate_payout("u1", 10).await.unwrap_err();
        assert!(matches!(
            err,
            PayrailError::ServiceUnavailable { attempts: 3, .. }
        ));
        assert_eq!(client.initiate_calls(), 3);
        assert!(store.transfers_of("u1").is_empty());
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_second_attempt_with_same_reference() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        client.fail_transiently(1);
        let orchestrator = orchestrator(store.clone(), client.clone());

        let record = orchestrator.initiate_payout("u1", 10).await.unwrap();

        assert_eq!(client.initiate_calls(), 2);
        assert_eq!(store.transfers_of("u1").len(), 1);

        // Both attempts carried the same idempotency reference.
        let references = client.references();
        assert_eq!(references.len(), 2);
        assert_eq!(references[0], references[1]);
        assert_eq!(record.reference, references[0]);
    }

    #[tokio::test]
    async fn test_no_retry_on_gateway_rejection() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        client.reject_initiations();
        let orchestrator = orchestrator(store.clone(), client.clone());

        let err = orchestrator.initiate_payout("u1", 10).await.unwrap_err();
        assert!(matches!(err, PayrailError::Provider { .. }));
        assert_eq!(client.initiate_calls(), 1);
        assert!(store.transfers_of("u1").is_empty());
    }

    #[tokio::test]
    async fn test_finalize_debits_recorded_points() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store.clone(), client.clone());

        let record = orchestrator.initiate_payout("u1", 10).await.unwrap();
        let finalized = orchestrator
            .finalize_transfer("u1", &record.transfer_code, "123456")
            .await
            .unwrap();

        assert_eq!(finalized.status, TransferStatus::Success);
        assert!(finalized.completed_at.is_some());
        assert_eq!(store.points_of("u1"), 90);
    }

    #[tokio::test]
    async fn test_finalize_twice_debits_once() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store.clone(), client.clone());

        let record = orchestrator.initiate_payout("u1", 10).await.unwrap();
        orchestrator
            .finalize_transfer("u1", &record.transfer_code, "123456")
            .await
            .unwrap();
        let again = orchestrator
            .finalize_transfer("u1", &record.transfer_code, "123456")
            .await
            .unwrap();

        assert_eq!(again.status, TransferStatus::Success);
        assert_eq!(store.points_of("u1"), 90);
    }

    #[tokio::test]
    async fn test_finalize_failed_status_keeps_ledger() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store.clone(), client.clone());

        let record = orchestrator.initiate_payout("u1", 10).await.unwrap();
        client.set_finalize_status("failed");
        let finalized = orchestrator
            .finalize_transfer("u1", &record.transfer_code, "123456")
            .await
            .unwrap();

        assert_eq!(finalized.status, TransferStatus::Failed);
        assert_eq!(store.points_of("u1"), 100);
    }

    #[tokio::test]
    async fn test_finalize_wrong_user_is_not_found() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        store.seed_points("u1", 100);
        store.seed_points("u2", 100);
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store.clone(), client.clone());

        let record = orchestrator.initiate_payout("u1", 10).await.unwrap();
        let err = orchestrator
            .finalize_transfer("u2", &record.transfer_code, "123456")
            .await
            .unwrap_err();

        assert!(matches!(err, PayrailError::NotFound(_)));
        assert_eq!(store.points_of("u1"), 100);
        assert_eq!(store.points_of("u2"), 100);
    }

    #[tokio::test]
    async fn test_finalize_rejection_propagates() {
        let store = InMemoryPayoutStore::new();
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(store, client);

        let err = orchestrator
            .finalize_transfer("u1", "TRF_unknown", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, PayrailError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_resend_otp() {
        let client = MockTransferClient::new();
        let orchestrator = orchestrator(InMemoryPayoutStore::new(), client.clone());

        orchestrator.resend_otp("TRF_1").await.unwrap();
        assert_eq!(client.resend_calls(), 1);
    }

    #[tokio::test]
    async fn test_resend_otp_rejection_not_retried() {
        let client = MockTransferClient::new();
        client.reject_resend();
        let orchestrator = orchestrator(InMemoryPayoutStore::new(), client.clone());

        let err = orchestrator.resend_otp("TRF_1").await.unwrap_err();
        assert!(matches!(err, PayrailError::Provider { .. }));
        assert_eq!(client.resend_calls(), 1);
    }

    #[tokio::test]
    async fn test_payouts_for_different_users_proceed() {
        let store = InMemoryPayoutStore::new();
        seed_customer(&store, "u1", true).await;
        seed_customer(&store, "u2", true).await;
        store.seed_points("u1", 100);
        store.seed_points("u2", 100);
        let client = MockTransferClient::new();
        let orchestrator =
            Arc::new(orchestrator(store.clone(), client.clone()));

        let a = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.initiate_payout("u1", 10).await })
        };
        let b = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.initiate_payout("u2", 20).await })
        };

        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();
        assert_eq!(first.points, 10);
        assert_eq!(second.points, 20);
        assert_eq!(client.initiate_calls(), 2);
    }
}
