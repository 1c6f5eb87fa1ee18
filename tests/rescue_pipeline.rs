// SPDX-License-Identifier: MIT
// End-to-end rescue submissions against in-memory chain, bundler and paymaster
// stand-ins. Nothing here touches the network.

use alloy::primitives::{Address, B256, Bytes, Signature, U256};
use alloy::rpc::types::{Filter, Log};
use alloy::signers::local::PrivateKeySigner;
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use rescue_ledger::domain::constants::{
    ENTRY_POINT_V07, FALLBACK_MAX_FEE_PER_GAS, FALLBACK_MAX_PRIORITY_FEE_PER_GAS,
};
use rescue_ledger::domain::error::AppError;
use rescue_ledger::domain::tokens::find_token;
use rescue_ledger::infrastructure::data::rescue_abi::{
    EntryPointV07, RescueLog, SimpleAccount, SimpleAccountFactory,
};
use rescue_ledger::infrastructure::data::user_op::UserOperation;
use rescue_ledger::infrastructure::network::bundler::{
    BundlerApi, GasPriceTiers, PaymasterApi, PaymasterFields, ReceiptTransaction,
    UserOperationGasEstimate, UserOperationReceipt,
};
use rescue_ledger::infrastructure::network::ledger::LedgerChain;
use rescue_ledger::services::rescue::account::SmartAccount;
use rescue_ledger::services::rescue::hasher::selection_hash;
use rescue_ledger::services::rescue::tracking::TrackingUrls;
use rescue_ledger::services::rescue::{
    ContextFactory, ReceiptMode, RescueOrchestrator, RescueRecord, RescueSession, Selection,
    SubmissionContext, SubmissionPolicy, SubmissionStage,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

const CHAIN_ID: u64 = 10_143;

fn rescue_log() -> Address {
    Address::repeat_byte(0x51)
}

fn account_address() -> Address {
    Address::repeat_byte(0xac)
}

fn factory_address() -> Address {
    Address::repeat_byte(0xfa)
}

fn paymaster_address() -> Address {
    Address::repeat_byte(0x9a)
}

// ---------------------------------------------------------------------------
// Stand-ins
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StubChain {
    code: Mutex<Bytes>,
    simulation_reverts: AtomicBool,
    simulation_hangs: AtomicBool,
    simulations: AtomicUsize,
}

#[async_trait]
impl LedgerChain for StubChain {
    async fn chain_id(&self) -> Result<u64, AppError> {
        Ok(CHAIN_ID)
    }

    async fn code_at(&self, _address: Address) -> Result<Bytes, AppError> {
        Ok(self.code.lock().unwrap().clone())
    }

    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: Bytes,
    ) -> Result<Bytes, AppError> {
        if data.starts_with(&EntryPointV07::getNonceCall::SELECTOR) {
            return Ok(U256::from(7u64).abi_encode().into());
        }
        if data.starts_with(&SimpleAccountFactory::getAddressCall::SELECTOR) {
            return Ok(account_address().abi_encode().into());
        }
        assert_eq!(to, rescue_log());
        assert_eq!(from, Some(account_address()));
        self.simulations.fetch_add(1, Ordering::SeqCst);
        if self.simulation_hangs.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.simulation_reverts.load(Ordering::SeqCst) {
            return Err(AppError::Connection("execution reverted".into()));
        }
        Ok(Bytes::new())
    }

    async fn logs(&self, _filter: &Filter) -> Result<Vec<Log>, AppError> {
        Ok(Vec::new())
    }
}

struct StubBundler {
    gas_fails: AtomicBool,
    gas_calls: AtomicUsize,
    send_delay: Mutex<Option<Duration>>,
    send_entered: Notify,
    send_calls: AtomicUsize,
    send_error: Mutex<Option<AppError>>,
    last_op: Mutex<Option<UserOperation>>,
    receipt_after: Mutex<Option<usize>>,
    receipt_success: AtomicBool,
    receipt_polls: AtomicUsize,
    receipt_errors: Mutex<Vec<AppError>>,
}

impl Default for StubBundler {
    fn default() -> Self {
        Self {
            gas_fails: AtomicBool::new(false),
            gas_calls: AtomicUsize::new(0),
            send_delay: Mutex::new(None),
            send_entered: Notify::new(),
            send_calls: AtomicUsize::new(0),
            send_error: Mutex::new(None),
            last_op: Mutex::new(None),
            receipt_after: Mutex::new(None),
            receipt_success: AtomicBool::new(true),
            receipt_polls: AtomicUsize::new(0),
            receipt_errors: Mutex::new(Vec::new()),
        }
    }
}

impl StubBundler {
    fn sent_op(&self) -> UserOperation {
        self.last_op.lock().unwrap().clone().expect("an operation was sent")
    }
}

#[async_trait]
impl BundlerApi for StubBundler {
    async fn gas_price(&self) -> Result<GasPriceTiers, AppError> {
        self.gas_calls.fetch_add(1, Ordering::SeqCst);
        if self.gas_fails.load(Ordering::SeqCst) {
            return Err(AppError::Connection("bundler unreachable".into()));
        }
        Ok(serde_json::from_value(json!({
            "slow": {"maxFeePerGas": "0x3b9aca00", "maxPriorityFeePerGas": "0x3b9aca00"},
            "standard": {"maxFeePerGas": "0x174876e800", "maxPriorityFeePerGas": "0x77359400"},
            "fast": {"maxFeePerGas": "0x2540be400", "maxPriorityFeePerGas": "0x77359400"}
        }))
        .unwrap())
    }

    async fn estimate_user_operation_gas(
        &self,
        op: &UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimate, AppError> {
        assert_eq!(entry_point, ENTRY_POINT_V07);
        assert_eq!(op.paymaster, Some(paymaster_address()));
        Ok(UserOperationGasEstimate {
            pre_verification_gas: U256::from(50_000u64),
            verification_gas_limit: U256::from(150_000u64),
            call_gas_limit: U256::from(90_000u64),
            paymaster_verification_gas_limit: Some(U256::from(40_000u64)),
            paymaster_post_op_gas_limit: Some(U256::from(1u64)),
        })
    }

    async fn send_user_operation(
        &self,
        op: &UserOperation,
        _entry_point: Address,
    ) -> Result<B256, AppError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.send_entered.notify_one();
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.send_error.lock().unwrap().take() {
            return Err(err);
        }
        *self.last_op.lock().unwrap() = Some(op.clone());
        op.hash(ENTRY_POINT_V07, CHAIN_ID)
    }

    async fn user_operation_receipt(
        &self,
        user_op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>, AppError> {
        let polls = self.receipt_polls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.receipt_errors.lock().unwrap().pop() {
            return Err(err);
        }
        match *self.receipt_after.lock().unwrap() {
            Some(after) if polls >= after => Ok(Some(UserOperationReceipt {
                user_op_hash,
                success: self.receipt_success.load(Ordering::SeqCst),
                reason: None,
                actual_gas_used: Some(U256::from(120_000u64)),
                receipt: ReceiptTransaction {
                    transaction_hash: B256::repeat_byte(0x7e),
                    block_number: Some(U256::from(1u64)),
                },
            })),
            _ => Ok(None),
        }
    }
}

#[derive(Default)]
struct StubPaymaster {
    final_stub: AtomicBool,
    stub_calls: AtomicUsize,
    data_calls: AtomicUsize,
}

#[async_trait]
impl PaymasterApi for StubPaymaster {
    async fn stub_data(
        &self,
        _op: &UserOperation,
        _entry_point: Address,
        chain_id: u64,
    ) -> Result<PaymasterFields, AppError> {
        assert_eq!(chain_id, CHAIN_ID);
        self.stub_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymasterFields {
            paymaster: Some(paymaster_address()),
            paymaster_data: Some(Bytes::from(vec![0u8; 8])),
            paymaster_verification_gas_limit: Some(U256::from(30_000u64)),
            paymaster_post_op_gas_limit: Some(U256::from(1u64)),
            is_final: Some(self.final_stub.load(Ordering::SeqCst)),
        })
    }

    async fn paymaster_data(
        &self,
        op: &UserOperation,
        _entry_point: Address,
        _chain_id: u64,
    ) -> Result<PaymasterFields, AppError> {
        assert_eq!(op.call_gas_limit, U256::from(90_000u64));
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymasterFields {
            paymaster: Some(paymaster_address()),
            paymaster_data: Some(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])),
            paymaster_verification_gas_limit: None,
            paymaster_post_op_gas_limit: None,
            is_final: None,
        })
    }
}

struct Harness {
    owner: PrivateKeySigner,
    chain: Arc<StubChain>,
    bundler: Arc<StubBundler>,
    paymaster: Arc<StubPaymaster>,
    creates: AtomicUsize,
    fail_first_create: AtomicBool,
}

impl Harness {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            owner: PrivateKeySigner::random(),
            chain: Arc::new(StubChain::default()),
            bundler: Arc::new(StubBundler::default()),
            paymaster: Arc::new(StubPaymaster::default()),
            creates: AtomicUsize::new(0),
            fail_first_create: AtomicBool::new(false),
        })
    }

    fn session(self: &Arc<Self>, policy: SubmissionPolicy) -> RescueSession {
        let orchestrator = RescueOrchestrator::new(policy, TrackingUrls::default());
        RescueSession::new(Arc::new(HarnessFactory(self.clone())), orchestrator)
    }
}

struct HarnessFactory(Arc<Harness>);

#[async_trait]
impl ContextFactory for HarnessFactory {
    async fn create(&self) -> Result<SubmissionContext, AppError> {
        let h = &self.0;
        h.creates.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        if h.fail_first_create.swap(false, Ordering::SeqCst) {
            return Err(AppError::Connection("rpc down".into()));
        }
        Ok(SubmissionContext {
            chain_id: CHAIN_ID,
            entry_point: ENTRY_POINT_V07,
            rescue_log: rescue_log(),
            account: SmartAccount::new(
                h.owner.clone(),
                account_address(),
                factory_address(),
                U256::ZERO,
            ),
            chain: h.chain.clone(),
            bundler: h.bundler.clone(),
            paymaster: h.paymaster.clone(),
        })
    }
}

fn boarded(symbols: &[&str]) -> Selection {
    let mut selection = Selection::new(100);
    for s in symbols {
        selection.add(find_token(s).unwrap());
    }
    selection
}

fn decode_inner(op: &UserOperation) -> RescueLog::logRescueCall {
    let outer = SimpleAccount::executeCall::abi_decode(&op.call_data).expect("execute");
    assert_eq!(outer.dest, rescue_log());
    assert_eq!(outer.value, U256::ZERO);
    RescueLog::logRescueCall::abi_decode(&outer.func).expect("logRescue")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_boat_records_only_the_boarded_token() {
    let mut selection = Selection::new(100);
    assert!(selection.add(find_token("BTC").unwrap()));
    assert!(!selection.add(find_token("ETH").unwrap()));

    let h = Harness::new();
    let session = h.session(SubmissionPolicy::default());
    let record = RescueRecord::from_selection(&selection, false).unwrap();
    let result = session.rescue(record).await.expect("submitted");

    let call = decode_inner(&h.bundler.sent_op());
    assert_eq!(call.symbols, vec!["BTC".to_string()]);
    assert_eq!(call.totalWeight, U256::from(100u64));
    assert!(result.tracking_url.contains(&format!("hash={}", result.user_op_hash)));
    assert_eq!(session.stage(), SubmissionStage::Done);
}

#[tokio::test]
async fn submitted_operation_carries_hash_fees_and_sponsorship() {
    let h = Harness::new();
    let session = h.session(SubmissionPolicy::default());
    let record = RescueRecord::from_selection(&boarded(&["ETH", "SOL"]), false).unwrap();
    let expected_hash = selection_hash(&["ETH".to_string(), "SOL".to_string()], 80, false);
    assert_eq!(record.selection_hash(), expected_hash);

    let result = session.rescue(record).await.expect("submitted");
    assert!(result.transaction_hash.is_none());

    let op = h.bundler.sent_op();
    let call = decode_inner(&op);
    assert_eq!(call.symbols, vec!["ETH".to_string(), "SOL".to_string()]);
    assert_eq!(call.totalWeight, U256::from(80u64));
    assert!(!call.byAgent);
    assert_eq!(call.selectionHash, expected_hash);

    assert_eq!(op.sender, account_address());
    assert_eq!(op.nonce, U256::from(7u64));
    // standard tier
    assert_eq!(op.max_fee_per_gas, U256::from(100_000_000_000u64));
    assert_eq!(op.max_priority_fee_per_gas, U256::from(2_000_000_000u64));
    assert_eq!(op.call_gas_limit, U256::from(90_000u64));
    assert_eq!(op.paymaster, Some(paymaster_address()));
    assert_eq!(op.paymaster_data, Some(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])));
    assert_eq!(op.paymaster_verification_gas_limit, Some(U256::from(40_000u64)));
    assert_eq!(h.paymaster.stub_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.paymaster.data_calls.load(Ordering::SeqCst), 1);

    let sig = Signature::try_from(op.signature.as_ref()).expect("65-byte signature");
    let recovered = sig
        .recover_address_from_msg(op.hash(ENTRY_POINT_V07, CHAIN_ID).unwrap().as_slice())
        .unwrap();
    assert_eq!(recovered, h.owner.address());
    assert_eq!(result.user_op_hash, op.hash(ENTRY_POINT_V07, CHAIN_ID).unwrap());
}

#[tokio::test]
async fn gas_query_failure_uses_fallback_fees() {
    let h = Harness::new();
    h.bundler.gas_fails.store(true, Ordering::SeqCst);
    let session = h.session(SubmissionPolicy::default());
    let record = RescueRecord::from_selection(&boarded(&["DOGE"]), false).unwrap();

    session.rescue(record).await.expect("submitted on fallback fees");

    let op = h.bundler.sent_op();
    assert_eq!(op.max_fee_per_gas, U256::from(FALLBACK_MAX_FEE_PER_GAS));
    assert_eq!(
        op.max_priority_fee_per_gas,
        U256::from(FALLBACK_MAX_PRIORITY_FEE_PER_GAS)
    );
    assert_eq!(h.bundler.gas_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_bundler_times_out_and_session_recovers() {
    let h = Harness::new();
    *h.bundler.send_delay.lock().unwrap() = Some(Duration::from_secs(25));
    let session = h.session(SubmissionPolicy::default());
    let record = RescueRecord::from_selection(&boarded(&["SOL"]), false).unwrap();

    let err = session.rescue(record.clone()).await.expect_err("timeout");
    assert!(matches!(
        &err,
        AppError::SubmissionTimeout { stage, timeout_ms: 20_000 } if stage == "sendUserOperation"
    ));
    assert_eq!(err.to_string(), "sendUserOperation timed out after 20000ms");
    assert!(err.is_retryable());
    assert_eq!(session.stage(), SubmissionStage::Failed);
    assert!(!session.is_busy());

    *h.bundler.send_delay.lock().unwrap() = None;
    session.rescue(record).await.expect("retry succeeds");
    assert_eq!(session.stage(), SubmissionStage::Done);
    let stats = session.orchestrator().stats().snapshot();
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.accepted, 1);
}

#[tokio::test(start_paused = true)]
async fn second_submission_while_in_flight_is_rejected() {
    let h = Harness::new();
    *h.bundler.send_delay.lock().unwrap() = Some(Duration::from_secs(5));
    let session = h.session(SubmissionPolicy::default());
    let first = RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap();
    let second = RescueRecord::from_selection(&boarded(&["SOL"]), false).unwrap();

    let (a, b) = tokio::join!(session.rescue(first), async {
        h.bundler.send_entered.notified().await;
        session.rescue(second).await
    });

    a.expect("first submission completes");
    assert!(matches!(b, Err(AppError::SubmissionInFlight)));
    assert_eq!(h.bundler.send_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        session.orchestrator().stats().snapshot().rejected_in_flight,
        1
    );
}

#[tokio::test]
async fn simulation_revert_does_not_block_submission() {
    let h = Harness::new();
    h.chain.simulation_reverts.store(true, Ordering::SeqCst);
    let session = h.session(SubmissionPolicy::default());
    let record = RescueRecord::from_selection(&boarded(&["LINK"]), true).unwrap();

    session.rescue(record).await.expect("submitted anyway");

    assert_eq!(h.chain.simulations.load(Ordering::SeqCst), 1);
    assert_eq!(h.bundler.send_calls.load(Ordering::SeqCst), 1);
    assert!(decode_inner(&h.bundler.sent_op()).byAgent);
    assert_eq!(
        session.orchestrator().stats().snapshot().simulation_warnings,
        1
    );
}

#[tokio::test(start_paused = true)]
async fn hung_simulation_is_abandoned_after_its_bound() {
    let h = Harness::new();
    h.chain.simulation_hangs.store(true, Ordering::SeqCst);
    let session = h.session(SubmissionPolicy::default());
    let record = RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap();

    let started = tokio::time::Instant::now();
    session.rescue(record).await.expect("submitted anyway");
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(4), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "elapsed {elapsed:?}");
    assert_eq!(session.stage(), SubmissionStage::Done);
    assert_eq!(h.bundler.send_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        session.orchestrator().stats().snapshot().simulation_warnings,
        1
    );
}

#[tokio::test]
async fn undeployed_account_ships_factory_data_until_code_exists() {
    let h = Harness::new();
    let session = h.session(SubmissionPolicy::default());

    session
        .rescue(RescueRecord::warmup())
        .await
        .expect("warmup");
    let op = h.bundler.sent_op();
    assert_eq!(op.factory, Some(factory_address()));
    let create = SimpleAccountFactory::createAccountCall::abi_decode(
        op.factory_data.as_ref().expect("factory data"),
    )
    .unwrap();
    assert_eq!(create.owner, h.owner.address());
    let warm = decode_inner(&op);
    assert_eq!(warm.symbols, vec!["WARMUP".to_string()]);
    assert_eq!(warm.totalWeight, U256::ZERO);

    *h.chain.code.lock().unwrap() = Bytes::from(vec![0x60, 0x80]);
    session
        .rescue(RescueRecord::from_selection(&boarded(&["MON"]), false).unwrap())
        .await
        .expect("second rescue");
    let op = h.bundler.sent_op();
    assert!(op.factory.is_none());
    assert!(op.factory_data.is_none());
    assert!(session.context().await.unwrap().account.is_deployed());
}

#[tokio::test]
async fn final_stub_skips_second_paymaster_call() {
    let h = Harness::new();
    h.paymaster.final_stub.store(true, Ordering::SeqCst);
    let session = h.session(SubmissionPolicy::default());

    session
        .rescue(RescueRecord::from_selection(&boarded(&["PEPE"]), false).unwrap())
        .await
        .expect("submitted");

    assert_eq!(h.paymaster.data_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.bundler.sent_op().paymaster_data, Some(Bytes::from(vec![0u8; 8])));
}

#[tokio::test]
async fn bundler_rejection_surfaces_as_retryable_error() {
    let h = Harness::new();
    *h.bundler.send_error.lock().unwrap() = Some(AppError::SubmissionRejected {
        code: -32500,
        reason: "AA21 didn't pay prefund".into(),
    });
    let session = h.session(SubmissionPolicy::default());

    let err = session
        .rescue(RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap())
        .await
        .expect_err("rejected");
    assert!(matches!(err, AppError::SubmissionRejected { code: -32500, .. }));
    assert!(err.is_retryable());
    assert_eq!(session.stage(), SubmissionStage::Failed);
}

#[tokio::test]
async fn context_is_created_once_for_concurrent_callers() {
    let h = Harness::new();
    let session = h.session(SubmissionPolicy::default());

    let (a, b, c) = tokio::join!(session.context(), session.context(), session.context());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(h.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_context_init_is_retried_on_next_call() {
    let h = Harness::new();
    h.fail_first_create.store(true, Ordering::SeqCst);
    let session = h.session(SubmissionPolicy::default());
    let record = RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap();

    let err = session.rescue(record.clone()).await.expect_err("init fails");
    assert!(matches!(err, AppError::Connection(_)));
    assert!(!session.is_busy());

    session.rescue(record).await.expect("second attempt initializes");
    assert_eq!(h.creates.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn receipt_mode_waits_for_inclusion() {
    let h = Harness::new();
    *h.bundler.receipt_after.lock().unwrap() = Some(3);
    let policy = SubmissionPolicy {
        receipt_mode: ReceiptMode::Receipt,
        ..SubmissionPolicy::default()
    };
    let session = h.session(policy);

    let result = session
        .rescue(RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap())
        .await
        .expect("included");
    assert_eq!(result.transaction_hash, Some(B256::repeat_byte(0x7e)));
    assert_eq!(h.bundler.receipt_polls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn receipt_mode_times_out_without_inclusion() {
    let h = Harness::new();
    let policy = SubmissionPolicy {
        receipt_mode: ReceiptMode::Receipt,
        receipt_timeout: Duration::from_secs(10),
        ..SubmissionPolicy::default()
    };
    let session = h.session(policy);

    let err = session
        .rescue(RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap())
        .await
        .expect_err("never included");
    assert!(matches!(err, AppError::ReceiptTimeout { timeout_ms: 10_000, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn reverted_inclusion_is_a_transaction_error() {
    let h = Harness::new();
    *h.bundler.receipt_after.lock().unwrap() = Some(1);
    h.bundler.receipt_success.store(false, Ordering::SeqCst);
    let policy = SubmissionPolicy {
        receipt_mode: ReceiptMode::Receipt,
        ..SubmissionPolicy::default()
    };
    let session = h.session(policy);

    let err = session
        .rescue(RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap())
        .await
        .expect_err("reverted");
    assert!(matches!(err, AppError::Transaction { .. }));
}

#[tokio::test(start_paused = true)]
async fn receipt_lookup_rejection_fails_without_waiting_out_the_bound() {
    let h = Harness::new();
    h.bundler.receipt_errors.lock().unwrap().push(AppError::SubmissionRejected {
        code: -32602,
        reason: "unknown user operation hash".into(),
    });
    let policy = SubmissionPolicy {
        receipt_mode: ReceiptMode::Receipt,
        ..SubmissionPolicy::default()
    };
    let session = h.session(policy);

    let started = tokio::time::Instant::now();
    let err = session
        .rescue(RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap())
        .await
        .expect_err("rejected");
    assert!(matches!(err, AppError::SubmissionRejected { code: -32602, .. }));
    assert_eq!(h.bundler.receipt_polls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.stage(), SubmissionStage::Failed);
}

#[tokio::test(start_paused = true)]
async fn receipt_poll_rides_out_connection_errors() {
    let h = Harness::new();
    *h.bundler.receipt_after.lock().unwrap() = Some(1);
    h.bundler
        .receipt_errors
        .lock()
        .unwrap()
        .extend([
            AppError::Connection("reset by peer".into()),
            AppError::Connection("reset by peer".into()),
        ]);
    let policy = SubmissionPolicy {
        receipt_mode: ReceiptMode::Receipt,
        ..SubmissionPolicy::default()
    };
    let session = h.session(policy);

    let result = session
        .rescue(RescueRecord::from_selection(&boarded(&["ETH"]), false).unwrap())
        .await
        .expect("included after transient errors");
    assert_eq!(result.transaction_hash, Some(B256::repeat_byte(0x7e)));
    assert_eq!(h.bundler.receipt_polls.load(Ordering::SeqCst), 3);
}
