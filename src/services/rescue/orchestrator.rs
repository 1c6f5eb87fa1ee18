// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::constants::{
    DEFAULT_RECEIPT_POLL_MS, DEFAULT_RECEIPT_TIMEOUT_MS, DEFAULT_SIMULATE_TIMEOUT_MS,
    DEFAULT_SUBMIT_TIMEOUT_MS, DUMMY_SIGNATURE,
};
use crate::infrastructure::data::calldata::CalldataBuilder;
use crate::infrastructure::data::user_op::UserOperation;
use crate::services::rescue::gas::{GasEstimator, GasFees};
use crate::services::rescue::record::{RescueRecord, SubmissionResult};
use crate::services::rescue::session::SubmissionContext;
use crate::services::rescue::stats::SubmissionStats;
use crate::services::rescue::tracking::TrackingUrls;
use alloy::primitives::{B256, Bytes, U256};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptMode {
    /// Done once the bundler returns a user operation hash.
    #[default]
    Acceptance,
    /// Done once the operation is included on-chain.
    Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPolicy {
    pub simulate_timeout: Duration,
    pub submit_timeout: Duration,
    pub receipt_mode: ReceiptMode,
    pub receipt_timeout: Duration,
    pub receipt_poll: Duration,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            simulate_timeout: Duration::from_millis(DEFAULT_SIMULATE_TIMEOUT_MS),
            submit_timeout: Duration::from_millis(DEFAULT_SUBMIT_TIMEOUT_MS),
            receipt_mode: ReceiptMode::Acceptance,
            receipt_timeout: Duration::from_millis(DEFAULT_RECEIPT_TIMEOUT_MS),
            receipt_poll: Duration::from_millis(DEFAULT_RECEIPT_POLL_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Idle,
    Simulating,
    Estimating,
    Submitting,
    AwaitingReceipt,
    Done,
    Failed,
}

impl SubmissionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStage::Done | SubmissionStage::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStage::Idle => "idle",
            SubmissionStage::Simulating => "simulating",
            SubmissionStage::Estimating => "estimating",
            SubmissionStage::Submitting => "submitting",
            SubmissionStage::AwaitingReceipt => "awaiting_receipt",
            SubmissionStage::Done => "done",
            SubmissionStage::Failed => "failed",
        }
    }
}

/// Drives one record through simulate, estimate, submit and (optionally)
/// receipt. Stages are published on a watch channel for observers.
pub struct RescueOrchestrator {
    policy: SubmissionPolicy,
    calldata: CalldataBuilder,
    gas: GasEstimator,
    tracking: TrackingUrls,
    stats: Arc<SubmissionStats>,
    stage: watch::Sender<SubmissionStage>,
}

impl RescueOrchestrator {
    pub fn new(policy: SubmissionPolicy, tracking: TrackingUrls) -> Self {
        let (stage, _) = watch::channel(SubmissionStage::Idle);
        Self {
            policy,
            calldata: CalldataBuilder::rescue_log(),
            gas: GasEstimator::default(),
            tracking,
            stats: Arc::new(SubmissionStats::default()),
            stage,
        }
    }

    pub fn with_gas_estimator(mut self, gas: GasEstimator) -> Self {
        self.gas = gas;
        self
    }

    pub fn policy(&self) -> &SubmissionPolicy {
        &self.policy
    }

    pub fn tracking(&self) -> &TrackingUrls {
        &self.tracking
    }

    pub fn stats(&self) -> &Arc<SubmissionStats> {
        &self.stats
    }

    pub fn stage(&self) -> SubmissionStage {
        *self.stage.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionStage> {
        self.stage.subscribe()
    }

    pub async fn run(
        &self,
        ctx: &SubmissionContext,
        record: &RescueRecord,
    ) -> Result<SubmissionResult, AppError> {
        self.transition(SubmissionStage::Idle);
        self.stats.attempted.fetch_add(1, Ordering::Relaxed);

        match self.execute(ctx, record).await {
            Ok(result) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                self.transition(SubmissionStage::Done);
                tracing::info!(
                    target: "rescue",
                    user_op_hash = %result.user_op_hash,
                    tracking_url = %result.tracking_url,
                    symbols = ?record.symbols(),
                    weight = record.total_weight(),
                    by_agent = record.by_agent(),
                    "Rescue submitted"
                );
                Ok(result)
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                if matches!(
                    e,
                    AppError::SubmissionTimeout { .. } | AppError::ReceiptTimeout { .. }
                ) {
                    self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                }
                self.transition(SubmissionStage::Failed);
                tracing::error!(target: "rescue", error = %e, retryable = e.is_retryable(), "Rescue failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        ctx: &SubmissionContext,
        record: &RescueRecord,
    ) -> Result<SubmissionResult, AppError> {
        if record.is_empty() {
            return Err(AppError::EmptySelection);
        }
        let call = record.calldata(&self.calldata)?;

        self.transition(SubmissionStage::Simulating);
        self.simulate(ctx, &call).await;

        self.transition(SubmissionStage::Estimating);
        let fees = self.gas.estimate(ctx.bundler.as_ref()).await;

        self.transition(SubmissionStage::Submitting);
        let user_op_hash = match timeout(self.policy.submit_timeout, self.submit(ctx, call, fees)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::SubmissionTimeout {
                    stage: "sendUserOperation".into(),
                    timeout_ms: self.policy.submit_timeout.as_millis() as u64,
                });
            }
        };
        let tracking_url = self.tracking.user_op_url(&user_op_hash.to_string())?;

        let transaction_hash = match self.policy.receipt_mode {
            ReceiptMode::Acceptance => None,
            ReceiptMode::Receipt => {
                self.transition(SubmissionStage::AwaitingReceipt);
                Some(self.await_receipt(ctx, user_op_hash).await?)
            }
        };

        Ok(SubmissionResult {
            user_op_hash,
            tracking_url,
            transaction_hash,
        })
    }

    /// Best effort: a revert, RPC error or timeout here is logged and the
    /// submission continues.
    async fn simulate(&self, ctx: &SubmissionContext, call: &Bytes) {
        let sim = ctx
            .chain
            .call(Some(ctx.account.address()), ctx.rescue_log, call.clone());
        let outcome = match timeout(self.policy.simulate_timeout, sim).await {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => AppError::Simulation(e.to_string()),
            Err(_) => AppError::Simulation(format!(
                "eth_call timed out after {}ms",
                self.policy.simulate_timeout.as_millis()
            )),
        };
        self.stats.simulation_warnings.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(target: "rescue", error = %outcome, "Simulation failed; submitting anyway");
    }

    async fn submit(
        &self,
        ctx: &SubmissionContext,
        call: Bytes,
        fees: GasFees,
    ) -> Result<B256, AppError> {
        let account = &ctx.account;
        let nonce = account.nonce(ctx.chain.as_ref(), ctx.entry_point).await?;
        let call_data = account.execute_calldata(ctx.rescue_log, U256::ZERO, call);

        let mut op = UserOperation::new(
            account.address(),
            nonce,
            call_data,
            Bytes::from(DUMMY_SIGNATURE.to_vec()),
        );
        op.max_fee_per_gas = U256::from(fees.max_fee_per_gas);
        op.max_priority_fee_per_gas = U256::from(fees.max_priority_fee_per_gas);

        if !account.refresh_deployment(ctx.chain.as_ref()).await? {
            let (factory, factory_data) = account.deployment_data();
            tracing::info!(target: "account", address = %account.address(), %factory, "Deploying account with this operation");
            op.factory = Some(factory);
            op.factory_data = Some(factory_data);
        }

        let stub = ctx
            .paymaster
            .stub_data(&op, ctx.entry_point, ctx.chain_id)
            .await?;
        stub.apply(&mut op);

        let limits = ctx
            .bundler
            .estimate_user_operation_gas(&op, ctx.entry_point)
            .await?;
        op.pre_verification_gas = limits.pre_verification_gas;
        op.verification_gas_limit = limits.verification_gas_limit;
        op.call_gas_limit = limits.call_gas_limit;
        if limits.paymaster_verification_gas_limit.is_some() {
            op.paymaster_verification_gas_limit = limits.paymaster_verification_gas_limit;
        }
        if limits.paymaster_post_op_gas_limit.is_some() {
            op.paymaster_post_op_gas_limit = limits.paymaster_post_op_gas_limit;
        }

        if stub.is_final != Some(true) {
            let sponsored = ctx
                .paymaster
                .paymaster_data(&op, ctx.entry_point, ctx.chain_id)
                .await?;
            sponsored.apply(&mut op);
        }

        let local_hash = account.sign(&mut op, ctx.entry_point, ctx.chain_id)?;
        let user_op_hash = ctx
            .bundler
            .send_user_operation(&op, ctx.entry_point)
            .await?;
        if user_op_hash != local_hash {
            tracing::warn!(
                target: "bundler",
                %local_hash,
                %user_op_hash,
                "Bundler returned a different user operation hash"
            );
        }
        tracing::debug!(target: "bundler", %user_op_hash, nonce = %op.nonce, "User operation accepted");
        Ok(user_op_hash)
    }

    async fn await_receipt(&self, ctx: &SubmissionContext, user_op_hash: B256) -> Result<B256, AppError> {
        // Transport hiccups are polled through; anything the bundler says about
        // the hash itself ends the wait.
        let poll = async {
            loop {
                match ctx.bundler.user_operation_receipt(user_op_hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {}
                    Err(AppError::Connection(e)) => {
                        tracing::debug!(target: "bundler", %user_op_hash, error = %e, "Receipt poll failed");
                    }
                    Err(e) => return Err(e),
                }
                sleep(self.policy.receipt_poll).await;
            }
        };
        let receipt = match timeout(self.policy.receipt_timeout, poll).await {
            Ok(polled) => polled?,
            Err(_) => {
                return Err(AppError::ReceiptTimeout {
                    user_op_hash: user_op_hash.to_string(),
                    timeout_ms: self.policy.receipt_timeout.as_millis() as u64,
                });
            }
        };
        self.stats.receipts.fetch_add(1, Ordering::Relaxed);
        if !receipt.success {
            return Err(AppError::Transaction {
                hash: receipt.receipt.transaction_hash.to_string(),
                reason: receipt
                    .reason
                    .unwrap_or_else(|| "user operation reverted".to_string()),
            });
        }
        Ok(receipt.receipt.transaction_hash)
    }

    fn transition(&self, next: SubmissionStage) {
        let prev = self.stage.send_replace(next);
        if prev != next {
            tracing::debug!(target: "rescue", from = prev.label(), to = next.label(), "Stage");
        }
    }
}
