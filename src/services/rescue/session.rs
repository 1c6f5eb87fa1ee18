// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::Settings;
use crate::common::error::AppError;
use crate::domain::constants::CHAIN_PING_TIMEOUT_MS;
use crate::infrastructure::network::bundler::{
    BundlerApi, BundlerClient, PaymasterApi, PaymasterClient,
};
use crate::infrastructure::network::ledger::{LedgerChain, RpcLedger};
use crate::infrastructure::network::provider::{ConnectionFactory, redacted_endpoint};
use crate::services::rescue::account::SmartAccount;
use crate::services::rescue::orchestrator::{RescueOrchestrator, SubmissionStage};
use crate::services::rescue::record::{RescueRecord, SubmissionResult};
use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell, watch};

/// Everything a submission needs, built once per session.
pub struct SubmissionContext {
    pub chain_id: u64,
    pub entry_point: Address,
    pub rescue_log: Address,
    pub account: SmartAccount,
    pub chain: Arc<dyn LedgerChain>,
    pub bundler: Arc<dyn BundlerApi>,
    pub paymaster: Arc<dyn PaymasterApi>,
}

#[async_trait]
pub trait ContextFactory: Send + Sync {
    async fn create(&self) -> Result<SubmissionContext, AppError>;
}

/// Builds the context from settings against live endpoints.
pub struct RpcContextFactory {
    settings: Settings,
}

impl RpcContextFactory {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ContextFactory for RpcContextFactory {
    async fn create(&self) -> Result<SubmissionContext, AppError> {
        let settings = &self.settings;
        let rpc_url = settings.rpc_url()?;
        let chain: Arc<dyn LedgerChain> =
            Arc::new(RpcLedger::new(ConnectionFactory::http(&rpc_url)?));

        let reported = tokio::time::timeout(
            Duration::from_millis(CHAIN_PING_TIMEOUT_MS),
            chain.chain_id(),
        )
        .await
        .map_err(|_| {
            AppError::Connection(format!(
                "{} did not answer eth_chainId within {CHAIN_PING_TIMEOUT_MS}ms",
                redacted_endpoint(&rpc_url)
            ))
        })??;
        if reported != settings.chain_id {
            return Err(AppError::Config(format!(
                "CHAIN_ID is {} but RPC reports {reported}",
                settings.chain_id
            )));
        }

        let account = SmartAccount::connect(
            chain.as_ref(),
            settings.owner_signer()?,
            settings.account_factory_address()?,
            settings.account_salt(),
        )
        .await?;

        let bundler = BundlerClient::new(settings.bundler_url()?)?;
        let paymaster =
            PaymasterClient::new(settings.paymaster_url()?)?.with_context(settings.paymaster_context());
        tracing::info!(
            target: "rescue",
            chain_id = reported,
            account = %account.address(),
            owner = %account.owner_address(),
            bundler = %bundler.endpoint(),
            "Submission context ready"
        );

        Ok(SubmissionContext {
            chain_id: reported,
            entry_point: settings.entry_point_address()?,
            rescue_log: settings.rescue_log_address()?,
            account,
            chain,
            bundler: Arc::new(bundler),
            paymaster: Arc::new(paymaster),
        })
    }
}

/// Long-lived handle for submitting rescues. The context is created lazily
/// and at most once; at most one submission runs at a time and a second
/// attempt while one is running fails with `SubmissionInFlight`.
pub struct RescueSession {
    factory: Arc<dyn ContextFactory>,
    context: OnceCell<Arc<SubmissionContext>>,
    orchestrator: RescueOrchestrator,
    in_flight: Mutex<()>,
}

impl RescueSession {
    pub fn new(factory: Arc<dyn ContextFactory>, orchestrator: RescueOrchestrator) -> Self {
        Self {
            factory,
            context: OnceCell::new(),
            orchestrator,
            in_flight: Mutex::new(()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let orchestrator =
            RescueOrchestrator::new(settings.submission_policy(), settings.tracking_urls()?)
                .with_gas_estimator(settings.gas_estimator());
        Ok(Self::new(
            Arc::new(RpcContextFactory::new(settings.clone())),
            orchestrator,
        ))
    }

    /// Concurrent callers share one initialization. A failed init is not
    /// cached, so the next call tries again.
    pub async fn context(&self) -> Result<Arc<SubmissionContext>, AppError> {
        self.context
            .get_or_try_init(|| async { self.factory.create().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub async fn rescue(&self, record: RescueRecord) -> Result<SubmissionResult, AppError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            self.orchestrator
                .stats()
                .rejected_in_flight
                .fetch_add(1, Ordering::Relaxed);
            tracing::warn!(target: "rescue", "Submission already in flight");
            return Err(AppError::SubmissionInFlight);
        };
        let ctx = self.context().await?;
        self.orchestrator.run(&ctx, &record).await
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    pub fn orchestrator(&self) -> &RescueOrchestrator {
        &self.orchestrator
    }

    pub fn stage(&self) -> SubmissionStage {
        self.orchestrator.stage()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionStage> {
        self.orchestrator.subscribe()
    }
}
