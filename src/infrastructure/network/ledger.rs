// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use async_trait::async_trait;
use std::time::Duration;

/// The slice of a plain Ethereum node the rescue flow reads from.
#[async_trait]
pub trait LedgerChain: Send + Sync {
    async fn chain_id(&self) -> Result<u64, AppError>;

    /// Empty bytes for accounts without code.
    async fn code_at(&self, address: Address) -> Result<Bytes, AppError>;

    /// `eth_call` against latest state; a revert is an error.
    async fn call(&self, from: Option<Address>, to: Address, data: Bytes)
    -> Result<Bytes, AppError>;

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, AppError>;
}

#[derive(Clone)]
pub struct RpcLedger {
    provider: HttpProvider,
}

impl RpcLedger {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl LedgerChain for RpcLedger {
    async fn chain_id(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        retry_async(
            "eth_chainId",
            move |_| {
                let provider = provider.clone();
                async move { provider.get_chain_id().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("eth_chainId failed: {e}")))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, AppError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| AppError::Connection(format!("eth_getCode({address}) failed: {e}")))
    }

    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: Bytes,
    ) -> Result<Bytes, AppError> {
        let mut tx = TransactionRequest::default().with_to(to).with_input(data);
        if let Some(from) = from {
            tx = tx.with_from(from);
        }
        self.provider
            .call(tx)
            .await
            .map_err(|e| AppError::Connection(format!("eth_call to {to} failed: {e}")))
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, AppError> {
        self.provider
            .get_logs(filter)
            .await
            .map_err(|e| AppError::Connection(format!("eth_getLogs failed: {e}")))
    }
}
