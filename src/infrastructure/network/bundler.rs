// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! ERC-4337 bundler and ERC-7677 paymaster clients.

use crate::common::error::AppError;
use crate::infrastructure::data::user_op::UserOperation;
use crate::infrastructure::network::rpc::JsonRpcHttp;
use alloy::primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

/// One fee tier as returned by `pimlico_getUserOperationGasPrice`. Values stay raw
/// so the estimator can decide what counts as malformed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPriceQuote {
    #[serde(default)]
    pub max_fee_per_gas: Option<String>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GasPriceTiers {
    #[serde(default)]
    pub slow: Option<GasPriceQuote>,
    #[serde(default)]
    pub standard: Option<GasPriceQuote>,
    #[serde(default)]
    pub fast: Option<GasPriceQuote>,
    /// Some bundlers answer with a single untiered quote.
    #[serde(flatten)]
    pub flat: GasPriceQuote,
}

impl GasPriceTiers {
    /// standard, then fast, then slow, then the untiered quote.
    pub fn preferred(&self) -> Option<&GasPriceQuote> {
        self.standard
            .as_ref()
            .or(self.fast.as_ref())
            .or(self.slow.as_ref())
            .or_else(|| {
                (self.flat.max_fee_per_gas.is_some() || self.flat.max_priority_fee_per_gas.is_some())
                    .then_some(&self.flat)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationGasEstimate {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
    #[serde(default)]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTransaction {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: B256,
    pub success: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub actual_gas_used: Option<U256>,
    pub receipt: ReceiptTransaction,
}

/// ERC-7677 `pm_getPaymasterStubData` / `pm_getPaymasterData` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterFields {
    #[serde(default)]
    pub paymaster: Option<Address>,
    #[serde(default)]
    pub paymaster_data: Option<Bytes>,
    #[serde(default)]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(default)]
    pub is_final: Option<bool>,
}

impl PaymasterFields {
    /// Copies the sponsorship onto `op`; gas limits are only overwritten when provided.
    pub fn apply(&self, op: &mut UserOperation) {
        op.paymaster = self.paymaster;
        op.paymaster_data = self.paymaster_data.clone();
        if self.paymaster_verification_gas_limit.is_some() {
            op.paymaster_verification_gas_limit = self.paymaster_verification_gas_limit;
        }
        if self.paymaster_post_op_gas_limit.is_some() {
            op.paymaster_post_op_gas_limit = self.paymaster_post_op_gas_limit;
        }
    }
}

#[async_trait]
pub trait BundlerApi: Send + Sync {
    async fn gas_price(&self) -> Result<GasPriceTiers, AppError>;

    async fn estimate_user_operation_gas(
        &self,
        op: &UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimate, AppError>;

    async fn send_user_operation(
        &self,
        op: &UserOperation,
        entry_point: Address,
    ) -> Result<B256, AppError>;

    /// `None` while the operation is still pending.
    async fn user_operation_receipt(
        &self,
        user_op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>, AppError>;
}

#[async_trait]
pub trait PaymasterApi: Send + Sync {
    async fn stub_data(
        &self,
        op: &UserOperation,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<PaymasterFields, AppError>;

    async fn paymaster_data(
        &self,
        op: &UserOperation,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<PaymasterFields, AppError>;
}

pub struct BundlerClient {
    rpc: JsonRpcHttp,
}

impl BundlerClient {
    pub fn new(url: Url) -> Result<Self, AppError> {
        Ok(Self {
            rpc: JsonRpcHttp::new("bundler", url)?,
        })
    }

    pub fn endpoint(&self) -> String {
        self.rpc.endpoint()
    }
}

#[async_trait]
impl BundlerApi for BundlerClient {
    async fn gas_price(&self) -> Result<GasPriceTiers, AppError> {
        self.rpc
            .request("pimlico_getUserOperationGasPrice", json!([]))
            .await
    }

    async fn estimate_user_operation_gas(
        &self,
        op: &UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimate, AppError> {
        self.rpc
            .request("eth_estimateUserOperationGas", json!([op, entry_point]))
            .await
    }

    async fn send_user_operation(
        &self,
        op: &UserOperation,
        entry_point: Address,
    ) -> Result<B256, AppError> {
        self.rpc
            .request("eth_sendUserOperation", json!([op, entry_point]))
            .await
    }

    async fn user_operation_receipt(
        &self,
        user_op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>, AppError> {
        self.rpc
            .request("eth_getUserOperationReceipt", json!([user_op_hash]))
            .await
    }
}

pub struct PaymasterClient {
    rpc: JsonRpcHttp,
    context: Value,
}

impl PaymasterClient {
    pub fn new(url: Url) -> Result<Self, AppError> {
        Ok(Self {
            rpc: JsonRpcHttp::new("paymaster", url)?,
            context: json!({}),
        })
    }

    /// Provider-specific sponsorship context (e.g. a policy id).
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    fn params(&self, op: &UserOperation, entry_point: Address, chain_id: u64) -> Value {
        json!([op, entry_point, format!("0x{chain_id:x}"), self.context])
    }
}

#[async_trait]
impl PaymasterApi for PaymasterClient {
    async fn stub_data(
        &self,
        op: &UserOperation,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<PaymasterFields, AppError> {
        self.rpc
            .request(
                "pm_getPaymasterStubData",
                self.params(op, entry_point, chain_id),
            )
            .await
    }

    async fn paymaster_data(
        &self,
        op: &UserOperation,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<PaymasterFields, AppError> {
        self.rpc
            .request("pm_getPaymasterData", self.params(op, entry_point, chain_id))
            .await
    }
}
