// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::constants::ACCOUNT_CODE_TIMEOUT_MS;
use crate::infrastructure::data::rescue_abi::{EntryPointV07, SimpleAccount, SimpleAccountFactory};
use crate::infrastructure::data::user_op::UserOperation;
use crate::infrastructure::network::ledger::LedgerChain;
use alloy::primitives::aliases::U192;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use alloy_sol_types::SolCall;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Counterfactual SimpleAccount owned by a local key. Gas is paid by the
/// paymaster; the account only needs to exist (or be deployable) and sign.
pub struct SmartAccount {
    owner: PrivateKeySigner,
    address: Address,
    factory: Address,
    salt: U256,
    deployed: AtomicBool,
}

impl SmartAccount {
    pub fn new(owner: PrivateKeySigner, address: Address, factory: Address, salt: U256) -> Self {
        Self {
            owner,
            address,
            factory,
            salt,
            deployed: AtomicBool::new(false),
        }
    }

    /// Resolves the account address from the factory and probes for code.
    /// A failed probe is logged and treated as "not deployed".
    pub async fn connect(
        chain: &dyn LedgerChain,
        owner: PrivateKeySigner,
        factory: Address,
        salt: U256,
    ) -> Result<Self, AppError> {
        let call = SimpleAccountFactory::getAddressCall {
            owner: owner.address(),
            salt,
        };
        let raw = chain.call(None, factory, call.abi_encode().into()).await?;
        let address = SimpleAccountFactory::getAddressCall::abi_decode_returns(&raw).map_err(|e| {
            AppError::Initialization(format!("factory getAddress returned garbage: {e}"))
        })?;
        if address.is_zero() {
            return Err(AppError::Initialization(format!(
                "factory {factory} resolved the zero address"
            )));
        }

        let account = Self::new(owner, address, factory, salt);
        match tokio::time::timeout(
            Duration::from_millis(ACCOUNT_CODE_TIMEOUT_MS),
            account.refresh_deployment(chain),
        )
        .await
        {
            Ok(Ok(deployed)) => {
                tracing::info!(target: "account", %address, deployed, "Smart account resolved");
            }
            Ok(Err(e)) => {
                tracing::warn!(target: "account", %address, error = %e, "Code probe failed; assuming undeployed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "account",
                    %address,
                    timeout_ms = ACCOUNT_CODE_TIMEOUT_MS,
                    "Code probe timed out; assuming undeployed"
                );
            }
        }
        Ok(account)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner_address(&self) -> Address {
        self.owner.address()
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed.load(Ordering::Acquire)
    }

    /// Re-reads code unless deployment was already confirmed. Only a positive
    /// answer is cached.
    pub async fn refresh_deployment(&self, chain: &dyn LedgerChain) -> Result<bool, AppError> {
        if self.is_deployed() {
            return Ok(true);
        }
        let code = chain.code_at(self.address).await?;
        let deployed = !code.is_empty();
        if deployed {
            self.deployed.store(true, Ordering::Release);
        }
        Ok(deployed)
    }

    /// `(factory, createAccount(owner, salt))` for the first operation.
    pub fn deployment_data(&self) -> (Address, Bytes) {
        let call = SimpleAccountFactory::createAccountCall {
            owner: self.owner.address(),
            salt: self.salt,
        };
        (self.factory, call.abi_encode().into())
    }

    pub fn execute_calldata(&self, dest: Address, value: U256, func: Bytes) -> Bytes {
        SimpleAccount::executeCall { dest, value, func }
            .abi_encode()
            .into()
    }

    /// Sequential nonce on key 0.
    pub async fn nonce(&self, chain: &dyn LedgerChain, entry_point: Address) -> Result<U256, AppError> {
        let call = EntryPointV07::getNonceCall {
            sender: self.address,
            key: U192::ZERO,
        };
        let raw = chain.call(None, entry_point, call.abi_encode().into()).await?;
        EntryPointV07::getNonceCall::abi_decode_returns(&raw)
            .map_err(|e| AppError::Connection(format!("getNonce returned garbage: {e}")))
    }

    /// EIP-191 signature over the v0.7 user operation hash, written into `op`.
    pub fn sign(
        &self,
        op: &mut UserOperation,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<B256, AppError> {
        let hash = op.hash(entry_point, chain_id)?;
        let signature = self
            .owner
            .sign_message_sync(hash.as_slice())
            .map_err(|e| AppError::Initialization(format!("signing failed: {e}")))?;
        let mut raw = Vec::with_capacity(65);
        raw.extend_from_slice(&signature.r().to_be_bytes::<32>());
        raw.extend_from_slice(&signature.s().to_be_bytes::<32>());
        raw.push(27 + signature.v() as u8);
        op.signature = raw.into();
        Ok(hash)
    }
}
