// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! EntryPoint v0.7 user operation in its JSON-RPC (unpacked) shape, plus the
//! packed hash the account signs.

use crate::common::error::AppError;
use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    pub signature: Bytes,
}

impl UserOperation {
    pub fn new(sender: Address, nonce: U256, call_data: Bytes, signature: Bytes) -> Self {
        Self {
            sender,
            nonce,
            factory: None,
            factory_data: None,
            call_data,
            call_gas_limit: U256::ZERO,
            verification_gas_limit: U256::ZERO,
            pre_verification_gas: U256::ZERO,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            paymaster: None,
            paymaster_verification_gas_limit: None,
            paymaster_post_op_gas_limit: None,
            paymaster_data: None,
            signature,
        }
    }

    /// `factory ++ factoryData`, empty for deployed accounts.
    pub fn init_code(&self) -> Vec<u8> {
        match self.factory {
            Some(factory) => {
                let mut out = factory.to_vec();
                if let Some(data) = &self.factory_data {
                    out.extend_from_slice(data);
                }
                out
            }
            None => Vec::new(),
        }
    }

    /// `paymaster ++ uint128(verificationGas) ++ uint128(postOpGas) ++ paymasterData`.
    pub fn paymaster_and_data(&self) -> Result<Vec<u8>, AppError> {
        let Some(paymaster) = self.paymaster else {
            return Ok(Vec::new());
        };
        let mut out = paymaster.to_vec();
        out.extend_from_slice(&u128_word(
            "paymasterVerificationGasLimit",
            self.paymaster_verification_gas_limit.unwrap_or_default(),
        )?);
        out.extend_from_slice(&u128_word(
            "paymasterPostOpGasLimit",
            self.paymaster_post_op_gas_limit.unwrap_or_default(),
        )?);
        if let Some(data) = &self.paymaster_data {
            out.extend_from_slice(data);
        }
        Ok(out)
    }

    pub fn account_gas_limits(&self) -> Result<B256, AppError> {
        Ok(pack_words(
            u128_word("verificationGasLimit", self.verification_gas_limit)?,
            u128_word("callGasLimit", self.call_gas_limit)?,
        ))
    }

    pub fn gas_fees(&self) -> Result<B256, AppError> {
        Ok(pack_words(
            u128_word("maxPriorityFeePerGas", self.max_priority_fee_per_gas)?,
            u128_word("maxFeePerGas", self.max_fee_per_gas)?,
        ))
    }

    /// EntryPoint v0.7 `getUserOpHash`. Fails if a packed gas field does not
    /// fit in 128 bits.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> Result<B256, AppError> {
        let packed = (
            self.sender,
            self.nonce,
            keccak256(self.init_code()),
            keccak256(&self.call_data),
            self.account_gas_limits()?,
            self.pre_verification_gas,
            self.gas_fees()?,
            keccak256(self.paymaster_and_data()?),
        )
            .abi_encode();
        Ok(keccak256(
            (keccak256(packed), entry_point, U256::from(chain_id)).abi_encode(),
        ))
    }
}

fn u128_word(field: &str, value: U256) -> Result<[u8; 16], AppError> {
    u128::try_from(value)
        .map(u128::to_be_bytes)
        .map_err(|_| AppError::invalid(field, format!("{value} does not fit in uint128")))
}

fn pack_words(high: [u8; 16], low: [u8; 16]) -> B256 {
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&high);
    out[16..].copy_from_slice(&low);
    B256::from(out)
}
