// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::WARMUP_SYMBOL;
use alloy::primitives::{B256, U256, keccak256};
use alloy_sol_types::SolValue;

/// `keccak256(abi.encode(string[] symbols, uint256 totalWeight, bool byAgent))`.
///
/// Order preserving: the same set boarded in a different order is a different
/// selection and hashes differently.
pub fn selection_hash(symbols: &[String], total_weight: u64, by_agent: bool) -> B256 {
    let encoded = (symbols.to_vec(), U256::from(total_weight), by_agent).abi_encode_params();
    keccak256(encoded)
}

pub fn warmup_hash() -> B256 {
    keccak256(WARMUP_SYMBOL.as_bytes())
}
