// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_MONAD_TESTNET: u64 = 10_143;

/// Canonical ERC-4337 EntryPoint v0.7 deployment (same address on every chain).
pub const ENTRY_POINT_V07: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

pub const DEFAULT_TRACKING_URL_TEMPLATE: &str = "https://pimlico.io/explorer/userOp?hash={hash}";
pub const DEFAULT_ADDRESS_URL_TEMPLATE: &str =
    "https://testnet.monadexplorer.com/address/{address}";

pub fn pimlico_bundler_url(chain_id: u64, api_key: &str) -> String {
    format!("https://api.pimlico.io/v2/{chain_id}/rpc?apikey={api_key}")
}

// =============================================================================
// GAS CONSTANTS (wei)
// =============================================================================

/// Used whenever the bundler gas price query fails or returns garbage.
pub const FALLBACK_MAX_FEE_PER_GAS: u128 = 200_000_000_000;
pub const FALLBACK_MAX_PRIORITY_FEE_PER_GAS: u128 = 2_000_000_000;

pub const GAS_PRICE_QUERY_ATTEMPTS: usize = 2;
pub const GAS_PRICE_QUERY_BACKOFF_MS: u64 = 100;
pub const GAS_PRICE_QUERY_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// SUBMISSION TIMING (milliseconds)
// =============================================================================

pub const DEFAULT_SIMULATE_TIMEOUT_MS: u64 = 4_000;
pub const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_500;
pub const ACCOUNT_CODE_TIMEOUT_MS: u64 = 5_000;
pub const CHAIN_PING_TIMEOUT_MS: u64 = 4_000;
pub const RPC_HTTP_TIMEOUT_MS: u64 = 15_000;

// =============================================================================
// GAME
// =============================================================================

pub const DEFAULT_CAPACITY: u64 = 100;

pub const WARMUP_SYMBOL: &str = "WARMUP";

/// Placeholder signature accepted by SimpleAccount validation during gas estimation.
pub const DUMMY_SIGNATURE: [u8; 65] = {
    let mut sig = [0u8; 65];
    let mut i = 0;
    while i < 15 {
        sig[i] = 0xff;
        i += 1;
    }
    sig[15] = 0xf0;
    sig[31] = 0x07;
    let mut j = 32;
    while j < 64 {
        sig[j] = 0xaa;
        j += 1;
    }
    sig[64] = 0x1c;
    sig
};
