// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::B256;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// `0x` followed by at least one hex digit.
pub fn is_prefixed_hex(s: &str) -> bool {
    let body = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(body) => body,
        None => return false,
    };
    !body.is_empty() && body.chars().all(|c| c.is_ascii_hexdigit())
}

/// Exactly 32 bytes, `0x` optional.
pub fn parse_b256_hex(s: &str) -> Option<B256> {
    let bytes = hex::decode(strip_0x(s.trim())).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    Some(B256::from_slice(&bytes))
}

/// Accepts hex quantities (`0x..`) and plain decimals, which some bundlers return.
pub fn parse_u128_quantity(s: &str) -> Option<u128> {
    let s = s.trim();
    if s.starts_with("0x") || s.starts_with("0X") {
        u128::from_str_radix(strip_0x(s), 16).ok()
    } else {
        s.parse::<u128>().ok()
    }
}

/// Splits `BTC, eth ,,SOL` into trimmed upper-case symbols, keeping order.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}
