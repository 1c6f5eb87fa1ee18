// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub symbol: &'static str,
    pub display_name: &'static str,
    pub weight: u64,
}

const fn token(symbol: &'static str, display_name: &'static str, weight: u64) -> Token {
    Token {
        symbol,
        display_name,
        weight,
    }
}

/// Static catalog of boardable tokens.
pub static TOKEN_CATALOG: [Token; 8] = [
    token("BTC", "Bitcoin", 100),
    token("ETH", "Ethereum", 60),
    token("SOL", "Solana", 20),
    token("LINK", "Chainlink", 12),
    token("DOGE", "Dogecoin", 10),
    token("PEPE", "PEPE", 4),
    token("LINEA", "Linea", 8),
    token("MON", "Monad", 7),
];

/// Case-insensitive lookup.
pub fn find_token(symbol: &str) -> Option<&'static Token> {
    let wanted = symbol.trim();
    TOKEN_CATALOG
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(wanted))
}

pub fn catalog_symbols() -> Vec<String> {
    TOKEN_CATALOG.iter().map(|t| t.symbol.to_string()).collect()
}
