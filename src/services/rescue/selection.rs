// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::domain::tokens::{Token, find_token};

/// Tokens currently in the lifeboat, in boarding order.
///
/// Invariants: no symbol appears twice and the summed weight never exceeds
/// `capacity`. Adds that would break either are silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    capacity: u64,
    tokens: Vec<Token>,
}

impl Selection {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            tokens: Vec::new(),
        }
    }

    /// Returns `true` when the token boarded.
    pub fn add(&mut self, token: &Token) -> bool {
        if self.contains(token.symbol) {
            tracing::debug!(target: "selection", symbol = token.symbol, "Already aboard");
            return false;
        }
        let next = self.used_weight().saturating_add(token.weight);
        if next > self.capacity {
            tracing::debug!(
                target: "selection",
                symbol = token.symbol,
                used = self.used_weight(),
                weight = token.weight,
                capacity = self.capacity,
                "Over capacity"
            );
            return false;
        }
        self.tokens.push(*token);
        true
    }

    /// Catalog lookup then `add`. Unknown symbols are a caller error, not a no-op.
    pub fn add_symbol(&mut self, symbol: &str) -> Result<bool, AppError> {
        let token = find_token(symbol)
            .ok_or_else(|| AppError::invalid("symbol", format!("{symbol} is not in the catalog")))?;
        Ok(self.add(token))
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| !t.symbol.eq_ignore_ascii_case(symbol));
        before != self.tokens.len()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn used_weight(&self) -> u64 {
        self.tokens.iter().map(|t| t.weight).sum()
    }

    pub fn remaining(&self) -> u64 {
        self.capacity.saturating_sub(self.used_weight())
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn symbols(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.symbol.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}
