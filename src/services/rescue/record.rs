// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::domain::constants::WARMUP_SYMBOL;
use crate::domain::tokens::find_token;
use crate::infrastructure::data::calldata::CalldataBuilder;
use crate::services::rescue::hasher::{selection_hash, warmup_hash};
use crate::services::rescue::selection::Selection;
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{B256, Bytes, U256};
use serde::Serialize;

/// What gets written to `RescueLog.logRescue`. The hash is always derived
/// from the other fields, except for the fixed warmup record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueRecord {
    symbols: Vec<String>,
    total_weight: u64,
    by_agent: bool,
    selection_hash: B256,
}

impl RescueRecord {
    /// Weight is summed from the catalog. Unknown or repeated symbols are
    /// rejected; capacity is the selection's concern, not the record's.
    pub fn new(symbols: Vec<String>, by_agent: bool) -> Result<Self, AppError> {
        if symbols.is_empty() {
            return Err(AppError::EmptySelection);
        }
        let mut canonical: Vec<String> = Vec::with_capacity(symbols.len());
        let mut total_weight = 0u64;
        for raw in &symbols {
            let token = find_token(raw)
                .ok_or_else(|| AppError::invalid("symbols", format!("unknown token {raw}")))?;
            if canonical.iter().any(|s| s == token.symbol) {
                return Err(AppError::invalid(
                    "symbols",
                    format!("{} listed twice", token.symbol),
                ));
            }
            canonical.push(token.symbol.to_string());
            total_weight += token.weight;
        }
        let selection_hash = selection_hash(&canonical, total_weight, by_agent);
        Ok(Self {
            symbols: canonical,
            total_weight,
            by_agent,
            selection_hash,
        })
    }

    pub fn from_selection(selection: &Selection, by_agent: bool) -> Result<Self, AppError> {
        Self::new(selection.symbols(), by_agent)
    }

    /// Zero-weight record used to exercise the account and paymaster path.
    pub fn warmup() -> Self {
        Self {
            symbols: vec![WARMUP_SYMBOL.to_string()],
            total_weight: 0,
            by_agent: false,
            selection_hash: warmup_hash(),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn by_agent(&self) -> bool {
        self.by_agent
    }

    pub fn selection_hash(&self) -> B256 {
        self.selection_hash
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// `logRescue(string[],uint256,bool,bytes32)` calldata.
    pub fn calldata(&self, abi: &CalldataBuilder) -> Result<Bytes, AppError> {
        let symbols = self
            .symbols
            .iter()
            .map(|s| DynSolValue::String(s.clone()))
            .collect();
        abi.encode(
            "logRescue",
            &[
                DynSolValue::Array(symbols),
                DynSolValue::Uint(U256::from(self.total_weight), 256),
                DynSolValue::Bool(self.by_agent),
                DynSolValue::FixedBytes(self.selection_hash, 32),
            ],
        )
    }
}

/// Outcome handed back to the caller once the bundler accepted the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub user_op_hash: B256,
    pub tracking_url: String,
    /// Only set when the submission waited for inclusion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
}
