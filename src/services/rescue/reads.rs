// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Read side of the RescueLog contract: per-symbol counters, global and
//! per-user stats, the caller's last rescue and `Rescued` events.

use crate::common::error::AppError;
use crate::infrastructure::data::rescue_abi::RescueLog;
use crate::infrastructure::network::ledger::LedgerChain;
use crate::services::rescue::hasher::selection_hash;
use alloy::primitives::{Address, B256, LogData, U256};
use alloy::rpc::types::{Filter, Log};
use alloy_sol_types::{SolCall, SolEvent};
use futures::future::try_join;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolCount {
    pub symbol: String,
    pub total: U256,
    pub by_agent: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescuedEntry {
    pub by: Address,
    pub selection_hash: B256,
    pub symbols: Vec<String>,
    pub total_weight: U256,
    pub by_agent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
}

impl RescuedEntry {
    pub fn decode(log: &LogData) -> Result<Self, AppError> {
        let event = RescueLog::Rescued::decode_log_data(log)
            .map_err(|e| AppError::invalid("log", format!("not a Rescued event: {e}")))?;
        Ok(Self {
            by: event.by,
            selection_hash: event.selectionHash,
            symbols: event.symbols,
            total_weight: event.totalWeight,
            by_agent: event.byAgent,
            block_number: None,
            transaction_hash: None,
        })
    }

    pub fn from_log(log: &Log) -> Result<Self, AppError> {
        let mut entry = Self::decode(&log.inner.data)?;
        entry.block_number = log.block_number;
        entry.transaction_hash = log.transaction_hash;
        Ok(entry)
    }

    /// False for records whose hash was not derived from their own fields
    /// (e.g. the warmup record).
    pub fn hash_is_derived(&self) -> bool {
        u64::try_from(self.total_weight)
            .map(|w| selection_hash(&self.symbols, w, self.by_agent) == self.selection_hash)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRescue {
    pub selection_hash: B256,
    pub symbols: Vec<String>,
    pub total_weight: U256,
    pub by_agent: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total: U256,
    pub agent_total: U256,
    pub unique_symbols: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: U256,
    pub by_agent: U256,
    pub last_rescue_time: u64,
    pub last_was_by_agent: bool,
}

pub struct RescueLedgerReader {
    chain: Arc<dyn LedgerChain>,
    rescue_log: Address,
}

impl RescueLedgerReader {
    pub fn new(chain: Arc<dyn LedgerChain>, rescue_log: Address) -> Self {
        Self { chain, rescue_log }
    }

    /// Total and agent-only rescue counts, one entry per requested symbol.
    pub async fn counts(&self, symbols: &[String]) -> Result<Vec<SymbolCount>, AppError> {
        let totals_call = RescueLog::getCountsCall {
            symbols: symbols.to_vec(),
        };
        let agents_call = RescueLog::getAgentCountsCall {
            symbols: symbols.to_vec(),
        };
        let (totals, agents) =
            try_join(self.query(&totals_call), self.query(&agents_call)).await?;
        if totals.len() != symbols.len() || agents.len() != symbols.len() {
            return Err(AppError::Connection(format!(
                "RescueLog returned {}/{} counts for {} symbols",
                totals.len(),
                agents.len(),
                symbols.len()
            )));
        }
        Ok(symbols
            .iter()
            .zip(totals.into_iter().zip(agents))
            .map(|(symbol, (total, by_agent))| SymbolCount {
                symbol: symbol.clone(),
                total,
                by_agent,
            })
            .collect())
    }

    /// `None` when `user` never rescued anything.
    pub async fn last_rescue(&self, user: Address) -> Result<Option<LastRescue>, AppError> {
        let ret = self.query(&RescueLog::getLastRescueCall { user }).await?;
        if ret.timestamp == 0 {
            return Ok(None);
        }
        Ok(Some(LastRescue {
            selection_hash: ret.selectionHash,
            symbols: ret.symbols,
            total_weight: ret.totalWeight,
            by_agent: ret.byAgent,
            timestamp: ret.timestamp,
        }))
    }

    pub async fn global_stats(&self) -> Result<GlobalStats, AppError> {
        let ret = self.query(&RescueLog::getGlobalStatsCall {}).await?;
        Ok(GlobalStats {
            total: ret.total,
            agent_total: ret.agentTotal,
            unique_symbols: ret.uniqueSymbols,
        })
    }

    pub async fn user_stats(&self, user: Address) -> Result<UserStats, AppError> {
        let ret = self.query(&RescueLog::getUserStatsCall { user }).await?;
        Ok(UserStats {
            total: ret.totalUserRescues,
            by_agent: ret.agentUserRescues,
            last_rescue_time: ret.lastRescueTime,
            last_was_by_agent: ret.lastWasByAgent,
        })
    }

    /// `Rescued` events emitted since `from_block`, oldest first. Logs that do
    /// not decode are skipped.
    pub async fn rescued_events(&self, from_block: u64) -> Result<Vec<RescuedEntry>, AppError> {
        let filter = Filter::new()
            .address(self.rescue_log)
            .event_signature(RescueLog::Rescued::SIGNATURE_HASH)
            .from_block(from_block);
        let logs = self.chain.logs(&filter).await?;
        let mut entries = Vec::with_capacity(logs.len());
        for log in &logs {
            match RescuedEntry::from_log(log) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        target: "rpc",
                        tx = ?log.transaction_hash,
                        error = %e,
                        "Skipping undecodable Rescued log"
                    );
                }
            }
        }
        Ok(entries)
    }

    async fn query<C: SolCall>(&self, call: &C) -> Result<C::Return, AppError> {
        let raw = self
            .chain
            .call(None, self.rescue_log, call.abi_encode().into())
            .await?;
        C::abi_decode_returns(&raw).map_err(|e| {
            AppError::Connection(format!("{} returned garbage: {e}", C::SIGNATURE))
        })
    }
}
