// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::parse_u128_quantity;
use crate::common::retry::retry_async;
use crate::domain::constants::{
    FALLBACK_MAX_FEE_PER_GAS, FALLBACK_MAX_PRIORITY_FEE_PER_GAS, GAS_PRICE_QUERY_ATTEMPTS,
    GAS_PRICE_QUERY_BACKOFF_MS, GAS_PRICE_QUERY_TIMEOUT_MS,
};
use crate::infrastructure::network::bundler::{BundlerApi, GasPriceTiers};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl GasFees {
    pub const FALLBACK: GasFees = GasFees {
        max_fee_per_gas: FALLBACK_MAX_FEE_PER_GAS,
        max_priority_fee_per_gas: FALLBACK_MAX_PRIORITY_FEE_PER_GAS,
    };
}

/// Bundler fee quote with a hardcoded fallback. `estimate` never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimator {
    attempts: usize,
    backoff: Duration,
    timeout: Duration,
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self {
            attempts: GAS_PRICE_QUERY_ATTEMPTS,
            backoff: Duration::from_millis(GAS_PRICE_QUERY_BACKOFF_MS),
            timeout: Duration::from_millis(GAS_PRICE_QUERY_TIMEOUT_MS),
        }
    }
}

impl GasEstimator {
    pub fn new(attempts: usize, backoff: Duration, timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
            timeout,
        }
    }

    pub async fn estimate(&self, bundler: &dyn BundlerApi) -> GasFees {
        match tokio::time::timeout(self.timeout, self.query(bundler)).await {
            Ok(Ok(fees)) => {
                tracing::debug!(
                    target: "bundler",
                    max_fee = fees.max_fee_per_gas,
                    priority_fee = fees.max_priority_fee_per_gas,
                    "Gas price from bundler"
                );
                fees
            }
            Ok(Err(e)) => {
                tracing::warn!(target: "bundler", error = %e, "Gas price query failed; using fallback fees");
                GasFees::FALLBACK
            }
            Err(_) => {
                tracing::warn!(
                    target: "bundler",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Gas price query timed out; using fallback fees"
                );
                GasFees::FALLBACK
            }
        }
    }

    async fn query(&self, bundler: &dyn BundlerApi) -> Result<GasFees, AppError> {
        let tiers = retry_async(
            "pimlico_getUserOperationGasPrice",
            |_| bundler.gas_price(),
            self.attempts,
            self.backoff,
        )
        .await?;
        Self::fees_from_tiers(&tiers)
    }

    /// Picks the preferred tier and rejects anything a bundler would refuse anyway.
    pub fn fees_from_tiers(tiers: &GasPriceTiers) -> Result<GasFees, AppError> {
        let quote = tiers
            .preferred()
            .ok_or_else(|| AppError::invalid("gasPrice", "no fee tier in response"))?;
        let max_fee = quote
            .max_fee_per_gas
            .as_deref()
            .and_then(parse_u128_quantity)
            .ok_or_else(|| AppError::invalid("maxFeePerGas", "missing or malformed"))?;
        let priority = quote
            .max_priority_fee_per_gas
            .as_deref()
            .and_then(parse_u128_quantity)
            .ok_or_else(|| AppError::invalid("maxPriorityFeePerGas", "missing or malformed"))?;
        if max_fee == 0 || priority == 0 {
            return Err(AppError::invalid("gasPrice", "zero fee quoted"));
        }
        if priority > max_fee {
            return Err(AppError::invalid(
                "maxPriorityFeePerGas",
                format!("{priority} exceeds maxFeePerGas {max_fee}"),
            ));
        }
        Ok(GasFees {
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: priority,
        })
    }
}
