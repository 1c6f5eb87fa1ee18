// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::infrastructure::data::rescue_abi::RescueLog;
use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::{Bytes, FixedBytes};
use alloy_json_abi::{Function, JsonAbi};

/// Encodes contract calls against a declared interface. Every call is
/// type-checked against the declared parameters before any bytes are produced.
#[derive(Debug, Clone)]
pub struct CalldataBuilder {
    abi: JsonAbi,
}

impl CalldataBuilder {
    pub fn new(abi: JsonAbi) -> Self {
        Self { abi }
    }

    /// Built from the `RescueLog` bindings, so the two cannot drift apart.
    pub fn rescue_log() -> Self {
        Self::new(RescueLog::abi::contract())
    }

    pub fn function(&self, name: &str) -> Result<&Function, AppError> {
        let overloads = self.abi.function(name).ok_or_else(|| AppError::Encoding {
            function: name.to_string(),
            reason: "not declared in interface".into(),
        })?;
        // Overloads are not part of any schema we ship.
        match overloads.as_slice() {
            [single] => Ok(single),
            _ => Err(AppError::Encoding {
                function: name.to_string(),
                reason: format!("{} overloads declared", overloads.len()),
            }),
        }
    }

    pub fn selector(&self, name: &str) -> Result<FixedBytes<4>, AppError> {
        Ok(self.function(name)?.selector())
    }

    /// Selector followed by the ABI-encoded arguments.
    pub fn encode(&self, name: &str, args: &[DynSolValue]) -> Result<Bytes, AppError> {
        let function = self.function(name)?;
        if function.inputs.len() != args.len() {
            return Err(AppError::Encoding {
                function: function.signature(),
                reason: format!(
                    "expected {} arguments, got {}",
                    function.inputs.len(),
                    args.len()
                ),
            });
        }
        let encoded = function
            .abi_encode_input(args)
            .map_err(|e| AppError::Encoding {
                function: function.signature(),
                reason: e.to_string(),
            })?;
        Ok(encoded.into())
    }
}
