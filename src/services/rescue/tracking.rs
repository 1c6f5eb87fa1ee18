// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::parsing::is_prefixed_hex;
use crate::domain::constants::{DEFAULT_ADDRESS_URL_TEMPLATE, DEFAULT_TRACKING_URL_TEMPLATE};
use alloy::primitives::Address;

const HASH_PLACEHOLDER: &str = "{hash}";
const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Explorer links for submitted operations and the sponsored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingUrls {
    user_op_template: String,
    address_template: String,
}

impl Default for TrackingUrls {
    fn default() -> Self {
        Self {
            user_op_template: DEFAULT_TRACKING_URL_TEMPLATE.to_string(),
            address_template: DEFAULT_ADDRESS_URL_TEMPLATE.to_string(),
        }
    }
}

impl TrackingUrls {
    pub fn new(user_op_template: &str, address_template: &str) -> Result<Self, AppError> {
        if !user_op_template.contains(HASH_PLACEHOLDER) {
            return Err(AppError::Config(format!(
                "TRACKING_URL_TEMPLATE must contain {HASH_PLACEHOLDER}"
            )));
        }
        if !address_template.contains(ADDRESS_PLACEHOLDER) {
            return Err(AppError::Config(format!(
                "ADDRESS_URL_TEMPLATE must contain {ADDRESS_PLACEHOLDER}"
            )));
        }
        Ok(Self {
            user_op_template: user_op_template.to_string(),
            address_template: address_template.to_string(),
        })
    }

    /// The hash is inserted verbatim; it only has to be 0x-prefixed hex.
    pub fn user_op_url(&self, user_op_hash: &str) -> Result<String, AppError> {
        let hash = user_op_hash.trim();
        if hash.is_empty() {
            return Err(AppError::invalid("userOpHash", "empty"));
        }
        if !is_prefixed_hex(hash) {
            return Err(AppError::invalid(
                "userOpHash",
                format!("{hash} is not 0x-prefixed hex"),
            ));
        }
        Ok(self.user_op_template.replace(HASH_PLACEHOLDER, hash))
    }

    pub fn address_url(&self, address: &Address) -> String {
        self.address_template
            .replace(ADDRESS_PLACEHOLDER, &address.to_checksum(None))
    }
}
