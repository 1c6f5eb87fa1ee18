// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &Url) -> Result<HttpProvider, AppError> {
        match rpc_url.scheme() {
            "http" | "https" => Ok(RootProvider::new_http(rpc_url.clone())),
            other => Err(AppError::Config(format!(
                "Unsupported RPC scheme {other}; only http(s) is supported"
            ))),
        }
    }
}

/// Scheme, host and path only; query strings routinely carry API keys.
pub fn redacted_endpoint(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or("unknown"),
        url.path()
    )
}
