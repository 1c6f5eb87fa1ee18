// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::constants::RPC_HTTP_TIMEOUT_MS;
use crate::infrastructure::network::provider::redacted_endpoint;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcErrorBody {
    fn reason(&self) -> String {
        match &self.data {
            Some(Value::String(detail)) if !detail.is_empty() => {
                format!("{} ({})", self.message, detail)
            }
            _ => self.message.clone(),
        }
    }
}

/// Minimal JSON-RPC 2.0 client for services that are not plain Ethereum nodes
/// (bundlers, paymasters).
pub struct JsonRpcHttp {
    label: &'static str,
    url: Url,
    client: Client,
    next_id: AtomicU64,
}

impl JsonRpcHttp {
    pub fn new(label: &'static str, url: Url) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(RPC_HTTP_TIMEOUT_MS))
            .build()
            .map_err(|e| AppError::Initialization(format!("{label} HTTP client: {e}")))?;
        Ok(Self {
            label,
            url,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> String {
        redacted_endpoint(&self.url)
    }

    /// JSON-RPC error objects become `SubmissionRejected` with the provider's reason.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                AppError::Connection(format!("{} {method} request failed: {e}", self.label))
            })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            AppError::Connection(format!("{} {method} body read failed: {e}", self.label))
        })?;

        // Some bundlers pair a non-2xx status with a well-formed JSON-RPC error.
        let parsed: RpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(AppError::Connection(format!(
                    "{} {method} returned malformed JSON: {e}",
                    self.label
                )));
            }
            Err(_) => {
                return Err(AppError::Connection(format!(
                    "{} {method} responded with HTTP {status}",
                    self.label
                )));
            }
        };

        if let Some(err) = parsed.error {
            tracing::debug!(
                target: "rpc",
                endpoint = %self.endpoint(),
                method,
                code = err.code,
                message = %err.message,
                "JSON-RPC error"
            );
            return Err(AppError::SubmissionRejected {
                code: err.code,
                reason: err.reason(),
            });
        }

        serde_json::from_value(parsed.result.unwrap_or(Value::Null)).map_err(|e| {
            AppError::Connection(format!(
                "{} {method} result did not match expected shape: {e}",
                self.label
            ))
        })
    }
}
