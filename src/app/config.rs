// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::strip_0x;
use crate::domain::constants::{
    CHAIN_MONAD_TESTNET, DEFAULT_ADDRESS_URL_TEMPLATE, DEFAULT_CAPACITY,
    DEFAULT_RECEIPT_POLL_MS, DEFAULT_RECEIPT_TIMEOUT_MS, DEFAULT_SIMULATE_TIMEOUT_MS,
    DEFAULT_SUBMIT_TIMEOUT_MS, DEFAULT_TRACKING_URL_TEMPLATE, ENTRY_POINT_V07,
    GAS_PRICE_QUERY_ATTEMPTS, GAS_PRICE_QUERY_BACKOFF_MS, GAS_PRICE_QUERY_TIMEOUT_MS,
    pimlico_bundler_url,
};
use crate::domain::error::AppError;
use crate::services::rescue::gas::GasEstimator;
use crate::services::rescue::orchestrator::{ReceiptMode, SubmissionPolicy};
use crate::services::rescue::tracking::TrackingUrls;
use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    // General
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // Endpoints
    pub rpc_url: Option<String>,
    pub bundler_url: Option<String>,
    pub paymaster_url: Option<String>,
    pub pimlico_api_key: Option<String>,
    /// Forwarded as `sponsorshipPolicyId` in the paymaster context.
    pub sponsorship_policy_id: Option<String>,

    // Contracts
    pub rescue_log_address: Option<String>,
    pub entry_point_address: Option<String>,
    pub account_factory_address: Option<String>,
    #[serde(default)]
    pub account_salt: u64,

    // Identity
    pub owner_key: Option<String>,

    // Links
    #[serde(default = "default_tracking_url_template")]
    pub tracking_url_template: String,
    #[serde(default = "default_address_url_template")]
    pub address_url_template: String,

    // Game
    #[serde(default = "default_capacity")]
    pub capacity: u64,

    // Submission
    #[serde(default = "default_simulate_timeout_ms")]
    pub simulate_timeout_ms: u64,
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
    #[serde(default)]
    pub receipt_mode: ReceiptMode,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,

    // Gas price
    #[serde(default = "default_gas_price_attempts")]
    pub gas_price_attempts: usize,
    #[serde(default = "default_gas_price_backoff_ms")]
    pub gas_price_backoff_ms: u64,
    #[serde(default = "default_gas_price_timeout_ms")]
    pub gas_price_timeout_ms: u64,
}

// Defaults
fn default_chain_id() -> u64 {
    CHAIN_MONAD_TESTNET
}
fn default_tracking_url_template() -> String {
    DEFAULT_TRACKING_URL_TEMPLATE.to_string()
}
fn default_address_url_template() -> String {
    DEFAULT_ADDRESS_URL_TEMPLATE.to_string()
}
fn default_capacity() -> u64 {
    DEFAULT_CAPACITY
}
fn default_simulate_timeout_ms() -> u64 {
    DEFAULT_SIMULATE_TIMEOUT_MS
}
fn default_submit_timeout_ms() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT_MS
}
fn default_receipt_timeout_ms() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_MS
}
fn default_receipt_poll_ms() -> u64 {
    DEFAULT_RECEIPT_POLL_MS
}
fn default_gas_price_attempts() -> usize {
    GAS_PRICE_QUERY_ATTEMPTS
}
fn default_gas_price_backoff_ms() -> u64 {
    GAS_PRICE_QUERY_BACKOFF_MS
}
fn default_gas_price_timeout_ms() -> u64 {
    GAS_PRICE_QUERY_TIMEOUT_MS
}

impl Settings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: env/.env > selected file.
        builder = builder.add_source(Environment::default());

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolves every required value once so a broken deployment fails at startup.
    pub fn validate(&self) -> Result<(), AppError> {
        self.rpc_url()?;
        self.bundler_url()?;
        self.paymaster_url()?;
        self.rescue_log_address()?;
        self.entry_point_address()?;
        self.account_factory_address()?;
        self.owner_signer()?;
        self.tracking_urls()?;
        if self.capacity == 0 {
            return Err(AppError::Config("CAPACITY must be greater than zero".into()));
        }
        if self.chain_id == 0 {
            return Err(AppError::Config("CHAIN_ID must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> Result<Url, AppError> {
        parse_url("RPC_URL", required("RPC_URL", self.rpc_url.as_deref())?)
    }

    /// Explicit `BUNDLER_URL` wins; otherwise derived from `PIMLICO_API_KEY`.
    pub fn bundler_url(&self) -> Result<Url, AppError> {
        if let Some(raw) = non_empty(self.bundler_url.as_deref()) {
            return parse_url("BUNDLER_URL", raw);
        }
        match non_empty(self.pimlico_api_key.as_deref()) {
            Some(key) => parse_url(
                "PIMLICO_API_KEY",
                &pimlico_bundler_url(self.chain_id, key),
            ),
            None => Err(AppError::Config(
                "BUNDLER_URL is missing (set BUNDLER_URL or PIMLICO_API_KEY)".into(),
            )),
        }
    }

    pub fn paymaster_url(&self) -> Result<Url, AppError> {
        match non_empty(self.paymaster_url.as_deref()) {
            Some(raw) => parse_url("PAYMASTER_URL", raw),
            None => self.bundler_url(),
        }
    }

    pub fn rescue_log_address(&self) -> Result<Address, AppError> {
        parse_address(
            "RESCUE_LOG_ADDRESS",
            required("RESCUE_LOG_ADDRESS", self.rescue_log_address.as_deref())?,
        )
    }

    pub fn entry_point_address(&self) -> Result<Address, AppError> {
        match non_empty(self.entry_point_address.as_deref()) {
            Some(raw) => parse_address("ENTRY_POINT_ADDRESS", raw),
            None => Ok(ENTRY_POINT_V07),
        }
    }

    pub fn account_factory_address(&self) -> Result<Address, AppError> {
        parse_address(
            "ACCOUNT_FACTORY_ADDRESS",
            required(
                "ACCOUNT_FACTORY_ADDRESS",
                self.account_factory_address.as_deref(),
            )?,
        )
    }

    pub fn account_salt(&self) -> U256 {
        U256::from(self.account_salt)
    }

    pub fn owner_signer(&self) -> Result<PrivateKeySigner, AppError> {
        let raw = required("OWNER_KEY", self.owner_key.as_deref())?;
        PrivateKeySigner::from_str(strip_0x(raw))
            .map_err(|e| AppError::Config(format!("OWNER_KEY is invalid: {e}")))
    }

    pub fn tracking_urls(&self) -> Result<TrackingUrls, AppError> {
        TrackingUrls::new(&self.tracking_url_template, &self.address_url_template)
    }

    pub fn submission_policy(&self) -> SubmissionPolicy {
        SubmissionPolicy {
            simulate_timeout: Duration::from_millis(self.simulate_timeout_ms.max(1)),
            submit_timeout: Duration::from_millis(self.submit_timeout_ms.max(1)),
            receipt_mode: self.receipt_mode,
            receipt_timeout: Duration::from_millis(self.receipt_timeout_ms.max(1)),
            receipt_poll: Duration::from_millis(self.receipt_poll_ms.max(100)),
        }
    }

    pub fn gas_estimator(&self) -> GasEstimator {
        GasEstimator::new(
            self.gas_price_attempts,
            Duration::from_millis(self.gas_price_backoff_ms),
            Duration::from_millis(self.gas_price_timeout_ms.max(1)),
        )
    }

    pub fn paymaster_context(&self) -> serde_json::Value {
        match non_empty(self.sponsorship_policy_id.as_deref()) {
            Some(id) => serde_json::json!({ "sponsorshipPolicyId": id }),
            None => serde_json::json!({}),
        }
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(key: &str, raw: Option<&'a str>) -> Result<&'a str, AppError> {
    non_empty(raw).ok_or_else(|| AppError::Config(format!("{key} is missing")))
}

fn parse_url(key: &str, raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw).map_err(|e| AppError::Config(format!("{key} is invalid: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Config(format!(
            "{key} must be http(s), got scheme {other}"
        ))),
    }
}

fn parse_address(key: &str, raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::Config(format!("{key} is not an address: {raw}")))
}
