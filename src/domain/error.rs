// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Calldata encoding failed for {function}: {reason}")]
    Encoding { function: String, reason: String },

    /// Never surfaced to callers; the orchestrator logs it and keeps going.
    #[error("Simulation warning: {0}")]
    Simulation(String),

    #[error("{stage} timed out after {timeout_ms}ms")]
    SubmissionTimeout { stage: String, timeout_ms: u64 },

    #[error("Operation rejected (code {code}): {reason}")]
    SubmissionRejected { code: i64, reason: String },

    #[error("No receipt for user operation {user_op_hash} within {timeout_ms}ms")]
    ReceiptTimeout {
        user_op_hash: String,
        timeout_ms: u64,
    },

    #[error("Transaction failed: {hash}, reason: {reason}")]
    Transaction { hash: String, reason: String },

    #[error("A rescue submission is already in flight")]
    SubmissionInFlight,

    #[error("Selection is empty")]
    EmptySelection,

    #[error("Invalid argument {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Address {0} is invalid or not checksummed")]
    InvalidAddress(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidArgument {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Errors a user can resolve by clicking "record" again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::SubmissionTimeout { .. }
                | AppError::SubmissionRejected { .. }
                | AppError::Connection(_)
                | AppError::SubmissionInFlight
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
