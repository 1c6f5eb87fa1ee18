// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const NOISY_MODULES: &str =
    "h2=info,hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info,alloy_rpc_client=info";

/// Expands a bare level (e.g. "debug") with quiet defaults for transport crates.
/// Directive strings containing ',' or '=' pass through untouched.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        return format!("info,{NOISY_MODULES}");
    }
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},{NOISY_MODULES}")
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init().is_ok()
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).try_init().is_ok()
    };

    if installed {
        let base = spec.split(',').next().unwrap_or("info");
        tracing::debug!(
            base,
            format = if json_format { "json" } else { "compact" },
            "Logging initialized"
        );
    }
}
