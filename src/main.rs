// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use rescue_ledger::app::config::Settings;
use rescue_ledger::app::logging::setup_logging;
use rescue_ledger::common::parsing::{parse_b256_hex, parse_symbol_list};
use rescue_ledger::domain::error::AppError;
use rescue_ledger::domain::tokens::{TOKEN_CATALOG, catalog_symbols};
use rescue_ledger::infrastructure::network::ledger::RpcLedger;
use rescue_ledger::infrastructure::network::provider::ConnectionFactory;
use rescue_ledger::services::rescue::agents::AgentStrategy;
use rescue_ledger::services::rescue::reads::RescueLedgerReader;
use rescue_ledger::services::rescue::{RescueRecord, RescueSession, Selection, SubmissionStage};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "rescue ledger")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Board tokens into the lifeboat and record the rescue on-chain
    Rescue {
        /// Comma or space separated symbols, boarded in order
        #[arg(long, required = true, num_args = 1..)]
        symbols: Vec<String>,
        /// Mark the record as agent-made
        #[arg(long, default_value_t = false)]
        agent: bool,
    },
    /// Let an agent pick and record
    Agent {
        #[arg(long, default_value = "random")]
        strategy: String,
        /// Number of rounds; 0 runs until interrupted
        #[arg(long, default_value_t = 1)]
        rounds: u32,
        /// Seconds between rounds (default: strategy interval)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Send the fixed WARMUP record through the sponsored path
    Warmup,
    /// Read per-symbol rescue counts
    Counts {
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Show the most recent rescue recorded by an address
    Last { address: String },
    /// Global rescue totals, plus per-user totals when an address is given
    Stats {
        #[arg(long)]
        user: Option<String>,
    },
    /// List Rescued events emitted since a block
    Recent {
        #[arg(long, default_value_t = 0)]
        from_block: u64,
    },
    /// Print the explorer link for a user operation hash
    Track { hash: String },
    /// Show the smart account used for submissions
    Account,
    /// List boardable tokens
    Catalog,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountView {
    address: String,
    owner: String,
    deployed: bool,
    explorer_url: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Unknown(anyhow::anyhow!("render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn parse_user(raw: &str) -> Result<Address, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidAddress(raw.to_string()))
}

fn ledger_reader(settings: &Settings) -> Result<RescueLedgerReader, AppError> {
    let provider = ConnectionFactory::http(&settings.rpc_url()?)?;
    Ok(RescueLedgerReader::new(
        Arc::new(RpcLedger::new(provider)),
        settings.rescue_log_address()?,
    ))
}

fn board(symbols: &[String], capacity: u64) -> Result<Selection, AppError> {
    let mut selection = Selection::new(capacity);
    for raw in symbols {
        for symbol in parse_symbol_list(raw) {
            if !selection.add_symbol(&symbol)? {
                tracing::warn!(
                    target: "rescue",
                    %symbol,
                    used = selection.used_weight(),
                    capacity,
                    "Token did not board"
                );
            }
        }
    }
    Ok(selection)
}

/// Logs stage changes until the session goes quiet.
fn spawn_stage_logger(session: &RescueSession) -> tokio::task::JoinHandle<()> {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let stage = *rx.borrow_and_update();
            if stage != SubmissionStage::Idle {
                tracing::info!(target: "rescue", stage = stage.label(), "Stage");
            }
        }
    })
}

async fn submit(session: &RescueSession, record: RescueRecord) -> Result<(), AppError> {
    let result = session.rescue(record).await?;
    print_json(&result)
}

async fn run_agent(
    session: &RescueSession,
    strategy: AgentStrategy,
    capacity: u64,
    rounds: u32,
    interval: Duration,
) -> Result<(), AppError> {
    let mut round: u32 = 0;
    loop {
        round += 1;
        let selection = strategy.select(&mut rand::thread_rng(), capacity);
        match RescueRecord::from_selection(&selection, true) {
            Ok(record) => {
                if let Err(e) = submit(session, record).await {
                    tracing::warn!(target: "rescue", strategy = %strategy, round, error = %e, "Agent round failed");
                }
            }
            Err(e) => {
                tracing::warn!(target: "rescue", strategy = %strategy, round, error = %e, "Agent picked nothing");
            }
        }
        if rounds != 0 && round >= rounds {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "rescue", round, "Agent stopped");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    if matches!(cli.command, Command::Catalog) {
        return print_json(&TOKEN_CATALOG.to_vec());
    }

    let settings = Settings::load_with_path(cli.config.as_deref())?;
    setup_logging(settings.log_level(), settings.log_json);

    match cli.command {
        Command::Catalog => Ok(()),
        Command::Track { hash } => {
            let hash = parse_b256_hex(&hash)
                .ok_or_else(|| AppError::invalid("hash", "expected a 32-byte hex hash"))?;
            println!("{}", settings.tracking_urls()?.user_op_url(&hash.to_string())?);
            Ok(())
        }
        Command::Counts { symbols } => {
            let symbols = symbols
                .as_deref()
                .map(parse_symbol_list)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(catalog_symbols);
            print_json(&ledger_reader(&settings)?.counts(&symbols).await?)
        }
        Command::Last { address } => {
            let user = parse_user(&address)?;
            match ledger_reader(&settings)?.last_rescue(user).await? {
                Some(last) => print_json(&last),
                None => {
                    tracing::info!(target: "rescue", %user, "No rescue recorded");
                    Ok(())
                }
            }
        }
        Command::Stats { user } => {
            let reader = ledger_reader(&settings)?;
            print_json(&reader.global_stats().await?)?;
            match user {
                Some(raw) => print_json(&reader.user_stats(parse_user(&raw)?).await?),
                None => Ok(()),
            }
        }
        Command::Recent { from_block } => {
            let entries = ledger_reader(&settings)?.rescued_events(from_block).await?;
            tracing::info!(target: "rescue", from_block, count = entries.len(), "Rescued events");
            print_json(&entries)
        }
        Command::Account => {
            let session = RescueSession::from_settings(&settings)?;
            let ctx = session.context().await?;
            let urls = session.orchestrator().tracking();
            print_json(&AccountView {
                address: ctx.account.address().to_checksum(None),
                owner: ctx.account.owner_address().to_checksum(None),
                deployed: ctx.account.is_deployed(),
                explorer_url: urls.address_url(&ctx.account.address()),
            })
        }
        Command::Warmup => {
            let session = RescueSession::from_settings(&settings)?;
            let logger = spawn_stage_logger(&session);
            let outcome = submit(&session, RescueRecord::warmup()).await;
            logger.abort();
            outcome
        }
        Command::Rescue { symbols, agent } => {
            let selection = board(&symbols, settings.capacity)?;
            let record = RescueRecord::from_selection(&selection, agent)?;
            let session = RescueSession::from_settings(&settings)?;
            let logger = spawn_stage_logger(&session);
            let outcome = submit(&session, record).await;
            logger.abort();
            session.orchestrator().stats().log_summary();
            outcome
        }
        Command::Agent {
            strategy,
            rounds,
            interval_secs,
        } => {
            let strategy: AgentStrategy = strategy.parse()?;
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| strategy.interval());
            tracing::info!(
                target: "rescue",
                strategy = %strategy,
                description = strategy.description(),
                rounds,
                interval_secs = interval.as_secs(),
                "Agent starting"
            );
            let session = RescueSession::from_settings(&settings)?;
            let logger = spawn_stage_logger(&session);
            let outcome = run_agent(&session, strategy, settings.capacity, rounds, interval).await;
            logger.abort();
            session.orchestrator().stats().log_summary();
            outcome
        }
    }
}
