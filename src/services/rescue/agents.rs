// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Automated picks. Agent submissions go through the same pipeline as manual
//! ones with `byAgent = true`.

use crate::common::error::AppError;
use crate::domain::tokens::{TOKEN_CATALOG, Token, find_token};
use crate::services::rescue::selection::Selection;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const BLUE_CHIPS: [&str; 2] = ["ETH", "SOL"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStrategy {
    /// One catalog token, uniformly at random.
    Random,
    /// ETH then SOL, as far as capacity allows.
    BlueChips,
}

impl AgentStrategy {
    pub const ALL: [AgentStrategy; 2] = [AgentStrategy::Random, AgentStrategy::BlueChips];

    pub fn id(&self) -> &'static str {
        match self {
            AgentStrategy::Random => "random",
            AgentStrategy::BlueChips => "blue-chips",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentStrategy::Random => "Rescues one random token",
            AgentStrategy::BlueChips => "Rescues the blue chips (ETH, SOL)",
        }
    }

    /// Default pause between rounds when the agent runs continuously.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(60 * 60)
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&'static Token> {
        match self {
            AgentStrategy::Random => TOKEN_CATALOG.choose(rng).into_iter().collect(),
            AgentStrategy::BlueChips => BLUE_CHIPS.iter().filter_map(|s| find_token(s)).collect(),
        }
    }

    /// Boards the picks in order; picks that do not fit are dropped.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R, capacity: u64) -> Selection {
        let mut selection = Selection::new(capacity);
        for token in self.pick(rng) {
            selection.add(token);
        }
        tracing::debug!(
            target: "rescue",
            strategy = self.id(),
            symbols = ?selection.symbols(),
            weight = selection.used_weight(),
            "Agent picked"
        );
        selection
    }
}

impl fmt::Display for AgentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AgentStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "random" => Ok(AgentStrategy::Random),
            "blue-chips" | "bluechips" => Ok(AgentStrategy::BlueChips),
            other => Err(AppError::invalid(
                "strategy",
                format!("unknown agent strategy {other} (random, blue-chips)"),
            )),
        }
    }
}
