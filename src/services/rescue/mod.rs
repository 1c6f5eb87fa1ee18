// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod account;
pub mod agents;
pub mod gas;
pub mod hasher;
pub mod orchestrator;
pub mod reads;
pub mod record;
pub mod selection;
pub mod session;
pub mod stats;
pub mod tracking;

pub use orchestrator::{ReceiptMode, RescueOrchestrator, SubmissionPolicy, SubmissionStage};
pub use record::{RescueRecord, SubmissionResult};
pub use selection::Selection;
pub use session::{ContextFactory, RescueSession, SubmissionContext};
