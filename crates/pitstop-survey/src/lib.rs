// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The SMS service-survey workflow.
//!
//! - [`phase`]: phase derivation from turn counts
//! - [`scripts`]: scripted English and Spanish wording
//! - [`language`]: English/Spanish detection
//! - [`engine`]: the per-turn state machine
//! - [`extraction`]: structured results from a finished transcript
//! - [`commit`]: writing results to the store
//! - [`service`]: webhook and job entry points

pub mod commit;
pub mod engine;
pub mod extraction;
pub mod language;
pub mod phase;
pub mod scripts;
pub mod service;

pub use commit::{CommitReport, commit_survey_result};
pub use engine::{ConversationEngine, TurnAction, TurnOutcome};
pub use extraction::{SurveyExtractor, SurveyResult};
pub use language::LanguageDetector;
pub use phase::{SurveyPhase, phase_of};
pub use service::{IgnoreReason, InboundOutcome, ResendOutcome, SurveyService};
