// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled jobs for Pitstop.
//!
//! [`SurveyJobs`] holds the two batch jobs (first survey messages and
//! resends of failed sends); [`run_scheduler`] fires them on their cron
//! patterns until cancelled. The binary also runs each job once on demand.

pub mod jobs;
pub mod scheduler;

pub use jobs::{BatchReport, SurveyJobs, sqlite_timestamp};
pub use scheduler::{next_fire, parse_schedule, run_scheduler};
