// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database models.
//!
//! Row types live in `pitstop-core` so the workflow and HTTP crates can use
//! them without depending on SQLite.

pub use pitstop_core::records::{
    AverageRatings, Customer, FollowUpItem, FollowUpStatus, FollowUpUpdate, IssueType, MessageDirection,
    MessageLog, NewCustomer, NewMessageLog, NewServiceVisit, PositiveRemark, Ratings, ServiceVisit,
    Survey, SurveyFilter, SurveyOutcome, SurveyStats, message_status,
};
