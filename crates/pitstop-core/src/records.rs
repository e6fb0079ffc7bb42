// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent record types shared by the store, the survey workflow and the API.
//!
//! Timestamps are ISO-8601 strings as written by SQLite's
//! `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::types::{Conversation, Language};

/// A dealership customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub preferred_language: Language,
    pub created_at: String,
    pub updated_at: String,
}

/// Intake payload for a new customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub preferred_language: Language,
}

/// A completed (or in-progress) service visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceVisit {
    pub id: i64,
    pub customer_id: i64,
    pub service_date: String,
    pub service_type: String,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<i64>,
    pub vin: Option<String>,
    pub service_advisor: Option<String>,
    pub technician: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Intake payload for a new service visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceVisit {
    pub customer_id: i64,
    pub service_date: String,
    pub service_type: String,
    #[serde(default)]
    pub vehicle_make: Option<String>,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    #[serde(default)]
    pub vehicle_year: Option<i64>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub service_advisor: Option<String>,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// The four survey ratings, each an integer in `0..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub overall_satisfaction: u8,
    pub workmanship_quality: u8,
    pub service_timeliness: u8,
    pub staff_friendliness: u8,
}

impl Ratings {
    pub fn as_array(&self) -> [u8; 4] {
        [
            self.overall_satisfaction,
            self.workmanship_quality,
            self.service_timeliness,
            self.staff_friendliness,
        ]
    }

    /// Lowest of the four ratings.
    pub fn min(&self) -> u8 {
        self.as_array().into_iter().min().unwrap_or(0)
    }
}

/// A survey record, one per service visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: i64,
    pub service_visit_id: i64,
    pub call_timestamp: String,
    pub completed: bool,
    pub language_used: Language,
    pub overall_satisfaction: Option<i64>,
    pub workmanship_quality: Option<i64>,
    pub service_timeliness: Option<i64>,
    pub staff_friendliness: Option<i64>,
    pub callback_needed: bool,
    pub callback_completed: bool,
    pub callback_notes: Option<String>,
    pub conversation: Option<Conversation>,
    pub created_at: String,
    pub updated_at: String,
}

/// Values written to a survey when extraction succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyOutcome {
    pub ratings: Ratings,
    pub language: Language,
    pub callback_needed: bool,
}

/// Category of a follow-up issue raised during a survey.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueType {
    BillingDispute,
    MechanicalIssue,
    WarrantyQuestion,
    ServiceLogistics,
    SafetyConcern,
}

impl IssueType {
    /// Billing, safety and warranty issues always need a human callback.
    pub fn requires_callback(self) -> bool {
        matches!(
            self,
            IssueType::BillingDispute | IssueType::SafetyConcern | IssueType::WarrantyQuestion
        )
    }
}

/// Workflow state of a follow-up item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FollowUpStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
}

/// An issue routed to staff for follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpItem {
    pub id: i64,
    pub survey_id: i64,
    pub issue_type: IssueType,
    pub issue_description: String,
    pub status: FollowUpStatus,
    pub assigned_to: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update to a follow-up item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpUpdate {
    pub status: FollowUpStatus,
    pub assigned_to: Option<String>,
    pub resolved_at: Option<String>,
}

/// Praise for a staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositiveRemark {
    pub id: i64,
    pub survey_id: i64,
    pub employee_name: Option<String>,
    pub comment: String,
    pub created_at: String,
}

/// Direction of a logged SMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

/// Well-known message-log statuses. Twilio may report others, which are stored verbatim.
pub mod message_status {
    pub const RECEIVED: &str = "received";
    pub const SENT: &str = "sent";
    pub const FAILED: &str = "failed";
    pub const UNDELIVERED: &str = "undelivered";
    pub const RETRIED: &str = "retried";
}

/// One logged SMS, inbound or outbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLog {
    pub id: i64,
    pub service_visit_id: Option<i64>,
    pub message_sid: Option<String>,
    pub message_body: String,
    pub direction: MessageDirection,
    pub message_step: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub status: String,
    pub sent_at: String,
    pub retries_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageLog {
    pub service_visit_id: Option<i64>,
    pub message_sid: Option<String>,
    pub message_body: String,
    pub direction: MessageDirection,
    pub message_step: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub status: String,
    pub retries_count: u32,
}

/// Dashboard filter for survey listings. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyFilter {
    pub completed: Option<bool>,
    pub callback_needed: Option<bool>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    /// Lower bound on overall satisfaction.
    pub min_rating: Option<i64>,
    /// Upper bound on overall satisfaction.
    pub max_rating: Option<i64>,
}

/// Mean ratings over completed surveys; `None` when nothing is rated yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageRatings {
    pub overall_satisfaction: Option<f64>,
    pub workmanship_quality: Option<f64>,
    pub service_timeliness: Option<f64>,
    pub staff_friendliness: Option<f64>,
}

/// Aggregate dashboard numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyStats {
    pub total_surveys: i64,
    pub completed_surveys: i64,
    pub average_ratings: AverageRatings,
    pub callback_needed: i64,
    pub follow_up_counts: BTreeMap<IssueType, i64>,
}
