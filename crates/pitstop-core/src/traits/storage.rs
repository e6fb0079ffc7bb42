// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the survey store.

use async_trait::async_trait;

use crate::error::PitstopError;
use crate::records::{
    Customer, FollowUpItem, FollowUpUpdate, IssueType, MessageLog, NewCustomer, NewMessageLog,
    NewServiceVisit, PositiveRemark, ServiceVisit, Survey, SurveyFilter, SurveyOutcome,
    SurveyStats,
};
use crate::traits::adapter::PluginAdapter;
use crate::types::{Conversation, Language};

/// Adapter for the survey store.
///
/// Persists customers, service visits, surveys, follow-up items, positive
/// remarks and the SMS message log. Lookups that can miss return
/// `Ok(None)`; updates that can miss return `Ok(false)`.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), PitstopError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PitstopError>;

    // --- Customers ---

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, PitstopError>;

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>, PitstopError>;

    /// Finds the customer registered under an exact phone number.
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, PitstopError>;

    // --- Service visits ---

    async fn create_service_visit(
        &self,
        visit: &NewServiceVisit,
    ) -> Result<ServiceVisit, PitstopError>;

    async fn get_service_visit(&self, id: i64) -> Result<Option<ServiceVisit>, PitstopError>;

    /// The customer's most recent visit by service date.
    async fn latest_visit_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Option<ServiceVisit>, PitstopError>;

    /// Visits completed inside `[from, to]` that have no survey yet.
    async fn visits_awaiting_survey(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<ServiceVisit>, PitstopError>;

    // --- Surveys ---

    /// Creates the survey record for a visit. The conversation starts unset.
    async fn create_survey(
        &self,
        service_visit_id: i64,
        language: Language,
    ) -> Result<Survey, PitstopError>;

    async fn get_survey(&self, id: i64) -> Result<Option<Survey>, PitstopError>;

    async fn survey_for_visit(&self, service_visit_id: i64)
    -> Result<Option<Survey>, PitstopError>;

    async fn list_surveys(&self, filter: &SurveyFilter) -> Result<Vec<Survey>, PitstopError>;

    /// Replaces the stored transcript.
    async fn save_conversation(
        &self,
        survey_id: i64,
        conversation: &Conversation,
    ) -> Result<(), PitstopError>;

    /// Writes extracted ratings, language and callback flag and marks the survey completed.
    async fn complete_survey(
        &self,
        survey_id: i64,
        outcome: &SurveyOutcome,
    ) -> Result<(), PitstopError>;

    async fn update_callback(
        &self,
        survey_id: i64,
        callback_completed: bool,
        callback_notes: Option<&str>,
    ) -> Result<bool, PitstopError>;

    async fn survey_stats(&self) -> Result<SurveyStats, PitstopError>;

    // --- Follow-up items ---

    async fn insert_follow_up_item(
        &self,
        survey_id: i64,
        issue_type: IssueType,
        description: &str,
    ) -> Result<i64, PitstopError>;

    async fn follow_up_items_for_survey(
        &self,
        survey_id: i64,
    ) -> Result<Vec<FollowUpItem>, PitstopError>;

    async fn update_follow_up_item(
        &self,
        id: i64,
        update: &FollowUpUpdate,
    ) -> Result<Option<FollowUpItem>, PitstopError>;

    // --- Positive remarks ---

    async fn insert_positive_remark(
        &self,
        survey_id: i64,
        employee_name: Option<&str>,
        comment: &str,
    ) -> Result<i64, PitstopError>;

    async fn positive_remarks_for_survey(
        &self,
        survey_id: i64,
    ) -> Result<Vec<PositiveRemark>, PitstopError>;

    // --- Message log ---

    async fn insert_message_log(&self, log: &NewMessageLog) -> Result<i64, PitstopError>;

    /// Sets the status of every log row carrying `message_sid`. Returns false when none matched.
    async fn update_message_status(
        &self,
        message_sid: &str,
        status: &str,
    ) -> Result<bool, PitstopError>;

    /// Outbound rows in `failed`/`undelivered` sent at or after `since` with fewer
    /// than `max_retries` retries.
    async fn retry_candidates(
        &self,
        since: &str,
        max_retries: u32,
    ) -> Result<Vec<MessageLog>, PitstopError>;

    /// Every log row for a visit, oldest first.
    async fn message_logs_for_visit(
        &self,
        service_visit_id: i64,
    ) -> Result<Vec<MessageLog>, PitstopError>;

    async fn mark_message_retried(&self, id: i64) -> Result<(), PitstopError>;
}
