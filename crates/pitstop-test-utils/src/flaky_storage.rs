// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper that fails selected inserts.
//!
//! `FlakyStorage` forwards every call to an inner [`StorageAdapter`] except
//! follow-up item inserts for the issue types it was told to reject. Every
//! insert attempt is counted, including the rejected ones.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use pitstop_core::records::{
    Customer, FollowUpItem, FollowUpUpdate, IssueType, MessageLog, NewCustomer, NewMessageLog,
    NewServiceVisit, PositiveRemark, ServiceVisit, Survey, SurveyFilter, SurveyOutcome,
    SurveyStats,
};
use pitstop_core::traits::adapter::PluginAdapter;
use pitstop_core::traits::storage::StorageAdapter;
use pitstop_core::types::{AdapterType, Conversation, HealthStatus, Language};
use pitstop_core::PitstopError;

pub struct FlakyStorage {
    inner: Arc<dyn StorageAdapter>,
    rejected: HashSet<IssueType>,
    follow_up_attempts: AtomicUsize,
    remark_attempts: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            rejected: HashSet::new(),
            follow_up_attempts: AtomicUsize::new(0),
            remark_attempts: AtomicUsize::new(0),
        }
    }

    /// Makes every follow-up insert of `issue_type` fail with a storage error.
    pub fn reject_follow_ups(mut self, issue_type: IssueType) -> Self {
        self.rejected.insert(issue_type);
        self
    }

    /// Follow-up inserts attempted so far, failed ones included.
    pub fn follow_up_attempts(&self) -> usize {
        self.follow_up_attempts.load(Ordering::SeqCst)
    }

    pub fn remark_attempts(&self) -> usize {
        self.remark_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for FlakyStorage {
    fn name(&self) -> &str {
        "flaky-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PitstopError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), PitstopError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FlakyStorage {
    async fn initialize(&self) -> Result<(), PitstopError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), PitstopError> {
        self.inner.close().await
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, PitstopError> {
        self.inner.create_customer(customer).await
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>, PitstopError> {
        self.inner.get_customer(id).await
    }

    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, PitstopError> {
        self.inner.find_customer_by_phone(phone).await
    }

    async fn create_service_visit(
        &self,
        visit: &NewServiceVisit,
    ) -> Result<ServiceVisit, PitstopError> {
        self.inner.create_service_visit(visit).await
    }

    async fn get_service_visit(&self, id: i64) -> Result<Option<ServiceVisit>, PitstopError> {
        self.inner.get_service_visit(id).await
    }

    async fn latest_visit_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Option<ServiceVisit>, PitstopError> {
        self.inner.latest_visit_for_customer(customer_id).await
    }

    async fn visits_awaiting_survey(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<ServiceVisit>, PitstopError> {
        self.inner.visits_awaiting_survey(from, to).await
    }

    async fn create_survey(
        &self,
        service_visit_id: i64,
        language: Language,
    ) -> Result<Survey, PitstopError> {
        self.inner.create_survey(service_visit_id, language).await
    }

    async fn get_survey(&self, id: i64) -> Result<Option<Survey>, PitstopError> {
        self.inner.get_survey(id).await
    }

    async fn survey_for_visit(
        &self,
        service_visit_id: i64,
    ) -> Result<Option<Survey>, PitstopError> {
        self.inner.survey_for_visit(service_visit_id).await
    }

    async fn list_surveys(&self, filter: &SurveyFilter) -> Result<Vec<Survey>, PitstopError> {
        self.inner.list_surveys(filter).await
    }

    async fn save_conversation(
        &self,
        survey_id: i64,
        conversation: &Conversation,
    ) -> Result<(), PitstopError> {
        self.inner.save_conversation(survey_id, conversation).await
    }

    async fn complete_survey(
        &self,
        survey_id: i64,
        outcome: &SurveyOutcome,
    ) -> Result<(), PitstopError> {
        self.inner.complete_survey(survey_id, outcome).await
    }

    async fn update_callback(
        &self,
        survey_id: i64,
        callback_completed: bool,
        callback_notes: Option<&str>,
    ) -> Result<bool, PitstopError> {
        self.inner
            .update_callback(survey_id, callback_completed, callback_notes)
            .await
    }

    async fn survey_stats(&self) -> Result<SurveyStats, PitstopError> {
        self.inner.survey_stats().await
    }

    async fn insert_follow_up_item(
        &self,
        survey_id: i64,
        issue_type: IssueType,
        description: &str,
    ) -> Result<i64, PitstopError> {
        self.follow_up_attempts.fetch_add(1, Ordering::SeqCst);
        if self.rejected.contains(&issue_type) {
            return Err(PitstopError::Storage {
                source: format!("rejected {issue_type} insert").into(),
            });
        }
        self.inner
            .insert_follow_up_item(survey_id, issue_type, description)
            .await
    }

    async fn follow_up_items_for_survey(
        &self,
        survey_id: i64,
    ) -> Result<Vec<FollowUpItem>, PitstopError> {
        self.inner.follow_up_items_for_survey(survey_id).await
    }

    async fn update_follow_up_item(
        &self,
        id: i64,
        update: &FollowUpUpdate,
    ) -> Result<Option<FollowUpItem>, PitstopError> {
        self.inner.update_follow_up_item(id, update).await
    }

    async fn insert_positive_remark(
        &self,
        survey_id: i64,
        employee_name: Option<&str>,
        comment: &str,
    ) -> Result<i64, PitstopError> {
        self.remark_attempts.fetch_add(1, Ordering::SeqCst);
        self.inner
            .insert_positive_remark(survey_id, employee_name, comment)
            .await
    }

    async fn positive_remarks_for_survey(
        &self,
        survey_id: i64,
    ) -> Result<Vec<PositiveRemark>, PitstopError> {
        self.inner.positive_remarks_for_survey(survey_id).await
    }

    async fn insert_message_log(&self, log: &NewMessageLog) -> Result<i64, PitstopError> {
        self.inner.insert_message_log(log).await
    }

    async fn update_message_status(
        &self,
        message_sid: &str,
        status: &str,
    ) -> Result<bool, PitstopError> {
        self.inner.update_message_status(message_sid, status).await
    }

    async fn retry_candidates(
        &self,
        since: &str,
        max_retries: u32,
    ) -> Result<Vec<MessageLog>, PitstopError> {
        self.inner.retry_candidates(since, max_retries).await
    }

    async fn message_logs_for_visit(
        &self,
        service_visit_id: i64,
    ) -> Result<Vec<MessageLog>, PitstopError> {
        self.inner.message_logs_for_visit(service_visit_id).await
    }

    async fn mark_message_retried(&self, id: i64) -> Result<(), PitstopError> {
        self.inner.mark_message_retried(id).await
    }
}
