// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use pitstop_config::model::StorageConfig;
use pitstop_core::{
    AdapterType, Conversation, HealthStatus, Language, PitstopError, PluginAdapter, StorageAdapter,
};

use crate::database::{self, Database};
use crate::models::{
    Customer, FollowUpItem, FollowUpUpdate, IssueType, MessageLog, NewCustomer, NewMessageLog,
    NewServiceVisit, PositiveRemark, ServiceVisit, Survey, SurveyFilter, SurveyOutcome,
    SurveyStats,
};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened by
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, PitstopError> {
        self.db.get().ok_or_else(|| PitstopError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PitstopError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PitstopError> {
        if let Some(db) = self.db.get() {
            database::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PitstopError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| PitstopError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PitstopError> {
        database::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Customers ---

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, PitstopError> {
        queries::customers::create_customer(self.db()?, customer).await
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>, PitstopError> {
        queries::customers::get_customer(self.db()?, id).await
    }

    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, PitstopError> {
        queries::customers::find_by_phone(self.db()?, phone).await
    }

    // --- Service visits ---

    async fn create_service_visit(
        &self,
        visit: &NewServiceVisit,
    ) -> Result<ServiceVisit, PitstopError> {
        queries::visits::create_visit(self.db()?, visit).await
    }

    async fn get_service_visit(&self, id: i64) -> Result<Option<ServiceVisit>, PitstopError> {
        queries::visits::get_visit(self.db()?, id).await
    }

    async fn latest_visit_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Option<ServiceVisit>, PitstopError> {
        queries::visits::latest_for_customer(self.db()?, customer_id).await
    }

    async fn visits_awaiting_survey(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<ServiceVisit>, PitstopError> {
        queries::visits::awaiting_survey(self.db()?, from, to).await
    }

    // --- Surveys ---

    async fn create_survey(
        &self,
        service_visit_id: i64,
        language: Language,
    ) -> Result<Survey, PitstopError> {
        queries::surveys::create_survey(self.db()?, service_visit_id, language).await
    }

    async fn get_survey(&self, id: i64) -> Result<Option<Survey>, PitstopError> {
        queries::surveys::get_survey(self.db()?, id).await
    }

    async fn survey_for_visit(
        &self,
        service_visit_id: i64,
    ) -> Result<Option<Survey>, PitstopError> {
        queries::surveys::survey_for_visit(self.db()?, service_visit_id).await
    }

    async fn list_surveys(&self, filter: &SurveyFilter) -> Result<Vec<Survey>, PitstopError> {
        queries::surveys::list_surveys(self.db()?, filter).await
    }

    async fn save_conversation(
        &self,
        survey_id: i64,
        conversation: &Conversation,
    ) -> Result<(), PitstopError> {
        queries::surveys::save_conversation(self.db()?, survey_id, conversation).await
    }

    async fn complete_survey(
        &self,
        survey_id: i64,
        outcome: &SurveyOutcome,
    ) -> Result<(), PitstopError> {
        queries::surveys::complete_survey(self.db()?, survey_id, outcome).await
    }

    async fn update_callback(
        &self,
        survey_id: i64,
        callback_completed: bool,
        callback_notes: Option<&str>,
    ) -> Result<bool, PitstopError> {
        queries::surveys::update_callback(self.db()?, survey_id, callback_completed, callback_notes)
            .await
    }

    async fn survey_stats(&self) -> Result<SurveyStats, PitstopError> {
        queries::stats::survey_stats(self.db()?).await
    }

    // --- Follow-up items ---

    async fn insert_follow_up_item(
        &self,
        survey_id: i64,
        issue_type: IssueType,
        description: &str,
    ) -> Result<i64, PitstopError> {
        queries::follow_ups::insert_item(self.db()?, survey_id, issue_type, description).await
    }

    async fn follow_up_items_for_survey(
        &self,
        survey_id: i64,
    ) -> Result<Vec<FollowUpItem>, PitstopError> {
        queries::follow_ups::items_for_survey(self.db()?, survey_id).await
    }

    async fn update_follow_up_item(
        &self,
        id: i64,
        update: &FollowUpUpdate,
    ) -> Result<Option<FollowUpItem>, PitstopError> {
        queries::follow_ups::update_item(self.db()?, id, update).await
    }

    // --- Positive remarks ---

    async fn insert_positive_remark(
        &self,
        survey_id: i64,
        employee_name: Option<&str>,
        comment: &str,
    ) -> Result<i64, PitstopError> {
        queries::remarks::insert_remark(self.db()?, survey_id, employee_name, comment).await
    }

    async fn positive_remarks_for_survey(
        &self,
        survey_id: i64,
    ) -> Result<Vec<PositiveRemark>, PitstopError> {
        queries::remarks::remarks_for_survey(self.db()?, survey_id).await
    }

    // --- Message log ---

    async fn insert_message_log(&self, log: &NewMessageLog) -> Result<i64, PitstopError> {
        queries::messages::insert_log(self.db()?, log).await
    }

    async fn update_message_status(
        &self,
        message_sid: &str,
        status: &str,
    ) -> Result<bool, PitstopError> {
        queries::messages::update_status(self.db()?, message_sid, status).await
    }

    async fn retry_candidates(
        &self,
        since: &str,
        max_retries: u32,
    ) -> Result<Vec<MessageLog>, PitstopError> {
        queries::messages::retry_candidates(self.db()?, since, max_retries).await
    }

    async fn message_logs_for_visit(
        &self,
        service_visit_id: i64,
    ) -> Result<Vec<MessageLog>, PitstopError> {
        queries::messages::logs_for_visit(self.db()?, service_visit_id).await
    }

    async fn mark_message_retried(&self, id: i64) -> Result<(), PitstopError> {
        queries::messages::mark_retried(self.db()?, id).await
    }
}
