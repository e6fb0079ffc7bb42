// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two scheduled jobs: first survey messages and resends.
//!
//! Both jobs process their batch sequentially. A failure for one visit or
//! one message is logged and counted; it never stops the rest of the batch.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use pitstop_config::model::SchedulerConfig;
use pitstop_core::PitstopError;
use pitstop_survey::{ResendOutcome, SurveyService};
use serde::Serialize;
use tracing::{info, warn};

/// Per-item counts from one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Formats `t` the way SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ')` does.
pub fn sqlite_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub struct SurveyJobs {
    service: Arc<SurveyService>,
    config: SchedulerConfig,
}

impl SurveyJobs {
    pub fn new(service: Arc<SurveyService>, config: SchedulerConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Starts a survey for every visit completed inside the configured window
    /// before `now` that has no survey yet.
    pub async fn run_survey_batch(&self, now: DateTime<Utc>) -> Result<BatchReport, PitstopError> {
        let from = sqlite_timestamp(now - Duration::hours(i64::from(self.config.window_end_hours)));
        let to = sqlite_timestamp(now - Duration::hours(i64::from(self.config.window_start_hours)));
        let storage = self.service.storage();
        let visits = storage.visits_awaiting_survey(&from, &to).await?;
        info!(count = visits.len(), %from, %to, "visits awaiting survey");

        let mut report = BatchReport::default();
        for visit in &visits {
            report.attempted += 1;
            let customer = match storage.get_customer(visit.customer_id).await {
                Ok(Some(customer)) => customer,
                Ok(None) => {
                    warn!(visit_id = visit.id, customer_id = visit.customer_id, "visit has no customer");
                    report.failed += 1;
                    continue;
                }
                Err(e) => {
                    warn!(visit_id = visit.id, error = %e, "customer lookup failed");
                    report.failed += 1;
                    continue;
                }
            };
            match self.service.send_initial_survey(visit, &customer).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!(visit_id = visit.id, error = %e, "failed to start survey");
                    report.failed += 1;
                }
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "survey batch finished"
        );
        Ok(report)
    }

    /// Resends failed outbound messages from the lookback window before `now`.
    pub async fn run_retry_batch(&self, now: DateTime<Utc>) -> Result<BatchReport, PitstopError> {
        let since =
            sqlite_timestamp(now - Duration::hours(i64::from(self.config.retry_lookback_hours)));
        let candidates = self
            .service
            .storage()
            .retry_candidates(&since, self.config.max_retries)
            .await?;
        info!(count = candidates.len(), %since, "messages to retry");

        let mut report = BatchReport::default();
        for log in &candidates {
            report.attempted += 1;
            match self.service.resend_message(log).await {
                Ok(ResendOutcome::Resent(_)) => report.succeeded += 1,
                Ok(ResendOutcome::SkippedCompleted) => report.skipped += 1,
                Err(e) => {
                    warn!(log_id = log.id, error = %e, "resend failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "retry batch finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitstop_core::Language;
    use pitstop_core::records::message_status;
    use pitstop_test_utils::TestHarness;

    fn jobs(harness: &TestHarness) -> SurveyJobs {
        let service = SurveyService::new(
            harness.storage.clone(),
            harness.mock_channel.clone(),
            harness.mock_provider.clone(),
            &harness.config,
        );
        SurveyJobs::new(Arc::new(service), SchedulerConfig::default())
    }

    fn hours_ago(now: DateTime<Utc>, hours: i64) -> String {
        sqlite_timestamp(now - Duration::hours(hours))
    }

    #[test]
    fn timestamp_format_matches_sqlite() {
        let t = DateTime::parse_from_rfc3339("2026-03-01T15:04:05.123Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(sqlite_timestamp(t), "2026-03-01T15:04:05.123Z");
    }

    #[tokio::test]
    async fn survey_batch_only_picks_visits_inside_window() {
        let harness = TestHarness::builder().build().await.unwrap();
        let now = Utc::now();
        let customer = harness
            .add_customer("+15550001111", Language::English)
            .await
            .unwrap();
        let in_window = harness
            .add_visit(customer.id, Some(&hours_ago(now, 30)))
            .await
            .unwrap();
        harness
            .add_visit(customer.id, Some(&hours_ago(now, 10)))
            .await
            .unwrap();
        harness
            .add_visit(customer.id, Some(&hours_ago(now, 60)))
            .await
            .unwrap();
        harness.add_visit(customer.id, None).await.unwrap();

        let jobs = jobs(&harness);
        let report = jobs.run_survey_batch(now).await.unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.succeeded, 1);
        assert!(
            harness
                .storage
                .survey_for_visit(in_window.id)
                .await
                .unwrap()
                .is_some()
        );
        assert_eq!(harness.mock_channel.sent_count().await, 1);

        let again = jobs.run_survey_batch(now).await.unwrap();
        assert_eq!(again.attempted, 0);
    }

    #[tokio::test]
    async fn survey_batch_counts_send_failures() {
        let harness = TestHarness::builder().build().await.unwrap();
        let now = Utc::now();
        for phone in ["+15550001111", "+15550002222"] {
            let customer = harness.add_customer(phone, Language::English).await.unwrap();
            harness
                .add_visit(customer.id, Some(&hours_ago(now, 36)))
                .await
                .unwrap();
        }
        harness.mock_channel.set_failing(true);

        let report = jobs(&harness).run_survey_batch(now).await.unwrap();
        assert_eq!(
            report,
            BatchReport {
                attempted: 2,
                succeeded: 0,
                failed: 2,
                skipped: 0
            }
        );
    }

    #[tokio::test]
    async fn retry_batch_resends_failed_messages_up_to_limit() {
        let harness = TestHarness::builder().build().await.unwrap();
        let now = Utc::now();
        let customer = harness
            .add_customer("+15550001111", Language::English)
            .await
            .unwrap();
        let visit = harness
            .add_visit(customer.id, Some(&hours_ago(now, 30)))
            .await
            .unwrap();
        let jobs = jobs(&harness);

        harness.mock_channel.set_failing(true);
        jobs.run_survey_batch(now).await.unwrap();

        // Each failed resend logs a new failed row with one more retry.
        for _ in 0..3 {
            let report = jobs.run_retry_batch(Utc::now()).await.unwrap();
            assert_eq!(report.attempted, 1);
            assert_eq!(report.failed, 1);
        }
        let exhausted = jobs.run_retry_batch(Utc::now()).await.unwrap();
        assert_eq!(exhausted.attempted, 0);

        let logs = harness
            .storage
            .message_logs_for_visit(visit.id)
            .await
            .unwrap();
        let retried = logs
            .iter()
            .filter(|l| l.status == message_status::RETRIED)
            .count();
        assert_eq!(retried, 3);
        assert_eq!(logs.last().unwrap().retries_count, 3);
    }

    #[tokio::test]
    async fn retry_batch_sends_once_channel_recovers() {
        let harness = TestHarness::builder().build().await.unwrap();
        let now = Utc::now();
        let customer = harness
            .add_customer("+15550001111", Language::English)
            .await
            .unwrap();
        harness
            .add_visit(customer.id, Some(&hours_ago(now, 30)))
            .await
            .unwrap();
        let jobs = jobs(&harness);

        harness.mock_channel.set_failing(true);
        jobs.run_survey_batch(now).await.unwrap();
        harness.mock_channel.set_failing(false);

        let report = jobs.run_retry_batch(Utc::now()).await.unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(harness.mock_channel.sent_count().await, 1);
        assert_eq!(jobs.run_retry_batch(Utc::now()).await.unwrap().attempted, 0);
    }
}
