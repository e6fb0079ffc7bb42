// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven loop running both jobs until cancelled.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use pitstop_core::PitstopError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::jobs::SurveyJobs;

/// Which scheduled job a loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Survey,
    Retry,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Survey => write!(f, "survey"),
            JobKind::Retry => write!(f, "retry"),
        }
    }
}

/// Parses a cron pattern, mapping failures to a config error.
pub fn parse_schedule(key: &str, pattern: &str) -> Result<Cron, PitstopError> {
    Cron::from_str(pattern).map_err(|e| {
        PitstopError::Config(format!("{key} `{pattern}` is not a valid cron pattern: {e}"))
    })
}

/// Next fire time strictly after `after`.
pub fn next_fire(cron: &Cron, after: DateTime<Utc>) -> Result<DateTime<Utc>, PitstopError> {
    cron.find_next_occurrence(&after, false)
        .map_err(|e| PitstopError::Internal(format!("no next cron occurrence: {e}")))
}

/// Runs the survey and retry jobs on their cron schedules until `cancel` fires.
pub async fn run_scheduler(
    jobs: Arc<SurveyJobs>,
    cancel: CancellationToken,
) -> Result<(), PitstopError> {
    let survey = parse_schedule("scheduler.survey_cron", &jobs.config().survey_cron)?;
    let retry = parse_schedule("scheduler.retry_cron", &jobs.config().retry_cron)?;
    info!(
        survey_cron = %jobs.config().survey_cron,
        retry_cron = %jobs.config().retry_cron,
        "scheduler started"
    );

    let (a, b) = tokio::join!(
        job_loop(JobKind::Survey, survey, jobs.clone(), cancel.clone()),
        job_loop(JobKind::Retry, retry, jobs, cancel),
    );
    a.and(b)
}

async fn job_loop(
    kind: JobKind,
    cron: Cron,
    jobs: Arc<SurveyJobs>,
    cancel: CancellationToken,
) -> Result<(), PitstopError> {
    loop {
        let now = Utc::now();
        let next = next_fire(&cron, now)?;
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(job = %kind, next = %next, "waiting for next run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let result = match kind {
                    JobKind::Survey => jobs.run_survey_batch(Utc::now()).await,
                    JobKind::Retry => jobs.run_retry_batch(Utc::now()).await,
                };
                if let Err(e) = result {
                    error!(job = %kind, error = %e, "scheduled job failed");
                }
            }
            _ = cancel.cancelled() => {
                info!(job = %kind, "scheduler loop shutting down");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitstop_config::model::SchedulerConfig;
    use pitstop_survey::SurveyService;
    use pitstop_test_utils::TestHarness;

    #[test]
    fn next_fire_for_daily_pattern() {
        let cron = parse_schedule("scheduler.survey_cron", "0 9 * * *").unwrap();
        let after = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let next = next_fire(&cron, after).unwrap();
        assert_eq!(next.to_rfc3339(), "2026-03-02T09:00:00+00:00");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = parse_schedule("scheduler.retry_cron", "every hour").unwrap_err();
        assert!(matches!(err, PitstopError::Config(_)));
        assert!(err.to_string().contains("scheduler.retry_cron"));
    }

    #[tokio::test]
    async fn scheduler_stops_on_cancel() {
        let harness = TestHarness::builder().build().await.unwrap();
        let service = SurveyService::new(
            harness.storage.clone(),
            harness.mock_channel.clone(),
            harness.mock_provider.clone(),
            &harness.config,
        );
        let jobs = Arc::new(SurveyJobs::new(
            Arc::new(service),
            SchedulerConfig::default(),
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_scheduler(jobs, cancel.clone()));

        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
