// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writes an extracted [`SurveyResult`] to the store.
//!
//! The survey row is written first and its failure is returned. Follow-up
//! items and positive remarks are then inserted one by one; a failed insert
//! is logged and counted, and the remaining inserts still run.

use pitstop_core::{PitstopError, StorageAdapter};
use tracing::{info, warn};

use crate::extraction::SurveyResult;

/// Counts from one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub follow_up_items: usize,
    pub positive_remarks: usize,
    pub failed_inserts: usize,
}

pub async fn commit_survey_result(
    storage: &dyn StorageAdapter,
    survey_id: i64,
    result: &SurveyResult,
) -> Result<CommitReport, PitstopError> {
    storage.complete_survey(survey_id, &result.outcome()).await?;

    let mut report = CommitReport::default();

    for (issue_type, description) in result.follow_up_items.entries() {
        match storage
            .insert_follow_up_item(survey_id, issue_type, description)
            .await
        {
            Ok(_) => report.follow_up_items += 1,
            Err(e) => {
                warn!(survey_id, %issue_type, error = %e, "failed to store follow-up item");
                report.failed_inserts += 1;
            }
        }
    }

    for remark in &result.positive_remarks {
        let employee = Some(remark.employee.trim()).filter(|name| !name.is_empty());
        match storage
            .insert_positive_remark(survey_id, employee, &remark.comment)
            .await
        {
            Ok(_) => report.positive_remarks += 1,
            Err(e) => {
                warn!(survey_id, error = %e, "failed to store positive remark");
                report.failed_inserts += 1;
            }
        }
    }

    info!(
        survey_id,
        follow_up_items = report.follow_up_items,
        positive_remarks = report.positive_remarks,
        failed_inserts = report.failed_inserts,
        "survey results committed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{FollowUpLists, RemarkEntry};
    use pitstop_core::Language;
    use pitstop_core::records::{IssueType, Ratings};
    use pitstop_test_utils::{FlakyStorage, TestHarness};

    fn result() -> SurveyResult {
        SurveyResult {
            ratings: Ratings {
                overall_satisfaction: 4,
                workmanship_quality: 8,
                service_timeliness: 6,
                staff_friendliness: 10,
            },
            follow_up_items: FollowUpLists {
                billing_disputes: vec!["charged twice for the filter".into()],
                safety_concerns: vec!["brake light still on".into()],
                ..FollowUpLists::default()
            },
            positive_remarks: vec![
                RemarkEntry {
                    employee: "Maria".into(),
                    comment: "explained everything".into(),
                },
                RemarkEntry {
                    employee: " ".into(),
                    comment: "shuttle driver was kind".into(),
                },
            ],
            preferred_language: Language::Spanish,
            callback_needed: true,
        }
    }

    #[tokio::test]
    async fn commit_writes_survey_items_and_remarks() {
        let harness = TestHarness::builder().build().await.unwrap();
        let (_, visit) = harness
            .customer_with_visit("+15550001111", Language::English)
            .await
            .unwrap();
        let survey = harness
            .storage
            .create_survey(visit.id, Language::English)
            .await
            .unwrap();

        let report = commit_survey_result(harness.storage.as_ref(), survey.id, &result())
            .await
            .unwrap();
        assert_eq!(
            report,
            CommitReport {
                follow_up_items: 2,
                positive_remarks: 2,
                failed_inserts: 0
            }
        );

        let stored = harness.storage.get_survey(survey.id).await.unwrap().unwrap();
        assert!(stored.completed);
        assert!(stored.callback_needed);
        assert_eq!(stored.language_used, Language::Spanish);
        assert_eq!(stored.overall_satisfaction, Some(4));

        let items = harness
            .storage
            .follow_up_items_for_survey(survey.id)
            .await
            .unwrap();
        let kinds: Vec<_> = items.iter().map(|i| i.issue_type).collect();
        assert_eq!(kinds, vec![IssueType::BillingDispute, IssueType::SafetyConcern]);

        let remarks = harness
            .storage
            .positive_remarks_for_survey(survey.id)
            .await
            .unwrap();
        assert_eq!(remarks[0].employee_name.as_deref(), Some("Maria"));
        assert_eq!(remarks[1].employee_name, None);
    }

    #[tokio::test]
    async fn failed_insert_does_not_stop_later_inserts() {
        let harness = TestHarness::builder().build().await.unwrap();
        let (_, visit) = harness
            .customer_with_visit("+15550002222", Language::English)
            .await
            .unwrap();
        let survey = harness
            .storage
            .create_survey(visit.id, Language::English)
            .await
            .unwrap();
        let storage =
            FlakyStorage::new(harness.storage.clone()).reject_follow_ups(IssueType::BillingDispute);

        let mut result = result();
        result.follow_up_items.mechanical_issues = vec!["rattle under the dash".into()];
        let report = commit_survey_result(&storage, survey.id, &result)
            .await
            .unwrap();

        assert_eq!(
            report,
            CommitReport {
                follow_up_items: 2,
                positive_remarks: 2,
                failed_inserts: 1
            }
        );
        assert_eq!(storage.follow_up_attempts(), 3);
        assert_eq!(storage.remark_attempts(), 2);

        let items = harness
            .storage
            .follow_up_items_for_survey(survey.id)
            .await
            .unwrap();
        let kinds: Vec<_> = items.iter().map(|i| i.issue_type).collect();
        assert_eq!(kinds, vec![IssueType::MechanicalIssue, IssueType::SafetyConcern]);
        let remarks = harness
            .storage
            .positive_remarks_for_survey(survey.id)
            .await
            .unwrap();
        assert_eq!(remarks.len(), 2);
    }

    #[tokio::test]
    async fn missing_survey_is_surfaced() {
        let harness = TestHarness::builder().build().await.unwrap();
        let err = commit_survey_result(harness.storage.as_ref(), 999, &result())
            .await
            .unwrap_err();
        assert!(matches!(err, PitstopError::NotFound { .. }));
    }
}
