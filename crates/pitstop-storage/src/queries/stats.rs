// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard aggregates.

use std::collections::BTreeMap;

use pitstop_core::PitstopError;

use super::parse_column;
use crate::database::Database;
use crate::models::{AverageRatings, IssueType, SurveyStats};

/// Totals, mean ratings over completed surveys, open callbacks and follow-up counts by type.
pub async fn survey_stats(db: &Database) -> Result<SurveyStats, PitstopError> {
    db.connection()
        .call(|conn| {
            let (total_surveys, completed_surveys, callback_needed) = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(survey_completed), 0),
                        COALESCE(SUM(CASE WHEN callback_needed = 1 AND callback_completed = 0
                                          THEN 1 ELSE 0 END), 0)
                 FROM surveys",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            let average_ratings = conn.query_row(
                "SELECT AVG(overall_satisfaction), AVG(workmanship_quality),
                        AVG(service_timeliness), AVG(staff_friendliness)
                 FROM surveys WHERE survey_completed = 1",
                [],
                |row| {
                    Ok(AverageRatings {
                        overall_satisfaction: row.get(0)?,
                        workmanship_quality: row.get(1)?,
                        service_timeliness: row.get(2)?,
                        staff_friendliness: row.get(3)?,
                    })
                },
            )?;

            let mut stmt = conn.prepare(
                "SELECT issue_type, COUNT(*) FROM follow_up_items GROUP BY issue_type",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((parse_column::<IssueType>(row, 0)?, row.get::<_, i64>(1)?))
            })?;
            let mut follow_up_counts = BTreeMap::new();
            for row in rows {
                let (issue_type, count) = row?;
                follow_up_counts.insert(issue_type, count);
            }

            Ok(SurveyStats {
                total_surveys,
                completed_surveys,
                average_ratings,
                callback_needed,
                follow_up_counts,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}
