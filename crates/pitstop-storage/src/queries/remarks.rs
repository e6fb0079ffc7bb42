// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Positive remark operations.

use pitstop_core::PitstopError;
use rusqlite::params;

use crate::database::Database;
use crate::models::PositiveRemark;

/// Insert a remark and return its ID.
pub async fn insert_remark(
    db: &Database,
    survey_id: i64,
    employee_name: Option<&str>,
    comment: &str,
) -> Result<i64, PitstopError> {
    let employee_name = employee_name.map(str::to_string);
    let comment = comment.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO positive_remarks (survey_id, employee_name, comment) VALUES (?1, ?2, ?3)",
                params![survey_id, employee_name, comment],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remarks for a survey in insertion order.
pub async fn remarks_for_survey(
    db: &Database,
    survey_id: i64,
) -> Result<Vec<PositiveRemark>, PitstopError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, survey_id, employee_name, comment, created_at
                 FROM positive_remarks WHERE survey_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![survey_id], |row| {
                Ok(PositiveRemark {
                    id: row.get(0)?,
                    survey_id: row.get(1)?,
                    employee_name: row.get(2)?,
                    comment: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn remarks_round_trip_with_and_without_employee() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let survey_id: i64 = db
            .connection()
            .call(|conn| {
                conn.execute_batch(
                    "INSERT INTO customers (first_name, last_name, phone) VALUES ('A', 'B', '+15550004444');
                     INSERT INTO service_visits (customer_id, service_date, service_type)
                         VALUES (1, '2026-03-01', 'Tires');
                     INSERT INTO surveys (service_visit_id) VALUES (1);",
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(crate::database::map_tr_err)
            .unwrap();

        insert_remark(&db, survey_id, Some("Maria"), "explained everything")
            .await
            .unwrap();
        insert_remark(&db, survey_id, None, "clean waiting room")
            .await
            .unwrap();

        let remarks = remarks_for_survey(&db, survey_id).await.unwrap();
        assert_eq!(remarks.len(), 2);
        assert_eq!(remarks[0].employee_name.as_deref(), Some("Maria"));
        assert_eq!(remarks[1].employee_name, None);
        assert_eq!(remarks[1].comment, "clean waiting room");

        assert!(remarks_for_survey(&db, survey_id + 1).await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
