// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Follow-up item operations.

use pitstop_core::PitstopError;
use rusqlite::{OptionalExtension, params};

use super::parse_column;
use crate::database::Database;
use crate::models::{FollowUpItem, FollowUpUpdate, IssueType};

const COLUMNS: &str = "id, survey_id, issue_type, issue_description, status, assigned_to, \
     resolved_at, created_at, updated_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FollowUpItem> {
    Ok(FollowUpItem {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        issue_type: parse_column(row, 2)?,
        issue_description: row.get(3)?,
        status: parse_column(row, 4)?,
        assigned_to: row.get(5)?,
        resolved_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert a pending follow-up item and return its ID.
pub async fn insert_item(
    db: &Database,
    survey_id: i64,
    issue_type: IssueType,
    description: &str,
) -> Result<i64, PitstopError> {
    let description = description.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO follow_up_items (survey_id, issue_type, issue_description)
                 VALUES (?1, ?2, ?3)",
                params![survey_id, issue_type.to_string(), description],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All follow-up items for a survey in insertion order.
pub async fn items_for_survey(
    db: &Database,
    survey_id: i64,
) -> Result<Vec<FollowUpItem>, PitstopError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM follow_up_items WHERE survey_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![survey_id], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a status change. Unset `assigned_to` and `resolved_at` keep their stored values.
pub async fn update_item(
    db: &Database,
    id: i64,
    update: &FollowUpUpdate,
) -> Result<Option<FollowUpItem>, PitstopError> {
    let update = update.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE follow_up_items SET status = ?1,
                     assigned_to = COALESCE(?2, assigned_to),
                     resolved_at = COALESCE(?3, resolved_at),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?4",
                params![
                    update.status.to_string(),
                    update.assigned_to,
                    update.resolved_at,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM follow_up_items WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
