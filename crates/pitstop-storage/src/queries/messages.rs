// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS message log operations.

use pitstop_core::PitstopError;
use rusqlite::params;

use super::parse_column;
use crate::database::Database;
use crate::models::{MessageDirection, MessageLog, NewMessageLog, message_status};

const COLUMNS: &str = "id, service_visit_id, message_sid, message_body, message_type, message_step, \
     from_number, to_number, status, sent_at, retries_count, created_at, updated_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageLog> {
    Ok(MessageLog {
        id: row.get(0)?,
        service_visit_id: row.get(1)?,
        message_sid: row.get(2)?,
        message_body: row.get(3)?,
        direction: parse_column(row, 4)?,
        message_step: row.get(5)?,
        from_number: row.get(6)?,
        to_number: row.get(7)?,
        status: row.get(8)?,
        sent_at: row.get(9)?,
        retries_count: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Append a row to the message log and return its ID.
pub async fn insert_log(db: &Database, log: &NewMessageLog) -> Result<i64, PitstopError> {
    let log = log.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_logs (service_visit_id, message_sid, message_body, message_type,
                     message_step, from_number, to_number, status, retries_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    log.service_visit_id,
                    log.message_sid,
                    log.message_body,
                    log.direction.to_string(),
                    log.message_step,
                    log.from_number,
                    log.to_number,
                    log.status,
                    log.retries_count,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the delivery status of every row with `message_sid`.
pub async fn update_status(
    db: &Database,
    message_sid: &str,
    status: &str,
) -> Result<bool, PitstopError> {
    let message_sid = message_sid.to_string();
    let status = status.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE message_logs SET status = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE message_sid = ?2",
                params![status, message_sid],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(changed > 0)
}

/// Failed or undelivered outbound rows sent at or after `since` that still have retries left.
pub async fn retry_candidates(
    db: &Database,
    since: &str,
    max_retries: u32,
) -> Result<Vec<MessageLog>, PitstopError> {
    let since = since.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM message_logs
                 WHERE message_type = ?1
                   AND status IN (?2, ?3)
                   AND julianday(sent_at) >= julianday(?4)
                   AND retries_count < ?5
                 ORDER BY sent_at, id"
            ))?;
            let rows = stmt.query_map(
                params![
                    MessageDirection::Outbound.to_string(),
                    message_status::FAILED,
                    message_status::UNDELIVERED,
                    since,
                    max_retries,
                ],
                from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every log row for a visit, oldest first.
pub async fn logs_for_visit(db: &Database, visit_id: i64) -> Result<Vec<MessageLog>, PitstopError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM message_logs WHERE service_visit_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![visit_id], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a row as superseded by a retry so it is not picked up again.
pub async fn mark_retried(db: &Database, id: i64) -> Result<(), PitstopError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE message_logs SET status = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![message_status::RETRIED, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
