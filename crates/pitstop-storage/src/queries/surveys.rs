// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Survey operations.
//!
//! The transcript is stored as a JSON array in the `conversation` column. A
//! NULL column means the survey was created but the customer has not replied
//! yet.

use pitstop_core::{Conversation, Language, PitstopError};
use rusqlite::types::{ToSql, Type};
use rusqlite::{OptionalExtension, params, params_from_iter};

use super::parse_column;
use crate::database::Database;
use crate::models::{Survey, SurveyFilter, SurveyOutcome};

const COLUMNS: &str = "id, service_visit_id, call_timestamp, survey_completed, language_used, \
     overall_satisfaction, workmanship_quality, service_timeliness, staff_friendliness, \
     callback_needed, callback_completed, callback_notes, conversation, created_at, updated_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Survey> {
    let conversation: Option<String> = row.get(12)?;
    let conversation = conversation
        .map(|json| serde_json::from_str::<Conversation>(&json))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;
    Ok(Survey {
        id: row.get(0)?,
        service_visit_id: row.get(1)?,
        call_timestamp: row.get(2)?,
        completed: row.get(3)?,
        language_used: parse_column(row, 4)?,
        overall_satisfaction: row.get(5)?,
        workmanship_quality: row.get(6)?,
        service_timeliness: row.get(7)?,
        staff_friendliness: row.get(8)?,
        callback_needed: row.get(9)?,
        callback_completed: row.get(10)?,
        callback_notes: row.get(11)?,
        conversation,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

/// Create the survey record for a visit. Fails if the visit already has one.
pub async fn create_survey(
    db: &Database,
    service_visit_id: i64,
    language: Language,
) -> Result<Survey, PitstopError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO surveys (service_visit_id, language_used) VALUES (?1, ?2)",
                params![service_visit_id, language.to_string()],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM surveys WHERE id = ?1"),
                params![id],
                from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a survey by ID.
pub async fn get_survey(db: &Database, id: i64) -> Result<Option<Survey>, PitstopError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM surveys WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the survey attached to a service visit.
pub async fn survey_for_visit(
    db: &Database,
    service_visit_id: i64,
) -> Result<Option<Survey>, PitstopError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM surveys WHERE service_visit_id = ?1"),
                params![service_visit_id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List surveys matching every set field of `filter`, newest call first.
pub async fn list_surveys(
    db: &Database,
    filter: &SurveyFilter,
) -> Result<Vec<Survey>, PitstopError> {
    let filter = filter.clone();
    db.connection()
        .call(move |conn| {
            let mut clauses: Vec<&str> = Vec::new();
            let mut args: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(completed) = filter.completed {
                clauses.push("survey_completed = ?");
                args.push(Box::new(completed));
            }
            if let Some(callback) = filter.callback_needed {
                clauses.push("callback_needed = ?");
                args.push(Box::new(callback));
            }
            if let Some(from) = filter.from_date {
                clauses.push("date(call_timestamp) >= date(?)");
                args.push(Box::new(from));
            }
            if let Some(to) = filter.to_date {
                clauses.push("date(call_timestamp) <= date(?)");
                args.push(Box::new(to));
            }
            if let Some(min) = filter.min_rating {
                clauses.push("overall_satisfaction >= ?");
                args.push(Box::new(min));
            }
            if let Some(max) = filter.max_rating {
                clauses.push("overall_satisfaction <= ?");
                args.push(Box::new(max));
            }

            let mut sql = format!("SELECT {COLUMNS} FROM surveys");
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY call_timestamp DESC, id DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace the stored transcript.
pub async fn save_conversation(
    db: &Database,
    survey_id: i64,
    conversation: &Conversation,
) -> Result<(), PitstopError> {
    let json = serde_json::to_string(conversation).map_err(|e| PitstopError::Storage {
        source: Box::new(e),
    })?;
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE surveys SET conversation = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![json, survey_id],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if changed == 0 {
        return Err(not_found(survey_id));
    }
    Ok(())
}

/// Write the extracted ratings, language and callback flag and mark the survey completed.
pub async fn complete_survey(
    db: &Database,
    survey_id: i64,
    outcome: &SurveyOutcome,
) -> Result<(), PitstopError> {
    let outcome = *outcome;
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE surveys SET
                     overall_satisfaction = ?1,
                     workmanship_quality = ?2,
                     service_timeliness = ?3,
                     staff_friendliness = ?4,
                     language_used = ?5,
                     callback_needed = ?6,
                     survey_completed = 1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?7",
                params![
                    outcome.ratings.overall_satisfaction,
                    outcome.ratings.workmanship_quality,
                    outcome.ratings.service_timeliness,
                    outcome.ratings.staff_friendliness,
                    outcome.language.to_string(),
                    outcome.callback_needed,
                    survey_id,
                ],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if changed == 0 {
        return Err(not_found(survey_id));
    }
    Ok(())
}

/// Record a staff callback. Returns false when the survey does not exist.
pub async fn update_callback(
    db: &Database,
    survey_id: i64,
    callback_completed: bool,
    callback_notes: Option<&str>,
) -> Result<bool, PitstopError> {
    let notes = callback_notes.map(str::to_string);
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE surveys SET callback_completed = ?1,
                     callback_notes = COALESCE(?2, callback_notes),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![callback_completed, notes, survey_id],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(changed > 0)
}

fn not_found(survey_id: i64) -> PitstopError {
    PitstopError::NotFound {
        entity: "survey",
        id: survey_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCustomer, NewServiceVisit, Ratings};
    use crate::queries::{customers, visits};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn make_visit(db: &Database) -> i64 {
        let customer = customers::create_customer(
            db,
            &NewCustomer {
                first_name: "Jo".to_string(),
                last_name: "Park".to_string(),
                email: None,
                phone: format!("+1555000{:04}", rand_suffix()),
                preferred_language: Language::English,
            },
        )
        .await
        .unwrap();
        visits::create_visit(
            db,
            &NewServiceVisit {
                customer_id: customer.id,
                service_date: "2026-03-01".to_string(),
                service_type: "Oil change".to_string(),
                vehicle_make: None,
                vehicle_model: None,
                vehicle_year: None,
                vin: None,
                service_advisor: None,
                technician: None,
                completed_at: Some("2026-03-01T12:00:00.000Z".to_string()),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn rand_suffix() -> u32 {
        use std::sync::atomic::{AtomicU32, Ordering};
        static NEXT: AtomicU32 = AtomicU32::new(0);
        NEXT.fetch_add(1, Ordering::Relaxed)
    }

    fn outcome(overall: u8, callback: bool) -> SurveyOutcome {
        SurveyOutcome {
            ratings: Ratings {
                overall_satisfaction: overall,
                workmanship_quality: 8,
                service_timeliness: 7,
                staff_friendliness: 10,
            },
            language: Language::Spanish,
            callback_needed: callback,
        }
    }

    #[tokio::test]
    async fn new_survey_has_no_conversation() {
        let (db, _dir) = setup_db().await;
        let visit_id = make_visit(&db).await;
        let survey = create_survey(&db, visit_id, Language::English).await.unwrap();
        assert!(!survey.completed);
        assert!(survey.conversation.is_none());
        assert_eq!(survey.overall_satisfaction, None);

        let by_visit = survey_for_visit(&db, visit_id).await.unwrap().unwrap();
        assert_eq!(by_visit.id, survey.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn one_survey_per_visit() {
        let (db, _dir) = setup_db().await;
        let visit_id = make_visit(&db).await;
        create_survey(&db, visit_id, Language::English).await.unwrap();
        assert!(create_survey(&db, visit_id, Language::English).await.is_err());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conversation_round_trips_through_column() {
        let (db, _dir) = setup_db().await;
        let visit_id = make_visit(&db).await;
        let survey = create_survey(&db, visit_id, Language::English).await.unwrap();

        let mut conversation = Conversation::seeded("Hi! How was your visit?");
        conversation.push_customer("Great, 9");
        save_conversation(&db, survey.id, &conversation).await.unwrap();

        let stored = get_survey(&db, survey.id).await.unwrap().unwrap();
        assert_eq!(stored.conversation, Some(conversation));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn save_conversation_on_missing_survey_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = save_conversation(&db, 77, &Conversation::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PitstopError::NotFound { entity: "survey", .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn complete_survey_writes_outcome() {
        let (db, _dir) = setup_db().await;
        let visit_id = make_visit(&db).await;
        let survey = create_survey(&db, visit_id, Language::English).await.unwrap();

        complete_survey(&db, survey.id, &outcome(9, true)).await.unwrap();
        let stored = get_survey(&db, survey.id).await.unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(stored.overall_satisfaction, Some(9));
        assert_eq!(stored.staff_friendliness, Some(10));
        assert_eq!(stored.language_used, Language::Spanish);
        assert!(stored.callback_needed);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_callback_keeps_notes_when_none_given() {
        let (db, _dir) = setup_db().await;
        let visit_id = make_visit(&db).await;
        let survey = create_survey(&db, visit_id, Language::English).await.unwrap();

        assert!(
            update_callback(&db, survey.id, false, Some("left voicemail"))
                .await
                .unwrap()
        );
        assert!(update_callback(&db, survey.id, true, None).await.unwrap());
        let stored = get_survey(&db, survey.id).await.unwrap().unwrap();
        assert!(stored.callback_completed);
        assert_eq!(stored.callback_notes.as_deref(), Some("left voicemail"));

        assert!(!update_callback(&db, 999, true, None).await.unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_surveys_applies_filters() {
        let (db, _dir) = setup_db().await;
        let a = create_survey(&db, make_visit(&db).await, Language::English)
            .await
            .unwrap();
        let b = create_survey(&db, make_visit(&db).await, Language::English)
            .await
            .unwrap();
        let c = create_survey(&db, make_visit(&db).await, Language::English)
            .await
            .unwrap();
        complete_survey(&db, a.id, &outcome(9, false)).await.unwrap();
        complete_survey(&db, b.id, &outcome(3, true)).await.unwrap();

        let all = list_surveys(&db, &SurveyFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let pending = list_surveys(
            &db,
            &SurveyFilter {
                completed: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.iter().map(|s| s.id).collect::<Vec<_>>(), vec![c.id]);

        let unhappy = list_surveys(
            &db,
            &SurveyFilter {
                max_rating: Some(5),
                callback_needed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(unhappy.iter().map(|s| s.id).collect::<Vec<_>>(), vec![b.id]);

        let happy = list_surveys(
            &db,
            &SurveyFilter {
                min_rating: Some(8),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(happy.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a.id]);

        let future = list_surveys(
            &db,
            &SurveyFilter {
                from_date: Some("2999-01-01".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(future.is_empty());
        db.close().await.unwrap();
    }
}
