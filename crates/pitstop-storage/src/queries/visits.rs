// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service visit operations.

use pitstop_core::PitstopError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::{NewServiceVisit, ServiceVisit};

const COLUMNS: &str = "id, customer_id, service_date, service_type, vehicle_make, vehicle_model, \
     vehicle_year, vin, service_advisor, technician, completed_at, created_at, updated_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ServiceVisit> {
    Ok(ServiceVisit {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        service_date: row.get(2)?,
        service_type: row.get(3)?,
        vehicle_make: row.get(4)?,
        vehicle_model: row.get(5)?,
        vehicle_year: row.get(6)?,
        vin: row.get(7)?,
        service_advisor: row.get(8)?,
        technician: row.get(9)?,
        completed_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Insert a service visit and return the stored row.
pub async fn create_visit(
    db: &Database,
    visit: &NewServiceVisit,
) -> Result<ServiceVisit, PitstopError> {
    let visit = visit.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO service_visits (customer_id, service_date, service_type, vehicle_make,
                     vehicle_model, vehicle_year, vin, service_advisor, technician, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    visit.customer_id,
                    visit.service_date,
                    visit.service_type,
                    visit.vehicle_make,
                    visit.vehicle_model,
                    visit.vehicle_year,
                    visit.vin,
                    visit.service_advisor,
                    visit.technician,
                    visit.completed_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM service_visits WHERE id = ?1"),
                params![id],
                from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a visit by ID.
pub async fn get_visit(db: &Database, id: i64) -> Result<Option<ServiceVisit>, PitstopError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM service_visits WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The customer's most recent visit by service date, newest insert breaking ties.
pub async fn latest_for_customer(
    db: &Database,
    customer_id: i64,
) -> Result<Option<ServiceVisit>, PitstopError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM service_visits WHERE customer_id = ?1
                     ORDER BY service_date DESC, id DESC LIMIT 1"
                ),
                params![customer_id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Visits completed within `[from, to]` that have no survey record.
pub async fn awaiting_survey(
    db: &Database,
    from: &str,
    to: &str,
) -> Result<Vec<ServiceVisit>, PitstopError> {
    let from = from.to_string();
    let to = to.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM service_visits v
                 WHERE v.completed_at IS NOT NULL
                   AND julianday(v.completed_at) BETWEEN julianday(?1) AND julianday(?2)
                   AND NOT EXISTS (SELECT 1 FROM surveys s WHERE s.service_visit_id = v.id)
                 ORDER BY v.completed_at, v.id"
            ))?;
            let rows = stmt.query_map(params![from, to], from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCustomer;
    use crate::queries::{customers, surveys};
    use pitstop_core::Language;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir, i64) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let customer = customers::create_customer(
            &db,
            &NewCustomer {
                first_name: "Sam".to_string(),
                last_name: "Lee".to_string(),
                email: None,
                phone: "+15550002222".to_string(),
                preferred_language: Language::English,
            },
        )
        .await
        .unwrap();
        (db, dir, customer.id)
    }

    fn visit(customer_id: i64, date: &str, completed_at: Option<&str>) -> NewServiceVisit {
        NewServiceVisit {
            customer_id,
            service_date: date.to_string(),
            service_type: "Brake pads".to_string(),
            vehicle_make: Some("Toyota".to_string()),
            vehicle_model: Some("Camry".to_string()),
            vehicle_year: Some(2021),
            vin: None,
            service_advisor: Some("Maria".to_string()),
            technician: Some("Dev".to_string()),
            completed_at: completed_at.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_and_get_visit() {
        let (db, _dir, customer_id) = setup_db().await;
        let created = create_visit(&db, &visit(customer_id, "2026-03-01", None))
            .await
            .unwrap();
        let fetched = get_visit(&db, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.vehicle_year, Some(2021));
        assert_eq!(fetched.service_advisor.as_deref(), Some("Maria"));
        assert!(get_visit(&db, created.id + 1).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_visit_orders_by_service_date() {
        let (db, _dir, customer_id) = setup_db().await;
        let newer = create_visit(&db, &visit(customer_id, "2026-03-05", None))
            .await
            .unwrap();
        create_visit(&db, &visit(customer_id, "2026-01-10", None))
            .await
            .unwrap();

        let latest = latest_for_customer(&db, customer_id).await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
        assert!(latest_for_customer(&db, 999).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn awaiting_survey_respects_window_and_existing_surveys() {
        let (db, _dir, customer_id) = setup_db().await;
        let in_window = create_visit(
            &db,
            &visit(customer_id, "2026-03-01", Some("2026-03-01T15:00:00.000Z")),
        )
        .await
        .unwrap();
        let surveyed = create_visit(
            &db,
            &visit(customer_id, "2026-03-01", Some("2026-03-01T16:00:00.000Z")),
        )
        .await
        .unwrap();
        // Too recent and never completed.
        create_visit(
            &db,
            &visit(customer_id, "2026-03-02", Some("2026-03-02T20:00:00.000Z")),
        )
        .await
        .unwrap();
        create_visit(&db, &visit(customer_id, "2026-03-01", None))
            .await
            .unwrap();

        surveys::create_survey(&db, surveyed.id, Language::English)
            .await
            .unwrap();

        let due = awaiting_survey(&db, "2026-03-01T09:00:00.000Z", "2026-03-02T09:00:00.000Z")
            .await
            .unwrap();
        let ids: Vec<i64> = due.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![in_window.id]);
        db.close().await.unwrap();
    }
}
