// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer operations.

use pitstop_core::PitstopError;
use rusqlite::{OptionalExtension, params};

use super::parse_column;
use crate::database::Database;
use crate::models::{Customer, NewCustomer};

const COLUMNS: &str =
    "id, first_name, last_name, email, phone, preferred_language, created_at, updated_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        preferred_language: parse_column(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert a customer and return the stored row.
pub async fn create_customer(db: &Database, customer: &NewCustomer) -> Result<Customer, PitstopError> {
    let customer = customer.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO customers (first_name, last_name, email, phone, preferred_language)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    customer.first_name,
                    customer.last_name,
                    customer.email,
                    customer.phone,
                    customer.preferred_language.to_string(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM customers WHERE id = ?1"),
                params![id],
                from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a customer by ID.
pub async fn get_customer(db: &Database, id: i64) -> Result<Option<Customer>, PitstopError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM customers WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find a customer by exact phone number. The oldest registration wins on duplicates.
pub async fn find_by_phone(db: &Database, phone: &str) -> Result<Option<Customer>, PitstopError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM customers WHERE phone = ?1 ORDER BY id LIMIT 1"),
                params![phone],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
