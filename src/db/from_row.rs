//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models implement to define
//! how they are constructed from database rows, plus helper functions for
//! common query patterns.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{Category, Organisation, User};

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const ORGANISATION_COLS: &str = "id, name, description, address, postcode, email, website, telephone, donation_info, publish_address, publish_phone, publish_email, latitude, longitude, created_at, updated_at";

pub const CATEGORY_COLS: &str = "id, name, created_at";

pub const USER_COLS: &str =
    "id, email, name, admin, organisation_id, pending_organisation_id, created_at, updated_at";

impl FromRow for Organisation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Organisation {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            address: row.get(3)?,
            postcode: row.get(4)?,
            email: row.get(5)?,
            website: row.get(6)?,
            telephone: row.get(7)?,
            donation_info: row.get(8)?,
            publish_address: row.get(9)?,
            publish_phone: row.get(10)?,
            publish_email: row.get(11)?,
            latitude: row.get(12)?,
            longitude: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

impl FromRow for Category {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            admin: row.get(3)?,
            organisation_id: row.get(4)?,
            pending_organisation_id: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
