use chrono::Utc;
use rusqlite::{params, types::Value, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

use super::from_row::{
    query_all, query_one, FromRow, CATEGORY_COLS, ORGANISATION_COLS, USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn generate_api_key() -> String {
    format!("sp_{}", Uuid::new_v4().simple())
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Execute the update and return the updated entity using RETURNING.
    /// Returns None if no rows matched.
    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Organisations ============

pub fn create_organisation(conn: &Connection, input: &CreateOrganisation) -> Result<Organisation> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO organisations (id, name, description, address, postcode, email, website,
                                    telephone, donation_info, publish_address, publish_phone,
                                    publish_email, latitude, longitude, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            &id,
            &input.name,
            &input.description,
            &input.address,
            &input.postcode,
            &input.email,
            &input.website,
            &input.telephone,
            &input.donation_info,
            input.publish_address,
            input.publish_phone,
            input.publish_email,
            input.latitude,
            input.longitude,
            now,
            now,
        ],
    )?;

    set_organisation_categories(conn, &id, &input.category_ids)?;

    Ok(Organisation {
        id,
        name: input.name.clone(),
        description: input.description.clone(),
        address: input.address.clone(),
        postcode: input.postcode.clone(),
        email: input.email.clone(),
        website: input.website.clone(),
        telephone: input.telephone.clone(),
        donation_info: input.donation_info.clone(),
        publish_address: input.publish_address,
        publish_phone: input.publish_phone,
        publish_email: input.publish_email,
        latitude: input.latitude,
        longitude: input.longitude,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_organisation_by_id(conn: &Connection, id: &str) -> Result<Option<Organisation>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM organisations WHERE id = ?1",
            ORGANISATION_COLS
        ),
        &[&id],
    )
}

/// List organisations most-recent-first, with pagination
pub fn list_organisations_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Organisation>, i64)> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM organisations", [], |row| row.get(0))?;

    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM organisations ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2",
            ORGANISATION_COLS
        ),
        &[&limit, &offset],
    )?;

    Ok((items, total))
}

/// Keyword search narrowed by category, most-recent-first, with pagination.
///
/// Both filters are passed through exactly as submitted: an absent keyword
/// matches everything, and an absent category id applies no narrowing, while
/// an empty-string category id is a real value that matches no category.
pub fn search_organisations(
    conn: &Connection,
    keyword: Option<&str>,
    category_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Organisation>, i64)> {
    const FILTER: &str = "(?1 IS NULL OR name LIKE '%' || ?1 || '%'
                              OR description LIKE '%' || ?1 || '%')
         AND (?2 IS NULL OR EXISTS (
                  SELECT 1 FROM category_organisations co
                  WHERE co.organisation_id = organisations.id
                    AND co.category_id = ?2))";

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM organisations WHERE {}", FILTER),
        params![keyword, category_id],
        |row| row.get(0),
    )?;

    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM organisations WHERE {} ORDER BY updated_at DESC LIMIT ?3 OFFSET ?4",
            ORGANISATION_COLS, FILTER
        ),
        &[&keyword, &category_id, &limit, &offset],
    )?;

    Ok((items, total))
}

/// Update an organisation's attribute fields and, when submitted, replace
/// its category associations. Returns the updated row, or None when the
/// organisation does not exist.
pub fn update_organisation(
    conn: &Connection,
    id: &str,
    input: &UpdateOrganisation,
) -> Result<Option<Organisation>> {
    let builder = UpdateBuilder::new("organisations", id)
        .with_updated_at()
        .set_opt("name", input.name.clone())
        .set_opt("description", input.description.clone())
        .set_opt("address", input.address.clone())
        .set_opt("postcode", input.postcode.clone())
        .set_opt("email", input.email.clone())
        .set_opt("website", input.website.clone())
        .set_opt("telephone", input.telephone.clone())
        .set_opt("donation_info", input.donation_info.clone())
        .set_opt("publish_address", input.publish_address)
        .set_opt("publish_phone", input.publish_phone)
        .set_opt("publish_email", input.publish_email)
        .set_opt("latitude", input.latitude)
        .set_opt("longitude", input.longitude);

    let updated: Option<Organisation> = if builder.is_empty() {
        get_organisation_by_id(conn, id)?
    } else {
        builder.execute_returning(conn, ORGANISATION_COLS)?
    };

    let Some(organisation) = updated else {
        return Ok(None);
    };

    if let Some(ref category_ids) = input.category_ids {
        set_organisation_categories(conn, id, category_ids)?;
    }

    Ok(Some(organisation))
}

pub fn delete_organisation(conn: &Connection, id: &str) -> Result<bool> {
    conn.execute(
        "DELETE FROM category_organisations WHERE organisation_id = ?1",
        params![id],
    )?;
    let affected = conn.execute("DELETE FROM organisations WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

/// Replace an organisation's category associations with the given set.
pub fn set_organisation_categories(
    conn: &Connection,
    organisation_id: &str,
    category_ids: &[String],
) -> Result<()> {
    conn.execute(
        "DELETE FROM category_organisations WHERE organisation_id = ?1",
        params![organisation_id],
    )?;
    for category_id in category_ids {
        conn.execute(
            "INSERT OR IGNORE INTO category_organisations (id, organisation_id, category_id)
             VALUES (?1, ?2, ?3)",
            params![gen_id(), organisation_id, category_id],
        )?;
    }
    Ok(())
}

pub fn organisation_categories(conn: &Connection, organisation_id: &str) -> Result<Vec<Category>> {
    query_all(
        conn,
        "SELECT c.id, c.name, c.created_at FROM categories c
         JOIN category_organisations co ON co.category_id = c.id
         WHERE co.organisation_id = ?1
         ORDER BY c.name",
        &[&organisation_id],
    )
}

// ============ Categories ============

pub fn create_category(conn: &Connection, input: &CreateCategory) -> Result<Category> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![&id, &input.name, now],
    )?;

    Ok(Category {
        id,
        name: input.name.clone(),
        created_at: now,
    })
}

pub fn get_category_by_id(conn: &Connection, id: &str) -> Result<Option<Category>> {
    query_one(
        conn,
        &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLS),
        &[&id],
    )
}

/// `(name, id)` pairs for the category drop-down, ordered by name.
pub fn category_drop_down_options(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT name, id FROM categories ORDER BY name")?;
    let options = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(options)
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser, api_key: &str) -> Result<User> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO users (id, email, name, api_key, admin, organisation_id,
                            pending_organisation_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8)",
        params![
            &id,
            &input.email,
            &input.name,
            api_key,
            input.admin,
            &input.organisation_id,
            now,
            now,
        ],
    )?;

    Ok(User {
        id,
        email: input.email.clone(),
        name: input.name.clone(),
        admin: input.admin,
        organisation_id: input.organisation_id.clone(),
        pending_organisation_id: None,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE api_key = ?1", USER_COLS),
        &[&api_key],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

/// Make the user the organisation's admin, clearing any matching pending
/// request. Returns false when the user does not exist.
pub fn grant_org_admin(conn: &Connection, user_id: &str, organisation_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users
         SET organisation_id = ?2,
             pending_organisation_id = CASE
                 WHEN pending_organisation_id = ?2 THEN NULL
                 ELSE pending_organisation_id
             END,
             updated_at = ?3
         WHERE id = ?1",
        params![user_id, organisation_id, now()],
    )?;
    Ok(affected > 0)
}

/// Record an outstanding admin request for the organisation.
pub fn set_pending_org_admin(
    conn: &Connection,
    user_id: &str,
    organisation_id: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET pending_organisation_id = ?2, updated_at = ?3 WHERE id = ?1",
        params![user_id, organisation_id, now()],
    )?;
    Ok(affected > 0)
}
