//! Test utilities and fixtures for Signpost integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use signpost::db::{init_db, queries, AppState};
pub use signpost::error::msg;
pub use signpost::models::*;

/// Build the full application router over an in-memory database.
///
/// The pool is capped at one connection so every request sees the same
/// in-memory database; setup connections must be dropped (scoped in a
/// block) before sending requests.
pub fn test_app() -> (Router, AppState) {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    let state = AppState {
        db: pool,
        base_url: "http://localhost:3000".to_string(),
    };

    let app = signpost::handlers::router(state.clone()).with_state(state.clone());

    (app, state)
}

/// Create a test category
pub fn create_test_category(conn: &Connection, name: &str) -> Category {
    queries::create_category(
        conn,
        &CreateCategory {
            name: name.to_string(),
        },
    )
    .expect("Failed to create test category")
}

/// Create a test organisation with coordinates
pub fn create_test_organisation(conn: &Connection, name: &str) -> Organisation {
    create_test_organisation_at(conn, name, Some(51.58), Some(-0.33))
}

/// Create a test organisation with explicit (possibly missing) coordinates
pub fn create_test_organisation_at(
    conn: &Connection,
    name: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Organisation {
    let input = CreateOrganisation {
        name: name.to_string(),
        description: Some(format!("{} description", name)),
        address: Some("64 Pinner Road".to_string()),
        postcode: Some("HA1 4HZ".to_string()),
        latitude,
        longitude,
        ..Default::default()
    };
    queries::create_organisation(conn, &input).expect("Failed to create test organisation")
}

/// Create a test user with an API key. `organisation_id` makes them that
/// organisation's admin; `admin` grants the global capability.
pub fn create_test_user(
    conn: &Connection,
    email: &str,
    admin: bool,
    organisation_id: Option<&str>,
) -> (User, String) {
    let api_key = queries::generate_api_key();
    let input = CreateUser {
        email: email.to_string(),
        name: format!("Test User {}", email),
        admin,
        organisation_id: organisation_id.map(String::from),
    };
    let user = queries::create_user(conn, &input, &api_key).expect("Failed to create test user");
    (user, api_key)
}

/// Pin an organisation's updated_at so ordering tests are deterministic.
pub fn set_updated_at(conn: &Connection, organisation_id: &str, updated_at: i64) {
    conn.execute(
        "UPDATE organisations SET updated_at = ?2 WHERE id = ?1",
        rusqlite::params![organisation_id, updated_at],
    )
    .expect("Failed to set updated_at");
}

pub fn organisation_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM organisations", [], |row| row.get(0))
        .expect("Failed to count organisations")
}

/// Send a request through the app and return (status, Location header,
/// parsed JSON body).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, location, json)
}

/// GET a page anonymously.
pub async fn get_page(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    send(app, "GET", uri, None, None).await
}
