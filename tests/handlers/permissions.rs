//! Integration tests for the permission-gated CRUD actions: sign-in
//! redirects, the admin gates on create/destroy, the per-organisation edit
//! gate on edit/update, and the admin-aware update.

use axum::http::StatusCode;
use serde_json::json;

#[path = "../common/mod.rs"]
mod common;
use common::*;

// ============================================================================
// Sign-in gate
// ============================================================================

#[tokio::test]
async fn unauthenticated_gated_actions_redirect_to_sign_in() {
    let (app, state) = test_app();

    let org;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
    }

    let attempts = [
        ("GET", "/organisations/new".to_string(), None),
        ("GET", format!("/organisations/{}/edit", org.id), None),
        (
            "POST",
            "/organisations".to_string(),
            Some(json!({"name": "New Org"})),
        ),
        (
            "PUT",
            format!("/organisations/{}", org.id),
            Some(json!({"name": "Renamed"})),
        ),
        ("DELETE", format!("/organisations/{}", org.id), None),
    ];

    for (method, uri, body) in attempts {
        let (status, location, _) = send(&app, method, &uri, None, body).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "{} {}", method, uri);
        assert_eq!(
            location.as_deref(),
            Some("/users/sign_in"),
            "{} {}",
            method,
            uri
        );
    }

    // nothing was created, renamed, or deleted
    let conn = state.db.get().unwrap();
    assert_eq!(organisation_count(&conn), 1);
    let unchanged = queries::get_organisation_by_id(&conn, &org.id).unwrap().unwrap();
    assert_eq!(unchanged.name, "Test Org");
}

// ============================================================================
// New
// ============================================================================

#[tokio::test]
async fn new_renders_a_blank_form_for_any_signed_in_user() {
    let (app, state) = test_app();

    let api_key;
    {
        let conn = state.db.get().unwrap();
        let (_user, key) = create_test_user(&conn, "user@example.com", false, None);
        api_key = key;
    }

    let (status, _, body) = send(&app, "GET", "/organisations/new", Some(&api_key), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], "organisations/new");
    assert_eq!(body["layout"], "two_columns");
    assert_eq!(body["assigns"]["organisation"]["name"], "");
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_as_non_admin_is_refused_without_constructing_anything() {
    let (app, state) = test_app();

    let api_key;
    {
        let conn = state.db.get().unwrap();
        let (_user, key) = create_test_user(&conn, "user@example.com", false, None);
        api_key = key;
    }

    let (status, location, body) = send(
        &app,
        "POST",
        "/organisations",
        Some(&api_key),
        Some(json!({"name": "Sneaky Org"})),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/organisations"));
    assert_eq!(body["notice"], "You don't have permission");

    let conn = state.db.get().unwrap();
    assert_eq!(organisation_count(&conn), 0);
}

#[tokio::test]
async fn create_as_admin_persists_and_redirects_to_the_new_organisation() {
    let (app, state) = test_app();

    let api_key;
    let category;
    {
        let conn = state.db.get().unwrap();
        let (_user, key) = create_test_user(&conn, "admin@example.com", true, None);
        category = create_test_category(&conn, "Advice & Support");
        api_key = key;
    }

    let (status, location, _) = send(
        &app,
        "POST",
        "/organisations",
        Some(&api_key),
        Some(json!({
            "name": "Happy Friends",
            "description": "Do nice things",
            "address": "22 Pinner Road",
            "postcode": "12345",
            "email": "happy@annoting.com",
            "website": "www.happyplace.com",
            "telephone": "123-456-7890",
            "donation_info": "www.giveusmoney.com",
            "publish_address": true,
            "publish_phone": true,
            "publish_email": true,
            "category_ids": [category.id],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    let location = location.unwrap();
    let id = location
        .strip_prefix("/organisations/")
        .expect("redirect should target the new organisation's page");

    let conn = state.db.get().unwrap();
    let created = queries::get_organisation_by_id(&conn, id).unwrap().unwrap();
    assert_eq!(created.name, "Happy Friends");
    assert_eq!(created.donation_info.as_deref(), Some("www.giveusmoney.com"));
    assert!(created.publish_email);
    let categories = queries::organisation_categories(&conn, id).unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Advice & Support");
}

#[tokio::test]
async fn create_with_a_blank_name_rerenders_the_form_with_the_unsaved_instance() {
    let (app, state) = test_app();

    let api_key;
    {
        let conn = state.db.get().unwrap();
        let (_user, key) = create_test_user(&conn, "admin@example.com", true, None);
        api_key = key;
    }

    let (status, _, body) = send(
        &app,
        "POST",
        "/organisations",
        Some(&api_key),
        Some(json!({"name": "", "description": "Kept user input"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "a failed save re-renders, not errors");
    assert_eq!(body["template"], "organisations/new");
    assert_eq!(body["assigns"]["errors"][0], msg::NAME_EMPTY);
    assert_eq!(
        body["assigns"]["organisation"]["description"], "Kept user input",
        "the unsaved instance keeps the submitted input"
    );

    let conn = state.db.get().unwrap();
    assert_eq!(organisation_count(&conn), 0);
}

// ============================================================================
// Edit
// ============================================================================

#[tokio::test]
async fn edit_renders_the_form_for_a_user_who_can_edit() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
        let (_user, key) = create_test_user(&conn, "owner@example.com", false, Some(&org.id));
        api_key = key;
    }

    let (status, _, body) = send(
        &app,
        "GET",
        &format!("/organisations/{}/edit", org.id),
        Some(&api_key),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], "organisations/edit");
    assert_eq!(body["layout"], "two_columns");
    assert_eq!(body["assigns"]["organisation"]["id"], org.id.as_str());
}

#[tokio::test]
async fn edit_as_a_user_who_cannot_edit_redirects_to_the_organisation() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
        let (_user, key) = create_test_user(&conn, "visitor@example.com", false, None);
        api_key = key;
    }

    let (status, location, body) = send(
        &app,
        "GET",
        &format!("/organisations/{}/edit", org.id),
        Some(&api_key),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, Some(format!("/organisations/{}", org.id)));
    assert!(body.get("notice").is_none(), "edit refusals carry no notice");
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_as_an_editor_applies_changes_and_redirects() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
        let (_user, key) = create_test_user(&conn, "owner@example.com", false, Some(&org.id));
        api_key = key;
    }

    let (status, location, _) = send(
        &app,
        "PUT",
        &format!("/organisations/{}", org.id),
        Some(&api_key),
        Some(json!({"donation_info": "http://www.friendly.com/donate"})),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, Some(format!("/organisations/{}", org.id)));

    let conn = state.db.get().unwrap();
    let updated = queries::get_organisation_by_id(&conn, &org.id).unwrap().unwrap();
    assert_eq!(
        updated.donation_info.as_deref(),
        Some("http://www.friendly.com/donate")
    );
    assert_eq!(updated.name, "Test Org", "unsubmitted fields are untouched");
}

#[tokio::test]
async fn update_with_admin_email_grants_organisation_admin_rights() {
    let (app, state) = test_app();

    let org;
    let api_key;
    let new_admin;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
        let (_user, key) = create_test_user(&conn, "admin@example.com", true, None);
        let (user, _) = create_test_user(&conn, "new-admin@example.com", false, None);
        api_key = key;
        new_admin = user;
    }

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/organisations/{}", org.id),
        Some(&api_key),
        Some(json!({
            "donation_info": "http://www.friendly.com/donate",
            "admin_email_to_add": "new-admin@example.com",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);

    let conn = state.db.get().unwrap();
    let granted = queries::get_user_by_email(&conn, &new_admin.email).unwrap().unwrap();
    assert_eq!(granted.organisation_id.as_deref(), Some(org.id.as_str()));
}

#[tokio::test]
async fn update_with_an_unknown_admin_email_rerenders_the_edit_form() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
        let (_user, key) = create_test_user(&conn, "owner@example.com", false, Some(&org.id));
        api_key = key;
    }

    let (status, _, body) = send(
        &app,
        "PUT",
        &format!("/organisations/{}", org.id),
        Some(&api_key),
        Some(json!({
            "name": "Renamed Org",
            "admin_email_to_add": "nobody@example.com",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], "organisations/edit");
    assert_eq!(body["assigns"]["errors"][0], msg::ADMIN_EMAIL_UNKNOWN);
    assert_eq!(
        body["assigns"]["organisation"]["name"], "Renamed Org",
        "the instance retains the submitted input"
    );

    // nothing was persisted
    let conn = state.db.get().unwrap();
    let unchanged = queries::get_organisation_by_id(&conn, &org.id).unwrap().unwrap();
    assert_eq!(unchanged.name, "Test Org");
}

#[tokio::test]
async fn update_as_a_non_editor_is_refused_with_the_fixed_notice() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
        let (_user, key) = create_test_user(&conn, "visitor@example.com", false, None);
        api_key = key;
    }

    let (status, location, body) = send(
        &app,
        "PUT",
        &format!("/organisations/{}", org.id),
        Some(&api_key),
        Some(json!({"name": "Hijacked"})),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, Some(format!("/organisations/{}", org.id)));
    assert_eq!(body["notice"], "You don't have permission");

    let conn = state.db.get().unwrap();
    let unchanged = queries::get_organisation_by_id(&conn, &org.id).unwrap().unwrap();
    assert_eq!(unchanged.name, "Test Org");
}

#[tokio::test]
async fn update_of_a_missing_organisation_redirects_to_the_submitted_id() {
    let (app, state) = test_app();

    let api_key;
    {
        let conn = state.db.get().unwrap();
        let (_user, key) = create_test_user(&conn, "visitor@example.com", false, None);
        api_key = key;
    }

    let (status, location, body) = send(
        &app,
        "PUT",
        "/organisations/9999",
        Some(&api_key),
        Some(json!({"name": "Ghost"})),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/organisations/9999"));
    assert_eq!(body["notice"], "You don't have permission");

    let conn = state.db.get().unwrap();
    assert_eq!(organisation_count(&conn), 0, "nothing was created on the way");
}

#[tokio::test]
async fn update_with_no_fields_is_a_no_op_redirect() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Test Org");
        let (_user, key) = create_test_user(&conn, "owner@example.com", false, Some(&org.id));
        api_key = key;
    }

    let (status, location, _) = send(
        &app,
        "PUT",
        &format!("/organisations/{}", org.id),
        Some(&api_key),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, Some(format!("/organisations/{}", org.id)));
}

// ============================================================================
// Destroy
// ============================================================================

#[tokio::test]
async fn destroy_as_admin_deletes_and_redirects_to_the_index() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Doomed Org");
        let (_user, key) = create_test_user(&conn, "admin@example.com", true, None);
        api_key = key;
    }

    let (status, location, _) = send(
        &app,
        "DELETE",
        &format!("/organisations/{}", org.id),
        Some(&api_key),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/organisations"));

    let conn = state.db.get().unwrap();
    assert!(queries::get_organisation_by_id(&conn, &org.id).unwrap().is_none());
}

#[tokio::test]
async fn destroy_as_non_admin_is_refused_and_redirects_to_the_organisation() {
    let (app, state) = test_app();

    let org;
    let api_key;
    {
        let conn = state.db.get().unwrap();
        org = create_test_organisation(&conn, "Protected Org");
        // even the organisation's own admin cannot destroy it
        let (_user, key) = create_test_user(&conn, "owner@example.com", false, Some(&org.id));
        api_key = key;
    }

    let (status, location, _) = send(
        &app,
        "DELETE",
        &format!("/organisations/{}", org.id),
        Some(&api_key),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, Some(format!("/organisations/{}", org.id)));

    let conn = state.db.get().unwrap();
    assert!(queries::get_organisation_by_id(&conn, &org.id).unwrap().is_some());
}

#[tokio::test]
async fn destroy_of_an_unknown_id_as_non_admin_still_redirects_without_lookup() {
    let (app, state) = test_app();

    let api_key;
    {
        let conn = state.db.get().unwrap();
        let (_user, key) = create_test_user(&conn, "visitor@example.com", false, None);
        api_key = key;
    }

    // the refusal is decided on the id alone, so no not-found leaks out
    let (status, location, _) = send(&app, "DELETE", "/organisations/37", Some(&api_key), None).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/organisations/37"));
}
