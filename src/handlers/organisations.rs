//! Request handlers for the organisation directory.
//!
//! Each action produces either a rendered page (template + view assigns) or
//! a redirect with an optional one-shot notice; see [`crate::view`]. The
//! gated actions consult the policy table in [`crate::policy`] before
//! touching the store.

use axum::{
    extract::{Extension, State},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::markers::build_map_markers;
use crate::middleware::{resolve_current_user, AuthContext};
use crate::models::{CreateOrganisation, Organisation, UpdateOrganisation};
use crate::pagination::{Paginated, PaginationQuery};
use crate::policy::{self, Action};
use crate::view::{organisation_path, organisations_path, templates, Page, Redirect};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/organisations", get(index).post(create))
        .route("/organisations/search", get(search))
        .route("/organisations/new", get(new_form))
        .route("/organisations/{id}", get(show).put(update).delete(destroy))
        .route("/organisations/{id}/edit", get(edit_form))
        .layer(middleware::from_fn_with_state(state, resolve_current_user))
}

/// All organisations, most recent first.
pub async fn index(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let limit = pagination.limit();
    let offset = pagination.offset();

    let (organisations, total) = queries::list_organisations_paginated(&conn, limit, offset)?;
    let markers = build_map_markers(&organisations);
    let category_options = queries::category_drop_down_options(&conn)?;

    Ok(Page::render(
        templates::INDEX,
        json!({
            "organisations": Paginated::new(organisations, total, limit, offset),
            "markers": markers,
            "category_options": category_options,
        }),
    )
    .into_response())
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
    /// Free-text search term
    pub q: Option<String>,
    /// Category filter; an empty string is a real (never-matching) value,
    /// not absence
    pub category_id: Option<String>,
}

/// Keyword + category search over the same listing template as the index.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let limit = pagination.limit();
    let offset = pagination.offset();

    let (organisations, total) = queries::search_organisations(
        &conn,
        params.q.as_deref(),
        params.category_id.as_deref(),
        limit,
        offset,
    )?;
    let markers = build_map_markers(&organisations);
    let category = match params.category_id.as_deref() {
        Some(id) => queries::get_category_by_id(&conn, id)?,
        None => None,
    };
    let category_options = queries::category_drop_down_options(&conn)?;

    let mut page = Page::render(
        templates::INDEX,
        json!({
            "organisations": Paginated::new(organisations, total, limit, offset),
            "markers": markers,
            "query_term": params.q,
            "category": category,
            "category_options": category_options,
        }),
    );
    if total == 0 {
        page = page.with_alert(msg::SEARCH_NOT_FOUND);
    }

    Ok(page.into_response())
}

/// One organisation, its markers, and the viewer's capability flags.
pub async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let organisation = queries::get_organisation_by_id(&conn, &id)?
        .or_not_found(msg::ORGANISATION_NOT_FOUND)?;

    let markers = build_map_markers(std::slice::from_ref(&organisation));
    let categories = queries::organisation_categories(&conn, &id)?;

    // Anonymous viewers see nothing editable and the "become admin" prompt;
    // the volunteer-op capability is left unevaluated for them, so the
    // assign is simply absent.
    let (editable, grabbable, can_create_volunteer_op) = match ctx.user.as_ref() {
        Some(user) => (
            user.can_edit(&organisation),
            user.can_request_org_admin(&organisation),
            Some(user.can_create_volunteer_ops(&organisation)),
        ),
        None => (false, true, None),
    };

    let mut assigns = json!({
        "organisation": organisation,
        "categories": categories,
        "markers": markers,
        "editable": editable,
        "grabbable": grabbable,
    });
    if let Some(can_create) = can_create_volunteer_op {
        assigns["can_create_volunteer_op"] = json!(can_create);
    }

    Ok(Page::render(templates::SHOW, assigns).into_response())
}

/// Blank creation form; any signed-in user may open it.
pub async fn new_form(Extension(ctx): Extension<AuthContext>) -> Result<Response> {
    if let Err(denial) = policy::authorise(ctx.user.as_ref(), Action::New) {
        return Ok(denial.into_redirect().into_response());
    }

    Ok(Page::render(
        templates::NEW,
        json!({ "organisation": Organisation::unsaved(&CreateOrganisation::default()) }),
    )
    .into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<CreateOrganisation>,
) -> Result<Response> {
    // A refused create never constructs anything: the policy runs before
    // the input is even validated.
    if let Err(denial) = policy::authorise(ctx.user.as_ref(), Action::Create) {
        return Ok(denial.into_redirect().into_response());
    }

    let errors = input.validation_errors();
    if !errors.is_empty() {
        return Ok(Page::render(
            templates::NEW,
            json!({ "organisation": Organisation::unsaved(&input), "errors": errors }),
        )
        .into_response());
    }

    let conn = state.db.get()?;
    let organisation = queries::create_organisation(&conn, &input)?;
    tracing::info!(organisation_id = %organisation.id, name = %organisation.name, "organisation created");

    Ok(Redirect::to(organisation_path(&organisation.id)).into_response())
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response> {
    let user = match policy::signed_in(ctx.user.as_ref()) {
        Ok(user) => user,
        Err(denial) => return Ok(denial.into_redirect().into_response()),
    };

    let conn = state.db.get()?;
    let organisation = queries::get_organisation_by_id(&conn, &id)?
        .or_not_found(msg::ORGANISATION_NOT_FOUND)?;

    if let Err(denial) = policy::authorise(
        Some(user),
        Action::Edit {
            organisation: &organisation,
        },
    ) {
        return Ok(denial.into_redirect().into_response());
    }

    let categories = queries::organisation_categories(&conn, &id)?;
    let category_options = queries::category_drop_down_options(&conn)?;

    Ok(Page::render(
        templates::EDIT,
        json!({
            "organisation": organisation,
            "categories": categories,
            "category_options": category_options,
        }),
    )
    .into_response())
}

/// The admin-aware update: ordinary attribute fields plus an optional
/// `admin_email_to_add` that grants that user admin rights over the
/// organisation in the same request.
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(input): Json<UpdateOrganisation>,
) -> Result<Response> {
    let user = match policy::signed_in(ctx.user.as_ref()) {
        Ok(user) => user,
        Err(denial) => return Ok(denial.into_redirect().into_response()),
    };

    let conn = state.db.get()?;
    let existing = queries::get_organisation_by_id(&conn, &id)?;

    // A failed lookup is refused exactly like a failed permission check,
    // with the submitted id naming the redirect target.
    if let Err(denial) = policy::authorise(
        Some(user),
        Action::Update {
            id: &id,
            organisation: existing.as_ref(),
        },
    ) {
        return Ok(denial.into_redirect().into_response());
    }
    let organisation = existing
        .ok_or_else(|| AppError::Internal("update authorised without a target".to_string()))?;

    let mut errors = input.validation_errors();

    // Resolve the admin side-channel before touching attributes, so an
    // unknown email becomes a validation failure rather than a partial
    // update.
    let admin_to_add = match input.admin_email() {
        Some(email) => match queries::get_user_by_email(&conn, email)? {
            Some(found) => Some(found),
            None => {
                errors.push(msg::ADMIN_EMAIL_UNKNOWN.to_string());
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return Ok(Page::render(
            templates::EDIT,
            json!({
                "organisation": organisation.with_update(&input),
                "errors": errors,
            }),
        )
        .into_response());
    }

    let organisation = queries::update_organisation(&conn, &id, &input)?
        .or_not_found(msg::ORGANISATION_NOT_FOUND)?;

    if let Some(new_admin) = admin_to_add {
        queries::grant_org_admin(&conn, &new_admin.id, &organisation.id)?;
        tracing::info!(
            user_id = %new_admin.id,
            organisation_id = %organisation.id,
            "organisation admin added"
        );
    }

    Ok(Redirect::to(organisation_path(&organisation.id)).into_response())
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response> {
    // Decided on the id alone: a refused destroy never looks the row up.
    if let Err(denial) = policy::authorise(ctx.user.as_ref(), Action::Destroy { id: &id }) {
        return Ok(denial.into_redirect().into_response());
    }

    let conn = state.db.get()?;
    let organisation = queries::get_organisation_by_id(&conn, &id)?
        .or_not_found(msg::ORGANISATION_NOT_FOUND)?;
    queries::delete_organisation(&conn, &organisation.id)?;
    tracing::info!(organisation_id = %organisation.id, "organisation destroyed");

    Ok(Redirect::to(organisations_path()).into_response())
}
