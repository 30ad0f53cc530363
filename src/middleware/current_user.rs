use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::{queries, AppState};
use crate::models::User;

/// The authenticated-user context attached to every organisation request.
///
/// Resolution never rejects: a missing or unknown credential yields an
/// anonymous context, and the policy layer decides what anonymous visitors
/// may do.
#[derive(Clone, Default)]
pub struct AuthContext {
    pub user: Option<User>,
}

pub async fn resolve_current_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let user = match api_key {
        Some(api_key) => {
            let conn = state
                .db
                .get()
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            queries::get_user_by_api_key(&conn, api_key)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        }
        None => None,
    };

    request.extensions_mut().insert(AuthContext { user });

    Ok(next.run(request).await)
}
