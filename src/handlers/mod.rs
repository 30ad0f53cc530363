pub mod organisations;

use axum::Router;

use crate::db::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    organisations::router(state)
}
