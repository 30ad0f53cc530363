//! Page and redirect outcomes handed back to the template layer.
//!
//! Every action resolves to one of two shapes: a rendered page (template +
//! layout + named assigns) or a redirect (target + optional one-shot
//! notice). The notice is an explicit field of the response, never ambient
//! state, and lives only for the response that carries it.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Template names. List-style actions share the index template; detail and
/// form actions each have their own.
pub mod templates {
    pub const INDEX: &str = "organisations/index";
    pub const SHOW: &str = "organisations/show";
    pub const NEW: &str = "organisations/new";
    pub const EDIT: &str = "organisations/edit";
}

/// Every organisation page uses the two-column layout.
pub const LAYOUT_TWO_COLUMNS: &str = "two_columns";

/// Where unauthenticated users are sent to sign in.
pub const SIGN_IN_PATH: &str = "/users/sign_in";

pub fn organisations_path() -> String {
    "/organisations".to_string()
}

pub fn organisation_path(id: &str) -> String {
    format!("/organisations/{}", id)
}

/// A rendered page: template, layout, named view assigns, and an optional
/// one-shot alert (e.g. "no search results").
#[derive(Debug, Serialize)]
pub struct Page {
    pub template: &'static str,
    pub layout: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    pub assigns: Value,
}

impl Page {
    pub fn render(template: &'static str, assigns: Value) -> Self {
        Self {
            template,
            layout: LAYOUT_TWO_COLUMNS,
            alert: None,
            assigns,
        }
    }

    pub fn with_alert(mut self, alert: impl Into<String>) -> Self {
        self.alert = Some(alert.into());
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// A redirect outcome, optionally carrying the one-shot notice shown on the
/// page being redirected to.
#[derive(Debug, Serialize)]
pub struct Redirect {
    #[serde(rename = "redirect")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            notice: None,
        }
    }

    pub fn sign_in() -> Self {
        Self::to(SIGN_IN_PATH)
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, self.location.clone())],
            Json(self),
        )
            .into_response()
    }
}
