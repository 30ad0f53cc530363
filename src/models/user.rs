use serde::{Deserialize, Serialize};

use super::Organisation;

/// An authenticated user of the directory.
///
/// `organisation_id` is the organisation this user administers, if any;
/// `pending_organisation_id` is one they have an outstanding admin request
/// for. Global admins can edit everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub admin: bool,
    pub organisation_id: Option<String>,
    pub pending_organisation_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn can_edit(&self, organisation: &Organisation) -> bool {
        self.admin || self.organisation_id.as_deref() == Some(organisation.id.as_str())
    }

    /// Whether this user may ask to become the organisation's admin.
    /// Global admins and the organisation's own admin have nothing to
    /// request; an outstanding request blocks a second one.
    pub fn can_request_org_admin(&self, organisation: &Organisation) -> bool {
        !self.admin
            && self.organisation_id.as_deref() != Some(organisation.id.as_str())
            && self.pending_organisation_id.as_deref() != Some(organisation.id.as_str())
    }

    pub fn can_create_volunteer_ops(&self, organisation: &Organisation) -> bool {
        self.can_edit(organisation)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub organisation_id: Option<String>,
}
