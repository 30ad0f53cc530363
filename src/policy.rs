//! Authorization policy for the organisation CRUD actions.
//!
//! One pure decision table instead of per-handler conditionals: given the
//! action and the (possibly absent) current user, `authorise` either allows
//! the action or names the redirect that refuses it. Handlers translate a
//! [`Denial`] straight into a response and never re-derive permissions.

use crate::error::msg;
use crate::models::{Organisation, User};
use crate::view::{organisation_path, organisations_path, Redirect};

/// A permission-gated action on organisations. Read-only pages (index,
/// search, show) are open to everyone and never consult the policy.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Render the creation form
    New,
    /// Create an organisation
    Create,
    /// Render the edit form for an organisation
    Edit { organisation: &'a Organisation },
    /// Apply an update; `organisation` is None when the submitted id
    /// matched nothing, in which case the id still names the redirect target
    Update {
        id: &'a str,
        organisation: Option<&'a Organisation>,
    },
    /// Delete an organisation. Decided on the id alone so a refused destroy
    /// never even looks the organisation up.
    Destroy { id: &'a str },
}

/// A refused action: where to send the user, and with what notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    SignIn,
    ToIndex { notice: Option<&'static str> },
    ToOrganisation {
        id: String,
        notice: Option<&'static str>,
    },
}

impl Denial {
    pub fn into_redirect(self) -> Redirect {
        let (location, notice) = match self {
            Denial::SignIn => return Redirect::sign_in(),
            Denial::ToIndex { notice } => (organisations_path(), notice),
            Denial::ToOrganisation { id, notice } => (organisation_path(&id), notice),
        };
        match notice {
            Some(notice) => Redirect::to(location).with_notice(notice),
            None => Redirect::to(location),
        }
    }
}

/// The sign-in gate shared by every gated action. It applies before any
/// lookup, so an unknown id still sends anonymous visitors to sign-in
/// rather than a not-found page.
pub fn signed_in(user: Option<&User>) -> Result<&User, Denial> {
    user.ok_or(Denial::SignIn)
}

/// The decision table. Signed-out users are sent to sign-in for every
/// gated action; create/destroy require the global admin capability; edit
/// and update require the per-organisation edit capability.
pub fn authorise(user: Option<&User>, action: Action<'_>) -> Result<(), Denial> {
    let Some(user) = user else {
        return Err(Denial::SignIn);
    };

    match action {
        Action::New => Ok(()),
        Action::Create => {
            if user.admin {
                Ok(())
            } else {
                Err(Denial::ToIndex {
                    notice: Some(msg::NO_PERMISSION),
                })
            }
        }
        Action::Edit { organisation } => {
            if user.can_edit(organisation) {
                Ok(())
            } else {
                Err(Denial::ToOrganisation {
                    id: organisation.id.clone(),
                    notice: None,
                })
            }
        }
        Action::Update { id, organisation } => match organisation {
            Some(organisation) if user.can_edit(organisation) => Ok(()),
            _ => Err(Denial::ToOrganisation {
                id: id.to_string(),
                notice: Some(msg::NO_PERMISSION),
            }),
        },
        Action::Destroy { id } => {
            if user.admin {
                Ok(())
            } else {
                Err(Denial::ToOrganisation {
                    id: id.to_string(),
                    notice: None,
                })
            }
        }
    }
}
