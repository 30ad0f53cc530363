use serde::{Deserialize, Serialize};

use crate::error::msg;

/// A listed community organisation (charity, volunteer group, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organisation {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub telephone: Option<String>,
    /// Free-text pointer to how the organisation takes donations
    pub donation_info: Option<String>,
    pub publish_address: bool,
    pub publish_phone: bool,
    pub publish_email: bool,
    /// Geographic coordinates; either may be missing when the address
    /// has not been geocoded yet
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Organisation {
    /// Build an unsaved instance from form input, for re-rendering the
    /// creation form after a validation failure.
    pub fn unsaved(input: &CreateOrganisation) -> Self {
        Self {
            id: String::new(),
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
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Overlay submitted update fields on this organisation without saving,
    /// so a failed update can re-render the edit form with the user's input.
    pub fn with_update(&self, input: &UpdateOrganisation) -> Self {
        let mut merged = self.clone();
        if let Some(ref name) = input.name {
            merged.name = name.clone();
        }
        if let Some(ref description) = input.description {
            merged.description = Some(description.clone());
        }
        if let Some(ref address) = input.address {
            merged.address = Some(address.clone());
        }
        if let Some(ref postcode) = input.postcode {
            merged.postcode = Some(postcode.clone());
        }
        if let Some(ref email) = input.email {
            merged.email = Some(email.clone());
        }
        if let Some(ref website) = input.website {
            merged.website = Some(website.clone());
        }
        if let Some(ref telephone) = input.telephone {
            merged.telephone = Some(telephone.clone());
        }
        if let Some(ref donation_info) = input.donation_info {
            merged.donation_info = Some(donation_info.clone());
        }
        if let Some(publish_address) = input.publish_address {
            merged.publish_address = publish_address;
        }
        if let Some(publish_phone) = input.publish_phone {
            merged.publish_phone = publish_phone;
        }
        if let Some(publish_email) = input.publish_email {
            merged.publish_email = publish_email;
        }
        if let Some(latitude) = input.latitude {
            merged.latitude = Some(latitude);
        }
        if let Some(longitude) = input.longitude {
            merged.longitude = Some(longitude);
        }
        merged
    }
}

/// Request body for creating an organisation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateOrganisation {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub telephone: Option<String>,
    pub donation_info: Option<String>,
    #[serde(default)]
    pub publish_address: bool,
    #[serde(default)]
    pub publish_phone: bool,
    #[serde(default)]
    pub publish_email: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Categories to associate with the new organisation
    #[serde(default)]
    pub category_ids: Vec<String>,
}

impl CreateOrganisation {
    /// Validation failures are normal outcomes here, not errors: the
    /// creation form is re-rendered listing them.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(msg::NAME_EMPTY.to_string());
        }
        errors
    }
}

/// Request body for the admin-aware update operation.
///
/// Carries the ordinary attribute fields plus an auxiliary
/// `admin_email_to_add` side-channel: when present, the user with that email
/// is granted admin rights over the organisation alongside the attribute
/// update.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateOrganisation {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub telephone: Option<String>,
    pub donation_info: Option<String>,
    pub publish_address: Option<bool>,
    pub publish_phone: Option<bool>,
    pub publish_email: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Replace the category associations when present
    pub category_ids: Option<Vec<String>>,
    /// Email of a user to grant organisation-admin rights to
    pub admin_email_to_add: Option<String>,
}

impl UpdateOrganisation {
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                errors.push(msg::NAME_EMPTY.to_string());
            }
        }
        errors
    }

    /// The admin email, if one was actually submitted (blank counts as absent).
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email_to_add
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}
