use serde::{Deserialize, Serialize};

use super::{de_opt_amount, Role};

/// Staff account as returned by `/admin/users`, `/doctor` and login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    /// Consultation fee, doctors only.
    #[serde(
        default,
        deserialize_with = "de_opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

impl User {
    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }
}

/// Body of `POST /admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

/// Body of `PUT /admin/users/{id}`. Role is fixed at creation and not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Blank means "keep the current password"; never sent in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the changed fields to a local copy of the user.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(ref name) = self.full_name {
            user.full_name = name.clone();
        }
        if let Some(ref email) = self.email {
            user.email = email.clone();
        }
        if let Some(ref spec) = self.specialization {
            user.specialization = Some(spec.clone());
        }
        if let Some(fees) = self.fees {
            user.fees = Some(fees);
        }
        if let Some(ref mobile) = self.mobile_number {
            user.mobile_number = Some(mobile.clone());
        }
    }
}
