use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{de_count, de_opt_amount, truthy_fee, PatientStatus, Prescription};

/// Bucket label for patients whose doctor is not populated.
pub const UNKNOWN_DOCTOR: &str = "Unknown Doctor";

/// Doctor as embedded in a patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub fees: Option<f64>,
}

/// The backend populates `doctor` on list endpoints and returns a bare id
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DoctorRef {
    Populated(DoctorSummary),
    Id(String),
}

impl DoctorRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Populated(d) => &d.id,
            Self::Id(id) => id,
        }
    }

    pub fn summary(&self) -> Option<&DoctorSummary> {
        match self {
            Self::Populated(d) => Some(d),
            Self::Id(_) => None,
        }
    }
}

/// Patient registration as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "de_count")]
    pub age: u32,
    /// Presenting issue as typed at the reception desk.
    #[serde(default)]
    pub disease: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorRef>,
    /// Doctor's fee copied at registration time.
    #[serde(
        default,
        deserialize_with = "de_opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub fees: Option<f64>,
    #[serde(default, deserialize_with = "de_count")]
    pub token_number: u32,
    pub registration_date: DateTime<Utc>,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription: Option<Prescription>,
}

impl Patient {
    pub fn doctor_summary(&self) -> Option<&DoctorSummary> {
        self.doctor.as_ref().and_then(DoctorRef::summary)
    }

    /// Display name of the attending doctor, or [`UNKNOWN_DOCTOR`].
    pub fn doctor_name(&self) -> &str {
        self.doctor_summary()
            .map(|d| d.full_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_DOCTOR)
    }

    /// Fee collected for this visit: the stored fee if non-zero, else the
    /// doctor's current fee if non-zero, else zero.
    pub fn effective_fee(&self) -> f64 {
        truthy_fee(self.fees)
            .or_else(|| truthy_fee(self.doctor_summary().and_then(|d| d.fees)))
            .unwrap_or(0.0)
    }

    pub fn is_completed(&self) -> bool {
        self.status == PatientStatus::Completed
    }
}

/// Body of `POST /patient/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRegistration {
    pub full_name: String,
    pub mobile_number: String,
    pub address: String,
    pub age: u32,
    pub disease: String,
    /// Doctor id.
    pub doctor: String,
    /// Snapshot of the doctor's fee; filled in by the reception desk.
    #[serde(default)]
    pub fees: f64,
}
