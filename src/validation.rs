//! Client-side checks run before anything is sent to the backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Medicine, NewUser, PatientRegistration, Prescription, UserUpdate};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Age must be greater than zero")]
    InvalidAge,
    #[error("Fees must be a non-negative amount")]
    InvalidFees,
    #[error("Please provide diagnosis and at least one complete medicine")]
    Prescription,
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

fn check_fees(fees: Option<f64>) -> Result<(), ValidationError> {
    match fees {
        Some(f) if !f.is_finite() || f < 0.0 => Err(ValidationError::InvalidFees),
        _ => Ok(()),
    }
}

// ═══════════════════════════════════════════════════════════
// Prescription draft
// ═══════════════════════════════════════════════════════════

/// Prescription as typed by the doctor: medicine rows may be half filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionDraft {
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub notes: String,
}

impl PrescriptionDraft {
    /// Drops incomplete medicine rows. Fails when the diagnosis is blank or
    /// no complete medicine remains.
    pub fn validate(&self) -> Result<Prescription, ValidationError> {
        let medicines: Vec<Medicine> = self
            .medicines
            .iter()
            .filter(|m| m.is_complete())
            .cloned()
            .collect();

        if self.diagnosis.trim().is_empty() || medicines.is_empty() {
            return Err(ValidationError::Prescription);
        }

        let notes = self.notes.trim();
        Ok(Prescription {
            diagnosis: self.diagnosis.clone(),
            medicines,
            notes: (!notes.is_empty()).then(|| self.notes.clone()),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Forms
// ═══════════════════════════════════════════════════════════

impl PatientRegistration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.full_name, "Full name")?;
        require(&self.mobile_number, "Mobile number")?;
        require(&self.address, "Address")?;
        if self.age == 0 {
            return Err(ValidationError::InvalidAge);
        }
        require(&self.disease, "Disease")?;
        require(&self.doctor, "Doctor")?;
        check_fees(Some(self.fees))
    }
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.full_name, "Full name")?;
        require(&self.email, "Email")?;
        check_email(&self.email)?;
        require(&self.password, "Password")?;
        check_fees(self.fees)
    }
}

impl UserUpdate {
    /// Only the fields being changed are checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref name) = self.full_name {
            require(name, "Full name")?;
        }
        if let Some(ref email) = self.email {
            check_email(email)?;
        }
        check_fees(self.fees)
    }
}
