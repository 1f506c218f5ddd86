//! Reception desk: walk-in registration and token issue.

use super::{resume, DeskError};
use crate::api::OpdApi;
use crate::models::{truthy_fee, Patient, PatientRegistration, Role, User};
use crate::session::SessionStore;

pub const REGISTERED: &str = "Patient registered successfully!";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const FETCH_DOCTORS_FAILED: &str = "Failed to fetch doctors";
pub const NO_DOCTORS: &str = "No doctors available. Please contact admin.";

pub struct ReceptionDesk<'a, A: OpdApi + ?Sized> {
    api: &'a A,
    doctors: Vec<User>,
}

impl<'a, A: OpdApi + ?Sized> ReceptionDesk<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            doctors: Vec::new(),
        }
    }

    /// Desk for the persisted receptionist session.
    pub fn open(api: &'a A, store: &SessionStore) -> Result<Self, DeskError> {
        resume(api, store, Role::Receptionist)?;
        Ok(Self::new(api))
    }

    pub fn doctors(&self) -> &[User] {
        &self.doctors
    }

    pub fn refresh_doctors(&mut self) -> Result<&[User], DeskError> {
        self.doctors = self.api.list_doctors()?;
        if self.doctors.is_empty() {
            tracing::warn!("No doctors available");
        }
        Ok(&self.doctors)
    }

    pub fn find_doctor(&self, doctor_id: &str) -> Option<&User> {
        self.doctors.iter().find(|d| d.id == doctor_id)
    }

    /// Fee charged for a visit to `doctor_id`, taken from the last fetched
    /// doctor list. Zero when the doctor is unknown or has no fee.
    pub fn fee_for(&self, doctor_id: &str) -> f64 {
        self.find_doctor(doctor_id)
            .and_then(|d| truthy_fee(d.fees))
            .unwrap_or(0.0)
    }

    /// Register a patient. The fee sent is the selected doctor's current fee
    /// and stays with the record even if the doctor's fee changes later.
    /// Returns the stored patient, including its token number.
    pub fn register_patient(&self, form: &PatientRegistration) -> Result<Patient, DeskError> {
        let mut registration = form.clone();
        registration.fees = self.fee_for(&registration.doctor);
        registration.validate()?;

        let patient = self.api.register_patient(&registration)?;
        tracing::info!(
            patient_id = %patient.id,
            token = patient.token_number,
            fees = registration.fees,
            "Patient registered"
        );
        Ok(patient)
    }
}
