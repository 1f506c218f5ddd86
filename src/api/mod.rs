//! API gateway to the external OPD service.
//!
//! All persistence and business rules live in the backend. This module
//! only moves JSON across HTTP: `OpdApi` is the seam, `HttpOpdClient` the
//! real transport and `MockOpdApi` an in-memory stand-in for tests.

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::HttpOpdClient;
pub use error::ApiError;
pub use mock::{ApiCall, MockOpdApi};
pub use types::{LoginRequest, LoginResponse};

use crate::models::{NewUser, Patient, PatientRegistration, Prescription, Role, User, UserUpdate};
use crate::session::BearerToken;

/// Operations offered by the OPD backend (allows mocking).
pub trait OpdApi {
    /// Credential attached to every subsequent request. `None` after logout.
    fn set_bearer(&self, token: Option<&BearerToken>);

    /// `POST /auth/login`
    fn login(&self, email: &str, password: &str, role: Role) -> Result<LoginResponse, ApiError>;

    /// `GET /admin/users`
    fn list_users(&self) -> Result<Vec<User>, ApiError>;

    /// `POST /admin/users`
    fn create_user(&self, user: &NewUser) -> Result<User, ApiError>;

    /// `PUT /admin/users/{id}`
    fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User, ApiError>;

    /// `DELETE /admin/users/{id}`
    fn delete_user(&self, id: &str) -> Result<(), ApiError>;

    /// `GET /patient` (doctor populated)
    fn list_patients(&self) -> Result<Vec<Patient>, ApiError>;

    /// `GET /doctor`
    fn list_doctors(&self) -> Result<Vec<User>, ApiError>;

    /// `POST /patient/register`, returns the patient with its token number.
    fn register_patient(&self, registration: &PatientRegistration) -> Result<Patient, ApiError>;

    /// `GET /patient/today/{doctorId}`
    fn list_today_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError>;

    /// `PUT /prescription/{patientId}`, returns the updated patient.
    fn save_prescription(
        &self,
        patient_id: &str,
        prescription: &Prescription,
    ) -> Result<Patient, ApiError>;
}
