//! In-memory OPD backend for tests and offline demos.
//!
//! Behaves like the hosted service where the desks depend on it:
//! - every call except login needs a bearer credential
//! - token numbers restart at 1 per doctor per calendar day (UTC)
//! - the fee sent at registration is stored as-is (snapshot)
//! - list endpoints populate `doctor` from the *current* user record
//! - saving a prescription completes the visit

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ApiError, LoginResponse, OpdApi};
use crate::models::{
    DoctorRef, DoctorSummary, NewUser, Patient, PatientRegistration, PatientStatus, Prescription,
    Role, User, UserUpdate,
};
use crate::session::BearerToken;

/// Which operation was invoked, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    Login,
    ListUsers,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ListPatients,
    ListDoctors,
    RegisterPatient,
    ListTodayPatients,
    SavePrescription,
}

#[derive(Default)]
struct MockState {
    users: Vec<User>,
    passwords: HashMap<String, String>,
    patients: Vec<Patient>,
    bearer: Option<BearerToken>,
    calls: Vec<ApiCall>,
    fail_next: Option<ApiError>,
    now: Option<DateTime<Utc>>,
}

/// Mock OPD backend: keeps users and patients in memory.
#[derive(Default)]
pub struct MockOpdApi {
    state: RefCell<MockState>,
}

impl MockOpdApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account that can log in with `password`.
    pub fn with_user(self, user: User, password: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.passwords.insert(user.email.clone(), password.to_string());
            state.users.push(user);
        }
        self
    }

    /// Add an already registered patient (stored as given).
    pub fn with_patient(self, patient: Patient) -> Self {
        self.state.borrow_mut().patients.push(patient);
        self
    }

    /// Freeze the server clock used for registration dates and "today".
    pub fn with_now(self, now: DateTime<Utc>) -> Self {
        self.state.borrow_mut().now = Some(now);
        self
    }

    /// Make the next call fail with `error` (after being recorded).
    pub fn fail_next(&self, error: ApiError) {
        self.state.borrow_mut().fail_next = Some(error);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, call: ApiCall) -> usize {
        self.state.borrow().calls.iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn has_bearer(&self) -> bool {
        self.state.borrow().bearer.is_some()
    }

    fn now(state: &MockState) -> DateTime<Utc> {
        state.now.unwrap_or_else(Utc::now)
    }

    /// Record the call, apply injected failures and the auth check.
    fn begin(&self, call: ApiCall) -> Result<(), ApiError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        if call != ApiCall::Login && state.bearer.is_none() {
            return Err(ApiError::Status {
                status: 401,
                message: Some("Not authorized, no token".into()),
            });
        }
        Ok(())
    }

    fn populate(state: &MockState, patient: &Patient) -> Patient {
        let mut out = patient.clone();
        let doctor_id = patient.doctor.as_ref().map(|d| d.id().to_string());
        out.doctor = doctor_id.map(|id| match state.users.iter().find(|u| u.id == id) {
            Some(doc) => DoctorRef::Populated(DoctorSummary {
                id: doc.id.clone(),
                full_name: doc.full_name.clone(),
                specialization: doc.specialization.clone(),
                fees: doc.fees,
            }),
            None => DoctorRef::Id(id),
        });
        out
    }
}

impl OpdApi for MockOpdApi {
    fn set_bearer(&self, token: Option<&BearerToken>) {
        self.state.borrow_mut().bearer = token.cloned();
    }

    fn login(&self, email: &str, password: &str, role: Role) -> Result<LoginResponse, ApiError> {
        self.begin(ApiCall::Login)?;
        let state = self.state.borrow();
        let user = state
            .users
            .iter()
            .find(|u| u.email == email && u.role == role)
            .filter(|u| state.passwords.get(&u.email).map(String::as_str) == Some(password))
            .ok_or(ApiError::Status {
                status: 401,
                message: Some("Invalid credentials".into()),
            })?;
        Ok(LoginResponse {
            token: format!("mock-token-{}", user.id),
            user: user.clone(),
        })
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.begin(ApiCall::ListUsers)?;
        Ok(self.state.borrow().users.clone())
    }

    fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.begin(ApiCall::CreateUser)?;
        let mut state = self.state.borrow_mut();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::Status {
                status: 400,
                message: Some("User already exists".into()),
            });
        }
        let created = User {
            id: Uuid::new_v4().simple().to_string(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            specialization: user.specialization.clone(),
            fees: user.fees,
            mobile_number: user.mobile_number.clone(),
        };
        state
            .passwords
            .insert(created.email.clone(), user.password.clone());
        state.users.push(created.clone());
        Ok(created)
    }

    fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User, ApiError> {
        self.begin(ApiCall::UpdateUser)?;
        let mut state = self.state.borrow_mut();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
        update.apply_to(user);
        let updated = user.clone();
        if let Some(ref password) = update.password {
            state.passwords.insert(updated.email.clone(), password.clone());
        }
        Ok(updated)
    }

    fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.begin(ApiCall::DeleteUser)?;
        let mut state = self.state.borrow_mut();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(ApiError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    fn list_patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.begin(ApiCall::ListPatients)?;
        let state = self.state.borrow();
        Ok(state
            .patients
            .iter()
            .map(|p| Self::populate(&state, p))
            .collect())
    }

    fn list_doctors(&self) -> Result<Vec<User>, ApiError> {
        self.begin(ApiCall::ListDoctors)?;
        Ok(self
            .state
            .borrow()
            .users
            .iter()
            .filter(|u| u.is_doctor())
            .cloned()
            .collect())
    }

    fn register_patient(&self, registration: &PatientRegistration) -> Result<Patient, ApiError> {
        self.begin(ApiCall::RegisterPatient)?;
        let mut state = self.state.borrow_mut();
        if !state
            .users
            .iter()
            .any(|u| u.id == registration.doctor && u.is_doctor())
        {
            return Err(ApiError::Status {
                status: 404,
                message: Some("Doctor not found".into()),
            });
        }

        let now = Self::now(&state);
        let today = now.date_naive();
        let issued_today = state
            .patients
            .iter()
            .filter(|p| {
                p.doctor.as_ref().map(|d| d.id()) == Some(registration.doctor.as_str())
                    && p.registration_date.date_naive() == today
            })
            .count();

        let patient = Patient {
            id: Uuid::new_v4().simple().to_string(),
            full_name: registration.full_name.clone(),
            mobile_number: registration.mobile_number.clone(),
            address: registration.address.clone(),
            age: registration.age,
            disease: registration.disease.clone(),
            doctor: Some(DoctorRef::Id(registration.doctor.clone())),
            fees: Some(registration.fees),
            token_number: issued_today as u32 + 1,
            registration_date: now,
            status: PatientStatus::Pending,
            prescription: None,
        };
        state.patients.push(patient.clone());
        Ok(patient)
    }

    fn list_today_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError> {
        self.begin(ApiCall::ListTodayPatients)?;
        let state = self.state.borrow();
        let today = Self::now(&state).date_naive();
        Ok(state
            .patients
            .iter()
            .filter(|p| {
                p.doctor.as_ref().map(|d| d.id()) == Some(doctor_id)
                    && p.registration_date.date_naive() == today
            })
            .map(|p| Self::populate(&state, p))
            .collect())
    }

    fn save_prescription(
        &self,
        patient_id: &str,
        prescription: &Prescription,
    ) -> Result<Patient, ApiError> {
        self.begin(ApiCall::SavePrescription)?;
        let mut state = self.state.borrow_mut();
        let patient = state
            .patients
            .iter_mut()
            .find(|p| p.id == patient_id)
            .ok_or_else(|| ApiError::NotFound(format!("patient {patient_id}")))?;
        patient.prescription = Some(prescription.clone());
        patient.status = PatientStatus::Completed;
        let saved = patient.clone();
        Ok(Self::populate(&state, &saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doctor(id: &str, fees: Option<f64>) -> User {
        User {
            id: id.into(),
            full_name: format!("Dr. {id}"),
            email: format!("{id}@tekisky.com"),
            role: Role::Doctor,
            specialization: Some("General Medicine".into()),
            fees,
            mobile_number: None,
        }
    }

    fn registration(doctor_id: &str, fees: f64) -> PatientRegistration {
        PatientRegistration {
            full_name: "Ravi Kumar".into(),
            mobile_number: "9000000001".into(),
            address: "MG Road".into(),
            age: 34,
            disease: "Fever".into(),
            doctor: doctor_id.into(),
            fees,
        }
    }

    fn authed(api: MockOpdApi) -> MockOpdApi {
        api.set_bearer(Some(&BearerToken::new("t")));
        api
    }

    #[test]
    fn calls_without_bearer_are_unauthorized() {
        let api = MockOpdApi::new();
        let err = api.list_users().unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(api.calls(), vec![ApiCall::ListUsers]);
    }

    #[test]
    fn login_checks_password_and_role() {
        let api = MockOpdApi::new().with_user(doctor("d1", Some(500.0)), "pw");
        assert!(api.login("d1@tekisky.com", "pw", Role::Doctor).is_ok());
        assert!(api.login("d1@tekisky.com", "bad", Role::Doctor).is_err());
        assert!(api.login("d1@tekisky.com", "pw", Role::Admin).is_err());
    }

    #[test]
    fn token_numbers_restart_per_doctor() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let api = authed(
            MockOpdApi::new()
                .with_user(doctor("d1", Some(500.0)), "pw")
                .with_user(doctor("d2", Some(300.0)), "pw")
                .with_now(now),
        );

        assert_eq!(api.register_patient(&registration("d1", 500.0)).unwrap().token_number, 1);
        assert_eq!(api.register_patient(&registration("d1", 500.0)).unwrap().token_number, 2);
        assert_eq!(api.register_patient(&registration("d2", 300.0)).unwrap().token_number, 1);
    }

    #[test]
    fn register_rejects_unknown_doctor() {
        let api = authed(MockOpdApi::new());
        let err = api.register_patient(&registration("ghost", 0.0)).unwrap_err();
        assert_eq!(err.server_message(), Some("Doctor not found"));
    }

    #[test]
    fn injected_failure_applies_once() {
        let api = authed(MockOpdApi::new());
        api.fail_next(ApiError::Timeout(30));
        assert!(matches!(api.list_users(), Err(ApiError::Timeout(30))));
        assert!(api.list_users().is_ok());
    }

    #[test]
    fn deleted_doctor_leaves_unpopulated_reference() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let api = authed(
            MockOpdApi::new()
                .with_user(doctor("d1", Some(500.0)), "pw")
                .with_now(now),
        );
        api.register_patient(&registration("d1", 500.0)).unwrap();
        api.delete_user("d1").unwrap();

        let patients = api.list_patients().unwrap();
        assert_eq!(patients[0].doctor, Some(DoctorRef::Id("d1".into())));
    }
}
