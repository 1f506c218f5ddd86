//! Admin desk: staff accounts and the patient overview.

use chrono::FixedOffset;

use super::{resume, DeskError};
use crate::api::OpdApi;
use crate::models::{NewUser, Patient, Role, User, UserUpdate};
use crate::roster::{group_by_date_then_doctor_in, Roster};
use crate::session::SessionStore;

pub const USER_CREATED: &str = "User created successfully";
pub const USER_UPDATED: &str = "User updated successfully";
pub const USER_DELETED: &str = "User deleted successfully";
pub const OPERATION_FAILED: &str = "Operation failed";
pub const DELETE_FAILED: &str = "Failed to delete user";
pub const FETCH_USERS_FAILED: &str = "Failed to fetch users";
pub const FETCH_PATIENTS_FAILED: &str = "Failed to fetch patients";

pub struct AdminDesk<'a, A: OpdApi + ?Sized> {
    api: &'a A,
    users: Vec<User>,
    patients: Vec<Patient>,
}

impl<'a, A: OpdApi + ?Sized> AdminDesk<'a, A> {
    /// Desk for an already authenticated gateway.
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            users: Vec::new(),
            patients: Vec::new(),
        }
    }

    /// Desk for the persisted admin session.
    pub fn open(api: &'a A, store: &SessionStore) -> Result<Self, DeskError> {
        resume(api, store, Role::Admin)?;
        Ok(Self::new(api))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn refresh_users(&mut self) -> Result<&[User], DeskError> {
        self.users = self.api.list_users()?;
        tracing::debug!(count = self.users.len(), "Users refreshed");
        Ok(&self.users)
    }

    pub fn refresh_patients(&mut self) -> Result<&[Patient], DeskError> {
        self.patients = self.api.list_patients()?;
        tracing::debug!(count = self.patients.len(), "Patients refreshed");
        Ok(&self.patients)
    }

    /// Re-fetch users after a mutation. The mutation already happened, so a
    /// failed refresh only leaves the list stale.
    fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.refresh_users() {
            tracing::warn!(error = %e, "User list refresh after mutation failed");
        }
    }

    pub fn create_user(&mut self, user: &NewUser) -> Result<User, DeskError> {
        user.validate()?;
        let created = self.api.create_user(user)?;
        tracing::info!(user_id = %created.id, role = %created.role, "User created");
        self.refresh_after_mutation();
        Ok(created)
    }

    /// A blank password in the update keeps the current one.
    pub fn update_user(&mut self, id: &str, update: &UserUpdate) -> Result<User, DeskError> {
        let mut update = update.clone();
        if update.password.as_deref().is_some_and(|p| p.trim().is_empty()) {
            update.password = None;
        }
        update.validate()?;
        let updated = self.api.update_user(id, &update)?;
        tracing::info!(user_id = %id, "User updated");
        self.refresh_after_mutation();
        Ok(updated)
    }

    pub fn delete_user(&mut self, id: &str) -> Result<(), DeskError> {
        self.api.delete_user(id)?;
        tracing::info!(user_id = %id, "User deleted");
        self.refresh_after_mutation();
        Ok(())
    }

    /// Patients grouped by registration day (at `offset`) and doctor.
    pub fn roster(&self, offset: FixedOffset) -> Roster {
        group_by_date_then_doctor_in(&self.patients, offset)
    }
}
