//! Role desks: thin orchestration over the API gateway.
//!
//! Each desk owns the collections it displays and follows the same rule:
//! after a mutation succeeds, the affected collection is re-fetched in
//! full. Nothing is patched locally.

pub mod admin;
pub mod doctor;
pub mod reception;

pub use admin::AdminDesk;
pub use doctor::{DoctorDesk, PrescriptionOutcome};
pub use reception::ReceptionDesk;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::api::{ApiError, OpdApi};
use crate::models::Role;
use crate::prescription_pdf::ComposeError;
use crate::session::{BearerToken, Session, SessionError, SessionStore};
use crate::validation::ValidationError;

pub const LOGIN_OK: &str = "Login successful!";
pub const LOGIN_FAILED: &str = "Login failed";
pub const LOGOUT_OK: &str = "Logged out successfully";

#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DeskError {
    /// Message sent by the backend, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            DeskError::Api(e) => e.server_message(),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Notices
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One-line outcome shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Validation and session problems speak for themselves; API failures
    /// show the backend's message, else `fallback`.
    pub fn failure(err: &DeskError, fallback: &str) -> Self {
        let message = match err {
            DeskError::Validation(e) => e.to_string(),
            DeskError::Session(e) => e.to_string(),
            DeskError::Api(_) | DeskError::Compose(_) => {
                err.server_message().unwrap_or(fallback).to_string()
            }
        };
        Self::error(message)
    }

    /// `success` on `Ok`, [`Notice::failure`] on `Err`.
    pub fn report<T>(result: &Result<T, DeskError>, success: &str, fallback: &str) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(e) => Self::failure(e, fallback),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Success => write!(f, "✓ {}", self.message),
            NoticeLevel::Error => write!(f, "✗ {}", self.message),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Session lifecycle
// ═══════════════════════════════════════════════════════════

/// Authenticate, persist the session, then arm the gateway with its token.
pub fn login<A: OpdApi + ?Sized>(
    api: &A,
    store: &mut SessionStore,
    email: &str,
    password: &str,
    role: Role,
) -> Result<Session, DeskError> {
    let response = api.login(email, password, role)?;
    let session = Session::new(response.user, BearerToken::new(response.token));
    store.set(session.clone())?;
    api.set_bearer(Some(&session.token));
    tracing::info!(role = %role, user_id = %session.user.id, "Logged in");
    Ok(session)
}

/// Forget the persisted session and stop sending its token.
pub fn logout<A: OpdApi + ?Sized>(api: &A, store: &mut SessionStore) -> Result<(), DeskError> {
    store.clear()?;
    api.set_bearer(None);
    tracing::info!("Logged out");
    Ok(())
}

/// Reuse a persisted session for `role` and arm the gateway with its token.
pub fn resume<A: OpdApi + ?Sized>(
    api: &A,
    store: &SessionStore,
    role: Role,
) -> Result<Session, DeskError> {
    let session = store.require_role(role)?.clone();
    api.set_bearer(Some(&session.token));
    Ok(session)
}
