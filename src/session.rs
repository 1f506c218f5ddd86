//! Login session store.
//!
//! Holds the authenticated staff identity and the bearer credential issued
//! by `/auth/login`. The session is persisted as JSON under the data
//! directory so it survives process restarts:
//! - loaded once at startup (`SessionStore::open`)
//! - replaced on login (`set`)
//! - removed on logout (`clear`)
//!
//! The credential is zeroed on drop and never printed by `Debug`.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::models::{Role, User};

// ═══════════════════════════════════════════════════════════
// BearerToken: zeroed on drop
// ═══════════════════════════════════════════════════════════

/// Opaque credential attached to every API request after login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

// ═══════════════════════════════════════════════════════════
// Session: one authenticated identity
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: BearerToken,
}

impl Session {
    pub fn new(user: User, token: BearerToken) -> Self {
        Self { user, token }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

// ═══════════════════════════════════════════════════════════
// SessionStore: persisted current session
// ═══════════════════════════════════════════════════════════

/// Current session plus the file it is persisted to.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: Option<Session>,
}

impl SessionStore {
    /// Open the store, loading a previously persisted session if one exists.
    /// An unreadable session file is ignored (treated as logged out).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let current = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) if !session.token.is_empty() => {
                    tracing::debug!(role = %session.role(), "Restored persisted session");
                    Some(session)
                }
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Discarding unreadable session file: {e}");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(SessionError::Io(e)),
        };
        Ok(Self { path, current })
    }

    /// In-memory store that never touches disk until `set` is called.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    /// Replace the current session and persist it.
    pub fn set(&mut self, session: Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&session)?;
        let staging = self.path.with_extension("json.tmp");
        write_private(&staging, &json)?;
        std::fs::rename(&staging, &self.path)?;

        tracing::info!(role = %session.role(), "Session stored");
        self.current = Some(session);
        Ok(())
    }

    /// Forget the session in memory and on disk. Token zeroed via Drop.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.current = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SessionError::Io(e)),
        }
        tracing::info!("Session cleared");
        Ok(())
    }

    /// The current session, provided it belongs to `role`.
    pub fn require_role(&self, role: Role) -> Result<&Session, SessionError> {
        let session = self.current.as_ref().ok_or(SessionError::NotLoggedIn)?;
        if session.role() != role {
            return Err(SessionError::WrongRole {
                expected: role,
                actual: session.role(),
            });
        }
        Ok(session)
    }
}

/// Write `bytes` to `path` readable by the owner only (unix).
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);

    let mut file = options.open(path)?;
    // mode only applies on create; a leftover staging file keeps its bits
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("This action needs a {expected} login (current: {actual})")]
    WrongRole { expected: Role, actual: Role },
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
