//! Durable storage for the session token and minimal user identity.
//!
//! Only the [`Session`] is ever persisted, so a restart can resume it.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{Session, SessionError};

/// Where a session survives process restarts.
pub trait SessionStore: Send + Sync {
    /// The persisted session, if any.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove the persisted session. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session persisted as a JSON file.
///
/// On Unix the file is created readable by the owner only, since it holds
/// a bearer token.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SessionError::Store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        let session: Session = serde_json::from_str(&json)
            .map_err(|e| SessionError::Store(format!("invalid session file: {e}")))?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| SessionError::Store(format!("JSON serialization failed: {e}")))?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .map_err(|e| SessionError::Store(format!("failed to open {}: {e}", self.path.display())))?;
        file.write_all(json.as_bytes())
            .map_err(|e| SessionError::Store(format!("failed to write session file: {e}")))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Store(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Session kept in memory only; nothing survives the process.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `session` already persisted.
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
