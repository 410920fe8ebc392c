//! Authenticated session value and where it is persisted between runs.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use shared::protocol::AuthResponse;
use tracing::{info, warn};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl From<AuthResponse> for Session {
    fn from(value: AuthResponse) -> Self {
        Self {
            token: value.token,
            username: value.username,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

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

pub fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hexchat")
        .join("session.json")
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read session {}", self.path.display()))
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.is_empty() => Ok(Some(session)),
            Ok(_) => Ok(None),
            Err(err) => {
                warn!(path = %self.path.display(), "session: discarding unreadable session file: {err}");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create session directory {}", parent.display())
                })?;
            }
        }
        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session {}", self.path.display()))?;
        info!(username = %session.username, "session: saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("session: cleared");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove session {}", self.path.display())),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let guard = self
            .session
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
