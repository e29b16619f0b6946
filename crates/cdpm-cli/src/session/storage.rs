//! File-backed session storage.
//!
//! The Cloudera Manager `SESSION` cookie is written after every successful
//! renewal so later runs can reuse it without credentials.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use cdpm_core::{Error, Result, SessionStore, SessionToken};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::data_file;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored session data.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    session: String,
    saved_at: DateTime<Utc>,
}

/// Saves the session cookie as JSON, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `session.json` in the data directory.
    pub fn default_location() -> anyhow::Result<Self> {
        Ok(Self::new(data_file("session.json")?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the stored session.
    pub fn clear(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn read(&self) -> anyhow::Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path).context("Failed to read session file")?;
        let stored = serde_json::from_str(&json).context("Invalid session file")?;
        Ok(Some(stored))
    }

    fn write(&self, token: &SessionToken) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        let stored = StoredSession {
            session: token.as_str().to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, &json).context("Failed to write session file")?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<SessionToken>> {
        let stored = self.read().map_err(store_error)?;
        Ok(stored.map(|s| {
            tracing::debug!(saved_at = %s.saved_at, "loaded saved session");
            SessionToken::new(s.session)
        }))
    }

    async fn save(&self, token: &SessionToken) -> Result<()> {
        self.write(token).map_err(store_error)?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }
}

fn store_error(err: anyhow::Error) -> Error {
    Error::Store(format!("{:#}", err))
}
