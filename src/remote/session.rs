//! Persistence of the pending generation job across restarts.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collaborators::{AssetHandle, JobHandle};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not access session file: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is corrupted: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A submitted job that has not reached a terminal status yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub job: JobHandle,
    pub reference: AssetHandle,
    /// Local file the reference photo was picked from
    #[serde(default)]
    pub reference_path: Option<PathBuf>,
    /// Remote copy of the reference photo, when known
    #[serde(default)]
    pub reference_url: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Location of the session file.
#[derive(Resource, Debug, Clone)]
pub struct SessionStore {
    pub path: PathBuf,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            path: crate::paths::session_file(),
        }
    }
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        load_session(&self.path)
    }

    pub fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        debug!("Saved pending job {} to {:?}", session.job, self.path);
        Ok(())
    }

    /// Remove the session file. Missing files are not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn load_session(path: &Path) -> Result<Option<PersistedSession>, SessionError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&json)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedSession {
        PersistedSession {
            job: JobHandle("kg2abc".into()),
            reference: AssetHandle("kg2abc".into()),
            reference_path: Some(PathBuf::from("/photos/me.jpg")),
            reference_url: None,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let session = sample();
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));
    }

    #[test]
    fn test_clear_removes_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        assert!(!store.path.exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        std::fs::write(&store.path, "{ not json").unwrap();
        assert!(matches!(store.load(), Err(SessionError::Parse(_))));
    }
}
