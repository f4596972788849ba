//! Persisted OAuth2 bearer credential.

use crate::WhoopError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An OAuth2 bearer grant as stored on disk.
///
/// A credential is never mutated in place: a refresh produces a new value
/// that replaces the persisted one wholesale.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Credential {
    /// Fresh iff the expiry lies strictly after `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }
}

/// Durable storage for the single credential of this process.
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Credential>, WhoopError>;
    fn save(&self, credential: &Credential) -> Result<(), WhoopError>;
}

/// JSON file backed credential store.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, WhoopError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WhoopError::Io(e)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| WhoopError::CorruptCredential {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, credential: &Credential) -> Result<(), WhoopError> {
        let payload = serde_json::to_vec(credential)?;
        let tmp = self.temp_path();
        // A leftover temp file would keep its old permissions.
        match std::fs::remove_file(&tmp) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(WhoopError::Io(e)),
            _ => {}
        }
        if let Err(e) = write_private(&tmp, &payload) {
            let _ = std::fs::remove_file(&tmp);
            return Err(WhoopError::Io(e));
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(WhoopError::Io(e));
        }
        tracing::debug!(path = %self.path.display(), "credential persisted");
        Ok(())
    }
}

/// Write `bytes` to a new file readable only by the owner.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
