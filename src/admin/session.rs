use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::ClientResult;

pub const SESSION_FILE_ENV: &str = "VERTOCRAFT_SESSION_FILE";
const DEFAULT_SESSION_FILE: &str = ".vertocraft_session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub base_url: String,
    pub username: String,
    pub token: String,
}

/// On-disk home of the admin session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$VERTOCRAFT_SESSION_FILE`, else `.vertocraft_session.json` in the working directory.
    pub fn default_location() -> Self {
        let path = std::env::var(SESSION_FILE_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        Self { path }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Returns `None` when no session has been saved.
    pub fn load(&self) -> ClientResult<Option<AdminSession>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: AdminSession = serde_json::from_str(&text)?;
        debug!(target: "vertocraft::admin", "loaded session for '{}' from {}", session.username, self.path.display());
        Ok(Some(session))
    }

    pub fn save(&self, session: &AdminSession) -> ClientResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        write_private(&self.path, serde_json::to_string_pretty(session)?.as_bytes())?;
        debug!(target: "vertocraft::admin", "saved session for '{}' to {}", session.username, self.path.display());
        Ok(())
    }

    /// Returns true if a saved session was removed.
    pub fn clear(&self) -> ClientResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// The token embeds the admin password, so the file is owner-only on unix.
#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}
