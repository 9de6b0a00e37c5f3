//! Bearer token storage.
//!
//! Stores session tokens in `<home>/tokens.json` with restricted permissions
//! (0600). Tokens are never logged or displayed in full.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Returns a masked version of a token for display.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}

/// The two session realms, each with its own fixed storage key.
///
/// The keys are stable; the same token file can be read by older builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    User,
    Admin,
}

impl SessionKind {
    /// Returns the fixed storage key for this session kind.
    pub fn storage_key(self) -> &'static str {
        match self {
            SessionKind::User => "access_token",
            SessionKind::Admin => "admin_access_token",
        }
    }
}

/// On-disk token file structure.
/// Maps storage keys to raw bearer tokens.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct TokenFile {
    #[serde(flatten)]
    entries: HashMap<String, String>,
}

impl TokenFile {
    /// Loads the token file from disk.
    /// Returns an empty file if it doesn't exist.
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read token store from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token store from {}", path.display()))
    }

    /// Saves the token file to disk with restricted permissions (0600).
    fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize token store")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }
}

/// Durable token slot for one session kind.
///
/// Reads and writes exactly one key of the token file; the other kind's
/// entry is never touched, so user and admin sessions stay independent.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
    kind: SessionKind,
}

impl TokenStore {
    /// Opens the store for a session kind at the default location.
    pub fn open(kind: SessionKind) -> Self {
        Self {
            path: paths::tokens_path(),
            kind,
        }
    }

    /// Opens the store for a session kind at an explicit file path.
    pub fn at(path: impl Into<PathBuf>, kind: SessionKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Returns the session kind this store is scoped to.
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Returns the stored token, if any.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn get(&self) -> Result<Option<String>> {
        let file = TokenFile::load(&self.path)?;
        Ok(file.entries.get(self.kind.storage_key()).cloned())
    }

    /// Stores a token, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn set(&self, token: &str) -> Result<()> {
        let mut file = TokenFile::load(&self.path)?;
        file.entries
            .insert(self.kind.storage_key().to_string(), token.to_string());
        file.save(&self.path)
    }

    /// Removes the stored token. Returns whether one was present.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn clear(&self) -> Result<bool> {
        let mut file = TokenFile::load(&self.path)?;
        let had_token = file.entries.remove(self.kind.storage_key()).is_some();
        file.save(&self.path)?;
        Ok(had_token)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn store_at(dir: &Path, kind: SessionKind) -> TokenStore {
        TokenStore::at(dir.join("tokens.json"), kind)
    }

    /// Token storage: set then get round-trips.
    #[test]
    fn test_set_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = store_at(dir.path(), SessionKind::User);

        assert_eq!(store.get().unwrap(), None);
        store.set("tok-user-1").unwrap();
        assert_eq!(store.get().unwrap(), Some("tok-user-1".to_string()));
    }

    /// Token storage: user and admin slots never touch each other.
    #[test]
    fn test_kinds_are_independent() {
        let dir = tempdir().unwrap();
        let user = store_at(dir.path(), SessionKind::User);
        let admin = store_at(dir.path(), SessionKind::Admin);

        user.set("tok-user").unwrap();
        assert_eq!(admin.get().unwrap(), None);

        admin.set("tok-admin").unwrap();
        assert!(user.clear().unwrap());

        assert_eq!(user.get().unwrap(), None);
        assert_eq!(admin.get().unwrap(), Some("tok-admin".to_string()));
    }

    /// Token storage: the file uses the fixed wire-compatible keys.
    #[test]
    fn test_storage_keys_are_stable() {
        let dir = tempdir().unwrap();
        store_at(dir.path(), SessionKind::User).set("u").unwrap();
        store_at(dir.path(), SessionKind::Admin).set("a").unwrap();

        let raw = std::fs::read_to_string(dir.path().join("tokens.json")).unwrap();
        assert!(raw.contains("\"access_token\""));
        assert!(raw.contains("\"admin_access_token\""));
    }

    /// Token storage: clear reports whether a token was present.
    #[test]
    fn test_clear_reports_presence() {
        let dir = tempdir().unwrap();
        let store = store_at(dir.path(), SessionKind::Admin);

        assert!(!store.clear().unwrap());
        store.set("tok").unwrap();
        assert!(store.clear().unwrap());
        assert_eq!(store.get().unwrap(), None);
    }

    /// Token storage: corrupt files surface as errors, not as empty stores.
    #[test]
    fn test_corrupt_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = TokenStore::at(&path, SessionKind::User);
        assert!(store.get().is_err());
        assert!(store.set("tok").is_err());
    }

    /// Token storage: the file is written with owner-only permissions.
    #[cfg(unix)]
    #[test]
    fn test_file_permissions_restricted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = store_at(dir.path(), SessionKind::User);
        store.set("tok-user-1").unwrap();

        let mode = std::fs::metadata(dir.path().join("tokens.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    /// Token masking: long tokens keep a short prefix, short ones hide fully.
    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("tok-abcdef-123456789"), "tok-abcdef-1...");
        assert_eq!(mask_token("short"), "***");
    }
}
