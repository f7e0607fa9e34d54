//! File-backed token storage.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use modelwatch_core::error::StorageError;
use modelwatch_core::{AccessToken, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored credential file contents.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: AccessToken,
}

/// Token store over a JSON file in the platform data directory.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store under the platform data directory, creating the
    /// directory if needed.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "modelwatch")
            .context("Could not determine config directory")?;

        let data_dir = dirs.data_dir();
        fs::create_dir_all(data_dir).context("Failed to create data directory")?;

        Ok(Self {
            path: data_dir.join("token.json"),
        })
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AccessToken>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).map_err(|e| StorageError::Read {
            message: e.to_string(),
        })?;
        let stored: StoredToken = serde_json::from_str(&json).map_err(|e| StorageError::Read {
            message: e.to_string(),
        })?;

        Ok(Some(stored.access_token))
    }

    fn save(&self, token: &AccessToken) -> Result<(), StorageError> {
        let stored = StoredToken {
            access_token: token.clone(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| StorageError::Write {
            message: e.to_string(),
        })?;

        fs::write(&self.path, &json).map_err(|e| StorageError::Write {
            message: e.to_string(),
        })?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            let restrict = || -> std::io::Result<()> {
                let mut perms = fs::metadata(&self.path)?.permissions();
                perms.set_mode(0o600);
                fs::set_permissions(&self.path, perms)
            };
            restrict().map_err(|e| StorageError::Write {
                message: e.to_string(),
            })?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| StorageError::Delete {
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}
