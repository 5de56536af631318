use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::models::UserProfile;

/// Default location of the saved profile, relative to the working directory
pub const DEFAULT_DATA_FILE: &str = "data/usuario.json";

/// Loads and saves the user profile as a single JSON file
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `Ok(None)` when nothing has been saved yet. Repeated ids within a
    /// list are dropped, keeping the first occurrence.
    pub fn try_load(&self) -> Result<Option<UserProfile>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read profile file: {}", self.path.display()))?;

        let mut profile: UserProfile = serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to parse profile JSON from {}. The file may be corrupted.",
                self.path.display()
            )
        })?;

        let dropped = profile.drop_duplicate_ids();
        if dropped > 0 {
            tracing::warn!(path = %self.path.display(), dropped, "Dropped duplicate records from saved profile");
        }

        Ok(Some(profile))
    }

    /// Like [`try_load`](Self::try_load), but an unreadable or corrupt file
    /// counts as no saved profile.
    pub fn load(&self) -> Option<UserProfile> {
        match self.try_load() {
            Ok(Some(profile)) => {
                tracing::info!(path = %self.path.display(), "Loaded user profile");
                Some(profile)
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "No saved profile found");
                None
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %format!("{:#}", e),
                    "Could not load saved profile, starting fresh"
                );
                None
            }
        }
    }

    /// Write the profile, creating the parent directory on first use
    pub fn save(&self, profile: &UserProfile) -> Result<PathBuf> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create data directory: {}", dir.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(profile).context("Failed to serialize user profile")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write profile file: {}", self.path.display()))?;

        tracing::info!(path = %self.path.display(), "Saved user profile");
        Ok(self.path.clone())
    }
}
