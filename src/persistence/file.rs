//! JSON profile file
//!
//! The profile is wrapped in a versioned envelope and replaced atomically
//! (write `*.json.tmp`, then rename over the real file).

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::{PlayerProfile, ProfileBackend, ProfileOp, StoreError};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    profile: PlayerProfile,
}

/// Platform data-dir location of the profile file
pub fn default_profile_path() -> Result<PathBuf, StoreError> {
    let dirs = ProjectDirs::from("com", "chicken", "ChickenBalance")
        .ok_or_else(|| StoreError::Unavailable("could not resolve data directory".into()))?;
    Ok(dirs.data_local_dir().join("profile.json"))
}

/// Durable profile store backed by one JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    profile: PlayerProfile,
}

impl JsonFileStore {
    /// Open the store, starting fresh if the file is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let profile = match Self::read(&path) {
            Ok(Some(profile)) => {
                log::info!("Loaded profile from {}", path.display());
                profile
            }
            Ok(None) => {
                log::info!("No profile at {}, starting fresh", path.display());
                PlayerProfile::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable profile {}: {}", path.display(), e);
                PlayerProfile::default()
            }
        };
        Self { path, profile }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<Option<PlayerProfile>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        let envelope: Envelope = serde_json::from_str(&json)?;
        if envelope.version > FORMAT_VERSION {
            return Err(StoreError::Unavailable(format!(
                "profile version {} is newer than supported {}",
                envelope.version, FORMAT_VERSION
            )));
        }
        Ok(Some(envelope.profile))
    }

    fn write(&self, profile: &PlayerProfile) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let envelope = Envelope {
            version: FORMAT_VERSION,
            profile: profile.clone(),
        };
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&envelope)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ProfileBackend for JsonFileStore {
    fn current(&self) -> &PlayerProfile {
        &self.profile
    }

    fn commit(&mut self, op: ProfileOp) -> Result<bool, StoreError> {
        let mut next = self.profile.clone();
        if !op.apply(&mut next) {
            return Ok(false);
        }
        if next != self.profile {
            self.write(&next)?;
            self.profile = next;
        }
        Ok(true)
    }
}
