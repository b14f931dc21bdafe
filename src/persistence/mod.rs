//! Player profile persistence
//!
//! Features:
//! - [`Persistence`] trait consumed by the session (reads + fallible writes)
//! - In-memory store for tests and headless runs
//! - Versioned JSON file store with atomic tmp → rename replacement
//! - Write-behind wrapper so the simulation never waits on storage I/O
//! - Skin catalog and purchase rules

mod file;
mod skins;
mod write_behind;

pub use file::{JsonFileStore, default_profile_path};
pub use skins::{CATALOG, PurchaseOutcome, Skin, SkinId, purchase_skin};
pub use write_behind::WriteBehind;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence failures (always best-effort for the session)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Everything persisted for a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    pub best_time_ms: u64,
    pub points: u32,
    pub selected_skin: SkinId,
    pub unlocked_skins: BTreeSet<SkinId>,
    pub music_enabled: bool,
    pub sfx_enabled: bool,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            best_time_ms: 0,
            points: 0,
            selected_skin: SkinId::White,
            unlocked_skins: BTreeSet::from([SkinId::White]),
            music_enabled: true,
            sfx_enabled: true,
        }
    }
}

impl PlayerProfile {
    /// Raise the best time; returns true if it changed
    pub fn record_best_time(&mut self, ms: u64) -> bool {
        if ms > self.best_time_ms {
            self.best_time_ms = ms;
            true
        } else {
            false
        }
    }

    pub fn add_points(&mut self, amount: u32) {
        self.points = self.points.saturating_add(amount);
    }

    /// Deduct `amount` if affordable; the balance never goes negative
    pub fn spend_points(&mut self, amount: u32) -> bool {
        match self.points.checked_sub(amount) {
            Some(rest) => {
                self.points = rest;
                true
            }
            None => false,
        }
    }

    pub fn is_unlocked(&self, id: SkinId) -> bool {
        id.is_free() || self.unlocked_skins.contains(&id)
    }
}

/// Storage collaborator used by the session and the shop
pub trait Persistence {
    /// Current profile as last known by this store
    fn profile(&self) -> PlayerProfile;

    fn set_best_time_if_greater(&mut self, ms: u64) -> Result<(), StoreError>;
    fn add_points(&mut self, amount: u32) -> Result<(), StoreError>;
    /// Returns `Ok(false)` when the balance is too low
    fn spend_points(&mut self, amount: u32) -> Result<bool, StoreError>;
    fn set_selected_skin(&mut self, id: SkinId) -> Result<(), StoreError>;
    fn unlock_skin(&mut self, id: SkinId) -> Result<(), StoreError>;
    fn set_music_enabled(&mut self, enabled: bool) -> Result<(), StoreError>;
    fn set_sfx_enabled(&mut self, enabled: bool) -> Result<(), StoreError>;

    fn best_time_ms(&self) -> u64 {
        self.profile().best_time_ms
    }

    fn points(&self) -> u32 {
        self.profile().points
    }

    fn selected_skin(&self) -> SkinId {
        self.profile().selected_skin
    }

    fn unlocked_skins(&self) -> BTreeSet<SkinId> {
        self.profile().unlocked_skins
    }

    fn music_enabled(&self) -> bool {
        self.profile().music_enabled
    }

    fn sfx_enabled(&self) -> bool {
        self.profile().sfx_enabled
    }
}

/// A single profile mutation, shared by the concrete stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOp {
    BestTime(u64),
    AddPoints(u32),
    SpendPoints(u32),
    SelectSkin(SkinId),
    UnlockSkin(SkinId),
    Music(bool),
    Sfx(bool),
}

impl ProfileOp {
    /// Apply to a profile; returns false only for an unaffordable spend
    pub fn apply(self, profile: &mut PlayerProfile) -> bool {
        match self {
            ProfileOp::BestTime(ms) => {
                profile.record_best_time(ms);
            }
            ProfileOp::AddPoints(amount) => profile.add_points(amount),
            ProfileOp::SpendPoints(amount) => return profile.spend_points(amount),
            ProfileOp::SelectSkin(id) => profile.selected_skin = id,
            ProfileOp::UnlockSkin(id) => {
                profile.unlocked_skins.insert(id);
            }
            ProfileOp::Music(enabled) => profile.music_enabled = enabled,
            ProfileOp::Sfx(enabled) => profile.sfx_enabled = enabled,
        }
        true
    }
}

/// Stores that apply [`ProfileOp`]s get the whole trait for free
pub trait ProfileBackend {
    fn current(&self) -> &PlayerProfile;
    /// Apply `op`, persisting if the store is durable
    fn commit(&mut self, op: ProfileOp) -> Result<bool, StoreError>;
}

impl<T: ProfileBackend> Persistence for T {
    fn profile(&self) -> PlayerProfile {
        self.current().clone()
    }

    fn set_best_time_if_greater(&mut self, ms: u64) -> Result<(), StoreError> {
        self.commit(ProfileOp::BestTime(ms)).map(|_| ())
    }

    fn add_points(&mut self, amount: u32) -> Result<(), StoreError> {
        self.commit(ProfileOp::AddPoints(amount)).map(|_| ())
    }

    fn spend_points(&mut self, amount: u32) -> Result<bool, StoreError> {
        self.commit(ProfileOp::SpendPoints(amount))
    }

    fn set_selected_skin(&mut self, id: SkinId) -> Result<(), StoreError> {
        self.commit(ProfileOp::SelectSkin(id)).map(|_| ())
    }

    fn unlock_skin(&mut self, id: SkinId) -> Result<(), StoreError> {
        self.commit(ProfileOp::UnlockSkin(id)).map(|_| ())
    }

    fn set_music_enabled(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.commit(ProfileOp::Music(enabled)).map(|_| ())
    }

    fn set_sfx_enabled(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.commit(ProfileOp::Sfx(enabled)).map(|_| ())
    }

    fn best_time_ms(&self) -> u64 {
        self.current().best_time_ms
    }

    fn points(&self) -> u32 {
        self.current().points
    }
}

/// Volatile store (tests, headless demo)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    profile: PlayerProfile,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: PlayerProfile) -> Self {
        Self { profile }
    }
}

impl ProfileBackend for MemoryStore {
    fn current(&self) -> &PlayerProfile {
        &self.profile
    }

    fn commit(&mut self, op: ProfileOp) -> Result<bool, StoreError> {
        Ok(op.apply(&mut self.profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_time_never_decreases() {
        let mut store = MemoryStore::new();
        store.set_best_time_if_greater(8342).unwrap();
        store.set_best_time_if_greater(1200).unwrap();
        assert_eq!(store.best_time_ms(), 8342);
        store.set_best_time_if_greater(9000).unwrap();
        assert_eq!(store.best_time_ms(), 9000);
    }

    #[test]
    fn test_spend_never_goes_negative() {
        let mut store = MemoryStore::new();
        store.add_points(100).unwrap();
        assert!(!store.spend_points(101).unwrap());
        assert_eq!(store.points(), 100);
        assert!(store.spend_points(100).unwrap());
        assert_eq!(store.points(), 0);
    }

    #[test]
    fn test_default_profile() {
        let profile = PlayerProfile::default();
        assert!(profile.music_enabled && profile.sfx_enabled);
        assert_eq!(profile.selected_skin, SkinId::White);
        assert!(profile.is_unlocked(SkinId::White));
        assert!(!profile.is_unlocked(SkinId::Brown));
    }

    #[test]
    fn test_preferences_roundtrip_through_trait() {
        let mut store = MemoryStore::new();
        store.set_music_enabled(false).unwrap();
        store.set_sfx_enabled(false).unwrap();
        store.unlock_skin(SkinId::Pixel).unwrap();
        store.set_selected_skin(SkinId::Pixel).unwrap();
        let profile = store.profile();
        assert!(!profile.music_enabled);
        assert!(!profile.sfx_enabled);
        assert_eq!(store.selected_skin(), SkinId::Pixel);
        assert!(store.unlocked_skins().contains(&SkinId::Pixel));
    }
}
