//! Profile persistence.
//!
//! The engines only see [`Profile`] snapshots. Writes go through
//! [`ProfileStore::save_profile`] as a [`ProfileUpdate`]: any subset of the
//! engine-owned fields plus an optional ledger delta, applied atomically and
//! acknowledged with the resulting snapshot.

mod config;
mod memory;
pub mod migrations;
mod sqlite;

pub use config::{
    Config, FreezeConfig, RepairConfig, ResourceConfig, RewardsConfig, StreakConfig,
};
pub use memory::MemoryProfileStore;
pub use sqlite::{LedgerEntry, SqliteProfileStore};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::ledger::LedgerDelta;
use crate::resource::ResourceState;
use crate::streak::StreakState;

/// Returns the data directory.
///
/// `ENGAGEMENT_DATA_DIR` wins when set. Otherwise `~/.config/engagement/`,
/// or `~/.config/engagement-dev/` with `ENGAGEMENT_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("ENGAGEMENT_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ENGAGEMENT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("engagement-dev")
            } else {
                base_dir.join("engagement")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persisted per-user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub resource: ResourceState,
    #[serde(default)]
    pub streak: StreakState,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub xp: i64,
    /// Incremented by every acknowledged write.
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Fresh profile with a full lives pool.
    pub fn new(user_id: &str, resource: ResourceState, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            resource,
            streak: StreakState::default(),
            coins: 0,
            xp: 0,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial write. `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<StreakState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<LedgerDelta>,
    /// Reject the write unless the stored revision matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_revision: Option<u64>,
    /// Instant stamped as `updated_at`. Stores fall back to their own clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written_at: Option<DateTime<Utc>>,
}

impl ProfileUpdate {
    pub fn resource(mut self, resource: ResourceState) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn streak(mut self, streak: StreakState) -> Self {
        self.streak = Some(streak);
        self
    }

    pub fn ledger(mut self, ledger: LedgerDelta) -> Self {
        if !ledger.is_zero() {
            self.ledger = Some(ledger);
        }
        self
    }

    pub fn expect_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }

    pub fn written_at(mut self, at: DateTime<Utc>) -> Self {
        self.written_at = Some(at);
        self
    }

    /// Timestamp the write should carry.
    pub fn stamp(&self) -> DateTime<Utc> {
        self.written_at.unwrap_or_else(Utc::now)
    }

    /// True when the update would not change any field.
    pub fn is_empty(&self) -> bool {
        self.resource.is_none() && self.streak.is_none() && self.ledger.is_none()
    }

    /// Apply onto `profile`, producing the next acknowledged snapshot.
    ///
    /// # Errors
    /// [`StoreError::WriteFailed`] on a revision mismatch.
    pub fn apply_to(&self, profile: &Profile, now: DateTime<Utc>) -> Result<Profile, StoreError> {
        if let Some(expected) = self.expected_revision {
            if expected != profile.revision {
                return Err(StoreError::WriteFailed(format!(
                    "revision conflict for '{}': expected {}, stored {}",
                    profile.user_id, expected, profile.revision
                )));
            }
        }

        let mut next = profile.clone();
        if let Some(resource) = &self.resource {
            next.resource = resource.clone();
        }
        if let Some(streak) = &self.streak {
            next.streak = streak.clone();
        }
        if let Some(ledger) = self.ledger {
            next.coins = next.coins.saturating_add(ledger.coins_delta);
            next.xp = next.xp.saturating_add(ledger.xp_delta);
        }
        next.revision += 1;
        next.updated_at = now;
        Ok(next)
    }
}

/// Abstract profile store.
///
/// `save_profile` must be atomic per call and return the stored result.
pub trait ProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Insert a new profile. Returns the stored copy.
    fn create_profile(&self, profile: &Profile) -> Result<Profile, StoreError>;

    fn save_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<Profile, StoreError>;
}

impl<S: ProfileStore + ?Sized> ProfileStore for &S {
    fn load_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        (**self).load_profile(user_id)
    }

    fn create_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        (**self).create_profile(profile)
    }

    fn save_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<Profile, StoreError> {
        (**self).save_profile(user_id, update)
    }
}
