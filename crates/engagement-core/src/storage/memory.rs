//! In-memory profile store.
//!
//! Used by tests and by shells that keep profiles elsewhere. Writes can be
//! made to fail on demand to exercise rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::{Profile, ProfileStore, ProfileUpdate};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
    failing_writes: AtomicU32,
    writes: AtomicU32,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` writes fail with [`StoreError::WriteFailed`].
    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Acknowledged writes so far.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Overwrite a stored profile directly.
    pub fn insert(&self, profile: Profile) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(profile.user_id.clone(), profile);
        }
    }

    fn take_failure(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Profile>>, StoreError> {
        self.profiles
            .lock()
            .map_err(|_| StoreError::ReadFailed("profile map poisoned".to_string()))
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.lock()?.get(user_id).cloned())
    }

    fn create_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        if self.take_failure() {
            return Err(StoreError::WriteFailed("injected failure".to_string()));
        }
        let mut profiles = self.lock()?;
        if profiles.contains_key(&profile.user_id) {
            return Err(StoreError::WriteFailed(format!(
                "profile '{}' already exists",
                profile.user_id
            )));
        }
        profiles.insert(profile.user_id.clone(), profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(profile.clone())
    }

    fn save_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<Profile, StoreError> {
        if self.take_failure() {
            return Err(StoreError::WriteFailed("injected failure".to_string()));
        }
        let mut profiles = self.lock()?;
        let current = profiles
            .get(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        let next = update.apply_to(current, update.stamp())?;
        profiles.insert(user_id.to_string(), next.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::ledger::LedgerDelta;
    use crate::resource::ResourceState;

    #[test]
    fn save_applies_ledger_and_counts_writes() {
        let store = MemoryProfileStore::new();
        store
            .create_profile(&Profile::new("u1", ResourceState::default(), Utc::now()))
            .unwrap();

        let saved = store
            .save_profile("u1", &ProfileUpdate::default().ledger(LedgerDelta::coins(40)))
            .unwrap();
        assert_eq!(saved.coins, 40);
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.load_profile("u1").unwrap().unwrap().coins, 40);
    }

    #[test]
    fn injected_failures_leave_profile_untouched() {
        let store = MemoryProfileStore::new();
        store
            .create_profile(&Profile::new("u1", ResourceState::default(), Utc::now()))
            .unwrap();
        store.fail_next_writes(1);

        let update = ProfileUpdate::default().ledger(LedgerDelta::coins(40));
        assert!(store.save_profile("u1", &update).is_err());
        assert_eq!(store.load_profile("u1").unwrap().unwrap().coins, 0);
        assert!(store.save_profile("u1", &update).is_ok());
    }

    #[test]
    fn missing_profile_is_not_found() {
        let store = MemoryProfileStore::new();
        assert!(store.load_profile("ghost").unwrap().is_none());
        assert!(matches!(
            store.save_profile("ghost", &ProfileUpdate::default()),
            Err(StoreError::NotFound(_))
        ));
    }
}
