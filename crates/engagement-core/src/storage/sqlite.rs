//! SQLite-backed profile store.
//!
//! Provides persistent storage for:
//! - One JSON profile document per user, with a write revision
//! - An append-only log of applied coin/XP deltas

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations, Profile, ProfileStore, ProfileUpdate};
use crate::error::StoreError;

/// An applied ledger delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub coins_delta: i64,
    pub xp_delta: i64,
    pub revision: u64,
    pub applied_at: DateTime<Utc>,
}

/// SQLite database for profile storage.
pub struct SqliteProfileStore {
    conn: Connection,
}

impl SqliteProfileStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/engagement.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        Self::open_at(&dir.join("engagement.db"))
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        migrations::migrate(&store.conn)?;
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        migrations::migrate(&store.conn)?;
        Ok(store)
    }

    /// Most recent ledger entries for `user_id`, newest first.
    pub fn ledger_history(&self, user_id: &str, limit: usize) -> Result<Vec<LedgerEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, coins_delta, xp_delta, revision, applied_at
             FROM ledger_entries
             WHERE user_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, user_id, coins_delta, xp_delta, revision, applied_at) = row?;
            let applied_at = DateTime::parse_from_rfc3339(&applied_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StoreError::ReadFailed(format!("bad applied_at '{applied_at}': {e}")))?;
            entries.push(LedgerEntry {
                id,
                user_id,
                coins_delta,
                xp_delta,
                revision: revision as u64,
                applied_at,
            });
        }
        Ok(entries)
    }

    fn read_document(conn: &Connection, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        match document {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

impl ProfileStore for SqliteProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Self::read_document(&self.conn, user_id)
    }

    fn create_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let json = serde_json::to_string(profile)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO profiles (user_id, document, revision, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                profile.user_id,
                json,
                profile.revision as i64,
                profile.updated_at.to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::WriteFailed(format!(
                "profile '{}' already exists",
                profile.user_id
            )));
        }
        Ok(profile.clone())
    }

    fn save_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<Profile, StoreError> {
        let tx = self.conn.unchecked_transaction()?;

        let current = Self::read_document(&tx, user_id)?
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        let now = update.stamp();
        let next = update.apply_to(&current, now)?;

        let json = serde_json::to_string(&next)?;
        tx.execute(
            "UPDATE profiles SET document = ?2, revision = ?3, updated_at = ?4 WHERE user_id = ?1",
            params![user_id, json, next.revision as i64, now.to_rfc3339()],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        if let Some(ledger) = update.ledger {
            tx.execute(
                "INSERT INTO ledger_entries (user_id, coins_delta, xp_delta, revision, applied_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_id,
                    ledger.coins_delta,
                    ledger.xp_delta,
                    next.revision as i64,
                    now.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }

        tx.commit().map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(next)
    }
}
