//! Core error types for engagement-core.
//!
//! Engine failures are ordinary typed results so the calling shell can decide
//! how to message them. Only [`CoreError::StoreWriteFailed`] implies that an
//! optimistic local change was rolled back.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for engagement-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A gameplay rule rejected the operation; nothing was changed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Reading from the profile store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The store rejected a write. The in-memory snapshot was restored to its
    /// pre-command state.
    #[error("Profile write failed for '{user_id}', local change reverted: {source}")]
    StoreWriteFailed {
        user_id: String,
        #[source]
        source: StoreError,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rule violations raised by the resource and streak engines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Not enough lives: requested {requested}, available {available}")]
    Depleted { requested: u32, available: u32 },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Streak cannot be repaired: {reason}")]
    NoRepairEligible { reason: String },

    #[error("Milestone {milestone} has already been claimed")]
    AlreadyClaimed { milestone: u32 },

    #[error("Milestone {milestone} is locked (current streak {streak})")]
    MilestoneLocked { milestone: u32, streak: u32 },

    #[error("Unknown milestone: {0}")]
    UnknownMilestone(u32),

    #[error("Freeze inventory is full (max {max})")]
    InventoryFull { max: u32 },

    #[error("Lives are already full")]
    AlreadyFull,
}

/// Profile store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store refused or lost a write.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// The backing store could not be read.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// No profile exists for the user.
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// Failed to open the SQLite file.
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// SQLite query errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl CoreError {
    /// The rule violation behind this error, if any.
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            CoreError::Engine(e) => Some(e),
            _ => None,
        }
    }

    /// Whether an optimistic change was reverted.
    pub fn is_rolled_back(&self) -> bool {
        matches!(self, CoreError::StoreWriteFailed { .. })
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_render_context() {
        let err = EngineError::Depleted {
            requested: 2,
            available: 1,
        };
        assert_eq!(err.to_string(), "Not enough lives: requested 2, available 1");

        let core: CoreError = EngineError::AlreadyClaimed { milestone: 7 }.into();
        assert_eq!(
            core.engine(),
            Some(&EngineError::AlreadyClaimed { milestone: 7 })
        );
        assert!(!core.is_rolled_back());
    }

    #[test]
    fn write_failure_is_rolled_back() {
        let err = CoreError::StoreWriteFailed {
            user_id: "u1".into(),
            source: StoreError::WriteFailed("disk full".into()),
        };
        assert!(err.is_rolled_back());
        assert!(err.to_string().contains("disk full"));
    }
}
