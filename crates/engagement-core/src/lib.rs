//! # Engagement Core Library
//!
//! This library provides the engagement logic for a gamified learning platform:
//! a capped "lives" pool that regenerates over wall-clock time, and a daily
//! activity streak with freezes, paid repair and milestone rewards. The CLI
//! binary is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Resource Regenerator**: pure catch-up arithmetic over an anchor instant
//! - **Streak Tracker**: pure derivations over sets of civil dates in a fixed
//!   timezone
//! - **Session**: single-writer orchestration that persists engine deltas and
//!   rolls back when the store refuses a write
//! - **Storage**: SQLite-based profile storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`EngagementSession`]: Orchestration for one user
//! - [`ResourceState`]: Lives pool and regeneration
//! - [`StreakState`]: Streak history, freezes and repair inputs
//! - [`ProfileStore`]: Persistence contract
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod countdown;
pub mod error;
pub mod events;
pub mod ledger;
pub mod resource;
pub mod session;
pub mod storage;
pub mod streak;

pub use clock::{CivilCalendar, Clock, ManualClock, SystemClock};
pub use countdown::{Countdown, CountdownFrame};
pub use error::{ConfigError, CoreError, EngineError, StoreError};
pub use events::Event;
pub use ledger::LedgerDelta;
pub use resource::{PoolStatus, RefillPolicy, ResourceState};
pub use session::{
    Command, CommandKind, Dashboard, EngagementSession, Outcome, Processed, SessionSettings,
};
pub use storage::{
    Config, MemoryProfileStore, Profile, ProfileStore, ProfileUpdate, SqliteProfileStore,
};
pub use streak::{
    FreezePolicy, Milestone, MilestoneTable, RepairPayment, RepairPolicy, StreakOutcome,
    StreakState, StreakStatus,
};
