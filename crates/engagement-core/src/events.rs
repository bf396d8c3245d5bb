use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::PoolStatus;
use crate::streak::{RepairPayment, StreakOutcome, StreakStatus};

/// Every committed change to a profile produces an Event.
/// Shells drain them from the session after each call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Offline regeneration was applied on activation or refresh.
    ResourceReconciled {
        units_gained: u32,
        count: u32,
        at: DateTime<Utc>,
    },
    ResourceSpent {
        spent: u32,
        count: u32,
        at: DateTime<Utc>,
    },
    /// The pool just hit zero.
    ResourceDepleted {
        next_unit_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    ResourceGranted {
        granted: u32,
        count: u32,
        at: DateTime<Utc>,
    },
    RefillPurchased {
        units: u32,
        cost: i64,
        at: DateTime<Utc>,
    },
    /// Freezes were consumed automatically to bridge missed days.
    StreakFreezeApplied {
        dates: Vec<NaiveDate>,
        remaining_inventory: u32,
        at: DateTime<Utc>,
    },
    ActivityRecorded {
        date: NaiveDate,
        outcome: StreakOutcome,
        streak: u32,
        at: DateTime<Utc>,
    },
    StreakRepaired {
        gap_day: NaiveDate,
        payment: RepairPayment,
        cost: i64,
        streak: u32,
        at: DateTime<Utc>,
    },
    MilestoneClaimed {
        days: u32,
        coins: i64,
        xp: i64,
        freezes: u32,
        at: DateTime<Utc>,
    },
    FreezePurchased {
        inventory: u32,
        cost: i64,
        at: DateTime<Utc>,
    },
    /// The store refused a write and the local snapshot was restored.
    MutationRolledBack {
        command_id: String,
        command: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// A queued command failed before anything was written.
    CommandRejected {
        command_id: String,
        command: String,
        reason: String,
        at: DateTime<Utc>,
    },
    Snapshot {
        lives: u32,
        max_lives: u32,
        pool_status: PoolStatus,
        streak: u32,
        streak_status: StreakStatus,
        coins: i64,
        xp: i64,
        at: DateTime<Utc>,
    },
}
