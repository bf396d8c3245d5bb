//! Daily streak continuity over a fixed civil calendar.
//!
//! The streak length is never stored. It is walked backward from "today"
//! over the set of active dates and the set of freeze-covered dates, so a
//! stored counter can never drift from the history.
//!
//! ## Status for today
//!
//! ```text
//! Active   today has a qualifying action
//! Frozen   today or yesterday is covered by a freeze
//! Pending  yesterday active, today still open
//! Broken   anything else
//! ```

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Persisted streak history for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Civil dates with a qualifying action.
    #[serde(default)]
    pub active_dates: BTreeSet<NaiveDate>,
    /// Civil dates bridged by a consumed freeze.
    #[serde(default)]
    pub frozen_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub freeze_inventory: u32,
    /// Threshold (days) of each milestone already paid out.
    #[serde(default)]
    pub claimed_milestones: BTreeSet<u32>,
    /// Civil date of the most recent paid repair.
    #[serde(default)]
    pub last_repair_date: Option<NaiveDate>,
    /// Repairs made inside the current escalation window.
    #[serde(default)]
    pub repair_count: u32,
}

/// Visual and lifecycle state of the streak for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    Active,
    Frozen,
    Pending,
    Broken,
}

/// What the user should be told after an activity or repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakOutcome {
    /// First activity ever recorded.
    First,
    /// Yesterday was active; the streak grows.
    Continued,
    /// Yesterday was covered by a freeze; the streak survives.
    Frozen,
    /// There was an uncovered gap; the streak restarts.
    Broken,
    /// Today was already recorded; nothing changed.
    AlreadyRecorded,
}

impl StreakOutcome {
    pub fn message(&self, streak: u32) -> String {
        match self {
            StreakOutcome::First => "Your first day! A new streak begins.".to_string(),
            StreakOutcome::Continued => format!("Streak continued: {} days", streak),
            StreakOutcome::Frozen => {
                format!("A freeze protected your streak: {} days", streak)
            }
            StreakOutcome::Broken => "Streak lost. Starting over at 1 day.".to_string(),
            StreakOutcome::AlreadyRecorded => {
                format!("Already practiced today: {} days", streak)
            }
        }
    }
}

/// Result of observing the streak on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakEvaluation {
    /// State after any automatic freeze consumption.
    pub state: StreakState,
    pub status: StreakStatus,
    pub effective_streak: u32,
    /// Gap days that were just covered by freezes. Empty when nothing was
    /// consumed; its length is the inventory decrement to persist.
    pub consumed_freezes: Vec<NaiveDate>,
}

impl StreakEvaluation {
    pub fn freeze_decrement(&self) -> u32 {
        self.consumed_freezes.len() as u32
    }
}

impl StreakState {
    pub fn is_active(&self, day: NaiveDate) -> bool {
        self.active_dates.contains(&day)
    }

    pub fn is_frozen(&self, day: NaiveDate) -> bool {
        self.frozen_dates.contains(&day)
    }

    /// Active or frozen.
    pub fn is_covered(&self, day: NaiveDate) -> bool {
        self.is_active(day) || self.is_frozen(day)
    }

    /// Classify `today` without consuming freezes.
    pub fn status(&self, today: NaiveDate) -> StreakStatus {
        let yesterday = today - Duration::days(1);
        if self.is_active(today) {
            StreakStatus::Active
        } else if self.is_frozen(today) || self.is_frozen(yesterday) {
            StreakStatus::Frozen
        } else if self.is_active(yesterday) {
            StreakStatus::Pending
        } else {
            StreakStatus::Broken
        }
    }

    /// Consecutive active days ending today (or yesterday when today is
    /// still open). Frozen days keep the chain alive without adding to it.
    pub fn effective_streak(&self, today: NaiveDate) -> u32 {
        let start = if self.is_active(today) {
            today
        } else {
            today - Duration::days(1)
        };
        self.chain_ending_at(start)
    }

    /// Longest chain anywhere in the history.
    pub fn longest_streak(&self) -> u32 {
        self.active_dates
            .iter()
            .map(|day| self.chain_ending_at(*day))
            .max()
            .unwrap_or(0)
    }

    /// Most recent covered day strictly before `day`.
    pub fn last_covered_before(&self, day: NaiveDate) -> Option<NaiveDate> {
        let active = self.active_dates.range(..day).next_back();
        let frozen = self.frozen_dates.range(..day).next_back();
        active.max(frozen).copied()
    }

    /// Observe the streak on `today`.
    ///
    /// With `auto_freeze`, an uncovered run of missed days directly before
    /// today is bridged when there is an earlier streak to protect and the
    /// inventory holds one freeze per missed day. A run longer than the
    /// inventory consumes nothing. Evaluating again on the same day is a
    /// no-op because the bridged days are now covered.
    pub fn evaluate(&self, today: NaiveDate, auto_freeze: bool) -> StreakEvaluation {
        let mut state = self.clone();
        let mut consumed_freezes = Vec::new();

        if auto_freeze {
            if let Some(gap) = self.freezable_gap(today) {
                for day in gap {
                    state.frozen_dates.insert(day);
                    consumed_freezes.push(day);
                }
                state.freeze_inventory -= consumed_freezes.len() as u32;
            }
        }

        StreakEvaluation {
            status: state.status(today),
            effective_streak: state.effective_streak(today),
            state,
            consumed_freezes,
        }
    }

    /// Record a qualifying action on `today`. Idempotent.
    pub fn record_activity(&self, today: NaiveDate) -> (StreakState, StreakOutcome) {
        if self.is_active(today) {
            return (self.clone(), StreakOutcome::AlreadyRecorded);
        }

        let yesterday = today - Duration::days(1);
        let outcome = if self.active_dates.is_empty() {
            StreakOutcome::First
        } else if self.is_active(yesterday) {
            StreakOutcome::Continued
        } else if self.is_frozen(yesterday) {
            StreakOutcome::Frozen
        } else {
            StreakOutcome::Broken
        };

        let mut next = self.clone();
        next.active_dates.insert(today);
        (next, outcome)
    }

    fn chain_ending_at(&self, start: NaiveDate) -> u32 {
        let mut count = 0;
        let mut day = start;
        loop {
            if self.is_active(day) {
                count += 1;
            } else if !self.is_frozen(day) {
                break;
            }
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        count
    }

    /// Missed days between the last covered day and `today`, if freezes can
    /// bridge all of them.
    fn freezable_gap(&self, today: NaiveDate) -> Option<Vec<NaiveDate>> {
        let last = self.last_covered_before(today)?;
        if self.active_dates.range(..today).next_back().is_none() {
            return None;
        }
        let gap_days = (today - last).num_days() - 1;
        if gap_days < 1 || gap_days > i64::from(self.freeze_inventory) {
            return None;
        }
        Some(
            (1..=gap_days)
                .map(|offset| last + Duration::days(offset))
                .collect(),
        )
    }
}
