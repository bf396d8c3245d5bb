//! Paid repair of a just-broken streak.
//!
//! A repair backfills exactly one missed day: the streak must be `Broken`
//! today, yesterday must be the only gap, and the day before yesterday must
//! be covered. Longer gaps are never repairable.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::tracker::{StreakOutcome, StreakState, StreakStatus};
use crate::error::EngineError;
use crate::ledger::LedgerDelta;

/// Pricing for repairs. Repeated repairs inside the escalation window cost
/// more, up to `max_cost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairPolicy {
    pub base_cost: i64,
    pub escalation_step: i64,
    pub escalation_window_days: i64,
    pub max_cost: i64,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            base_cost: 200,
            escalation_step: 100,
            escalation_window_days: 30,
            max_cost: 500,
        }
    }
}

impl RepairPolicy {
    /// Repairs that still count toward escalation on `today`.
    pub fn recent_repairs(&self, state: &StreakState, today: NaiveDate) -> u32 {
        match state.last_repair_date {
            Some(last) if (today - last).num_days() < self.escalation_window_days => {
                state.repair_count
            }
            _ => 0,
        }
    }

    pub fn cost(&self, state: &StreakState, today: NaiveDate) -> i64 {
        let recent = i64::from(self.recent_repairs(state, today));
        self.base_cost
            .saturating_add(self.escalation_step.saturating_mul(recent))
            .min(self.max_cost)
            .max(0)
    }
}

/// How the user pays for a repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPayment {
    /// Pay the coin price; the gap day becomes active.
    Coins,
    /// Spend one freeze; the gap day becomes frozen.
    Freeze,
}

/// Whether a repair is currently offered, and at what price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairStatus {
    pub can_repair: bool,
    pub cost: i64,
    /// The single missed day a repair would fill.
    pub gap_day: Option<NaiveDate>,
    /// Why a repair is not offered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Outcome of a successful repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairResult {
    pub state: StreakState,
    pub ledger: LedgerDelta,
    pub outcome: StreakOutcome,
    pub status: StreakStatus,
    pub previous_streak: u32,
    pub effective_streak: u32,
    pub messages: Vec<String>,
}

/// Repair eligibility and price on `today`.
///
/// Pass the state returned by [`StreakState::evaluate`] so freezes that
/// would apply automatically are already accounted for.
pub fn repair_status(state: &StreakState, today: NaiveDate, policy: &RepairPolicy) -> RepairStatus {
    let cost = policy.cost(state, today);
    let rejected = |reason: &str| RepairStatus {
        can_repair: false,
        cost,
        gap_day: None,
        reason: Some(reason.to_string()),
    };

    if state.status(today) != StreakStatus::Broken {
        return rejected("streak is not broken");
    }

    let gap_day = today - Duration::days(1);
    let before_gap = today - Duration::days(2);
    if state.active_dates.is_empty() {
        return rejected("no streak to repair");
    }
    if !state.is_covered(before_gap) {
        return rejected("more than one day was missed");
    }

    RepairStatus {
        can_repair: true,
        cost,
        gap_day: Some(gap_day),
        reason: None,
    }
}

/// Backfill the missed day.
///
/// # Errors
///
/// - [`EngineError::NoRepairEligible`] when [`repair_status`] rejects.
/// - [`EngineError::InsufficientFunds`] when `coins` is below the price, or
///   when paying with a freeze and the inventory is empty.
///
/// On error nothing changes.
pub fn repair(
    state: &StreakState,
    today: NaiveDate,
    coins: i64,
    payment: RepairPayment,
    policy: &RepairPolicy,
) -> Result<RepairResult, EngineError> {
    let status = repair_status(state, today, policy);
    let gap_day = match (status.can_repair, status.gap_day) {
        (true, Some(day)) => day,
        _ => {
            return Err(EngineError::NoRepairEligible {
                reason: status.reason.unwrap_or_else(|| "not eligible".to_string()),
            })
        }
    };

    let previous_streak = state.effective_streak(today);
    let mut next = state.clone();

    let (ledger, outcome) = match payment {
        RepairPayment::Coins => {
            if coins < status.cost {
                return Err(EngineError::InsufficientFunds {
                    required: status.cost,
                    available: coins,
                });
            }
            next.active_dates.insert(gap_day);
            (LedgerDelta::coins(-status.cost), StreakOutcome::Continued)
        }
        RepairPayment::Freeze => {
            if next.freeze_inventory == 0 {
                return Err(EngineError::InsufficientFunds {
                    required: 1,
                    available: 0,
                });
            }
            next.freeze_inventory -= 1;
            next.frozen_dates.insert(gap_day);
            (LedgerDelta::default(), StreakOutcome::Frozen)
        }
    };

    next.repair_count = policy.recent_repairs(state, today) + 1;
    next.last_repair_date = Some(today);

    let effective_streak = next.effective_streak(today);
    let mut messages = vec![format!("Repaired {}", gap_day.format("%Y-%m-%d"))];
    if let RepairPayment::Coins = payment {
        messages.push(format!("Spent {} coins", status.cost));
    }
    messages.push(outcome.message(effective_streak));

    Ok(RepairResult {
        status: next.status(today),
        state: next,
        ledger,
        outcome,
        previous_streak,
        effective_streak,
        messages,
    })
}
