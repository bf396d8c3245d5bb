//! Integration tests for the reference lives and streak scenarios.
//!
//! These run the pure engines through the public API only, with explicit
//! instants and civil dates.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use engagement_core::resource::{PoolStatus, ResourceState};
use engagement_core::streak::{
    Milestone, MilestoneReward, MilestoneStatus, MilestoneTable, StreakState, StreakStatus,
};
use engagement_core::EngineError;

const MIN: u64 = 60 * 1000;

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn pool(count: u32) -> ResourceState {
    ResourceState {
        count,
        max_count: 5,
        regen_interval_ms: 20 * MIN,
        last_regen_anchor: Some(t0()),
    }
}

#[test]
fn test_scenario_a_partial_progress_preserved() {
    let now = t0() + Duration::minutes(55);
    let (state, gained) = pool(2).reconcile(now);

    assert_eq!(gained, 2);
    assert_eq!(state.count, 4);
    // 15 of the 20 minutes toward the fifth unit are kept.
    assert_eq!(state.last_regen_anchor, Some(t0() + Duration::minutes(40)));
    assert_eq!(state.time_to_next(now), Some(Duration::minutes(5)));
}

#[test]
fn test_scenario_b_catch_up_from_depleted() {
    let start = pool(0);
    assert_eq!(start.status(), PoolStatus::Depleted);

    let now = t0() + Duration::minutes(3 * 20 + 5);
    let (state, gained) = start.reconcile(now);

    assert_eq!(gained, 3);
    assert_eq!(state.count, 3);
    assert_eq!(state.status(), PoolStatus::Regenerating);
    assert_eq!(state.time_to_next(now), Some(Duration::minutes(15)));
}

#[test]
fn test_scenario_c_missed_day_breaks_streak() {
    let state = StreakState {
        active_dates: [jan(1), jan(2)].into_iter().collect(),
        ..Default::default()
    };

    assert_eq!(state.status(jan(4)), StreakStatus::Broken);
    assert_eq!(state.effective_streak(jan(4)), 0);

    let evaluation = state.evaluate(jan(4), true);
    assert!(evaluation.consumed_freezes.is_empty());
    assert_eq!(evaluation.status, StreakStatus::Broken);
}

#[test]
fn test_scenario_d_frozen_day_bridges_chain() {
    let state = StreakState {
        active_dates: [jan(1), jan(2)].into_iter().collect(),
        frozen_dates: [jan(3)].into_iter().collect(),
        ..Default::default()
    };

    assert_eq!(state.status(jan(4)), StreakStatus::Frozen);
    assert_eq!(state.effective_streak(jan(4)), 2);
}

#[test]
fn test_scenario_d_reached_through_auto_freeze() {
    let state = StreakState {
        active_dates: [jan(1), jan(2)].into_iter().collect(),
        freeze_inventory: 1,
        ..Default::default()
    };

    let evaluation = state.evaluate(jan(4), true);
    assert_eq!(evaluation.consumed_freezes, vec![jan(3)]);
    assert_eq!(evaluation.state.freeze_inventory, 0);
    assert_eq!(evaluation.status, StreakStatus::Frozen);
    assert_eq!(evaluation.effective_streak, 2);

    // A second evaluation the same day consumes nothing.
    let again = evaluation.state.evaluate(jan(4), true);
    assert!(again.consumed_freezes.is_empty());
    assert_eq!(again.state, evaluation.state);
}

#[test]
fn test_scenario_e_milestone_claimed_once() {
    let table = MilestoneTable::new(vec![Milestone {
        days: 3,
        reward: MilestoneReward {
            coins: 50,
            ..Default::default()
        },
    }]);
    let state = StreakState {
        active_dates: [jan(1), jan(2), jan(3)].into_iter().collect(),
        ..Default::default()
    };
    let streak = state.effective_streak(jan(3));
    assert_eq!(streak, 3);

    let views = table.statuses(streak, &state.claimed_milestones);
    assert_eq!(views[0].status, MilestoneStatus::Claimable);

    let claim = table.claim(&state, streak, 3).unwrap();
    assert_eq!(claim.ledger.coins_delta, 50);
    assert!(claim.state.claimed_milestones.contains(&3));

    let views = table.statuses(streak, &claim.state.claimed_milestones);
    assert_eq!(views[0].status, MilestoneStatus::Claimed);
    assert_eq!(
        table.claim(&claim.state, streak, 3).unwrap_err(),
        EngineError::AlreadyClaimed { milestone: 3 }
    );
}
