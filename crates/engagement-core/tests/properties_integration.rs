//! Property tests for the regeneration and streak engines.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use engagement_core::resource::ResourceState;
use engagement_core::streak::{self, RepairPayment, RepairPolicy, StreakState, StreakStatus};
use proptest::prelude::*;

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

prop_compose! {
    fn any_pool()(
        max_count in 0u32..10,
        count in 0u32..15,
        interval_min in 0u64..60,
        anchor_offset_min in proptest::option::of(-30i64..600),
    ) -> ResourceState {
        ResourceState {
            count,
            max_count,
            regen_interval_ms: interval_min * 60 * 1000,
            last_regen_anchor: anchor_offset_min.map(|m| t0() + Duration::minutes(m)),
        }
    }
}

prop_compose! {
    fn any_history()(
        active in proptest::collection::btree_set(0i64..60, 0..40),
        frozen in proptest::collection::btree_set(0i64..60, 0..10),
        inventory in 0u32..4,
    ) -> StreakState {
        StreakState {
            active_dates: active.into_iter().map(day).collect(),
            frozen_dates: frozen.into_iter().map(day).collect(),
            freeze_inventory: inventory,
            ..Default::default()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn reconcile_is_idempotent(pool in any_pool(), minutes in 0i64..2000) {
        let now = t0() + Duration::minutes(minutes);
        let (once, _) = pool.reconcile(now);
        let (twice, gained) = once.reconcile(now);
        prop_assert_eq!(gained, 0);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn count_stays_within_cap(
        pool in any_pool(),
        steps in proptest::collection::vec((0i64..90, 0u32..4, 0u32..3), 1..30),
    ) {
        let mut state = pool;
        let mut now = t0();
        for (advance, spend, grant) in steps {
            now += Duration::minutes(advance);
            state = state.reconcile(now).0;
            prop_assert!(state.count <= state.max_count);
            if let Ok(outcome) = state.spend(spend, now) {
                state = outcome.state;
            }
            prop_assert!(state.count <= state.max_count);
            state = state.grant(grant);
            prop_assert!(state.count <= state.max_count);
        }
    }

    #[test]
    fn catch_up_matches_stepwise(
        count in 0u32..5,
        interval_min in 1u64..60,
        intervals in 0u64..10,
        extra_min in 0u64..60,
    ) {
        let start = ResourceState {
            count,
            max_count: 5,
            regen_interval_ms: interval_min * 60 * 1000,
            last_regen_anchor: Some(t0()),
        };
        let extra = extra_min % interval_min;
        let end = t0() + Duration::minutes((intervals * interval_min + extra) as i64);

        let (at_once, _) = start.reconcile(end);

        let mut stepwise = start.clone();
        for n in 1..=intervals {
            let boundary = t0() + Duration::minutes((n * interval_min) as i64);
            stepwise = stepwise.reconcile(boundary).0;
        }
        stepwise = stepwise.reconcile(end).0;

        prop_assert_eq!(at_once.count, stepwise.count);
        prop_assert_eq!(at_once.time_to_next(end), stepwise.time_to_next(end));
    }

    #[test]
    fn streak_stops_at_uncovered_day(
        history in any_history(),
        earlier in proptest::collection::btree_set(0i64..60, 0..30),
        today_offset in 1i64..62,
        gap_back in 1i64..10,
    ) {
        let today = day(today_offset);
        let gap = today - Duration::days(gap_back);
        let mut base = history;
        base.active_dates.remove(&gap);
        base.frozen_dates.remove(&gap);
        let before = base.effective_streak(today);
        prop_assert!(i64::from(before) <= gap_back);

        let mut extended = base.clone();
        extended
            .active_dates
            .extend(earlier.into_iter().map(day).filter(|d| *d < gap));
        prop_assert_eq!(extended.effective_streak(today), before);
    }

    #[test]
    fn streak_bounded_by_active_days(history in any_history(), today_offset in 0i64..62) {
        let today = day(today_offset);
        let streak = history.effective_streak(today) as usize;
        prop_assert!(streak <= history.active_dates.len());
        prop_assert!(history.longest_streak() as usize >= streak);
    }

    #[test]
    fn repair_fills_exactly_one_gap(chain_len in 1i64..20, coins in 200i64..2000) {
        // Active chain ending two days before today, yesterday missed.
        let today = day(chain_len + 1);
        let state = StreakState {
            active_dates: (0..chain_len).map(day).collect(),
            ..Default::default()
        };
        prop_assert_eq!(state.status(today), StreakStatus::Broken);
        let before = state.effective_streak(today);

        let policy = RepairPolicy::default();
        let cost = policy.cost(&state, today);
        let result = streak::repair(&state, today, coins, RepairPayment::Coins, &policy).unwrap();

        prop_assert_eq!(result.previous_streak, before);
        prop_assert_eq!(result.effective_streak, chain_len as u32 + 1);
        prop_assert!(result.effective_streak > before);
        prop_assert_eq!(result.ledger.coins_delta, -cost);
        prop_assert_eq!(
            result.state.active_dates.len(),
            state.active_dates.len() + 1
        );
        prop_assert!(result.state.is_active(today - Duration::days(1)));
    }
}
