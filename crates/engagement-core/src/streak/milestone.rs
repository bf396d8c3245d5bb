//! One-time streak milestone rewards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::tracker::StreakState;
use crate::error::EngineError;
use crate::ledger::LedgerDelta;

/// Reward paid when a milestone is claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReward {
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub freezes: u32,
}

/// A streak length threshold. `days` doubles as the milestone id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub days: u32,
    #[serde(flatten)]
    pub reward: MilestoneReward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Locked,
    Claimable,
    Claimed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneView {
    pub days: u32,
    pub reward: MilestoneReward,
    pub status: MilestoneStatus,
}

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneClaim {
    pub state: StreakState,
    pub ledger: LedgerDelta,
    pub milestone: Milestone,
}

/// Static table ordered by threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneTable {
    milestones: Vec<Milestone>,
}

impl MilestoneTable {
    /// Sorts by threshold; duplicate thresholds keep the first entry.
    pub fn new(mut milestones: Vec<Milestone>) -> Self {
        milestones.sort_by_key(|m| m.days);
        milestones.dedup_by_key(|m| m.days);
        Self { milestones }
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn get(&self, days: u32) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.days == days)
    }

    pub fn status_of(&self, milestone: &Milestone, streak: u32, claimed: &BTreeSet<u32>) -> MilestoneStatus {
        if claimed.contains(&milestone.days) {
            MilestoneStatus::Claimed
        } else if streak >= milestone.days {
            MilestoneStatus::Claimable
        } else {
            MilestoneStatus::Locked
        }
    }

    pub fn statuses(&self, streak: u32, claimed: &BTreeSet<u32>) -> Vec<MilestoneView> {
        self.milestones
            .iter()
            .map(|m| MilestoneView {
                days: m.days,
                reward: m.reward,
                status: self.status_of(m, streak, claimed),
            })
            .collect()
    }

    /// First threshold the streak has not reached yet.
    pub fn next_locked(&self, streak: u32) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.days > streak)
    }

    /// Claim the milestone with threshold `days`.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownMilestone`], [`EngineError::AlreadyClaimed`] or
    /// [`EngineError::MilestoneLocked`]; on error the state is untouched.
    pub fn claim(&self, state: &StreakState, streak: u32, days: u32) -> Result<MilestoneClaim, EngineError> {
        let milestone = *self.get(days).ok_or(EngineError::UnknownMilestone(days))?;
        match self.status_of(&milestone, streak, &state.claimed_milestones) {
            MilestoneStatus::Claimed => return Err(EngineError::AlreadyClaimed { milestone: days }),
            MilestoneStatus::Locked => {
                return Err(EngineError::MilestoneLocked {
                    milestone: days,
                    streak,
                })
            }
            MilestoneStatus::Claimable => {}
        }

        let mut next = state.clone();
        next.claimed_milestones.insert(days);
        next.freeze_inventory = next.freeze_inventory.saturating_add(milestone.reward.freezes);

        Ok(MilestoneClaim {
            state: next,
            ledger: LedgerDelta {
                coins_delta: milestone.reward.coins,
                xp_delta: milestone.reward.xp,
            },
            milestone,
        })
    }
}

impl Default for MilestoneTable {
    fn default() -> Self {
        let m = |days, coins, xp, freezes| Milestone {
            days,
            reward: MilestoneReward { coins, xp, freezes },
        };
        Self::new(vec![
            m(3, 50, 0, 0),
            m(7, 100, 50, 1),
            m(14, 200, 100, 0),
            m(30, 500, 250, 1),
            m(100, 2000, 1000, 2),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_day_table() -> MilestoneTable {
        MilestoneTable::new(vec![Milestone {
            days: 3,
            reward: MilestoneReward {
                coins: 50,
                ..Default::default()
            },
        }])
    }

    #[test]
    fn claim_once_then_reject() {
        let table = three_day_table();
        let state = StreakState::default();

        let views = table.statuses(3, &state.claimed_milestones);
        assert_eq!(views[0].status, MilestoneStatus::Claimable);

        let claim = table.claim(&state, 3, 3).unwrap();
        assert_eq!(claim.ledger, LedgerDelta::coins(50));
        assert!(claim.state.claimed_milestones.contains(&3));
        assert_eq!(
            table.statuses(3, &claim.state.claimed_milestones)[0].status,
            MilestoneStatus::Claimed
        );

        let err = table.claim(&claim.state, 3, 3).unwrap_err();
        assert_eq!(err, EngineError::AlreadyClaimed { milestone: 3 });
    }

    #[test]
    fn locked_and_unknown_milestones_are_rejected() {
        let table = three_day_table();
        let state = StreakState::default();
        assert_eq!(
            table.claim(&state, 2, 3).unwrap_err(),
            EngineError::MilestoneLocked {
                milestone: 3,
                streak: 2
            }
        );
        assert_eq!(
            table.claim(&state, 10, 5).unwrap_err(),
            EngineError::UnknownMilestone(5)
        );
    }

    #[test]
    fn claimed_stays_claimed_after_streak_drops() {
        let table = three_day_table();
        let claimed: BTreeSet<u32> = [3].into_iter().collect();
        assert_eq!(table.statuses(0, &claimed)[0].status, MilestoneStatus::Claimed);
    }

    #[test]
    fn freeze_rewards_go_to_inventory() {
        let table = MilestoneTable::default();
        let claim = table.claim(&StreakState::default(), 7, 7).unwrap();
        assert_eq!(claim.state.freeze_inventory, 1);
        assert_eq!(claim.ledger.xp_delta, 50);
    }

    #[test]
    fn table_is_sorted_and_deduplicated() {
        let m = |days| Milestone {
            days,
            reward: MilestoneReward::default(),
        };
        let table = MilestoneTable::new(vec![m(7), m(3), m(7)]);
        let days: Vec<u32> = table.milestones().iter().map(|m| m.days).collect();
        assert_eq!(days, vec![3, 7]);
        assert_eq!(table.next_locked(4).map(|m| m.days), Some(7));
        assert!(table.next_locked(7).is_none());
    }
}
