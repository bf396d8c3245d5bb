//! Time-regenerating lives pool.
//!
//! Everything here is a pure function of a [`ResourceState`] snapshot and an
//! explicit instant. Catch-up after an offline period is computed in one step
//! from the regen anchor, so the result is the same whether the pool was
//! reconciled once or at every interval boundary.
//!
//! ## Anchor lifecycle
//!
//! ```text
//! Full (anchor = None) --spend--> Regenerating (anchor = spend instant)
//! Regenerating --reconcile/grant reaching max--> Full (anchor cleared)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default pool size.
pub const DEFAULT_MAX_COUNT: u32 = 5;
/// Default time to regenerate one unit (20 minutes).
pub const DEFAULT_REGEN_INTERVAL_MS: u64 = 20 * 60 * 1000;

/// Externally observable pool condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    Full,
    Regenerating,
    /// No units left. Gameplay that costs a life is blocked.
    Depleted,
}

/// Persisted lives pool for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub count: u32,
    pub max_count: u32,
    pub regen_interval_ms: u64,
    /// Start of the interval currently in progress. `None` while full.
    #[serde(default)]
    pub last_regen_anchor: Option<DateTime<Utc>>,
}

/// Result of a successful [`ResourceState::spend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendOutcome {
    pub state: ResourceState,
    /// Units regenerated by the reconcile performed before spending.
    pub units_gained: u32,
    pub depleted: bool,
}

impl ResourceState {
    /// A full pool, as created with a new profile.
    pub fn full(max_count: u32, regen_interval_ms: u64) -> Self {
        Self {
            count: max_count,
            max_count,
            regen_interval_ms,
            last_regen_anchor: None,
        }
    }

    pub fn status(&self) -> PoolStatus {
        if self.count >= self.max_count {
            PoolStatus::Full
        } else if self.count == 0 {
            PoolStatus::Depleted
        } else {
            PoolStatus::Regenerating
        }
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.max_count
    }

    /// Credit every whole interval elapsed since the anchor.
    ///
    /// Returns the new state and the number of units gained. Partial
    /// progress toward the next unit is kept by advancing the anchor by
    /// whole intervals only. Calling this again with the same or a later
    /// instant never grants the same interval twice.
    pub fn reconcile(&self, now: DateTime<Utc>) -> (ResourceState, u32) {
        let mut next = self.clamped();
        if next.is_full() {
            return (next, 0);
        }

        let missing = next.max_count - next.count;
        let interval = next.regen_interval_ms;
        if interval == 0 {
            next.count = next.max_count;
            next.last_regen_anchor = None;
            return (next, missing);
        }

        let anchor = match next.last_regen_anchor {
            Some(anchor) => anchor,
            None => {
                // Below max without an anchor: start the clock now.
                next.last_regen_anchor = Some(now);
                return (next, 0);
            }
        };

        let elapsed = elapsed_ms(anchor, now);
        let units = elapsed / interval;
        let gained = units.min(u64::from(missing)) as u32;
        if gained == 0 {
            return (next, 0);
        }

        next.count += gained;
        next.last_regen_anchor = if next.is_full() {
            None
        } else {
            Some(anchor + ms(u64::from(gained) * interval))
        };
        (next, gained)
    }

    /// Spend `n` units at `now`.
    ///
    /// Reconciles first so the count reflects `now`. Leaving the full state
    /// starts the regen clock at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Depleted`] when fewer than `n` units are
    /// available after reconciling.
    pub fn spend(&self, n: u32, now: DateTime<Utc>) -> Result<SpendOutcome, EngineError> {
        let (mut next, units_gained) = self.reconcile(now);
        if next.count < n {
            return Err(EngineError::Depleted {
                requested: n,
                available: next.count,
            });
        }

        let was_full = next.is_full();
        next.count -= n;
        if was_full && n > 0 {
            next.last_regen_anchor = Some(now);
        }

        let depleted = next.status() == PoolStatus::Depleted;
        Ok(SpendOutcome {
            state: next,
            units_gained,
            depleted,
        })
    }

    /// Restore up to `n` units, capped at max.
    ///
    /// A pool that becomes full drops its anchor. Otherwise the anchor is
    /// untouched so the interval in progress keeps running.
    pub fn grant(&self, n: u32) -> ResourceState {
        let mut next = self.clamped();
        next.count = next.count.saturating_add(n).min(next.max_count);
        if next.is_full() {
            next.last_regen_anchor = None;
        }
        next
    }

    /// Time until the next unit regenerates, `None` when full.
    pub fn time_to_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_full() {
            return None;
        }
        let interval = self.regen_interval_ms;
        if interval == 0 {
            return Some(Duration::zero());
        }
        let elapsed = self
            .last_regen_anchor
            .map(|anchor| elapsed_ms(anchor, now))
            .unwrap_or(0);
        Some(ms(interval - elapsed % interval))
    }

    /// Time until the pool is full again, `None` when full.
    pub fn time_to_full(&self, now: DateTime<Utc>) -> Option<Duration> {
        let (current, _) = self.reconcile(now);
        let next = current.time_to_next(now)?;
        let remaining_after_next = current.max_count - current.count - 1;
        let rest = ms(u64::from(remaining_after_next).saturating_mul(current.regen_interval_ms));
        Some(next.checked_add(&rest).unwrap_or_else(|| ms(u64::MAX)))
    }

    fn clamped(&self) -> ResourceState {
        let mut next = self.clone();
        next.count = next.count.min(next.max_count);
        next
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::full(DEFAULT_MAX_COUNT, DEFAULT_REGEN_INTERVAL_MS)
    }
}

/// Coin price for topping the pool up instantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefillPolicy {
    pub cost_per_unit: i64,
}

impl RefillPolicy {
    /// Units a refill would grant and what it costs, `None` when full.
    pub fn quote(&self, state: &ResourceState) -> Option<(u32, i64)> {
        if state.is_full() {
            return None;
        }
        let units = state.max_count - state.count.min(state.max_count);
        Some((units, i64::from(units).saturating_mul(self.cost_per_unit)))
    }
}

/// Milliseconds from `anchor` to `now`, clamped at zero for clock skew.
fn elapsed_ms(anchor: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - anchor).num_milliseconds().max(0) as u64
}

fn ms(value: u64) -> Duration {
    Duration::milliseconds(i64::try_from(value).unwrap_or(i64::MAX))
}
