//! Currency deltas proposed by the engines.
//!
//! The engines never hold a balance. They emit a [`LedgerDelta`] and the
//! profile store applies it atomically with the rest of the update.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    pub coins_delta: i64,
    pub xp_delta: i64,
}

impl LedgerDelta {
    pub fn coins(coins_delta: i64) -> Self {
        Self {
            coins_delta,
            xp_delta: 0,
        }
    }

    pub fn xp(xp_delta: i64) -> Self {
        Self {
            coins_delta: 0,
            xp_delta,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coins_delta == 0 && self.xp_delta == 0
    }

    /// Component-wise sum.
    pub fn combine(self, other: LedgerDelta) -> Self {
        Self {
            coins_delta: self.coins_delta.saturating_add(other.coins_delta),
            xp_delta: self.xp_delta.saturating_add(other.xp_delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_adds_components() {
        let total = LedgerDelta::coins(-100).combine(LedgerDelta::xp(10));
        assert_eq!(
            total,
            LedgerDelta {
                coins_delta: -100,
                xp_delta: 10
            }
        );
        assert!(!total.is_zero());
        assert!(LedgerDelta::default().is_zero());
    }
}
