//! Freeze shop.

use serde::{Deserialize, Serialize};

use super::tracker::StreakState;
use crate::error::EngineError;
use crate::ledger::LedgerDelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezePolicy {
    /// Coin price of one freeze.
    pub price: i64,
    /// Purchases stop at this inventory size.
    pub max_inventory: u32,
}

impl Default for FreezePolicy {
    fn default() -> Self {
        Self {
            price: 200,
            max_inventory: 2,
        }
    }
}

impl FreezePolicy {
    /// Buy one freeze.
    ///
    /// # Errors
    ///
    /// [`EngineError::InventoryFull`] at the cap, or
    /// [`EngineError::InsufficientFunds`] when `coins` is below the price.
    pub fn purchase(&self, state: &StreakState, coins: i64) -> Result<(StreakState, LedgerDelta), EngineError> {
        if state.freeze_inventory >= self.max_inventory {
            return Err(EngineError::InventoryFull {
                max: self.max_inventory,
            });
        }
        if coins < self.price {
            return Err(EngineError::InsufficientFunds {
                required: self.price,
                available: coins,
            });
        }
        let mut next = state.clone();
        next.freeze_inventory += 1;
        Ok((next, LedgerDelta::coins(-self.price)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_adds_one_and_charges() {
        let policy = FreezePolicy::default();
        let (state, ledger) = policy.purchase(&StreakState::default(), 500).unwrap();
        assert_eq!(state.freeze_inventory, 1);
        assert_eq!(ledger, LedgerDelta::coins(-200));
    }

    #[test]
    fn purchase_respects_cap_and_balance() {
        let policy = FreezePolicy::default();
        let full = StreakState {
            freeze_inventory: 2,
            ..Default::default()
        };
        assert_eq!(
            policy.purchase(&full, 1000).unwrap_err(),
            EngineError::InventoryFull { max: 2 }
        );
        assert!(matches!(
            policy.purchase(&StreakState::default(), 10).unwrap_err(),
            EngineError::InsufficientFunds { .. }
        ));
    }
}
