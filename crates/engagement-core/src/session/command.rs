//! Gameplay mutations accepted by the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::streak::RepairPayment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandKind {
    SpendLives { count: u32 },
    GrantLives { count: u32 },
    /// Top the pool up to max for coins.
    PurchaseRefill,
    /// A qualifying lesson was completed today.
    RecordActivity,
    RepairStreak { payment: RepairPayment },
    ClaimMilestone { days: u32 },
    PurchaseFreeze,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::SpendLives { .. } => "spend_lives",
            CommandKind::GrantLives { .. } => "grant_lives",
            CommandKind::PurchaseRefill => "purchase_refill",
            CommandKind::RecordActivity => "record_activity",
            CommandKind::RepairStreak { .. } => "repair_streak",
            CommandKind::ClaimMilestone { .. } => "claim_milestone",
            CommandKind::PurchaseFreeze => "purchase_freeze",
        }
    }
}

/// A queued mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    #[serde(flatten)]
    pub kind: CommandKind,
    pub submitted_at: DateTime<Utc>,
}

impl Command {
    pub fn new(kind: CommandKind, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            submitted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let now = Utc::now();
        let a = Command::new(CommandKind::PurchaseFreeze, now);
        let b = Command::new(CommandKind::PurchaseFreeze, now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serializes_kind_inline() {
        let cmd = Command::new(CommandKind::SpendLives { count: 2 }, Utc::now());
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["kind"], "spend_lives");
        assert_eq!(json["count"], 2);
        assert_eq!(cmd.kind.name(), "spend_lives");
    }
}
