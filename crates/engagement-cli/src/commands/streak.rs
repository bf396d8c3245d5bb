use chrono::Datelike;
use clap::{Subcommand, ValueEnum};
use engagement_core::RepairPayment;
use serde_json::json;

use super::{open_session, print_json, report_events};

#[derive(Clone, Copy, ValueEnum)]
pub enum PayWith {
    Coins,
    Freeze,
}

impl From<PayWith> for RepairPayment {
    fn from(value: PayWith) -> Self {
        match value {
            PayWith::Coins => RepairPayment::Coins,
            PayWith::Freeze => RepairPayment::Freeze,
        }
    }
}

#[derive(Subcommand)]
pub enum StreakAction {
    /// Current streak, status and repair eligibility
    Show,
    /// Record a completed lesson for today
    Activity,
    /// Backfill yesterday after a single missed day
    Repair {
        #[arg(long, value_enum, default_value = "coins")]
        pay_with: PayWith,
    },
    /// Month view of the streak history
    Calendar {
        /// Year, defaults to the current one
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12, defaults to the current one
        #[arg(long)]
        month: Option<u32>,
    },
    /// Buy one streak freeze with coins
    BuyFreeze,
}

pub fn run(user: &str, action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(user)?;

    match action {
        StreakAction::Show => {
            let dashboard = session.dashboard()?;
            print_json(&json!({
                "today": dashboard.today,
                "timezone": dashboard.timezone,
                "streak": dashboard.streak,
                "longest_streak": dashboard.longest_streak,
                "status": dashboard.streak_status,
                "freeze_inventory": dashboard.freeze_inventory,
                "repair": dashboard.repair,
            }))?;
        }
        StreakAction::Activity => {
            let outcome = session.record_activity()?;
            print_json(&outcome)?;
        }
        StreakAction::Repair { pay_with } => {
            let outcome = session.repair_streak(pay_with.into())?;
            print_json(&outcome)?;
        }
        StreakAction::Calendar { year, month } => {
            let today = session.today();
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let calendar = session
                .calendar(year, month)?
                .ok_or_else(|| format!("invalid month: {year}-{month}"))?;
            print_json(&calendar)?;
        }
        StreakAction::BuyFreeze => {
            let outcome = session.purchase_freeze()?;
            print_json(&outcome)?;
        }
    }

    report_events(&session.drain_events())
}
