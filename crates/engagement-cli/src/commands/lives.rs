use std::time::Duration;

use clap::Subcommand;
use engagement_core::{Clock, SystemClock};

use super::{open_session, print_json, report_events};

#[derive(Subcommand)]
pub enum LivesAction {
    /// Spend lives
    Spend {
        #[arg(default_value = "1")]
        count: u32,
    },
    /// Grant lives, capped at the maximum
    Grant { count: u32 },
    /// Buy a full refill with coins
    Refill,
    /// Print countdown frames until the next life
    Countdown {
        /// Number of frames, one per second
        #[arg(long, default_value = "1")]
        ticks: u32,
    },
}

pub fn run(user: &str, action: LivesAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(user)?;

    match action {
        LivesAction::Spend { count } => {
            let outcome = session.spend_lives(count)?;
            print_json(&outcome)?;
        }
        LivesAction::Grant { count } => {
            let outcome = session.grant_lives(count)?;
            print_json(&outcome)?;
        }
        LivesAction::Refill => {
            let outcome = session.purchase_refill()?;
            print_json(&outcome)?;
        }
        LivesAction::Countdown { ticks } => {
            let mut countdown = session.countdown();
            for tick in 0..ticks {
                if tick > 0 {
                    std::thread::sleep(Duration::from_secs(1));
                }
                let frame = countdown.tick(SystemClock.now());
                println!("{}", serde_json::to_string(&frame)?);
                if frame.unit_ready {
                    session.refresh()?;
                    countdown.sync(session.profile().resource.clone());
                }
            }
        }
    }

    report_events(&session.drain_events())
}
