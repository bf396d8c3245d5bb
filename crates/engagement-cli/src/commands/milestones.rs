use clap::Subcommand;

use super::{open_session, print_json, report_events};

#[derive(Subcommand)]
pub enum MilestonesAction {
    /// List milestones with their status
    List,
    /// Claim a reached milestone by its day threshold
    Claim { days: u32 },
}

pub fn run(user: &str, action: MilestonesAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(user)?;

    match action {
        MilestonesAction::List => print_json(&session.milestones()?)?,
        MilestonesAction::Claim { days } => {
            let outcome = session.claim_milestone(days)?;
            print_json(&outcome)?;
        }
    }

    report_events(&session.drain_events())
}
