pub mod config;
pub mod lives;
pub mod milestones;
pub mod status;
pub mod streak;

use engagement_core::{
    Config, EngagementSession, Event, SessionSettings, SqliteProfileStore, SystemClock,
};
use serde::Serialize;

pub type CliSession = EngagementSession<SqliteProfileStore, SystemClock>;

/// Open the on-disk store and activate `user` with the saved config.
pub fn open_session(user: &str) -> Result<CliSession, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = SessionSettings::from_config(&config)?;
    let store = SqliteProfileStore::open()?;
    let session = EngagementSession::activate(store, SystemClock, settings, user)?;
    tracing::debug!(user, revision = session.profile().revision, "session activated");
    Ok(session)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report engine events on stderr so stdout stays parseable.
pub fn report_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        eprintln!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
