use super::{open_session, print_json};

pub fn run(user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(user)?;
    print_json(&session.dashboard()?)
}
