use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "engagement-cli", version, about = "Lives and streak engine CLI")]
struct Cli {
    /// Profile to operate on
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reconciled dashboard as JSON
    Status,
    /// Lives pool
    Lives {
        #[command(subcommand)]
        action: commands::lives::LivesAction,
    },
    /// Daily streak
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Streak milestones
    Milestones {
        #[command(subcommand)]
        action: commands::milestones::MilestonesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("ENGAGEMENT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status => commands::status::run(&cli.user),
        Commands::Lives { action } => commands::lives::run(&cli.user, action),
        Commands::Streak { action } => commands::streak::run(&cli.user, action),
        Commands::Milestones { action } => commands::milestones::run(&cli.user, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
