use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod ui;

#[derive(Parser)]
#[command(name = "tutor", about = "Adaptive AI tutoring in your terminal")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage provider API keys
    Auth(commands::auth::AuthArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Manage curriculum documents
    Curriculum(commands::curriculum::CurriculumArgs),
    /// Show finished-session assessments
    History(commands::history::HistoryArgs),
    /// Start a tutoring session
    Learn(commands::learn::LearnArgs),
    /// List available topics
    Topics(commands::topics::TopicsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Auth(args) => commands::auth::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Curriculum(args) => commands::curriculum::run(args).await,
        Commands::History(args) => commands::history::run(args).await,
        Commands::Learn(args) => commands::learn::run(args).await,
        Commands::Topics(args) => commands::topics::run(args),
    }
}
