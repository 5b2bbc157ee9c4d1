use crate::demo::{run_demo, run_report, DemoArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use realty_analytics::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Realty Team Analytics",
    about = "Serve and print team performance analytics for the real-estate CRM",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print an analytics report for one period
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Seed a sample team and walk through every report
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum ReportCommand {
    /// Per-agent performance table
    Agents(ReportArgs),
    /// Agents ranked by revenue, deals or conversion
    Leaderboard(ReportArgs),
    /// Team-wide overview
    Team(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// SQLite database file; a seeded in-memory store is used when absent
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report { command } => run_report(command).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
