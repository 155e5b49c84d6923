//! hostsync — keep a hosts file in sync with a dynamic host group.
//!
//! # Usage
//!
//! ```text
//! hostsync run [--interval <secs>] [--metadata-url <url>] [--hosts-file <path>]
//!              [--backup-file <path>] [--fetch-timeout <secs>] [--socket <path>]
//! hostsync status [--json] [--socket <path>]
//! hostsync refresh [--socket <path>]
//! hostsync diff [--metadata-url <url>] [--hosts-file <path>] [--backup-file <path>]
//! hostsync stop [--socket <path>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, refresh::RefreshArgs, run::RunArgs, status::StatusArgs, stop::StopArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "hostsync",
    version,
    about = "Keep a hosts file in sync with the live membership of a dynamic host group",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync daemon in the foreground.
    Run(RunArgs),

    /// Query daemon runtime status over the control socket.
    Status(StatusArgs),

    /// Trigger an immediate reconciliation cycle.
    Refresh(RefreshArgs),

    /// Show what the next cycle would write, as a unified diff.
    Diff(DiffArgs),

    /// Request graceful daemon shutdown.
    Stop(StopArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Refresh(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Stop(args) => args.run(),
    }
}
