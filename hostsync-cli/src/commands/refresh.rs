//! `hostsync refresh` — trigger an immediate reconciliation cycle.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use hostsync_core::config::DEFAULT_SOCKET_PATH;
use hostsync_daemon::{request_refresh, DaemonError};

/// Arguments for `hostsync refresh`.
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Control socket path.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,
}

impl RefreshArgs {
    pub fn run(self) -> Result<()> {
        let summary = match request_refresh(&self.socket) {
            Ok(summary) => summary,
            Err(DaemonError::DaemonNotRunning { socket }) => {
                bail!("daemon is not running (socket: {})", socket.display());
            }
            Err(err) => return Err(err).context("refresh failed"),
        };

        let managed = summary["managed_hosts"].as_u64().unwrap_or(0);
        let duration = summary["duration_ms"].as_u64().unwrap_or(0);
        match summary["outcome"].as_str() {
            Some("applied") => println!(
                "{} hosts file rewritten ({managed} managed hosts, {duration} ms)",
                "✓".green()
            ),
            _ => println!("{} no change detected ({managed} managed hosts)", "·".dimmed()),
        }
        Ok(())
    }
}
