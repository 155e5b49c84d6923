//! `hostsync stop` — graceful daemon shutdown over the control socket.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hostsync_core::config::DEFAULT_SOCKET_PATH;
use hostsync_daemon::{request_stop, DaemonError};

/// Arguments for `hostsync stop`.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Control socket path.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,
}

impl StopArgs {
    pub fn run(self) -> Result<()> {
        match request_stop(&self.socket) {
            Ok(()) => println!("daemon stop requested"),
            Err(DaemonError::DaemonNotRunning { .. }) => {
                println!("daemon is not running");
            }
            Err(err) => return Err(err).context("failed to stop daemon"),
        }
        Ok(())
    }
}
