//! `hostsync run` — foreground daemon.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use hostsync_core::config::{
    SyncConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_HOSTS_FILE, DEFAULT_METADATA_URL,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SOCKET_PATH,
};
use hostsync_daemon::start_blocking;
use hostsync_metadata::MetadataClient;

/// Arguments for `hostsync run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Seconds between reconciliation cycles.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Base URL of the metadata service.
    #[arg(long, default_value = DEFAULT_METADATA_URL)]
    pub metadata_url: String,

    /// Hosts file to manage.
    #[arg(long, default_value = DEFAULT_HOSTS_FILE)]
    pub hosts_file: PathBuf,

    /// Backup path for the pre-managed hosts file [default: <hosts-file>.backup]
    #[arg(long)]
    pub backup_file: Option<PathBuf>,

    /// Per-request metadata fetch timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout: u64,

    /// Control socket path.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let mut config = SyncConfig::for_hosts_file(self.hosts_file);
        if let Some(backup) = self.backup_file {
            config.backup_path = backup;
        }
        config.metadata_url = self.metadata_url;
        config.poll_interval = Duration::from_secs(self.interval);
        config.fetch_timeout = Duration::from_secs(self.fetch_timeout);
        config.socket_path = self.socket;

        let client = MetadataClient::connect(&config.metadata_url, config.fetch_timeout)
            .context("metadata service unreachable during initialization")?;

        start_blocking(config, client).context("daemon exited with error")
    }
}
