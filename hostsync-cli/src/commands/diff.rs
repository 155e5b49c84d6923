//! `hostsync diff` — unified diff of what the next cycle would write.
//!
//! Fetches the host set once and renders the merge without touching the
//! hosts file or the backup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use similar::TextDiff;

use hostsync_core::config::{
    self, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_HOSTS_FILE, DEFAULT_METADATA_URL,
};
use hostsync_engine::preview::render_preview;
use hostsync_metadata::{HostSource, MetadataClient};

/// Arguments for `hostsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Base URL of the metadata service.
    #[arg(long, default_value = DEFAULT_METADATA_URL)]
    pub metadata_url: String,

    /// Hosts file to compare against.
    #[arg(long, default_value = DEFAULT_HOSTS_FILE)]
    pub hosts_file: PathBuf,

    /// Backup path holding the foreign baseline [default: <hosts-file>.backup]
    #[arg(long)]
    pub backup_file: Option<PathBuf>,

    /// Per-request metadata fetch timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout: u64,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let backup = self
            .backup_file
            .unwrap_or_else(|| config::backup_path_for(&self.hosts_file));

        let client =
            MetadataClient::new(&self.metadata_url, Duration::from_secs(self.fetch_timeout));
        let observed = client
            .fetch_hosts()
            .context("failed to fetch hosts from metadata service")?;

        let rendered = render_preview(&self.hosts_file, &backup, &observed)
            .context("failed to render preview")?;
        let existing = read_existing_or_empty(&self.hosts_file)?;

        if existing == rendered {
            println!("{} hosts file is up to date", "✓".green());
            return Ok(());
        }

        let old_header = format!("a/{}", self.hosts_file.display());
        let new_header = format!("b/{}", self.hosts_file.display());
        let unified = TextDiff::from_lines(&existing, &rendered)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();
        print!("{unified}");
        Ok(())
    }
}

fn read_existing_or_empty(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}
