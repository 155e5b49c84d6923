//! Daemon configuration.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem
//! paths. Every field has a conservative default so `SyncConfig::default()`
//! describes a production deployment and tests override what they need.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hosts file the daemon manages.
pub const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";

/// Base URL of the metadata service answering `GET <base>/hosts`.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.internal/v1";

/// Control socket for `status` / `refresh` / `stop`.
pub const DEFAULT_SOCKET_PATH: &str = "/run/hostsync.sock";

/// Seconds between reconciliation cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Per-request timeout on metadata fetches.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration for one hostsync daemon instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// The authoritative hosts file to rewrite.
    pub hosts_path: PathBuf,
    /// One-time snapshot of the pre-daemon hosts file content.
    pub backup_path: PathBuf,
    /// Base URL of the metadata service.
    pub metadata_url: String,
    /// Fixed delay between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    /// Timeout applied to each metadata HTTP request.
    pub fetch_timeout: Duration,
    /// Unix socket the control server listens on.
    pub socket_path: PathBuf,
}

impl SyncConfig {
    /// Config for a given hosts file, with the backup derived as a sibling.
    pub fn for_hosts_file(hosts_path: impl Into<PathBuf>) -> Self {
        let hosts_path = hosts_path.into();
        let backup_path = backup_path_for(&hosts_path);
        Self {
            hosts_path,
            backup_path,
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::for_hosts_file(DEFAULT_HOSTS_FILE)
    }
}

/// Sibling backup path for a hosts file: `<path>.backup`.
pub fn backup_path_for(hosts_path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.backup", hosts_path.display()))
}
