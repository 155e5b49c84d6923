//! Metadata client for hostsync.
//!
//! The daemon never talks HTTP directly — it consumes the [`HostSource`]
//! trait, and [`MetadataClient`] is the production implementation backed by
//! the polling metadata service. Keeping the seam a trait lets the daemon and
//! engine tests substitute a scripted source.

use std::thread::sleep;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use hostsync_core::HostEntry;

/// How often `connect` re-probes an unreachable metadata service.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// How many probes `connect` makes before giving up.
pub const CONNECT_ATTEMPTS: u32 = 15;

/// Errors from the metadata client.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP transport failure or non-2xx response.
    #[error("metadata request failed: {0}")]
    Transport(#[from] Box<ureq::Error>),

    /// The response body could not be read or decoded as host records.
    #[error("malformed metadata response: {0}")]
    Decode(#[from] std::io::Error),

    /// The service never became reachable during initialization.
    #[error("metadata service at {url} unreachable after {attempts} attempts")]
    Unavailable { url: String, attempts: u32 },
}

/// The current observed set of host records, once per poll.
///
/// Implementations must be callable repeatedly; a transient error aborts one
/// cycle, never the daemon.
pub trait HostSource {
    fn fetch_hosts(&self) -> Result<Vec<HostEntry>, MetadataError>;
}

/// Wire format of one record in the `GET <base>/hosts` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRecord {
    pub hostname: String,
    pub agent_ip: String,
}

impl From<HostRecord> for HostEntry {
    fn from(record: HostRecord) -> Self {
        HostEntry::new(record.hostname, record.agent_ip)
    }
}

/// Blocking HTTP client for the metadata service.
#[derive(Debug)]
pub struct MetadataClient {
    agent: ureq::Agent,
    hosts_url: String,
}

impl MetadataClient {
    /// Client for `base_url` with a per-request timeout. Makes no request.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            hosts_url: format!("{}/hosts", base_url.trim_end_matches('/')),
        }
    }

    /// Build a client and wait until the service answers, retrying up to
    /// [`CONNECT_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Unavailable`] once the attempts are
    /// exhausted — the caller treats that as a fatal startup failure.
    pub fn connect(base_url: &str, timeout: Duration) -> Result<Self, MetadataError> {
        Self::connect_with(base_url, timeout, CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY)
    }

    fn connect_with(
        base_url: &str,
        timeout: Duration,
        attempts: u32,
        retry_delay: Duration,
    ) -> Result<Self, MetadataError> {
        let client = Self::new(base_url, timeout);
        for attempt in 1..=attempts {
            match client.fetch_hosts() {
                Ok(hosts) => {
                    tracing::info!(
                        url = %client.hosts_url,
                        hosts = hosts.len(),
                        "metadata service reachable"
                    );
                    return Ok(client);
                }
                Err(err) => {
                    tracing::warn!(
                        url = %client.hosts_url,
                        attempt,
                        attempts,
                        error = %err,
                        "metadata service not ready"
                    );
                    if attempt < attempts {
                        sleep(retry_delay);
                    }
                }
            }
        }
        Err(MetadataError::Unavailable {
            url: client.hosts_url,
            attempts,
        })
    }

    /// URL the client polls, for logs and error messages.
    pub fn hosts_url(&self) -> &str {
        &self.hosts_url
    }
}

impl HostSource for MetadataClient {
    fn fetch_hosts(&self) -> Result<Vec<HostEntry>, MetadataError> {
        let response = self
            .agent
            .get(&self.hosts_url)
            .set("Accept", "application/json")
            .call()
            .map_err(Box::new)?;
        let records: Vec<HostRecord> = response.into_json()?;
        Ok(records.into_iter().map(HostEntry::from).collect())
    }
}
