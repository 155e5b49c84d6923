//! Change detection and hosts-file reconciliation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use hostsync_core::{HostEntry, HostName};

use crate::baseline::{self, ForeignLine};
use crate::error::EngineError;
use crate::writer;

/// The name → address mapping the daemon currently manages.
///
/// A `BTreeMap` so that rendering is deterministic: the same membership
/// always produces byte-identical file content.
pub type ManagedSet = BTreeMap<HostName, String>;

/// Result of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Observed membership matches the managed set; no filesystem access.
    Unchanged,
    /// The hosts file was rewritten with this content.
    Applied { content: String },
}

/// Owns the managed set and drives the reconcile-merge-write sequence.
///
/// Exactly one reconciliation may run at a time; callers serialize access
/// (the daemon funnels every trigger through a single worker task).
pub struct Reconciler {
    hosts_path: PathBuf,
    backup_path: PathBuf,
    managed: ManagedSet,
}

impl Reconciler {
    pub fn new(hosts_path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            hosts_path: hosts_path.into(),
            backup_path: backup_path.into(),
            managed: ManagedSet::new(),
        }
    }

    /// The set applied by the most recent successful write.
    pub fn managed(&self) -> &ManagedSet {
        &self.managed
    }

    /// Compare `observed` against the managed set and rewrite the hosts
    /// file if membership changed.
    ///
    /// The managed set is replaced only after the write succeeds, so a
    /// failed write leaves the previous state intact and the same diff is
    /// retried on the next cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the backup capture, backup read, or
    /// target rewrite fails.
    pub fn reconcile(&mut self, observed: &[HostEntry]) -> Result<ReconcileOutcome, EngineError> {
        let current = dedup_by_name(observed);
        if current == self.managed {
            tracing::debug!("no change detected in observed hosts");
            return Ok(ReconcileOutcome::Unchanged);
        }

        log_membership_delta(&self.managed, &current);

        let foreign = baseline::load_or_capture(&self.hosts_path, &self.backup_path)?;
        let content = render(&foreign, &current);
        writer::replace_file(&self.hosts_path, content.as_bytes())?;
        self.managed = current;

        tracing::info!(
            path = %self.hosts_path.display(),
            hosts = self.managed.len(),
            "hosts file rewritten"
        );
        Ok(ReconcileOutcome::Applied { content })
    }
}

/// Collapse observed entries into a map; the first occurrence of a name wins.
pub(crate) fn dedup_by_name(observed: &[HostEntry]) -> ManagedSet {
    let mut current = ManagedSet::new();
    for entry in observed {
        if current.contains_key(&entry.name) {
            tracing::debug!(host = %entry.name, "duplicate hostname in fetch, keeping first");
            continue;
        }
        current.insert(entry.name.clone(), entry.address.clone());
    }
    current
}

fn log_membership_delta(managed: &ManagedSet, current: &ManagedSet) {
    for (name, address) in current {
        match managed.get(name) {
            None => tracing::info!(host = %name, address = %address, "adding host"),
            Some(previous) if previous != address => {
                tracing::info!(host = %name, old = %previous, new = %address, "host address changed");
            }
            Some(_) => {}
        }
    }
    for name in managed.keys().filter(|name| !current.contains_key(*name)) {
        tracing::info!(host = %name, "removing host");
    }
}

/// Render the merged file: foreign lines in original order, then managed
/// entries in name order.
///
/// A name present in both sets belongs to the managed side — it is removed
/// from the foreign line, and a foreign line with no names left is dropped.
pub(crate) fn render(foreign: &[ForeignLine], current: &ManagedSet) -> String {
    let mut out = String::new();
    for line in foreign {
        match line {
            ForeignLine::Comment(text) => {
                out.push_str(text);
                out.push('\n');
            }
            ForeignLine::Entry { address, names } => {
                let kept: Vec<&str> = names
                    .iter()
                    .map(String::as_str)
                    .filter(|name| !current.contains_key(*name))
                    .collect();
                if kept.is_empty() {
                    continue;
                }
                out.push_str(address);
                out.push('\t');
                out.push_str(&kept.join(" "));
                out.push('\n');
            }
        }
    }
    for (name, address) in current {
        out.push_str(address);
        out.push('\t');
        out.push_str(&name.0);
        out.push('\n');
    }
    out
}
