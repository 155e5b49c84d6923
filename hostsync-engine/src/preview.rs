//! Read-only rendering of what a reconcile cycle would write.
//!
//! Used by `hostsync diff`. Nothing is written and no backup is captured:
//! when the backup does not exist yet, the target file itself stands in as
//! the foreign baseline, exactly as a first write would capture it.

use std::io::ErrorKind;
use std::path::Path;

use hostsync_core::HostEntry;

use crate::baseline;
use crate::error::{io_err, EngineError};
use crate::reconciler;

/// Render the file content a cycle with `observed` membership would produce.
pub fn render_preview(
    hosts_path: &Path,
    backup_path: &Path,
    observed: &[HostEntry],
) -> Result<String, EngineError> {
    let source = if backup_path.exists() {
        backup_path
    } else {
        hosts_path
    };
    let foreign = baseline::parse(&read_or_empty(source)?);
    let current = reconciler::dedup_by_name(observed);
    Ok(reconciler::render(&foreign, &current))
}

fn read_or_empty(path: &Path) -> Result<String, EngineError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}
