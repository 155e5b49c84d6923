//! Baseline capture and foreign-entry parsing.
//!
//! The first time the daemon decides to write, the target file's pre-daemon
//! content is copied byte-for-byte to the backup path. From then on the
//! backup is the permanent source of "foreign" entries — lines the daemon
//! does not manage but must carry through every rewrite. The backup is
//! re-parsed on every applied cycle rather than cached, so a hand-edited
//! backup takes effect without a restart.

use std::fs;
use std::path::Path;

use crate::error::{io_err, EngineError};
use crate::writer;

/// One preserved line from the pre-daemon hosts file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignLine {
    /// A `#`-prefixed line, reproduced verbatim in every rewrite.
    Comment(String),
    /// An address with the names registered against it.
    Entry { address: String, names: Vec<String> },
}

/// Capture the backup if absent, then parse it into foreign lines.
pub fn load_or_capture(target: &Path, backup: &Path) -> Result<Vec<ForeignLine>, EngineError> {
    capture_if_absent(target, backup)?;
    let content = fs::read_to_string(backup).map_err(|e| io_err(backup, e))?;
    Ok(parse(&content))
}

/// Copy `target` verbatim to `backup`, unless the backup already exists.
///
/// Returns `true` if a capture happened. The backup is written through the
/// same temp-file-then-rename path as the hosts file itself, so a crash
/// mid-capture cannot leave a truncated backup behind.
pub fn capture_if_absent(target: &Path, backup: &Path) -> Result<bool, EngineError> {
    if backup.exists() {
        return Ok(false);
    }
    let original = fs::read(target).map_err(|e| io_err(target, e))?;
    writer::replace_file(backup, &original)?;
    tracing::info!(
        backup = %backup.display(),
        bytes = original.len(),
        "captured pre-managed hosts file"
    );
    Ok(true)
}

/// Parse hosts-file text into foreign lines.
///
/// Blank lines are dropped. Comment lines are kept verbatim but register no
/// names. An entry line splits on the first whitespace run into an address
/// token and one or more names; a line with no name after the address is
/// malformed and skipped.
pub fn parse(content: &str) -> Vec<ForeignLine> {
    let mut lines = Vec::new();
    for raw in content.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            lines.push(ForeignLine::Comment(raw.to_string()));
            continue;
        }
        let mut tokens = raw.split_whitespace();
        let Some(address) = tokens.next() else {
            continue;
        };
        let names: Vec<String> = tokens.map(str::to_owned).collect();
        if names.is_empty() {
            tracing::debug!(line = raw, "skipping hosts line without a name");
            continue;
        }
        lines.push(ForeignLine::Entry {
            address: address.to_string(),
            names,
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn entry(address: &str, names: &[&str]) -> ForeignLine {
        ForeignLine::Entry {
            address: address.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn parses_single_name_lines() {
        let lines = parse("127.0.0.1\tlocalhost\n10.0.0.1 node-1\n");
        assert_eq!(
            lines,
            vec![
                entry("127.0.0.1", &["localhost"]),
                entry("10.0.0.1", &["node-1"]),
            ]
        );
    }

    #[test]
    fn registers_every_name_on_a_line() {
        let lines = parse("::1    localhost ip6-localhost ip6-loopback\n");
        assert_eq!(
            lines,
            vec![entry("::1", &["localhost", "ip6-localhost", "ip6-loopback"])]
        );
    }

    #[test]
    fn comments_are_kept_verbatim_but_register_nothing() {
        let lines = parse("# The following lines are desirable for IPv6\n::1\tlocalhost\n");
        assert_eq!(
            lines,
            vec![
                ForeignLine::Comment("# The following lines are desirable for IPv6".to_string()),
                entry("::1", &["localhost"]),
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("\n\n\n")]
    #[case("   \n\t\n")]
    fn blank_content_parses_to_nothing(#[case] content: &str) {
        assert!(parse(content).is_empty());
    }

    #[rstest]
    #[case("addresswithoutname\n")]
    #[case("10.0.0.1\n")]
    fn line_without_separator_is_skipped(#[case] content: &str) {
        assert!(parse(content).is_empty());
    }

    #[test]
    fn mixed_file_with_blanks_and_comments() {
        let content = "\n# static entries\n127.0.0.1 localhost\n\n   # indented comment\nbroken\n10.1.1.1\tdb primary-db\n";
        let lines = parse(content);
        assert_eq!(
            lines,
            vec![
                ForeignLine::Comment("# static entries".to_string()),
                entry("127.0.0.1", &["localhost"]),
                ForeignLine::Comment("   # indented comment".to_string()),
                entry("10.1.1.1", &["db", "primary-db"]),
            ]
        );
    }

    #[test]
    fn capture_copies_target_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("hosts");
        let backup = dir.path().join("hosts.backup");
        fs::write(&target, "127.0.0.1 localhost\n# comment\n").unwrap();

        assert!(capture_if_absent(&target, &backup).unwrap());
        assert_eq!(
            fs::read_to_string(&backup).unwrap(),
            "127.0.0.1 localhost\n# comment\n"
        );
    }

    #[test]
    fn capture_never_overwrites_existing_backup() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("hosts");
        let backup = dir.path().join("hosts.backup");
        fs::write(&target, "current content\n").unwrap();
        fs::write(&backup, "original content\n").unwrap();

        assert!(!capture_if_absent(&target, &backup).unwrap());
        assert_eq!(fs::read_to_string(&backup).unwrap(), "original content\n");
    }

    #[test]
    fn capture_missing_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("does-not-exist");
        let backup = dir.path().join("hosts.backup");
        let err = capture_if_absent(&target, &backup).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
        assert!(!backup.exists());
    }

    #[test]
    fn load_or_capture_reads_backup_not_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("hosts");
        let backup = dir.path().join("hosts.backup");
        fs::write(&target, "10.9.9.9 drifted\n").unwrap();
        fs::write(&backup, "127.0.0.1 localhost\n").unwrap();

        let lines = load_or_capture(&target, &backup).unwrap();
        assert_eq!(lines, vec![entry("127.0.0.1", &["localhost"])]);
    }
}
