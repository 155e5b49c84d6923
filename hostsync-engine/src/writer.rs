//! Full-content file replacement.
//!
//! Writes to `<path>.hostsync.tmp`, fixes permissions at 0644, then renames
//! over the target — the rename is atomic on POSIX, so readers observe either
//! the old content or the new, never a torn write.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{io_err, EngineError};

#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Replace `path` with `content` in a single rename.
///
/// The temp file is removed if the rename fails, leaving the original
/// content intact.
pub(crate) fn replace_file(path: &Path, content: &[u8]) -> Result<(), EngineError> {
    let tmp = PathBuf::from(format!("{}.hostsync.tmp", path.display()));
    fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    set_file_mode(&tmp)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(unix)]
fn set_file_mode(path: &Path) -> Result<(), EngineError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path) -> Result<(), EngineError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_file_with_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        replace_file(&path, b"10.0.0.1\tnode-1\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "10.0.0.1\tnode-1\n");
    }

    #[test]
    fn overwrites_whole_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "old content that is much longer than the new one\n").unwrap();
        replace_file(&path, b"new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        replace_file(&path, b"data\n").unwrap();
        let tmp = PathBuf::from(format!("{}.hostsync.tmp", path.display()));
        assert!(!tmp.exists(), ".hostsync.tmp must be cleaned up");
    }

    #[test]
    #[cfg(unix)]
    fn written_file_has_conservative_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        replace_file(&path, b"x\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    #[cfg(unix)]
    fn write_into_readonly_dir_fails_and_preserves_original() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly = root.path().join("readonly");
        fs::create_dir_all(&readonly).unwrap();
        let path = readonly.join("hosts");
        fs::write(&path, "original\n").unwrap();

        let mut perms = fs::metadata(&readonly).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly, perms).unwrap();

        let err = replace_file(&path, b"replacement\n");
        assert!(err.is_err(), "write into read-only dir should fail");
        // Restore so TempDir can clean up.
        let mut perms = fs::metadata(&readonly).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly, perms).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "original\n");
    }
}
