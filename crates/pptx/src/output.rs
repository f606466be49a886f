//! Output files that only ever appear complete.
//!
//! Everything is written to a temporary file in the destination directory
//! and renamed over the final path, so a crash leaves either the old file
//! or the new one.

use pptx_name_core::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Create an empty temporary file next to `path`.
pub fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}

/// Flush a finished temporary file and rename it to `path`.
///
/// Temporary files are created private. Before the rename the file takes
/// the permissions of `path` if it already exists, otherwise those of
/// `like`.
pub fn persist(temp: NamedTempFile, path: &Path, like: Option<&Path>) -> Result<()> {
    copy_permissions(&temp, path, like)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::PersistError {
        path: path.to_path_buf(),
        reason: e.error.to_string(),
    })?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Write `bytes` to `path` atomically.
pub fn write_atomic(path: &Path, bytes: &[u8], like: Option<&Path>) -> Result<()> {
    let mut temp = temp_file_beside(path)?;
    temp.write_all(bytes)?;
    persist(temp, path, like)
}

fn copy_permissions(temp: &NamedTempFile, path: &Path, like: Option<&Path>) -> Result<()> {
    let reference = std::iter::once(path)
        .chain(like)
        .find_map(|candidate| std::fs::metadata(candidate).ok());

    match reference {
        Some(metadata) => temp.as_file().set_permissions(metadata.permissions())?,
        None => log::debug!("No permissions to copy for {}", path.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pptx");

        std::fs::write(&path, b"old").unwrap();
        write_atomic(&path, b"new content", None).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new content");
        // No temporary files are left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.pptx");

        assert!(write_atomic(&path, b"x", None).is_err());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_follow_destination_then_reference() {
        use std::os::unix::fs::PermissionsExt;

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        let dir = tempfile::tempdir().unwrap();

        let existing = dir.path().join("existing.pptx");
        std::fs::write(&existing, b"old").unwrap();
        std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o644)).unwrap();
        write_atomic(&existing, b"new", None).unwrap();
        assert_eq!(mode(&existing), 0o644);

        let source = dir.path().join("source.pptx");
        std::fs::write(&source, b"src").unwrap();
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o640)).unwrap();
        let fresh = dir.path().join("fresh.pptx");
        write_atomic(&fresh, b"new", Some(&source)).unwrap();
        assert_eq!(mode(&fresh), 0o640);
    }
}
