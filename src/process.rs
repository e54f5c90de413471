// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! File helpers shared by the ledger and the publisher.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::core::error::{PostFlowError, Result};

/// Reads the file at `path` to a string.
///
/// # Errors
///
/// Returns `IOError` carrying `path` if the file cannot be read.
pub fn read_content<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|e| PostFlowError::io_error(path.to_path_buf(), e))
}

/// Writes `content` to `path`, creating parent directories as needed.
pub fn write_content<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;
    fs::write(path, content)
        .map_err(|e| PostFlowError::io_error(path.to_path_buf(), e))
}

/// Replaces `path` with `content` through a temporary file in the same
/// directory, so readers see either the old or the new document.
///
/// The replacement keeps the permissions of the file it replaces. A new
/// file gets [`NEW_FILE_MODE`] on Unix.
pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = create_parent(path)?;

    let mut file = NamedTempFile::new_in(&dir)
        .map_err(|e| PostFlowError::io_error(dir.clone(), e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| PostFlowError::io_error(file.path().to_path_buf(), e))?;
    if let Some(permissions) = target_permissions(path) {
        file.as_file()
            .set_permissions(permissions)
            .map_err(|e| PostFlowError::io_error(file.path().to_path_buf(), e))?;
    }
    let _ = file
        .persist(path)
        .map_err(|e| PostFlowError::io_error(path.to_path_buf(), e.error))?;
    Ok(())
}

/// Mode of files created by [`write_atomic`]; temp files start at 0600.
pub const NEW_FILE_MODE: u32 = 0o644;

fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

fn create_parent(path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .map_err(|e| PostFlowError::io_error(parent.clone(), e))?;
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_content_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("page.html");

        write_content(&path, "<p>hi</p>").unwrap();
        assert_eq!(read_content(&path).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();
        assert_eq!(read_content(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blog.html");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).unwrap();

        write_atomic(&path, "new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o664);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("automation").join("ledger.json");

        write_atomic(&path, "[]").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, NEW_FILE_MODE);
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.txt");
        match read_content(&path) {
            Err(PostFlowError::IOError { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
