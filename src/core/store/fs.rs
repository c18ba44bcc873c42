//! Filesystem helpers for documents, the ledger and working copies.
//!
//! Everything puff writes may hold secrets or key material, so directories
//! are created 0700 and files written 0600 (Unix).

use std::fs;
use std::io;
use std::path::Path;

use crate::core::constants::{DIR_MODE, FILE_MODE};

/// Read a file, mapping "not found" to `None`.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create `dir` and its parents with owner-only permissions.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(dir)
    }

    #[cfg(not(unix))]
    {
        let _ = DIR_MODE;
        fs::create_dir_all(dir)
    }
}

/// Write `contents` to `path` with owner-only permissions, creating parents.
pub fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(FILE_MODE))?;
    }

    #[cfg(not(unix))]
    let _ = FILE_MODE;

    Ok(())
}
