//! Crash-safe file replacement

use crate::error::{ReleaseError, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::Builder;
use tracing::warn;

/// Replace `path` with `content` atomically.
///
/// The content is written and fsynced to a temporary sibling of `path`, which
/// is then renamed over the target. Readers observe either the old file or the
/// new one. If anything fails before the rename succeeds, the temporary file
/// is removed and the target is left untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = match path.file_name() {
        Some(name) => format!(".{}.", name.to_string_lossy()),
        None => ".tmp.".to_string(),
    };

    let mut temp = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| ReleaseError::io(dir, e))?;

    temp.write_all(content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| ReleaseError::io(temp.path(), e))?;

    // On failure the returned NamedTempFile is dropped, deleting the temp file
    temp.persist(path)
        .map_err(|e| ReleaseError::io(path, e.error))?;

    if let Err(e) = sync_dir(dir) {
        warn!(
            dir = %dir.display(),
            error = %e,
            "directory sync failed, rename may not be durable"
        );
    }

    Ok(())
}

/// Flush a directory entry so a completed rename survives a crash
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}
