//! Sidecar advisory file locks
//!
//! Every persisted resource `<path>` is guarded by an OS-level advisory lock
//! on `<path>.lock`. The lock file carries no content. Shared locks may be
//! held by many readers at once; an exclusive lock excludes everyone else.
//! Acquisition blocks without a timeout.

use crate::error::{ReleaseError, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Lock flavour requested on a sidecar lock file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// A held advisory lock, released explicitly via [`FileLock::release`] or
/// when dropped
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    mode: LockMode,
    file: Option<File>,
}

impl FileLock {
    /// Sidecar lock path for a resource: `<resource>.lock`
    pub fn lock_path(resource: &Path) -> PathBuf {
        let mut name = resource.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Block until a shared (read) lock on `resource` is held
    pub fn shared(resource: &Path) -> Result<Self> {
        Self::acquire(resource, LockMode::Shared)
    }

    /// Block until an exclusive (write) lock on `resource` is held
    pub fn exclusive(resource: &Path) -> Result<Self> {
        Self::acquire(resource, LockMode::Exclusive)
    }

    pub fn acquire(resource: &Path, mode: LockMode) -> Result<Self> {
        let path = Self::lock_path(resource);

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ReleaseError::lock(&path, e))?;

        flock(&file, Some(mode)).map_err(|e| ReleaseError::lock(&path, e))?;
        debug!(path = %path.display(), ?mode, "acquired file lock");

        Ok(FileLock {
            path,
            mode,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Release the lock, reporting a failed unlock instead of swallowing it
    pub fn release(mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            flock(&file, None).map_err(|e| ReleaseError::lock(&self.path, e))?;
            debug!(path = %self.path.display(), "released file lock");
        }
        Ok(())
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            // Closing the descriptor releases the lock even if this fails
            if let Err(e) = flock(&file, None) {
                warn!(path = %self.path.display(), error = %e, "failed to unlock file");
            }
        }
    }
}

/// Apply `mode` to the file, or unlock it when `mode` is `None`
#[cfg(unix)]
fn flock(file: &File, mode: Option<LockMode>) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::fcntl::FlockArg;
    use std::os::unix::io::AsRawFd;

    let arg = match mode {
        Some(LockMode::Shared) => FlockArg::LockShared,
        Some(LockMode::Exclusive) => FlockArg::LockExclusive,
        None => FlockArg::Unlock,
    };

    loop {
        match nix::fcntl::flock(file.as_raw_fd(), arg) {
            Ok(()) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(not(unix))]
fn flock(_file: &File, _mode: Option<LockMode>) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "advisory file locks require a unix platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_appends_suffix() {
        assert_eq!(
            FileLock::lock_path(Path::new("/repo/.release/history.json")),
            PathBuf::from("/repo/.release/history.json.lock")
        );
        assert_eq!(
            FileLock::lock_path(Path::new("state")),
            PathBuf::from("state.lock")
        );
    }

    #[test]
    fn test_acquire_creates_sidecar_only() {
        let dir = TempDir::new().unwrap();
        let resource = dir.path().join("state.json");

        let lock = FileLock::exclusive(&resource).unwrap();
        assert_eq!(lock.mode(), LockMode::Exclusive);
        assert!(lock.path().exists());
        assert!(!resource.exists());
        lock.release().unwrap();
    }

    fn assert_blocks(held_mode: LockMode, waiting_mode: LockMode) {
        let dir = TempDir::new().unwrap();
        let resource = dir.path().join("ledger.json");

        let held = FileLock::acquire(&resource, held_mode).unwrap();
        let acquired = Arc::new(AtomicBool::new(false));

        let waiter = {
            let resource = resource.clone();
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let lock = FileLock::acquire(&resource, waiting_mode).unwrap();
                acquired.store(true, Ordering::SeqCst);
                lock.release().unwrap();
            })
        };

        thread::sleep(Duration::from_millis(150));
        assert!(
            !acquired.load(Ordering::SeqCst),
            "{:?} lock acquired while {:?} lock was held",
            waiting_mode,
            held_mode
        );

        held.release().unwrap();
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_exclusive_blocks_exclusive() {
        assert_blocks(LockMode::Exclusive, LockMode::Exclusive);
    }

    #[test]
    fn test_shared_blocks_exclusive() {
        assert_blocks(LockMode::Shared, LockMode::Exclusive);
    }

    #[test]
    fn test_exclusive_blocks_shared() {
        assert_blocks(LockMode::Exclusive, LockMode::Shared);
    }

    #[test]
    fn test_shared_locks_coexist() {
        let dir = TempDir::new().unwrap();
        let resource = dir.path().join("state.json");

        let first = FileLock::shared(&resource).unwrap();
        let reader = {
            let resource = resource.clone();
            thread::spawn(move || FileLock::shared(&resource).map(|lock| lock.release()))
        };

        assert!(reader.join().unwrap().is_ok());
        first.release().unwrap();
    }

    #[test]
    fn test_drop_releases_lock() {
        let dir = TempDir::new().unwrap();
        let resource = dir.path().join("state.json");

        {
            let _lock = FileLock::exclusive(&resource).unwrap();
        }

        let again = FileLock::exclusive(&resource).unwrap();
        again.release().unwrap();
    }

    #[test]
    fn test_missing_parent_is_lock_error() {
        let dir = TempDir::new().unwrap();
        let resource = dir.path().join("missing").join("state.json");

        let err = FileLock::shared(&resource).unwrap_err();
        assert!(matches!(err, ReleaseError::Lock { .. }));
        assert!(err.is_io_kind(io::ErrorKind::NotFound));
    }
}
