//! Ecosystem manifest abstraction
//!
//! Reading and writing a version field inside a particular manifest format
//! (`Cargo.toml`, `package.json`, `pyproject.toml`, ...) is the job of
//! per-ecosystem adapters living outside this crate. They plug in through the
//! [VersionFile] trait so release orchestration never depends on a format.
//!
//! - [mock::MockVersionFile]: in-memory implementation for tests

pub mod mock;

pub use mock::MockVersionFile;

use crate::domain::Version;
use crate::error::Result;
use std::path::PathBuf;

/// Capability every manifest adapter provides
///
/// ## Thread Safety
///
/// Implementors must be `Send + Sync` so one adapter set can serve parallel
/// package releases.
pub trait VersionFile: Send + Sync {
    /// Current version recorded in the manifest
    fn read_version(&self) -> Result<Version>;

    /// Persist `version` into every file the adapter manages
    fn update_version(&self, version: &Version) -> Result<()>;

    /// Files the adapter reads or writes, for reporting and staging
    fn version_files(&self) -> Vec<PathBuf>;
}
