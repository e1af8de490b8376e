//! Durable pre-release progress shared across process invocations
//!
//! The store is a single JSON document:
//!
//! ```json
//! { "packages": { "core": { "stage": "beta", "counter": 2, "targetVersion": "1.4.0" } } }
//! ```
//!
//! Reads take a shared lock and writes an exclusive lock on the sidecar
//! `<path>.lock`. Each lock covers one call only: a read followed by a write
//! is not atomic as a pair, and concurrent read-modify-write cycles resolve
//! as last-writer-wins.

pub mod progress;

use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use crate::fsutil::write_atomic;
use crate::lock::FileLock;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Pre-release progress of a single package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageState {
    pub stage: String,
    pub counter: u64,
    pub target_version: Version,
}

/// All packages currently in pre-release, keyed by package name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub packages: BTreeMap<String, PackageState>,
}

type PackageMap = BTreeMap<String, PackageState>;

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<PackageMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PackageMap>::deserialize(deserializer)?.unwrap_or_default())
}

impl State {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Read the state file. A missing file is the empty state, not an error.
pub fn read_state(path: &Path) -> Result<State> {
    if !exists(path) {
        debug!(path = %path.display(), "no pre-release state file, starting empty");
        return Ok(State::default());
    }

    let lock = FileLock::shared(path)?;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        // Deleted between the probe and the lock
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(State::default()),
        Err(e) => return Err(ReleaseError::io(path, e)),
    };
    lock.release()?;

    serde_json::from_str(&content).map_err(|e| ReleaseError::data(path, e.to_string()))
}

/// Replace the state file with `state` under an exclusive lock
pub fn write_state(path: &Path, state: &State) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReleaseError::io(parent, e))?;
    }

    let mut content = serde_json::to_string_pretty(state)
        .map_err(|e| ReleaseError::data(path, e.to_string()))?;
    content.push('\n');

    let lock = FileLock::exclusive(path)?;
    write_atomic(path, content.as_bytes())?;
    lock.release()?;

    info!(
        path = %path.display(),
        packages = state.packages.len(),
        "wrote pre-release state"
    );
    Ok(())
}

/// Remove the state file; an already missing file is success
pub fn delete_state(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "deleted pre-release state");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReleaseError::io(path, e)),
    }
}

/// Whether the state file exists
pub fn exists(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> State {
        let mut packages = BTreeMap::new();
        packages.insert(
            "core".to_string(),
            PackageState {
                stage: "beta".to_string(),
                counter: 2,
                target_version: Version::new(1, 4, 0),
            },
        );
        State { packages }
    }

    #[test]
    fn test_read_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let state = read_state(&dir.path().join("prerelease.json")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prerelease.json");

        write_state(&path, &sample_state()).unwrap();
        assert!(exists(&path));
        assert_eq!(read_state(&path).unwrap(), sample_state());
    }

    #[test]
    fn test_file_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prerelease.json");
        write_state(&path, &sample_state()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["packages"]["core"]["stage"], "beta");
        assert_eq!(raw["packages"]["core"]["counter"], 2);
        assert_eq!(raw["packages"]["core"]["targetVersion"], "1.4.0");
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".release").join("prerelease.json");

        write_state(&path, &State::default()).unwrap();
        assert!(path.exists());
        assert!(FileLock::lock_path(&path).exists());
    }

    #[test]
    fn test_null_and_missing_packages_are_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prerelease.json");

        fs::write(&path, r#"{"packages": null}"#).unwrap();
        assert!(read_state(&path).unwrap().packages.is_empty());

        fs::write(&path, "{}").unwrap();
        assert!(read_state(&path).unwrap().packages.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_data_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prerelease.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_state(&path), Err(ReleaseError::Data { .. })));
    }

    #[test]
    fn test_invalid_target_version_is_data_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prerelease.json");

        fs::write(
            &path,
            r#"{"packages": {"core": {"stage": "beta", "counter": 0, "targetVersion": "1.4"}}}"#,
        )
        .unwrap();
        assert!(matches!(read_state(&path), Err(ReleaseError::Data { .. })));
    }

    #[test]
    fn test_delete_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prerelease.json");

        delete_state(&path).unwrap();

        write_state(&path, &sample_state()).unwrap();
        delete_state(&path).unwrap();
        assert!(!exists(&path));
        assert!(read_state(&path).unwrap().is_empty());
    }
}
