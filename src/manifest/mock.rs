use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use crate::manifest::VersionFile;
use std::path::PathBuf;
use std::sync::Mutex;

/// Mock manifest holding its version in memory
pub struct MockVersionFile {
    path: PathBuf,
    version: Mutex<Version>,
    fail_updates: bool,
}

impl MockVersionFile {
    pub fn new(path: impl Into<PathBuf>, version: Version) -> Self {
        MockVersionFile {
            path: path.into(),
            version: Mutex::new(version),
            fail_updates: false,
        }
    }

    /// A manifest whose writes always fail, e.g. a read-only checkout
    pub fn read_only(path: impl Into<PathBuf>, version: Version) -> Self {
        MockVersionFile {
            fail_updates: true,
            ..Self::new(path, version)
        }
    }

    fn poisoned(&self) -> ReleaseError {
        ReleaseError::io(
            &self.path,
            std::io::Error::new(std::io::ErrorKind::Other, "mock version lock poisoned"),
        )
    }
}

impl VersionFile for MockVersionFile {
    fn read_version(&self) -> Result<Version> {
        self.version
            .lock()
            .map(|version| version.clone())
            .map_err(|_| self.poisoned())
    }

    fn update_version(&self, version: &Version) -> Result<()> {
        if self.fail_updates {
            return Err(ReleaseError::io(
                &self.path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only manifest"),
            ));
        }

        let mut current = self.version.lock().map_err(|_| self.poisoned())?;
        *current = version.clone();
        Ok(())
    }

    fn version_files(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_and_update() {
        let manifest = MockVersionFile::new("Cargo.toml", Version::new(0, 1, 0));
        assert_eq!(manifest.read_version().unwrap(), Version::new(0, 1, 0));

        manifest.update_version(&Version::new(0, 2, 0)).unwrap();
        assert_eq!(manifest.read_version().unwrap(), Version::new(0, 2, 0));
        assert_eq!(manifest.version_files(), vec![PathBuf::from("Cargo.toml")]);
    }

    #[test]
    fn test_read_only_mock_rejects_updates() {
        let manifest = MockVersionFile::read_only("package.json", Version::new(1, 0, 0));
        let err = manifest.update_version(&Version::new(1, 0, 1)).unwrap_err();
        assert!(err.to_string().contains("package.json"));
        assert_eq!(manifest.read_version().unwrap(), Version::new(1, 0, 0));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let files: Vec<Box<dyn VersionFile>> = vec![
            Box::new(MockVersionFile::new("a/Cargo.toml", Version::new(1, 0, 0))),
            Box::new(MockVersionFile::new("b/Cargo.toml", Version::new(1, 0, 0))),
        ];
        let paths: Vec<PathBuf> = files.iter().flat_map(|f| f.version_files()).collect();
        assert_eq!(paths.len(), 2);
    }
}
