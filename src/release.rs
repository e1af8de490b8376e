//! Release orchestration
//!
//! Composes the version algebra, manifest adapters, the pre-release store and
//! the history ledger into the two flows a front end needs: cutting the next
//! pre-release build of a package and shipping a final release.

use crate::config::{Config, ReleasePaths};
use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use crate::history::{append_to_history, init_history, Consignment, HistoryEntry};
use crate::manifest::VersionFile;
use crate::state::{delete_state, read_state, write_state};
use std::path::Path;
use tracing::{debug, info};

/// Version the consignments call for: `current` bumped by the highest change
/// type among them, or `None` when there is nothing to release.
pub fn next_version(current: &Version, consignments: &[Consignment]) -> Result<Option<Version>> {
    consignments
        .iter()
        .map(|c| c.change_type)
        .max()
        .map(|change| current.bump(change))
        .transpose()
}

/// Expand `{package}` and `{version}` in a tag pattern
pub fn format_tag(pattern: &str, package: &str, version: &Version) -> Result<String> {
    if !pattern.contains("{version}") {
        return Err(ReleaseError::config(format!(
            "Tag pattern must contain {{version}} placeholder: '{}'",
            pattern
        )));
    }

    Ok(pattern
        .replace("{package}", package)
        .replace("{version}", &version.to_string()))
}

/// Records pre-release builds and releases for one repository
#[derive(Debug, Clone)]
pub struct Releaser {
    paths: ReleasePaths,
    tag_pattern: String,
    default_stage: String,
}

impl Releaser {
    pub fn new(
        paths: ReleasePaths,
        tag_pattern: impl Into<String>,
        default_stage: impl Into<String>,
    ) -> Self {
        Releaser {
            paths,
            tag_pattern: tag_pattern.into(),
            default_stage: default_stage.into(),
        }
    }

    pub fn from_config(config: &Config, root: &Path) -> Self {
        Releaser::new(
            config.resolve(root),
            config.release.tag_pattern.clone(),
            config.prerelease.default_stage.clone(),
        )
    }

    pub fn paths(&self) -> &ReleasePaths {
        &self.paths
    }

    /// Setup step: create the ledger if this repository has none yet
    pub fn init(&self) -> Result<()> {
        init_history(&self.paths.history_file)?;
        Ok(())
    }

    /// Cut the next pre-release build of `package` towards `target`
    ///
    /// Reads the pre-release state, advances the package, writes the new
    /// version into every manifest and saves the state. The state is only
    /// saved once all manifests were updated.
    pub fn prerelease(
        &self,
        package: &str,
        stage: Option<&str>,
        target: &Version,
        files: &[&dyn VersionFile],
    ) -> Result<Version> {
        let stage = stage.unwrap_or(self.default_stage.as_str());
        let mut state = read_state(&self.paths.state_file)?;
        let version = state.next_prerelease(package, stage, target)?;

        update_files(files, &version)?;
        write_state(&self.paths.state_file, &state)?;

        info!(package, version = %version, "recorded pre-release build");
        Ok(version)
    }

    /// Ship `version` of `package`
    ///
    /// Writes the version into every manifest, appends a ledger entry and
    /// takes the package out of pre-release. The state file is removed once
    /// no package is in pre-release anymore.
    pub fn release(
        &self,
        package: &str,
        version: &Version,
        consignments: Vec<Consignment>,
        files: &[&dyn VersionFile],
    ) -> Result<HistoryEntry> {
        let tag = format_tag(&self.tag_pattern, package, version)?;

        update_files(files, version)?;

        let entry = HistoryEntry::new(package, version.clone(), tag, consignments);
        append_to_history(&self.paths.history_file, std::slice::from_ref(&entry))?;

        let mut state = read_state(&self.paths.state_file)?;
        if let Some(finished) = state.finalize(package) {
            debug!(package, stage = %finished.stage, counter = finished.counter, "leaving pre-release");
            if state.is_empty() {
                delete_state(&self.paths.state_file)?;
            } else {
                write_state(&self.paths.state_file, &state)?;
            }
        }

        info!(package, version = %version, tag = %entry.tag, "recorded release");
        Ok(entry)
    }
}

fn update_files(files: &[&dyn VersionFile], version: &Version) -> Result<()> {
    for file in files {
        file.update_version(version)?;
        debug!(files = ?file.version_files(), version = %version, "updated manifest");
    }
    Ok(())
}
