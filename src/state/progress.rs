//! Stage progression for packages in pre-release
//!
//! A package moves through
//! `absent -> (stage, 0, target) -> (stage, n + 1, target) -> absent`.
//! Switching stage or target starts a new lifetime at counter 0. These helpers
//! are pure; persisting the result is up to the caller via
//! [`write_state`](super::write_state).

use super::{PackageState, State};
use crate::domain::{Identifier, Version};
use crate::error::{ReleaseError, Result};
use tracing::debug;

impl PackageState {
    /// Start a new pre-release lifetime for `target` in `stage`
    pub fn new(stage: &str, target: &Version) -> Result<Self> {
        validate_stage(stage)?;
        Ok(PackageState {
            stage: stage.to_string(),
            counter: 0,
            target_version: target.base(),
        })
    }

    /// The pre-release version this state denotes, e.g. `1.4.0-beta.2`
    pub fn version(&self) -> Result<Version> {
        self.target_version
            .base()
            .with_prerelease(&format!("{}.{}", self.stage, self.counter))
    }

    /// Same stage and target, next build
    pub fn increment(&self) -> Result<Self> {
        let counter = self.counter.checked_add(1).ok_or_else(|| {
            ReleaseError::format(format!(
                "Pre-release counter for '{}' of {} cannot advance past {}",
                self.stage, self.target_version, self.counter
            ))
        })?;
        Ok(PackageState {
            stage: self.stage.clone(),
            counter,
            target_version: self.target_version.clone(),
        })
    }
}

impl State {
    pub fn get(&self, package: &str) -> Option<&PackageState> {
        self.packages.get(package)
    }

    /// Record the next pre-release build of `package` and return its version
    ///
    /// # Examples
    /// ```
    /// use pkg_release::domain::Version;
    /// use pkg_release::state::State;
    ///
    /// let mut state = State::default();
    /// let target = Version::new(2, 0, 0);
    /// assert_eq!(state.next_prerelease("core", "rc", &target).unwrap().to_string(), "2.0.0-rc.0");
    /// assert_eq!(state.next_prerelease("core", "rc", &target).unwrap().to_string(), "2.0.0-rc.1");
    /// ```
    pub fn next_prerelease(
        &mut self,
        package: &str,
        stage: &str,
        target: &Version,
    ) -> Result<Version> {
        let fresh = PackageState::new(stage, target)?;

        let next = match self.packages.get(package) {
            Some(current)
                if current.stage == fresh.stage
                    && current.target_version == fresh.target_version =>
            {
                current.increment()?
            }
            Some(current) => {
                debug!(
                    package,
                    from_stage = %current.stage,
                    to_stage = %fresh.stage,
                    target = %fresh.target_version,
                    "starting new pre-release lifetime"
                );
                fresh
            }
            None => fresh,
        };

        let version = next.version()?;
        self.packages.insert(package.to_string(), next);
        Ok(version)
    }

    /// Take `package` out of pre-release, returning its last state
    pub fn finalize(&mut self, package: &str) -> Option<PackageState> {
        self.packages.remove(package)
    }
}

/// A stage is one alphanumeric pre-release identifier such as `beta` or `rc`
fn validate_stage(stage: &str) -> Result<()> {
    match Identifier::parse(stage) {
        Ok(Identifier::AlphaNumeric(_)) => Ok(()),
        Ok(Identifier::Numeric(_)) => Err(ReleaseError::format(format!(
            "Pre-release stage must not be numeric: '{}'",
            stage
        ))),
        Err(_) => Err(ReleaseError::format(format!(
            "Invalid pre-release stage: '{}'",
            stage
        ))),
    }
}
