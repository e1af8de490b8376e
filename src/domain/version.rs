use super::prerelease::{BuildMetadata, Prerelease};
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Semantic version representation
///
/// Values are immutable in spirit: every derivation (`bump`,
/// `with_prerelease`, `with_build_metadata`) returns a new `Version`.
///
/// `Ord` orders by precedence and breaks ties on build metadata so that it
/// stays consistent with `Eq`. Use [`Version::cmp_precedence`] (or
/// [`compare`]) when build metadata must be ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Prerelease,
    pub build: BuildMetadata,
}

impl Version {
    /// Create a release version with no pre-release or build metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }

    /// Parse a version string such as `v1.2.3-beta.4+build.7`
    ///
    /// An optional leading `v` is stripped, build metadata is split off at
    /// the first `+`, then the pre-release at the first `-` of what remains.
    /// The core must be exactly three decimal numbers without leading zeros.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(ReleaseError::format("Empty version string"));
        }

        let clean = text.strip_prefix('v').unwrap_or(text);

        let (rest, build) = match clean.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (clean, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseError::format(format!(
                "Invalid version format: '{}' - expected MAJOR.MINOR.PATCH",
                text
            )));
        }

        let major = parse_numeric(parts[0], "major", text)?;
        let minor = parse_numeric(parts[1], "minor", text)?;
        let patch = parse_numeric(parts[2], "patch", text)?;

        let pre = match pre {
            Some("") => {
                return Err(ReleaseError::format(format!(
                    "Empty pre-release after '-' in '{}'",
                    text
                )))
            }
            Some(pre) => Prerelease::new(pre)?,
            None => Prerelease::EMPTY,
        };
        let build = match build {
            Some("") => {
                return Err(ReleaseError::format(format!(
                    "Empty build metadata after '+' in '{}'",
                    text
                )))
            }
            Some(build) => BuildMetadata::new(build)?,
            None => BuildMetadata::EMPTY,
        };

        Ok(Version {
            major,
            minor,
            patch,
            pre,
            build,
        })
    }

    /// Compare by semantic version precedence, ignoring build metadata
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| self.pre.cmp(&other.pre))
    }

    /// The `major.minor.patch` part alone
    pub fn base(&self) -> Self {
        Version::new(self.major, self.minor, self.patch)
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Bump the base version; any pre-release or build metadata is dropped.
    /// Fails when the bumped segment is already `u64::MAX`.
    pub fn bump(&self, change: ChangeType) -> Result<Self> {
        let overflow = || {
            ReleaseError::format(format!(
                "Cannot bump {} of '{}': segment overflow",
                change, self
            ))
        };
        Ok(match change {
            ChangeType::Major => {
                Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            ChangeType::Minor => {
                Version::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            ChangeType::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }

    /// Bump by a textual change type (`"major"`, `"minor"` or `"patch"`)
    pub fn bump_by(&self, kind: &str) -> Result<Self> {
        self.bump(kind.parse()?)
    }

    /// Copy of this version with the given pre-release (empty clears it)
    pub fn with_prerelease(&self, pre: &str) -> Result<Self> {
        Ok(Version {
            pre: Prerelease::new(pre)?,
            ..self.clone()
        })
    }

    /// Copy of this version with the given build metadata (empty clears it)
    pub fn with_build_metadata(&self, build: &str) -> Result<Self> {
        Ok(Version {
            build: BuildMetadata::new(build)?,
            ..self.clone()
        })
    }
}

/// Compare two versions by precedence; build metadata never participates
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp_precedence(b)
}

fn parse_numeric(segment: &str, name: &str, text: &str) -> Result<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReleaseError::format(format!(
            "Invalid {} version '{}' in '{}'",
            name, segment, text
        )));
    }

    if segment.len() > 1 && segment.starts_with('0') {
        return Err(ReleaseError::format(format!(
            "Leading zero in {} version '{}' in '{}'",
            name, segment, text
        )));
    }

    segment.parse::<u64>().map_err(|_| {
        ReleaseError::format(format!(
            "{} version '{}' out of range in '{}'",
            name, segment, text
        ))
    })
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_precedence(other)
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Version::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&semver::Version> for Version {
    type Error = ReleaseError;

    fn try_from(version: &semver::Version) -> Result<Self> {
        Version::parse(&version.to_string())
    }
}

impl TryFrom<&Version> for semver::Version {
    type Error = ReleaseError;

    fn try_from(version: &Version) -> Result<Self> {
        semver::Version::parse(&version.to_string())
            .map_err(|e| ReleaseError::format(format!("'{}': {}", version, e)))
    }
}

/// Kind of change a release carries, ordered `Patch < Minor < Major`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Patch,
    Minor,
    Major,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Patch => "patch",
            ChangeType::Minor => "minor",
            ChangeType::Major => "major",
        }
    }
}

impl FromStr for ChangeType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "major" => Ok(ChangeType::Major),
            "minor" => Ok(ChangeType::Minor),
            "patch" => Ok(ChangeType::Patch),
            _ => Err(ReleaseError::invalid_change_type(s)),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_version_parse() {
        let version = v("v1.2.3");
        assert_eq!(version.major, 1);
        assert_eq!(version.minor, 2);
        assert_eq!(version.patch, 3);
        assert!(version.pre.is_empty());
        assert!(version.build.is_empty());
    }

    #[test]
    fn test_version_parse_full() {
        let version = v("1.0.0-rc.1+build.5");
        assert_eq!(version.pre.to_string(), "rc.1");
        assert_eq!(version.build.as_str(), "build.5");
    }

    #[test]
    fn test_version_parse_hyphen_inside_prerelease() {
        // Only the first '-' separates the core from the pre-release
        let version = v("1.2.3-pre-release.1");
        assert_eq!(version.pre.to_string(), "pre-release.1");
    }

    #[test]
    fn test_version_parse_build_with_hyphen() {
        let version = v("1.2.3+sha-abc");
        assert!(version.pre.is_empty());
        assert_eq!(version.build.as_str(), "sha-abc");
    }

    #[test]
    fn test_version_parse_invalid() {
        for bad in [
            "", "1.2", "1.2.3.4", "01.2.3", "1.02.3", "1.2.03", "a.b.c", "1..3", "v", "1.2.3-",
            "1.2.3+", "1.2.3-01", "V1.2.3", " 1.2.3", "1.2.-3",
        ] {
            let err = Version::parse(bad).unwrap_err();
            assert!(
                matches!(err, ReleaseError::Format(_)),
                "'{}' should be a format error, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_version_parse_zero_segments() {
        assert_eq!(v("0.0.0"), Version::new(0, 0, 0));
        assert_eq!(v("1.0.0-0"), Version::new(1, 0, 0).with_prerelease("0").unwrap());
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(v("v1.2.3-beta.4+exp.sha").to_string(), "1.2.3-beta.4+exp.sha");
    }

    #[test]
    fn test_compare_release_after_prerelease() {
        assert_eq!(compare(&v("1.0.0-rc.1"), &v("1.0.0")), Ordering::Less);
        assert_eq!(compare(&v("1.0.0"), &v("1.0.0-rc.1")), Ordering::Greater);
    }

    #[test]
    fn test_compare_core_first() {
        assert_eq!(compare(&v("1.10.0"), &v("1.9.9")), Ordering::Greater);
        assert_eq!(compare(&v("2.0.0-alpha"), &v("1.99.99")), Ordering::Greater);
    }

    #[test]
    fn test_compare_ignores_build_metadata() {
        assert_eq!(compare(&v("1.0.0+a"), &v("1.0.0+b")), Ordering::Equal);
        assert_ne!(v("1.0.0+a"), v("1.0.0+b"));
        assert!(v("1.0.0+a") < v("1.0.0+b"));
    }

    #[test]
    fn test_version_bump_major() {
        assert_eq!(v("1.2.3").bump(ChangeType::Major).unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn test_version_bump_minor() {
        assert_eq!(v("1.2.3").bump(ChangeType::Minor).unwrap(), Version::new(1, 3, 0));
    }

    #[test]
    fn test_version_bump_patch() {
        assert_eq!(v("1.2.3").bump(ChangeType::Patch).unwrap(), Version::new(1, 2, 4));
    }

    #[test]
    fn test_version_bump_drops_prerelease_and_build() {
        assert_eq!(v("1.2.3-beta.4+b.1").bump(ChangeType::Patch).unwrap(), v("1.2.4"));
        assert_eq!(v("1.2.3-beta.4").bump(ChangeType::Major).unwrap(), v("2.0.0"));
    }

    #[test]
    fn test_version_bump_by_text() {
        assert_eq!(v("0.1.0").bump_by("minor").unwrap(), v("0.2.0"));
        assert_eq!(v("0.1.0").bump_by("MAJOR").unwrap(), v("1.0.0"));
        assert!(matches!(
            v("0.1.0").bump_by("prerelease"),
            Err(ReleaseError::InvalidChangeType(kind)) if kind == "prerelease"
        ));
    }

    #[test]
    fn test_version_bump_overflow_is_error() {
        let max = u64::MAX;
        for (text, change) in [
            (format!("{}.0.0", max), ChangeType::Major),
            (format!("1.{}.0", max), ChangeType::Minor),
            (format!("1.2.{}", max), ChangeType::Patch),
        ] {
            let err = v(&text).bump(change).unwrap_err();
            assert!(matches!(err, ReleaseError::Format(_)));
            assert!(err.to_string().contains("overflow"));
        }

        // Only the bumped segment matters
        assert_eq!(
            v(&format!("1.2.{}", max)).bump(ChangeType::Minor).unwrap(),
            Version::new(1, 3, 0)
        );
    }

    #[test]
    fn test_with_prerelease_and_build() {
        let base = Version::new(1, 0, 0);
        let pre = base.with_prerelease("alpha.1").unwrap();
        assert_eq!(pre.to_string(), "1.0.0-alpha.1");
        assert_eq!(base.to_string(), "1.0.0");

        let built = pre.with_build_metadata("ci.42").unwrap();
        assert_eq!(built.to_string(), "1.0.0-alpha.1+ci.42");
        assert_eq!(built.with_prerelease("").unwrap().to_string(), "1.0.0+ci.42");
    }

    #[test]
    fn test_with_helpers_validate() {
        let base = Version::new(1, 0, 0);
        assert!(base.with_prerelease("alpha..1").is_err());
        assert!(base.with_prerelease("beta.01").is_err());
        assert!(base.with_build_metadata("a+b").is_err());
    }

    #[test]
    fn test_base_and_is_prerelease() {
        let version = v("3.1.4-rc.1+x");
        assert!(version.is_prerelease());
        assert_eq!(version.base(), Version::new(3, 1, 4));
        assert!(!version.base().is_prerelease());
    }

    #[test]
    fn test_serde_as_string() {
        let version = v("1.2.3-rc.1");
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"1.2.3-rc.1\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);
        assert!(serde_json::from_str::<Version>("\"1.2\"").is_err());
    }

    #[test]
    fn test_semver_interop() {
        let ours = v("1.2.3-beta.2+sha.1");
        let theirs = semver::Version::try_from(&ours).unwrap();
        assert_eq!(theirs.to_string(), "1.2.3-beta.2+sha.1");
        assert_eq!(Version::try_from(&theirs).unwrap(), ours);
    }

    #[test]
    fn test_change_type_order_and_display() {
        assert!(ChangeType::Patch < ChangeType::Minor);
        assert!(ChangeType::Minor < ChangeType::Major);
        assert_eq!(ChangeType::Minor.to_string(), "minor");
        assert_eq!(
            serde_json::to_string(&ChangeType::Major).unwrap(),
            "\"major\""
        );
    }
}
