//! Pre-release and build metadata identifiers for semantic versions
//!
//! Pre-release precedence follows semver.org: https://semver.org/#spec-item-11
//! Build metadata is carried verbatim and never takes part in precedence.

use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9A-Za-z-]+$").expect("identifier pattern is valid"))
}

/// A single dot-separated pre-release identifier
///
/// Numeric identifiers compare as integers and always sort before
/// alphanumeric ones; alphanumeric identifiers compare by byte order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u64),
    AlphaNumeric(String),
}

impl Identifier {
    /// Parse one identifier, rejecting empty text, characters outside
    /// `[0-9A-Za-z-]` and numeric identifiers with a leading zero.
    pub fn parse(s: &str) -> Result<Self> {
        if !identifier_pattern().is_match(s) {
            return Err(ReleaseError::format(format!(
                "Invalid pre-release identifier: '{}'",
                s
            )));
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Identifier::AlphaNumeric(s.to_string()));
        }

        if s.len() > 1 && s.starts_with('0') {
            return Err(ReleaseError::format(format!(
                "Numeric pre-release identifier has a leading zero: '{}'",
                s
            )));
        }

        s.parse::<u64>().map(Identifier::Numeric).map_err(|_| {
            ReleaseError::format(format!("Numeric pre-release identifier too large: '{}'", s))
        })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Identifier::Numeric(_))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Numeric(_), Identifier::AlphaNumeric(_)) => Ordering::Less,
            (Identifier::AlphaNumeric(_), Identifier::Numeric(_)) => Ordering::Greater,
            (Identifier::AlphaNumeric(a), Identifier::AlphaNumeric(b)) => {
                a.as_bytes().cmp(b.as_bytes())
            }
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{}", n),
            Identifier::AlphaNumeric(s) => write!(f, "{}", s),
        }
    }
}

/// Pre-release part of a version, e.g. `beta.11` in `1.0.0-beta.11`
///
/// The empty pre-release denotes a normal release and orders after every
/// non-empty pre-release of the same core version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Prerelease {
    identifiers: Vec<Identifier>,
}

impl Prerelease {
    pub const EMPTY: Prerelease = Prerelease {
        identifiers: Vec::new(),
    };

    /// Parse a dot-separated pre-release string. The empty string yields
    /// [`Prerelease::EMPTY`].
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Prerelease::EMPTY);
        }

        let identifiers = s
            .split('.')
            .map(Identifier::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Prerelease { identifiers })
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }
}

impl FromStr for Prerelease {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Prerelease::new(s)
    }
}

impl Ord for Prerelease {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        for (a, b) in self.identifiers.iter().zip(other.identifiers.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }

        self.identifiers.len().cmp(&other.identifiers.len())
    }
}

impl PartialOrd for Prerelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Prerelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, identifier) in self.identifiers.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", identifier)?;
        }
        Ok(())
    }
}

/// Build metadata, e.g. `build.5` in `1.0.0+build.5`
///
/// Opaque to precedence. Each dot-separated part must be a non-empty run of
/// `[0-9A-Za-z-]` so the version string re-parses to the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BuildMetadata {
    raw: String,
}

impl BuildMetadata {
    pub const EMPTY: BuildMetadata = BuildMetadata { raw: String::new() };

    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(BuildMetadata::EMPTY);
        }

        if let Some(bad) = s.split('.').find(|part| !identifier_pattern().is_match(part)) {
            return Err(ReleaseError::format(format!(
                "Invalid build metadata identifier '{}' in '{}'",
                bad, s
            )));
        }

        Ok(BuildMetadata { raw: s.to_string() })
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for BuildMetadata {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        BuildMetadata::new(s)
    }
}

impl fmt::Display for BuildMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
