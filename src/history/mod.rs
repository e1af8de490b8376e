//! Append-only release ledger
//!
//! The ledger is a JSON array of [`HistoryEntry`] values. Appends run under an
//! exclusive lock on `<path>.lock` and replace the file atomically; entries
//! already in the file are carried over byte-for-byte and never reordered.

pub mod query;

use crate::domain::{ChangeType, Version};
use crate::error::{ReleaseError, Result};
use crate::fsutil::write_atomic;
use crate::lock::FileLock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

pub use query::{
    filter_by_package, filter_by_version, filter_consignments_by_metadata, sort_by_timestamp,
    SortOrder,
};

/// A discrete recorded change contributing to a release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consignment {
    pub id: String,
    pub summary: String,
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Consignment {
    pub fn new(id: impl Into<String>, summary: impl Into<String>, change_type: ChangeType) -> Self {
        Consignment {
            id: id.into(),
            summary: summary.into(),
            change_type,
            metadata: Map::new(),
        }
    }

    /// Attach a metadata value, replacing any previous value for `key`
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One shipped release of one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub version: Version,
    pub package: String,
    pub tag: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub consignments: Vec<Consignment>,
}

impl HistoryEntry {
    /// Entry stamped with the current time
    pub fn new(
        package: impl Into<String>,
        version: Version,
        tag: impl Into<String>,
        consignments: Vec<Consignment>,
    ) -> Self {
        HistoryEntry {
            version,
            package: package.into(),
            tag: tag.into(),
            timestamp: Utc::now(),
            consignments,
        }
    }

    /// Highest change type among the consignments, if any
    pub fn change_type(&self) -> Option<ChangeType> {
        self.consignments.iter().map(|c| c.change_type).max()
    }
}

/// Create the ledger as an empty array unless it already exists.
///
/// Returns whether a new ledger was created.
pub fn init_history(path: &Path) -> Result<bool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReleaseError::io(parent, e))?;
    }

    let lock = FileLock::exclusive(path)?;
    if path.exists() {
        lock.release()?;
        return Ok(false);
    }

    write_atomic(path, b"[]\n")?;
    lock.release()?;

    info!(path = %path.display(), "initialized release history");
    Ok(true)
}

/// Read every entry in storage order under a shared lock
pub fn read_history(path: &Path) -> Result<Vec<HistoryEntry>> {
    let lock = FileLock::shared(path)?;
    let content = fs::read_to_string(path).map_err(|e| ReleaseError::io(path, e))?;
    lock.release()?;

    serde_json::from_str(&content).map_err(|e| ReleaseError::data(path, e.to_string()))
}

/// Append `entries` after all existing ledger entries, preserving their order.
///
/// An empty batch is a no-op: no lock is taken and the file is not touched.
/// The ledger must already exist (see [`init_history`]); a missing file is an
/// I/O error and unparseable content a data error.
pub fn append_to_history(path: &Path, entries: &[HistoryEntry]) -> Result<()> {
    if entries.is_empty() {
        debug!(path = %path.display(), "no history entries to append");
        return Ok(());
    }

    let lock = FileLock::exclusive(path)?;

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ReleaseError::io(
                path,
                std::io::Error::new(
                    ErrorKind::NotFound,
                    "release history not initialized; create it as an empty array first",
                ),
            ))
        }
        Err(e) => return Err(ReleaseError::io(path, e)),
    };

    let mut ledger = parse_ledger(path, &content)?;
    let existing = ledger.len();

    for entry in entries {
        let raw = serde_json::value::to_raw_value(entry)
            .map_err(|e| ReleaseError::data(path, e.to_string()))?;
        ledger.push(raw);
    }

    let mut rendered = serde_json::to_string_pretty(&ledger)
        .map_err(|e| ReleaseError::data(path, e.to_string()))?;
    rendered.push('\n');

    write_atomic(path, rendered.as_bytes())?;
    lock.release()?;

    info!(
        path = %path.display(),
        existing,
        appended = entries.len(),
        "appended release history"
    );
    Ok(())
}

/// Split the ledger into raw entries, checking each is a well-formed entry
fn parse_ledger(path: &Path, content: &str) -> Result<Vec<Box<RawValue>>> {
    let ledger: Vec<Box<RawValue>> =
        serde_json::from_str(content).map_err(|e| ReleaseError::data(path, e.to_string()))?;

    for (index, raw) in ledger.iter().enumerate() {
        serde_json::from_str::<HistoryEntry>(raw.get())
            .map_err(|e| ReleaseError::data(path, format!("entry {}: {}", index, e)))?;
    }

    Ok(ledger)
}
