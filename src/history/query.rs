//! Read-side views over ledger entries
//!
//! Every function takes a slice and returns a new vector; the input is never
//! modified, so views compose freely.

use super::HistoryEntry;
use crate::domain::Version;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first
    #[default]
    Ascending,
    /// Newest first
    Descending,
}

/// Entries released for `package`
pub fn filter_by_package(entries: &[HistoryEntry], package: &str) -> Vec<HistoryEntry> {
    entries
        .iter()
        .filter(|entry| entry.package == package)
        .cloned()
        .collect()
}

/// Entries whose version equals `version`
pub fn filter_by_version(entries: &[HistoryEntry], version: &Version) -> Vec<HistoryEntry> {
    entries
        .iter()
        .filter(|entry| &entry.version == version)
        .cloned()
        .collect()
}

/// Keep only consignments whose metadata maps `key` to `value`.
///
/// Entries left without any consignment are dropped.
pub fn filter_consignments_by_metadata(
    entries: &[HistoryEntry],
    key: &str,
    value: &Value,
) -> Vec<HistoryEntry> {
    entries
        .iter()
        .filter_map(|entry| {
            let consignments: Vec<_> = entry
                .consignments
                .iter()
                .filter(|c| c.metadata.get(key) == Some(value))
                .cloned()
                .collect();

            if consignments.is_empty() {
                None
            } else {
                Some(HistoryEntry {
                    consignments,
                    ..entry.clone()
                })
            }
        })
        .collect()
}

/// Entries ordered by timestamp; ties keep their ledger order
pub fn sort_by_timestamp(entries: &[HistoryEntry], order: SortOrder) -> Vec<HistoryEntry> {
    let mut sorted = entries.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortOrder::Descending => sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
    sorted
}
