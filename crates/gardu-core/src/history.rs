//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::cmp::Ordering;

use gardu_common::time::parse_audit_timestamp;

use crate::audit::AuditEntry;
use crate::record::Table;

/// Newest `limit` history entries, newest first.
///
/// Rows whose timestamp does not parse sort after every dated row and keep their
/// sheet order among themselves.
pub fn recent_history(table: &Table, limit: usize) -> Vec<AuditEntry> {
    let mut dated: Vec<_> = table
        .records()
        .iter()
        .map(AuditEntry::from_record)
        .map(|entry| (parse_audit_timestamp(&entry.timestamp), entry))
        .collect();
    dated.sort_by(|(left, _), (right, _)| match (left, right) {
        (Some(left), Some(right)) => right.cmp(left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    dated
        .into_iter()
        .take(limit)
        .map(|(_, entry)| entry)
        .collect()
}
