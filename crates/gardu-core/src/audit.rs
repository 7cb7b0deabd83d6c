//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! Field-level change detection between a record snapshot and an edit.
//!
//! Numeric columns are compared as floats, so `"5"` and `"5.0"` are the same
//! value. When either side does not parse as a number the comparison falls back to
//! string equality, so cosmetic differences such as `"n/a"` against `"N/A"` are
//! reported as changes. Numeric cells loaded through the loader are already
//! coerced, which means the fallback mostly applies to hand-built records.

use serde::{Deserialize, Serialize};

use crate::record::{CellValue, Record, WireFields};
use crate::schema::{FieldKind, Schema};

/// Column labels of the deployed history sheet.
pub const HISTORY_TIMESTAMP: &str = "Timestamp";
pub const HISTORY_KEY: &str = "Nama Gardu";
pub const HISTORY_FIELD: &str = "Data yang Diubah";
pub const HISTORY_OLD_VALUE: &str = "Nilai Lama";
pub const HISTORY_NEW_VALUE: &str = "Nilai Baru";

/// One changed field, before it is stamped for the history sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Row of the history sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Nama Gardu")]
    pub gardu: String,
    #[serde(rename = "Data yang Diubah")]
    pub field: String,
    #[serde(rename = "Nilai Lama")]
    pub old_value: String,
    #[serde(rename = "Nilai Baru")]
    pub new_value: String,
}

impl AuditEntry {
    pub fn from_change(change: FieldChange, gardu: &str, timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_owned(),
            gardu: gardu.to_owned(),
            field: change.field,
            old_value: change.old_value,
            new_value: change.new_value,
        }
    }

    /// Read an entry back from a loaded history row; absent columns become empty.
    pub fn from_record(record: &Record) -> Self {
        let column = |name: &str| record.text(name).unwrap_or_default();
        Self {
            timestamp: column(HISTORY_TIMESTAMP),
            gardu: column(HISTORY_KEY),
            field: column(HISTORY_FIELD),
            old_value: column(HISTORY_OLD_VALUE),
            new_value: column(HISTORY_NEW_VALUE),
        }
    }
}

/// Fields of `proposed` whose value differs from `old`, in `proposed` order.
///
/// Measurement timestamp columns are never reported. A field absent from `old`
/// is compared against the empty string.
pub fn detect_changes(schema: &Schema, old: &Record, proposed: &WireFields) -> Vec<FieldChange> {
    proposed
        .iter()
        .filter_map(|(field, new_value)| {
            let kind = schema.kind(field);
            if !kind.is_audited() {
                return None;
            }
            let old_cell = old.get(field);
            if !differs(kind, old_cell, new_value) {
                return None;
            }
            Some(FieldChange {
                field: field.clone(),
                old_value: old_cell.map(CellValue::to_wire).unwrap_or_default(),
                new_value: new_value.clone(),
            })
        })
        .collect()
}

/// Stamp detected changes for the history sheet.
pub fn audit_entries(changes: Vec<FieldChange>, gardu: &str, timestamp: &str) -> Vec<AuditEntry> {
    changes
        .into_iter()
        .map(|change| AuditEntry::from_change(change, gardu, timestamp))
        .collect()
}

fn differs(kind: FieldKind, old: Option<&CellValue>, new_value: &str) -> bool {
    let old_text = old.map(CellValue::to_wire).unwrap_or_default();
    if kind == FieldKind::Numeric {
        let old_number = old.and_then(CellValue::as_f64);
        let new_number = new_value.trim().parse::<f64>().ok();
        if let (Some(before), Some(after)) = (old_number, new_number) {
            return before != after;
        }
    }
    old_text != new_value
}
