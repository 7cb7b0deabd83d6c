//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};

use crate::schema::{
    LoadStatus, Schema, FEEDER_FIELD, LOAD_PERCENT_FIELD, STATUS_FIELD,
};

/// Wire representation of a row: column name to string value, in column order.
pub type WireFields = IndexMap<String, String>;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Numeric view of the cell. Text cells are parsed; empty cells have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => text.trim().parse::<f64>().ok(),
            CellValue::Empty => None,
        }
    }

    /// String form sent to and compared against the remote sheet.
    pub fn to_wire(&self) -> String {
        match self {
            CellValue::Number(value) => value.to_string(),
            CellValue::Text(text) => text.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Latest telemetry snapshot of one gardu.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    cells: IndexMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a wire row with the given schema.
    pub fn from_wire(schema: &Schema, fields: &WireFields) -> Self {
        let cells = fields
            .iter()
            .map(|(name, value)| {
                let raw = serde_json::Value::String(value.clone());
                (name.clone(), schema.decode(name, &raw))
            })
            .collect();
        Self { cells }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.cells.get(field)
    }

    /// Text view of a cell; `None` when missing or empty.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.cells.get(field)? {
            CellValue::Empty => None,
            other => Some(other.to_wire()),
        }
    }

    /// Numeric view of a cell, `0` when missing or unparseable.
    pub fn number(&self, field: &str) -> f64 {
        self.cells
            .get(field)
            .and_then(CellValue::as_f64)
            .unwrap_or(0.0)
    }

    pub fn status(&self) -> Option<LoadStatus> {
        self.text(STATUS_FIELD)
            .and_then(|raw| LoadStatus::from_str(raw.trim()).ok())
    }

    pub fn load_percent(&self) -> f64 {
        self.number(LOAD_PERCENT_FIELD)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Encode every cell for the wire.
    pub fn to_wire(&self) -> WireFields {
        self.cells
            .iter()
            .map(|(name, value)| (name.clone(), value.to_wire()))
            .collect()
    }

    /// Overlay `fields` (decoded with `schema`) on this record.
    pub fn merge_wire(&mut self, schema: &Schema, fields: &WireFields) {
        for (name, value) in fields {
            let raw = serde_json::Value::String(value.clone());
            self.cells.insert(name.clone(), schema.decode(name, &raw));
        }
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// In-memory copy of a remote table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }

    /// First record whose `key_field` equals `key`.
    pub fn find(&self, key_field: &str, key: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.text(key_field).as_deref() == Some(key))
    }

    /// Unique `"<PENYULANG> - <key>"` labels in first-seen order.
    pub fn selection_options(&self, key_field: &str) -> Vec<String> {
        let options: IndexSet<String> = self
            .records
            .iter()
            .map(|record| selection_label(record, key_field))
            .collect();
        options.into_iter().collect()
    }

    /// Record addressed by a selection label.
    pub fn find_by_option(&self, key_field: &str, option: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| selection_label(record, key_field) == option)
    }
}

fn selection_label(record: &Record, key_field: &str) -> String {
    format!(
        "{} - {}",
        record.text(FEEDER_FIELD).unwrap_or_default(),
        record.text(key_field).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{KEY_FIELD, LOAD_VA_FIELD};

    fn sample_table() -> Table {
        let a = Record::new()
            .with(FEEDER_FIELD, "KARANGLO")
            .with(KEY_FIELD, "BL-001")
            .with(LOAD_VA_FIELD, 1000.0);
        let b = Record::new()
            .with(FEEDER_FIELD, "KARANGLO")
            .with(KEY_FIELD, "BL-002");
        let dup = a.clone();
        Table::new(
            vec![FEEDER_FIELD.into(), KEY_FIELD.into(), LOAD_VA_FIELD.into()],
            vec![a, b, dup],
        )
    }

    #[test]
    fn selection_options_are_unique_and_ordered() {
        let table = sample_table();
        assert_eq!(
            table.selection_options(KEY_FIELD),
            vec!["KARANGLO - BL-001".to_string(), "KARANGLO - BL-002".to_string()]
        );
        let record = table.find_by_option(KEY_FIELD, "KARANGLO - BL-002").unwrap();
        assert_eq!(record.text(KEY_FIELD).as_deref(), Some("BL-002"));
    }

    #[test]
    fn numeric_views_default_to_zero() {
        let table = sample_table();
        let record = table.find(KEY_FIELD, "BL-002").unwrap();
        assert_eq!(record.number(LOAD_VA_FIELD), 0.0);
        assert_eq!(record.status(), None);
    }

    #[test]
    fn wire_round_trip_uses_schema_kinds() {
        let schema = Schema::gardu();
        let mut wire = WireFields::new();
        wire.insert(LOAD_VA_FIELD.into(), "1500.0".into());
        wire.insert(STATUS_FIELD.into(), "OVERLOAD".into());
        let mut record = Record::from_wire(&schema, &wire);
        assert_eq!(record.get(LOAD_VA_FIELD), Some(&CellValue::Number(1500.0)));
        assert_eq!(record.status(), Some(LoadStatus::Overload));

        let mut patch = WireFields::new();
        patch.insert(LOAD_VA_FIELD.into(), "oops".into());
        record.merge_wire(&schema, &patch);
        assert_eq!(record.number(LOAD_VA_FIELD), 0.0);
        assert_eq!(record.to_wire()[LOAD_VA_FIELD], "0");
    }
}
