//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! Field schema of the gardu table.
//!
//! The remote sheet only speaks strings and loosely typed JSON. Every column the
//! dashboard understands is declared here with its semantic kind, and the same
//! declaration drives decoding in the loader and encoding of outgoing payloads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::record::CellValue;

pub const KEY_FIELD: &str = "NAMA GARDU";
pub const FEEDER_FIELD: &str = "PENYULANG";
pub const CAPACITY_FIELD: &str = "KAPASITAS";
pub const LOAD_VA_FIELD: &str = "BEBAN (VA)";
pub const LOAD_PERCENT_FIELD: &str = "BEBAN %";
pub const STATUS_FIELD: &str = "STATUS";
pub const MEASURED_DATE_FIELD: &str = "TANGGAL UKUR";
pub const MEASURED_TIME_FIELD: &str = "JAM UKUR";
pub const ADDRESS_FIELD: &str = "ALAMAT";
pub const CONSTRUCTION_FIELD: &str = "KONSTRUKSI";
pub const USAGE_FIELD: &str = "PERUNTUKAN";
pub const VOLTAGE_FIELDS: [&str; 3] = ["V R-N", "V S-N", "V T-N"];

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Numeric measurement; coerced to zero when unparseable.
    Numeric,
    /// Free text or enumerated label.
    Text,
    /// Measurement date/time stamp, rewritten on every edit and never audited.
    MeasuredAt,
}

impl FieldKind {
    pub fn is_audited(self) -> bool {
        !matches!(self, FieldKind::MeasuredAt)
    }
}

/// Measurement branch of a gardu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, AsRefStr)]
pub enum MeasurementLine {
    #[strum(serialize = "Utama")]
    Utama,
    #[strum(serialize = "Line A")]
    LineA,
    #[strum(serialize = "Line B")]
    LineB,
    #[strum(serialize = "Line C")]
    LineC,
    #[strum(serialize = "Line D")]
    LineD,
}

/// Conductor within a measurement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, AsRefStr)]
pub enum Phase {
    R,
    S,
    T,
    N,
}

/// Column holding the current reading of `phase` on `line`, e.g. `R Line A`.
pub fn current_field(phase: Phase, line: MeasurementLine) -> String {
    format!("{} {}", phase.as_ref(), line.as_ref())
}

/// Loading status of a gardu.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum LoadStatus {
    #[strum(serialize = "NORMAL")]
    #[serde(rename = "NORMAL")]
    Normal,
    #[strum(serialize = "CRITICAL LOAD")]
    #[serde(rename = "CRITICAL LOAD")]
    CriticalLoad,
    #[strum(serialize = "OVERLOAD")]
    #[serde(rename = "OVERLOAD")]
    Overload,
    #[strum(serialize = "LIGHTLY LOAD")]
    #[serde(rename = "LIGHTLY LOAD")]
    LightlyLoad,
    #[strum(serialize = "UNDERLOAD")]
    #[serde(rename = "UNDERLOAD")]
    Underload,
}

impl LoadStatus {
    /// Statuses an operator may pick when editing or creating a record.
    pub const FORM_OPTIONS: [LoadStatus; 4] = [
        LoadStatus::Normal,
        LoadStatus::CriticalLoad,
        LoadStatus::Overload,
        LoadStatus::LightlyLoad,
    ];
}

/// Declared columns and their kinds, plus the identity key column.
#[derive(Debug, Clone)]
pub struct Schema {
    key_field: String,
    fields: IndexMap<String, FieldKind>,
    decimals: IndexMap<String, usize>,
}

impl Schema {
    /// Schema of the deployed gardu sheet.
    pub fn gardu() -> Self {
        let mut fields = IndexMap::new();
        for text in [FEEDER_FIELD, KEY_FIELD, STATUS_FIELD, ADDRESS_FIELD, CONSTRUCTION_FIELD, USAGE_FIELD] {
            fields.insert(text.to_owned(), FieldKind::Text);
        }
        for numeric in [CAPACITY_FIELD, LOAD_VA_FIELD, LOAD_PERCENT_FIELD] {
            fields.insert(numeric.to_owned(), FieldKind::Numeric);
        }
        for line in MeasurementLine::iter() {
            for phase in Phase::iter() {
                fields.insert(current_field(phase, line), FieldKind::Numeric);
            }
        }
        for voltage in VOLTAGE_FIELDS {
            fields.insert(voltage.to_owned(), FieldKind::Numeric);
        }
        fields.insert(MEASURED_DATE_FIELD.to_owned(), FieldKind::MeasuredAt);
        fields.insert(MEASURED_TIME_FIELD.to_owned(), FieldKind::MeasuredAt);
        let decimals = IndexMap::from([(LOAD_PERCENT_FIELD.to_owned(), 1)]);
        Self {
            key_field: KEY_FIELD.to_owned(),
            fields,
            decimals,
        }
    }

    /// Use a different identity column (the sheet may rename it).
    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        let key_field = key_field.into();
        self.fields.entry(key_field.clone()).or_insert(FieldKind::Text);
        self.key_field = key_field;
        self
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Kind of `field`; undeclared columns are treated as text.
    pub fn kind(&self, field: &str) -> FieldKind {
        self.fields.get(field).copied().unwrap_or(FieldKind::Text)
    }

    pub fn numeric_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, kind)| **kind == FieldKind::Numeric)
            .map(|(name, _)| name.as_str())
    }

    /// Decode one raw JSON cell according to the column kind.
    pub fn decode(&self, field: &str, raw: &Value) -> CellValue {
        match self.kind(field) {
            FieldKind::Numeric => CellValue::Number(coerce_number(raw)),
            FieldKind::Text | FieldKind::MeasuredAt => match raw {
                Value::Null => CellValue::Empty,
                Value::String(text) => CellValue::Text(text.clone()),
                other => CellValue::Text(other.to_string()),
            },
        }
    }

    /// Encode a cell of `field` for the wire. The remote sheet stores every value as
    /// a string; numeric columns with declared decimals are written at that precision.
    pub fn encode(&self, field: &str, value: &CellValue) -> String {
        match (self.kind(field), value, self.decimals.get(field)) {
            (FieldKind::Numeric, CellValue::Number(number), Some(&places)) => {
                format!("{number:.places$}")
            }
            _ => value.to_wire(),
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::gardu()
    }
}

/// Numeric coercion used by the loader: anything unparseable becomes `0`.
pub fn coerce_number(raw: &Value) -> f64 {
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    match parsed {
        Some(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

/// Load percentage of capacity: `load / (capacity_kva * 1000) * 100`, or `0` without capacity.
pub fn derive_load_percent(load_va: f64, capacity_kva: f64) -> f64 {
    let capacity_va = capacity_kva * 1000.0;
    if capacity_va > 0.0 {
        load_va / capacity_va * 100.0
    } else {
        0.0
    }
}
