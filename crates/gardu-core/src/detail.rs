//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::record::{CellValue, Record};
use crate::schema::{
    current_field, MeasurementLine, Phase, ADDRESS_FIELD, CAPACITY_FIELD, CONSTRUCTION_FIELD,
    FEEDER_FIELD, LOAD_PERCENT_FIELD, LOAD_VA_FIELD, MEASURED_DATE_FIELD, MEASURED_TIME_FIELD,
    STATUS_FIELD, VOLTAGE_FIELDS,
};

/// Shown in place of a load percentage the sheet does not hold.
pub const NOT_AVAILABLE: &str = "Data tidak tersedia";

/// Titled list of readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingColumn {
    pub title: String,
    pub readings: Vec<(String, f64)>,
}

/// Two reading columns rendered side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalPanel {
    pub title: &'static str,
    pub left: ReadingColumn,
    pub right: ReadingColumn,
}

/// Everything the detail view shows for one gardu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GarduDetail {
    pub heading: String,
    pub info: Vec<(&'static str, String)>,
    pub panels: Vec<TechnicalPanel>,
}

impl GarduDetail {
    pub fn from_record(record: &Record, key_field: &str) -> Self {
        let text = |field: &str| record.text(field).unwrap_or_default();
        let load_percent = match record.get(LOAD_PERCENT_FIELD).and_then(CellValue::as_f64) {
            Some(value) => format!("{value:.2} %"),
            None => NOT_AVAILABLE.to_owned(),
        };
        let info = vec![
            ("Penyulang", text(FEEDER_FIELD)),
            ("Nama Gardu", text(key_field)),
            ("Kapasitas (kVA)", record.number(CAPACITY_FIELD).to_string()),
            ("Beban (VA)", record.number(LOAD_VA_FIELD).to_string()),
            ("Beban (%)", load_percent),
            ("Status Beban", text(STATUS_FIELD)),
            ("Tanggal Ukur Terakhir", text(MEASURED_DATE_FIELD)),
            ("Jam Ukur Terakhir", text(MEASURED_TIME_FIELD)),
            ("Alamat", text(ADDRESS_FIELD)),
            ("Konstruksi", text(CONSTRUCTION_FIELD)),
        ];

        let voltages = ReadingColumn {
            title: "Tegangan (V)".to_owned(),
            readings: VOLTAGE_FIELDS
                .iter()
                .map(|field| (voltage_label(field), record.number(field)))
                .collect(),
        };
        let panels = vec![
            TechnicalPanel {
                title: "Utama & Tegangan",
                left: line_column(record, MeasurementLine::Utama),
                right: voltages,
            },
            TechnicalPanel {
                title: "Line A-C",
                left: line_column(record, MeasurementLine::LineA),
                right: line_column(record, MeasurementLine::LineC),
            },
            TechnicalPanel {
                title: "Line B-D",
                left: line_column(record, MeasurementLine::LineB),
                right: line_column(record, MeasurementLine::LineD),
            },
        ];

        Self {
            heading: format!("{} - {}", text(FEEDER_FIELD), text(key_field)),
            info,
            panels,
        }
    }
}

fn line_column(record: &Record, line: MeasurementLine) -> ReadingColumn {
    ReadingColumn {
        title: format!("Arus {line}"),
        readings: Phase::iter()
            .map(|phase| (phase.to_string(), record.number(&current_field(phase, line))))
            .collect(),
    }
}

/// `V R-N` is shown as `R - N`.
fn voltage_label(field: &str) -> String {
    field
        .split_once(' ')
        .map(|(_, pair)| pair.replace('-', " - "))
        .unwrap_or_else(|| field.to_owned())
}
