//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! Operator inputs and the wire payloads they produce.

use std::str::FromStr;

use gardu_common::time::Clock;
use indexmap::IndexMap;
use strum::{AsRefStr, Display, EnumString, IntoEnumIterator};

use crate::errors::{GarduError, Result};
use crate::record::{CellValue, Record, WireFields};
use crate::schema::{
    current_field, derive_load_percent, LoadStatus, MeasurementLine, Phase, Schema,
    ADDRESS_FIELD, CAPACITY_FIELD, CONSTRUCTION_FIELD, FEEDER_FIELD, LOAD_PERCENT_FIELD,
    LOAD_VA_FIELD, MEASURED_DATE_FIELD, MEASURED_TIME_FIELD, STATUS_FIELD, USAGE_FIELD,
    VOLTAGE_FIELDS,
};

/// Usage category of a gardu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
pub enum Usage {
    #[default]
    Umum,
    Khusus,
}

/// R/S/T/N current readings of one measurement line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseReadings {
    pub r: f64,
    pub s: f64,
    pub t: f64,
    pub n: f64,
}

impl PhaseReadings {
    pub fn new(r: f64, s: f64, t: f64, n: f64) -> Self {
        Self { r, s, t, n }
    }

    pub fn from_record(record: &Record, line: MeasurementLine) -> Self {
        let read = |phase| record.number(&current_field(phase, line));
        Self::new(read(Phase::R), read(Phase::S), read(Phase::T), read(Phase::N))
    }

    pub fn get(&self, phase: Phase) -> f64 {
        match phase {
            Phase::R => self.r,
            Phase::S => self.s,
            Phase::T => self.t,
            Phase::N => self.n,
        }
    }

    fn write(&self, line: MeasurementLine, payload: &mut Payload<'_>) -> Result<()> {
        for phase in Phase::iter() {
            payload.number(&current_field(phase, line), self.get(phase))?;
        }
        Ok(())
    }
}

impl FromStr for PhaseReadings {
    type Err = GarduError;

    /// Parse `R,S,T,N`.
    fn from_str(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let invalid = || GarduError::Validation {
            field: format!("phase readings '{raw}'"),
        };
        if parts.len() != 4 {
            return Err(invalid());
        }
        let mut values = [0.0; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse::<f64>().map_err(|_| invalid())?;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

fn all_lines(record: Option<&Record>) -> IndexMap<MeasurementLine, PhaseReadings> {
    MeasurementLine::iter()
        .map(|line| {
            let readings = record
                .map(|record| PhaseReadings::from_record(record, line))
                .unwrap_or_default();
            (line, readings)
        })
        .collect()
}

/// Outgoing row, encoded cell by cell through the schema.
struct Payload<'a> {
    schema: &'a Schema,
    fields: WireFields,
}

impl<'a> Payload<'a> {
    fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            fields: WireFields::new(),
        }
    }

    /// Numeric inputs must be finite and non-negative.
    fn number(&mut self, field: &str, value: f64) -> Result<()> {
        if !(value.is_finite() && value >= 0.0) {
            return Err(GarduError::Validation {
                field: field.to_owned(),
            });
        }
        self.cell(field, CellValue::Number(value));
        Ok(())
    }

    fn text(&mut self, field: &str, value: impl AsRef<str>) {
        self.cell(field, CellValue::from(value.as_ref()));
    }

    fn cell(&mut self, field: &str, value: CellValue) {
        let encoded = self.schema.encode(field, &value);
        self.fields.insert(field.to_owned(), encoded);
    }

    fn stamp(&mut self, clock: &dyn Clock) {
        let (date, time) = clock.measurement_stamp();
        self.text(MEASURED_DATE_FIELD, date);
        self.text(MEASURED_TIME_FIELD, time);
    }

    fn finish(self) -> WireFields {
        self.fields
    }
}

/// Edit of an existing gardu's measurements. Unset inputs keep the record's values.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    capacity_kva: f64,
    pub load_va: f64,
    /// Status picked by the operator. `None` leaves the stored status untouched,
    /// including labels outside [`LoadStatus::FORM_OPTIONS`].
    pub status: Option<LoadStatus>,
    lines: IndexMap<MeasurementLine, PhaseReadings>,
}

impl EditForm {
    pub fn from_record(record: &Record) -> Self {
        Self {
            capacity_kva: record.number(CAPACITY_FIELD),
            load_va: record.number(LOAD_VA_FIELD),
            status: None,
            lines: all_lines(Some(record)),
        }
    }

    pub fn line(&self, line: MeasurementLine) -> PhaseReadings {
        self.lines.get(&line).copied().unwrap_or_default()
    }

    pub fn set_line(&mut self, line: MeasurementLine, readings: PhaseReadings) {
        self.lines.insert(line, readings);
    }

    /// Load percentage implied by the edited load and the record's capacity.
    pub fn load_percent(&self) -> f64 {
        derive_load_percent(self.load_va, self.capacity_kva)
    }

    /// Update payload, stamped with the clock's current measurement date and time.
    /// `STATUS` is only sent when the operator picked one.
    pub fn to_fields(&self, schema: &Schema, clock: &dyn Clock) -> Result<WireFields> {
        let mut payload = Payload::new(schema);
        payload.number(LOAD_VA_FIELD, self.load_va)?;
        payload.number(LOAD_PERCENT_FIELD, self.load_percent())?;
        if let Some(status) = self.status {
            payload.text(STATUS_FIELD, status);
        }
        payload.stamp(clock);
        for (line, readings) in &self.lines {
            readings.write(*line, &mut payload)?;
        }
        Ok(payload.finish())
    }
}

/// Inputs for a brand-new gardu.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGarduForm {
    pub penyulang: String,
    pub nama_gardu: String,
    pub capacity_kva: f64,
    pub construction: String,
    pub address: String,
    pub usage: Usage,
    pub load_va: f64,
    pub status: LoadStatus,
    lines: IndexMap<MeasurementLine, PhaseReadings>,
    pub voltages: [f64; 3],
}

impl NewGarduForm {
    pub fn new(penyulang: impl Into<String>, nama_gardu: impl Into<String>) -> Self {
        Self {
            penyulang: penyulang.into(),
            nama_gardu: nama_gardu.into(),
            capacity_kva: 0.0,
            construction: String::new(),
            address: String::new(),
            usage: Usage::default(),
            load_va: 0.0,
            status: LoadStatus::Normal,
            lines: all_lines(None),
            voltages: [0.0; 3],
        }
    }

    pub fn set_line(&mut self, line: MeasurementLine, readings: PhaseReadings) {
        self.lines.insert(line, readings);
    }

    /// Append payload with the gardu name stored under the schema's key field. Blank
    /// identity fields are passed through so the creator can reject them.
    pub fn to_fields(&self, schema: &Schema, clock: &dyn Clock) -> Result<WireFields> {
        let mut payload = Payload::new(schema);
        payload.text(FEEDER_FIELD, self.penyulang.trim());
        payload.text(schema.key_field(), self.nama_gardu.trim());
        payload.number(CAPACITY_FIELD, self.capacity_kva)?;
        payload.text(CONSTRUCTION_FIELD, &self.construction);
        payload.text(ADDRESS_FIELD, &self.address);
        payload.text(USAGE_FIELD, self.usage);
        payload.number(LOAD_VA_FIELD, self.load_va)?;
        payload.text(STATUS_FIELD, self.status);
        payload.stamp(clock);
        for (line, readings) in &self.lines {
            readings.write(*line, &mut payload)?;
        }
        for (name, value) in VOLTAGE_FIELDS.iter().zip(self.voltages) {
            payload.number(name, value)?;
        }
        Ok(payload.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardu_common::time::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::at_local("2025-07-01 14:05:09", "+07:00").unwrap()
    }

    fn record() -> Record {
        let wire: WireFields = [
            ("NAMA GARDU", "BL-001"),
            ("KAPASITAS", "100"),
            ("BEBAN (VA)", "50000"),
            ("STATUS", "UNDERLOAD"),
            ("R Line B", "7"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Record::from_wire(&Schema::gardu(), &wire)
    }

    #[test]
    fn edit_defaults_come_from_the_record() {
        let form = EditForm::from_record(&record());
        assert_eq!(form.load_va, 50000.0);
        assert_eq!(form.status, None);
        assert_eq!(form.line(MeasurementLine::LineB).r, 7.0);
        assert_eq!(form.line(MeasurementLine::LineD), PhaseReadings::default());
    }

    #[test]
    fn edit_payload_derives_percent_and_stamps() {
        let mut form = EditForm::from_record(&record());
        form.load_va = 85_260.0;
        form.set_line(MeasurementLine::Utama, PhaseReadings::new(10.0, 11.0, 12.0, 1.0));

        let fields = form.to_fields(&Schema::gardu(), &clock()).unwrap();
        assert_eq!(fields["BEBAN (VA)"], "85260");
        assert_eq!(fields["BEBAN %"], "85.3");
        assert_eq!(fields["TANGGAL UKUR"], "07/01/2025");
        assert_eq!(fields["JAM UKUR"], "14:05:09");
        assert_eq!(fields["R Utama"], "10");
        assert_eq!(fields["R Line B"], "7");
        assert_eq!(fields.len(), 4 + 20);
        assert!(!fields.contains_key("V R-N"));
        assert!(!fields.contains_key("STATUS"));
    }

    #[test]
    fn picked_status_is_sent_and_percent_keeps_one_decimal() {
        let mut form = EditForm::from_record(&record());
        form.load_va = 85_000.0;
        form.status = Some(LoadStatus::CriticalLoad);

        let fields = form.to_fields(&Schema::gardu(), &clock()).unwrap();
        assert_eq!(fields["STATUS"], "CRITICAL LOAD");
        assert_eq!(fields["BEBAN %"], "85.0");
    }

    #[test]
    fn negative_readings_are_rejected() {
        let mut form = EditForm::from_record(&record());
        form.set_line(MeasurementLine::LineC, PhaseReadings::new(1.0, -2.0, 0.0, 0.0));
        let err = form.to_fields(&Schema::gardu(), &clock()).unwrap_err();
        assert!(matches!(err, GarduError::Validation { ref field } if field == "S Line C"));
    }

    #[test]
    fn readings_parse_from_comma_list() {
        let parsed: PhaseReadings = "1, 2.5,3,0".parse().unwrap();
        assert_eq!(parsed, PhaseReadings::new(1.0, 2.5, 3.0, 0.0));
        assert!("1,2,3".parse::<PhaseReadings>().is_err());
        assert!("1,2,x,4".parse::<PhaseReadings>().is_err());
    }

    #[test]
    fn create_payload_carries_metadata_and_voltages() {
        let mut form = NewGarduForm::new(" BLIMBING ", "BL-010");
        form.capacity_kva = 160.0;
        form.usage = Usage::Khusus;
        form.voltages = [231.0, 229.5, 230.0];

        let fields = form.to_fields(&Schema::gardu(), &clock()).unwrap();
        assert_eq!(fields["NAMA GARDU"], "BL-010");
        assert_eq!(fields["PENYULANG"], "BLIMBING");
        assert_eq!(fields["PERUNTUKAN"], "Khusus");
        assert_eq!(fields["V S-N"], "229.5");
        assert_eq!(fields["STATUS"], "NORMAL");
        assert!(!fields.contains_key("BEBAN %"));
        assert_eq!(fields.len(), 10 + 20 + 3);
    }
}
