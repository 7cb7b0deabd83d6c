//! ---
//! gardu_section: "05-operator-interface"
//! gardu_subsection: "binary"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Operator CLI for monitoring and editing gardu telemetry."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::str::FromStr;

use anyhow::Result;
use clap::{Args, Subcommand};
use gardu_core::forms::{EditForm, NewGarduForm, PhaseReadings, Usage};
use gardu_core::schema::{LoadStatus, MeasurementLine, FEEDER_FIELD};
use gardu_core::Dashboard;
use gardu_logging::{log_system_event, LogContext, SystemEventOutcome};
use tokio::runtime::Runtime;

use crate::render;

/// Operator views.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Network summary: counts, average load and load distribution.
    Summary,
    /// List every gardu as "PENYULANG - NAMA GARDU".
    List,
    /// Show the detail view of one gardu.
    Show {
        /// Selection label or gardu name.
        gardu: String,
    },
    /// Record new measurements for a gardu.
    Edit(EditArgs),
    /// Register a new gardu.
    Add(AddArgs),
    /// Show the most recent recorded changes.
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Readings given as `R,S,T,N` for each measurement line.
#[derive(Debug, Args)]
pub struct LineArgs {
    #[arg(long, value_name = "R,S,T,N", value_parser = parse_readings)]
    pub utama: Option<PhaseReadings>,
    #[arg(long, value_name = "R,S,T,N", value_parser = parse_readings)]
    pub line_a: Option<PhaseReadings>,
    #[arg(long, value_name = "R,S,T,N", value_parser = parse_readings)]
    pub line_b: Option<PhaseReadings>,
    #[arg(long, value_name = "R,S,T,N", value_parser = parse_readings)]
    pub line_c: Option<PhaseReadings>,
    #[arg(long, value_name = "R,S,T,N", value_parser = parse_readings)]
    pub line_d: Option<PhaseReadings>,
}

impl LineArgs {
    fn given(&self) -> impl Iterator<Item = (MeasurementLine, PhaseReadings)> + '_ {
        [
            (MeasurementLine::Utama, self.utama),
            (MeasurementLine::LineA, self.line_a),
            (MeasurementLine::LineB, self.line_b),
            (MeasurementLine::LineC, self.line_c),
            (MeasurementLine::LineD, self.line_d),
        ]
        .into_iter()
        .filter_map(|(line, readings)| readings.map(|readings| (line, readings)))
    }
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Selection label or gardu name.
    pub gardu: String,
    #[arg(long, value_name = "VA")]
    pub load_va: Option<f64>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<LoadStatus>,
    #[command(flatten)]
    pub lines: LineArgs,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub penyulang: String,
    #[arg(long = "nama")]
    pub nama_gardu: String,
    #[arg(long, value_name = "KVA", default_value_t = 0.0)]
    pub kapasitas: f64,
    #[arg(long, default_value = "")]
    pub konstruksi: String,
    #[arg(long, default_value = "")]
    pub alamat: String,
    #[arg(long, value_parser = parse_usage, default_value = "Umum")]
    pub peruntukan: Usage,
    #[arg(long, value_name = "VA", default_value_t = 0.0)]
    pub load_va: f64,
    #[arg(long, value_parser = parse_status, default_value = "NORMAL")]
    pub status: LoadStatus,
    #[command(flatten)]
    pub lines: LineArgs,
    /// Line-to-neutral voltages as `R-N,S-N,T-N`.
    #[arg(long, value_name = "R,S,T", value_parser = parse_voltages)]
    pub voltages: Option<[f64; 3]>,
}

pub fn execute(runtime: &Runtime, dashboard: &Dashboard, command: Command) -> Result<()> {
    match command {
        Command::Summary => {
            let summary = runtime.block_on(dashboard.summary())?;
            render::summary(summary.as_ref());
        }
        Command::List => {
            let options = runtime.block_on(dashboard.selection_options())?;
            render::options(&options);
        }
        Command::Show { gardu } => {
            let detail = runtime.block_on(dashboard.detail(&gardu))?;
            render::detail(&detail);
        }
        Command::Edit(args) => edit(runtime, dashboard, args)?,
        Command::Add(args) => add(runtime, dashboard, args)?,
        Command::History { limit } => {
            let entries = runtime.block_on(dashboard.history(limit))?;
            render::history(&entries);
        }
    }
    Ok(())
}

fn edit(runtime: &Runtime, dashboard: &Dashboard, args: EditArgs) -> Result<()> {
    let record = runtime.block_on(dashboard.find(&args.gardu))?;
    let key = record.text(dashboard.key_field()).unwrap_or_default();
    let penyulang = record.text(FEEDER_FIELD).unwrap_or_default();
    let ctx = LogContext::new()
        .with_gardu(&key)
        .with_penyulang(&penyulang)
        .with_operation("update");

    let mut form = EditForm::from_record(&record);
    if let Some(load_va) = args.load_va {
        form.load_va = load_va;
    }
    if let Some(status) = args.status {
        form.status = Some(status);
    }
    for (line, readings) in args.lines.given() {
        form.set_line(line, readings);
    }

    match runtime.block_on(dashboard.apply_edit(&record, &form)) {
        Ok(report) => {
            let outcome = if report.history_recorded {
                SystemEventOutcome::Success
            } else {
                SystemEventOutcome::Degraded
            };
            log_system_event(Some(&ctx), "gardu.update", "gardu updated", outcome);
            render::update(&key, &report);
            Ok(())
        }
        Err(err) => {
            log_system_event(Some(&ctx), "gardu.update", &err.to_string(), SystemEventOutcome::Fault);
            Err(err.into())
        }
    }
}

fn add(runtime: &Runtime, dashboard: &Dashboard, args: AddArgs) -> Result<()> {
    let mut form = NewGarduForm::new(args.penyulang.as_str(), args.nama_gardu.as_str());
    form.capacity_kva = args.kapasitas;
    form.construction = args.konstruksi;
    form.address = args.alamat;
    form.usage = args.peruntukan;
    form.load_va = args.load_va;
    form.status = args.status;
    for (line, readings) in args.lines.given() {
        form.set_line(line, readings);
    }
    if let Some(voltages) = args.voltages {
        form.voltages = voltages;
    }

    let ctx = LogContext::new()
        .with_gardu(&args.nama_gardu)
        .with_penyulang(&args.penyulang)
        .with_operation("create");
    match runtime.block_on(dashboard.create(&form)) {
        Ok(()) => {
            log_system_event(Some(&ctx), "gardu.create", "gardu appended", SystemEventOutcome::Success);
            render::created(form.nama_gardu.trim());
            Ok(())
        }
        Err(err) => {
            log_system_event(Some(&ctx), "gardu.create", &err.to_string(), SystemEventOutcome::Fault);
            Err(err.into())
        }
    }
}

fn parse_readings(raw: &str) -> Result<PhaseReadings, String> {
    PhaseReadings::from_str(raw).map_err(|err| err.to_string())
}

fn parse_status(raw: &str) -> Result<LoadStatus, String> {
    LoadStatus::FORM_OPTIONS
        .into_iter()
        .find(|status| status.as_ref().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| {
            let options: Vec<&str> = LoadStatus::FORM_OPTIONS.iter().map(|s| s.as_ref()).collect();
            format!("expected one of: {}", options.join(", "))
        })
}

fn parse_usage(raw: &str) -> Result<Usage, String> {
    Usage::from_str(raw.trim()).map_err(|_| "expected Umum or Khusus".to_owned())
}

fn parse_voltages(raw: &str) -> Result<[f64; 3], String> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|err| format!("invalid voltage: {err}"))?;
    <[f64; 3]>::try_from(values).map_err(|_| "expected three voltages".to_owned())
}
