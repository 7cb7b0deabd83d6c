//! ---
//! gardu_section: "15-testing-qa"
//! gardu_subsection: "integration-tests"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "End-to-end dashboard flows over in-memory sheet stores."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::sync::Arc;

use gardu_common::config::AppConfig;
use gardu_common::time::FixedClock;
use gardu_core::forms::{EditForm, NewGarduForm, PhaseReadings};
use gardu_core::schema::{LoadStatus, MeasurementLine};
use gardu_core::{CellValue, Dashboard, GarduError, TableStore};
use gardu_testharness::{MemoryTableStore, StoreOp};
use serde_json::{json, Map, Value};

const READINGS: [&str; 20] = [
    "R Utama", "S Utama", "T Utama", "N Utama", "R Line A", "S Line A", "T Line A", "N Line A",
    "R Line B", "S Line B", "T Line B", "N Line B", "R Line C", "S Line C", "T Line C", "N Line C",
    "R Line D", "S Line D", "T Line D", "N Line D",
];

struct Fixture {
    table: Arc<MemoryTableStore>,
    history: Arc<MemoryTableStore>,
    dashboard: Dashboard,
}

fn gardu_row(penyulang: &str, name: &str, load_va: &str, status: &str) -> Value {
    let mut row = Map::new();
    row.insert("PENYULANG".into(), json!(penyulang));
    row.insert("NAMA GARDU".into(), json!(name));
    row.insert("KAPASITAS".into(), json!("100"));
    row.insert("BEBAN (VA)".into(), json!(load_va));
    let percent = load_va.parse::<f64>().unwrap_or_default() / 1000.0;
    row.insert("BEBAN %".into(), json!(format!("{percent:.1}")));
    row.insert("STATUS".into(), json!(status));
    row.insert("TANGGAL UKUR".into(), json!("06/30/2025"));
    row.insert("JAM UKUR".into(), json!("09:00:00"));
    row.insert("ALAMAT".into(), json!("Jl. Borobudur"));
    for reading in READINGS {
        row.insert(reading.into(), json!("0"));
    }
    for voltage in ["V R-N", "V S-N", "V T-N"] {
        row.insert(voltage.into(), json!("230"));
    }
    Value::Object(row)
}

fn fixture_with(config: AppConfig, rows: Value) -> Fixture {
    let table = Arc::new(MemoryTableStore::new("memory://gardu").with_rows(rows));
    let history = Arc::new(MemoryTableStore::new("memory://history"));
    let table_store: Arc<dyn TableStore> = table.clone();
    let history_store: Arc<dyn TableStore> = history.clone();
    let clock = FixedClock::at_local("2025-07-01 08:15:00", "+07:00").unwrap();
    let dashboard =
        Dashboard::with_stores(&config, table_store, history_store, Arc::new(clock)).unwrap();
    Fixture {
        table,
        history,
        dashboard,
    }
}

fn config() -> AppConfig {
    AppConfig::with_sources("http://sheet.invalid/gardu", "http://sheet.invalid/history")
}

fn fixture() -> Fixture {
    fixture_with(
        config(),
        json!([
            gardu_row("BLIMBING", "BL-001", "1000", "NORMAL"),
            gardu_row("KARANGLO", "KR-007", "2000", "OVERLOAD"),
        ]),
    )
}

#[tokio::test]
async fn update_merges_fields_and_logs_only_real_changes() {
    let fx = fixture();
    let record = fx.dashboard.find("BL-001").await.unwrap();
    let mut form = EditForm::from_record(&record);
    form.load_va = 1500.0;

    let report = fx.dashboard.apply_edit(&record, &form).await.unwrap();
    assert!(report.history_recorded);
    let fields: Vec<_> = report.entries.iter().map(|entry| entry.field.as_str()).collect();
    assert_eq!(fields, vec!["BEBAN (VA)", "BEBAN %"]);
    assert_eq!(report.entries[0].old_value, "1000");
    assert_eq!(report.entries[0].new_value, "1500");
    assert_eq!(report.entries[1].old_value, "1");
    assert_eq!(report.entries[1].new_value, "1.5");
    assert_eq!(report.entries[0].timestamp, "2025-07-01 08:15:00");

    let reloaded = fx.dashboard.find("BLIMBING - BL-001").await.unwrap();
    assert_eq!(reloaded.number("BEBAN (VA)"), 1500.0);
    assert_eq!(reloaded.text("JAM UKUR").as_deref(), Some("08:15:00"));
    assert_eq!(reloaded.text("ALAMAT").as_deref(), Some("Jl. Borobudur"));
    assert_eq!(fx.table.count(StoreOp::Fetch), 2);

    let appended = fx.history.appended();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0][0]["Nama Gardu"], "BL-001");
    assert_eq!(appended[0][0]["Nilai Baru"], "1500");
}

#[tokio::test]
async fn load_only_edit_keeps_a_status_outside_the_form_options() {
    let fx = fixture_with(
        config(),
        json!([gardu_row("BLIMBING", "BL-009", "1000", "UNDERLOAD")]),
    );
    let record = fx.dashboard.find("BL-009").await.unwrap();
    let mut form = EditForm::from_record(&record);
    form.load_va = 1200.0;

    let report = fx.dashboard.apply_edit(&record, &form).await.unwrap();
    let row = fx.table.row_where("NAMA GARDU", "BL-009").unwrap();
    assert_eq!(row["STATUS"], "UNDERLOAD");
    assert_eq!(row["BEBAN (VA)"], "1200");
    assert!(report.entries.iter().all(|entry| entry.field != "STATUS"));

    let mut form = EditForm::from_record(&record);
    form.status = Some(LoadStatus::LightlyLoad);
    let report = fx.dashboard.apply_edit(&record, &form).await.unwrap();
    let status: Vec<_> = report
        .entries
        .iter()
        .filter(|entry| entry.field == "STATUS")
        .map(|entry| (entry.old_value.as_str(), entry.new_value.as_str()))
        .collect();
    assert_eq!(status, vec![("UNDERLOAD", "LIGHTLY LOAD")]);
}

#[tokio::test]
async fn failed_table_write_sends_no_history() {
    let fx = fixture();
    let record = fx.dashboard.find("BL-001").await.unwrap();
    fx.table.fail_with_status(StoreOp::Patch, 500, "sheet locked");

    let mut form = EditForm::from_record(&record);
    form.status = Some(LoadStatus::Overload);
    let err = fx.dashboard.apply_edit(&record, &form).await.unwrap_err();

    assert!(matches!(err, GarduError::UpdateFailed { ref key, .. } if key == "BL-001"));
    assert_eq!(fx.history.call_count(), 0);
}

#[tokio::test]
async fn history_failure_does_not_undo_the_update() {
    let fx = fixture();
    fx.history.fail_transport(StoreOp::Append, "connection reset");
    let record = fx.dashboard.find("KR-007").await.unwrap();

    let mut form = EditForm::from_record(&record);
    form.set_line(MeasurementLine::LineA, PhaseReadings::new(12.0, 11.0, 10.0, 2.0));
    let report = fx.dashboard.apply_edit(&record, &form).await.unwrap();

    assert!(!report.history_recorded);
    assert_eq!(report.entries.len(), 4);
    let row = fx.table.row_where("NAMA GARDU", "KR-007").unwrap();
    assert_eq!(row["R Line A"], "12");

    let metrics = fx.dashboard.metrics().unwrap();
    assert_eq!(metrics.audit_entries(), 4);
    assert_eq!(metrics.audit_dropped(), 4);
}

#[tokio::test]
async fn creator_rejects_blank_identity_without_remote_calls() {
    let fx = fixture();
    let err = fx
        .dashboard
        .create(&NewGarduForm::new("BLIMBING", "   "))
        .await
        .unwrap_err();

    assert!(matches!(err, GarduError::Validation { ref field } if field == "NAMA GARDU"));
    assert_eq!(fx.table.call_count(), 0);
}

#[tokio::test]
async fn created_gardu_appears_after_cache_invalidation() {
    let fx = fixture();
    assert_eq!(fx.dashboard.selection_options().await.unwrap().len(), 2);

    let mut form = NewGarduForm::new("BLIMBING", "BL-002");
    form.capacity_kva = 50.0;
    fx.dashboard.create(&form).await.unwrap();

    let options = fx.dashboard.selection_options().await.unwrap();
    assert_eq!(
        options,
        vec!["BLIMBING - BL-001", "KARANGLO - KR-007", "BLIMBING - BL-002"]
    );
    assert_eq!(fx.table.count(StoreOp::Fetch), 2);
}

#[tokio::test]
async fn duplicates_are_appended_unless_uniqueness_is_enforced() {
    let fx = fixture();
    fx.dashboard
        .create(&NewGarduForm::new("BLIMBING", "BL-001"))
        .await
        .unwrap();
    assert_eq!(fx.table.rows().len(), 3);

    let mut strict = config();
    strict.create.enforce_unique_key = true;
    let fx = fixture_with(strict, json!([gardu_row("BLIMBING", "BL-001", "1000", "NORMAL")]));
    let err = fx
        .dashboard
        .create(&NewGarduForm::new("BLIMBING", "BL-001"))
        .await
        .unwrap_err();
    assert!(matches!(err, GarduError::DuplicateKey { .. }));
    assert_eq!(fx.table.count(StoreOp::Append), 0);
}

#[tokio::test]
async fn unparseable_numbers_load_as_zero_and_rows_are_kept() {
    let fx = fixture_with(
        config(),
        json!([
            {"PENYULANG": "BLIMBING", "NAMA GARDU": "BL-001", "BEBAN %": "n/a", "STATUS": "NORMAL"},
            {"PENYULANG": "BLIMBING", "NAMA GARDU": "BL-003", "BEBAN %": 130, "STATUS": "OVERLOAD"}
        ]),
    );
    let table = fx.dashboard.gardu_table().await.unwrap();
    assert_eq!(table.len(), 2);
    let first = table.find("NAMA GARDU", "BL-001").unwrap();
    assert_eq!(first.get("BEBAN %"), Some(&CellValue::Number(0.0)));
    assert_eq!(first.get("KAPASITAS"), None);

    let summary = fx.dashboard.summary().await.unwrap().unwrap();
    assert_eq!(summary.peak.gardu, "BL-003");
    assert_eq!(summary.distribution[0].count, 1);
    assert_eq!(summary.distribution[4].count, 1);
}

#[tokio::test]
async fn views_share_the_cached_table() {
    let fx = fixture();
    fx.dashboard.summary().await.unwrap();
    fx.dashboard.selection_options().await.unwrap();
    fx.dashboard.detail("KR-007").await.unwrap();

    assert_eq!(fx.table.count(StoreOp::Fetch), 1);
    let metrics = fx.dashboard.metrics().unwrap();
    assert_eq!(metrics.cache_lookups(true), 2);
    assert_eq!(metrics.cache_lookups(false), 1);
}

#[tokio::test]
async fn unavailable_table_is_reported_and_retried() {
    let fx = fixture();
    fx.table.fail_transport(StoreOp::Fetch, "dns failure");
    let err = fx.dashboard.summary().await.unwrap_err();
    assert!(matches!(err, GarduError::DataUnavailable { .. }));

    fx.table.clear_faults();
    assert!(fx.dashboard.summary().await.unwrap().is_some());
}

#[tokio::test]
async fn history_view_is_newest_first_and_limited() {
    let fx = fixture();
    for (minute, name) in ["BL-001", "KR-007", "BL-001"].iter().enumerate() {
        let record = fx.dashboard.find(name).await.unwrap();
        let mut form = EditForm::from_record(&record);
        form.load_va = 9000.0 + minute as f64;
        fx.dashboard.apply_edit(&record, &form).await.unwrap();
    }
    fx.history
        .append(&json!([{"Timestamp": "2025-06-30 07:00:00", "Nama Gardu": "BL-009",
            "Data yang Diubah": "STATUS", "Nilai Lama": "NORMAL", "Nilai Baru": "OVERLOAD"}]))
        .await
        .unwrap();
    fx.dashboard.invalidate();

    let entries = fx.dashboard.history(Some(3)).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|entry| entry.timestamp == "2025-07-01 08:15:00"));

    let all = fx.dashboard.history(None).await.unwrap();
    assert_eq!(all.last().map(|entry| entry.gardu.as_str()), Some("BL-009"));
}
