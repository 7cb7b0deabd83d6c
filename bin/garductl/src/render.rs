//! ---
//! gardu_section: "05-operator-interface"
//! gardu_subsection: "binary"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Operator CLI for monitoring and editing gardu telemetry."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use gardu_core::detail::{GarduDetail, ReadingColumn};
use gardu_core::summary::DashboardSummary;
use gardu_core::{AuditEntry, GarduError, UpdateReport};

pub fn banner(date: &str, time: &str) {
    println!("Tanggal: {date}  Jam: {time}");
    println!();
}

pub fn summary(summary: Option<&DashboardSummary>) {
    let Some(summary) = summary else {
        println!("Tidak ada data gardu yang ditemukan.");
        return;
    };
    println!("Jumlah Gardu Total        : {}", summary.total);
    println!("Gardu Overload (>100%)    : {}", summary.overload);
    println!("Gardu Critical (80-100%)  : {}", summary.critical);
    println!();
    println!("Jumlah Gardu per Status");
    for (status, count) in &summary.status_counts {
        println!("  {status:<15} {count}");
    }
    println!();
    println!("Distribusi Beban Gardu");
    for bin in &summary.distribution {
        println!("  {:<10} {}", bin.label, bin.count);
    }
    println!();
    println!(
        "Rata-rata Beban Jaringan: {:.2}% | Beban Tertinggi: {:.2}% di Gardu {}",
        summary.mean_load_percent, summary.peak.load_percent, summary.peak.gardu
    );
}

pub fn options(options: &[String]) {
    if options.is_empty() {
        println!("Tidak ada data gardu yang ditemukan.");
    }
    for option in options {
        println!("{option}");
    }
}

pub fn detail(detail: &GarduDetail) {
    println!("Detail Informasi: {}", detail.heading);
    for (label, value) in &detail.info {
        println!("  {label:<22}: {value}");
    }
    for panel in &detail.panels {
        println!();
        println!("[{}]", panel.title);
        side_by_side(&panel.left, &panel.right);
    }
}

fn side_by_side(left: &ReadingColumn, right: &ReadingColumn) {
    println!("  {:<24}{}", left.title, right.title);
    let rows = left.readings.len().max(right.readings.len());
    for index in 0..rows {
        let cell = |column: &ReadingColumn| {
            column
                .readings
                .get(index)
                .map(|(label, value)| format!("{label}: {value}"))
                .unwrap_or_default()
        };
        println!("  {:<24}{}", cell(left), cell(right));
    }
}

pub fn update(key: &str, report: &UpdateReport) {
    println!("Data gardu {key} berhasil diperbarui.");
    if report.entries.is_empty() {
        println!("Tidak ada perubahan nilai yang tercatat.");
        return;
    }
    for entry in &report.entries {
        println!("  {}: {} -> {}", entry.field, entry.old_value, entry.new_value);
    }
}

pub fn created(key: &str) {
    println!("Data gardu {key} berhasil ditambahkan.");
}

pub fn history(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("Belum ada riwayat perubahan data yang tercatat.");
        return;
    }
    println!(
        "{:<20} {:<16} {:<18} {:<14} {}",
        "Timestamp", "Nama Gardu", "Data yang Diubah", "Nilai Lama", "Nilai Baru"
    );
    for entry in entries {
        println!(
            "{:<20} {:<16} {:<18} {:<14} {}",
            entry.timestamp, entry.gardu, entry.field, entry.old_value, entry.new_value
        );
    }
}

/// Operator-facing text for a failed command.
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GarduError>() {
        Some(GarduError::DataUnavailable { .. }) => {
            format!("data gardu tidak dapat dimuat, coba lagi nanti ({err})")
        }
        Some(GarduError::UpdateFailed { key, .. }) => {
            format!("gagal memperbarui gardu {key}; tidak ada perubahan yang disimpan ({err})")
        }
        Some(GarduError::CreateFailed { body, .. }) => {
            format!("gagal menambahkan data: {body}")
        }
        Some(GarduError::Validation { field }) => {
            format!("{field} wajib diisi dengan nilai yang valid")
        }
        _ => format!("{err:#}"),
    }
}
