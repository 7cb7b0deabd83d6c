//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use indexmap::IndexMap;
use serde::Serialize;

use crate::record::Table;
use crate::schema::{LoadStatus, LOAD_PERCENT_FIELD, STATUS_FIELD};

/// Labels of the load distribution bins, lowest first.
pub const LOAD_BIN_LABELS: [&str; 5] = ["0-40%", "41-80%", "81-100%", "101-120%", ">120%"];

const LOAD_BIN_EDGES: [f64; 5] = [0.0, 40.0, 80.0, 100.0, 120.0];

/// Count of gardu whose load percentage falls in one bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadBin {
    pub label: &'static str,
    pub count: usize,
}

/// Most heavily loaded gardu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakLoad {
    pub gardu: String,
    pub load_percent: f64,
}

/// Network-wide statistics shown on the home view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    /// Per-status counts in first-seen order; blank statuses are not counted.
    pub status_counts: IndexMap<String, usize>,
    pub overload: usize,
    pub critical: usize,
    pub mean_load_percent: f64,
    pub peak: PeakLoad,
    pub distribution: Vec<LoadBin>,
}

impl DashboardSummary {
    /// Summarise `table`; `None` when it holds no records.
    pub fn from_table(table: &Table, key_field: &str) -> Option<Self> {
        let records = table.records();
        if records.is_empty() {
            return None;
        }

        let mut status_counts: IndexMap<String, usize> = IndexMap::new();
        for status in records.iter().filter_map(|record| record.text(STATUS_FIELD)) {
            *status_counts.entry(status).or_default() += 1;
        }
        let count_of = |status: LoadStatus| status_counts.get(status.as_ref()).copied().unwrap_or(0);

        let percents: Vec<f64> = records.iter().map(|record| record.number(LOAD_PERCENT_FIELD)).collect();
        let mean_load_percent = percents.iter().sum::<f64>() / percents.len() as f64;

        // first record wins ties
        let mut peak_index = 0;
        for (index, value) in percents.iter().enumerate() {
            if *value > percents[peak_index] {
                peak_index = index;
            }
        }
        let peak = PeakLoad {
            gardu: records[peak_index].text(key_field).unwrap_or_default(),
            load_percent: percents[peak_index],
        };

        Some(Self {
            total: records.len(),
            overload: count_of(LoadStatus::Overload),
            critical: count_of(LoadStatus::CriticalLoad),
            status_counts,
            mean_load_percent,
            distribution: load_distribution(&percents, peak.load_percent),
            peak,
        })
    }
}

/// Histogram over half-open bins `[0,40) [40,80) [80,100) [100,120) [120,max+1)`.
pub fn load_distribution(percents: &[f64], max: f64) -> Vec<LoadBin> {
    let upper = max + 1.0;
    let mut counts = [0usize; 5];
    for value in percents {
        let bin = (0..LOAD_BIN_EDGES.len()).rev().find(|&index| {
            let high = LOAD_BIN_EDGES.get(index + 1).copied().unwrap_or(upper);
            *value >= LOAD_BIN_EDGES[index] && *value < high
        });
        if let Some(index) = bin {
            counts[index] += 1;
        }
    }
    LOAD_BIN_LABELS
        .into_iter()
        .zip(counts)
        .map(|(label, count)| LoadBin { label, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn gardu(name: &str, status: &str, percent: f64) -> Record {
        Record::new()
            .with("NAMA GARDU", name)
            .with("STATUS", status)
            .with("BEBAN %", percent)
    }

    #[test]
    fn empty_table_has_no_summary() {
        assert!(DashboardSummary::from_table(&Table::empty(), "NAMA GARDU").is_none());
    }

    #[test]
    fn summarises_statuses_and_peak() {
        let table = Table::new(
            vec!["NAMA GARDU".into(), "STATUS".into(), "BEBAN %".into()],
            vec![
                gardu("BL-001", "NORMAL", 35.0),
                gardu("BL-002", "OVERLOAD", 110.0),
                gardu("BL-003", "CRITICAL LOAD", 90.0),
                gardu("BL-004", "OVERLOAD", 110.0),
                gardu("BL-005", "NORMAL", 0.0),
            ],
        );
        let summary = DashboardSummary::from_table(&table, "NAMA GARDU").unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.overload, 2);
        assert_eq!(summary.critical, 1);
        let order: Vec<_> = summary.status_counts.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["NORMAL", "OVERLOAD", "CRITICAL LOAD"]);
        assert_eq!(summary.peak.gardu, "BL-002");
        assert!((summary.mean_load_percent - 69.0).abs() < 1e-9);

        let counts: Vec<_> = summary.distribution.iter().map(|bin| bin.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 2, 0]);
    }

    #[test]
    fn bins_are_half_open_and_bounded_by_max() {
        let bins = load_distribution(&[40.0, 79.9, 80.0, 120.0, 150.0, -5.0], 150.0);
        let counts: Vec<_> = bins.iter().map(|bin| bin.count).collect();
        assert_eq!(counts, vec![0, 2, 1, 0, 2]);
        assert_eq!(bins[4].label, ">120%");
    }

    #[test]
    fn top_bin_is_empty_when_max_below_its_edge() {
        let bins = load_distribution(&[10.0, 20.0], 20.0);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[4].count, 0);
    }
}
