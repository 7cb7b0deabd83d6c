//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::errors::Result;

/// Metrics published by the dashboard core.
#[derive(Clone)]
pub struct DashboardMetrics {
    remote_calls: IntCounterVec,
    cache_lookups: IntCounterVec,
    audit_entries: IntCounter,
    audit_dropped: IntCounter,
    registry: Arc<Registry>,
}

impl DashboardMetrics {
    /// Register all dashboard metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        let remote_calls = IntCounterVec::new(
            Opts::new(
                "gardu_remote_calls_total",
                "Total number of calls made to remote sheet endpoints",
            ),
            &["source", "operation", "outcome"],
        )?;
        registry.register(Box::new(remote_calls.clone()))?;

        let cache_lookups = IntCounterVec::new(
            Opts::new(
                "gardu_cache_lookups_total",
                "Total number of table cache lookups by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(cache_lookups.clone()))?;

        let audit_entries = IntCounter::with_opts(Opts::new(
            "gardu_audit_entries_total",
            "Total number of field-level audit entries produced by updates",
        ))?;
        registry.register(Box::new(audit_entries.clone()))?;

        let audit_dropped = IntCounter::with_opts(Opts::new(
            "gardu_audit_entries_dropped_total",
            "Total number of audit entries lost because the history store rejected them",
        ))?;
        registry.register(Box::new(audit_dropped.clone()))?;

        Ok(Self {
            remote_calls,
            cache_lookups,
            audit_entries,
            audit_dropped,
            registry,
        })
    }

    /// Metrics backed by a private registry.
    pub fn standalone() -> Result<Self> {
        Self::new(Arc::new(Registry::new()))
    }

    pub fn record_remote_call(&self, source: &str, operation: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.remote_calls
            .with_label_values(&[source, operation, outcome])
            .inc();
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[outcome]).inc();
    }

    pub fn record_audit_entries(&self, count: usize) {
        self.audit_entries.inc_by(count as u64);
    }

    pub fn record_audit_dropped(&self, count: usize) {
        self.audit_dropped.inc_by(count as u64);
    }

    pub fn remote_calls(&self, source: &str, operation: &str, success: bool) -> u64 {
        let outcome = if success { "success" } else { "failure" };
        self.remote_calls
            .with_label_values(&[source, operation, outcome])
            .get()
    }

    pub fn cache_lookups(&self, hit: bool) -> u64 {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[outcome]).get()
    }

    pub fn audit_entries(&self) -> u64 {
        self.audit_entries.get()
    }

    pub fn audit_dropped(&self) -> u64 {
        self.audit_dropped.get()
    }

    /// Prometheus text exposition of the registry.
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}

impl std::fmt::Debug for DashboardMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_exposed() {
        let metrics = DashboardMetrics::standalone().unwrap();
        metrics.record_remote_call("sheet-a", "fetch", true);
        metrics.record_cache_lookup(false);
        metrics.record_audit_entries(3);
        metrics.record_audit_dropped(1);

        assert_eq!(metrics.remote_calls("sheet-a", "fetch", true), 1);
        assert_eq!(metrics.cache_lookups(false), 1);
        assert_eq!(metrics.audit_entries(), 3);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("gardu_remote_calls_total"));
        assert!(text.contains("gardu_audit_entries_dropped_total 1"));
    }

    #[test]
    fn duplicate_registration_is_reported() {
        let registry = Arc::new(Registry::new());
        DashboardMetrics::new(Arc::clone(&registry)).unwrap();
        assert!(DashboardMetrics::new(registry).is_err());
    }
}
