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

use gardu_common::time::Clock;
use gardu_logging::{gardu_debug, gardu_error, gardu_info, gardu_warn, LogContext};

use crate::audit::{audit_entries, detect_changes, AuditEntry};
use crate::cache::TableCache;
use crate::errors::{GarduError, Result};
use crate::metrics::DashboardMetrics;
use crate::record::{Record, WireFields};
use crate::schema::{Schema, FEEDER_FIELD};
use crate::store::TableStore;

/// Outcome of a persisted update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Audit entries derived from the update, in payload order.
    pub entries: Vec<AuditEntry>,
    /// False when the history store rejected the entries. The update itself stands.
    pub history_recorded: bool,
}

/// Writes edited fields to the gardu table and logs what changed.
///
/// The table write always happens first. Audit entries are only derived and sent
/// once the write has been acknowledged, and a history failure never turns a
/// persisted update into an error.
#[derive(Clone)]
pub struct RecordUpdater {
    table: Arc<dyn TableStore>,
    history: Arc<dyn TableStore>,
    schema: Arc<Schema>,
    clock: Arc<dyn Clock>,
    cache: Arc<TableCache>,
    metrics: Option<DashboardMetrics>,
}

impl RecordUpdater {
    pub fn new(
        table: Arc<dyn TableStore>,
        history: Arc<dyn TableStore>,
        schema: Arc<Schema>,
        clock: Arc<dyn Clock>,
        cache: Arc<TableCache>,
    ) -> Self {
        Self {
            table,
            history,
            schema,
            clock,
            cache,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: DashboardMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Persist `new_fields` on the row identified by `key`, then record one audit
    /// entry per field that differs from `old`.
    pub async fn update(
        &self,
        key: &str,
        old: &Record,
        new_fields: &WireFields,
    ) -> Result<UpdateReport> {
        let penyulang = old.text(FEEDER_FIELD).unwrap_or_default();
        let ctx = LogContext::new()
            .with_gardu(key)
            .with_penyulang(&penyulang)
            .with_operation("update");
        let written = self
            .table
            .patch_where(self.schema.key_field(), key, new_fields)
            .await;
        self.record_call(self.table.source_id(), "patch", written.is_ok());
        written.map_err(|reason| {
            gardu_warn!(context = ctx, "gardu update rejected, no history recorded: {reason}");
            GarduError::UpdateFailed {
                key: key.to_owned(),
                reason,
            }
        })?;
        self.cache.invalidate();
        gardu_info!(context = ctx, "gardu updated with {} fields", new_fields.len());

        let changes = detect_changes(&self.schema, old, new_fields);
        let entries = audit_entries(changes, key, &self.clock.audit_timestamp());
        if let Some(metrics) = &self.metrics {
            metrics.record_audit_entries(entries.len());
        }
        let history_recorded = self.send_history(&ctx, &entries).await;
        Ok(UpdateReport {
            entries,
            history_recorded,
        })
    }

    async fn send_history(&self, ctx: &LogContext<'_>, entries: &[AuditEntry]) -> bool {
        if entries.is_empty() {
            gardu_debug!(context = ctx, "no audited field changed");
            return true;
        }
        let payload = match serde_json::to_value(entries) {
            Ok(payload) => payload,
            Err(err) => {
                gardu_error!(context = ctx, "unable to encode audit entries: {err}");
                self.record_dropped(entries.len());
                return false;
            }
        };
        let sent = self.history.append(&payload).await;
        self.record_call(self.history.source_id(), "append", sent.is_ok());
        match sent {
            Ok(()) => {
                gardu_debug!(context = ctx, "{} audit entries recorded", entries.len());
                true
            }
            Err(err) => {
                gardu_warn!(
                    context = ctx,
                    "history store rejected {} audit entries: {err}",
                    entries.len()
                );
                self.record_dropped(entries.len());
                false
            }
        }
    }

    fn record_call(&self, source: &str, operation: &str, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_remote_call(source, operation, success);
        }
    }

    fn record_dropped(&self, count: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.record_audit_dropped(count);
        }
    }
}

impl std::fmt::Debug for RecordUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordUpdater")
            .field("table", &self.table.source_id())
            .field("history", &self.history.source_id())
            .finish_non_exhaustive()
    }
}
