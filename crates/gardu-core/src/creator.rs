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

use gardu_logging::{gardu_info, gardu_warn, LogContext};
use serde_json::{Map, Value};

use crate::cache::TableCache;
use crate::errors::{GarduError, Result};
use crate::loader::DataLoader;
use crate::metrics::DashboardMetrics;
use crate::record::WireFields;
use crate::schema::FEEDER_FIELD;
use crate::store::TableStore;

/// Appends new gardu rows to the remote table.
///
/// Identity-key uniqueness is not checked unless [`RecordCreator::enforce_unique_key`]
/// is enabled, and even then a concurrent append between the check and the write
/// can still produce a duplicate.
#[derive(Clone)]
pub struct RecordCreator {
    table: Arc<dyn TableStore>,
    loader: DataLoader,
    enforce_unique_key: bool,
    metrics: Option<DashboardMetrics>,
}

impl RecordCreator {
    pub fn new(table: Arc<dyn TableStore>, loader: DataLoader) -> Self {
        Self {
            table,
            loader,
            enforce_unique_key: false,
            metrics: None,
        }
    }

    /// Reject appends whose identity key already exists in a fresh snapshot.
    pub fn enforce_unique_key(mut self, enabled: bool) -> Self {
        self.enforce_unique_key = enabled;
        self
    }

    pub fn with_metrics(mut self, metrics: DashboardMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn cache(&self) -> &Arc<TableCache> {
        self.loader.cache()
    }

    /// Validate and append `fields` as a new row.
    pub async fn create(&self, fields: &WireFields) -> Result<()> {
        let key_field = self.loader.schema().key_field().to_owned();
        let penyulang = require(fields, FEEDER_FIELD)?;
        let key = require(fields, &key_field)?.to_owned();
        let ctx = LogContext::new()
            .with_gardu(&key)
            .with_penyulang(penyulang)
            .with_operation("create");

        if self.enforce_unique_key {
            let snapshot = self.loader.load_fresh(self.table.as_ref()).await?;
            if snapshot.find(&key_field, &key).is_some() {
                gardu_warn!(context = ctx, "refusing to append duplicate gardu");
                return Err(GarduError::DuplicateKey { key: key.clone() });
            }
        }

        let body: Map<String, Value> = fields
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        let appended = self.table.append(&Value::Object(body)).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_remote_call(self.table.source_id(), "append", appended.is_ok());
        }
        appended.map_err(|reason| {
            gardu_warn!(context = ctx, "gardu append rejected: {reason}");
            GarduError::create_failed(reason)
        })?;

        self.cache().invalidate();
        gardu_info!(context = ctx, "gardu appended with {} fields", fields.len());
        Ok(())
    }
}

impl std::fmt::Debug for RecordCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCreator")
            .field("table", &self.table.source_id())
            .field("enforce_unique_key", &self.enforce_unique_key)
            .finish_non_exhaustive()
    }
}

fn require<'a>(fields: &'a WireFields, field: &str) -> Result<&'a str> {
    match fields.get(field).map(|value| value.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(GarduError::Validation {
            field: field.to_owned(),
        }),
    }
}
