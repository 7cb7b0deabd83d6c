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

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::TableCache;
use crate::errors::{GarduError, Result};
use crate::metrics::DashboardMetrics;
use crate::record::{Record, Table};
use crate::schema::Schema;
use crate::store::{RawRow, TableStore};

/// Result of a soft load: always a table, plus the failure that emptied it.
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: Arc<Table>,
    pub error: Option<GarduError>,
}

impl LoadOutcome {
    pub fn is_unavailable(&self) -> bool {
        matches!(self.error, Some(GarduError::DataUnavailable { .. }))
    }
}

/// Fetches sheet tables, decodes them with the schema and caches the result.
#[derive(Debug, Clone)]
pub struct DataLoader {
    schema: Arc<Schema>,
    cache: Arc<TableCache>,
    metrics: Option<DashboardMetrics>,
}

impl DataLoader {
    pub fn new(schema: Arc<Schema>, cache: Arc<TableCache>) -> Self {
        Self {
            schema,
            cache,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: DashboardMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn cache(&self) -> &Arc<TableCache> {
        &self.cache
    }

    /// Load `store`, serving from cache when fresh. Failures yield an empty
    /// table together with [`GarduError::DataUnavailable`]; they are not cached.
    pub async fn load(&self, store: &dyn TableStore) -> LoadOutcome {
        let source = store.source_id();
        if let Some(table) = self.cache.get(source) {
            self.record_cache(true);
            debug!(source, rows = table.len(), "serving table from cache");
            return LoadOutcome { table, error: None };
        }
        self.record_cache(false);
        match self.fetch(store).await {
            Ok(table) => LoadOutcome { table, error: None },
            Err(err) => {
                warn!(source, error = %err, "table load failed; continuing with empty table");
                LoadOutcome {
                    table: Arc::new(Table::empty()),
                    error: Some(err),
                }
            }
        }
    }

    /// Bypass the cache and fetch `store` now, refreshing its cache entry.
    pub async fn load_fresh(&self, store: &dyn TableStore) -> Result<Arc<Table>> {
        self.fetch(store).await
    }

    /// Drop every cached table held by this loader's cache.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    async fn fetch(&self, store: &dyn TableStore) -> Result<Arc<Table>> {
        let source = store.source_id();
        let rows = store.fetch_rows().await;
        if let Some(metrics) = &self.metrics {
            metrics.record_remote_call(source, "fetch", rows.is_ok());
        }
        let rows = rows.map_err(|reason| GarduError::DataUnavailable {
            source_id: source.to_owned(),
            reason,
        })?;
        let table = Arc::new(build_table(&self.schema, rows));
        debug!(source, rows = table.len(), columns = table.columns().len(), "table loaded");
        self.cache.insert(source, Arc::clone(&table));
        Ok(table)
    }

    fn record_cache(&self, hit: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_lookup(hit);
        }
    }
}

/// Decode raw sheet rows into a [`Table`].
///
/// Column names are whitespace-trimmed. Every row receives every column seen in
/// the payload; numeric columns missing from a row or holding unparseable values
/// become `0`.
pub fn build_table(schema: &Schema, rows: Vec<RawRow>) -> Table {
    let trimmed_rows: Vec<IndexMap<String, Value>> = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(name, value)| (name.trim().to_owned(), value))
                .collect()
        })
        .collect();

    let columns: IndexSet<String> = trimmed_rows
        .iter()
        .flat_map(|row| row.keys().cloned())
        .collect();

    let records = trimmed_rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    let raw = row.get(column).unwrap_or(&Value::Null);
                    (column.clone(), schema.decode(column, raw))
                })
                .collect::<Record>()
        })
        .collect();

    Table::new(columns.into_iter().collect(), records)
}
