//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! The dashboard facade wiring stores, cache, clock and metrics together.
//!
//! Every view of the operator surface maps to one method here. Views load through
//! the cached [`DataLoader`], while writes go through the updater and creator,
//! which both invalidate the shared cache on success.

use std::sync::Arc;

use gardu_common::config::AppConfig;
use gardu_common::time::{Clock, LocalClock, BANNER_DATE_FORMAT, MEASUREMENT_TIME_FORMAT};
use tracing::info;

use crate::audit::AuditEntry;
use crate::cache::TableCache;
use crate::creator::RecordCreator;
use crate::detail::GarduDetail;
use crate::errors::{GarduError, Result};
use crate::forms::{EditForm, NewGarduForm};
use crate::history::recent_history;
use crate::loader::{DataLoader, LoadOutcome};
use crate::metrics::DashboardMetrics;
use crate::record::{Record, Table, WireFields};
use crate::schema::Schema;
use crate::store::{HttpTableStore, TableStore};
use crate::summary::DashboardSummary;
use crate::updater::{RecordUpdater, UpdateReport};

pub struct Dashboard {
    table: Arc<dyn TableStore>,
    history: Arc<dyn TableStore>,
    loader: DataLoader,
    updater: RecordUpdater,
    creator: RecordCreator,
    clock: Arc<dyn Clock>,
    metrics: Option<DashboardMetrics>,
    history_limit: usize,
}

impl Dashboard {
    /// Build a dashboard talking HTTP to the configured sheet endpoints.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = config.sources.request_timeout;
        let table = HttpTableStore::new(&config.sources.table_url, timeout)
            .map_err(|err| GarduError::Config(err.to_string()))?;
        let history = HttpTableStore::new(&config.sources.history_url, timeout)
            .map_err(|err| GarduError::Config(err.to_string()))?;
        let clock = LocalClock::from_offset_str(&config.clock.utc_offset)
            .map_err(|err| GarduError::Config(format!("{err:#}")))?;
        Self::with_stores(config, Arc::new(table), Arc::new(history), Arc::new(clock))
    }

    /// Build a dashboard over caller-supplied stores and clock.
    pub fn with_stores(
        config: &AppConfig,
        table: Arc<dyn TableStore>,
        history: Arc<dyn TableStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let schema = Arc::new(Schema::gardu().with_key_field(config.sources.key_column.trim()));
        let cache = Arc::new(TableCache::new(config.cache.ttl));
        let metrics = if config.metrics.enabled {
            Some(DashboardMetrics::standalone()?)
        } else {
            None
        };

        let mut loader = DataLoader::new(Arc::clone(&schema), Arc::clone(&cache));
        let mut updater = RecordUpdater::new(
            Arc::clone(&table),
            Arc::clone(&history),
            Arc::clone(&schema),
            Arc::clone(&clock),
            Arc::clone(&cache),
        );
        if let Some(metrics) = &metrics {
            loader = loader.with_metrics(metrics.clone());
            updater = updater.with_metrics(metrics.clone());
        }
        let mut creator = RecordCreator::new(Arc::clone(&table), loader.clone())
            .enforce_unique_key(config.create.enforce_unique_key);
        if let Some(metrics) = &metrics {
            creator = creator.with_metrics(metrics.clone());
        }

        info!(
            table = table.source_id(),
            history = history.source_id(),
            cache_ttl_secs = config.cache.ttl.as_secs(),
            "dashboard initialised"
        );
        Ok(Self {
            table,
            history,
            loader,
            updater,
            creator,
            clock,
            metrics,
            history_limit: config.history.display_limit,
        })
    }

    pub fn schema(&self) -> &Schema {
        self.loader.schema()
    }

    pub fn key_field(&self) -> &str {
        self.loader.schema().key_field()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn metrics(&self) -> Option<&DashboardMetrics> {
        self.metrics.as_ref()
    }

    /// Soft load of the gardu table; the outcome carries any load failure.
    pub async fn load_gardu(&self) -> LoadOutcome {
        self.loader.load(self.table.as_ref()).await
    }

    /// Gardu table, or the load failure.
    pub async fn gardu_table(&self) -> Result<Arc<Table>> {
        into_result(self.load_gardu().await)
    }

    /// Home view statistics; `None` when the table holds no rows.
    pub async fn summary(&self) -> Result<Option<DashboardSummary>> {
        let table = self.gardu_table().await?;
        Ok(DashboardSummary::from_table(&table, self.key_field()))
    }

    /// Labels of the selection list.
    pub async fn selection_options(&self) -> Result<Vec<String>> {
        let table = self.gardu_table().await?;
        Ok(table.selection_options(self.key_field()))
    }

    /// Record addressed by a selection label or by its identity key.
    pub async fn find(&self, query: &str) -> Result<Record> {
        let table = self.gardu_table().await?;
        let query = query.trim();
        table
            .find_by_option(self.key_field(), query)
            .or_else(|| table.find(self.key_field(), query))
            .cloned()
            .ok_or_else(|| GarduError::RecordNotFound(query.to_owned()))
    }

    pub async fn detail(&self, query: &str) -> Result<GarduDetail> {
        let record = self.find(query).await?;
        Ok(GarduDetail::from_record(&record, self.key_field()))
    }

    /// Persist an edit form against the record it was opened from.
    pub async fn apply_edit(&self, old: &Record, form: &EditForm) -> Result<UpdateReport> {
        let key = old
            .text(self.key_field())
            .ok_or_else(|| GarduError::Validation {
                field: self.key_field().to_owned(),
            })?;
        let fields = form.to_fields(self.schema(), self.clock.as_ref())?;
        self.update(&key, old, &fields).await
    }

    pub async fn update(&self, key: &str, old: &Record, fields: &WireFields) -> Result<UpdateReport> {
        self.updater.update(key, old, fields).await
    }

    pub async fn create(&self, form: &NewGarduForm) -> Result<()> {
        let fields = form.to_fields(self.schema(), self.clock.as_ref())?;
        self.create_fields(&fields).await
    }

    pub async fn create_fields(&self, fields: &WireFields) -> Result<()> {
        self.creator.create(fields).await
    }

    /// Newest history entries, up to `limit` or the configured display limit.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        let table = into_result(self.loader.load(self.history.as_ref()).await)?;
        Ok(recent_history(&table, limit.unwrap_or(self.history_limit)))
    }

    /// Drop cached tables so the next view reads fresh data.
    pub fn invalidate(&self) {
        self.loader.invalidate();
    }

    /// Local date and time for the header banner.
    pub fn banner(&self) -> (String, String) {
        let now = self.clock.now();
        (
            now.format(BANNER_DATE_FORMAT).to_string(),
            now.format(MEASUREMENT_TIME_FORMAT).to_string(),
        )
    }

    /// Prometheus exposition, when metrics are enabled.
    pub fn metrics_text(&self) -> Result<Option<String>> {
        self.metrics.as_ref().map(DashboardMetrics::encode_text).transpose()
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("table", &self.table.source_id())
            .field("history", &self.history.source_id())
            .field("history_limit", &self.history_limit)
            .finish_non_exhaustive()
    }
}

fn into_result(outcome: LoadOutcome) -> Result<Arc<Table>> {
    match outcome.error {
        Some(err) => Err(err),
        None => Ok(outcome.table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardu_common::time::FixedClock;

    #[test]
    fn from_config_builds_http_stores() {
        let config = AppConfig::with_sources(
            "https://sheets.example.invalid/api/gardu/",
            "https://sheets.example.invalid/api/history",
        );
        let dashboard = Dashboard::from_config(&config).unwrap();
        assert_eq!(dashboard.key_field(), "NAMA GARDU");
        assert!(dashboard.metrics().is_some());
        assert!(format!("{dashboard:?}").contains("api/history"));
    }

    #[test]
    fn banner_uses_local_date() {
        let config = AppConfig::with_sources("http://localhost/a", "http://localhost/b");
        let table = Arc::new(HttpTableStore::new("http://localhost/a", config.sources.request_timeout).unwrap());
        let history = Arc::new(HttpTableStore::new("http://localhost/b", config.sources.request_timeout).unwrap());
        let clock = FixedClock::at_local("2025-07-01 23:59:58", "+07:00").unwrap();
        let dashboard = Dashboard::with_stores(&config, table, history, Arc::new(clock)).unwrap();
        assert_eq!(
            dashboard.banner(),
            ("01-07-2025".to_owned(), "23:59:58".to_owned())
        );
    }
}
