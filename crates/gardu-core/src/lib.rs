//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! Core of the gardu telemetry dashboard.
//!
//! Tables are read from a spreadsheet REST API through [`store::TableStore`],
//! decoded with the [`schema::Schema`] and cached by the [`loader::DataLoader`].
//! Edits are written by the [`updater::RecordUpdater`], which appends one
//! history entry per changed field once the table write has succeeded.

pub mod audit;
pub mod cache;
pub mod creator;
pub mod detail;
pub mod errors;
pub mod forms;
pub mod history;
pub mod loader;
pub mod metrics;
pub mod record;
pub mod schema;
pub mod service;
pub mod store;
pub mod summary;
pub mod updater;

pub use audit::{audit_entries, detect_changes, AuditEntry, FieldChange};
pub use cache::TableCache;
pub use creator::RecordCreator;
pub use detail::GarduDetail;
pub use errors::{GarduError, Result};
pub use forms::{EditForm, NewGarduForm, PhaseReadings, Usage};
pub use loader::{build_table, DataLoader, LoadOutcome};
pub use metrics::DashboardMetrics;
pub use record::{CellValue, Record, Table, WireFields};
pub use schema::{FieldKind, LoadStatus, MeasurementLine, Phase, Schema};
pub use service::Dashboard;
pub use store::{HttpTableStore, RawRow, StoreError, TableStore};
pub use summary::DashboardSummary;
pub use updater::{RecordUpdater, UpdateReport};
