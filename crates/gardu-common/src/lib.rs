//! ---
//! gardu_section: "01-core-functionality"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Shared primitives and utilities for the dashboard runtime."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! Shared primitives for the Gardu Monitor workspace.
//! This crate exposes configuration loading, tracing initialisation and the
//! local wall clock used for audit and measurement timestamps.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    AppConfig, CacheConfig, ClockConfig, CreateConfig, HistoryConfig, LoadedAppConfig,
    LoggingConfig, MetricsConfig, SourcesConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use time::{Clock, FixedClock, LocalClock};
