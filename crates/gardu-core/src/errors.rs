//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, GarduError>;

/// Failures surfaced to the operator by dashboard operations.
#[derive(Debug, Error)]
pub enum GarduError {
    #[error("data unavailable from {source_id}: {reason}")]
    DataUnavailable { source_id: String, reason: StoreError },
    #[error("failed to update gardu '{key}': {reason}")]
    UpdateFailed { key: String, reason: StoreError },
    #[error("failed to append gardu: {body}")]
    CreateFailed { status: Option<u16>, body: String },
    #[error("required field '{field}' is missing")]
    Validation { field: String },
    #[error("gardu '{key}' already exists")]
    DuplicateKey { key: String },
    #[error("gardu '{0}' not found")]
    RecordNotFound(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl GarduError {
    /// Build a [`GarduError::CreateFailed`] from the upstream failure, keeping the
    /// response body for diagnosis.
    pub fn create_failed(reason: StoreError) -> Self {
        match reason {
            StoreError::Status { status, body } => GarduError::CreateFailed {
                status: Some(status),
                body,
            },
            other => GarduError::CreateFailed {
                status: None,
                body: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_failed_keeps_upstream_body() {
        let err = GarduError::create_failed(StoreError::Status {
            status: 400,
            body: "{\"error\":\"column mismatch\"}".into(),
        });
        assert_eq!(
            err.to_string(),
            "failed to append gardu: {\"error\":\"column mismatch\"}"
        );
        match err {
            GarduError::CreateFailed { status, body } => {
                assert_eq!(status, Some(400));
                assert!(body.contains("column mismatch"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn validation_names_missing_field() {
        let err = GarduError::Validation {
            field: "NAMA GARDU".into(),
        };
        assert_eq!(err.to_string(), "required field 'NAMA GARDU' is missing");
    }
}
