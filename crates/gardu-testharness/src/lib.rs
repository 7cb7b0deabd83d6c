//! ---
//! gardu_section: "11-test-harness"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "In-memory sheet stores for integration tests."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! In-memory stand-ins for the spreadsheet API.
//!
//! [`MemoryTableStore`] keeps rows as JSON objects, merges PATCH bodies into the
//! matching rows the way the sheet does, records every call it receives and can
//! be told to fail any operation.

use async_trait::async_trait;
use gardu_core::record::WireFields;
use gardu_core::store::{RawRow, StoreError, TableStore};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::debug;

/// A call received by a [`MemoryTableStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Fetch,
    Patch {
        column: String,
        value: String,
        fields: WireFields,
    },
    Append(Value),
}

/// Operation a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Fetch,
    Patch,
    Append,
}

#[derive(Debug, Clone)]
struct Fault {
    op: StoreOp,
    status: Option<u16>,
    message: String,
}

impl Fault {
    fn to_error(&self) -> StoreError {
        match self.status {
            Some(status) => StoreError::Status {
                status,
                body: self.message.clone(),
            },
            None => StoreError::Transport(self.message.clone()),
        }
    }
}

/// Sheet table held in memory.
#[derive(Debug)]
pub struct MemoryTableStore {
    source_id: String,
    rows: Mutex<Vec<RawRow>>,
    calls: Mutex<Vec<StoreCall>>,
    faults: Mutex<Vec<Fault>>,
}

impl MemoryTableStore {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            rows: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Seed rows from a JSON array of objects; other values are ignored.
    pub fn with_rows(self, rows: Value) -> Self {
        if let Value::Array(items) = rows {
            let mut stored = self.rows.lock();
            stored.extend(items.into_iter().filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            }));
        }
        self
    }

    /// Fail `op` with an HTTP status and body until cleared.
    pub fn fail_with_status(&self, op: StoreOp, status: u16, body: impl Into<String>) {
        self.faults.lock().push(Fault {
            op,
            status: Some(status),
            message: body.into(),
        });
    }

    /// Fail `op` with a transport error until cleared.
    pub fn fail_transport(&self, op: StoreOp, message: impl Into<String>) {
        self.faults.lock().push(Fault {
            op,
            status: None,
            message: message.into(),
        });
    }

    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    pub fn rows(&self) -> Vec<RawRow> {
        self.rows.lock().clone()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls of the given kind.
    pub fn count(&self, op: StoreOp) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call_op(call) == op)
            .count()
    }

    /// Payloads received by `append`, in order.
    pub fn appended(&self) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                StoreCall::Append(payload) => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// First stored row whose `column` reads as `value`.
    pub fn row_where(&self, column: &str, value: &str) -> Option<RawRow> {
        self.rows
            .lock()
            .iter()
            .find(|row| cell_matches(row, column, value))
            .cloned()
    }

    fn enter(&self, call: StoreCall) -> Result<(), StoreError> {
        let op = call_op(&call);
        self.calls.lock().push(call);
        let fault = self.faults.lock().iter().find(|fault| fault.op == op).cloned();
        match fault {
            Some(fault) => {
                debug!(source = %self.source_id, ?op, "injected store fault");
                Err(fault.to_error())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch_rows(&self) -> Result<Vec<RawRow>, StoreError> {
        self.enter(StoreCall::Fetch)?;
        Ok(self.rows())
    }

    async fn patch_where(
        &self,
        column: &str,
        value: &str,
        fields: &WireFields,
    ) -> Result<(), StoreError> {
        self.enter(StoreCall::Patch {
            column: column.to_owned(),
            value: value.to_owned(),
            fields: fields.clone(),
        })?;
        let mut rows = self.rows.lock();
        let mut matched = 0;
        for row in rows.iter_mut().filter(|row| cell_matches(row, column, value)) {
            for (name, new_value) in fields {
                row.insert(name.clone(), json!(new_value));
            }
            matched += 1;
        }
        if matched == 0 {
            return Err(StoreError::Status {
                status: 404,
                body: format!("no row where {column} = {value}"),
            });
        }
        Ok(())
    }

    async fn append(&self, payload: &Value) -> Result<(), StoreError> {
        self.enter(StoreCall::Append(payload.clone()))?;
        let mut rows = self.rows.lock();
        match payload {
            Value::Object(row) => rows.push(row.clone()),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(row) => rows.push(row.clone()),
                        other => {
                            return Err(StoreError::Status {
                                status: 400,
                                body: format!("cannot append {other}"),
                            })
                        }
                    }
                }
            }
            other => {
                return Err(StoreError::Status {
                    status: 400,
                    body: format!("cannot append {other}"),
                })
            }
        }
        Ok(())
    }
}

fn call_op(call: &StoreCall) -> StoreOp {
    match call {
        StoreCall::Fetch => StoreOp::Fetch,
        StoreCall::Patch { .. } => StoreOp::Patch,
        StoreCall::Append(_) => StoreOp::Append,
    }
}

fn cell_matches(row: &RawRow, column: &str, value: &str) -> bool {
    match row.get(column) {
        Some(Value::String(text)) => text == value,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> WireFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn patch_merges_into_matching_rows() {
        let store = MemoryTableStore::new("memory://gardu").with_rows(json!([
            {"NAMA GARDU": "BL-001", "STATUS": "NORMAL", "ALAMAT": "Jl. Raya"},
            {"NAMA GARDU": "BL-002", "STATUS": "NORMAL"}
        ]));

        store
            .patch_where("NAMA GARDU", "BL-001", &fields(&[("STATUS", "OVERLOAD")]))
            .await
            .unwrap();

        let row = store.row_where("NAMA GARDU", "BL-001").unwrap();
        assert_eq!(row["STATUS"], "OVERLOAD");
        assert_eq!(row["ALAMAT"], "Jl. Raya");
        assert_eq!(store.row_where("NAMA GARDU", "BL-002").unwrap()["STATUS"], "NORMAL");
    }

    #[tokio::test]
    async fn patch_without_match_is_not_found() {
        let store = MemoryTableStore::new("memory://gardu");
        let err = store
            .patch_where("NAMA GARDU", "BL-404", &WireFields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn faults_are_recorded_and_cleared() {
        let store = MemoryTableStore::new("memory://history");
        store.fail_with_status(StoreOp::Append, 503, "quota exceeded");

        let err = store.append(&json!([{"a": "1"}])).await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 503, .. }));
        assert!(store.rows().is_empty());
        assert_eq!(store.count(StoreOp::Append), 1);

        store.clear_faults();
        store.append(&json!([{"a": "1"}, {"a": "2"}])).await.unwrap();
        assert_eq!(store.rows().len(), 2);
        assert_eq!(store.appended().len(), 2);
    }
}
