//! ---
//! gardu_section: "02-data-sync"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Record loading, change detection, and remote synchronisation."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
//! Remote spreadsheet tables.
//!
//! A sheet endpoint behaves like a REST key-value table: `GET` lists every row,
//! `PATCH {endpoint}/{column}/{value}` overwrites the rows matching a column
//! filter and `POST` appends one row (object body) or several (array body).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::record::WireFields;

/// Raw row as returned by the sheet.
pub type RawRow = Map<String, Value>;

/// Transport-level failure talking to a sheet endpoint.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response payload: {0}")]
    Decode(String),
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// A remote table addressed by a single endpoint.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Stable identity of the source, used as the cache key.
    fn source_id(&self) -> &str;

    /// List every row.
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, StoreError>;

    /// Overwrite `fields` on the rows where `column == value`.
    async fn patch_where(
        &self,
        column: &str,
        value: &str,
        fields: &WireFields,
    ) -> Result<(), StoreError>;

    /// Append the payload (one object or an array of objects).
    async fn append(&self, payload: &Value) -> Result<(), StoreError>;
}

/// [`TableStore`] speaking HTTP+JSON to a spreadsheet API.
#[derive(Debug, Clone)]
pub struct HttpTableStore {
    endpoint: Url,
    source_id: String,
    client: Client,
}

impl HttpTableStore {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Self::with_client(endpoint, client)
    }

    /// Build a store sharing an existing client (connection pool).
    pub fn with_client(endpoint: &str, client: Client) -> Result<Self, StoreError> {
        let parsed =
            Url::parse(endpoint).map_err(|_| StoreError::InvalidEndpoint(endpoint.to_owned()))?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::InvalidEndpoint(endpoint.to_owned()));
        }
        Ok(Self {
            source_id: parsed.as_str().trim_end_matches('/').to_owned(),
            endpoint: parsed,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `{endpoint}/{column}/{value}` with both segments percent-encoded.
    pub fn filter_url(&self, column: &str, value: &str) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(column)
            .push(value);
        Ok(url)
    }
}

#[async_trait]
impl TableStore for HttpTableStore {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch_rows(&self) -> Result<Vec<RawRow>, StoreError> {
        debug!(source = %self.source_id, "fetching sheet rows");
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;
        rows_from_value(body)
    }

    async fn patch_where(
        &self,
        column: &str,
        value: &str,
        fields: &WireFields,
    ) -> Result<(), StoreError> {
        let url = self.filter_url(column, value)?;
        debug!(source = %self.source_id, %url, field_count = fields.len(), "patching sheet rows");
        let response = self
            .client
            .patch(url)
            .json(fields)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }

    async fn append(&self, payload: &Value) -> Result<(), StoreError> {
        debug!(source = %self.source_id, "appending sheet rows");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Transport(format!("timed out: {err}"))
    } else {
        StoreError::Transport(err.to_string())
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Interpret a `GET` body as a list of rows.
pub fn rows_from_value(body: Value) -> Result<Vec<RawRow>, StoreError> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Decode(format!(
                    "expected an object per row, found {other}"
                ))),
            })
            .collect(),
        other => Err(StoreError::Decode(format!(
            "expected an array of rows, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
