//! ---
//! gardu_section: "01-core-functionality"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Shared primitives and utilities for the dashboard runtime."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// Format used for audit entry timestamps (`2025-07-01 08:30:00`).
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Format used for the measurement date column (`07/01/2025`).
pub const MEASUREMENT_DATE_FORMAT: &str = "%m/%d/%Y";
/// Format used for the measurement time column (`08:30:00`).
pub const MEASUREMENT_TIME_FORMAT: &str = "%H:%M:%S";
/// Format used for the operator banner date (`01-07-2025`).
pub const BANNER_DATE_FORMAT: &str = "%d-%m-%Y";

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    /// Current instant expressed in the deployment's local offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Audit timestamp for the current instant.
    fn audit_timestamp(&self) -> String {
        self.now().format(AUDIT_TIMESTAMP_FORMAT).to_string()
    }

    /// Measurement date and time strings for the current instant.
    fn measurement_stamp(&self) -> (String, String) {
        let now = self.now();
        (
            now.format(MEASUREMENT_DATE_FORMAT).to_string(),
            now.format(MEASUREMENT_TIME_FORMAT).to_string(),
        )
    }
}

/// System clock projected into a fixed UTC offset (WIB has no daylight saving).
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build a clock from an offset string such as `+07:00`.
    pub fn from_offset_str(offset: &str) -> Result<Self> {
        Ok(Self::new(parse_utc_offset(offset)?))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        // +07:00 always fits in a FixedOffset
        Self::new(FixedOffset::east_opt(7 * 3600).unwrap_or_else(|| Utc.fix()))
    }
}

impl Clock for LocalClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at a single instant, for deterministic tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }

    /// Freeze the clock at a local `YYYY-MM-DD HH:MM:SS` in the given offset.
    pub fn at_local(local: &str, offset: &str) -> Result<Self> {
        let offset = parse_utc_offset(offset)?;
        let naive = NaiveDateTime::parse_from_str(local, AUDIT_TIMESTAMP_FORMAT)
            .map_err(|err| anyhow!("invalid local timestamp '{local}': {err}"))?;
        let instant = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| anyhow!("ambiguous local timestamp '{local}'"))?;
        Ok(Self::new(instant))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}

/// Parse `+HH:MM` or `+HHMM` (either sign) into a [`FixedOffset`].
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    FixedOffset::from_str(raw).map_err(|err| anyhow!("invalid utc offset '{raw}': {err}"))
}

/// Parse an audit timestamp back into a naive local date-time.
pub fn parse_audit_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), AUDIT_TIMESTAMP_FORMAT).ok()
}
