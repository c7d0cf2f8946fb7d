use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// How a file's modification time is compared with the reference time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOp {
    #[serde(alias = "==")]
    Eq,
    #[serde(alias = "!=")]
    Ne,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = "<=")]
    Le,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = ">=")]
    Ge,
    #[default]
    Always,
    Never,
}

impl TimeOp {
    pub fn needs_reference(self) -> bool {
        !matches!(self, TimeOp::Always | TimeOp::Never)
    }

    fn compare(self, modified: i64, reference: i64) -> bool {
        match self {
            TimeOp::Eq => modified == reference,
            TimeOp::Ne => modified != reference,
            TimeOp::Lt => modified < reference,
            TimeOp::Le => modified <= reference,
            TimeOp::Gt => modified > reference,
            TimeOp::Ge => modified >= reference,
            TimeOp::Always => true,
            TimeOp::Never => false,
        }
    }
}

impl fmt::Display for TimeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeOp::Eq => "eq",
            TimeOp::Ne => "ne",
            TimeOp::Lt => "lt",
            TimeOp::Le => "le",
            TimeOp::Gt => "gt",
            TimeOp::Ge => "ge",
            TimeOp::Always => "always",
            TimeOp::Never => "never",
        };
        f.write_str(s)
    }
}

/// Parse a reference time into whole seconds since the epoch.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`. The last two are
/// read as local time; a bare date means midnight.
pub fn parse_time_reference(s: &str) -> Result<i64, ConfigError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ConfigError::TimeReference(s.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| ConfigError::TimeReference(s.to_string()))
}

/// Modification-time filter applied to first-level directories and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeFilter {
    op: TimeOp,
    reference: i64,
}

impl TimeFilter {
    pub fn new(op: TimeOp, reference: Option<&str>) -> Result<Self, ConfigError> {
        let reference = match (op.needs_reference(), reference) {
            (true, Some(r)) => parse_time_reference(r)?,
            (true, None) => return Err(ConfigError::MissingTimeReference(op.to_string())),
            (false, _) => 0,
        };
        Ok(Self { op, reference })
    }

    /// Compare at whole-second resolution.
    pub fn accepts(&self, modified: SystemTime) -> bool {
        let secs = DateTime::<Utc>::from(modified).timestamp();
        self.op.compare(secs, self.reference)
    }

    /// Stat `path` and compare. An unreadable modification time fails.
    pub fn accepts_path(&self, path: &Path) -> bool {
        match self.op {
            TimeOp::Always => return true,
            TimeOp::Never => return false,
            _ => {}
        }
        match path.metadata().and_then(|m| m.modified()) {
            Ok(modified) => self.accepts(modified),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read modification time");
                false
            }
        }
    }
}
