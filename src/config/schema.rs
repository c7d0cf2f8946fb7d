use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::pattern::{DEFAULT_DELIMITER, DEFAULT_PATTERN};
use crate::rename::{MissingPolicy, RetryPolicy, Transfer};
use crate::walk::TimeOp;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/metarename/config.toml` or `~/.config/metarename/config.toml`
///
/// Precedence (highest wins):
/// 1) Command-line flags
/// 2) Environment variables (prefix `METARENAME__`, `__` as nested separator)
/// 3) Config file (if present)
/// 4) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rename: RenameSettings,
    pub walk: WalkSettings,
    pub tagger: TaggerSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenameSettings {
    /// Root of the tree to reorganize.
    pub source: PathBuf,
    /// Root the pattern is applied under. Defaults to `source`.
    pub destination: Option<PathBuf>,
    /// Template of keys and literals, split into directories on `delimiter`.
    ///
    /// Example: "albumArtist/releaseYear - album/trackNumber - title.extension"
    pub pattern: String,
    /// Single character separating directory levels in `pattern`.
    pub delimiter: String,
    /// Only report what would happen.
    #[serde(alias = "test")]
    pub dry_run: bool,
    /// Copy (default) or move files into place.
    pub transfer: Transfer,
    /// What to substitute for keys a file has no value for.
    pub missing: MissingPolicy,
    /// Retries for transient copy/move failures.
    pub retry: RetryPolicy,
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            destination: None,
            pattern: DEFAULT_PATTERN.to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            dry_run: false,
            transfer: Transfer::Copy,
            missing: MissingPolicy::Key,
            retry: RetryPolicy::default(),
        }
    }
}

impl RenameSettings {
    pub fn destination(&self) -> &Path {
        self.destination.as_deref().unwrap_or(self.source.as_path())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    /// Shell-style pattern first-level directory names must match.
    pub glob: Option<String>,
    /// Stop after visiting this many files.
    pub limit: Option<u64>,
    /// Modification-time comparator for first-level directories and files.
    pub time_op: TimeOp,
    /// Reference time for `time_op`.
    pub time: Option<String>,
    /// Remember probed paths for the rest of the run.
    pub cache_paths: bool,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            glob: None,
            limit: None,
            time_op: TimeOp::Always,
            time: None,
            cache_paths: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaggerSettings {
    /// Media types never handed to the tagger. Entries ending in `/` are prefixes.
    pub do_not_parse: Vec<String>,
    /// Extra do-not-parse entries, one per line.
    pub skip_list: Option<PathBuf>,
    /// Media types that get renamed.
    pub actionable: Vec<String>,
}

impl Default for TaggerSettings {
    fn default() -> Self {
        Self {
            do_not_parse: vec!["application/".into(), "text/".into(), "image/".into()],
            skip_list: None,
            actionable: vec![
                "audio/mpeg".into(),
                "audio/mp4".into(),
                "audio/flac".into(),
                "audio/ogg".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Suppress the summary line.
    pub quiet: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            quiet: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    Error,
    #[serde(alias = "warning")]
    Warn,
    #[serde(alias = "verbose")]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
