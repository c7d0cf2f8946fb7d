//! Error types.
//!
//! Only [`ConfigError`] is fatal to a run. Everything else is raised per file
//! and turned into a log line plus a statistics entry by the walk driver.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Template could not be compiled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern \"{0}\" contains no substitution keys")]
    NoKeys(String),
}

/// Raised before the walk starts; aborts the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("source path {0} is not a readable directory")]
    Source(PathBuf),

    #[error("destination path {0} is not a writable directory")]
    Destination(PathBuf),

    #[error("invalid glob \"{pattern}\": {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid time reference \"{0}\" (expected RFC 3339, YYYY-MM-DD HH:MM:SS or YYYY-MM-DD)")]
    TimeReference(String),

    #[error("time comparator \"{0}\" needs a reference time")]
    MissingTimeReference(String),

    #[error("failed to read skip list {path}: {source}")]
    SkipList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load settings: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

/// The tagger could not classify or read a file.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read tags from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("no tags found in {0}")]
    NoTags(PathBuf),
}

/// A copy or move failed after the destination was planned.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("failed to {verb} \"{from}\" to \"{to}\" (type {media_type}): {source}")]
    Transfer {
        verb: &'static str,
        from: PathBuf,
        to: PathBuf,
        media_type: String,
        #[source]
        source: io::Error,
    },

    #[error("parent directory of \"{to}\" is unavailable (type {media_type})")]
    ParentUnavailable { to: PathBuf, media_type: String },
}
