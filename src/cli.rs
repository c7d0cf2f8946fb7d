//! Command-line flags. Anything given here overrides the config file and the
//! environment.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{LogLevel, Settings};
use crate::rename::Transfer;
use crate::walk::TimeOp;

/// Rename and reorganize media files from the metadata they carry.
#[derive(Parser, Debug, Default)]
#[command(name = "metarename")]
#[command(version)]
pub struct Args {
    /// Do not perform actions, just list what would happen.
    #[arg(short, long)]
    pub test: bool,

    /// Print per-file details.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print everything, including every probe.
    #[arg(long)]
    pub debug: bool,

    /// Only print errors; no summary.
    #[arg(short, long)]
    pub quiet: bool,

    /// Root of the tree to reorganize.
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Root the pattern is applied under. Defaults to the source.
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Naming pattern for directories and file name.
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Directory separator used in the pattern.
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Move files instead of copying them.
    #[arg(short = 'm', long = "move")]
    pub move_files: bool,

    /// Stop after visiting this many files.
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Only descend into first-level directories matching this glob.
    #[arg(short, long)]
    pub glob: Option<String>,

    /// Compare modification times against --time with this operator.
    #[arg(long, value_enum)]
    pub time_op: Option<TimeOp>,

    /// Reference time: RFC 3339, "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD".
    #[arg(long, value_name = "TIME")]
    pub time: Option<String>,

    /// File of media types never to parse, one per line.
    #[arg(long, value_name = "FILE")]
    pub skip_list: Option<PathBuf>,

    /// Probe the filesystem every time instead of caching path attributes.
    #[arg(long)]
    pub no_cache: bool,

    /// Config file to read instead of the default location.
    #[arg(long, value_name = "FILE", env = "METARENAME_CONFIG_PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn apply_to(&self, s: &mut Settings) {
        if self.test {
            s.rename.dry_run = true;
        }
        if let Some(p) = &self.source {
            s.rename.source = p.clone();
        }
        if let Some(p) = &self.destination {
            s.rename.destination = Some(p.clone());
        }
        if let Some(p) = &self.pattern {
            s.rename.pattern = p.clone();
        }
        if let Some(c) = self.delimiter {
            s.rename.delimiter = c.to_string();
        }
        if self.move_files {
            s.rename.transfer = Transfer::Move;
        }
        if self.limit.is_some() {
            s.walk.limit = self.limit;
        }
        if let Some(g) = &self.glob {
            s.walk.glob = Some(g.clone());
        }
        if let Some(op) = self.time_op {
            s.walk.time_op = op;
        }
        if let Some(t) = &self.time {
            s.walk.time = Some(t.clone());
        }
        if let Some(p) = &self.skip_list {
            s.tagger.skip_list = Some(p.clone());
        }
        if self.no_cache {
            s.walk.cache_paths = false;
        }

        if self.quiet {
            s.log.quiet = true;
            s.log.level = LogLevel::Error;
        } else if self.debug {
            s.log.level = LogLevel::Trace;
        } else if self.verbose {
            s.log.level = LogLevel::Debug;
        }
    }
}
