//! Per-run counters.

use std::collections::BTreeMap;
use std::fmt;

/// Counters for one run. Only ever incremented; a fresh value is built for
/// each independent run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    pub files_visited: u64,
    pub files_renamed: u64,
    pub files_collided: u64,
    pub files_created: u64,
    pub dirs_visited: u64,
    pub dirs_renamed: u64,
    pub dirs_collided: u64,
    pub dirs_created: u64,
    /// Files whose proposed name had at least one missing key.
    pub files_missing: u64,
    /// Files passed over without planning (filtered, unreadable, links, types).
    pub files_skipped: u64,
    /// Files whose tags could not be read or whose copy or move failed.
    pub files_failed: u64,
    /// How often each key was missing.
    pub missing_keys: BTreeMap<String, u64>,
}

impl RunStatistics {
    pub fn record_missing<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let mut any = false;
        for key in keys {
            any = true;
            *self.missing_keys.entry(key.to_string()).or_default() += 1;
        }
        if any {
            self.files_missing += 1;
        }
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files visited/renamed/collided/created {}/{}/{}/{}, dirs visited/renamed/collided/created {}/{}/{}/{}.",
            self.files_visited,
            self.files_renamed,
            self.files_collided,
            self.files_created,
            self.dirs_visited,
            self.dirs_renamed,
            self.dirs_collided,
            self.dirs_created,
        )?;
        if self.files_missing > 0 {
            let keys: Vec<String> = self
                .missing_keys
                .iter()
                .map(|(k, n)| format!("{k}={n}"))
                .collect();
            write!(
                f,
                " files missing metadata {} ({}).",
                self.files_missing,
                keys.join(", ")
            )?;
        }
        if self.files_skipped > 0 || self.files_failed > 0 {
            write!(
                f,
                " files skipped/failed {}/{}.",
                self.files_skipped, self.files_failed
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_missing_counts_files_once_and_keys_individually() {
        let mut s = RunStatistics::default();
        s.record_missing(["title", "album"]);
        s.record_missing(["title"]);
        s.record_missing(std::iter::empty());
        assert_eq!(s.files_missing, 2);
        assert_eq!(s.missing_keys["title"], 2);
        assert_eq!(s.missing_keys["album"], 1);
    }

    #[test]
    fn display_matches_summary_line() {
        let s = RunStatistics {
            files_visited: 4,
            files_created: 2,
            dirs_created: 1,
            ..RunStatistics::default()
        };
        assert_eq!(
            s.to_string(),
            "files visited/renamed/collided/created 4/0/0/2, dirs visited/renamed/collided/created 0/0/0/1."
        );
    }

    #[test]
    fn display_appends_missing_breakdown() {
        let mut s = RunStatistics::default();
        s.record_missing(["title"]);
        assert!(s.to_string().ends_with(" files missing metadata 1 (title=1)."));
    }
}
