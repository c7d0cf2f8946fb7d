//! Path attribute probing with a per-run cache.
//!
//! A probe checks a set of [`Attrs`] on one path and may perform [`Actions`]
//! (create, update, delete) on it. Results are memoized per path so repeated
//! non-mutating probes cost no filesystem access. Any action bypasses the
//! memo, and a delete evicts it.

mod attrs;

pub use attrs::{Actions, Attrs};

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::stats::RunStatistics;

/// Prefix for decision lines, depending on whether anything is really done.
pub fn action_prefix(dry_run: bool) -> &'static str {
    if dry_run { "proposed action: " } else { "action: " }
}

/// Dot-files count as hidden.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.') && name != "." && name != "..")
        .unwrap_or(false)
}

pub struct PathProbe {
    cache: HashMap<String, Attrs>,
    caching: bool,
    dry_run: bool,
    queries: u64,
}

impl PathProbe {
    pub fn new(dry_run: bool) -> Self {
        Self {
            cache: HashMap::new(),
            caching: true,
            dry_run,
            queries: 0,
        }
    }

    /// Disable the memo; every probe then queries the filesystem.
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Number of probes that went to the filesystem.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    #[cfg(test)]
    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        self.cache.contains_key(&cache_key(path.as_ref()))
    }

    /// Drop whatever is known about `path` so the next probe re-queries.
    pub fn forget(&mut self, path: impl AsRef<Path>) {
        self.cache.remove(&cache_key(path.as_ref()));
    }

    /// Record `path` as holding `seen` without touching the filesystem.
    ///
    /// Used in plan-only runs so a destination claimed by one file collides
    /// with the next file proposing the same name.
    pub fn assume(&mut self, path: impl AsRef<Path>, seen: Attrs) {
        self.cache.insert(cache_key(path.as_ref()), seen);
    }

    /// Probe a path given as a string. Empty strings fail closed.
    pub fn probe_str(
        &mut self,
        stats: &mut RunStatistics,
        path: &str,
        attrs: Attrs,
        actions: Actions,
    ) -> bool {
        if path.is_empty() {
            return false;
        }
        self.probe(stats, Path::new(path), attrs, actions)
    }

    /// Check `attrs` on `path`, performing `actions` first (delete last).
    ///
    /// Returns whether every requested attribute holds. `HIDDEN` and `SYMLINK`
    /// are only evaluated for an existing path. Filesystem failures are
    /// logged and read as `false`.
    pub fn probe(
        &mut self,
        stats: &mut RunStatistics,
        path: impl AsRef<Path>,
        attrs: Attrs,
        actions: Actions,
    ) -> bool {
        let path = normalize(path.as_ref());
        let key = path.to_string_lossy().into_owned();

        if self.caching && actions.is_empty() {
            if let Some(&seen) = self.cache.get(&key) {
                return evaluate(seen, attrs);
            }
        }

        self.queries += 1;
        let before = observe(&path);
        debug!(path = %path.display(), ?attrs, ?actions, ?before, "probe");

        // Only directory existence checks count as visits.
        if attrs.contains(Attrs::EXISTS | Attrs::DIRECTORY) {
            stats.dirs_visited += 1;
        }

        if actions.contains(Actions::CREATE) && !before.contains(Attrs::EXISTS) {
            self.create(stats, &path, &key, attrs);
        }
        if actions.contains(Actions::UPDATE) {
            self.touch(&path, before);
        }

        let seen = if actions.intersects(Actions::CREATE | Actions::UPDATE) && !self.dry_run {
            observe(&path)
        } else {
            before
        };
        let ok = evaluate(seen, attrs);

        if actions.contains(Actions::DELETE) {
            self.delete(&path, attrs, seen);
            self.cache.remove(&key);
        } else if self.caching {
            self.cache.insert(key, seen);
        }
        ok
    }

    fn create(&mut self, stats: &mut RunStatistics, path: &Path, key: &str, attrs: Attrs) {
        let prefix = action_prefix(self.dry_run);
        if attrs.contains(Attrs::FILE) {
            info!("{prefix}create file={}", path.display());
            if !self.dry_run {
                match OpenOptions::new().write(true).create_new(true).open(path) {
                    Ok(_) => stats.files_created += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to create file"),
                }
            }
        }
        // Announce each directory once per run, however many files land in it.
        if attrs.contains(Attrs::DIRECTORY) && !self.cache.contains_key(key) {
            info!("{prefix}create directory={}", path.display());
            if !self.dry_run {
                match fs::create_dir_all(path) {
                    Ok(()) => stats.dirs_created += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to create directory"),
                }
            }
        }
    }

    fn touch(&self, path: &Path, before: Attrs) {
        if !before.contains(Attrs::EXISTS) {
            return;
        }
        info!("{}update file={}", action_prefix(self.dry_run), path.display());
        if !self.dry_run {
            if let Err(e) = filetime::set_file_mtime(path, FileTime::now()) {
                warn!(path = %path.display(), error = %e, "failed to update modification time");
            }
        }
    }

    fn delete(&self, path: &Path, attrs: Attrs, seen: Attrs) {
        info!("{}delete file={}", action_prefix(self.dry_run), path.display());
        if self.dry_run || !seen.contains(Attrs::EXISTS) {
            return;
        }
        let as_dir = attrs.contains(Attrs::DIRECTORY)
            || (!attrs.contains(Attrs::FILE) && seen.contains(Attrs::DIRECTORY));
        let result = if as_dir {
            remove_tree(path)
        } else {
            fs::remove_file(path)
        };
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to delete");
        }
    }
}

/// Combine the observed attribute set with a request.
fn evaluate(seen: Attrs, requested: Attrs) -> bool {
    let ok = seen.contains(requested.without(Attrs::EXISTENTIAL));
    if ok && seen.contains(Attrs::EXISTS) {
        seen.contains(requested.intersection(Attrs::EXISTENTIAL))
    } else {
        ok
    }
}

/// Everything that is currently true of `path`. A dangling symlink does not
/// exist.
fn observe(path: &Path) -> Attrs {
    let mut seen = Attrs::NONE;
    let Ok(link) = fs::symlink_metadata(path) else {
        return seen;
    };
    if link.file_type().is_symlink() {
        seen |= Attrs::SYMLINK;
    }
    let Ok(meta) = fs::metadata(path) else {
        return seen;
    };

    seen |= Attrs::EXISTS;
    if meta.is_file() {
        seen |= Attrs::FILE;
    }
    if meta.is_dir() {
        seen |= Attrs::DIRECTORY;
    }
    let readable = if meta.is_dir() {
        fs::read_dir(path).is_ok()
    } else {
        fs::File::open(path).is_ok()
    };
    if readable {
        seen |= Attrs::READABLE;
    }
    if !meta.permissions().readonly() {
        seen |= Attrs::WRITABLE;
    }
    if is_executable(&meta) {
        seen |= Attrs::EXECUTABLE;
    }
    if is_hidden(path) {
        seen |= Attrs::HIDDEN;
    }
    seen
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(meta: &fs::Metadata) -> bool {
    meta.is_dir()
}

/// Delete a directory and everything below it, children first.
fn remove_tree(root: &Path) -> io::Result<()> {
    for entry in WalkDir::new(root).contents_first(true) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

fn cache_key(path: &Path) -> String {
    normalize(path).to_string_lossy().into_owned()
}
