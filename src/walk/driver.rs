use std::path::Path;

use glob::Pattern;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::filter::TimeFilter;
use crate::context::RunContext;
use crate::probe::{Actions, Attrs, is_hidden};
use crate::rename::{Planner, add_file_keys, keys, normalize};
use crate::tagger::{MediaTypeSet, Tagger};

/// Why a walk stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WalkEnd {
    Exhausted,
    LimitReached,
}

/// Walks a source tree and hands every eligible file to the planner.
pub struct TreeWalkDriver<T> {
    tagger: T,
    planner: Planner,
    glob: Option<Pattern>,
    time: TimeFilter,
    limit: Option<u64>,
    do_not_parse: MediaTypeSet,
    actionable: MediaTypeSet,
}

impl<T: Tagger> TreeWalkDriver<T> {
    pub fn new(tagger: T, planner: Planner) -> Self {
        Self {
            tagger,
            planner,
            glob: None,
            time: TimeFilter::default(),
            limit: None,
            do_not_parse: MediaTypeSet::default(),
            actionable: MediaTypeSet::default(),
        }
    }

    /// Only first-level directories whose name matches are descended.
    pub fn with_glob(mut self, glob: Option<Pattern>) -> Self {
        self.glob = glob;
        self
    }

    pub fn with_time_filter(mut self, time: TimeFilter) -> Self {
        self.time = time;
        self
    }

    /// Stop after this many files have been visited.
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_do_not_parse(mut self, set: MediaTypeSet) -> Self {
        self.do_not_parse = set;
        self
    }

    pub fn with_actionable(mut self, set: MediaTypeSet) -> Self {
        self.actionable = set;
        self
    }

    #[cfg(test)]
    pub fn tagger(&self) -> &T {
        &self.tagger
    }

    fn descend(&self, entry: &DirEntry) -> bool {
        if entry.depth() != 1 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if let Some(glob) = &self.glob {
            if !glob.matches(&name) {
                debug!(dir = %entry.path().display(), "skipping, name does not match glob");
                return false;
            }
        }
        if !self.time.accepts_path(entry.path()) {
            debug!(dir = %entry.path().display(), "skipping, modification time filtered");
            return false;
        }
        true
    }

    /// Walk `root` depth first. Directory symlinks are never followed.
    pub fn walk(&self, ctx: &mut RunContext, root: &Path) -> WalkEnd {
        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();

        for entry in walker.into_iter().filter_entry(|e| self.descend(e)) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "cannot read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let ft = entry.file_type();

            if ft.is_dir() {
                if entry.depth() > 0 {
                    ctx.stats.dirs_visited += 1;
                }
                continue;
            }
            if ft.is_symlink() {
                info!("file \"{}\" is a symbolic link, skipping.", path.display());
                ctx.stats.files_skipped += 1;
                continue;
            }
            if is_hidden(path) {
                debug!(path = %path.display(), "hidden, skipping");
                continue;
            }
            // A zero limit stops before the first file.
            if self.limit_reached(ctx.stats.files_visited) {
                return WalkEnd::LimitReached;
            }
            ctx.stats.files_visited += 1;
            self.visit_file(ctx, path);
            if self.limit_reached(ctx.stats.files_visited) {
                return WalkEnd::LimitReached;
            }
        }
        WalkEnd::Exhausted
    }

    fn limit_reached(&self, visited: u64) -> bool {
        let reached = self.limit.is_some_and(|l| visited >= l);
        if reached {
            info!(limit = ?self.limit, "visit limit reached");
        }
        reached
    }

    fn visit_file(&self, ctx: &mut RunContext, path: &Path) {
        if !self.time.accepts_path(path) {
            debug!(path = %path.display(), "skipping, modification time filtered");
            ctx.stats.files_skipped += 1;
            return;
        }
        if !ctx.probe(path, Attrs::EXISTS | Attrs::READABLE | Attrs::FILE, Actions::NONE) {
            warn!("file \"{}\" is not a readable file, skipping.", path.display());
            ctx.stats.files_skipped += 1;
            return;
        }

        let media_type = match self.tagger.detect(path) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "cannot determine media type");
                ctx.stats.files_failed += 1;
                return;
            }
        };
        if self.do_not_parse.contains(media_type.as_str()) {
            debug!(path = %path.display(), %media_type, "not parsed");
            ctx.stats.files_skipped += 1;
            return;
        }

        let mut metadata = match self.tagger.extract(path, &media_type) {
            Ok(m) => m,
            Err(e) => {
                warn!(%media_type, error = %e, "cannot read metadata");
                ctx.stats.files_failed += 1;
                return;
            }
        };
        if !self.actionable.contains(media_type.as_str()) {
            info!("no action for \"{}\" (type {media_type}).", path.display());
            ctx.stats.files_skipped += 1;
            return;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        add_file_keys(&mut metadata, &name);
        metadata.insert(keys::MEDIA_TYPE, media_type.as_str());
        normalize(&mut metadata);
        debug!(path = %path.display(), ?metadata, "metadata");

        if let Err(e) = self
            .planner
            .plan(ctx, path, &metadata, media_type.as_str())
        {
            warn!("{e}");
            ctx.stats.files_failed += 1;
        }
    }
}
