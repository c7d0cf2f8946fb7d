//! State owned by one run: the path cache and the counters.

use std::path::Path;

use crate::probe::{Actions, Attrs, PathProbe, action_prefix};
use crate::stats::RunStatistics;

pub struct RunContext {
    pub probe: PathProbe,
    pub stats: RunStatistics,
}

impl RunContext {
    pub fn new(dry_run: bool) -> Self {
        Self {
            probe: PathProbe::new(dry_run),
            stats: RunStatistics::default(),
        }
    }

    pub fn with_caching(mut self, caching: bool) -> Self {
        self.probe = self.probe.with_caching(caching);
        self
    }

    pub fn dry_run(&self) -> bool {
        self.probe.dry_run()
    }

    pub fn prefix(&self) -> &'static str {
        action_prefix(self.dry_run())
    }

    pub fn probe(&mut self, path: impl AsRef<Path>, attrs: Attrs, actions: Actions) -> bool {
        self.probe.probe(&mut self.stats, path, attrs, actions)
    }

    pub fn probe_str(&mut self, path: &str, attrs: Attrs, actions: Actions) -> bool {
        self.probe.probe_str(&mut self.stats, path, attrs, actions)
    }
}
