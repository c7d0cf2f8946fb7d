use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::commit::{self, Decision, RetryPolicy, Transfer};
use super::escape::escape;
use super::metadata::MetadataRecord;
use crate::context::RunContext;
use crate::error::CommitError;
use crate::pattern::CompiledPattern;

/// What to put in place of a key the file has no value for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPolicy {
    /// The key's own name, so the gap is visible in the result.
    #[default]
    Key,
    /// Nothing.
    Empty,
}

/// A destination path plus the keys that had no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub path: PathBuf,
    pub missing: Vec<String>,
}

/// Turns metadata into destination paths and carries out the result.
pub struct Planner {
    pattern: CompiledPattern,
    dest_root: PathBuf,
    transfer: Transfer,
    missing: MissingPolicy,
    retry: RetryPolicy,
}

impl Planner {
    pub fn new(pattern: CompiledPattern, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            pattern,
            dest_root: dest_root.into(),
            transfer: Transfer::default(),
            missing: MissingPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_transfer(mut self, transfer: Transfer) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_missing_policy(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Substitute every key of the pattern and join the result onto the
    /// destination root. Present values are escaped; missing ones follow the
    /// [`MissingPolicy`].
    pub fn propose(&self, metadata: &MetadataRecord) -> Proposal {
        let mut missing = Vec::new();
        let values: HashMap<&str, String> = self
            .pattern
            .unique_keys()
            .into_iter()
            .map(|key| {
                let value = match metadata.get(key) {
                    Some(v) => escape(v),
                    None => {
                        missing.push(key.to_string());
                        match self.missing {
                            MissingPolicy::Key => key.to_string(),
                            MissingPolicy::Empty => String::new(),
                        }
                    }
                };
                (key, value)
            })
            .collect();

        let mut path = self.dest_root.clone();
        for component in self
            .pattern
            .render(|key| values.get(key).cloned().unwrap_or_default())
        {
            path.push(component);
        }
        Proposal { path, missing }
    }

    /// Decide on (and unless plan-only, perform) the move of `old` to the
    /// proposed path. Missing keys are reported on the decision line.
    pub fn decide(
        &self,
        ctx: &mut RunContext,
        old: &Path,
        proposal: &Proposal,
        media_type: &str,
    ) -> Result<Decision, CommitError> {
        commit::decide(
            ctx,
            old,
            &proposal.path,
            self.transfer,
            &self.retry,
            media_type,
            &proposal.missing,
        )
    }

    /// Propose a destination for `old`, record missing keys and decide.
    pub fn plan(
        &self,
        ctx: &mut RunContext,
        old: &Path,
        metadata: &MetadataRecord,
        media_type: &str,
    ) -> Result<Decision, CommitError> {
        let proposal = self.propose(metadata);
        ctx.stats
            .record_missing(proposal.missing.iter().map(String::as_str));
        self.decide(ctx, old, &proposal, media_type)
    }
}
