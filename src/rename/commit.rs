use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use filetime::FileTime;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::error::CommitError;
use crate::probe::{Actions, Attrs};

/// What happens to the source file once its destination is known.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transfer {
    #[default]
    Copy,
    #[serde(alias = "rename")]
    Move,
}

/// Outcome of planning one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Source already sits at its proposed path.
    NoOp,
    /// Proposed path is taken by another file.
    Collision(PathBuf),
    /// Copied (or would be) to the proposed path.
    Create(PathBuf),
    /// Moved (or would be) to the proposed path.
    Rename(PathBuf),
}

/// Bounded retry with exponential backoff for transient commit failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub attempts: u32,
    /// Delay before the second try; doubled for each later one.
    #[serde(rename = "initial_delay_ms", with = "millis")]
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            attempts: 1,
            initial_delay: Duration::ZERO,
        }
    }

    pub fn run<T>(&self, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.attempts && is_transient(&e) => {
                    warn!(attempt, error = %e, "transient failure, retrying in {delay:?}");
                    thread::sleep(delay);
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

fn is_transient(e: &io::Error) -> bool {
    !matches!(
        e.kind(),
        ErrorKind::AlreadyExists
            | ErrorKind::NotFound
            | ErrorKind::PermissionDenied
            | ErrorKind::InvalidInput
            | ErrorKind::Unsupported
    )
}

/// Decide what to do with `old` given its `proposed` path, and do it unless
/// the run is plan-only.
pub(super) fn decide(
    ctx: &mut RunContext,
    old: &Path,
    proposed: &Path,
    transfer: Transfer,
    retry: &RetryPolicy,
    media_type: &str,
    missing: &[String],
) -> Result<Decision, CommitError> {
    if same_path(old, proposed) {
        debug!(path = %old.display(), "already in place");
        return Ok(Decision::NoOp);
    }

    if ctx.probe(proposed, Attrs::EXISTS, Actions::NONE) {
        if missing.is_empty() {
            info!("file \"{}\" exists.", proposed.display());
        } else {
            info!(?missing, "file \"{}\" exists.", proposed.display());
        }
        ctx.stats.files_collided += 1;
        return Ok(Decision::Collision(proposed.to_path_buf()));
    }

    if let Some(parent) = proposed.parent().filter(|p| !p.as_os_str().is_empty()) {
        let ready = ctx.probe(
            parent,
            Attrs::EXISTS | Attrs::READABLE | Attrs::WRITABLE | Attrs::DIRECTORY,
            Actions::CREATE,
        );
        if !ready {
            let blocked = ctx.probe(parent, Attrs::EXISTS, Actions::NONE)
                && !ctx.probe(parent, Attrs::DIRECTORY, Actions::NONE);
            if blocked {
                ctx.stats.dirs_collided += 1;
            }
            if blocked || !ctx.dry_run() {
                return Err(CommitError::ParentUnavailable {
                    to: proposed.to_path_buf(),
                    media_type: media_type.to_string(),
                });
            }
        }
    }

    let (verb, decision) = match transfer {
        Transfer::Copy => ("copy", Decision::Create(proposed.to_path_buf())),
        Transfer::Move => ("rename", Decision::Rename(proposed.to_path_buf())),
    };
    let line = format!(
        "{}{verb} \"{}\" to \"{}\".",
        ctx.prefix(),
        old.display(),
        proposed.display()
    );
    if missing.is_empty() {
        info!("{line}");
    } else {
        info!(?missing, "{line}");
    }

    if ctx.dry_run() {
        // Later files proposing the same name must see this one.
        ctx.probe.assume(proposed, Attrs::EXISTS | Attrs::FILE);
        return Ok(decision);
    }

    let result = retry.run(|| match transfer {
        Transfer::Copy => copy_no_clobber(old, proposed),
        Transfer::Move => move_no_clobber(old, proposed),
    });
    match result {
        Ok(()) => {
            match transfer {
                Transfer::Copy => ctx.stats.files_created += 1,
                Transfer::Move => {
                    ctx.stats.files_renamed += 1;
                    ctx.probe.forget(old);
                }
            }
            ctx.probe.forget(proposed);
            Ok(decision)
        }
        // Someone got there between the check and the commit.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("file \"{}\" exists.", proposed.display());
            ctx.stats.files_collided += 1;
            ctx.probe.forget(proposed);
            Ok(Decision::Collision(proposed.to_path_buf()))
        }
        Err(source) => Err(CommitError::Transfer {
            verb,
            from: old.to_path_buf(),
            to: proposed.to_path_buf(),
            media_type: media_type.to_string(),
            source,
        }),
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

/// Copy contents, permissions and timestamps. Fails with `AlreadyExists`
/// rather than overwrite, and leaves nothing behind on failure.
fn copy_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    let mut src = File::open(from)?;
    let meta = src.metadata()?;
    let mut dst = OpenOptions::new().write(true).create_new(true).open(to)?;

    let copied = io::copy(&mut src, &mut dst).and_then(|_| dst.sync_all());
    drop(dst);
    let finished = copied
        .and_then(|()| {
            filetime::set_file_times(
                to,
                FileTime::from_last_access_time(&meta),
                FileTime::from_last_modification_time(&meta),
            )
        })
        .and_then(|()| fs::set_permissions(to, meta.permissions()));

    if let Err(e) = finished {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

/// Hard-link then unlink, which never replaces an existing destination.
/// Falls back to copy and delete when linking is not possible (for example
/// across devices).
fn move_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(e),
        Err(e) => {
            debug!(error = %e, "hard link failed, copying instead");
            copy_no_clobber(from, to)?;
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_gives_up_after_bounded_attempts() {
        let policy = RetryPolicy {
            attempts: 3,
            initial_delay: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let result: io::Result<()> = policy.run(|| {
            calls.set(calls.get() + 1);
            Err(io::Error::other("busy"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn retry_stops_on_permanent_errors() {
        let policy = RetryPolicy {
            attempts: 5,
            initial_delay: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let result: io::Result<()> = policy.run(|| {
            calls.set(calls.get() + 1);
            Err(io::Error::from(ErrorKind::AlreadyExists))
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::AlreadyExists);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retry_returns_first_success() {
        let policy = RetryPolicy {
            attempts: 3,
            initial_delay: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let result = policy.run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(io::Error::other("in use"))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn copy_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("b");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();

        let err = copy_no_clobber(&from, &to).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&to).unwrap(), b"old");
    }

    #[test]
    fn copy_preserves_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("b");
        fs::write(&from, b"data").unwrap();
        let stamp = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&from, stamp).unwrap();

        copy_no_clobber(&from, &to).unwrap();
        let meta = fs::metadata(&to).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), stamp);
        assert_eq!(fs::read(&to).unwrap(), b"data");
        assert!(from.exists());
    }

    #[test]
    fn move_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("b");
        fs::write(&from, b"data").unwrap();

        move_no_clobber(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"data");
    }
}
