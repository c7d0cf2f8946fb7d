use super::*;
use crate::context::RunContext;
use crate::error::TagError;
use crate::pattern::CompiledPattern;
use crate::rename::{MetadataRecord, Planner, RetryPolicy, Transfer};
use crate::runtime::logging::capture;
use crate::tagger::{MediaType, MediaTypeSet, Tagger};
use filetime::FileTime;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Classifies by extension and reads `key=value` lines as tags.
#[derive(Default)]
struct FakeTagger {
    extracted: RefCell<Vec<PathBuf>>,
}

impl Tagger for FakeTagger {
    fn detect(&self, path: &Path) -> Result<MediaType, TagError> {
        let t = match path.extension().and_then(|e| e.to_str()) {
            Some("mp3") => "audio/mpeg",
            Some("txt") => "text/plain",
            Some("jpg") => "image/jpeg",
            _ => "application/octet-stream",
        };
        Ok(MediaType::new(t))
    }

    fn extract(&self, path: &Path, _media_type: &MediaType) -> Result<MetadataRecord, TagError> {
        self.extracted.borrow_mut().push(path.to_path_buf());
        let text = fs::read_to_string(path).map_err(|source| TagError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.starts_with("corrupt") {
            return Err(TagError::NoTags(path.to_path_buf()));
        }
        Ok(text
            .lines()
            .filter_map(|l| l.split_once('='))
            .collect())
    }
}

fn driver(template: &str, dest: &Path) -> TreeWalkDriver<FakeTagger> {
    let pattern = CompiledPattern::compile(template, '/').unwrap();
    let planner = Planner::new(pattern, dest).with_retry(RetryPolicy::none());
    TreeWalkDriver::new(FakeTagger::default(), planner)
        .with_do_not_parse(["text/"].into_iter().collect())
        .with_actionable(["audio/mpeg"].into_iter().collect::<MediaTypeSet>())
}

fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

fn set_mtime(path: &Path, unix: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix, 0)).unwrap();
}

const Y1990: i64 = 631_152_000;

#[test]
fn visit_limit_stops_after_exactly_that_many_files() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    for i in 0..5 {
        write(&src.path().join(format!("{i}.mp3")), &format!("title=T{i}"));
    }

    let d = driver("title", dst.path()).with_limit(Some(3));
    let mut ctx = RunContext::new(true);
    assert_eq!(d.walk(&mut ctx, src.path()), WalkEnd::LimitReached);
    assert_eq!(ctx.stats.files_visited, 3);

    let d = driver("title", dst.path()).with_limit(Some(0));
    let mut ctx = RunContext::new(true);
    assert_eq!(d.walk(&mut ctx, src.path()), WalkEnd::LimitReached);
    assert_eq!(ctx.stats.files_visited, 0);

    let d = driver("title", dst.path());
    let mut ctx = RunContext::new(true);
    assert_eq!(d.walk(&mut ctx, src.path()), WalkEnd::Exhausted);
    assert_eq!(ctx.stats.files_visited, 5);
}

#[test]
fn nothing_is_entered_once_the_limit_is_reached() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("a.mp3"), "title=A");
    write(&src.path().join("b/c/d.mp3"), "title=D");

    // No actionable types, so only the walk itself touches directories.
    let d = driver("title", dst.path())
        .with_actionable(MediaTypeSet::default())
        .with_limit(Some(1));
    let mut ctx = RunContext::new(true);
    assert_eq!(d.walk(&mut ctx, src.path()), WalkEnd::LimitReached);
    assert_eq!(ctx.stats.files_visited, 1);
    assert_eq!(ctx.stats.dirs_visited, 0);
}

#[test]
fn limit_equal_to_the_file_count_still_reports_the_limit() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("a.mp3"), "title=A");
    write(&src.path().join("b.mp3"), "title=B");

    let d = driver("title", dst.path()).with_limit(Some(2));
    let mut ctx = RunContext::new(true);
    assert_eq!(d.walk(&mut ctx, src.path()), WalkEnd::LimitReached);
    assert_eq!(ctx.stats.files_visited, 2);
}

#[test]
fn glob_prunes_first_level_directories_only() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("rock/a.mp3"), "title=A");
    write(&src.path().join("rock/jazzy/c.mp3"), "title=C");
    write(&src.path().join("jazz/b.mp3"), "title=B");
    write(&src.path().join("top.mp3"), "title=Top");

    let glob = glob::Pattern::new("r*").unwrap();
    let d = driver("title", dst.path()).with_glob(Some(glob));
    let mut ctx = RunContext::new(false);
    d.walk(&mut ctx, src.path());

    assert_eq!(ctx.stats.files_visited, 3);
    assert!(dst.path().join("A").exists());
    assert!(dst.path().join("C").exists());
    assert!(dst.path().join("Top").exists());
    assert!(!dst.path().join("B").exists());
}

#[test]
fn time_filter_prunes_directories_and_skips_files() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("old/x.mp3"), "title=X");
    write(&src.path().join("new/y.mp3"), "title=Y");
    write(&src.path().join("z.mp3"), "title=Z");
    set_mtime(&src.path().join("old"), Y1990);
    set_mtime(&src.path().join("z.mp3"), Y1990);

    let time = TimeFilter::new(TimeOp::Gt, Some("2000-01-01")).unwrap();
    let d = driver("title", dst.path()).with_time_filter(time);
    let mut ctx = RunContext::new(false);
    d.walk(&mut ctx, src.path());

    assert_eq!(ctx.stats.files_visited, 2);
    assert_eq!(ctx.stats.files_skipped, 1);
    assert!(dst.path().join("Y").exists());
    assert!(!dst.path().join("X").exists());
    assert!(!dst.path().join("Z").exists());
}

#[test]
fn hidden_files_are_ignored_without_counting() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join(".secret.mp3"), "title=S");
    write(&src.path().join("seen.mp3"), "title=V");

    let d = driver("title", dst.path()).with_limit(Some(1));
    let mut ctx = RunContext::new(false);
    assert_eq!(d.walk(&mut ctx, src.path()), WalkEnd::LimitReached);
    assert_eq!(ctx.stats.files_visited, 1);
    assert_eq!(ctx.stats.files_skipped, 0);
    assert!(dst.path().join("V").exists());
}

#[cfg(unix)]
#[test]
fn symlinks_are_skipped_and_not_followed() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write(&outside.path().join("far.mp3"), "title=Far");
    write(&src.path().join("real.mp3"), "title=Real");
    std::os::unix::fs::symlink(outside.path().join("far.mp3"), src.path().join("link.mp3")).unwrap();
    std::os::unix::fs::symlink(outside.path(), src.path().join("linkdir")).unwrap();

    let d = driver("title", dst.path());
    let mut ctx = RunContext::new(false);
    d.walk(&mut ctx, src.path());

    assert_eq!(ctx.stats.files_visited, 1);
    assert_eq!(ctx.stats.files_skipped, 2);
    assert!(!dst.path().join("Far").exists());
    assert!(dst.path().join("Real").exists());
}

#[test]
fn do_not_parse_types_are_never_extracted() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("notes.txt"), "title=Notes");
    write(&src.path().join("cover.jpg"), "title=Cover");
    write(&src.path().join("song.mp3"), "title=Song");

    let d = driver("title", dst.path());
    let mut ctx = RunContext::new(false);
    d.walk(&mut ctx, src.path());

    let extracted = d.tagger().extracted.borrow();
    assert!(!extracted.iter().any(|p| p.ends_with("notes.txt")));
    // Parsed, but not an actionable type.
    assert!(extracted.iter().any(|p| p.ends_with("cover.jpg")));
    assert!(!dst.path().join("Cover").exists());
    assert!(dst.path().join("Song").exists());
    assert_eq!(ctx.stats.files_visited, 3);
    assert_eq!(ctx.stats.files_skipped, 2);
    assert_eq!(ctx.stats.files_created, 1);
}

#[test]
fn unreadable_tags_fail_the_file_but_not_the_walk() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("a.mp3"), "corrupt");
    write(&src.path().join("b.mp3"), "title=B");

    let d = driver("title", dst.path());
    let mut ctx = RunContext::new(false);
    assert_eq!(d.walk(&mut ctx, src.path()), WalkEnd::Exhausted);
    assert_eq!(ctx.stats.files_failed, 1);
    assert!(dst.path().join("B").exists());
}

#[test]
fn metadata_is_normalized_before_planning() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let old = src.path().join("disc/track.mp3");
    write(
        &old,
        "artist=Sly\ntitle=Song\ntrackNumber=3/10\nreleaseDate=1970-05-01\n",
    );

    let template = "albumArtist/releaseYear - trackNumber - title.extension";
    let pattern = CompiledPattern::compile(template, '/').unwrap();
    let planner = Planner::new(pattern, dst.path())
        .with_retry(RetryPolicy::none())
        .with_transfer(Transfer::Move);
    let d = TreeWalkDriver::new(FakeTagger::default(), planner)
        .with_actionable(["audio/"].into_iter().collect());
    let mut ctx = RunContext::new(false);
    d.walk(&mut ctx, src.path());

    let expected = dst.path().join("Sly").join("1970 - 03 - Song.mp3");
    assert!(expected.exists());
    assert!(!old.exists());
    assert_eq!(ctx.stats.files_renamed, 1);
    assert_eq!(ctx.stats.files_missing, 0);
}

#[test]
fn duplicate_destinations_collide_after_the_first() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("a.mp3"), "title=Same");
    write(&src.path().join("b.mp3"), "title=Same");

    let d = driver("title", dst.path());
    let mut ctx = RunContext::new(false);
    d.walk(&mut ctx, src.path());

    assert_eq!(ctx.stats.files_created, 1);
    assert_eq!(ctx.stats.files_collided, 1);
    assert_eq!(fs::read_to_string(dst.path().join("Same")).unwrap(), "title=Same");
}

#[test]
fn subdirectories_count_as_visited() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("a/b/c.mp3"), "title=C");
    fs::create_dir_all(src.path().join("empty")).unwrap();

    let d = driver("title", dst.path()).with_actionable(MediaTypeSet::default());
    let mut ctx = RunContext::new(true);
    d.walk(&mut ctx, src.path());
    assert_eq!(ctx.stats.dirs_visited, 3);
}

#[test]
fn normalized_metadata_is_logged_at_debug() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    write(&src.path().join("a.mp3"), "title=Song\ntrackNumber=7/12\n");

    let d = driver("title", dst.path());
    let mut ctx = RunContext::new(true);
    let (_, text) = capture(tracing::Level::DEBUG, || d.walk(&mut ctx, src.path()));

    let line = text.lines().find(|l| l.contains("metadata=")).unwrap();
    assert!(line.contains(r#""trackNumber": "07""#), "{line}");
    assert!(line.contains(r#""mediaType": "audio/mpeg""#), "{line}");
    assert!(line.contains(r#""title": "Song""#), "{line}");
}
