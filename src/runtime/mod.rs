use tracing::{debug, info};

use crate::cli::Args;
use crate::config::Settings;
use crate::context::RunContext;
use crate::error::ConfigError;
use crate::probe::{Actions, Attrs};
use crate::rename::Planner;
use crate::stats::RunStatistics;
use crate::tagger::{LoftyTagger, Tagger};
use crate::walk::{TreeWalkDriver, WalkEnd};

pub(crate) mod logging;
mod settings;

pub fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings(&args)?;
    logging::init(settings.log.level);

    let stats = execute(&settings, LoftyTagger::new())?;
    if !settings.log.quiet {
        println!("{stats}");
    }
    Ok(())
}

/// Check the roots, then walk the source tree once.
pub fn execute<T: Tagger>(settings: &Settings, tagger: T) -> Result<RunStatistics, ConfigError> {
    let pattern = settings.compile_pattern()?;
    let mut ctx =
        RunContext::new(settings.rename.dry_run).with_caching(settings.walk.cache_paths);

    if ctx.dry_run() {
        info!("running in test mode");
    }
    debug!(
        pattern = pattern.raw(),
        delimiter = %pattern.delimiter(),
        segments = pattern.segments().len(),
        keys = ?pattern.keys(),
        "compiled pattern"
    );

    let source = settings.rename.source.as_path();
    let want = Attrs::EXISTS | Attrs::READABLE | Attrs::DIRECTORY;
    // An empty source is refused, not read as the working directory.
    let source_ok = match source.to_str() {
        Some(s) => ctx.probe_str(s, want, Actions::NONE),
        None => ctx.probe(source, want, Actions::NONE),
    };
    if !source_ok {
        return Err(ConfigError::Source(source.to_path_buf()));
    }

    let dest = settings.rename.destination();
    let dest_ok = ctx.probe(
        dest,
        Attrs::EXISTS | Attrs::READABLE | Attrs::WRITABLE | Attrs::DIRECTORY,
        Actions::CREATE,
    );
    // A plan-only run may target a destination that does not exist yet.
    let created_later = ctx.dry_run() && !ctx.probe(dest, Attrs::EXISTS, Actions::NONE);
    if !dest_ok && !created_later {
        return Err(ConfigError::Destination(dest.to_path_buf()));
    }

    let planner = Planner::new(pattern, dest)
        .with_transfer(settings.rename.transfer)
        .with_missing_policy(settings.rename.missing)
        .with_retry(settings.rename.retry);
    let driver = TreeWalkDriver::new(tagger, planner)
        .with_glob(settings.glob()?)
        .with_time_filter(settings.time_filter()?)
        .with_limit(settings.walk.limit)
        .with_do_not_parse(settings.do_not_parse()?)
        .with_actionable(settings.actionable());

    info!(
        source = %source.display(),
        destination = %dest.display(),
        transfer = ?settings.rename.transfer,
        "starting walk"
    );
    match driver.walk(&mut ctx, source) {
        WalkEnd::Exhausted => debug!("source tree exhausted"),
        WalkEnd::LimitReached => info!("files visited limit reached"),
    }
    debug!(queries = ctx.probe.queries(), "path probes");
    Ok(ctx.stats)
}
