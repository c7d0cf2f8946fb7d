use crate::cli::Args;
use crate::config;
use crate::error::ConfigError;

/// Config file and environment first, then the command line on top.
///
/// A config file that is present but does not parse is fatal.
pub fn load_settings(args: &Args) -> Result<config::Settings, ConfigError> {
    let mut settings = match &args.config {
        Some(path) => config::Settings::load_from(Some(path.as_path()))?,
        None => config::Settings::load()?,
    };
    args.apply_to(&mut settings);
    settings.validate()?;
    Ok(settings)
}
