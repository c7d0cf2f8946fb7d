use std::{
    env,
    path::{Path, PathBuf},
};

use super::schema::Settings;
use crate::error::ConfigError;
use crate::pattern::CompiledPattern;
use crate::tagger::MediaTypeSet;
use crate::walk::TimeFilter;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then lets environment
/// variables (prefix `METARENAME__`) override it. Missing values fall back to
/// struct defaults.
impl Settings {
    /// Load settings from the resolved config path and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(resolve_config_path().as_deref())
    }

    /// Like [`Settings::load`], with an explicit config file.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("METARENAME")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Check everything that can be checked before touching the source tree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile_pattern()?;
        self.glob()?;
        self.time_filter()?;
        self.do_not_parse()?;
        if self.rename.retry.attempts == 0 {
            return Err(ConfigError::Invalid(
                "rename.retry.attempts must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn delimiter(&self) -> Result<char, ConfigError> {
        let mut chars = self.rename.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConfigError::Invalid(format!(
                "rename.delimiter must be a single character, got \"{}\"",
                self.rename.delimiter
            ))),
        }
    }

    pub fn compile_pattern(&self) -> Result<CompiledPattern, ConfigError> {
        Ok(CompiledPattern::compile(&self.rename.pattern, self.delimiter()?)?)
    }

    pub fn glob(&self) -> Result<Option<glob::Pattern>, ConfigError> {
        self.walk
            .glob
            .as_deref()
            .map(|g| {
                glob::Pattern::new(g).map_err(|source| ConfigError::Glob {
                    pattern: g.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn time_filter(&self) -> Result<TimeFilter, ConfigError> {
        TimeFilter::new(self.walk.time_op, self.walk.time.as_deref())
    }

    /// Configured do-not-parse types plus the skip list file, if any.
    pub fn do_not_parse(&self) -> Result<MediaTypeSet, ConfigError> {
        let mut set: MediaTypeSet = self.tagger.do_not_parse.iter().cloned().collect();
        if let Some(path) = &self.tagger.skip_list {
            set.extend(MediaTypeSet::load(path)?);
        }
        Ok(set)
    }

    pub fn actionable(&self) -> MediaTypeSet {
        self.tagger.actionable.iter().cloned().collect()
    }
}

/// Resolve the config path from `METARENAME_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("METARENAME_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/metarename/config.toml`, or
/// `~/.config/metarename/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("metarename").join("config.toml"))
}
