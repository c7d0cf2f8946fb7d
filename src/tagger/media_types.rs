use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// A set of media types. Entries ending in `/` match every type with that
/// prefix (`text/` matches `text/plain`); others match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTypeSet {
    entries: Vec<String>,
}

impl MediaTypeSet {
    /// Read one entry per line. Blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::SkipList {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect()
    }

    /// Case-insensitive; surrounding whitespace is ignored.
    pub fn contains(&self, media_type: &str) -> bool {
        let media_type = media_type.trim().to_ascii_lowercase();
        self.entries.iter().any(|e| {
            if e.ends_with('/') {
                media_type.starts_with(e.as_str())
            } else {
                *e == media_type
            }
        })
    }

    pub fn extend(&mut self, other: MediaTypeSet) {
        for e in other.entries {
            if !self.entries.contains(&e) {
                self.entries.push(e);
            }
        }
    }
}

impl<S: Into<String>> FromIterator<S> for MediaTypeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        for e in iter {
            let e = e.into().trim().to_ascii_lowercase();
            if !e.is_empty() && !set.entries.contains(&e) {
                set.entries.push(e);
            }
        }
        set
    }
}
