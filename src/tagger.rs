//! File classification and metadata extraction.
//!
//! The walk driver only talks to the [`Tagger`] trait. [`LoftyTagger`] is the
//! implementation used by the binary; tests substitute their own.

mod audio;
mod media_types;

pub use audio::LoftyTagger;
pub use media_types::MediaTypeSet;

use std::fmt;
use std::path::Path;

use crate::error::TagError;
use crate::rename::MetadataRecord;

/// A MIME-style media type such as `audio/mpeg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait Tagger {
    /// Classify a file without reading its tags.
    fn detect(&self, path: &Path) -> Result<MediaType, TagError>;

    /// Read the file's tags.
    fn extract(&self, path: &Path, media_type: &MediaType) -> Result<MetadataRecord, TagError>;
}
