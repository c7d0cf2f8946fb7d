use std::path::Path;

use lofty::file::FileType;
use lofty::prelude::*;
use lofty::probe::Probe;

use super::{MediaType, Tagger};
use crate::error::TagError;
use crate::rename::{MetadataRecord, keys};

/// Fallback classification by extension for files lofty does not recognise.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("xml", "application/xml"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

const UNKNOWN_TYPE: &str = "application/octet-stream";

/// Reads audio tags with lofty.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagger;

impl LoftyTagger {
    pub fn new() -> Self {
        Self
    }
}

fn audio_type(file_type: &FileType) -> &'static str {
    match file_type {
        FileType::Mpeg => "audio/mpeg",
        FileType::Mp4 => "audio/mp4",
        FileType::Flac => "audio/flac",
        FileType::Opus | FileType::Vorbis | FileType::Speex => "audio/ogg",
        FileType::Aac => "audio/aac",
        FileType::Aiff => "audio/x-aiff",
        FileType::Wav => "audio/vnd.wave",
        FileType::WavPack => "audio/x-wavpack",
        FileType::Ape => "audio/ape",
        FileType::Mpc => "audio/musepack",
        _ => "audio/x-unknown",
    }
}

fn type_from_extension(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return UNKNOWN_TYPE;
    };
    let ext = ext.to_ascii_lowercase();
    EXTENSION_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, t)| *t)
        .unwrap_or(UNKNOWN_TYPE)
}

fn insert_trimmed(record: &mut MetadataRecord, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        let v = v.trim();
        if !v.is_empty() {
            record.insert(key, v);
        }
    }
}

impl Tagger for LoftyTagger {
    fn detect(&self, path: &Path) -> Result<MediaType, TagError> {
        let probe = Probe::open(path)
            .map_err(|source| TagError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .guess_file_type()
            .map_err(|source| TagError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let media_type = match probe.file_type() {
            Some(ft) => audio_type(&ft),
            None => type_from_extension(path),
        };
        Ok(MediaType::new(media_type))
    }

    fn extract(&self, path: &Path, _media_type: &MediaType) -> Result<MetadataRecord, TagError> {
        let tagged = lofty::read_from_path(path).map_err(|source| TagError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tag = tagged
            .primary_tag()
            .or_else(|| tagged.first_tag())
            .ok_or_else(|| TagError::NoTags(path.to_path_buf()))?;

        let mut record = MetadataRecord::new();
        insert_trimmed(&mut record, keys::TITLE, tag.get_string(&ItemKey::TrackTitle));
        insert_trimmed(&mut record, keys::ARTIST, tag.get_string(&ItemKey::TrackArtist));
        insert_trimmed(&mut record, keys::ALBUM, tag.get_string(&ItemKey::AlbumTitle));
        insert_trimmed(&mut record, keys::ALBUM_ARTIST, tag.get_string(&ItemKey::AlbumArtist));
        insert_trimmed(&mut record, keys::GENRE, tag.get_string(&ItemKey::Genre));
        insert_trimmed(
            &mut record,
            keys::RELEASE_DATE,
            tag.get_string(&ItemKey::RecordingDate)
                .or_else(|| tag.get_string(&ItemKey::OriginalReleaseDate)),
        );

        match (tag.track(), tag.track_total()) {
            (Some(n), Some(total)) => record.insert(keys::TRACK_NUMBER, format!("{n}/{total}")),
            (Some(n), None) => record.insert(keys::TRACK_NUMBER, n.to_string()),
            _ => {}
        }

        if record.is_empty() {
            tracing::debug!(file = %path.display(), "tag carries none of the known fields");
        } else {
            tracing::debug!(file = %path.display(), fields = record.len(), "read tags");
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plain_text_is_classified_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "just some words\n").unwrap();
        let t = LoftyTagger::new().detect(&path).unwrap();
        assert_eq!(t.as_str(), "text/plain");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(type_from_extension(Path::new("a.weird")), UNKNOWN_TYPE);
        assert_eq!(type_from_extension(Path::new("noext")), UNKNOWN_TYPE);
        assert_eq!(type_from_extension(Path::new("COVER.JPG")), "image/jpeg");
    }

    #[test]
    fn common_audio_types_map_to_mime() {
        assert_eq!(audio_type(&FileType::Mpeg), "audio/mpeg");
        assert_eq!(audio_type(&FileType::Flac), "audio/flac");
        assert_eq!(audio_type(&FileType::Vorbis), "audio/ogg");
        assert_eq!(audio_type(&FileType::Mp4), "audio/mp4");
    }

    #[test]
    fn missing_file_fails_detection() {
        let err = LoftyTagger::new()
            .detect(Path::new("/nonexistent/file.mp3"))
            .unwrap_err();
        assert!(err.to_string().contains("file.mp3"));
    }

    #[test]
    fn garbage_audio_fails_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.flac");
        fs::write(&path, b"definitely not flac").unwrap();
        let result = LoftyTagger::new().extract(&path, &MediaType::new("audio/flac"));
        assert!(result.is_err());
    }
}
