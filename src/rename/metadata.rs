use std::collections::BTreeMap;

/// Well-known metadata keys.
pub mod keys {
    pub const TITLE: &str = "title";
    pub const ARTIST: &str = "artist";
    pub const ALBUM: &str = "album";
    pub const ALBUM_ARTIST: &str = "albumArtist";
    pub const GENRE: &str = "genre";
    pub const TRACK_NUMBER: &str = "trackNumber";
    pub const RELEASE_DATE: &str = "releaseDate";
    pub const RELEASE_YEAR: &str = "releaseYear";
    pub const FILENAME: &str = "filename";
    pub const EXTENSION: &str = "extension";
    pub const MEDIA_TYPE: &str = "mediaType";
}

/// Stands in for a track number the file does not carry.
pub const MISSING_TRACK_FILLER: &str = "00";

/// Tag names mapped to values for one file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetadataRecord(BTreeMap<String, String>);

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, treating an empty string as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Add `filename` and `extension` for the file at `name`.
pub fn add_file_keys(record: &mut MetadataRecord, name: &str) {
    record.insert(keys::FILENAME, name);
    if let Some((_, ext)) = name.rsplit_once('.') {
        record.insert(keys::EXTENSION, ext);
    }
}

/// Derive and clean up fields before substitution.
pub fn normalize(record: &mut MetadataRecord) {
    clean_year(record);
    clean_track(record);
    fill_album_artist(record);
}

/// `releaseYear` from the first `-` or `/` delimited token of `releaseDate`.
fn clean_year(record: &mut MetadataRecord) {
    if record.contains(keys::RELEASE_YEAR) {
        return;
    }
    let Some(date) = record.get(keys::RELEASE_DATE) else {
        return;
    };
    let year = date
        .split_once('-')
        .or_else(|| date.split_once('/'))
        .map(|(year, _)| year)
        .unwrap_or(date)
        .trim()
        .to_string();
    record.insert(keys::RELEASE_YEAR, year);
}

/// `"1/6"` becomes `"01"`; a missing track becomes the filler.
fn clean_track(record: &mut MetadataRecord) {
    let track = match record.get(keys::TRACK_NUMBER) {
        Some(raw) => {
            let number = raw.split_once('/').map(|(n, _)| n).unwrap_or(raw).trim();
            if number.chars().count() == 1 {
                format!("0{number}")
            } else {
                number.to_string()
            }
        }
        None => MISSING_TRACK_FILLER.to_string(),
    };
    record.insert(keys::TRACK_NUMBER, track);
}

fn fill_album_artist(record: &mut MetadataRecord) {
    let album_artist = record
        .get(keys::ALBUM_ARTIST)
        .or_else(|| record.get(keys::ARTIST))
        .map(str::to_string);
    let Some(album_artist) = album_artist else {
        return;
    };
    let album_artist = match album_artist.as_str() {
        "Various Artists" | "Various artists" => "Various".to_string(),
        _ => album_artist,
    };
    record.insert(keys::ALBUM_ARTIST, album_artist);
}
