use std::{collections::BTreeMap, fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize, Serializer};

/// Ordinal given to tracks whose number is missing or unparsable.
pub const TRACK_NUMBER_SENTINEL: u32 = 999;

/// Represent a music track, derived fresh from one file on every scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Track {
    pub path: PathBuf,
    #[serde(serialize_with = "or_empty")]
    pub title: Option<String>,
    #[serde(serialize_with = "or_empty")]
    pub artist: Option<String>,
    #[serde(serialize_with = "or_empty")]
    pub album_artist: Option<String>,
    #[serde(serialize_with = "or_empty")]
    pub album: Option<String>,
    #[serde(serialize_with = "or_empty")]
    pub year: Option<String>,
    #[serde(serialize_with = "or_empty")]
    pub genre: Option<String>,
    #[serde(serialize_with = "or_empty")]
    pub composer: Option<String>,
    #[serde(serialize_with = "or_empty")]
    pub track_number: Option<String>,
    /// Embedded picture only, sibling cover files are not considered.
    pub has_cover: bool,
}

impl Track {
    /// Album artist when set, otherwise the track artist.
    pub fn effective_artist(&self) -> &str {
        self.album_artist
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .or(self.artist.as_deref())
            .unwrap_or_default()
    }

    pub fn ordinal(&self) -> u32 {
        parse_track_number(self.track_number.as_deref())
    }
}

/// "3/12" -> 3. Missing, empty or non-numeric values map to [`TRACK_NUMBER_SENTINEL`].
pub fn parse_track_number(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.split('/').next())
        .and_then(|n| n.trim().parse::<u32>().ok())
        .unwrap_or(TRACK_NUMBER_SENTINEL)
}

fn or_empty<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

/// Tag fields that can be read and rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Title,
    Artist,
    AlbumArtist,
    Album,
    Year,
    Genre,
    Composer,
    TrackNumber,
}

impl FieldName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Title => "title",
            FieldName::Artist => "artist",
            FieldName::AlbumArtist => "album_artist",
            FieldName::Album => "album",
            FieldName::Year => "year",
            FieldName::Genre => "genre",
            FieldName::Composer => "composer",
            FieldName::TrackNumber => "track_number",
        }
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial update: fields missing from the map are left untouched on disk.
pub type FieldUpdates = BTreeMap<FieldName, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_before_slash() {
        assert_eq!(parse_track_number(Some("3/12")), 3);
        assert_eq!(parse_track_number(Some(" 7 ")), 7);
    }

    #[test]
    fn missing_or_garbage_number_is_sentinel() {
        assert_eq!(parse_track_number(None), TRACK_NUMBER_SENTINEL);
        assert_eq!(parse_track_number(Some("")), TRACK_NUMBER_SENTINEL);
        assert_eq!(parse_track_number(Some("abc")), TRACK_NUMBER_SENTINEL);
        assert_eq!(parse_track_number(Some("/12")), TRACK_NUMBER_SENTINEL);
    }

    #[test]
    fn effective_artist_prefers_album_artist() {
        let mut track = Track {
            artist: Some("Soloist".into()),
            album_artist: Some("Orchestra".into()),
            ..Default::default()
        };
        assert_eq!(track.effective_artist(), "Orchestra");

        track.album_artist = Some("  ".into());
        assert_eq!(track.effective_artist(), "Soloist");

        track.album_artist = None;
        track.artist = None;
        assert_eq!(track.effective_artist(), "");
    }

    #[test]
    fn absent_fields_serialize_as_empty_strings() -> anyhow::Result<()> {
        let track = Track {
            path: PathBuf::from("/music/a.flac"),
            title: Some("Air".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&track)?;
        assert_eq!(json["title"], "Air");
        assert_eq!(json["genre"], "");
        assert_eq!(json["track_number"], "");
        assert_eq!(json["has_cover"], false);
        Ok(())
    }
}
