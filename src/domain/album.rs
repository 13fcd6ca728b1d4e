use std::path::PathBuf;

use serde::Serialize;

use super::{hash::AlbumId, track::Track};

/// Represent an album: tracks grouped by effective artist and album title
#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub year: String,
    pub genre: String,
    pub composer: String,
    /// First file seen for this album, handy for cover lookups.
    pub sample_path: PathBuf,
    pub tracks: Vec<Track>,
    pub track_count: usize,
    pub has_cover: bool,
}

impl Album {
    /// Starts a new album from the first track seen for it.
    pub fn from_first_track(id: AlbumId, track: Track) -> Self {
        let mut album = Self {
            id,
            title: track.album.clone().unwrap_or_default(),
            artist: track.effective_artist().to_string(),
            year: String::new(),
            genre: String::new(),
            composer: String::new(),
            sample_path: track.path.clone(),
            tracks: Vec::new(),
            track_count: 0,
            has_cover: false,
        };
        album.push(track);
        album
    }

    /// Adds a track. Album-level year, genre and composer keep the first
    /// non-empty value seen.
    pub fn push(&mut self, track: Track) {
        fill_if_empty(&mut self.year, track.year.as_deref());
        fill_if_empty(&mut self.genre, track.genre.as_deref());
        fill_if_empty(&mut self.composer, track.composer.as_deref());
        self.has_cover |= track.has_cover;
        self.tracks.push(track);
    }

    /// Stable sort by track number, then fix up the count.
    pub fn finalize(&mut self) {
        self.tracks.sort_by_key(Track::ordinal);
        self.track_count = self.tracks.len();
    }
}

fn fill_if_empty(slot: &mut String, value: Option<&str>) {
    if !slot.is_empty() {
        return;
    }
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        *slot = v.to_string();
    }
}
