//! Module to scan music directories and group their tracks into albums

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::domain::{album::Album, hash::AlbumId, track::Track};

use super::{codec, error::LibraryError};

/// Recursively lists FLAC files under `root`, in file-name order per directory.
pub fn find_flac_files(root: &Path, follow_symlinks: bool) -> Vec<PathBuf> {
    let root_str = root.to_string_lossy();

    WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("error while scanning dir {root_str}, skipping an entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| codec::is_flac_file(path))
        .collect()
}

/// Reads one track, `None` when the file cannot be parsed.
pub fn read_track(path: &Path) -> Option<Track> {
    match codec::parse(path) {
        Ok(tags) => Some(tags.into_track(path.to_path_buf())),
        Err(err) => {
            log::warn!("skipping {}: {err}", path.display());
            None
        }
    }
}

/// Groups tracks by album identity, keeping the order albums were first seen.
#[derive(Debug, Default)]
pub struct AlbumAggregator {
    index: HashMap<AlbumId, usize>,
    albums: Vec<Album>,
}

impl AlbumAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, track: Track) {
        let id = AlbumId::from_parts(
            track.effective_artist(),
            track.album.as_deref().unwrap_or_default(),
        );
        match self.index.get(&id) {
            Some(&i) => self.albums[i].push(track),
            None => {
                self.index.insert(id, self.albums.len());
                self.albums.push(Album::from_first_track(id, track));
            }
        }
    }

    pub fn finish(mut self) -> Vec<Album> {
        for album in &mut self.albums {
            album.finalize();
        }
        self.albums
    }
}

/// Parses every given file and aggregates the readable ones.
pub fn aggregate<I>(paths: I) -> Vec<Album>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut aggregator = AlbumAggregator::new();
    for path in paths {
        log::debug!("reading {}", path.display());
        if let Some(track) = read_track(&path) {
            aggregator.add(track);
        }
    }
    aggregator.finish()
}

/// Walks `root` and returns its albums. An existing root without music yields
/// an empty list.
pub fn scan(root: &Path, follow_symlinks: bool) -> Result<Vec<Album>, LibraryError> {
    if !root.exists() {
        return Err(LibraryError::NotFound(root.to_path_buf()));
    }

    let files = find_flac_files(root, follow_symlinks);
    let file_count = files.len();
    let albums = aggregate(files);

    log::info!(
        "scanned {}: {} files, {} albums",
        root.display(),
        file_count,
        albums.len()
    );
    Ok(albums)
}

/// Aggregates an explicit list of files. Missing and non-FLAC paths are skipped.
pub fn albums_from_paths(paths: &[PathBuf]) -> Vec<Album> {
    aggregate(
        paths
            .iter()
            .filter(|p| p.exists() && codec::is_flac_file(p))
            .cloned(),
    )
}
