use std::path::{Path, PathBuf};

use crate::{
    config::LibraryConfig,
    domain::{album::Album, cover::CoverImage, track::FieldUpdates},
    remote::ImageFetcher,
};

use super::{
    cover,
    error::LibraryError,
    mutate::{self, MutationReport},
    scan,
};

/// Entry point for callers of the tag engine.
///
/// Holds nothing but settings: every call reads the files it needs from
/// disk, so a `Library` can be built per request or shared freely.
#[derive(Debug, Clone, Default)]
pub struct Library {
    follow_symlinks: bool,
}

impl Library {
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            follow_symlinks: config.follow_symlinks,
        }
    }

    /// Albums found under `root`. Fails with `NotFound` if `root` does not exist.
    pub fn scan(&self, root: &Path) -> Result<Vec<Album>, LibraryError> {
        scan::scan(root, self.follow_symlinks)
    }

    /// Albums made of exactly the given files.
    pub fn albums_from_paths(&self, paths: &[PathBuf]) -> Vec<Album> {
        scan::albums_from_paths(paths)
    }

    /// Cover for a file: sibling cover file first, embedded picture second.
    pub fn get_cover_bytes(&self, file: &Path) -> Result<Option<CoverImage>, LibraryError> {
        cover::resolve_cover_bytes(file)
    }

    pub fn embed_cover(&self, paths: &[PathBuf], image: &CoverImage) -> MutationReport {
        mutate::embed_cover(paths, image)
    }

    /// Downloads the image first. Nothing is touched on disk if that fails.
    pub fn embed_cover_from_url(
        &self,
        paths: &[PathBuf],
        url: &str,
        fetcher: &dyn ImageFetcher,
    ) -> Result<MutationReport, LibraryError> {
        let image = fetcher.fetch(url)?;
        Ok(self.embed_cover(paths, &image))
    }

    pub fn update_fields(&self, paths: &[PathBuf], updates: &FieldUpdates) -> MutationReport {
        mutate::update_fields(paths, updates)
    }
}
