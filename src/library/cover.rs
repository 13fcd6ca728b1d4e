//! Finds cover art for a track: a conventionally named image file next to it,
//! or the first picture embedded in the file.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::cover::CoverImage;

use super::{codec, error::LibraryError};

/// Checked in this order: every extension of `cover` before any `folder` one.
pub const COVER_BASE_NAMES: &[&str] = &["cover", "folder", "front", "artwork"];
pub const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Looks for a sibling cover file, matching names case-insensitively.
pub fn find_sibling_cover(directory: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) => {
            log::debug!("cannot list {}: {err}", directory.display());
            return None;
        }
    };

    let by_lower_name: HashMap<String, PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_lowercase();
            Some((name, entry.path()))
        })
        .collect();

    COVER_BASE_NAMES
        .iter()
        .flat_map(|base| COVER_EXTENSIONS.iter().map(move |ext| format!("{base}.{ext}")))
        .find_map(|candidate| by_lower_name.get(&candidate).cloned())
}

/// Sibling cover of the file's directory, if any.
pub fn sibling_cover_of(file: &Path) -> Option<PathBuf> {
    file.parent().and_then(find_sibling_cover)
}

/// First embedded picture of the file.
pub fn embedded_cover(file: &Path) -> Result<Option<CoverImage>, LibraryError> {
    let tags = codec::parse(file)?;
    Ok(tags.pictures.first().map(|p| p.to_cover_image()))
}

/// Sibling cover file first, then the embedded picture.
pub fn resolve_cover_bytes(file: &Path) -> Result<Option<CoverImage>, LibraryError> {
    if !file.exists() {
        return Err(LibraryError::NotFound(file.to_path_buf()));
    }

    if let Some(cover_path) = sibling_cover_of(file) {
        let data = fs::read(&cover_path)?;
        return Ok(Some(CoverImage::from_file_data(&cover_path, data)));
    }

    match embedded_cover(file) {
        Ok(cover) => Ok(cover),
        Err(LibraryError::Parse { path, reason }) => {
            log::warn!("no readable tags in {}: {reason}", path.display());
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
