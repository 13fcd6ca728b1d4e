//! Applies tag and cover changes across a batch of files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::domain::{cover::CoverImage, track::FieldUpdates};

use super::{codec, cover, error::LibraryError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a batch: how many files were handled and which ones failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub processed: usize,
    pub failures: Vec<Failure>,
}

impl MutationReport {
    fn record(&mut self, path: &Path, result: Result<(), LibraryError>) {
        match result {
            Ok(()) => self.processed += 1,
            Err(err) => self.fail(path, err),
        }
    }

    fn fail(&mut self, path: &Path, err: LibraryError) {
        log::warn!("{}: {err}", path.display());
        self.failures.push(Failure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        });
    }
}

/// Writes the same partial update into every file, independently.
pub fn update_fields(paths: &[PathBuf], updates: &FieldUpdates) -> MutationReport {
    let mut report = MutationReport::default();
    for path in paths {
        report.record(path, codec::write(path, updates));
    }
    report
}

/// Saves `image` as the sibling cover of the first file's directory, then
/// embeds it as the only picture of every file. The sibling cover is skipped
/// when the first file does not exist; that file is reported by the embed.
pub fn embed_cover(paths: &[PathBuf], image: &CoverImage) -> MutationReport {
    let mut report = MutationReport::default();
    let Some(first) = paths.first() else {
        return report;
    };

    if first.exists() {
        let cover_path = sibling_cover_target(first, image);
        if let Err(err) = fs::write(&cover_path, &image.data) {
            report.fail(&cover_path, LibraryError::write(&cover_path, err));
        }
    } else {
        log::warn!("{} not found, no sibling cover written", first.display());
    }

    for path in paths {
        report.record(path, codec::replace_picture(path, image));
    }
    report
}

/// Existing sibling cover to overwrite, or a new `cover.<ext>`.
fn sibling_cover_target(file: &Path, image: &CoverImage) -> PathBuf {
    let dir = file.parent().unwrap_or(Path::new("."));
    match cover::find_sibling_cover(dir) {
        Some(existing) => {
            log::info!("overwriting existing cover {}", existing.display());
            existing
        }
        None => {
            let created = dir.join(format!("cover.{}", image.file_extension()));
            log::info!("creating new cover {}", created.display());
            created
        }
    }
}
