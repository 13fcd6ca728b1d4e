use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("path {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read tags of {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("cannot write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("failed to fetch cover image: {0}")]
    Fetch(String),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),
}

impl LibraryError {
    pub fn parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
