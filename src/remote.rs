//! Fetches cover images from remote locations.

use std::{io::Read, time::Duration};

use crate::{domain::cover::CoverImage, library::error::LibraryError};

/// Declared content type used when the server sends none.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Upper bound for a downloaded image.
const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// Source of cover image bytes for a URL
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<CoverImage, LibraryError>;
}

pub struct HttpImageFetcher {
    agent: ureq::Agent,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self { agent }
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<CoverImage, LibraryError> {
        log::info!("downloading cover image from {url}");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| LibraryError::Fetch(e.to_string()))?;

        let mime_type = content_type_or_default(response.header("Content-Type"));

        let data = read_capped(response.into_reader(), MAX_IMAGE_BYTES)?;
        if data.is_empty() {
            return Err(LibraryError::Fetch(format!("{url} returned no data")));
        }
        Ok(CoverImage::new(data, mime_type))
    }
}

/// Reads the whole body, failing instead of truncating when it exceeds `limit`.
fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, LibraryError> {
    let mut data = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut data)
        .map_err(|e| LibraryError::Fetch(e.to_string()))?;

    if data.len() as u64 > limit {
        return Err(LibraryError::Fetch(format!(
            "image exceeds {} MiB",
            limit / (1024 * 1024)
        )));
    }
    Ok(data)
}

/// Strips parameters such as `; charset=...` from a Content-Type header.
fn content_type_or_default(header: Option<&str>) -> String {
    header
        .and_then(|h| h.split(';').next())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_ascii_lowercase()
}
