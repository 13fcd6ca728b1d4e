use std::path::Path;

/// Cover image bytes together with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl CoverImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Guesses the MIME type of an image file from its extension.
    pub fn from_file_data(path: &Path, data: Vec<u8>) -> Self {
        let mime = mime_guess::from_path(path).first_or(mime_guess::mime::IMAGE_JPEG);
        Self::new(data, mime.essence_str())
    }

    /// Extension for a freshly created sibling cover file.
    pub fn file_extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

/// Only png and gif are special-cased, anything else is written as jpg.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/gif" => "gif",
        _ => "jpg",
    }
}
