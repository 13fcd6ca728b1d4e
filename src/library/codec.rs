//! Reads and rewrites the metadata blocks of a FLAC file.
//!
//! Only the VORBIS_COMMENT fields and PICTURE blocks are touched. Every write
//! goes to a temporary copy next to the original which is then renamed over
//! it, so a failed write leaves the original file as it was.

use std::{
    fs::{self, File, Permissions},
    path::{Path, PathBuf},
};

use lofty::{
    config::{ParseOptions, ParsingMode, WriteOptions},
    file::AudioFile,
    flac::FlacFile,
    ogg::{OggPictureStorage, VorbisComments},
    picture::{MimeType, Picture, PictureInformation, PictureType},
};
use tempfile::NamedTempFile;

use crate::domain::{
    cover::CoverImage,
    track::{FieldName, FieldUpdates, Track},
};

use super::error::LibraryError;

/// Picture type code of a front cover.
pub const FRONT_COVER: u8 = 3;

/// Description stored with replacement pictures.
pub const COVER_DESCRIPTION: &str = "Cover";

const FLAC_EXTENSION: &str = "flac";

/// Comments holding the total next to a bare track number.
const TRACK_TOTAL_KEYS: &[&str] = &["TRACKTOTAL", "TOTALTRACKS"];

/// Fields and pictures parsed from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub composer: Option<String>,
    pub track_number: Option<String>,
    /// In file order. Callers wanting "the" cover use the first one.
    pub pictures: Vec<EmbeddedPicture>,
}

impl TagSet {
    pub fn into_track(self, path: PathBuf) -> Track {
        Track {
            path,
            has_cover: !self.pictures.is_empty(),
            title: self.title,
            artist: self.artist,
            album_artist: self.album_artist,
            album: self.album,
            year: self.year,
            genre: self.genre,
            composer: self.composer,
            track_number: self.track_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    pub picture_type: u8,
    pub mime_type: String,
    pub description: String,
    pub data: Vec<u8>,
}

impl EmbeddedPicture {
    pub fn to_cover_image(&self) -> CoverImage {
        CoverImage::new(self.data.clone(), self.mime_type.clone())
    }
}

pub fn is_flac_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(FLAC_EXTENSION))
        .unwrap_or(false)
}

fn vorbis_key(field: FieldName) -> &'static str {
    match field {
        FieldName::Title => "TITLE",
        FieldName::Artist => "ARTIST",
        FieldName::AlbumArtist => "ALBUMARTIST",
        FieldName::Album => "ALBUM",
        FieldName::Year => "DATE",
        FieldName::Genre => "GENRE",
        FieldName::Composer => "COMPOSER",
        FieldName::TrackNumber => "TRACKNUMBER",
    }
}

fn parse_options() -> ParseOptions {
    ParseOptions::new().parsing_mode(ParsingMode::BestAttempt)
}

fn read_flac(path: &Path) -> Result<FlacFile, LibraryError> {
    if !path.exists() {
        return Err(LibraryError::NotFound(path.to_path_buf()));
    }
    let mut file = File::open(path)?;
    <FlacFile as AudioFile>::read_from(&mut file, parse_options())
        .map_err(|e| LibraryError::parse(path, e))
}

/// First value stored under `key`, keys compared case-insensitively.
fn first_value<'a>(comments: &'a VorbisComments, key: &str) -> Option<&'a str> {
    comments
        .items()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Reads the first value of every known field and all embedded pictures.
pub fn parse(path: &Path) -> Result<TagSet, LibraryError> {
    let flac_file = read_flac(path)?;
    let pictures = flac_file
        .pictures()
        .iter()
        .map(|(picture, _)| embedded_picture(picture))
        .collect();

    let Some(comments) = flac_file.vorbis_comments() else {
        return Ok(TagSet {
            pictures,
            ..TagSet::default()
        });
    };
    let get = |field: FieldName| first_value(comments, vorbis_key(field)).map(str::to_string);

    Ok(TagSet {
        title: get(FieldName::Title),
        artist: get(FieldName::Artist),
        album_artist: get(FieldName::AlbumArtist),
        album: get(FieldName::Album),
        year: get(FieldName::Year),
        genre: get(FieldName::Genre),
        composer: get(FieldName::Composer),
        track_number: track_number(comments),
        pictures,
    })
}

/// Keeps the "n/total" shape when the total is stored separately.
fn track_number(comments: &VorbisComments) -> Option<String> {
    let number = first_value(comments, vorbis_key(FieldName::TrackNumber))?;
    if number.contains('/') {
        return Some(number.to_string());
    }
    let total = TRACK_TOTAL_KEYS
        .iter()
        .find_map(|key| first_value(comments, key))
        .filter(|total| !total.trim().is_empty());
    match total {
        Some(total) => Some(format!("{number}/{total}")),
        None => Some(number.to_string()),
    }
}

fn embedded_picture(picture: &Picture) -> EmbeddedPicture {
    EmbeddedPicture {
        picture_type: picture.pic_type().as_u8(),
        mime_type: picture
            .mime_type()
            .map(mime_to_string)
            .unwrap_or_default(),
        description: picture.description().unwrap_or_default().to_string(),
        data: picture.data().to_vec(),
    }
}

fn mime_to_string(mime: &MimeType) -> String {
    match mime {
        MimeType::Png => "image/png".to_string(),
        MimeType::Jpeg => "image/jpeg".to_string(),
        MimeType::Tiff => "image/tiff".to_string(),
        MimeType::Bmp => "image/bmp".to_string(),
        MimeType::Gif => "image/gif".to_string(),
        MimeType::Unknown(other) => other.clone(),
        _ => mime.as_str().to_string(),
    }
}

fn mime_from_str(mime_type: &str) -> MimeType {
    match mime_type {
        "image/png" => MimeType::Png,
        "image/jpeg" | "image/jpg" => MimeType::Jpeg,
        "image/tiff" => MimeType::Tiff,
        "image/bmp" => MimeType::Bmp,
        "image/gif" => MimeType::Gif,
        other => MimeType::Unknown(other.to_string()),
    }
}

/// Applies a partial update: only the fields present in `updates` change.
///
/// The file is checked even when `updates` is empty, so a file that could
/// not be written is always reported.
pub fn write(path: &Path, updates: &FieldUpdates) -> Result<(), LibraryError> {
    let (mut flac_file, permissions) = open_for_rewrite(path)?;
    if updates.is_empty() {
        return Ok(());
    }

    let comments = flac_file
        .vorbis_comments_mut()
        .map(std::mem::take)
        .unwrap_or_default();
    flac_file.set_vorbis_comments(apply_updates(comments, updates));

    commit(path, &flac_file, permissions)
}

/// Rebuilds the comment list in order, with the vendor string as it was.
/// Every value of an updated key is replaced, all other comments are kept.
fn apply_updates(comments: VorbisComments, updates: &FieldUpdates) -> VorbisComments {
    let clears_total = updates.contains_key(&FieldName::TrackNumber);
    let replaced: Vec<&str> = updates
        .keys()
        .map(|field| vorbis_key(*field))
        .chain(TRACK_TOTAL_KEYS.iter().copied().filter(|_| clears_total))
        .collect();

    let mut updated = VorbisComments::default();
    updated.set_vendor(comments.vendor().to_string());
    for (key, value) in comments.items() {
        if !replaced.iter().any(|r| r.eq_ignore_ascii_case(key)) {
            updated.push(key.to_string(), value.to_string());
        }
    }
    for (field, value) in updates {
        updated.push(vorbis_key(*field).to_string(), value.clone());
    }
    updated
}

/// Drops every embedded picture and stores `image` as the only front cover.
pub fn replace_picture(path: &Path, image: &CoverImage) -> Result<(), LibraryError> {
    let (mut flac_file, permissions) = open_for_rewrite(path)?;

    let existing: Vec<PictureType> = flac_file
        .pictures()
        .iter()
        .map(|(picture, _)| picture.pic_type())
        .collect();
    for pic_type in existing {
        flac_file.remove_picture_type(pic_type);
    }

    let picture = Picture::new_unchecked(
        PictureType::from_u8(FRONT_COVER),
        Some(mime_from_str(&image.mime_type)),
        Some(COVER_DESCRIPTION.to_string()),
        image.data.clone(),
    );
    let info = PictureInformation::from_picture(&picture).unwrap_or_default();
    flac_file
        .insert_picture(picture, Some(info))
        .map_err(|e| LibraryError::write(path, e))?;

    commit(path, &flac_file, permissions)
}

/// Reads the file and checks it may be replaced.
fn open_for_rewrite(path: &Path) -> Result<(FlacFile, Permissions), LibraryError> {
    let flac_file = read_flac(path)?;
    let permissions = fs::metadata(path)?.permissions();
    if permissions.readonly() {
        return Err(LibraryError::write(path, "file is read-only"));
    }
    Ok((flac_file, permissions))
}

/// Saves into a copy beside `path`, then renames the copy over it.
fn commit(path: &Path, flac_file: &FlacFile, permissions: Permissions) -> Result<(), LibraryError> {
    let temp = copy_beside(path).map_err(|e| LibraryError::write(path, e))?;
    flac_file
        .save_to_path(temp.path(), WriteOptions::default())
        .map_err(|e| LibraryError::write(path, e))?;
    fs::set_permissions(temp.path(), permissions).map_err(|e| LibraryError::write(path, e))?;
    temp.persist(path)
        .map_err(|e| LibraryError::write(path, e.error))?;

    log::debug!("rewrote tags of {}", path.display());
    Ok(())
}

/// Same directory as `path`, so the final rename never crosses filesystems.
fn copy_beside(path: &Path) -> std::io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let temp = tempfile::Builder::new()
        .prefix(".opustag-")
        .suffix(".flac")
        .tempfile_in(dir)?;
    fs::copy(path, temp.path())?;
    Ok(temp)
}
