//! Builders for small but valid FLAC files used across the library tests.

use std::path::{Path, PathBuf};

const STREAMINFO: u8 = 0;
const PADDING: u8 = 1;
const VORBIS_COMMENT: u8 = 4;
const PICTURE: u8 = 6;

/// Stand-in for encoded audio frames. Never decoded, only compared.
pub const AUDIO_FRAMES: &[u8] = b"\xff\xf8\x69\x08\x00opaque-audio-frames\x00\x01\x02\x03";

pub struct FixturePicture {
    pub picture_type: u32,
    pub mime_type: &'static str,
    pub description: &'static str,
    pub data: Vec<u8>,
}

impl FixturePicture {
    pub fn front(mime_type: &'static str, data: &[u8]) -> Self {
        Self {
            picture_type: 3,
            mime_type,
            description: "",
            data: data.to_vec(),
        }
    }
}

#[derive(Default)]
pub struct FlacFixture {
    comments: Vec<(String, String)>,
    pictures: Vec<FixturePicture>,
    padding: usize,
}

impl FlacFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(mut self, key: &str, value: &str) -> Self {
        self.comments.push((key.to_string(), value.to_string()));
        self
    }

    pub fn picture(mut self, picture: FixturePicture) -> Self {
        self.pictures.push(picture);
        self
    }

    pub fn padding(mut self, len: usize) -> Self {
        self.padding = len;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut blocks: Vec<(u8, Vec<u8>)> = vec![(STREAMINFO, stream_info())];
        blocks.push((VORBIS_COMMENT, vorbis_comment(&self.comments)));
        for picture in &self.pictures {
            blocks.push((PICTURE, picture_block(picture)));
        }
        if self.padding > 0 {
            blocks.push((PADDING, vec![0; self.padding]));
        }

        let mut out = b"fLaC".to_vec();
        let count = blocks.len();
        for (i, (ty, body)) in blocks.into_iter().enumerate() {
            let last = if i + 1 == count { 0x80 } else { 0 };
            out.push(last | ty);
            out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
            out.extend_from_slice(&body);
        }
        out.extend_from_slice(AUDIO_FRAMES);
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}

/// A tagged track with the fields most tests care about.
pub fn track_fixture(artist: &str, album: &str, title: &str, number: &str) -> FlacFixture {
    FlacFixture::new()
        .comment("ARTIST", artist)
        .comment("ALBUM", album)
        .comment("TITLE", title)
        .comment("TRACKNUMBER", number)
}

/// Metadata blocks of a FLAC file as `(block type, body)`, plus the bytes after them.
fn metadata_blocks(file: &[u8]) -> (Vec<(u8, &[u8])>, &[u8]) {
    assert_eq!(&file[..4], b"fLaC");
    let mut blocks = Vec::new();
    let mut pos = 4;
    loop {
        let header = file[pos];
        let len = u32::from_be_bytes([0, file[pos + 1], file[pos + 2], file[pos + 3]]) as usize;
        blocks.push((header & 0x7f, &file[pos + 4..pos + 4 + len]));
        pos += 4 + len;
        if header & 0x80 != 0 {
            return (blocks, &file[pos..]);
        }
    }
}

/// Bytes following the last metadata block.
pub fn audio_frames(file: &[u8]) -> &[u8] {
    metadata_blocks(file).1
}

/// Vendor string and raw `KEY=value` entries of the VORBIS_COMMENT block, in file order.
pub fn vorbis_comments(file: &[u8]) -> (String, Vec<String>) {
    let (blocks, _) = metadata_blocks(file);
    let (_, body) = blocks
        .into_iter()
        .find(|(ty, _)| *ty == VORBIS_COMMENT)
        .expect("no VORBIS_COMMENT block");

    let mut pos = 0;
    let vendor = read_string(body, &mut pos);
    let count = read_u32_le(body, &mut pos);
    let entries = (0..count).map(|_| read_string(body, &mut pos)).collect();
    (vendor, entries)
}

fn read_u32_le(body: &[u8], pos: &mut usize) -> u32 {
    let value = u32::from_le_bytes(body[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    value
}

fn read_string(body: &[u8], pos: &mut usize) -> String {
    let len = read_u32_le(body, pos) as usize;
    let text = String::from_utf8(body[*pos..*pos + len].to_vec()).unwrap();
    *pos += len;
    text
}

fn stream_info() -> Vec<u8> {
    let mut body = Vec::with_capacity(34);
    body.extend_from_slice(&4096u16.to_be_bytes());
    body.extend_from_slice(&4096u16.to_be_bytes());
    body.extend_from_slice(&[0, 0, 0]);
    body.extend_from_slice(&[0, 0, 0]);
    // sample rate (20) | channels - 1 (3) | bits per sample - 1 (5) | total samples (36)
    let packed: u64 = (44_100u64 << 44) | (1 << 41) | (15 << 36) | 44_100;
    body.extend_from_slice(&packed.to_be_bytes());
    body.extend_from_slice(&[0; 16]);
    body
}

fn vorbis_comment(comments: &[(String, String)]) -> Vec<u8> {
    let vendor = b"opustag fixtures";
    let mut body = Vec::new();
    body.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    body.extend_from_slice(vendor);
    body.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for (key, value) in comments {
        let entry = format!("{key}={value}");
        body.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        body.extend_from_slice(entry.as_bytes());
    }
    body
}

fn picture_block(picture: &FixturePicture) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&picture.picture_type.to_be_bytes());
    body.extend_from_slice(&(picture.mime_type.len() as u32).to_be_bytes());
    body.extend_from_slice(picture.mime_type.as_bytes());
    body.extend_from_slice(&(picture.description.len() as u32).to_be_bytes());
    body.extend_from_slice(picture.description.as_bytes());
    // width, height, depth, colors
    for _ in 0..4 {
        body.extend_from_slice(&0u32.to_be_bytes());
    }
    body.extend_from_slice(&(picture.data.len() as u32).to_be_bytes());
    body.extend_from_slice(&picture.data);
    body
}
