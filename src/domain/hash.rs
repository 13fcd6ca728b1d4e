use std::fmt::Display;

use blake3::Hash;
use serde::{Serialize, Serializer};

/// Represents the album ID.
///
/// Derived from the effective artist and the album title, so the same
/// album gets the same ID on every scan of an unchanged library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlbumId(pub Hash);

impl AlbumId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    /// Case and surrounding whitespace of both parts are ignored.
    pub fn from_parts(artist: &str, album: &str) -> Self {
        let key = format!(
            "{}\u{1f}{}",
            normalize(artist, "unknown artist"),
            normalize(album, "unknown album")
        );
        Self::from_bytes(key.as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

fn normalize(part: &str, fallback: &str) -> String {
    let part = part.trim();
    if part.is_empty() {
        fallback.to_string()
    } else {
        part.to_lowercase()
    }
}

impl Display for AlbumId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for AlbumId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_whitespace_variants_share_an_id() {
        let a = AlbumId::from_parts("Bach Collegium", "Brandenburg Concertos");
        let b = AlbumId::from_parts("bach collegium", "brandenburg concertos ");
        assert_eq!(a, b);
    }

    #[test]
    fn different_artists_get_different_ids() {
        assert_ne!(AlbumId::from_parts("A", "X"), AlbumId::from_parts("B", "X"));
    }

    #[test]
    fn parts_do_not_bleed_into_each_other() {
        assert_ne!(AlbumId::from_parts("ab", "c"), AlbumId::from_parts("a", "bc"));
    }

    #[test]
    fn serializes_as_hex() -> anyhow::Result<()> {
        let id = AlbumId::from_parts("Artist", "Album");
        assert_eq!(id.to_string(), id.to_hex());
        assert_eq!(id.to_hex().len(), 64);
        assert_eq!(serde_json::to_value(id)?, serde_json::Value::String(id.to_hex()));
        Ok(())
    }
}
