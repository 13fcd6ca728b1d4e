pub mod album;
pub mod cover;
pub mod hash;
pub mod track;
