//! The tag engine: FLAC tag codec, cover resolution, album aggregation and
//! batch mutations.

pub mod codec;
pub mod cover;
pub mod error;
pub mod mutate;
pub mod operations;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;

pub use operations::Library;
