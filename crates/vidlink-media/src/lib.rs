//! Video container inspection and offset-safe rewrites.
//!
//! The crate has three layers. [`store`] maps `(store, name)` pairs onto
//! a directory tree. [`boxes`], [`probe`] and [`transform`] work on raw
//! ISO-BMFF bytes: walking the box structure, deriving [`VideoMetadata`]
//! from it, and rewriting rotation matrices or blanking metadata carriers
//! without moving a single byte. [`engine`] strings those together into
//! the four operations a worker serves, and [`client`]/[`worker`] put
//! them on the wire.

pub mod boxes;
pub mod client;
pub mod engine;
pub mod error;
pub mod ops;
pub mod probe;
pub mod store;
pub mod transform;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::MediaClient;
pub use engine::MediaEngine;
pub use error::{ClientError, MediaError, Result};
pub use ops::register_operations;
pub use probe::{probe, MovieInfo, TrackInfo, VideoMetadata};
pub use store::MediaStore;
