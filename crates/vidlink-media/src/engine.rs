//! The worker's processing engine: store-backed media operations.
//!
//! Each method follows the same ladder: load from the store, parse the
//! container, apply the operation, write the result. Failures surface as
//! the `MediaError` variant for the rung that broke, which is what decides
//! the error value the caller sees.

use tracing::{debug, info};

use crate::error::Result;
use crate::probe::{self, VideoMetadata};
use crate::store::MediaStore;
use crate::transform;

/// Store-backed media engine.
#[derive(Debug, Clone)]
pub struct MediaEngine {
    store: MediaStore,
}

impl MediaEngine {
    pub fn new(store: MediaStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Log a human-readable container summary. Succeeds for any container
    /// that parses, video track or not.
    pub async fn dump_metadata(&self, store: &str, name: &str) -> Result<()> {
        let data = self.store.load(store, name).await?;
        let movie = probe::parse_movie(&data)?;

        info!(
            store,
            name,
            size = data.len(),
            duration = movie.duration,
            tracks = movie.tracks.len(),
            "container summary"
        );
        for (index, track) in movie.tracks.iter().enumerate() {
            info!(
                index,
                width = track.width,
                height = track.height,
                rotation = track.rotation,
                frames = track.sample_count,
                timescale = track.media_timescale,
                "track"
            );
        }
        Ok(())
    }

    /// Probe a stored file for its video metadata.
    pub async fn read_metadata(&self, store: &str, name: &str) -> Result<VideoMetadata> {
        let data = self.store.load(store, name).await?;
        probe::probe(&data)
    }

    /// Bake the rotation out of `src` and write the result to `dst` in the
    /// same store.
    pub async fn transcode_rotation(&self, store: &str, src: &str, dst: &str) -> Result<()> {
        let data = self.store.load(store, src).await?;
        let movie = probe::parse_movie(&data)?;
        let out = transform::normalize_rotation(&data, &movie)?;
        self.store.save(store, dst, &out).await?;
        debug!(store, src, dst, "normalized rotation");
        Ok(())
    }

    /// Strip metadata carriers from `src` and write the result to `dst` in
    /// the same store.
    pub async fn transmux_strip_meta(&self, store: &str, src: &str, dst: &str) -> Result<()> {
        let data = self.store.load(store, src).await?;
        let movie = probe::parse_movie(&data)?;
        let out = transform::strip_metadata(&data, &movie)?;
        self.store.save(store, dst, &out).await?;
        debug!(store, src, dst, "stripped metadata");
        Ok(())
    }
}
