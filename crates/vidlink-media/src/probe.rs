//! ISO-BMFF metadata probe.
//!
//! Walks `moov` and the tracks inside it, recording both the derived facts
//! (duration, dimensions, rotation, frame counts) and the byte offsets the
//! transforms need to patch boxes in place.

use serde::{Deserialize, Serialize};

use crate::boxes::{self, BoxHeader};
use crate::error::{MediaError, Result};

/// Metadata reported for a video file. Field names are the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    /// Average frame rate over the media timeline; 0 when not derivable.
    pub avg_frame_rate: f64,
    /// Nominal frame rate from the dominant sample delta; 0 when not
    /// derivable.
    pub real_frame_rate: f64,
    pub num_frames: u64,
    /// Presentation duration in seconds.
    pub duration: f64,
    /// Quarter-turn rotation in degrees: 0, 90, 180 or 270.
    pub rotation: u32,
    pub vid_width: u32,
    pub vid_height: u32,
}

/// Parsed movie structure, with the offsets the transforms rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieInfo {
    /// Presentation duration in seconds.
    pub duration: f64,
    /// Movie timescale in ticks per second.
    pub timescale: u32,
    pub tracks: Vec<TrackInfo>,
    /// Type-field offsets of metadata carriers (`udta`/`meta`) at the top
    /// level and directly under `moov`.
    pub metadata_boxes: Vec<usize>,
}

impl MovieInfo {
    /// First track with nonzero display dimensions.
    pub fn video_track(&self) -> Option<&TrackInfo> {
        self.tracks.iter().find(|track| track.is_video())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// Display width/height from `tkhd`, integer part of 16.16 fixed.
    pub width: u32,
    pub height: u32,
    /// Rotation in degrees derived from the `tkhd` transform matrix.
    pub rotation: u32,
    /// Absolute offset of the 36-byte transform matrix inside `tkhd`.
    pub matrix_offset: usize,
    /// Absolute offset of the fixed-point width field; height follows it.
    pub dimensions_offset: usize,
    /// Media timescale in ticks per second from `mdhd`; 0 when absent.
    pub media_timescale: u32,
    /// Media duration in timescale ticks from `mdhd`.
    pub media_duration: u64,
    /// Total sample count from `stts`.
    pub sample_count: u64,
    /// Sample delta of the `stts` entry covering the most samples.
    pub dominant_delta: u32,
}

impl TrackInfo {
    /// Video tracks are the ones with nonzero display dimensions.
    pub fn is_video(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Probe a file for its video metadata.
pub fn probe(data: &[u8]) -> Result<VideoMetadata> {
    let movie = parse_movie(data)?;
    let track = movie.video_track().ok_or(MediaError::Metadata)?;

    let real_frame_rate = if track.media_timescale > 0 && track.dominant_delta > 0 {
        f64::from(track.media_timescale) / f64::from(track.dominant_delta)
    } else {
        0.0
    };
    let media_seconds = if track.media_timescale > 0 {
        track.media_duration as f64 / f64::from(track.media_timescale)
    } else {
        0.0
    };
    let avg_frame_rate = if media_seconds > 0.0 {
        track.sample_count as f64 / media_seconds
    } else {
        0.0
    };

    Ok(VideoMetadata {
        avg_frame_rate,
        real_frame_rate,
        num_frames: track.sample_count,
        duration: movie.duration,
        rotation: track.rotation,
        vid_width: track.width,
        vid_height: track.height,
    })
}

/// Parse the container structure. A buffer without a well-formed `moov` is
/// not something we can treat as video.
pub fn parse_movie(data: &[u8]) -> Result<MovieInfo> {
    let mut moov: Option<BoxHeader> = None;
    let mut metadata_boxes = Vec::new();

    for header in boxes::top_level(data) {
        let header = header?;
        match &header.kind {
            b"moov" => moov = Some(header),
            b"udta" | b"meta" => metadata_boxes.push(header.kind_offset()),
            _ => {}
        }
    }
    let moov = moov.ok_or(MediaError::Parse)?;

    let mut mvhd: Option<(u32, f64)> = None;
    let mut tracks = Vec::new();
    for header in boxes::walk_children(data, &moov) {
        let header = header?;
        match &header.kind {
            b"mvhd" => mvhd = Some(parse_mvhd(data, &header)?),
            b"trak" => tracks.push(parse_trak(data, &header)?),
            b"udta" | b"meta" => metadata_boxes.push(header.kind_offset()),
            _ => {}
        }
    }
    let (timescale, duration) = mvhd.ok_or(MediaError::Parse)?;

    Ok(MovieInfo {
        duration,
        timescale,
        tracks,
        metadata_boxes,
    })
}

fn ensure_payload(header: &BoxHeader, needed: usize) -> Result<()> {
    if header.payload_len < needed {
        return Err(MediaError::Parse);
    }
    Ok(())
}

fn parse_mvhd(data: &[u8], header: &BoxHeader) -> Result<(u32, f64)> {
    let p = header.payload_offset();
    let (timescale, duration) = match boxes::read_u8(data, p)? {
        0 => {
            ensure_payload(header, 20)?;
            (
                boxes::read_u32(data, p + 12)?,
                u64::from(boxes::read_u32(data, p + 16)?),
            )
        }
        1 => {
            ensure_payload(header, 32)?;
            (boxes::read_u32(data, p + 20)?, boxes::read_u64(data, p + 24)?)
        }
        _ => return Err(MediaError::Parse),
    };

    let seconds = if timescale > 0 {
        duration as f64 / f64::from(timescale)
    } else {
        0.0
    };
    Ok((timescale, seconds))
}

fn parse_trak(data: &[u8], trak: &BoxHeader) -> Result<TrackInfo> {
    let tkhd = boxes::find_child(data, trak, b"tkhd")?.ok_or(MediaError::Parse)?;
    let mut track = parse_tkhd(data, &tkhd)?;

    if let Some(mdia) = boxes::find_child(data, trak, b"mdia")? {
        if let Some(mdhd) = boxes::find_child(data, &mdia, b"mdhd")? {
            (track.media_timescale, track.media_duration) = parse_mdhd(data, &mdhd)?;
        }
        if let Some(minf) = boxes::find_child(data, &mdia, b"minf")? {
            if let Some(stbl) = boxes::find_child(data, &minf, b"stbl")? {
                if let Some(stts) = boxes::find_child(data, &stbl, b"stts")? {
                    (track.sample_count, track.dominant_delta) = parse_stts(data, &stts)?;
                }
            }
        }
    }
    Ok(track)
}

fn parse_tkhd(data: &[u8], header: &BoxHeader) -> Result<TrackInfo> {
    let p = header.payload_offset();
    // Offset of the reserved/layer/volume block after the duration field.
    let fixed = match boxes::read_u8(data, p)? {
        0 => 24,
        1 => 36,
        _ => return Err(MediaError::Parse),
    };
    ensure_payload(header, fixed + 16 + 36 + 8)?;

    let matrix_offset = p + fixed + 16;
    let dimensions_offset = matrix_offset + 36;

    Ok(TrackInfo {
        width: boxes::read_u32(data, dimensions_offset)? >> 16,
        height: boxes::read_u32(data, dimensions_offset + 4)? >> 16,
        rotation: rotation_from_matrix(data, matrix_offset)?,
        matrix_offset,
        dimensions_offset,
        media_timescale: 0,
        media_duration: 0,
        sample_count: 0,
        dominant_delta: 0,
    })
}

/// Map the matrix's 2x2 rotation part onto a quarter turn. Anything that
/// is not one of the four exact quarter-turn matrices reads as unrotated,
/// matching how the original tooling defaulted unknown angles to 0.
fn rotation_from_matrix(data: &[u8], offset: usize) -> Result<u32> {
    const ONE: i32 = 0x0001_0000; // 1.0 in 16.16 fixed point

    let a = boxes::read_u32(data, offset)? as i32;
    let b = boxes::read_u32(data, offset + 4)? as i32;
    let c = boxes::read_u32(data, offset + 12)? as i32;
    let d = boxes::read_u32(data, offset + 16)? as i32;

    Ok(if (a, b, c, d) == (0, ONE, -ONE, 0) {
        90
    } else if (a, b, c, d) == (-ONE, 0, 0, -ONE) {
        180
    } else if (a, b, c, d) == (0, -ONE, ONE, 0) {
        270
    } else {
        0
    })
}

fn parse_mdhd(data: &[u8], header: &BoxHeader) -> Result<(u32, u64)> {
    let p = header.payload_offset();
    match boxes::read_u8(data, p)? {
        0 => {
            ensure_payload(header, 20)?;
            Ok((
                boxes::read_u32(data, p + 12)?,
                u64::from(boxes::read_u32(data, p + 16)?),
            ))
        }
        1 => {
            ensure_payload(header, 32)?;
            Ok((boxes::read_u32(data, p + 20)?, boxes::read_u64(data, p + 24)?))
        }
        _ => Err(MediaError::Parse),
    }
}

fn parse_stts(data: &[u8], header: &BoxHeader) -> Result<(u64, u32)> {
    let p = header.payload_offset();
    ensure_payload(header, 8)?;
    let entry_count = boxes::read_u32(data, p + 4)? as usize;
    let needed = entry_count
        .checked_mul(8)
        .and_then(|n| n.checked_add(8))
        .ok_or(MediaError::Parse)?;
    ensure_payload(header, needed)?;

    let mut total = 0u64;
    let mut dominant_count = 0u32;
    let mut dominant_delta = 0u32;
    for index in 0..entry_count {
        let entry = p + 8 + index * 8;
        let count = boxes::read_u32(data, entry)?;
        let delta = boxes::read_u32(data, entry + 4)?;
        total += u64::from(count);
        if count > dominant_count {
            dominant_count = count;
            dominant_delta = delta;
        }
    }
    Ok((total, dominant_delta))
}
