//! Offset-safe byte transforms.
//!
//! Both rewrites patch fixed-size fields in place, so every box keeps its
//! size and the chunk offset tables stay valid without being touched.

use bytes::BufMut;

use crate::error::{MediaError, Result};
use crate::probe::MovieInfo;

const FIXED_ONE: u32 = 0x0001_0000; // 1.0 in 16.16
const FIXED_W: u32 = 0x4000_0000; // 1.0 in 2.30
const IDENTITY_MATRIX: [u32; 9] = [FIXED_ONE, 0, 0, 0, FIXED_ONE, 0, 0, 0, FIXED_W];

/// Bake the rotation out of the video track: identity matrix, and for
/// quarter turns the display dimensions swap to match.
pub fn normalize_rotation(data: &[u8], movie: &MovieInfo) -> Result<Vec<u8>> {
    let track = movie.video_track().ok_or(MediaError::Transcode)?;

    let mut out = data.to_vec();
    {
        let mut matrix = out
            .get_mut(track.matrix_offset..track.matrix_offset + 36)
            .ok_or(MediaError::Transcode)?;
        for value in IDENTITY_MATRIX {
            matrix.put_u32(value);
        }
    }

    if track.rotation == 90 || track.rotation == 270 {
        let mut dims = out
            .get_mut(track.dimensions_offset..track.dimensions_offset + 8)
            .ok_or(MediaError::Transcode)?;
        dims.put_u32(track.height << 16);
        dims.put_u32(track.width << 16);
    }
    Ok(out)
}

/// Blank out every recorded metadata carrier by flipping its box type to
/// `free`; players skip the box, the payload bytes stay where they were.
pub fn strip_metadata(data: &[u8], movie: &MovieInfo) -> Result<Vec<u8>> {
    let mut out = data.to_vec();
    for &offset in &movie.metadata_boxes {
        let kind = out
            .get_mut(offset..offset + 4)
            .ok_or(MediaError::Transmux)?;
        kind.copy_from_slice(b"free");
    }
    Ok(out)
}
