//! Minimal ISO-BMFF box walking over in-memory buffers.
//!
//! Only what the probe and the transforms need: iterate sibling boxes,
//! descend into containers, and read big-endian integers at absolute
//! offsets. Offsets are absolute file positions throughout, because the
//! transforms patch boxes in place.

use bytes::Buf;

use crate::error::{MediaError, Result};

/// Length of the compact size+type header.
pub const HEADER_LEN: usize = 8;

/// One parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Four-character box type.
    pub kind: [u8; 4],
    /// Absolute offset of the box's first byte (the size field).
    pub offset: usize,
    /// Length of the size+type header: 8, or 16 with a 64-bit size.
    pub header_len: usize,
    /// Length of the payload following the header.
    pub payload_len: usize,
}

impl BoxHeader {
    pub fn payload_offset(&self) -> usize {
        self.offset + self.header_len
    }

    /// Absolute offset one past the box's last byte.
    pub fn end(&self) -> usize {
        self.payload_offset() + self.payload_len
    }

    /// Absolute offset of the 4-byte type field.
    pub fn kind_offset(&self) -> usize {
        self.offset + 4
    }

    pub fn is(&self, kind: &[u8; 4]) -> bool {
        &self.kind == kind
    }
}

/// Iterator over the boxes in one byte range.
pub struct BoxWalk<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

/// Walk the boxes in `data[start..end]`.
pub fn walk(data: &[u8], start: usize, end: usize) -> BoxWalk<'_> {
    BoxWalk { data, pos: start, end }
}

/// Walk a container box's children.
pub fn walk_children<'a>(data: &'a [u8], parent: &BoxHeader) -> BoxWalk<'a> {
    walk(data, parent.payload_offset(), parent.end())
}

/// Walk the file's top-level boxes.
pub fn top_level(data: &[u8]) -> BoxWalk<'_> {
    walk(data, 0, data.len())
}

/// First direct child of `parent` with the given type.
pub fn find_child(data: &[u8], parent: &BoxHeader, kind: &[u8; 4]) -> Result<Option<BoxHeader>> {
    for header in walk_children(data, parent) {
        let header = header?;
        if header.is(kind) {
            return Ok(Some(header));
        }
    }
    Ok(None)
}

impl Iterator for BoxWalk<'_> {
    type Item = Result<BoxHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        match read_header(self.data, self.pos, self.end) {
            Ok(header) => {
                self.pos = header.end();
                Some(Ok(header))
            }
            Err(err) => {
                // Stop after the first malformed header.
                self.end = self.pos;
                Some(Err(err))
            }
        }
    }
}

fn read_header(data: &[u8], pos: usize, end: usize) -> Result<BoxHeader> {
    if end > data.len() || end - pos < HEADER_LEN {
        return Err(MediaError::Parse);
    }
    let mut cursor = &data[pos..end];
    let size32 = cursor.get_u32();
    let mut kind = [0u8; 4];
    cursor.copy_to_slice(&mut kind);

    let (header_len, total) = match size32 {
        // Size 0: the box runs to the end of its range.
        0 => (HEADER_LEN, end - pos),
        // Size 1: a 64-bit size follows the type.
        1 => {
            if end - pos < HEADER_LEN + 8 {
                return Err(MediaError::Parse);
            }
            let size64 = cursor.get_u64();
            let total = usize::try_from(size64).map_err(|_| MediaError::Parse)?;
            (HEADER_LEN + 8, total)
        }
        n => (HEADER_LEN, n as usize),
    };

    let box_end = pos.checked_add(total).ok_or(MediaError::Parse)?;
    if total < header_len || box_end > end {
        return Err(MediaError::Parse);
    }

    Ok(BoxHeader {
        kind,
        offset: pos,
        header_len,
        payload_len: total - header_len,
    })
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset).copied().ok_or(MediaError::Parse)
}

pub fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    let mut slice = data.get(offset..offset + 2).ok_or(MediaError::Parse)?;
    Ok(slice.get_u16())
}

pub fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let mut slice = data.get(offset..offset + 4).ok_or(MediaError::Parse)?;
    Ok(slice.get_u32())
}

pub fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    let mut slice = data.get(offset..offset + 8).ok_or(MediaError::Parse)?;
    Ok(slice.get_u64())
}
