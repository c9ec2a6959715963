//! Shared test support: temp directories and synthesized MP4 fixtures.

use std::path::PathBuf;

use bytes::BufMut;

/// Per-test scratch directory under the system temp dir.
pub fn temp_root(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("vidlink-media-{tag}-{}", std::process::id()))
}

const FIXED_ONE: u32 = 0x0001_0000; // 1.0 in 16.16
const FIXED_NEG_ONE: u32 = 0xFFFF_0000; // -1.0 in 16.16
const FIXED_W: u32 = 0x4000_0000; // 1.0 in 2.30

/// The `tkhd` transform matrix encoding a quarter-turn rotation.
pub fn matrix_for(rotation: u32) -> [u32; 9] {
    match rotation {
        90 => [0, FIXED_ONE, 0, FIXED_NEG_ONE, 0, 0, 0, 0, FIXED_W],
        180 => [FIXED_NEG_ONE, 0, 0, 0, FIXED_NEG_ONE, 0, 0, 0, FIXED_W],
        270 => [0, FIXED_NEG_ONE, 0, FIXED_ONE, 0, 0, 0, 0, FIXED_W],
        _ => [FIXED_ONE, 0, 0, 0, FIXED_ONE, 0, 0, 0, FIXED_W],
    }
}

/// Builder for a small but structurally honest MP4.
///
/// The defaults describe the canonical test clip: 12.3 seconds of
/// 1920x1080 video, 150 frames at 25 fps real rate over a 5 second media
/// timeline (so the average rate is 30), no rotation, one `udta` box under
/// `moov`.
pub struct Mp4Fixture {
    pub movie_timescale: u32,
    pub movie_duration: u64,
    pub width: u32,
    pub height: u32,
    pub rotation: u32,
    pub media_timescale: u32,
    pub media_duration: u64,
    pub stts: Vec<(u32, u32)>,
    pub with_video_track: bool,
    pub with_moov_udta: bool,
    pub with_top_level_meta: bool,
    pub use_v1_headers: bool,
}

impl Default for Mp4Fixture {
    fn default() -> Self {
        Self {
            movie_timescale: 1000,
            movie_duration: 12_300,
            width: 1920,
            height: 1080,
            rotation: 0,
            media_timescale: 12_800,
            media_duration: 64_000,
            stts: vec![(150, 512)],
            with_video_track: true,
            with_moov_udta: true,
            with_top_level_meta: false,
            use_v1_headers: false,
        }
    }
}

impl Mp4Fixture {
    pub fn rotated(rotation: u32) -> Self {
        Self {
            rotation,
            ..Self::default()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut file = boxed(b"ftyp", &ftyp_payload());

        let mut moov = boxed(b"mvhd", &self.mvhd_payload());
        if self.with_video_track {
            moov.extend_from_slice(&boxed(b"trak", &self.trak_payload()));
        }
        if self.with_moov_udta {
            moov.extend_from_slice(&boxed(b"udta", &[0u8; 16]));
        }
        file.extend_from_slice(&boxed(b"moov", &moov));

        if self.with_top_level_meta {
            file.extend_from_slice(&boxed(b"meta", &[0u8; 12]));
        }
        file.extend_from_slice(&boxed(b"mdat", &[0xAB; 32]));
        file
    }

    fn mvhd_payload(&self) -> Vec<u8> {
        let mut p = Vec::new();
        if self.use_v1_headers {
            p.put_u32(0x0100_0000); // version 1, flags 0
            p.put_u64(0); // creation
            p.put_u64(0); // modification
            p.put_u32(self.movie_timescale);
            p.put_u64(self.movie_duration);
        } else {
            p.put_u32(0);
            p.put_u32(0);
            p.put_u32(0);
            p.put_u32(self.movie_timescale);
            p.put_u32(self.movie_duration as u32);
        }
        p.put_u32(FIXED_ONE); // rate
        p.put_u16(0x0100); // volume
        p.put_u16(0);
        p.put_u64(0);
        for value in matrix_for(0) {
            p.put_u32(value);
        }
        p.put_slice(&[0u8; 24]); // pre_defined
        p.put_u32(2); // next track id
        p
    }

    fn trak_payload(&self) -> Vec<u8> {
        let mut mdia = boxed(b"mdhd", &self.mdhd_payload());
        mdia.extend_from_slice(&boxed(b"hdlr", &hdlr_payload()));

        let stbl = boxed(b"stts", &self.stts_payload());
        let minf = boxed(b"stbl", &stbl);
        mdia.extend_from_slice(&boxed(b"minf", &minf));

        let mut trak = boxed(b"tkhd", &self.tkhd_payload());
        trak.extend_from_slice(&boxed(b"mdia", &mdia));
        trak
    }

    fn tkhd_payload(&self) -> Vec<u8> {
        let mut p = Vec::new();
        if self.use_v1_headers {
            p.put_u32(0x0100_0007); // version 1, flags: enabled + in movie + in preview
            p.put_u64(0);
            p.put_u64(0);
            p.put_u32(1); // track id
            p.put_u32(0);
            p.put_u64(self.movie_duration);
        } else {
            p.put_u32(0x0000_0007);
            p.put_u32(0);
            p.put_u32(0);
            p.put_u32(1);
            p.put_u32(0);
            p.put_u32(self.movie_duration as u32);
        }
        p.put_u64(0); // reserved
        p.put_u16(0); // layer
        p.put_u16(0); // alternate group
        p.put_u16(0); // volume, zero for video
        p.put_u16(0);
        for value in matrix_for(self.rotation) {
            p.put_u32(value);
        }
        p.put_u32(self.width << 16);
        p.put_u32(self.height << 16);
        p
    }

    fn mdhd_payload(&self) -> Vec<u8> {
        let mut p = Vec::new();
        if self.use_v1_headers {
            p.put_u32(0x0100_0000);
            p.put_u64(0);
            p.put_u64(0);
            p.put_u32(self.media_timescale);
            p.put_u64(self.media_duration);
        } else {
            p.put_u32(0);
            p.put_u32(0);
            p.put_u32(0);
            p.put_u32(self.media_timescale);
            p.put_u32(self.media_duration as u32);
        }
        p.put_u16(0x55C4); // language "und"
        p.put_u16(0);
        p
    }

    fn stts_payload(&self) -> Vec<u8> {
        let mut p = Vec::new();
        p.put_u32(0);
        p.put_u32(self.stts.len() as u32);
        for &(count, delta) in &self.stts {
            p.put_u32(count);
            p.put_u32(delta);
        }
        p
    }
}

fn boxed(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.put_u32((8 + payload.len()) as u32);
    out.put_slice(kind);
    out.put_slice(payload);
    out
}

fn ftyp_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.put_slice(b"isom");
    p.put_u32(512);
    p.put_slice(b"isomiso2avc1mp41");
    p
}

fn hdlr_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.put_u32(0);
    p.put_u32(0);
    p.put_slice(b"vide");
    p.put_slice(&[0u8; 12]);
    p.put_slice(b"VideoHandler\0");
    p
}
