use std::path::PathBuf;

use bytes::BufMut;

const FIXED_ONE: u32 = 0x0001_0000; // 1.0 in 16.16
const FIXED_NEG_ONE: u32 = 0xFFFF_0000; // -1.0 in 16.16
const FIXED_W: u32 = 0x4000_0000; // 1.0 in 2.30

pub fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "vidlink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// A minimal but structurally honest MP4: a 12.3 second presentation with
/// one 1920x1080 video track carrying 150 frames at 25 fps over a 5 second
/// media timeline (so the average rate is 30), plus a `udta` box under
/// `moov`.
pub fn mp4_fixture(rotation: u32) -> Vec<u8> {
    let mut moov = boxed(b"mvhd", &mvhd_payload());
    moov.extend_from_slice(&boxed(b"trak", &trak_payload(rotation)));
    moov.extend_from_slice(&boxed(b"udta", &[0u8; 16]));

    let mut file = boxed(b"ftyp", b"isom");
    file.extend_from_slice(&boxed(b"moov", &moov));
    file.extend_from_slice(&boxed(b"mdat", &[0xAB; 32]));
    file
}

fn matrix(rotation: u32) -> [u32; 9] {
    match rotation {
        90 => [0, FIXED_ONE, 0, FIXED_NEG_ONE, 0, 0, 0, 0, FIXED_W],
        180 => [FIXED_NEG_ONE, 0, 0, 0, FIXED_NEG_ONE, 0, 0, 0, FIXED_W],
        270 => [0, FIXED_NEG_ONE, 0, FIXED_ONE, 0, 0, 0, 0, FIXED_W],
        _ => [FIXED_ONE, 0, 0, 0, FIXED_ONE, 0, 0, 0, FIXED_W],
    }
}

fn mvhd_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.put_u32(0); // version 0, flags 0
    p.put_u32(0); // creation
    p.put_u32(0); // modification
    p.put_u32(1000); // timescale
    p.put_u32(12_300); // duration: 12.3 seconds
    p.put_u32(FIXED_ONE); // rate
    p.put_u16(0x0100); // volume
    p.put_u16(0);
    p.put_u64(0);
    for value in matrix(0) {
        p.put_u32(value);
    }
    p.put_slice(&[0u8; 24]); // pre_defined
    p.put_u32(2); // next track id
    p
}

fn trak_payload(rotation: u32) -> Vec<u8> {
    let mut mdia = boxed(b"mdhd", &mdhd_payload());
    mdia.extend_from_slice(&boxed(b"hdlr", &hdlr_payload()));

    let stbl = boxed(b"stts", &stts_payload());
    let minf = boxed(b"stbl", &stbl);
    mdia.extend_from_slice(&boxed(b"minf", &minf));

    let mut trak = boxed(b"tkhd", &tkhd_payload(rotation));
    trak.extend_from_slice(&boxed(b"mdia", &mdia));
    trak
}

fn tkhd_payload(rotation: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.put_u32(0x0000_0007); // version 0, flags: enabled + in movie + in preview
    p.put_u32(0); // creation
    p.put_u32(0); // modification
    p.put_u32(1); // track id
    p.put_u32(0);
    p.put_u32(12_300); // duration
    p.put_u64(0); // reserved
    p.put_u16(0); // layer
    p.put_u16(0); // alternate group
    p.put_u16(0); // volume, zero for video
    p.put_u16(0);
    for value in matrix(rotation) {
        p.put_u32(value);
    }
    p.put_u32(1920 << 16);
    p.put_u32(1080 << 16);
    p
}

fn mdhd_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.put_u32(0); // version 0, flags 0
    p.put_u32(0);
    p.put_u32(0);
    p.put_u32(12_800); // media timescale
    p.put_u32(64_000); // media duration: 5 seconds
    p.put_u16(0x55C4); // language "und"
    p.put_u16(0);
    p
}

fn stts_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.put_u32(0);
    p.put_u32(1); // entry count
    p.put_u32(150); // sample count
    p.put_u32(512); // delta: 12800 / 512 = 25 fps
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

fn boxed(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.put_u32((8 + payload.len()) as u32);
    out.put_slice(kind);
    out.put_slice(payload);
    out
}
