//! Synthetic RIFF/AVI and MJPEG byte streams for tests.

pub fn chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 9);
    out.extend_from_slice(id);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

pub fn list(kind: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = children.concat();
    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(b"LIST");
    out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(&body);
    out
}

pub fn riff_avi(children: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = children.concat();
    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"AVI ");
    out.extend_from_slice(&body);
    out
}

pub fn avih(total_frames: u32, micros_per_frame: u32, suggested_buffer: u32) -> Vec<u8> {
    let mut data = vec![0u8; 56];
    data[0..4].copy_from_slice(&micros_per_frame.to_le_bytes());
    data[16..20].copy_from_slice(&total_frames.to_le_bytes());
    data[24..28].copy_from_slice(&1u32.to_le_bytes());
    data[28..32].copy_from_slice(&suggested_buffer.to_le_bytes());
    chunk(b"avih", &data)
}

pub fn strh(fcc_type: &[u8; 4]) -> Vec<u8> {
    let mut data = vec![0u8; 56];
    data[0..4].copy_from_slice(fcc_type);
    chunk(b"strh", &data)
}

pub fn strf_video(width: i32, height: i32, codec: &[u8; 4]) -> Vec<u8> {
    let mut data = vec![0u8; 40];
    data[0..4].copy_from_slice(&40u32.to_le_bytes());
    data[4..8].copy_from_slice(&width.to_le_bytes());
    data[8..12].copy_from_slice(&height.to_le_bytes());
    data[12..14].copy_from_slice(&1u16.to_le_bytes());
    data[14..16].copy_from_slice(&24u16.to_le_bytes());
    data[16..20].copy_from_slice(codec);
    chunk(b"strf", &data)
}

pub fn video_hdrl(width: i32, height: i32, codec: &[u8; 4], total_frames: u32) -> Vec<u8> {
    list(
        b"hdrl",
        &[
            avih(total_frames, 100_000, 0),
            list(b"strl", &[strh(b"vids"), strf_video(width, height, codec)]),
        ],
    )
}

/// A complete single-stream MJPEG AVI.
pub fn mjpeg_avi(width: i32, height: i32, movi_chunks: &[Vec<u8>]) -> Vec<u8> {
    riff_avi(&[
        video_hdrl(width, height, b"MJPG", movi_chunks.len() as u32),
        list(b"movi", movi_chunks),
    ])
}

/// `len` bytes shaped like a JPEG: SOI, filler without 0xFF, EOI.
pub fn fake_jpeg(len: usize, fill: u8) -> Vec<u8> {
    assert!(len >= 4 && fill != 0xFF);
    let mut out = vec![fill; len];
    out[0..2].copy_from_slice(&[0xFF, 0xD8]);
    out[len - 2..].copy_from_slice(&[0xFF, 0xD9]);
    out
}

/// Offset of the first occurrence of `needle`.
pub fn offset_of(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("needle present")
}
