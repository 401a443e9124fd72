use std::fmt;

use crate::source::domain::byte_source::{read_exact_at, ByteSource};
use crate::source::domain::source_error::SourceError;

pub type FourCc = [u8; 4];

pub const RIFF: FourCc = *b"RIFF";
pub const AVI_FORM: FourCc = *b"AVI ";
pub const LIST: FourCc = *b"LIST";
pub const HDRL: FourCc = *b"hdrl";
pub const STRL: FourCc = *b"strl";
pub const MOVI: FourCc = *b"movi";
pub const REC: FourCc = *b"rec ";
pub const AVIH: FourCc = *b"avih";
pub const STRH: FourCc = *b"strh";
pub const STRF: FourCc = *b"strf";
pub const VIDS: FourCc = *b"vids";

pub const CHUNK_HEADER_LEN: u64 = 8;

/// Chunk sizes are padded to an even number of bytes.
pub fn padded_size(size: u32) -> u64 {
    u64::from(size) + u64::from(size & 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: FourCc,
    pub size: u32,
    /// Offset of the chunk id.
    pub offset: u64,
}

impl ChunkHeader {
    pub fn data_offset(&self) -> u64 {
        self.offset + CHUNK_HEADER_LEN
    }

    pub fn data_end(&self) -> u64 {
        self.data_offset() + u64::from(self.size)
    }

    /// Offset of the following chunk, past the pad byte.
    pub fn next_offset(&self) -> u64 {
        self.data_offset() + padded_size(self.size)
    }
}

pub fn read_chunk_header(source: &mut dyn ByteSource, offset: u64) -> Result<ChunkHeader, SourceError> {
    let mut raw = [0u8; 8];
    read_exact_at(source, offset, &mut raw)?;
    Ok(ChunkHeader {
        id: [raw[0], raw[1], raw[2], raw[3]],
        size: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        offset,
    })
}

pub fn read_fourcc(source: &mut dyn ByteSource, offset: u64) -> Result<FourCc, SourceError> {
    let mut raw = [0u8; 4];
    read_exact_at(source, offset, &mut raw)?;
    Ok(raw)
}

pub fn u32_le(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

pub fn i32_le(bytes: &[u8], at: usize) -> Option<i32> {
    u32_le(bytes, at).map(|v| v as i32)
}

/// Printable form of a FourCC for logs and errors.
pub struct DisplayFourCc<'a>(pub &'a FourCc);

impl fmt::Display for DisplayFourCc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Video data chunk of `stream`: `NNdc` (compressed) or `NNdb` (uncompressed).
pub fn is_video_chunk(id: &FourCc, stream: u32) -> bool {
    if &id[2..4] != b"dc" && &id[2..4] != b"db" {
        return false;
    }
    if !id[0].is_ascii_digit() || !id[1].is_ascii_digit() {
        return false;
    }
    let number = u32::from(id[0] - b'0') * 10 + u32::from(id[1] - b'0');
    number == stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::infrastructure::file_source::FileSource;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case::even(10, 10)]
    #[case::odd(7, 8)]
    #[case::zero(0, 0)]
    #[case::max_odd(u32::MAX, u32::MAX as u64 + 1)]
    fn test_padded_size(#[case] size: u32, #[case] expected: u64) {
        assert_eq!(padded_size(size), expected);
    }

    #[test]
    fn test_read_chunk_header_and_offsets() {
        let bytes = b"xxxxJUNK\x07\x00\x00\x00abcdefg\x00".to_vec();
        let len = bytes.len() as u64;
        let mut source = FileSource::from_reader(Cursor::new(bytes), len, "memory");
        let header = read_chunk_header(&mut source, 4).unwrap();
        assert_eq!(&header.id, b"JUNK");
        assert_eq!(header.size, 7);
        assert_eq!(header.data_offset(), 12);
        assert_eq!(header.data_end(), 19);
        assert_eq!(header.next_offset(), 20);
        assert_eq!(header.next_offset(), len);
    }

    #[test]
    fn test_read_chunk_header_past_end_is_eof() {
        let mut source = FileSource::from_reader(Cursor::new(vec![0u8; 6]), 6, "memory");
        assert!(read_chunk_header(&mut source, 0).unwrap_err().is_eof());
    }

    #[rstest]
    #[case::compressed(b"00dc", 0, true)]
    #[case::uncompressed(b"00db", 0, true)]
    #[case::other_stream(b"01dc", 0, false)]
    #[case::second_stream(b"01dc", 1, true)]
    #[case::audio(b"01wb", 1, false)]
    #[case::junk(b"JUNK", 0, false)]
    #[case::index(b"ix00", 0, false)]
    fn test_is_video_chunk(#[case] id: &FourCc, #[case] stream: u32, #[case] expected: bool) {
        assert_eq!(is_video_chunk(id, stream), expected);
    }

    #[test]
    fn test_display_fourcc_masks_binary() {
        assert_eq!(DisplayFourCc(b"MJPG").to_string(), "MJPG");
        assert_eq!(DisplayFourCc(&[0x00, b'a', 0xFF, b' ']).to_string(), ".a. ");
    }

    #[test]
    fn test_le_helpers() {
        let bytes = [0x80, 0x00, 0x00, 0x00, 0xC0, 0xFF, 0xFF, 0xFF];
        assert_eq!(u32_le(&bytes, 0), Some(128));
        assert_eq!(i32_le(&bytes, 4), Some(-64));
        assert_eq!(u32_le(&bytes, 6), None);
    }
}
