use crate::demux::domain::demux_error::AviError;
use crate::demux::infrastructure::riff::{
    i32_le, read_chunk_header, read_fourcc, u32_le, ChunkHeader, DisplayFourCc, FourCc, AVIH,
    AVI_FORM, HDRL, LIST, MOVI, RIFF, STRF, STRH, VIDS,
};
use crate::shared::constants::MJPEG_FOURCC;
use crate::source::domain::byte_source::{read_exact_at, ByteSource};
use crate::source::domain::source_error::SourceError;

const AVIH_READ_LEN: usize = 40;
const BITMAPINFOHEADER_MIN_LEN: usize = 20;

/// Header facts and the `movi` bounds of an MJPEG AVI file, gathered once
/// at open time. Frame chunks themselves are not indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct AviIndex {
    pub movi_payload_offset: u64,
    /// One past the last byte of the `movi` list.
    pub movi_end: u64,
    pub declared_frame_count: Option<u32>,
    pub micros_per_frame: Option<u32>,
    /// `dwSuggestedBufferSize`, advisory.
    pub estimated_frame_size: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub codec: FourCc,
    /// Stream number used in the `NNdc` chunk ids.
    pub video_stream: u32,
}

impl AviIndex {
    pub fn is_mjpeg_codec(&self) -> bool {
        self.codec.eq_ignore_ascii_case(&MJPEG_FOURCC)
    }

    pub fn declared_fps(&self) -> Option<f64> {
        self.micros_per_frame
            .filter(|&us| us > 0)
            .map(|us| 1_000_000.0 / f64::from(us))
    }

    /// Walks the RIFF tree up to the start of `movi`.
    pub fn parse(source: &mut dyn ByteSource) -> Result<Self, AviError> {
        let mut head = [0u8; 12];
        read_exact_at(source, 0, &mut head).map_err(|e| match e {
            SourceError::Eof => AviError::InvalidFormat("file shorter than a RIFF header".into()),
            other => AviError::Source(other),
        })?;
        if head[0..4] != RIFF {
            return Err(AviError::InvalidFormat("missing RIFF magic".into()));
        }
        if head[8..12] != AVI_FORM {
            return Err(AviError::InvalidFormat(format!(
                "RIFF form is '{}', expected 'AVI '",
                DisplayFourCc(&[head[8], head[9], head[10], head[11]])
            )));
        }

        let declared_size = u64::from(u32::from_le_bytes([head[4], head[5], head[6], head[7]]));
        // Some writers leave the RIFF size at zero or overstate it.
        let riff_end = match 8 + declared_size {
            end if declared_size >= 4 && end <= source.len() => end,
            _ => source.len(),
        };

        let mut header: Option<HeaderInfo> = None;
        let mut offset = 12;
        while offset + 8 <= riff_end {
            let chunk = header_at(source, offset, "RIFF")?;
            log::debug!(
                "AVI chunk '{}' at {offset}, {} bytes",
                DisplayFourCc(&chunk.id),
                chunk.size
            );
            if chunk.id == LIST {
                let list_type = fourcc_at(source, chunk.data_offset(), "LIST")?;
                let list_end = chunk.data_end().min(riff_end);
                if list_type == HDRL {
                    header = Some(parse_hdrl(source, chunk.data_offset() + 4, list_end)?);
                } else if list_type == MOVI {
                    let info = header.ok_or(AviError::MissingChunk("hdrl"))?;
                    return Ok(info.into_index(chunk.data_offset() + 4, list_end));
                }
            }
            offset = chunk.next_offset();
        }

        Err(AviError::MissingChunk(if header.is_none() { "hdrl" } else { "movi" }))
    }
}

#[derive(Debug, Default)]
struct HeaderInfo {
    total_frames: Option<u32>,
    micros_per_frame: Option<u32>,
    suggested_buffer: Option<u32>,
    video: Option<VideoFormat>,
}

#[derive(Debug)]
struct VideoFormat {
    width: u32,
    height: u32,
    codec: FourCc,
    stream: u32,
}

impl HeaderInfo {
    fn into_index(self, movi_payload_offset: u64, movi_end: u64) -> AviIndex {
        // parse_hdrl only succeeds once a video format was captured.
        let video = self.video.unwrap_or(VideoFormat {
            width: 0,
            height: 0,
            codec: MJPEG_FOURCC,
            stream: 0,
        });
        AviIndex {
            movi_payload_offset,
            movi_end,
            declared_frame_count: self.total_frames.filter(|&n| n > 0),
            micros_per_frame: self.micros_per_frame.filter(|&us| us > 0),
            estimated_frame_size: self.suggested_buffer.filter(|&n| n > 0),
            width: video.width,
            height: video.height,
            codec: video.codec,
            video_stream: video.stream,
        }
    }
}

/// Flat walk over `hdrl`; nested `LIST strl` chunks are entered in place.
fn parse_hdrl(source: &mut dyn ByteSource, start: u64, end: u64) -> Result<HeaderInfo, AviError> {
    let mut info = HeaderInfo::default();
    let mut streams_seen: u32 = 0;
    let mut current_type: Option<FourCc> = None;
    let mut offset = start;

    while offset + 8 <= end {
        let chunk = header_at(source, offset, "hdrl")?;
        if chunk.id == LIST {
            offset = chunk.data_offset() + 4;
            continue;
        }
        match chunk.id {
            AVIH => {
                let data = chunk_data(source, &chunk, AVIH_READ_LEN)?;
                info.micros_per_frame = u32_le(&data, 0);
                info.total_frames = u32_le(&data, 16);
                info.suggested_buffer = u32_le(&data, 28);
            }
            STRH => {
                streams_seen += 1;
                current_type = Some(fourcc_at(source, chunk.data_offset(), "strh")?);
            }
            STRF if info.video.is_none() && current_type.map_or(true, |t| t == VIDS) => {
                let data = chunk_data(source, &chunk, BITMAPINFOHEADER_MIN_LEN)?;
                if data.len() < BITMAPINFOHEADER_MIN_LEN {
                    return Err(AviError::InvalidFormat(format!(
                        "strf holds {} bytes, too short for BITMAPINFOHEADER",
                        data.len()
                    )));
                }
                let codec = [data[16], data[17], data[18], data[19]];
                if !codec.eq_ignore_ascii_case(&MJPEG_FOURCC) {
                    return Err(AviError::UnsupportedCodec(DisplayFourCc(&codec).to_string()));
                }
                let width = i32_le(&data, 4).unwrap_or(0).unsigned_abs();
                // Negative height marks a top-down bitmap.
                let height = i32_le(&data, 8).unwrap_or(0).unsigned_abs();
                info.video = Some(VideoFormat {
                    width,
                    height,
                    codec,
                    stream: streams_seen.saturating_sub(1),
                });
            }
            _ => {}
        }
        offset = chunk.next_offset();
    }

    if info.total_frames.is_none() {
        log::warn!("AVI header has no avih chunk; frame count unknown");
    }
    if info.video.is_none() {
        return Err(AviError::MissingChunk("strf"));
    }
    Ok(info)
}

fn header_at(source: &mut dyn ByteSource, offset: u64, within: &str) -> Result<ChunkHeader, AviError> {
    read_chunk_header(source, offset).map_err(|e| truncated(e, within, offset))
}

fn fourcc_at(source: &mut dyn ByteSource, offset: u64, within: &str) -> Result<FourCc, AviError> {
    read_fourcc(source, offset).map_err(|e| truncated(e, within, offset))
}

/// Reads at most `limit` bytes of the chunk body.
fn chunk_data(source: &mut dyn ByteSource, chunk: &ChunkHeader, limit: usize) -> Result<Vec<u8>, AviError> {
    let mut data = vec![0u8; (chunk.size as usize).min(limit)];
    read_exact_at(source, chunk.data_offset(), &mut data).map_err(|e| {
        truncated(e, &DisplayFourCc(&chunk.id).to_string(), chunk.data_offset())
    })?;
    Ok(data)
}

fn truncated(err: SourceError, chunk: &str, offset: u64) -> AviError {
    match err {
        SourceError::Eof => AviError::Truncated {
            chunk: chunk.to_string(),
            offset,
        },
        other => AviError::Source(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::infrastructure::avi_fixtures::*;
    use crate::source::infrastructure::file_source::FileSource;
    use std::io::Cursor;

    fn parse(bytes: Vec<u8>) -> Result<AviIndex, AviError> {
        let len = bytes.len() as u64;
        let mut source = FileSource::from_reader(Cursor::new(bytes), len, "memory.avi");
        AviIndex::parse(&mut source)
    }

    #[test]
    fn test_parse_minimal_mjpeg_avi() {
        let frame = fake_jpeg(10, 0x11);
        let bytes = mjpeg_avi(128, 64, &[chunk(b"00dc", &frame)]);
        let index = parse(bytes.clone()).unwrap();

        assert_eq!((index.width, index.height), (128, 64));
        assert!(index.is_mjpeg_codec());
        assert_eq!(index.declared_frame_count, Some(1));
        assert_eq!(index.declared_fps(), Some(10.0));
        assert_eq!(index.video_stream, 0);
        assert_eq!(index.movi_payload_offset as usize, offset_of(&bytes, b"movi") + 4);
        assert_eq!(index.movi_end, bytes.len() as u64);
    }

    #[test]
    fn test_lowercase_codec_tag_is_accepted() {
        let bytes = riff_avi(&[
            video_hdrl(32, 16, b"mjpg", 0),
            list(b"movi", &[]),
        ]);
        let index = parse(bytes).unwrap();
        assert!(index.is_mjpeg_codec());
        assert_eq!(index.declared_frame_count, None);
    }

    #[test]
    fn test_non_mjpeg_codec_is_rejected() {
        let bytes = riff_avi(&[video_hdrl(32, 16, b"H264", 1), list(b"movi", &[])]);
        match parse(bytes) {
            Err(AviError::UnsupportedCodec(tag)) => assert_eq!(tag, "H264"),
            other => panic!("expected UnsupportedCodec, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_magic_is_invalid_format() {
        let mut bytes = mjpeg_avi(8, 8, &[]);
        bytes[0..4].copy_from_slice(b"RIFX");
        assert!(matches!(parse(bytes), Err(AviError::InvalidFormat(_))));
    }

    #[test]
    fn test_wrong_form_type_is_invalid_format() {
        let mut bytes = mjpeg_avi(8, 8, &[]);
        bytes[8..12].copy_from_slice(b"WAVE");
        assert!(matches!(parse(bytes), Err(AviError::InvalidFormat(_))));
    }

    #[test]
    fn test_short_file_is_invalid_format() {
        assert!(matches!(parse(b"RIFF".to_vec()), Err(AviError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_movi() {
        let bytes = riff_avi(&[video_hdrl(8, 8, b"MJPG", 0)]);
        assert!(matches!(parse(bytes), Err(AviError::MissingChunk("movi"))));
    }

    #[test]
    fn test_missing_hdrl() {
        let bytes = riff_avi(&[list(b"movi", &[chunk(b"00dc", &fake_jpeg(4, 0))])]);
        assert!(matches!(parse(bytes), Err(AviError::MissingChunk("hdrl"))));
    }

    #[test]
    fn test_hdrl_without_strf() {
        let bytes = riff_avi(&[
            list(b"hdrl", &[avih(1, 100_000, 0), list(b"strl", &[strh(b"vids")])]),
            list(b"movi", &[]),
        ]);
        assert!(matches!(parse(bytes), Err(AviError::MissingChunk("strf"))));
    }

    #[test]
    fn test_odd_sized_chunk_before_hdrl_keeps_alignment() {
        let bytes = riff_avi(&[
            chunk(b"JUNK", &[0xAA; 5]),
            video_hdrl(64, 48, b"MJPG", 2),
            chunk(b"JUNK", &[0xBB; 3]),
            list(b"movi", &[]),
        ]);
        let index = parse(bytes).unwrap();
        assert_eq!((index.width, index.height), (64, 48));
    }

    #[test]
    fn test_video_stream_after_audio_stream_is_selected() {
        let mut audio_format = vec![0u8; 18];
        audio_format[0] = 1;
        let bytes = riff_avi(&[
            list(
                b"hdrl",
                &[
                    avih(3, 40_000, 4096),
                    list(b"strl", &[strh(b"auds"), chunk(b"strf", &audio_format)]),
                    list(b"strl", &[strh(b"vids"), strf_video(320, -240, b"MJPG")]),
                ],
            ),
            list(b"movi", &[]),
        ]);
        let index = parse(bytes).unwrap();
        assert_eq!(index.video_stream, 1);
        assert_eq!((index.width, index.height), (320, 240));
        assert_eq!(index.estimated_frame_size, Some(4096));
        assert_eq!(index.declared_fps(), Some(25.0));
    }

    #[test]
    fn test_truncated_strf_is_reported() {
        let mut bytes = riff_avi(&[video_hdrl(8, 8, b"MJPG", 0), list(b"movi", &[])]);
        let strf = offset_of(&bytes, b"strf");
        bytes.truncate(strf + 12);
        let result = parse(bytes);
        assert!(
            matches!(result, Err(AviError::Truncated { .. }) | Err(AviError::MissingChunk(_))),
            "got {result:?}"
        );
    }
}
