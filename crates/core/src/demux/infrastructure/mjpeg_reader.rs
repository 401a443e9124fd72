use std::sync::Arc;

use crate::demux::domain::demux_error::DemuxError;
use crate::demux::domain::frame_reader::FrameReader;
use crate::demux::domain::scratch_buffer::ScratchBuffer;
use crate::demux::infrastructure::marker_scan::{find_eoi, find_soi, locate_frame};
use crate::shared::constants::SOI_MARKER;
use crate::shared::sleeper::Sleeper;
use crate::shared::stream_metadata::StreamMetadata;
use crate::source::domain::byte_source::{read_full, ByteSource};
use crate::source::domain::source_error::SourceError;
use crate::source::infrastructure::http_source::{HttpSource, HttpTransport, ReqwestTransport};

enum Scan {
    /// Frame occupies `scratch[..len]`.
    Frame(usize),
    /// Drop this many garbage bytes and look again.
    Skip(usize),
}

/// Concatenated JPEG images in a local file.
///
/// Each read fills the scratch buffer from the cursor, aligns it on the
/// next SOI marker and cuts the frame at the following EOI, so the cursor
/// always rests on the byte after the last delivered frame.
pub struct MjpegFileReader<S> {
    source: S,
    scratch: ScratchBuffer,
    cursor: u64,
    loop_playback: bool,
    metadata: StreamMetadata,
}

impl<S: ByteSource> MjpegFileReader<S> {
    pub fn new(source: S, scratch_capacity: usize, loop_playback: bool, metadata: StreamMetadata) -> Self {
        Self {
            source,
            scratch: ScratchBuffer::new(scratch_capacity),
            cursor: 0,
            loop_playback,
            metadata,
        }
    }

    fn fill(&mut self) -> Result<usize, SourceError> {
        self.source.seek(self.cursor)?;
        read_full(&mut self.source, self.scratch.as_mut_slice())
    }

    fn scan(&mut self, filled: usize) -> Result<Scan, DemuxError> {
        let capacity = self.scratch.capacity();
        let window = &self.scratch.as_slice()[..filled];
        match find_soi(window) {
            None => {
                // Keep the last byte: it may be the 0xFF of a split marker.
                self.cursor += filled.saturating_sub(1).max(1) as u64;
                return Err(DemuxError::MarkerNotFound { scanned: filled });
            }
            Some(0) => {}
            Some(k) => return Ok(Scan::Skip(k)),
        }
        match find_eoi(window, SOI_MARKER.len()) {
            Some(eoi) => {
                let end = eoi + 2;
                self.cursor += end as u64;
                Ok(Scan::Frame(end))
            }
            None if filled < capacity => {
                // Unterminated tail of the file; the decoder has the final say.
                self.cursor += filled as u64;
                Ok(Scan::Frame(filled))
            }
            None => {
                self.cursor += SOI_MARKER.len() as u64;
                let remaining = self.source.len().saturating_sub(self.cursor);
                Err(DemuxError::FrameTooLarge {
                    size: remaining.max(capacity as u64 + 1),
                    capacity,
                })
            }
        }
    }
}

impl<S: ByteSource> FrameReader for MjpegFileReader<S> {
    fn next_frame(&mut self) -> Result<&[u8], DemuxError> {
        let mut wrapped = false;
        let len = loop {
            let filled = match self.fill() {
                Ok(n) => n,
                Err(SourceError::Eof) if self.loop_playback && !wrapped && self.cursor > 0 => {
                    log::info!("End of {}, looping", self.metadata.source);
                    self.cursor = 0;
                    wrapped = true;
                    continue;
                }
                Err(SourceError::Eof) => return Err(DemuxError::EndOfStream),
                Err(e) => return Err(e.into()),
            };
            match self.scan(filled)? {
                Scan::Frame(len) => break len,
                Scan::Skip(k) => {
                    log::debug!("Skipping {k} bytes before SOI at offset {}", self.cursor);
                    self.cursor += k as u64;
                }
            }
        };
        Ok(&self.scratch.as_slice()[..len])
    }

    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn cursor(&self) -> u64 {
        self.cursor
    }
}

/// One JPEG per HTTP response body, located with the marker scan.
pub struct HttpFrameReader<T: HttpTransport = ReqwestTransport> {
    source: HttpSource<T>,
    scratch: ScratchBuffer,
    metadata: StreamMetadata,
}

impl<T: HttpTransport> HttpFrameReader<T> {
    pub fn new(source: HttpSource<T>, scratch_capacity: usize, metadata: StreamMetadata) -> Self {
        Self {
            source,
            scratch: ScratchBuffer::new(scratch_capacity),
            metadata,
        }
    }
}

impl<T: HttpTransport> FrameReader for HttpFrameReader<T> {
    fn next_frame(&mut self) -> Result<&[u8], DemuxError> {
        let filled = self.source.read_chunk(self.scratch.as_mut_slice())?;
        let bounds = locate_frame(&self.scratch.as_slice()[..filled])
            .ok_or(DemuxError::MarkerNotFound { scanned: filled })?;
        if bounds.start > 0 {
            log::debug!("Dropped {} bytes before SOI in response", bounds.start);
        }
        Ok(&self.scratch.as_slice()[bounds.start..bounds.end_or(filled)])
    }

    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn is_network(&self) -> bool {
        true
    }

    fn reset_transport(&mut self) -> Result<(), DemuxError> {
        Ok(self.source.reset_transport()?)
    }

    fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.source.set_sleeper(sleeper);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::infrastructure::avi_fixtures::fake_jpeg;
    use crate::shared::pump_config::PumpConfig;
    use crate::source::domain::source_descriptor::{ContainerKind, SourceDescriptor};
    use crate::source::infrastructure::file_source::FileSource;
    use crate::source::infrastructure::http_source::{HttpResponse, TransportError};
    use rstest::rstest;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn metadata() -> StreamMetadata {
        StreamMetadata::with_defaults(
            SourceDescriptor::Path(PathBuf::from("memory.mjpeg")),
            ContainerKind::RawMjpeg,
            128,
            64,
        )
    }

    fn reader(bytes: Vec<u8>, capacity: usize, looping: bool) -> MjpegFileReader<FileSource<Cursor<Vec<u8>>>> {
        let len = bytes.len() as u64;
        MjpegFileReader::new(
            FileSource::from_reader(Cursor::new(bytes), len, "memory.mjpeg"),
            capacity,
            looping,
            metadata(),
        )
    }

    /// Reads until a frame arrives, skipping transient errors.
    fn next_ok<R: FrameReader>(reader: &mut R) -> Vec<u8> {
        for _ in 0..64 {
            match reader.next_frame() {
                Ok(frame) => return frame.to_vec(),
                Err(e) if e.is_end_of_stream() => panic!("unexpected end of stream"),
                Err(_) => continue,
            }
        }
        panic!("no frame after 64 reads");
    }

    #[test]
    fn test_consecutive_frames_in_order() {
        let a = fake_jpeg(10, 0x01);
        let b = fake_jpeg(14, 0x02);
        let mut r = reader([a.clone(), b.clone()].concat(), 64, false);

        assert_eq!(r.next_frame().unwrap(), a.as_slice());
        assert_eq!(r.cursor(), 10);
        assert_eq!(r.next_frame().unwrap(), b.as_slice());
        assert!(r.next_frame().unwrap_err().is_end_of_stream());
    }

    #[rstest]
    #[case::no_garbage(0)]
    #[case::one_byte(1)]
    #[case::half_window(16)]
    #[case::window_minus_one(31)]
    #[case::full_window(32)]
    fn test_garbage_prefix_is_discarded_exactly(#[case] garbage: usize) {
        let frame = fake_jpeg(12, 0x33);
        let bytes = [vec![0x5A; garbage], frame.clone()].concat();
        let mut r = reader(bytes, 32, false);

        assert_eq!(next_ok(&mut r), frame);
        assert_eq!(r.cursor(), (garbage + frame.len()) as u64);
    }

    #[test]
    fn test_window_without_soi_is_marker_not_found() {
        let mut r = reader(vec![0x00; 40], 16, false);
        assert!(matches!(
            r.next_frame(),
            Err(DemuxError::MarkerNotFound { scanned: 16 })
        ));
        assert_eq!(r.cursor(), 15);
    }

    #[test]
    fn test_oversize_frame_is_rejected_and_skipped() {
        let big = fake_jpeg(40, 0x44);
        let small = fake_jpeg(8, 0x55);
        let mut r = reader([big, small.clone()].concat(), 16, false);

        assert!(matches!(
            r.next_frame(),
            Err(DemuxError::FrameTooLarge { capacity: 16, .. })
        ));
        assert_eq!(next_ok(&mut r), small);
    }

    #[test]
    fn test_unterminated_tail_is_delivered_as_candidate() {
        let mut bytes = fake_jpeg(8, 0x01);
        bytes.extend_from_slice(&[0xFF, 0xD8, 0x07, 0x07]);
        let mut r = reader(bytes, 64, false);
        r.next_frame().unwrap();
        assert_eq!(r.next_frame().unwrap(), &[0xFF, 0xD8, 0x07, 0x07]);
        assert!(r.next_frame().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_loop_playback_restarts_at_zero() {
        let a = fake_jpeg(6, 0x01);
        let mut r = reader(a.clone(), 64, true);
        assert_eq!(r.next_frame().unwrap(), a.as_slice());
        assert_eq!(r.next_frame().unwrap(), a.as_slice());
        assert_eq!(r.cursor(), 6);
    }

    #[test]
    fn test_empty_file_with_loop_still_ends() {
        let mut r = reader(Vec::new(), 64, true);
        assert!(r.next_frame().unwrap_err().is_end_of_stream());
    }

    struct CannedTransport {
        bodies: VecDeque<Vec<u8>>,
        resets: u32,
    }

    impl HttpTransport for CannedTransport {
        fn get(&mut self, _url: &str, buf: &mut [u8]) -> Result<HttpResponse, TransportError> {
            let body = self.bodies.pop_front().ok_or(TransportError::Status(503))?;
            let n = body.len().min(buf.len());
            buf[..n].copy_from_slice(&body[..n]);
            Ok(HttpResponse {
                content_type: Some("image/jpeg".to_string()),
                body_len: n,
                truncated: body.len() > buf.len(),
            })
        }

        fn reset(&mut self) -> Result<(), TransportError> {
            self.resets += 1;
            Ok(())
        }
    }

    fn http_reader(bodies: Vec<Vec<u8>>) -> HttpFrameReader<CannedTransport> {
        let transport = CannedTransport {
            bodies: bodies.into(),
            resets: 0,
        };
        let source = HttpSource::with_transport(transport, "http://cam.local/jpg", &PumpConfig::default());
        HttpFrameReader::new(source, 64, metadata())
    }

    #[test]
    fn test_http_frame_is_cut_at_markers() {
        let frame = fake_jpeg(10, 0x21);
        let body = [vec![0x0D, 0x0A], frame.clone(), vec![0x0D, 0x0A]].concat();
        let mut r = http_reader(vec![body]);
        assert!(r.is_network());
        assert_eq!(r.next_frame().unwrap(), frame.as_slice());
    }

    #[test]
    fn test_http_body_without_soi_is_marker_not_found() {
        let mut r = http_reader(vec![b"<html>oops</html>".to_vec()]);
        assert!(matches!(r.next_frame(), Err(DemuxError::MarkerNotFound { .. })));
    }

    #[test]
    fn test_http_status_error_surfaces_as_source_error() {
        let mut r = http_reader(vec![]);
        assert!(matches!(
            r.next_frame(),
            Err(DemuxError::Source(SourceError::Status { status: 503, .. }))
        ));
    }

    #[test]
    fn test_http_reset_transport_reaches_transport() {
        let mut r = http_reader(vec![]);
        r.reset_transport().unwrap();
        assert_eq!(r.source_transport_resets(), 1);
    }

    impl HttpFrameReader<CannedTransport> {
        fn source_transport_resets(&self) -> u32 {
            self.source.transport().resets
        }
    }
}
