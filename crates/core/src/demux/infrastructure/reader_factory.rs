use std::path::Path;

use crate::demux::domain::demux_error::OpenError;
use crate::demux::domain::frame_reader::FrameReader;
use crate::demux::infrastructure::avi_index::AviIndex;
use crate::demux::infrastructure::avi_reader::AviFrameReader;
use crate::demux::infrastructure::mjpeg_reader::{HttpFrameReader, MjpegFileReader};
use crate::demux::infrastructure::riff::DisplayFourCc;
use crate::shared::pump_config::PumpConfig;
use crate::shared::stream_metadata::StreamMetadata;
use crate::source::domain::byte_source::{read_full, ByteSource};
use crate::source::domain::source_descriptor::{sniff_container, ContainerKind, Sniffed, SourceDescriptor};
use crate::source::domain::source_error::SourceError;
use crate::source::infrastructure::file_source::FileSource;
use crate::source::infrastructure::http_source::HttpSource;

/// Opens the source and builds the reader for its container.
///
/// Container choice: explicit hint, then file extension, then the first
/// bytes of a local file. Anything undetermined is read as raw MJPEG.
pub fn open_reader(
    descriptor: &SourceDescriptor,
    hint: Option<ContainerKind>,
    config: &PumpConfig,
) -> Result<Box<dyn FrameReader>, OpenError> {
    config.validate()?;
    match descriptor {
        SourceDescriptor::Path(path) => open_file(path, descriptor, hint, config),
        SourceDescriptor::Url(url) => open_http(url, descriptor, hint, config),
    }
}

fn open_file(
    path: &Path,
    descriptor: &SourceDescriptor,
    hint: Option<ContainerKind>,
    config: &PumpConfig,
) -> Result<Box<dyn FrameReader>, OpenError> {
    let mut source = FileSource::open(path)?;
    let container = match hint.or_else(|| descriptor.container_from_extension()) {
        Some(kind) => kind,
        None => sniff(&mut source)?,
    };
    source.seek(0)?;
    open_local(source, descriptor.clone(), container, config)
}

/// Builds a reader over any local byte source.
pub fn open_local<S: ByteSource + 'static>(
    mut source: S,
    descriptor: SourceDescriptor,
    container: ContainerKind,
    config: &PumpConfig,
) -> Result<Box<dyn FrameReader>, OpenError> {
    match container {
        ContainerKind::Avi => {
            let index = AviIndex::parse(&mut source)?;
            let (width, height) = if index.width > 0 && index.height > 0 {
                (index.width, index.height)
            } else {
                (config.default_width, config.default_height)
            };
            log::info!(
                "AVI: {width}x{height}, {} frames declared, movi at {}..{}",
                index
                    .declared_frame_count
                    .map_or_else(|| "unknown".to_string(), |n| n.to_string()),
                index.movi_payload_offset,
                index.movi_end
            );
            let metadata = StreamMetadata {
                declared_fps: index.declared_fps(),
                declared_frames: index.declared_frame_count,
                codec: DisplayFourCc(&index.codec).to_string(),
                ..StreamMetadata::with_defaults(descriptor, ContainerKind::Avi, width, height)
            };
            Ok(Box::new(AviFrameReader::new(
                source,
                index,
                config.scratch_capacity,
                metadata,
            )))
        }
        ContainerKind::RawMjpeg => {
            let metadata = StreamMetadata::with_defaults(
                descriptor,
                ContainerKind::RawMjpeg,
                config.default_width,
                config.default_height,
            );
            Ok(Box::new(MjpegFileReader::new(
                source,
                config.scratch_capacity,
                config.loop_playback,
                metadata,
            )))
        }
    }
}

fn sniff(source: &mut dyn ByteSource) -> Result<ContainerKind, OpenError> {
    let mut head = [0u8; 12];
    let n = match read_full(source, &mut head) {
        Ok(n) => n,
        Err(SourceError::Eof) => 0,
        Err(e) => return Err(e.into()),
    };
    match sniff_container(&head[..n]) {
        Sniffed::Container(kind) => Ok(kind),
        Sniffed::Unsupported(name) => Err(OpenError::UnsupportedContainer(name.to_string())),
        Sniffed::Unknown => {
            log::warn!("Could not detect container, reading as raw MJPEG");
            Ok(ContainerKind::RawMjpeg)
        }
    }
}

fn open_http(
    url: &str,
    descriptor: &SourceDescriptor,
    hint: Option<ContainerKind>,
    config: &PumpConfig,
) -> Result<Box<dyn FrameReader>, OpenError> {
    let container = hint
        .or_else(|| descriptor.container_from_extension())
        .unwrap_or(ContainerKind::RawMjpeg);
    if container == ContainerKind::Avi {
        log::warn!("{url}: AVI over HTTP is read per response with the JPEG marker scan");
    }
    let source = HttpSource::open(url, config)?;
    let metadata = StreamMetadata::with_defaults(
        descriptor.clone(),
        container,
        config.default_width,
        config.default_height,
    );
    Ok(Box::new(HttpFrameReader::new(
        source,
        config.scratch_capacity,
        metadata,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::domain::demux_error::AviError;
    use crate::demux::infrastructure::avi_fixtures::*;
    use rstest::rstest;

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> SourceDescriptor {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        SourceDescriptor::Path(path)
    }

    #[test]
    fn test_avi_by_extension_uses_header_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let frame = fake_jpeg(10, 0x42);
        let desc = write(&dir, "movie.avi", &mjpeg_avi(160, 120, &[chunk(b"00dc", &frame)]));
        let mut reader = open_reader(&desc, None, &PumpConfig::default()).unwrap();
        assert_eq!(reader.metadata().container, ContainerKind::Avi);
        assert_eq!((reader.metadata().width, reader.metadata().height), (160, 120));
        assert_eq!(reader.metadata().declared_frames, Some(1));
        assert_eq!(reader.metadata().codec, "MJPG");
        assert_eq!(reader.next_frame().unwrap(), frame.as_slice());
    }

    #[test]
    fn test_avi_metadata_keeps_codec_tag_as_written() {
        let dir = tempfile::tempdir().unwrap();
        let frame = fake_jpeg(10, 0x42);
        let bytes = riff_avi(&[
            video_hdrl(32, 16, b"mjpg", 1),
            list(b"movi", &[chunk(b"00dc", &frame)]),
        ]);
        let desc = write(&dir, "lower.avi", &bytes);
        let reader = open_reader(&desc, None, &PumpConfig::default()).unwrap();
        assert_eq!(reader.metadata().codec, "mjpg");
    }

    #[test]
    fn test_raw_mjpeg_metadata_reports_jpeg_codec() {
        let dir = tempfile::tempdir().unwrap();
        let desc = write(&dir, "clip.mjpeg", &fake_jpeg(6, 0x01));
        let reader = open_reader(&desc, None, &PumpConfig::default()).unwrap();
        assert_eq!(reader.metadata().codec, "mjpeg");
    }

    #[rstest]
    #[case::avi_sniffed(mjpeg_avi(8, 8, &[]), ContainerKind::Avi)]
    #[case::jpeg_sniffed(fake_jpeg(6, 0x01), ContainerKind::RawMjpeg)]
    #[case::unknown_defaults_to_mjpeg(vec![0x00; 16], ContainerKind::RawMjpeg)]
    #[case::empty_defaults_to_mjpeg(vec![], ContainerKind::RawMjpeg)]
    fn test_container_sniffed_without_extension(#[case] bytes: Vec<u8>, #[case] expected: ContainerKind) {
        let dir = tempfile::tempdir().unwrap();
        let desc = write(&dir, "stream.bin", &bytes);
        let reader = open_reader(&desc, None, &PumpConfig::default()).unwrap();
        assert_eq!(reader.metadata().container, expected);
    }

    #[test]
    fn test_hint_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let desc = write(&dir, "movie.avi", &fake_jpeg(6, 0x01));
        let reader = open_reader(&desc, Some(ContainerKind::RawMjpeg), &PumpConfig::default()).unwrap();
        assert_eq!(reader.metadata().container, ContainerKind::RawMjpeg);
        assert_eq!((reader.metadata().width, reader.metadata().height), (128, 64));
    }

    #[test]
    fn test_mp4_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![0, 0, 0, 0x18];
        bytes.extend_from_slice(b"ftypisom");
        let desc = write(&dir, "clip.mp4", &bytes);
        match open_reader(&desc, None, &PumpConfig::default()) {
            Err(OpenError::UnsupportedContainer(name)) => assert_eq!(name, "mp4"),
            Err(e) => panic!("expected UnsupportedContainer, got {e}"),
            Ok(_) => panic!("expected UnsupportedContainer"),
        }
    }

    #[test]
    fn test_broken_avi_fails_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let desc = write(&dir, "broken.avi", &riff_avi(&[video_hdrl(8, 8, b"MJPG", 0)]));
        assert!(matches!(
            open_reader(&desc, None, &PumpConfig::default()),
            Err(OpenError::Avi(AviError::MissingChunk("movi")))
        ));
    }

    #[test]
    fn test_missing_file_fails_at_open() {
        let desc = SourceDescriptor::parse("/nonexistent/movie.avi");
        assert!(matches!(
            open_reader(&desc, None, &PumpConfig::default()),
            Err(OpenError::Source(SourceError::NotFound(_)))
        ));
    }

    #[test]
    fn test_invalid_config_fails_at_open() {
        let desc = SourceDescriptor::parse("/nonexistent/movie.avi");
        let config = PumpConfig {
            target_fps: 0,
            ..Default::default()
        };
        assert!(matches!(open_reader(&desc, None, &config), Err(OpenError::Config(_))));
    }

    #[test]
    fn test_url_opens_network_reader_without_connecting() {
        let desc = SourceDescriptor::parse("http://127.0.0.1:9/stream.avi");
        let reader = open_reader(&desc, None, &PumpConfig::default()).unwrap();
        assert!(reader.is_network());
        assert_eq!(reader.metadata().container, ContainerKind::Avi);
    }
}
