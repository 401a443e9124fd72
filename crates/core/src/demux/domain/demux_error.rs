use thiserror::Error;

use crate::shared::pump_config::ConfigError;
use crate::source::domain::source_error::SourceError;

/// Failure of a single frame read. Everything except `EndOfStream` is
/// transient and counted against the consecutive-error threshold.
#[derive(Error, Debug)]
pub enum DemuxError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("no JPEG start-of-image marker in {scanned}-byte window")]
    MarkerNotFound { scanned: usize },
    #[error("frame of {size} bytes exceeds the {capacity}-byte scratch buffer")]
    FrameTooLarge { size: u64, capacity: usize },
    #[error("no video chunk found in movi list")]
    NoVideoChunk,
    #[error("end of stream")]
    EndOfStream,
}

impl DemuxError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, DemuxError::EndOfStream)
    }
}

/// Structural problems found while indexing an AVI file at open time.
#[derive(Error, Debug)]
pub enum AviError {
    #[error("not an AVI file: {0}")]
    InvalidFormat(String),
    #[error("required chunk '{0}' not found")]
    MissingChunk(&'static str),
    #[error("unsupported codec '{0}' (only MJPG is supported)")]
    UnsupportedCodec(String),
    #[error("file truncated inside '{chunk}' at offset {offset}")]
    Truncated { chunk: String, offset: u64 },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Fatal errors while opening a session; the session never starts.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Avi(#[from] AviError),
    #[error("unsupported container format: {0}")]
    UnsupportedContainer(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
