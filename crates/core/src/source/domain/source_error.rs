use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("gave up on {url} after {attempts} connection attempts")]
    ReconnectExhausted { url: String, attempts: u32 },
    #[error("response body exceeds the {capacity}-byte scratch buffer")]
    FrameTooLarge { capacity: usize },
    #[error("empty response body from {url}")]
    EmptyBody { url: String },
    #[error("interrupted by stop request")]
    Interrupted,
    #[error("end of stream")]
    Eof,
}

impl SourceError {
    pub fn is_eof(&self) -> bool {
        matches!(self, SourceError::Eof)
    }
}
