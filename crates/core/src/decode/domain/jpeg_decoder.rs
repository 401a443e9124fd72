use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("frame is empty")]
    Empty,
    #[error("frame does not start with a JPEG start-of-image marker")]
    InvalidMarker,
    #[error("JPEG decode failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Turns one compressed JPEG into RGB565 pixels.
pub trait JpegDecoder: Send {
    /// Decodes into `pixels`, reusing its allocation, and returns `(width, height)`.
    /// On error the contents of `pixels` are unspecified.
    fn decode_into(&mut self, jpeg: &[u8], pixels: &mut Vec<u16>) -> Result<(u32, u32), DecodeError>;
}
