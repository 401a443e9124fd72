use std::sync::Arc;

use crate::demux::domain::demux_error::DemuxError;
use crate::shared::sleeper::Sleeper;
use crate::shared::stream_metadata::StreamMetadata;

/// Yields compressed JPEG frames one at a time.
///
/// The returned slice borrows the reader's scratch buffer and is only valid
/// until the next call.
pub trait FrameReader: Send {
    fn next_frame(&mut self) -> Result<&[u8], DemuxError>;

    fn metadata(&self) -> &StreamMetadata;

    /// Byte offset of the next read: file position for raw MJPEG, next chunk
    /// header for AVI. Always zero for network sources.
    fn cursor(&self) -> u64 {
        0
    }

    fn is_network(&self) -> bool {
        false
    }

    /// Tears down and re-establishes the underlying connection, if any.
    fn reset_transport(&mut self) -> Result<(), DemuxError> {
        Ok(())
    }

    /// Installs the waiter used for retry delays inside a read.
    fn set_sleeper(&mut self, _sleeper: Arc<dyn Sleeper>) {}
}
