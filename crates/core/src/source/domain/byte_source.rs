use crate::source::domain::source_error::SourceError;

/// Positional byte access to a local stream.
///
/// `read_chunk` returns `Err(SourceError::Eof)` instead of `Ok(0)` once the
/// end is reached, so callers never mistake an empty read for progress.
pub trait ByteSource: Send {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;

    fn seek(&mut self, offset: u64) -> Result<(), SourceError>;

    fn position(&self) -> u64;

    /// Total length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads until `buf` is full or the source ends. Returns `Eof` only when
/// nothing at all could be read.
pub fn read_full(source: &mut dyn ByteSource, buf: &mut [u8]) -> Result<usize, SourceError> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read_chunk(&mut buf[filled..]) {
            Ok(n) => filled += n,
            Err(SourceError::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    if filled == 0 && !buf.is_empty() {
        return Err(SourceError::Eof);
    }
    Ok(filled)
}

/// Reads exactly `buf.len()` bytes at `offset`; a short read is `Eof`.
pub fn read_exact_at(
    source: &mut dyn ByteSource,
    offset: u64,
    buf: &mut [u8],
) -> Result<(), SourceError> {
    source.seek(offset)?;
    if read_full(source, buf)? < buf.len() {
        return Err(SourceError::Eof);
    }
    Ok(())
}
