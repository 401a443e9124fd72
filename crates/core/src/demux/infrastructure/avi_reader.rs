use crate::demux::domain::demux_error::DemuxError;
use crate::demux::domain::frame_reader::FrameReader;
use crate::demux::domain::scratch_buffer::ScratchBuffer;
use crate::demux::infrastructure::avi_index::AviIndex;
use crate::demux::infrastructure::marker_scan::find_soi;
use crate::demux::infrastructure::riff::{
    is_video_chunk, read_chunk_header, read_fourcc, DisplayFourCc, CHUNK_HEADER_LEN, LIST,
};
use crate::shared::stream_metadata::StreamMetadata;
use crate::source::domain::byte_source::{read_exact_at, ByteSource};
use crate::source::domain::source_error::SourceError;

enum Step {
    /// Payload sits in `scratch[start..end]`.
    Frame { start: usize, end: usize },
    Continue,
    /// Cursor ran past the end of `movi`.
    EndOfMovi,
}

/// Walks `movi` chunk by chunk, returning video payloads and looping back to
/// the first chunk when the list is exhausted.
pub struct AviFrameReader<S> {
    source: S,
    index: AviIndex,
    scratch: ScratchBuffer,
    cursor: u64,
    metadata: StreamMetadata,
}

impl<S: ByteSource> AviFrameReader<S> {
    pub fn new(source: S, index: AviIndex, scratch_capacity: usize, metadata: StreamMetadata) -> Self {
        if let Some(suggested) = index.estimated_frame_size {
            if suggested as usize > scratch_capacity {
                log::warn!(
                    "AVI suggests {suggested}-byte frames but the scratch buffer holds {scratch_capacity}; larger frames will be skipped"
                );
            }
        }
        let cursor = index.movi_payload_offset;
        Self {
            source,
            index,
            scratch: ScratchBuffer::new(scratch_capacity),
            cursor,
            metadata,
        }
    }

    pub fn index(&self) -> &AviIndex {
        &self.index
    }

    fn step(&mut self) -> Result<Step, DemuxError> {
        let movi_end = self.index.movi_end;
        if self.cursor + CHUNK_HEADER_LEN > movi_end {
            return Ok(Step::EndOfMovi);
        }
        let chunk = match read_chunk_header(&mut self.source, self.cursor) {
            Ok(chunk) => chunk,
            Err(SourceError::Eof) => return Ok(Step::EndOfMovi),
            Err(e) => return Err(e.into()),
        };

        if chunk.id == LIST {
            // `rec ` groups (and any other list) are entered, not skipped.
            let kind = read_fourcc(&mut self.source, chunk.data_offset())?;
            log::debug!("Entering LIST '{}' at {}", DisplayFourCc(&kind), self.cursor);
            self.cursor = chunk.data_offset() + 4;
            return Ok(Step::Continue);
        }

        let next = chunk.next_offset();
        if !is_video_chunk(&chunk.id, self.index.video_stream) {
            log::debug!(
                "Skipping '{}' chunk at {}, {} bytes",
                DisplayFourCc(&chunk.id),
                self.cursor,
                chunk.size
            );
            self.cursor = next;
            return Ok(Step::Continue);
        }
        if chunk.size == 0 {
            self.cursor = next;
            return Ok(Step::Continue);
        }
        if chunk.data_end() > movi_end {
            log::warn!("Video chunk at {} runs past the end of movi", self.cursor);
            self.cursor = movi_end;
            return Ok(Step::EndOfMovi);
        }

        let capacity = self.scratch.capacity();
        let size = chunk.size as usize;
        if size > capacity {
            self.cursor = next;
            return Err(DemuxError::FrameTooLarge {
                size: u64::from(chunk.size),
                capacity,
            });
        }

        self.cursor = next;
        match read_exact_at(&mut self.source, chunk.data_offset(), &mut self.scratch.as_mut_slice()[..size]) {
            Ok(()) => {}
            Err(SourceError::Eof) => return Ok(Step::EndOfMovi),
            Err(e) => return Err(e.into()),
        }

        let payload = &self.scratch.as_slice()[..size];
        match find_soi(payload) {
            Some(0) => Ok(Step::Frame { start: 0, end: size }),
            Some(start) => {
                log::debug!("Video chunk payload has {start} bytes before SOI");
                Ok(Step::Frame { start, end: size })
            }
            None => Err(DemuxError::MarkerNotFound { scanned: size }),
        }
    }
}

impl<S: ByteSource> FrameReader for AviFrameReader<S> {
    fn next_frame(&mut self) -> Result<&[u8], DemuxError> {
        let mut wrapped = false;
        let (start, end) = loop {
            match self.step()? {
                Step::Frame { start, end } => break (start, end),
                Step::Continue => {}
                Step::EndOfMovi if wrapped => return Err(DemuxError::NoVideoChunk),
                Step::EndOfMovi => {
                    log::debug!("End of movi, looping to {}", self.index.movi_payload_offset);
                    self.cursor = self.index.movi_payload_offset;
                    wrapped = true;
                }
            }
        };
        Ok(&self.scratch.as_slice()[start..end])
    }

    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn cursor(&self) -> u64 {
        self.cursor
    }
}
