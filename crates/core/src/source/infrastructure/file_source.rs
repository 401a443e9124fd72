use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::source::domain::byte_source::ByteSource;
use crate::source::domain::source_error::SourceError;

/// Buffered local file (or any `Read + Seek`) exposed as a [`ByteSource`].
pub struct FileSource<R = BufReader<File>> {
    reader: R,
    path: PathBuf,
    len: u64,
    position: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
            _ => SourceError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let len = file
            .metadata()
            .map_err(|e| SourceError::Io {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();
        log::info!("File opened: {}, size: {len} bytes", path.display());
        Ok(Self::from_reader(BufReader::new(file), len, path))
    }
}

impl<R: Read + Seek + Send> FileSource<R> {
    /// Wraps an already-open reader; `label` is only used in error messages.
    pub fn from_reader(reader: R, len: u64, label: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: label.into(),
            len,
            position: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<R: Read + Seek + Send> ByteSource for FileSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = loop {
            match self.reader.read(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.io_error(e)),
            }
        };
        if n == 0 {
            return Err(SourceError::Eof);
        }
        self.position += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: u64) -> Result<(), SourceError> {
        if offset == self.position {
            return Ok(());
        }
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| self.io_error(e))?;
        self.position = offset;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn len(&self) -> u64 {
        self.len
    }
}
