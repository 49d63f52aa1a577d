//! Raw byte-stream input: daemon traffic saved to a file, piped on stdin or
//! read from a socket, delivered in arbitrary chunks.

use std::io::{ErrorKind, Read};

use bytes::Bytes;

use super::SourceError;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Sequential chunks of one byte stream. Chunk boundaries carry no meaning.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError>;
}

/// `ChunkSource` over any [`Read`].
///
/// # Examples
/// ```
/// use ds485_core::{ChunkSource, ReaderSource};
///
/// let mut source = ReaderSource::with_chunk_size(&[0x02, 0x03, 0x00, 0x02][..], 3);
/// assert_eq!(&source.next_chunk()?.unwrap()[..], &[0x02, 0x03, 0x00]);
/// assert_eq!(&source.next_chunk()?.unwrap()[..], &[0x02]);
/// assert!(source.next_chunk()?.is_none());
/// # Ok::<(), ds485_core::SourceError>(())
/// ```
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
    bytes_read: u64,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// A zero chunk size is bumped to one byte.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    self.bytes_read += n as u64;
                    return Ok(Some(Bytes::from(buf)));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SourceError::Io(err)),
            }
        }
    }
}
