//! Chunk infrastructure for the chunked model container (MD21)
//!
//! A chunked file is a sequence of `{magic, size, payload}` records. The
//! first one wraps the classic `MD20` image, whose offsets are relative to
//! the start of that payload rather than to the start of the file.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{M2Error, Result};
use crate::io_ext::{ReadExt, WriteExt, stream_len};

/// A chunk header containing magic and size information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// 4-byte magic identifier for the chunk type
    pub magic: [u8; 4],
    /// Size of the chunk data in bytes (excluding header)
    pub size: u32,
}

impl ChunkHeader {
    pub const SIZE: u64 = 8;

    pub fn new(magic: [u8; 4], size: u32) -> Self {
        Self { magic, size }
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = reader.read_magic()?;
        let size = reader.read_u32_le()?;

        Ok(Self { magic, size })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32_le(self.size)?;
        Ok(())
    }

    /// Get the magic as a string for debugging
    pub fn magic_str(&self) -> String {
        String::from_utf8_lossy(&self.magic).to_string()
    }

    pub fn has_magic(&self, magic: &[u8; 4]) -> bool {
        &self.magic == magic
    }
}

/// A view of a stream whose position 0 is an absolute position of the inner stream.
///
/// Reads stop at the optional size limit. Writes are not limited, so the view
/// can grow while a chunk payload is produced.
#[derive(Debug)]
pub struct ChunkStream<S> {
    inner: S,
    start: u64,
    size: Option<u64>,
}

impl<S: Seek> ChunkStream<S> {
    /// Start the view at the current position of `inner`
    pub fn new(mut inner: S) -> Result<Self> {
        let start = inner.stream_position()?;
        Ok(Self {
            inner,
            start,
            size: None,
        })
    }

    /// Limit the view to `size` bytes
    pub fn with_limit(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Absolute position of view position 0
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Resolve a view-relative offset to an absolute position
    pub fn resolve_offset(&self, offset: u32) -> u64 {
        self.start + u64::from(offset)
    }

    pub fn inner(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn end(&mut self) -> io::Result<u64> {
        match self.size {
            Some(size) => Ok(self.start + size),
            None => {
                let current = self.inner.stream_position()?;
                let end = self.inner.seek(SeekFrom::End(0))?;
                self.inner.seek(SeekFrom::Start(current))?;
                Ok(end)
            }
        }
    }
}

impl<S: Read + Seek> Read for ChunkStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(size) = self.size else {
            return self.inner.read(buf);
        };
        let position = self.inner.stream_position()?;
        let remaining = (self.start + size).saturating_sub(position) as usize;
        if remaining == 0 {
            return Ok(0);
        }
        let to_read = buf.len().min(remaining);
        self.inner.read(&mut buf[..to_read])
    }
}

impl<S: Write> Write for ChunkStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Seek> Seek for ChunkStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(pos) => Some(self.start + pos),
            SeekFrom::End(offset) => self.end()?.checked_add_signed(offset),
            SeekFrom::Current(offset) => self.inner.stream_position()?.checked_add_signed(offset),
        };
        match target {
            Some(target) if target >= self.start => {
                Ok(self.inner.seek(SeekFrom::Start(target))? - self.start)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Seek position before the start of the chunk",
            )),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.inner.stream_position()?.saturating_sub(self.start))
    }
}

/// Walk the chunks from the current position to the end of the stream.
///
/// `visit` sees every header with the reader at the start of its payload and
/// may consume any part of it; the scan always resumes at the next chunk.
/// A header or payload running past the end of the stream is a truncation
/// error.
pub fn scan_chunks<R, F>(reader: &mut R, mut visit: F) -> Result<()>
where
    R: Read + Seek,
    F: FnMut(&ChunkHeader, &mut R) -> Result<()>,
{
    let len = stream_len(reader)?;
    let mut position = reader.stream_position()?;

    while position < len {
        if len - position < ChunkHeader::SIZE {
            return Err(M2Error::Truncated(format!(
                "{} trailing bytes at {position} are too short for a chunk header",
                len - position
            )));
        }
        let header = ChunkHeader::read(reader)?;
        let next = position + ChunkHeader::SIZE + u64::from(header.size);
        if next > len {
            return Err(M2Error::Truncated(format!(
                "chunk {} at {position} declares {} bytes but only {} remain",
                header.magic_str(),
                header.size,
                len - position - ChunkHeader::SIZE
            )));
        }

        log::trace!("chunk {} ({} bytes) at {position}", header.magic_str(), header.size);
        visit(&header, reader)?;

        reader.seek(SeekFrom::Start(next))?;
        position = next;
    }
    Ok(())
}
