//! Deferred-offset array references.
//!
//! An array reference is an 8-byte `{count, offset}` descriptor that sits
//! inline in its owner, while the elements live elsewhere in the stream.
//! Offsets are only known once the payload has been appended, so saving
//! writes a placeholder first and back-patches it from the content pass.

use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};

use crate::codec::{M2Codec, M2Context, M2Value, PatchToken};
use crate::error::{M2Error, Result};
use crate::io_ext::{ReadExt, WriteExt, stream_len};

/// Upper bound on speculative allocation for a declared element count
const MAX_PREALLOCATED_ELEMENTS: usize = 4096;

/// A sequence of `T` whose elements are stored out of line
#[derive(Debug, Clone)]
pub struct ArrayRef<T> {
    items: Vec<T>,
    declared_count: u32,
    declared_offset: u32,
}

impl<T> ArrayRef<T> {
    /// Create an empty array
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            declared_count: 0,
            declared_offset: 0,
        }
    }

    /// Count read by the last header load
    pub fn declared_count(&self) -> u32 {
        self.declared_count
    }

    /// Offset read by the last header load
    pub fn declared_offset(&self) -> u32 {
        self.declared_offset
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Read the 8-byte descriptor. Never seeks.
    pub fn load_header<R: Read>(reader: &mut R) -> Result<Self> {
        let declared_count = reader.read_u32_le()?;
        let declared_offset = reader.read_u32_le()?;
        Ok(Self {
            items: Vec::new(),
            declared_count,
            declared_offset,
        })
    }

    /// Write the current count with a placeholder offset
    pub fn save_header<W: Write + Seek>(&self, writer: &mut W) -> Result<PatchToken> {
        let position = writer.stream_position()?;
        writer.write_u32_le(self.wire_count()?)?;
        writer.write_u32_le(0)?;
        Ok(PatchToken::new(position))
    }

    fn wire_count(&self) -> Result<u32> {
        u32::try_from(self.items.len()).map_err(|_| {
            M2Error::Schema(format!(
                "array of {} elements does not fit a 32-bit count",
                self.items.len()
            ))
        })
    }

    /// Rewrite the descriptor behind `token` as an empty array, for payloads
    /// that end up written nowhere
    pub fn save_empty<W: Write + Seek>(writer: &mut W, token: PatchToken) -> Result<()> {
        let resume = writer.stream_position()?;
        writer.seek(SeekFrom::Start(token.position()))?;
        writer.write_u32_le(0)?;
        writer.write_u32_le(0)?;
        writer.seek(SeekFrom::Start(resume))?;
        Ok(())
    }

    /// Point the descriptor behind `token` at `offset`, leaving `writer` where it was
    fn patch<W: Write + Seek>(&self, writer: &mut W, token: PatchToken, offset: u64) -> Result<()> {
        let offset = u32::try_from(offset).map_err(|_| {
            M2Error::Schema(format!("payload offset {offset} does not fit in 32 bits"))
        })?;
        let resume = writer.stream_position()?;
        writer.seek(SeekFrom::Start(token.position()))?;
        writer.write_u32_le(self.wire_count()?)?;
        writer.write_u32_le(offset)?;
        writer.seek(SeekFrom::Start(resume))?;
        Ok(())
    }
}

impl<T: M2Codec> ArrayRef<T> {
    /// Content load that hands every element to `content` once all element
    /// headers are read, instead of running the element's own content load.
    ///
    /// `content` receives the element index, so callers can route individual
    /// elements to another stream.
    pub fn load_content_with<R, F>(
        &mut self,
        reader: &mut R,
        ctx: &mut M2Context<'_>,
        mut content: F,
    ) -> Result<()>
    where
        R: Read + Seek,
        F: FnMut(usize, &mut T, &mut R, &mut M2Context<'_>) -> Result<()>,
    {
        if self.declared_count == 0 {
            return Ok(());
        }

        let resume = reader.stream_position()?;
        let len = stream_len(reader)?;
        let offset = u64::from(self.declared_offset);
        if offset >= len {
            return Err(M2Error::Truncated(format!(
                "array of {} elements at offset {offset} starts past the end of the stream ({len} bytes)",
                self.declared_count
            )));
        }
        reader.seek(SeekFrom::Start(offset))?;

        self.items.clear();
        self.items
            .reserve((self.declared_count as usize).min(MAX_PREALLOCATED_ELEMENTS));
        for _ in 0..self.declared_count {
            self.items.push(T::read_header(reader, ctx)?);
        }
        for (index, item) in self.items.iter_mut().enumerate() {
            content(index, item, reader, ctx)?;
        }

        reader.seek(SeekFrom::Start(resume))?;
        Ok(())
    }

    /// Content save counterpart of [`ArrayRef::load_content_with`].
    ///
    /// Element headers are written contiguously, then `content` runs once per
    /// element with the patch its header save produced.
    pub fn save_content_with<W, F>(
        &self,
        writer: &mut W,
        token: PatchToken,
        ctx: &mut M2Context<'_>,
        mut content: F,
    ) -> Result<()>
    where
        W: Write + Seek,
        F: FnMut(usize, &T, T::Patch, &mut W, &mut M2Context<'_>) -> Result<()>,
    {
        if self.items.is_empty() {
            return Ok(());
        }
        let offset = writer.stream_position()?;
        self.patch(writer, token, offset)?;

        let mut patches = Vec::with_capacity(self.items.len());
        for item in &self.items {
            patches.push(item.write_header(writer, ctx)?);
        }
        for (index, (item, patch)) in self.items.iter().zip(patches).enumerate() {
            content(index, item, patch, writer, ctx)?;
        }
        Ok(())
    }
}

impl<T: M2Value> ArrayRef<T> {
    /// Read the elements from `payload`, a stream other than the one the
    /// descriptor was read from. The offset is relative to `payload`.
    pub fn load_values_from<P: Read + Seek>(&mut self, payload: &mut P) -> Result<()> {
        if self.declared_count == 0 {
            return Ok(());
        }
        let len = stream_len(payload)?;
        let offset = u64::from(self.declared_offset);
        if offset >= len {
            return Err(M2Error::Truncated(format!(
                "array of {} elements at offset {offset} starts past the end of the side stream ({len} bytes)",
                self.declared_count
            )));
        }
        payload.seek(SeekFrom::Start(offset))?;

        self.items.clear();
        self.items
            .reserve((self.declared_count as usize).min(MAX_PREALLOCATED_ELEMENTS));
        for _ in 0..self.declared_count {
            self.items.push(T::read_value(payload)?);
        }
        Ok(())
    }

    /// Append the elements to `payload` while the descriptor behind `token`
    /// stays in `writer`.
    ///
    /// The patched offset is relative to `payload`, which is how timelines
    /// stored in `.anim` side files are referenced.
    pub fn save_values_to<W, P>(&self, writer: &mut W, token: PatchToken, payload: &mut P) -> Result<()>
    where
        W: Write + Seek,
        P: Write + Seek,
    {
        if self.items.is_empty() {
            return Ok(());
        }
        let offset = payload.seek(SeekFrom::End(0))?;
        self.patch(writer, token, offset)?;
        for item in &self.items {
            item.write_value(payload)?;
        }
        Ok(())
    }
}

impl<T: M2Codec> M2Codec for ArrayRef<T> {
    type Patch = PatchToken;

    fn read_header<R: Read + Seek>(reader: &mut R, _ctx: &mut M2Context<'_>) -> Result<Self> {
        Self::load_header(reader)
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.load_content_with(reader, ctx, |_, item, reader, ctx| {
            item.load_content(reader, ctx)
        })
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        _ctx: &mut M2Context<'_>,
    ) -> Result<PatchToken> {
        self.save_header(writer)
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        token: PatchToken,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.save_content_with(writer, token, ctx, |_, item, patch, writer, ctx| {
            item.save_content(writer, patch, ctx)
        })
    }
}

impl ArrayRef<u8> {
    /// Build a NUL-terminated string array. An empty string yields an empty array.
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() {
            return Self::new();
        }
        let mut bytes = Vec::with_capacity(name.len() + 1);
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        bytes.into()
    }

    /// Text up to the first NUL
    pub fn to_name_string(&self) -> Cow<'_, str> {
        let end = memchr::memchr(0, &self.items).unwrap_or(self.items.len());
        String::from_utf8_lossy(&self.items[..end])
    }
}

impl<T> Default for ArrayRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for ArrayRef<T> {
    /// Descriptors are transient; only the elements take part in equality
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T> Deref for ArrayRef<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.items
    }
}

impl<T> DerefMut for ArrayRef<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }
}

impl<T> From<Vec<T>> for ArrayRef<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            declared_count: 0,
            declared_offset: 0,
        }
    }
}

impl<T> FromIterator<T> for ArrayRef<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Vec::from_iter(iter).into()
    }
}

impl<'a, T> IntoIterator for &'a ArrayRef<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut ArrayRef<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}
