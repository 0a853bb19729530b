//! Two-pass codec contract shared by every value, entity, array and track.
//!
//! Loading runs a header pass that consumes fixed-size descriptors followed by
//! a content pass that follows them. Saving mirrors it: the header pass writes
//! descriptors with placeholder offsets and returns a patch handle, and the
//! content pass appends the payload and back-patches through that handle.

use std::fmt;
use std::io::{Read, Seek, Write};

use crate::error::Result;
use crate::file_resolver::ExternalFiles;
use crate::io_ext::{ReadExt, WriteExt};
use crate::sequence::SequenceRegistry;
use crate::version::M2Version;

/// Stream position of a descriptor written with a placeholder offset.
///
/// Produced by a header save and consumed exactly once by the matching
/// content save.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a patch token must be handed to the matching content save"]
pub struct PatchToken(u64);

impl PatchToken {
    pub(crate) fn new(position: u64) -> Self {
        Self(position)
    }

    /// Position of the `{count, offset}` descriptor
    pub fn position(&self) -> u64 {
        self.0
    }
}

/// State shared by every codec during one load or save call
pub struct M2Context<'a> {
    version: M2Version,
    sequences: &'a SequenceRegistry,
    files: Option<&'a mut dyn ExternalFiles>,
}

impl<'a> M2Context<'a> {
    /// Bind a format revision and a sequence registry for one pass
    pub fn new(version: M2Version, sequences: &'a SequenceRegistry) -> Self {
        Self {
            version,
            sequences,
            files: None,
        }
    }

    /// Attach the collaborator providing `.anim` and `.skin` side files
    pub fn with_files(mut self, files: Option<&'a mut dyn ExternalFiles>) -> Self {
        self.files = files;
        self
    }

    pub fn version(&self) -> M2Version {
        self.version
    }

    pub fn sequences(&self) -> &'a SequenceRegistry {
        self.sequences
    }

    pub fn files(&mut self) -> Option<&mut (dyn ExternalFiles + 'a)> {
        self.files.as_deref_mut()
    }

    pub fn has_files(&self) -> bool {
        self.files.is_some()
    }
}

impl fmt::Debug for M2Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("M2Context")
            .field("version", &self.version)
            .field("sequences", &self.sequences.len())
            .field("files", &self.files.is_some())
            .finish()
    }
}

/// A type that takes part in the two-pass protocol.
///
/// `read_header`/`write_header` cover the fixed-size part of the value that
/// sits inline where the value is declared. Types that own array references
/// or tracks override the content methods to follow them.
pub trait M2Codec: Sized {
    /// Handle returned by the header save and consumed by the content save
    type Patch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self>;

    fn load_content<R: Read + Seek>(
        &mut self,
        _reader: &mut R,
        _ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        ctx: &mut M2Context<'_>,
    ) -> Result<Self::Patch>;

    fn save_content<W: Write + Seek>(
        &self,
        _writer: &mut W,
        _patch: Self::Patch,
        _ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Constant-size value with no indirection and no version dependency
pub trait M2Value: Sized {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self>;

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()>;
}

impl<T: M2Value> M2Codec for T {
    type Patch = ();

    fn read_header<R: Read + Seek>(reader: &mut R, _ctx: &mut M2Context<'_>) -> Result<Self> {
        T::read_value(reader)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, _ctx: &mut M2Context<'_>) -> Result<()> {
        self.write_value(writer)
    }
}

macro_rules! impl_primitive_value {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            impl M2Value for $ty {
                fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
                    Ok(reader.$read()?)
                }

                fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
                    writer.$write(*self)?;
                    Ok(())
                }
            }
        )*
    };
}

impl_primitive_value! {
    u8 => read_u8, write_u8;
    i8 => read_i8, write_i8;
    u16 => read_u16_le, write_u16_le;
    i16 => read_i16_le, write_i16_le;
    u32 => read_u32_le, write_u32_le;
    i32 => read_i32_le, write_i32_le;
    f32 => read_f32_le, write_f32_le;
}

/// Helpers driving both passes over an in-memory buffer
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::io::Cursor;

    pub fn save<T: M2Codec>(value: &T, ctx: &mut M2Context<'_>) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let patch = value.write_header(&mut cursor, ctx).unwrap();
        value.save_content(&mut cursor, patch, ctx).unwrap();
        cursor.into_inner()
    }

    pub fn load<T: M2Codec>(bytes: &[u8], ctx: &mut M2Context<'_>) -> T {
        let mut cursor = Cursor::new(bytes);
        let mut value = T::read_header(&mut cursor, ctx).unwrap();
        value.load_content(&mut cursor, ctx).unwrap();
        value
    }

    pub fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }
}
