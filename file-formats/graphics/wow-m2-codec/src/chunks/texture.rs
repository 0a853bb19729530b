use std::borrow::Cow;
use std::io::{Read, Seek, Write};

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, PatchToken};
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::lookup::{MinimumShape, build_lookup};

/// Texture type as defined in the M2 format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum M2TextureType {
    /// Texture defined in filename
    #[default]
    Hardcoded,
    /// Body + clothes
    Body,
    /// Item, capes
    Item,
    /// Weapon blade
    WeaponBlade,
    /// Weapon handle
    WeaponHandle,
    Environment,
    /// Hair, beard
    Hair,
    FacialHair,
    SkinExtra,
    UISkin,
    TaurenMane,
    Monster1,
    Monster2,
    Monster3,
    ItemIcon,
    Other(u32),
}

impl M2TextureType {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::Hardcoded,
            1 => Self::Body,
            2 => Self::Item,
            3 => Self::WeaponBlade,
            4 => Self::WeaponHandle,
            5 => Self::Environment,
            6 => Self::Hair,
            7 => Self::FacialHair,
            8 => Self::SkinExtra,
            9 => Self::UISkin,
            10 => Self::TaurenMane,
            11 => Self::Monster1,
            12 => Self::Monster2,
            13 => Self::Monster3,
            14 => Self::ItemIcon,
            other => Self::Other(other),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Hardcoded => 0,
            Self::Body => 1,
            Self::Item => 2,
            Self::WeaponBlade => 3,
            Self::WeaponHandle => 4,
            Self::Environment => 5,
            Self::Hair => 6,
            Self::FacialHair => 7,
            Self::SkinExtra => 8,
            Self::UISkin => 9,
            Self::TaurenMane => 10,
            Self::Monster1 => 11,
            Self::Monster2 => 12,
            Self::Monster3 => 13,
            Self::ItemIcon => 14,
            Self::Other(value) => value,
        }
    }
}

bitflags::bitflags! {
    /// Texture flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct M2TextureFlags: u32 {
        /// Texture is wrapped horizontally
        const WRAP_X = 0x01;
        /// Texture is wrapped vertically
        const WRAP_Y = 0x02;
        /// Texture will not be replaced by other textures
        /// (character customization texture replacement)
        const NOT_REPLACEABLE = 0x04;
    }
}

/// Represents a texture in an M2 model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2Texture {
    pub texture_type: M2TextureType,
    pub flags: M2TextureFlags,
    /// NUL-terminated path, empty for replaceable textures
    pub filename: ArrayRef<u8>,
}

impl M2Texture {
    /// Create a new texture with the given type and filename
    pub fn new(texture_type: M2TextureType, filename: &str) -> Self {
        Self {
            texture_type,
            flags: M2TextureFlags::empty(),
            filename: ArrayRef::from_name(filename),
        }
    }

    pub fn filename(&self) -> Cow<'_, str> {
        self.filename.to_name_string()
    }

    /// Texture replacement lookup: slot `type` holds the first texture of that type
    pub fn replace_lookup(textures: &[M2Texture]) -> Result<ArrayRef<i16>> {
        build_lookup(
            textures.iter().map(|t| t.texture_type.to_raw()),
            MinimumShape::Empty,
        )
    }
}

impl M2Codec for M2Texture {
    type Patch = PatchToken;

    fn read_header<R: Read + Seek>(reader: &mut R, _ctx: &mut M2Context<'_>) -> Result<Self> {
        let texture_type = M2TextureType::from_raw(reader.read_u32_le()?);
        let flags = M2TextureFlags::from_bits_retain(reader.read_u32_le()?);
        let filename = ArrayRef::load_header(reader)?;
        Ok(Self {
            texture_type,
            flags,
            filename,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.filename.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, _ctx: &mut M2Context<'_>) -> Result<PatchToken> {
        writer.write_u32_le(self.texture_type.to_raw())?;
        writer.write_u32_le(self.flags.bits())?;
        self.filename.save_header(writer)
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: PatchToken,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.filename.save_content(writer, patch, ctx)
    }
}
