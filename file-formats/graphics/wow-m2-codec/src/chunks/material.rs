use std::io::{Read, Write};

use crate::codec::M2Value;
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

bitflags::bitflags! {
    /// Render flags of a material
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct M2RenderFlags: u16 {
        /// No lighting
        const UNLIT = 0x01;
        /// No fog
        const UNFOGGED = 0x02;
        /// Two-sided (no backface culling)
        const NO_BACKFACE_CULLING = 0x04;
        /// Billboarded
        const BILLBOARDED = 0x08;
        /// Disable z-buffer
        const NO_ZBUFFER = 0x10;
        /// Shadow batch related
        const SHADOW_BATCH_1 = 0x40;
        /// Shadow batch related
        const SHADOW_BATCH_2 = 0x80;
        /// Unknown (seen in Wrath)
        const UNKNOWN_400 = 0x400;
        /// Disable alpha
        const NO_ALPHA = 0x800;
    }
}

impl M2RenderFlags {
    /// Flags understood before Cataclysm
    pub const LEGACY_MASK: u16 = 0x1F;
}

/// Blending mode of a material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum M2BlendMode {
    #[default]
    Opaque,
    Mod,
    Decal,
    Add,
    Mod2X,
    Fade,
    DeeprunTram,
    Other(u16),
}

impl M2BlendMode {
    pub fn from_raw(value: u16) -> Self {
        match value {
            0 => Self::Opaque,
            1 => Self::Mod,
            2 => Self::Decal,
            3 => Self::Add,
            4 => Self::Mod2X,
            5 => Self::Fade,
            6 => Self::DeeprunTram,
            other => Self::Other(other),
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            Self::Opaque => 0,
            Self::Mod => 1,
            Self::Decal => 2,
            Self::Add => 3,
            Self::Mod2X => 4,
            Self::Fade => 5,
            Self::DeeprunTram => 6,
            Self::Other(value) => value,
        }
    }
}

/// Render state shared by batches (4 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct M2Material {
    pub flags: M2RenderFlags,
    pub blend_mode: M2BlendMode,
}

impl M2Material {
    /// Rewrite render state that clients before Cataclysm do not understand:
    /// unknown flags are cleared and newer blend modes fall back to `Mod2X`.
    pub fn normalize_legacy(&mut self) {
        self.flags = M2RenderFlags::from_bits_retain(self.flags.bits() & M2RenderFlags::LEGACY_MASK);
        if let M2BlendMode::Other(_) = self.blend_mode {
            self.blend_mode = M2BlendMode::Mod2X;
        }
    }
}

impl M2Value for M2Material {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = M2RenderFlags::from_bits_retain(reader.read_u16_le()?);
        let blend_mode = M2BlendMode::from_raw(reader.read_u16_le()?);
        Ok(Self { flags, blend_mode })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16_le(self.flags.bits())?;
        writer.write_u16_le(self.blend_mode.to_raw())?;
        Ok(())
    }
}
