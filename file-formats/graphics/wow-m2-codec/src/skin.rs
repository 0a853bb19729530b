//! Views of a model's mesh.
//!
//! Before Wrath a view is embedded in the model and its offsets point into
//! the model stream. From Wrath on each view lives in its own `.skin` file
//! that starts with a `SKIN` magic and carries its own offsets.

use std::io::{Read, Seek, Write};

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, M2Value, PatchToken};
use crate::common::{C3Vector, VertexProperty};
use crate::error::{M2Error, Result};
use crate::io_ext::{ReadExt, WriteExt};
use crate::version::M2Version;

/// Magic signature for Skin files ("SKIN")
pub const SKIN_MAGIC: [u8; 4] = *b"SKIN";

/// A submesh of a view
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2SkinSection {
    pub skin_section_id: u16,
    /// Level of detail; the high half of the index start when more than 65535 indices are used
    pub level: u16,
    pub vertex_start: u16,
    pub vertex_count: u16,
    pub index_start: u16,
    pub index_count: u16,
    pub bone_count: u16,
    pub bone_combo_index: u16,
    /// Maximum number of bones influencing a single vertex
    pub bone_influences: u16,
    pub center_bone_index: u16,
    pub center_position: C3Vector,
    /// From The Burning Crusade on
    pub sort_center_position: C3Vector,
    /// From The Burning Crusade on
    pub sort_radius: f32,
}

impl M2SkinSection {
    /// Serialized size at `version`
    pub fn size(version: M2Version) -> usize {
        if Self::has_sort_bounds(version) {
            48
        } else {
            32
        }
    }

    fn has_sort_bounds(version: M2Version) -> bool {
        version >= M2Version::BURNING_CRUSADE
    }

    /// First index of this submesh, including the level extension
    pub fn full_index_start(&self) -> u32 {
        u32::from(self.index_start) | (u32::from(self.level) << 16)
    }
}

impl M2Codec for M2SkinSection {
    type Patch = ();

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let mut section = Self {
            skin_section_id: reader.read_u16_le()?,
            level: reader.read_u16_le()?,
            vertex_start: reader.read_u16_le()?,
            vertex_count: reader.read_u16_le()?,
            index_start: reader.read_u16_le()?,
            index_count: reader.read_u16_le()?,
            bone_count: reader.read_u16_le()?,
            bone_combo_index: reader.read_u16_le()?,
            bone_influences: reader.read_u16_le()?,
            center_bone_index: reader.read_u16_le()?,
            center_position: C3Vector::read_value(reader)?,
            ..Default::default()
        };
        if Self::has_sort_bounds(ctx.version()) {
            section.sort_center_position = C3Vector::read_value(reader)?;
            section.sort_radius = reader.read_f32_le()?;
        }
        Ok(section)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<()> {
        writer.write_u16_le(self.skin_section_id)?;
        writer.write_u16_le(self.level)?;
        writer.write_u16_le(self.vertex_start)?;
        writer.write_u16_le(self.vertex_count)?;
        writer.write_u16_le(self.index_start)?;
        writer.write_u16_le(self.index_count)?;
        writer.write_u16_le(self.bone_count)?;
        writer.write_u16_le(self.bone_combo_index)?;
        writer.write_u16_le(self.bone_influences)?;
        writer.write_u16_le(self.center_bone_index)?;
        self.center_position.write_value(writer)?;
        if Self::has_sort_bounds(ctx.version()) {
            self.sort_center_position.write_value(writer)?;
            writer.write_f32_le(self.sort_radius)?;
        }
        Ok(())
    }
}

/// A texture unit: binds a submesh to a material and its texture combos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2Batch {
    pub flags: u8,
    pub priority_plane: i8,
    pub shader_id: u16,
    pub skin_section_index: u16,
    pub geoset_index: u16,
    /// Index into the colors, -1 for none
    pub color_index: i16,
    pub material_index: u16,
    pub material_layer: u16,
    /// Number of textures, from 1 to 4
    pub texture_count: u16,
    pub texture_combo_index: u16,
    pub texture_coord_combo_index: u16,
    pub texture_weight_combo_index: u16,
    pub texture_transform_combo_index: u16,
}

impl Default for M2Batch {
    fn default() -> Self {
        Self {
            flags: 0,
            priority_plane: 0,
            shader_id: 0,
            skin_section_index: 0,
            geoset_index: 0,
            color_index: -1,
            material_index: 0,
            material_layer: 0,
            texture_count: 1,
            texture_combo_index: 0,
            texture_coord_combo_index: 0,
            texture_weight_combo_index: 0,
            texture_transform_combo_index: 0,
        }
    }
}

impl M2Value for M2Batch {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            flags: reader.read_u8()?,
            priority_plane: reader.read_i8()?,
            shader_id: reader.read_u16_le()?,
            skin_section_index: reader.read_u16_le()?,
            geoset_index: reader.read_u16_le()?,
            color_index: reader.read_i16_le()?,
            material_index: reader.read_u16_le()?,
            material_layer: reader.read_u16_le()?,
            texture_count: reader.read_u16_le()?,
            texture_combo_index: reader.read_u16_le()?,
            texture_coord_combo_index: reader.read_u16_le()?,
            texture_weight_combo_index: reader.read_u16_le()?,
            texture_transform_combo_index: reader.read_u16_le()?,
        })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.flags)?;
        writer.write_i8(self.priority_plane)?;
        writer.write_u16_le(self.shader_id)?;
        writer.write_u16_le(self.skin_section_index)?;
        writer.write_u16_le(self.geoset_index)?;
        writer.write_i16_le(self.color_index)?;
        writer.write_u16_le(self.material_index)?;
        writer.write_u16_le(self.material_layer)?;
        writer.write_u16_le(self.texture_count)?;
        writer.write_u16_le(self.texture_combo_index)?;
        writer.write_u16_le(self.texture_coord_combo_index)?;
        writer.write_u16_le(self.texture_weight_combo_index)?;
        writer.write_u16_le(self.texture_transform_combo_index)?;
        Ok(())
    }
}

/// Shadow batch, from Cataclysm on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2ShadowBatch {
    pub flags: u8,
    pub flags2: u8,
    pub unknown1: u16,
    pub submesh_id: u16,
    pub texture_id: u16,
    pub color_id: u16,
    pub transparency_id: u16,
}

impl M2Value for M2ShadowBatch {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            flags: reader.read_u8()?,
            flags2: reader.read_u8()?,
            unknown1: reader.read_u16_le()?,
            submesh_id: reader.read_u16_le()?,
            texture_id: reader.read_u16_le()?,
            color_id: reader.read_u16_le()?,
            transparency_id: reader.read_u16_le()?,
        })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.flags)?;
        writer.write_u8(self.flags2)?;
        writer.write_u16_le(self.unknown1)?;
        writer.write_u16_le(self.submesh_id)?;
        writer.write_u16_le(self.texture_id)?;
        writer.write_u16_le(self.color_id)?;
        writer.write_u16_le(self.transparency_id)?;
        Ok(())
    }
}

/// One view (level of detail) of a model
#[derive(custom_debug::Debug, Clone, Default, PartialEq)]
pub struct M2SkinProfile {
    /// Indices into the model's global vertex list
    #[debug(with = crate::debug::trimmed_collection_fmt)]
    pub vertices: ArrayRef<u16>,
    /// Triangle list, indexing into `vertices`
    #[debug(with = crate::debug::trimmed_collection_fmt)]
    pub indices: ArrayRef<u16>,
    #[debug(with = crate::debug::trimmed_collection_fmt)]
    pub bones: ArrayRef<VertexProperty>,
    pub submeshes: ArrayRef<M2SkinSection>,
    pub batches: ArrayRef<M2Batch>,
    pub bone_count_max: u32,
    /// From Cataclysm on
    pub shadow_batches: ArrayRef<M2ShadowBatch>,
}

#[derive(Debug)]
pub struct M2SkinProfilePatch {
    vertices: PatchToken,
    indices: PatchToken,
    bones: PatchToken,
    submeshes: PatchToken,
    batches: PatchToken,
    shadow_batches: Option<PatchToken>,
}

impl M2SkinProfile {
    fn has_magic(version: M2Version) -> bool {
        version.has_external_files()
    }

    fn has_shadow_batches(version: M2Version) -> bool {
        version >= M2Version::CATACLYSM
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl M2Codec for M2SkinProfile {
    type Patch = M2SkinProfilePatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        if Self::has_magic(ctx.version()) {
            let magic = reader.read_magic()?;
            if magic != SKIN_MAGIC {
                return Err(M2Error::InvalidMagic {
                    expected: String::from_utf8_lossy(&SKIN_MAGIC).to_string(),
                    actual: String::from_utf8_lossy(&magic).to_string(),
                });
            }
        }

        let mut profile = Self {
            vertices: ArrayRef::load_header(reader)?,
            indices: ArrayRef::load_header(reader)?,
            bones: ArrayRef::load_header(reader)?,
            submeshes: ArrayRef::load_header(reader)?,
            batches: ArrayRef::load_header(reader)?,
            bone_count_max: reader.read_u32_le()?,
            ..Default::default()
        };
        if Self::has_shadow_batches(ctx.version()) {
            profile.shadow_batches = ArrayRef::load_header(reader)?;
        }
        Ok(profile)
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.vertices.load_content(reader, ctx)?;
        self.indices.load_content(reader, ctx)?;
        self.bones.load_content(reader, ctx)?;
        self.submeshes.load_content(reader, ctx)?;
        self.batches.load_content(reader, ctx)?;
        self.shadow_batches.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        ctx: &mut M2Context<'_>,
    ) -> Result<M2SkinProfilePatch> {
        if Self::has_magic(ctx.version()) {
            writer.write_all(&SKIN_MAGIC)?;
        }
        let vertices = self.vertices.save_header(writer)?;
        let indices = self.indices.save_header(writer)?;
        let bones = self.bones.save_header(writer)?;
        let submeshes = self.submeshes.save_header(writer)?;
        let batches = self.batches.save_header(writer)?;
        writer.write_u32_le(self.bone_count_max)?;
        let shadow_batches = if Self::has_shadow_batches(ctx.version()) {
            Some(self.shadow_batches.save_header(writer)?)
        } else {
            if !self.shadow_batches.is_empty() {
                log::warn!(
                    "dropping {} shadow batches not supported by version {}",
                    self.shadow_batches.len(),
                    ctx.version()
                );
            }
            None
        };

        Ok(M2SkinProfilePatch {
            vertices,
            indices,
            bones,
            submeshes,
            batches,
            shadow_batches,
        })
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: M2SkinProfilePatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.vertices.save_content(writer, patch.vertices, ctx)?;
        self.indices.save_content(writer, patch.indices, ctx)?;
        self.bones.save_content(writer, patch.bones, ctx)?;
        self.submeshes.save_content(writer, patch.submeshes, ctx)?;
        self.batches.save_content(writer, patch.batches, ctx)?;
        if let Some(token) = patch.shadow_batches {
            self.shadow_batches.save_content(writer, token, ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::{load, save, u32_at};
    use crate::sequence::SequenceRegistry;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use test_case::test_case;

    fn profile() -> M2SkinProfile {
        M2SkinProfile {
            vertices: vec![0, 1, 2, 3].into(),
            indices: vec![0, 1, 2, 2, 1, 3].into(),
            bones: vec![VertexProperty([0, 0, 0, 0]); 4].into(),
            submeshes: vec![M2SkinSection {
                vertex_count: 4,
                index_count: 6,
                bone_count: 1,
                bone_influences: 1,
                center_position: C3Vector::new(0.5, 0.5, 0.0),
                ..Default::default()
            }]
            .into(),
            batches: vec![M2Batch::default()].into(),
            bone_count_max: 21,
            ..Default::default()
        }
    }

    #[test_case(M2Version::CLASSIC, 32 ; "classic")]
    #[test_case(M2Version::BURNING_CRUSADE, 48 ; "burning crusade")]
    fn test_section_size(version: M2Version, size: usize) {
        let sequences = SequenceRegistry::new();
        let mut ctx = M2Context::new(version, &sequences);
        let mut cursor = Cursor::new(Vec::new());
        M2SkinSection::default().write_header(&mut cursor, &mut ctx).unwrap();
        assert_eq!(cursor.into_inner().len(), size);
        assert_eq!(M2SkinSection::size(version), size);
    }

    #[test]
    fn test_batch_layout() {
        let mut data = Vec::new();
        M2Batch::default().write_value(&mut data).unwrap();
        assert_eq!(data.len(), 24);
        // color index
        assert_eq!(&data[8..10], &[0xFF, 0xFF]);
        assert_eq!(M2Batch::read_value(&mut Cursor::new(&data)).unwrap(), M2Batch::default());
    }

    #[test]
    fn test_embedded_profile_has_no_magic() {
        let sequences = SequenceRegistry::new();
        let mut ctx = M2Context::new(M2Version::CLASSIC, &sequences);
        let skin = profile();
        let bytes = save(&skin, &mut ctx);

        // five array references and the bone count
        assert_eq!(u32_at(&bytes, 0), 4);
        assert_eq!(u32_at(&bytes, 4), 44);
        assert_eq!(u32_at(&bytes, 40), 21);
        assert_eq!(load::<M2SkinProfile>(&bytes, &mut ctx), skin);
    }

    #[test_case(M2Version::LICH_KING ; "wrath")]
    #[test_case(M2Version::CATACLYSM ; "with shadow batches")]
    fn test_external_profile_roundtrip(version: M2Version) {
        let sequences = SequenceRegistry::new();
        let mut ctx = M2Context::new(version, &sequences);
        let mut skin = profile();
        if version >= M2Version::CATACLYSM {
            skin.shadow_batches = vec![M2ShadowBatch {
                flags: 1,
                submesh_id: 0,
                ..Default::default()
            }]
            .into();
        }

        let bytes = save(&skin, &mut ctx);
        assert_eq!(&bytes[..4], b"SKIN");
        assert_eq!(load::<M2SkinProfile>(&bytes, &mut ctx), skin);
        assert_eq!(skin.triangle_count(), 2);
    }

    #[test]
    fn test_bad_magic() {
        let sequences = SequenceRegistry::new();
        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);
        let mut data = b"NIKS".to_vec();
        data.resize(48, 0);
        let result = M2SkinProfile::read_header(&mut Cursor::new(data), &mut ctx);
        assert!(matches!(result, Err(M2Error::InvalidMagic { .. })));
    }
}
