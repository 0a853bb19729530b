use std::io::{Read, Seek, Write};

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, M2Value, PatchToken};
use crate::common::{C3Vector, FixedPoint016};
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};
use crate::version::M2Version;

/// Represents a ribbon emitter in an M2 model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2Ribbon {
    pub id: u32,
    pub bone_index: u32,
    pub position: C3Vector,
    pub texture_indices: ArrayRef<u16>,
    pub material_indices: ArrayRef<u16>,
    pub color: Track<C3Vector>,
    pub alpha: Track<FixedPoint016>,
    pub height_above: Track<f32>,
    pub height_below: Track<f32>,
    pub edges_per_second: f32,
    pub edge_lifetime: f32,
    pub gravity: f32,
    pub texture_rows: u16,
    pub texture_cols: u16,
    pub texture_slot: Track<u16>,
    pub visibility: Track<u8>,
    /// From Wrath on
    pub priority_plane: u16,
    pub color_index: u8,
    pub texture_transform_lookup: u8,
}

impl M2Ribbon {
    fn has_priority_plane(version: M2Version) -> bool {
        version >= M2Version::LICH_KING
    }
}

#[derive(Debug)]
pub struct M2RibbonPatch {
    texture_indices: PatchToken,
    material_indices: PatchToken,
    color: TrackPatch<C3Vector>,
    alpha: TrackPatch<FixedPoint016>,
    height_above: TrackPatch<f32>,
    height_below: TrackPatch<f32>,
    texture_slot: TrackPatch<u16>,
    visibility: TrackPatch<u8>,
}

impl M2Codec for M2Ribbon {
    type Patch = M2RibbonPatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let id = reader.read_u32_le()?;
        let bone_index = reader.read_u32_le()?;
        let position = C3Vector::read_value(reader)?;
        let texture_indices = ArrayRef::load_header(reader)?;
        let material_indices = ArrayRef::load_header(reader)?;
        let color = Track::read_header(reader, ctx)?;
        let alpha = Track::read_header(reader, ctx)?;
        let height_above = Track::read_header(reader, ctx)?;
        let height_below = Track::read_header(reader, ctx)?;
        let edges_per_second = reader.read_f32_le()?;
        let edge_lifetime = reader.read_f32_le()?;
        let gravity = reader.read_f32_le()?;
        let texture_rows = reader.read_u16_le()?;
        let texture_cols = reader.read_u16_le()?;
        let texture_slot = Track::read_header(reader, ctx)?;
        let visibility = Track::read_header(reader, ctx)?;

        let (priority_plane, color_index, texture_transform_lookup) =
            if Self::has_priority_plane(ctx.version()) {
                (reader.read_u16_le()?, reader.read_u8()?, reader.read_u8()?)
            } else {
                (0, 0, 0)
            };

        Ok(Self {
            id,
            bone_index,
            position,
            texture_indices,
            material_indices,
            color,
            alpha,
            height_above,
            height_below,
            edges_per_second,
            edge_lifetime,
            gravity,
            texture_rows,
            texture_cols,
            texture_slot,
            visibility,
            priority_plane,
            color_index,
            texture_transform_lookup,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.texture_indices.load_content(reader, ctx)?;
        self.material_indices.load_content(reader, ctx)?;
        self.color.load_content(reader, ctx)?;
        self.alpha.load_content(reader, ctx)?;
        self.height_above.load_content(reader, ctx)?;
        self.height_below.load_content(reader, ctx)?;
        self.texture_slot.load_content(reader, ctx)?;
        self.visibility.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<M2RibbonPatch> {
        writer.write_u32_le(self.id)?;
        writer.write_u32_le(self.bone_index)?;
        self.position.write_value(writer)?;
        let texture_indices = self.texture_indices.save_header(writer)?;
        let material_indices = self.material_indices.save_header(writer)?;
        let color = self.color.write_header(writer, ctx)?;
        let alpha = self.alpha.write_header(writer, ctx)?;
        let height_above = self.height_above.write_header(writer, ctx)?;
        let height_below = self.height_below.write_header(writer, ctx)?;
        writer.write_f32_le(self.edges_per_second)?;
        writer.write_f32_le(self.edge_lifetime)?;
        writer.write_f32_le(self.gravity)?;
        writer.write_u16_le(self.texture_rows)?;
        writer.write_u16_le(self.texture_cols)?;
        let texture_slot = self.texture_slot.write_header(writer, ctx)?;
        let visibility = self.visibility.write_header(writer, ctx)?;

        if Self::has_priority_plane(ctx.version()) {
            writer.write_u16_le(self.priority_plane)?;
            writer.write_u8(self.color_index)?;
            writer.write_u8(self.texture_transform_lookup)?;
        }

        Ok(M2RibbonPatch {
            texture_indices,
            material_indices,
            color,
            alpha,
            height_above,
            height_below,
            texture_slot,
            visibility,
        })
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: M2RibbonPatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.texture_indices.save_content(writer, patch.texture_indices, ctx)?;
        self.material_indices.save_content(writer, patch.material_indices, ctx)?;
        self.color.save_content(writer, patch.color, ctx)?;
        self.alpha.save_content(writer, patch.alpha, ctx)?;
        self.height_above.save_content(writer, patch.height_above, ctx)?;
        self.height_below.save_content(writer, patch.height_below, ctx)?;
        self.texture_slot.save_content(writer, patch.texture_slot, ctx)?;
        self.visibility.save_content(writer, patch.visibility, ctx)
    }
}

impl SequenceAware for M2Ribbon {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.color.set_sequences(sequences);
        self.alpha.set_sequences(sequences);
        self.height_above.set_sequences(sequences);
        self.height_below.set_sequences(sequences);
        self.texture_slot.set_sequences(sequences);
        self.visibility.set_sequences(sequences);
    }
}
