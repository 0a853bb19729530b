use std::io::{Read, Write};

use crate::codec::M2Value;
use crate::common::{C2Vector, C3Vector};
use crate::error::Result;

bitflags::bitflags! {
    /// Bones influencing a vertex, derived from its non-zero weights
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct M2VertexBones: u8 {
        const BONE_0 = 0x01;
        const BONE_1 = 0x02;
        const BONE_2 = 0x04;
        const BONE_3 = 0x08;
    }
}

/// A skinned vertex of the global vertex list (48 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2Vertex {
    pub position: C3Vector,
    /// Bone weights (0-255)
    pub bone_weights: [u8; 4],
    /// Bone indices
    pub bone_indices: [u8; 4],
    pub normal: C3Vector,
    /// Primary and secondary texture coordinates
    pub tex_coords: [C2Vector; 2],
}

impl M2Vertex {
    pub const SIZE: usize = 48;

    /// Get the effective bone count used by this vertex
    pub fn effective_bone_count(&self) -> u32 {
        self.bone_weights.iter().filter(|&&w| w > 0).count() as u32
    }

    pub fn influencing_bones(&self) -> M2VertexBones {
        self.bone_weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0)
            .fold(M2VertexBones::empty(), |bones, (i, _)| {
                bones | M2VertexBones::from_bits_retain(1 << i)
            })
    }
}

impl M2Value for M2Vertex {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let position = C3Vector::read_value(reader)?;
        let mut bone_weights = [0u8; 4];
        reader.read_exact(&mut bone_weights)?;
        let mut bone_indices = [0u8; 4];
        reader.read_exact(&mut bone_indices)?;
        let normal = C3Vector::read_value(reader)?;
        let tex_coords = [C2Vector::read_value(reader)?, C2Vector::read_value(reader)?];

        Ok(Self {
            position,
            bone_weights,
            bone_indices,
            normal,
            tex_coords,
        })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.position.write_value(writer)?;
        writer.write_all(&self.bone_weights)?;
        writer.write_all(&self.bone_indices)?;
        self.normal.write_value(writer)?;
        for coords in &self.tex_coords {
            coords.write_value(writer)?;
        }
        Ok(())
    }
}
