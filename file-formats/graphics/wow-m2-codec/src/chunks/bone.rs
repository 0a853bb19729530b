use std::io::{Read, Seek, Write};

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, M2Value};
use crate::common::{C3Vector, M2CompQuat, Quaternion};
use crate::error::{M2Error, Result};
use crate::io_ext::{ReadExt, WriteExt};
use crate::lookup::{MinimumShape, build_lookup};
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};
use crate::version::M2Version;

bitflags::bitflags! {
    /// Bone flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct M2BoneFlags: u32 {
        /// Spherical billboard
        const SPHERICAL_BILLBOARD = 0x8;
        /// Cylindrical billboard lock X
        const CYLINDRICAL_BILLBOARD_LOCK_X = 0x10;
        /// Cylindrical billboard lock Y
        const CYLINDRICAL_BILLBOARD_LOCK_Y = 0x20;
        /// Cylindrical billboard lock Z
        const CYLINDRICAL_BILLBOARD_LOCK_Z = 0x40;
        /// Transformed
        const TRANSFORMED = 0x200;
        /// Kinematic bone (requires physics)
        const KINEMATIC_BONE = 0x400;
        /// Helper bone
        const HELPER_BONE = 0x1000;
        /// Has animation
        const HAS_ANIMATION = 0x4000;
        /// Has multiple animations at higher LODs
        const ANIMATED_AT_HIGHER_LODS = 0x8000;
        /// Has procedural animation
        const HAS_PROCEDURAL_ANIMATION = 0x10000;
        /// Has IK (inverse kinematics)
        const HAS_IK = 0x20000;
    }
}

/// Rotation track of a bone. Classic stores float quaternions, later
/// revisions store them compressed to 16 bits per component.
#[derive(Debug, Clone, PartialEq)]
pub enum BoneRotation {
    Float(Track<Quaternion>),
    Compressed(Track<M2CompQuat>),
}

impl Default for BoneRotation {
    fn default() -> Self {
        Self::Compressed(Track::default())
    }
}

impl BoneRotation {
    fn uses_float(version: M2Version) -> bool {
        version < M2Version::BURNING_CRUSADE
    }

    /// Re-encode the keyframes for `version`
    pub fn converted_for(&self, version: M2Version) -> Self {
        match (self, Self::uses_float(version)) {
            (Self::Compressed(track), true) => {
                Self::Float(track.map_values(|q| q.to_quaternion()))
            }
            (Self::Float(track), false) => {
                Self::Compressed(track.map_values(|q| M2CompQuat::from_quaternion(*q)))
            }
            (same, _) => same.clone(),
        }
    }
}

#[derive(Debug)]
pub enum BoneRotationPatch {
    Float(TrackPatch<Quaternion>),
    Compressed(TrackPatch<M2CompQuat>),
}

impl M2Codec for BoneRotation {
    type Patch = BoneRotationPatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        Ok(if Self::uses_float(ctx.version()) {
            Self::Float(Track::read_header(reader, ctx)?)
        } else {
            Self::Compressed(Track::read_header(reader, ctx)?)
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        match self {
            Self::Float(track) => track.load_content(reader, ctx),
            Self::Compressed(track) => track.load_content(reader, ctx),
        }
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        ctx: &mut M2Context<'_>,
    ) -> Result<BoneRotationPatch> {
        match (self, Self::uses_float(ctx.version())) {
            (Self::Float(track), true) => Ok(BoneRotationPatch::Float(track.write_header(writer, ctx)?)),
            (Self::Compressed(track), false) => Ok(BoneRotationPatch::Compressed(
                track.write_header(writer, ctx)?,
            )),
            _ => Err(M2Error::Schema(format!(
                "bone rotation encoding does not match version {}, convert it first",
                ctx.version()
            ))),
        }
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: BoneRotationPatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        match (self, patch) {
            (Self::Float(track), BoneRotationPatch::Float(patch)) => track.save_content(writer, patch, ctx),
            (Self::Compressed(track), BoneRotationPatch::Compressed(patch)) => {
                track.save_content(writer, patch, ctx)
            }
            _ => Err(M2Error::Schema(
                "bone rotation changed between header and content save".to_string(),
            )),
        }
    }
}

impl SequenceAware for BoneRotation {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        match self {
            Self::Float(track) => track.set_sequences(sequences),
            Self::Compressed(track) => track.set_sequences(sequences),
        }
    }
}

/// A bone of the skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct M2Bone {
    /// Index into the key bone lookup, -1 if none
    pub key_bone_id: i32,
    pub flags: M2BoneFlags,
    /// Parent bone index, -1 for the root
    pub parent_bone: i16,
    pub submesh_id: u16,
    /// Name hash, from Burning Crusade on
    pub bone_name_crc: u32,
    pub translation: Track<C3Vector>,
    pub rotation: BoneRotation,
    pub scale: Track<C3Vector>,
    pub pivot: C3Vector,
}

impl Default for M2Bone {
    fn default() -> Self {
        Self {
            key_bone_id: -1,
            flags: M2BoneFlags::empty(),
            parent_bone: -1,
            submesh_id: 0,
            bone_name_crc: 0,
            translation: Track::default(),
            rotation: BoneRotation::default(),
            scale: Track::default(),
            pivot: C3Vector::ZERO,
        }
    }
}

impl M2Bone {
    /// Key bone lookup: slot `key_bone_id` holds the first bone with that id
    pub fn key_bone_lookup(bones: &[M2Bone]) -> Result<ArrayRef<i16>> {
        build_lookup(bones.iter().map(|b| b.key_bone_id), MinimumShape::Empty)
    }

    fn has_name_crc(version: M2Version) -> bool {
        version >= M2Version::BURNING_CRUSADE
    }
}

#[derive(Debug)]
pub struct M2BonePatch {
    translation: TrackPatch<C3Vector>,
    rotation: BoneRotationPatch,
    scale: TrackPatch<C3Vector>,
}

impl M2Codec for M2Bone {
    type Patch = M2BonePatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let key_bone_id = reader.read_i32_le()?;
        let flags = M2BoneFlags::from_bits_retain(reader.read_u32_le()?);
        let parent_bone = reader.read_i16_le()?;
        let submesh_id = reader.read_u16_le()?;
        let bone_name_crc = if Self::has_name_crc(ctx.version()) {
            reader.read_u32_le()?
        } else {
            0
        };
        let translation = Track::read_header(reader, ctx)?;
        let rotation = BoneRotation::read_header(reader, ctx)?;
        let scale = Track::read_header(reader, ctx)?;
        let pivot = C3Vector::read_value(reader)?;

        Ok(Self {
            key_bone_id,
            flags,
            parent_bone,
            submesh_id,
            bone_name_crc,
            translation,
            rotation,
            scale,
            pivot,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.translation.load_content(reader, ctx)?;
        self.rotation.load_content(reader, ctx)?;
        self.scale.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<M2BonePatch> {
        writer.write_i32_le(self.key_bone_id)?;
        writer.write_u32_le(self.flags.bits())?;
        writer.write_i16_le(self.parent_bone)?;
        writer.write_u16_le(self.submesh_id)?;
        if Self::has_name_crc(ctx.version()) {
            writer.write_u32_le(self.bone_name_crc)?;
        }
        let translation = self.translation.write_header(writer, ctx)?;
        let rotation = self.rotation.write_header(writer, ctx)?;
        let scale = self.scale.write_header(writer, ctx)?;
        self.pivot.write_value(writer)?;

        Ok(M2BonePatch {
            translation,
            rotation,
            scale,
        })
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: M2BonePatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.translation.save_content(writer, patch.translation, ctx)?;
        self.rotation.save_content(writer, patch.rotation, ctx)?;
        self.scale.save_content(writer, patch.scale, ctx)
    }
}

impl SequenceAware for M2Bone {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.translation.set_sequences(sequences);
        self.rotation.set_sequences(sequences);
        self.scale.set_sequences(sequences);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::{load, save};
    use crate::sequence::M2Sequence;
    use crate::track::InterpolationType;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use test_case::test_case;

    fn registry() -> SequenceRegistry {
        let mut registry: SequenceRegistry = vec![M2Sequence::new(0, 0, 1000)].into();
        registry.assign_time_starts();
        registry
    }

    fn sample(sequences: &SequenceRegistry) -> M2Bone {
        let mut rotation = Track::new(InterpolationType::Linear);
        rotation
            .set_timeline(0, vec![0, 500], vec![M2CompQuat::IDENTITY, M2CompQuat::IDENTITY])
            .unwrap();
        let mut bone = M2Bone {
            key_bone_id: 0,
            flags: M2BoneFlags::TRANSFORMED,
            bone_name_crc: 0xDEAD_BEEF,
            rotation: BoneRotation::Compressed(rotation),
            pivot: C3Vector::new(0.0, 0.0, 1.5),
            ..Default::default()
        };
        bone.translation
            .set_timeline(0, vec![0], vec![C3Vector::ONE])
            .unwrap();
        bone.set_sequences(sequences);
        bone
    }

    #[test_case(M2Version::CLASSIC, 108 ; "classic float rotation")]
    #[test_case(M2Version::BURNING_CRUSADE, 112 ; "burning crusade name crc")]
    #[test_case(M2Version::LICH_KING, 88 ; "lich king timelines")]
    fn test_bone_header_size(version: M2Version, size: u64) {
        let sequences = registry();
        let bone = sample(&sequences);
        let bone = M2Bone {
            rotation: bone.rotation.converted_for(version),
            ..bone
        };
        let mut ctx = M2Context::new(version, &sequences);
        let mut cursor = Cursor::new(Vec::new());
        let _patch = bone.write_header(&mut cursor, &mut ctx).unwrap();
        assert_eq!(cursor.position(), size);
    }

    #[test]
    fn test_bone_roundtrip() {
        let sequences = registry();
        let bone = sample(&sequences);
        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);

        let reloaded: M2Bone = load(&save(&bone, &mut ctx), &mut ctx);
        assert_eq!(reloaded, bone);
    }

    #[test]
    fn test_rotation_encoding_mismatch() {
        let sequences = registry();
        let bone = sample(&sequences);
        let mut ctx = M2Context::new(M2Version::CLASSIC, &sequences);
        let mut cursor = Cursor::new(Vec::new());
        assert!(matches!(
            bone.write_header(&mut cursor, &mut ctx),
            Err(M2Error::Schema(_))
        ));

        let BoneRotation::Float(track) = bone.rotation.converted_for(M2Version::CLASSIC) else {
            panic!("expected float rotation");
        };
        assert_eq!(track.slot(0).unwrap().values[1], Quaternion::IDENTITY);
    }

    #[test]
    fn test_key_bone_lookup() {
        let bones = vec![
            M2Bone {
                key_bone_id: 2,
                ..Default::default()
            },
            M2Bone::default(),
            M2Bone {
                key_bone_id: 0,
                ..Default::default()
            },
        ];
        let lookup = M2Bone::key_bone_lookup(&bones).unwrap();
        assert_eq!(lookup.as_slice(), &[2, -1, 0]);
    }
}
