use std::io::{Read, Seek, Write};

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, M2Value};
use crate::common::{C3Vector, M2SplineKey};
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::lookup::{MinimumShape, build_lookup};
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};
use crate::version::M2Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum M2CameraType {
    Portrait,
    CharacterInfo,
    #[default]
    UserInterface,
    Other(i32),
}

impl M2CameraType {
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Portrait,
            1 => Self::CharacterInfo,
            -1 => Self::UserInterface,
            other => Self::Other(other),
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            Self::Portrait => 0,
            Self::CharacterInfo => 1,
            Self::UserInterface => -1,
            Self::Other(value) => value,
        }
    }

    /// Field of view written for a camera without one, in radians
    fn default_fov(self) -> f32 {
        match self {
            Self::Portrait => 0.7,
            _ => 0.97,
        }
    }
}

/// Represents a camera in an M2 model
///
/// Before the field of view became animated, it is a single float in the
/// header. It is exposed as a track either way: legacy files get one
/// keyframe at time 0 in every sequence. A model without sequences has no
/// slot to hold it, so the float is kept aside until sequences are set.
#[derive(Debug, Clone, Default)]
pub struct M2Camera {
    pub camera_type: M2CameraType,
    /// Far clip distance
    pub far_clip: f32,
    /// Near clip distance
    pub near_clip: f32,
    pub positions: Track<M2SplineKey<C3Vector>>,
    pub position_base: C3Vector,
    pub target_positions: Track<M2SplineKey<C3Vector>>,
    pub target_position_base: C3Vector,
    /// Rotation around the view axis
    pub roll: Track<M2SplineKey<f32>>,
    pub field_of_view: Track<M2SplineKey<f32>>,
    legacy_fov: Option<f32>,
}

impl PartialEq for M2Camera {
    fn eq(&self, other: &Self) -> bool {
        self.camera_type == other.camera_type
            && self.far_clip == other.far_clip
            && self.near_clip == other.near_clip
            && self.positions == other.positions
            && self.position_base == other.position_base
            && self.target_positions == other.target_positions
            && self.target_position_base == other.target_position_base
            && self.roll == other.roll
            && self.field_of_view == other.field_of_view
            && self.static_fov() == other.static_fov()
    }
}

impl M2Camera {
    pub fn new(camera_type: M2CameraType) -> Self {
        Self {
            camera_type,
            ..Default::default()
        }
    }

    fn has_fov_track(version: M2Version) -> bool {
        version >= M2Version::CAMERA_FOV_TRACK
    }

    /// Move a header field of view into the track once a sequence can hold it
    fn promote_legacy_fov(&mut self, sequences: &SequenceRegistry) {
        let Some(fov) = self.legacy_fov else {
            return;
        };
        if !self.field_of_view.is_empty() {
            self.legacy_fov = None;
            return;
        }
        let track = Track::with_default(M2SplineKey::flat(fov), sequences);
        if track.is_empty() {
            log::debug!("keeping camera field of view {fov} aside: no sequence can hold it");
            return;
        }
        self.field_of_view = track;
        self.legacy_fov = None;
    }

    /// Single field of view stored by legacy headers
    pub fn static_fov(&self) -> f32 {
        (0..self.field_of_view.slot_count())
            .filter_map(|index| self.field_of_view.slot(index))
            .find_map(|slot| slot.values.first().map(|key| key.value))
            .or(self.legacy_fov)
            .unwrap_or_else(|| self.camera_type.default_fov())
    }

    /// Camera lookup: slot `type` holds the first camera of that type.
    ///
    /// Empty without cameras, a single unused slot when every camera is a
    /// user interface camera.
    pub fn lookup(cameras: &[M2Camera]) -> Result<ArrayRef<i16>> {
        build_lookup(
            cameras.iter().map(|c| c.camera_type.to_raw()),
            MinimumShape::SingleSentinel,
        )
    }
}

#[derive(Debug)]
pub struct M2CameraPatch {
    positions: TrackPatch<M2SplineKey<C3Vector>>,
    target_positions: TrackPatch<M2SplineKey<C3Vector>>,
    roll: TrackPatch<M2SplineKey<f32>>,
    field_of_view: Option<TrackPatch<M2SplineKey<f32>>>,
}

impl M2Codec for M2Camera {
    type Patch = M2CameraPatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let camera_type = M2CameraType::from_raw(reader.read_i32_le()?);
        let legacy_fov = if Self::has_fov_track(ctx.version()) {
            None
        } else {
            Some(reader.read_f32_le()?)
        };
        let far_clip = reader.read_f32_le()?;
        let near_clip = reader.read_f32_le()?;
        let positions = Track::read_header(reader, ctx)?;
        let position_base = C3Vector::read_value(reader)?;
        let target_positions = Track::read_header(reader, ctx)?;
        let target_position_base = C3Vector::read_value(reader)?;
        let roll = Track::read_header(reader, ctx)?;
        let field_of_view = if Self::has_fov_track(ctx.version()) {
            Track::read_header(reader, ctx)?
        } else {
            Track::default()
        };

        Ok(Self {
            camera_type,
            far_clip,
            near_clip,
            positions,
            position_base,
            target_positions,
            target_position_base,
            roll,
            field_of_view,
            legacy_fov,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.positions.load_content(reader, ctx)?;
        self.target_positions.load_content(reader, ctx)?;
        self.roll.load_content(reader, ctx)?;

        if self.legacy_fov.is_none() {
            return self.field_of_view.load_content(reader, ctx);
        }
        self.promote_legacy_fov(ctx.sequences());
        Ok(())
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<M2CameraPatch> {
        let fov_track = Self::has_fov_track(ctx.version());

        writer.write_i32_le(self.camera_type.to_raw())?;
        if !fov_track {
            writer.write_f32_le(self.static_fov())?;
        }
        writer.write_f32_le(self.far_clip)?;
        writer.write_f32_le(self.near_clip)?;
        let positions = self.positions.write_header(writer, ctx)?;
        self.position_base.write_value(writer)?;
        let target_positions = self.target_positions.write_header(writer, ctx)?;
        self.target_position_base.write_value(writer)?;
        let roll = self.roll.write_header(writer, ctx)?;
        let field_of_view = if fov_track {
            Some(self.field_of_view.write_header(writer, ctx)?)
        } else {
            None
        };

        Ok(M2CameraPatch {
            positions,
            target_positions,
            roll,
            field_of_view,
        })
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: M2CameraPatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.positions.save_content(writer, patch.positions, ctx)?;
        self.target_positions.save_content(writer, patch.target_positions, ctx)?;
        self.roll.save_content(writer, patch.roll, ctx)?;
        if let Some(field_of_view) = patch.field_of_view {
            self.field_of_view.save_content(writer, field_of_view, ctx)?;
        }
        Ok(())
    }
}

impl SequenceAware for M2Camera {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.positions.set_sequences(sequences);
        self.target_positions.set_sequences(sequences);
        self.roll.set_sequences(sequences);
        self.promote_legacy_fov(sequences);
        self.field_of_view.set_sequences(sequences);
    }
}
