use std::io::{Read, Seek, Write};

use crate::codec::{M2Codec, M2Context, M2Value};
use crate::common::C3Vector;
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum M2LightType {
    /// Directional light (like the sun)
    Directional,
    /// Point light (emits light in all directions)
    #[default]
    Point,
    Other(u16),
}

impl M2LightType {
    pub fn from_raw(value: u16) -> Self {
        match value {
            0 => Self::Directional,
            1 => Self::Point,
            other => Self::Other(other),
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
            Self::Other(value) => value,
        }
    }
}

/// Represents a light in an M2 model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2Light {
    pub light_type: M2LightType,
    /// Bone to attach the light to, -1 for none
    pub bone: i16,
    pub position: C3Vector,
    pub ambient_color: Track<C3Vector>,
    pub ambient_intensity: Track<f32>,
    pub diffuse_color: Track<C3Vector>,
    pub diffuse_intensity: Track<f32>,
    /// Where the light begins to fade
    pub attenuation_start: Track<f32>,
    /// Where the light fully fades
    pub attenuation_end: Track<f32>,
    pub visibility: Track<u8>,
}

#[derive(Debug)]
pub struct M2LightPatch {
    ambient_color: TrackPatch<C3Vector>,
    ambient_intensity: TrackPatch<f32>,
    diffuse_color: TrackPatch<C3Vector>,
    diffuse_intensity: TrackPatch<f32>,
    attenuation_start: TrackPatch<f32>,
    attenuation_end: TrackPatch<f32>,
    visibility: TrackPatch<u8>,
}

impl M2Codec for M2Light {
    type Patch = M2LightPatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let light_type = M2LightType::from_raw(reader.read_u16_le()?);
        let bone = reader.read_i16_le()?;
        let position = C3Vector::read_value(reader)?;

        Ok(Self {
            light_type,
            bone,
            position,
            ambient_color: Track::read_header(reader, ctx)?,
            ambient_intensity: Track::read_header(reader, ctx)?,
            diffuse_color: Track::read_header(reader, ctx)?,
            diffuse_intensity: Track::read_header(reader, ctx)?,
            attenuation_start: Track::read_header(reader, ctx)?,
            attenuation_end: Track::read_header(reader, ctx)?,
            visibility: Track::read_header(reader, ctx)?,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.ambient_color.load_content(reader, ctx)?;
        self.ambient_intensity.load_content(reader, ctx)?;
        self.diffuse_color.load_content(reader, ctx)?;
        self.diffuse_intensity.load_content(reader, ctx)?;
        self.attenuation_start.load_content(reader, ctx)?;
        self.attenuation_end.load_content(reader, ctx)?;
        self.visibility.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<M2LightPatch> {
        writer.write_u16_le(self.light_type.to_raw())?;
        writer.write_i16_le(self.bone)?;
        self.position.write_value(writer)?;

        Ok(M2LightPatch {
            ambient_color: self.ambient_color.write_header(writer, ctx)?,
            ambient_intensity: self.ambient_intensity.write_header(writer, ctx)?,
            diffuse_color: self.diffuse_color.write_header(writer, ctx)?,
            diffuse_intensity: self.diffuse_intensity.write_header(writer, ctx)?,
            attenuation_start: self.attenuation_start.write_header(writer, ctx)?,
            attenuation_end: self.attenuation_end.write_header(writer, ctx)?,
            visibility: self.visibility.write_header(writer, ctx)?,
        })
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: M2LightPatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.ambient_color.save_content(writer, patch.ambient_color, ctx)?;
        self.ambient_intensity.save_content(writer, patch.ambient_intensity, ctx)?;
        self.diffuse_color.save_content(writer, patch.diffuse_color, ctx)?;
        self.diffuse_intensity.save_content(writer, patch.diffuse_intensity, ctx)?;
        self.attenuation_start.save_content(writer, patch.attenuation_start, ctx)?;
        self.attenuation_end.save_content(writer, patch.attenuation_end, ctx)?;
        self.visibility.save_content(writer, patch.visibility, ctx)
    }
}

impl SequenceAware for M2Light {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.ambient_color.set_sequences(sequences);
        self.ambient_intensity.set_sequences(sequences);
        self.diffuse_color.set_sequences(sequences);
        self.diffuse_intensity.set_sequences(sequences);
        self.attenuation_start.set_sequences(sequences);
        self.attenuation_end.set_sequences(sequences);
        self.visibility.set_sequences(sequences);
    }
}
