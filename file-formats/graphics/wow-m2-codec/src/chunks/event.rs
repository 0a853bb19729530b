use std::io::{Read, Seek, Write};

use crate::codec::{M2Codec, M2Context, M2Value};
use crate::common::C3Vector;
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::sequence::SequenceRegistry;
use crate::track::{EventTrack, NoValue, SequenceAware, Track, TrackPatch};

/// Represents an event in an M2 model
///
/// Events fire at the timestamps of their track; the track carries no values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2Event {
    /// Event identifier (4-char string like "$CAH", "$CST")
    pub identifier: [u8; 4],
    /// Event data (sound/spell database ID)
    pub data: u32,
    /// Bone to attach the event to
    pub bone: u16,
    pub unknown: u16,
    /// Position relative to bone
    pub position: C3Vector,
    pub enabled: EventTrack,
}

impl M2Event {
    pub fn new(identifier: [u8; 4], bone: u16) -> Self {
        Self {
            identifier,
            bone,
            ..Default::default()
        }
    }

    pub fn identifier_str(&self) -> String {
        String::from_utf8_lossy(&self.identifier).to_string()
    }
}

impl M2Codec for M2Event {
    type Patch = TrackPatch<NoValue>;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let identifier = reader.read_magic()?;
        let data = reader.read_u32_le()?;
        let bone = reader.read_u16_le()?;
        let unknown = reader.read_u16_le()?;
        let position = C3Vector::read_value(reader)?;
        let enabled = Track::read_header(reader, ctx)?;

        Ok(Self {
            identifier,
            data,
            bone,
            unknown,
            position,
            enabled,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.enabled.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        ctx: &mut M2Context<'_>,
    ) -> Result<TrackPatch<NoValue>> {
        writer.write_all(&self.identifier)?;
        writer.write_u32_le(self.data)?;
        writer.write_u16_le(self.bone)?;
        writer.write_u16_le(self.unknown)?;
        self.position.write_value(writer)?;
        self.enabled.write_header(writer, ctx)
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: TrackPatch<NoValue>,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.enabled.save_content(writer, patch, ctx)
    }
}

impl SequenceAware for M2Event {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.enabled.set_sequences(sequences);
    }
}
