use std::io::{Read, Seek, Write};

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, M2Value};
use crate::common::C3Vector;
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::lookup::{MinimumShape, build_lookup};
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};

/// Well-known attachment points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum M2AttachmentType {
    Shield = 0,
    HandRight = 1,
    HandLeft = 2,
    ElbowRight = 3,
    ElbowLeft = 4,
    ShoulderRight = 5,
    ShoulderLeft = 6,
    KneeRight = 7,
    KneeLeft = 8,
    HipRight = 9,
    HipLeft = 10,
    Helm = 11,
    Back = 12,
    ShoulderFlapRight = 13,
    ShoulderFlapLeft = 14,
}

impl M2AttachmentType {
    /// Parse from integer value
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::Shield,
            1 => Self::HandRight,
            2 => Self::HandLeft,
            3 => Self::ElbowRight,
            4 => Self::ElbowLeft,
            5 => Self::ShoulderRight,
            6 => Self::ShoulderLeft,
            7 => Self::KneeRight,
            8 => Self::KneeLeft,
            9 => Self::HipRight,
            10 => Self::HipLeft,
            11 => Self::Helm,
            12 => Self::Back,
            13 => Self::ShoulderFlapRight,
            14 => Self::ShoulderFlapLeft,
            _ => return None,
        })
    }
}

/// Represents an attachment in an M2 model
///
/// Attachment structure:
/// - id: u32 - attachment point id
/// - bone: u16 - bone index to attach to
/// - unknown: u16
/// - position: C3Vector - position relative to bone
/// - animate_attached: track of u8 - whether attached models are shown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2Attachment {
    pub id: u32,
    pub bone: u16,
    pub unknown: u16,
    pub position: C3Vector,
    pub animate_attached: Track<u8>,
}

impl M2Attachment {
    pub fn attachment_type(&self) -> Option<M2AttachmentType> {
        M2AttachmentType::from_u32(self.id)
    }

    /// Attachment lookup: slot `id` holds the first attachment with that id
    pub fn lookup(attachments: &[M2Attachment]) -> Result<ArrayRef<i16>> {
        build_lookup(attachments.iter().map(|a| a.id), MinimumShape::Empty)
    }
}

impl M2Codec for M2Attachment {
    type Patch = TrackPatch<u8>;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let id = reader.read_u32_le()?;
        let bone = reader.read_u16_le()?;
        let unknown = reader.read_u16_le()?;
        let position = C3Vector::read_value(reader)?;
        let animate_attached = Track::read_header(reader, ctx)?;

        Ok(Self {
            id,
            bone,
            unknown,
            position,
            animate_attached,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.animate_attached.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<TrackPatch<u8>> {
        writer.write_u32_le(self.id)?;
        writer.write_u16_le(self.bone)?;
        writer.write_u16_le(self.unknown)?;
        self.position.write_value(writer)?;
        self.animate_attached.write_header(writer, ctx)
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: TrackPatch<u8>,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.animate_attached.save_content(writer, patch, ctx)
    }
}

impl SequenceAware for M2Attachment {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.animate_attached.set_sequences(sequences);
    }
}
