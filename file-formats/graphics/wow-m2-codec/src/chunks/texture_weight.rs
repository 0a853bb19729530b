use std::io::{Read, Seek, Write};

use crate::codec::{M2Codec, M2Context};
use crate::common::FixedPoint016;
use crate::error::Result;
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};

/// Animated texture transparency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2TextureWeight {
    pub weight: Track<FixedPoint016>,
}

impl M2Codec for M2TextureWeight {
    type Patch = TrackPatch<FixedPoint016>;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        Ok(Self {
            weight: Track::read_header(reader, ctx)?,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.weight.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        ctx: &mut M2Context<'_>,
    ) -> Result<TrackPatch<FixedPoint016>> {
        self.weight.write_header(writer, ctx)
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: TrackPatch<FixedPoint016>,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.weight.save_content(writer, patch, ctx)
    }
}

impl SequenceAware for M2TextureWeight {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.weight.set_sequences(sequences);
    }
}
