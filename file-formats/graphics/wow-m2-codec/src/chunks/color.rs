use std::io::{Read, Seek, Write};

use crate::codec::{M2Codec, M2Context};
use crate::common::{C3Vector, FixedPoint016};
use crate::error::Result;
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};

/// Animated vertex color referenced by batches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2Color {
    /// RGB in 0..1
    pub color: Track<C3Vector>,
    pub alpha: Track<FixedPoint016>,
}

#[derive(Debug)]
pub struct M2ColorPatch {
    color: TrackPatch<C3Vector>,
    alpha: TrackPatch<FixedPoint016>,
}

impl M2Codec for M2Color {
    type Patch = M2ColorPatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        Ok(Self {
            color: Track::read_header(reader, ctx)?,
            alpha: Track::read_header(reader, ctx)?,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.color.load_content(reader, ctx)?;
        self.alpha.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<M2ColorPatch> {
        Ok(M2ColorPatch {
            color: self.color.write_header(writer, ctx)?,
            alpha: self.alpha.write_header(writer, ctx)?,
        })
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: M2ColorPatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.color.save_content(writer, patch.color, ctx)?;
        self.alpha.save_content(writer, patch.alpha, ctx)
    }
}

impl SequenceAware for M2Color {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.color.set_sequences(sequences);
        self.alpha.set_sequences(sequences);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::{load, save, u32_at};
    use crate::sequence::M2Sequence;
    use crate::track::InterpolationType;
    use crate::version::M2Version;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_color_payload_follows_both_headers() {
        let sequences: SequenceRegistry = vec![M2Sequence::new(0, 0, 100)].into();
        let mut color = M2Color::default();
        color.color = Track::with_default(C3Vector::new(1.0, 0.5, 0.0), &sequences);
        color.alpha.interpolation = InterpolationType::Linear;
        color
            .alpha
            .set_timeline(0, vec![0, 100], vec![FixedPoint016(0), FixedPoint016(0x7FFF)])
            .unwrap();
        color.set_sequences(&sequences);

        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);
        let bytes = save(&color, &mut ctx);
        // two 20-byte track headers, then the color timeline descriptors
        assert_eq!(u32_at(&bytes, 8), 40);

        let reloaded: M2Color = load(&bytes, &mut ctx);
        assert_eq!(reloaded, color);
    }
}
