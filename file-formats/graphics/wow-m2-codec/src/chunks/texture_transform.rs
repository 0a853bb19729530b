use std::io::{Read, Seek, Write};

use crate::codec::{M2Codec, M2Context};
use crate::common::{C3Vector, Quaternion};
use crate::error::Result;
use crate::sequence::SequenceRegistry;
use crate::track::{SequenceAware, Track, TrackPatch};

/// Animated texture coordinate transform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M2TextureTransform {
    pub translation: Track<C3Vector>,
    pub rotation: Track<Quaternion>,
    pub scaling: Track<C3Vector>,
}

#[derive(Debug)]
pub struct M2TextureTransformPatch {
    translation: TrackPatch<C3Vector>,
    rotation: TrackPatch<Quaternion>,
    scaling: TrackPatch<C3Vector>,
}

impl M2Codec for M2TextureTransform {
    type Patch = M2TextureTransformPatch;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        Ok(Self {
            translation: Track::read_header(reader, ctx)?,
            rotation: Track::read_header(reader, ctx)?,
            scaling: Track::read_header(reader, ctx)?,
        })
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        self.translation.load_content(reader, ctx)?;
        self.rotation.load_content(reader, ctx)?;
        self.scaling.load_content(reader, ctx)
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        ctx: &mut M2Context<'_>,
    ) -> Result<M2TextureTransformPatch> {
        Ok(M2TextureTransformPatch {
            translation: self.translation.write_header(writer, ctx)?,
            rotation: self.rotation.write_header(writer, ctx)?,
            scaling: self.scaling.write_header(writer, ctx)?,
        })
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: M2TextureTransformPatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.translation.save_content(writer, patch.translation, ctx)?;
        self.rotation.save_content(writer, patch.rotation, ctx)?;
        self.scaling.save_content(writer, patch.scaling, ctx)
    }
}

impl SequenceAware for M2TextureTransform {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        self.translation.set_sequences(sequences);
        self.rotation.set_sequences(sequences);
        self.scaling.set_sequences(sequences);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::{load, save};
    use crate::sequence::M2Sequence;
    use crate::track::InterpolationType;
    use crate::version::M2Version;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scrolling_transform_roundtrip() {
        let sequences: SequenceRegistry = vec![M2Sequence::new(0, 0, 2000)].into();
        let mut transform = M2TextureTransform::default();
        transform.translation.interpolation = InterpolationType::Linear;
        transform
            .translation
            .set_timeline(0, vec![0, 2000], vec![C3Vector::ZERO, C3Vector::new(1.0, 0.0, 0.0)])
            .unwrap();
        transform.set_sequences(&sequences);
        assert_eq!(transform.rotation.slot_count(), 1);

        let mut ctx = M2Context::new(M2Version::CATACLYSM, &sequences);
        let bytes = save(&transform, &mut ctx);
        assert_eq!(&bytes[0..2], &[1, 0]);

        let reloaded: M2TextureTransform = load(&bytes, &mut ctx);
        assert_eq!(reloaded, transform);
    }
}
