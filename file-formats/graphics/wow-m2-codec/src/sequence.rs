//! Animation sequences and the registry every track resolves against.

use std::io::{Read, Seek, Write};

use bitflags::bitflags;

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, M2Value};
use crate::common::{M2Bounds, M2Range};
use crate::error::{M2Error, Result};
use crate::file_resolver::AnimFileKey;
use crate::io_ext::{ReadExt, WriteExt};
use crate::lookup::{MinimumShape, UNUSED_SLOT, build_lookup};
use crate::version::M2Version;

/// Gap inserted between sequences when laying out the shared timeline of
/// single-timeline revisions
pub const SEQUENCE_TIME_GAP: u32 = 3333;

bitflags! {
    /// Sequence flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct M2SequenceFlags: u32 {
        /// Sets 0x80 when loaded
        const INIT = 0x1;
        const UNKNOWN_0x2 = 0x2;
        const UNKNOWN_0x4 = 0x4;
        const UNKNOWN_0x8 = 0x8;
        /// Set when the sequence is loaded at low priority
        const LOW_PRIORITY = 0x10;
        /// Timeline data lives in the model file rather than an `.anim` file
        const PRIMARY_BONE_SEQUENCE = 0x20;
        /// No data of its own; plays the sequence referenced by `alias_next`
        const IS_ALIAS = 0x40;
        const BLENDED_ANIMATION = 0x80;
        const UNKNOWN_0x100 = 0x100;
        const BLEND_TIME_IN_OUT = 0x200;
    }
}

/// One animation clip
#[derive(Debug, Clone, PartialEq, Default)]
pub struct M2Sequence {
    pub animation_id: u16,
    pub sub_animation_id: u16,
    /// Length in milliseconds
    pub duration: u32,
    /// Position on the shared timeline of single-timeline revisions.
    /// Assigned by [`SequenceRegistry::assign_time_starts`] when saving.
    pub time_start: u32,
    pub movement_speed: f32,
    pub flags: M2SequenceFlags,
    pub frequency: i16,
    pub padding: u16,
    pub replay: M2Range,
    /// Blend time; from Wrath on the low and high halves are the in and out times
    pub blend_time: u32,
    pub bounds: M2Bounds,
    pub variation_next: i16,
    pub alias_next: u16,
}

impl M2Sequence {
    /// Create a sequence owning its own timeline
    pub fn new(animation_id: u16, sub_animation_id: u16, duration: u32) -> Self {
        Self {
            animation_id,
            sub_animation_id,
            duration,
            flags: M2SequenceFlags::PRIMARY_BONE_SEQUENCE,
            frequency: 0x7FFF,
            variation_next: -1,
            ..Default::default()
        }
    }

    pub fn is_alias(&self) -> bool {
        self.flags.contains(M2SequenceFlags::IS_ALIAS)
    }

    /// Whether this sequence keeps its timelines in an `.anim` side file
    pub fn is_external(&self, version: M2Version) -> bool {
        version.has_external_files()
            && !self.is_alias()
            && !self.flags.contains(M2SequenceFlags::PRIMARY_BONE_SEQUENCE)
    }

    /// Key of the side file holding this sequence's timelines
    pub fn anim_file_key(&self, sequence_index: usize) -> AnimFileKey {
        AnimFileKey {
            sequence_index,
            animation_id: self.animation_id,
            sub_animation_id: self.sub_animation_id,
        }
    }

    /// End of this sequence on the shared timeline
    pub fn time_end(&self) -> u32 {
        self.time_start.saturating_add(self.duration)
    }
}

impl M2Codec for M2Sequence {
    type Patch = ();

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let animation_id = reader.read_u16_le()?;
        let sub_animation_id = reader.read_u16_le()?;

        let (time_start, duration) = if ctx.version().has_sequence_timelines() {
            (0, reader.read_u32_le()?)
        } else {
            let start = reader.read_u32_le()?;
            let end = reader.read_u32_le()?;
            (start, end.saturating_sub(start))
        };

        let movement_speed = reader.read_f32_le()?;
        let flags = M2SequenceFlags::from_bits_retain(reader.read_u32_le()?);
        let frequency = reader.read_i16_le()?;
        let padding = reader.read_u16_le()?;
        let replay = M2Range::read_value(reader)?;
        let blend_time = reader.read_u32_le()?;
        let bounds = M2Bounds::read_value(reader)?;
        let variation_next = reader.read_i16_le()?;
        let alias_next = reader.read_u16_le()?;

        Ok(Self {
            animation_id,
            sub_animation_id,
            duration,
            time_start,
            movement_speed,
            flags,
            frequency,
            padding,
            replay,
            blend_time,
            bounds,
            variation_next,
            alias_next,
        })
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W, ctx: &mut M2Context<'_>) -> Result<()> {
        writer.write_u16_le(self.animation_id)?;
        writer.write_u16_le(self.sub_animation_id)?;

        if ctx.version().has_sequence_timelines() {
            writer.write_u32_le(self.duration)?;
        } else {
            writer.write_u32_le(self.time_start)?;
            writer.write_u32_le(self.time_end())?;
        }

        writer.write_f32_le(self.movement_speed)?;
        writer.write_u32_le(self.flags.bits())?;
        writer.write_i16_le(self.frequency)?;
        writer.write_u16_le(self.padding)?;
        self.replay.write_value(writer)?;
        writer.write_u32_le(self.blend_time)?;
        self.bounds.write_value(writer)?;
        writer.write_i16_le(self.variation_next)?;
        writer.write_u16_le(self.alias_next)?;
        Ok(())
    }
}

/// Fallback entry of the playable animation lookup used before Wrath
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct M2PlayableRecord {
    pub fallback_id: i16,
    pub flags: i16,
}

impl M2Value for M2PlayableRecord {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let fallback_id = reader.read_i16_le()?;
        let flags = reader.read_i16_le()?;
        Ok(Self { fallback_id, flags })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i16_le(self.fallback_id)?;
        writer.write_i16_le(self.flags)?;
        Ok(())
    }
}

/// Ordered list of a model's sequences.
///
/// Owned by the model and lent to every track for the duration of one load
/// or save call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SequenceRegistry {
    sequences: ArrayRef<M2Sequence>,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn push(&mut self, sequence: M2Sequence) -> usize {
        self.sequences.push(sequence);
        self.sequences.len() - 1
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M2Sequence> {
        self.sequences.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, M2Sequence> {
        self.sequences.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&M2Sequence> {
        self.sequences.get(index)
    }

    /// Sequence at `index`, failing past the end of the registry
    pub fn resolve(&self, index: usize) -> Result<&M2Sequence> {
        self.sequences.get(index).ok_or(M2Error::SequenceOutOfRange {
            index,
            count: self.sequences.len(),
        })
    }

    /// Follow alias links from `index` to the sequence that owns timeline storage
    pub fn resolve_alias(&self, index: usize) -> Result<usize> {
        let mut current = index;
        for _ in 0..=self.sequences.len() {
            let sequence = self.resolve(current)?;
            if !sequence.is_alias() {
                return Ok(current);
            }
            current = sequence.alias_next as usize;
        }
        Err(M2Error::ValidationError(format!(
            "alias chain starting at sequence {index} never reaches a sequence with data"
        )))
    }

    /// Lay the sequences out on one shared timeline, separated by
    /// [`SEQUENCE_TIME_GAP`]. Aliases take the start of their target.
    pub fn assign_time_starts(&mut self) {
        let mut time = 0u32;
        for sequence in self.sequences.iter_mut().filter(|s| !s.is_alias()) {
            time = time.saturating_add(SEQUENCE_TIME_GAP);
            sequence.time_start = time;
            time = time.saturating_add(sequence.duration);
        }

        let alias_starts: Vec<(usize, u32)> = (0..self.sequences.len())
            .filter(|&i| self.sequences[i].is_alias())
            .filter_map(|i| {
                let target = self.resolve_alias(i).ok()?;
                Some((i, self.sequences[target].time_start))
            })
            .collect();
        for (index, start) in alias_starts {
            self.sequences[index].time_start = start;
        }
    }

    /// Lookup from animation id to the first sequence playing it
    pub fn sequence_lookup(&self) -> Result<ArrayRef<i16>> {
        build_lookup(
            self.sequences.iter().map(|s| s.animation_id),
            MinimumShape::Empty,
        )
    }

    /// Playable lookup derived from the sequence lookup.
    ///
    /// Animation ids present in the model play themselves; missing ones fall
    /// back to animation 0.
    pub fn playable_lookup(sequence_lookup: &[i16]) -> ArrayRef<M2PlayableRecord> {
        sequence_lookup
            .iter()
            .enumerate()
            .map(|(animation_id, &slot)| M2PlayableRecord {
                fallback_id: if slot == UNUSED_SLOT {
                    0
                } else {
                    animation_id as i16
                },
                flags: 0,
            })
            .collect()
    }

    pub(crate) fn array(&self) -> &ArrayRef<M2Sequence> {
        &self.sequences
    }
}

impl From<Vec<M2Sequence>> for SequenceRegistry {
    fn from(sequences: Vec<M2Sequence>) -> Self {
        Self {
            sequences: sequences.into(),
        }
    }
}

impl FromIterator<M2Sequence> for SequenceRegistry {
    fn from_iter<I: IntoIterator<Item = M2Sequence>>(iter: I) -> Self {
        Self {
            sequences: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SequenceRegistry {
    type Item = &'a M2Sequence;
    type IntoIter = std::slice::Iter<'a, M2Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}
