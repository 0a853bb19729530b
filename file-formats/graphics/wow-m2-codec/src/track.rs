//! Animated property tracks
//!
//! A track stores one keyframe timeline per animation sequence. From Wrath
//! on, each timeline is a separate pair of arrays and timelines of sequences
//! stored outside the model are read from `.anim` side files. Earlier
//! revisions store a single timeline for the whole model, with every
//! sequence occupying its own time window; those are split into per-sequence
//! slots on load and merged back on save, so callers always see slots.

use std::io::{Read, Seek, Write};

use crate::array_ref::ArrayRef;
use crate::codec::{M2Codec, M2Context, M2Value, PatchToken};
use crate::common::{
    C2Vector, C3Vector, FixedPoint016, M2CompQuat, M2Range, M2SplineKey, Quaternion,
};
use crate::error::{M2Error, Result};
use crate::file_resolver::AnimFileKey;
use crate::io_ext::{ReadExt, WriteExt};
use crate::sequence::SequenceRegistry;
use crate::version::M2Version;

/// Wire value of a track that follows the model's sequences
const NO_GLOBAL_SEQUENCE: u16 = 0xFFFF;

/// Interpolation between keyframes. Evaluation is left to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationType {
    #[default]
    None,
    Linear,
    Bezier,
    Hermite,
    Other(u16),
}

impl InterpolationType {
    pub fn from_raw(value: u16) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Linear,
            2 => Self::Bezier,
            3 => Self::Hermite,
            other => Self::Other(other),
        }
    }

    pub fn to_raw(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::Bezier => 2,
            Self::Hermite => 3,
            Self::Other(value) => value,
        }
    }

    /// Whether keyframes carry in and out tangents
    pub fn uses_tangents(self) -> bool {
        matches!(self, Self::Bezier | Self::Hermite)
    }
}

/// Keyframe value of an animated property
pub trait TrackValue: M2Value + Clone {
    /// Whether the track stores a value array next to its timestamps
    const HAS_VALUES: bool = true;
}

macro_rules! impl_track_value {
    ($($ty:ty),* $(,)?) => {
        $(impl TrackValue for $ty {})*
    };
}

impl_track_value!(u8, u16, i16, u32, f32, C2Vector, C3Vector, Quaternion, M2CompQuat, FixedPoint016);

impl<T: TrackValue> TrackValue for M2SplineKey<T> {}

/// Value type of timestamp-only tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoValue;

impl M2Value for NoValue {
    fn read_value<R: Read>(_reader: &mut R) -> Result<Self> {
        Ok(Self)
    }

    fn write_value<W: Write>(&self, _writer: &mut W) -> Result<()> {
        Ok(())
    }
}

impl TrackValue for NoValue {
    const HAS_VALUES: bool = false;
}

/// A track of timestamps with no values, as used by events
pub type EventTrack = Track<NoValue>;

/// Entities holding tracks bind the model's sequences through this trait
pub trait SequenceAware {
    /// Give every per-sequence track one slot per sequence in `sequences`.
    ///
    /// Slots of alias sequences are emptied. Calling it again with the same
    /// registry changes nothing.
    fn set_sequences(&mut self, sequences: &SequenceRegistry);
}

impl<T: SequenceAware> SequenceAware for ArrayRef<T> {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        for item in self.iter_mut() {
            item.set_sequences(sequences);
        }
    }
}

/// Borrowed keyframes of one slot
#[derive(Debug, PartialEq)]
pub struct Timeline<'t, T> {
    pub timestamps: &'t [u32],
    /// Empty for timestamp-only tracks
    pub values: &'t [T],
}

impl<T> Clone for Timeline<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Timeline<'_, T> {}

impl<T> Default for Timeline<'_, T> {
    fn default() -> Self {
        Self {
            timestamps: &[],
            values: &[],
        }
    }
}

impl<T> Timeline<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Single model-wide timeline of the revisions before Wrath
#[derive(Debug, Clone)]
struct RangedTimeline<T> {
    ranges: ArrayRef<M2Range>,
    timestamps: ArrayRef<u32>,
    values: ArrayRef<T>,
}

#[derive(Debug)]
enum PatchKind<T> {
    Timelines {
        timestamps: PatchToken,
        values: Option<PatchToken>,
    },
    Ranged {
        timeline: Box<RangedTimeline<T>>,
        ranges: PatchToken,
        timestamps: PatchToken,
        values: Option<PatchToken>,
    },
}

/// Returned by [`Track::write_header`] and consumed by its content save
#[derive(Debug)]
#[must_use = "a track patch must be handed to the matching content save"]
pub struct TrackPatch<T>(PatchKind<T>);

/// An animated property
#[derive(Debug, Clone)]
pub struct Track<T> {
    pub interpolation: InterpolationType,
    /// Global sequence driving this track instead of the model's sequences
    pub global_sequence: Option<u16>,
    timestamps: ArrayRef<ArrayRef<u32>>,
    values: ArrayRef<ArrayRef<T>>,
    ranged: Option<Box<RangedTimeline<T>>>,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self {
            interpolation: InterpolationType::None,
            global_sequence: None,
            timestamps: ArrayRef::new(),
            values: ArrayRef::new(),
            ranged: None,
        }
    }
}

impl<T: PartialEq> PartialEq for Track<T> {
    fn eq(&self, other: &Self) -> bool {
        self.interpolation == other.interpolation
            && self.global_sequence == other.global_sequence
            && self.timestamps == other.timestamps
            && self.values == other.values
    }
}

impl<T: TrackValue> Track<T> {
    pub fn new(interpolation: InterpolationType) -> Self {
        Self {
            interpolation,
            ..Self::default()
        }
    }

    /// A track driven by the global sequence at `index`
    pub fn global(interpolation: InterpolationType, index: u16) -> Self {
        Self {
            interpolation,
            global_sequence: Some(index),
            ..Self::default()
        }
    }

    /// A track holding `value` at time 0 in every sequence slot
    pub fn with_default(value: T, sequences: &SequenceRegistry) -> Self {
        let mut track = Self::new(InterpolationType::None);
        for (index, sequence) in sequences.iter().enumerate() {
            if !sequence.is_alias() {
                track.set_slot(index, vec![0], vec![value.clone()]);
            }
        }
        track.set_sequences(sequences);
        track
    }

    pub fn slot_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no slot holds a keyframe
    pub fn is_empty(&self) -> bool {
        self.timestamps.iter().all(|slot| slot.is_empty())
    }

    pub fn key_count(&self) -> usize {
        self.timestamps.iter().map(|slot| slot.len()).sum()
    }

    /// Keyframes stored in `slot`, without alias resolution
    pub fn slot(&self, slot: usize) -> Option<Timeline<'_, T>> {
        let timestamps = self.timestamps.get(slot)?;
        let values = if T::HAS_VALUES {
            self.values.get(slot).map_or(&[][..], |v| v.as_slice())
        } else {
            &[]
        };
        Some(Timeline {
            timestamps,
            values,
        })
    }

    /// Replace the keyframes of `slot`, adding empty slots up to it
    pub fn set_timeline(&mut self, slot: usize, timestamps: Vec<u32>, values: Vec<T>) -> Result<()> {
        if T::HAS_VALUES && timestamps.len() != values.len() {
            return Err(M2Error::ValidationError(format!(
                "timeline has {} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }
        self.set_slot(slot, timestamps, values);
        Ok(())
    }

    fn set_slot(&mut self, slot: usize, timestamps: Vec<u32>, values: Vec<T>) {
        self.grow_to(slot + 1);
        self.timestamps[slot] = timestamps.into();
        if T::HAS_VALUES {
            self.values[slot] = values.into();
        }
    }

    fn grow_to(&mut self, slots: usize) {
        if self.timestamps.len() < slots {
            self.timestamps.resize_with(slots, ArrayRef::new);
        }
        if T::HAS_VALUES && self.values.len() < slots {
            self.values.resize_with(slots, ArrayRef::new);
        }
    }

    /// Keyframes played for a sequence.
    ///
    /// Global tracks answer with their single timeline. Alias sequences
    /// answer with the timeline of the sequence they alias.
    pub fn timeline(
        &self,
        sequence_index: usize,
        sequences: &SequenceRegistry,
    ) -> Result<Timeline<'_, T>> {
        if self.global_sequence.is_some() {
            return Ok(self.slot(0).unwrap_or_default());
        }
        let owner = sequences.resolve_alias(sequence_index)?;
        Ok(self.slot(owner).unwrap_or_default())
    }

    /// Convert every keyframe value, keeping slots and timestamps
    pub fn map_values<U, F>(&self, mut convert: F) -> Track<U>
    where
        U: TrackValue,
        F: FnMut(&T) -> U,
    {
        Track {
            interpolation: self.interpolation,
            global_sequence: self.global_sequence,
            timestamps: self.timestamps.clone(),
            values: self
                .values
                .iter()
                .map(|slot| slot.iter().map(&mut convert).collect())
                .collect(),
            ranged: None,
        }
    }

    fn external_key(
        &self,
        slot: usize,
        sequences: &SequenceRegistry,
        version: M2Version,
    ) -> Option<AnimFileKey> {
        if self.global_sequence.is_some() {
            return None;
        }
        sequences
            .get(slot)
            .filter(|s| s.is_external(version))
            .map(|s| s.anim_file_key(slot))
    }

    fn check_slots(&self, sequences: &SequenceRegistry) -> Result<()> {
        let slots = self.timestamps.len();
        if self.global_sequence.is_some() {
            if slots > 1 {
                return Err(M2Error::Schema(format!(
                    "global sequence track has {slots} timelines"
                )));
            }
        } else if slots != sequences.len() {
            return Err(M2Error::Schema(format!(
                "track has {slots} timelines but the model has {} sequences",
                sequences.len()
            )));
        }

        if T::HAS_VALUES {
            if self.values.len() != slots {
                return Err(M2Error::Schema(format!(
                    "track has {slots} timestamp arrays but {} value arrays",
                    self.values.len()
                )));
            }
            if let Some(slot) = (0..slots).find(|&i| self.timestamps[i].len() != self.values[i].len()) {
                return Err(M2Error::Schema(format!(
                    "timeline {slot} has {} timestamps but {} values",
                    self.timestamps[slot].len(),
                    self.values[slot].len()
                )));
            }
        }
        Ok(())
    }

    /// Cut the model-wide timeline into per-sequence slots
    fn split_ranged(&mut self, ranged: RangedTimeline<T>, sequences: &SequenceRegistry) -> Result<()> {
        let RangedTimeline {
            timestamps, values, ..
        } = ranged;
        if T::HAS_VALUES && timestamps.len() != values.len() {
            return Err(M2Error::ValidationError(format!(
                "timeline has {} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }

        self.timestamps.clear();
        self.values.clear();

        if self.global_sequence.is_some() {
            if !timestamps.is_empty() {
                self.timestamps.push(timestamps);
                if T::HAS_VALUES {
                    self.values.push(values);
                }
            }
            return Ok(());
        }

        self.grow_to(sequences.len());
        let mut claimed = 0;
        for (index, sequence) in sequences.iter().enumerate() {
            if sequence.is_alias() {
                continue;
            }
            let (start, end) = (sequence.time_start, sequence.time_end());
            for (key, &time) in timestamps.iter().enumerate() {
                if time < start || time > end {
                    continue;
                }
                self.timestamps[index].push(time - start);
                if T::HAS_VALUES {
                    self.values[index].push(values[key].clone());
                }
                claimed += 1;
            }
        }

        if claimed < timestamps.len() {
            log::debug!(
                "{} of {} keyframes fall outside every sequence window",
                timestamps.len() - claimed,
                timestamps.len()
            );
        }
        Ok(())
    }

    /// Lay the slots out on the shared timeline
    fn merge_ranged(&self, sequences: &SequenceRegistry) -> RangedTimeline<T> {
        let mut merged = RangedTimeline {
            ranges: ArrayRef::new(),
            timestamps: ArrayRef::new(),
            values: ArrayRef::new(),
        };

        if self.global_sequence.is_some() {
            if let Some(slot) = self.slot(0) {
                merged.timestamps.extend_from_slice(slot.timestamps);
                merged.values.extend_from_slice(slot.values);
            }
            return merged;
        }

        for (index, sequence) in sequences.iter().enumerate() {
            let first = merged.timestamps.len();
            let slot = self.slot(index).unwrap_or_default();
            if !sequence.is_alias() {
                if slot.timestamps.iter().any(|&t| t > sequence.duration) {
                    log::warn!(
                        "sequence {index} has keyframes past its duration of {} ms",
                        sequence.duration
                    );
                }
                merged.timestamps.extend(
                    slot.timestamps
                        .iter()
                        .map(|&t| sequence.time_start.saturating_add(t)),
                );
                merged.values.extend_from_slice(slot.values);
            }
            let last = merged.timestamps.len();
            merged.ranges.push(if last > first {
                M2Range::new(first as u32, (last - 1) as u32)
            } else {
                M2Range::default()
            });
        }

        if merged.timestamps.is_empty() {
            merged.ranges.clear();
        }
        merged
    }
}

/// Content load of one timestamp or value array of a slot
fn load_slot<V, R>(
    array: &mut ArrayRef<V>,
    external: Option<AnimFileKey>,
    reader: &mut R,
    ctx: &mut M2Context<'_>,
) -> Result<()>
where
    V: M2Value,
    R: Read + Seek,
{
    let Some(key) = external else {
        return array.load_content(reader, ctx);
    };
    if array.declared_count() == 0 {
        return Ok(());
    }
    let Some(files) = ctx.files() else {
        log::debug!(
            "timeline of sequence {} is stored in {} and no side files are available",
            key.sequence_index,
            key.file_suffix()
        );
        return Ok(());
    };
    match files.open_anim(&key)? {
        Some(mut anim) => array.load_values_from(&mut anim),
        None => {
            log::warn!(
                "missing {} for sequence {}, leaving its timeline empty",
                key.file_suffix(),
                key.sequence_index
            );
            Ok(())
        }
    }
}

/// Content save of one timestamp or value array of a slot
fn save_slot<V, W>(
    array: &ArrayRef<V>,
    external: Option<AnimFileKey>,
    token: PatchToken,
    writer: &mut W,
    ctx: &mut M2Context<'_>,
) -> Result<()>
where
    V: M2Value,
    W: Write + Seek,
{
    let Some(key) = external else {
        return array.save_content(writer, token, ctx);
    };
    if array.is_empty() {
        return Ok(());
    }
    let Some(files) = ctx.files() else {
        log::warn!(
            "dropping timeline of sequence {}: no side files to write {} to",
            key.sequence_index,
            key.file_suffix()
        );
        return ArrayRef::<V>::save_empty(writer, token);
    };
    let mut anim = files.append_anim(&key)?;
    array.save_values_to(writer, token, &mut anim)
}

impl<T: TrackValue> M2Codec for Track<T> {
    type Patch = TrackPatch<T>;

    fn read_header<R: Read + Seek>(reader: &mut R, ctx: &mut M2Context<'_>) -> Result<Self> {
        let interpolation = InterpolationType::from_raw(reader.read_u16_le()?);
        let global_sequence = match reader.read_u16_le()? {
            NO_GLOBAL_SEQUENCE => None,
            index => Some(index),
        };

        let mut track = Self {
            interpolation,
            global_sequence,
            ..Self::default()
        };

        if ctx.version().has_sequence_timelines() {
            track.timestamps = ArrayRef::load_header(reader)?;
            if T::HAS_VALUES {
                track.values = ArrayRef::load_header(reader)?;
            }
        } else {
            let ranges = ArrayRef::load_header(reader)?;
            let timestamps = ArrayRef::load_header(reader)?;
            let values = if T::HAS_VALUES {
                ArrayRef::load_header(reader)?
            } else {
                ArrayRef::new()
            };
            track.ranged = Some(Box::new(RangedTimeline {
                ranges,
                timestamps,
                values,
            }));
        }
        Ok(track)
    }

    fn load_content<R: Read + Seek>(&mut self, reader: &mut R, ctx: &mut M2Context<'_>) -> Result<()> {
        let sequences = ctx.sequences();

        if let Some(ranged) = self.ranged.take() {
            let mut ranged = *ranged;
            ranged.ranges.load_content(reader, ctx)?;
            ranged.timestamps.load_content(reader, ctx)?;
            ranged.values.load_content(reader, ctx)?;
            return self.split_ranged(ranged, sequences);
        }

        let version = ctx.version();
        let keys: Vec<Option<AnimFileKey>> = (0..self.timestamps.declared_count() as usize)
            .map(|slot| self.external_key(slot, sequences, version))
            .collect();

        self.timestamps
            .load_content_with(reader, ctx, |slot, array, reader, ctx| {
                load_slot(array, keys.get(slot).copied().flatten(), reader, ctx)
            })?;
        if T::HAS_VALUES {
            self.values
                .load_content_with(reader, ctx, |slot, array, reader, ctx| {
                    load_slot(array, keys.get(slot).copied().flatten(), reader, ctx)
                })?;
        }
        Ok(())
    }

    fn write_header<W: Write + Seek>(
        &self,
        writer: &mut W,
        ctx: &mut M2Context<'_>,
    ) -> Result<TrackPatch<T>> {
        let sequences = ctx.sequences();
        self.check_slots(sequences)?;

        writer.write_u16_le(self.interpolation.to_raw())?;
        writer.write_u16_le(self.global_sequence.unwrap_or(NO_GLOBAL_SEQUENCE))?;

        if ctx.version().has_sequence_timelines() {
            let timestamps = self.timestamps.save_header(writer)?;
            let values = if T::HAS_VALUES {
                Some(self.values.save_header(writer)?)
            } else {
                None
            };
            return Ok(TrackPatch(PatchKind::Timelines { timestamps, values }));
        }

        let timeline = self.merge_ranged(sequences);
        let ranges = timeline.ranges.save_header(writer)?;
        let timestamps = timeline.timestamps.save_header(writer)?;
        let values = if T::HAS_VALUES {
            Some(timeline.values.save_header(writer)?)
        } else {
            None
        };
        Ok(TrackPatch(PatchKind::Ranged {
            timeline: Box::new(timeline),
            ranges,
            timestamps,
            values,
        }))
    }

    fn save_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        patch: TrackPatch<T>,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        match patch.0 {
            PatchKind::Ranged {
                timeline,
                ranges,
                timestamps,
                values,
            } => {
                timeline.ranges.save_content(writer, ranges, ctx)?;
                timeline.timestamps.save_content(writer, timestamps, ctx)?;
                if let Some(values) = values {
                    timeline.values.save_content(writer, values, ctx)?;
                }
                Ok(())
            }
            PatchKind::Timelines { timestamps, values } => {
                let sequences = ctx.sequences();
                let version = ctx.version();
                let keys: Vec<Option<AnimFileKey>> = (0..self.timestamps.len())
                    .map(|slot| self.external_key(slot, sequences, version))
                    .collect();

                self.timestamps.save_content_with(
                    writer,
                    timestamps,
                    ctx,
                    |slot, array, token, writer, ctx| {
                        save_slot(array, keys[slot], token, writer, ctx)
                    },
                )?;
                if let Some(values) = values {
                    self.values.save_content_with(
                        writer,
                        values,
                        ctx,
                        |slot, array, token, writer, ctx| {
                            save_slot(array, keys.get(slot).copied().flatten(), token, writer, ctx)
                        },
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl<T: TrackValue> SequenceAware for Track<T> {
    fn set_sequences(&mut self, sequences: &SequenceRegistry) {
        if self.global_sequence.is_some() {
            return;
        }
        self.grow_to(sequences.len());

        for (index, sequence) in sequences.iter().enumerate() {
            if !sequence.is_alias() || self.timestamps[index].is_empty() {
                continue;
            }
            log::warn!("alias sequence {index} carries its own timeline, dropping it");
            self.timestamps[index].clear();
            if T::HAS_VALUES {
                self.values[index].clear();
            }
        }
    }
}

impl Track<NoValue> {
    /// Replace the timestamps of `slot`, adding empty slots up to it
    pub fn set_timestamps(&mut self, slot: usize, timestamps: Vec<u32>) {
        self.set_slot(slot, timestamps, Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_resolver::MemoryFiles;
    use crate::sequence::{M2Sequence, M2SequenceFlags};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn registry() -> SequenceRegistry {
        let mut registry: SequenceRegistry = vec![
            M2Sequence::new(0, 0, 1000),
            M2Sequence::new(4, 0, 500),
            M2Sequence {
                flags: M2SequenceFlags::IS_ALIAS,
                alias_next: 0,
                ..M2Sequence::new(5, 0, 0)
            },
        ]
        .into();
        registry.assign_time_starts();
        registry
    }

    fn sample_track(sequences: &SequenceRegistry) -> Track<f32> {
        let mut track = Track::new(InterpolationType::Linear);
        track.set_timeline(0, vec![0, 500], vec![1.0, 2.0]).unwrap();
        track.set_timeline(1, vec![0], vec![3.0]).unwrap();
        track.set_sequences(sequences);
        track
    }

    fn save<T: TrackValue>(track: &Track<T>, ctx: &mut M2Context<'_>) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let patch = track.write_header(&mut cursor, ctx).unwrap();
        track.save_content(&mut cursor, patch, ctx).unwrap();
        cursor.into_inner()
    }

    fn load<T: TrackValue>(bytes: &[u8], ctx: &mut M2Context<'_>) -> Track<T> {
        let mut cursor = Cursor::new(bytes);
        let mut track = Track::read_header(&mut cursor, ctx).unwrap();
        track.load_content(&mut cursor, ctx).unwrap();
        track
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_per_sequence_roundtrip() {
        let sequences = registry();
        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);
        let track = sample_track(&sequences);

        let bytes = save(&track, &mut ctx);
        // header, then one inner descriptor per sequence
        assert_eq!(u32_at(&bytes, 4), 3);
        assert_eq!(u32_at(&bytes, 8), 20);

        let reloaded: Track<f32> = load(&bytes, &mut ctx);
        assert_eq!(reloaded, track);
    }

    #[test]
    fn test_alias_resolves_to_owner() {
        let sequences = registry();
        let track = sample_track(&sequences);

        assert!(track.slot(2).unwrap().is_empty());
        let timeline = track.timeline(2, &sequences).unwrap();
        assert_eq!(timeline.timestamps, &[0, 500]);
        assert_eq!(timeline.values, &[1.0, 2.0]);

        assert!(matches!(
            track.timeline(3, &sequences),
            Err(M2Error::SequenceOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_ranged_timeline_layout() {
        let sequences = registry();
        let mut ctx = M2Context::new(M2Version::BURNING_CRUSADE, &sequences);
        let track = sample_track(&sequences);

        let bytes = save(&track, &mut ctx);
        // interpolation, global sequence, then ranges, timestamps and values descriptors
        assert_eq!(u32_at(&bytes, 4), 3); // one range per sequence
        assert_eq!(u32_at(&bytes, 8), 28);
        assert_eq!(u32_at(&bytes, 12), 3);
        assert_eq!(u32_at(&bytes, 16), 28 + 3 * 8);

        let timestamps: Vec<u32> = (0..3).map(|i| u32_at(&bytes, 52 + i * 4)).collect();
        assert_eq!(timestamps, vec![3333, 3833, 7666]);
        assert_eq!((u32_at(&bytes, 28), u32_at(&bytes, 32)), (0, 1));
        assert_eq!((u32_at(&bytes, 36), u32_at(&bytes, 40)), (2, 2));

        let reloaded: Track<f32> = load(&bytes, &mut ctx);
        assert_eq!(reloaded, track);
    }

    #[test]
    fn test_global_sequence_track() {
        let sequences = registry();
        let mut track: Track<C3Vector> = Track::global(InterpolationType::Linear, 0);
        track
            .set_timeline(0, vec![0, 100], vec![C3Vector::ZERO, C3Vector::ONE])
            .unwrap();
        track.set_sequences(&sequences);
        assert_eq!(track.slot_count(), 1);

        for version in [M2Version::CLASSIC, M2Version::LICH_KING] {
            let mut ctx = M2Context::new(version, &sequences);
            let bytes = save(&track, &mut ctx);
            assert_eq!(&bytes[2..4], &[0, 0]);
            let reloaded: Track<C3Vector> = load(&bytes, &mut ctx);
            assert_eq!(reloaded, track);
            assert_eq!(reloaded.timeline(1, &sequences).unwrap().timestamps, &[0, 100]);
        }
    }

    #[test]
    fn test_external_timelines() {
        let mut sequences = registry();
        sequences.iter_mut().nth(1).unwrap().flags = M2SequenceFlags::empty();
        let track = sample_track(&sequences);
        let key = sequences.get(1).unwrap().anim_file_key(1);

        let mut files = MemoryFiles::new();
        let bytes = {
            let mut ctx =
                M2Context::new(M2Version::LICH_KING, &sequences).with_files(Some(&mut files));
            save(&track, &mut ctx)
        };
        // timestamp then value of the single keyframe
        assert_eq!(files.anim(&key).unwrap().len(), 8);

        let reloaded: Track<f32> = {
            let mut ctx =
                M2Context::new(M2Version::LICH_KING, &sequences).with_files(Some(&mut files));
            load(&bytes, &mut ctx)
        };
        assert_eq!(reloaded, track);

        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);
        let without_files: Track<f32> = load(&bytes, &mut ctx);
        assert!(without_files.slot(1).unwrap().is_empty());
        assert_eq!(without_files.slot(0), track.slot(0));
    }

    #[test]
    fn test_external_timeline_without_files_saves_empty() {
        let mut sequences = registry();
        sequences.iter_mut().nth(1).unwrap().flags = M2SequenceFlags::empty();
        let track = sample_track(&sequences);

        let bytes = {
            let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);
            save(&track, &mut ctx)
        };
        // inner timestamp and value descriptors of slot 1
        let timestamps_at = u32_at(&bytes, 8) as usize + 8;
        let values_at = u32_at(&bytes, 16) as usize + 8;
        assert_eq!((u32_at(&bytes, timestamps_at), u32_at(&bytes, timestamps_at + 4)), (0, 0));
        assert_eq!((u32_at(&bytes, values_at), u32_at(&bytes, values_at + 4)), (0, 0));
        assert_eq!(u32_at(&bytes, timestamps_at - 8), 2);

        let mut files = MemoryFiles::new();
        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences).with_files(Some(&mut files));
        let reloaded: Track<f32> = load(&bytes, &mut ctx);
        assert!(reloaded.slot(1).unwrap().is_empty());
        assert_eq!(reloaded.slot(0), track.slot(0));
    }

    #[test]
    fn test_slot_count_mismatch_is_schema_error() {
        let sequences = registry();
        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);
        let mut track: Track<f32> = Track::new(InterpolationType::Linear);
        track.set_timeline(0, vec![0], vec![1.0]).unwrap();

        let mut cursor = Cursor::new(Vec::new());
        assert!(matches!(
            track.write_header(&mut cursor, &mut ctx),
            Err(M2Error::Schema(_))
        ));
    }

    #[test]
    fn test_set_sequences_is_idempotent() {
        let sequences = registry();
        let mut track: Track<f32> = Track::new(InterpolationType::Linear);
        track.set_timeline(2, vec![0], vec![1.0]).unwrap();

        track.set_sequences(&sequences);
        let once = track.clone();
        track.set_sequences(&sequences);

        assert_eq!(track, once);
        assert_eq!(track.slot_count(), 3);
        assert!(track.slot(2).unwrap().is_empty());
    }

    #[test]
    fn test_event_track_has_no_values() {
        let sequences = registry();
        let mut track = EventTrack::default();
        track.set_timestamps(0, vec![250]);
        track.set_sequences(&sequences);

        let mut ctx = M2Context::new(M2Version::LICH_KING, &sequences);
        let bytes = save(&track, &mut ctx);
        assert_eq!(u32_at(&bytes, 8), 12);

        let reloaded: EventTrack = load(&bytes, &mut ctx);
        assert_eq!(reloaded.timeline(0, &sequences).unwrap().timestamps, &[250]);
    }
}
