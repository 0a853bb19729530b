//! Save-time lookup tables mapping a sparse key space onto entity indices.

use crate::array_ref::ArrayRef;
use crate::error::{M2Error, Result};

/// Value of a lookup slot that no entity claimed
pub const UNUSED_SLOT: i16 = -1;

/// Largest key a lookup table is generated for
const MAX_LOOKUP_KEY: i64 = u16::MAX as i64;

/// Shape of a lookup when entities exist but none carries a usable key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimumShape {
    /// No slots at all
    Empty,
    /// A single unused slot
    SingleSentinel,
}

/// Build a dense lookup from entity keys given in declaration order.
///
/// The table is sized to the largest key plus one and filled with
/// [`UNUSED_SLOT`]. Each non-negative key claims its slot for the entity's
/// index unless an earlier entity already did. Without entities the table
/// is empty; when no key is non-negative, `shape` decides.
pub fn build_lookup<I>(keys: I, shape: MinimumShape) -> Result<ArrayRef<i16>>
where
    I: IntoIterator,
    I::Item: Into<i64>,
{
    let keys: Vec<i64> = keys.into_iter().map(Into::into).collect();
    let Some(&max_key) = keys.iter().max() else {
        return Ok(ArrayRef::new());
    };

    if max_key < 0 {
        return Ok(match shape {
            MinimumShape::Empty => ArrayRef::new(),
            MinimumShape::SingleSentinel => vec![UNUSED_SLOT].into(),
        });
    }
    if max_key > MAX_LOOKUP_KEY {
        return Err(M2Error::Schema(format!(
            "lookup key {max_key} exceeds the largest supported key {MAX_LOOKUP_KEY}"
        )));
    }

    let mut table = vec![UNUSED_SLOT; max_key as usize + 1];
    for (index, key) in keys.into_iter().enumerate() {
        if key < 0 {
            continue;
        }
        let slot = &mut table[key as usize];
        if *slot == UNUSED_SLOT {
            *slot = i16::try_from(index).map_err(|_| {
                M2Error::Schema(format!("entity index {index} does not fit a 16-bit lookup"))
            })?;
        }
    }

    Ok(table.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_writer_wins() {
        let lookup = build_lookup([2i32, 0, 2, 2], MinimumShape::Empty).unwrap();
        assert_eq!(*lookup, vec![1, -1, 0]);
    }

    #[test]
    fn test_negative_keys_are_skipped() {
        let lookup = build_lookup([-1i32, 1, -1], MinimumShape::Empty).unwrap();
        assert_eq!(*lookup, vec![-1, 1]);
    }

    #[test]
    fn test_minimum_shapes() {
        let none: [i32; 0] = [];
        assert!(build_lookup(none, MinimumShape::SingleSentinel).unwrap().is_empty());
        assert!(build_lookup([-1i32, -1], MinimumShape::Empty).unwrap().is_empty());
        assert_eq!(
            *build_lookup([-1i32], MinimumShape::SingleSentinel).unwrap(),
            vec![UNUSED_SLOT]
        );
    }

    #[test]
    fn test_unsigned_keys() {
        let lookup = build_lookup([3u32, 3u32], MinimumShape::Empty).unwrap();
        assert_eq!(*lookup, vec![-1, -1, -1, 0]);
    }

    #[test]
    fn test_oversized_key_is_rejected() {
        assert!(matches!(
            build_lookup([70_000u32], MinimumShape::Empty),
            Err(M2Error::Schema(_))
        ));
    }
}
