//! Debug formatting helpers for large element arrays

use std::{cmp, fmt};

use crate::array_ref::ArrayRef;

const FIRST_N_ELEMENTS: usize = 3;

pub trait TrimmedList {
    type Item: fmt::Debug;

    fn element_count(&self) -> usize;
    fn first_n(&self, elements: usize) -> &[Self::Item];
}

impl<T: fmt::Debug> TrimmedList for Vec<T> {
    type Item = T;

    fn element_count(&self) -> usize {
        self.len()
    }

    fn first_n(&self, elements: usize) -> &[T] {
        &self[..cmp::min(elements, self.len())]
    }
}

impl<T: fmt::Debug> TrimmedList for ArrayRef<T> {
    type Item = T;

    fn element_count(&self) -> usize {
        self.len()
    }

    fn first_n(&self, elements: usize) -> &[T] {
        &self[..cmp::min(elements, self.len())]
    }
}

/// Print the first few elements followed by the number left out
#[cfg(feature = "trimmed-debug-output")]
pub fn trimmed_collection_fmt<T: TrimmedList>(n: &T, f: &mut fmt::Formatter) -> fmt::Result {
    let first = n.first_n(FIRST_N_ELEMENTS);
    let remaining = n.element_count().saturating_sub(first.len());

    if remaining == 0 {
        write!(f, "{:#?}", first)
    } else {
        write!(f, "{:#?} + {} elements", first, remaining)
    }
}

#[cfg(not(feature = "trimmed-debug-output"))]
pub fn trimmed_collection_fmt<T: TrimmedList>(n: &T, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:#?}", n.first_n(n.element_count()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wrapper(ArrayRef<u16>);

    impl fmt::Debug for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            trimmed_collection_fmt(&self.0, f)
        }
    }

    #[test]
    fn test_short_lists_print_fully() {
        let printed = format!("{:?}", Wrapper(vec![1u16, 2].into()));
        assert!(printed.contains('1') && printed.contains('2'));
        assert!(!printed.contains("elements"));
    }

    #[cfg(feature = "trimmed-debug-output")]
    #[test]
    fn test_long_lists_are_trimmed() {
        let printed = format!("{:?}", Wrapper((0u16..10).collect()));
        assert!(printed.ends_with("+ 7 elements"));
    }
}
