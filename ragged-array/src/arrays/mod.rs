//! The node types of a content tree.

pub use bit_masked::*;
pub use byte_masked::*;
pub use indexed::*;
pub use indexed_option::*;
pub use list::*;
pub use list_offset::*;
pub use numpy::*;
pub use record::*;
pub use regular::*;
pub use typetracer::*;
pub use union::*;
pub use unmasked::*;

mod bit_masked;
mod byte_masked;
mod indexed;
mod indexed_option;
mod list;
mod list_offset;
mod numpy;
mod record;
mod regular;
mod typetracer;
mod union;
mod unmasked;

use crate::Index;

/// The content positions of the valid entries of an option index.
pub(crate) fn valid_carry(option_index: &[i64]) -> Index {
    Index::from(
        option_index
            .iter()
            .copied()
            .filter(|i| *i >= 0)
            .collect::<Vec<_>>(),
    )
}

/// For each entry of an option index, `-1` where it is missing and otherwise its position
/// among the valid entries.
pub(crate) fn compact_option_index(option_index: &[i64]) -> Index {
    let mut next = 0i64;
    Index::from(
        option_index
            .iter()
            .map(|i| {
                if *i < 0 {
                    -1
                } else {
                    next += 1;
                    next - 1
                }
            })
            .collect::<Vec<_>>(),
    )
}
