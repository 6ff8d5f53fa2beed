//! Small builders for arrays used throughout the tests.

use std::sync::Arc;

use itertools::Itertools;
use ragged_form::{ArrayHint, Parameters};

use crate::{Content, ContentRef, Index, ListOffsetArray, NumpyArray};

/// A leaf of floats.
pub fn floats(values: &[f64]) -> ContentRef {
    Arc::new(Content::Numpy(NumpyArray::from(values.to_vec())))
}

/// Variable-length lists of floats, one list per inner vector.
pub fn jagged(lists: Vec<Vec<f64>>) -> Content {
    let offsets = std::iter::once(0i64)
        .chain(lists.iter().scan(0i64, |total, list| {
            *total += list.len() as i64;
            Some(*total)
        }))
        .collect_vec();
    let values = lists.into_iter().flatten().collect_vec();
    Content::ListOffset(ListOffsetArray::new_unchecked(
        Index::from(offsets),
        floats(&values),
        Parameters::new(),
    ))
}

/// UTF-8 strings.
pub fn strings(values: &[&str]) -> Content {
    let offsets = std::iter::once(0i64)
        .chain(values.iter().scan(0i64, |total, s| {
            *total += s.len() as i64;
            Some(*total)
        }))
        .collect_vec();
    let bytes = values.iter().flat_map(|s| s.bytes()).collect_vec();
    let chars =
        NumpyArray::from(bytes).with_parameters(Parameters::array(ArrayHint::Char));
    Content::ListOffset(ListOffsetArray::new_unchecked(
        Index::from(offsets),
        Arc::new(Content::Numpy(chars)),
        Parameters::array(ArrayHint::String),
    ))
}
