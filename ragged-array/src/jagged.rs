//! Slicing by a jagged index: one list of positions per list of the array.

use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use ragged_error::{RaggedResult, ragged_bail, ragged_err};
use ragged_form::shape;

use crate::arrays::compact_option_index;
use crate::{
    Content, Index, IndexedOptionArray, ListOffsetArray, NumpyData, RecordArray, UnionArray,
};

/// A jagged index: for each list of the sliced array, the positions to keep, which may
/// themselves be nested jagged indexes for deeper list levels.
#[derive(Debug, Clone, PartialEq)]
pub struct JaggedIndex {
    offsets: Index,
    content: JaggedContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JaggedContent {
    /// Positions within each list, counting from the end when negative.
    Leaf(Index),
    /// A jagged index for the next list level.
    Nested(Box<JaggedIndex>),
}

impl JaggedContent {
    fn len(&self) -> usize {
        match self {
            JaggedContent::Leaf(index) => index.len(),
            JaggedContent::Nested(inner) => inner.len(),
        }
    }
}

impl JaggedIndex {
    pub fn try_new(offsets: Index, content: JaggedContent) -> RaggedResult<Self> {
        if offsets.is_empty() {
            ragged_bail!(ConstructionContract: "jagged index offsets must have at least one entry");
        }
        if offsets.iter().tuple_windows().any(|(a, b)| b < a) {
            ragged_bail!(ConstructionContract: "jagged index offsets must be non-decreasing, got {}", offsets);
        }
        let (first, last) = (offsets.get(0), offsets.get(offsets.len() - 1));
        if offsets.len() > 1 && (first < 0 || last > content.len() as i64) {
            ragged_bail!(
                ConstructionContract: "jagged index offsets span {}..{} over {} positions",
                first,
                last,
                content.len()
            );
        }
        Ok(Self { offsets, content })
    }

    /// A single-level jagged index from one list of positions per list.
    pub fn from_lists(lists: &[Vec<i64>]) -> RaggedResult<Self> {
        let offsets = offsets_of(lists.iter().map(Vec::len));
        let positions = lists.iter().flatten().copied().collect_vec();
        Self::try_new(offsets, JaggedContent::Leaf(Index::from(positions)))
    }

    /// Reads a jagged index from lists of integers.
    pub fn try_from_content(content: &Content) -> RaggedResult<Self> {
        let (offsets, inner) = match content {
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_) => {
                content.to_list_offset64()?.compact()?
            }
            _ => ragged_bail!(
                StructuralMismatch: "a jagged index must be lists of integers, not {}",
                content.class_name()
            ),
        };
        let content = match &inner {
            Content::Numpy(leaf) if leaf.inner_shape().is_empty() && leaf.ptype().is_int() => {
                let positions = match leaf.data().cast(ragged_form::PType::I64) {
                    NumpyData::I64(values) => values,
                    _ => ragged_bail!("integers cast to i64"),
                };
                JaggedContent::Leaf(Index::from(positions))
            }
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_) => {
                JaggedContent::Nested(Box::new(Self::try_from_content(&inner)?))
            }
            other => ragged_bail!(
                StructuralMismatch: "a jagged index must be lists of integers, found {}",
                other.class_name()
            ),
        };
        Self::try_new(offsets, content)
    }

    pub fn offsets(&self) -> &Index {
        &self.offsets
    }

    pub fn content(&self) -> &JaggedContent {
        &self.content
    }

    /// The number of lists.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of list levels.
    pub fn depth(&self) -> usize {
        match &self.content {
            JaggedContent::Leaf(_) => 1,
            JaggedContent::Nested(inner) => 1 + inner.depth(),
        }
    }

    fn row(&self, i: usize) -> (usize, usize) {
        (self.offsets.get(i) as usize, self.offsets.get(i + 1) as usize)
    }

    fn normalized_offsets(&self) -> Index {
        let first = self.offsets.get(0);
        Index::from(self.offsets.iter().map(|o| o - first).collect_vec())
    }

    /// The rows at `rows`, in that order.
    fn take_rows(&self, rows: &[usize]) -> Self {
        let offsets = offsets_of(rows.iter().map(|r| {
            let (start, stop) = self.row(*r);
            stop - start
        }));
        let positions = rows
            .iter()
            .flat_map(|r| {
                let (start, stop) = self.row(*r);
                start..stop
            })
            .collect_vec();
        let content = match &self.content {
            JaggedContent::Leaf(index) => JaggedContent::Leaf(Index::from(
                positions.iter().map(|p| index.get(*p)).collect_vec(),
            )),
            JaggedContent::Nested(inner) => {
                JaggedContent::Nested(Box::new(inner.take_rows(&positions)))
            }
        };
        Self { offsets, content }
    }
}

fn offsets_of(lengths: impl Iterator<Item = usize>) -> Index {
    let mut total = 0i64;
    Index::from(
        std::iter::once(0i64)
            .chain(lengths.map(|len| {
                total += len as i64;
                total
            }))
            .collect_vec(),
    )
}

impl Content {
    /// Selects, within each list, the positions given by the matching list of `jagged`.
    pub fn getitem_jagged(&self, jagged: &JaggedIndex) -> RaggedResult<Content> {
        debug!(
            "getitem_jagged of depth {} on {} of length {}",
            jagged.depth(),
            self.class_name(),
            self.len()
        );
        if let Content::TypeTracer(t) = self {
            if t.length().is_some_and(|len| len != jagged.len()) {
                ragged_bail!(
                    IndexRange: "cannot fit jagged slice with length {} into array of length {}",
                    jagged.len(),
                    t.len()
                );
            }
            return Ok(Content::TypeTracer(t.with_form(
                shape::getitem_jagged(t.form(), jagged.depth())?,
                Some(jagged.len()),
            )));
        }
        if let Content::Numpy(leaf) = self {
            if leaf.inner_shape().is_empty() {
                ragged_bail!(StructuralMismatch: "too many jagged slice dimensions for array");
            }
            return leaf.to_regular().getitem_jagged(jagged);
        }
        if jagged.len() != self.len() {
            ragged_bail!(
                IndexRange: "cannot fit jagged slice with length {} into array of length {}",
                jagged.len(),
                self.len()
            );
        }
        match self {
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_) => {
                self.to_list_offset64()?.getitem_jagged_lists(jagged)
            }
            Content::Indexed(_) => self.project()?.getitem_jagged(jagged),
            Content::IndexedOption(_)
            | Content::ByteMasked(_)
            | Content::BitMasked(_)
            | Content::Unmasked(_) => {
                let option_index = self.option_index().unwrap_or_default();
                let content = self
                    .option_content()
                    .ok_or_else(|| ragged_err!("{} has no option content", self.class_name()))?;
                let valid_rows = option_index
                    .iter()
                    .positions(|i| *i >= 0)
                    .collect_vec();
                let nextcarry = Index::from(
                    option_index.iter().copied().filter(|i| *i >= 0).collect_vec(),
                );
                let next = content
                    .carry(&nextcarry, false)?
                    .getitem_jagged(&jagged.take_rows(&valid_rows))?;
                Ok(Content::IndexedOption(IndexedOptionArray::new_unchecked(
                    compact_option_index(&option_index),
                    Arc::new(next),
                    self.parameters().clone(),
                )))
            }
            Content::Record(r) => {
                let contents = (0..r.contents().len())
                    .map(|i| r.trimmed(i).getitem_jagged(jagged).map(Arc::new))
                    .try_collect()?;
                Ok(Content::Record(RecordArray::new_unchecked(
                    contents,
                    r.field_names().map(<[String]>::to_vec),
                    jagged.len(),
                    r.parameters().clone(),
                )))
            }
            Content::Union(u) => {
                let mut counters = vec![0i64; u.contents().len()];
                let mut index = Vec::with_capacity(u.len());
                for i in 0..u.len() {
                    let (tag, _) = u.entry(i);
                    index.push(counters[tag]);
                    counters[tag] += 1;
                }
                let contents = u
                    .contents()
                    .iter()
                    .enumerate()
                    .map(|(tag, content)| {
                        let rows = (0..u.len()).filter(|i| u.entry(*i).0 == tag).collect_vec();
                        content
                            .carry(&u.branch_index(tag), false)?
                            .getitem_jagged(&jagged.take_rows(&rows))
                            .map(Arc::new)
                    })
                    .try_collect()?;
                Ok(Content::Union(UnionArray::new_unchecked(
                    u.tags().clone(),
                    Index::from(index),
                    contents,
                    u.parameters().clone(),
                )))
            }
            Content::Numpy(_) | Content::TypeTracer(_) => unreachable!("handled above"),
        }
    }
}

impl ListOffsetArray {
    fn getitem_jagged_lists(&self, jagged: &JaggedIndex) -> RaggedResult<Content> {
        let (offsets, content) = self.compact()?;
        let next = match jagged.content() {
            JaggedContent::Leaf(positions) => {
                let mut nextcarry = Vec::with_capacity(positions.len());
                for i in 0..self.len() {
                    let (start, stop) = (offsets.get(i), offsets.get(i + 1));
                    let count = stop - start;
                    let (jstart, jstop) = jagged.row(i);
                    for k in jstart..jstop {
                        let position = positions.get(k);
                        let wrapped = if position < 0 { position + count } else { position };
                        if wrapped < 0 || wrapped >= count {
                            ragged_bail!(
                                IndexRange: "index {} is out of range for list {} of length {}",
                                position,
                                i,
                                count
                            );
                        }
                        nextcarry.push(start + wrapped);
                    }
                }
                content.carry(&Index::from(nextcarry), false)?
            }
            JaggedContent::Nested(_) => {
                for i in 0..self.len() {
                    let count = offsets.get(i + 1) - offsets.get(i);
                    let (jstart, jstop) = jagged.row(i);
                    if (jstop - jstart) as i64 != count {
                        ragged_bail!(
                            IndexRange: "jagged slice list {} has {} entries but the array's list has {}",
                            i,
                            jstop - jstart,
                            count
                        );
                    }
                }
                let JaggedContent::Nested(inner) = jagged.content() else {
                    unreachable!("matched above");
                };
                let (first, last) = (
                    jagged.offsets().get(0) as usize,
                    jagged.offsets().get(jagged.len()) as usize,
                );
                content.getitem_jagged(&inner.take_rows(&(first..last).collect_vec()))?
            }
        };
        Ok(Content::ListOffset(ListOffsetArray::new_unchecked(
            jagged.normalized_offsets(),
            Arc::new(next),
            self.parameters().clone(),
        )))
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use ragged_form::Parameters;
    use rstest::rstest;

    use super::*;
    use crate::test_harness::jagged as lists;

    #[test]
    fn picks_positions_within_each_list() {
        let array = lists(vec![vec![0.0, 1.1, 2.2], vec![], vec![3.3, 4.4]]);
        let index = JaggedIndex::from_lists(&[vec![2, 0], vec![], vec![-1]]).unwrap();
        let picked = array.getitem_jagged(&index).unwrap();
        assert_eq!(picked.to_string(), "[[2.2, 0], [], [4.4]]");
        assert_eq!(
            picked.form(),
            shape::getitem_jagged(&array.form(), 1).unwrap()
        );
    }

    #[test]
    fn strings_stay_strings() {
        let words = crate::test_harness::strings(&["abc", "de"]);
        let index = JaggedIndex::from_lists(&[vec![0, 2], vec![-1]]).unwrap();
        let picked = words.getitem_jagged(&index).unwrap();
        assert!(picked.is_string_like());
        assert_eq!(picked.to_json().unwrap(), serde_json::json!(["ac", "e"]));
        assert_eq!(picked.form(), shape::getitem_jagged(&words.form(), 1).unwrap());
    }

    #[rstest]
    #[case(vec![vec![3], vec![], vec![]])]
    #[case(vec![vec![-4], vec![], vec![]])]
    #[case(vec![vec![], vec![0], vec![]])]
    fn positions_outside_a_list_fail(#[case] positions: Vec<Vec<i64>>) {
        let array = lists(vec![vec![0.0, 1.1, 2.2], vec![], vec![3.3, 4.4]]);
        let index = JaggedIndex::from_lists(&positions).unwrap();
        assert_eq!(
            array.getitem_jagged(&index).unwrap_err().kind(),
            ErrorKind::IndexRange
        );
    }

    #[test]
    fn length_must_match() {
        let array = lists(vec![vec![0.0], vec![1.0]]);
        let index = JaggedIndex::from_lists(&[vec![0]]).unwrap();
        assert_eq!(
            array.getitem_jagged(&index).unwrap_err().kind(),
            ErrorKind::IndexRange
        );
    }

    #[test]
    fn leaves_cannot_be_sliced() {
        let leaf = crate::test_harness::floats(&[1.0, 2.0]);
        let index = JaggedIndex::from_lists(&[vec![0], vec![]]).unwrap();
        assert_eq!(
            leaf.getitem_jagged(&index).unwrap_err().kind(),
            ErrorKind::StructuralMismatch
        );
    }

    #[test]
    fn nested_index_from_content() {
        let positions = Content::ListOffset(ListOffsetArray::new_unchecked(
            Index::from(vec![0i64, 2, 3]),
            Arc::new(Content::Numpy(crate::NumpyArray::from(vec![1i32, 0, 0]))),
            Parameters::new(),
        ));
        let nested = Content::ListOffset(ListOffsetArray::new_unchecked(
            Index::from(vec![0i64, 2]),
            Arc::new(positions),
            Parameters::new(),
        ));
        let index = JaggedIndex::try_from_content(&nested).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.depth(), 2);

        let inner = lists(vec![vec![1.0, 2.0], vec![3.0]]);
        let array = Content::ListOffset(ListOffsetArray::new_unchecked(
            Index::from(vec![0i64, 2]),
            Arc::new(inner),
            Parameters::new(),
        ));
        let picked = array.getitem_jagged(&index).unwrap();
        assert_eq!(picked.to_string(), "[[[2, 1], [3]]]");
        assert_eq!(picked.form(), shape::getitem_jagged(&array.form(), 2).unwrap());

        let floats = lists(vec![vec![1.0]]);
        assert_eq!(
            JaggedIndex::try_from_content(&floats).unwrap_err().kind(),
            ErrorKind::StructuralMismatch
        );
    }
}
