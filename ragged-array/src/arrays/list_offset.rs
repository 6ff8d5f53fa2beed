use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use ragged_form::{Form, FormInfo, ListOffsetForm, Parameters};

use crate::{Content, ContentRef, Index, Item, ListArray};

/// Variable-length lists delimited by one offsets buffer: list `i` is
/// `content[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone)]
pub struct ListOffsetArray {
    offsets: Index,
    content: ContentRef,
    parameters: Parameters,
}

impl ListOffsetArray {
    pub fn try_new(offsets: Index, content: ContentRef, parameters: Parameters) -> RaggedResult<Self> {
        if !offsets.index_type().is_list_index() {
            ragged_bail!(
                ConstructionContract: "ListOffsetArray offsets must be one of \"i32\", \"u32\", \"i64\", not {:?}",
                offsets.index_type().name()
            );
        }
        if offsets.is_empty() {
            ragged_bail!(ConstructionContract: "ListOffsetArray offsets must have at least one entry");
        }
        if offsets.iter().tuple_windows().any(|(a, b)| b < a) {
            ragged_bail!(ConstructionContract: "ListOffsetArray offsets must be non-decreasing, got {}", offsets);
        }
        if offsets.len() > 1 {
            let (first, last) = (offsets.get(0), offsets.get(offsets.len() - 1));
            if first < 0 || last > content.len() as i64 {
                ragged_bail!(
                    ConstructionContract: "ListOffsetArray offsets span {}..{} but its content has length {}",
                    first,
                    last,
                    content.len()
                );
            }
        }
        Ok(Self::new_unchecked(offsets, content, parameters))
    }

    pub(crate) fn new_unchecked(offsets: Index, content: ContentRef, parameters: Parameters) -> Self {
        Self {
            offsets,
            content,
            parameters,
        }
    }

    pub fn offsets(&self) -> &Index {
        &self.offsets
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn starts(&self) -> Index {
        self.offsets.slice(0, self.len())
    }

    pub fn stops(&self) -> Index {
        self.offsets.slice(1, self.len() + 1)
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn with_parameters(&self, parameters: Parameters) -> Self {
        Self {
            parameters,
            ..self.clone()
        }
    }

    pub fn form(&self) -> Form {
        Form::ListOffset(
            ListOffsetForm::try_new(
                self.offsets.index_type(),
                Arc::new(self.content.form()),
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("offsets type checked on construction"),
        )
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        let (start, stop) = (self.offsets.get(i) as usize, self.offsets.get(i + 1) as usize);
        Ok(Item::from_list(
            &self.parameters,
            self.content.getitem_range_nowrap(start, stop),
        ))
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            offsets: self.offsets.slice(start, stop + 1),
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index) -> RaggedResult<ListArray> {
        Ok(ListArray::new_unchecked(
            self.starts().take(carry)?,
            self.stops().take(carry)?,
            self.content.clone(),
            self.parameters.clone(),
        ))
    }

    /// Offsets starting at zero and the part of the content they cover.
    pub fn compact(&self) -> RaggedResult<(Index, Content)> {
        if self.is_empty() {
            return Ok((
                Index::from(vec![0i64]),
                self.content.getitem_range_nowrap(0, 0),
            ));
        }
        let (start, stop) = (self.offsets.get(0), self.offsets.get(self.len()));
        if start < 0 || stop > self.content.len() as i64 {
            ragged_bail!(
                IndexRange: "offsets span {}..{} but the list content has length {}",
                start,
                stop,
                self.content.len()
            );
        }
        let offsets = Index::from(self.offsets.iter().map(|o| o - start).collect_vec());
        Ok((
            offsets,
            self.content
                .getitem_range_nowrap(start as usize, stop as usize),
        ))
    }

    /// This list with 64-bit offsets starting at zero over exactly the content it uses.
    pub fn to_list_offset64(&self) -> RaggedResult<ListOffsetArray> {
        let (offsets, content) = self.compact()?;
        Ok(Self::new_unchecked(
            offsets,
            Arc::new(content),
            self.parameters.clone(),
        ))
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;
    use crate::NumpyArray;

    fn floats() -> ContentRef {
        Arc::new(Content::Numpy(NumpyArray::from(vec![
            0.0f64, 1.1, 2.2, 3.3, 4.4, 5.5, 6.6,
        ])))
    }

    #[test]
    fn construction_checks() {
        let err = ListOffsetArray::try_new(Index::from(vec![0i64, 3, 2]), floats(), Parameters::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstructionContract);
        let err = ListOffsetArray::try_new(Index::from(vec![0i64, 8]), floats(), Parameters::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstructionContract);
        let err = ListOffsetArray::try_new(Index::from(vec![0i8, 1]), floats(), Parameters::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstructionContract);
    }

    #[test]
    fn compaction_rebases_offsets() {
        let list =
            ListOffsetArray::try_new(Index::from(vec![2i32, 4, 4, 7]), floats(), Parameters::new())
                .unwrap();
        let compact = list.to_list_offset64().unwrap();
        assert_eq!(compact.offsets(), &Index::from(vec![0i64, 2, 2, 5]));
        assert_eq!(compact.content().len(), 5);
        assert_eq!(list.starts().to_vec(), vec![2, 4, 4]);
        assert_eq!(list.stops().to_vec(), vec![4, 4, 7]);
    }
}
