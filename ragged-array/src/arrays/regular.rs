use std::sync::Arc;

use ragged_error::{RaggedResult, ragged_bail};
use ragged_form::{Form, FormInfo, Parameters, RegularForm};

use crate::{ContentRef, Index, Item, ListOffsetArray};

/// Lists of one fixed `size`; list `i` is `content[i * size..(i + 1) * size]`.
///
/// With `size == 0` the content says nothing about the length, which is then given explicitly.
#[derive(Debug, Clone)]
pub struct RegularArray {
    content: ContentRef,
    size: usize,
    length: usize,
    parameters: Parameters,
}

impl RegularArray {
    pub fn try_new(
        content: ContentRef,
        size: usize,
        zeros_length: usize,
        parameters: Parameters,
    ) -> RaggedResult<Self> {
        let array = Self::new_unchecked(content, size, zeros_length, parameters);
        if array.length * size > array.content.len() {
            ragged_bail!(
                ConstructionContract: "RegularArray of {} lists of size {} needs at least {} content elements, got {}",
                array.length,
                size,
                array.length * size,
                array.content.len()
            );
        }
        Ok(array)
    }

    pub(crate) fn new_unchecked(
        content: ContentRef,
        size: usize,
        zeros_length: usize,
        parameters: Parameters,
    ) -> Self {
        let length = if size == 0 {
            zeros_length
        } else {
            content.len() / size
        };
        Self {
            content,
            size,
            length,
            parameters,
        }
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
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
        Form::Regular(RegularForm::new(
            self.size,
            Arc::new(self.content.form()),
            FormInfo::with_parameters(self.parameters.clone()),
        ))
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> Item {
        Item::from_list(
            &self.parameters,
            self.content
                .getitem_range_nowrap(i * self.size, (i + 1) * self.size),
        )
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            content: Arc::new(
                self.content
                    .getitem_range_nowrap(start * self.size, stop * self.size),
            ),
            length: stop - start,
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index, allow_lazy: bool) -> RaggedResult<Self> {
        let size = self.size as i64;
        let nextcarry: Vec<i64> = carry
            .iter()
            .flat_map(|row| (row * size)..((row + 1) * size))
            .collect();
        Ok(Self {
            content: Arc::new(self.content.carry(&Index::from(nextcarry), allow_lazy)?),
            length: carry.len(),
            ..self.clone()
        })
    }

    pub fn to_list_offset64(&self) -> ListOffsetArray {
        let offsets: Vec<i64> = (0..=self.length).map(|i| (i * self.size) as i64).collect();
        ListOffsetArray::new_unchecked(
            Index::from(offsets),
            Arc::new(
                self.content
                    .getitem_range_nowrap(0, self.length * self.size),
            ),
            self.parameters.clone(),
        )
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;
    use crate::{Content, NumpyArray};

    #[rstest]
    #[case(7, 3, 0, 2)]
    #[case(6, 3, 0, 2)]
    #[case(0, 0, 5, 5)]
    #[case(4, 0, 3, 3)]
    fn length_from_size(
        #[case] content_len: i64,
        #[case] size: usize,
        #[case] zeros_length: usize,
        #[case] expected: usize,
    ) {
        let content = Arc::new(Content::Numpy(NumpyArray::from(
            (0..content_len).collect::<Vec<_>>(),
        )));
        let array = RegularArray::try_new(content, size, zeros_length, Parameters::new()).unwrap();
        assert_eq!(array.len(), expected);
    }

    #[test]
    fn carry_expands_rows() {
        let content = Arc::new(Content::Numpy(NumpyArray::from((0..6i64).collect::<Vec<_>>())));
        let array = RegularArray::try_new(content, 2, 0, Parameters::new()).unwrap();
        let carried = array
            .carry_unchecked(&Index::from(vec![2i64, 0]), false)
            .unwrap();
        assert_eq!(carried.len(), 2);
        let Content::Numpy(values) = carried.content().as_ref() else {
            panic!("expected a leaf");
        };
        assert_eq!(values.data(), &crate::NumpyData::from(vec![4i64, 5, 0, 1]));
        assert_eq!(
            array.to_list_offset64().offsets(),
            &Index::from(vec![0i64, 2, 4, 6])
        );
    }
}
