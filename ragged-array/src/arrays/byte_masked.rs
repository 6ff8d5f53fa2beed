use std::sync::Arc;

use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use ragged_form::{ByteMaskedForm, Form, FormInfo, IndexType, Parameters};

use crate::arrays::valid_carry;
use crate::{Content, ContentRef, Index, Item};

/// Missing values marked by one byte per element: element `i` is valid when
/// `(mask[i] != 0) == valid_when`.
#[derive(Debug, Clone)]
pub struct ByteMaskedArray {
    mask: Index,
    content: ContentRef,
    valid_when: bool,
    parameters: Parameters,
}

impl ByteMaskedArray {
    pub fn try_new(
        mask: Index,
        content: ContentRef,
        valid_when: bool,
        parameters: Parameters,
    ) -> RaggedResult<Self> {
        if mask.index_type() != IndexType::I8 {
            ragged_bail!(
                ConstructionContract: "ByteMaskedArray mask must be \"i8\", not {:?}",
                mask.index_type().name()
            );
        }
        if content.len() < mask.len() {
            ragged_bail!(
                ConstructionContract: "ByteMaskedArray mask of length {} is longer than its content ({})",
                mask.len(),
                content.len()
            );
        }
        Ok(Self::new_unchecked(mask, content, valid_when, parameters))
    }

    pub(crate) fn new_unchecked(
        mask: Index,
        content: ContentRef,
        valid_when: bool,
        parameters: Parameters,
    ) -> Self {
        Self {
            mask,
            content,
            valid_when,
            parameters,
        }
    }

    pub fn mask(&self) -> &Index {
        &self.mask
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
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
        Form::ByteMasked(
            ByteMaskedForm::try_new(
                IndexType::I8,
                Arc::new(self.content.form()),
                self.valid_when,
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("byte masks are i8"),
        )
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        (self.mask.get(i) != 0) == self.valid_when
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        if self.is_valid(i) {
            self.content.getitem_at_nowrap(i)
        } else {
            Ok(Item::Missing)
        }
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            mask: self.mask.slice(start, stop),
            content: Arc::new(self.content.getitem_range_nowrap(start, stop)),
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index, allow_lazy: bool) -> RaggedResult<Self> {
        Ok(Self {
            mask: self.mask.take(carry)?,
            content: Arc::new(self.content.carry(carry, allow_lazy)?),
            ..self.clone()
        })
    }

    pub fn option_index(&self) -> Vec<i64> {
        (0..self.len())
            .map(|i| if self.is_valid(i) { i as i64 } else { -1 })
            .collect()
    }

    pub fn project(&self) -> RaggedResult<Content> {
        self.content
            .carry(&valid_carry(&self.option_index()), false)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;
    use crate::NumpyArray;

    #[rstest]
    #[case(true, vec![0, -1, 2])]
    #[case(false, vec![-1, 1, -1])]
    fn validity_follows_valid_when(#[case] valid_when: bool, #[case] expected: Vec<i64>) {
        let content = Arc::new(Content::Numpy(NumpyArray::from(vec![1i64, 2, 3])));
        let masked = ByteMaskedArray::try_new(
            Index::from(vec![1i8, 0, 1]),
            content,
            valid_when,
            Parameters::new(),
        )
        .unwrap();
        assert_eq!(masked.option_index(), expected);
    }
}
