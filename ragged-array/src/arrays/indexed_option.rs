use std::sync::Arc;

use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use ragged_form::{Form, FormInfo, IndexedOptionForm, Parameters};

use crate::arrays::valid_carry;
use crate::{Content, ContentRef, Index, Item};

/// A gather where a negative index marks a missing value.
#[derive(Debug, Clone)]
pub struct IndexedOptionArray {
    index: Index,
    content: ContentRef,
    parameters: Parameters,
}

impl IndexedOptionArray {
    pub fn try_new(index: Index, content: ContentRef, parameters: Parameters) -> RaggedResult<Self> {
        if !index.index_type().is_option_index() {
            ragged_bail!(
                ConstructionContract: "IndexedOptionArray index must be one of \"i32\", \"i64\", not {:?}",
                index.index_type().name()
            );
        }
        let len = content.len() as i64;
        if let Some(bad) = index.iter().find(|i| *i >= len) {
            ragged_bail!(
                ConstructionContract: "IndexedOptionArray index {} is out of range for a content of length {}",
                bad,
                len
            );
        }
        Ok(Self::new_unchecked(index, content, parameters))
    }

    pub(crate) fn new_unchecked(index: Index, content: ContentRef, parameters: Parameters) -> Self {
        Self {
            index,
            content,
            parameters,
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
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
        Form::IndexedOption(
            IndexedOptionForm::try_new(
                self.index.index_type(),
                Arc::new(self.content.form()),
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("index type checked on construction"),
        )
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        match self.index.get(i) {
            missing if missing < 0 => Ok(Item::Missing),
            valid => self.content.getitem_at_nowrap(valid as usize),
        }
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            index: self.index.slice(start, stop),
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index) -> RaggedResult<Self> {
        Ok(Self {
            index: self.index.take(carry)?,
            ..self.clone()
        })
    }

    /// The content position of each element, `-1` where it is missing.
    pub fn option_index(&self) -> Vec<i64> {
        self.index.iter().map(|i| i.max(-1)).collect()
    }

    pub fn project(&self) -> RaggedResult<Content> {
        self.content
            .carry(&valid_carry(&self.option_index()), false)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{NumpyArray, NumpyData};

    #[test]
    fn missing_values_project_away() {
        let content = Arc::new(Content::Numpy(NumpyArray::from(vec![1.5f64, 2.5, 3.5])));
        let option =
            IndexedOptionArray::try_new(Index::from(vec![2i32, -1, 0, -7]), content, Parameters::new())
                .unwrap();
        assert_eq!(option.option_index(), vec![2, -1, 0, -1]);
        assert!(matches!(option.getitem_at_nowrap(3).unwrap(), Item::Missing));
        let Content::Numpy(projected) = option.project().unwrap() else {
            panic!("expected a leaf");
        };
        assert_eq!(projected.data(), &NumpyData::from(vec![3.5f64, 1.5]));
    }
}
