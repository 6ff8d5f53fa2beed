use std::sync::Arc;

use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use ragged_form::{Form, FormInfo, IndexedForm, Parameters};

use crate::{Content, ContentRef, Index, Item};

/// A lazy gather: element `i` is `content[index[i]]`.
#[derive(Debug, Clone)]
pub struct IndexedArray {
    index: Index,
    content: ContentRef,
    parameters: Parameters,
}

impl IndexedArray {
    pub fn try_new(index: Index, content: ContentRef, parameters: Parameters) -> RaggedResult<Self> {
        if !index.index_type().is_list_index() {
            ragged_bail!(
                ConstructionContract: "IndexedArray index must be one of \"i32\", \"u32\", \"i64\", not {:?}",
                index.index_type().name()
            );
        }
        let len = content.len() as i64;
        if let Some(bad) = index.iter().find(|i| *i < 0 || *i >= len) {
            ragged_bail!(
                ConstructionContract: "IndexedArray index {} is out of range for a content of length {}",
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
        Form::Indexed(
            IndexedForm::try_new(
                self.index.index_type(),
                Arc::new(self.content.form()),
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("index type checked on construction"),
        )
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        self.content.getitem_at_nowrap(self.index.get(i) as usize)
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

    /// The content gathered through the index.
    pub fn project(&self) -> RaggedResult<Content> {
        self.content.carry(&self.index.to_i64(), false)
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;
    use crate::{NumpyArray, NumpyData};

    #[test]
    fn projection_applies_the_index() {
        let content = Arc::new(Content::Numpy(NumpyArray::from(vec![10i32, 20, 30])));
        let indexed =
            IndexedArray::try_new(Index::from(vec![2u32, 2, 0]), content.clone(), Parameters::new())
                .unwrap();
        let Content::Numpy(projected) = indexed.project().unwrap() else {
            panic!("expected a leaf");
        };
        assert_eq!(projected.data(), &NumpyData::from(vec![30i32, 30, 10]));

        let err = IndexedArray::try_new(Index::from(vec![3i64]), content, Parameters::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstructionContract);
    }
}
