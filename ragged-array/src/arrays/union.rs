use std::sync::Arc;

use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use ragged_form::{Form, FormInfo, IndexType, Parameters, UnionForm};

use crate::{ContentRef, Index, Item};

/// A tagged union: element `i` is `contents[tags[i]][index[i]]`.
#[derive(Debug, Clone)]
pub struct UnionArray {
    tags: Index,
    index: Index,
    contents: Vec<ContentRef>,
    parameters: Parameters,
}

impl UnionArray {
    pub fn try_new(
        tags: Index,
        index: Index,
        contents: Vec<ContentRef>,
        parameters: Parameters,
    ) -> RaggedResult<Self> {
        if tags.index_type() != IndexType::I8 {
            ragged_bail!(
                ConstructionContract: "UnionArray tags must be \"i8\", not {:?}",
                tags.index_type().name()
            );
        }
        if !index.index_type().is_list_index() {
            ragged_bail!(
                ConstructionContract: "UnionArray index must be one of \"i32\", \"u32\", \"i64\", not {:?}",
                index.index_type().name()
            );
        }
        if contents.len() > i8::MAX as usize {
            ragged_bail!(ConstructionContract: "UnionArray supports at most {} contents", i8::MAX);
        }
        if index.len() < tags.len() {
            ragged_bail!(
                ConstructionContract: "UnionArray index of length {} is shorter than its tags ({})",
                index.len(),
                tags.len()
            );
        }
        for (i, tag) in tags.iter().enumerate() {
            let Some(content) = usize::try_from(tag).ok().and_then(|t| contents.get(t)) else {
                ragged_bail!(
                    ConstructionContract: "UnionArray tag {} at {} does not name one of its {} contents",
                    tag,
                    i,
                    contents.len()
                );
            };
            let position = index.get(i);
            if position < 0 || position >= content.len() as i64 {
                ragged_bail!(
                    ConstructionContract: "UnionArray index {} at {} is out of range for content {} of length {}",
                    position,
                    i,
                    tag,
                    content.len()
                );
            }
        }
        Ok(Self::new_unchecked(tags, index, contents, parameters))
    }

    pub(crate) fn new_unchecked(
        tags: Index,
        index: Index,
        contents: Vec<ContentRef>,
        parameters: Parameters,
    ) -> Self {
        Self {
            tags,
            index,
            contents,
            parameters,
        }
    }

    pub fn tags(&self) -> &Index {
        &self.tags
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn contents(&self) -> &[ContentRef] {
        &self.contents
    }

    /// The branch and the position within it of element `i`.
    #[inline]
    pub fn entry(&self, i: usize) -> (usize, usize) {
        (self.tags.get(i) as usize, self.index.get(i) as usize)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
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
        Form::Union(
            UnionForm::try_new(
                IndexType::I8,
                self.index.index_type(),
                self.contents.iter().map(|c| Arc::new(c.form())).collect(),
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("tags and index checked on construction"),
        )
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        let (tag, position) = self.entry(i);
        self.contents[tag].getitem_at_nowrap(position)
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            tags: self.tags.slice(start, stop),
            index: self.index.slice(start, stop),
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index) -> RaggedResult<Self> {
        Ok(Self {
            tags: self.tags.take(carry)?,
            index: self.index.take(carry)?,
            ..self.clone()
        })
    }

    /// The positions into branch `tag`, in the order its elements appear.
    pub fn branch_index(&self, tag: usize) -> Index {
        Index::from(
            (0..self.len())
                .map(|i| self.entry(i))
                .filter(|(t, _)| *t == tag)
                .map(|(_, position)| position as i64)
                .collect::<Vec<_>>(),
        )
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;
    use crate::{Content, NumpyArray};

    #[test]
    fn tags_must_name_a_branch() {
        let contents = vec![Arc::new(Content::Numpy(NumpyArray::from(vec![1i64, 2])))];
        let err = UnionArray::try_new(
            Index::from(vec![0i8, 1]),
            Index::from(vec![0i64, 0]),
            contents.clone(),
            Parameters::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstructionContract);

        let union = UnionArray::try_new(
            Index::from(vec![0i8, 0]),
            Index::from(vec![1i32, 0]),
            contents,
            Parameters::new(),
        )
        .unwrap();
        assert_eq!(union.branch_index(0), Index::from(vec![1i64, 0]));
    }
}
