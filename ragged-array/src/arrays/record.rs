use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedExpect, RaggedResult, ragged_bail, ragged_err};
use ragged_form::{Form, FormInfo, Parameters, RecordForm};

use crate::{Content, ContentRef, Index, IndexedArray, Item};

/// Fields of equal length side by side, named or positional.
///
/// Contents may be longer than the record; everything past `length` is ignored.
#[derive(Debug, Clone)]
pub struct RecordArray {
    contents: Vec<ContentRef>,
    fields: Option<Vec<String>>,
    length: usize,
    parameters: Parameters,
}

impl RecordArray {
    /// A record of `contents`; without an explicit `length` it is the shortest content.
    pub fn try_new(
        contents: Vec<ContentRef>,
        fields: Option<Vec<String>>,
        length: Option<usize>,
        parameters: Parameters,
    ) -> RaggedResult<Self> {
        if let Some(fields) = &fields {
            if fields.len() != contents.len() {
                ragged_bail!(
                    ConstructionContract: "RecordArray has {} fields but {} contents",
                    fields.len(),
                    contents.len()
                );
            }
            if !fields.iter().all_unique() {
                ragged_bail!(ConstructionContract: "RecordArray field names must be unique, got {:?}", fields);
            }
        }
        let shortest = contents.iter().map(|c| c.len()).min();
        let length = match (length, shortest) {
            (Some(length), Some(shortest)) if length > shortest => {
                ragged_bail!(
                    ConstructionContract: "RecordArray of length {} has a content of length {}",
                    length,
                    shortest
                );
            }
            (Some(length), _) => length,
            (None, shortest) => shortest.unwrap_or(0),
        };
        Ok(Self::new_unchecked(contents, fields, length, parameters))
    }

    /// A record with named fields and the length of its shortest content.
    pub fn from_fields<S: Into<String>>(
        fields: impl IntoIterator<Item = (S, ContentRef)>,
    ) -> RaggedResult<Self> {
        let (names, contents): (Vec<String>, Vec<ContentRef>) = fields
            .into_iter()
            .map(|(name, content)| (name.into(), content))
            .unzip();
        Self::try_new(contents, Some(names), None, Parameters::new())
    }

    pub(crate) fn new_unchecked(
        contents: Vec<ContentRef>,
        fields: Option<Vec<String>>,
        length: usize,
        parameters: Parameters,
    ) -> Self {
        Self {
            contents,
            fields,
            length,
            parameters,
        }
    }

    pub fn contents(&self) -> &[ContentRef] {
        &self.contents
    }

    /// The explicit field names, `None` for a tuple.
    pub fn field_names(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn is_tuple(&self) -> bool {
        self.fields.is_none()
    }

    /// Field names, with tuple slots named by their position.
    pub fn fields(&self) -> Vec<String> {
        match &self.fields {
            Some(fields) => fields.clone(),
            None => (0..self.contents.len()).map(|i| i.to_string()).collect(),
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        match &self.fields {
            Some(fields) => fields.iter().position(|f| f == name),
            None => name
                .parse::<usize>()
                .ok()
                .filter(|i| *i < self.contents.len()),
        }
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
        Form::Record(
            RecordForm::try_new(
                self.contents.iter().map(|c| Arc::new(c.form())).collect(),
                self.fields.clone(),
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("field names checked on construction"),
        )
    }

    /// Field `i` cut to the length of the record.
    pub fn trimmed(&self, i: usize) -> Content {
        self.contents[i].getitem_range_nowrap(0, self.length)
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        Ok(Item::Record {
            fields: self.fields.clone(),
            values: self
                .contents
                .iter()
                .map(|c| c.getitem_at_nowrap(i))
                .try_collect()?,
        })
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            contents: self
                .contents
                .iter()
                .map(|c| Arc::new(c.getitem_range_nowrap(start, stop)))
                .collect(),
            length: stop - start,
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index, allow_lazy: bool) -> RaggedResult<Content> {
        if allow_lazy {
            return Ok(Content::Indexed(IndexedArray::new_unchecked(
                carry.to_i64(),
                Arc::new(Content::Record(self.clone())),
                Parameters::new(),
            )));
        }
        Ok(Content::Record(Self {
            contents: self
                .contents
                .iter()
                .map(|c| c.carry(carry, false).map(Arc::new))
                .try_collect()?,
            length: carry.len(),
            ..self.clone()
        }))
    }

    pub fn getitem_field(&self, name: &str) -> RaggedResult<Content> {
        let index = self.field_index(name).ok_or_else(|| {
            ragged_err!(IndexRange: "no field {:?} in record with fields {:?}", name, self.fields())
        })?;
        Ok(self.trimmed(index))
    }

    /// The named fields in the requested order, keeping the record's length and parameters.
    pub fn getitem_fields<S: AsRef<str>>(&self, names: &[S]) -> RaggedResult<Self> {
        let contents = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.field_index(name)
                    .map(|i| self.contents[i].clone())
                    .ok_or_else(|| {
                        ragged_err!(IndexRange: "no field {:?} in record with fields {:?}", name, self.fields())
                    })
            })
            .try_collect()?;
        let fields = self
            .fields
            .as_ref()
            .map(|_| names.iter().map(|n| n.as_ref().to_string()).collect());
        Ok(Self {
            contents,
            fields,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;
    use crate::NumpyArray;

    fn record() -> RecordArray {
        RecordArray::from_fields([
            ("x", Arc::new(Content::Numpy(NumpyArray::from(vec![1i64, 2, 3, 4])))),
            ("y", Arc::new(Content::Numpy(NumpyArray::from(vec![1.5f64, 2.5, 3.5])))),
        ])
        .unwrap()
    }

    #[test]
    fn length_is_the_shortest_field() {
        let record = record();
        assert_eq!(record.len(), 3);
        assert_eq!(record.getitem_field("x").unwrap().len(), 3);
        assert_eq!(
            record.getitem_field("z").unwrap_err().kind(),
            ErrorKind::IndexRange
        );
    }

    #[test]
    fn field_subsets_follow_the_request() {
        let subset = record().getitem_fields(&["y", "x"]).unwrap();
        assert_eq!(subset.fields(), vec!["y".to_string(), "x".to_string()]);
        assert_eq!(subset.len(), 3);
    }

    #[test]
    fn lazy_carry_wraps_in_an_index() {
        let carried = record()
            .carry_unchecked(&Index::from(vec![2i32, 0]), true)
            .unwrap();
        assert!(matches!(carried, Content::Indexed(_)));
        assert_eq!(carried.len(), 2);
        let eager = record()
            .carry_unchecked(&Index::from(vec![2i32, 0]), false)
            .unwrap();
        assert!(matches!(eager, Content::Record(_)));
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let content = Arc::new(Content::Numpy(NumpyArray::from(vec![1i64])));
        let err = RecordArray::try_new(
            vec![content.clone(), content],
            Some(vec!["a".to_string(), "a".to_string()]),
            None,
            Parameters::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstructionContract);
    }
}
