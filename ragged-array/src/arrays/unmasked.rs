use std::sync::Arc;

use ragged_error::RaggedResult;
use ragged_form::{Form, FormInfo, Parameters, UnmaskedForm};

use crate::{Content, ContentRef, Index, Item};

/// An option type without any missing values.
#[derive(Debug, Clone)]
pub struct UnmaskedArray {
    content: ContentRef,
    parameters: Parameters,
}

impl UnmaskedArray {
    pub fn new(content: ContentRef, parameters: Parameters) -> Self {
        Self {
            content,
            parameters,
        }
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
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
        Form::Unmasked(UnmaskedForm::new(
            Arc::new(self.content.form()),
            FormInfo::with_parameters(self.parameters.clone()),
        ))
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        self.content.getitem_at_nowrap(i)
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            content: Arc::new(self.content.getitem_range_nowrap(start, stop)),
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index, allow_lazy: bool) -> RaggedResult<Self> {
        Ok(Self {
            content: Arc::new(self.content.carry(carry, allow_lazy)?),
            ..self.clone()
        })
    }

    pub fn option_index(&self) -> Vec<i64> {
        (0..self.len() as i64).collect()
    }

    pub fn project(&self) -> Content {
        self.content.getitem_range_nowrap(0, self.len())
    }
}
