use ragged_form::{Form, FormRef};

use crate::Backend;

/// A stand-in for an array whose data is unknown: only its form and, possibly, its length.
///
/// Operations on a type tracer return another type tracer with the form the eager operation
/// would have produced.
#[derive(Debug, Clone)]
pub struct TypeTracerArray {
    form: FormRef,
    length: Option<usize>,
}

impl TypeTracerArray {
    pub fn new(form: FormRef, length: Option<usize>) -> Self {
        Self { form, length }
    }

    pub fn form(&self) -> &FormRef {
        &self.form
    }

    pub fn to_form(&self) -> Form {
        self.form.as_ref().clone()
    }

    /// The length, if known.
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    /// The known length, or zero.
    pub fn len(&self) -> usize {
        self.length.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn backend(&self) -> Backend {
        Backend::typetracer(self.length.is_some())
    }

    pub(crate) fn with_form(&self, form: Form, length: Option<usize>) -> Self {
        Self::new(FormRef::new(form), length)
    }
}
