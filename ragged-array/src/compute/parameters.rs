use std::sync::Arc;

use ragged_error::RaggedExpect;
use ragged_form::{Parameters, shape};

use crate::{
    BitMaskedArray, ByteMaskedArray, Content, ContentRef, IndexedArray, IndexedOptionArray,
    ListArray, ListOffsetArray, RecordArray, RegularArray, UnionArray, UnmaskedArray,
};

/// `array` with the parameters of every node removed, so strings become lists of bytes and
/// named records become plain records.
pub fn without_parameters(array: &Content) -> Content {
    array.without_parameters()
}

impl Content {
    pub fn without_parameters(&self) -> Content {
        let strip = |c: &ContentRef| Arc::new(c.without_parameters());
        match self {
            Content::Numpy(n) => Content::Numpy(n.with_parameters(Parameters::new())),
            Content::List(n) => Content::List(ListArray::new_unchecked(
                n.starts().clone(),
                n.stops().clone(),
                strip(n.content()),
                Parameters::new(),
            )),
            Content::ListOffset(n) => Content::ListOffset(ListOffsetArray::new_unchecked(
                n.offsets().clone(),
                strip(n.content()),
                Parameters::new(),
            )),
            Content::Regular(n) => Content::Regular(RegularArray::new_unchecked(
                strip(n.content()),
                n.size(),
                n.len(),
                Parameters::new(),
            )),
            Content::Record(n) => Content::Record(RecordArray::new_unchecked(
                n.contents().iter().map(strip).collect(),
                n.field_names().map(<[String]>::to_vec),
                n.len(),
                Parameters::new(),
            )),
            Content::Indexed(n) => Content::Indexed(IndexedArray::new_unchecked(
                n.index().clone(),
                strip(n.content()),
                Parameters::new(),
            )),
            Content::IndexedOption(n) => Content::IndexedOption(IndexedOptionArray::new_unchecked(
                n.index().clone(),
                strip(n.content()),
                Parameters::new(),
            )),
            Content::ByteMasked(n) => Content::ByteMasked(ByteMaskedArray::new_unchecked(
                n.mask().clone(),
                strip(n.content()),
                n.valid_when(),
                Parameters::new(),
            )),
            Content::BitMasked(n) => Content::BitMasked(
                BitMaskedArray::try_new(
                    n.mask().clone(),
                    strip(n.content()),
                    n.valid_when(),
                    n.len(),
                    n.lsb_order(),
                    Parameters::new(),
                )
                .ragged_expect("mask and content of an existing BitMaskedArray"),
            ),
            Content::Unmasked(n) => {
                Content::Unmasked(UnmaskedArray::new(strip(n.content()), Parameters::new()))
            }
            Content::Union(n) => Content::Union(UnionArray::new_unchecked(
                n.tags().clone(),
                n.index().clone(),
                n.contents().iter().map(strip).collect(),
                Parameters::new(),
            )),
            Content::TypeTracer(t) => Content::TypeTracer(
                t.with_form(shape::without_parameters(t.form()), t.length()),
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use ragged_form::{Form, IndexType, PType};

    use super::*;
    use crate::Index;
    use crate::test_harness::{floats, strings};

    #[test]
    fn strings_become_lists_of_bytes() {
        let words = strings(&["ab", "c"]);
        let plain = without_parameters(&words);
        assert!(!plain.is_string_like());
        assert_eq!(plain.to_string(), "[[97, 98], [99]]");
        assert_eq!(
            plain.form(),
            Form::list_offset(IndexType::I64, Form::numpy(PType::U8)).unwrap()
        );
        assert_eq!(plain.form(), shape::without_parameters(&words.form()));
    }

    #[test]
    fn every_level_is_stripped() {
        let record = RecordArray::from_fields([("x", floats(&[1.0, 2.0]))])
            .unwrap()
            .with_parameters(Parameters::record("Point"));
        let options = Content::IndexedOption(
            IndexedOptionArray::try_new(
                Index::from(vec![1i64, -1]),
                Arc::new(Content::Record(record)),
                Parameters::record("Maybe"),
            )
            .unwrap(),
        );
        let plain = options.without_parameters();
        assert!(plain.parameters().is_empty());
        assert_eq!(plain.form(), shape::without_parameters(&options.form()));
        assert_eq!(plain.to_string(), "[{x: 2}, None]");
        let tracer = options.typetracer().without_parameters();
        assert_eq!(tracer.form(), plain.form());
    }
}
