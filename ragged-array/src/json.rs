use std::sync::Arc;

use itertools::Itertools;
use log::trace;
use ragged_error::{RaggedResult, ResultExt, ragged_bail, ragged_err};
use ragged_form::{ArrayHint, Parameters};
use serde_json::Value;

use crate::{
    Content, Index, IndexedOptionArray, ListOffsetArray, NumpyArray, RecordArray, UnionArray,
};

static NULL: Value = Value::Null;

/// Builds an array from JSON text, inferring its type from the values.
///
/// A top-level array gives one element per entry; any other value gives an array of length
/// one. Integers become `int64` unless a float appears beside them, objects become records
/// whose absent fields are missing, and values of different kinds at the same place become a
/// union. Places that only ever hold `null` (or nothing) are `float64`.
pub fn from_json(text: &str) -> RaggedResult<Content> {
    from_json_impl(text).with_operation("ragged::from_json")
}

fn from_json_impl(text: &str) -> RaggedResult<Content> {
    let value: Value = serde_json::from_str(text)?;
    match &value {
        Value::Array(values) => build(&values.iter().collect_vec()),
        other => build(&[other]),
    }
}

impl Content {
    /// The elements of this array as a JSON array.
    pub fn to_json(&self) -> RaggedResult<Value> {
        if let Content::TypeTracer(t) = self {
            ragged_bail!(NotImplemented: "to_json", format!("a type tracer of form {}", t.form()));
        }
        Ok(Value::Array(
            (0..self.len())
                .map(|i| self.getitem_at_nowrap(i)?.to_json())
                .try_collect()?,
        ))
    }

    /// [`Content::to_json`] serialized without whitespace.
    pub fn to_json_string(&self) -> RaggedResult<String> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Bool,
    Number,
    String,
    List,
    Object,
}

impl Kind {
    fn of(value: &Value) -> Option<Kind> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Kind::Bool),
            Value::Number(_) => Some(Kind::Number),
            Value::String(_) => Some(Kind::String),
            Value::Array(_) => Some(Kind::List),
            Value::Object(_) => Some(Kind::Object),
        }
    }
}

fn build(values: &[&Value]) -> RaggedResult<Content> {
    if values.iter().any(|v| v.is_null()) {
        let mut index = Vec::with_capacity(values.len());
        let mut present = Vec::new();
        for value in values {
            if value.is_null() {
                index.push(-1i64);
            } else {
                index.push(present.len() as i64);
                present.push(*value);
            }
        }
        return Ok(Content::IndexedOption(IndexedOptionArray::new_unchecked(
            Index::from(index),
            Arc::new(build(&present)?),
            Parameters::new(),
        )));
    }

    let kinds = values.iter().filter_map(|v| Kind::of(v)).unique().collect_vec();
    match kinds.as_slice() {
        [] => Ok(Content::Numpy(NumpyArray::from(Vec::<f64>::new()))),
        [kind] => build_kind(*kind, values),
        _ => build_union(&kinds, values),
    }
}

fn build_union(kinds: &[Kind], values: &[&Value]) -> RaggedResult<Content> {
    trace!("values of {} kinds become a union", kinds.len());
    let mut grouped = vec![Vec::new(); kinds.len()];
    let mut tags = Vec::with_capacity(values.len());
    let mut index = Vec::with_capacity(values.len());
    for value in values {
        let tag = kinds
            .iter()
            .position(|k| Some(*k) == Kind::of(value))
            .ok_or_else(|| ragged_err!(InvalidSerde: "no kind for {}", value))?;
        tags.push(tag as i8);
        index.push(grouped[tag].len() as i64);
        grouped[tag].push(*value);
    }
    let contents = kinds
        .iter()
        .zip(&grouped)
        .map(|(kind, group)| build_kind(*kind, group).map(Arc::new))
        .try_collect()?;
    Ok(Content::Union(UnionArray::try_new(
        Index::from(tags),
        Index::from(index),
        contents,
        Parameters::new(),
    )?))
}

fn build_kind(kind: Kind, values: &[&Value]) -> RaggedResult<Content> {
    match kind {
        Kind::Bool => Ok(Content::Numpy(NumpyArray::from(
            values.iter().map(|v| v.as_bool().unwrap_or_default()).collect_vec(),
        ))),
        Kind::Number => Ok(build_numbers(values)),
        Kind::String => {
            let strings = values.iter().map(|v| v.as_str().unwrap_or_default()).collect_vec();
            let bytes = strings.iter().flat_map(|s| s.bytes()).collect_vec();
            let chars =
                NumpyArray::from(bytes).with_parameters(Parameters::array(ArrayHint::Char));
            Ok(Content::ListOffset(ListOffsetArray::new_unchecked(
                offsets(strings.iter().map(|s| s.len())),
                Arc::new(Content::Numpy(chars)),
                Parameters::array(ArrayHint::String),
            )))
        }
        Kind::List => {
            let lists = values
                .iter()
                .map(|v| v.as_array().map(Vec::as_slice).unwrap_or_default())
                .collect_vec();
            let inner = lists.iter().flat_map(|l| l.iter()).collect_vec();
            Ok(Content::ListOffset(ListOffsetArray::new_unchecked(
                offsets(lists.iter().map(|l| l.len())),
                Arc::new(build(&inner)?),
                Parameters::new(),
            )))
        }
        Kind::Object => {
            let objects = values.iter().filter_map(|v| v.as_object()).collect_vec();
            let names = objects
                .iter()
                .flat_map(|o| o.keys())
                .unique()
                .cloned()
                .collect_vec();
            let contents = names
                .iter()
                .map(|name| {
                    let field = objects
                        .iter()
                        .map(|o| o.get(name).unwrap_or(&NULL))
                        .collect_vec();
                    build(&field).map(Arc::new)
                })
                .try_collect()?;
            Ok(Content::Record(RecordArray::new_unchecked(
                contents,
                Some(names),
                values.len(),
                Parameters::new(),
            )))
        }
    }
}

/// Integers stay `int64` unless a float or an integer beyond `int64` occurs among them.
fn build_numbers(values: &[&Value]) -> Content {
    let integers = values.iter().map(|v| v.as_i64()).collect::<Option<Vec<_>>>();
    match integers {
        Some(integers) => Content::Numpy(NumpyArray::from(integers)),
        None => Content::Numpy(NumpyArray::from(
            values.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect_vec(),
        )),
    }
}

fn offsets(lengths: impl Iterator<Item = usize>) -> Index {
    let mut offsets = vec![0i64];
    offsets.extend(lengths.scan(0i64, |total, len| {
        *total += len as i64;
        Some(*total)
    }));
    Index::from(offsets)
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use ragged_form::{Form, IndexType, PType};
    use serde_json::json;

    use super::*;
    use crate::test_harness::{jagged, strings};

    #[test]
    fn numbers_widen_to_floats_only_when_needed() {
        let array = from_json("[[1.1, 2.2, 3], [], [4, 5.5]]").unwrap();
        assert_eq!(array.to_string(), "[[1.1, 2.2, 3], [], [4, 5.5]]");
        assert_eq!(
            array.form(),
            Form::list_offset(IndexType::I64, Form::numpy(PType::F64)).unwrap()
        );
        assert_eq!(array.to_json_string().unwrap(), "[[1.1,2.2,3.0],[],[4.0,5.5]]");

        let ints = from_json("[1, 2, 3]").unwrap();
        assert_eq!(ints.form(), Form::numpy(PType::I64));
    }

    #[test]
    fn nulls_become_options() {
        let array = from_json("[1, null, 3]").unwrap();
        assert!(array.is_option());
        assert_eq!(array.to_string(), "[1, None, 3]");
        assert_eq!(array.to_json().unwrap(), json!([1, null, 3]));

        let nothing = from_json("[null, null]").unwrap();
        assert_eq!(nothing.len(), 2);
        assert_eq!(
            nothing.form(),
            Form::indexed_option(IndexType::I64, Form::numpy(PType::F64)).unwrap()
        );
        let empty = from_json("[]").unwrap();
        assert_eq!(empty.form(), Form::numpy(PType::F64));
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn objects_become_records_with_optional_absent_fields() {
        let array = from_json(r#"[{"x": 1, "y": [1.5]}, {"x": 2}]"#).unwrap();
        let Content::Record(record) = &array else {
            panic!("expected a record");
        };
        assert_eq!(record.fields(), ["x", "y"]);
        assert!(array.getitem_field("y").unwrap().is_option());
        assert_eq!(
            array.to_json().unwrap(),
            json!([{"x": 1, "y": [1.5]}, {"x": 2, "y": null}])
        );
    }

    #[test]
    fn strings_and_mixed_kinds() {
        let words = from_json(r#"["ab", "c"]"#).unwrap();
        assert_eq!(words.form(), strings(&["ab", "c"]).form());
        assert_eq!(words.to_json().unwrap(), json!(["ab", "c"]));

        let mixed = from_json(r#"[1, "two", [3], true]"#).unwrap();
        let Content::Union(union) = &mixed else {
            panic!("expected a union");
        };
        assert_eq!(union.contents().len(), 4);
        assert_eq!(mixed.to_json().unwrap(), json!([1, "two", [3], true]));
    }

    #[test]
    fn scalars_become_arrays_of_one() {
        let array = from_json("2.5").unwrap();
        assert_eq!(array.to_string(), "[2.5]");
        let record = from_json(r#"{"a": true}"#).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.to_json().unwrap(), json!([{"a": true}]));
    }

    #[test]
    fn existing_arrays_render_as_json() {
        let array = jagged(vec![vec![1.0, f64::NAN], vec![]]);
        assert_eq!(array.to_json().unwrap(), json!([[1.0, null], []]));
        assert_eq!(
            array.typetracer().to_json().unwrap_err().kind(),
            ErrorKind::NotImplemented
        );
    }

    #[test]
    fn malformed_text_is_rejected() {
        let err = from_json("[[1.1, 2.2, 3], [blah], [4, 5.5]]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSerde);
        assert_eq!(
            from_json("[[1.1, 2.2, 3], []], [4, 5.5]]").unwrap_err().kind(),
            ErrorKind::InvalidSerde
        );
    }
}
