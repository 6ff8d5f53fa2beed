use std::fmt::{Display, Formatter};

use itertools::Itertools;
use ragged_error::{RaggedResult, ragged_bail};
use ragged_form::{ArrayHint, FormRef, Parameters};
use serde_json::{Map, Value};

use crate::{Content, ContentRef, NumpyData, Scalar};

/// A single element of an array.
#[derive(Debug, Clone)]
pub enum Item {
    /// A missing value of an option type.
    Missing,
    Scalar(Scalar),
    /// A list carrying the string hint.
    String(String),
    /// A list carrying the bytestring hint.
    Bytes(Vec<u8>),
    /// A nested list.
    Array(ContentRef),
    /// One entry of a record; `fields` is `None` for a tuple.
    Record {
        fields: Option<Vec<String>>,
        values: Vec<Item>,
    },
    /// An element of a type tracer, known only by its form.
    Unknown(FormRef),
}

impl Item {
    /// The element for one list of `content`, decoding strings and bytestrings.
    pub(crate) fn from_list(parameters: &Parameters, content: Content) -> Item {
        let bytes = match &content {
            Content::Numpy(leaf) => match leaf.data() {
                NumpyData::U8(values) => Some(values.as_slice()),
                _ => None,
            },
            _ => None,
        };
        match (parameters.array_hint(), bytes) {
            (Some(ArrayHint::String), Some(bytes)) => {
                Item::String(String::from_utf8_lossy(bytes).into_owned())
            }
            (Some(ArrayHint::ByteString), Some(bytes)) => Item::Bytes(bytes.to_vec()),
            _ => Item::Array(ContentRef::new(content)),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Item::Missing)
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Item::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }

    /// The value of a numeric scalar as a float.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().map(|s| s.as_f64())
    }

    pub fn as_array(&self) -> Option<&ContentRef> {
        match self {
            Item::Array(content) => Some(content),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Item::String(s) => Some(s),
            _ => None,
        }
    }

    /// The JSON rendering: missing values and NaN become `null`, tuples become arrays.
    pub fn to_json(&self) -> RaggedResult<Value> {
        Ok(match self {
            Item::Missing => Value::Null,
            Item::Scalar(scalar) => scalar.to_json(),
            Item::String(s) => Value::String(s.clone()),
            Item::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            Item::Array(content) => content.to_json()?,
            Item::Record {
                fields: Some(fields),
                values,
            } => Value::Object(
                fields
                    .iter()
                    .zip(values)
                    .map(|(name, value)| Ok((name.clone(), value.to_json()?)))
                    .collect::<RaggedResult<Map<_, _>>>()?,
            ),
            Item::Record {
                fields: None,
                values,
            } => Value::Array(values.iter().map(Item::to_json).try_collect()?),
            Item::Unknown(form) => {
                ragged_bail!(NotImplemented: "to_json", format!("an element of unknown value with form {}", form))
            }
        })
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Missing => write!(f, "None"),
            Item::Scalar(scalar) => write!(f, "{scalar}"),
            Item::String(s) => write!(f, "{s:?}"),
            Item::Bytes(bytes) => write!(f, "b{:?}", String::from_utf8_lossy(bytes)),
            Item::Array(content) => write!(f, "{content}"),
            Item::Record { fields, values } => match fields {
                Some(fields) => write!(
                    f,
                    "{{{}}}",
                    fields
                        .iter()
                        .zip(values)
                        .map(|(name, value)| format!("{name}: {value}"))
                        .join(", ")
                ),
                None => write!(f, "({})", values.iter().join(", ")),
            },
            Item::Unknown(form) => write!(f, "??? ({})", form.type_()),
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::NumpyArray;

    #[test]
    fn strings_decode_from_their_bytes() {
        let chars = Content::Numpy(NumpyArray::from(b"hey".to_vec()));
        let item = Item::from_list(&Parameters::array(ArrayHint::String), chars);
        assert_eq!(item.as_str(), Some("hey"));
        assert_eq!(item.to_json().unwrap(), json!("hey"));
    }

    #[test]
    fn records_render_as_objects_and_tuples_as_arrays() {
        let values = vec![Item::Scalar(Scalar::I64(1)), Item::Missing];
        let named = Item::Record {
            fields: Some(vec!["x".to_string(), "y".to_string()]),
            values: values.clone(),
        };
        assert_eq!(named.to_json().unwrap(), json!({"x": 1, "y": null}));
        let tuple = Item::Record {
            fields: None,
            values,
        };
        assert_eq!(tuple.to_json().unwrap(), json!([1, null]));
        assert_eq!(tuple.to_string(), "(1, None)");
    }
}
