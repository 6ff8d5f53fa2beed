//! The user-facing logical type of a form, rendered in the `var * float64` notation.

use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::{ArrayHint, Form, PType};

/// The logical type of the elements of an array.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A primitive value.
    Numpy(PType),
    /// The type of a content whose form is not known.
    Unknown,
    /// Lists of one fixed size.
    Regular { content: Box<Type>, size: usize },
    /// Variable-length lists.
    List(Box<Type>),
    /// A UTF-8 string.
    String,
    /// A bytestring.
    Bytes,
    /// Records, or tuples when `fields` is `None`.
    Record {
        fields: Option<Vec<String>>,
        contents: Vec<Type>,
        name: Option<String>,
    },
    /// A value that may be missing.
    Option(Box<Type>),
    /// One of several types.
    Union(Vec<Type>),
}

/// The type of a whole array: its length and the type of its elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub content: Type,
    pub length: usize,
}

impl ArrayType {
    pub fn new(content: Type, length: usize) -> Self {
        Self { content, length }
    }
}

impl Display for ArrayType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} * {}", self.length, self.content)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Numpy(ptype) => write!(f, "{ptype}"),
            Type::Unknown => write!(f, "unknown"),
            Type::Regular { content, size } => write!(f, "{size} * {content}"),
            Type::List(content) => write!(f, "var * {content}"),
            Type::String => write!(f, "string"),
            Type::Bytes => write!(f, "bytes"),
            Type::Record {
                fields,
                contents,
                name,
            } => {
                let items = match fields {
                    None => contents.iter().map(|c| c.to_string()).join(", "),
                    Some(fields) => fields
                        .iter()
                        .zip(contents)
                        .map(|(field, content)| format!("{}: {content}", quote_field(field)))
                        .join(", "),
                };
                match (name, fields) {
                    (Some(name), _) => write!(f, "{name}[{items}]"),
                    (None, None) => write!(f, "({items})"),
                    (None, Some(_)) => write!(f, "{{{items}}}"),
                }
            }
            Type::Option(content) => match content.as_ref() {
                Type::List(_) | Type::Regular { .. } => write!(f, "option[{content}]"),
                _ => write!(f, "?{content}"),
            },
            Type::Union(contents) => write!(f, "union[{}]", contents.iter().join(", ")),
        }
    }
}

fn quote_field(field: &str) -> String {
    let plain = !field.is_empty()
        && field.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !field.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        field.to_string()
    } else {
        format!("{field:?}")
    }
}

impl Form {
    /// The logical type of the elements this form describes.
    pub fn type_(&self) -> Type {
        match self {
            Form::Numpy(f) => f.inner_shape.iter().rev().fold(
                Type::Numpy(f.primitive),
                |content, size| Type::Regular {
                    content: Box::new(content),
                    size: *size,
                },
            ),
            Form::List(_) | Form::ListOffset(_) | Form::Regular(_) if self.is_string_like() => {
                match self.parameters().array_hint() {
                    Some(ArrayHint::ByteString) => Type::Bytes,
                    _ => Type::String,
                }
            }
            Form::List(f) => Type::List(Box::new(f.content.type_())),
            Form::ListOffset(f) => Type::List(Box::new(f.content.type_())),
            Form::Regular(f) => Type::Regular {
                content: Box::new(f.content.type_()),
                size: f.size,
            },
            Form::Record(f) => Type::Record {
                fields: f.fields.clone(),
                contents: f.contents.iter().map(|c| c.type_()).collect(),
                name: f.info.parameters.record_name().map(str::to_string),
            },
            Form::Indexed(f) => f.content.type_(),
            Form::IndexedOption(f) => option_of(f.content.type_()),
            Form::ByteMasked(f) => option_of(f.content.type_()),
            Form::BitMasked(f) => option_of(f.content.type_()),
            Form::Unmasked(f) => option_of(f.content.type_()),
            Form::Union(f) => Type::Union(f.contents.iter().map(|c| c.type_()).collect()),
            Form::Virtual(f) => f.form.as_ref().map_or(Type::Unknown, |f| f.type_()),
        }
    }
}

fn option_of(content: Type) -> Type {
    match content {
        Type::Option(_) => content,
        content => Type::Option(Box::new(content)),
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use crate::{ArrayType, Form, FormInfo, IndexType, NumpyForm, PType, Parameters};

    fn var(content: Form) -> Form {
        Form::list_offset(IndexType::I64, content).unwrap()
    }

    fn option(content: Form) -> Form {
        Form::indexed_option(IndexType::I64, content).unwrap()
    }

    #[rstest]
    #[case(var(Form::numpy(PType::F64)), "var * float64")]
    #[case(Form::regular(3, Form::numpy(PType::I64)), "3 * int64")]
    #[case(option(Form::numpy(PType::F64)), "?float64")]
    #[case(option(var(Form::numpy(PType::I64))), "option[var * int64]")]
    #[case(var(option(Form::numpy(PType::F64))), "var * ?float64")]
    #[case(Form::string(), "string")]
    #[case(
        Form::record([("x", Form::numpy(PType::I64)), ("y", var(Form::numpy(PType::F64)))]).unwrap(),
        "{x: int64, y: var * float64}"
    )]
    #[case(Form::tuple([Form::numpy(PType::I64), Form::numpy(PType::Bool)]), "(int64, bool)")]
    #[case(
        Form::union(IndexType::I64, [Form::numpy(PType::F64), Form::string()]).unwrap(),
        "union[float64, string]"
    )]
    #[case(Form::Numpy(NumpyForm::new(PType::I32, vec![2, 3], FormInfo::default())), "2 * 3 * int32")]
    fn type_strings(#[case] form: Form, #[case] expected: &str) {
        assert_eq!(form.type_().to_string(), expected);
    }

    #[test]
    fn named_records_and_lengths() {
        let point = Form::record([("x", Form::numpy(PType::F64)), ("my field", Form::numpy(PType::F64))])
            .unwrap()
            .with_parameters(Parameters::record("Point"));
        assert_eq!(point.type_().to_string(), "Point[x: float64, \"my field\": float64]");
        assert_eq!(
            ArrayType::new(var(point).type_(), 5).to_string(),
            "5 * var * Point[x: float64, \"my field\": float64]"
        );
    }
}
