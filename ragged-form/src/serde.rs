//! Form to and from its JSON description.

use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedResult, ragged_bail, ragged_err};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::{
    BitMaskedForm, ByteMaskedForm, Form, FormInfo, FormRef, IndexType, IndexedForm,
    IndexedOptionForm, ListForm, ListOffsetForm, NumpyForm, PType, Parameters, RecordForm,
    RegularForm, UnionForm, UnmaskedForm, VirtualForm,
};

impl Form {
    /// The JSON description of this form.
    ///
    /// Metadata keys are only written when they differ from their defaults.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("class".into(), json!(self.class_name()));
        match self {
            Form::Numpy(f) => {
                out.insert("primitive".into(), json!(f.primitive.name()));
                if !f.inner_shape.is_empty() {
                    out.insert("inner_shape".into(), json!(f.inner_shape));
                }
            }
            Form::List(f) => {
                out.insert("starts".into(), json!(f.starts.name()));
                out.insert("stops".into(), json!(f.stops.name()));
                out.insert("content".into(), f.content.to_json());
            }
            Form::ListOffset(f) => {
                out.insert("offsets".into(), json!(f.offsets.name()));
                out.insert("content".into(), f.content.to_json());
            }
            Form::Regular(f) => {
                out.insert("size".into(), json!(f.size));
                out.insert("content".into(), f.content.to_json());
            }
            Form::Record(f) => {
                out.insert("fields".into(), json!(f.fields));
                out.insert(
                    "contents".into(),
                    Value::Array(f.contents.iter().map(|c| c.to_json()).collect()),
                );
            }
            Form::Indexed(f) => {
                out.insert("index".into(), json!(f.index.name()));
                out.insert("content".into(), f.content.to_json());
            }
            Form::IndexedOption(f) => {
                out.insert("index".into(), json!(f.index.name()));
                out.insert("content".into(), f.content.to_json());
            }
            Form::ByteMasked(f) => {
                out.insert("mask".into(), json!(f.mask.name()));
                out.insert("valid_when".into(), json!(f.valid_when));
                out.insert("content".into(), f.content.to_json());
            }
            Form::BitMasked(f) => {
                out.insert("mask".into(), json!(f.mask.name()));
                out.insert("valid_when".into(), json!(f.valid_when));
                out.insert("lsb_order".into(), json!(f.lsb_order));
                out.insert("content".into(), f.content.to_json());
            }
            Form::Unmasked(f) => {
                out.insert("content".into(), f.content.to_json());
            }
            Form::Union(f) => {
                out.insert("tags".into(), json!(f.tags.name()));
                out.insert("index".into(), json!(f.index.name()));
                out.insert(
                    "contents".into(),
                    Value::Array(f.contents.iter().map(|c| c.to_json()).collect()),
                );
            }
            Form::Virtual(f) => {
                out.insert(
                    "form".into(),
                    f.form.as_ref().map_or(Value::Null, |form| form.to_json()),
                );
                out.insert("has_length".into(), json!(f.has_length));
            }
        }

        let info = self.info();
        if info.has_identifier {
            out.insert("has_identifier".into(), json!(true));
        }
        if !info.parameters.is_empty() {
            out.insert("parameters".into(), info.parameters.to_json());
        }
        if let Some(key) = &info.form_key {
            out.insert("form_key".into(), json!(key));
        }
        Value::Object(out)
    }

    /// Parse a form from its JSON text.
    pub fn from_json_str(json: &str) -> RaggedResult<Form> {
        let value: Value = serde_json::from_str(json)?;
        Form::from_json(&value)
    }

    /// Read a form from its JSON description.
    ///
    /// A bare primitive name such as `"float64"` is a one-dimensional leaf. Class names with
    /// width suffixes (`"ListOffsetArray64"`, `"UnionArray8_32"`, ...) supply the index types
    /// that the description leaves out.
    pub fn from_json(value: &Value) -> RaggedResult<Form> {
        let object = match value {
            Value::String(primitive) => return Ok(Form::numpy(primitive.parse()?)),
            Value::Object(object) => object,
            other => ragged_bail!(InvalidSerde: "a form must be a JSON object or string, not {}", other),
        };

        let class = object
            .get("class")
            .and_then(Value::as_str)
            .ok_or_else(|| ragged_err!(InvalidSerde: "form is missing its \"class\": {}", value))?;
        let (class, suffix) = split_class(class);

        let info = FormInfo {
            has_identifier: object
                .get("has_identifier")
                .or_else(|| object.get("has_identities"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            parameters: Parameters::from_json(object.get("parameters").unwrap_or(&Value::Null))?,
            form_key: object
                .get("form_key")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        let role = |key: &str, default: Option<IndexType>| -> RaggedResult<IndexType> {
            match object.get(key) {
                Some(Value::String(name)) => name.parse(),
                Some(other) => ragged_bail!(
                    ConstructionContract: "{} {:?} must be a string, not {}",
                    class,
                    key,
                    other
                ),
                None => default.ok_or_else(
                    || ragged_err!(InvalidSerde: "{} is missing its {:?}", class, key),
                ),
            }
        };
        let content = || -> RaggedResult<FormRef> {
            let content = object
                .get("content")
                .ok_or_else(|| ragged_err!(InvalidSerde: "{} is missing its content", class))?;
            Ok(Arc::new(Form::from_json(content)?))
        };
        let flag = |key: &str, default: bool| object.get(key).and_then(Value::as_bool).unwrap_or(default);

        Ok(match class {
            "NumpyArray" => {
                let primitive = object
                    .get("primitive")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ragged_err!(InvalidSerde: "NumpyArray is missing its primitive"))?
                    .parse::<PType>()?;
                let inner_shape = match object.get("inner_shape") {
                    None | Some(Value::Null) => vec![],
                    Some(shape) => serde_json::from_value::<Vec<usize>>(shape.clone())?,
                };
                Form::Numpy(NumpyForm::new(primitive, inner_shape, info))
            }
            "ListArray" => {
                let default = suffix.list_index();
                Form::List(ListForm::try_new(
                    role("starts", default)?,
                    role("stops", default)?,
                    content()?,
                    info,
                )?)
            }
            "ListOffsetArray" => Form::ListOffset(ListOffsetForm::try_new(
                role("offsets", suffix.list_index())?,
                content()?,
                info,
            )?),
            "RegularArray" => {
                let size = object
                    .get("size")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| ragged_err!(InvalidSerde: "RegularArray is missing its size"))?;
                Form::Regular(RegularForm::new(size as usize, content()?, info))
            }
            "RecordArray" => {
                let (contents, fields) = record_contents(object)?;
                Form::Record(RecordForm::try_new(contents, fields, info)?)
            }
            "IndexedArray" => Form::Indexed(IndexedForm::try_new(
                role("index", suffix.list_index())?,
                content()?,
                info,
            )?),
            "IndexedOptionArray" => Form::IndexedOption(IndexedOptionForm::try_new(
                role("index", suffix.list_index())?,
                content()?,
                info,
            )?),
            "ByteMaskedArray" => Form::ByteMasked(ByteMaskedForm::try_new(
                role("mask", Some(IndexType::I8))?,
                content()?,
                flag("valid_when", true),
                info,
            )?),
            "BitMaskedArray" => Form::BitMasked(BitMaskedForm::try_new(
                role("mask", Some(IndexType::U8))?,
                content()?,
                flag("valid_when", true),
                flag("lsb_order", true),
                info,
            )?),
            "UnmaskedArray" => Form::Unmasked(UnmaskedForm::new(content()?, info)),
            "UnionArray" => {
                let contents = match object.get("contents") {
                    Some(Value::Array(contents)) => contents
                        .iter()
                        .map(|c| Form::from_json(c).map(Arc::new))
                        .try_collect()?,
                    _ => ragged_bail!(InvalidSerde: "UnionArray contents must be a list"),
                };
                Form::Union(UnionForm::try_new(
                    role("tags", Some(IndexType::I8))?,
                    role("index", suffix.union_index())?,
                    contents,
                    info,
                )?)
            }
            "VirtualArray" => {
                let form = match object.get("form") {
                    None | Some(Value::Null) => None,
                    Some(form) => Some(Arc::new(Form::from_json(form)?)),
                };
                Form::Virtual(VirtualForm::new(form, flag("has_length", false), info))
            }
            other => ragged_bail!(InvalidSerde: "unrecognized form class {:?}", other),
        })
    }
}

/// The width suffix of a legacy class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassSuffix {
    None,
    I32,
    U32,
    I64,
    /// The `8_32`, `8_U32` and `8_64` suffixes of unions.
    Union(IndexType),
}

impl ClassSuffix {
    fn list_index(self) -> Option<IndexType> {
        match self {
            ClassSuffix::I32 => Some(IndexType::I32),
            ClassSuffix::U32 => Some(IndexType::U32),
            ClassSuffix::I64 => Some(IndexType::I64),
            ClassSuffix::None | ClassSuffix::Union(_) => None,
        }
    }

    fn union_index(self) -> Option<IndexType> {
        match self {
            ClassSuffix::Union(index) => Some(index),
            _ => None,
        }
    }
}

fn split_class(class: &str) -> (&str, ClassSuffix) {
    const SUFFIXES: [(&str, ClassSuffix); 6] = [
        ("8_U32", ClassSuffix::Union(IndexType::U32)),
        ("8_32", ClassSuffix::Union(IndexType::I32)),
        ("8_64", ClassSuffix::Union(IndexType::I64)),
        ("U32", ClassSuffix::U32),
        ("32", ClassSuffix::I32),
        ("64", ClassSuffix::I64),
    ];
    for (suffix, kind) in SUFFIXES {
        if let Some(base) = class.strip_suffix(suffix) {
            if base.ends_with("Array") {
                return (base, kind);
            }
        }
    }
    (class, ClassSuffix::None)
}

type RecordContents = (Vec<FormRef>, Option<Vec<String>>);

fn record_contents(object: &Map<String, Value>) -> RaggedResult<RecordContents> {
    match object.get("contents") {
        Some(Value::Array(contents)) => {
            let contents = contents
                .iter()
                .map(|c| Form::from_json(c).map(Arc::new))
                .try_collect()?;
            let fields = match object.get("fields") {
                None | Some(Value::Null) => None,
                Some(fields) => Some(serde_json::from_value::<Vec<String>>(fields.clone())?),
            };
            Ok((contents, fields))
        }
        Some(Value::Object(contents)) => {
            let mut forms = Vec::with_capacity(contents.len());
            let mut fields = Vec::with_capacity(contents.len());
            for (field, content) in contents {
                fields.push(field.clone());
                forms.push(Arc::new(Form::from_json(content)?));
            }
            Ok((forms, Some(fields)))
        }
        _ => ragged_bail!(InvalidSerde: "RecordArray contents must be a list or an object"),
    }
}

impl Serialize for Form {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Form {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Form::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use serde_json::json;

    use crate::{ArrayHint, Form, IndexType, PType, Parameters};

    #[test]
    fn round_trip() {
        let form = Form::record([
            (
                "x",
                Form::list_offset(IndexType::I32, Form::numpy(PType::F64)).unwrap(),
            ),
            ("y", Form::string()),
            (
                "z",
                Form::indexed_option(IndexType::I64, Form::regular(3, Form::numpy(PType::U8)))
                    .unwrap()
                    .with_form_key(Some("node3".to_string())),
            ),
        ])
        .unwrap()
        .with_parameters(Parameters::record("point"));
        let json = form.to_json();
        assert_eq!(Form::from_json(&json).unwrap(), form);

        let text = serde_json::to_string(&form).unwrap();
        let parsed: Form = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, form);
    }

    #[test]
    fn compact_output() {
        assert_eq!(
            Form::list_offset(IndexType::I64, Form::numpy(PType::I32))
                .unwrap()
                .to_json(),
            json!({
                "class": "ListOffsetArray",
                "offsets": "i64",
                "content": {"class": "NumpyArray", "primitive": "int32"},
            })
        );
        assert_eq!(
            Form::string().to_string(),
            r#"{"class":"ListOffsetArray","content":{"class":"NumpyArray","parameters":{"__array__":"char"},"primitive":"uint8"},"offsets":"i64","parameters":{"__array__":"string"}}"#
        );
    }

    #[test]
    fn legacy_and_shorthand() {
        let form = Form::from_json(&json!({
            "class": "ListOffsetArray64",
            "content": "float64",
        }))
        .unwrap();
        assert_eq!(
            form,
            Form::list_offset(IndexType::I64, Form::numpy(PType::F64)).unwrap()
        );

        let union = Form::from_json(&json!({
            "class": "UnionArray8_32",
            "contents": ["int64", {"class": "IndexedOptionArray64", "content": "bool"}],
        }))
        .unwrap();
        let Form::Union(union) = union else {
            unreachable!()
        };
        assert_eq!(union.index(), IndexType::I32);
        assert_eq!(union.contents()[1].class_name(), "IndexedOptionArray");

        let record = Form::from_json(&json!({
            "class": "RecordArray",
            "contents": {"x": "int64", "y": "bool"},
            "parameters": {"__array__": "sorted_map"},
        }))
        .unwrap();
        assert_eq!(record.fields(), vec!["x", "y"]);
        assert_eq!(
            record.parameters().array_hint(),
            Some(ArrayHint::Custom("sorted_map".to_string()))
        );
    }

    #[test]
    fn invalid_descriptions() {
        let bad_role = Form::from_json(&json!({
            "class": "ListArray",
            "starts": "i8",
            "stops": "i64",
            "content": "float64",
        }));
        assert_eq!(bad_role.unwrap_err().kind(), ErrorKind::ConstructionContract);

        let unknown_role = Form::from_json(&json!({
            "class": "IndexedArray",
            "index": "int128",
            "content": "float64",
        }));
        assert_eq!(unknown_role.unwrap_err().kind(), ErrorKind::ConstructionContract);

        let unknown_class = Form::from_json(&json!({"class": "Mystery"}));
        assert_eq!(unknown_class.unwrap_err().kind(), ErrorKind::InvalidSerde);

        assert_eq!(
            Form::from_json_str("{not json").unwrap_err().kind(),
            ErrorKind::InvalidSerde
        );
    }
}
