//! User metadata attached to forms and contents.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use ragged_error::{RaggedResult, ragged_bail};
use serde_json::{Map, Value};

/// Key of the structural hint that overrides how a list is interpreted (e.g. as a string).
pub const ARRAY_KEY: &str = "__array__";
/// Key naming the record type.
pub const RECORD_KEY: &str = "__record__";
/// Key holding a free-form description.
pub const DOC_KEY: &str = "__doc__";
/// Key marking a categorical array.
pub const CATEGORICAL_KEY: &str = "__categorical__";

/// The typed interpretation of the `"__array__"` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayHint {
    /// A list of `Char` is a UTF-8 string.
    String,
    /// A list of `Byte` is a bytestring.
    ByteString,
    /// The leaf of a string.
    Char,
    /// The leaf of a bytestring.
    Byte,
    /// Dictionary-encoded values.
    Categorical,
    /// Any other, user-defined, name.
    Custom(String),
}

impl ArrayHint {
    /// The parameter value naming this hint.
    pub fn as_str(&self) -> &str {
        match self {
            ArrayHint::String => "string",
            ArrayHint::ByteString => "bytestring",
            ArrayHint::Char => "char",
            ArrayHint::Byte => "byte",
            ArrayHint::Categorical => "categorical",
            ArrayHint::Custom(name) => name,
        }
    }

    /// Whether a list carrying this hint is a scalar for depth and column purposes.
    pub fn is_string_like(&self) -> bool {
        matches!(self, ArrayHint::String | ArrayHint::ByteString)
    }
}

impl From<&str> for ArrayHint {
    fn from(value: &str) -> Self {
        match value {
            "string" => ArrayHint::String,
            "bytestring" => ArrayHint::ByteString,
            "char" => ArrayHint::Char,
            "byte" => ArrayHint::Byte,
            "categorical" => ArrayHint::Categorical,
            other => ArrayHint::Custom(other.to_string()),
        }
    }
}

impl Display for ArrayHint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How parameters participate in form equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParameterEquality {
    /// Every key must match.
    #[default]
    Exact,
    /// Like `Exact`, but `"__doc__"` and `"__categorical__"` are not compared.
    IgnoreDocumentation,
    /// Only `"__array__"` and `"__record__"` are compared.
    ArrayAndRecord,
    /// Parameters are not compared.
    Ignore,
}

/// An unordered string-keyed mapping of JSON metadata.
///
/// An absent mapping and an empty mapping are the same value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    /// An empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters holding only the given `"__array__"` hint.
    pub fn array(hint: ArrayHint) -> Self {
        Self::new().with(ARRAY_KEY, Value::String(hint.as_str().to_string()))
    }

    /// Parameters holding only the given `"__record__"` name.
    pub fn record(name: &str) -> Self {
        Self::new().with(RECORD_KEY, Value::String(name.to_string()))
    }

    /// Returns a copy with `key` set to `value`.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`; a JSON `null` removes the key.
    pub fn insert(&mut self, key: &str, value: Value) {
        if value.is_null() {
            self.0.remove(key);
        } else {
            self.0.insert(key.to_string(), value);
        }
    }

    /// Looks up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.0.iter()
    }

    /// The typed `"__array__"` hint, if any.
    pub fn array_hint(&self) -> Option<ArrayHint> {
        self.get(ARRAY_KEY).and_then(Value::as_str).map(ArrayHint::from)
    }

    /// Whether the `"__array__"` hint marks a string or bytestring.
    pub fn is_string_like(&self) -> bool {
        self.array_hint().is_some_and(|h| h.is_string_like())
    }

    /// The `"__record__"` name, if any.
    pub fn record_name(&self) -> Option<&str> {
        self.get(RECORD_KEY).and_then(Value::as_str)
    }

    /// Compares two parameter sets under the given mode.
    pub fn equals(&self, other: &Parameters, mode: ParameterEquality) -> bool {
        match mode {
            ParameterEquality::Exact => self == other,
            ParameterEquality::IgnoreDocumentation => {
                let ignored = |k: &&String| k.as_str() != DOC_KEY && k.as_str() != CATEGORICAL_KEY;
                let lhs = self.0.iter().filter(|(k, _)| ignored(k));
                let rhs = other.0.iter().filter(|(k, _)| ignored(k));
                lhs.eq(rhs)
            }
            ParameterEquality::ArrayAndRecord => {
                self.get(ARRAY_KEY) == other.get(ARRAY_KEY)
                    && self.get(RECORD_KEY) == other.get(RECORD_KEY)
            }
            ParameterEquality::Ignore => true,
        }
    }

    /// The parameters as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<_, _>>(),
        )
    }

    /// Reads parameters from a JSON object; `null` is read as empty.
    pub fn from_json(value: &Value) -> RaggedResult<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => {
                let mut parameters = Self::new();
                for (k, v) in map {
                    parameters.insert(k, v.clone());
                }
                Ok(parameters)
            }
            other => ragged_bail!(InvalidSerde: "parameters must be a JSON object, not {}", other),
        }
    }
}

impl FromIterator<(String, Value)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut parameters = Self::new();
        for (k, v) in iter {
            parameters.insert(&k, v);
        }
        parameters
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_values_are_absent() {
        let params = Parameters::new().with("x", Value::Null);
        assert_eq!(params, Parameters::new());
        assert_eq!(Parameters::from_json(&Value::Null).unwrap(), Parameters::new());
    }

    #[test]
    fn ignore_documentation() {
        let a = Parameters::record("point").with(DOC_KEY, json!("a point"));
        let b = Parameters::record("point");
        assert!(!a.equals(&b, ParameterEquality::Exact));
        assert!(a.equals(&b, ParameterEquality::IgnoreDocumentation));
        assert!(a.equals(&b, ParameterEquality::ArrayAndRecord));

        let c = Parameters::record("point").with("units", json!("cm"));
        assert!(!c.equals(&b, ParameterEquality::IgnoreDocumentation));
        assert!(c.equals(&b, ParameterEquality::ArrayAndRecord));
        assert!(c.equals(&Parameters::new(), ParameterEquality::Ignore));
    }

    #[test]
    fn array_hint() {
        assert_eq!(
            Parameters::array(ArrayHint::String).array_hint(),
            Some(ArrayHint::String)
        );
        assert!(Parameters::array(ArrayHint::ByteString).is_string_like());
        assert!(!Parameters::array(ArrayHint::Categorical).is_string_like());
        assert_eq!(
            Parameters::new().with(ARRAY_KEY, json!("sorted_map")).array_hint(),
            Some(ArrayHint::Custom("sorted_map".to_string()))
        );
    }
}
