use std::fmt::{Display, Formatter};

use ragged_form::PType;
use serde_json::{Number, Value};

/// A single primitive value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

macro_rules! scalar_from {
    ($T:ty, $variant:ident) => {
        impl From<$T> for Scalar {
            fn from(value: $T) -> Self {
                Scalar::$variant(value)
            }
        }
    };
}

scalar_from!(bool, Bool);
scalar_from!(i8, I8);
scalar_from!(i16, I16);
scalar_from!(i32, I32);
scalar_from!(i64, I64);
scalar_from!(u8, U8);
scalar_from!(u16, U16);
scalar_from!(u32, U32);
scalar_from!(u64, U64);
scalar_from!(f32, F32);
scalar_from!(f64, F64);

impl Scalar {
    pub fn ptype(&self) -> PType {
        match self {
            Scalar::Bool(_) => PType::Bool,
            Scalar::I8(_) => PType::I8,
            Scalar::I16(_) => PType::I16,
            Scalar::I32(_) => PType::I32,
            Scalar::I64(_) => PType::I64,
            Scalar::U8(_) => PType::U8,
            Scalar::U16(_) => PType::U16,
            Scalar::U32(_) => PType::U32,
            Scalar::U64(_) => PType::U64,
            Scalar::F32(_) => PType::F32,
            Scalar::F64(_) => PType::F64,
        }
    }

    /// The value as a float, lossy for wide integers.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Bool(v) => f64::from(u8::from(v)),
            Scalar::I8(v) => f64::from(v),
            Scalar::I16(v) => f64::from(v),
            Scalar::I32(v) => f64::from(v),
            Scalar::I64(v) => v as f64,
            Scalar::U8(v) => f64::from(v),
            Scalar::U16(v) => f64::from(v),
            Scalar::U32(v) => f64::from(v),
            Scalar::U64(v) => v as f64,
            Scalar::F32(v) => f64::from(v),
            Scalar::F64(v) => v,
        }
    }

    /// The JSON rendering of the value; NaN and infinities become `null`.
    pub fn to_json(&self) -> Value {
        match *self {
            Scalar::Bool(v) => Value::Bool(v),
            Scalar::I8(v) => Value::from(v),
            Scalar::I16(v) => Value::from(v),
            Scalar::I32(v) => Value::from(v),
            Scalar::I64(v) => Value::from(v),
            Scalar::U8(v) => Value::from(v),
            Scalar::U16(v) => Value::from(v),
            Scalar::U32(v) => Value::from(v),
            Scalar::U64(v) => Value::from(v),
            Scalar::F32(v) => Number::from_f64(f64::from(v)).map_or(Value::Null, Value::Number),
            Scalar::F64(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::U8(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
        }
    }
}
