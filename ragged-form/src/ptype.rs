//! Physical types of leaf values.

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use num_traits::{Bounded, NumCast, ToPrimitive};
use ragged_error::{RaggedError, RaggedResult, ragged_err};

/// Physical type enum, represents the in-memory physical layout of a leaf's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PType {
    /// A boolean stored as one byte per value
    Bool,
    /// An 8-bit signed integer
    I8,
    /// A 16-bit signed integer
    I16,
    /// A 32-bit signed integer
    I32,
    /// A 64-bit signed integer
    I64,
    /// An 8-bit unsigned integer
    U8,
    /// A 16-bit unsigned integer
    U16,
    /// A 32-bit unsigned integer
    U32,
    /// A 64-bit unsigned integer
    U64,
    /// A 32-bit floating point number
    F32,
    /// A 64-bit floating point number
    F64,
}

/// A trait for native Rust types that correspond 1:1 to a PType
pub trait NativePType:
    Send + Sync + Clone + Copy + Debug + Display + Default + PartialEq + PartialOrd + 'static
{
    /// The PType that corresponds to this native type
    const PTYPE: PType;

    /// Whether this instance (`self`) is NaN
    /// For integer types, this is always `false`
    fn is_nan(self) -> bool;

    /// Whether this instance (`self`) equals zero (or `false`)
    fn is_zero(self) -> bool;

    /// The largest representable value, the identity of a minimum
    fn upper_bound() -> Self;

    /// The smallest representable value, the identity of a maximum
    fn lower_bound() -> Self;

    /// Lossy conversion into an `f64`
    fn as_f64(self) -> f64;

    /// Wrapping conversion into an `i64`
    fn as_i64(self) -> i64;

    /// Wrapping conversion into a `u64`
    fn as_u64(self) -> u64;

    /// Conversion from an `f64`, returning `None` if the value does not fit
    fn from_f64(value: f64) -> Option<Self>;

    /// Wrapping conversion from an `i64`
    fn from_i64(value: i64) -> Self;

    /// Wrapping conversion from a `u64`
    fn from_u64(value: u64) -> Self;
}

macro_rules! native_ptype {
    ($T:ty, $ptype:tt, nan: $is_nan:expr, upper: $upper:expr, lower: $lower:expr) => {
        impl NativePType for $T {
            const PTYPE: PType = PType::$ptype;

            #[inline]
            fn is_nan(self) -> bool {
                let is_nan: fn($T) -> bool = $is_nan;
                is_nan(self)
            }

            #[inline]
            fn is_zero(self) -> bool {
                self == <$T>::default()
            }

            fn upper_bound() -> Self {
                $upper
            }

            fn lower_bound() -> Self {
                $lower
            }

            #[inline]
            fn as_f64(self) -> f64 {
                ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
            }

            #[inline]
            fn as_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn as_u64(self) -> u64 {
                self as u64
            }

            fn from_f64(value: f64) -> Option<Self> {
                <$T as NumCast>::from(value)
            }

            #[inline]
            fn from_i64(value: i64) -> Self {
                value as $T
            }

            #[inline]
            fn from_u64(value: u64) -> Self {
                value as $T
            }
        }
    };
}

native_ptype!(i8, I8, nan: |_| false, upper: <i8 as Bounded>::max_value(), lower: <i8 as Bounded>::min_value());
native_ptype!(i16, I16, nan: |_| false, upper: <i16 as Bounded>::max_value(), lower: <i16 as Bounded>::min_value());
native_ptype!(i32, I32, nan: |_| false, upper: <i32 as Bounded>::max_value(), lower: <i32 as Bounded>::min_value());
native_ptype!(i64, I64, nan: |_| false, upper: <i64 as Bounded>::max_value(), lower: <i64 as Bounded>::min_value());
native_ptype!(u8, U8, nan: |_| false, upper: <u8 as Bounded>::max_value(), lower: <u8 as Bounded>::min_value());
native_ptype!(u16, U16, nan: |_| false, upper: <u16 as Bounded>::max_value(), lower: <u16 as Bounded>::min_value());
native_ptype!(u32, U32, nan: |_| false, upper: <u32 as Bounded>::max_value(), lower: <u32 as Bounded>::min_value());
native_ptype!(u64, U64, nan: |_| false, upper: <u64 as Bounded>::max_value(), lower: <u64 as Bounded>::min_value());
native_ptype!(f32, F32, nan: f32::is_nan, upper: f32::INFINITY, lower: f32::NEG_INFINITY);
native_ptype!(f64, F64, nan: f64::is_nan, upper: f64::INFINITY, lower: f64::NEG_INFINITY);

impl NativePType for bool {
    const PTYPE: PType = PType::Bool;

    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    #[inline]
    fn is_zero(self) -> bool {
        !self
    }

    fn upper_bound() -> Self {
        true
    }

    fn lower_bound() -> Self {
        false
    }

    #[inline]
    fn as_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }

    #[inline]
    fn as_i64(self) -> i64 {
        <i64 as From<bool>>::from(self)
    }

    #[inline]
    fn as_u64(self) -> u64 {
        <u64 as From<bool>>::from(self)
    }

    fn from_f64(value: f64) -> Option<Self> {
        Some(value != 0.0)
    }

    #[inline]
    fn from_i64(value: i64) -> Self {
        value != 0
    }

    #[inline]
    fn from_u64(value: u64) -> Self {
        value != 0
    }
}

/// Macro to match over each PType, binding the corresponding native type (from `NativePType`)
#[macro_export]
macro_rules! match_each_native_ptype {
    ($self:expr, | $_:tt $enc:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $enc:ident ) => ( $($body)* )}
        use $crate::PType;
        match $self {
            PType::Bool => __with__! { bool },
            PType::I8 => __with__! { i8 },
            PType::I16 => __with__! { i16 },
            PType::I32 => __with__! { i32 },
            PType::I64 => __with__! { i64 },
            PType::U8 => __with__! { u8 },
            PType::U16 => __with__! { u16 },
            PType::U32 => __with__! { u32 },
            PType::U64 => __with__! { u64 },
            PType::F32 => __with__! { f32 },
            PType::F64 => __with__! { f64 },
        }
    })
}

impl PType {
    /// Returns `true` iff this PType is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Returns `true` iff this PType is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Returns `true` iff this PType is an integer type, signed or unsigned
    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_unsigned_int() || self.is_signed_int()
    }

    /// Returns `true` iff this PType is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Returns the number of bytes in this PType
    #[inline]
    pub const fn byte_width(&self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// The NumPy name of this type, as used in serialized forms and type strings.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// The type that two leaves of types `self` and `other` are concatenated into.
    ///
    /// Booleans only stay booleans when paired with booleans, integers of equal signedness widen,
    /// integers of mixed signedness become `int64` and anything involving a float becomes `float64`.
    pub fn promote(self, other: PType) -> PType {
        use PType::*;
        if self == other {
            return self;
        }
        match (self, other) {
            (a, b) if a.is_float() || b.is_float() => F64,
            (a, b) if a.is_unsigned_int() && b.is_unsigned_int() => {
                if a.byte_width() >= b.byte_width() {
                    a
                } else {
                    b
                }
            }
            (a, b) if a.is_signed_int() && b.is_signed_int() => {
                if a.byte_width() >= b.byte_width() {
                    a
                } else {
                    b
                }
            }
            _ => I64,
        }
    }
}

impl Display for PType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PType {
    type Err = RaggedError;

    fn from_str(s: &str) -> RaggedResult<Self> {
        Ok(match s {
            "bool" => Self::Bool,
            "int8" => Self::I8,
            "int16" => Self::I16,
            "int32" => Self::I32,
            "int64" => Self::I64,
            "uint8" => Self::U8,
            "uint16" => Self::U16,
            "uint32" => Self::U32,
            "uint64" => Self::U64,
            "float32" => Self::F32,
            "float64" => Self::F64,
            _ => return Err(ragged_err!(ConstructionContract: "unknown primitive type {:?}", s)),
        })
    }
}
