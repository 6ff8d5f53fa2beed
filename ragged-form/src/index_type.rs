use std::fmt::{Display, Formatter};
use std::str::FromStr;

use ragged_error::{RaggedError, RaggedResult, ragged_err};

/// Width and signedness of an index buffer (offsets, starts, stops, tags, masks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexType {
    /// Signed 8-bit, used for union tags and byte masks.
    I8,
    /// Unsigned 8-bit, used for bit masks.
    U8,
    /// Signed 32-bit.
    I32,
    /// Unsigned 32-bit.
    U32,
    /// Signed 64-bit.
    I64,
}

impl IndexType {
    /// The role label used in serialized forms.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
        }
    }

    /// Index types that may delimit lists or select into a child.
    pub const fn is_list_index(&self) -> bool {
        matches!(self, Self::I32 | Self::U32 | Self::I64)
    }

    /// Index types that may carry the `-1` missing sentinel.
    pub const fn is_option_index(&self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }
}

impl Display for IndexType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexType {
    type Err = RaggedError;

    fn from_str(s: &str) -> RaggedResult<Self> {
        Ok(match s {
            "i8" => Self::I8,
            "u8" => Self::U8,
            "i32" => Self::I32,
            "u32" => Self::U32,
            "i64" => Self::I64,
            _ => {
                return Err(ragged_err!(
                    ConstructionContract: "{:?} is not a valid index type, expected one of \"i8\", \"u8\", \"i32\", \"u32\", \"i64\"",
                    s
                ));
            }
        })
    }
}
