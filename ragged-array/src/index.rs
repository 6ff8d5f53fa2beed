use std::fmt::{Display, Formatter};

use itertools::Itertools;
use ragged_buffer::Buffer;
use ragged_error::{RaggedResult, ragged_bail};
use ragged_form::IndexType;

/// A typed, immutable buffer of integers used as offsets, starts, stops, tags, masks or carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    I8(Buffer<i8>),
    U8(Buffer<u8>),
    I32(Buffer<i32>),
    U32(Buffer<u32>),
    I64(Buffer<i64>),
}

/// Apply `$body` to the buffer of an index, bound as `$buf`.
macro_rules! match_each_index {
    ($self:expr, |$buf:ident| $body:expr) => {
        match $self {
            Index::I8($buf) => $body,
            Index::U8($buf) => $body,
            Index::I32($buf) => $body,
            Index::U32($buf) => $body,
            Index::I64($buf) => $body,
        }
    };
}

macro_rules! index_from {
    ($T:ty, $variant:ident) => {
        impl From<Vec<$T>> for Index {
            fn from(values: Vec<$T>) -> Self {
                Index::$variant(Buffer::from(values))
            }
        }

        impl From<Buffer<$T>> for Index {
            fn from(values: Buffer<$T>) -> Self {
                Index::$variant(values)
            }
        }
    };
}

index_from!(i8, I8);
index_from!(u8, U8);
index_from!(i32, I32);
index_from!(u32, U32);
index_from!(i64, I64);

impl Index {
    /// An empty index of the given type.
    pub fn empty(index_type: IndexType) -> Self {
        match index_type {
            IndexType::I8 => Index::I8(Buffer::empty()),
            IndexType::U8 => Index::U8(Buffer::empty()),
            IndexType::I32 => Index::I32(Buffer::empty()),
            IndexType::U32 => Index::U32(Buffer::empty()),
            IndexType::I64 => Index::I64(Buffer::empty()),
        }
    }

    /// An `i64` index of `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Index::I64(Buffer::zeroed(len))
    }

    /// The `i64` index `0, 1, ..., len - 1`.
    pub fn arange(len: usize) -> Self {
        Index::I64((0..len as i64).collect())
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            Index::I8(_) => IndexType::I8,
            Index::U8(_) => IndexType::U8,
            Index::I32(_) => IndexType::I32,
            Index::U32(_) => IndexType::U32,
            Index::I64(_) => IndexType::I64,
        }
    }

    pub fn len(&self) -> usize {
        match_each_index!(self, |buf| buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at `i`, widened to `i64`.
    ///
    /// # Panics
    ///
    /// If `i` is out of bounds.
    #[inline]
    pub fn get(&self, i: usize) -> i64 {
        match_each_index!(self, |buf| i64::from(buf[i]))
    }

    /// The first value, if any.
    pub fn first(&self) -> Option<i64> {
        (!self.is_empty()).then(|| self.get(0))
    }

    /// The last value, if any.
    pub fn last(&self) -> Option<i64> {
        (!self.is_empty()).then(|| self.get(self.len() - 1))
    }

    /// An O(1) view of the values in `start..stop`.
    pub fn slice(&self, start: usize, stop: usize) -> Self {
        match_each_index!(self, |buf| Index::from(buf.slice(start..stop)))
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.iter().collect()
    }

    /// This index widened to `i64`, sharing the buffer when it already is one.
    pub fn to_i64(&self) -> Index {
        match self {
            Index::I64(_) => self.clone(),
            _ => Index::from(self.to_vec()),
        }
    }

    /// Gathers `self[carry[i]]`, keeping the index type.
    pub fn take(&self, carry: &Index) -> RaggedResult<Index> {
        let len = self.len() as i64;
        if let Some(bad) = carry.iter().find(|c| *c < 0 || *c >= len) {
            ragged_bail!(IndexRange: "index {} is out of range for an index of length {}", bad, len);
        }
        Ok(match_each_index!(self, |buf| {
            let values = buf.as_slice();
            Index::from(carry.iter().map(|c| values[c as usize]).collect_vec())
        }))
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.index_type(), self.iter().join(", "))
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;

    #[test]
    fn take_keeps_width() {
        let index = Index::from(vec![10u32, 20, 30, 40]);
        let taken = index.take(&Index::from(vec![3i64, 0, 0])).unwrap();
        assert_eq!(taken, Index::from(vec![40u32, 10, 10]));
        assert_eq!(
            index.take(&Index::from(vec![4i64])).unwrap_err().kind(),
            ErrorKind::IndexRange
        );
    }

    #[test]
    fn slicing_and_widening() {
        let index = Index::from(vec![0i32, 3, 3, 5]);
        let sliced = index.slice(1, 3);
        assert_eq!(sliced.to_vec(), vec![3, 3]);
        assert_eq!(sliced.to_i64(), Index::from(vec![3i64, 3]));
        assert_eq!(index.last(), Some(5));
        assert_eq!(Index::empty(IndexType::I64).first(), None);
        assert_eq!(index.to_string(), "i32[0, 3, 3, 5]");
    }
}
