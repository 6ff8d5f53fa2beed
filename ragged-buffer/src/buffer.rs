use std::collections::Bound;
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, RangeBounds};
use std::sync::Arc;

use num_traits::Zero;
use ragged_error::{RaggedExpect, ragged_panic};

/// An immutable buffer of items of `T`.
///
/// The values live in a shared allocation; a buffer is a window `offset..offset + length` into it.
#[derive(Clone)]
pub struct Buffer<T> {
    values: Arc<[T]>,
    offset: usize,
    length: usize,
}

impl<T> Buffer<T> {
    /// Returns a new `Buffer<T>` copied from the provided `Vec<T>`, `&[T]`, etc.
    pub fn copy_from(values: impl AsRef<[T]>) -> Self
    where
        T: Clone,
    {
        Self::from(values.as_ref().to_vec())
    }

    /// Create a new empty buffer.
    pub fn empty() -> Self {
        Self::from(Vec::new())
    }

    /// Create a new buffer of `len` copies of the given value.
    pub fn full(item: T, len: usize) -> Self
    where
        T: Copy,
    {
        Self::from(vec![item; len])
    }

    /// Create a new buffer of `len` zeros.
    pub fn zeroed(len: usize) -> Self
    where
        T: Zero + Copy,
    {
        Self::full(T::zero(), len)
    }

    /// Returns the length of the buffer in elements of type T.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns whether the buffer is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns a slice over the buffer of elements of type T.
    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        &self.values[self.offset..self.offset + self.length]
    }

    /// Returns an iterator over the buffer of elements of type T.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.as_slice().iter()
    }

    /// Returns a slice of self for the provided range.
    ///
    /// # Panics
    ///
    /// Requires that `begin <= end` and `end <= self.len()`.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let len = self.len();
        let begin = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).ragged_expect("out of range"),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).ragged_expect("out of range"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => len,
        };

        if begin > end {
            ragged_panic!(
                "range start must not be greater than end: {:?} <= {:?}",
                begin,
                end
            );
        }
        if end > len {
            ragged_panic!("range end out of bounds: {:?} <= {:?}", end, len);
        }

        Self {
            values: Arc::clone(&self.values),
            offset: self.offset + begin,
            length: end - begin,
        }
    }

    /// Returns true if both buffers view the same allocation at the same window.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
            && self.offset == other.offset
            && self.length == other.length
    }

    /// Map each element into a new buffer.
    pub fn map_each<R, F: FnMut(&T) -> R>(&self, f: F) -> Buffer<R> {
        self.iter().map(f).collect()
    }
}

impl<T: Debug> Debug for Buffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        const TRUNC_SIZE: usize = 512;
        let mut binding = f.debug_struct("Buffer");
        let mut fields = binding.field("length", &self.length);
        if self.length > TRUNC_SIZE {
            fields = fields.field("truncated", &true);
        }
        fields
            .field("values", &&self.as_slice()[..self.length.min(TRUNC_SIZE)])
            .finish()
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for Buffer<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: PartialEq> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Buffer<T> {}

impl<T> FromIterator<T> for Buffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    fn from(value: Vec<T>) -> Self {
        let length = value.len();
        Self {
            values: Arc::from(value),
            offset: 0,
            length,
        }
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Owned iterator over a `Buffer<T>`.
pub struct BufferIterator<T> {
    buffer: Buffer<T>,
    index: usize,
}

impl<T: Copy> Iterator for BufferIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        (self.index < self.buffer.len()).then(move || {
            let value = self.buffer.as_slice()[self.index];
            self.index += 1;
            value
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: Copy> ExactSizeIterator for BufferIterator<T> {}

impl<T: Copy> IntoIterator for Buffer<T> {
    type Item = T;
    type IntoIter = BufferIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        BufferIterator {
            buffer: self,
            index: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{Buffer, buffer};

    #[test]
    fn slice() {
        let buf = buffer![0i64, 1, 2, 3, 4];
        let sliced = buf.slice(1..4);
        assert_eq!(sliced.as_slice(), &[1, 2, 3]);
        assert_eq!(sliced.slice(1..).as_slice(), &[2, 3]);
        assert!(sliced.slice(2..2).is_empty());
    }

    #[test]
    fn slices_share_values() {
        let buf = Buffer::copy_from([1.5f64, 2.5, 3.5]);
        let a = buf.slice(1..);
        let b = buf.slice(1..);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&buf));
    }

    #[test]
    fn owned_iteration() {
        let buf: Buffer<u8> = buffer![7u8; 3];
        assert_eq!(buf.into_iter().collect::<Vec<_>>(), vec![7, 7, 7]);
        assert_eq!(Buffer::<i32>::zeroed(2).as_slice(), &[0, 0]);
    }

    #[test]
    #[should_panic]
    fn slice_out_of_bounds() {
        buffer![1u32, 2].slice(1..3);
    }
}
