#![deny(missing_docs)]

//! Immutable typed buffers for ragged arrays.
//!
//! Every index, mask and leaf node holds its values in a [`Buffer`]. Buffers are reference
//! counted, so cloning or slicing one never copies the values it points at.

pub use buffer::*;

mod buffer;
mod macros;

/// An immutable buffer of bytes.
pub type ByteBuffer = Buffer<u8>;
