//! Content trees of ragged arrays and their structural operations.
//!
//! A [`Content`] is an immutable tree of nodes: leaves of primitive values, lists delimited by
//! offsets or by starts and stops, records, options, indirections and tagged unions. Nodes share
//! their children through [`ContentRef`], so slicing, carrying and flattening build new trees
//! that reuse every subtree they do not change.
//!
//! Every operation here has a counterpart in [`ragged_form::shape`] describing the form it
//! produces, which is how a [`TypeTracerArray`] answers the same operations without data.

pub use arrays::*;
pub use backend::*;
pub use content::*;
pub use index::*;
pub use item::*;
pub use jagged::*;
pub use json::*;
pub use mask::*;
pub use scalar::*;

mod arrays;
mod backend;
pub mod compute;
mod content;
mod index;
mod item;
mod jagged;
mod json;
mod mask;
mod scalar;
pub mod test_harness;
