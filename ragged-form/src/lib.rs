//! The structural type system of ragged arrays.
//!
//! A [`Form`] describes the shape of a content tree (its node kinds, index roles, field names and
//! user parameters) without holding any data. Forms answer depth queries used to normalize
//! `axis` arguments, list leaf columns, prune columns before a read, and derive the
//! [`Type`] shown to users. The [`shape`] module computes the form an operation would produce
//! without touching data.

pub use columns::*;
pub use form::*;
pub use index_type::*;
pub use parameters::*;
pub use ptype::*;
pub use types::*;

mod columns;
mod depth;
mod form;
mod index_type;
mod parameters;
mod ptype;
mod select;
mod serde;
pub mod shape;
mod types;

pub use depth::{merge_branch_depths, merge_minmax_depths};
