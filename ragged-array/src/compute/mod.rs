//! Axis-taking operations on content trees.
//!
//! Each operation normalizes its `axis` against the depth of the array, descends to the target
//! list level and rebuilds the nodes above it. Type tracers take the same path through
//! [`ragged_form::shape`].

pub use binary::*;
pub use flatten::*;
pub use linear_fit::*;
pub use mean::*;
pub use parameters::*;
pub use reduce::*;
pub use unary::*;

mod binary;
mod flatten;
mod linear_fit;
mod mean;
mod parameters;
mod reduce;
mod unary;
mod union;

/// Options for [`flatten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// The list level to remove, or `None` to concatenate every leaf into one dimension.
    pub axis: Option<i64>,
    /// Whether the fields of records are concatenated when `axis` is `None`.
    pub flatten_records: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            axis: Some(1),
            flatten_records: true,
        }
    }
}

/// Options shared by the reducers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReduceOptions {
    /// Whether empty groups become missing values instead of the reducer's identity. `None`
    /// selects the reducer's own default.
    pub mask_identity: Option<bool>,
    /// Whether the reduced axis is kept as a list level of length one.
    pub keepdims: bool,
    /// A starting value for [`Reducer::Min`] and [`Reducer::Max`], replacing their identity.
    pub initial: Option<f64>,
    /// Whether the fields of records are reduced together when `axis` is `None`.
    pub flatten_records: bool,
}
