//! Columnar arrays of nested, variable-length and missing data.
//!
//! The content nodes and their operations live in [`array`] and are re-exported at the root.
//! The structural metadata describing them is in [`form`].

pub use ragged_array::*;
pub use {
    ragged_array as array, ragged_buffer as buffer, ragged_error as error, ragged_form as form,
};

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::compute::{ReduceOptions, sum};
    use crate::form::Form;
    use crate::from_json;

    #[test]
    fn reexports_reach_every_layer() {
        let array = from_json("[[1, 2], [], [3]]").unwrap();
        let totals = sum(&array, Some(-1), &ReduceOptions::default()).unwrap();
        assert_eq!(totals.to_json().unwrap(), json!([3, 0, 3]));
        let form = Form::from_json_str(&array.form().to_json().to_string()).unwrap();
        assert_eq!(form, array.form());
    }
}
