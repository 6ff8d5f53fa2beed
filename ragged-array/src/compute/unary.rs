use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedResult, ResultExt, ragged_bail};
use ragged_form::{FormRef, NativePType, PType, Parameters, shape};

use crate::{
    Content, Index, IndexedOptionArray, ListOffsetArray, NumpyArray, NumpyData, RecordArray,
    TypeTracerArray, match_each_numpy_data,
};

/// The square root of every value, as `float64`. Negative values give NaN.
pub fn sqrt(array: &Content) -> RaggedResult<Content> {
    sqrt_impl(array).with_operation("ragged::sqrt")
}

fn sqrt_impl(array: &Content) -> RaggedResult<Content> {
    if let Content::TypeTracer(t) = array {
        let form = array.form();
        let form = shape::binary(&form, &form, &|_: PType, _: PType| PType::F64)?;
        return Ok(Content::TypeTracer(TypeTracerArray::new(
            FormRef::new(form),
            t.length(),
        )));
    }
    apply(array)
}

fn apply(array: &Content) -> RaggedResult<Content> {
    match array {
        Content::Numpy(n) if !n.inner_shape().is_empty() => apply(&n.to_regular()),
        Content::Numpy(n) => {
            let values: Vec<f64> = match_each_numpy_data!(n.data(), |values| values
                .iter()
                .map(|v| v.as_f64().sqrt())
                .collect());
            Ok(Content::Numpy(NumpyArray::new(NumpyData::from(values))))
        }
        Content::Indexed(n) => apply(&n.project()?),
        _ if array.is_option() => {
            let (Some(positions), Some(content)) = (array.option_index(), array.option_content())
            else {
                ragged_bail!("option {} without an index", array.class_name());
            };
            let mut index = Vec::with_capacity(positions.len());
            let mut carry = Vec::new();
            for position in positions {
                if position < 0 {
                    index.push(-1i64);
                } else {
                    index.push(carry.len() as i64);
                    carry.push(position);
                }
            }
            let present = content.carry(&Index::from(carry), false)?;
            Ok(Content::IndexedOption(IndexedOptionArray::new_unchecked(
                Index::from(index),
                Arc::new(apply(&present)?),
                Parameters::new(),
            )))
        }
        _ if array.is_list() => {
            let list = array.to_list_offset64()?;
            Ok(Content::ListOffset(ListOffsetArray::new_unchecked(
                list.offsets().clone(),
                Arc::new(apply(list.content())?),
                Parameters::new(),
            )))
        }
        Content::Record(r) => {
            let contents = (0..r.contents().len())
                .map(|i| apply(&r.trimmed(i)).map(Arc::new))
                .try_collect()?;
            Ok(Content::Record(RecordArray::new_unchecked(
                contents,
                r.field_names().map(<[String]>::to_vec),
                r.len(),
                Parameters::new(),
            )))
        }
        _ => ragged_bail!(
            StructuralMismatch: "cannot take the square root of {}",
            array.class_name()
        ),
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;
    use crate::from_json;
    use crate::test_harness::floats;

    #[test]
    fn roots_of_nested_values() {
        let array = from_json("[[4, 9], null, [], [2.25, -1]]").unwrap();
        assert_eq!(sqrt(&array).unwrap().to_string(), "[[2, 3], None, [], [1.5, NaN]]");
        assert_eq!(sqrt(&floats(&[16.0])).unwrap().to_string(), "[4]");
    }

    #[test]
    fn typetracers_match_eager_forms() {
        let array = from_json(r#"[{"a": [1, 4]}, {"a": [null]}]"#).unwrap();
        let eager = sqrt(&array).unwrap();
        let traced = sqrt(&array.typetracer()).unwrap();
        assert_eq!(traced.form(), eager.form());
        assert_eq!(eager.to_json().unwrap(), serde_json::json!([{"a": [1.0, 2.0]}, {"a": [null]}]));
    }

    #[test]
    fn unions_have_no_root() {
        let mixed = from_json(r#"[1, "two"]"#).unwrap();
        assert_eq!(sqrt(&mixed).unwrap_err().kind(), ErrorKind::StructuralMismatch);
    }
}
