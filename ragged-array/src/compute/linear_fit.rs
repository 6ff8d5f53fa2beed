use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use ragged_error::{RaggedResult, ResultExt, ragged_bail};
use ragged_form::{Form, PType, Parameters, shape};

use crate::compute::mean::{combine_items, masked_like};
use crate::compute::{BinaryOp, ReduceOptions, count, multiply, sqrt, sum};
use crate::{Content, Item, RecordArray, Scalar};

/// Fields of a [`linear_fit`] result, in order.
pub const LINEAR_FIT_FIELDS: [&str; 4] = ["intercept", "slope", "intercept_error", "slope_error"];

/// Record name carried by [`linear_fit`] results.
pub const LINEAR_FIT_RECORD: &str = "LinearFit";

/// Least-squares fit of `y = intercept + slope * x` within each group along `axis`.
///
/// Groups are formed the way the reducers form them. With `weight`, every point counts by its
/// weight; weights at missing values of `x` do not count. The result is a record named
/// `LinearFit` with the fields in [`LINEAR_FIT_FIELDS`]: an array of records when the groups
/// form an array, a single record when `axis` is `None`.
pub fn linear_fit(
    x: &Content,
    y: &Content,
    weight: Option<&Content>,
    axis: Option<i64>,
    options: &ReduceOptions,
) -> RaggedResult<Item> {
    linear_fit_impl(x, y, weight, axis, options).with_operation("ragged::linear_fit")
}

fn linear_fit_impl(
    x: &Content,
    y: &Content,
    weight: Option<&Content>,
    axis: Option<i64>,
    options: &ReduceOptions,
) -> RaggedResult<Item> {
    let options = ReduceOptions {
        mask_identity: Some(options.mask_identity.unwrap_or(true)),
        ..*options
    };
    let total = |array: &Content| sum(array, axis, &options);
    let xx = multiply(x, x)?;
    let xy = multiply(x, y)?;
    let (sumw, sumwx, sumwy, sumwxx, sumwxy) = match weight {
        None => (
            count(x, axis, &options)?,
            total(x)?,
            total(y)?,
            total(&xx)?,
            total(&xy)?,
        ),
        Some(w) => (
            total(&masked_like(x, w)?)?,
            total(&multiply(x, w)?)?,
            total(&multiply(y, w)?)?,
            total(&multiply(&xx, w)?)?,
            total(&multiply(&xy, w)?)?,
        ),
    };

    let calc = |l: &Item, r: &Item, op: BinaryOp| combine_items(l.clone(), r.clone(), op);
    let delta = calc(
        &calc(&sumw, &sumwxx, BinaryOp::Mul)?,
        &calc(&sumwx, &sumwx, BinaryOp::Mul)?,
        BinaryOp::Sub,
    )?;
    let intercept = calc(
        &calc(
            &calc(&sumwxx, &sumwy, BinaryOp::Mul)?,
            &calc(&sumwx, &sumwxy, BinaryOp::Mul)?,
            BinaryOp::Sub,
        )?,
        &delta,
        BinaryOp::Div,
    )?;
    let slope = calc(
        &calc(
            &calc(&sumw, &sumwxy, BinaryOp::Mul)?,
            &calc(&sumwx, &sumwy, BinaryOp::Mul)?,
            BinaryOp::Sub,
        )?,
        &delta,
        BinaryOp::Div,
    )?;
    let intercept_error = sqrt_item(calc(&sumwxx, &delta, BinaryOp::Div)?)?;
    let slope_error = sqrt_item(calc(&sumw, &delta, BinaryOp::Div)?)?;

    fit_record(vec![intercept, slope, intercept_error, slope_error])
}

fn sqrt_item(item: Item) -> RaggedResult<Item> {
    Ok(match item {
        Item::Missing => Item::Missing,
        Item::Scalar(s) => Item::Scalar(Scalar::F64(s.as_f64().sqrt())),
        Item::Array(a) => Item::Array(Arc::new(sqrt(&a)?)),
        Item::Record { fields, values } => Item::Record {
            fields,
            values: values.into_iter().map(sqrt_item).try_collect()?,
        },
        Item::Unknown(form) => Item::Unknown(Arc::new(shape::binary(
            &form,
            &form,
            &|_: PType, _: PType| PType::F64,
        )?)),
        other => ragged_bail!(StructuralMismatch: "cannot take the square root of {}", other),
    })
}

/// Zips the four results into one `LinearFit` record.
fn fit_record(values: Vec<Item>) -> RaggedResult<Item> {
    let fields = LINEAR_FIT_FIELDS.iter().map(|f| f.to_string()).collect_vec();
    let parameters = Parameters::record(LINEAR_FIT_RECORD);

    if let Some(arrays) = values
        .iter()
        .map(|v| v.as_array().cloned())
        .collect::<Option<Vec<_>>>()
    {
        debug!("linear fit over {} groups", arrays.first().map_or(0, |a| a.len()));
        let record = RecordArray::try_new(arrays, Some(fields), None, parameters)?;
        return Ok(Item::Array(Arc::new(Content::Record(record))));
    }

    if let Some(forms) = values
        .iter()
        .map(|v| match v {
            Item::Unknown(form) => Some(form.as_ref().clone()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
    {
        let form = Form::record(fields.into_iter().zip(forms))?.with_parameters(parameters);
        return Ok(Item::Unknown(Arc::new(form)));
    }

    Ok(Item::Record {
        fields: Some(fields),
        values,
    })
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use rstest::rstest;

    use super::*;
    use crate::from_json;
    use crate::test_harness::jagged;

    fn xs() -> Content {
        jagged(vec![vec![0.0, 1.0, 2.0, 3.0], vec![], vec![1.0, 2.0]])
    }

    /// Every point lies on `y = 2x + 1`.
    fn ys() -> Content {
        jagged(vec![vec![1.0, 3.0, 5.0, 7.0], vec![], vec![3.0, 5.0]])
    }

    fn field(item: &Item, name: &str) -> String {
        let Some(array) = item.as_array() else {
            panic!("expected an array of fits");
        };
        array.getitem_field(name).unwrap().to_string()
    }

    #[test]
    fn lines_are_recovered_per_list() {
        let fit = linear_fit(&xs(), &ys(), None, Some(-1), &ReduceOptions::default()).unwrap();
        let Some(array) = fit.as_array() else {
            panic!("expected an array of fits");
        };
        assert_eq!(array.parameters().record_name(), Some(LINEAR_FIT_RECORD));
        assert_eq!(field(&fit, "intercept"), "[1, None, 1]");
        assert_eq!(field(&fit, "slope"), "[2, None, 2]");

        let errors = array.getitem_field("slope_error").unwrap().to_json().unwrap();
        assert_eq!(
            errors,
            serde_json::json!([0.2f64.sqrt(), null, 2.0f64.sqrt()])
        );
    }

    #[test]
    fn no_axis_fits_every_point_at_once() {
        let fit = linear_fit(&xs(), &ys(), None, None, &ReduceOptions::default()).unwrap();
        let Item::Record { fields, values } = fit else {
            panic!("expected a single fit");
        };
        assert_eq!(fields.unwrap(), LINEAR_FIT_FIELDS);
        assert_eq!(values[0].as_f64(), Some(1.0));
        assert_eq!(values[1].as_f64(), Some(2.0));
    }

    #[rstest]
    #[case(Some(-1))]
    #[case(None)]
    fn uniform_weights_change_nothing(#[case] axis: Option<i64>) {
        let ones = jagged(vec![vec![1.0; 4], vec![], vec![1.0; 2]]);
        let options = ReduceOptions::default();
        let weighted = linear_fit(&xs(), &ys(), Some(&ones), axis, &options).unwrap();
        let unweighted = linear_fit(&xs(), &ys(), None, axis, &options).unwrap();
        assert_eq!(weighted.to_string(), unweighted.to_string());
    }

    #[test]
    fn missing_points_and_their_weights_drop_out() {
        let x = from_json("[[0, 1, null, 2]]").unwrap();
        let y = from_json("[[1, 3, null, 5]]").unwrap();
        let w = from_json("[[1, 1, 5, 1]]").unwrap();
        let fit = linear_fit(&x, &y, Some(&w), Some(-1), &ReduceOptions::default()).unwrap();
        assert_eq!(field(&fit, "intercept"), "[1]");
        assert_eq!(field(&fit, "slope"), "[2]");
    }

    #[test]
    fn typetracers_give_the_eager_form() {
        let Item::Unknown(form) = linear_fit(
            &xs().typetracer(),
            &ys().typetracer(),
            None,
            Some(-1),
            &ReduceOptions::default(),
        )
        .unwrap() else {
            panic!("expected an unknown element");
        };
        let eager = linear_fit(&xs(), &ys(), None, Some(-1), &ReduceOptions::default()).unwrap();
        let Some(content) = eager.as_array() else {
            panic!("expected an array");
        };
        assert_eq!(form.as_ref(), &content.form());
    }

    #[test]
    fn coordinates_must_share_a_structure() {
        let short = jagged(vec![vec![1.0]]);
        let err = linear_fit(&xs(), &short, None, Some(-1), &ReduceOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    }
}
