use std::sync::Arc;

use ragged_error::{RaggedResult, ResultExt, ragged_bail};
use ragged_form::{PType, shape};

use crate::compute::{BinaryOp, ReduceOptions, add, binary, count, subtract, sum};
use crate::{Content, Item, Scalar};

/// The weighted mean along `axis`, `sum(x * weight) / sum(weight)`, or `sum(x) / count(x)`
/// without weights. Weights at missing values of `x` do not count. Groups without values are
/// missing unless `mask_identity` is `Some(false)`, in which case they are NaN.
pub fn mean(
    x: &Content,
    weight: Option<&Content>,
    axis: Option<i64>,
    options: &ReduceOptions,
) -> RaggedResult<Item> {
    mean_impl(x, weight, axis, options).with_operation("ragged::mean")
}

fn mean_impl(
    x: &Content,
    weight: Option<&Content>,
    axis: Option<i64>,
    options: &ReduceOptions,
) -> RaggedResult<Item> {
    let options = ReduceOptions {
        mask_identity: Some(options.mask_identity.unwrap_or(true)),
        ..*options
    };
    let (sumwx, sumw) = match weight {
        Some(weight) => (
            sum(&binary(x, weight, BinaryOp::Mul)?, axis, &options)?,
            sum(&masked_like(x, weight)?, axis, &options)?,
        ),
        None => (sum(x, axis, &options)?, count(x, axis, &options)?),
    };
    combine_items(sumwx, sumw, BinaryOp::Div)
}

/// `x * 0 + weight`: the weights, missing wherever `x` is.
pub(crate) fn masked_like(x: &Content, weight: &Content) -> RaggedResult<Content> {
    add(&subtract(x, x)?, weight)
}

/// Applies `op` to two reducer results of the same shape.
pub(crate) fn combine_items(left: Item, right: Item, op: BinaryOp) -> RaggedResult<Item> {
    Ok(match (left, right) {
        (Item::Missing, _) | (_, Item::Missing) => Item::Missing,
        (Item::Scalar(l), Item::Scalar(r)) => {
            let (l, r) = (l.as_f64(), r.as_f64());
            Item::Scalar(Scalar::F64(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
            }))
        }
        (Item::Array(l), Item::Array(r)) => Item::Array(Arc::new(binary(&l, &r, op)?)),
        (
            Item::Record { fields, values: l },
            Item::Record { values: r, .. },
        ) => Item::Record {
            fields,
            values: l
                .into_iter()
                .zip(r)
                .map(|(l, r)| combine_items(l, r, op))
                .collect::<RaggedResult<_>>()?,
        },
        (Item::Unknown(l), Item::Unknown(r)) => Item::Unknown(Arc::new(shape::binary(
            &l,
            &r,
            &|lt: PType, rt: PType| op.output_ptype(lt, rt),
        )?)),
        (l, r) => ragged_bail!(
            StructuralMismatch: "cannot {} {} and {}",
            op,
            l,
            r
        ),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::from_json;
    use crate::test_harness::jagged;

    fn lists() -> Content {
        jagged(vec![vec![1.0, 2.0, 3.0], vec![], vec![4.0, 5.0]])
    }

    #[test]
    fn unweighted_means_divide_by_counts() {
        let out = mean(&lists(), None, Some(-1), &ReduceOptions::default()).unwrap();
        assert_eq!(out.to_string(), "[2, None, 4.5]");
        let out = mean(&lists(), None, None, &ReduceOptions::default()).unwrap();
        assert_eq!(out.as_f64(), Some(3.0));
        let unmasked = ReduceOptions {
            mask_identity: Some(false),
            ..Default::default()
        };
        let out = mean(&lists(), None, Some(-1), &unmasked).unwrap();
        assert_eq!(out.to_string(), "[2, NaN, 4.5]");
    }

    #[test]
    fn weights_scale_each_value() {
        let weights = jagged(vec![vec![1.0, 1.0, 2.0], vec![], vec![0.0, 1.0]]);
        let out = mean(&lists(), Some(&weights), Some(-1), &ReduceOptions::default()).unwrap();
        assert_eq!(out.to_string(), "[2.25, None, 5]");
        let out = mean(&lists(), Some(&weights), Some(0), &ReduceOptions::default()).unwrap();
        assert_eq!(out.to_string(), "[1, 3.5, 3]");
    }

    #[test]
    fn weights_of_missing_values_are_dropped() {
        let x = from_json("[[1.0, null, 3.0], [2.0]]").unwrap();
        let ones = from_json("[[1, 1, 1], [1]]").unwrap();
        let weighted = mean(&x, Some(&ones), Some(-1), &ReduceOptions::default()).unwrap();
        let unweighted = mean(&x, None, Some(-1), &ReduceOptions::default()).unwrap();
        assert_eq!(weighted.to_string(), "[2, 2]");
        assert_eq!(weighted.to_string(), unweighted.to_string());

        let flat = mean(&x, Some(&ones), None, &ReduceOptions::default()).unwrap();
        assert_eq!(flat.as_f64(), Some(2.0));
    }

    #[test]
    fn typetracers_give_float_forms() {
        let Item::Unknown(form) =
            mean(&lists().typetracer(), None, Some(-1), &ReduceOptions::default()).unwrap()
        else {
            panic!("expected an unknown element");
        };
        let eager = mean(&lists(), None, Some(-1), &ReduceOptions::default()).unwrap();
        let Some(content) = eager.as_array() else {
            panic!("expected an array");
        };
        assert_eq!(form.as_ref(), &content.form());
    }
}
