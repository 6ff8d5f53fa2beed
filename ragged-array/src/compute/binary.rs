use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedResult, ResultExt, ragged_bail, ragged_err};
use ragged_form::{FormRef, NativePType, PType, Parameters, shape};

use crate::{
    Content, Index, IndexedOptionArray, ListOffsetArray, NumpyArray, NumpyData, RecordArray,
    TypeTracerArray, match_each_numpy_data,
};

/// An elementwise arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// True division, always producing floats.
    Div,
}

impl BinaryOp {
    /// The type of the result for operands of types `left` and `right`.
    pub fn output_ptype(self, left: PType, right: PType) -> PType {
        match (self, left.promote(right)) {
            (BinaryOp::Div, _) => PType::F64,
            (_, PType::Bool) => PType::I64,
            (_, ptype) => ptype,
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "add"),
            BinaryOp::Sub => write!(f, "subtract"),
            BinaryOp::Mul => write!(f, "multiply"),
            BinaryOp::Div => write!(f, "divide"),
        }
    }
}

/// Applies `op` to every pair of values at the same place in `left` and `right`, which must
/// have the same length and the same list and record structure.
///
/// A value missing on either side is missing in the result.
pub fn binary(left: &Content, right: &Content, op: BinaryOp) -> RaggedResult<Content> {
    binary_impl(left, right, op).with_operation(format!("ragged::{op}"))
}

pub fn add(left: &Content, right: &Content) -> RaggedResult<Content> {
    binary(left, right, BinaryOp::Add)
}

pub fn subtract(left: &Content, right: &Content) -> RaggedResult<Content> {
    binary(left, right, BinaryOp::Sub)
}

pub fn multiply(left: &Content, right: &Content) -> RaggedResult<Content> {
    binary(left, right, BinaryOp::Mul)
}

pub fn divide(left: &Content, right: &Content) -> RaggedResult<Content> {
    binary(left, right, BinaryOp::Div)
}

fn binary_impl(left: &Content, right: &Content, op: BinaryOp) -> RaggedResult<Content> {
    if matches!(left, Content::TypeTracer(_)) || matches!(right, Content::TypeTracer(_)) {
        let output = |l: PType, r: PType| op.output_ptype(l, r);
        let form = shape::binary(&left.form(), &right.form(), &output)?;
        let length = match (left, right) {
            (Content::TypeTracer(t), _) => t.length(),
            _ => Some(left.len()),
        };
        return Ok(Content::TypeTracer(TypeTracerArray::new(
            FormRef::new(form),
            length,
        )));
    }
    if left.len() != right.len() {
        ragged_bail!(
            StructuralMismatch: "cannot combine arrays of length {} and {}",
            left.len(),
            right.len()
        );
    }
    apply(left, right, op)
}

fn apply(left: &Content, right: &Content, op: BinaryOp) -> RaggedResult<Content> {
    match (left, right) {
        (Content::Numpy(l), _) if !l.inner_shape().is_empty() => apply(&l.to_regular(), right, op),
        (_, Content::Numpy(r)) if !r.inner_shape().is_empty() => apply(left, &r.to_regular(), op),
        (Content::Indexed(l), _) => apply(&l.project()?, right, op),
        (_, Content::Indexed(r)) => apply(left, &r.project()?, op),
        _ if left.is_option() || right.is_option() => apply_missing(left, right, op),
        (Content::Numpy(l), Content::Numpy(r)) => Ok(Content::Numpy(NumpyArray::new(
            combine(l.data(), r.data(), op),
        ))),
        _ if left.is_list() && right.is_list() => {
            let (l, r) = (left.to_list_offset64()?, right.to_list_offset64()?);
            if l.offsets() != r.offsets() {
                ragged_bail!(StructuralMismatch: "cannot combine lists of different lengths");
            }
            Ok(Content::ListOffset(ListOffsetArray::new_unchecked(
                l.offsets().clone(),
                Arc::new(apply(l.content(), r.content(), op)?),
                Parameters::new(),
            )))
        }
        (Content::Record(l), Content::Record(r)) => {
            if l.is_tuple() != r.is_tuple() || l.contents().len() != r.contents().len() {
                ragged_bail!(StructuralMismatch: "records with different fields cannot be combined");
            }
            let contents = l
                .fields()
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let j = r.field_index(name).ok_or_else(|| {
                        ragged_err!(IndexRange: "no field {:?} in record with fields {:?}", name, r.fields())
                    })?;
                    apply(&l.trimmed(i), &r.trimmed(j), op).map(Arc::new)
                })
                .try_collect()?;
            Ok(Content::Record(RecordArray::new_unchecked(
                contents,
                l.field_names().map(<[String]>::to_vec),
                l.len(),
                Parameters::new(),
            )))
        }
        _ => ragged_bail!(
            StructuralMismatch: "cannot combine {} with {} elementwise",
            left.class_name(),
            right.class_name()
        ),
    }
}

/// Combines the values present on both sides under one option.
fn apply_missing(left: &Content, right: &Content, op: BinaryOp) -> RaggedResult<Content> {
    let positions = |c: &Content| c.option_index().unwrap_or_else(|| (0..c.len() as i64).collect());
    let (lpos, rpos) = (positions(left), positions(right));
    let mut index = Vec::with_capacity(lpos.len());
    let (mut lcarry, mut rcarry) = (Vec::new(), Vec::new());
    for (l, r) in lpos.iter().zip(&rpos) {
        if *l < 0 || *r < 0 {
            index.push(-1i64);
        } else {
            index.push(lcarry.len() as i64);
            lcarry.push(*l);
            rcarry.push(*r);
        }
    }
    let inner = |c: &Content, carry: Vec<i64>| match c.option_content() {
        Some(content) => content.carry(&Index::from(carry), false),
        None => c.carry(&Index::from(carry), false),
    };
    let out = apply(&inner(left, lcarry)?, &inner(right, rcarry)?, op)?;
    Ok(Content::IndexedOption(IndexedOptionArray::new_unchecked(
        Index::from(index),
        Arc::new(out),
        Parameters::new(),
    )))
}

fn combine(left: &NumpyData, right: &NumpyData, op: BinaryOp) -> NumpyData {
    let output = op.output_ptype(left.ptype(), right.ptype());
    if output.is_float() {
        let (l, r) = (as_f64(left), as_f64(right));
        let values = l
            .iter()
            .zip(&r)
            .map(|(a, b)| match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
            })
            .collect_vec();
        NumpyData::from(values).cast(output)
    } else if output.is_unsigned_int() {
        let (l, r) = (as_u64(left), as_u64(right));
        let values = l
            .iter()
            .zip(&r)
            .map(|(a, b)| match op {
                BinaryOp::Add => a.wrapping_add(*b),
                BinaryOp::Sub => a.wrapping_sub(*b),
                BinaryOp::Mul => a.wrapping_mul(*b),
                BinaryOp::Div => a.checked_div(*b).unwrap_or_default(),
            })
            .collect_vec();
        NumpyData::from(values).cast(output)
    } else {
        let (l, r) = (as_i64(left), as_i64(right));
        let values = l
            .iter()
            .zip(&r)
            .map(|(a, b)| match op {
                BinaryOp::Add => a.wrapping_add(*b),
                BinaryOp::Sub => a.wrapping_sub(*b),
                BinaryOp::Mul => a.wrapping_mul(*b),
                BinaryOp::Div => a.checked_div(*b).unwrap_or_default(),
            })
            .collect_vec();
        NumpyData::from(values).cast(output)
    }
}

fn as_f64(data: &NumpyData) -> Vec<f64> {
    match_each_numpy_data!(data, |values| values.iter().map(|v| v.as_f64()).collect())
}

fn as_u64(data: &NumpyData) -> Vec<u64> {
    match_each_numpy_data!(data, |values| values.iter().map(|v| v.as_u64()).collect())
}

fn as_i64(data: &NumpyData) -> Vec<i64> {
    match_each_numpy_data!(data, |values| values.iter().map(|v| v.as_i64()).collect())
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use rstest::rstest;

    use super::*;
    use crate::test_harness::{floats, jagged};

    #[rstest]
    #[case(BinaryOp::Add, "[[2, 4], [], [6]]")]
    #[case(BinaryOp::Sub, "[[0, 0], [], [0]]")]
    #[case(BinaryOp::Mul, "[[1, 4], [], [9]]")]
    #[case(BinaryOp::Div, "[[1, 1], [], [1]]")]
    fn lists_combine_value_by_value(#[case] op: BinaryOp, #[case] expected: &str) {
        let array = jagged(vec![vec![1.0, 2.0], vec![], vec![3.0]]);
        let out = binary(&array, &array, op).unwrap();
        assert_eq!(out.to_string(), expected);
        assert_eq!(
            out.form(),
            shape::binary(&array.form(), &array.form(), &|l, r| op.output_ptype(l, r)).unwrap()
        );
    }

    #[test]
    fn integers_promote_and_divide_into_floats() {
        let small = Content::Numpy(NumpyArray::from(vec![1i8, 2, 3]));
        let wide = Content::Numpy(NumpyArray::from(vec![10i64, 20, 30]));
        let sum = add(&small, &wide).unwrap();
        assert_eq!(sum.form(), ragged_form::Form::numpy(PType::I64));
        assert_eq!(sum.to_string(), "[11, 22, 33]");
        let ratio = divide(&wide, &small).unwrap();
        assert_eq!(ratio.form(), ragged_form::Form::numpy(PType::F64));
        assert_eq!(ratio.to_string(), "[10, 10, 10]");
        let flags = Content::Numpy(NumpyArray::from(vec![true, false, true]));
        assert_eq!(add(&flags, &flags).unwrap().to_string(), "[2, 0, 2]");
    }

    #[test]
    fn missing_on_either_side_is_missing() {
        let options = Content::IndexedOption(
            IndexedOptionArray::try_new(
                Index::from(vec![2i64, -1, 0]),
                floats(&[1.0, 2.0, 3.0]),
                Parameters::new(),
            )
            .unwrap(),
        );
        let out = multiply(&options, &floats(&[2.0, 2.0, 2.0])).unwrap();
        assert_eq!(out.to_string(), "[6, None, 2]");
    }

    #[test]
    fn structures_must_agree() {
        let array = jagged(vec![vec![1.0, 2.0], vec![3.0]]);
        let other = jagged(vec![vec![1.0], vec![2.0, 3.0]]);
        assert_eq!(
            add(&array, &other).unwrap_err().kind(),
            ErrorKind::StructuralMismatch
        );
        assert_eq!(
            add(&array, &floats(&[1.0, 2.0])).unwrap_err().kind(),
            ErrorKind::StructuralMismatch
        );
        assert_eq!(
            add(&array, &floats(&[1.0])).unwrap_err().kind(),
            ErrorKind::StructuralMismatch
        );
    }

    #[test]
    fn typetracers_follow_the_same_forms() {
        let array = jagged(vec![vec![1.0, 2.0], vec![3.0]]);
        let eager = multiply(&array, &array).unwrap();
        let traced = multiply(&array.typetracer(), &array).unwrap();
        assert_eq!(traced.form(), eager.form());
        assert_eq!(traced.len(), 2);
    }
}
