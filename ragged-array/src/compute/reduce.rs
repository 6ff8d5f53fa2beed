use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use ragged_error::{RaggedResult, ResultExt, ragged_bail, ragged_err};
use ragged_form::{NativePType, PType, Parameters, shape};

use crate::arrays::{compact_option_index, valid_carry};
use crate::compute::{ReduceOptions, concatenate};
use crate::{
    ByteMaskedArray, Content, Index, IndexedOptionArray, Item, ListOffsetArray, NumpyArray,
    NumpyData, RecordArray, RegularArray, match_each_numpy_data,
};

/// A reduction of the values in each group of a list level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    Count,
    CountNonzero,
    Sum,
    Prod,
    Any,
    All,
    Min,
    Max,
    ArgMin,
    ArgMax,
}

impl Reducer {
    pub fn name(self) -> &'static str {
        match self {
            Reducer::Count => "count",
            Reducer::CountNonzero => "count_nonzero",
            Reducer::Sum => "sum",
            Reducer::Prod => "prod",
            Reducer::Any => "any",
            Reducer::All => "all",
            Reducer::Min => "min",
            Reducer::Max => "max",
            Reducer::ArgMin => "argmin",
            Reducer::ArgMax => "argmax",
        }
    }

    /// The type of the reduced values for values of type `input`.
    pub fn output_ptype(self, input: PType) -> PType {
        match self {
            Reducer::Count | Reducer::CountNonzero | Reducer::ArgMin | Reducer::ArgMax => {
                PType::I64
            }
            Reducer::Any | Reducer::All => PType::Bool,
            Reducer::Sum | Reducer::Prod if input.is_float() => input,
            Reducer::Sum | Reducer::Prod if input.is_unsigned_int() => PType::U64,
            Reducer::Sum | Reducer::Prod => PType::I64,
            Reducer::Min | Reducer::Max => input,
        }
    }

    /// Whether empty groups are missing rather than the identity when the caller does not say.
    /// Reducers without a meaningful identity default to missing.
    pub fn default_mask_identity(self) -> bool {
        matches!(
            self,
            Reducer::Min | Reducer::Max | Reducer::ArgMin | Reducer::ArgMax
        )
    }

    fn apply(
        self,
        data: &NumpyData,
        parents: &[usize],
        locals: &[i64],
        outlength: usize,
        initial: Option<f64>,
    ) -> NumpyData {
        match_each_numpy_data!(data, |values| reduce_values(
            self,
            values.as_slice(),
            parents,
            locals,
            outlength,
            initial,
            NumpyData::from
        ))
    }
}

impl Display for Reducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Reduces `values` into `outlength` groups; value `i` belongs to group `parents[i]` at
/// position `locals[i]` along the reduced axis.
fn reduce_values<T: NativePType>(
    reducer: Reducer,
    values: &[T],
    parents: &[usize],
    locals: &[i64],
    outlength: usize,
    initial: Option<f64>,
    wrap: fn(Vec<T>) -> NumpyData,
) -> NumpyData {
    let rows = values.iter().copied().zip(parents.iter().copied());
    match reducer {
        Reducer::Count => {
            let mut out = vec![0i64; outlength];
            for p in parents {
                out[*p] += 1;
            }
            NumpyData::from(out)
        }
        Reducer::CountNonzero => {
            let mut out = vec![0i64; outlength];
            for (v, p) in rows {
                if !v.is_zero() {
                    out[p] += 1;
                }
            }
            NumpyData::from(out)
        }
        Reducer::Any => {
            let mut out = vec![false; outlength];
            for (v, p) in rows {
                out[p] |= !v.is_zero();
            }
            NumpyData::from(out)
        }
        Reducer::All => {
            let mut out = vec![true; outlength];
            for (v, p) in rows {
                out[p] &= !v.is_zero();
            }
            NumpyData::from(out)
        }
        Reducer::Sum | Reducer::Prod => {
            let sum = reducer == Reducer::Sum;
            if T::PTYPE.is_float() {
                let mut out = vec![if sum { 0.0f64 } else { 1.0 }; outlength];
                for (v, p) in rows {
                    if sum {
                        out[p] += v.as_f64();
                    } else {
                        out[p] *= v.as_f64();
                    }
                }
                NumpyData::from(out).cast(T::PTYPE)
            } else if T::PTYPE.is_unsigned_int() {
                let mut out = vec![u64::from(!sum); outlength];
                for (v, p) in rows {
                    out[p] = if sum {
                        out[p].wrapping_add(v.as_u64())
                    } else {
                        out[p].wrapping_mul(v.as_u64())
                    };
                }
                NumpyData::from(out)
            } else {
                let mut out = vec![i64::from(!sum); outlength];
                for (v, p) in rows {
                    out[p] = if sum {
                        out[p].wrapping_add(v.as_i64())
                    } else {
                        out[p].wrapping_mul(v.as_i64())
                    };
                }
                NumpyData::from(out)
            }
        }
        Reducer::Min | Reducer::Max => {
            let min = reducer == Reducer::Min;
            let identity = initial.and_then(T::from_f64).unwrap_or_else(|| {
                if min {
                    T::upper_bound()
                } else {
                    T::lower_bound()
                }
            });
            let mut out = vec![identity; outlength];
            for (v, p) in rows {
                if (min && v < out[p]) || (!min && v > out[p]) {
                    out[p] = v;
                }
            }
            wrap(out)
        }
        Reducer::ArgMin | Reducer::ArgMax => {
            let min = reducer == Reducer::ArgMin;
            let mut best: Vec<Option<T>> = vec![None; outlength];
            let mut out = vec![-1i64; outlength];
            for ((v, p), local) in rows.zip(locals) {
                if best[p].is_none_or(|b| if min { v < b } else { v > b }) {
                    best[p] = Some(v);
                    out[p] = *local;
                }
            }
            NumpyData::from(out)
        }
    }
}

/// The parts of a reduction that stay fixed while it descends the tree.
struct Reduction {
    reducer: Reducer,
    mask: bool,
    initial: Option<f64>,
}

impl Reduction {
    /// Reduces `content`, whose element `i` belongs to group `parents[i]`, into `outlength`
    /// groups. `negaxis` counts the reduced level from the leaves, 1 being the leaves
    /// themselves. Parents never decrease.
    fn reduce_next(
        &self,
        content: &Content,
        negaxis: usize,
        parents: &[usize],
        locals: &[i64],
        outlength: usize,
        keepdims: bool,
    ) -> RaggedResult<Content> {
        match content {
            Content::Numpy(n) if !n.inner_shape().is_empty() => {
                self.reduce_next(&n.to_regular(), negaxis, parents, locals, outlength, keepdims)
            }
            Content::Numpy(n) => {
                if negaxis != 1 {
                    ragged_bail!(AxisRange: "axis exceeds the depth of this array");
                }
                let data = self
                    .reducer
                    .apply(n.data(), parents, locals, outlength, self.initial);
                let mut out = Content::Numpy(NumpyArray::new(data));
                if self.mask {
                    let counts = group_counts(parents, outlength);
                    let mask = Index::from(counts.iter().map(|c| i8::from(*c == 0)).collect_vec());
                    out = Content::ByteMasked(ByteMaskedArray::new_unchecked(
                        mask,
                        Arc::new(out),
                        false,
                        Parameters::new(),
                    ));
                }
                if keepdims {
                    out = Content::Regular(RegularArray::new_unchecked(
                        Arc::new(out),
                        1,
                        outlength,
                        Parameters::new(),
                    ));
                }
                Ok(out)
            }
            _ if content.is_string_like() => {
                ragged_bail!(StructuralMismatch: "cannot reduce an array of strings")
            }
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_) => {
                let list = content.to_list_offset64()?;
                let (branching, depth) = content.branch_depth();
                if !branching && negaxis == depth {
                    self.reduce_across_lists(&list, negaxis, parents, locals, outlength, keepdims)
                } else {
                    self.reduce_within_lists(&list, negaxis, parents, outlength, keepdims)
                }
            }
            Content::Indexed(n) => {
                self.reduce_next(&n.project()?, negaxis, parents, locals, outlength, keepdims)
            }
            Content::IndexedOption(_)
            | Content::ByteMasked(_)
            | Content::BitMasked(_)
            | Content::Unmasked(_) => {
                let option_index = content
                    .option_index()
                    .ok_or_else(|| ragged_err!("option without index"))?;
                let inner = content
                    .option_content()
                    .ok_or_else(|| ragged_err!("option without content"))?;
                let valid = option_index
                    .iter()
                    .positions(|i| *i >= 0)
                    .collect_vec();
                let next = inner.carry(&valid_carry(&option_index), false)?;
                let nextparents = valid.iter().map(|i| parents[*i]).collect_vec();
                let nextlocals = valid.iter().map(|i| locals[*i]).collect_vec();
                let out = self.reduce_next(
                    &next,
                    negaxis,
                    &nextparents,
                    &nextlocals,
                    outlength,
                    keepdims,
                )?;
                let (branching, depth) = content.branch_depth();
                if !branching && negaxis == depth {
                    Ok(out)
                } else {
                    rewrap_missing(out, &option_index, parents, outlength)
                }
            }
            Content::Record(r) => {
                let contents = (0..r.contents().len())
                    .map(|i| {
                        self.reduce_next(
                            &r.trimmed(i),
                            negaxis,
                            parents,
                            locals,
                            outlength,
                            keepdims,
                        )
                        .map(Arc::new)
                    })
                    .try_collect()?;
                Ok(Content::Record(RecordArray::new_unchecked(
                    contents,
                    r.field_names().map(<[String]>::to_vec),
                    outlength,
                    Parameters::new(),
                )))
            }
            Content::Union(_) => {
                let simplified = content.simplify_union()?;
                if matches!(simplified, Content::Union(_)) {
                    ragged_bail!(StructuralMismatch: "cannot reduce a union of incompatible types");
                }
                self.reduce_next(&simplified, negaxis, parents, locals, outlength, keepdims)
            }
            Content::TypeTracer(_) => {
                ragged_bail!(NotImplemented: "reduce", "a type tracer below the root")
            }
        }
    }

    /// The reduced axis is this list level: the `j`-th items of all lists in a group are
    /// reduced together, so each group yields a list as long as its longest list.
    fn reduce_across_lists(
        &self,
        list: &ListOffsetArray,
        negaxis: usize,
        parents: &[usize],
        locals: &[i64],
        outlength: usize,
        keepdims: bool,
    ) -> RaggedResult<Content> {
        let offsets = list.offsets();
        let lengths = (0..list.len())
            .map(|i| (offsets.get(i + 1) - offsets.get(i)) as usize)
            .collect_vec();
        let mut maxlen = vec![0usize; outlength];
        for (length, p) in lengths.iter().zip(parents) {
            maxlen[*p] = maxlen[*p].max(*length);
        }
        let outoffsets = offsets_from_counts(&maxlen);

        let mut nextcarry = Vec::new();
        let mut nextparents = Vec::new();
        let mut nextlocals = Vec::new();
        let mut end = 0usize;
        for (group, width) in maxlen.iter().enumerate() {
            let start = end;
            while end < parents.len() && parents[end] == group {
                end += 1;
            }
            for j in 0..*width {
                for i in (start..end).filter(|i| lengths[*i] > j) {
                    nextcarry.push(offsets.get(i) + j as i64);
                    nextparents.push(outoffsets[group] as usize + j);
                    nextlocals.push(locals[i]);
                }
            }
        }

        let next = list.content().carry(&Index::from(nextcarry), false)?;
        let nextlength = outoffsets.last().copied().unwrap_or(0) as usize;
        let out = self.reduce_next(
            &next,
            negaxis - 1,
            &nextparents,
            &nextlocals,
            nextlength,
            false,
        )?;
        let out = Content::ListOffset(ListOffsetArray::new_unchecked(
            Index::from(outoffsets),
            Arc::new(out),
            Parameters::new(),
        ));
        Ok(if keepdims {
            Content::Regular(RegularArray::new_unchecked(
                Arc::new(out),
                1,
                outlength,
                Parameters::new(),
            ))
        } else {
            out
        })
    }

    /// The reduced axis is deeper: every list becomes a group of its own.
    fn reduce_within_lists(
        &self,
        list: &ListOffsetArray,
        negaxis: usize,
        parents: &[usize],
        outlength: usize,
        keepdims: bool,
    ) -> RaggedResult<Content> {
        let offsets = list.offsets();
        let mut nextparents = Vec::with_capacity(list.content().len());
        let mut nextlocals = Vec::with_capacity(list.content().len());
        for i in 0..list.len() {
            let length = offsets.get(i + 1) - offsets.get(i);
            nextparents.extend(std::iter::repeat_n(i, length as usize));
            nextlocals.extend(0..length);
        }
        let out = self.reduce_next(
            list.content(),
            negaxis,
            &nextparents,
            &nextlocals,
            list.len(),
            keepdims,
        )?;
        Ok(Content::ListOffset(ListOffsetArray::new_unchecked(
            Index::from(offsets_from_counts(&group_counts(parents, outlength))),
            Arc::new(out),
            Parameters::new(),
        )))
    }
}

/// Puts the missing values of an option back above a reduced level: each reduced list
/// gains an option over its items, missing wherever the option was.
fn rewrap_missing(
    out: Content,
    option_index: &[i64],
    parents: &[usize],
    outlength: usize,
) -> RaggedResult<Content> {
    match out {
        Content::Regular(r) => rewrap_missing(
            Content::ListOffset(r.to_list_offset64()),
            option_index,
            parents,
            outlength,
        ),
        Content::ListOffset(l) => {
            let option = IndexedOptionArray::try_new(
                compact_option_index(option_index),
                l.content().clone(),
                Parameters::new(),
            )?;
            Ok(Content::ListOffset(ListOffsetArray::try_new(
                Index::from(offsets_from_counts(&group_counts(parents, outlength))),
                Arc::new(Content::IndexedOption(option)),
                Parameters::new(),
            )?))
        }
        Content::Record(r) => {
            let contents = r
                .contents()
                .iter()
                .map(|c| {
                    rewrap_missing(c.as_ref().clone(), option_index, parents, outlength)
                        .map(Arc::new)
                })
                .try_collect()?;
            Ok(Content::Record(RecordArray::new_unchecked(
                contents,
                r.field_names().map(<[String]>::to_vec),
                r.len(),
                Parameters::new(),
            )))
        }
        other => ragged_bail!(
            StructuralMismatch: "cannot re-apply missing values to a reduced {}",
            other.class_name()
        ),
    }
}

fn group_counts(parents: &[usize], outlength: usize) -> Vec<usize> {
    let mut counts = vec![0usize; outlength];
    for p in parents {
        counts[*p] += 1;
    }
    counts
}

fn offsets_from_counts(counts: &[usize]) -> Vec<i64> {
    std::iter::once(0i64)
        .chain(counts.iter().scan(0i64, |total, count| {
            *total += *count as i64;
            Some(*total)
        }))
        .collect()
}

/// Reduces `array` along `axis` with `reducer`; `axis: None` reduces every value to a scalar.
pub fn reduce(
    array: &Content,
    reducer: Reducer,
    axis: Option<i64>,
    options: &ReduceOptions,
) -> RaggedResult<Item> {
    reduce_impl(array, reducer, axis, options).with_operation(format!("ragged::{reducer}"))
}

fn reduce_impl(
    array: &Content,
    reducer: Reducer,
    axis: Option<i64>,
    options: &ReduceOptions,
) -> RaggedResult<Item> {
    if options.initial.is_some() && !matches!(reducer, Reducer::Min | Reducer::Max) {
        ragged_bail!("initial is only supported by min and max, not {}", reducer);
    }
    let reduction = Reduction {
        reducer,
        mask: options
            .mask_identity
            .unwrap_or_else(|| reducer.default_mask_identity()),
        initial: options.initial,
    };

    let (array, axis, keepdims) = match axis {
        None => {
            let flat = match array {
                Content::TypeTracer(t) => Content::TypeTracer(t.with_form(
                    shape::flatten(t.form(), None, options.flatten_records)?,
                    None,
                )),
                _ => concatenate(array.completely_flatten(options.flatten_records)?)?,
            };
            (flat, -1, false)
        }
        Some(axis) => (array.clone(), axis, options.keepdims),
    };

    let negaxis = shape::reduce_negaxis(array.branch_depth(), axis)?;
    debug!("{reducer}(axis={axis}) reduces {negaxis} levels above the leaves");

    if let Content::TypeTracer(t) = &array {
        let form = shape::reduce_next(
            t.form(),
            &|ptype| reducer.output_ptype(ptype),
            negaxis,
            reduction.mask,
            keepdims,
        )?;
        return Ok(Item::Unknown(Arc::new(shape::element_form(&form)?)));
    }

    let parents = vec![0usize; array.len()];
    let locals = (0..array.len() as i64).collect_vec();
    let out = reduction.reduce_next(&array, negaxis, &parents, &locals, 1, keepdims)?;
    out.getitem_at_nowrap(0)
}

/// The number of values in each group.
pub fn count(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::Count, axis, options)
}

/// The number of values in each group that are not zero or false.
pub fn count_nonzero(
    array: &Content,
    axis: Option<i64>,
    options: &ReduceOptions,
) -> RaggedResult<Item> {
    reduce(array, Reducer::CountNonzero, axis, options)
}

pub fn sum(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::Sum, axis, options)
}

pub fn prod(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::Prod, axis, options)
}

/// Whether any value in each group is nonzero.
pub fn any(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::Any, axis, options)
}

/// Whether every value in each group is nonzero.
pub fn all(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::All, axis, options)
}

pub fn min(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::Min, axis, options)
}

pub fn max(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::Max, axis, options)
}

/// The position along `axis` of the smallest value in each group, the first one on ties.
pub fn argmin(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::ArgMin, axis, options)
}

/// The position along `axis` of the largest value in each group, the first one on ties.
pub fn argmax(array: &Content, axis: Option<i64>, options: &ReduceOptions) -> RaggedResult<Item> {
    reduce(array, Reducer::ArgMax, axis, options)
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use rstest::rstest;

    use super::*;
    use crate::Scalar;
    use crate::test_harness::{floats, jagged, strings};

    fn lists() -> Content {
        jagged(vec![vec![1.0, 2.0, 3.0], vec![], vec![4.0, 5.0]])
    }

    fn no_mask() -> ReduceOptions {
        ReduceOptions {
            mask_identity: Some(false),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(Reducer::Sum, Some(-1), "[6, 0, 9]")]
    #[case(Reducer::Sum, Some(1), "[6, 0, 9]")]
    #[case(Reducer::Sum, Some(0), "[5, 7, 3]")]
    #[case(Reducer::Prod, Some(-1), "[6, 1, 20]")]
    #[case(Reducer::Count, Some(-1), "[3, 0, 2]")]
    #[case(Reducer::Count, Some(0), "[2, 2, 1]")]
    #[case(Reducer::Min, Some(-1), "[1, None, 4]")]
    #[case(Reducer::Max, Some(0), "[4, 5, 3]")]
    #[case(Reducer::ArgMax, Some(-1), "[2, None, 1]")]
    #[case(Reducer::Any, Some(-1), "[true, false, true]")]
    #[case(Reducer::All, Some(-1), "[true, true, true]")]
    fn reduces_along_an_axis(
        #[case] reducer: Reducer,
        #[case] axis: Option<i64>,
        #[case] expected: &str,
    ) {
        let out = reduce(&lists(), reducer, axis, &ReduceOptions::default()).unwrap();
        assert_eq!(out.to_string(), expected);
    }

    #[test]
    fn identities_fill_empty_groups_unless_masked() {
        let out = min(&lists(), Some(-1), &no_mask()).unwrap();
        assert_eq!(out.to_string(), "[1, inf, 4]");
        let out = argmin(&lists(), Some(-1), &no_mask()).unwrap();
        assert_eq!(out.to_string(), "[0, -1, 0]");
        let out = sum(
            &lists(),
            Some(-1),
            &ReduceOptions {
                mask_identity: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out.to_string(), "[6, None, 9]");
    }

    #[test]
    fn positions_count_along_the_reduced_axis() {
        let array = jagged(vec![vec![1.0, 2.0, 3.0], vec![], vec![4.0, 0.0]]);
        assert_eq!(
            argmin(&array, Some(0), &ReduceOptions::default())
                .unwrap()
                .to_string(),
            "[0, 2, 0]"
        );
    }

    #[test]
    fn initial_replaces_the_identity_of_min_and_max() {
        let options = ReduceOptions {
            initial: Some(4.5),
            ..no_mask()
        };
        assert_eq!(
            max(&lists(), Some(-1), &options).unwrap().to_string(),
            "[4.5, 4.5, 5]"
        );
        assert_eq!(
            sum(&lists(), Some(-1), &options).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn keepdims_leaves_lists_of_one() {
        let options = ReduceOptions {
            keepdims: true,
            ..Default::default()
        };
        let out = sum(&lists(), Some(-1), &options).unwrap();
        assert_eq!(out.to_string(), "[[6], [0], [9]]");
        let Item::Unknown(form) = sum(&lists().typetracer(), Some(-1), &options).unwrap() else {
            panic!("expected an unknown element");
        };
        let Some(content) = out.as_array() else {
            panic!("expected an array");
        };
        assert_eq!(form.as_ref(), &content.form());
    }

    #[test]
    fn no_axis_reduces_to_a_scalar() {
        assert_eq!(
            sum(&lists(), None, &ReduceOptions::default())
                .unwrap()
                .as_f64(),
            Some(15.0)
        );
        let ints = Content::Numpy(NumpyArray::from(vec![1i32, 2, 3]));
        assert_eq!(
            sum(&ints, None, &ReduceOptions::default())
                .unwrap()
                .as_scalar(),
            Some(Scalar::I64(6))
        );
        let bytes = Content::Numpy(NumpyArray::from(vec![2u8, 200]));
        assert_eq!(
            prod(&bytes, None, &ReduceOptions::default())
                .unwrap()
                .as_scalar(),
            Some(Scalar::U64(400))
        );
        let values = floats(&[0.0, 1.5]);
        assert_eq!(
            any(&values, None, &ReduceOptions::default())
                .unwrap()
                .as_scalar(),
            Some(Scalar::Bool(true))
        );
        assert_eq!(
            all(&values, None, &ReduceOptions::default())
                .unwrap()
                .as_scalar(),
            Some(Scalar::Bool(false))
        );
        assert!(
            max(&jagged(vec![]), None, &ReduceOptions::default())
                .unwrap()
                .is_missing()
        );
    }

    #[test]
    fn missing_lists_stay_missing() {
        let array = Content::IndexedOption(
            IndexedOptionArray::try_new(
                Index::from(vec![0i64, -1, 2]),
                Arc::new(jagged(vec![vec![1.0, 2.0], vec![], vec![3.0]])),
                Parameters::new(),
            )
            .unwrap(),
        );
        assert_eq!(
            sum(&array, Some(-1), &ReduceOptions::default())
                .unwrap()
                .to_string(),
            "[3, None, 3]"
        );
        assert_eq!(
            sum(&array, Some(0), &ReduceOptions::default())
                .unwrap()
                .to_string(),
            "[4, 2]"
        );
    }

    #[test]
    fn records_reduce_field_by_field() {
        let record = RecordArray::from_fields([
            ("x", Arc::new(jagged(vec![vec![1.0, 2.0], vec![3.0]]))),
            ("y", Arc::new(jagged(vec![vec![4.0], vec![]]))),
        ])
        .unwrap();
        let out = sum(&Content::Record(record), Some(-1), &ReduceOptions::default()).unwrap();
        assert_eq!(out.to_string(), "{x: [3, 3], y: [4, 0]}");
    }

    #[test]
    fn unreducible_arrays() {
        assert_eq!(
            sum(&strings(&["a", "b"]), Some(-1), &ReduceOptions::default())
                .unwrap_err()
                .kind(),
            ErrorKind::StructuralMismatch
        );
        assert_eq!(
            sum(&lists(), Some(2), &ReduceOptions::default())
                .unwrap_err()
                .kind(),
            ErrorKind::AxisRange
        );
        assert_eq!(
            sum(&lists(), Some(i64::MIN), &ReduceOptions::default())
                .unwrap_err()
                .kind(),
            ErrorKind::AxisRange
        );
    }

    #[test]
    fn typetracers_follow_the_same_forms() {
        let out = sum(&lists(), Some(-1), &ReduceOptions::default()).unwrap();
        let Item::Unknown(form) =
            sum(&lists().typetracer(), Some(-1), &ReduceOptions::default()).unwrap()
        else {
            panic!("expected an unknown element");
        };
        let Some(content) = out.as_array() else {
            panic!("expected an array");
        };
        assert_eq!(form.as_ref(), &content.form());
    }
}
