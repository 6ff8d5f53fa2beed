use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use ragged_error::{RaggedResult, ResultExt, ragged_bail, ragged_err};
use ragged_form::{PType, Parameters, shape};

use crate::arrays::compact_option_index;
use crate::compute::FlattenOptions;
use crate::{
    Content, Index, IndexedOptionArray, ListOffsetArray, NumpyArray, NumpyData, RecordArray,
    UnionArray, UnmaskedArray,
};

/// Removes one list level of `array`, or with `axis: None` concatenates all of its leaves.
///
/// `axis=0` removes the missing values of an option at the root and leaves any other array
/// unchanged; deeper axes merge each list with the lists inside it.
pub fn flatten(array: &Content, options: &FlattenOptions) -> RaggedResult<Content> {
    flatten_impl(array, options).with_operation("ragged::flatten")
}

fn flatten_impl(array: &Content, options: &FlattenOptions) -> RaggedResult<Content> {
    let FlattenOptions {
        axis,
        flatten_records,
    } = *options;
    if let Content::TypeTracer(t) = array {
        let form = shape::flatten(t.form(), axis, flatten_records)?;
        let length = (axis.is_some() && form == t.to_form())
            .then(|| t.length())
            .flatten();
        return Ok(Content::TypeTracer(t.with_form(form, length)));
    }
    match axis {
        None => {
            let leaves = array.completely_flatten(flatten_records)?;
            debug!("flatten(axis=None) concatenating {} leaves", leaves.len());
            concatenate(leaves)
        }
        Some(axis) if axis == 0 || shape::maybe_posaxis(array.branch_depth(), axis, 0) == Some(0) => {
            debug!("flatten(axis={axis}) removes missing values at the root");
            array.flatten_outermost()
        }
        Some(axis) => array.flatten(axis),
    }
}

/// One leaf from many: leaves of numbers are concatenated into their common type, a single
/// leaf of any other kind is returned as is and anything else becomes a union of the leaves.
pub fn concatenate(leaves: Vec<Content>) -> RaggedResult<Content> {
    let numbers = leaves
        .iter()
        .map(|leaf| match leaf {
            Content::Numpy(n) if n.inner_shape().is_empty() => Some(n.data()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>();
    if let Some(numbers) = numbers {
        let ptype = numbers
            .iter()
            .map(|data| data.ptype())
            .reduce(PType::promote)
            .unwrap_or(PType::F64);
        return Ok(Content::Numpy(NumpyArray::new(NumpyData::concatenate(
            numbers, ptype,
        ))));
    }
    let leaves = match <[Content; 1]>::try_from(leaves) {
        Ok([only]) => return Ok(only),
        Err(leaves) => leaves,
    };
    let (tags, index): (Vec<i8>, Vec<i64>) = leaves
        .iter()
        .enumerate()
        .flat_map(|(tag, leaf)| (0..leaf.len()).map(move |i| (tag as i8, i as i64)))
        .unzip();
    Ok(Content::Union(UnionArray::try_new(
        Index::from(tags),
        Index::from(index),
        leaves.into_iter().map(Arc::new).collect(),
        Parameters::new(),
    )?))
}

impl Content {
    /// Merges the lists at `axis` into the lists that contain them.
    ///
    /// Unlike [`flatten`] this never removes the outermost level: `axis=0`, or a negative axis
    /// that resolves to it, is an error.
    pub fn flatten(&self, axis: i64) -> RaggedResult<Content> {
        if let Content::TypeTracer(t) = self {
            shape::check_flatten_axis(t.form().minmax_depth(), axis)?;
            let (has_offsets, form) = shape::offsets_and_flattened(t.form(), axis, 0)?;
            let length = if has_offsets { None } else { t.length() };
            return Ok(Content::TypeTracer(t.with_form(form, length)));
        }
        shape::check_flatten_axis(self.minmax_depth(), axis)?;
        let (_, flattened) = self.offsets_and_flattened(axis, 0)?;
        Ok(flattened)
    }

    /// The flattened content at `axis`, and the offsets of the lists it was merged from when
    /// this step removed a list level.
    pub(crate) fn offsets_and_flattened(
        &self,
        axis: i64,
        depth: usize,
    ) -> RaggedResult<(Option<Index>, Content)> {
        if let Content::Numpy(leaf) = self {
            if !leaf.inner_shape().is_empty() {
                return leaf.to_regular().offsets_and_flattened(axis, depth);
            }
        }
        let posaxis = shape::maybe_posaxis(self.branch_depth(), axis, depth);
        if posaxis == Some(depth as i64) {
            ragged_bail!(AxisRange: "axis=0 not allowed for flatten");
        }
        match self {
            Content::Numpy(_) => ragged_bail!(AxisRange: "axis out of range for flatten"),
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_) => {
                let list = self.to_list_offset64()?;
                let (offsets, content) = list.compact()?;
                if posaxis == Some(depth as i64 + 1) {
                    return Ok((Some(offsets), content));
                }
                let (inner, flattened) = content.offsets_and_flattened(axis, depth + 1)?;
                let offsets = match inner {
                    Some(inner) => Index::from(
                        offsets
                            .iter()
                            .map(|o| inner.get(o as usize))
                            .collect_vec(),
                    ),
                    None => offsets,
                };
                Ok((
                    None,
                    Content::ListOffset(ListOffsetArray::new_unchecked(
                        offsets,
                        Arc::new(flattened),
                        self.parameters().clone(),
                    )),
                ))
            }
            Content::Indexed(_) => self.project()?.offsets_and_flattened(axis, depth),
            Content::IndexedOption(_) | Content::ByteMasked(_) | Content::BitMasked(_) => {
                let option_index = self.option_index().unwrap_or_default();
                let (offsets, flattened) = self.project()?.offsets_and_flattened(axis, depth)?;
                match offsets {
                    Some(offsets) => Ok((Some(none_to_empty(&option_index, &offsets)), flattened)),
                    None => Ok((
                        None,
                        Content::IndexedOption(IndexedOptionArray::new_unchecked(
                            compact_option_index(&option_index),
                            Arc::new(flattened),
                            self.parameters().clone(),
                        )),
                    )),
                }
            }
            Content::Unmasked(u) => match u.content().offsets_and_flattened(axis, depth)? {
                (Some(offsets), flattened) => Ok((Some(offsets), flattened)),
                (None, flattened) => Ok((
                    None,
                    Content::Unmasked(UnmaskedArray::new(
                        Arc::new(flattened),
                        self.parameters().clone(),
                    )),
                )),
            },
            Content::Record(r) => {
                if posaxis == Some(depth as i64 + 1) {
                    ragged_bail!(
                        StructuralMismatch: "arrays of records cannot be flattened (but their contents can be; try a different 'axis')"
                    );
                }
                let contents = (0..r.contents().len())
                    .map(|i| {
                        let (offsets, flattened) = r.trimmed(i).offsets_and_flattened(axis, depth)?;
                        if offsets.is_some() {
                            ragged_bail!(
                                StructuralMismatch: "field {:?} was flattened at the level of its record",
                                r.fields()[i]
                            );
                        }
                        Ok(Arc::new(flattened))
                    })
                    .try_collect()?;
                Ok((
                    None,
                    Content::Record(RecordArray::new_unchecked(
                        contents,
                        r.field_names().map(<[String]>::to_vec),
                        r.len(),
                        self.parameters().clone(),
                    )),
                ))
            }
            Content::Union(u) => {
                let results: Vec<(Option<Index>, Content)> = u
                    .contents()
                    .iter()
                    .map(|c| c.offsets_and_flattened(axis, depth))
                    .try_collect()?;
                let has_offsets = results.first().is_some_and(|(o, _)| o.is_some());
                if results.iter().any(|(o, _)| o.is_some() != has_offsets) {
                    ragged_bail!(
                        StructuralMismatch: "union branches disagree on whether axis={} is a list dimension",
                        axis
                    );
                }
                if !has_offsets {
                    return Ok((
                        None,
                        Content::Union(UnionArray::new_unchecked(
                            u.tags().clone(),
                            u.index().clone(),
                            results.into_iter().map(|(_, c)| Arc::new(c)).collect(),
                            self.parameters().clone(),
                        )),
                    ));
                }
                let branch_offsets = results
                    .iter()
                    .map(|(o, _)| o.clone().ok_or_else(|| ragged_err!("branch without offsets")))
                    .collect::<RaggedResult<Vec<Index>>>()?;
                let mut tags = Vec::new();
                let mut index = Vec::new();
                let mut offsets = Vec::with_capacity(u.len() + 1);
                offsets.push(0i64);
                for i in 0..u.len() {
                    let (tag, position) = u.entry(i);
                    let (start, stop) = (
                        branch_offsets[tag].get(position),
                        branch_offsets[tag].get(position + 1),
                    );
                    for j in start..stop {
                        tags.push(tag as i8);
                        index.push(j);
                    }
                    offsets.push(offsets[i] + (stop - start));
                }
                Ok((
                    Some(Index::from(offsets)),
                    Content::Union(UnionArray::new_unchecked(
                        Index::from(tags),
                        Index::from(index),
                        results.into_iter().map(|(_, c)| Arc::new(c)).collect(),
                        self.parameters().clone(),
                    )),
                ))
            }
            Content::TypeTracer(_) => {
                ragged_bail!(NotImplemented: "flatten", "a type tracer below the root")
            }
        }
    }

    /// Every leaf in depth-first order, with missing values and indirections applied.
    ///
    /// Strings are leaves of their own; records are only flattened with `flatten_records`.
    pub fn completely_flatten(&self, flatten_records: bool) -> RaggedResult<Vec<Content>> {
        match self {
            Content::Numpy(leaf) => Ok(vec![Content::Numpy(leaf.ravel())]),
            _ if self.is_string_like() => Ok(vec![self.clone()]),
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_) => {
                let (_, content) = self.to_list_offset64()?.compact()?;
                content.completely_flatten(flatten_records)
            }
            Content::Indexed(_)
            | Content::IndexedOption(_)
            | Content::ByteMasked(_)
            | Content::BitMasked(_)
            | Content::Unmasked(_) => self.project()?.completely_flatten(flatten_records),
            Content::Record(r) => {
                if !flatten_records {
                    ragged_bail!(
                        StructuralMismatch: "cannot completely flatten an array of records unless flatten_records is set"
                    );
                }
                let mut leaves = Vec::new();
                for i in 0..r.contents().len() {
                    leaves.extend(r.trimmed(i).completely_flatten(flatten_records)?);
                }
                Ok(leaves)
            }
            Content::Union(u) => {
                let mut leaves = Vec::new();
                for (tag, content) in u.contents().iter().enumerate() {
                    leaves.extend(
                        content
                            .carry(&u.branch_index(tag), false)?
                            .completely_flatten(flatten_records)?,
                    );
                }
                Ok(leaves)
            }
            Content::TypeTracer(_) => {
                ragged_bail!(NotImplemented: "completely_flatten", "a type tracer")
            }
        }
    }

    /// `flatten(axis=0)`: options and indirections at the root are applied, and unions drop
    /// the elements that are missing in their branches.
    fn flatten_outermost(&self) -> RaggedResult<Content> {
        match self {
            Content::Indexed(_) => self.project()?.flatten_outermost(),
            Content::Union(u) => {
                let masked = u
                    .contents()
                    .iter()
                    .any(|c| c.is_option() && !matches!(c.as_ref(), Content::Unmasked(_)));
                if !masked {
                    return Ok(self.clone());
                }
                let validity = u
                    .contents()
                    .iter()
                    .map(|c| c.validity_mask())
                    .collect::<RaggedResult<Vec<_>>>()?;
                let (tags, index): (Vec<i8>, Vec<i64>) = (0..u.len())
                    .map(|i| u.entry(i))
                    .filter(|(tag, position)| validity[*tag][*position])
                    .map(|(tag, position)| (tag as i8, position as i64))
                    .unzip();
                Ok(Content::Union(UnionArray::new_unchecked(
                    Index::from(tags),
                    Index::from(index),
                    u.contents().to_vec(),
                    self.parameters().clone(),
                )))
            }
            _ if self.is_option() => self.project(),
            _ => Ok(self.clone()),
        }
    }
}

/// The offsets of an option over lists once its missing values are empty lists.
fn none_to_empty(option_index: &[i64], offsets: &Index) -> Index {
    let mut out = Vec::with_capacity(option_index.len() + 1);
    out.push(offsets.first().unwrap_or(0));
    let mut valid = 0usize;
    for (i, position) in option_index.iter().enumerate() {
        let length = if *position < 0 {
            0
        } else {
            valid += 1;
            offsets.get(valid) - offsets.get(valid - 1)
        };
        out.push(out[i] + length);
    }
    Index::from(out)
}
