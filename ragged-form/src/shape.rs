//! The form-level counterpart of every structural operation on a content.
//!
//! Each function returns the form of the content the corresponding operation produces, without
//! looking at any data. Type tracers answer every operation through this module, so the forms
//! built here must agree node for node with the eager operations.

use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedError, RaggedResult, ragged_bail, ragged_err};

use crate::{
    ByteMaskedForm, Form, FormInfo, FormRef, IndexType, IndexedForm, IndexedOptionForm,
    ListForm, ListOffsetForm, NumpyForm, PType, Parameters, RecordForm, RegularForm, UnionForm,
    UnmaskedForm,
};

/// The non-negative axis at `depth` for an `axis` counted from the root or the leaves.
///
/// A negative axis can only be resolved when the tree below does not branch.
pub fn maybe_posaxis(branch_depth: (bool, usize), axis: i64, depth: usize) -> Option<i64> {
    if axis >= 0 {
        return Some(axis);
    }
    let (branching, additional) = branch_depth;
    (!branching).then(|| axis + depth as i64 + additional as i64)
}

/// Checks a flatten `axis` against the min/max depth of the array.
pub fn check_flatten_axis((min, max): (usize, usize), axis: i64) -> RaggedResult<()> {
    let (reach, from_root) = if axis >= 0 {
        ((axis as usize).saturating_add(1), true)
    } else {
        (axis.unsigned_abs() as usize, false)
    };
    if reach > max {
        ragged_bail!(
            AxisRange: "axis={} exceeds the depth of this array ({})",
            axis,
            max
        );
    }
    if min != max && reach > min {
        ragged_bail!(
            DepthAmbiguity: "axis={} is deeper than the shallowest branch of this array (depths {} to {}, counted from the {})",
            axis,
            min,
            max,
            if from_root { "root" } else { "leaves" }
        );
    }
    Ok(())
}

/// The axis of a reduction counted from the leaves, starting at 1 for the innermost dimension.
pub fn reduce_negaxis((branching, depth): (bool, usize), axis: i64) -> RaggedResult<usize> {
    if axis >= 0 {
        if branching {
            ragged_bail!(
                DepthAmbiguity: "cannot use non-negative axis on a nested list structure of variable depth (negative axis counts from the leaves of the tree; non-negative from the root)"
            );
        }
        if axis as usize >= depth {
            ragged_bail!(
                AxisRange: "axis={} exceeds the depth of this array ({})",
                axis,
                depth
            );
        }
        Ok(depth - axis as usize)
    } else {
        let negaxis = axis.unsigned_abs() as usize;
        if !branching && negaxis > depth {
            ragged_bail!(
                AxisRange: "axis={} exceeds the depth of the nested list structure (which is {})",
                axis,
                depth
            );
        }
        Ok(negaxis)
    }
}

fn params(form: &Form) -> Parameters {
    form.parameters().clone()
}

fn list_offset64(content: Form, parameters: Parameters) -> Form {
    Form::ListOffset(ListOffsetForm {
        offsets: IndexType::I64,
        content: Arc::new(content),
        info: FormInfo::with_parameters(parameters),
    })
}

fn indexed_option64(content: Form, parameters: Parameters) -> Form {
    Form::IndexedOption(IndexedOptionForm {
        index: IndexType::I64,
        content: Arc::new(content),
        info: FormInfo::with_parameters(parameters),
    })
}

fn regular(content: Form, size: usize) -> Form {
    Form::Regular(RegularForm::new(size, Arc::new(content), FormInfo::default()))
}

fn record(
    contents: Vec<Form>,
    fields: Option<Vec<String>>,
    parameters: Parameters,
) -> RaggedResult<Form> {
    Ok(Form::Record(RecordForm::try_new(
        contents.into_iter().map(Arc::new).collect(),
        fields,
        FormInfo::with_parameters(parameters),
    )?))
}

fn union64(contents: Vec<Form>, parameters: Parameters) -> RaggedResult<Form> {
    Ok(Form::Union(UnionForm::try_new(
        IndexType::I8,
        IndexType::I64,
        contents.into_iter().map(Arc::new).collect(),
        FormInfo::with_parameters(parameters),
    )?))
}

/// The materialized form behind a virtual form.
fn resolved(form: &Form) -> RaggedResult<&Form> {
    match form {
        Form::Virtual(v) => match &v.form {
            Some(inner) => resolved(inner),
            None => Err(ragged_err!(NotImplemented: "shape", "a VirtualForm whose form is unknown")),
        },
        _ => Ok(form),
    }
}

/// The parameters shared by every form, or none when they disagree.
fn common_parameters<'a>(forms: impl IntoIterator<Item = &'a Form>) -> Parameters {
    let mut forms = forms.into_iter();
    let Some(first) = forms.next() else {
        return Parameters::new();
    };
    if forms.all(|f| f.parameters() == first.parameters()) {
        first.parameters().clone()
    } else {
        Parameters::new()
    }
}

/// The form of a single element.
pub fn element_form(form: &Form) -> RaggedResult<Form> {
    let form = resolved(form)?;
    Ok(match form {
        Form::Numpy(f) => match f.inner_shape.split_first() {
            None => form.clone(),
            Some((_, rest)) => Form::Numpy(NumpyForm::new(f.primitive, rest.to_vec(), FormInfo::default())),
        },
        Form::List(f) => f.content.as_ref().clone(),
        Form::ListOffset(f) => f.content.as_ref().clone(),
        Form::Regular(f) => f.content.as_ref().clone(),
        Form::Record(_) | Form::Union(_) => form.clone(),
        Form::Indexed(f) => element_form(&f.content)?,
        Form::IndexedOption(f) => element_form(&f.content)?,
        Form::ByteMasked(f) => element_form(&f.content)?,
        Form::BitMasked(f) => element_form(&f.content)?,
        Form::Unmasked(f) => element_form(&f.content)?,
        Form::Virtual(_) => unreachable!("resolved"),
    })
}

/// A contiguous range of elements keeps the form of its array.
pub fn getitem_range(form: &Form) -> RaggedResult<Form> {
    Ok(resolved(form)?.clone().with_form_key(None))
}

fn no_field(name: &str, form: &Form) -> RaggedError {
    ragged_err!(IndexRange: "no field {:?} in {}", name, form.class_name())
}

fn no_field_in_leaf(form: &Form) -> RaggedError {
    ragged_err!(IndexRange: "cannot select fields of a {}", form.class_name())
}

fn sorted_fields(record: &RecordForm) -> Option<Vec<&String>> {
    record.fields.as_ref().map(|f| f.iter().sorted().collect())
}

/// The form of `form[name]`, re-wrapped in every list, option and union on the way.
pub fn getitem_field(form: &Form, name: &str) -> RaggedResult<Form> {
    project_fields(form, &|rec: &RecordForm| {
        let index = rec
            .field_index(name)
            .ok_or_else(|| ragged_err!(IndexRange: "no field {:?} in record with fields {:?}", name, rec.fields()))?;
        Ok(rec.contents[index].as_ref().clone())
    })
}

/// The form of `form[names]`: records reduced to the named fields, in the requested order.
pub fn getitem_fields<S: AsRef<str>>(form: &Form, names: &[S]) -> RaggedResult<Form> {
    project_fields(form, &|rec: &RecordForm| {
        let contents: Vec<Form> = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                rec.field_index(name)
                    .map(|i| rec.contents[i].as_ref().clone())
                    .ok_or_else(|| ragged_err!(IndexRange: "no field {:?} in record with fields {:?}", name, rec.fields()))
            })
            .try_collect()?;
        let fields = rec
            .fields
            .as_ref()
            .map(|_| names.iter().map(|n| n.as_ref().to_string()).collect());
        record(contents, fields, rec.info.parameters.clone())
    })
}

fn project_fields(
    form: &Form,
    select: &dyn Fn(&RecordForm) -> RaggedResult<Form>,
) -> RaggedResult<Form> {
    let form = resolved(form)?;
    let inner = |content: &FormRef| project_fields(content, select).map(Arc::new);
    Ok(match form {
        Form::Record(f) => select(f)?,
        Form::List(f) => Form::List(ListForm::try_new(f.starts, f.stops, inner(&f.content)?, FormInfo::default())?),
        Form::ListOffset(f) => Form::ListOffset(ListOffsetForm::try_new(f.offsets, inner(&f.content)?, FormInfo::default())?),
        Form::Regular(f) => Form::Regular(RegularForm::new(f.size, inner(&f.content)?, FormInfo::default())),
        Form::Indexed(f) => Form::Indexed(IndexedForm::try_new(f.index, inner(&f.content)?, FormInfo::default())?),
        Form::IndexedOption(f) => Form::IndexedOption(IndexedOptionForm::try_new(f.index, inner(&f.content)?, FormInfo::default())?),
        Form::ByteMasked(f) => Form::ByteMasked(ByteMaskedForm::try_new(f.mask, inner(&f.content)?, f.valid_when, FormInfo::default())?),
        Form::BitMasked(f) => Form::BitMasked(crate::BitMaskedForm::try_new(
            f.mask,
            inner(&f.content)?,
            f.valid_when,
            f.lsb_order,
            FormInfo::default(),
        )?),
        Form::Unmasked(f) => Form::Unmasked(UnmaskedForm::new(inner(&f.content)?, FormInfo::default())),
        Form::Union(f) => Form::Union(UnionForm::try_new(
            f.tags,
            f.index,
            f.contents.iter().map(inner).try_collect()?,
            FormInfo::default(),
        )?),
        Form::Numpy(_) => return Err(no_field_in_leaf(form)),
        Form::Virtual(_) => unreachable!("resolved"),
    })
}

/// The form of a content gathered by an index.
pub fn carry(form: &Form, allow_lazy: bool) -> RaggedResult<Form> {
    let form = resolved(form)?;
    Ok(match form {
        Form::Numpy(_)
        | Form::List(_)
        | Form::Indexed(_)
        | Form::IndexedOption(_)
        | Form::Union(_) => form.clone().with_form_key(None),
        Form::ListOffset(f) => Form::List(ListForm {
            starts: f.offsets,
            stops: f.offsets,
            content: f.content.clone(),
            info: FormInfo::with_parameters(params(form)),
        }),
        Form::Regular(f) => Form::Regular(RegularForm::new(
            f.size,
            Arc::new(carry(&f.content, allow_lazy)?),
            FormInfo::with_parameters(params(form)),
        )),
        Form::Record(f) => {
            if allow_lazy {
                Form::Indexed(IndexedForm {
                    index: IndexType::I64,
                    content: Arc::new(form.clone().with_form_key(None)),
                    info: FormInfo::default(),
                })
            } else {
                record(
                    f.contents.iter().map(|c| carry(c, false)).try_collect()?,
                    f.fields.clone(),
                    params(form),
                )?
            }
        }
        Form::ByteMasked(f) => Form::ByteMasked(ByteMaskedForm {
            mask: f.mask,
            content: Arc::new(carry(&f.content, allow_lazy)?),
            valid_when: f.valid_when,
            info: FormInfo::with_parameters(params(form)),
        }),
        Form::BitMasked(f) => indexed_option64(f.content.as_ref().clone(), params(form)),
        Form::Unmasked(f) => Form::Unmasked(UnmaskedForm::new(
            Arc::new(carry(&f.content, allow_lazy)?),
            FormInfo::with_parameters(params(form)),
        )),
        Form::Virtual(_) => unreachable!("resolved"),
    })
}

/// The form of an option or indexed node with its missing values removed and its index applied.
pub fn project(form: &Form) -> RaggedResult<Form> {
    let form = resolved(form)?;
    match form {
        Form::Indexed(f) => carry(&f.content, false),
        Form::IndexedOption(f) => carry(&f.content, false),
        Form::ByteMasked(f) => carry(&f.content, false),
        Form::BitMasked(f) => carry(&f.content, false),
        Form::Unmasked(f) => getitem_range(&f.content),
        _ => Ok(form.clone()),
    }
}

/// The form of the compact content of a list-like node once its offsets start at zero.
fn compact_content(form: &Form) -> RaggedResult<Option<Form>> {
    Ok(match resolved(form)? {
        Form::ListOffset(f) => Some(getitem_range(&f.content)?),
        Form::List(f) => Some(carry(&f.content, false)?),
        Form::Regular(f) => Some(getitem_range(&f.content)?),
        _ => None,
    })
}

/// The form of a list-like node as a list with 64-bit offsets starting at zero.
pub fn to_list_offset64(form: &Form) -> RaggedResult<Form> {
    let form = resolved(form)?;
    match compact_content(form)? {
        Some(content) => Ok(list_offset64(content, params(form))),
        None => ragged_bail!(StructuralMismatch: "{} is not a list", form.class_name()),
    }
}

/// The form of a content flattened at `axis`, and whether the step produced offsets.
pub fn offsets_and_flattened(form: &Form, axis: i64, depth: usize) -> RaggedResult<(bool, Form)> {
    let form = resolved(form)?;
    let posaxis = maybe_posaxis(form.branch_depth(), axis, depth);
    if let Form::Numpy(f) = form {
        if !f.inner_shape.is_empty() {
            return offsets_and_flattened(&f.to_regular_form(), axis, depth);
        }
    }
    if posaxis == Some(depth as i64) {
        ragged_bail!(AxisRange: "axis=0 not allowed for flatten");
    }
    match form {
        Form::Numpy(_) => ragged_bail!(AxisRange: "axis out of range for flatten"),
        Form::List(_) | Form::ListOffset(_) | Form::Regular(_) => {
            let content = compact_content(form)?.ok_or_else(|| ragged_err!("list without content"))?;
            if posaxis == Some(depth as i64 + 1) {
                Ok((true, content))
            } else {
                let (_, flattened) = offsets_and_flattened(&content, axis, depth + 1)?;
                Ok((false, list_offset64(flattened, params(form))))
            }
        }
        Form::Indexed(_) => offsets_and_flattened(&project(form)?, axis, depth),
        Form::IndexedOption(_) | Form::ByteMasked(_) | Form::BitMasked(_) => {
            let (has_offsets, flattened) = offsets_and_flattened(&project(form)?, axis, depth)?;
            if has_offsets {
                Ok((true, flattened))
            } else {
                Ok((false, indexed_option64(flattened, params(form))))
            }
        }
        Form::Unmasked(f) => {
            let (has_offsets, flattened) = offsets_and_flattened(&f.content, axis, depth)?;
            if has_offsets {
                Ok((true, flattened))
            } else {
                Ok((
                    false,
                    Form::Unmasked(UnmaskedForm::new(Arc::new(flattened), FormInfo::with_parameters(params(form)))),
                ))
            }
        }
        Form::Record(f) => {
            if posaxis == Some(depth as i64 + 1) {
                ragged_bail!(
                    StructuralMismatch: "arrays of records cannot be flattened (but their contents can be; try a different 'axis')"
                );
            }
            let contents: Vec<Form> = f
                .contents
                .iter()
                .map(|c| offsets_and_flattened(&getitem_range(c)?, axis, depth).map(|(_, flat)| flat))
                .try_collect()?;
            Ok((false, record(contents, f.fields.clone(), params(form))?))
        }
        Form::Union(f) => {
            let results: Vec<(bool, Form)> = f
                .contents
                .iter()
                .map(|c| offsets_and_flattened(c, axis, depth))
                .try_collect()?;
            let has_offsets = results.first().is_some_and(|(has, _)| *has);
            if results.iter().any(|(has, _)| *has != has_offsets) {
                ragged_bail!(
                    StructuralMismatch: "union branches disagree on whether axis={} is a list dimension",
                    axis
                );
            }
            let contents = results.into_iter().map(|(_, flat)| Arc::new(flat)).collect();
            let index = if has_offsets { IndexType::I64 } else { f.index };
            Ok((
                has_offsets,
                Form::Union(UnionForm::try_new(IndexType::I8, index, contents, FormInfo::with_parameters(params(form)))?),
            ))
        }
        Form::Virtual(_) => unreachable!("resolved"),
    }
}

/// The form of a content flattened at `axis` by the content method, which never flattens the
/// outermost dimension.
pub fn content_flatten(form: &Form, axis: i64) -> RaggedResult<Form> {
    check_flatten_axis(form.minmax_depth(), axis)?;
    offsets_and_flattened(form, axis, 0).map(|(_, flattened)| flattened)
}

/// The forms of the leaves of a content, in depth-first order.
pub fn completely_flatten(form: &Form, flatten_records: bool) -> RaggedResult<Vec<Form>> {
    let form = resolved(form)?;
    match form {
        Form::Numpy(f) => Ok(vec![Form::numpy(f.primitive)]),
        _ if form.is_string_like() => Ok(vec![form.clone()]),
        Form::List(_) | Form::ListOffset(_) | Form::Regular(_) => {
            let content = compact_content(form)?.ok_or_else(|| ragged_err!("list without content"))?;
            completely_flatten(&content, flatten_records)
        }
        Form::Indexed(_)
        | Form::IndexedOption(_)
        | Form::ByteMasked(_)
        | Form::BitMasked(_)
        | Form::Unmasked(_) => completely_flatten(&project(form)?, flatten_records),
        Form::Record(f) => {
            if !flatten_records {
                ragged_bail!(
                    StructuralMismatch: "cannot completely flatten an array of records unless flatten_records is set"
                );
            }
            let mut leaves = Vec::new();
            for content in &f.contents {
                leaves.extend(completely_flatten(&getitem_range(content)?, flatten_records)?);
            }
            Ok(leaves)
        }
        Form::Union(f) => {
            let mut leaves = Vec::new();
            for content in &f.contents {
                leaves.extend(completely_flatten(&carry(content, false)?, flatten_records)?);
            }
            Ok(leaves)
        }
        Form::Virtual(_) => unreachable!("resolved"),
    }
}

/// The form of the concatenation of leaves.
pub fn concatenate_leaves(leaves: &[Form]) -> RaggedResult<Form> {
    let ptypes: Option<Vec<PType>> = leaves
        .iter()
        .map(|leaf| match leaf {
            Form::Numpy(f) => Some(f.primitive),
            _ => None,
        })
        .collect();
    match (ptypes, leaves) {
        (Some(ptypes), _) => Ok(Form::numpy(
            ptypes
                .into_iter()
                .reduce(PType::promote)
                .unwrap_or(PType::F64),
        )),
        (None, [only]) => Ok(only.clone()),
        (None, _) => union64(leaves.to_vec(), Parameters::new()),
    }
}

/// The form of the top-level flatten operation.
pub fn flatten(form: &Form, axis: Option<i64>, flatten_records: bool) -> RaggedResult<Form> {
    let form = resolved(form)?;
    match axis {
        None => concatenate_leaves(&completely_flatten(form, flatten_records)?),
        Some(axis) if axis == 0 || maybe_posaxis(form.branch_depth(), axis, 0) == Some(0) => {
            flatten_outermost(form)
        }
        Some(axis) => content_flatten(form, axis),
    }
}

fn flatten_outermost(form: &Form) -> RaggedResult<Form> {
    let form = resolved(form)?;
    match form {
        Form::Indexed(_) => flatten_outermost(&project(form)?),
        Form::Union(f) => {
            let masked = f
                .contents
                .iter()
                .any(|c| c.is_option() && !matches!(c.as_ref(), Form::Unmasked(_)));
            if masked {
                Ok(Form::Union(UnionForm::try_new(
                    IndexType::I8,
                    IndexType::I64,
                    f.contents.clone(),
                    FormInfo::with_parameters(params(form)),
                )?))
            } else {
                Ok(form.clone())
            }
        }
        _ if form.is_option() => project(form),
        _ => Ok(form.clone()),
    }
}

/// The form a union takes once merged into a single content, if its branches allow it.
pub fn simplify_union(form: &Form) -> RaggedResult<Form> {
    let form = resolved(form)?;
    let Form::Union(f) = form else {
        return Ok(form.clone());
    };
    let mut contents: Vec<Form> = f.contents.iter().map(|c| resolved(c).cloned()).try_collect()?;
    let parameters = params(form);
    loop {
        if let [only] = contents.as_slice() {
            return carry(only, false);
        }
        if contents.iter().any(Form::is_option) {
            let inner = contents
                .iter()
                .map(|c| match c {
                    Form::IndexedOption(f) => f.content.as_ref().clone(),
                    Form::ByteMasked(f) => f.content.as_ref().clone(),
                    Form::BitMasked(f) => f.content.as_ref().clone(),
                    Form::Unmasked(f) => f.content.as_ref().clone(),
                    other => other.clone(),
                })
                .collect();
            let simplified = simplify_union(&union64(inner, parameters)?)?;
            return Ok(indexed_option64(simplified, Parameters::new()));
        }
        if contents.iter().any(|c| matches!(c, Form::Indexed(_))) {
            contents = contents
                .into_iter()
                .map(|c| match c {
                    Form::Indexed(f) => f.content.as_ref().clone(),
                    other => other,
                })
                .collect();
            continue;
        }
        if contents
            .iter()
            .any(|c| matches!(c, Form::Numpy(f) if !f.inner_shape.is_empty()))
        {
            contents = contents
                .into_iter()
                .map(|c| match c {
                    Form::Numpy(f) => f.to_regular_form(),
                    other => other,
                })
                .collect();
            continue;
        }
        break;
    }

    if let Some(ptypes) = contents
        .iter()
        .map(|c| match c {
            Form::Numpy(f) => Some(f.primitive),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
    {
        let primitive = ptypes.into_iter().reduce(PType::promote).unwrap_or(PType::F64);
        return Ok(Form::numpy(primitive).with_parameters(common_parameters(&contents)));
    }

    if contents.iter().all(Form::is_list) {
        let inner: Vec<Form> = contents
            .iter()
            .map(|c| compact_content(c)?.ok_or_else(|| ragged_err!("list without content")))
            .try_collect()?;
        let simplified = simplify_union(&union64(inner, Parameters::new())?)?;
        return Ok(list_offset64(simplified, common_parameters(&contents)));
    }

    if let Some(records) = contents
        .iter()
        .map(|c| match c {
            Form::Record(f) => Some(f),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
    {
        if let Some(first) = records.first() {
            let same_fields = records.iter().all(|r| {
                sorted_fields(r) == sorted_fields(first) && r.contents.len() == first.contents.len()
            });
            if same_fields {
                let fields = first.fields();
                let merged: Vec<Form> = fields
                    .iter()
                    .map(|name| {
                        let branches: Vec<Form> = records
                            .iter()
                            .map(|r| {
                                r.content(name)
                                    .map(|c| c.as_ref().clone())
                                    .ok_or_else(|| no_field(name, form))
                            })
                            .try_collect()?;
                        simplify_union(&union64(branches, Parameters::new())?)
                    })
                    .try_collect()?;
                return record(merged, first.fields.clone(), common_parameters(&contents));
            }
        }
    }

    ragged_bail!(
        StructuralMismatch: "cannot merge a union of {} into a single content",
        contents.iter().map(Form::class_name).join(", ")
    )
}

/// The form of a content sliced by a jagged index with `jagged_depth` nested list levels.
pub fn getitem_jagged(form: &Form, jagged_depth: usize) -> RaggedResult<Form> {
    let form = resolved(form)?;
    match form {
        Form::Numpy(f) if !f.inner_shape.is_empty() => {
            getitem_jagged(&f.to_regular_form(), jagged_depth)
        }
        Form::Numpy(_) => ragged_bail!(StructuralMismatch: "too many jagged slice dimensions for array"),
        Form::List(_) | Form::ListOffset(_) | Form::Regular(_) => {
            let content = form.content().ok_or_else(|| ragged_err!("list without content"))?;
            if jagged_depth <= 1 {
                Ok(list_offset64(carry(content, false)?, params(form)))
            } else {
                let compact = compact_content(form)?.ok_or_else(|| ragged_err!("list without content"))?;
                Ok(list_offset64(getitem_jagged(&compact, jagged_depth - 1)?, params(form)))
            }
        }
        Form::Indexed(_) => getitem_jagged(&project(form)?, jagged_depth),
        Form::IndexedOption(_) | Form::ByteMasked(_) | Form::BitMasked(_) | Form::Unmasked(_) => {
            let next = match form {
                Form::Unmasked(f) => carry(&f.content, false)?,
                _ => project(form)?,
            };
            Ok(indexed_option64(getitem_jagged(&next, jagged_depth)?, params(form)))
        }
        Form::Record(f) => record(
            f.contents
                .iter()
                .map(|c| getitem_jagged(&getitem_range(c)?, jagged_depth))
                .try_collect()?,
            f.fields.clone(),
            params(form),
        ),
        Form::Union(f) => Ok(Form::Union(UnionForm::try_new(
            IndexType::I8,
            IndexType::I64,
            f.contents
                .iter()
                .map(|c| getitem_jagged(&carry(c, false)?, jagged_depth).map(Arc::new))
                .try_collect()?,
            FormInfo::with_parameters(params(form)),
        )?)),
        Form::Virtual(_) => unreachable!("resolved"),
    }
}

/// The form of one step of a reduction; `output` maps a leaf type to the reducer's result type.
pub fn reduce_next(
    form: &Form,
    output: &dyn Fn(PType) -> PType,
    negaxis: usize,
    mask: bool,
    keepdims: bool,
) -> RaggedResult<Form> {
    let form = resolved(form)?;
    match form {
        Form::Numpy(f) if !f.inner_shape.is_empty() => {
            reduce_next(&f.to_regular_form(), output, negaxis, mask, keepdims)
        }
        Form::Numpy(f) => {
            if negaxis != 1 {
                ragged_bail!(AxisRange: "axis exceeds the depth of this array");
            }
            let mut out = Form::numpy(output(f.primitive));
            if mask {
                out = Form::ByteMasked(ByteMaskedForm::try_new(
                    IndexType::I8,
                    Arc::new(out),
                    false,
                    FormInfo::default(),
                )?);
            }
            if keepdims {
                out = regular(out, 1);
            }
            Ok(out)
        }
        _ if form.is_string_like() => {
            ragged_bail!(StructuralMismatch: "cannot reduce an array of strings")
        }
        Form::List(_) | Form::ListOffset(_) | Form::Regular(_) => {
            let content = compact_content(form)?.ok_or_else(|| ragged_err!("list without content"))?;
            let (branching, depth) = form.branch_depth();
            if !branching && negaxis == depth {
                let next = carry(&content, false)?;
                let out = list_offset64(reduce_next(&next, output, negaxis - 1, mask, false)?, Parameters::new());
                Ok(if keepdims { regular(out, 1) } else { out })
            } else {
                Ok(list_offset64(
                    reduce_next(&content, output, negaxis, mask, keepdims)?,
                    Parameters::new(),
                ))
            }
        }
        Form::Indexed(_) => reduce_next(&project(form)?, output, negaxis, mask, keepdims),
        Form::IndexedOption(_) | Form::ByteMasked(_) | Form::BitMasked(_) | Form::Unmasked(_) => {
            let content = form.content().ok_or_else(|| ragged_err!("option without content"))?;
            let out = reduce_next(&carry(content, false)?, output, negaxis, mask, keepdims)?;
            let (branching, depth) = form.branch_depth();
            if !branching && negaxis == depth {
                Ok(out)
            } else {
                rewrap_reduced_option(out)
            }
        }
        Form::Record(f) => record(
            f.contents
                .iter()
                .map(|c| reduce_next(&getitem_range(c)?, output, negaxis, mask, keepdims))
                .try_collect()?,
            f.fields.clone(),
            Parameters::new(),
        ),
        Form::Union(_) => {
            let simplified = simplify_union(form)?;
            if matches!(simplified, Form::Union(_)) {
                ragged_bail!(StructuralMismatch: "cannot reduce a union of incompatible types");
            }
            reduce_next(&simplified, output, negaxis, mask, keepdims)
        }
        Form::Virtual(_) => unreachable!("resolved"),
    }
}

fn rewrap_reduced_option(out: Form) -> RaggedResult<Form> {
    match out {
        Form::Regular(_) => rewrap_reduced_option(to_list_offset64(&out)?),
        Form::ListOffset(f) => Ok(list_offset64(
            indexed_option64(f.content.as_ref().clone(), Parameters::new()),
            Parameters::new(),
        )),
        Form::Record(f) => record(
            f.contents
                .iter()
                .map(|c| rewrap_reduced_option(c.as_ref().clone()))
                .try_collect()?,
            f.fields.clone(),
            Parameters::new(),
        ),
        other => ragged_bail!(
            StructuralMismatch: "cannot re-apply missing values to a reduced {}",
            other.class_name()
        ),
    }
}

/// The form of an elementwise operation on two contents of the same structure.
pub fn binary(
    left: &Form,
    right: &Form,
    output: &dyn Fn(PType, PType) -> PType,
) -> RaggedResult<Form> {
    let (left, right) = (resolved(left)?, resolved(right)?);
    match (left, right) {
        (Form::Numpy(l), _) if !l.inner_shape.is_empty() => binary(&l.to_regular_form(), right, output),
        (_, Form::Numpy(r)) if !r.inner_shape.is_empty() => binary(left, &r.to_regular_form(), output),
        (Form::Indexed(_), _) => binary(&project(left)?, right, output),
        (_, Form::Indexed(_)) => binary(left, &project(right)?, output),
        _ if left.is_option() || right.is_option() => {
            let inner = |f: &Form| match f.content() {
                Some(c) if f.is_option() => carry(c, false),
                _ => carry(f, false),
            };
            Ok(indexed_option64(
                binary(&inner(left)?, &inner(right)?, output)?,
                Parameters::new(),
            ))
        }
        (Form::Numpy(l), Form::Numpy(r)) => Ok(Form::numpy(output(l.primitive, r.primitive))),
        _ if left.is_list() && right.is_list() => {
            let lc = compact_content(left)?.ok_or_else(|| ragged_err!("list without content"))?;
            let rc = compact_content(right)?.ok_or_else(|| ragged_err!("list without content"))?;
            Ok(list_offset64(binary(&lc, &rc, output)?, Parameters::new()))
        }
        (Form::Record(l), Form::Record(r)) => {
            let fields = l.fields();
            if r.fields.is_some() != l.fields.is_some() || r.contents.len() != l.contents.len() {
                ragged_bail!(StructuralMismatch: "records with different fields cannot be combined");
            }
            let contents: Vec<Form> = fields
                .iter()
                .zip(&l.contents)
                .map(|(name, lc)| {
                    let rc = r.content(name).ok_or_else(|| no_field(name, right))?;
                    binary(&getitem_range(lc)?, &getitem_range(rc)?, output)
                })
                .try_collect()?;
            record(contents, l.fields.clone(), Parameters::new())
        }
        _ => ragged_bail!(
            StructuralMismatch: "cannot combine {} with {} elementwise",
            left.class_name(),
            right.class_name()
        ),
    }
}

/// The form with every parameter removed, recursively.
pub fn without_parameters(form: &Form) -> Form {
    let strip = |c: &FormRef| Arc::new(without_parameters(c));
    let info = FormInfo {
        parameters: Parameters::new(),
        ..form.info().clone()
    };
    match form {
        Form::Numpy(f) => Form::Numpy(NumpyForm::new(f.primitive, f.inner_shape.clone(), info)),
        Form::List(f) => Form::List(ListForm { starts: f.starts, stops: f.stops, content: strip(&f.content), info }),
        Form::ListOffset(f) => Form::ListOffset(ListOffsetForm { offsets: f.offsets, content: strip(&f.content), info }),
        Form::Regular(f) => Form::Regular(RegularForm::new(f.size, strip(&f.content), info)),
        Form::Record(f) => Form::Record(RecordForm {
            contents: f.contents.iter().map(strip).collect(),
            fields: f.fields.clone(),
            info,
        }),
        Form::Indexed(f) => Form::Indexed(IndexedForm { index: f.index, content: strip(&f.content), info }),
        Form::IndexedOption(f) => Form::IndexedOption(IndexedOptionForm { index: f.index, content: strip(&f.content), info }),
        Form::ByteMasked(f) => Form::ByteMasked(ByteMaskedForm {
            mask: f.mask,
            content: strip(&f.content),
            valid_when: f.valid_when,
            info,
        }),
        Form::BitMasked(f) => Form::BitMasked(crate::BitMaskedForm {
            mask: f.mask,
            content: strip(&f.content),
            valid_when: f.valid_when,
            lsb_order: f.lsb_order,
            info,
        }),
        Form::Unmasked(f) => Form::Unmasked(UnmaskedForm::new(strip(&f.content), info)),
        Form::Union(f) => Form::Union(UnionForm {
            tags: f.tags,
            index: f.index,
            contents: f.contents.iter().map(strip).collect(),
            info,
        }),
        Form::Virtual(f) => Form::Virtual(crate::VirtualForm::new(f.form.as_ref().map(strip), f.has_length, info)),
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use rstest::rstest;

    use super::*;

    fn var(content: Form) -> Form {
        Form::list_offset(IndexType::I64, content).unwrap()
    }

    fn float() -> Form {
        Form::numpy(PType::F64)
    }

    #[rstest]
    #[case((false, 2), -1, 0, Some(1))]
    #[case((false, 2), -2, 0, Some(0))]
    #[case((false, 2), -1, 1, Some(2))]
    #[case((true, 2), -1, 0, None)]
    #[case((true, 2), 3, 0, Some(3))]
    fn posaxis(
        #[case] branch_depth: (bool, usize),
        #[case] axis: i64,
        #[case] depth: usize,
        #[case] expected: Option<i64>,
    ) {
        assert_eq!(maybe_posaxis(branch_depth, axis, depth), expected);
    }

    #[rstest]
    #[case((2, 2), 1, None)]
    #[case((2, 2), 2, Some(ErrorKind::AxisRange))]
    #[case((2, 2), -2, None)]
    #[case((2, 2), -3, Some(ErrorKind::AxisRange))]
    #[case((2, 3), 2, Some(ErrorKind::DepthAmbiguity))]
    #[case((2, 3), -3, Some(ErrorKind::DepthAmbiguity))]
    #[case((2, 3), 1, None)]
    #[case((2, 2), i64::MIN, Some(ErrorKind::AxisRange))]
    #[case((2, 2), i64::MAX, Some(ErrorKind::AxisRange))]
    fn flatten_axis_checks(
        #[case] minmax: (usize, usize),
        #[case] axis: i64,
        #[case] expected: Option<ErrorKind>,
    ) {
        assert_eq!(check_flatten_axis(minmax, axis).err().map(|e| e.kind()), expected);
    }

    #[test]
    fn negaxis_normalization() {
        assert_eq!(reduce_negaxis((false, 3), 0).unwrap(), 3);
        assert_eq!(reduce_negaxis((false, 3), -1).unwrap(), 1);
        assert_eq!(reduce_negaxis((false, 3), 3).unwrap_err().kind(), ErrorKind::AxisRange);
        assert_eq!(reduce_negaxis((true, 2), 0).unwrap_err().kind(), ErrorKind::DepthAmbiguity);
        assert_eq!(
            reduce_negaxis((false, 3), i64::MIN).unwrap_err().kind(),
            ErrorKind::AxisRange
        );
    }

    #[test]
    fn carry_turns_offsets_into_starts_and_stops() {
        let carried = carry(&var(float()), false).unwrap();
        assert_eq!(carried, Form::list(IndexType::I64, IndexType::I64, float()).unwrap());
        let rec = Form::record([("x", float())]).unwrap();
        assert!(matches!(carry(&rec, true).unwrap(), Form::Indexed(_)));
        assert_eq!(carry(&rec, false).unwrap(), rec);
    }

    #[test]
    fn flatten_forms() {
        let nested = var(var(float()));
        assert_eq!(content_flatten(&nested, 1).unwrap(), var(float()));
        assert_eq!(content_flatten(&nested, 2).unwrap(), var(float()));
        assert_eq!(
            content_flatten(&nested, 0).unwrap_err().kind(),
            ErrorKind::AxisRange
        );
        let option = Form::indexed_option(IndexType::I64, var(float())).unwrap();
        assert_eq!(
            flatten(&option, Some(0), true).unwrap(),
            Form::list(IndexType::I64, IndexType::I64, float()).unwrap()
        );
        assert_eq!(flatten(&option, None, true).unwrap(), float());
    }

    #[test]
    fn field_projection_rewraps_without_parameters() {
        let rec = Form::record([("x", float()), ("y", Form::numpy(PType::I64))])
            .unwrap()
            .with_parameters(Parameters::record("Point"));
        let lists = var(rec).with_parameters(Parameters::record("ignored"));
        assert_eq!(getitem_field(&lists, "y").unwrap(), var(Form::numpy(PType::I64)));
        assert_eq!(
            getitem_field(&lists, "z").unwrap_err().kind(),
            ErrorKind::IndexRange
        );
        let swapped = getitem_fields(&lists, &["y", "x"]).unwrap();
        assert_eq!(swapped.fields(), vec!["y".to_string(), "x".to_string()]);
    }

    #[test]
    fn union_simplification() {
        let ints = Form::numpy(PType::I32);
        let union = Form::union(IndexType::I64, [ints.clone(), float()]).unwrap();
        assert_eq!(simplify_union(&union).unwrap(), float());

        let lists = Form::union(IndexType::I32, [var(ints.clone()), var(float())]).unwrap();
        assert_eq!(simplify_union(&lists).unwrap(), var(float()));

        let mixed = Form::union(IndexType::I64, [ints, var(float())]).unwrap();
        assert_eq!(
            simplify_union(&mixed).unwrap_err().kind(),
            ErrorKind::StructuralMismatch
        );
    }

    #[test]
    fn reduce_forms() {
        let sum = |p: PType| if p.is_float() { p } else { PType::I64 };
        let nested = var(var(Form::numpy(PType::I32)));
        assert_eq!(
            reduce_next(&nested, &sum, 1, false, false).unwrap(),
            var(var(Form::numpy(PType::I64)))
        );
        assert_eq!(
            reduce_next(&nested, &sum, 3, false, true).unwrap(),
            regular(var(var(Form::numpy(PType::I64))), 1)
        );
    }
}
