use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedResult, ragged_bail};
use serde_json::Value;

use crate::{IndexType, PType, ParameterEquality, Parameters};

/// A reference-counted pointer to a [`Form`].
pub type FormRef = Arc<Form>;

/// Metadata shared by every form variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInfo {
    /// Whether the described content carries identities.
    pub has_identifier: bool,
    /// User metadata.
    pub parameters: Parameters,
    /// Opaque identity string used for caching and code generation.
    pub form_key: Option<String>,
}

impl FormInfo {
    /// Metadata carrying only the given parameters.
    pub fn with_parameters(parameters: Parameters) -> Self {
        Self {
            parameters,
            ..Default::default()
        }
    }

    fn equals(&self, other: &FormInfo, eq: &FormEquality) -> bool {
        self.parameters.equals(&other.parameters, eq.parameters)
            && (!eq.form_key || self.form_key == other.form_key)
            && (!eq.identifier || self.has_identifier == other.has_identifier)
    }
}

/// Options controlling [`Form::equals_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormEquality {
    /// How parameters are compared.
    pub parameters: ParameterEquality,
    /// Whether form keys must match.
    pub form_key: bool,
    /// Whether `has_identifier` must match.
    pub identifier: bool,
}

impl Default for FormEquality {
    fn default() -> Self {
        Self {
            parameters: ParameterEquality::Exact,
            form_key: true,
            identifier: true,
        }
    }
}

/// Describes a leaf of primitive values, possibly with a fixed inner shape.
#[derive(Debug, Clone)]
pub struct NumpyForm {
    pub(crate) primitive: PType,
    pub(crate) inner_shape: Vec<usize>,
    pub(crate) info: FormInfo,
}

impl NumpyForm {
    pub fn new(primitive: PType, inner_shape: Vec<usize>, info: FormInfo) -> Self {
        Self {
            primitive,
            inner_shape,
            info,
        }
    }

    pub fn primitive(&self) -> PType {
        self.primitive
    }

    pub fn inner_shape(&self) -> &[usize] {
        &self.inner_shape
    }

    /// The regular-list form of a leaf with an inner shape, the leaf itself otherwise.
    pub fn to_regular_form(&self) -> Form {
        match self.inner_shape.split_first() {
            None => Form::Numpy(self.clone()),
            Some((size, rest)) => {
                let inner = NumpyForm::new(self.primitive, rest.to_vec(), FormInfo::default());
                Form::Regular(RegularForm::new(
                    *size,
                    Arc::new(inner.to_regular_form()),
                    FormInfo::with_parameters(self.info.parameters.clone()),
                ))
            }
        }
    }
}

/// Describes variable-length lists delimited by separate starts and stops.
#[derive(Debug, Clone)]
pub struct ListForm {
    pub(crate) starts: IndexType,
    pub(crate) stops: IndexType,
    pub(crate) content: FormRef,
    pub(crate) info: FormInfo,
}

impl ListForm {
    pub fn try_new(
        starts: IndexType,
        stops: IndexType,
        content: FormRef,
        info: FormInfo,
    ) -> RaggedResult<Self> {
        if !starts.is_list_index() || !stops.is_list_index() {
            ragged_bail!(
                ConstructionContract: "ListForm starts and stops must be one of \"i32\", \"u32\", \"i64\", not {:?} and {:?}",
                starts.name(),
                stops.name()
            );
        }
        Ok(Self {
            starts,
            stops,
            content,
            info,
        })
    }

    pub fn starts(&self) -> IndexType {
        self.starts
    }

    pub fn stops(&self) -> IndexType {
        self.stops
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }
}

/// Describes variable-length lists delimited by one offsets buffer.
#[derive(Debug, Clone)]
pub struct ListOffsetForm {
    pub(crate) offsets: IndexType,
    pub(crate) content: FormRef,
    pub(crate) info: FormInfo,
}

impl ListOffsetForm {
    pub fn try_new(offsets: IndexType, content: FormRef, info: FormInfo) -> RaggedResult<Self> {
        if !offsets.is_list_index() {
            ragged_bail!(
                ConstructionContract: "ListOffsetForm offsets must be one of \"i32\", \"u32\", \"i64\", not {:?}",
                offsets.name()
            );
        }
        Ok(Self {
            offsets,
            content,
            info,
        })
    }

    pub fn offsets(&self) -> IndexType {
        self.offsets
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }
}

/// Describes lists of one fixed size.
#[derive(Debug, Clone)]
pub struct RegularForm {
    pub(crate) size: usize,
    pub(crate) content: FormRef,
    pub(crate) info: FormInfo,
}

impl RegularForm {
    pub fn new(size: usize, content: FormRef, info: FormInfo) -> Self {
        Self {
            size,
            content,
            info,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }
}

/// Describes records with named fields, or tuples when `fields` is `None`.
#[derive(Debug, Clone)]
pub struct RecordForm {
    pub(crate) contents: Vec<FormRef>,
    pub(crate) fields: Option<Vec<String>>,
    pub(crate) info: FormInfo,
}

impl RecordForm {
    pub fn try_new(
        contents: Vec<FormRef>,
        fields: Option<Vec<String>>,
        info: FormInfo,
    ) -> RaggedResult<Self> {
        if let Some(fields) = &fields {
            if fields.len() != contents.len() {
                ragged_bail!(
                    ConstructionContract: "RecordForm has {} fields but {} contents",
                    fields.len(),
                    contents.len()
                );
            }
            if !fields.iter().all_unique() {
                ragged_bail!(ConstructionContract: "RecordForm field names must be unique, got {:?}", fields);
            }
        }
        Ok(Self {
            contents,
            fields,
            info,
        })
    }

    pub fn contents(&self) -> &[FormRef] {
        &self.contents
    }

    /// The explicit field names, `None` for a tuple.
    pub fn field_names(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn is_tuple(&self) -> bool {
        self.fields.is_none()
    }

    /// Field names, with tuple slots named by their position.
    pub fn fields(&self) -> Vec<String> {
        match &self.fields {
            Some(fields) => fields.clone(),
            None => (0..self.contents.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Position of the named field; tuple slots are addressed by their number.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        match &self.fields {
            Some(fields) => fields.iter().position(|f| f == name),
            None => name
                .parse::<usize>()
                .ok()
                .filter(|i| *i < self.contents.len()),
        }
    }

    pub fn content(&self, name: &str) -> Option<&FormRef> {
        self.field_index(name).map(|i| &self.contents[i])
    }
}

/// Describes a lazy gather of its content through an index.
#[derive(Debug, Clone)]
pub struct IndexedForm {
    pub(crate) index: IndexType,
    pub(crate) content: FormRef,
    pub(crate) info: FormInfo,
}

impl IndexedForm {
    pub fn try_new(index: IndexType, content: FormRef, info: FormInfo) -> RaggedResult<Self> {
        if !index.is_list_index() {
            ragged_bail!(
                ConstructionContract: "IndexedForm index must be one of \"i32\", \"u32\", \"i64\", not {:?}",
                index.name()
            );
        }
        Ok(Self {
            index,
            content,
            info,
        })
    }

    pub fn index(&self) -> IndexType {
        self.index
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }
}

/// Describes a gather through an index where negative entries are missing values.
#[derive(Debug, Clone)]
pub struct IndexedOptionForm {
    pub(crate) index: IndexType,
    pub(crate) content: FormRef,
    pub(crate) info: FormInfo,
}

impl IndexedOptionForm {
    pub fn try_new(index: IndexType, content: FormRef, info: FormInfo) -> RaggedResult<Self> {
        if !index.is_option_index() {
            ragged_bail!(
                ConstructionContract: "IndexedOptionForm index must be one of \"i32\", \"i64\", not {:?}",
                index.name()
            );
        }
        Ok(Self {
            index,
            content,
            info,
        })
    }

    pub fn index(&self) -> IndexType {
        self.index
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }
}

/// Describes missing values marked by one byte per element.
#[derive(Debug, Clone)]
pub struct ByteMaskedForm {
    pub(crate) mask: IndexType,
    pub(crate) content: FormRef,
    pub(crate) valid_when: bool,
    pub(crate) info: FormInfo,
}

impl ByteMaskedForm {
    pub fn try_new(
        mask: IndexType,
        content: FormRef,
        valid_when: bool,
        info: FormInfo,
    ) -> RaggedResult<Self> {
        if mask != IndexType::I8 {
            ragged_bail!(
                ConstructionContract: "ByteMaskedForm mask must be \"i8\", not {:?}",
                mask.name()
            );
        }
        Ok(Self {
            mask,
            content,
            valid_when,
            info,
        })
    }

    pub fn mask(&self) -> IndexType {
        self.mask
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }

    pub fn valid_when(&self) -> bool {
        self.valid_when
    }
}

/// Describes missing values marked by one bit per element.
#[derive(Debug, Clone)]
pub struct BitMaskedForm {
    pub(crate) mask: IndexType,
    pub(crate) content: FormRef,
    pub(crate) valid_when: bool,
    pub(crate) lsb_order: bool,
    pub(crate) info: FormInfo,
}

impl BitMaskedForm {
    pub fn try_new(
        mask: IndexType,
        content: FormRef,
        valid_when: bool,
        lsb_order: bool,
        info: FormInfo,
    ) -> RaggedResult<Self> {
        if mask != IndexType::U8 {
            ragged_bail!(
                ConstructionContract: "BitMaskedForm mask must be \"u8\", not {:?}",
                mask.name()
            );
        }
        Ok(Self {
            mask,
            content,
            valid_when,
            lsb_order,
            info,
        })
    }

    pub fn mask(&self) -> IndexType {
        self.mask
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }

    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    pub fn lsb_order(&self) -> bool {
        self.lsb_order
    }
}

/// Describes an option type whose values are never actually missing.
#[derive(Debug, Clone)]
pub struct UnmaskedForm {
    pub(crate) content: FormRef,
    pub(crate) info: FormInfo,
}

impl UnmaskedForm {
    pub fn new(content: FormRef, info: FormInfo) -> Self {
        Self { content, info }
    }

    pub fn content(&self) -> &FormRef {
        &self.content
    }
}

/// Describes a tagged union of several contents.
#[derive(Debug, Clone)]
pub struct UnionForm {
    pub(crate) tags: IndexType,
    pub(crate) index: IndexType,
    pub(crate) contents: Vec<FormRef>,
    pub(crate) info: FormInfo,
}

impl UnionForm {
    pub fn try_new(
        tags: IndexType,
        index: IndexType,
        contents: Vec<FormRef>,
        info: FormInfo,
    ) -> RaggedResult<Self> {
        if tags != IndexType::I8 {
            ragged_bail!(
                ConstructionContract: "UnionForm tags must be \"i8\", not {:?}",
                tags.name()
            );
        }
        if !index.is_list_index() {
            ragged_bail!(
                ConstructionContract: "UnionForm index must be one of \"i32\", \"u32\", \"i64\", not {:?}",
                index.name()
            );
        }
        if contents.len() > i8::MAX as usize {
            ragged_bail!(ConstructionContract: "UnionForm supports at most {} contents", i8::MAX);
        }
        Ok(Self {
            tags,
            index,
            contents,
            info,
        })
    }

    pub fn tags(&self) -> IndexType {
        self.tags
    }

    pub fn index(&self) -> IndexType {
        self.index
    }

    pub fn contents(&self) -> &[FormRef] {
        &self.contents
    }
}

/// Describes a content that is only materialized on demand; its form may be unknown.
#[derive(Debug, Clone)]
pub struct VirtualForm {
    pub(crate) form: Option<FormRef>,
    pub(crate) has_length: bool,
    pub(crate) info: FormInfo,
}

impl VirtualForm {
    pub fn new(form: Option<FormRef>, has_length: bool, info: FormInfo) -> Self {
        Self {
            form,
            has_length,
            info,
        }
    }

    pub fn form(&self) -> Option<&FormRef> {
        self.form.as_ref()
    }

    pub fn has_length(&self) -> bool {
        self.has_length
    }
}

/// The structural description of a content: its node kinds, roles and metadata, but no data.
#[derive(Debug, Clone)]
pub enum Form {
    Numpy(NumpyForm),
    List(ListForm),
    ListOffset(ListOffsetForm),
    Regular(RegularForm),
    Record(RecordForm),
    Indexed(IndexedForm),
    IndexedOption(IndexedOptionForm),
    ByteMasked(ByteMaskedForm),
    BitMasked(BitMaskedForm),
    Unmasked(UnmaskedForm),
    Union(UnionForm),
    Virtual(VirtualForm),
}

/// Apply `$body` to the variant struct of a form, bound as `$f`.
macro_rules! with_variant {
    ($self:expr, |$f:ident| $body:expr) => {
        match $self {
            Form::Numpy($f) => $body,
            Form::List($f) => $body,
            Form::ListOffset($f) => $body,
            Form::Regular($f) => $body,
            Form::Record($f) => $body,
            Form::Indexed($f) => $body,
            Form::IndexedOption($f) => $body,
            Form::ByteMasked($f) => $body,
            Form::BitMasked($f) => $body,
            Form::Unmasked($f) => $body,
            Form::Union($f) => $body,
            Form::Virtual($f) => $body,
        }
    };
}

impl Form {
    /// A one-dimensional leaf.
    pub fn numpy(primitive: PType) -> Self {
        Form::Numpy(NumpyForm::new(primitive, vec![], FormInfo::default()))
    }

    /// A list of `content` delimited by offsets of the given type.
    pub fn list_offset(offsets: IndexType, content: Form) -> RaggedResult<Self> {
        Ok(Form::ListOffset(ListOffsetForm::try_new(
            offsets,
            Arc::new(content),
            FormInfo::default(),
        )?))
    }

    /// A list of `content` delimited by starts and stops of the given types.
    pub fn list(starts: IndexType, stops: IndexType, content: Form) -> RaggedResult<Self> {
        Ok(Form::List(ListForm::try_new(
            starts,
            stops,
            Arc::new(content),
            FormInfo::default(),
        )?))
    }

    /// A list of `content` with a fixed size.
    pub fn regular(size: usize, content: Form) -> Self {
        Form::Regular(RegularForm::new(size, Arc::new(content), FormInfo::default()))
    }

    /// A record with named fields.
    pub fn record<S: Into<String>>(fields: impl IntoIterator<Item = (S, Form)>) -> RaggedResult<Self> {
        let (names, contents): (Vec<String>, Vec<FormRef>) = fields
            .into_iter()
            .map(|(name, form)| (name.into(), Arc::new(form)))
            .unzip();
        Ok(Form::Record(RecordForm::try_new(
            contents,
            Some(names),
            FormInfo::default(),
        )?))
    }

    /// A tuple of positional fields.
    pub fn tuple(contents: impl IntoIterator<Item = Form>) -> Self {
        Form::Record(RecordForm {
            contents: contents.into_iter().map(Arc::new).collect(),
            fields: None,
            info: FormInfo::default(),
        })
    }

    /// An option type where `-1` in an index of the given type marks a missing value.
    pub fn indexed_option(index: IndexType, content: Form) -> RaggedResult<Self> {
        Ok(Form::IndexedOption(IndexedOptionForm::try_new(
            index,
            Arc::new(content),
            FormInfo::default(),
        )?))
    }

    /// A union of the given contents.
    pub fn union(index: IndexType, contents: impl IntoIterator<Item = Form>) -> RaggedResult<Self> {
        Ok(Form::Union(UnionForm::try_new(
            IndexType::I8,
            index,
            contents.into_iter().map(Arc::new).collect(),
            FormInfo::default(),
        )?))
    }

    /// A UTF-8 string, i.e. a list of characters with the string hint.
    pub fn string() -> Self {
        let chars = Form::numpy(PType::U8).with_parameters(Parameters::array(crate::ArrayHint::Char));
        Form::ListOffset(ListOffsetForm {
            offsets: IndexType::I64,
            content: Arc::new(chars),
            info: FormInfo::with_parameters(Parameters::array(crate::ArrayHint::String)),
        })
    }

    /// The class name of the node this form describes.
    pub fn class_name(&self) -> &'static str {
        match self {
            Form::Numpy(_) => "NumpyArray",
            Form::List(_) => "ListArray",
            Form::ListOffset(_) => "ListOffsetArray",
            Form::Regular(_) => "RegularArray",
            Form::Record(_) => "RecordArray",
            Form::Indexed(_) => "IndexedArray",
            Form::IndexedOption(_) => "IndexedOptionArray",
            Form::ByteMasked(_) => "ByteMaskedArray",
            Form::BitMasked(_) => "BitMaskedArray",
            Form::Unmasked(_) => "UnmaskedArray",
            Form::Union(_) => "UnionArray",
            Form::Virtual(_) => "VirtualArray",
        }
    }

    pub fn info(&self) -> &FormInfo {
        with_variant!(self, |f| &f.info)
    }

    fn info_mut(&mut self) -> &mut FormInfo {
        with_variant!(self, |f| &mut f.info)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.info().parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters().get(key)
    }

    pub fn form_key(&self) -> Option<&str> {
        self.info().form_key.as_deref()
    }

    pub fn has_identifier(&self) -> bool {
        self.info().has_identifier
    }

    /// Returns this form with its metadata replaced.
    pub fn with_info(mut self, info: FormInfo) -> Self {
        *self.info_mut() = info;
        self
    }

    /// Returns this form with its parameters replaced.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.info_mut().parameters = parameters;
        self
    }

    /// Returns this form with its form key replaced.
    pub fn with_form_key(mut self, form_key: Option<String>) -> Self {
        self.info_mut().form_key = form_key;
        self
    }

    /// Whether this is a list-like node carrying the string or bytestring hint.
    pub fn is_string_like(&self) -> bool {
        matches!(self, Form::List(_) | Form::ListOffset(_) | Form::Regular(_))
            && self.parameters().is_string_like()
    }

    /// Whether this node is a variable or fixed-length list.
    pub fn is_list(&self) -> bool {
        matches!(self, Form::List(_) | Form::ListOffset(_) | Form::Regular(_))
    }

    /// Whether this node introduces missing values.
    pub fn is_option(&self) -> bool {
        matches!(
            self,
            Form::IndexedOption(_) | Form::ByteMasked(_) | Form::BitMasked(_) | Form::Unmasked(_)
        )
    }

    /// The single child of list, option and indexed nodes.
    pub fn content(&self) -> Option<&FormRef> {
        match self {
            Form::List(f) => Some(&f.content),
            Form::ListOffset(f) => Some(&f.content),
            Form::Regular(f) => Some(&f.content),
            Form::Indexed(f) => Some(&f.content),
            Form::IndexedOption(f) => Some(&f.content),
            Form::ByteMasked(f) => Some(&f.content),
            Form::BitMasked(f) => Some(&f.content),
            Form::Unmasked(f) => Some(&f.content),
            Form::Virtual(f) => f.form.as_ref(),
            Form::Numpy(_) | Form::Record(_) | Form::Union(_) => None,
        }
    }

    /// Structural equality, optionally ignoring parameters.
    pub fn equals(&self, other: &Form, check_parameters: bool) -> bool {
        let eq = FormEquality {
            parameters: if check_parameters {
                ParameterEquality::Exact
            } else {
                ParameterEquality::Ignore
            },
            ..Default::default()
        };
        self.equals_with(other, &eq)
    }

    /// Structural equality under the given options.
    pub fn equals_with(&self, other: &Form, eq: &FormEquality) -> bool {
        if !self.info().equals(other.info(), eq) {
            return false;
        }
        match (self, other) {
            (Form::Numpy(a), Form::Numpy(b)) => {
                a.primitive == b.primitive && a.inner_shape == b.inner_shape
            }
            (Form::List(a), Form::List(b)) => {
                a.starts == b.starts && a.stops == b.stops && a.content.equals_with(&b.content, eq)
            }
            (Form::ListOffset(a), Form::ListOffset(b)) => {
                a.offsets == b.offsets && a.content.equals_with(&b.content, eq)
            }
            (Form::Regular(a), Form::Regular(b)) => {
                a.size == b.size && a.content.equals_with(&b.content, eq)
            }
            (Form::Record(a), Form::Record(b)) => {
                a.fields == b.fields && contents_equal(&a.contents, &b.contents, eq)
            }
            (Form::Indexed(a), Form::Indexed(b)) => {
                a.index == b.index && a.content.equals_with(&b.content, eq)
            }
            (Form::IndexedOption(a), Form::IndexedOption(b)) => {
                a.index == b.index && a.content.equals_with(&b.content, eq)
            }
            (Form::ByteMasked(a), Form::ByteMasked(b)) => {
                a.mask == b.mask
                    && a.valid_when == b.valid_when
                    && a.content.equals_with(&b.content, eq)
            }
            (Form::BitMasked(a), Form::BitMasked(b)) => {
                a.mask == b.mask
                    && a.valid_when == b.valid_when
                    && a.lsb_order == b.lsb_order
                    && a.content.equals_with(&b.content, eq)
            }
            (Form::Unmasked(a), Form::Unmasked(b)) => a.content.equals_with(&b.content, eq),
            (Form::Union(a), Form::Union(b)) => {
                a.tags == b.tags
                    && a.index == b.index
                    && contents_equal(&a.contents, &b.contents, eq)
            }
            (Form::Virtual(a), Form::Virtual(b)) => {
                a.has_length == b.has_length
                    && match (&a.form, &b.form) {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.equals_with(y, eq),
                        _ => false,
                    }
            }
            _ => false,
        }
    }

    /// Whether a content produced with form `other` satisfies this declared form.
    ///
    /// `None` is a wildcard. Form keys and identifiers are not compared.
    pub fn generated_compatibility(&self, other: Option<&Form>) -> bool {
        let Some(other) = other else {
            return true;
        };
        match (self, other) {
            (Form::Virtual(v), _) => v
                .form
                .as_ref()
                .is_none_or(|f| f.generated_compatibility(Some(other))),
            (_, Form::Virtual(v)) => v
                .form
                .as_ref()
                .is_none_or(|f| self.generated_compatibility(Some(f))),
            _ => {
                if self.parameters() != other.parameters() {
                    return false;
                }
                match (self, other) {
                    (Form::Numpy(a), Form::Numpy(b)) => {
                        a.primitive == b.primitive && a.inner_shape == b.inner_shape
                    }
                    (Form::List(a), Form::List(b)) => {
                        a.starts == b.starts
                            && a.stops == b.stops
                            && a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::ListOffset(a), Form::ListOffset(b)) => {
                        a.offsets == b.offsets
                            && a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::Regular(a), Form::Regular(b)) => {
                        a.size == b.size && a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::Record(a), Form::Record(b)) => {
                        a.fields == b.fields
                            && a.contents.len() == b.contents.len()
                            && a.contents
                                .iter()
                                .zip(&b.contents)
                                .all(|(x, y)| x.generated_compatibility(Some(y)))
                    }
                    (Form::Indexed(a), Form::Indexed(b)) => {
                        a.index == b.index && a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::IndexedOption(a), Form::IndexedOption(b)) => {
                        a.index == b.index && a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::ByteMasked(a), Form::ByteMasked(b)) => {
                        a.mask == b.mask
                            && a.valid_when == b.valid_when
                            && a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::BitMasked(a), Form::BitMasked(b)) => {
                        a.mask == b.mask
                            && a.valid_when == b.valid_when
                            && a.lsb_order == b.lsb_order
                            && a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::Unmasked(a), Form::Unmasked(b)) => {
                        a.content.generated_compatibility(Some(&b.content))
                    }
                    (Form::Union(a), Form::Union(b)) => {
                        a.tags == b.tags
                            && a.index == b.index
                            && a.contents.len() == b.contents.len()
                            && a.contents
                                .iter()
                                .zip(&b.contents)
                                .all(|(x, y)| x.generated_compatibility(Some(y)))
                    }
                    _ => false,
                }
            }
        }
    }
}

fn contents_equal(a: &[FormRef], b: &[FormRef], eq: &FormEquality) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals_with(y, eq))
}

impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, true)
    }
}

impl Display for Form {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use ragged_error::ErrorKind;

    use super::*;

    fn is_contract<T>(result: RaggedResult<T>) -> bool {
        matches!(result, Err(e) if e.kind() == ErrorKind::ConstructionContract)
    }

    fn list_of_floats() -> Form {
        Form::list_offset(IndexType::I64, Form::numpy(PType::F64)).unwrap()
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(list_of_floats(), list_of_floats());
        assert_ne!(
            list_of_floats(),
            Form::list_offset(IndexType::I32, Form::numpy(PType::F64)).unwrap()
        );
        assert_ne!(list_of_floats(), Form::regular(3, Form::numpy(PType::F64)));
    }

    #[test]
    fn parameter_equality_is_configurable() {
        let documented = list_of_floats()
            .with_parameters(Parameters::new().with(crate::DOC_KEY, json!("lengths")));
        assert!(!documented.equals(&list_of_floats(), true));
        assert!(documented.equals(&list_of_floats(), false));
        assert!(documented.equals_with(
            &list_of_floats(),
            &FormEquality {
                parameters: ParameterEquality::IgnoreDocumentation,
                ..Default::default()
            }
        ));
    }

    #[test]
    fn form_key_participates_in_equality() {
        let keyed = list_of_floats().with_form_key(Some("node0".to_string()));
        assert_ne!(keyed, list_of_floats());
        assert!(keyed.equals_with(
            &list_of_floats(),
            &FormEquality {
                form_key: false,
                ..Default::default()
            }
        ));
    }

    #[test]
    fn generated_compatibility() {
        let declared = Form::record([("x", list_of_floats()), ("y", Form::numpy(PType::I64))]).unwrap();
        assert!(declared.generated_compatibility(None));
        assert!(declared.generated_compatibility(Some(&declared.clone().with_form_key(Some("k".into())))));
        let other = Form::record([("x", list_of_floats()), ("y", Form::numpy(PType::I32))]).unwrap();
        assert!(!declared.generated_compatibility(Some(&other)));

        let lazy = Form::Virtual(VirtualForm::new(None, true, FormInfo::default()));
        assert!(lazy.generated_compatibility(Some(&declared)));
        assert!(declared.generated_compatibility(Some(&lazy)));
    }

    #[test]
    fn construction_contracts() {
        let numpy = Arc::new(Form::numpy(PType::F64));
        assert!(is_contract(ListForm::try_new(IndexType::I8, IndexType::I64, numpy.clone(), FormInfo::default())));
        assert!(is_contract(ListOffsetForm::try_new(IndexType::U8, numpy.clone(), FormInfo::default())));
        assert!(is_contract(IndexedOptionForm::try_new(IndexType::U32, numpy.clone(), FormInfo::default())));
        assert!(is_contract(ByteMaskedForm::try_new(IndexType::U8, numpy.clone(), true, FormInfo::default())));
        assert!(is_contract(BitMaskedForm::try_new(IndexType::I8, numpy.clone(), true, true, FormInfo::default())));
        assert!(is_contract(UnionForm::try_new(IndexType::I32, IndexType::I64, vec![numpy.clone()], FormInfo::default())));
        assert!(is_contract(RecordForm::try_new(vec![numpy.clone()], Some(vec![]), FormInfo::default())));
        assert!(is_contract(RecordForm::try_new(
            vec![numpy.clone(), numpy],
            Some(vec!["x".into(), "x".into()]),
            FormInfo::default()
        )));
    }

    #[test]
    fn numpy_inner_shape_to_regular() {
        let form = Form::Numpy(NumpyForm::new(PType::I32, vec![3, 5], FormInfo::default()));
        let Form::Numpy(numpy) = &form else { unreachable!() };
        assert_eq!(
            numpy.to_regular_form(),
            Form::regular(3, Form::regular(5, Form::numpy(PType::I32)))
        );
    }
}
