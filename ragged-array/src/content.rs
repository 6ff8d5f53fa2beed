use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use ragged_error::{RaggedResult, ragged_bail, ragged_err};
use ragged_form::{ArrayType, Form, FormRef, Parameters, shape};
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::{
    Backend, BitMaskedArray, ByteMaskedArray, Index, IndexedArray, IndexedOptionArray, Item,
    ListArray, ListOffsetArray, NumpyArray, RecordArray, RegularArray, TypeTracerArray, UnionArray,
    UnmaskedArray,
};

pub type ContentRef = Arc<Content>;

/// A node of a ragged array. Every node is immutable and shares its children.
#[derive(Debug, Clone)]
pub enum Content {
    Numpy(NumpyArray),
    List(ListArray),
    ListOffset(ListOffsetArray),
    Regular(RegularArray),
    Record(RecordArray),
    Indexed(IndexedArray),
    IndexedOption(IndexedOptionArray),
    ByteMasked(ByteMaskedArray),
    BitMasked(BitMaskedArray),
    Unmasked(UnmaskedArray),
    Union(UnionArray),
    TypeTracer(TypeTracerArray),
}

/// Apply `$body` to the node of a content, bound as `$n`.
macro_rules! with_node {
    ($self:expr, |$n:ident| $body:expr) => {
        match $self {
            Content::Numpy($n) => $body,
            Content::List($n) => $body,
            Content::ListOffset($n) => $body,
            Content::Regular($n) => $body,
            Content::Record($n) => $body,
            Content::Indexed($n) => $body,
            Content::IndexedOption($n) => $body,
            Content::ByteMasked($n) => $body,
            Content::BitMasked($n) => $body,
            Content::Unmasked($n) => $body,
            Content::Union($n) => $body,
            Content::TypeTracer($n) => $body,
        }
    };
}

macro_rules! content_from {
    ($T:ty, $variant:ident) => {
        impl From<$T> for Content {
            fn from(node: $T) -> Self {
                Content::$variant(node)
            }
        }
    };
}

content_from!(NumpyArray, Numpy);
content_from!(ListArray, List);
content_from!(ListOffsetArray, ListOffset);
content_from!(RegularArray, Regular);
content_from!(RecordArray, Record);
content_from!(IndexedArray, Indexed);
content_from!(IndexedOptionArray, IndexedOption);
content_from!(ByteMaskedArray, ByteMasked);
content_from!(BitMaskedArray, BitMasked);
content_from!(UnmaskedArray, Unmasked);
content_from!(UnionArray, Union);
content_from!(TypeTracerArray, TypeTracer);

impl Content {
    pub fn len(&self) -> usize {
        with_node!(self, |n| n.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Content::TypeTracer(_) => "TypeTracerArray",
            _ => self.form().class_name(),
        }
    }

    /// The form describing this content, without form keys.
    pub fn form(&self) -> Form {
        match self {
            Content::TypeTracer(t) => t.to_form(),
            Content::Numpy(n) => n.form(),
            Content::List(n) => n.form(),
            Content::ListOffset(n) => n.form(),
            Content::Regular(n) => n.form(),
            Content::Record(n) => n.form(),
            Content::Indexed(n) => n.form(),
            Content::IndexedOption(n) => n.form(),
            Content::ByteMasked(n) => n.form(),
            Content::BitMasked(n) => n.form(),
            Content::Unmasked(n) => n.form(),
            Content::Union(n) => n.form(),
        }
    }

    /// The user-facing type of this array.
    pub fn array_type(&self) -> ArrayType {
        ArrayType::new(self.form().type_(), self.len())
    }

    pub fn parameters(&self) -> &Parameters {
        match self {
            Content::TypeTracer(t) => t.form().parameters(),
            Content::Numpy(n) => n.parameters(),
            Content::List(n) => n.parameters(),
            Content::ListOffset(n) => n.parameters(),
            Content::Regular(n) => n.parameters(),
            Content::Record(n) => n.parameters(),
            Content::Indexed(n) => n.parameters(),
            Content::IndexedOption(n) => n.parameters(),
            Content::ByteMasked(n) => n.parameters(),
            Content::BitMasked(n) => n.parameters(),
            Content::Unmasked(n) => n.parameters(),
            Content::Union(n) => n.parameters(),
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters().get(key)
    }

    /// This node with its own parameters replaced; children are shared.
    pub fn with_parameters(&self, parameters: Parameters) -> Content {
        match self {
            Content::TypeTracer(t) => {
                Content::TypeTracer(t.with_form(t.to_form().with_parameters(parameters), t.length()))
            }
            Content::Numpy(n) => Content::Numpy(n.with_parameters(parameters)),
            Content::List(n) => Content::List(n.with_parameters(parameters)),
            Content::ListOffset(n) => Content::ListOffset(n.with_parameters(parameters)),
            Content::Regular(n) => Content::Regular(n.with_parameters(parameters)),
            Content::Record(n) => Content::Record(n.with_parameters(parameters)),
            Content::Indexed(n) => Content::Indexed(n.with_parameters(parameters)),
            Content::IndexedOption(n) => Content::IndexedOption(n.with_parameters(parameters)),
            Content::ByteMasked(n) => Content::ByteMasked(n.with_parameters(parameters)),
            Content::BitMasked(n) => Content::BitMasked(n.with_parameters(parameters)),
            Content::Unmasked(n) => Content::Unmasked(n.with_parameters(parameters)),
            Content::Union(n) => Content::Union(n.with_parameters(parameters)),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Content::TypeTracer(t) => t.backend(),
            _ => Backend::EAGER,
        }
    }

    /// A type tracer with this content's form and length.
    pub fn typetracer(&self) -> Content {
        match self {
            Content::TypeTracer(_) => self.clone(),
            _ => Content::TypeTracer(TypeTracerArray::new(
                FormRef::new(self.form()),
                Some(self.len()),
            )),
        }
    }

    /// A type tracer with this content's form and no known length.
    pub fn typetracer_unknown_length(&self) -> Content {
        Content::TypeTracer(TypeTracerArray::new(FormRef::new(self.form()), None))
    }

    pub fn purelist_depth(&self) -> i64 {
        self.form().purelist_depth()
    }

    pub fn minmax_depth(&self) -> (usize, usize) {
        self.form().minmax_depth()
    }

    pub fn branch_depth(&self) -> (bool, usize) {
        self.form().branch_depth()
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_)
        )
    }

    pub fn is_option(&self) -> bool {
        matches!(
            self,
            Content::IndexedOption(_)
                | Content::ByteMasked(_)
                | Content::BitMasked(_)
                | Content::Unmasked(_)
        )
    }

    pub fn is_string_like(&self) -> bool {
        self.is_list() && self.parameters().is_string_like()
    }

    /// Element `at`, counting from the end when negative.
    pub fn getitem_at(&self, at: i64) -> RaggedResult<Item> {
        let len = self.len() as i64;
        let known = !matches!(self, Content::TypeTracer(t) if t.length().is_none());
        let i = if at < 0 { at + len } else { at };
        if known && (i < 0 || i >= len) {
            ragged_bail!(IndexRange: "index {} is out of range for an array of length {}", at, len);
        }
        self.getitem_at_nowrap(i.max(0) as usize)
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        match self {
            Content::Numpy(n) => Ok(n.getitem_at_nowrap(i)),
            Content::List(n) => n.getitem_at_nowrap(i),
            Content::ListOffset(n) => n.getitem_at_nowrap(i),
            Content::Regular(n) => Ok(n.getitem_at_nowrap(i)),
            Content::Record(n) => n.getitem_at_nowrap(i),
            Content::Indexed(n) => n.getitem_at_nowrap(i),
            Content::IndexedOption(n) => n.getitem_at_nowrap(i),
            Content::ByteMasked(n) => n.getitem_at_nowrap(i),
            Content::BitMasked(n) => n.getitem_at_nowrap(i),
            Content::Unmasked(n) => n.getitem_at_nowrap(i),
            Content::Union(n) => n.getitem_at_nowrap(i),
            Content::TypeTracer(t) => Ok(Item::Unknown(FormRef::new(shape::element_form(
                t.form(),
            )?))),
        }
    }

    /// The elements in `start..stop`, with Python slice semantics: negative bounds count from
    /// the end and out-of-range bounds are clamped.
    pub fn getitem_range(&self, start: Option<i64>, stop: Option<i64>) -> RaggedResult<Content> {
        if let Content::TypeTracer(t) = self {
            if t.length().is_none() {
                return Ok(Content::TypeTracer(
                    t.with_form(shape::getitem_range(t.form())?, None),
                ));
            }
        }
        let len = self.len() as i64;
        let clamp = |bound: i64| {
            let bound = if bound < 0 { bound + len } else { bound };
            bound.clamp(0, len) as usize
        };
        let start = start.map_or(0, clamp);
        let stop = stop.map_or(len as usize, clamp).max(start);
        Ok(self.getitem_range_nowrap(start, stop))
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Content {
        match self {
            Content::Numpy(n) => Content::Numpy(n.getitem_range_nowrap(start, stop)),
            Content::List(n) => Content::List(n.getitem_range_nowrap(start, stop)),
            Content::ListOffset(n) => Content::ListOffset(n.getitem_range_nowrap(start, stop)),
            Content::Regular(n) => Content::Regular(n.getitem_range_nowrap(start, stop)),
            Content::Record(n) => Content::Record(n.getitem_range_nowrap(start, stop)),
            Content::Indexed(n) => Content::Indexed(n.getitem_range_nowrap(start, stop)),
            Content::IndexedOption(n) => {
                Content::IndexedOption(n.getitem_range_nowrap(start, stop))
            }
            Content::ByteMasked(n) => Content::ByteMasked(n.getitem_range_nowrap(start, stop)),
            Content::BitMasked(n) => Content::BitMasked(n.getitem_range_nowrap(start, stop)),
            Content::Unmasked(n) => Content::Unmasked(n.getitem_range_nowrap(start, stop)),
            Content::Union(n) => Content::Union(n.getitem_range_nowrap(start, stop)),
            Content::TypeTracer(t) => Content::TypeTracer(
                t.with_form(t.to_form().with_form_key(None), Some(stop - start)),
            ),
        }
    }

    /// Gathers the elements at `carry`. With `allow_lazy`, records are wrapped in an
    /// [`IndexedArray`] instead of gathering every field.
    pub fn carry(&self, carry: &Index, allow_lazy: bool) -> RaggedResult<Content> {
        let known = !matches!(self, Content::TypeTracer(t) if t.length().is_none());
        let len = self.len() as i64;
        if known {
            if let Some(bad) = carry.iter().find(|c| *c < 0 || *c >= len) {
                ragged_bail!(
                    IndexRange: "index {} is out of range for {} of length {}",
                    bad,
                    self.class_name(),
                    len
                );
            }
        }
        Ok(match self {
            Content::Numpy(n) => Content::Numpy(n.carry_unchecked(carry)),
            Content::List(n) => Content::List(n.carry_unchecked(carry)?),
            Content::ListOffset(n) => Content::List(n.carry_unchecked(carry)?),
            Content::Regular(n) => Content::Regular(n.carry_unchecked(carry, allow_lazy)?),
            Content::Record(n) => n.carry_unchecked(carry, allow_lazy)?,
            Content::Indexed(n) => Content::Indexed(n.carry_unchecked(carry)?),
            Content::IndexedOption(n) => Content::IndexedOption(n.carry_unchecked(carry)?),
            Content::ByteMasked(n) => Content::ByteMasked(n.carry_unchecked(carry, allow_lazy)?),
            Content::BitMasked(n) => Content::IndexedOption(n.carry_unchecked(carry)?),
            Content::Unmasked(n) => Content::Unmasked(n.carry_unchecked(carry, allow_lazy)?),
            Content::Union(n) => Content::Union(n.carry_unchecked(carry)?),
            Content::TypeTracer(t) => Content::TypeTracer(
                t.with_form(shape::carry(t.form(), allow_lazy)?, Some(carry.len())),
            ),
        })
    }

    /// The field `name` of every record, re-wrapped in the lists, options and unions above it.
    pub fn getitem_field(&self, name: &str) -> RaggedResult<Content> {
        if let Content::TypeTracer(t) = self {
            return Ok(Content::TypeTracer(
                t.with_form(shape::getitem_field(t.form(), name)?, t.length()),
            ));
        }
        self.project_fields(&|record| record.getitem_field(name))
    }

    /// Records reduced to the named fields, in the requested order.
    pub fn getitem_fields<S: AsRef<str>>(&self, names: &[S]) -> RaggedResult<Content> {
        if let Content::TypeTracer(t) = self {
            return Ok(Content::TypeTracer(
                t.with_form(shape::getitem_fields(t.form(), names)?, t.length()),
            ));
        }
        self.project_fields(&|record| record.getitem_fields(names).map(Content::Record))
    }

    fn project_fields(
        &self,
        select: &dyn Fn(&RecordArray) -> RaggedResult<Content>,
    ) -> RaggedResult<Content> {
        let inner = |content: &ContentRef| content.project_fields(select).map(Arc::new);
        let none = Parameters::new;
        Ok(match self {
            Content::Record(r) => select(r)?,
            Content::List(l) => Content::List(ListArray::new_unchecked(
                l.starts().clone(),
                l.stops().clone(),
                inner(l.content())?,
                none(),
            )),
            Content::ListOffset(l) => Content::ListOffset(ListOffsetArray::new_unchecked(
                l.offsets().clone(),
                inner(l.content())?,
                none(),
            )),
            Content::Regular(r) => Content::Regular(RegularArray::new_unchecked(
                inner(r.content())?,
                r.size(),
                r.len(),
                none(),
            )),
            Content::Indexed(i) => Content::Indexed(IndexedArray::new_unchecked(
                i.index().clone(),
                inner(i.content())?,
                none(),
            )),
            Content::IndexedOption(i) => Content::IndexedOption(IndexedOptionArray::new_unchecked(
                i.index().clone(),
                inner(i.content())?,
                none(),
            )),
            Content::ByteMasked(b) => Content::ByteMasked(ByteMaskedArray::new_unchecked(
                b.mask().clone(),
                inner(b.content())?,
                b.valid_when(),
                none(),
            )),
            Content::BitMasked(b) => Content::BitMasked(BitMaskedArray::try_new(
                b.mask().clone(),
                inner(b.content())?,
                b.valid_when(),
                b.len(),
                b.lsb_order(),
                none(),
            )?),
            Content::Unmasked(u) => Content::Unmasked(UnmaskedArray::new(inner(u.content())?, none())),
            Content::Union(u) => Content::Union(UnionArray::new_unchecked(
                u.tags().clone(),
                u.index().clone(),
                u.contents().iter().map(inner).try_collect()?,
                none(),
            )),
            Content::Numpy(_) => {
                ragged_bail!(IndexRange: "cannot select fields of a {}", self.class_name())
            }
            Content::TypeTracer(_) => {
                ragged_bail!(NotImplemented: "getitem_field", "a type tracer below the root")
            }
        })
    }

    /// Option and indexed nodes with their index applied and missing values removed; any other
    /// node unchanged.
    pub fn project(&self) -> RaggedResult<Content> {
        match self {
            Content::Indexed(n) => n.project(),
            Content::IndexedOption(n) => n.project(),
            Content::ByteMasked(n) => n.project(),
            Content::BitMasked(n) => n.project(),
            Content::Unmasked(n) => Ok(n.project()),
            Content::TypeTracer(t) => {
                let form = t.form();
                let length = if form.is_option() { None } else { t.length() };
                Ok(Content::TypeTracer(t.with_form(shape::project(form)?, length)))
            }
            _ => Ok(self.clone()),
        }
    }

    /// For an option node, the content position of each element, `-1` where it is missing.
    pub(crate) fn option_index(&self) -> Option<Vec<i64>> {
        match self {
            Content::IndexedOption(n) => Some(n.option_index()),
            Content::ByteMasked(n) => Some(n.option_index()),
            Content::BitMasked(n) => Some(n.option_index()),
            Content::Unmasked(n) => Some(n.option_index()),
            _ => None,
        }
    }

    /// The child of an option node.
    pub(crate) fn option_content(&self) -> Option<&ContentRef> {
        match self {
            Content::IndexedOption(n) => Some(n.content()),
            Content::ByteMasked(n) => Some(n.content()),
            Content::BitMasked(n) => Some(n.content()),
            Content::Unmasked(n) => Some(n.content()),
            _ => None,
        }
    }

    /// Whether each element is present; only option nodes have missing elements.
    pub fn validity_mask(&self) -> RaggedResult<Vec<bool>> {
        match self {
            Content::TypeTracer(_) => {
                ragged_bail!(NotImplemented: "validity_mask", "a type tracer")
            }
            _ => Ok(match self.option_index() {
                Some(index) => index.into_iter().map(|i| i >= 0).collect(),
                None => vec![true; self.len()],
            }),
        }
    }

    /// A list-like node as a list with 64-bit offsets starting at zero.
    pub fn to_list_offset64(&self) -> RaggedResult<ListOffsetArray> {
        match self {
            Content::ListOffset(n) => n.to_list_offset64(),
            Content::List(n) => n.to_list_offset64(),
            Content::Regular(n) => Ok(n.to_list_offset64()),
            Content::TypeTracer(_) => {
                ragged_bail!(NotImplemented: "to_list_offset64", "a type tracer below the root")
            }
            _ => ragged_bail!(StructuralMismatch: "{} is not a list", self.class_name()),
        }
    }

    /// Every leaf column with its dot-joined path, in depth-first order.
    ///
    /// Strings are single leaves, list levels push `list_indicator` when given, and a path
    /// reached again through a later union branch is not repeated.
    pub fn leaves(
        &self,
        list_indicator: Option<&str>,
        prefix: &[&str],
    ) -> RaggedResult<Vec<(String, Content)>> {
        let mut path = prefix.iter().map(|s| s.to_string()).collect_vec();
        let mut output = Vec::new();
        let mut seen = FxHashSet::default();
        self.walk_leaves(&mut path, list_indicator, &mut output, &mut seen)?;
        Ok(output)
    }

    fn walk_leaves(
        &self,
        path: &mut Vec<String>,
        list_indicator: Option<&str>,
        output: &mut Vec<(String, Content)>,
        seen: &mut FxHashSet<String>,
    ) -> RaggedResult<()> {
        match self {
            Content::Numpy(_) => emit_leaf(path, self, output, seen),
            _ if self.is_string_like() => emit_leaf(path, self, output, seen),
            Content::List(_) | Content::ListOffset(_) | Content::Regular(_) => {
                let content = self.list_content()?;
                if let Some(indicator) = list_indicator {
                    path.push(indicator.to_string());
                    content.walk_leaves(path, list_indicator, output, seen)?;
                    path.pop();
                } else {
                    content.walk_leaves(path, list_indicator, output, seen)?;
                }
            }
            Content::Record(r) => {
                for (field, content) in r.fields().into_iter().zip(r.contents()) {
                    path.push(field);
                    content.walk_leaves(path, list_indicator, output, seen)?;
                    path.pop();
                }
            }
            Content::Union(u) => {
                for content in u.contents() {
                    content.walk_leaves(path, list_indicator, output, seen)?;
                }
            }
            Content::Indexed(n) => n.content().walk_leaves(path, list_indicator, output, seen)?,
            Content::IndexedOption(_)
            | Content::ByteMasked(_)
            | Content::BitMasked(_)
            | Content::Unmasked(_) => {
                let content = self
                    .option_content()
                    .ok_or_else(|| ragged_err!("option without content"))?;
                content.walk_leaves(path, list_indicator, output, seen)?;
            }
            Content::TypeTracer(_) => {
                ragged_bail!(NotImplemented: "leaves", "a type tracer")
            }
        }
        Ok(())
    }

    /// The child of a list node.
    pub(crate) fn list_content(&self) -> RaggedResult<&ContentRef> {
        match self {
            Content::List(n) => Ok(n.content()),
            Content::ListOffset(n) => Ok(n.content()),
            Content::Regular(n) => Ok(n.content()),
            _ => ragged_bail!(StructuralMismatch: "{} is not a list", self.class_name()),
        }
    }

    /// Every element, one after another.
    pub fn items(&self) -> impl Iterator<Item = RaggedResult<Item>> + '_ {
        (0..self.len()).map(|i| self.getitem_at_nowrap(i))
    }
}

fn emit_leaf(
    path: &[String],
    content: &Content,
    output: &mut Vec<(String, Content)>,
    seen: &mut FxHashSet<String>,
) {
    let joined = path.join(".");
    if seen.insert(joined.clone()) {
        output.push((joined, content.clone()));
    }
}

impl Display for Content {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Content::TypeTracer(t) = self {
            return match t.length() {
                Some(length) => write!(f, "<TypeTracerArray {} * {}>", length, t.form().type_()),
                None => write!(f, "<TypeTracerArray ?? * {}>", t.form().type_()),
            };
        }
        const SHOWN: usize = 20;
        let render = |i: usize| match self.getitem_at_nowrap(i) {
            Ok(item) => item.to_string(),
            Err(_) => "??".to_string(),
        };
        let len = self.len();
        let body = if len <= SHOWN {
            (0..len).map(render).join(", ")
        } else {
            (0..SHOWN / 2)
                .map(render)
                .chain(std::iter::once("...".to_string()))
                .chain((len - SHOWN / 2..len).map(render))
                .join(", ")
        };
        write!(f, "[{body}]")
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use ragged_form::{ArrayHint, IndexType, PType};
    use rstest::rstest;

    use super::*;
    use crate::test_harness::{floats, jagged, strings};

    #[rstest]
    #[case(Some(1), None, 2)]
    #[case(Some(-1), None, 1)]
    #[case(None, Some(-5), 0)]
    #[case(Some(2), Some(1), 0)]
    #[case(Some(-10), Some(10), 3)]
    fn range_bounds_clamp(#[case] start: Option<i64>, #[case] stop: Option<i64>, #[case] len: usize) {
        let array = jagged(vec![vec![1.0, 2.0], vec![], vec![3.0]]);
        assert_eq!(array.getitem_range(start, stop).unwrap().len(), len);
    }

    #[test]
    fn element_access_wraps_negative_indices() {
        let array = jagged(vec![vec![1.0, 2.0], vec![], vec![3.0]]);
        assert_eq!(array.getitem_at(-1).unwrap().to_string(), "[3]");
        assert_eq!(
            array.getitem_at(3).unwrap_err().kind(),
            ErrorKind::IndexRange
        );
        assert_eq!(array.to_string(), "[[1, 2], [], [3]]");
    }

    #[test]
    fn carry_of_offsets_gives_starts_and_stops() {
        let array = jagged(vec![vec![1.0, 2.0], vec![], vec![3.0]]);
        let carried = array.carry(&Index::from(vec![2i64, 0]), false).unwrap();
        assert_eq!(
            carried.form(),
            Form::list(IndexType::I64, IndexType::I64, Form::numpy(PType::F64)).unwrap()
        );
        assert_eq!(carried.to_string(), "[[3], [1, 2]]");
        assert_eq!(
            array
                .carry(&Index::from(vec![3i64]), false)
                .unwrap_err()
                .kind(),
            ErrorKind::IndexRange
        );
    }

    #[test]
    fn fields_are_rewrapped_without_parameters() {
        let record = RecordArray::from_fields([("x", floats(&[1.0, 2.0, 3.0]))]).unwrap();
        let list = Content::ListOffset(
            ListOffsetArray::try_new(
                Index::from(vec![0i64, 2, 3]),
                Arc::new(Content::Record(record)),
                Parameters::record("wrapper"),
            )
            .unwrap(),
        );
        let x = list.getitem_field("x").unwrap();
        assert!(x.parameters().is_empty());
        assert_eq!(x.to_string(), "[[1, 2], [3]]");
        assert_eq!(x.form(), shape::getitem_field(&list.form(), "x").unwrap());
        assert_eq!(
            floats(&[1.0]).getitem_field("x").unwrap_err().kind(),
            ErrorKind::IndexRange
        );
    }

    #[test]
    fn strings_are_single_leaves() {
        let words = strings(&["one", "two"]);
        assert_eq!(words.getitem_at(1).unwrap().as_str(), Some("two"));
        assert!(words.is_string_like());
        let leaves = words.leaves(Some("list"), &["w"]).unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].0, "w");
        assert_eq!(
            words.parameters().array_hint(),
            Some(ArrayHint::String)
        );
    }

    #[test]
    fn leaves_follow_column_paths() {
        let record = RecordArray::from_fields([
            ("a", floats(&[1.0, 2.0])),
            ("b", Arc::new(jagged(vec![vec![1.0], vec![]]))),
        ])
        .unwrap();
        let content = Content::Record(record);
        let paths = content
            .leaves(Some("list"), &[])
            .unwrap()
            .into_iter()
            .map(|(path, _)| path)
            .collect_vec();
        assert_eq!(paths, content.form().columns(Some("list"), &[]));
        assert_eq!(paths, vec!["a".to_string(), "b.list".to_string()]);
    }

    #[test]
    fn typetracers_keep_forms_and_lengths() {
        let array = jagged(vec![vec![1.0, 2.0], vec![], vec![3.0]]);
        let tracer = array.typetracer();
        assert_eq!(tracer.backend(), Backend::typetracer(true));
        let carried = tracer.carry(&Index::from(vec![0i64, 0, 1, 2]), false).unwrap();
        assert_eq!(carried.len(), 4);
        assert_eq!(
            carried.form(),
            array.carry(&Index::from(vec![0i64, 0, 1, 2]), false).unwrap().form()
        );
        let Item::Unknown(element) = tracer.getitem_at(0).unwrap() else {
            panic!("expected an unknown element");
        };
        assert_eq!(element.as_ref(), &Form::numpy(PType::F64));
    }
}
