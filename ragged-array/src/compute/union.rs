use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use ragged_error::{RaggedResult, ragged_bail, ragged_err};
use ragged_form::{PType, Parameters, shape};

use crate::{
    Content, Index, IndexedOptionArray, ListOffsetArray, NumpyArray, NumpyData, RecordArray,
};

/// The branch of a union and the position inside it of one element.
type Entry = (usize, usize);

impl Content {
    /// A union whose branches share a structure as one content of that structure, its elements
    /// in union order. Any other content is returned unchanged.
    ///
    /// Options are merged into a single option over the merged contents, leaves of numbers
    /// into their common type, lists level by level and records field by field. Branches of
    /// different kinds cannot be merged.
    pub fn simplify_union(&self) -> RaggedResult<Content> {
        match self {
            Content::TypeTracer(t) => Ok(Content::TypeTracer(
                t.with_form(shape::simplify_union(t.form())?, t.length()),
            )),
            Content::Union(u) => {
                let entries = (0..u.len()).map(|i| u.entry(i)).collect_vec();
                let contents = u.contents().iter().map(|c| c.as_ref().clone()).collect();
                merge(contents, &entries).inspect_err(|e| {
                    debug!("union of {} branches stays a union: {e}", u.contents().len())
                })
            }
            _ => Ok(self.clone()),
        }
    }
}

fn merge(mut contents: Vec<Content>, entries: &[Entry]) -> RaggedResult<Content> {
    loop {
        if let [only] = contents.as_slice() {
            let carry = Index::from(entries.iter().map(|(_, p)| *p as i64).collect_vec());
            return only.carry(&carry, false);
        }
        if contents.iter().any(Content::is_option) {
            return merge_options(&contents, entries);
        }
        if contents.iter().any(|c| matches!(c, Content::Indexed(_))) {
            contents = contents
                .into_iter()
                .map(|c| match c {
                    Content::Indexed(n) => n.project(),
                    other => Ok(other),
                })
                .try_collect()?;
            continue;
        }
        if contents
            .iter()
            .any(|c| matches!(c, Content::Numpy(n) if !n.inner_shape().is_empty()))
        {
            contents = contents
                .into_iter()
                .map(|c| match c {
                    Content::Numpy(n) => n.to_regular(),
                    other => other,
                })
                .collect();
            continue;
        }
        break;
    }

    if let Some(leaves) = contents
        .iter()
        .map(|c| match c {
            Content::Numpy(n) => Some(n),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
    {
        let ptype = leaves
            .iter()
            .map(|n| n.ptype())
            .reduce(PType::promote)
            .unwrap_or(PType::F64);
        let starts = running_starts(leaves.iter().map(|n| n.len()));
        let data = NumpyData::concatenate(leaves.iter().map(|n| n.data()), ptype)
            .take(entries.iter().map(|(b, p)| starts[*b] + p));
        return Ok(Content::Numpy(
            NumpyArray::new(data).with_parameters(common_parameters(&contents)),
        ));
    }

    if contents.iter().all(Content::is_list) {
        let compacted: Vec<(Index, Content)> = contents
            .iter()
            .map(|c| c.to_list_offset64()?.compact())
            .try_collect()?;
        let mut offsets = Vec::with_capacity(entries.len() + 1);
        offsets.push(0i64);
        let mut inner = Vec::new();
        for (b, p) in entries {
            let list_offsets = &compacted[*b].0;
            let (start, stop) = (list_offsets.get(*p), list_offsets.get(p + 1));
            inner.extend((start..stop).map(|k| (*b, k as usize)));
            offsets.push(inner.len() as i64);
        }
        let merged = merge(compacted.into_iter().map(|(_, c)| c).collect(), &inner)?;
        return Ok(Content::ListOffset(ListOffsetArray::new_unchecked(
            Index::from(offsets),
            Arc::new(merged),
            common_parameters(&contents),
        )));
    }

    if let Some(records) = contents
        .iter()
        .map(|c| match c {
            Content::Record(r) => Some(r),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
    {
        if let Some(first) = records.first() {
            let same_fields = records.iter().all(|r| {
                sorted_fields(r) == sorted_fields(first)
                    && r.contents().len() == first.contents().len()
            });
            if same_fields {
                let merged = first
                    .fields()
                    .iter()
                    .map(|name| {
                        let branches = records
                            .iter()
                            .map(|r| {
                                r.field_index(name)
                                    .map(|i| r.trimmed(i))
                                    .ok_or_else(|| {
                                        ragged_err!(IndexRange: "no field {:?} in union branch", name)
                                    })
                            })
                            .try_collect()?;
                        merge(branches, entries).map(Arc::new)
                    })
                    .try_collect()?;
                return Ok(Content::Record(RecordArray::new_unchecked(
                    merged,
                    first.field_names().map(<[String]>::to_vec),
                    entries.len(),
                    common_parameters(&contents),
                )));
            }
        }
    }

    ragged_bail!(
        StructuralMismatch: "cannot merge a union of {} into a single content",
        contents.iter().map(Content::class_name).join(", ")
    )
}

/// One option over the merged contents of the branches, missing wherever a branch was.
fn merge_options(contents: &[Content], entries: &[Entry]) -> RaggedResult<Content> {
    let (indexes, inner): (Vec<Option<Vec<i64>>>, Vec<Content>) = contents
        .iter()
        .map(|c| match (c.option_index(), c.option_content()) {
            (Some(index), Some(content)) => (Some(index), content.as_ref().clone()),
            _ => (None, c.clone()),
        })
        .unzip();
    let mut index = Vec::with_capacity(entries.len());
    let mut inner_entries = Vec::new();
    for (b, p) in entries {
        let position = indexes[*b].as_ref().map_or(*p as i64, |option| option[*p]);
        if position < 0 {
            index.push(-1i64);
        } else {
            index.push(inner_entries.len() as i64);
            inner_entries.push((*b, position as usize));
        }
    }
    let merged = merge(inner, &inner_entries)?;
    Ok(Content::IndexedOption(IndexedOptionArray::new_unchecked(
        Index::from(index),
        Arc::new(merged),
        Parameters::new(),
    )))
}

fn sorted_fields(record: &RecordArray) -> Option<Vec<&String>> {
    record.field_names().map(|f| f.iter().sorted().collect())
}

fn running_starts(lengths: impl Iterator<Item = usize>) -> Vec<usize> {
    lengths
        .scan(0usize, |total, len| {
            let start = *total;
            *total += len;
            Some(start)
        })
        .collect()
}

/// The parameters shared by every content, or none when they disagree.
fn common_parameters(contents: &[Content]) -> Parameters {
    match contents.split_first() {
        Some((first, rest)) if rest.iter().all(|c| c.parameters() == first.parameters()) => {
            first.parameters().clone()
        }
        _ => Parameters::new(),
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;
    use crate::UnionArray;
    use crate::test_harness::{floats, jagged, strings};

    fn union(tags: Vec<i8>, index: Vec<i64>, contents: Vec<Content>) -> Content {
        Content::Union(
            UnionArray::try_new(
                Index::from(tags),
                Index::from(index),
                contents.into_iter().map(Arc::new).collect(),
                Parameters::new(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn numbers_merge_into_their_common_type() {
        let ints = Content::Numpy(NumpyArray::from(vec![1i32, 2, 3]));
        let array = union(
            vec![0, 1, 0, 1],
            vec![2, 1, 0, 0],
            vec![ints, floats(&[0.5, 1.5]).as_ref().clone()],
        );
        let simplified = array.simplify_union().unwrap();
        assert_eq!(simplified.to_string(), "[3, 1.5, 1, 0.5]");
        assert_eq!(simplified.form(), shape::simplify_union(&array.form()).unwrap());
    }

    #[test]
    fn lists_merge_level_by_level() {
        let ints = Content::ListOffset(ListOffsetArray::new_unchecked(
            Index::from(vec![0i64, 2, 3]),
            Arc::new(Content::Numpy(NumpyArray::from(vec![1i64, 2, 3]))),
            Parameters::new(),
        ));
        let array = union(
            vec![1, 0, 1, 0],
            vec![0, 1, 1, 0],
            vec![ints, jagged(vec![vec![], vec![4.5]])],
        );
        let simplified = array.simplify_union().unwrap();
        assert_eq!(simplified.to_string(), "[[], [3], [4.5], [1, 2]]");
        assert_eq!(simplified.form(), shape::simplify_union(&array.form()).unwrap());
    }

    #[test]
    fn missing_values_survive_merging() {
        let options = Content::IndexedOption(
            IndexedOptionArray::try_new(
                Index::from(vec![-1i64, 0]),
                floats(&[2.0]),
                Parameters::new(),
            )
            .unwrap(),
        );
        let array = union(
            vec![0, 1, 0],
            vec![0, 0, 1],
            vec![options, Content::Numpy(NumpyArray::from(vec![7i64]))],
        );
        let simplified = array.simplify_union().unwrap();
        assert_eq!(simplified.to_string(), "[None, 7, 2]");
        assert_eq!(simplified.form(), shape::simplify_union(&array.form()).unwrap());
    }

    #[test]
    fn different_kinds_stay_apart() {
        let array = union(
            vec![0, 1],
            vec![0, 0],
            vec![floats(&[1.0]).as_ref().clone(), strings(&["a"])],
        );
        assert_eq!(
            array.simplify_union().unwrap_err().kind(),
            ErrorKind::StructuralMismatch
        );
        let plain = floats(&[1.0]);
        assert_eq!(plain.simplify_union().unwrap().to_string(), "[1]");
    }
}
