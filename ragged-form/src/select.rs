//! Column pruning by dotted path patterns.

use std::sync::{Arc, LazyLock};

use itertools::Itertools;
use log::debug;
use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use regex::Regex;

use crate::{
    BitMaskedForm, ByteMaskedForm, Form, IndexedForm, IndexedOptionForm, ListForm,
    ListOffsetForm, RecordForm, RegularForm, UnionForm, UnmaskedForm, VirtualForm,
};

static BRACES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}]*)\}")
        .ok()
        .ragged_expect("brace pattern is a valid regex")
});

/// Expand the first innermost `{a,b}` group of a pattern, recursively.
fn expand_braces(pattern: &str) -> Vec<String> {
    match BRACES.captures(pattern) {
        None => vec![pattern.to_string()],
        Some(captures) => {
            let (Some(whole), Some(alternatives)) = (captures.get(0), captures.get(1)) else {
                return vec![pattern.to_string()];
            };
            alternatives
                .as_str()
                .split(',')
                .flat_map(|alternative| {
                    expand_braces(&format!(
                        "{}{}{}",
                        &pattern[..whole.start()],
                        alternative,
                        &pattern[whole.end()..]
                    ))
                })
                .collect()
        }
    }
}

/// One path segment pattern, with shell-style `*`, `?` and `[...]` wildcards.
#[derive(Debug)]
struct SegmentMatcher(Regex);

impl SegmentMatcher {
    fn try_new(pattern: &str) -> RaggedResult<Self> {
        let mut translated = String::with_capacity(pattern.len() + 2);
        translated.push('^');
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => translated.push_str(".*"),
                '?' => translated.push('.'),
                '[' => {
                    let mut class = String::new();
                    let mut closed = false;
                    if chars.peek() == Some(&'!') {
                        chars.next();
                        class.push('^');
                    }
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        if c == '\\' || c == '[' {
                            class.push('\\');
                        }
                        class.push(c);
                    }
                    if closed {
                        translated.push('[');
                        translated.push_str(&class);
                        translated.push(']');
                    } else {
                        translated.push_str(&regex::escape("["));
                        translated.push_str(&regex::escape(&class));
                    }
                }
                c => translated.push_str(&regex::escape(&c.to_string())),
            }
        }
        translated.push('$');
        match Regex::new(&translated) {
            Ok(regex) => Ok(Self(regex)),
            Err(e) => ragged_bail!(InvalidArgument: "invalid column pattern {:?}: {}", pattern, e),
        }
    }

    fn matches(&self, field: &str) -> bool {
        self.0.is_match(field)
    }
}

struct Specifiers(Vec<Vec<SegmentMatcher>>);

impl Specifiers {
    fn try_new<S: AsRef<str>>(specifiers: &[S]) -> RaggedResult<Self> {
        if specifiers.is_empty() {
            ragged_bail!(InvalidArgument: "select_columns needs at least one column specifier");
        }
        let expanded = specifiers
            .iter()
            .flat_map(|s| expand_braces(s.as_ref()))
            .unique()
            .collect_vec();
        let parsed = expanded
            .iter()
            .map(|item| -> RaggedResult<Vec<SegmentMatcher>> {
                if item.is_empty() {
                    Ok(vec![])
                } else {
                    item.split('.').map(SegmentMatcher::try_new).try_collect()
                }
            })
            .try_collect()?;
        Ok(Self(parsed))
    }
}

impl Form {
    /// Prune this form to the leaf columns matching any of the dotted `specifiers`.
    ///
    /// Each path segment is a shell-style pattern, `{a,b}` groups expand to alternatives, and a
    /// specifier shorter than a path selects the whole subtree beneath it; the empty specifier
    /// selects everything. Records keep only fields with a matching leaf, and a tuple that loses
    /// fields becomes a record named by the remaining positions. Unions keep the branches with a
    /// matching leaf and collapse to the branch itself when only one remains.
    pub fn select_columns<S: AsRef<str>>(&self, specifiers: &[S]) -> RaggedResult<Form> {
        let specifiers = Specifiers::try_new(specifiers)?;
        let matches = vec![true; specifiers.0.len()];
        let mut found = 0;
        let selected = self.select_next(0, &specifiers, &matches, &mut found);
        debug!("{} specifiers selected {found} leaf columns", specifiers.0.len());
        Ok(selected)
    }

    fn select_next(
        &self,
        index: usize,
        specifiers: &Specifiers,
        matches: &[bool],
        found: &mut usize,
    ) -> Form {
        let info = self.info().clone();
        let select = |content: &Arc<Form>, found: &mut usize| {
            Arc::new(content.select_next(index, specifiers, matches, found))
        };
        match self {
            Form::Numpy(_) => {
                if matches.iter().any(|m| *m) {
                    *found += 1;
                }
                self.clone()
            }
            _ if self.is_string_like() => {
                if matches.iter().any(|m| *m) {
                    *found += 1;
                }
                self.clone()
            }
            Form::List(f) => Form::List(ListForm {
                starts: f.starts,
                stops: f.stops,
                content: select(&f.content, found),
                info,
            }),
            Form::ListOffset(f) => Form::ListOffset(ListOffsetForm {
                offsets: f.offsets,
                content: select(&f.content, found),
                info,
            }),
            Form::Regular(f) => Form::Regular(RegularForm::new(f.size, select(&f.content, found), info)),
            Form::Indexed(f) => Form::Indexed(IndexedForm {
                index: f.index,
                content: select(&f.content, found),
                info,
            }),
            Form::IndexedOption(f) => Form::IndexedOption(IndexedOptionForm {
                index: f.index,
                content: select(&f.content, found),
                info,
            }),
            Form::ByteMasked(f) => Form::ByteMasked(ByteMaskedForm {
                mask: f.mask,
                content: select(&f.content, found),
                valid_when: f.valid_when,
                info,
            }),
            Form::BitMasked(f) => Form::BitMasked(BitMaskedForm {
                mask: f.mask,
                content: select(&f.content, found),
                valid_when: f.valid_when,
                lsb_order: f.lsb_order,
                info,
            }),
            Form::Unmasked(f) => Form::Unmasked(UnmaskedForm::new(select(&f.content, found), info)),
            Form::Virtual(f) => Form::Virtual(VirtualForm::new(
                f.form.as_ref().map(|form| select(form, found)),
                f.has_length,
                info,
            )),
            Form::Record(f) => {
                let mut fields = vec![];
                let mut contents = vec![];
                for (field, content) in f.fields().into_iter().zip(&f.contents) {
                    let next_matches = specifiers
                        .0
                        .iter()
                        .zip(matches)
                        .map(|(segments, matched)| {
                            *matched
                                && segments
                                    .get(index)
                                    .is_none_or(|segment| segment.matches(&field))
                        })
                        .collect_vec();
                    if !next_matches.iter().any(|m| *m) {
                        continue;
                    }
                    let before = *found;
                    let next = content.select_next(index + 1, specifiers, &next_matches, found);
                    if *found != before {
                        fields.push(field);
                        contents.push(Arc::new(next));
                    }
                }
                let names = if f.is_tuple() && contents.len() == f.contents.len() {
                    None
                } else {
                    Some(fields)
                };
                Form::Record(RecordForm {
                    contents,
                    fields: names,
                    info,
                })
            }
            Form::Union(f) => {
                let mut contents = vec![];
                for content in &f.contents {
                    let before = *found;
                    let next = content.select_next(index, specifiers, matches, found);
                    if *found != before {
                        contents.push(Arc::new(next));
                    }
                }
                if let [only] = contents.as_slice() {
                    return only.as_ref().clone();
                }
                Form::Union(UnionForm {
                    tags: f.tags,
                    index: f.index,
                    contents,
                    info,
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;
    use rstest::rstest;

    use super::expand_braces;
    use crate::{Form, IndexType, PType};

    fn var(content: Form) -> Form {
        Form::list_offset(IndexType::I64, content).unwrap()
    }

    fn nested() -> Form {
        let inner = Form::record([("y", Form::numpy(PType::F64)), ("z", Form::numpy(PType::I64))])
            .unwrap();
        Form::record([("x", var(inner)), ("w", Form::string())]).unwrap()
    }

    #[test]
    fn selects_nested_leaf() {
        let selected = nested().select_columns(&["x.y"]).unwrap();
        assert_eq!(selected.columns(None, &[]), vec!["x.y"]);
    }

    #[rstest]
    #[case(&["x"], &["x.y", "x.z"])]
    #[case(&["x.*"], &["x.y", "x.z"])]
    #[case(&["x.{y,z}", "w"], &["x.y", "x.z", "w"])]
    #[case(&["?"], &["x.y", "x.z", "w"])]
    #[case(&["x.[!y]"], &["x.z"])]
    #[case(&[""], &["x.y", "x.z", "w"])]
    #[case(&["nothing"], &[])]
    fn patterns(#[case] specifiers: &[&str], #[case] expected: &[&str]) {
        let selected = nested().select_columns(specifiers).unwrap();
        assert_eq!(selected.columns(None, &[]), expected);
    }

    #[test]
    fn empty_specifier_list_is_rejected() {
        let specifiers: [&str; 0] = [];
        let err = nested().select_columns(&specifiers).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn tuple_losing_fields_becomes_record() {
        let form = Form::tuple([Form::numpy(PType::I64), Form::numpy(PType::F64)]);
        let selected = form.select_columns(&["1"]).unwrap();
        assert!(!selected.is_tuple());
        assert_eq!(selected.fields(), vec!["1"]);
        assert!(form.select_columns(&["*"]).unwrap().is_tuple());
    }

    #[test]
    fn union_keeps_matching_branches() {
        let a = Form::record([("x", Form::numpy(PType::I64))]).unwrap();
        let b = Form::record([("y", Form::numpy(PType::F64))]).unwrap();
        let union = Form::union(IndexType::I64, [a.clone(), b]).unwrap();
        assert_eq!(union.select_columns(&["x"]).unwrap(), a);
        assert!(matches!(union.select_columns(&["*"]).unwrap(), Form::Union(_)));
    }

    #[test]
    fn brace_expansion() {
        assert_eq!(expand_braces("a.{b,c}.{d,e}"), vec!["a.b.d", "a.b.e", "a.c.d", "a.c.e"]);
        assert_eq!(expand_braces("plain"), vec!["plain"]);
    }
}
