use std::fmt::{Display, Formatter};

use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::{Form, PType};

/// The classification of a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// A column of primitive values.
    Primitive(PType),
    /// A column of strings or bytestrings.
    String,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Primitive(ptype) => write!(f, "{ptype}"),
            ColumnType::String => write!(f, "string"),
        }
    }
}

impl Form {
    /// The dot-joined paths of every leaf column, in depth-first order.
    ///
    /// List levels append `list_indicator` to the path when one is given, except for strings,
    /// which are a single leaf. Union branches are walked in order and paths seen in an earlier
    /// branch are not repeated.
    pub fn columns(&self, list_indicator: Option<&str>, column_prefix: &[&str]) -> Vec<String> {
        self.leaf_columns(list_indicator, column_prefix)
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    }

    /// The classification of every leaf column, parallel to [`Form::columns`].
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.leaf_columns(None, &[])
            .into_iter()
            .map(|(_, column_type)| column_type)
            .collect()
    }

    fn leaf_columns(
        &self,
        list_indicator: Option<&str>,
        column_prefix: &[&str],
    ) -> Vec<(String, ColumnType)> {
        let mut path = column_prefix.iter().map(|s| s.to_string()).collect_vec();
        let mut output = Vec::new();
        let mut seen = FxHashSet::default();
        self.walk_columns(&mut path, list_indicator, &mut output, &mut seen);
        output
    }

    fn walk_columns(
        &self,
        path: &mut Vec<String>,
        list_indicator: Option<&str>,
        output: &mut Vec<(String, ColumnType)>,
        seen: &mut FxHashSet<String>,
    ) {
        match self {
            Form::Numpy(f) => emit(path, ColumnType::Primitive(f.primitive), output, seen),
            _ if self.is_string_like() => emit(path, ColumnType::String, output, seen),
            Form::List(_) | Form::ListOffset(_) | Form::Regular(_) => {
                let Some(content) = self.content() else {
                    return;
                };
                match list_indicator {
                    Some(indicator) => {
                        path.push(indicator.to_string());
                        content.walk_columns(path, list_indicator, output, seen);
                        path.pop();
                    }
                    None => content.walk_columns(path, list_indicator, output, seen),
                }
            }
            Form::Record(f) => {
                for (field, content) in f.fields().into_iter().zip(&f.contents) {
                    path.push(field);
                    content.walk_columns(path, list_indicator, output, seen);
                    path.pop();
                }
            }
            Form::Union(f) => {
                for content in &f.contents {
                    content.walk_columns(path, list_indicator, output, seen);
                }
            }
            _ => {
                if let Some(content) = self.content() {
                    content.walk_columns(path, list_indicator, output, seen);
                }
            }
        }
    }
}

fn emit(
    path: &[String],
    column_type: ColumnType,
    output: &mut Vec<(String, ColumnType)>,
    seen: &mut FxHashSet<String>,
) {
    let joined = path.join(".");
    if seen.insert(joined.clone()) {
        output.push((joined, column_type));
    }
}

#[cfg(test)]
mod test {
    use crate::{ColumnType, Form, IndexType, PType};

    fn var(content: Form) -> Form {
        Form::list_offset(IndexType::I64, content).unwrap()
    }

    fn events() -> Form {
        let muon = Form::record([("pt", Form::numpy(PType::F32)), ("charge", Form::numpy(PType::I8))])
            .unwrap();
        Form::record([
            ("run", Form::numpy(PType::I64)),
            ("muons", var(muon)),
            ("tag", Form::string()),
        ])
        .unwrap()
    }

    #[test]
    fn record_paths() {
        assert_eq!(
            events().columns(None, &[]),
            vec!["run", "muons.pt", "muons.charge", "tag"]
        );
        assert_eq!(
            events().columns(Some("list.item"), &["events"]),
            vec![
                "events.run",
                "events.muons.list.item.pt",
                "events.muons.list.item.charge",
                "events.tag"
            ]
        );
        assert_eq!(
            events().column_types(),
            vec![
                ColumnType::Primitive(PType::I64),
                ColumnType::Primitive(PType::F32),
                ColumnType::Primitive(PType::I8),
                ColumnType::String,
            ]
        );
    }

    #[test]
    fn tuples_use_positions() {
        let form = Form::tuple([Form::numpy(PType::Bool), var(Form::numpy(PType::F64))]);
        assert_eq!(form.columns(Some("list"), &[]), vec!["0", "1.list"]);
    }

    #[test]
    fn unions_walk_every_branch() {
        let a = Form::record([("x", Form::numpy(PType::I64))]).unwrap();
        let b = Form::record([("x", Form::numpy(PType::F64)), ("y", Form::string())]).unwrap();
        let form = Form::union(IndexType::I64, [a, b]).unwrap();
        assert_eq!(form.columns(None, &[]), vec!["x", "y"]);
        assert_eq!(
            form.column_types(),
            vec![ColumnType::Primitive(PType::I64), ColumnType::String]
        );
    }
}
