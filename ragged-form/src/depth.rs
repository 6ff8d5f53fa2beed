//! Depth queries used to normalize `axis` arguments.
//!
//! Lists carrying the `"string"` or `"bytestring"` hint are scalars here: they count as depth 1
//! and are never descended into.

use serde_json::Value;

use crate::{Form, FormRef};

/// Combine the branch depths of sibling contents (record fields or union branches).
pub fn merge_branch_depths(depths: impl IntoIterator<Item = (bool, usize)>) -> (bool, usize) {
    let mut any_branch = false;
    let mut min_depth: Option<usize> = None;
    for (branch, depth) in depths {
        match min_depth {
            None => min_depth = Some(depth),
            Some(m) => {
                if m != depth {
                    any_branch = true;
                }
                min_depth = Some(m.min(depth));
            }
        }
        any_branch |= branch;
    }
    (any_branch, min_depth.unwrap_or(1))
}

/// Combine the min/max depths of sibling contents.
pub fn merge_minmax_depths(depths: impl IntoIterator<Item = (usize, usize)>) -> (usize, usize) {
    depths
        .into_iter()
        .reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
        .unwrap_or((0, 0))
}

impl Form {
    /// The number of list dimensions reachable without passing through a record, or `-1` when
    /// union branches disagree.
    pub fn purelist_depth(&self) -> i64 {
        match self {
            Form::Numpy(f) => 1 + f.inner_shape.len() as i64,
            Form::List(_) | Form::ListOffset(_) | Form::Regular(_) if self.is_string_like() => 1,
            Form::List(f) => list_depth(&f.content),
            Form::ListOffset(f) => list_depth(&f.content),
            Form::Regular(f) => list_depth(&f.content),
            Form::Record(_) => 1,
            Form::Indexed(f) => f.content.purelist_depth(),
            Form::IndexedOption(f) => f.content.purelist_depth(),
            Form::ByteMasked(f) => f.content.purelist_depth(),
            Form::BitMasked(f) => f.content.purelist_depth(),
            Form::Unmasked(f) => f.content.purelist_depth(),
            Form::Union(f) => {
                let mut depths = f.contents.iter().map(|c| c.purelist_depth());
                match depths.next() {
                    None => 1,
                    Some(first) => {
                        if depths.all(|d| d == first) {
                            first
                        } else {
                            -1
                        }
                    }
                }
            }
            Form::Virtual(f) => f.form.as_ref().map_or(1, |f| f.purelist_depth()),
        }
    }

    /// The smallest and largest depth of any leaf, counting through records.
    pub fn minmax_depth(&self) -> (usize, usize) {
        match self {
            Form::Numpy(f) => {
                let depth = 1 + f.inner_shape.len();
                (depth, depth)
            }
            Form::List(_) | Form::ListOffset(_) | Form::Regular(_) if self.is_string_like() => {
                (1, 1)
            }
            Form::List(f) => plus_one(f.content.minmax_depth()),
            Form::ListOffset(f) => plus_one(f.content.minmax_depth()),
            Form::Regular(f) => plus_one(f.content.minmax_depth()),
            Form::Record(f) => merge_minmax_depths(f.contents.iter().map(|c| c.minmax_depth())),
            Form::Union(f) => merge_minmax_depths(f.contents.iter().map(|c| c.minmax_depth())),
            Form::Indexed(f) => f.content.minmax_depth(),
            Form::IndexedOption(f) => f.content.minmax_depth(),
            Form::ByteMasked(f) => f.content.minmax_depth(),
            Form::BitMasked(f) => f.content.minmax_depth(),
            Form::Unmasked(f) => f.content.minmax_depth(),
            Form::Virtual(f) => f.form.as_ref().map_or((1, 1), |f| f.minmax_depth()),
        }
    }

    /// Whether subtrees reach different depths, and the smallest depth reached.
    pub fn branch_depth(&self) -> (bool, usize) {
        match self {
            Form::Numpy(f) => (false, 1 + f.inner_shape.len()),
            Form::List(_) | Form::ListOffset(_) | Form::Regular(_) if self.is_string_like() => {
                (false, 1)
            }
            Form::List(f) => branch_plus_one(f.content.branch_depth()),
            Form::ListOffset(f) => branch_plus_one(f.content.branch_depth()),
            Form::Regular(f) => branch_plus_one(f.content.branch_depth()),
            Form::Record(f) => merge_branch_depths(f.contents.iter().map(|c| c.branch_depth())),
            Form::Union(f) => merge_branch_depths(f.contents.iter().map(|c| c.branch_depth())),
            Form::Indexed(f) => f.content.branch_depth(),
            Form::IndexedOption(f) => f.content.branch_depth(),
            Form::ByteMasked(f) => f.content.branch_depth(),
            Form::BitMasked(f) => f.content.branch_depth(),
            Form::Unmasked(f) => f.content.branch_depth(),
            Form::Virtual(f) => f.form.as_ref().map_or((false, 1), |f| f.branch_depth()),
        }
    }

    /// Whether every list dimension reachable without passing through a record is regular.
    pub fn purelist_isregular(&self) -> bool {
        match self {
            Form::Numpy(_) | Form::Record(_) => true,
            Form::List(_) | Form::ListOffset(_) => false,
            Form::Regular(f) => f.content.purelist_isregular(),
            Form::Union(f) => f.contents.iter().all(|c| c.purelist_isregular()),
            Form::Virtual(f) => f.form.as_ref().is_none_or(|f| f.purelist_isregular()),
            _ => self
                .content()
                .is_some_and(|content| content.purelist_isregular()),
        }
    }

    /// The value of a parameter at the first list dimension that sets it.
    pub fn purelist_parameter(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.parameter(key) {
            return Some(value);
        }
        match self {
            Form::Numpy(_) | Form::Record(_) => None,
            Form::Union(f) => {
                let mut values = f.contents.iter().map(|c| c.purelist_parameter(key));
                let first = values.next()??;
                values.all(|v| v == Some(first)).then_some(first)
            }
            _ => self.content().and_then(|c| c.purelist_parameter(key)),
        }
    }

    /// Whether an option type appears before the first list dimension or record.
    pub fn dimension_optiontype(&self) -> bool {
        match self {
            Form::IndexedOption(_) | Form::ByteMasked(_) | Form::BitMasked(_) | Form::Unmasked(_) => {
                true
            }
            Form::Indexed(f) => f.content.dimension_optiontype(),
            Form::Union(f) => f.contents.iter().any(|c| c.dimension_optiontype()),
            Form::Virtual(f) => f.form.as_ref().is_some_and(|f| f.dimension_optiontype()),
            _ => false,
        }
    }

    /// The field names of the first record reachable through lists and options.
    ///
    /// For unions, only the fields that every branch shares, in the order of the first branch.
    pub fn fields(&self) -> Vec<String> {
        match self {
            Form::Numpy(_) => vec![],
            Form::Record(f) => f.fields(),
            Form::Union(f) => {
                let mut branches = f.contents.iter().map(|c| c.fields());
                let Some(first) = branches.next() else {
                    return vec![];
                };
                let rest = branches.collect::<Vec<_>>();
                first
                    .into_iter()
                    .filter(|field| rest.iter().all(|b| b.contains(field)))
                    .collect()
            }
            _ => self.content().map(|c| c.fields()).unwrap_or_default(),
        }
    }

    /// Whether the first record reachable through lists and options is a tuple.
    pub fn is_tuple(&self) -> bool {
        match self {
            Form::Numpy(_) => false,
            Form::Record(f) => f.is_tuple(),
            Form::Union(f) => !f.contents.is_empty() && f.contents.iter().all(|c| c.is_tuple()),
            _ => self.content().is_some_and(|c| c.is_tuple()),
        }
    }
}

fn list_depth(content: &FormRef) -> i64 {
    let depth = content.purelist_depth();
    if depth < 0 { -1 } else { depth + 1 }
}

fn plus_one((min, max): (usize, usize)) -> (usize, usize) {
    (min + 1, max + 1)
}

fn branch_plus_one((branch, depth): (bool, usize)) -> (bool, usize) {
    (branch, depth + 1)
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use serde_json::json;

    use crate::{Form, IndexType, PType, Parameters};

    fn var(content: Form) -> Form {
        Form::list_offset(IndexType::I64, content).unwrap()
    }

    fn float() -> Form {
        Form::numpy(PType::F64)
    }

    #[rstest]
    #[case(float(), 1, (1, 1), (false, 1))]
    #[case(var(float()), 2, (2, 2), (false, 2))]
    #[case(var(var(float())), 3, (3, 3), (false, 3))]
    #[case(Form::string(), 1, (1, 1), (false, 1))]
    #[case(var(Form::string()), 2, (2, 2), (false, 2))]
    #[case(Form::record([("x", var(float())), ("y", float())]).unwrap(), 1, (1, 2), (true, 1))]
    #[case(var(Form::record([("x", var(float())), ("y", var(float()))]).unwrap()), 2, (3, 3), (false, 3))]
    #[case(Form::union(IndexType::I64, [var(float()), var(var(float()))]).unwrap(), -1, (2, 3), (true, 2))]
    #[case(Form::indexed_option(IndexType::I64, var(float())).unwrap(), 2, (2, 2), (false, 2))]
    fn depths(
        #[case] form: Form,
        #[case] purelist: i64,
        #[case] minmax: (usize, usize),
        #[case] branch: (bool, usize),
    ) {
        assert_eq!(form.purelist_depth(), purelist);
        assert_eq!(form.minmax_depth(), minmax);
        assert_eq!(form.branch_depth(), branch);
    }

    #[test]
    fn purelist_parameter_descends_lists() {
        let inner = float().with_parameters(Parameters::new().with("units", json!("GeV")));
        let form = var(Form::indexed_option(IndexType::I64, inner).unwrap());
        assert_eq!(form.purelist_parameter("units"), Some(&json!("GeV")));
        assert_eq!(form.purelist_parameter("other"), None);

        let record = Form::record([("x", float())])
            .unwrap()
            .with_parameters(Parameters::record("point"));
        assert_eq!(var(record).purelist_parameter("__record__"), Some(&json!("point")));
    }

    #[test]
    fn fields_and_tuples() {
        let record = Form::record([("x", float()), ("y", var(float()))]).unwrap();
        assert_eq!(var(record.clone()).fields(), vec!["x", "y"]);
        assert!(!var(record.clone()).is_tuple());

        let tuple = Form::tuple([float(), float()]);
        assert_eq!(tuple.fields(), vec!["0", "1"]);
        assert!(tuple.is_tuple());

        let other = Form::record([("y", float()), ("z", float())]).unwrap();
        let union = Form::union(IndexType::I64, [record, other]).unwrap();
        assert_eq!(union.fields(), vec!["y"]);
    }

    #[test]
    fn option_and_regularity() {
        let form = Form::indexed_option(IndexType::I64, var(float())).unwrap();
        assert!(form.dimension_optiontype());
        assert!(!var(form.clone()).dimension_optiontype());
        assert!(Form::regular(3, float()).purelist_isregular());
        assert!(!Form::regular(3, var(float())).purelist_isregular());
    }
}
