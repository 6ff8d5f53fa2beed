#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ragged_array::compute::{FlattenOptions, flatten};
    use ragged_array::test_harness::{floats, jagged};
    use ragged_array::{
        Content, Index, IndexedOptionArray, ListOffsetArray, RegularArray, UnionArray, from_json,
    };
    use ragged_error::ErrorKind;
    use ragged_form::Parameters;
    use rstest::rstest;
    use serde_json::json;

    fn flatten_at(array: &Content, axis: Option<i64>) -> Content {
        flatten(
            array,
            &FlattenOptions {
                axis,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn union_of(tags: Vec<i8>, index: Vec<i64>, contents: Vec<Content>) -> Content {
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
    fn offsets_flatten_into_their_values() {
        let array = Content::ListOffset(
            ListOffsetArray::try_new(
                Index::from(vec![0i64, 3, 3, 5, 6, 10]),
                floats(&[0.0, 1.1, 2.2, 3.3, 4.4, 5.5, 6.6, 7.7, 8.8, 9.9]),
                Parameters::new(),
            )
            .unwrap(),
        );
        assert_eq!(
            flatten_at(&array, Some(1)).to_string(),
            "[0, 1.1, 2.2, 3.3, 4.4, 5.5, 6.6, 7.7, 8.8, 9.9]"
        );
        assert_eq!(array.flatten(-2).unwrap_err().kind(), ErrorKind::AxisRange);
    }

    #[test]
    fn second_level_lists_merge_per_outer_list() {
        let array = from_json("[[[0, 1, 2], [], [3, 4]], [], [[5]], [[], [6, 7, 8, 9]]]").unwrap();
        assert_eq!(
            array.flatten(2).unwrap().to_string(),
            "[[0, 1, 2, 3, 4], [], [5], [6, 7, 8, 9]]"
        );
    }

    #[test]
    fn missing_lists_vanish_and_missing_values_stay() {
        let array =
            from_json("[[1.1, 2.2, null, 3.3], null, [], null, [4.4, 5.5], null]").unwrap();
        assert!(array.is_option());
        let flattened = flatten_at(&array, Some(1));
        assert_eq!(flattened.to_string(), "[1.1, 2.2, None, 3.3, 4.4, 5.5]");
        assert_eq!(
            flatten_at(&array, None).to_string(),
            "[1.1, 2.2, 3.3, 4.4, 5.5]"
        );
    }

    #[test]
    fn unions_of_different_depths_are_ambiguous() {
        let deep = from_json("[[[1.5]], [[2.5], []]]").unwrap();
        let flat = floats(&[3.0, 4.0]).as_ref().clone();
        let array = union_of(vec![0, 1, 0], vec![0, 0, 1], vec![deep.clone(), flat]);
        assert_eq!(array.minmax_depth(), (1, 3));
        assert_eq!(array.flatten(2).unwrap_err().kind(), ErrorKind::DepthAmbiguity);

        let other = from_json("[[[3]]]").unwrap();
        let agreeing = union_of(vec![0, 1, 0], vec![0, 0, 1], vec![deep, other]);
        assert_eq!(agreeing.flatten(2).unwrap().to_string(), "[[1.5], [3], [2.5]]");
    }

    #[rstest]
    #[case(Some(0))]
    #[case(Some(1))]
    #[case(Some(2))]
    fn empty_regular_arrays_flatten_to_nothing(#[case] axis: Option<i64>) {
        let empty = Content::Regular(
            RegularArray::try_new(
                Arc::new(jagged(vec![vec![1.0, 2.0, 3.0], vec![], vec![4.0, 5.0]])),
                0,
                0,
                Parameters::new(),
            )
            .unwrap(),
        );
        assert!(flatten_at(&empty, axis).is_empty());
    }

    #[test]
    fn selecting_a_nested_column_prunes_its_siblings() {
        let array = from_json(r#"[{"x": [{"y": 1, "z": 2.5}], "w": true}]"#).unwrap();
        let form = array.form();
        assert_eq!(form.columns(None, &[]), vec!["w", "x.y", "x.z"]);
        let selected = form.select_columns(&["x.y"]).unwrap();
        assert_eq!(selected.columns(None, &[]), vec!["x.y"]);
    }

    #[test]
    fn leaves_walk_the_columns_of_the_form() {
        let array = from_json(
            r#"[{"a": [1, 2], "b": {"c": "s", "d": [[true]]}}, {"a": [], "b": {"c": "t", "d": []}}]"#,
        )
        .unwrap();
        let paths = array
            .leaves(Some("list"), &[])
            .unwrap()
            .into_iter()
            .map(|(path, _)| path)
            .collect::<Vec<_>>();
        assert_eq!(paths, array.form().columns(Some("list"), &[]));
        assert_eq!(paths, vec!["a.list", "b.c", "b.d.list.list"]);
    }

    #[test]
    fn flat_arrays_are_unchanged_by_outermost_flatten() {
        let array = floats(&[1.0, 2.0, 3.0]).as_ref().clone();
        assert_eq!(flatten_at(&array, Some(0)).to_string(), array.to_string());

        let options = from_json("[1.5, null, 2.5]").unwrap();
        assert_eq!(flatten_at(&options, Some(0)).to_string(), "[1.5, 2.5]");
    }

    #[test]
    fn carries_compose() {
        let array = from_json("[[1], [], [2, 3], null, [4]]").unwrap();
        let first = Index::from(vec![4i64, 0, 3, 2]);
        let second = Index::from(vec![3i64, 1, 2]);
        let composed = Index::from(
            second
                .iter()
                .map(|i| first.get(i as usize))
                .collect::<Vec<i64>>(),
        );
        let twice = array
            .carry(&first, false)
            .unwrap()
            .carry(&second, false)
            .unwrap();
        let once = array.carry(&composed, false).unwrap();
        assert_eq!(twice.to_json().unwrap(), once.to_json().unwrap());
        assert_eq!(once.to_json().unwrap(), json!([[2, 3], [1], null]));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    fn negative_axes_count_from_the_leaves(#[case] axis: i64) {
        let array = from_json("[[[0, 1], []], [[2]], []]").unwrap();
        let (_, depth) = array.minmax_depth();
        assert_eq!(
            array.flatten(axis).unwrap().to_string(),
            array.flatten(axis - depth as i64).unwrap().to_string()
        );
    }

    #[test]
    fn masked_flatten_keeps_the_order_of_present_lists() {
        let array = Content::IndexedOption(
            IndexedOptionArray::try_new(
                Index::from(vec![3i64, -1, 0, -1, 1]),
                Arc::new(jagged(vec![vec![1.0], vec![2.0, 3.0], vec![], vec![4.0]])),
                Parameters::new(),
            )
            .unwrap(),
        );
        assert_eq!(flatten_at(&array, Some(0)).to_string(), "[[4], [1], [2, 3]]");
    }

    #[test]
    fn json_survives_a_round_trip() {
        let value = json!([{"x": 1.5, "y": [1, 2]}, {"x": null, "y": []}, null]);
        let array = from_json(&value.to_string()).unwrap();
        assert_eq!(array.to_json().unwrap(), value);
    }
}
