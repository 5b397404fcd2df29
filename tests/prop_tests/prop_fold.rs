use bson::Bson;
use nexus_rest::query::{Bound, Predicate, compile_filters, multi_value, single_value};
use nexus_rest::{FilterClause, Operator, SchemaMetadata};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn upper_bounds_fold_to_min_and_lower_bounds_to_max(v in proptest::collection::vec(any::<i64>(), 1..20)) {
        let values: Vec<Bson> = v.iter().copied().map(Bson::Int64).collect();
        let min = *v.iter().min().unwrap();
        let max = *v.iter().max().unwrap();
        for (op, bound, expected) in [
            (Operator::Lt, Bound::Lt, min),
            (Operator::Lte, Bound::Lte, min),
            (Operator::Gt, Bound::Gt, max),
            (Operator::Gte, Bound::Gte, max),
        ] {
            let p = multi_value("n", op, values.clone()).unwrap();
            prop_assert_eq!(p, Predicate::Range { bound, value: Bson::Int64(expected) });
        }
    }

    #[test]
    fn compiled_range_clauses_agree_with_fold(v in proptest::collection::vec(-1000i64..1000, 1..10)) {
        let schema = SchemaMetadata::from_toml_str("[collections.t.fields.n]\ntype = \"integer\"\n").unwrap();
        let raw: Vec<String> = v.iter().map(ToString::to_string).collect();
        let q = compile_filters(schema.collection("t").unwrap(), &[FilterClause::any_of("n", Operator::Gte, raw)]).unwrap();
        let expected = Predicate::Range { bound: Bound::Gte, value: Bson::Int64(*v.iter().max().unwrap()) };
        prop_assert_eq!(q.get("n").unwrap().single(), Some(&expected));
    }

    #[test]
    fn default_eq_matches_whole_string_ignoring_case(s in "[a-zA-Z0-9]{1,12}", suffix in "[a-z]{1,4}") {
        let Predicate::Pattern(p) = single_value("name", Operator::Eq, Bson::String(s.clone())).unwrap() else {
            panic!("text equality must compile to a pattern");
        };
        prop_assert!(p.is_match(&s.to_uppercase()));
        prop_assert!(p.is_match(&s.to_lowercase()));
        let longer = format!("{s}{suffix}");
        prop_assert!(!p.is_match(&longer));
    }
}
