use bson::doc;
use nexus_rest::schema::Relation;
use nexus_rest::types::DocumentId;
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn members_stay_unique_under_any_add_remove_sequence(ops in proptest::collection::vec((any::<bool>(), 0usize..4), 0..40)) {
        let pool: Vec<DocumentId> = (0..4).map(|_| DocumentId::new()).collect();
        let rel = Relation::new("tags", "tag_ids", "tags");
        let mut owner = doc! {};
        let mut model: Vec<DocumentId> = Vec::new();
        for (add, i) in ops {
            let id = pool[i];
            if add {
                let changed = rel.add(&mut owner, id);
                prop_assert_eq!(changed, !model.contains(&id));
                if changed {
                    model.push(id);
                }
            } else {
                let changed = rel.remove(&mut owner, &id);
                prop_assert_eq!(changed, model.contains(&id));
                model.retain(|m| *m != id);
            }
            prop_assert_eq!(rel.get(&owner), model.clone());
        }
    }
}
