use nexus_rest::types::DocumentId;
use parking_lot::RwLock;
use std::sync::Arc;

use super::_support::blog;

#[test]
fn removing_an_unknown_foreign_record_is_not_found() {
    let b = blog();
    let a = b.article("t", 1);
    assert_eq!(b.api().remove_from_collection("articles", &a, "tags", "nonexistent-tag-id").code(), 404);
    assert_eq!(
        b.api().remove_from_collection("articles", &a, "tags", &DocumentId::new().to_hex()).code(),
        404
    );
    assert_eq!(b.api().remove_from_collection("articles", &a, "tags", &b.go).code(), 200);
}

#[test]
fn add_is_idempotent() {
    let b = blog();
    let a = b.article("t", 1);
    assert_eq!(b.api().add_to_collection("articles", &a, "tags", &b.rust).code(), 200);
    assert_eq!(b.api().add_to_collection("articles", &a, "tags", &b.rust).code(), 200);
    assert_eq!(b.tag_ids(&a), [b.rust.clone()]);
    assert_eq!(b.api().add_to_collection("articles", &a, "tags", &DocumentId::new().to_hex()).code(), 404);
    assert_eq!(b.tag_ids(&a), [b.rust.clone()]);
}

#[test]
fn preconditions_run_field_then_kind_then_owner() {
    let b = blog();
    let missing_owner = DocumentId::new().to_hex();
    let api = b.api();
    assert_eq!(api.add_to_collection("articles", &missing_owner, "ratings", &b.rust).code(), 404);
    assert_eq!(api.add_to_collection("articles", &missing_owner, "title", &b.rust).code(), 403);
    assert_eq!(api.add_to_collection("articles", &missing_owner, "author", &b.ann).code(), 403);
    assert_eq!(api.add_to_collection("articles", &missing_owner, "tags", &b.rust).code(), 404);
    assert_eq!(api.clear_collection("articles", "junk", "title").code(), 403);
}

#[test]
fn replace_keeps_only_existing_members() {
    let b = blog();
    let a = b.create("articles", &bson::doc! {"title": "t", "tags": [b.rust.clone()]});
    let ghost = DocumentId::new().to_hex();
    let env = b.api().replace_collection("articles", &a, "tags", &[b.go.as_str(), ghost.as_str(), b.go.as_str()]);
    assert_eq!(env.code(), 200);
    assert_eq!(b.tag_ids(&a), [b.go.clone()]);
    assert_eq!(b.api().replace_collection("articles", &a, "tags", &[]).code(), 200);
    assert!(b.tag_ids(&a).is_empty());
}

#[test]
fn clear_empties_the_relation() {
    let b = blog();
    let a = b.create("articles", &bson::doc! {"title": "t", "tags": [b.rust.clone(), b.go.clone()]});
    assert_eq!(b.tag_ids(&a).len(), 2);
    assert_eq!(b.api().clear_collection("articles", &a, "tags").code(), 200);
    assert!(b.tag_ids(&a).is_empty());
    assert_eq!(b.api().clear_collection("articles", &a, "tags").code(), 200);
}

#[test]
fn only_membership_changes_are_audited() {
    let sink = Arc::new(RwLock::new(Vec::new()));
    nexus_rest::telemetry::set_audit_sink_for_tests(sink.clone());
    let b = blog();
    let a = b.article("audited", 1);
    let links = || sink.read().iter().filter(|l| l.contains(&a) && l.contains("\"link\"")).count();
    b.api().add_to_collection("articles", &a, "tags", &b.rust);
    b.api().add_to_collection("articles", &a, "tags", &b.rust);
    assert_eq!(links(), 1);
}
