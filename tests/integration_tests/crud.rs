use bson::{Bson, doc};
use nexus_rest::types::DocumentId;
use nexus_rest::{FilterClause, Operator, Status};

use super::_support::blog;

#[test]
fn retrieve_by_id_statuses() {
    let b = blog();
    let id = b.article("Hello", 2);
    assert_eq!(b.api().retrieve_by_id("articles", None).code(), 400);
    assert_eq!(b.api().retrieve_by_id("articles", Some("")).code(), 400);
    assert_eq!(b.api().retrieve_by_id("articles", Some("missing")).code(), 404);
    assert_eq!(b.api().retrieve_by_id("articles", Some(&DocumentId::new().to_hex())).code(), 404);

    let env = b.api().retrieve_by_id("articles", Some(&id));
    assert_eq!(env.status, Status::Ok);
    let rec = env.single("articles").unwrap();
    assert_eq!(rec.get("id"), Some(&Bson::String(id.clone())));
    assert_eq!(rec.get_i64("views").unwrap(), 2);
    assert!(!rec.contains_key("v") && !rec.contains_key("_id"));
    assert!(rec.get_document("meta").unwrap().is_empty());
    assert!(rec.get_array("comments").unwrap().is_empty());
}

#[test]
fn insert_ignores_undeclared_fields() {
    let b = blog();
    let env = b.api().insert("articles", &doc! {"name": "Alice"});
    assert_eq!(env.code(), 201);
    let rec = env.single("articles").unwrap();
    assert!(!rec.contains_key("name"));
    assert!(rec.get_str("id").is_ok());
}

#[test]
fn insert_never_takes_a_caller_identifier() {
    let b = blog();
    let wanted = DocumentId::new().to_hex();
    let env = b.api().insert("articles", &doc! {"id": wanted.clone(), "title": "t"});
    assert_eq!(env.code(), 201);
    assert_ne!(env.single("articles").unwrap().get_str("id").unwrap(), wanted);
    assert_eq!(b.api().insert_with_explicit_id("articles", &wanted, &doc! {"title": "t"}).code(), 403);
    assert_eq!(b.store.count("articles"), 1);
}

#[test]
fn insert_resolves_references() {
    let b = blog();
    let ghost = DocumentId::new().to_hex();
    let id = b.create(
        "articles",
        &doc! {
            "title": "refs",
            "author": b.ann.clone(),
            "tags": [b.rust.clone(), ghost.clone(), b.rust.clone(), b.go.clone()],
        },
    );
    let rec = b.get("articles", &id);
    assert_eq!(rec.get_str("author").unwrap(), b.ann);
    assert_eq!(b.tag_ids(&id), [b.rust.clone(), b.go.clone()]);

    let id = b.create("articles", &doc! {"title": "dangling", "author": ghost});
    assert!(!b.get("articles", &id).contains_key("author"));
}

#[test]
fn insert_with_no_resolvable_tags_stores_empty_set() {
    let b = blog();
    let id = b.create("articles", &doc! {"title": "t", "tags": ["nope"]});
    assert!(b.tag_ids(&id).is_empty());
    assert!(b.get("articles", &id).get_array("tags").is_ok());
}

#[test]
fn update_statuses_and_effects() {
    let b = blog();
    let id = b.create("articles", &doc! {"title": "draft", "author": b.ann.clone()});
    assert_eq!(b.api().update("articles", None, &doc! {"title": "x"}).code(), 400);
    assert_eq!(b.api().update("articles", Some("missing"), &doc! {"title": "x"}).code(), 404);

    let env = b.api().update("articles", Some(&id), &doc! {"title": "final", "views": 9_i64, "shoe": 1});
    assert_eq!(env.code(), 200);
    assert!(env.payload.is_none());
    let rec = b.get("articles", &id);
    assert_eq!(rec.get_str("title").unwrap(), "final");
    assert_eq!(rec.get_i64("views").unwrap(), 9);
    assert!(!rec.contains_key("shoe"));
    assert_eq!(rec.get_str("author").unwrap(), b.ann);
}

#[test]
fn update_with_falsy_token_clears_one_reference() {
    let b = blog();
    let id = b.create("articles", &doc! {"title": "t", "author": b.ann.clone()});
    assert_eq!(b.api().update("articles", Some(&id), &doc! {"author": DocumentId::new().to_hex()}).code(), 200);
    assert_eq!(b.get("articles", &id).get_str("author").unwrap(), b.ann, "unresolved value is dropped");
    assert_eq!(b.api().update("articles", Some(&id), &doc! {"author": "null"}).code(), 200);
    assert!(!b.get("articles", &id).contains_key("author"));
    assert_eq!(b.api().update("articles", Some(&id), &doc! {"author": b.bob.clone()}).code(), 200);
    assert_eq!(b.get("articles", &id).get_str("author").unwrap(), b.bob);
}

#[test]
fn delete_by_id_statuses() {
    let b = blog();
    let id = b.article("gone", 1);
    let keep = b.article("kept", 1);
    assert_eq!(b.api().delete_by_id("articles", None).code(), 400);
    assert_eq!(b.api().delete_by_id("articles", Some("missing")).code(), 404);
    assert_eq!(b.api().delete_by_id("articles", Some(&id)).code(), 200);
    assert_eq!(b.api().delete_by_id("articles", Some(&id)).code(), 404);
    assert_eq!(b.api().retrieve_by_id("articles", Some(&keep)).code(), 200);
}

#[test]
fn delete_by_filter_removes_every_match() {
    let b = blog();
    for (t, v) in [("a", 1), ("b", 5), ("c", 9)] {
        b.article(t, v);
    }
    let api = b.api();
    assert_eq!(api.delete_by_filter("articles", &[FilterClause::new("views", Operator::Gte, "20")]).code(), 404);
    assert_eq!(api.delete_by_filter("articles", &[FilterClause::new("views", Operator::Gte, "5")]).code(), 200);
    assert_eq!(b.store.count("articles"), 1);
    assert_eq!(api.delete_by_filter("articles", &[FilterClause::eq("colour", "red")]).code(), 400);
}

#[test]
fn unknown_collection_is_not_found() {
    let b = blog();
    assert_eq!(b.api().insert("comments", &doc! {"x": 1}).code(), 404);
    assert_eq!(b.api().delete_by_id("comments", Some("x")).code(), 404);
}

#[test]
fn typed_fields_written_as_text_are_filterable() {
    let schema = nexus_rest::SchemaMetadata::from_toml_str(
        r#"
        [collections.bookings.fields.day]
        type = "date"
        [collections.bookings.fields.seats]
        type = "integer"
        [collections.bookings.fields.note]
        "#,
    )
    .unwrap();
    let store = nexus_rest::MemoryStore::new();
    let api = nexus_rest::CrudFacade::new(&schema, &store);
    let env = api.insert("bookings", &doc! {"day": "2024-01-02", "seats": "7", "note": "3"});
    assert_eq!(env.code(), 201);
    let id = env.single("bookings").unwrap().get_str("id").unwrap().to_string();
    api.insert("bookings", &doc! {"day": "someday", "seats": "lots"});

    let found = |clause: FilterClause| {
        let env = api.retrieve_list("bookings", &nexus_rest::RequestParams::new().filter(clause));
        env.list("bookings")
            .map(|a| a.iter().map(|d| d.as_document().unwrap().get_str("id").unwrap().to_string()).collect())
            .unwrap_or_else(Vec::new)
    };
    assert_eq!(found(FilterClause::eq("day", "2024-01-02")), [id.clone()]);
    assert_eq!(found(FilterClause::new("seats", Operator::Gte, "3")), [id.clone()]);

    let rec = api.retrieve_by_id("bookings", Some(&id));
    let rec = rec.single("bookings").unwrap();
    assert_eq!(rec.get_str("day").unwrap(), "2024-01-02T00:00:00.000Z");
    assert_eq!(rec.get_i64("seats").unwrap(), 7);
    assert_eq!(rec.get_str("note").unwrap(), "3");
    assert_eq!(store.count("bookings"), 2);
}
