use bson::{Document as BsonDocument, doc};
use nexus_rest::query::{CompiledQuery, QueryPlan};
use nexus_rest::types::DocumentId;
use nexus_rest::{CrudFacade, DocumentStore, FilterClause, Operator, RequestParams, StoreError};

use super::_support::{BLOG, blog};

fn titles(env: &nexus_rest::ResponseEnvelope) -> Vec<String> {
    env.list("articles")
        .map(|a| {
            a.iter()
                .map(|d| d.as_document().unwrap().get_str("title").unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn seed(b: &super::_support::Blog) {
    for (title, views) in [("Alice", 1), ("alice in chains", 3), ("Bob", 7), ("Carol", 10), ("Dave", 12)] {
        b.article(title, views);
    }
}

#[test]
fn default_eq_on_text_is_case_insensitive_whole_string() {
    let b = blog();
    seed(&b);
    let env = b.api().retrieve_list("articles", &RequestParams::new().filter(FilterClause::eq("title", "ALICE")));
    assert_eq!(titles(&env), ["Alice"]);
    let env = b.api().retrieve_list("articles", &RequestParams::new().filter(FilterClause::eq("title", "ali")));
    assert_eq!(env.code(), 200);
    assert!(env.payload.is_none());
}

#[test]
fn multi_valued_lower_bound_uses_the_maximum() {
    let b = blog();
    seed(&b);
    let req = RequestParams::new()
        .filter(FilterClause::any_of("views", Operator::Gte, ["3", "7", "1"]))
        .param("orderBy", "views");
    assert_eq!(titles(&b.api().retrieve_list("articles", &req)), ["Bob", "Carol", "Dave"]);
    let req = RequestParams::new()
        .filter(FilterClause::any_of("views", Operator::Lt, ["10", "3", "12"]))
        .param("orderBy", "views");
    assert_eq!(titles(&b.api().retrieve_list("articles", &req)), ["Alice"]);
}

#[test]
fn clauses_on_one_field_intersect() {
    let b = blog();
    seed(&b);
    let req = RequestParams::new()
        .filter(FilterClause::new("views", Operator::Gte, "3"))
        .filter(FilterClause::new("views", Operator::Lt, "10"))
        .param("orderBy", "views");
    assert_eq!(titles(&b.api().retrieve_list("articles", &req)), ["alice in chains", "Bob"]);
}

#[test]
fn like_and_eq_unions() {
    let b = blog();
    seed(&b);
    let req = RequestParams::new()
        .filter(FilterClause::any_of("title", Operator::Like, ["CHAIN", "car"]))
        .param("orderBy", "title");
    assert_eq!(titles(&b.api().retrieve_list("articles", &req)), ["Carol", "alice in chains"]);
    let req = RequestParams::new()
        .filter(FilterClause::any_of("title", Operator::Eq, ["bob", "dave"]))
        .param("orderBy", "views")
        .param("orderWay", "desc");
    assert_eq!(titles(&b.api().retrieve_list("articles", &req)), ["Dave", "Bob"]);
}

#[test]
fn unknown_field_fails_whole_request() {
    let b = blog();
    seed(&b);
    let req = RequestParams::new()
        .filter(FilterClause::eq("title", "Bob"))
        .filter(FilterClause::eq("rating", "5"));
    assert_eq!(b.api().retrieve_list("articles", &req).code(), 400);
}

#[test]
fn malformed_values_are_bad_requests() {
    let b = blog();
    seed(&b);
    for clause in [
        FilterClause::eq("views", "many"),
        FilterClause::eq("published", "perhaps"),
        FilterClause::new("title", Operator::Like, "(unclosed"),
        FilterClause::eq("author", "not-an-id"),
    ] {
        let env = b.api().retrieve_list("articles", &RequestParams::new().filter(clause.clone()));
        assert_eq!(env.code(), 400, "{clause:?}");
    }
}

#[test]
fn pages_follow_sort_order() {
    let b = blog();
    seed(&b);
    let page = |n: &str| {
        let req = RequestParams::new()
            .param("orderBy", "views")
            .param("orderWay", "DESC")
            .param("pageSize", "2")
            .param("pageNum", n);
        titles(&b.api().retrieve_list("articles", &req))
    };
    assert_eq!(page("1"), ["Dave", "Carol"]);
    assert_eq!(page("2"), ["Bob", "alice in chains"]);
    assert_eq!(page("3"), ["Alice"]);
    assert!(page("4").is_empty());
    assert_eq!(page("0"), page("1"));
}

#[test]
fn filters_on_references_and_identifiers() {
    let b = blog();
    let mine = b.create("articles", &doc! {"title": "mine", "author": b.ann.clone()});
    b.create("articles", &doc! {"title": "theirs", "author": b.bob.clone()});
    let env = b.api().retrieve_list("articles", &RequestParams::new().filter(FilterClause::eq("author", b.ann.clone())));
    assert_eq!(titles(&env), ["mine"]);
    let env = b.api().retrieve_list("articles", &RequestParams::new().filter(FilterClause::eq("id", mine.clone())));
    assert_eq!(titles(&env), ["mine"]);
    let env = b.api().retrieve_list(
        "articles",
        &RequestParams::new().filter(FilterClause::any_of("_id", Operator::Eq, [mine, DocumentId::new().to_hex()])),
    );
    assert_eq!(titles(&env), ["mine"]);
}

/// Store double whose queries always fail the way a strict backend does.
struct MismatchStore;

impl DocumentStore for MismatchStore {
    fn find_by_id(&self, _: &str, _: &DocumentId) -> Result<Option<BsonDocument>, StoreError> {
        Ok(None)
    }

    fn find(&self, _: &str, _: &CompiledQuery, _: &QueryPlan) -> Result<Vec<BsonDocument>, StoreError> {
        Err(StoreError::TypeMismatch("v".into()))
    }

    fn insert(&self, _: &str, _: BsonDocument) -> Result<DocumentId, StoreError> {
        Err(StoreError::DuplicateId("x".into()))
    }

    fn save(&self, _: &str, _: BsonDocument) -> Result<(), StoreError> {
        Ok(())
    }

    fn delete(&self, _: &str, _: &DocumentId) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[test]
fn store_type_mismatch_is_not_found() {
    let schema = nexus_rest::SchemaMetadata::from_toml_str(BLOG).unwrap();
    let api = CrudFacade::new(&schema, &MismatchStore);
    let req = RequestParams::new().filter(FilterClause::new("views", Operator::Gt, "1"));
    assert_eq!(api.retrieve_list("articles", &req).code(), 404);
    assert_eq!(api.insert("articles", &doc! {"title": "x"}).code(), 400);
}
