use nexus_rest::cli::{Command, parse_filter_arg, parse_param_arg, run};
use nexus_rest::config::AppConfig;
use nexus_rest::{CrudFacade, MemoryStore, SchemaMetadata};

use super::_support::BLOG;

#[test]
fn commands_round_trip_through_a_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.toml");
    let data_path = dir.path().join("data.json");
    std::fs::write(&schema_path, BLOG).unwrap();
    std::fs::write(
        dir.path().join("nexus-rest.toml"),
        format!(
            "schema_path = \"{}\"\ndata_path = \"{}\"\ndefault_collection = \"articles\"\n",
            schema_path.display(),
            data_path.display()
        ),
    )
    .unwrap();

    let cfg = AppConfig::load(&[dir.path().join("nexus-rest.toml")], |_| None).unwrap();
    assert_eq!(cfg.default_collection.as_deref(), Some("articles"));
    let schema = SchemaMetadata::load(cfg.schema_path.as_ref().unwrap()).unwrap();

    let store = MemoryStore::new();
    let api = CrudFacade::new(&schema, &store);
    let tag = run(&api, Command::Insert { collection: "tags".into(), fields: bson::doc! {"label": "rust"} });
    let tag_id = tag.single("tags").unwrap().get_str("id").unwrap().to_string();
    let created = run(
        &api,
        Command::Insert { collection: "articles".into(), fields: bson::doc! {"title": "Intro", "views": 4_i64} },
    );
    let article = created.single("articles").unwrap().get_str("id").unwrap().to_string();
    let linked = run(
        &api,
        Command::Link { collection: "articles".into(), id: article.clone(), field: "tags".into(), foreign_id: tag_id.clone() },
    );
    assert_eq!(linked.code(), 200);
    store.dump_json(cfg.data_path.as_ref().unwrap()).unwrap();

    let reloaded = MemoryStore::load_json(&data_path).unwrap();
    let api = CrudFacade::new(&schema, &reloaded);
    let listed = run(
        &api,
        Command::Get {
            collection: "articles".into(),
            id: None,
            filters: vec![parse_filter_arg("views:gte=1,4").unwrap(), parse_filter_arg(&format!("tags={tag_id}")).unwrap()],
            params: vec![parse_param_arg("orderBy=title").unwrap()],
        },
    );
    let records = listed.list("articles").unwrap();
    assert_eq!(records.len(), 1);
    let json = listed.to_json().unwrap();
    assert_eq!(json["status"], 200);
    assert_eq!(json["payload"]["articles"][0]["id"], serde_json::json!(article));
    assert_eq!(json["payload"]["articles"][0]["tags"][0], serde_json::json!(tag_id));
}

#[test]
fn mutations_are_flagged() {
    let get = Command::Get { collection: "a".into(), id: None, filters: vec![], params: vec![] };
    assert!(!get.is_mutation());
    assert!(Command::ClearLinks { collection: "a".into(), id: "x".into(), field: "f".into() }.is_mutation());
}
