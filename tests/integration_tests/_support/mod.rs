#![allow(dead_code)]

use bson::{Document as BsonDocument, doc};
use nexus_rest::{CrudFacade, MemoryStore, SchemaMetadata, Status};

pub const BLOG: &str = r#"
[collections.authors.fields.name]

[collections.tags.fields.label]

[collections.articles]
embeds_one = ["meta"]
embeds_many = ["comments"]

[collections.articles.fields.title]
type = "string"

[collections.articles.fields.views]
type = "integer"
db_name = "v"

[collections.articles.fields.published]
type = "boolean"

[collections.articles.fields.author]
db_name = "author_id"
reference = { collection = "authors", arity = "one" }

[collections.articles.fields.tags]
db_name = "tag_ids"
reference = { collection = "tags", arity = "many" }
"#;

/// Blog schema, an in-memory store with two authors and two tags.
pub struct Blog {
    pub schema: SchemaMetadata,
    pub store: MemoryStore,
    pub ann: String,
    pub bob: String,
    pub rust: String,
    pub go: String,
}

pub fn blog() -> Blog {
    let schema = SchemaMetadata::from_toml_str(BLOG).unwrap();
    let store = MemoryStore::new();
    let mut blog = Blog { schema, store, ann: String::new(), bob: String::new(), rust: String::new(), go: String::new() };
    blog.ann = blog.create("authors", &doc! {"name": "ann"});
    blog.bob = blog.create("authors", &doc! {"name": "bob"});
    blog.rust = blog.create("tags", &doc! {"label": "rust"});
    blog.go = blog.create("tags", &doc! {"label": "go"});
    blog
}

impl Blog {
    pub fn api(&self) -> CrudFacade<'_, MemoryStore> {
        CrudFacade::new(&self.schema, &self.store)
    }

    /// Insert through the facade and return the new id.
    pub fn create(&self, collection: &str, fields: &BsonDocument) -> String {
        let env = self.api().insert(collection, fields);
        assert_eq!(env.status, Status::Created, "insert into {collection} failed");
        env.single(collection).unwrap().get_str("id").unwrap().to_string()
    }

    pub fn article(&self, title: &str, views: i64) -> String {
        self.create("articles", &doc! {"title": title, "views": views})
    }

    /// Projected record, panicking when it does not exist.
    pub fn get(&self, collection: &str, id: &str) -> BsonDocument {
        let env = self.api().retrieve_by_id(collection, Some(id));
        assert_eq!(env.code(), 200, "{collection}/{id} not found");
        env.single(collection).unwrap().clone()
    }

    pub fn tag_ids(&self, article: &str) -> Vec<String> {
        self.get("articles", article)
            .get_array("tags")
            .map(|a| a.iter().filter_map(|b| b.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }
}
