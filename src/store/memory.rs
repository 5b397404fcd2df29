use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::DocumentStore;
use crate::errors::{DbError, StoreError};
use crate::query::{CompiledQuery, QueryPlan, compare_docs, matches};
use crate::telemetry;
use crate::types::{DocumentId, ID_FIELD, bson_to_document_id, document_id_of};
use crate::utils::json::{bson_document_to_json, json_value_to_bson_document};

/// In-memory document store. Collections keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<BsonDocument>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from `{"<collection>": [documents...]}` JSON.
    ///
    /// `_id` values given as hex strings are converted to identifiers; documents without one
    /// get a fresh identifier.
    ///
    /// # Errors
    /// Returns an error for malformed JSON, a non-array collection or a duplicate `_id`.
    pub fn from_json_str(json: &str) -> Result<Self, DbError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let obj = value.as_object().ok_or_else(|| DbError::Schema("data file must be a JSON object".into()))?;
        let store = Self::new();
        for (name, docs) in obj {
            let items = docs
                .as_array()
                .ok_or_else(|| DbError::Schema(format!("collection {name} must be an array")))?;
            store.ensure_collection(name);
            for item in items {
                let mut doc = json_value_to_bson_document(item)?;
                if let Some(raw) = doc.get(ID_FIELD)
                    && !matches!(raw, Bson::ObjectId(_))
                {
                    let id = bson_to_document_id(raw)
                        .ok_or_else(|| StoreError::Rejected(format!("invalid _id in {name}")))?;
                    doc.insert(ID_FIELD, id);
                }
                store.insert(name, doc)?;
            }
        }
        Ok(store)
    }

    /// # Errors
    /// Returns an I/O error if the file cannot be read, or any `from_json_str` error.
    pub fn load_json(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&text)?;
        log::info!("loaded {} collections from {}", store.collection_names().len(), path.display());
        Ok(store)
    }

    /// Relaxed extended JSON of every collection, sorted by collection name.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let guard = self.collections.read();
        let sorted: BTreeMap<&String, &Vec<BsonDocument>> = guard.iter().collect();
        let mut out = serde_json::Map::new();
        for (name, docs) in sorted {
            out.insert(name.clone(), docs.iter().map(bson_document_to_json).collect());
        }
        serde_json::Value::Object(out)
    }

    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn dump_json(&self, path: &Path) -> Result<(), DbError> {
        let text = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn ensure_collection(&self, name: &str) {
        self.collections.write().entry(name.to_string()).or_default();
    }

    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, Vec::len)
    }
}

impl DocumentStore for MemoryStore {
    fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<BsonDocument>, StoreError> {
        let guard = self.collections.read();
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| document_id_of(d).as_ref() == Some(id)))
            .cloned())
    }

    fn find(
        &self,
        collection: &str,
        query: &CompiledQuery,
        plan: &QueryPlan,
    ) -> Result<Vec<BsonDocument>, StoreError> {
        let start = std::time::Instant::now();
        let mut docs: Vec<BsonDocument> = {
            let guard = self.collections.read();
            guard
                .get(collection)
                .map(|all| all.iter().filter(|d| matches(d, query)).cloned().collect())
                .unwrap_or_default()
        };
        if let Some(sort) = &plan.sort {
            docs.sort_by(|a, b| compare_docs(a, b, sort));
        }
        let docs: Vec<BsonDocument> = docs.into_iter().skip(plan.skip).take(plan.limit).collect();
        telemetry::log_query(collection, start.elapsed().as_millis(), docs.len(), plan.limit, plan.skip);
        Ok(docs)
    }

    fn insert(&self, collection: &str, mut doc: BsonDocument) -> Result<DocumentId, StoreError> {
        let id = match doc.get(ID_FIELD) {
            None => {
                let id = DocumentId::new();
                doc.insert(ID_FIELD, id);
                id
            }
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => return Err(StoreError::Rejected(format!("_id must be an identifier, got {other}"))),
        };
        let mut guard = self.collections.write();
        let docs = guard.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| document_id_of(d) == Some(id)) {
            return Err(StoreError::DuplicateId(id.to_hex()));
        }
        docs.push(doc);
        Ok(id)
    }

    fn save(&self, collection: &str, doc: BsonDocument) -> Result<(), StoreError> {
        let id = document_id_of(&doc).ok_or(StoreError::MissingId)?;
        let mut guard = self.collections.write();
        let docs = guard.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| document_id_of(d) == Some(id)) {
            Some(slot) => *slot = doc,
            None => docs.push(doc),
        }
        Ok(())
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        let mut guard = self.collections.write();
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| document_id_of(d).as_ref() != Some(id));
        Ok(docs.len() != before)
    }
}
