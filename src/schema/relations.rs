//! Registry of many-reference fields with explicit membership capabilities.
//!
//! Each entry is built once when the schema loads. Mutations keep the stored array free of
//! duplicates; order of first insertion is preserved.

use bson::{Bson, Document as BsonDocument};

use crate::types::{DocumentId, bson_to_document_id};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    field: String,
    storage_name: String,
    target: String,
}

impl Relation {
    #[must_use]
    pub fn new(field: &str, storage_name: &str, target: &str) -> Self {
        Self { field: field.to_string(), storage_name: storage_name.to_string(), target: target.to_string() }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Collection the member identifiers point into.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current members of the relation on `owner`.
    #[must_use]
    pub fn get(&self, owner: &BsonDocument) -> Vec<DocumentId> {
        match owner.get(&self.storage_name) {
            Some(Bson::Array(items)) => {
                let mut out: Vec<DocumentId> = Vec::with_capacity(items.len());
                for id in items.iter().filter_map(bson_to_document_id) {
                    if !out.contains(&id) {
                        out.push(id);
                    }
                }
                out
            }
            Some(single) => bson_to_document_id(single).into_iter().collect(),
            None => Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, owner: &BsonDocument, id: &DocumentId) -> bool {
        self.get(owner).contains(id)
    }

    /// Add `id` unless already present. Returns whether the owner changed.
    pub fn add(&self, owner: &mut BsonDocument, id: DocumentId) -> bool {
        let mut members = self.get(owner);
        if members.contains(&id) {
            return false;
        }
        members.push(id);
        self.store(owner, members);
        true
    }

    /// Remove `id` if present. Returns whether the owner changed.
    pub fn remove(&self, owner: &mut BsonDocument, id: &DocumentId) -> bool {
        let mut members = self.get(owner);
        let before = members.len();
        members.retain(|m| m != id);
        if members.len() == before {
            return false;
        }
        self.store(owner, members);
        true
    }

    /// Replace all members. Duplicates in `ids` collapse. Returns whether the owner changed.
    pub fn replace<I>(&self, owner: &mut BsonDocument, ids: I) -> bool
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let mut members: Vec<DocumentId> = Vec::new();
        for id in ids {
            if !members.contains(&id) {
                members.push(id);
            }
        }
        let changed = self.get(owner) != members || !self.is_normalized(owner);
        self.store(owner, members);
        changed
    }

    /// Drop every member. Returns how many were removed.
    pub fn clear(&self, owner: &mut BsonDocument) -> usize {
        let removed = self.get(owner).len();
        self.store(owner, Vec::new());
        removed
    }

    fn is_normalized(&self, owner: &BsonDocument) -> bool {
        match owner.get(&self.storage_name) {
            Some(Bson::Array(items)) => items.iter().all(|b| matches!(b, Bson::ObjectId(_))),
            _ => false,
        }
    }

    fn store(&self, owner: &mut BsonDocument, members: Vec<DocumentId>) {
        owner.insert(
            self.storage_name.clone(),
            Bson::Array(members.into_iter().map(Bson::ObjectId).collect()),
        );
    }
}
