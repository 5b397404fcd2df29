//! Seam between the translation engine and the document store it drives.

mod memory;

pub use memory::MemoryStore;

use bson::Document as BsonDocument;

use crate::errors::StoreError;
use crate::query::{CompiledQuery, QueryPlan};
use crate::types::DocumentId;

/// Operations the CRUD facade needs from a document store.
///
/// Documents are keyed by an `_id` identifier. Implementations decide how compiled queries are
/// executed; a store that cannot compare a stored value with a query operand reports
/// `StoreError::TypeMismatch`.
pub trait DocumentStore: Send + Sync {
    fn find_by_id(&self, collection: &str, id: &DocumentId)
    -> Result<Option<BsonDocument>, StoreError>;

    fn find(
        &self,
        collection: &str,
        query: &CompiledQuery,
        plan: &QueryPlan,
    ) -> Result<Vec<BsonDocument>, StoreError>;

    /// Persist a new document, assigning an `_id` when it has none.
    fn insert(&self, collection: &str, doc: BsonDocument) -> Result<DocumentId, StoreError>;

    /// Write back a document carrying an `_id`, replacing the stored version.
    fn save(&self, collection: &str, doc: BsonDocument) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError>;

    fn exists(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        Ok(self.find_by_id(collection, id)?.is_some())
    }
}
