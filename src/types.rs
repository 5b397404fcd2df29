use bson::oid::ObjectId;
use bson::{Bson, Document as BsonDocument};

/// Storage name of the identifier field.
pub const ID_FIELD: &str = "_id";

/// Identifier type used by the document store.
pub type DocumentId = ObjectId;

/// Parse an external identifier string. `None` when the input is not a valid identifier.
#[must_use]
pub fn parse_document_id(raw: &str) -> Option<DocumentId> {
    ObjectId::parse_str(raw.trim()).ok()
}

/// Identifier carried by a write-path value: a native id or its hex string form.
#[must_use]
pub fn bson_to_document_id(value: &Bson) -> Option<DocumentId> {
    match value {
        Bson::ObjectId(oid) => Some(*oid),
        Bson::String(s) => parse_document_id(s),
        _ => None,
    }
}

/// The `_id` of a stored document, if it carries one.
#[must_use]
pub fn document_id_of(doc: &BsonDocument) -> Option<DocumentId> {
    match doc.get(ID_FIELD) {
        Some(Bson::ObjectId(oid)) => Some(*oid),
        _ => None,
    }
}
