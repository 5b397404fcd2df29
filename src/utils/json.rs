use bson::{Bson, Document as BsonDocument};
use std::io;

use crate::errors::DbError;

fn invalid_data<E>(e: E) -> DbError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    DbError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Convert a `serde_json::Value` that must be an object into a `bson::Document`.
///
/// # Errors
/// Returns an `InvalidData` I/O error when the value is not an object or holds no BSON form.
pub fn json_value_to_bson_document(val: &serde_json::Value) -> Result<BsonDocument, DbError> {
    let obj = val.as_object().ok_or_else(|| invalid_data("expected JSON object"))?;
    BsonDocument::try_from(obj.clone()).map_err(|e| invalid_data(e.to_string()))
}

/// Parse a JSON string into a `bson::Document`. The JSON must be a top-level object.
///
/// # Errors
/// Returns an error for malformed JSON or a non-object top level.
pub fn parse_json_to_bson_document(json: &str) -> Result<BsonDocument, DbError> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    json_value_to_bson_document(&val)
}

/// Relaxed extended JSON form of a document; identifiers render as `{"$oid": ...}`.
#[must_use]
pub fn bson_document_to_json(doc: &BsonDocument) -> serde_json::Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}
