//! Renders stored documents in their external form.

use bson::{Bson, Document as BsonDocument};
use chrono::SecondsFormat;

use crate::schema::CollectionSchema;
use crate::types::ID_FIELD;

/// Project a stored document for a response.
///
/// `_id` is emitted under the identifier's logical name and declared fields under their logical
/// names. Identifiers become hex strings at any depth, dates become RFC 3339 strings, and
/// declared embeds are always present (empty when not stored).
#[must_use]
pub fn project(schema: &CollectionSchema, stored: &BsonDocument) -> BsonDocument {
    let mut out = BsonDocument::new();
    for (key, value) in stored {
        if key == ID_FIELD {
            out.insert(schema.id_field(), externalize(value));
            continue;
        }
        let name = schema.field_by_storage(key).map_or(key.as_str(), |f| f.logical_name.as_str());
        out.insert(name, externalize(value));
    }
    for embed in schema.embeds_one() {
        if !matches!(out.get(embed), Some(Bson::Document(_))) {
            out.insert(embed.as_str(), BsonDocument::new());
        }
    }
    for embed in schema.embeds_many() {
        match out.get(embed) {
            Some(Bson::Array(_)) => {}
            Some(Bson::Document(single)) => {
                let single = single.clone();
                out.insert(embed.as_str(), vec![Bson::Document(single)]);
            }
            _ => {
                out.insert(embed.as_str(), Bson::Array(Vec::new()));
            }
        }
    }
    out
}

#[must_use]
pub fn project_all(schema: &CollectionSchema, stored: &[BsonDocument]) -> Vec<BsonDocument> {
    stored.iter().map(|d| project(schema, d)).collect()
}

/// External form of a stored value, applied recursively.
#[must_use]
pub fn externalize(value: &Bson) -> Bson {
    match value {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        Bson::DateTime(dt) => chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
            .map_or_else(|| Bson::Int64(dt.timestamp_millis()), |t| {
                Bson::String(t.to_rfc3339_opts(SecondsFormat::Millis, true))
            }),
        Bson::Document(d) => {
            Bson::Document(d.iter().map(|(k, v)| (k.clone(), externalize(v))).collect())
        }
        Bson::Array(items) => Bson::Array(items.iter().map(externalize).collect()),
        other => other.clone(),
    }
}
