//! Write path: turns supplied field/value pairs into storage-ready writes.
//!
//! Lenient by contract. Undeclared fields are ignored and unresolvable references are dropped,
//! unlike the filter compiler which rejects the whole request.

use bson::{Bson, Document as BsonDocument};

use crate::errors::DbError;
use crate::query;
use crate::schema::{CollectionSchema, FieldDescriptor, ReferenceArity, ValueType};
use crate::store::DocumentStore;
use crate::types::{DocumentId, bson_to_document_id};

/// Tokens that ask for a relation to be cleared when they match no foreign record.
pub const FALSY_TOKENS: [&str; 3] = ["0", "false", "null"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceValue {
    One(DocumentId),
    Many(Vec<DocumentId>),
}

/// Outcome of resolving one reference field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceState {
    Resolved(ReferenceValue),
    /// The caller asked for no relation.
    ExplicitClear,
    /// Nothing matched; the field is left untouched.
    Unresolved,
}

/// A storage-level write produced by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Set(Bson),
    Unset,
}

/// Storage name paired with the write to apply there, in input order.
pub type ResolvedFields = Vec<(String, FieldWrite)>;

#[must_use]
pub fn is_falsy(value: &Bson) -> bool {
    match value {
        Bson::String(s) => FALSY_TOKENS.contains(&s.trim()),
        Bson::Null | Bson::Boolean(false) => true,
        _ => false,
    }
}

pub struct FieldResolver<'a, S: DocumentStore + ?Sized> {
    schema: &'a CollectionSchema,
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> FieldResolver<'a, S> {
    pub const fn new(schema: &'a CollectionSchema, store: &'a S) -> Self {
        Self { schema, store }
    }

    /// Resolve every declared field of `fields`.
    ///
    /// # Errors
    /// Only store failures while looking up foreign records.
    pub fn resolve(&self, fields: &BsonDocument) -> Result<ResolvedFields, DbError> {
        let mut out = ResolvedFields::new();
        for (name, value) in fields {
            if self.schema.is_id_field(name) {
                log::debug!("{}: identifier is not writable, ignoring", self.schema.name());
                continue;
            }
            let Some(field) = self.schema.field(name) else {
                log::debug!("{}: ignoring undeclared field {name}", self.schema.name());
                continue;
            };
            if !field.is_reference() {
                out.push((field.storage_name.clone(), FieldWrite::Set(typed_value(field, value))));
                continue;
            }
            let write = match self.resolve_reference(field, value)? {
                ReferenceState::Resolved(ReferenceValue::One(id)) => FieldWrite::Set(Bson::ObjectId(id)),
                ReferenceState::Resolved(ReferenceValue::Many(ids)) => {
                    FieldWrite::Set(Bson::Array(ids.into_iter().map(Bson::ObjectId).collect()))
                }
                ReferenceState::ExplicitClear => match field.arity {
                    ReferenceArity::Many => FieldWrite::Set(Bson::Array(Vec::new())),
                    _ => FieldWrite::Unset,
                },
                ReferenceState::Unresolved => {
                    log::debug!("{}: dropping unresolved reference {name}", self.schema.name());
                    continue;
                }
            };
            out.push((field.storage_name.clone(), write));
        }
        Ok(out)
    }

    /// Resolve a reference field value against its target collection.
    ///
    /// # Errors
    /// Only store failures.
    pub fn resolve_reference(
        &self,
        field: &FieldDescriptor,
        value: &Bson,
    ) -> Result<ReferenceState, DbError> {
        let Some(target) = field.referenced_collection.as_deref() else {
            return Ok(ReferenceState::Unresolved);
        };
        match field.arity {
            ReferenceArity::None => Ok(ReferenceState::Unresolved),
            ReferenceArity::One => {
                if let Some(id) = self.existing(target, value)? {
                    return Ok(ReferenceState::Resolved(ReferenceValue::One(id)));
                }
                Ok(if is_falsy(value) { ReferenceState::ExplicitClear } else { ReferenceState::Unresolved })
            }
            ReferenceArity::Many => {
                let candidates: Vec<&Bson> = match value {
                    Bson::Array(items) => items.iter().collect(),
                    single => vec![single],
                };
                let mut ids: Vec<DocumentId> = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    if let Some(id) = self.existing(target, candidate)?
                        && !ids.contains(&id)
                    {
                        ids.push(id);
                    }
                }
                Ok(if ids.is_empty() {
                    ReferenceState::ExplicitClear
                } else {
                    ReferenceState::Resolved(ReferenceValue::Many(ids))
                })
            }
        }
    }

    /// Identifiers of the records `ids` that exist in `target`, in first-seen order.
    ///
    /// # Errors
    /// Only store failures.
    pub fn existing_ids<'v, I>(&self, target: &str, ids: I) -> Result<Vec<DocumentId>, DbError>
    where
        I: IntoIterator<Item = &'v str>,
    {
        let mut out: Vec<DocumentId> = Vec::new();
        for raw in ids {
            if let Some(id) = self.existing(target, &Bson::String(raw.to_string()))?
                && !out.contains(&id)
            {
                out.push(id);
            }
        }
        Ok(out)
    }

    fn existing(&self, target: &str, value: &Bson) -> Result<Option<DocumentId>, DbError> {
        let Some(id) = bson_to_document_id(value) else {
            return Ok(None);
        };
        Ok(self.store.exists(target, &id)?.then_some(id))
    }
}

/// Text written to a typed field is stored in its declared type; text that does not convert is
/// kept as sent.
fn typed_value(field: &FieldDescriptor, value: &Bson) -> Bson {
    match (value, field.value_type) {
        (_, ValueType::String | ValueType::Raw) => value.clone(),
        (Bson::String(raw), ty) => query::coerce(&field.logical_name, raw, ty).unwrap_or_else(|_| {
            log::debug!("{}: keeping {raw:?} as text, not a valid {}", field.logical_name, ty.name());
            value.clone()
        }),
        _ => value.clone(),
    }
}

/// Apply resolved writes to a stored document, one field at a time.
pub fn apply_writes(doc: &mut BsonDocument, writes: ResolvedFields) {
    for (storage, write) in writes {
        match write {
            FieldWrite::Set(value) => {
                doc.insert(storage, value);
            }
            FieldWrite::Unset => {
                doc.remove(&storage);
            }
        }
    }
}
