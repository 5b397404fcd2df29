//! Set, add, remove and clear on many-reference fields.
//!
//! Preconditions are checked in a fixed order: the field must be declared (404), it must be a
//! many-reference (403), then the owner must exist (404). The owner is written back only when
//! its membership changed.

use bson::Document as BsonDocument;

use crate::errors::DbError;
use crate::resolve::FieldResolver;
use crate::schema::{CollectionSchema, Relation};
use crate::store::DocumentStore;
use crate::telemetry;
use crate::types::{DocumentId, parse_document_id};

pub struct ReferenceMutator<'a, S: DocumentStore + ?Sized> {
    schema: &'a CollectionSchema,
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> ReferenceMutator<'a, S> {
    pub const fn new(schema: &'a CollectionSchema, store: &'a S) -> Self {
        Self { schema, store }
    }

    /// Replace the whole relation with the members of `ids` that exist. Unknown ids are dropped.
    ///
    /// # Errors
    /// Precondition failures and store failures.
    pub fn replace(&self, owner_id: &str, field: &str, ids: &[&str]) -> Result<bool, DbError> {
        let (relation, mut owner) = self.prepare(owner_id, field)?;
        let resolved =
            FieldResolver::new(self.schema, self.store).existing_ids(relation.target(), ids.iter().copied())?;
        let changed = relation.replace(&mut owner, resolved);
        self.persist_if(changed, "set_links", owner_id, owner)?;
        Ok(changed)
    }

    /// Add `foreign_id` unless it is already a member.
    ///
    /// # Errors
    /// `NoSuchDocument` when the foreign record is missing, plus precondition failures.
    pub fn add(&self, owner_id: &str, field: &str, foreign_id: &str) -> Result<bool, DbError> {
        let (relation, mut owner) = self.prepare(owner_id, field)?;
        let foreign = self.foreign(relation, foreign_id)?;
        let changed = relation.add(&mut owner, foreign);
        self.persist_if(changed, "link", owner_id, owner)?;
        Ok(changed)
    }

    /// Remove `foreign_id` if it is a member.
    ///
    /// # Errors
    /// `NoSuchDocument` when the foreign record is missing, plus precondition failures.
    pub fn remove(&self, owner_id: &str, field: &str, foreign_id: &str) -> Result<bool, DbError> {
        let (relation, mut owner) = self.prepare(owner_id, field)?;
        let foreign = self.foreign(relation, foreign_id)?;
        let changed = relation.remove(&mut owner, &foreign);
        self.persist_if(changed, "unlink", owner_id, owner)?;
        Ok(changed)
    }

    /// Drop every member. Returns how many were removed.
    ///
    /// # Errors
    /// Precondition failures and store failures.
    pub fn clear(&self, owner_id: &str, field: &str) -> Result<usize, DbError> {
        let (relation, mut owner) = self.prepare(owner_id, field)?;
        let removed = relation.clear(&mut owner);
        self.persist_if(removed > 0, "clear_links", owner_id, owner)?;
        Ok(removed)
    }

    fn prepare(&self, owner_id: &str, field: &str) -> Result<(&'a Relation, BsonDocument), DbError> {
        let relation = self.schema.relation(field).map_err(|e| match e {
            DbError::UnknownField(f) => DbError::NoSuchField(f),
            other => other,
        })?;
        let owner = parse_document_id(owner_id)
            .map(|id| self.store.find_by_id(self.schema.name(), &id))
            .transpose()?
            .flatten()
            .ok_or_else(|| DbError::NoSuchDocument(format!("{}/{owner_id}", self.schema.name())))?;
        Ok((relation, owner))
    }

    fn foreign(&self, relation: &Relation, raw: &str) -> Result<DocumentId, DbError> {
        let missing = || DbError::NoSuchDocument(format!("{}/{raw}", relation.target()));
        let id = parse_document_id(raw).ok_or_else(missing)?;
        if self.store.exists(relation.target(), &id)? { Ok(id) } else { Err(missing()) }
    }

    fn persist_if(&self, changed: bool, op: &str, owner_id: &str, owner: BsonDocument) -> Result<(), DbError> {
        if !changed {
            log::debug!("{op} on {}/{owner_id}: membership unchanged", self.schema.name());
            return Ok(());
        }
        self.store.save(self.schema.name(), owner)?;
        telemetry::log_audit(op, self.schema.name(), owner_id);
        Ok(())
    }
}
