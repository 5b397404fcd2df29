//! CRUD entry points. Every operation answers with a `ResponseEnvelope`; failures are mapped to
//! their status code instead of being returned as errors.

use bson::Document as BsonDocument;

use crate::errors::{DbError, StoreError};
use crate::mutator::ReferenceMutator;
use crate::project::{project, project_all};
use crate::query::{CompiledQuery, FilterClause, QueryPlan, compile_filters};
use crate::resolve::{FieldResolver, apply_writes};
use crate::response::{ResponseEnvelope, Status};
use crate::schema::{CollectionSchema, SchemaMetadata};
use crate::store::DocumentStore;
use crate::telemetry;
use crate::types::{DocumentId, document_id_of, parse_document_id};

/// Typed filter clauses plus the raw sort/paging parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub filters: Vec<FilterClause>,
    pub params: Vec<(String, String)>,
}

impl RequestParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.filters.push(clause);
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn plan(&self) -> QueryPlan {
        QueryPlan::from_params(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

pub struct CrudFacade<'a, S: DocumentStore + ?Sized> {
    schema: &'a SchemaMetadata,
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> CrudFacade<'a, S> {
    pub const fn new(schema: &'a SchemaMetadata, store: &'a S) -> Self {
        Self { schema, store }
    }

    pub fn retrieve_by_id(&self, collection: &str, id: Option<&str>) -> ResponseEnvelope {
        respond(self.try_retrieve_by_id(collection, id))
    }

    pub fn retrieve_list(&self, collection: &str, request: &RequestParams) -> ResponseEnvelope {
        respond(self.try_retrieve_list(collection, request))
    }

    pub fn insert(&self, collection: &str, fields: &BsonDocument) -> ResponseEnvelope {
        respond(self.try_insert(collection, fields))
    }

    /// Creating a record under a caller-chosen identifier is never allowed.
    pub fn insert_with_explicit_id(&self, collection: &str, id: &str, _fields: &BsonDocument) -> ResponseEnvelope {
        log::debug!("refusing insert into {collection} with explicit id {id}");
        respond(Err(DbError::ExplicitId))
    }

    pub fn update(&self, collection: &str, id: Option<&str>, fields: &BsonDocument) -> ResponseEnvelope {
        respond(self.try_update(collection, id, fields))
    }

    pub fn delete_by_id(&self, collection: &str, id: Option<&str>) -> ResponseEnvelope {
        respond(self.try_delete_by_id(collection, id))
    }

    pub fn delete_by_filter(&self, collection: &str, filters: &[FilterClause]) -> ResponseEnvelope {
        respond(self.try_delete_by_filter(collection, filters))
    }

    pub fn replace_collection(&self, collection: &str, id: &str, field: &str, ids: &[&str]) -> ResponseEnvelope {
        respond(self.mutator(collection).and_then(|m| m.replace(id, field, ids)).map(|_| ok()))
    }

    pub fn add_to_collection(&self, collection: &str, id: &str, field: &str, foreign_id: &str) -> ResponseEnvelope {
        respond(self.mutator(collection).and_then(|m| m.add(id, field, foreign_id)).map(|_| ok()))
    }

    pub fn remove_from_collection(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        foreign_id: &str,
    ) -> ResponseEnvelope {
        respond(self.mutator(collection).and_then(|m| m.remove(id, field, foreign_id)).map(|_| ok()))
    }

    pub fn clear_collection(&self, collection: &str, id: &str, field: &str) -> ResponseEnvelope {
        respond(self.mutator(collection).and_then(|m| m.clear(id, field)).map(|_| ok()))
    }

    fn mutator(&self, collection: &str) -> Result<ReferenceMutator<'a, S>, DbError> {
        Ok(ReferenceMutator::new(self.schema.collection(collection)?, self.store))
    }

    fn try_retrieve_by_id(&self, collection: &str, id: Option<&str>) -> Result<ResponseEnvelope, DbError> {
        let id = required_id(id)?;
        let schema = self.schema.collection(collection)?;
        let stored = self.find_existing(schema, id)?;
        Ok(ResponseEnvelope::record(Status::Ok, collection, project(schema, &stored)))
    }

    fn try_retrieve_list(&self, collection: &str, request: &RequestParams) -> Result<ResponseEnvelope, DbError> {
        let schema = self.schema.collection(collection)?;
        let query = compile_filters(schema, &request.filters)?;
        let plan = request.plan().resolve_sort(schema);
        let found = self.store.find(collection, &query, &plan)?;
        if found.is_empty() {
            return Ok(ResponseEnvelope::empty(Status::Ok));
        }
        Ok(ResponseEnvelope::records(Status::Ok, collection, project_all(schema, &found)))
    }

    fn try_insert(&self, collection: &str, fields: &BsonDocument) -> Result<ResponseEnvelope, DbError> {
        let schema = self.schema.collection(collection)?;
        let writes = FieldResolver::new(schema, self.store).resolve(fields)?;
        let mut doc = BsonDocument::new();
        apply_writes(&mut doc, writes);
        let id = self.store.insert(collection, doc)?;
        telemetry::log_audit("insert", collection, &id.to_hex());
        let stored = self
            .store
            .find_by_id(collection, &id)?
            .ok_or_else(|| DbError::NoSuchDocument(format!("{collection}/{id}")))?;
        Ok(ResponseEnvelope::record(Status::Created, collection, project(schema, &stored)))
    }

    fn try_update(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: &BsonDocument,
    ) -> Result<ResponseEnvelope, DbError> {
        let id = required_id(id)?;
        let schema = self.schema.collection(collection)?;
        let mut stored = self.find_existing(schema, id)?;
        let writes = FieldResolver::new(schema, self.store).resolve(fields)?;
        apply_writes(&mut stored, writes);
        self.store.save(collection, stored)?;
        telemetry::log_audit("update", collection, id);
        Ok(ok())
    }

    fn try_delete_by_id(&self, collection: &str, id: Option<&str>) -> Result<ResponseEnvelope, DbError> {
        let raw = required_id(id)?;
        let schema = self.schema.collection(collection)?;
        let id = parse_document_id(raw).ok_or_else(|| not_found(schema, raw))?;
        self.delete_matching(schema, &CompiledQuery::id_equals(id))
    }

    fn try_delete_by_filter(
        &self,
        collection: &str,
        filters: &[FilterClause],
    ) -> Result<ResponseEnvelope, DbError> {
        let schema = self.schema.collection(collection)?;
        let query = compile_filters(schema, filters)?;
        self.delete_matching(schema, &query)
    }

    fn delete_matching(&self, schema: &CollectionSchema, query: &CompiledQuery) -> Result<ResponseEnvelope, DbError> {
        let collection = schema.name();
        let matched = self.store.find(collection, query, &QueryPlan::default())?;
        if matched.is_empty() {
            return Err(DbError::NoSuchDocument(format!("{collection}: no document matches")));
        }
        let ids: Vec<DocumentId> = matched.iter().filter_map(document_id_of).collect();
        for id in &ids {
            if self.store.delete(collection, id)? {
                telemetry::log_audit("delete", collection, &id.to_hex());
            }
        }
        log::debug!("deleted {} documents from {collection}", ids.len());
        Ok(ok())
    }

    fn find_existing(&self, schema: &CollectionSchema, raw: &str) -> Result<BsonDocument, DbError> {
        let id = parse_document_id(raw).ok_or_else(|| not_found(schema, raw))?;
        self.store.find_by_id(schema.name(), &id)?.ok_or_else(|| not_found(schema, raw))
    }
}

fn required_id(id: Option<&str>) -> Result<&str, DbError> {
    id.map(str::trim).filter(|s| !s.is_empty()).ok_or(DbError::MissingId)
}

fn not_found(schema: &CollectionSchema, raw: &str) -> DbError {
    DbError::NoSuchDocument(format!("{}/{raw}", schema.name()))
}

const fn ok() -> ResponseEnvelope {
    ResponseEnvelope::empty(Status::Ok)
}

fn respond(result: Result<ResponseEnvelope, DbError>) -> ResponseEnvelope {
    match result {
        Ok(env) => env,
        Err(err) => {
            let status = err.status();
            log::log!(refusal_level(&err), "request refused ({status}): {err}");
            telemetry::record_refused();
            ResponseEnvelope::from_error(&err)
        }
    }
}

/// Store failures other than a type mismatch are errors; other client errors are warnings and
/// lookups that miss or are forbidden are debug noise.
fn refusal_level(err: &DbError) -> log::Level {
    match err {
        DbError::Store(StoreError::TypeMismatch(_)) => log::Level::Debug,
        DbError::Store(_) => log::Level::Error,
        _ => match err.status() {
            Status::NotFound | Status::Forbidden => log::Level::Debug,
            _ => log::Level::Warn,
        },
    }
}
