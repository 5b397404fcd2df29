use bson::Bson;

use super::coerce::{coerce, coerce_id};
use super::ops::{multi_value, single_value};
use super::types::{CompiledQuery, FilterClause, Predicate};
use crate::errors::DbError;
use crate::schema::CollectionSchema;
use crate::telemetry::METRICS_TARGET;
use crate::types::ID_FIELD;
use crate::utils::json::bson_document_to_json;

/// Compile request filter clauses against `schema`.
///
/// Strict: an unknown field, an uncoercible value or an invalid pattern fails the whole
/// compilation. Clauses on the same storage field are intersected.
///
/// # Errors
/// Returns the first clause failure; no partial query is produced.
pub fn compile_filters(
    schema: &CollectionSchema,
    clauses: &[FilterClause],
) -> Result<CompiledQuery, DbError> {
    let mut query = CompiledQuery::new();
    for clause in clauses {
        let (storage, predicate) = compile_clause(schema, clause)?;
        query.and(storage, predicate);
    }
    if log::log_enabled!(target: METRICS_TARGET, log::Level::Debug) {
        log::debug!(target: METRICS_TARGET, "{}", compile_line(schema.name(), clauses.len(), &query));
    }
    Ok(query)
}

/// Structured metrics line for one compilation, including the rendered criteria.
fn compile_line(collection: &str, clause_count: usize, query: &CompiledQuery) -> String {
    serde_json::json!({
        "op": "compile",
        "collection": collection,
        "clauses": clause_count,
        "fields": query.len(),
        "criteria": bson_document_to_json(&query.to_document()),
    })
    .to_string()
}

fn compile_clause<'s>(
    schema: &'s CollectionSchema,
    clause: &FilterClause,
) -> Result<(&'s str, Predicate), DbError> {
    if clause.values.is_empty() {
        return Err(DbError::EmptyClause(clause.field.clone()));
    }
    let multi = clause.multi_valued || clause.values.len() > 1;

    if schema.is_id_field(&clause.field) {
        let ids = parse_ids(&clause.field, &clause.values)?;
        return Ok((ID_FIELD, identity_predicate(multi, ids)));
    }

    let field =
        schema.field(&clause.field).ok_or_else(|| DbError::UnknownField(clause.field.clone()))?;

    if field.is_reference() {
        let ids = parse_ids(&clause.field, &clause.values)?;
        return Ok((field.storage_name.as_str(), identity_predicate(multi, ids)));
    }

    let mut values = clause
        .values
        .iter()
        .map(|raw| coerce(&clause.field, raw, field.value_type))
        .collect::<Result<Vec<_>, _>>()?;
    let predicate = if multi {
        multi_value(&clause.field, clause.operator, values)?
    } else {
        single_value(&clause.field, clause.operator, values.remove(0))?
    };
    Ok((field.storage_name.as_str(), predicate))
}

fn parse_ids(field: &str, raw: &[String]) -> Result<Vec<Bson>, DbError> {
    raw.iter().map(|v| coerce_id(field, v)).collect()
}

/// Identifier clauses ignore the operator: one id is an exact match, several are a membership set.
fn identity_predicate(multi: bool, mut ids: Vec<Bson>) -> Predicate {
    if multi { Predicate::In(ids) } else { Predicate::Exact(ids.remove(0)) }
}
