//! Operator semantics for single values and multi-value ("any of") clauses.
//!
//! Multi-valued range clauses fold to one effective bound: upper bounds (`lt`, `lte`) take the
//! minimum of the set and lower bounds (`gt`, `gte`) the maximum.

use bson::Bson;
use std::cmp::Ordering;

use super::eval::compare_bson;
use super::types::{Operator, Pattern, Predicate};
use crate::errors::DbError;

/// Predicate for a clause carrying one coerced value.
///
/// # Errors
/// Returns `InvalidPattern` when a pattern operator receives text that is not a valid regex.
pub fn single_value(field: &str, op: Operator, value: Bson) -> Result<Predicate, DbError> {
    if let Some(bound) = op.bound() {
        return Ok(Predicate::Range { bound, value });
    }
    match op {
        Operator::Eqs => Ok(Predicate::Exact(value)),
        Operator::Like => Ok(Predicate::Pattern(Pattern::new(field, pattern_text(&value))?)),
        _ => match value {
            Bson::String(s) => Ok(Predicate::Pattern(Pattern::new(field, anchored(&s))?)),
            other => Ok(Predicate::Exact(other)),
        },
    }
}

/// Predicate for a clause carrying several coerced values meaning "any of".
///
/// # Errors
/// Returns `EmptyClause` for an empty value set and `InvalidPattern` for bad pattern text.
pub fn multi_value(field: &str, op: Operator, values: Vec<Bson>) -> Result<Predicate, DbError> {
    if values.is_empty() {
        return Err(DbError::EmptyClause(field.to_string()));
    }
    if let Some(bound) = op.bound() {
        let keep = if bound.is_upper() { Ordering::Less } else { Ordering::Greater };
        let value = fold(values, keep);
        return Ok(Predicate::Range { bound, value });
    }
    match op {
        Operator::Eqs => Ok(Predicate::In(values)),
        Operator::Like => {
            let union = values.iter().map(pattern_text).collect::<Vec<_>>().join("|");
            Ok(Predicate::Pattern(Pattern::new(field, union)?))
        }
        _ => {
            if values.iter().all(|v| !matches!(v, Bson::String(_))) {
                return Ok(Predicate::In(values));
            }
            let union = values.iter().map(|v| anchored(&pattern_text(v))).collect::<Vec<_>>().join("|");
            Ok(Predicate::Pattern(Pattern::new(field, union)?))
        }
    }
}

/// Keep the value that compares `keep` against every other one (min for `Less`, max for `Greater`).
fn fold(values: Vec<Bson>, keep: Ordering) -> Bson {
    let mut it = values.into_iter();
    let first = it.next().unwrap_or(Bson::Null);
    it.fold(first, |best, v| if compare_bson(&v, &best) == keep { v } else { best })
}

fn anchored(text: &str) -> String {
    format!("^{text}$")
}

fn pattern_text(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        Bson::Double(f) => f.to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}
