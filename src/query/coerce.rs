use bson::Bson;
use chrono::{DateTime, NaiveDate};

use crate::errors::DbError;
use crate::schema::ValueType;
use crate::types::parse_document_id;

fn invalid(field: &str, raw: &str, expected: &'static str) -> DbError {
    DbError::InvalidValue { field: field.to_string(), value: raw.to_string(), expected }
}

/// Convert a raw query-string value into the declared type of `field`.
///
/// # Errors
/// Returns `InvalidValue` when `raw` has no representation in `ty`.
pub fn coerce(field: &str, raw: &str, ty: ValueType) -> Result<Bson, DbError> {
    match ty {
        ValueType::String | ValueType::Raw => Ok(Bson::String(raw.to_string())),
        ValueType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Bson::Int64)
            .map_err(|_| invalid(field, raw, ty.name())),
        ValueType::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Bson::Double)
            .ok_or_else(|| invalid(field, raw, ty.name())),
        ValueType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Bson::Boolean(true)),
            "false" | "0" | "no" | "off" => Ok(Bson::Boolean(false)),
            _ => Err(invalid(field, raw, ty.name())),
        },
        ValueType::Date => parse_date_millis(raw)
            .map(|ms| Bson::DateTime(bson::DateTime::from_millis(ms)))
            .ok_or_else(|| invalid(field, raw, ty.name())),
        ValueType::ObjectId => coerce_id(field, raw),
    }
}

/// Convert a raw value into a document identifier.
///
/// # Errors
/// Returns `InvalidValue` when `raw` is not a 24-digit hex identifier.
pub fn coerce_id(field: &str, raw: &str) -> Result<Bson, DbError> {
    parse_document_id(raw).map(Bson::ObjectId).ok_or_else(|| invalid(field, raw, "object_id"))
}

/// RFC 3339 timestamp, `YYYY-MM-DD` (midnight UTC) or integer epoch seconds.
fn parse_date_millis(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
    }
    s.parse::<i64>().ok().and_then(|secs| secs.checked_mul(1000))
}
