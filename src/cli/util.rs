use crate::errors::DbError;
use crate::query::{FilterClause, Operator};

fn malformed(arg: &str, expected: &'static str) -> DbError {
    DbError::InvalidValue { field: "argument".into(), value: arg.to_string(), expected }
}

/// `field[:op]=v1[,v2...]`; several values make an "any of" clause.
///
/// # Errors
/// Returns `InvalidValue` when the argument has no `=` or an empty field name.
pub fn parse_filter_arg(arg: &str) -> Result<FilterClause, DbError> {
    let (lhs, rhs) = arg.split_once('=').ok_or_else(|| malformed(arg, "field[:op]=value"))?;
    let (field, op) = match lhs.split_once(':') {
        Some((f, o)) => (f.trim(), Operator::parse(o)),
        None => (lhs.trim(), Operator::Eq),
    };
    if field.is_empty() {
        return Err(malformed(arg, "field[:op]=value"));
    }
    let values: Vec<&str> = rhs.split(',').collect();
    Ok(if values.len() > 1 {
        FilterClause::any_of(field, op, values)
    } else {
        FilterClause::new(field, op, rhs)
    })
}

/// `key=value` sort or paging parameter.
///
/// # Errors
/// Returns `InvalidValue` when the argument has no `=`.
pub fn parse_param_arg(arg: &str) -> Result<(String, String), DbError> {
    let (k, v) = arg.split_once('=').ok_or_else(|| malformed(arg, "key=value"))?;
    Ok((k.trim().to_string(), v.trim().to_string()))
}
