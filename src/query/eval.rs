use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::plan::{Order, SortSpec};
use super::types::{Bound, CompiledQuery, Predicate};

const MAX_PATH_DEPTH: usize = 32;

/// Whether `doc` satisfies every condition of `query`.
#[must_use]
pub fn matches(doc: &BsonDocument, query: &CompiledQuery) -> bool {
    query.iter().all(|(path, cond)| {
        let value = get_path(doc, path);
        cond.predicates.iter().all(|p| eval_predicate(value, p))
    })
}

/// Evaluate one predicate against a (possibly missing) field value.
///
/// Array values match when the array itself or any of its elements matches.
#[must_use]
pub fn eval_predicate(value: Option<&Bson>, predicate: &Predicate) -> bool {
    let Some(v) = value else {
        return match predicate {
            Predicate::Exact(Bson::Null) => true,
            Predicate::In(set) => set.iter().any(|x| matches!(x, Bson::Null)),
            _ => false,
        };
    };
    if eval_scalar(v, predicate) {
        return true;
    }
    match v {
        Bson::Array(items) => items.iter().any(|item| eval_scalar(item, predicate)),
        _ => false,
    }
}

fn eval_scalar(v: &Bson, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Exact(expected) => bson_equal(v, expected),
        Predicate::In(set) => set.iter().any(|x| bson_equal(v, x)),
        Predicate::Pattern(pattern) => match v {
            Bson::String(s) => pattern.is_match(s),
            _ => false,
        },
        Predicate::Range { bound, value } => {
            if !same_class(v, value) {
                return false;
            }
            let c = compare_bson(v, value);
            match bound {
                Bound::Lt => c == Ordering::Less,
                Bound::Lte => c != Ordering::Greater,
                Bound::Gt => c == Ordering::Greater,
                Bound::Gte => c != Ordering::Less,
            }
        }
    }
}

/// Equality that treats numbers of different widths as equal when their values are.
#[must_use]
pub fn bson_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return compare_bson(a, b) == Ordering::Equal;
    }
    a == b
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

/// Range operators only compare values of the same type class.
fn same_class(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return true;
    }
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &SortSpec) -> Ordering {
    let ord = match (get_path(a, &sort.field), get_path(b, &sort.field)) {
        (Some(x), Some(y)) => compare_bson(x, y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    if matches!(sort.order, Order::Asc) { ord } else { ord.reverse() }
}

pub(crate) fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut parts = path.split('.').peekable();
    let mut segs = 0usize;
    while let Some(part) = parts.next() {
        segs += 1;
        if segs > MAX_PATH_DEPTH {
            return None;
        }
        if parts.peek().is_none() {
            return cur.get(part);
        }
        match cur.get(part) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    None
}

/// Total order over bson values: numbers by value, then same-type comparisons, then type rank.
#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    use bson::Bson as T;
    fn as_f64_num(x: &T) -> f64 {
        match x {
            T::Int32(i) => f64::from(*i),
            #[allow(clippy::cast_precision_loss)]
            T::Int64(i) => *i as f64,
            T::Double(f) => *f,
            T::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }
    if is_num(a) && is_num(b) {
        if let (T::Int64(x), T::Int64(y)) = (a, b) {
            return x.cmp(y);
        }
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (T::String(x), T::String(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        (T::DateTime(x), T::DateTime(y)) => x.cmp(y),
        (T::ObjectId(x), T::ObjectId(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Null | T::Undefined => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 2,
        T::Symbol(_) | T::String(_) => 3,
        T::Document(_) => 4,
        T::Array(_) => 5,
        T::Binary(_) => 6,
        T::ObjectId(_) => 7,
        T::Boolean(_) => 8,
        T::DateTime(_) => 9,
        T::Timestamp(_) => 10,
        T::RegularExpression(_) => 11,
        T::DbPointer(_) => 12,
        T::JavaScriptCode(_) => 13,
        T::JavaScriptCodeWithScope(_) => 14,
        T::MaxKey => 255,
    }
}
