use bson::{Bson, Document as BsonDocument, doc};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

use crate::errors::DbError;
use crate::types::{DocumentId, ID_FIELD};

/// Filter operators understood in query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    #[default]
    Eq,
    Eqs,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl Operator {
    /// Parse an operator name. Unknown or empty names fall back to `Eq`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "eqs" => Self::Eqs,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "like" => Self::Like,
            _ => Self::Eq,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Eqs => "eqs",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Like => "like",
        }
    }

    /// Range bound for the ordered operators.
    #[must_use]
    pub const fn bound(self) -> Option<Bound> {
        match self {
            Self::Lt => Some(Bound::Lt),
            Self::Lte => Some(Bound::Lte),
            Self::Gt => Some(Bound::Gt),
            Self::Gte => Some(Bound::Gte),
            Self::Eq | Self::Eqs | Self::Like => None,
        }
    }
}

/// One field/operator/value(s) unit taken from a request's query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub operator: Operator,
    pub values: Vec<String>,
    pub multi_valued: bool,
}

impl FilterClause {
    /// Single-valued clause.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self { field: field.into(), operator, values: vec![value.into()], multi_valued: false }
    }

    /// Multi-valued ("any of") clause.
    pub fn any_of<I, S>(field: impl Into<String>, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
            multi_valued: true,
        }
    }

    /// Default-operator clause (`field=value`).
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Eq, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Bound {
    #[must_use]
    pub const fn mongo_op(self) -> &'static str {
        match self {
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
        }
    }

    /// Upper bounds (`<`, `<=`) fold to the minimum of a value set.
    #[must_use]
    pub const fn is_upper(self) -> bool {
        matches!(self, Self::Lt | Self::Lte)
    }
}

/// Case-insensitive regular expression together with its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// # Errors
    /// Returns `InvalidPattern` if `source` is not a valid regular expression.
    pub fn new(field: &str, source: String) -> Result<Self, DbError> {
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| DbError::InvalidPattern { field: field.to_string(), reason: e.to_string() })?;
        Ok(Self { source, regex })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Operator- and type-resolved predicate on one storage field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Exact(Bson),
    Pattern(Pattern),
    Range { bound: Bound, value: Bson },
    In(Vec<Bson>),
}

/// Conjunction of predicates on one field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldCondition {
    pub predicates: Vec<Predicate>,
}

impl FieldCondition {
    /// The predicate when the condition holds exactly one.
    #[must_use]
    pub fn single(&self) -> Option<&Predicate> {
        match self.predicates.as_slice() {
            [p] => Some(p),
            _ => None,
        }
    }
}

/// Storage field name → condition, ready for execution against a store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    conditions: BTreeMap<String, FieldCondition>,
}

impl CompiledQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching exactly the document with identifier `id`.
    #[must_use]
    pub fn id_equals(id: DocumentId) -> Self {
        let mut q = Self::new();
        q.and(ID_FIELD, Predicate::Exact(Bson::ObjectId(id)));
        q
    }

    /// Add a predicate on `field`, intersecting with anything already there.
    pub fn and(&mut self, field: &str, predicate: Predicate) {
        self.conditions.entry(field.to_string()).or_default().predicates.push(predicate);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldCondition> {
        self.conditions.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldCondition)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Mongo-style criteria document, e.g. `{"age": {"$gte": 7}, "name": {"$regex": "^a$", "$options": "i"}}`.
    ///
    /// Predicates that cannot share one operator document go to a top-level `$and`.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut out = BsonDocument::new();
        let mut overflow: Vec<Bson> = Vec::new();
        for (field, cond) in &self.conditions {
            if let Some(Predicate::Exact(v)) = cond.single() {
                out.insert(field.clone(), v.clone());
                continue;
            }
            let mut ops = BsonDocument::new();
            for p in &cond.predicates {
                let (keys, rendered) = render_predicate(p);
                if keys.iter().any(|k| ops.contains_key(*k)) {
                    let mut wrapped = BsonDocument::new();
                    wrapped.insert(field.clone(), Bson::Document(rendered));
                    overflow.push(Bson::Document(wrapped));
                } else {
                    for (k, v) in rendered {
                        ops.insert(k, v);
                    }
                }
            }
            out.insert(field.clone(), Bson::Document(ops));
        }
        if !overflow.is_empty() {
            out.insert("$and", Bson::Array(overflow));
        }
        out
    }
}

fn render_predicate(p: &Predicate) -> (Vec<&'static str>, BsonDocument) {
    match p {
        Predicate::Exact(v) => (vec!["$eq"], doc! {"$eq": v.clone()}),
        Predicate::Pattern(pat) => {
            (vec!["$regex", "$options"], doc! {"$regex": pat.source(), "$options": "i"})
        }
        Predicate::Range { bound, value } => {
            let mut d = BsonDocument::new();
            d.insert(bound.mongo_op(), value.clone());
            (vec![bound.mongo_op()], d)
        }
        Predicate::In(values) => (vec!["$in"], doc! {"$in": Bson::Array(values.clone())}),
    }
}
