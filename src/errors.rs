use crate::response::Status;
use thiserror::Error;

/// Failures raised by a `DocumentStore` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("document has no _id")]
    MissingId,

    #[error("duplicate _id: {0}")]
    DuplicateId(String),

    #[error("document rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),

    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("Logger setup failed: {0}")]
    Logger(String),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("Missing identifier")]
    MissingId,

    #[error("Document not found: {0}")]
    NoSuchDocument(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("No such field: {0}")]
    NoSuchField(String),

    #[error("Field {field} is not a reference collection")]
    NotACollection { field: String },

    #[error("Invalid value {value:?} for field {field}: expected {expected}")]
    InvalidValue { field: String, value: String, expected: &'static str },

    #[error("Invalid pattern for field {field}: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("Filter on {0} has no values")]
    EmptyClause(String),

    #[error("Explicit identifier assignment is not allowed")]
    ExplicitId,

    #[error("Store: {0}")]
    Store(#[from] StoreError),
}

impl DbError {
    /// Response status this error surfaces as.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::MissingId
            | Self::UnknownField(_)
            | Self::InvalidValue { .. }
            | Self::InvalidPattern { .. }
            | Self::EmptyClause(_) => Status::BadRequest,
            Self::NoSuchCollection(_)
            | Self::NoSuchField(_)
            | Self::NoSuchDocument(_)
            | Self::Store(StoreError::TypeMismatch(_)) => Status::NotFound,
            Self::NotACollection { .. } | Self::ExplicitId => Status::Forbidden,
            Self::Store(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Toml(_)
            | Self::Bson(_)
            | Self::Schema(_)
            | Self::Logger(_) => Status::BadRequest,
        }
    }
}
