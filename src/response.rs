use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

use crate::errors::DbError;

/// REST status codes a CRUD operation can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Status {
    Ok,
    Created,
    BadRequest,
    Forbidden,
    NotFound,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Created)
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> Self {
        s.code()
    }
}

impl TryFrom<u16> for Status {
    type Error = String;
    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(Self::Ok),
            201 => Ok(Self::Created),
            400 => Ok(Self::BadRequest),
            403 => Ok(Self::Forbidden),
            404 => Ok(Self::NotFound),
            other => Err(format!("unsupported status code {other}")),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Uniform `{status, payload}` result of every CRUD operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<BsonDocument>,
}

impl ResponseEnvelope {
    #[must_use]
    pub const fn empty(status: Status) -> Self {
        Self { status, payload: None }
    }

    #[must_use]
    pub const fn with_payload(status: Status, payload: BsonDocument) -> Self {
        Self { status, payload: Some(payload) }
    }

    /// `{collection: record}` payload.
    #[must_use]
    pub fn record(status: Status, collection: &str, record: BsonDocument) -> Self {
        let mut payload = BsonDocument::new();
        payload.insert(collection, Bson::Document(record));
        Self::with_payload(status, payload)
    }

    /// `{collection: [records...]}` payload.
    #[must_use]
    pub fn records(status: Status, collection: &str, records: Vec<BsonDocument>) -> Self {
        let mut payload = BsonDocument::new();
        payload.insert(collection, Bson::Array(records.into_iter().map(Bson::Document).collect()));
        Self::with_payload(status, payload)
    }

    /// Empty envelope carrying the status `err` maps to.
    #[must_use]
    pub const fn from_error(err: &DbError) -> Self {
        Self::empty(err.status())
    }

    #[must_use]
    pub const fn code(&self) -> u16 {
        self.status.code()
    }

    /// Records under `collection` when the payload holds a list.
    #[must_use]
    pub fn list(&self, collection: &str) -> Option<&bson::Array> {
        self.payload.as_ref().and_then(|p| p.get_array(collection).ok())
    }

    /// Record under `collection` when the payload holds a single document.
    #[must_use]
    pub fn single(&self, collection: &str) -> Option<&BsonDocument> {
        self.payload.as_ref().and_then(|p| p.get_document(collection).ok())
    }

    /// JSON rendering of the envelope: `{"status": 200, "payload": {...}}`.
    ///
    /// # Errors
    /// Returns an error if the payload holds a value that has no JSON form.
    pub fn to_json(&self) -> Result<serde_json::Value, DbError> {
        Ok(serde_json::to_value(self)?)
    }
}
