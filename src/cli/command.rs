use bson::Document as BsonDocument;

use crate::query::FilterClause;

/// One CRUD or relation operation, already parsed from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// By id when `id` is set, otherwise a filtered list.
    Get {
        collection: String,
        id: Option<String>,
        filters: Vec<FilterClause>,
        params: Vec<(String, String)>,
    },
    Insert {
        collection: String,
        fields: BsonDocument,
    },
    Update {
        collection: String,
        id: String,
        fields: BsonDocument,
    },
    /// By id when `id` is set, otherwise every record matching `filters`.
    Delete {
        collection: String,
        id: Option<String>,
        filters: Vec<FilterClause>,
    },
    Link {
        collection: String,
        id: String,
        field: String,
        foreign_id: String,
    },
    Unlink {
        collection: String,
        id: String,
        field: String,
        foreign_id: String,
    },
    SetLinks {
        collection: String,
        id: String,
        field: String,
        ids: Vec<String>,
    },
    ClearLinks {
        collection: String,
        id: String,
        field: String,
    },
}

impl Command {
    /// Whether a successful run changed stored data.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::Get { .. })
    }
}
