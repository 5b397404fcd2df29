use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::relations::Relation;
use crate::errors::DbError;
use crate::types::ID_FIELD;

/// Declared value type of a field; drives filter-value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Date,
    ObjectId,
    Raw,
}

impl ValueType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::ObjectId => "object_id",
            Self::Raw => "raw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferenceArity {
    #[default]
    None,
    One,
    Many,
}

/// Immutable description of one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub logical_name: String,
    pub storage_name: String,
    pub value_type: ValueType,
    pub arity: ReferenceArity,
    pub referenced_collection: Option<String>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn plain(name: &str, storage_name: &str, value_type: ValueType) -> Self {
        Self {
            logical_name: name.to_string(),
            storage_name: storage_name.to_string(),
            value_type,
            arity: ReferenceArity::None,
            referenced_collection: None,
        }
    }

    #[must_use]
    pub fn reference(name: &str, storage_name: &str, arity: ReferenceArity, target: &str) -> Self {
        Self {
            logical_name: name.to_string(),
            storage_name: storage_name.to_string(),
            value_type: ValueType::ObjectId,
            arity,
            referenced_collection: Some(target.to_string()),
        }
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.arity != ReferenceArity::None
    }
}

/// Validated metadata of one collection.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub(crate) name: String,
    pub(crate) id_field: String,
    pub(crate) fields: BTreeMap<String, FieldDescriptor>,
    pub(crate) by_storage: HashMap<String, String>,
    pub(crate) references_one: BTreeMap<String, String>,
    pub(crate) references_many: BTreeMap<String, String>,
    pub(crate) embeds_one: Vec<String>,
    pub(crate) embeds_many: Vec<String>,
    pub(crate) relations: HashMap<String, Relation>,
}

impl CollectionSchema {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical name the identifier is exposed under (`id` unless configured).
    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    #[must_use]
    pub fn is_id_field(&self, name: &str) -> bool {
        name == self.id_field || name == ID_FIELD
    }

    #[must_use]
    pub fn field(&self, logical_name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(logical_name)
    }

    #[must_use]
    pub fn field_by_storage(&self, storage_name: &str) -> Option<&FieldDescriptor> {
        self.by_storage.get(storage_name).and_then(|logical| self.fields.get(logical))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Storage name for a logical field name, including the identifier.
    #[must_use]
    pub fn storage_name(&self, logical_name: &str) -> Option<&str> {
        if self.is_id_field(logical_name) {
            return Some(ID_FIELD);
        }
        self.fields.get(logical_name).map(|f| f.storage_name.as_str())
    }

    /// `referencesOne`: storage name → referenced collection.
    #[must_use]
    pub const fn references_one(&self) -> &BTreeMap<String, String> {
        &self.references_one
    }

    /// `referencesMany`: storage name → referenced collection.
    #[must_use]
    pub const fn references_many(&self) -> &BTreeMap<String, String> {
        &self.references_many
    }

    #[must_use]
    pub fn embeds_one(&self) -> &[String] {
        &self.embeds_one
    }

    #[must_use]
    pub fn embeds_many(&self) -> &[String] {
        &self.embeds_many
    }

    /// Registry entry of a many-reference field.
    ///
    /// # Errors
    /// `UnknownField` when the field is not declared, `NotACollection` when it is declared but
    /// is not a many-reference.
    pub fn relation(&self, logical_name: &str) -> Result<&Relation, DbError> {
        if let Some(rel) = self.relations.get(logical_name) {
            return Ok(rel);
        }
        if self.fields.contains_key(logical_name) {
            Err(DbError::NotACollection { field: logical_name.to_string() })
        } else {
            Err(DbError::UnknownField(logical_name.to_string()))
        }
    }
}

/// Read-only schema of every known collection, loaded once and shared.
#[derive(Debug, Clone, Default)]
pub struct SchemaMetadata {
    pub(crate) collections: BTreeMap<String, CollectionSchema>,
}

impl SchemaMetadata {
    /// # Errors
    /// Returns `NoSuchCollection` if the collection is not declared.
    pub fn collection(&self, name: &str) -> Result<&CollectionSchema, DbError> {
        self.collections.get(name).ok_or_else(|| DbError::NoSuchCollection(name.to_string()))
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}
