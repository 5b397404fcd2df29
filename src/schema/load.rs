use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use super::relations::Relation;
use super::types::{CollectionSchema, FieldDescriptor, ReferenceArity, SchemaMetadata, ValueType};
use crate::errors::DbError;
use crate::types::ID_FIELD;

/// On-disk schema layout (TOML or JSON).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionSpec {
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub embeds_one: Vec<String>,
    #[serde(default)]
    pub embeds_many: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub reference: Option<ReferenceSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceSpec {
    pub collection: String,
    pub arity: Arity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    One,
    Many,
}

const DEFAULT_ID_FIELD: &str = "id";

impl SchemaMetadata {
    /// # Errors
    /// Returns an error if the text is not valid TOML or the schema fails validation.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        let file: SchemaFile = toml::from_str(s)?;
        Self::from_file(file)
    }

    /// # Errors
    /// Returns an error if the text is not valid JSON or the schema fails validation.
    pub fn from_json_str(s: &str) -> Result<Self, DbError> {
        let file: SchemaFile = serde_json::from_str(s)?;
        Self::from_file(file)
    }

    /// Load a schema file; `.json` files are read as JSON, anything else as TOML.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let schema = if is_json { Self::from_json_str(&text)? } else { Self::from_toml_str(&text)? };
        log::info!("loaded schema from {} ({} collections)", path.display(), schema.len());
        Ok(schema)
    }

    /// Validate a parsed schema file.
    ///
    /// # Errors
    /// Returns `DbError::Schema` describing the first problem found.
    pub fn from_file(file: SchemaFile) -> Result<Self, DbError> {
        let known: HashSet<&str> = file.collections.keys().map(String::as_str).collect();
        let mut collections = BTreeMap::new();
        for (name, spec) in &file.collections {
            let col = build_collection(name, spec, &known)?;
            collections.insert(name.clone(), col);
        }
        Ok(Self { collections })
    }
}

fn invalid(collection: &str, msg: impl std::fmt::Display) -> DbError {
    DbError::Schema(format!("{collection}: {msg}"))
}

fn build_collection(
    name: &str,
    spec: &CollectionSpec,
    known: &HashSet<&str>,
) -> Result<CollectionSchema, DbError> {
    if name.trim().is_empty() {
        return Err(DbError::Schema("collection name must not be empty".into()));
    }
    let id_field = spec.id_field.clone().unwrap_or_else(|| DEFAULT_ID_FIELD.to_string());
    if id_field.trim().is_empty() {
        return Err(invalid(name, "id_field must not be empty"));
    }

    let mut fields = BTreeMap::new();
    let mut by_storage: HashMap<String, String> = HashMap::new();
    let mut references_one = BTreeMap::new();
    let mut references_many = BTreeMap::new();
    let mut relations = HashMap::new();

    for (logical, fs) in &spec.fields {
        if logical.trim().is_empty() {
            return Err(invalid(name, "field name must not be empty"));
        }
        if logical == &id_field || logical == ID_FIELD {
            return Err(invalid(name, format!("field {logical} collides with the identifier")));
        }
        let storage = fs.db_name.clone().unwrap_or_else(|| logical.clone());
        if storage.trim().is_empty() || storage == ID_FIELD {
            return Err(invalid(name, format!("field {logical} has invalid storage name {storage:?}")));
        }
        if let Some(other) = by_storage.get(&storage) {
            return Err(invalid(name, format!("fields {other} and {logical} share storage name {storage}")));
        }

        let descriptor = match &fs.reference {
            Some(r) => {
                if !known.contains(r.collection.as_str()) {
                    return Err(invalid(
                        name,
                        format!("field {logical} references unknown collection {}", r.collection),
                    ));
                }
                if fs.value_type.is_some_and(|t| t != ValueType::ObjectId) {
                    return Err(invalid(name, format!("reference field {logical} must have type object_id")));
                }
                match r.arity {
                    Arity::One => {
                        references_one.insert(storage.clone(), r.collection.clone());
                        FieldDescriptor::reference(logical, &storage, ReferenceArity::One, &r.collection)
                    }
                    Arity::Many => {
                        references_many.insert(storage.clone(), r.collection.clone());
                        relations.insert(logical.clone(), Relation::new(logical, &storage, &r.collection));
                        FieldDescriptor::reference(logical, &storage, ReferenceArity::Many, &r.collection)
                    }
                }
            }
            None => FieldDescriptor::plain(logical, &storage, fs.value_type.unwrap_or_default()),
        };
        by_storage.insert(storage, logical.clone());
        fields.insert(logical.clone(), descriptor);
    }

    let mut seen_embeds = HashSet::new();
    for embed in spec.embeds_one.iter().chain(&spec.embeds_many) {
        if embed.trim().is_empty() || embed == ID_FIELD {
            return Err(invalid(name, format!("invalid embed name {embed:?}")));
        }
        if by_storage.contains_key(embed) || fields.contains_key(embed) {
            return Err(invalid(name, format!("embed {embed} collides with a declared field")));
        }
        if !seen_embeds.insert(embed.as_str()) {
            return Err(invalid(name, format!("embed {embed} declared twice")));
        }
    }

    log::debug!(
        "schema {name}: {} fields, {} one-refs, {} many-refs",
        fields.len(),
        references_one.len(),
        references_many.len()
    );

    Ok(CollectionSchema {
        name: name.to_string(),
        id_field,
        fields,
        by_storage,
        references_one,
        references_many,
        embeds_one: spec.embeds_one.clone(),
        embeds_many: spec.embeds_many.clone(),
        relations,
    })
}
