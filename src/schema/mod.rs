//! Typed collection metadata: field descriptors, reference maps, embeds and the relation
//! registry. Validated once at load time and read-only afterwards.

mod load;
mod relations;
mod types;

pub use load::{Arity, CollectionSpec, FieldSpec, ReferenceSpec, SchemaFile};
pub use relations::Relation;
pub use types::{CollectionSchema, FieldDescriptor, ReferenceArity, SchemaMetadata, ValueType};
