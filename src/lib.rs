pub mod cli;
pub mod config;
pub mod errors;
pub mod facade;
pub mod logger;
pub mod mutator;
pub mod project;
pub mod query;
pub mod resolve;
pub mod response;
pub mod schema;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use errors::{DbError, StoreError};
pub use facade::{CrudFacade, RequestParams};
pub use query::{FilterClause, Operator};
pub use response::{ResponseEnvelope, Status};
pub use schema::SchemaMetadata;
pub use store::{DocumentStore, MemoryStore};
pub use types::DocumentId;
