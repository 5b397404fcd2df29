//! Utility modules shared by the store, the facade and the CLI.
pub mod json;
