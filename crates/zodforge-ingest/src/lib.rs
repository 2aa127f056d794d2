//! Snapshot ingestion for Zodforge.
//!
//! Loads catalog snapshot JSON through an async [`Source`], validates it
//! structurally against the generated JSON Schema, filters it to the
//! requested schemas, and normalizes it for the emission engine.

pub mod errors;
pub mod options;
pub mod schema;
pub mod source;
pub mod validate;

pub use errors::{IssueSeverity, LoadError, ValidationIssue, ValidationReport};
pub use options::LoadOptions;
pub use schema::snapshot_json_schema;
pub use source::{JsonFileSource, Source, load_snapshot_from_value};
pub use validate::validate_snapshot_json;

pub use zodforge_core::CatalogSnapshot;
