//! Core contracts and helpers for Zodforge.
//!
//! This crate defines the canonical catalog snapshot types, the ingestion-time
//! normalization pass, and the invariant checks shared across the ingest
//! layer, the emission engine, and the CLI.

pub mod error;
pub mod normalize;
pub mod snapshot;
pub mod validation;

pub use error::{Error, Result};
pub use normalize::normalize_snapshot;
pub use snapshot::{
    ArgMode, CatalogSnapshot, Column, ForeignTable, Function, FunctionArg, IdentityGeneration,
    MaterializedView, Relation, RelationKind, Relationship, Schema, Table, TypeAttribute, TypeDef,
    TypeKind, View,
};
pub use validation::validate_snapshot;

/// Current contract version for catalog snapshot artifacts.
pub const SNAPSHOT_VERSION: &str = "0.1";
