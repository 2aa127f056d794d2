use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use zodforge_core::{CatalogSnapshot, normalize_snapshot, validate_snapshot};

use crate::errors::{LoadError, Result};
use crate::options::{LoadOptions, filter_snapshot};
use crate::validate::validate_snapshot_json;

/// Trait implemented by snapshot sources.
///
/// The introspection collaborator is out of scope here; anything that can
/// produce a snapshot JSON document can implement this.
#[async_trait]
pub trait Source {
    /// Human-readable origin of the snapshot (e.g. a file path).
    fn origin(&self) -> String;

    /// Load, validate, filter, and normalize a snapshot.
    async fn load(&self, options: &LoadOptions) -> Result<CatalogSnapshot>;
}

/// Source reading a snapshot from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Source for JsonFileSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self, options: &LoadOptions) -> Result<CatalogSnapshot> {
        let bytes = std::fs::read(&self.path)?;
        let value: Value = serde_json::from_slice(&bytes)?;
        load_snapshot_from_value(value, options)
    }
}

/// Shared ingestion path: structural validation, deserialization, schema
/// filtering, normalization, then invariant checks.
///
/// Outside strict mode, violations are logged and loading proceeds; the
/// generator's contract is best effort over partially-known metadata.
pub fn load_snapshot_from_value(value: Value, options: &LoadOptions) -> Result<CatalogSnapshot> {
    let structural = validate_snapshot_json(&value)?;
    for issue in &structural.warnings {
        warn!(code = %issue.code, path = %issue.path, message = %issue.message, "snapshot validation warning");
    }
    if !structural.is_ok() {
        if options.strict {
            return Err(LoadError::Invalid(structural));
        }
        for issue in &structural.errors {
            warn!(code = %issue.code, path = %issue.path, message = %issue.message, "snapshot schema violation");
        }
    }

    let mut snapshot: CatalogSnapshot = serde_json::from_value(value)?;
    filter_snapshot(&mut snapshot, options);
    normalize_snapshot(&mut snapshot);

    if let Err(err) = validate_snapshot(&snapshot) {
        if options.strict {
            return Err(err.into());
        }
        warn!(error = %err, "snapshot invariant violation");
    }

    Ok(snapshot)
}
