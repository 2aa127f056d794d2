use schemars::schema::RootSchema;
use schemars::schema_for;

use zodforge_core::CatalogSnapshot;

/// Emit the JSON Schema for snapshot artifacts.
pub fn snapshot_json_schema() -> RootSchema {
    schema_for!(CatalogSnapshot)
}
