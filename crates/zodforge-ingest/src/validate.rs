use jsonschema::JSONSchema;
use serde_json::Value;

use zodforge_core::SNAPSHOT_VERSION;

use crate::errors::{IssueSeverity, LoadError, ValidationIssue, ValidationReport};
use crate::schema::snapshot_json_schema;

/// Validate a snapshot JSON document against the snapshot JSON Schema.
///
/// Structural violations land in the error lane; a snapshot written by a
/// different contract version is still loadable and only warns.
pub fn validate_snapshot_json(snapshot_json: &Value) -> Result<ValidationReport, LoadError> {
    let schema = serde_json::to_value(snapshot_json_schema())?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| LoadError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(snapshot_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    if let Some(version) = snapshot_json.get("snapshot_version").and_then(Value::as_str) {
        if version != SNAPSHOT_VERSION {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "snapshot_version_mismatch",
                "/snapshot_version",
                format!("snapshot declares version '{version}', expected '{SNAPSHOT_VERSION}'"),
                Some("re-run introspection with a matching snapshot writer".to_string()),
            ));
        }
    }

    Ok(report)
}

fn normalized_json_pointer(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
