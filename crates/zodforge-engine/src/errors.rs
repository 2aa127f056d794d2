use thiserror::Error;

/// Errors emitted by the emission engine.
///
/// Resolution itself never fails; unresolvable types degrade to the
/// permissive fallback validator and are recorded on the report instead.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("formatter error: {0}")]
    Format(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for emission operations.
pub type Result<T> = std::result::Result<T, EmitError>;
