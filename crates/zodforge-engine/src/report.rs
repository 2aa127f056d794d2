use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured emission issue. Generation never aborts on these; they record
/// where the document degraded to permissive validators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl EmitIssue {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.into(),
            message: message.into(),
            schema: None,
            relation: None,
            column: None,
        }
    }

    pub fn at(mut self, schema: &str, relation: &str) -> Self {
        self.schema = Some(schema.to_string());
        self.relation = Some(relation.to_string());
        self
    }

    pub fn column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }
}

/// Report for an emission run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitReport {
    pub run_id: String,
    pub primary_schema: String,
    pub relations: u64,
    pub functions: u64,
    /// Fields that degraded to the permissive fallback validator.
    pub degraded_count: u64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<EmitIssue>,
    pub duration_ms: u64,
    pub document_bytes: u64,
}

impl EmitReport {
    pub fn new(run_id: String, primary_schema: String) -> Self {
        Self {
            run_id,
            primary_schema,
            relations: 0,
            functions: 0,
            degraded_count: 0,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
            duration_ms: 0,
            document_bytes: 0,
        }
    }

    pub fn record_degraded(&mut self) {
        self.degraded_count += 1;
    }

    pub fn record_warning(&mut self, issue: EmitIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }
}
