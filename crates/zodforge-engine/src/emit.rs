use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use zodforge_core::{CatalogSnapshot, normalize_snapshot};

use crate::assemble::{Assembler, ShellRegistry};
use crate::errors::Result;
use crate::functions::FunctionAssembler;
use crate::output::{DocumentItem, render_document};
use crate::relationships::RelationshipAnalysis;
use crate::report::EmitReport;

/// Well-known schema used when no default schema is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// Output style passed through to the external formatter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatStyle {
    pub indent: usize,
}

impl Default for FormatStyle {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Options for the emission engine.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Primary emission target; its identifiers are emitted unprefixed and
    /// its declarations come first. Unset falls back to `public`, then to
    /// the first available schema.
    pub default_schema: Option<String>,
    pub style: FormatStyle,
}

/// External formatting collaborator, called exactly once per run after the
/// complete document has been produced.
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn format(&self, document: &str, style: &FormatStyle) -> Result<String>;
}

/// Default formatter returning the document unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughFormatter;

#[async_trait]
impl Formatter for PassthroughFormatter {
    async fn format(&self, document: &str, _style: &FormatStyle) -> Result<String> {
        Ok(document.to_string())
    }
}

/// Result of an emission run.
#[derive(Debug, Clone)]
pub struct EmitResult {
    pub document: String,
    pub report: EmitReport,
}

/// Entry point for emitting a validator document from a catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct EmitEngine {
    options: EmitOptions,
}

impl EmitEngine {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    /// Run one emission pass: normalize a private copy of the snapshot,
    /// derive relationships once, assemble every bundle in two phases, then
    /// render and hand the document to the formatter.
    pub async fn run(
        &self,
        snapshot: &CatalogSnapshot,
        formatter: &dyn Formatter,
    ) -> Result<EmitResult> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        let mut snapshot = snapshot.clone();
        normalize_snapshot(&mut snapshot);

        let primary_schema = self.primary_schema(&snapshot);
        let mut report = EmitReport::new(run_id.clone(), primary_schema.clone());

        info!(
            run_id = %run_id,
            primary_schema = %primary_schema,
            schemas = snapshot.schemas.len(),
            "emission started"
        );

        let analysis = RelationshipAnalysis::analyze(&snapshot);
        let registry = ShellRegistry::build(&snapshot, &primary_schema);
        let assembler = Assembler::new(&snapshot, &analysis, &registry, &primary_schema);
        let function_assembler = FunctionAssembler::new(&snapshot, &registry, &primary_schema);
        let function_bundles = function_assembler.assemble_functions(&mut report);

        let mut items: Vec<DocumentItem> = Vec::new();
        for schema_name in self.schema_order(&snapshot, &primary_schema) {
            for relation in snapshot.relations() {
                if relation.schema != schema_name {
                    continue;
                }
                items.push(DocumentItem::Relation(
                    assembler.assemble_relation(relation, &mut report),
                ));
                report.relations += 1;
            }
            for bundles in &function_bundles {
                if bundles.schema == schema_name {
                    items.push(DocumentItem::Function(bundles.clone()));
                    report.functions += 1;
                }
            }
        }

        let document = render_document(&items, &self.options.style)?;
        let document = formatter.format(&document, &self.options.style).await?;

        report.duration_ms = started.elapsed().as_millis() as u64;
        report.document_bytes = document.len() as u64;

        info!(
            run_id = %run_id,
            relations = report.relations,
            functions = report.functions,
            degraded = report.degraded_count,
            duration_ms = report.duration_ms,
            "emission finished"
        );

        Ok(EmitResult { document, report })
    }

    fn primary_schema(&self, snapshot: &CatalogSnapshot) -> String {
        let requested = self
            .options
            .default_schema
            .clone()
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
        if snapshot.schemas.iter().any(|s| s.name == requested) {
            return requested;
        }
        snapshot
            .schemas
            .first()
            .map(|s| s.name.clone())
            .unwrap_or(requested)
    }

    /// Primary schema first, then remaining schemas in sorted order.
    fn schema_order(&self, snapshot: &CatalogSnapshot, primary_schema: &str) -> Vec<String> {
        let mut order: Vec<String> = vec![primary_schema.to_string()];
        for schema in &snapshot.schemas {
            if schema.name != primary_schema {
                order.push(schema.name.clone());
            }
        }
        order
    }
}
