use std::collections::BTreeSet;

use zodforge_core::CatalogSnapshot;

/// Options that control how snapshot loading behaves.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Fail on structural or invariant violations instead of warning.
    pub strict: bool,
    /// Include system schemas (`pg_*`, `information_schema`).
    pub include_system_schemas: bool,
    /// Restrict the snapshot to these schemas; `None` keeps everything.
    pub schemas: Option<Vec<String>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict: false,
            include_system_schemas: false,
            schemas: None,
        }
    }
}

impl LoadOptions {
    fn keeps_schema(&self, name: &str) -> bool {
        if !self.include_system_schemas
            && (name.starts_with("pg_") || name == "information_schema")
        {
            return false;
        }
        match &self.schemas {
            Some(schemas) => schemas.iter().any(|schema| schema == name),
            None => true,
        }
    }
}

/// Drop every entity outside the kept schemas, cascading to columns of
/// dropped relations and relationships touching a dropped schema.
pub fn filter_snapshot(snapshot: &mut CatalogSnapshot, options: &LoadOptions) {
    snapshot
        .schemas
        .retain(|schema| options.keeps_schema(&schema.name));
    let kept: BTreeSet<String> = snapshot
        .schemas
        .iter()
        .map(|schema| schema.name.clone())
        .collect();

    snapshot.tables.retain(|table| kept.contains(&table.schema));
    snapshot
        .foreign_tables
        .retain(|table| kept.contains(&table.schema));
    snapshot.views.retain(|view| kept.contains(&view.schema));
    snapshot
        .materialized_views
        .retain(|view| kept.contains(&view.schema));

    let relation_ids: BTreeSet<i64> = snapshot
        .relations()
        .iter()
        .map(|relation| relation.id)
        .collect();
    snapshot
        .columns
        .retain(|column| relation_ids.contains(&column.relation_id));

    snapshot.types.retain(|ty| kept.contains(&ty.schema));
    snapshot
        .functions
        .retain(|function| kept.contains(&function.schema));
    snapshot.relationships.retain(|relationship| {
        kept.contains(&relationship.schema) && kept.contains(&relationship.referenced_schema)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodforge_core::{Column, Schema, Table};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            snapshot_version: zodforge_core::SNAPSHOT_VERSION.to_string(),
            database: None,
            schemas: vec![
                Schema {
                    name: "public".to_string(),
                },
                Schema {
                    name: "pg_catalog".to_string(),
                },
                Schema {
                    name: "audit".to_string(),
                },
            ],
            tables: vec![
                Table {
                    id: 1,
                    name: "users".to_string(),
                    schema: "public".to_string(),
                },
                Table {
                    id: 2,
                    name: "pg_class".to_string(),
                    schema: "pg_catalog".to_string(),
                },
            ],
            foreign_tables: Vec::new(),
            views: Vec::new(),
            materialized_views: Vec::new(),
            columns: vec![
                Column {
                    relation_id: 1,
                    name: "id".to_string(),
                    format: "int8".to_string(),
                    is_nullable: false,
                    identity: None,
                    default_value: None,
                    is_updatable: true,
                },
                Column {
                    relation_id: 2,
                    name: "oid".to_string(),
                    format: "oid".to_string(),
                    is_nullable: false,
                    identity: None,
                    default_value: None,
                    is_updatable: true,
                },
            ],
            types: Vec::new(),
            functions: Vec::new(),
            relationships: Vec::new(),
        }
    }

    #[test]
    fn system_schemas_are_dropped_by_default() {
        let mut snapshot = snapshot();
        filter_snapshot(&mut snapshot, &LoadOptions::default());

        assert!(snapshot.schemas.iter().all(|s| s.name != "pg_catalog"));
        assert_eq!(snapshot.tables.len(), 1);
        assert_eq!(snapshot.columns.len(), 1);
    }

    #[test]
    fn explicit_schema_list_restricts_further() {
        let mut snapshot = snapshot();
        let options = LoadOptions {
            schemas: Some(vec!["audit".to_string()]),
            ..LoadOptions::default()
        };
        filter_snapshot(&mut snapshot, &options);

        assert_eq!(snapshot.schemas.len(), 1);
        assert!(snapshot.tables.is_empty());
        assert!(snapshot.columns.is_empty());
    }
}
