use crate::snapshot::CatalogSnapshot;

/// Bring every snapshot collection into canonical order.
///
/// The emission engine treats the model as pre-sorted, so this runs exactly
/// once at ingestion; one comparator per entity kind:
/// - schemas by name
/// - each relation collection by (schema, name)
/// - columns by (relation id, name)
/// - types by (name, schema), so the first lexical match is well defined
/// - functions by (schema, name, id)
/// - relationships by (name, referenced relation, referenced columns)
///
/// Enum variants, composite attributes, and function arguments keep their
/// declaration order.
pub fn normalize_snapshot(snapshot: &mut CatalogSnapshot) {
    snapshot.schemas.sort_by(|a, b| a.name.cmp(&b.name));
    snapshot
        .tables
        .sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
    snapshot
        .foreign_tables
        .sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
    snapshot
        .views
        .sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
    snapshot
        .materialized_views
        .sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
    snapshot
        .columns
        .sort_by(|a, b| (a.relation_id, &a.name).cmp(&(b.relation_id, &b.name)));
    snapshot
        .types
        .sort_by(|a, b| (&a.name, &a.schema).cmp(&(&b.name, &b.schema)));
    snapshot
        .functions
        .sort_by(|a, b| (&a.schema, &a.name, a.id).cmp(&(&b.schema, &b.name, b.id)));
    snapshot.relationships.sort_by(|a, b| {
        (&a.name, &a.referenced_relation, &a.referenced_columns).cmp(&(
            &b.name,
            &b.referenced_relation,
            &b.referenced_columns,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Column, Schema, Table};

    fn column(relation_id: i64, name: &str) -> Column {
        Column {
            relation_id,
            name: name.to_string(),
            format: "text".to_string(),
            is_nullable: false,
            identity: None,
            default_value: None,
            is_updatable: true,
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            snapshot_version: crate::SNAPSHOT_VERSION.to_string(),
            database: None,
            schemas: vec![
                Schema {
                    name: "sales".to_string(),
                },
                Schema {
                    name: "public".to_string(),
                },
            ],
            tables: vec![
                Table {
                    id: 2,
                    name: "orders".to_string(),
                    schema: "public".to_string(),
                },
                Table {
                    id: 1,
                    name: "accounts".to_string(),
                    schema: "public".to_string(),
                },
            ],
            foreign_tables: Vec::new(),
            views: Vec::new(),
            materialized_views: Vec::new(),
            columns: vec![column(2, "total"), column(2, "id"), column(1, "id")],
            types: Vec::new(),
            functions: Vec::new(),
            relationships: Vec::new(),
        }
    }

    #[test]
    fn sorts_every_collection() {
        let mut snapshot = snapshot();
        normalize_snapshot(&mut snapshot);

        let schema_names: Vec<&str> = snapshot
            .schemas
            .iter()
            .map(|schema| schema.name.as_str())
            .collect();
        assert_eq!(schema_names, vec!["public", "sales"]);

        let table_names: Vec<&str> = snapshot
            .tables
            .iter()
            .map(|table| table.name.as_str())
            .collect();
        assert_eq!(table_names, vec!["accounts", "orders"]);

        let column_keys: Vec<(i64, &str)> = snapshot
            .columns
            .iter()
            .map(|column| (column.relation_id, column.name.as_str()))
            .collect();
        assert_eq!(column_keys, vec![(1, "id"), (2, "id"), (2, "total")]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut first = snapshot();
        normalize_snapshot(&mut first);
        let mut second = first.clone();
        normalize_snapshot(&mut second);

        let first_json = serde_json::to_value(&first).expect("serialize");
        let second_json = serde_json::to_value(&second).expect("serialize");
        assert_eq!(first_json, second_json);
    }
}
