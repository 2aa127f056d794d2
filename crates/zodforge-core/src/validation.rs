use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::snapshot::{CatalogSnapshot, TypeKind};

/// Validate internal consistency of a catalog snapshot.
///
/// This checks:
/// - duplicate schema names
/// - duplicate relation ids across the union of relation kinds
/// - duplicate column names within a relation
/// - columns referencing unknown relation ids
/// - enum types with no variants
/// - composite attributes referencing unknown type ids
pub fn validate_snapshot(snapshot: &CatalogSnapshot) -> Result<()> {
    let mut schema_names = BTreeSet::new();
    for schema in &snapshot.schemas {
        if !schema_names.insert(schema.name.as_str()) {
            return Err(Error::InvalidSnapshot(format!(
                "duplicate schema name: {}",
                schema.name
            )));
        }
    }

    let mut relation_ids: BTreeMap<i64, String> = BTreeMap::new();
    for relation in snapshot.relations() {
        let key = format!("{}.{}", relation.schema, relation.name);
        if let Some(existing) = relation_ids.insert(relation.id, key.clone()) {
            return Err(Error::InvalidSnapshot(format!(
                "duplicate relation id {} shared by {} and {}",
                relation.id, existing, key
            )));
        }
    }

    let mut columns_seen: BTreeMap<i64, BTreeSet<&str>> = BTreeMap::new();
    for column in &snapshot.columns {
        let Some(relation) = relation_ids.get(&column.relation_id) else {
            return Err(Error::InvalidSnapshot(format!(
                "column '{}' references unknown relation id {}",
                column.name, column.relation_id
            )));
        };
        let seen = columns_seen.entry(column.relation_id).or_default();
        if !seen.insert(column.name.as_str()) {
            return Err(Error::InvalidSnapshot(format!(
                "duplicate column name: {}.{}",
                relation, column.name
            )));
        }
    }

    let type_ids: BTreeSet<i64> = snapshot.types.iter().map(|ty| ty.id).collect();
    for ty in &snapshot.types {
        match &ty.kind {
            TypeKind::Enum { variants } => {
                if variants.is_empty() {
                    return Err(Error::InvalidSnapshot(format!(
                        "enum type {}.{} has no variants",
                        ty.schema, ty.name
                    )));
                }
            }
            TypeKind::Composite { attributes } => {
                for attribute in attributes {
                    if !type_ids.contains(&attribute.type_id) {
                        return Err(Error::InvalidSnapshot(format!(
                            "composite type {}.{} attribute '{}' references unknown type id {}",
                            ty.schema, ty.name, attribute.name, attribute.type_id
                        )));
                    }
                }
            }
            TypeKind::Scalar => {}
        }
    }

    Ok(())
}
