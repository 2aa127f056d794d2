use std::collections::BTreeMap;

use serde::Serialize;

use zodforge_core::{CatalogSnapshot, Column, IdentityGeneration, Relation, RelationKind};

use crate::expr::{ObjectField, ValidatorExpr};
use crate::naming;
use crate::relationships::{RelationshipAnalysis, ToManyAccessor, ToOneAccessor};
use crate::report::{EmitIssue, EmitReport};
use crate::resolve::{Mode, Resolver};

/// Phase-1 shell for a relation: the name-keyed handle other bundles
/// reference before that relation's own bundles exist. Building all shells
/// up front avoids construction-order problems in cyclic relation graphs;
/// the emitted text still defers the lookup with a lazy reference.
#[derive(Debug, Clone)]
pub struct RelationShell {
    pub schema: String,
    pub name: String,
    pub kind: RelationKind,
    pub list_ident: String,
}

/// Registry of all relation shells, keyed by `schema.name`.
#[derive(Debug, Default)]
pub struct ShellRegistry {
    shells: BTreeMap<String, RelationShell>,
}

impl ShellRegistry {
    /// Phase 1: register a shell for every relation in the snapshot.
    pub fn build(snapshot: &CatalogSnapshot, primary_schema: &str) -> Self {
        let mut registry = ShellRegistry::default();
        for relation in snapshot.relations() {
            let shell = RelationShell {
                schema: relation.schema.to_string(),
                name: relation.name.to_string(),
                kind: relation.kind,
                list_ident: naming::bundle_ident(
                    primary_schema,
                    relation.schema,
                    relation.name,
                    naming::LIST_SUFFIX,
                ),
            };
            registry
                .shells
                .insert(format!("{}.{}", relation.schema, relation.name), shell);
        }
        registry
    }

    pub fn get(&self, schema: &str, name: &str) -> Option<&RelationShell> {
        self.shells.get(&format!("{schema}.{name}"))
    }

    /// Look up by bare relation name, preferring the home schema, else the
    /// first lexical match. Same preference rule as type-name resolution.
    pub fn find_by_name(&self, home_schema: &str, name: &str) -> Option<&RelationShell> {
        if let Some(shell) = self.get(home_schema, name) {
            return Some(shell);
        }
        self.shells.values().find(|shell| shell.name == name)
    }
}

/// A named bundle: the emitted identifier plus its validator expression.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedBundle {
    pub ident: String,
    pub expr: ValidatorExpr,
}

/// Machine-readable relationship metadata emitted alongside the bundles,
/// enough for a consumer to execute the joins without re-deriving them.
#[derive(Debug, Clone, Serialize, Default)]
pub struct RelationshipTags {
    pub to_one: Vec<ToOneAccessor>,
    pub to_many: Vec<ToManyAccessor>,
}

impl RelationshipTags {
    pub fn is_empty(&self) -> bool {
        self.to_one.is_empty() && self.to_many.is_empty()
    }
}

/// All validator bundles assembled for one relation.
#[derive(Debug, Clone)]
pub struct RelationBundles {
    pub schema: String,
    pub name: String,
    pub kind: RelationKind,
    pub list: NamedBundle,
    pub insert: Option<NamedBundle>,
    pub insert_lenient: Option<NamedBundle>,
    pub update: Option<NamedBundle>,
    pub relationships_ident: String,
    pub tags: RelationshipTags,
}

/// Phase-2 assembler: composes column and relationship lines into bundles,
/// resolving accessor targets against the shell registry.
pub struct Assembler<'a> {
    snapshot: &'a CatalogSnapshot,
    resolver: Resolver<'a>,
    analysis: &'a RelationshipAnalysis,
    registry: &'a ShellRegistry,
    primary_schema: &'a str,
}

impl<'a> Assembler<'a> {
    pub fn new(
        snapshot: &'a CatalogSnapshot,
        analysis: &'a RelationshipAnalysis,
        registry: &'a ShellRegistry,
        primary_schema: &'a str,
    ) -> Self {
        Self {
            snapshot,
            resolver: Resolver::new(snapshot),
            analysis,
            registry,
            primary_schema,
        }
    }

    /// Assemble every bundle for one relation.
    pub fn assemble_relation(
        &self,
        relation: Relation<'_>,
        report: &mut EmitReport,
    ) -> RelationBundles {
        let mut columns = self.snapshot.columns_of(relation.id);
        columns.sort_by(|a, b| a.name.cmp(&b.name));

        let ident = |suffix: &str| {
            naming::bundle_ident(self.primary_schema, relation.schema, relation.name, suffix)
        };

        let tags = self.relationship_tags(relation);
        let list = NamedBundle {
            ident: ident(naming::LIST_SUFFIX),
            expr: self.list_object(relation, &columns, &tags, report),
        };

        let (insert, insert_lenient, update) = match relation.kind {
            RelationKind::Table | RelationKind::ForeignTable => (
                Some(NamedBundle {
                    ident: ident(naming::INSERT_SUFFIX),
                    expr: self.write_object(relation, &columns, Mode::Insert, report),
                }),
                Some(NamedBundle {
                    ident: ident(naming::INSERT_LENIENT_SUFFIX),
                    expr: self.write_object(relation, &columns, Mode::InsertLenient, report),
                }),
                Some(NamedBundle {
                    ident: ident(naming::UPDATE_SUFFIX),
                    expr: self.write_object(relation, &columns, Mode::Update, report),
                }),
            ),
            RelationKind::View if relation.is_updatable => (
                Some(NamedBundle {
                    ident: ident(naming::INSERT_SUFFIX),
                    expr: self.view_write_object(relation, &columns, report),
                }),
                None,
                Some(NamedBundle {
                    ident: ident(naming::UPDATE_SUFFIX),
                    expr: self.view_write_object(relation, &columns, report),
                }),
            ),
            RelationKind::View | RelationKind::MaterializedView => (None, None, None),
        };

        RelationBundles {
            schema: relation.schema.to_string(),
            name: relation.name.to_string(),
            kind: relation.kind,
            list,
            insert,
            insert_lenient,
            update,
            relationships_ident: ident(naming::RELATIONSHIPS_SUFFIX),
            tags,
        }
    }

    fn relationship_tags(&self, relation: Relation<'_>) -> RelationshipTags {
        RelationshipTags {
            to_one: self
                .analysis
                .direct_for(relation.schema, relation.name)
                .to_vec(),
            to_many: self
                .analysis
                .many_to_many_for(relation.schema, relation.name)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    /// Read-shape object: every column nullable-wrapped iff nullable, plus
    /// relationship accessor fields.
    fn list_object(
        &self,
        relation: Relation<'_>,
        columns: &[&Column],
        tags: &RelationshipTags,
        report: &mut EmitReport,
    ) -> ValidatorExpr {
        let mut fields = Vec::with_capacity(columns.len() + tags.to_one.len() + tags.to_many.len());
        for column in columns {
            let mut expr = self.resolve_column(relation, column, Mode::List, report);
            if column.is_nullable {
                expr = expr.nullable();
            }
            fields.push(ObjectField::new(column.name.clone(), expr));
        }

        // One getter per foreign key, keyed by its constraint name: the FK
        // column's own name already keys that column's scalar line, and a
        // relation can carry several keys to the same target.
        for accessor in &tags.to_one {
            let expr = match self
                .registry
                .get(&accessor.target_schema, &accessor.target_relation)
            {
                Some(shell) => ValidatorExpr::LazyRef(shell.list_ident.clone())
                    .nullable()
                    .optional(),
                None => {
                    report.record_warning(
                        EmitIssue::warning(
                            "missing_relationship_target",
                            format!(
                                "relationship '{}' references unknown relation {}.{}",
                                accessor.key_name,
                                accessor.target_schema,
                                accessor.target_relation
                            ),
                        )
                        .at(relation.schema, relation.name),
                    );
                    ValidatorExpr::Unknown
                }
            };
            fields.push(ObjectField::new(accessor.key_name.clone(), expr));
        }

        for accessor in &tags.to_many {
            let expr = match self
                .registry
                .find_by_name(relation.schema, &accessor.target_relation)
            {
                Some(shell) => ValidatorExpr::LazyRef(shell.list_ident.clone())
                    .array()
                    .optional(),
                None => {
                    report.record_warning(
                        EmitIssue::warning(
                            "missing_relationship_target",
                            format!(
                                "junction '{}' references unknown relation {}",
                                accessor.join_relation, accessor.target_relation
                            ),
                        )
                        .at(relation.schema, relation.name),
                    );
                    ValidatorExpr::Unknown
                }
            };
            fields.push(ObjectField::new(accessor.target_relation.clone(), expr));
        }

        ValidatorExpr::ObjectOf(fields)
    }

    /// Insert/lenient/update shapes for tables and foreign tables.
    fn write_object(
        &self,
        relation: Relation<'_>,
        columns: &[&Column],
        mode: Mode,
        report: &mut EmitReport,
    ) -> ValidatorExpr {
        let fields = columns
            .iter()
            .map(|column| {
                // Identity-always columns are system-generated; omission is
                // the only legal state in every write shape.
                if column.identity == Some(IdentityGeneration::Always) {
                    return ObjectField::new(column.name.clone(), ValidatorExpr::Never.optional());
                }

                let mut expr = self.resolve_column(relation, column, mode, report);
                if column.is_nullable {
                    expr = expr.nullable();
                }
                let optional = match mode {
                    Mode::Update => true,
                    _ => {
                        column.is_nullable
                            || column.identity.is_some()
                            || column.default_value.is_some()
                    }
                };
                if optional {
                    expr = expr.optional();
                }
                ObjectField::new(column.name.clone(), expr)
            })
            .collect();
        ValidatorExpr::ObjectOf(fields)
    }

    /// Write shape for an updatable view: views have no dedicated
    /// insert/update type semantics, so updatable columns resolve in list
    /// mode and are forced nullable-and-optional; everything else takes the
    /// never/optional rule.
    fn view_write_object(
        &self,
        relation: Relation<'_>,
        columns: &[&Column],
        report: &mut EmitReport,
    ) -> ValidatorExpr {
        let fields = columns
            .iter()
            .map(|column| {
                let expr = if column.is_updatable {
                    self.resolve_column(relation, column, Mode::List, report)
                        .nullable()
                        .optional()
                } else {
                    ValidatorExpr::Never.optional()
                };
                ObjectField::new(column.name.clone(), expr)
            })
            .collect();
        ValidatorExpr::ObjectOf(fields)
    }

    fn resolve_column(
        &self,
        relation: Relation<'_>,
        column: &Column,
        mode: Mode,
        report: &mut EmitReport,
    ) -> ValidatorExpr {
        let expr = self.resolver.resolve(relation.schema, &column.format, mode);
        if expr.contains_unknown() {
            report.record_degraded();
            report.record_warning(
                EmitIssue::warning(
                    "unresolved_type",
                    format!("type '{}' degraded to the permissive validator", column.format),
                )
                .at(relation.schema, relation.name)
                .column(&column.name),
            );
        }
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodforge_core::{Relationship, Schema, Table, TypeDef, TypeKind, View, normalize_snapshot};

    fn column(relation_id: i64, name: &str, format: &str) -> Column {
        Column {
            relation_id,
            name: name.to_string(),
            format: format.to_string(),
            is_nullable: false,
            identity: None,
            default_value: None,
            is_updatable: true,
        }
    }

    fn users_snapshot() -> CatalogSnapshot {
        let mut id_column = column(1, "id", "int4");
        id_column.identity = Some(IdentityGeneration::Always);
        let mut status_column = column(1, "status", "status");
        status_column.default_value = Some("'ACTIVE'".to_string());
        let mut name_column = column(1, "name", "text");
        name_column.is_nullable = true;

        let mut snapshot = CatalogSnapshot {
            snapshot_version: zodforge_core::SNAPSHOT_VERSION.to_string(),
            database: None,
            schemas: vec![Schema {
                name: "public".to_string(),
            }],
            tables: vec![Table {
                id: 1,
                name: "users".to_string(),
                schema: "public".to_string(),
            }],
            foreign_tables: Vec::new(),
            views: Vec::new(),
            materialized_views: Vec::new(),
            columns: vec![id_column, status_column, name_column],
            types: vec![TypeDef {
                id: 10,
                name: "status".to_string(),
                schema: "public".to_string(),
                kind: TypeKind::Enum {
                    variants: vec!["ACTIVE".to_string(), "INACTIVE".to_string()],
                },
            }],
            functions: Vec::new(),
            relationships: Vec::new(),
        };
        normalize_snapshot(&mut snapshot);
        snapshot
    }

    fn assemble(snapshot: &CatalogSnapshot) -> (RelationBundles, EmitReport) {
        let analysis = RelationshipAnalysis::analyze(snapshot);
        let registry = ShellRegistry::build(snapshot, "public");
        let assembler = Assembler::new(snapshot, &analysis, &registry, "public");
        let mut report = EmitReport::new("test".to_string(), "public".to_string());
        let relation = snapshot.relations()[0];
        let bundles = assembler.assemble_relation(relation, &mut report);
        (bundles, report)
    }

    fn field<'a>(expr: &'a ValidatorExpr, key: &str) -> &'a ValidatorExpr {
        let ValidatorExpr::ObjectOf(fields) = expr else {
            panic!("expected object validator");
        };
        &fields
            .iter()
            .find(|field| field.key == key)
            .unwrap_or_else(|| panic!("missing field {key}"))
            .expr
    }

    #[test]
    fn list_shape_follows_nullability() {
        let snapshot = users_snapshot();
        let (bundles, _) = assemble(&snapshot);

        assert_eq!(field(&bundles.list.expr, "id"), &ValidatorExpr::Integer);
        assert_eq!(
            field(&bundles.list.expr, "status"),
            &ValidatorExpr::EnumOf(vec!["ACTIVE".to_string(), "INACTIVE".to_string()])
        );
        assert_eq!(
            field(&bundles.list.expr, "name"),
            &ValidatorExpr::Text.nullable()
        );
    }

    #[test]
    fn identity_always_is_forced_never_in_write_shapes() {
        let snapshot = users_snapshot();
        let (bundles, _) = assemble(&snapshot);

        let insert = bundles.insert.expect("insert bundle");
        assert_eq!(field(&insert.expr, "id"), &ValidatorExpr::Never.optional());
        let update = bundles.update.expect("update bundle");
        assert_eq!(field(&update.expr, "id"), &ValidatorExpr::Never.optional());
    }

    #[test]
    fn insert_optionality_composes_nullable_then_optional() {
        let snapshot = users_snapshot();
        let (bundles, _) = assemble(&snapshot);
        let insert = bundles.insert.expect("insert bundle");

        // Nullable, no default, not identity: nullable().optional(), never
        // optional() alone.
        assert_eq!(
            field(&insert.expr, "name"),
            &ValidatorExpr::Text.nullable().optional()
        );
        // Default present, not nullable: optional but not nullable.
        assert_eq!(
            field(&insert.expr, "status"),
            &ValidatorExpr::EnumOf(vec!["ACTIVE".to_string(), "INACTIVE".to_string()]).optional()
        );
    }

    #[test]
    fn update_shape_is_always_optional() {
        let snapshot = users_snapshot();
        let (bundles, _) = assemble(&snapshot);
        let update = bundles.update.expect("update bundle");

        assert_eq!(
            field(&update.expr, "status"),
            &ValidatorExpr::EnumOf(vec!["ACTIVE".to_string(), "INACTIVE".to_string()]).optional()
        );
        assert_eq!(
            field(&update.expr, "name"),
            &ValidatorExpr::Text.nullable().optional()
        );
    }

    #[test]
    fn lenient_insert_swaps_primitive_validators() {
        let mut snapshot = users_snapshot();
        snapshot.columns.push(column(1, "active", "bool"));
        normalize_snapshot(&mut snapshot);
        let (bundles, _) = assemble(&snapshot);

        let lenient = bundles.insert_lenient.expect("lenient bundle");
        assert_eq!(
            field(&lenient.expr, "active"),
            &ValidatorExpr::Lenient(crate::coerce::CoercionRule::Boolean)
        );
    }

    #[test]
    fn parallel_foreign_keys_keep_one_getter_each() {
        let mut snapshot = CatalogSnapshot {
            snapshot_version: zodforge_core::SNAPSHOT_VERSION.to_string(),
            database: None,
            schemas: vec![Schema {
                name: "public".to_string(),
            }],
            tables: vec![
                Table {
                    id: 1,
                    name: "messages".to_string(),
                    schema: "public".to_string(),
                },
                Table {
                    id: 2,
                    name: "users".to_string(),
                    schema: "public".to_string(),
                },
            ],
            foreign_tables: Vec::new(),
            views: Vec::new(),
            materialized_views: Vec::new(),
            columns: vec![
                column(1, "sender_id", "int4"),
                column(1, "recipient_id", "int4"),
                column(2, "id", "int4"),
            ],
            types: Vec::new(),
            functions: Vec::new(),
            relationships: vec![
                Relationship {
                    name: "messages_sender_fk".to_string(),
                    schema: "public".to_string(),
                    relation: "messages".to_string(),
                    columns: vec!["sender_id".to_string()],
                    referenced_schema: "public".to_string(),
                    referenced_relation: "users".to_string(),
                    referenced_columns: vec!["id".to_string()],
                },
                Relationship {
                    name: "messages_recipient_fk".to_string(),
                    schema: "public".to_string(),
                    relation: "messages".to_string(),
                    columns: vec!["recipient_id".to_string()],
                    referenced_schema: "public".to_string(),
                    referenced_relation: "users".to_string(),
                    referenced_columns: vec!["id".to_string()],
                },
            ],
        };
        normalize_snapshot(&mut snapshot);
        let (bundles, _) = assemble(&snapshot);

        // Both keys to the same target stay distinct getters, and both FK
        // columns keep their scalar lines.
        let expected = ValidatorExpr::LazyRef("usersListSchema".to_string())
            .nullable()
            .optional();
        assert_eq!(field(&bundles.list.expr, "messages_sender_fk"), &expected);
        assert_eq!(field(&bundles.list.expr, "messages_recipient_fk"), &expected);
        assert_eq!(
            field(&bundles.list.expr, "sender_id"),
            &ValidatorExpr::Integer
        );
        assert_eq!(bundles.tags.to_one.len(), 2);
        let keys: Vec<&str> = bundles
            .tags
            .to_one
            .iter()
            .map(|accessor| accessor.key_name.as_str())
            .collect();
        assert_eq!(keys, vec!["messages_recipient_fk", "messages_sender_fk"]);
    }

    #[test]
    fn updatable_view_forces_write_rules() {
        let mut frozen = column(2, "computed", "int4");
        frozen.is_updatable = false;
        let editable = column(2, "name", "text");

        let mut snapshot = CatalogSnapshot {
            snapshot_version: zodforge_core::SNAPSHOT_VERSION.to_string(),
            database: None,
            schemas: vec![Schema {
                name: "public".to_string(),
            }],
            tables: Vec::new(),
            foreign_tables: Vec::new(),
            views: vec![View {
                id: 2,
                name: "profiles".to_string(),
                schema: "public".to_string(),
                is_updatable: true,
            }],
            materialized_views: Vec::new(),
            columns: vec![frozen, editable],
            types: Vec::new(),
            functions: Vec::new(),
            relationships: Vec::new(),
        };
        normalize_snapshot(&mut snapshot);
        let (bundles, _) = assemble(&snapshot);

        let insert = bundles.insert.expect("updatable view insert bundle");
        assert!(bundles.insert_lenient.is_none());
        assert_eq!(
            field(&insert.expr, "computed"),
            &ValidatorExpr::Never.optional()
        );
        // Updatable view columns resolve in list mode, forced
        // nullable-and-optional regardless of declared nullability.
        assert_eq!(
            field(&insert.expr, "name"),
            &ValidatorExpr::Text.nullable().optional()
        );
    }

    #[test]
    fn unresolved_types_degrade_and_are_reported() {
        let mut snapshot = users_snapshot();
        snapshot.columns.push(column(1, "span", "tsrange"));
        normalize_snapshot(&mut snapshot);
        let (bundles, report) = assemble(&snapshot);

        assert_eq!(field(&bundles.list.expr, "span"), &ValidatorExpr::Unknown);
        assert!(report.degraded_count > 0);
        assert!(report.warnings_by_code.contains_key("unresolved_type"));
    }
}
