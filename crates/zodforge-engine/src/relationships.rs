use std::collections::BTreeMap;

use serde::Serialize;

use zodforge_core::CatalogSnapshot;

/// A direct (foreign key) to-one accessor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToOneAccessor {
    /// Constraint name of the backing foreign key.
    pub key_name: String,
    /// Foreign-key column(s) on the owning relation.
    pub source_columns: Vec<String>,
    pub target_schema: String,
    pub target_relation: String,
    pub target_columns: Vec<String>,
}

/// An inferred many-to-many to-many accessor through a junction relation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToManyAccessor {
    pub target_relation: String,
    pub join_schema: String,
    pub join_relation: String,
    /// Junction column(s) referencing the owning relation.
    pub source_key: Vec<String>,
    /// Junction column(s) referencing the target relation.
    pub target_key: Vec<String>,
}

/// Relationship accessors derived once per run from the snapshot.
#[derive(Debug, Default)]
pub struct RelationshipAnalysis {
    /// Keyed by `schema.relation`.
    direct: BTreeMap<String, Vec<ToOneAccessor>>,
    /// Keyed by relation name; the junction heuristic carries no schema
    /// qualification of its endpoints.
    many_to_many: BTreeMap<String, Vec<ToManyAccessor>>,
}

fn relation_key(schema: &str, relation: &str) -> String {
    format!("{schema}.{relation}")
}

impl RelationshipAnalysis {
    /// Derive direct and inferred accessors for every relation.
    pub fn analyze(snapshot: &CatalogSnapshot) -> Self {
        let mut analysis = RelationshipAnalysis::default();
        analysis.collect_direct(snapshot);
        analysis.infer_many_to_many(snapshot);
        analysis
    }

    fn collect_direct(&mut self, snapshot: &CatalogSnapshot) {
        for relation in snapshot.relations() {
            let mut accessors: Vec<ToOneAccessor> = snapshot
                .relationships
                .iter()
                .filter(|rel| {
                    rel.schema == relation.schema
                        && rel.referenced_schema == relation.schema
                        && rel.relation == relation.name
                })
                .map(|rel| ToOneAccessor {
                    key_name: rel.name.clone(),
                    source_columns: rel.columns.clone(),
                    target_schema: rel.referenced_schema.clone(),
                    target_relation: rel.referenced_relation.clone(),
                    target_columns: rel.referenced_columns.clone(),
                })
                .collect();
            accessors.sort_by(|a, b| {
                (&a.key_name, &a.target_relation, &a.target_columns).cmp(&(
                    &b.key_name,
                    &b.target_relation,
                    &b.target_columns,
                ))
            });
            // One accessor per foreign key; constraint names are unique
            // within a schema, so parallel keys to the same target all
            // survive.
            accessors.dedup_by(|a, b| a.key_name == b.key_name);
            if !accessors.is_empty() {
                self.direct
                    .insert(relation_key(relation.schema, relation.name), accessors);
            }
        }
    }

    /// A relation with exactly two outgoing foreign keys is treated as a
    /// junction. This is a structural heuristic and can misclassify two-FK
    /// tables that carry substantive columns of their own.
    fn infer_many_to_many(&mut self, snapshot: &CatalogSnapshot) {
        let mut outgoing: BTreeMap<String, Vec<&zodforge_core::Relationship>> = BTreeMap::new();
        for rel in &snapshot.relationships {
            outgoing
                .entry(relation_key(&rel.schema, &rel.relation))
                .or_default()
                .push(rel);
        }

        for (_, fks) in outgoing {
            let [left, right] = fks.as_slice() else {
                continue;
            };
            let pairs = [(left, right), (right, left)];
            for (own, other) in pairs {
                let accessor = ToManyAccessor {
                    target_relation: other.referenced_relation.clone(),
                    join_schema: own.schema.clone(),
                    join_relation: own.relation.clone(),
                    source_key: own.columns.clone(),
                    target_key: other.columns.clone(),
                };
                self.many_to_many
                    .entry(own.referenced_relation.clone())
                    .or_default()
                    .push(accessor);
            }
        }

        for accessors in self.many_to_many.values_mut() {
            accessors.sort_by(|a, b| {
                (&a.target_relation, &a.join_schema, &a.join_relation).cmp(&(
                    &b.target_relation,
                    &b.join_schema,
                    &b.join_relation,
                ))
            });
            // One accessor per target relation name.
            accessors.dedup_by(|a, b| a.target_relation == b.target_relation);
        }
    }

    /// Direct to-one accessors for a relation.
    pub fn direct_for(&self, schema: &str, relation: &str) -> &[ToOneAccessor] {
        self.direct
            .get(&relation_key(schema, relation))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Surviving many-to-many accessors for a relation: inferred targets
    /// already covered by a direct accessor are suppressed.
    pub fn many_to_many_for(&self, schema: &str, relation: &str) -> Vec<&ToManyAccessor> {
        let direct = self.direct_for(schema, relation);
        self.many_to_many
            .get(relation)
            .map(|accessors| {
                accessors
                    .iter()
                    .filter(|accessor| {
                        !direct
                            .iter()
                            .any(|d| d.target_relation == accessor.target_relation)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodforge_core::{Relationship, Schema, Table, normalize_snapshot};

    fn fk(
        name: &str,
        relation: &str,
        columns: &[&str],
        referenced: &str,
        referenced_columns: &[&str],
    ) -> Relationship {
        Relationship {
            name: name.to_string(),
            schema: "public".to_string(),
            relation: relation.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_schema: "public".to_string(),
            referenced_relation: referenced.to_string(),
            referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn table(id: i64, name: &str) -> Table {
        Table {
            id,
            name: name.to_string(),
            schema: "public".to_string(),
        }
    }

    fn snapshot(tables: Vec<Table>, relationships: Vec<Relationship>) -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot {
            snapshot_version: zodforge_core::SNAPSHOT_VERSION.to_string(),
            database: None,
            schemas: vec![Schema {
                name: "public".to_string(),
            }],
            tables,
            foreign_tables: Vec::new(),
            views: Vec::new(),
            materialized_views: Vec::new(),
            columns: Vec::new(),
            types: Vec::new(),
            functions: Vec::new(),
            relationships,
        };
        normalize_snapshot(&mut snapshot);
        snapshot
    }

    #[test]
    fn junction_yields_symmetric_accessors() {
        let snapshot = snapshot(
            vec![
                table(1, "members"),
                table(2, "teams"),
                table(3, "memberships"),
            ],
            vec![
                fk("memberships_member_fk", "memberships", &["member_id"], "members", &["id"]),
                fk("memberships_team_fk", "memberships", &["team_id"], "teams", &["id"]),
            ],
        );
        let analysis = RelationshipAnalysis::analyze(&snapshot);

        let on_members = analysis.many_to_many_for("public", "members");
        assert_eq!(on_members.len(), 1);
        assert_eq!(on_members[0].target_relation, "teams");
        assert_eq!(on_members[0].join_relation, "memberships");
        assert_eq!(on_members[0].source_key, vec!["member_id".to_string()]);
        assert_eq!(on_members[0].target_key, vec!["team_id".to_string()]);

        let on_teams = analysis.many_to_many_for("public", "teams");
        assert_eq!(on_teams.len(), 1);
        assert_eq!(on_teams[0].target_relation, "members");
        assert_eq!(on_teams[0].source_key, vec!["team_id".to_string()]);
        assert_eq!(on_teams[0].target_key, vec!["member_id".to_string()]);
    }

    #[test]
    fn three_fk_relation_is_not_a_junction() {
        let snapshot = snapshot(
            vec![table(1, "a"), table(2, "b"), table(3, "c"), table(4, "link")],
            vec![
                fk("link_a_fk", "link", &["a_id"], "a", &["id"]),
                fk("link_b_fk", "link", &["b_id"], "b", &["id"]),
                fk("link_c_fk", "link", &["c_id"], "c", &["id"]),
            ],
        );
        let analysis = RelationshipAnalysis::analyze(&snapshot);
        assert!(analysis.many_to_many_for("public", "a").is_empty());
    }

    #[test]
    fn direct_accessor_suppresses_inferred_target() {
        let snapshot = snapshot(
            vec![table(1, "a"), table(2, "b"), table(3, "link")],
            vec![
                fk("link_a_fk", "link", &["a_id"], "a", &["id"]),
                fk("link_b_fk", "link", &["b_id"], "b", &["id"]),
                fk("a_b_fk", "a", &["b_id"], "b", &["id"]),
            ],
        );
        let analysis = RelationshipAnalysis::analyze(&snapshot);

        let direct = analysis.direct_for("public", "a");
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].target_relation, "b");
        assert!(analysis.many_to_many_for("public", "a").is_empty());
    }

    #[test]
    fn parallel_foreign_keys_to_one_target_all_survive() {
        let snapshot = snapshot(
            vec![table(1, "messages"), table(2, "users")],
            vec![
                fk("messages_sender_fk", "messages", &["sender_id"], "users", &["id"]),
                fk("messages_recipient_fk", "messages", &["recipient_id"], "users", &["id"]),
            ],
        );
        let analysis = RelationshipAnalysis::analyze(&snapshot);

        let direct = analysis.direct_for("public", "messages");
        assert_eq!(direct.len(), 2);
        assert_eq!(direct[0].key_name, "messages_recipient_fk");
        assert_eq!(direct[0].source_columns, vec!["recipient_id".to_string()]);
        assert_eq!(direct[1].key_name, "messages_sender_fk");
        assert_eq!(direct[1].source_columns, vec!["sender_id".to_string()]);
    }

    #[test]
    fn direct_accessors_sort_by_key_name() {
        let snapshot = snapshot(
            vec![table(1, "orders"), table(2, "users"), table(3, "shops")],
            vec![
                fk("z_orders_user_fk", "orders", &["user_id"], "users", &["id"]),
                fk("a_orders_shop_fk", "orders", &["shop_id"], "shops", &["id"]),
            ],
        );
        let analysis = RelationshipAnalysis::analyze(&snapshot);
        let direct = analysis.direct_for("public", "orders");
        assert_eq!(direct.len(), 2);
        assert_eq!(direct[0].key_name, "a_orders_shop_fk");
        assert_eq!(direct[1].key_name, "z_orders_user_fk");
    }
}
