use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level catalog snapshot produced by an introspection collaborator.
///
/// All collections are unordered on input; [`crate::normalize_snapshot`]
/// brings them into the canonical order the emission engine relies on.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSnapshot {
    /// Contract version for this snapshot format.
    pub snapshot_version: String,
    /// Database name when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub foreign_tables: Vec<ForeignTable>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub materialized_views: Vec<MaterializedView>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// A database namespace.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub name: String,
}

/// An ordinary table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    /// Stable relation id, unique across all relation kinds.
    pub id: i64,
    pub name: String,
    pub schema: String,
}

/// A foreign table backed by a foreign data wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignTable {
    pub id: i64,
    pub name: String,
    pub schema: String,
}

/// A view; `is_updatable` decides whether insert/update bundles are emitted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct View {
    pub id: i64,
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub is_updatable: bool,
}

/// A materialized view; always read-only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MaterializedView {
    pub id: i64,
    pub name: String,
    pub schema: String,
}

/// Identity generation strategy for columns using `GENERATED ... AS IDENTITY`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityGeneration {
    Always,
    ByDefault,
}

/// Column metadata, joined to its relation by id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub relation_id: i64,
    pub name: String,
    /// Physical type identifier; array types carry one leading `_` per
    /// nesting level (e.g. `_int4` is `int4[]`).
    pub format: String,
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityGeneration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Per-column updatability, meaningful for view columns.
    #[serde(default = "default_true")]
    pub is_updatable: bool,
}

fn default_true() -> bool {
    true
}

/// A named attribute of a composite type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TypeAttribute {
    pub name: String,
    pub type_id: i64,
}

/// Shape of a user-defined type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Enum { variants: Vec<String> },
    Composite { attributes: Vec<TypeAttribute> },
    Scalar,
}

/// A user-defined type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TypeDef {
    pub id: i64,
    pub name: String,
    pub schema: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

/// Argument passing mode for function arguments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArgMode {
    In,
    InOut,
    Out,
    Variadic,
    Table,
}

/// A single function argument.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FunctionArg {
    pub mode: ArgMode,
    pub name: String,
    pub type_id: i64,
    #[serde(default)]
    pub has_default: bool,
}

/// A database function, possibly one of several overloads sharing a name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Function {
    pub id: i64,
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub args: Vec<FunctionArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_relation_id: Option<i64>,
    #[serde(default)]
    pub is_set_returning: bool,
}

/// A foreign-key relationship, preserving column ordering for composite keys.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    /// Constraint (key) name.
    pub name: String,
    pub schema: String,
    /// Source relation name within `schema`.
    pub relation: String,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_relation: String,
    pub referenced_columns: Vec<String>,
}

/// Kind of relation represented in the snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Table,
    ForeignTable,
    View,
    MaterializedView,
}

/// Borrowed, kind-erased view over any relation in the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Relation<'a> {
    pub id: i64,
    pub name: &'a str,
    pub schema: &'a str,
    pub kind: RelationKind,
    pub is_updatable: bool,
}

impl CatalogSnapshot {
    /// All relations across kinds, sorted by (schema, name).
    pub fn relations(&self) -> Vec<Relation<'_>> {
        let mut relations: Vec<Relation<'_>> = Vec::new();
        relations.extend(self.tables.iter().map(|table| Relation {
            id: table.id,
            name: &table.name,
            schema: &table.schema,
            kind: RelationKind::Table,
            is_updatable: true,
        }));
        relations.extend(self.foreign_tables.iter().map(|table| Relation {
            id: table.id,
            name: &table.name,
            schema: &table.schema,
            kind: RelationKind::ForeignTable,
            is_updatable: true,
        }));
        relations.extend(self.views.iter().map(|view| Relation {
            id: view.id,
            name: &view.name,
            schema: &view.schema,
            kind: RelationKind::View,
            is_updatable: view.is_updatable,
        }));
        relations.extend(self.materialized_views.iter().map(|view| Relation {
            id: view.id,
            name: &view.name,
            schema: &view.schema,
            kind: RelationKind::MaterializedView,
            is_updatable: false,
        }));
        relations.sort_by(|a, b| (a.schema, a.name).cmp(&(b.schema, b.name)));
        relations
    }

    /// Look up any relation by its stable id.
    pub fn relation_by_id(&self, id: i64) -> Option<Relation<'_>> {
        self.relations().into_iter().find(|rel| rel.id == id)
    }

    /// Columns belonging to the given relation, in snapshot order.
    pub fn columns_of(&self, relation_id: i64) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|column| column.relation_id == relation_id)
            .collect()
    }

    /// Look up a type by its stable id.
    pub fn type_by_id(&self, id: i64) -> Option<&TypeDef> {
        self.types.iter().find(|ty| ty.id == id)
    }
}
