use zodforge_core::{CatalogSnapshot, TypeDef, TypeKind};

use crate::coerce::CoercionRule;
use crate::expr::ValidatorExpr;

/// Generation mode a validator expression is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read shape for data already stored.
    List,
    Insert,
    InsertLenient,
    Update,
}

/// Closed classification of a physical type name.
///
/// Resolution is a total match over this sum; anything the engine does not
/// recognize lands in [`TypeCategory::Unknown`] and degrades to the
/// permissive fallback instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeCategory {
    /// One leading array marker; the payload is the element type name.
    Array(String),
    /// A matched enum type, variants in declaration order.
    Enum(Vec<String>),
    Boolean,
    Integer,
    Float,
    /// `date_only` distinguishes `date` from the timestamp flavors.
    Temporal { date_only: bool },
    Uuid,
    StringLike,
    Json,
    Void,
    Record,
    Unknown,
}

const INTEGER_NAMES: &[&str] = &[
    "int2",
    "int4",
    "int8",
    "smallint",
    "integer",
    "int",
    "bigint",
    "smallserial",
    "serial",
    "bigserial",
    "serial2",
    "serial4",
    "serial8",
];

const FLOAT_NAMES: &[&str] = &["float4", "float8", "real", "numeric", "decimal", "money"];

const STRING_NAMES: &[&str] = &[
    "text", "citext", "varchar", "bpchar", "char", "character", "name", "bytea", "vector", "time",
    "timetz",
];

/// Recursive type resolver over a read-only snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    snapshot: &'a CatalogSnapshot,
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    /// Classify a physical type name relative to a home schema.
    pub fn classify(&self, home_schema: &str, type_name: &str) -> TypeCategory {
        if let Some(element) = type_name.strip_prefix('_') {
            return TypeCategory::Array(element.to_string());
        }
        if let Some(enum_type) = self.find_enum(home_schema, type_name) {
            if let TypeKind::Enum { variants } = &enum_type.kind {
                return TypeCategory::Enum(variants.clone());
            }
        }
        match type_name {
            "bool" | "boolean" => TypeCategory::Boolean,
            name if INTEGER_NAMES.contains(&name) => TypeCategory::Integer,
            name if FLOAT_NAMES.contains(&name) => TypeCategory::Float,
            "date" => TypeCategory::Temporal { date_only: true },
            "timestamp" | "timestamptz" => TypeCategory::Temporal { date_only: false },
            "uuid" => TypeCategory::Uuid,
            name if STRING_NAMES.contains(&name) => TypeCategory::StringLike,
            "json" | "jsonb" => TypeCategory::Json,
            "void" => TypeCategory::Void,
            "record" => TypeCategory::Record,
            _ => TypeCategory::Unknown,
        }
    }

    /// Resolve a physical type name to a validator expression.
    ///
    /// Total by construction: unrecognized names (composites, row types,
    /// ranges, extensions) resolve to the permissive fallback. Array markers
    /// strip one level per recursion step, which bounds the depth by the
    /// number of markers.
    pub fn resolve(&self, home_schema: &str, type_name: &str, mode: Mode) -> ValidatorExpr {
        match self.classify(home_schema, type_name) {
            TypeCategory::Array(element) => self.resolve(home_schema, &element, mode).array(),
            TypeCategory::Enum(variants) => ValidatorExpr::EnumOf(variants),
            TypeCategory::Boolean => match mode {
                Mode::InsertLenient => ValidatorExpr::Lenient(CoercionRule::Boolean),
                _ => ValidatorExpr::Boolean,
            },
            TypeCategory::Integer => match mode {
                Mode::InsertLenient => ValidatorExpr::Lenient(CoercionRule::Integer),
                _ => ValidatorExpr::Integer,
            },
            TypeCategory::Float => match mode {
                Mode::InsertLenient => ValidatorExpr::Lenient(CoercionRule::Float),
                _ => ValidatorExpr::Number,
            },
            TypeCategory::Temporal { date_only } => match mode {
                Mode::List => ValidatorExpr::CoercedDate,
                Mode::InsertLenient => ValidatorExpr::Lenient(CoercionRule::Temporal),
                Mode::Insert | Mode::Update => {
                    if date_only {
                        ValidatorExpr::IsoDate
                    } else {
                        ValidatorExpr::IsoDateTime
                    }
                }
            },
            TypeCategory::Uuid => ValidatorExpr::Uuid,
            TypeCategory::StringLike => ValidatorExpr::Text,
            TypeCategory::Json => ValidatorExpr::Json,
            TypeCategory::Void => ValidatorExpr::Void,
            TypeCategory::Record => ValidatorExpr::RecordOfUnknown,
            TypeCategory::Unknown => ValidatorExpr::Unknown,
        }
    }

    /// Find an enum type by name, preferring the home schema, else the first
    /// lexical match (types are normalized by (name, schema)).
    fn find_enum(&self, home_schema: &str, type_name: &str) -> Option<&'a TypeDef> {
        let mut first_match = None;
        for ty in &self.snapshot.types {
            if ty.name != type_name || !matches!(ty.kind, TypeKind::Enum { .. }) {
                continue;
            }
            if ty.schema == home_schema {
                return Some(ty);
            }
            if first_match.is_none() {
                first_match = Some(ty);
            }
        }
        first_match
    }
}
