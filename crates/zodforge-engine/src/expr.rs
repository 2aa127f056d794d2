use std::collections::BTreeSet;

use crate::coerce::CoercionRule;

/// Abstract validator expression.
///
/// The resolver and assembler build these; a target adapter (currently the
/// Zod renderer in [`crate::output`]) translates them into source text, which
/// keeps the resolution rules independent of any one validator framework.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorExpr {
    Boolean,
    Integer,
    Number,
    Text,
    Uuid,
    /// Canonical textual date (`YYYY-MM-DD`), used by insert/update shapes.
    IsoDate,
    /// Canonical textual timestamp (ISO-8601), used by insert/update shapes.
    IsoDateTime,
    /// Read shape for temporals: any accepted representation coerced to a
    /// native date value.
    CoercedDate,
    /// Permissive validator for `json`/`jsonb`.
    Json,
    Void,
    /// Mapping of unknown values, for `record`.
    RecordOfUnknown,
    /// Maximally permissive fallback; resolution never fails, it degrades
    /// to this.
    Unknown,
    /// Accepts only the absence of a value.
    Never,
    /// Lenient coercion helper reference.
    Lenient(CoercionRule),
    /// Inline enumeration of literal values.
    EnumOf(Vec<String>),
    ArrayOf(Box<ValidatorExpr>),
    Nullable(Box<ValidatorExpr>),
    Optional(Box<ValidatorExpr>),
    Union(Vec<ValidatorExpr>),
    ObjectOf(Vec<ObjectField>),
    /// Deferred reference to a named validator, for cyclic relation graphs.
    LazyRef(String),
}

/// A single key/validator pair inside an object validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub key: String,
    pub expr: ValidatorExpr,
}

impl ObjectField {
    pub fn new(key: impl Into<String>, expr: ValidatorExpr) -> Self {
        Self {
            key: key.into(),
            expr,
        }
    }
}

impl ValidatorExpr {
    pub fn array(self) -> Self {
        ValidatorExpr::ArrayOf(Box::new(self))
    }

    pub fn nullable(self) -> Self {
        ValidatorExpr::Nullable(Box::new(self))
    }

    pub fn optional(self) -> Self {
        ValidatorExpr::Optional(Box::new(self))
    }

    /// True when any part of this expression degraded to the permissive
    /// fallback.
    pub fn contains_unknown(&self) -> bool {
        match self {
            ValidatorExpr::Unknown => true,
            ValidatorExpr::ArrayOf(inner)
            | ValidatorExpr::Nullable(inner)
            | ValidatorExpr::Optional(inner) => inner.contains_unknown(),
            ValidatorExpr::Union(members) => members.iter().any(Self::contains_unknown),
            ValidatorExpr::ObjectOf(fields) => {
                fields.iter().any(|field| field.expr.contains_unknown())
            }
            _ => false,
        }
    }

    /// Collect every lenient coercion rule referenced by this expression.
    pub fn collect_coercions(&self, rules: &mut BTreeSet<CoercionRule>) {
        match self {
            ValidatorExpr::Lenient(rule) => {
                rules.insert(*rule);
            }
            ValidatorExpr::ArrayOf(inner)
            | ValidatorExpr::Nullable(inner)
            | ValidatorExpr::Optional(inner) => inner.collect_coercions(rules),
            ValidatorExpr::Union(members) => {
                for member in members {
                    member.collect_coercions(rules);
                }
            }
            ValidatorExpr::ObjectOf(fields) => {
                for field in fields {
                    field.expr.collect_coercions(rules);
                }
            }
            _ => {}
        }
    }
}
