use std::collections::BTreeSet;

use crate::assemble::{NamedBundle, RelationBundles};
use crate::emit::FormatStyle;
use crate::errors::Result;
use crate::expr::ValidatorExpr;
use crate::functions::FunctionBundles;

/// One emitted declaration group, in document order.
#[derive(Debug, Clone)]
pub enum DocumentItem {
    Relation(RelationBundles),
    Function(FunctionBundles),
}

/// Render the full document: prelude, coercion helpers actually used, then
/// every bundle in the given order.
pub fn render_document(items: &[DocumentItem], style: &FormatStyle) -> Result<String> {
    let mut used_rules = BTreeSet::new();
    for item in items {
        if let DocumentItem::Relation(bundles) = item {
            for bundle in relation_bundles(bundles) {
                bundle.expr.collect_coercions(&mut used_rules);
            }
        }
    }

    let mut document = String::new();
    document.push_str("// Generated by zodforge. Do not edit.\n");
    document.push_str("import { z } from \"zod\";\n\n");

    for rule in &used_rules {
        document.push_str(rule.helper_source());
        document.push_str("\n\n");
    }

    for item in items {
        match item {
            DocumentItem::Relation(bundles) => {
                for bundle in relation_bundles(bundles) {
                    push_bundle(&mut document, bundle, style);
                }
                if !bundles.tags.is_empty() {
                    let tags = serde_json::to_string_pretty(&bundles.tags)?;
                    document.push_str(&format!(
                        "export const {} = {} as const;\n\n",
                        bundles.relationships_ident, tags
                    ));
                }
            }
            DocumentItem::Function(bundles) => {
                push_bundle(&mut document, &bundles.args, style);
                push_bundle(&mut document, &bundles.returns, style);
            }
        }
    }

    Ok(document)
}

fn relation_bundles(bundles: &RelationBundles) -> Vec<&NamedBundle> {
    let mut out = vec![&bundles.list];
    out.extend(bundles.insert.as_ref());
    out.extend(bundles.insert_lenient.as_ref());
    out.extend(bundles.update.as_ref());
    out
}

fn push_bundle(document: &mut String, bundle: &NamedBundle, style: &FormatStyle) {
    document.push_str(&format!(
        "export const {} = {};\n\n",
        bundle.ident,
        render_expr(&bundle.expr, style, 0)
    ));
}

/// Render one validator expression at the given nesting depth.
pub fn render_expr(expr: &ValidatorExpr, style: &FormatStyle, depth: usize) -> String {
    match expr {
        ValidatorExpr::Boolean => "z.boolean()".to_string(),
        ValidatorExpr::Integer => "z.number().int()".to_string(),
        ValidatorExpr::Number => "z.number()".to_string(),
        ValidatorExpr::Text => "z.string()".to_string(),
        ValidatorExpr::Uuid => "z.string().uuid()".to_string(),
        ValidatorExpr::IsoDate => "z.string().date()".to_string(),
        ValidatorExpr::IsoDateTime => "z.string().datetime({ offset: true })".to_string(),
        ValidatorExpr::CoercedDate => "z.coerce.date()".to_string(),
        ValidatorExpr::Json => "z.any()".to_string(),
        ValidatorExpr::Void => "z.void()".to_string(),
        ValidatorExpr::RecordOfUnknown => "z.record(z.unknown())".to_string(),
        ValidatorExpr::Unknown => "z.unknown()".to_string(),
        ValidatorExpr::Never => "z.never()".to_string(),
        ValidatorExpr::Lenient(rule) => rule.helper_name().to_string(),
        ValidatorExpr::EnumOf(variants) => {
            let literals: Vec<String> = variants.iter().map(|v| quote(v)).collect();
            format!("z.enum([{}])", literals.join(", "))
        }
        ValidatorExpr::ArrayOf(inner) => {
            format!("z.array({})", render_expr(inner, style, depth))
        }
        ValidatorExpr::Nullable(inner) => {
            format!("{}.nullable()", render_expr(inner, style, depth))
        }
        ValidatorExpr::Optional(inner) => {
            format!("{}.optional()", render_expr(inner, style, depth))
        }
        ValidatorExpr::Union(members) => {
            let rendered: Vec<String> = members
                .iter()
                .map(|member| render_expr(member, style, depth))
                .collect();
            format!("z.union([{}])", rendered.join(", "))
        }
        ValidatorExpr::ObjectOf(fields) => {
            if fields.is_empty() {
                return "z.object({})".to_string();
            }
            let field_indent = indent(style, depth + 1);
            let close_indent = indent(style, depth);
            let lines: Vec<String> = fields
                .iter()
                .map(|field| {
                    format!(
                        "{}{}: {},",
                        field_indent,
                        quote(&field.key),
                        render_expr(&field.expr, style, depth + 1)
                    )
                })
                .collect();
            format!("z.object({{\n{}\n{}}})", lines.join("\n"), close_indent)
        }
        ValidatorExpr::LazyRef(ident) => format!("z.lazy(() => {ident})"),
    }
}

fn indent(style: &FormatStyle, depth: usize) -> String {
    " ".repeat(style.indent * depth)
}

/// Quote a literal identifier or enum variant, preserving special characters.
fn quote(raw: &str) -> String {
    serde_json::to_string(raw).unwrap_or_else(|_| format!("\"{raw}\""))
}
