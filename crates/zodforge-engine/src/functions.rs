use zodforge_core::{ArgMode, CatalogSnapshot, Function};

use crate::assemble::{NamedBundle, ShellRegistry};
use crate::expr::{ObjectField, ValidatorExpr};
use crate::naming;
use crate::report::{EmitIssue, EmitReport};
use crate::resolve::{Mode, Resolver};

/// Argument and return validators for one function name (all overloads).
#[derive(Debug, Clone)]
pub struct FunctionBundles {
    pub schema: String,
    pub name: String,
    pub args: NamedBundle,
    pub returns: NamedBundle,
}

/// Assembles per-function bundles; overloads sharing a name are merged into
/// unions of their mutually distinct shapes.
pub struct FunctionAssembler<'a> {
    snapshot: &'a CatalogSnapshot,
    resolver: Resolver<'a>,
    registry: &'a ShellRegistry,
    primary_schema: &'a str,
}

impl<'a> FunctionAssembler<'a> {
    pub fn new(
        snapshot: &'a CatalogSnapshot,
        registry: &'a ShellRegistry,
        primary_schema: &'a str,
    ) -> Self {
        Self {
            snapshot,
            resolver: Resolver::new(snapshot),
            registry,
            primary_schema,
        }
    }

    /// Assemble bundles for every function, grouped by (schema, name).
    /// Functions are pre-sorted by normalization, so overload groups are
    /// contiguous.
    pub fn assemble_functions(&self, report: &mut EmitReport) -> Vec<FunctionBundles> {
        let mut bundles = Vec::new();
        let mut index = 0;
        let functions = &self.snapshot.functions;
        while index < functions.len() {
            let head = &functions[index];
            let mut end = index + 1;
            while end < functions.len()
                && functions[end].schema == head.schema
                && functions[end].name == head.name
            {
                end += 1;
            }
            bundles.push(self.assemble_group(&functions[index..end], report));
            index = end;
        }
        bundles
    }

    fn assemble_group(&self, overloads: &[Function], report: &mut EmitReport) -> FunctionBundles {
        let head = &overloads[0];
        let mut arg_shapes: Vec<ValidatorExpr> = Vec::new();
        let mut return_shapes: Vec<ValidatorExpr> = Vec::new();

        for function in overloads {
            let args = self.args_object(function, report);
            if !arg_shapes.contains(&args) {
                arg_shapes.push(args);
            }
            let returns = self.returns_expr(function, report);
            if !return_shapes.contains(&returns) {
                return_shapes.push(returns);
            }
        }

        let ident = |suffix: &str| {
            naming::bundle_ident(self.primary_schema, &head.schema, &head.name, suffix)
        };

        FunctionBundles {
            schema: head.schema.clone(),
            name: head.name.clone(),
            args: NamedBundle {
                ident: ident(naming::ARGS_SUFFIX),
                expr: union_of(arg_shapes),
            },
            returns: NamedBundle {
                ident: ident(naming::RETURNS_SUFFIX),
                expr: union_of(return_shapes),
            },
        }
    }

    /// Input-argument object for one overload, in declaration order.
    fn args_object(&self, function: &Function, report: &mut EmitReport) -> ValidatorExpr {
        let input_args: Vec<_> = function
            .args
            .iter()
            .filter(|arg| matches!(arg.mode, ArgMode::In | ArgMode::InOut | ArgMode::Variadic))
            .collect();

        if input_args.iter().any(|arg| arg.name.is_empty()) {
            report.record_warning(
                EmitIssue::warning(
                    "unnamed_function_argument",
                    format!(
                        "function {}.{} has unnamed input arguments; arguments validator degraded",
                        function.schema, function.name
                    ),
                )
                .at(&function.schema, &function.name),
            );
            return ValidatorExpr::Unknown;
        }

        let fields = input_args
            .iter()
            .map(|arg| {
                let mut expr = self.resolve_type_id(function, arg.type_id, report);
                if arg.has_default {
                    expr = expr.optional();
                }
                ObjectField::new(arg.name.clone(), expr)
            })
            .collect();
        ValidatorExpr::ObjectOf(fields)
    }

    /// Return validator for one overload, in priority order: table-mode
    /// output arguments, then a known relation's row validator, then the
    /// declared return type; array-wrapped for set-returning functions.
    fn returns_expr(&self, function: &Function, report: &mut EmitReport) -> ValidatorExpr {
        let mut table_args: Vec<_> = function
            .args
            .iter()
            .filter(|arg| arg.mode == ArgMode::Table)
            .collect();

        let returns = if !table_args.is_empty() {
            table_args.sort_by(|a, b| a.name.cmp(&b.name));
            let fields = table_args
                .iter()
                .map(|arg| {
                    ObjectField::new(
                        arg.name.clone(),
                        self.resolve_type_id(function, arg.type_id, report),
                    )
                })
                .collect();
            ValidatorExpr::ObjectOf(fields)
        } else if let Some(relation_id) = function.return_relation_id {
            match self
                .snapshot
                .relation_by_id(relation_id)
                .and_then(|relation| self.registry.get(relation.schema, relation.name))
            {
                Some(shell) => ValidatorExpr::LazyRef(shell.list_ident.clone()),
                None => {
                    report.record_degraded();
                    report.record_warning(
                        EmitIssue::warning(
                            "missing_return_relation",
                            format!(
                                "function {}.{} returns unknown relation id {}",
                                function.schema, function.name, relation_id
                            ),
                        )
                        .at(&function.schema, &function.name),
                    );
                    ValidatorExpr::Unknown
                }
            }
        } else if let Some(type_id) = function.return_type_id {
            self.resolve_type_id(function, type_id, report)
        } else {
            report.record_degraded();
            ValidatorExpr::Unknown
        };

        if function.is_set_returning {
            returns.array()
        } else {
            returns
        }
    }

    fn resolve_type_id(
        &self,
        function: &Function,
        type_id: i64,
        report: &mut EmitReport,
    ) -> ValidatorExpr {
        let Some(ty) = self.snapshot.type_by_id(type_id) else {
            report.record_degraded();
            report.record_warning(
                EmitIssue::warning(
                    "missing_type",
                    format!(
                        "function {}.{} references unknown type id {}",
                        function.schema, function.name, type_id
                    ),
                )
                .at(&function.schema, &function.name),
            );
            return ValidatorExpr::Unknown;
        };
        let expr = self.resolver.resolve(&function.schema, &ty.name, Mode::List);
        if expr.contains_unknown() {
            report.record_degraded();
        }
        expr
    }
}

fn union_of(mut shapes: Vec<ValidatorExpr>) -> ValidatorExpr {
    match shapes.len() {
        0 => ValidatorExpr::Unknown,
        1 => shapes.remove(0),
        _ => ValidatorExpr::Union(shapes),
    }
}
