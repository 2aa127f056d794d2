//! Validator emission engine for Zodforge.
//!
//! This crate consumes a normalized catalog snapshot and produces one source
//! document defining runtime validators per relation: a read shape (`list`),
//! an insert shape, a lenient insert shape, and an update shape, plus
//! relationship accessors and per-function argument/return validators.
//!
//! The engine performs no I/O; the only suspension point is a single call
//! into the external [`Formatter`] after the document is complete.

pub mod assemble;
pub mod coerce;
pub mod emit;
pub mod errors;
pub mod expr;
pub mod functions;
pub mod naming;
pub mod output;
pub mod relationships;
pub mod report;
pub mod resolve;

pub use coerce::{CoercionIssue, CoercionRule};
pub use emit::{EmitEngine, EmitOptions, EmitResult, FormatStyle, Formatter, PassthroughFormatter};
pub use errors::EmitError;
pub use expr::ValidatorExpr;
pub use report::{EmitIssue, EmitReport};
pub use resolve::{Mode, Resolver, TypeCategory};
