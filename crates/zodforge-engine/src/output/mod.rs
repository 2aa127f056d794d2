//! Target adapters translating validator expressions into source text.

pub mod zod;

pub use zod::{DocumentItem, render_document};
