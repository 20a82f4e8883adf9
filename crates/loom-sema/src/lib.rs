//! Semantic analysis for the Loom compiler.
//!
//! Two passes over the merged [`Unit`](loom_parser::ast::Unit):
//!
//! 1. [`validate`] enforces naming, uniqueness, and reference rules,
//!    attaches variants and test groups to their owning functions, and
//!    links every type reference to its class or enum declaration.
//! 2. [`resolve`] builds the name-keyed dependency graph, topologically
//!    sorts it into the emission order, and computes each declaration's
//!    transitive dependency set.
//!
//! Both passes are fail-fast: the first error aborts compilation.

pub mod graph;
mod validate;

pub use graph::{resolve, Resolution};
pub use validate::validate;
