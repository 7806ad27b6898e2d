//! The let-floating pass.
//!
//! - [`provider`]: the scope queries the pass is written against.
//! - [`purity`]: which expressions may be moved at all.
//! - [`free_vars`]: the names an expression reads from outside itself.
//! - [`resolve`]: how far out an expression may move.
//! - [`names`]: collision-free names for hoisted bindings.
//! - [`runtime`]: the memoize-once helper and other generated code.
//! - [`insert`]: where hoisted declarations land in their container.
//! - [`driver`]: the traversal tying it together.

/// Single-traversal transform driver.
pub mod driver;
/// Ordered free-variable collection.
pub mod free_vars;
/// Hoist-site insertion.
pub mod insert;
/// Name allocation.
pub mod names;
/// Scope queries.
pub mod provider;
/// Eligibility analysis.
pub mod purity;
/// Target-scope resolution.
pub mod resolve;
/// Generated code and recognizers for it.
pub mod runtime;

pub use driver::{FloatReport, float_program};
pub use provider::ScopeProvider;
