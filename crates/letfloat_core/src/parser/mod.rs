//! JavaScript front end.
//!
//! - [`scanner`]: lexer that converts raw source text into a stream of
//!   [`scanner::Token`]s.
//! - [`ast`]: owned syntax tree node definitions.
//! - [`parse`]: recursive-descent parser producing an [`ast::Program`].
//! - [`scope`]: scope analysis and variable resolution.

/// Abstract syntax tree node types.
pub mod ast;
/// Recursive-descent parser.
pub mod parse;
/// JavaScript lexer.
pub mod scanner;
/// Scope analysis and variable resolution.
pub mod scope;
