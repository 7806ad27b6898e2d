//! `letfloat_core`: a let-floating pass for curried generated JavaScript.
//!
//! Curried code re-evaluates partial applications such as `add(x)(y)` on
//! every call of the innermost closure.  The pass moves each pure,
//! receiver-free computation to the outermost scope where all of its free
//! variables are still visible, wraps it in a memoize-once thunk, and leaves a
//! zero-argument accessor call at the original site.
//!
//! # Crate layout
//!
//! - [`parser`]: scanner, AST, parser, and scope analysis.
//! - [`float`]: the transform itself.
//! - [`codegen`]: printing a program back to source.
//! - [`config`]: naming tunables.
//! - [`error`]: the crate's error type.

/// Printing a program back to JavaScript source.
pub mod codegen;
/// Naming tunables.
pub mod config;
/// Error types.
pub mod error;
/// The let-floating pass.
pub mod float;
/// JavaScript front end.
pub mod parser;

use tracing::debug;

pub use config::FloatConfig;
pub use error::{LetFloatError, LetFloatResult};
pub use float::{FloatReport, ScopeProvider, float_program};
pub use parser::ast::SourceType;

use parser::scanner::{Scanner, TokenKind};

/// Largest input the command-line driver accepts: 15 MiB.
pub const MAX_INPUT_BYTES: u64 = 15 * 1024 * 1024;

/// Transformed source together with what the pass did.
#[derive(Debug, Clone)]
pub struct FloatOutput {
    /// The rewritten program.
    pub code: String,
    /// Per-run statistics.
    pub report: FloatReport,
}

/// Parse `source` as a script, float it, and print the result.
///
/// # Errors
///
/// Fails on syntax errors and duplicate lexical declarations.
pub fn float_source(source: &str, config: &FloatConfig) -> LetFloatResult<FloatOutput> {
    float_source_as(source, SourceType::Script, config)
}

/// Like [`float_source`], with an explicit source type.
pub fn float_source_as(
    source: &str,
    source_type: SourceType,
    config: &FloatConfig,
) -> LetFloatResult<FloatOutput> {
    let mut program = parser::parse::parse_program(source, source_type)?;
    let scopes = parser::scope::analyze(&program)?;
    let report = float_program(&mut program, &scopes, config)?;
    Ok(FloatOutput {
        code: codegen::to_source(&program),
        report,
    })
}

/// `true` when `source` has an `import` or `export` declaration at the top
/// level.  Dynamic `import(…)` and `import.meta` do not count, nor does
/// source that fails to tokenize.
pub fn looks_like_module(source: &str) -> bool {
    let Ok(tokens) = Scanner::tokenize_all(source) else {
        return false;
    };
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::LeftBrace => depth += 1,
            TokenKind::RightBrace => depth = depth.saturating_sub(1),
            TokenKind::Export if depth == 0 => return true,
            TokenKind::Import if depth == 0 => {
                let next = tokens.get(i + 1).map(|t| t.kind);
                if !matches!(next, Some(TokenKind::LeftParen | TokenKind::Dot)) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Float `source`, choosing the source type from its contents: module when it
/// looks like one and parses as one, script otherwise.
pub fn float_source_detect(source: &str, config: &FloatConfig) -> LetFloatResult<FloatOutput> {
    if looks_like_module(source) {
        match float_source_as(source, SourceType::Module, config) {
            Ok(out) => return Ok(out),
            Err(err) => debug!(%err, "module parse failed, retrying as script"),
        }
    }
    float_source(source, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_source_end_to_end() {
        let src = "function main(x){return function(y){return function(z){return add(x)(y)+z}}}";
        let out = float_source(src, &FloatConfig::default()).unwrap();
        assert_eq!(out.report.hoisted, vec!["add_y__fb".to_owned()]);
        assert!(out.code.contains("return add_y__fb() + z;"));
        // The output parses and a second run leaves it alone.
        let again = float_source(&out.code, &FloatConfig::default()).unwrap();
        assert_eq!(again.code, out.code);
        assert_eq!(again.report.floated, 0);
    }

    #[test]
    fn test_syntax_errors_surface() {
        let err = float_source("function (", &FloatConfig::default()).unwrap_err();
        assert!(matches!(err, LetFloatError::SyntaxError { .. }));
        let err = float_source("let a; let a;", &FloatConfig::default()).unwrap_err();
        assert!(matches!(err, LetFloatError::DuplicateBinding { .. }));
    }

    #[test]
    fn test_looks_like_module() {
        assert!(looks_like_module("import a from 'a'; a();"));
        assert!(looks_like_module("export const x = 1;"));
        assert!(!looks_like_module("import('a').then(f);"));
        assert!(!looks_like_module("function f() { return { export: 1 }; }"));
        assert!(!looks_like_module("var x = 1;"));
    }

    #[test]
    fn test_detect_modules_and_scripts() {
        let cfg = FloatConfig::default();
        let out = float_source_detect("import { h } from 'h'; export default h(1);", &cfg).unwrap();
        assert!(out.code.starts_with("import { h } from \"h\";\n"));
        let out = float_source_detect("var export_ = 1; with (o) {}", &cfg).unwrap();
        assert_eq!(out.code, "var export_ = 1;\nwith (o) {}\n");
    }
}
