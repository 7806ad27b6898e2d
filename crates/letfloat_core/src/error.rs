//! Error types for the letfloat pass.
//!
//! Only structural failures of the input are errors.  Per-candidate decisions
//! (impure expression, unresolvable reference, name collision) are never
//! surfaced here; the float pass simply leaves those candidates untouched.

use thiserror::Error;

/// All errors that can be produced while reading, parsing, analysing, or
/// transforming a compilation unit.
#[derive(Debug, Error)]
pub enum LetFloatError {
    /// The source text could not be tokenized or parsed.
    #[error("SyntaxError: {message} ({line}:{column})")]
    SyntaxError {
        /// Human-readable description of the problem.
        message: String,
        /// 1-based line of the offending token.
        line: u32,
        /// 1-based column of the offending token.
        column: u32,
    },

    /// A lexical name was declared twice in the same scope.
    #[error("SyntaxError: identifier '{name}' has already been declared ({line}:{column})")]
    DuplicateBinding {
        /// The redeclared name.
        name: String,
        /// 1-based line of the second declaration.
        line: u32,
        /// 1-based column of the second declaration.
        column: u32,
    },

    /// The input exceeds the configured size limit.
    #[error("input is {size} bytes, which exceeds the {limit}-byte limit")]
    InputTooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LetFloatError {
    /// Build a [`LetFloatError::SyntaxError`] at the given position.
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        LetFloatError::SyntaxError {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Convenient `Result` alias for fallible letfloat operations.
pub type LetFloatResult<T> = Result<T, LetFloatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display_includes_position() {
        let err = LetFloatError::syntax("unexpected token", 3, 14);
        assert_eq!(err.to_string(), "SyntaxError: unexpected token (3:14)");
    }

    #[test]
    fn test_input_too_large_display() {
        let err = LetFloatError::InputTooLarge {
            size: 20,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "input is 20 bytes, which exceeds the 10-byte limit"
        );
    }

    #[test]
    fn test_io_error_converts() {
        fn open() -> LetFloatResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(LetFloatError::Io(_))));
    }
}
