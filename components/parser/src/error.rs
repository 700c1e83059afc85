//! Parser error types and helpers

use core_types::{ErrorKind, JsError, SourcePosition};
use thiserror::Error;

use crate::token::{Token, TokenKind};

/// Create a lexical error at a given position
pub fn lexical_error(message: impl Into<String>, position: SourcePosition) -> JsError {
    JsError::new(ErrorKind::Lexical, message, Some(position))
}

/// Create an illegal character error
pub fn illegal_character(ch: char, position: SourcePosition) -> JsError {
    lexical_error(format!("Illegal character '{}'", ch), position).with_lexeme(ch.to_string())
}

/// Create a syntax error at a given position
pub fn syntax_error(message: impl Into<String>, position: Option<SourcePosition>) -> JsError {
    JsError::new(ErrorKind::Syntax, message, position)
}

/// Create an unexpected token error
pub fn unexpected_token(token: &Token) -> JsError {
    if token.kind == TokenKind::Eof {
        return unexpected_eof(Some(token.position));
    }
    syntax_error(format!("Unexpected {}", token.describe()), Some(token.position))
        .with_lexeme(token.value.clone())
}

/// Create an unexpected end of input error
pub fn unexpected_eof(position: Option<SourcePosition>) -> JsError {
    syntax_error("Unexpected end of input", position)
}

/// Create an error raised by a reduction action
pub fn production_error(message: impl Into<String>, position: Option<SourcePosition>) -> JsError {
    JsError::new(ErrorKind::Production, message, position)
}

/// Report a table problem as a parse failure
pub fn table_error(err: TableError) -> JsError {
    production_error(err.to_string(), None)
}

/// Errors raised when loading or building parse tables
#[derive(Debug, Error)]
pub enum TableError {
    /// The tables were generated from a different grammar
    #[error("parse tables were built for grammar {found:016x}, expected {expected:016x}")]
    GrammarMismatch {
        /// Fingerprint of the grammar in use
        expected: u64,
        /// Fingerprint recorded in the tables
        found: u64,
    },

    /// The artifact has an unsupported format version
    #[error("unsupported parse table format version {0}")]
    UnsupportedVersion(u32),

    /// The artifact is internally inconsistent
    #[error("malformed parse tables: {0}")]
    Malformed(String),

    /// The grammar references an unknown symbol
    #[error("grammar error: {0}")]
    Grammar(String),

    /// JSON (de)serialization failed
    #[error("parse table serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the artifact failed
    #[error("parse table I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error() {
        let err = syntax_error("test", None);
        assert!(matches!(err.kind, ErrorKind::Syntax));
    }

    #[test]
    fn test_unexpected_token() {
        let token = Token::new(TokenKind::RParen, ")", SourcePosition::new(2, 4, 10));
        let err = unexpected_token(&token);
        assert_eq!(err.to_string(), "Unexpected ')' at 2:4");
        assert_eq!(err.lexeme.as_deref(), Some(")"));
    }

    #[test]
    fn test_unexpected_eof() {
        let token = Token::new(TokenKind::Eof, "", SourcePosition::new(1, 3, 2));
        assert_eq!(unexpected_token(&token).to_string(), "Unexpected end of input at 1:3");
    }

    #[test]
    fn test_grammar_mismatch_message() {
        let err = TableError::GrammarMismatch {
            expected: 1,
            found: 2,
        };
        assert!(err.to_string().contains("0000000000000002"));
    }
}
