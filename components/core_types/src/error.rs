//! Error types shared by the lexer and the parser.
//!
//! A [`JsError`] carries its category, a human-readable message, the
//! offending lexeme (when one exists) and the source position. The
//! rendered form appends the position: `Unexpected 'x' at 3:7`.

use std::fmt;

use thiserror::Error;

use crate::SourcePosition;

/// The category of a [`JsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown character, unterminated string, comment or template
    Lexical,
    /// Malformed or unterminated regular expression literal
    Regex,
    /// Token sequence rejected by the grammar
    Syntax,
    /// A reduction found the matched tokens semantically inconsistent
    Production,
}

impl ErrorKind {
    /// Name of the error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Lexical => "LexicalError",
            ErrorKind::Regex => "RegexError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Production => "ProductionError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned error raised while lexing or parsing.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError, SourcePosition};
///
/// let error = JsError::new(ErrorKind::Syntax, "Unexpected ')'", Some(SourcePosition::new(2, 4, 9)))
///     .with_lexeme(")");
///
/// assert_eq!(error.lexeme.as_deref(), Some(")"));
/// assert_eq!(error.to_string(), "Unexpected ')' at 2:4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", .source_position.map(|p| format!(" at {}", p)).unwrap_or_default())]
pub struct JsError {
    /// The category of error
    pub kind: ErrorKind,
    /// Human-readable error message, without the position suffix
    pub message: String,
    /// Text of the offending token, if any
    pub lexeme: Option<String>,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
}

impl JsError {
    /// Create an error without a lexeme
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        source_position: Option<SourcePosition>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            lexeme: None,
            source_position,
        }
    }

    /// Attach the offending lexeme
    pub fn with_lexeme(mut self, lexeme: impl Into<String>) -> Self {
        self.lexeme = Some(lexeme.into());
        self
    }

    /// True for errors raised by the lexer, regex errors included
    pub fn is_lexical(&self) -> bool {
        matches!(self.kind, ErrorKind::Lexical | ErrorKind::Regex)
    }
}

/// Result type for lexing and parsing
pub type JsResult<T> = Result<T, JsError>;
