//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, SourcePosition};

#[test]
fn test_display_appends_position() {
    let err = JsError::new(
        ErrorKind::Lexical,
        "Illegal character '`'",
        Some(SourcePosition::new(1, 1, 0)),
    );
    assert_eq!(err.to_string(), "Illegal character '`' at 1:1");
}

#[test]
fn test_display_without_position() {
    let err = JsError::new(ErrorKind::Syntax, "Unexpected end of input", None);
    assert_eq!(err.to_string(), "Unexpected end of input");
}

#[test]
fn test_with_lexeme() {
    let err = JsError::new(ErrorKind::Syntax, "Unexpected 'x'", None).with_lexeme("x");
    assert_eq!(err.lexeme, Some("x".to_string()));
}

#[test]
fn test_kind_names() {
    assert_eq!(ErrorKind::Regex.to_string(), "RegexError");
    assert_eq!(ErrorKind::Production.as_str(), "ProductionError");
}

#[test]
fn test_error_is_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    takes_error(&JsError::new(ErrorKind::Syntax, "x", None));
}
