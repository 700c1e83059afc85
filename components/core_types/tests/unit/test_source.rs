//! Unit tests for SourcePosition

use core_types::SourcePosition;

#[test]
fn test_display_is_line_colon_column() {
    assert_eq!(SourcePosition::new(3, 14, 40).to_string(), "3:14");
}

#[test]
fn test_position_is_copy() {
    let a = SourcePosition::new(1, 2, 1);
    let b = a;
    assert_eq!(a, b);
}

#[test]
fn test_position_serde() {
    let pos = SourcePosition::new(7, 1, 99);
    let json = serde_json::to_string(&pos).unwrap();
    let back: SourcePosition = serde_json::from_str(&json).unwrap();
    assert_eq!(pos, back);
}
