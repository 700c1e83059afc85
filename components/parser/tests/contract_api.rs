//! Contract tests for the public parser API

use std::sync::Arc;

use core_types::ErrorKind;
use parser::{
    default_tables, parse, Lexer, LexerOptions, Node, NodeKind, NodeType, ParseTables, Parser,
    ParserOptions, TableError, TokenKind,
};
use rstest::rstest;

fn first_statement(source: &str) -> Node {
    match parse(source).unwrap().kind {
        NodeKind::Program { mut children } => children.remove(0),
        other => panic!("expected program, got {:?}", other),
    }
}

fn expression(source: &str) -> Node {
    match first_statement(source).kind {
        NodeKind::ExprStatement { expr } => *expr,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[rstest]
#[case("var a = 1, b;", NodeType::VarStatement)]
#[case(";", NodeType::EmptyStatement)]
#[case("if (a) b; else c;", NodeType::If)]
#[case("do a(); while (b);", NodeType::DoWhile)]
#[case("while (a) {}", NodeType::While)]
#[case("for (;;) {}", NodeType::For)]
#[case("for (var k in o) {}", NodeType::ForIn)]
#[case("with (o) {}", NodeType::With)]
#[case("switch (a) { case 1: b; default: c; }", NodeType::Switch)]
#[case("outer: for (;;) { break outer; }", NodeType::Label)]
#[case("throw new Error('x');", NodeType::Throw)]
#[case("try {} catch (e) {} finally {}", NodeType::Try)]
#[case("debugger;", NodeType::Debugger)]
#[case("function f(a, b) { return a + b; }", NodeType::FuncDecl)]
#[case("{ a; b; }", NodeType::Block)]
fn test_statement_kinds(#[case] source: &str, #[case] expected: NodeType) {
    assert_eq!(first_statement(source).node_type(), expected);
}

#[rstest]
#[case("a = b", NodeType::Assign)]
#[case("a ? b : c", NodeType::Conditional)]
#[case("a || b && c", NodeType::BinOp)]
#[case("a, b", NodeType::Comma)]
#[case("typeof a", NodeType::UnaryExpr)]
#[case("a++", NodeType::PostfixExpr)]
#[case("new A", NodeType::NewExpr)]
#[case("a.b.c()", NodeType::FunctionCall)]
#[case("a[0]", NodeType::BracketAccessor)]
#[case("(function () {})", NodeType::GroupingOp)]
#[case("`a${b}c`", NodeType::TemplateLiteral)]
#[case("[1, , 2]", NodeType::Array)]
#[case("this", NodeType::This)]
fn test_expression_kinds(#[case] source: &str, #[case] expected: NodeType) {
    assert_eq!(expression(source).node_type(), expected);
}

#[test]
fn test_precedence() {
    let expr = expression("1 + 2 * 3");
    let NodeKind::BinOp { op, right, .. } = expr.kind else {
        panic!("expected binop");
    };
    assert_eq!(op.as_str(), "+");
    assert_eq!(right.node_type(), NodeType::BinOp);
}

#[test]
fn test_reserved_words_as_property_names() {
    let expr = expression("o.if + o.class");
    assert_eq!(expr.node_type(), NodeType::BinOp);
    let object = expression("({ if: 1, 'str': 2, 3: 4 })");
    assert!(object.repr().contains("<PropIdentifier"));
}

#[test]
fn test_elision_counts() {
    let NodeKind::Array { items } = expression("[, , a, , ]").kind else {
        panic!("expected array");
    };
    assert!(matches!(items[0].kind, NodeKind::Elision { value: 2 }));
    assert_eq!(items[1].node_type(), NodeType::Identifier);
    assert!(matches!(items[2].kind, NodeKind::Elision { value: 1 }));
}

#[test]
fn test_template_parts() {
    let NodeKind::TemplateLiteral { children } = expression("`a${b}c${d}e`").kind else {
        panic!("expected template");
    };
    let types: Vec<NodeType> = children.iter().map(Node::node_type).collect();
    assert_eq!(
        types,
        vec![
            NodeType::TemplateHead,
            NodeType::Identifier,
            NodeType::TemplateMiddle,
            NodeType::Identifier,
            NodeType::TemplateTail,
        ]
    );
    assert_eq!(children[0].value(), Some("`a${"));
}

#[rstest]
#[case("a = 1 b = 2", "Unexpected 'b' at 1:7")]
#[case("var", "Unexpected end of input at 1:4")]
#[case("if (a", "Unexpected end of input at 1:6")]
#[case("a = )", "Unexpected ')' at 1:5")]
fn test_syntax_errors(#[case] source: &str, #[case] message: &str) {
    let err = parse(source).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Syntax));
    assert_eq!(err.to_string(), message);
}

#[test]
fn test_lexical_error_surfaces() {
    let err = parse("var s = 'abc").unwrap_err();
    assert!(err.is_lexical());
}

#[test]
fn test_structural_equality_ignores_positions() {
    let a = parse("a   =\n 1;").unwrap();
    let b = parse("a = 1;").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, parse("a = 2;").unwrap());
}

#[test]
fn test_lexer_with_comments() {
    let mut lexer = Lexer::with_options("a // c\nb", LexerOptions { with_comments: true });
    let kinds: Vec<TokenKind> = lexer.by_ref().map(|t| t.unwrap().kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Id, TokenKind::LineComment, TokenKind::Id]
    );
}

#[test]
fn test_comments_kept_only_when_requested() {
    let source = "/* lead */ x;";
    let plain = Parser::new(source).parse().unwrap();
    assert!(plain.children()[0].comments.is_none());
    let kept = Parser::with_options(source, ParserOptions { with_comments: true })
        .parse()
        .unwrap();
    assert!(kept.children()[0].comments.is_some());
}

#[test]
fn test_tables_artifact_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("es5-tables.json");
    default_tables().unwrap().write_to(&path).unwrap();

    let loaded = Arc::new(ParseTables::read_from(&path).unwrap());
    let mut parser = Parser::with_tables("var a = [1, 2];", loaded).unwrap();
    assert_eq!(parser.parse().unwrap(), parse("var a = [1, 2];").unwrap());
}

#[test]
fn test_tables_artifact_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"version\": 1").unwrap();
    assert!(matches!(ParseTables::read_from(&path), Err(TableError::Json(_))));
    assert!(matches!(
        ParseTables::read_from(dir.path().join("missing.json")),
        Err(TableError::Io(_))
    ));
}
