//! Property tests for the lexer and parser

use parser::{parse, Lexer, NodeType};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[a-z_$][a-z0-9_$]{0,6}".prop_filter("not a reserved word", |s| {
        parser::TokenKind::keyword(s).is_none()
    })
}

proptest! {
    #[test]
    fn test_token_offsets_increase(words in prop::collection::vec(identifier(), 1..20)) {
        let source = words.join(" +\n ");
        let tokens = Lexer::tokenize(&source).unwrap();
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].offset() < pair[1].offset());
        }
    }

    #[test]
    fn test_lexer_never_panics(source in "\\PC{0,40}") {
        for token in Lexer::new(&source) {
            if token.is_err() {
                break;
            }
        }
    }

    #[test]
    fn test_newline_separated_statements(words in prop::collection::vec(identifier(), 1..10)) {
        let source = words.join("\n");
        let program = parse(&source).unwrap();
        let statements = program.children();
        prop_assert_eq!(statements.len(), words.len());
        for statement in statements {
            prop_assert_eq!(statement.node_type(), NodeType::ExprStatement);
        }
    }
}
