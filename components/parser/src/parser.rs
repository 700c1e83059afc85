//! Table-driven LALR(1) parser for ECMAScript 5
//!
//! The driver feeds tokens from the [`Lexer`] through the action/goto
//! tables. Three situations are resolved here instead of in the grammar:
//!
//! - automatic semicolon insertion: when a token is rejected and it is
//!   preceded by a line terminator, is `}`, is the end of input, or closes
//!   a `do ... while (...)`, a virtual `AUTOSEMI` terminal is offered first
//! - restricted productions: a line terminator right after `return`,
//!   `break` or `continue` ends the statement; right after `throw` it is a
//!   syntax error
//! - `/` versus regular expression: a slash token the tables reject is
//!   re-lexed with the other interpretation

use std::collections::HashMap;
use std::sync::Arc;

use core_types::{ErrorKind, JsError, JsResult, SourcePosition};
use serde::{Deserialize, Serialize};

use crate::ast::{Node, NodeKind};
use crate::error::{table_error, unexpected_token, TableError};
use crate::es5::{default_tables, es5_grammar};
use crate::grammar::{Grammar, Reduction, StackValue, Symbol};
use crate::lexer::{Lexer, LexerOptions};
use crate::tables::{ParseAction, ParseTables};
use crate::token::{Token, TokenKind};

/// Options controlling the parser
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Keep comments and attach them to the statements around them
    pub with_comments: bool,
}

/// ECMAScript parser
pub struct Parser {
    lexer: Lexer,
    options: ParserOptions,
    tables: Option<Arc<ParseTables>>,
    /// Comments waiting for a statement starting at the keyed offset
    comments: HashMap<usize, Node>,
    /// Comments waiting for a statement reduced with the keyed offset as lookahead
    trailing: HashMap<usize, Node>,
}

/// Parse stacks, kept in lockstep
#[derive(Default)]
struct Stacks {
    states: Vec<usize>,
    symbols: Vec<Symbol>,
    values: Vec<StackValue>,
    /// Position of the first real token under each entry
    starts: Vec<Option<SourcePosition>>,
}

impl Parser {
    /// Create a new parser for the given source code
    pub fn new(source: &str) -> Self {
        Self::with_options(source, ParserOptions::default())
    }

    /// Create a parser with explicit options
    pub fn with_options(source: &str, options: ParserOptions) -> Self {
        let lexer = Lexer::with_options(
            source,
            LexerOptions {
                with_comments: options.with_comments,
            },
        );
        Self {
            lexer,
            options,
            tables: None,
            comments: HashMap::new(),
            trailing: HashMap::new(),
        }
    }

    /// Create a parser using pre-built tables, which must come from the ES5 grammar
    pub fn with_tables(source: &str, tables: Arc<ParseTables>) -> Result<Self, TableError> {
        let grammar = es5_grammar()?;
        if tables.fingerprint != grammar.fingerprint() {
            return Err(TableError::GrammarMismatch {
                expected: grammar.fingerprint(),
                found: tables.fingerprint,
            });
        }
        if tables.nonterminal_count != grammar.nonterminal_count()
            || tables.productions.len() != grammar.productions().len()
        {
            return Err(TableError::Malformed(
                "table shape does not match the grammar".into(),
            ));
        }
        let mut parser = Self::new(source);
        parser.tables = Some(tables);
        Ok(parser)
    }

    /// Parse the source into a `Program` node
    pub fn parse(&mut self) -> JsResult<Node> {
        let grammar = es5_grammar().map_err(table_error)?;
        let tables = match &self.tables {
            Some(tables) => Arc::clone(tables),
            None => default_tables().map_err(table_error)?,
        };
        let statement = grammar.nonterminal("statement");
        let do_while_tail = do_while_tail(grammar);

        let mut stacks = Stacks {
            states: vec![0],
            ..Stacks::default()
        };
        let mut previous: Option<TokenKind> = None;
        let mut asi_offset: Option<usize> = None;
        let mut token = self.next_significant()?;

        loop {
            // no line terminator between `throw` and its expression
            if token.newline_before && previous == Some(TokenKind::Throw) {
                return Err(unexpected_token(&token));
            }
            let classified = classify(&token);
            let restricted = token.newline_before
                && matches!(
                    previous,
                    Some(TokenKind::Return) | Some(TokenKind::Break) | Some(TokenKind::Continue)
                );

            let terminal = if restricted && accepts(&tables, &stacks.states, TokenKind::AutoSemi) {
                TokenKind::AutoSemi
            } else if accepts(&tables, &stacks.states, classified) {
                classified
            } else if let Some(rescanned) = self.try_rescan(&tables, &stacks.states, &token)? {
                token = rescanned;
                continue;
            } else if asi_offset != Some(token.offset())
                && (token.newline_before
                    || matches!(token.kind, TokenKind::RBrace | TokenKind::Eof)
                    || stacks.symbols.ends_with(&do_while_tail))
                && accepts(&tables, &stacks.states, TokenKind::AutoSemi)
            {
                tracing::debug!(
                    target: "parser::asi",
                    line = token.line(),
                    column = token.column(),
                    "inserting semicolon"
                );
                asi_offset = Some(token.offset());
                TokenKind::AutoSemi
            } else {
                return Err(unexpected_token(&token));
            };

            loop {
                let state = stacks.states.last().copied().unwrap_or(0);
                match tables.action(state, terminal) {
                    ParseAction::Shift(next) => {
                        stacks.states.push(next);
                        stacks.symbols.push(Symbol::Terminal(terminal));
                        if terminal == TokenKind::AutoSemi {
                            stacks.values.push(StackValue::Empty);
                            stacks.starts.push(None);
                        } else {
                            self.unclaimed_trailing(token.offset());
                            stacks.starts.push(Some(token.position));
                            stacks.values.push(StackValue::Token(token.clone()));
                        }
                        break;
                    }
                    ParseAction::Reduce(production) => {
                        let lookahead = token.offset();
                        self.reduce(grammar, &tables, &mut stacks, production, statement, lookahead)?;
                    }
                    ParseAction::Accept => {
                        return match stacks.values.pop() {
                            Some(StackValue::Node(program)) => Ok(program),
                            _ => Err(JsError::new(
                                ErrorKind::Production,
                                "parse finished without a program",
                                None,
                            )),
                        };
                    }
                    ParseAction::Error => return Err(unexpected_token(&token)),
                }
            }

            previous = Some(terminal);
            if terminal != TokenKind::AutoSemi {
                token = self.next_significant()?;
            }
        }
    }

    fn reduce(
        &mut self,
        grammar: &Grammar,
        tables: &ParseTables,
        stacks: &mut Stacks,
        index: usize,
        statement: Option<usize>,
        lookahead: usize,
    ) -> JsResult<()> {
        let malformed = || JsError::new(ErrorKind::Production, "corrupt parse stack", None);
        let production = grammar.production(index).ok_or_else(malformed)?;
        let len = production.rhs.len();
        let at = stacks.values.len().checked_sub(len).ok_or_else(malformed)?;

        let values = stacks.values.split_off(at);
        let starts = stacks.starts.split_off(at);
        stacks.symbols.truncate(at);
        stacks.states.truncate(stacks.states.len() - len);

        let position = starts.iter().flatten().next().copied();
        let mut reduction = Reduction::new(values, position);
        let mut value = (production.action)(&mut reduction)?;

        if Some(production.lhs) == statement {
            if let StackValue::Node(node) = &mut value {
                if let Some(comments) = position.and_then(|p| self.comments.remove(&p.offset)) {
                    node.comments = Some(Box::new(comments));
                }
                if let Some(comments) = self.trailing.remove(&lookahead) {
                    node.trailing_comments = Some(Box::new(comments));
                }
            }
        }

        let state = stacks.states.last().copied().ok_or_else(malformed)?;
        let next = tables.goto(state, production.lhs).ok_or_else(malformed)?;
        stacks.states.push(next);
        stacks.symbols.push(Symbol::NonTerminal(production.lhs));
        stacks.values.push(value);
        stacks.starts.push(position);
        Ok(())
    }

    /// Re-lex a slash token the tables reject under the other interpretation
    fn try_rescan(
        &mut self,
        tables: &ParseTables,
        states: &[usize],
        token: &Token,
    ) -> JsResult<Option<Token>> {
        let as_regex = match token.kind {
            TokenKind::Div | TokenKind::DivEqual => {
                if !accepts(tables, states, TokenKind::Regex) {
                    return Ok(None);
                }
                true
            }
            TokenKind::Regex => {
                if !accepts(tables, states, TokenKind::Div)
                    && !accepts(tables, states, TokenKind::DivEqual)
                {
                    return Ok(None);
                }
                false
            }
            _ => return Ok(None),
        };
        self.lexer.rescan(token, as_regex).map(Some)
    }

    /// Next non-comment token; comments are queued for the statements around them.
    ///
    /// Comments on the line of the previous token, and every comment before
    /// `}` or the end of input, trail the statement that ends there. The rest
    /// lead the statement starting at the returned token.
    fn next_significant(&mut self) -> JsResult<Token> {
        let mut trailing = Vec::new();
        let mut leading = Vec::new();
        loop {
            let token = self.lexer.next_token()?;
            if !token.kind.is_comment() {
                if matches!(token.kind, TokenKind::RBrace | TokenKind::Eof) {
                    trailing.append(&mut leading);
                }
                self.queue(token.offset(), trailing, true);
                self.queue(token.offset(), leading, false);
                return Ok(token);
            }
            let same_line = !token.newline_before && leading.is_empty();
            let position = Some(token.position);
            let value = token.value;
            let kind = if token.kind == TokenKind::LineComment {
                NodeKind::LineComment { value }
            } else {
                NodeKind::BlockComment { value }
            };
            let comment = Node::at(kind, position);
            if same_line {
                trailing.push(comment);
            } else {
                leading.push(comment);
            }
        }
    }

    fn queue(&mut self, offset: usize, comments: Vec<Node>, trailing: bool) {
        if !self.options.with_comments || comments.is_empty() {
            return;
        }
        let position = comments.first().and_then(|c| c.position);
        let node = Node::at(NodeKind::Comments { comments }, position);
        if trailing {
            self.trailing.insert(offset, node);
        } else {
            self.comments.insert(offset, node);
        }
    }

    /// Trailing comments no statement ended before the token at `offset`
    /// (`if (a) // c`) lead whatever starts there instead
    fn unclaimed_trailing(&mut self, offset: usize) {
        let Some(mut unclaimed) = self.trailing.remove(&offset) else {
            return;
        };
        if let Some(leading) = self.comments.remove(&offset) {
            if let (NodeKind::Comments { comments: first }, NodeKind::Comments { comments: rest }) =
                (&mut unclaimed.kind, leading.kind)
            {
                first.extend(rest);
            }
        }
        self.comments.insert(offset, unclaimed);
    }
}

/// `++` and `--` after a line terminator can only be prefix operators
fn classify(token: &Token) -> TokenKind {
    match token.kind {
        TokenKind::PlusPlus if token.newline_before => TokenKind::PlusPlusNl,
        TokenKind::MinusMinus if token.newline_before => TokenKind::MinusMinusNl,
        kind => kind,
    }
}

/// Symbols on the stack right before the `;` of a `do ... while (...)`
fn do_while_tail(grammar: &Grammar) -> Vec<Symbol> {
    let (Some(statement), Some(expr)) = (grammar.nonterminal("statement"), grammar.nonterminal("expr"))
    else {
        return Vec::new();
    };
    vec![
        Symbol::Terminal(TokenKind::Do),
        Symbol::NonTerminal(statement),
        Symbol::Terminal(TokenKind::While),
        Symbol::Terminal(TokenKind::LParen),
        Symbol::NonTerminal(expr),
        Symbol::Terminal(TokenKind::RParen),
    ]
}

/// Whether `terminal` can be shifted after the reductions it triggers
fn accepts(tables: &ParseTables, states: &[usize], terminal: TokenKind) -> bool {
    let mut base = states.len();
    let mut overlay: Vec<usize> = Vec::new();
    loop {
        let top = match overlay.last() {
            Some(&state) => state,
            None => match base.checked_sub(1) {
                Some(i) => states[i],
                None => return false,
            },
        };
        match tables.action(top, terminal) {
            ParseAction::Shift(_) | ParseAction::Accept => return true,
            ParseAction::Error => return false,
            ParseAction::Reduce(production) => {
                let Some(info) = tables.productions.get(production) else {
                    return false;
                };
                let from_overlay = info.len.min(overlay.len());
                overlay.truncate(overlay.len() - from_overlay);
                let remaining = info.len - from_overlay;
                base = match base.checked_sub(remaining) {
                    Some(b) if b > 0 => b,
                    _ => return false,
                };
                let top = overlay.last().copied().unwrap_or(states[base - 1]);
                match tables.goto(top, info.lhs) {
                    Some(next) => overlay.push(next),
                    None => return false,
                }
            }
        }
    }
}

/// Parse ECMAScript source into a `Program` node
pub fn parse(source: &str) -> JsResult<Node> {
    Parser::new(source).parse()
}

/// Parse UTF-8 encoded source
pub fn parse_bytes(source: &[u8]) -> JsResult<Node> {
    match std::str::from_utf8(source) {
        Ok(text) => parse(text),
        Err(err) => {
            let valid = String::from_utf8_lossy(&source[..err.valid_up_to()]);
            let line = valid.matches('\n').count() as u32 + 1;
            let column = valid
                .rsplit('\n')
                .next()
                .map_or(0, |last| last.chars().count()) as u32
                + 1;
            let offset = valid.chars().count();
            Err(JsError::new(
                ErrorKind::Lexical,
                "Invalid UTF-8 in source",
                Some(SourcePosition::new(line, column, offset)),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeType;

    fn statements(source: &str) -> Vec<Node> {
        match parse(source).unwrap().kind {
            NodeKind::Program { children } => children,
            other => panic!("expected program, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        assert!(statements("").is_empty());
        assert!(statements("  // nothing\n").is_empty());
    }

    #[test]
    fn test_asi_on_newline() {
        let body = statements("a = 1\nb = 2");
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_asi_before_brace_and_eof() {
        let body = statements("function f() { return 1 }");
        assert_eq!(body.len(), 1);
        assert_eq!(statements("x").len(), 1);
    }

    #[test]
    fn test_no_asi_on_same_line() {
        let err = parse("a = 1 b = 2").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Syntax));
        assert_eq!(err.to_string(), "Unexpected 'b' at 1:7");
    }

    #[test]
    fn test_restricted_return() {
        let body = statements("function f() {\n  return\n  a\n}");
        let NodeKind::FuncDecl { elements, .. } = &body[0].kind else {
            panic!("expected function");
        };
        assert_eq!(elements.len(), 2);
        assert!(matches!(elements[0].kind, NodeKind::Return { expr: None }));
    }

    #[test]
    fn test_do_while_semicolon() {
        let body = statements("do x++; while (x < 3) y()");
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].node_type(), NodeType::DoWhile);
    }

    #[test]
    fn test_no_asi_in_for_header() {
        assert!(parse("for (a; b\n) {}").is_err());
    }

    #[test]
    fn test_prefix_increment_after_newline() {
        let body = statements("a\n++b");
        assert_eq!(body.len(), 2);
        let NodeKind::ExprStatement { expr } = &body[1].kind else {
            panic!("expected expression statement");
        };
        assert_eq!(expr.node_type(), NodeType::UnaryExpr);
    }

    #[test]
    fn test_division_and_regex() {
        let body = statements("a = b / c / d; e = /re/g.test(f)");
        assert_eq!(body.len(), 2);
        let text = body[1].repr();
        assert!(text.contains("value=\"/re/g\""), "{}", text);
    }

    #[test]
    fn test_regex_after_paren_rescanned() {
        let body = statements("if (x) /a/.test(y)");
        let NodeKind::If { consequent, .. } = &body[0].kind else {
            panic!("expected if");
        };
        assert!(consequent.repr().contains("<Regex"));
    }

    #[test]
    fn test_object_literal_not_a_statement() {
        let body = statements("{}");
        assert_eq!(body[0].node_type(), NodeType::Block);
        let body = statements("({})");
        assert_eq!(body[0].node_type(), NodeType::ExprStatement);
    }

    #[test]
    fn test_for_in_forms() {
        let body = statements("for (var k in o) {} for (k in o) {} for (var i = 0, j; i < 3; i++) {}");
        assert_eq!(body[0].node_type(), NodeType::ForIn);
        assert_eq!(body[1].node_type(), NodeType::ForIn);
        assert_eq!(body[2].node_type(), NodeType::For);
    }

    #[test]
    fn test_accessor_validation() {
        assert!(parse("x = { get a() { return 1 }, set a(v) {} }").is_ok());
        let err = parse("x = { get a(v) {} }").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Production));
        let err = parse("x = { set a() {} }").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Production));
    }

    #[test]
    fn test_comments_attach_to_statements() {
        let mut parser = Parser::with_options(
            "// one\n/* two */\nfoo();\nbar(); // trailing\n",
            ParserOptions {
                with_comments: true,
            },
        );
        let program = parser.parse().unwrap();
        let NodeKind::Program { children } = &program.kind else {
            panic!("expected program");
        };
        let comments = children[0].comments.as_ref().unwrap();
        let NodeKind::Comments { comments } = &comments.kind else {
            panic!("expected comments");
        };
        assert_eq!(comments.len(), 2);
        assert!(children[0].trailing_comments.is_none());
        assert!(children[1].comments.is_none());
        let trailing = children[1].trailing_comments.as_ref().unwrap();
        let NodeKind::Comments { comments } = &trailing.kind else {
            panic!("expected comments");
        };
        assert_eq!(
            comments[0].kind,
            NodeKind::LineComment {
                value: "// trailing".into()
            }
        );
    }

    #[test]
    fn test_comments_before_closing_brace_trail() {
        let mut parser = Parser::with_options(
            "function f() {\n  a(); // t\n  // u\n}\nb(); /* c */\n// lead\nc();",
            ParserOptions {
                with_comments: true,
            },
        );
        let program = parser.parse().unwrap();
        let children = program.children();
        let NodeKind::FuncDecl { elements, .. } = &children[0].kind else {
            panic!("expected function");
        };
        let trailing = elements[0].trailing_comments.as_ref().unwrap();
        assert_eq!(trailing.children().len(), 2);
        assert!(children[0].trailing_comments.is_none());
        assert_eq!(children[1].trailing_comments.as_ref().unwrap().children().len(), 1);
        assert_eq!(children[2].comments.as_ref().unwrap().children().len(), 1);
    }

    #[test]
    fn test_unclaimed_trailing_comment_leads_next_statement() {
        let mut parser = Parser::with_options(
            "if (a) // why\n  b();",
            ParserOptions {
                with_comments: true,
            },
        );
        let program = parser.parse().unwrap();
        let NodeKind::If { consequent, .. } = &program.children()[0].kind else {
            panic!("expected if");
        };
        assert!(consequent.comments.is_some());
        assert!(program.children()[0].trailing_comments.is_none());
    }

    #[test]
    fn test_throw_newline_is_error() {
        let err = parse("function f() { throw\nnew Error('x'); }").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Syntax));
        assert!(parse("function f() { throw new Error('x'); }").is_ok());
        assert!(parse("throw\n1").is_err());
    }

    #[test]
    fn test_positions() {
        let body = statements("\n  var x = 1;");
        let position = body[0].position.unwrap();
        assert_eq!((position.line, position.column), (2, 3));
    }

    #[test]
    fn test_with_tables_rejects_foreign_grammar() {
        let mut g = Grammar::builder();
        g.rule("item", "ID", crate::grammar::pass);
        let tables = Arc::new(ParseTables::build(&g.build("item").unwrap()));
        assert!(matches!(
            Parser::with_tables("x", tables),
            Err(TableError::GrammarMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_bytes_invalid_utf8() {
        let err = parse_bytes(b"var a;\nx\xff").unwrap_err();
        assert!(err.is_lexical());
        assert_eq!(err.source_position.unwrap().line, 2);
        assert!(parse_bytes(b"var a;").is_ok());
    }
}
