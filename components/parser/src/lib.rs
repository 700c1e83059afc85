//! ECMAScript 5 Parser Component
//!
//! Provides the lexer, the LALR(1) grammar and tables, the parser driver
//! (with automatic semicolon insertion) and the AST for ECMAScript 5 plus
//! template literals.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes source code, including regex/divide re-scanning
//! - [`Token`] - Tokens carrying kind, raw lexeme and position
//! - [`Grammar`] - Productions with their AST-building actions
//! - [`ParseTables`] - LALR(1) tables, serializable to JSON
//! - [`Parser`] - Table-driven parser producing a [`Node`] tree
//! - [`ScopeAnalyzer`] - Resolves identifiers to their binding scopes
//!
//! # Example
//!
//! ```
//! use parser::{parse, NodeType};
//!
//! let program = parse("var x = 42\nx++").unwrap();
//! let statements = program.children();
//! assert_eq!(statements.len(), 2);
//! assert_eq!(statements[0].node_type(), NodeType::VarStatement);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod es5;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod tables;
pub mod token;

pub use ast::{
    AssignmentOperator, BinaryOperator, Child, Field, Node, NodeKind, NodeType, UnaryOperator,
    UpdateOperator,
};
pub use error::TableError;
pub use es5::{default_tables, es5_grammar};
pub use grammar::{Grammar, GrammarBuilder, Production, Reduction, StackValue, Symbol};
pub use lexer::{Lexer, LexerOptions};
pub use parser::{parse, parse_bytes, Parser, ParserOptions};
pub use scope::{node_key, Occurrence, Scope, ScopeAnalyzer, ScopeInfo, ScopeKind};
pub use tables::{Conflict, ConflictKind, ParseAction, ParseTables, TABLE_FORMAT_VERSION};
pub use token::{Token, TokenKind};
