//! Grammar representation for the table-driven parser.
//!
//! Productions are written as `lhs: "RHS symbols"` strings. Upper-case
//! words are terminals ([`TokenKind`] names), lower-case words are
//! non-terminals. Each production carries the reduction action that builds
//! its semantic value from the values of its right-hand side.

use std::collections::HashMap;
use std::fmt;

use core_types::{JsResult, SourcePosition};

use crate::ast::{Node, NodeKind};
use crate::error::{production_error, TableError};
use crate::token::{Token, TokenKind};

/// Name of the augmented start symbol
pub const ACCEPT_SYMBOL: &str = "$accept";

/// A grammar symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Terminal (token kind)
    Terminal(TokenKind),
    /// Non-terminal, by index
    NonTerminal(usize),
}

/// Semantic value on the parser's value stack
#[derive(Debug, Clone)]
pub enum StackValue {
    /// A shifted token
    Token(Token),
    /// A single node
    Node(Node),
    /// A list of nodes
    Nodes(Vec<Node>),
    /// A counter (array elisions)
    Count(usize),
    /// No value (empty productions, punctuation)
    Empty,
}

/// Reduction action: builds the value of a production from its right-hand side
pub type Action = fn(&mut Reduction) -> JsResult<StackValue>;

/// A grammar production
#[derive(Clone)]
pub struct Production {
    /// Left-hand side non-terminal
    pub lhs: usize,
    /// Right-hand side symbols
    pub rhs: Vec<Symbol>,
    /// Reduction action
    pub action: Action,
    /// Textual form, `lhs -> A b C`
    pub text: String,
}

impl fmt::Debug for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Production")
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("text", &self.text)
            .finish()
    }
}

/// The right-hand side values of a reduction, consumed left to right
pub struct Reduction {
    values: std::vec::IntoIter<StackValue>,
    /// Position of the first token of the production
    pub position: Option<SourcePosition>,
}

impl Reduction {
    /// Wrap right-hand side values
    pub fn new(values: Vec<StackValue>, position: Option<SourcePosition>) -> Self {
        Self {
            values: values.into_iter(),
            position,
        }
    }

    fn malformed(&self, expected: &str) -> core_types::JsError {
        production_error(format!("malformed reduction, expected {}", expected), self.position)
    }

    /// Take the next value unchanged
    pub fn value(&mut self) -> JsResult<StackValue> {
        match self.values.next() {
            Some(value) => Ok(value),
            None => Err(self.malformed("a value")),
        }
    }

    /// Discard the next value
    pub fn skip(&mut self) -> JsResult<()> {
        self.value().map(|_| ())
    }

    /// Take the next value as a token
    pub fn token(&mut self) -> JsResult<Token> {
        match self.value()? {
            StackValue::Token(token) => Ok(token),
            _ => Err(self.malformed("a token")),
        }
    }

    /// Take the next value as a node
    pub fn node(&mut self) -> JsResult<Node> {
        match self.value()? {
            StackValue::Node(node) => Ok(node),
            _ => Err(self.malformed("a node")),
        }
    }

    /// Take the next value as a boxed node
    pub fn boxed(&mut self) -> JsResult<Box<Node>> {
        self.node().map(Box::new)
    }

    /// Take the next value as an optional node
    pub fn optional(&mut self) -> JsResult<Option<Box<Node>>> {
        match self.value()? {
            StackValue::Node(node) => Ok(Some(Box::new(node))),
            StackValue::Empty => Ok(None),
            _ => Err(self.malformed("an optional node")),
        }
    }

    /// Take the next value as a node list
    pub fn nodes(&mut self) -> JsResult<Vec<Node>> {
        match self.value()? {
            StackValue::Nodes(nodes) => Ok(nodes),
            StackValue::Empty => Ok(Vec::new()),
            _ => Err(self.malformed("a node list")),
        }
    }

    /// Take the next value as a count
    pub fn count(&mut self) -> JsResult<usize> {
        match self.value()? {
            StackValue::Count(count) => Ok(count),
            StackValue::Empty => Ok(0),
            _ => Err(self.malformed("a count")),
        }
    }

    /// Build a node positioned at the start of the production
    pub fn make(&self, kind: NodeKind) -> StackValue {
        StackValue::Node(Node::at(kind, self.position))
    }
}

/// A context-free grammar with reduction actions
#[derive(Debug, Clone)]
pub struct Grammar {
    nonterminals: Vec<String>,
    productions: Vec<Production>,
    fingerprint: u64,
}

impl Grammar {
    /// Start building a grammar
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    /// All productions; production 0 is `$accept -> start`
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Production by index
    pub fn production(&self, index: usize) -> Option<&Production> {
        self.productions.get(index)
    }

    /// Number of non-terminals, `$accept` included
    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    /// Name of a non-terminal
    pub fn nonterminal_name(&self, index: usize) -> Option<&str> {
        self.nonterminals.get(index).map(String::as_str)
    }

    /// Index of a non-terminal by name
    pub fn nonterminal(&self, name: &str) -> Option<usize> {
        self.nonterminals.iter().position(|n| n == name)
    }

    /// Stable hash of the productions, recorded in generated tables
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Incremental grammar construction
#[derive(Default)]
pub struct GrammarBuilder {
    rules: Vec<(String, String, Action)>,
}

impl GrammarBuilder {
    /// Add a production `lhs -> rhs`; an empty `rhs` is an empty production
    pub fn rule(&mut self, lhs: &str, rhs: &str, action: Action) -> &mut Self {
        self.rules.push((lhs.to_string(), rhs.to_string(), action));
        self
    }

    /// Resolve symbols and produce the grammar with `start` as start symbol
    pub fn build(&self, start: &str) -> Result<Grammar, TableError> {
        let mut nonterminals = vec![ACCEPT_SYMBOL.to_string()];
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (lhs, _, _) in &self.rules {
            if !index.contains_key(lhs.as_str()) {
                index.insert(lhs.as_str(), nonterminals.len());
                nonterminals.push(lhs.clone());
            }
        }

        let start_index = *index
            .get(start)
            .ok_or_else(|| TableError::Grammar(format!("unknown start symbol '{}'", start)))?;

        let mut productions = vec![Production {
            lhs: 0,
            rhs: vec![Symbol::NonTerminal(start_index)],
            action: pass,
            text: format!("{} -> {}", ACCEPT_SYMBOL, start),
        }];

        for (lhs, rhs, action) in &self.rules {
            let mut symbols = Vec::new();
            for word in rhs.split_whitespace() {
                let symbol = if let Some(kind) = TokenKind::from_name(word) {
                    Symbol::Terminal(kind)
                } else if let Some(nt) = index.get(word) {
                    Symbol::NonTerminal(*nt)
                } else {
                    return Err(TableError::Grammar(format!(
                        "unknown symbol '{}' in rule {} -> {}",
                        word, lhs, rhs
                    )));
                };
                symbols.push(symbol);
            }
            productions.push(Production {
                lhs: index[lhs.as_str()],
                rhs: symbols,
                action: *action,
                text: format!("{} -> {}", lhs, rhs.split_whitespace().collect::<Vec<_>>().join(" ")),
            });
        }

        let fingerprint = fnv1a(productions.iter().map(|p| p.text.as_str()));
        Ok(Grammar {
            nonterminals,
            productions,
            fingerprint,
        })
    }
}

fn fnv1a<'a>(parts: impl Iterator<Item = &'a str>) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(b'\n')) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

/// Action returning the first right-hand side value
pub fn pass(r: &mut Reduction) -> JsResult<StackValue> {
    r.value()
}

/// Action for empty productions
pub fn empty(_: &mut Reduction) -> JsResult<StackValue> {
    Ok(StackValue::Empty)
}

/// Action starting a list with the single right-hand side node
pub fn list_start(r: &mut Reduction) -> JsResult<StackValue> {
    Ok(StackValue::Nodes(vec![r.node()?]))
}

/// Action for `list item`
pub fn list_append(r: &mut Reduction) -> JsResult<StackValue> {
    let mut nodes = r.nodes()?;
    nodes.push(r.node()?);
    Ok(StackValue::Nodes(nodes))
}

/// Action for `list SEPARATOR item`
pub fn list_append_separated(r: &mut Reduction) -> JsResult<StackValue> {
    let mut nodes = r.nodes()?;
    r.skip()?;
    nodes.push(r.node()?);
    Ok(StackValue::Nodes(nodes))
}

/// Action returning the middle value of `OPEN value CLOSE`
pub fn second(r: &mut Reduction) -> JsResult<StackValue> {
    r.skip()?;
    r.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Grammar {
        let mut g = Grammar::builder();
        g.rule("list", "item", list_start)
            .rule("list", "list COMMA item", list_append_separated)
            .rule("item", "ID", |r| {
                let token = r.token()?;
                Ok(r.make(NodeKind::Identifier { value: token.value }))
            });
        g.build("list").unwrap()
    }

    #[test]
    fn test_augmented_production() {
        let grammar = tiny();
        assert_eq!(grammar.productions()[0].text, "$accept -> list");
        assert_eq!(grammar.nonterminal("list"), Some(1));
        assert_eq!(grammar.nonterminal_name(0), Some(ACCEPT_SYMBOL));
    }

    #[test]
    fn test_symbols_resolved() {
        let grammar = tiny();
        let rhs = &grammar.productions()[2].rhs;
        assert_eq!(rhs[1], Symbol::Terminal(TokenKind::Comma));
        assert!(matches!(rhs[0], Symbol::NonTerminal(_)));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let mut g = Grammar::builder();
        g.rule("a", "b", pass);
        assert!(matches!(g.build("a"), Err(TableError::Grammar(_))));
    }

    #[test]
    fn test_fingerprint_depends_on_productions() {
        let mut g = Grammar::builder();
        g.rule("a", "ID", pass);
        let other = g.build("a").unwrap();
        assert_ne!(tiny().fingerprint(), other.fingerprint());
        assert_eq!(tiny().fingerprint(), tiny().fingerprint());
    }

    #[test]
    fn test_reduction_accessors() {
        let mut r = Reduction::new(
            vec![StackValue::Empty, StackValue::Count(3)],
            None,
        );
        assert!(r.optional().unwrap().is_none());
        assert_eq!(r.count().unwrap(), 3);
        assert!(r.value().is_err());
    }
}
