//! Rule element types
//!
//! A node type's rule is a sequence of [`RuleElement`]s. Tokens produce
//! text (literal or taken from the node's attributes), layouts are
//! whitespace decisions deferred to the active layout handlers, and
//! deferred elements compute their output from the node at walk time.

use std::fmt;
use std::sync::Arc;

use parser::{Child, Field, Node};

use crate::dispatcher::Dispatcher;
use crate::error::{RuleError, UnparseError, UnparseResult};

/// A shared sequence of rule elements
pub type Elements = Arc<[RuleElement]>;

/// One element of a node type's rule
#[derive(Debug, Clone)]
pub enum RuleElement {
    /// Produces text
    Token(Token),
    /// Whitespace decision
    Layout(Layout),
    /// Computed at walk time
    Deferred(Arc<dyn Deferrable>),
}

/// Text-producing rule elements
#[derive(Debug, Clone)]
pub enum Token {
    /// Fixed text
    Text(&'static str),
    /// The attribute's text, or the attribute's node(s) walked in place
    Attr(Field),
    /// A node list attribute with `separator` between items
    JoinAttr {
        /// Attribute holding the list
        field: Field,
        /// Elements emitted between two items
        separator: Elements,
    },
    /// An array item list in which `Elision` nodes stand for holes
    ElisionJoinAttr(Field),
    /// `elements`, only when the attribute is present and non-empty
    Optional {
        /// Attribute tested for presence
        field: Field,
        /// Elements emitted when present
        elements: Elements,
    },
}

/// Layout decisions, resolved by layout handlers with surrounding context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// A space the pretty printer always wants
    Space,
    /// A space emitted only when the neighbours would otherwise merge
    OptionalSpace,
    /// Line break
    Newline,
    /// Line break unless already at the start of a line
    OptionalNewline,
    /// Increase indentation
    Indent,
    /// Decrease indentation
    Dedent,
    /// Statement terminator
    Semicolon,
}

/// Output of a deferred element
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'n> {
    /// Walk this node in place
    Node(&'n Node),
    /// Walk these nodes in place
    Nodes(&'n [Node]),
    /// Emit text; `original` is set when it replaces a source name
    Text {
        /// Text to emit
        text: String,
        /// Source name that `text` replaces
        original: Option<String>,
    },
    /// Emit nothing
    Absent,
}

impl<'n> Resolved<'n> {
    fn from_child(child: Child<'n>) -> Self {
        match child {
            Child::Node(node) => Resolved::Node(node),
            Child::Nodes(nodes) => Resolved::Nodes(nodes),
            Child::Text(text) => Resolved::Text {
                text: text.to_string(),
                original: None,
            },
            Child::Count(count) => Resolved::Text {
                text: count.to_string(),
                original: None,
            },
            Child::Absent => Resolved::Absent,
        }
    }

    fn renamed(text: String, original: &str) -> Self {
        let original = (text != original).then(|| original.to_string());
        Resolved::Text { text, original }
    }
}

/// A rule element evaluated against the node being walked
pub trait Deferrable: fmt::Debug + Send + Sync {
    /// Name used in error messages and handler lookup
    fn name(&self) -> &'static str;

    /// The attribute this element reads, checked against node schemas
    fn field(&self) -> Option<Field> {
        None
    }

    /// Evaluate for `node`
    fn call<'n>(&self, dispatcher: &Dispatcher, node: &'n Node) -> UnparseResult<Resolved<'n>> {
        let _ = (dispatcher, node);
        Err(UnparseError::NotImplemented(self.name().to_string()))
    }
}

/// Walks a declaring attribute through the dispatcher's `Declare` handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declare {
    field: Field,
}

impl Declare {
    /// Create for an attribute name, which must name a known attribute
    pub fn new(attr: &str) -> Result<Self, RuleError> {
        Field::from_name(attr)
            .map(Self::for_field)
            .ok_or_else(|| RuleError::UnknownAttribute(attr.to_string()))
    }

    /// Create for a known attribute
    pub fn for_field(field: Field) -> Self {
        Self { field }
    }
}

impl Deferrable for Declare {
    fn name(&self) -> &'static str {
        "Declare"
    }

    fn field(&self) -> Option<Field> {
        Some(self.field)
    }

    fn call<'n>(&self, dispatcher: &Dispatcher, node: &'n Node) -> UnparseResult<Resolved<'n>> {
        let node_type = node.node_type();
        if !node_type.has_field(self.field) {
            return Err(UnparseError::Attribute {
                node_type: node_type.name().to_string(),
                field: self.field.as_str().to_string(),
            });
        }
        match node.get(self.field) {
            Child::Node(child) => match dispatcher.deferrable_handler(self.name()) {
                Some(handler) => Ok(match (handler(child), child.value()) {
                    (Some(text), Some(original)) => Resolved::renamed(text, original),
                    (Some(text), None) => Resolved::Text {
                        text,
                        original: None,
                    },
                    (None, _) => Resolved::Node(child),
                }),
                None => Ok(Resolved::Node(child)),
            },
            other => Ok(Resolved::from_child(other)),
        }
    }
}

/// A terminal node's value, transformed by the dispatcher's `Resolve` handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolve;

impl Deferrable for Resolve {
    fn name(&self) -> &'static str {
        "Resolve"
    }

    fn field(&self) -> Option<Field> {
        Some(Field::Value)
    }

    fn call<'n>(&self, dispatcher: &Dispatcher, node: &'n Node) -> UnparseResult<Resolved<'n>> {
        let Some(value) = node.value() else {
            return Err(UnparseError::Attribute {
                node_type: node.node_type().name().to_string(),
                field: Field::Value.as_str().to_string(),
            });
        };
        let text = dispatcher
            .deferrable_handler(self.name())
            .and_then(|handler| handler(node));
        Ok(match text {
            Some(text) => Resolved::renamed(text, value),
            None => Resolved::Text {
                text: value.to_string(),
                original: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Unfinished;

    impl Deferrable for Unfinished {
        fn name(&self) -> &'static str {
            "Unfinished"
        }
    }

    #[test]
    fn test_declare_rejects_unknown_attribute() {
        assert_eq!(
            Declare::new("no_such_attr"),
            Err(RuleError::UnknownAttribute("no_such_attr".into()))
        );
        assert!(Declare::new("identifier").is_ok());
    }

    #[test]
    fn test_base_deferrable_not_implemented() {
        let dispatcher = Dispatcher::new(Arc::new(Default::default()), Vec::new());
        let node = Node::identifier("x");
        assert_eq!(
            Unfinished.call(&dispatcher, &node),
            Err(UnparseError::NotImplemented("Unfinished".into()))
        );
    }

    #[test]
    fn test_resolve_without_handler_is_raw_value() {
        let dispatcher = Dispatcher::new(Arc::new(Default::default()), Vec::new());
        let node = Node::identifier("foo");
        assert_eq!(
            Resolve.call(&dispatcher, &node),
            Ok(Resolved::Text {
                text: "foo".into(),
                original: None
            })
        );
    }

    #[test]
    fn test_declare_wrong_node_type() {
        let dispatcher = Dispatcher::new(Arc::new(Default::default()), Vec::new());
        let node = Node::identifier("foo");
        let declare = Declare::for_field(Field::Parameters);
        assert!(matches!(
            declare.call(&dispatcher, &node),
            Err(UnparseError::Attribute { .. })
        ));
    }
}
