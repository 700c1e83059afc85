//! Dispatcher and tree walker
//!
//! The [`Dispatcher`] combines rule definitions with the handlers of one
//! or more [`RuleSet`]s. [`Dispatcher::walk`] turns a tree into a lazy
//! stream of [`Chunk`]s. Consecutive layout elements are buffered until
//! the next text is known, then resolved with the text on either side.
//! A line comment is always followed by a line break, so a trailing
//! `// ...` never swallows the code after it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use core_types::SourcePosition;
use parser::{Child, Field, Node, NodeKind, NodeType};

use crate::definitions::Definitions;
use crate::error::{UnparseError, UnparseResult};
use crate::rules::{DeferrableHandler, LayoutHandler, PrewalkHook, RuleSet, TokenHandler};
use crate::ruletypes::{Elements, Layout, Resolved, RuleElement, Token};

/// A piece of output text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Output text
    pub text: String,
    /// Source position of the node the text came from
    pub position: Option<SourcePosition>,
    /// Source name replaced by `text`, for renamed identifiers
    pub original_name: Option<String>,
}

impl Chunk {
    /// Text chunk without source information
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position: None,
            original_name: None,
        }
    }
}

/// Rule definitions combined with handlers
pub struct Dispatcher {
    definitions: Arc<Definitions>,
    token_handler: Option<TokenHandler>,
    layout_handlers: HashMap<Vec<Layout>, LayoutHandler>,
    deferrable_handlers: HashMap<&'static str, DeferrableHandler>,
    prewalk_hooks: Vec<PrewalkHook>,
}

impl Dispatcher {
    /// Merge rule sets; later sets override earlier ones, prewalk hooks accumulate
    pub fn new(definitions: Arc<Definitions>, rule_sets: Vec<RuleSet>) -> Self {
        let mut dispatcher = Self {
            definitions,
            token_handler: None,
            layout_handlers: HashMap::new(),
            deferrable_handlers: HashMap::new(),
            prewalk_hooks: Vec::new(),
        };
        for set in rule_sets {
            if let Some(handler) = set.token_handler {
                dispatcher.token_handler = Some(handler);
            }
            dispatcher.layout_handlers.extend(set.layout_handlers);
            dispatcher.deferrable_handlers.extend(set.deferrable_handlers);
            dispatcher.prewalk_hooks.extend(set.prewalk_hooks);
        }
        dispatcher
    }

    /// Rule definitions in use
    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// Handler registered for a deferrable name
    pub fn deferrable_handler(&self, name: &str) -> Option<&DeferrableHandler> {
        self.deferrable_handlers.get(name)
    }

    /// Chunk for text produced by `node`
    pub fn token(&self, text: &str, node: &Node) -> Chunk {
        match &self.token_handler {
            Some(handler) => handler(text, node),
            None => Chunk {
                text: text.to_string(),
                position: node.position,
                original_name: None,
            },
        }
    }

    /// Walk a tree, producing chunks lazily
    pub fn walk(self, root: &Node) -> Walk<'_> {
        Walk {
            dispatcher: self,
            root,
            stack: vec![Frame::Node(root)],
            layouts: Vec::new(),
            output: VecDeque::new(),
            last_text: None,
            line_open: false,
            started: false,
            finished: false,
        }
    }
}

/// Work item on the walker stack
enum Frame<'n> {
    /// Look up the rule for a node
    Node(&'n Node),
    /// Continue a rule at `index`
    Elements {
        node: &'n Node,
        elements: Elements,
        index: usize,
    },
    /// Continue a joined list at `index`
    Join {
        owner: &'n Node,
        items: &'n [Node],
        separator: Elements,
        index: usize,
    },
    /// Continue an array item list at `index`
    Elision {
        owner: &'n Node,
        items: &'n [Node],
        index: usize,
    },
}

/// Raw walker output before layout resolution
enum Event {
    Text(Chunk),
    Layout(Layout),
}

/// Lazy stream of output chunks
pub struct Walk<'n> {
    dispatcher: Dispatcher,
    root: &'n Node,
    stack: Vec<Frame<'n>>,
    layouts: Vec<Layout>,
    output: VecDeque<Chunk>,
    last_text: Option<String>,
    /// The last text was a line comment
    line_open: bool,
    started: bool,
    finished: bool,
}

impl<'n> Walk<'n> {
    fn next_event(&mut self) -> Option<UnparseResult<Event>> {
        loop {
            match self.stack.pop()? {
                Frame::Node(node) => {
                    let node_type = node.node_type();
                    let Some(elements) = self.dispatcher.definitions.get(node_type).cloned() else {
                        return Some(Err(UnparseError::RuleLookup(node_type.name().to_string())));
                    };
                    let with_comments = self.dispatcher.definitions.contains(NodeType::Comments);
                    let trailing = node.trailing_comments.as_deref().filter(|_| with_comments);
                    if let Some(trailing) = trailing {
                        let space = RuleElement::Layout(Layout::Space);
                        let separator: Elements = Arc::from(vec![space.clone()]);
                        self.push_elements(
                            trailing,
                            vec![
                                space,
                                RuleElement::Token(Token::JoinAttr {
                                    field: Field::Comments,
                                    separator,
                                }),
                            ],
                        );
                    }
                    self.stack.push(Frame::Elements {
                        node,
                        elements,
                        index: 0,
                    });
                    if let Some(comments) = node.comments.as_deref().filter(|_| with_comments) {
                        self.stack.push(Frame::Node(comments));
                    }
                }

                Frame::Elements {
                    node,
                    elements,
                    index,
                } => {
                    let Some(element) = elements.get(index).cloned() else {
                        continue;
                    };
                    self.stack.push(Frame::Elements {
                        node,
                        elements,
                        index: index + 1,
                    });
                    if let Some(event) = self.element(node, element) {
                        return Some(event);
                    }
                }

                Frame::Join {
                    owner,
                    items,
                    separator,
                    index,
                } => {
                    let Some(item) = items.get(index) else {
                        continue;
                    };
                    self.stack.push(Frame::Join {
                        owner,
                        items,
                        separator: Arc::clone(&separator),
                        index: index + 1,
                    });
                    self.stack.push(Frame::Node(item));
                    if index > 0 {
                        self.stack.push(Frame::Elements {
                            node: owner,
                            elements: separator,
                            index: 0,
                        });
                    }
                }

                Frame::Elision {
                    owner,
                    items,
                    index,
                } => {
                    let Some(item) = items.get(index) else {
                        continue;
                    };
                    self.stack.push(Frame::Elision {
                        owner,
                        items,
                        index: index + 1,
                    });
                    let more = index + 1 < items.len();
                    if let NodeKind::Elision { value } = item.kind {
                        if more {
                            self.push_elements(owner, vec![RuleElement::Layout(Layout::Space)]);
                        }
                        let commas = ",".repeat(value);
                        return Some(Ok(Event::Text(self.dispatcher.token(&commas, item))));
                    }
                    if more {
                        self.push_elements(
                            owner,
                            vec![
                                RuleElement::Token(Token::Text(",")),
                                RuleElement::Layout(Layout::Space),
                            ],
                        );
                    }
                    self.stack.push(Frame::Node(item));
                }
            }
        }
    }

    /// Process one rule element; returns an event when it produced one directly
    fn element(&mut self, node: &'n Node, element: RuleElement) -> Option<UnparseResult<Event>> {
        match element {
            RuleElement::Layout(layout) => Some(Ok(Event::Layout(layout))),
            RuleElement::Token(token) => match token {
                Token::Text(text) => Some(Ok(Event::Text(self.dispatcher.token(text, node)))),
                Token::Attr(field) => self.child(node, node.get(field), Arc::from(Vec::new())),
                Token::JoinAttr { field, separator } => self.child(node, node.get(field), separator),
                Token::ElisionJoinAttr(field) => {
                    match node.get(field) {
                        Child::Nodes(items) => self.stack.push(Frame::Elision {
                            owner: node,
                            items,
                            index: 0,
                        }),
                        other => return self.child(node, other, Arc::from(Vec::new())),
                    }
                    None
                }
                Token::Optional { field, elements } => {
                    if !node.get(field).is_empty() {
                        self.stack.push(Frame::Elements {
                            node,
                            elements,
                            index: 0,
                        });
                    }
                    None
                }
            },
            RuleElement::Deferred(deferred) => match deferred.call(&self.dispatcher, node) {
                Err(err) => Some(Err(err)),
                Ok(Resolved::Node(child)) => {
                    self.stack.push(Frame::Node(child));
                    None
                }
                Ok(Resolved::Nodes(items)) => {
                    self.push_join(node, items, Arc::from(Vec::new()));
                    None
                }
                Ok(Resolved::Text { text, original }) => {
                    let mut chunk = self.dispatcher.token(&text, node);
                    chunk.original_name = original;
                    Some(Ok(Event::Text(chunk)))
                }
                Ok(Resolved::Absent) => None,
            },
        }
    }

    fn child(
        &mut self,
        node: &'n Node,
        child: Child<'n>,
        separator: Elements,
    ) -> Option<UnparseResult<Event>> {
        match child {
            Child::Node(child) => self.stack.push(Frame::Node(child)),
            Child::Nodes(items) => self.push_join(node, items, separator),
            Child::Text(text) => return Some(Ok(Event::Text(self.dispatcher.token(text, node)))),
            Child::Count(count) => {
                return Some(Ok(Event::Text(self.dispatcher.token(&count.to_string(), node))))
            }
            Child::Absent => {}
        }
        None
    }

    fn push_elements(&mut self, node: &'n Node, elements: Vec<RuleElement>) {
        self.stack.push(Frame::Elements {
            node,
            elements: Arc::from(elements),
            index: 0,
        });
    }

    fn push_join(&mut self, owner: &'n Node, items: &'n [Node], separator: Elements) {
        self.stack.push(Frame::Join {
            owner,
            items,
            separator,
            index: 0,
        });
    }

    /// Resolve buffered layouts now that the following text (if any) is known
    fn flush_layouts(&mut self, after: Option<&str>) {
        if self.layouts.is_empty() && !self.line_open {
            return;
        }
        let layouts = std::mem::take(&mut self.layouts);
        let handlers = &self.dispatcher.layout_handlers;
        let mut before = self.last_text.clone();
        let mut texts = Vec::new();
        match handlers.get(&layouts).filter(|_| layouts.len() > 1) {
            Some(handler) => texts.extend(handler(before.as_deref(), after)),
            None => {
                for layout in &layouts {
                    let Some(handler) = handlers.get(std::slice::from_ref(layout)) else {
                        continue;
                    };
                    if let Some(text) = handler(before.as_deref(), after).filter(|t| !t.is_empty()) {
                        before = Some(text.clone());
                        texts.push(text);
                    }
                }
            }
        }
        if self.line_open && !texts.iter().any(|text| text.contains('\n')) {
            let newline = handlers
                .get([Layout::Newline].as_slice())
                .and_then(|handler| handler(self.last_text.as_deref(), after))
                .filter(|text| text.contains('\n'));
            texts = vec![newline.unwrap_or_else(|| "\n".to_string())];
        }
        self.line_open = false;
        for text in texts {
            emit(&mut self.output, &mut self.last_text, text);
        }
    }
}

fn emit(output: &mut VecDeque<Chunk>, last_text: &mut Option<String>, text: String) {
    if text.is_empty() {
        return;
    }
    *last_text = Some(text.clone());
    output.push_back(Chunk::text(text));
}

impl<'n> Iterator for Walk<'n> {
    type Item = UnparseResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            for hook in &self.dispatcher.prewalk_hooks {
                tracing::trace!(target: "unparser::walk", "running prewalk hook");
                hook(self.root);
            }
        }
        loop {
            if let Some(chunk) = self.output.pop_front() {
                return Some(Ok(chunk));
            }
            if self.finished {
                return None;
            }
            match self.next_event() {
                None => {
                    self.flush_layouts(None);
                    self.finished = true;
                }
                Some(Err(err)) => {
                    self.finished = true;
                    self.output.clear();
                    return Some(Err(err));
                }
                Some(Ok(Event::Layout(layout))) => self.layouts.push(layout),
                Some(Ok(Event::Text(chunk))) => {
                    if chunk.text.is_empty() {
                        continue;
                    }
                    self.flush_layouts(Some(&chunk.text));
                    self.line_open = chunk.text.starts_with("//");
                    self.last_text = Some(chunk.text.clone());
                    self.output.push_back(chunk);
                }
            }
        }
    }
}
