//! Rule sets: handler bundles that give the layout elements their meaning
//!
//! A [`Rule`] is a factory. Each unparse invocation calls it once, so
//! stateful handlers (indentation depth, name tables) never leak between
//! runs. The factories registered by name are listed in [`REGISTRY`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use parser::Node;

use crate::dispatcher::Chunk;
use crate::layout::{needs_space, Indentator};
use crate::obfuscate::{ObfuscateOptions, Obfuscator};
use crate::ruletypes::Layout;

/// Builds the chunk for a piece of text produced by a node
pub type TokenHandler = Box<dyn Fn(&str, &Node) -> Chunk>;

/// Resolves layouts given the text emitted before and the text that follows
pub type LayoutHandler = Box<dyn Fn(Option<&str>, Option<&str>) -> Option<String>>;

/// Computes replacement text for a deferred element
pub type DeferrableHandler = Box<dyn Fn(&Node) -> Option<String>>;

/// Runs once over the root before any output is produced
pub type PrewalkHook = Box<dyn Fn(&Node)>;

/// Handlers contributed by one rule
#[derive(Default)]
pub struct RuleSet {
    /// Replaces the default token handler
    pub token_handler: Option<TokenHandler>,
    /// Handlers keyed by layout sequence
    pub layout_handlers: HashMap<Vec<Layout>, LayoutHandler>,
    /// Handlers keyed by deferrable name
    pub deferrable_handlers: HashMap<&'static str, DeferrableHandler>,
    /// Hooks run before walking
    pub prewalk_hooks: Vec<PrewalkHook>,
}

impl RuleSet {
    /// Register a handler for a single layout
    pub fn layout<F>(mut self, layout: Layout, handler: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>) -> Option<String> + 'static,
    {
        self.layout_handlers.insert(vec![layout], Box::new(handler));
        self
    }

    /// Register a handler for a run of consecutive layouts
    pub fn layout_sequence<F>(mut self, layouts: &[Layout], handler: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>) -> Option<String> + 'static,
    {
        self.layout_handlers.insert(layouts.to_vec(), Box::new(handler));
        self
    }

    /// Register a deferrable handler
    pub fn deferrable<F>(mut self, name: &'static str, handler: F) -> Self
    where
        F: Fn(&Node) -> Option<String> + 'static,
    {
        self.deferrable_handlers.insert(name, Box::new(handler));
        self
    }

    /// Add a prewalk hook
    pub fn prewalk<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Node) + 'static,
    {
        self.prewalk_hooks.push(Box::new(hook));
        self
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut layouts: Vec<_> = self.layout_handlers.keys().collect();
        layouts.sort_by_key(|sequence| format!("{:?}", sequence));
        let mut deferrables: Vec<_> = self.deferrable_handlers.keys().collect();
        deferrables.sort();
        f.debug_struct("RuleSet")
            .field("token_handler", &self.token_handler.is_some())
            .field("layout_handlers", &layouts)
            .field("deferrable_handlers", &deferrables)
            .field("prewalk_hooks", &self.prewalk_hooks.len())
            .finish()
    }
}

/// A rule set factory
#[derive(Clone)]
pub struct Rule(Arc<dyn Fn() -> RuleSet + Send + Sync>);

impl Rule {
    /// Wrap a factory
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> RuleSet + Send + Sync + 'static,
    {
        Rule(Arc::new(factory))
    }

    /// Produce a fresh rule set
    pub fn call(&self) -> RuleSet {
        (self.0)()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule")
    }
}

fn space_if_needed(before: Option<&str>, after: Option<&str>) -> Option<String> {
    match (before, after) {
        (Some(before), Some(after)) if needs_space(before, after) => Some(" ".to_string()),
        _ => None,
    }
}

fn line_break_if_needed(before: Option<&str>) -> Option<String> {
    match before {
        None => None,
        Some(text) if text.ends_with('\n') => None,
        Some(_) => Some("\n".to_string()),
    }
}

/// Readable spacing with unindented line breaks
pub fn default() -> Rule {
    Rule::new(|| {
        RuleSet::default()
            .layout(Layout::Space, |_, _| Some(" ".to_string()))
            .layout(Layout::OptionalSpace, space_if_needed)
            .layout(Layout::Newline, |_, _| Some("\n".to_string()))
            .layout(Layout::OptionalNewline, |before, _| {
                line_break_if_needed(before)
            })
            .layout(Layout::Semicolon, |_, _| Some(";".to_string()))
    })
}

/// Only the whitespace needed to keep tokens apart
pub fn minimum() -> Rule {
    Rule::new(minimum_set)
}

fn minimum_set() -> RuleSet {
    RuleSet::default()
        .layout(Layout::Space, space_if_needed)
        .layout(Layout::OptionalSpace, space_if_needed)
        .layout(Layout::Newline, space_if_needed)
        .layout(Layout::Semicolon, |_, _| Some(";".to_string()))
}

/// [`minimum`], optionally dropping semicolons before `}` and at the end of input
pub fn minify(drop_semi: bool) -> Rule {
    Rule::new(move || {
        let set = minimum_set();
        if !drop_semi {
            return set;
        }
        set.layout(Layout::Semicolon, |_, after| match after {
            None => None,
            Some(text) if text.starts_with('}') => None,
            Some(_) => Some(";".to_string()),
        })
    })
}

/// Indented line breaks; `indent_str` is repeated once per level
pub fn indent(indent_str: impl Into<String>) -> Rule {
    let indent_str = indent_str.into();
    Rule::new(move || {
        let state = Rc::new(RefCell::new(Indentator::new(indent_str.clone())));
        let on_indent = Rc::clone(&state);
        let on_dedent = Rc::clone(&state);
        let on_newline = Rc::clone(&state);
        let on_optional = Rc::clone(&state);
        RuleSet::default()
            .layout(Layout::Indent, move |_, _| {
                on_indent.borrow_mut().indent();
                None
            })
            .layout(Layout::Dedent, move |_, _| {
                on_dedent.borrow_mut().dedent();
                None
            })
            .layout(Layout::Newline, move |_, _| {
                Some(on_newline.borrow().newline())
            })
            .layout(Layout::OptionalNewline, move |before, _| {
                on_optional.borrow().optional_newline(before)
            })
    })
}

/// Rename local bindings to short names
pub fn obfuscate(options: ObfuscateOptions) -> Rule {
    Rule::new(move || {
        let obfuscator = Rc::new(RefCell::new(Obfuscator::new(options.clone())));
        let analyzer = Rc::clone(&obfuscator);
        let declare = Rc::clone(&obfuscator);
        let resolve = obfuscator;
        RuleSet::default()
            .prewalk(move |root| analyzer.borrow_mut().analyze(root))
            .deferrable("Declare", move |node| declare.borrow().name_of(node))
            .deferrable("Resolve", move |node| resolve.borrow().name_of(node))
    })
}

fn registered_minify() -> Rule {
    minify(true)
}

fn registered_indent() -> Rule {
    indent("  ")
}

fn registered_obfuscate() -> Rule {
    obfuscate(ObfuscateOptions::default())
}

/// Rules available by name, with their default arguments
pub const REGISTRY: &[(&str, fn() -> Rule)] = &[
    ("default", default),
    ("minimum", minimum),
    ("minify", registered_minify),
    ("indent", registered_indent),
    ("obfuscate", registered_obfuscate),
];

/// Find a registered rule by name
pub fn lookup(name: &str) -> Option<Rule> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, factory)| factory())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(set: &RuleSet, layout: Layout, before: Option<&str>, after: Option<&str>) -> Option<String> {
        let handler = set.layout_handlers.get(&vec![layout]).unwrap();
        handler(before, after)
    }

    #[test]
    fn test_registry_names() {
        let names: Vec<_> = REGISTRY.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["default", "minimum", "minify", "indent", "obfuscate"]);
        assert!(lookup("indent").is_some());
        assert!(lookup("pretty").is_none());
    }

    #[test]
    fn test_factories_repeatable() {
        for (_, factory) in REGISTRY {
            let rule = factory();
            let first = rule.call();
            let second = rule.call();
            assert_eq!(format!("{:?}", first), format!("{:?}", second));
        }
    }

    #[test]
    fn test_minimum_spacing() {
        let set = minimum().call();
        assert_eq!(handle(&set, Layout::Space, Some("var"), Some("x")), Some(" ".into()));
        assert_eq!(handle(&set, Layout::Space, Some("x"), Some("=")), None);
        assert_eq!(handle(&set, Layout::Newline, Some(";"), Some("x")), None);
    }

    #[test]
    fn test_minify_drops_semicolon() {
        let set = minify(true).call();
        assert_eq!(handle(&set, Layout::Semicolon, Some("x"), Some("}")), None);
        assert_eq!(handle(&set, Layout::Semicolon, Some("x"), None), None);
        assert_eq!(handle(&set, Layout::Semicolon, Some("x"), Some("y")), Some(";".into()));

        let keep = minify(false).call();
        assert_eq!(handle(&keep, Layout::Semicolon, Some("x"), None), Some(";".into()));
    }

    #[test]
    fn test_indent_state_is_per_call() {
        let rule = indent("    ");
        let first = rule.call();
        handle(&first, Layout::Indent, None, None);
        assert_eq!(handle(&first, Layout::Newline, None, None), Some("\n    ".into()));

        let second = rule.call();
        assert_eq!(handle(&second, Layout::Newline, None, None), Some("\n".into()));
    }
}
