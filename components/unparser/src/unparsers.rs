//! Ready-made unparsers

use std::sync::Arc;

use parser::Node;
use serde::{Deserialize, Serialize};

use crate::definitions::{self, Definitions};
use crate::dispatcher::{Dispatcher, Walk};
use crate::error::UnparseResult;
use crate::obfuscate::ObfuscateOptions;
use crate::rules::{self, Rule};

/// Rule definitions plus the rules whose handlers interpret them
#[derive(Debug, Clone)]
pub struct Unparser {
    definitions: Arc<Definitions>,
    rules: Vec<Rule>,
}

impl Unparser {
    /// Create from definitions and rules; later rules take precedence
    pub fn new(definitions: Arc<Definitions>, rules: Vec<Rule>) -> Self {
        Self { definitions, rules }
    }

    /// Lazily produce output chunks for `node`
    pub fn walk<'n>(&self, node: &'n Node) -> Walk<'n> {
        let rule_sets = self.rules.iter().map(Rule::call).collect();
        Dispatcher::new(Arc::clone(&self.definitions), rule_sets).walk(node)
    }

    /// Concatenate all output for `node`
    pub fn render(&self, node: &Node) -> UnparseResult<String> {
        let mut output = String::new();
        for chunk in self.walk(node) {
            output.push_str(&chunk?.text);
        }
        Ok(output)
    }
}

/// Options for [`minify_print`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinifyOptions {
    /// Rename local bindings
    pub obfuscate: bool,
    /// With `obfuscate`, rename global bindings too
    pub obfuscate_globals: bool,
    /// Drop semicolons where automatic insertion restores them
    pub drop_semi: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            obfuscate: false,
            obfuscate_globals: false,
            drop_semi: true,
        }
    }
}

/// Pretty-print with `indent_str` per nesting level
pub fn pretty_print(node: &Node, indent_str: &str) -> UnparseResult<String> {
    let unparser = Unparser::new(
        definitions::es5()?,
        vec![rules::default(), rules::indent(indent_str)],
    );
    unparser.render(node)
}

/// Print with minimal whitespace, optionally mangling names
pub fn minify_print(node: &Node, options: &MinifyOptions) -> UnparseResult<String> {
    let mut rules = vec![rules::minify(options.drop_semi)];
    if options.obfuscate {
        rules.push(rules::obfuscate(ObfuscateOptions {
            obfuscate_globals: options.obfuscate_globals,
            ..ObfuscateOptions::default()
        }));
    }
    Unparser::new(definitions::es5_minify()?, rules).render(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse;

    #[test]
    fn test_render_pretty() {
        let program = parse("if(a){b()}else c").unwrap();
        assert_eq!(
            pretty_print(&program, "  ").unwrap(),
            "if (a) {\n  b();\n} else c;\n"
        );
    }

    #[test]
    fn test_minify_defaults() {
        let options = MinifyOptions::default();
        assert!(options.drop_semi);
        assert!(!options.obfuscate);
        let program = parse("var a = 1;\nvar b = a + 2;").unwrap();
        assert_eq!(minify_print(&program, &options).unwrap(), "var a=1;var b=a+2");
    }

    #[test]
    fn test_options_from_json() {
        let options: MinifyOptions = serde_json::from_str(r#"{"obfuscate": true}"#).unwrap();
        assert!(options.obfuscate);
        assert!(options.drop_semi);
    }
}
