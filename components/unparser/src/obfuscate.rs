//! Name mangling
//!
//! Every non-dynamic scope gets its bindings renamed to the shortest names
//! that cannot collide with anything visible inside it: free (global)
//! names used in the scope, the final names of outer bindings referenced
//! from it, and the configured reserved names. Bindings referenced most
//! often get the shortest names.

use std::collections::{HashMap, HashSet};

use parser::{node_key, Node, ScopeAnalyzer, ScopeKind, TokenKind};
use serde::{Deserialize, Serialize};

/// Mangling options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObfuscateOptions {
    /// Also rename bindings of the global scope
    pub obfuscate_globals: bool,
    /// Names never produced by the generator
    pub reserved_names: Vec<String>,
}

/// Assigns short names to identifier nodes of one tree
#[derive(Debug, Clone, Default)]
pub struct Obfuscator {
    options: ObfuscateOptions,
    names: HashMap<usize, String>,
}

impl Obfuscator {
    /// Create with options
    pub fn new(options: ObfuscateOptions) -> Self {
        Self {
            options,
            names: HashMap::new(),
        }
    }

    /// Compute new names for every renameable occurrence in `root`
    pub fn analyze(&mut self, root: &Node) {
        self.names.clear();
        let info = ScopeAnalyzer::new().analyze(root);
        let mut assigned: HashMap<(usize, &str), String> = HashMap::new();

        for scope in &info.scopes {
            if scope.dynamic || scope.variables.is_empty() {
                continue;
            }
            if scope.kind == ScopeKind::Global && !self.options.obfuscate_globals {
                continue;
            }

            let mut reserved: HashSet<&str> =
                self.options.reserved_names.iter().map(String::as_str).collect();
            for occurrence in info.occurrences.values() {
                if !info.is_within(occurrence.from, scope.id) {
                    continue;
                }
                match occurrence.binding {
                    None => {
                        reserved.insert(&occurrence.name);
                    }
                    Some(binding) if !info.is_within(binding, scope.id) => {
                        let name = assigned
                            .get(&(binding, occurrence.name.as_str()))
                            .map(String::as_str)
                            .unwrap_or(&occurrence.name);
                        reserved.insert(name);
                    }
                    Some(_) => {}
                }
            }

            let mut variables: Vec<&str> = scope.variables.iter().map(String::as_str).collect();
            variables.sort_by_key(|name| std::cmp::Reverse(info.reference_count(scope.id, name)));

            let mut generator = NameGenerator::default();
            let mut renamed = Vec::with_capacity(variables.len());
            for variable in variables {
                let name = generator.find(|candidate| !reserved.contains(candidate.as_str()));
                if let Some(name) = name {
                    renamed.push((variable, name));
                }
            }
            for (variable, name) in renamed {
                assigned.insert((scope.id, variable), name);
            }
        }

        for (key, occurrence) in &info.occurrences {
            let Some(binding) = occurrence.binding else {
                continue;
            };
            if let Some(name) = assigned.get(&(binding, occurrence.name.as_str())) {
                self.names.insert(*key, name.clone());
            }
        }
        tracing::debug!(
            target: "unparser::obfuscate",
            scopes = info.scopes.len(),
            renamed = self.names.len(),
            "names assigned"
        );
    }

    /// New name for an identifier node, if it was renamed
    pub fn name_of(&self, node: &Node) -> Option<String> {
        self.names.get(&node_key(node)).cloned()
    }
}

const FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const REST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// Shortest-first identifier names, skipping keywords
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    counter: usize,
}

impl NameGenerator {
    fn nth(mut index: usize) -> String {
        let mut name = vec![FIRST[index % FIRST.len()]];
        index /= FIRST.len();
        while index > 0 {
            index -= 1;
            name.push(REST[index % REST.len()]);
            index /= REST.len();
        }
        name.into_iter().map(char::from).collect()
    }
}

impl Iterator for NameGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let name = Self::nth(self.counter);
            self.counter += 1;
            if TokenKind::keyword(&name).is_none() {
                return Some(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::{parse, NodeKind};

    #[test]
    fn test_generator_order() {
        let names: Vec<_> = NameGenerator::default().take(54).collect();
        assert_eq!(names[0], "a");
        assert_eq!(names[51], "Z");
        assert_eq!(names[52], "aa");
        assert_eq!(names[53], "ba");
    }

    #[test]
    fn test_generator_skips_keywords() {
        let names: HashSet<_> = NameGenerator::default().take(5000).collect();
        assert_eq!(names.len(), 5000);
        for keyword in ["do", "if", "in", "for", "new", "try", "var"] {
            assert!(!names.contains(keyword));
        }
    }

    fn function_identifiers(program: &Node) -> Vec<&Node> {
        let NodeKind::Program { children } = &program.kind else {
            panic!("not a program");
        };
        let NodeKind::FuncDecl { parameters, .. } = &children[0].kind else {
            panic!("not a function");
        };
        parameters.iter().collect()
    }

    #[test]
    fn test_locals_renamed_globals_kept() {
        let program = parse("function outer(first, second) { return first + second + g; }").unwrap();
        let mut obfuscator = Obfuscator::new(ObfuscateOptions::default());
        obfuscator.analyze(&program);
        let params = function_identifiers(&program);
        let first = obfuscator.name_of(params[0]).unwrap();
        let second = obfuscator.name_of(params[1]).unwrap();
        assert_ne!(first, second);
        assert_ne!(first, "g");
        assert_ne!(second, "g");
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_reserved_names_avoided() {
        let program = parse("function f(x) { return x; }").unwrap();
        let mut obfuscator = Obfuscator::new(ObfuscateOptions {
            obfuscate_globals: false,
            reserved_names: vec!["a".into(), "b".into()],
        });
        obfuscator.analyze(&program);
        let params = function_identifiers(&program);
        assert_eq!(obfuscator.name_of(params[0]).as_deref(), Some("c"));
    }

    #[test]
    fn test_dynamic_scope_untouched() {
        let program = parse("function f(x) { eval('x'); return x; }").unwrap();
        let mut obfuscator = Obfuscator::new(ObfuscateOptions::default());
        obfuscator.analyze(&program);
        let params = function_identifiers(&program);
        assert_eq!(obfuscator.name_of(params[0]), None);
    }
}
