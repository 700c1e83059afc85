//! Scope analysis for ECMAScript 5 programs
//!
//! Builds the scope tree (global, function and catch scopes), records every
//! identifier occurrence and resolves each one to the scope that binds it.
//! `var` and function declarations hoist to the nearest function scope.
//! A `with` statement or a direct `eval(...)` call makes the enclosing
//! scope and all of its ancestors dynamic: names there cannot be resolved
//! statically.
//!
//! Occurrences are keyed by node address ([`node_key`]), so the analysed
//! tree must not move while the result is in use.

use std::collections::HashMap;

use crate::ast::{Node, NodeKind};

/// Kind of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Program scope
    Global,
    /// Function body (declaration, expression or accessor)
    Function,
    /// `catch` clause parameter scope
    Catch,
}

/// A single scope
#[derive(Debug, Clone)]
pub struct Scope {
    /// Scope ID, also its index; parents always precede children
    pub id: usize,
    /// Parent scope ID
    pub parent: Option<usize>,
    /// Kind of scope
    pub kind: ScopeKind,
    /// Names bound here, in declaration order
    pub variables: Vec<String>,
    /// Contains (or encloses) `with` or a direct `eval`
    pub dynamic: bool,
}

/// One identifier occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Identifier name
    pub name: String,
    /// Scope in which the occurrence appears
    pub from: usize,
    /// Scope binding the name, `None` for free (global) names
    pub binding: Option<usize>,
    /// True for declarations, false for references
    pub declaration: bool,
}

/// Result of scope analysis
#[derive(Debug, Clone, Default)]
pub struct ScopeInfo {
    /// All scopes; index 0 is the global scope
    pub scopes: Vec<Scope>,
    /// Occurrences keyed by identifier node address
    pub occurrences: HashMap<usize, Occurrence>,
}

impl ScopeInfo {
    /// Occurrence recorded for an identifier node
    pub fn occurrence(&self, node: &Node) -> Option<&Occurrence> {
        self.occurrences.get(&node_key(node))
    }

    /// True when `scope` is `ancestor` or nested inside it
    pub fn is_within(&self, scope: usize, ancestor: usize) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.scopes.get(id).and_then(|s| s.parent);
        }
        false
    }

    /// Number of occurrences bound to `name` in `scope`
    pub fn reference_count(&self, scope: usize, name: &str) -> usize {
        self.occurrences
            .values()
            .filter(|o| o.binding == Some(scope) && o.name == name)
            .count()
    }
}

/// Address of a node, used as its identity
pub fn node_key(node: &Node) -> usize {
    node as *const Node as usize
}

/// Scope analyzer for ECMAScript ASTs
pub struct ScopeAnalyzer {
    scopes: Vec<Scope>,
    current_scope: usize,
    occurrences: HashMap<usize, Occurrence>,
}

impl ScopeAnalyzer {
    /// Create a new scope analyzer
    pub fn new() -> Self {
        let global_scope = Scope {
            id: 0,
            parent: None,
            kind: ScopeKind::Global,
            variables: Vec::new(),
            dynamic: false,
        };

        Self {
            scopes: vec![global_scope],
            current_scope: 0,
            occurrences: HashMap::new(),
        }
    }

    /// Analyze a tree and return scope information
    pub fn analyze(mut self, node: &Node) -> ScopeInfo {
        self.visit(node);
        self.resolve_references();
        ScopeInfo {
            scopes: self.scopes,
            occurrences: self.occurrences,
        }
    }

    fn visit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Identifier { value } => self.reference(node, value),

            NodeKind::VarDecl {
                identifier,
                initializer,
            } => {
                let scope = self.var_scope();
                self.declare(identifier, scope);
                if let Some(init) = initializer {
                    self.visit(init);
                }
            }

            NodeKind::FuncDecl {
                identifier,
                parameters,
                elements,
            } => {
                let scope = self.var_scope();
                self.declare(identifier, scope);
                self.visit_function(None, parameters, elements);
            }

            NodeKind::FuncExpr {
                identifier,
                parameters,
                elements,
            } => self.visit_function(identifier.as_deref(), parameters, elements),

            NodeKind::GetPropAssign { elements, .. } => self.visit_function(None, &[], elements),

            NodeKind::SetPropAssign {
                parameter,
                elements,
                ..
            } => self.visit_function(None, std::slice::from_ref(&**parameter), elements),

            NodeKind::Catch {
                identifier,
                elements,
            } => {
                let catch_scope = self.enter_scope(ScopeKind::Catch);
                self.declare(identifier, catch_scope);
                self.visit(elements);
                self.exit_scope();
            }

            NodeKind::With { expr, statement } => {
                self.visit(expr);
                self.mark_dynamic();
                self.visit(statement);
            }

            NodeKind::FunctionCall { identifier, args } => {
                if matches!(&identifier.kind, NodeKind::Identifier { value } if value == "eval") {
                    self.mark_dynamic();
                }
                self.visit(identifier);
                self.visit(args);
            }

            // property names and labels are not variables
            NodeKind::DotAccessor { node, .. } => self.visit(node),
            NodeKind::Property { right, .. } => self.visit(right),
            NodeKind::Label { statement, .. } => self.visit(statement),
            NodeKind::Continue { .. } | NodeKind::Break { .. } => {}

            _ => {
                for child in node.children() {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_function(&mut self, name: Option<&Node>, parameters: &[Node], elements: &[Node]) {
        let function_scope = self.enter_scope(ScopeKind::Function);
        if let Some(name) = name {
            self.declare(name, function_scope);
        }
        for param in parameters {
            self.declare(param, function_scope);
        }
        for stmt in elements {
            self.visit(stmt);
        }
        self.exit_scope();
    }

    fn enter_scope(&mut self, kind: ScopeKind) -> usize {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            id,
            parent: Some(self.current_scope),
            kind,
            variables: Vec::new(),
            dynamic: false,
        });
        self.current_scope = id;
        id
    }

    fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current_scope].parent {
            self.current_scope = parent;
        }
    }

    /// Nearest enclosing function or global scope
    fn var_scope(&self) -> usize {
        let mut id = self.current_scope;
        while self.scopes[id].kind == ScopeKind::Catch {
            match self.scopes[id].parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
        id
    }

    fn mark_dynamic(&mut self) {
        let mut current = Some(self.current_scope);
        while let Some(id) = current {
            self.scopes[id].dynamic = true;
            current = self.scopes[id].parent;
        }
    }

    fn declare(&mut self, identifier: &Node, scope: usize) {
        let NodeKind::Identifier { value } = &identifier.kind else {
            return;
        };
        let variables = &mut self.scopes[scope].variables;
        if !variables.contains(value) {
            variables.push(value.clone());
        }
        self.occurrences.insert(
            node_key(identifier),
            Occurrence {
                name: value.clone(),
                from: self.current_scope,
                binding: Some(scope),
                declaration: true,
            },
        );
    }

    fn reference(&mut self, identifier: &Node, name: &str) {
        self.occurrences.insert(
            node_key(identifier),
            Occurrence {
                name: name.to_string(),
                from: self.current_scope,
                binding: None,
                declaration: false,
            },
        );
    }

    fn resolve_references(&mut self) {
        let scopes = &self.scopes;
        for occurrence in self.occurrences.values_mut().filter(|o| !o.declaration) {
            let mut current = Some(occurrence.from);
            while let Some(id) = current {
                if scopes[id].variables.contains(&occurrence.name) {
                    occurrence.binding = Some(id);
                    break;
                }
                current = scopes[id].parent;
            }
        }
    }
}

impl Default for ScopeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn analyze(source: &str) -> ScopeInfo {
        let program = parse(source).unwrap();
        ScopeAnalyzer::new().analyze(&program)
    }

    fn bindings(info: &ScopeInfo, name: &str) -> Vec<Option<usize>> {
        let mut found: Vec<_> = info
            .occurrences
            .values()
            .filter(|o| o.name == name)
            .map(|o| o.binding)
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_var_hoists_to_function() {
        let info = analyze("function f() { x = 1; if (a) { var x; } }");
        assert_eq!(info.scopes.len(), 2);
        assert_eq!(info.scopes[1].variables, vec!["x".to_string()]);
        assert_eq!(bindings(&info, "x"), vec![Some(1), Some(1)]);
        assert_eq!(bindings(&info, "a"), vec![None]);
    }

    #[test]
    fn test_function_expression_name_is_local() {
        let info = analyze("var g = function h() { return h; };");
        assert_eq!(info.scopes[0].variables, vec!["g".to_string()]);
        assert_eq!(info.scopes[1].variables, vec!["h".to_string()]);
    }

    #[test]
    fn test_catch_scope() {
        let info = analyze("try {} catch (e) { var v = e; }");
        assert_eq!(info.scopes[1].kind, ScopeKind::Catch);
        assert_eq!(info.scopes[1].variables, vec!["e".to_string()]);
        assert_eq!(info.scopes[0].variables, vec!["v".to_string()]);
    }

    #[test]
    fn test_with_marks_ancestors_dynamic() {
        let info = analyze("function f() { function g() { with (o) { x; } } } function k() {}");
        assert!(info.scopes[0].dynamic);
        assert!(info.scopes[1].dynamic);
        assert!(info.scopes[2].dynamic);
        assert!(!info.scopes[3].dynamic);
    }

    #[test]
    fn test_eval_marks_dynamic() {
        let info = analyze("function f(a) { eval('a'); }");
        assert!(info.scopes[1].dynamic);
    }

    #[test]
    fn test_property_names_ignored() {
        let info = analyze("var o = { a: b }; o.a;");
        assert!(bindings(&info, "a").is_empty());
        assert_eq!(bindings(&info, "b"), vec![None]);
    }

    #[test]
    fn test_is_within() {
        let info = analyze("function f() { function g() {} }");
        assert!(info.is_within(2, 0));
        assert!(info.is_within(2, 1));
        assert!(!info.is_within(1, 2));
        assert_eq!(info.reference_count(1, "g"), 1);
    }
}
