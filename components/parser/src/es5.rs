//! ECMAScript 5 grammar (plus template literals) with its AST actions.
//!
//! Expression levels come in three flavours: the plain form, `_nobf`
//! (cannot start with `{` or `function`, used by expression statements)
//! and `_noin` (no `in` operator, used in `for` initializers).
//! Statement terminators are `semi`, which accepts a real `;` or a
//! semicolon inserted by the parser (`AUTOSEMI`).

use std::sync::Arc;

use core_types::JsResult;
use once_cell::sync::Lazy;

use crate::ast::{
    AssignmentOperator, BinaryOperator, Node, NodeKind, UnaryOperator, UpdateOperator,
};
use crate::error::{production_error, TableError};
use crate::grammar::{
    empty, list_append, list_append_separated, list_start, pass, second, Grammar,
    GrammarBuilder, Reduction, StackValue,
};
use crate::tables::ParseTables;
use crate::token::{Token, TokenKind};

static ES5_GRAMMAR: Lazy<Result<Grammar, String>> =
    Lazy::new(|| grammar().map_err(|e| e.to_string()));

static DEFAULT_TABLES: Lazy<Result<Arc<ParseTables>, String>> = Lazy::new(|| {
    let grammar = es5_grammar().map_err(|e| e.to_string())?;
    Ok(Arc::new(ParseTables::build(grammar)))
});

/// The shared ES5 grammar
pub fn es5_grammar() -> Result<&'static Grammar, TableError> {
    ES5_GRAMMAR
        .as_ref()
        .map_err(|message| TableError::Grammar(message.clone()))
}

/// Tables for the ES5 grammar, built on first use
pub fn default_tables() -> Result<Arc<ParseTables>, TableError> {
    DEFAULT_TABLES
        .as_ref()
        .map(Arc::clone)
        .map_err(|message| TableError::Grammar(message.clone()))
}

/// Build the ES5 grammar
pub fn grammar() -> Result<Grammar, TableError> {
    let mut g = Grammar::builder();
    program(&mut g);
    statements(&mut g);
    functions(&mut g);
    primary_expressions(&mut g);
    member_expressions(&mut g);
    operators(&mut g);
    g.build("program")
}

fn token_node(token: Token, make: fn(String) -> NodeKind) -> StackValue {
    let position = Some(token.position);
    StackValue::Node(Node::at(make(token.value), position))
}

fn program(g: &mut GrammarBuilder) {
    g.rule("program", "statement_list_opt", |r| {
        let children = r.nodes()?;
        Ok(r.make(NodeKind::Program { children }))
    });
    g.rule("statement_list_opt", "", empty);
    g.rule("statement_list_opt", "statement_list", pass);
    g.rule("statement_list", "statement", list_start);
    g.rule("statement_list", "statement_list statement", list_append);
}

fn statements(g: &mut GrammarBuilder) {
    for kind in [
        "block",
        "variable_statement",
        "empty_statement",
        "expr_statement",
        "if_statement",
        "iteration_statement",
        "continue_statement",
        "break_statement",
        "return_statement",
        "with_statement",
        "switch_statement",
        "labelled_statement",
        "throw_statement",
        "try_statement",
        "debugger_statement",
        "function_declaration",
    ] {
        g.rule("statement", kind, pass);
    }

    g.rule("semi", "SEMI", empty);
    g.rule("semi", "AUTOSEMI", empty);

    g.rule("block", "LBRACE statement_list_opt RBRACE", |r| {
        r.skip()?;
        let children = r.nodes()?;
        Ok(r.make(NodeKind::Block { children }))
    });

    // var
    g.rule("variable_statement", "VAR variable_declaration_list semi", |r| {
        r.skip()?;
        let children = r.nodes()?;
        Ok(r.make(NodeKind::VarStatement { children }))
    });
    for suffix in ["", "_noin"] {
        g.rule(
            &format!("variable_declaration_list{}", suffix),
            &format!("variable_declaration{}", suffix),
            list_start,
        );
        g.rule(
            &format!("variable_declaration_list{}", suffix),
            &format!(
                "variable_declaration_list{s} COMMA variable_declaration{s}",
                s = suffix
            ),
            list_append_separated,
        );
        g.rule(&format!("variable_declaration{}", suffix), "identifier", |r| {
            let identifier = r.boxed()?;
            Ok(r.make(NodeKind::VarDecl {
                identifier,
                initializer: None,
            }))
        });
        g.rule(
            &format!("variable_declaration{}", suffix),
            &format!("identifier initializer{}", suffix),
            |r| {
                let identifier = r.boxed()?;
                let initializer = Some(r.boxed()?);
                Ok(r.make(NodeKind::VarDecl {
                    identifier,
                    initializer,
                }))
            },
        );
        g.rule(
            &format!("initializer{}", suffix),
            &format!("EQ assignment_expr{}", suffix),
            second,
        );
    }

    g.rule("empty_statement", "SEMI", |r| Ok(r.make(NodeKind::EmptyStatement)));

    g.rule("expr_statement", "expr_nobf semi", |r| {
        let expr = r.boxed()?;
        Ok(r.make(NodeKind::ExprStatement { expr }))
    });

    g.rule("if_statement", "IF LPAREN expr RPAREN statement", |r| {
        r.skip()?;
        r.skip()?;
        let predicate = r.boxed()?;
        r.skip()?;
        let consequent = r.boxed()?;
        Ok(r.make(NodeKind::If {
            predicate,
            consequent,
            alternate: None,
        }))
    });
    g.rule(
        "if_statement",
        "IF LPAREN expr RPAREN statement ELSE statement",
        |r| {
            r.skip()?;
            r.skip()?;
            let predicate = r.boxed()?;
            r.skip()?;
            let consequent = r.boxed()?;
            r.skip()?;
            let alternate = Some(r.boxed()?);
            Ok(r.make(NodeKind::If {
                predicate,
                consequent,
                alternate,
            }))
        },
    );

    iteration_statements(g);

    for (lhs, keyword) in [("continue_statement", "CONTINUE"), ("break_statement", "BREAK")] {
        g.rule(lhs, &format!("{} semi", keyword), |r| {
            let keyword = r.token()?;
            Ok(r.make(jump(keyword.kind, None)))
        });
        g.rule(lhs, &format!("{} identifier semi", keyword), |r| {
            let keyword = r.token()?;
            let identifier = Some(r.boxed()?);
            Ok(r.make(jump(keyword.kind, identifier)))
        });
    }

    g.rule("return_statement", "RETURN semi", |r| {
        Ok(r.make(NodeKind::Return { expr: None }))
    });
    g.rule("return_statement", "RETURN expr semi", |r| {
        r.skip()?;
        let expr = Some(r.boxed()?);
        Ok(r.make(NodeKind::Return { expr }))
    });

    g.rule("with_statement", "WITH LPAREN expr RPAREN statement", |r| {
        r.skip()?;
        r.skip()?;
        let expr = r.boxed()?;
        r.skip()?;
        let statement = r.boxed()?;
        Ok(r.make(NodeKind::With { expr, statement }))
    });

    // switch
    g.rule("switch_statement", "SWITCH LPAREN expr RPAREN case_block", |r| {
        r.skip()?;
        r.skip()?;
        let expr = r.boxed()?;
        r.skip()?;
        let case_block = r.boxed()?;
        Ok(r.make(NodeKind::Switch { expr, case_block }))
    });
    g.rule("case_block", "LBRACE case_clauses_opt RBRACE", |r| {
        r.skip()?;
        let children = r.nodes()?;
        Ok(r.make(NodeKind::CaseBlock { children }))
    });
    g.rule(
        "case_block",
        "LBRACE case_clauses_opt default_clause case_clauses_opt RBRACE",
        |r| {
            r.skip()?;
            let mut children = r.nodes()?;
            children.push(r.node()?);
            children.extend(r.nodes()?);
            Ok(r.make(NodeKind::CaseBlock { children }))
        },
    );
    g.rule("case_clauses_opt", "", empty);
    g.rule("case_clauses_opt", "case_clauses", pass);
    g.rule("case_clauses", "case_clause", list_start);
    g.rule("case_clauses", "case_clauses case_clause", list_append);
    g.rule("case_clause", "CASE expr COLON statement_list_opt", |r| {
        r.skip()?;
        let expr = r.boxed()?;
        r.skip()?;
        let elements = r.nodes()?;
        Ok(r.make(NodeKind::Case { expr, elements }))
    });
    g.rule("default_clause", "DEFAULT COLON statement_list_opt", |r| {
        r.skip()?;
        r.skip()?;
        let elements = r.nodes()?;
        Ok(r.make(NodeKind::Default { elements }))
    });

    g.rule("labelled_statement", "identifier COLON statement", |r| {
        let identifier = r.boxed()?;
        r.skip()?;
        let statement = r.boxed()?;
        Ok(r.make(NodeKind::Label {
            identifier,
            statement,
        }))
    });

    g.rule("throw_statement", "THROW expr semi", |r| {
        r.skip()?;
        let expr = r.boxed()?;
        Ok(r.make(NodeKind::Throw { expr }))
    });

    // try
    g.rule("try_statement", "TRY block catch", |r| {
        r.skip()?;
        let statements = r.boxed()?;
        let catch = Some(r.boxed()?);
        Ok(r.make(NodeKind::Try {
            statements,
            catch,
            fin: None,
        }))
    });
    g.rule("try_statement", "TRY block finally", |r| {
        r.skip()?;
        let statements = r.boxed()?;
        let fin = Some(r.boxed()?);
        Ok(r.make(NodeKind::Try {
            statements,
            catch: None,
            fin,
        }))
    });
    g.rule("try_statement", "TRY block catch finally", |r| {
        r.skip()?;
        let statements = r.boxed()?;
        let catch = Some(r.boxed()?);
        let fin = Some(r.boxed()?);
        Ok(r.make(NodeKind::Try {
            statements,
            catch,
            fin,
        }))
    });
    g.rule("catch", "CATCH LPAREN identifier RPAREN block", |r| {
        r.skip()?;
        r.skip()?;
        let identifier = r.boxed()?;
        r.skip()?;
        let elements = r.boxed()?;
        Ok(r.make(NodeKind::Catch {
            identifier,
            elements,
        }))
    });
    g.rule("finally", "FINALLY block", |r| {
        r.skip()?;
        let elements = r.boxed()?;
        Ok(r.make(NodeKind::Finally { elements }))
    });

    g.rule("debugger_statement", "DEBUGGER semi", |r| {
        Ok(r.make(NodeKind::Debugger))
    });
}

fn jump(keyword: TokenKind, identifier: Option<Box<Node>>) -> NodeKind {
    if keyword == TokenKind::Continue {
        NodeKind::Continue { identifier }
    } else {
        NodeKind::Break { identifier }
    }
}

fn iteration_statements(g: &mut GrammarBuilder) {
    g.rule(
        "iteration_statement",
        "DO statement WHILE LPAREN expr RPAREN semi",
        |r| {
            r.skip()?;
            let statement = r.boxed()?;
            r.skip()?;
            r.skip()?;
            let predicate = r.boxed()?;
            Ok(r.make(NodeKind::DoWhile {
                statement,
                predicate,
            }))
        },
    );
    g.rule("iteration_statement", "WHILE LPAREN expr RPAREN statement", |r| {
        r.skip()?;
        r.skip()?;
        let predicate = r.boxed()?;
        r.skip()?;
        let statement = r.boxed()?;
        Ok(r.make(NodeKind::While {
            predicate,
            statement,
        }))
    });
    g.rule(
        "iteration_statement",
        "FOR LPAREN expr_noin_opt SEMI expr_opt SEMI expr_opt RPAREN statement",
        |r| {
            r.skip()?;
            r.skip()?;
            let init = r.optional()?;
            for_tail(r, init)
        },
    );
    g.rule(
        "iteration_statement",
        "FOR LPAREN VAR variable_declaration_list_noin SEMI expr_opt SEMI expr_opt RPAREN statement",
        |r| {
            r.skip()?;
            r.skip()?;
            let var = r.token()?;
            let children = r.nodes()?;
            let init = Some(Box::new(Node::at(
                NodeKind::VarDeclList { children },
                Some(var.position),
            )));
            for_tail(r, init)
        },
    );
    g.rule(
        "iteration_statement",
        "FOR LPAREN left_hand_side_expr IN expr RPAREN statement",
        |r| {
            r.skip()?;
            r.skip()?;
            let item = r.boxed()?;
            for_in_tail(r, item)
        },
    );
    g.rule(
        "iteration_statement",
        "FOR LPAREN VAR identifier IN expr RPAREN statement",
        |r| {
            r.skip()?;
            r.skip()?;
            let var = r.token()?;
            let identifier = r.boxed()?;
            let item = for_in_var(var, identifier, None);
            for_in_tail(r, item)
        },
    );
    g.rule(
        "iteration_statement",
        "FOR LPAREN VAR identifier initializer_noin IN expr RPAREN statement",
        |r| {
            r.skip()?;
            r.skip()?;
            let var = r.token()?;
            let identifier = r.boxed()?;
            let initializer = Some(r.boxed()?);
            let item = for_in_var(var, identifier, initializer);
            for_in_tail(r, item)
        },
    );
    g.rule("expr_opt", "", empty);
    g.rule("expr_opt", "expr", pass);
    g.rule("expr_noin_opt", "", empty);
    g.rule("expr_noin_opt", "expr_noin", pass);
}

/// `SEMI cond SEMI count RPAREN statement`
fn for_tail(r: &mut Reduction, init: Option<Box<Node>>) -> JsResult<StackValue> {
    r.skip()?;
    let cond = r.optional()?;
    r.skip()?;
    let count = r.optional()?;
    r.skip()?;
    let statement = r.boxed()?;
    Ok(r.make(NodeKind::For {
        init,
        cond,
        count,
        statement,
    }))
}

/// `IN iterable RPAREN statement`
fn for_in_tail(r: &mut Reduction, item: Box<Node>) -> JsResult<StackValue> {
    r.skip()?;
    let iterable = r.boxed()?;
    r.skip()?;
    let statement = r.boxed()?;
    Ok(r.make(NodeKind::ForIn {
        item,
        iterable,
        statement,
    }))
}

fn for_in_var(var: Token, identifier: Box<Node>, initializer: Option<Box<Node>>) -> Box<Node> {
    let position = identifier.position;
    let decl = Node::at(
        NodeKind::VarDecl {
            identifier,
            initializer,
        },
        position,
    );
    Box::new(Node::at(
        NodeKind::VarDeclList {
            children: vec![decl],
        },
        Some(var.position),
    ))
}

fn functions(g: &mut GrammarBuilder) {
    g.rule(
        "function_declaration",
        "FUNCTION identifier LPAREN formal_parameter_list_opt RPAREN LBRACE function_body RBRACE",
        |r| {
            r.skip()?;
            let identifier = r.boxed()?;
            r.skip()?;
            let parameters = r.nodes()?;
            r.skip()?;
            r.skip()?;
            let elements = r.nodes()?;
            Ok(r.make(NodeKind::FuncDecl {
                identifier,
                parameters,
                elements,
            }))
        },
    );
    g.rule(
        "function_expr",
        "FUNCTION LPAREN formal_parameter_list_opt RPAREN LBRACE function_body RBRACE",
        |r| {
            r.skip()?;
            r.skip()?;
            let parameters = r.nodes()?;
            r.skip()?;
            r.skip()?;
            let elements = r.nodes()?;
            Ok(r.make(NodeKind::FuncExpr {
                identifier: None,
                parameters,
                elements,
            }))
        },
    );
    g.rule(
        "function_expr",
        "FUNCTION identifier LPAREN formal_parameter_list_opt RPAREN LBRACE function_body RBRACE",
        |r| {
            r.skip()?;
            let identifier = Some(r.boxed()?);
            r.skip()?;
            let parameters = r.nodes()?;
            r.skip()?;
            r.skip()?;
            let elements = r.nodes()?;
            Ok(r.make(NodeKind::FuncExpr {
                identifier,
                parameters,
                elements,
            }))
        },
    );
    g.rule("formal_parameter_list_opt", "", empty);
    g.rule("formal_parameter_list_opt", "formal_parameter_list", pass);
    g.rule("formal_parameter_list", "identifier", list_start);
    g.rule(
        "formal_parameter_list",
        "formal_parameter_list COMMA identifier",
        list_append_separated,
    );
    g.rule("function_body", "statement_list_opt", pass);
}

fn primary_expressions(g: &mut GrammarBuilder) {
    g.rule("primary_expr", "primary_expr_no_brace", pass);
    g.rule("primary_expr", "object_literal", pass);

    g.rule("primary_expr_no_brace", "THIS", |r| Ok(r.make(NodeKind::This)));
    g.rule("primary_expr_no_brace", "identifier", pass);
    g.rule("primary_expr_no_brace", "literal", pass);
    g.rule("primary_expr_no_brace", "array_literal", pass);
    g.rule("primary_expr_no_brace", "template_literal", pass);
    g.rule("primary_expr_no_brace", "LPAREN expr RPAREN", |r| {
        r.skip()?;
        let expr = r.boxed()?;
        Ok(r.make(NodeKind::GroupingOp { expr }))
    });

    g.rule("identifier", "ID", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::Identifier { value }))
    });
    g.rule("identifier_name", "ID", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::PropIdentifier { value }))
    });
    g.rule("identifier_name", "reserved_word", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::PropIdentifier { value }))
    });
    for kind in TokenKind::ALL.iter().filter(|k| k.is_keyword()) {
        g.rule("reserved_word", kind.name(), pass);
    }

    g.rule("literal", "NULL", |r| Ok(r.make(NodeKind::Null)));
    for name in ["TRUE", "FALSE"] {
        g.rule("literal", name, |r| {
            let token = r.token()?;
            Ok(token_node(token, |value| NodeKind::Boolean { value }))
        });
    }
    g.rule("literal", "NUMBER", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::Number { value }))
    });
    g.rule("literal", "STRING", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::String { value }))
    });
    g.rule("literal", "REGEX", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::Regex { value }))
    });

    // arrays
    g.rule("array_literal", "LBRACKET elision_opt RBRACKET", |r| {
        r.skip()?;
        let count = r.count()?;
        let mut items = Vec::new();
        push_elision(&mut items, count, r);
        Ok(r.make(NodeKind::Array { items }))
    });
    g.rule("array_literal", "LBRACKET element_list RBRACKET", |r| {
        r.skip()?;
        let items = r.nodes()?;
        Ok(r.make(NodeKind::Array { items }))
    });
    g.rule(
        "array_literal",
        "LBRACKET element_list COMMA elision_opt RBRACKET",
        |r| {
            r.skip()?;
            let mut items = r.nodes()?;
            r.skip()?;
            let count = r.count()?;
            push_elision(&mut items, count, r);
            Ok(r.make(NodeKind::Array { items }))
        },
    );
    g.rule("element_list", "elision_opt assignment_expr", |r| {
        let count = r.count()?;
        let mut items = Vec::new();
        push_elision(&mut items, count, r);
        items.push(r.node()?);
        Ok(StackValue::Nodes(items))
    });
    g.rule(
        "element_list",
        "element_list COMMA elision_opt assignment_expr",
        |r| {
            let mut items = r.nodes()?;
            r.skip()?;
            let count = r.count()?;
            push_elision(&mut items, count, r);
            items.push(r.node()?);
            Ok(StackValue::Nodes(items))
        },
    );
    g.rule("elision_opt", "", empty);
    g.rule("elision_opt", "elision", pass);
    g.rule("elision", "COMMA", |_| Ok(StackValue::Count(1)));
    g.rule("elision", "elision COMMA", |r| {
        let count = r.count()?;
        Ok(StackValue::Count(count + 1))
    });

    // objects
    g.rule("object_literal", "LBRACE RBRACE", |r| {
        Ok(r.make(NodeKind::Object {
            properties: Vec::new(),
        }))
    });
    g.rule("object_literal", "LBRACE property_list RBRACE", |r| {
        r.skip()?;
        let properties = r.nodes()?;
        Ok(r.make(NodeKind::Object { properties }))
    });
    g.rule("object_literal", "LBRACE property_list COMMA RBRACE", |r| {
        r.skip()?;
        let properties = r.nodes()?;
        Ok(r.make(NodeKind::Object { properties }))
    });
    g.rule("property_list", "property_assignment", list_start);
    g.rule(
        "property_list",
        "property_list COMMA property_assignment",
        list_append_separated,
    );
    g.rule("property_assignment", "property_name COLON assignment_expr", |r| {
        let left = r.boxed()?;
        r.skip()?;
        let right = r.boxed()?;
        Ok(r.make(NodeKind::Property { left, right }))
    });
    g.rule(
        "property_assignment",
        "ID property_name LPAREN formal_parameter_list_opt RPAREN LBRACE function_body RBRACE",
        accessor,
    );
    g.rule("property_name", "identifier_name", pass);
    g.rule("property_name", "STRING", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::String { value }))
    });
    g.rule("property_name", "NUMBER", |r| {
        let token = r.token()?;
        Ok(token_node(token, |value| NodeKind::Number { value }))
    });

    // templates
    g.rule("template_literal", "TEMPLATE_NOSUB", |r| {
        let token = r.token()?;
        let children = vec![template_part(token)];
        Ok(r.make(NodeKind::TemplateLiteral { children }))
    });
    g.rule("template_literal", "TEMPLATE_HEAD expr TEMPLATE_TAIL", |r| {
        let head = r.token()?;
        let expr = r.node()?;
        let tail = r.token()?;
        let children = vec![template_part(head), expr, template_part(tail)];
        Ok(r.make(NodeKind::TemplateLiteral { children }))
    });
    g.rule(
        "template_literal",
        "TEMPLATE_HEAD expr template_middle_list TEMPLATE_TAIL",
        |r| {
            let head = r.token()?;
            let mut children = vec![template_part(head), r.node()?];
            children.extend(r.nodes()?);
            children.push(template_part(r.token()?));
            Ok(r.make(NodeKind::TemplateLiteral { children }))
        },
    );
    g.rule("template_middle_list", "TEMPLATE_MIDDLE expr", |r| {
        let middle = r.token()?;
        Ok(StackValue::Nodes(vec![template_part(middle), r.node()?]))
    });
    g.rule(
        "template_middle_list",
        "template_middle_list TEMPLATE_MIDDLE expr",
        |r| {
            let mut parts = r.nodes()?;
            parts.push(template_part(r.token()?));
            parts.push(r.node()?);
            Ok(StackValue::Nodes(parts))
        },
    );
}

fn push_elision(items: &mut Vec<Node>, count: usize, r: &Reduction) {
    if count > 0 {
        items.push(Node::at(NodeKind::Elision { value: count }, r.position));
    }
}

fn template_part(token: Token) -> Node {
    let position = Some(token.position);
    let value = token.value;
    let kind = match token.kind {
        TokenKind::TemplateHead => NodeKind::TemplateHead { value },
        TokenKind::TemplateMiddle => NodeKind::TemplateMiddle { value },
        TokenKind::TemplateTail => NodeKind::TemplateTail { value },
        _ => NodeKind::TemplateNoSub { value },
    };
    Node::at(kind, position)
}

/// `get name() { }` / `set name(value) { }`
fn accessor(r: &mut Reduction) -> JsResult<StackValue> {
    let introducer = r.token()?;
    let prop_name = r.boxed()?;
    r.skip()?;
    let parameters = r.nodes()?;
    r.skip()?;
    r.skip()?;
    let elements = r.nodes()?;

    match introducer.value.as_str() {
        "get" => {
            if !parameters.is_empty() {
                return Err(production_error(
                    "Getter must not have parameters",
                    prop_name.position,
                ));
            }
            Ok(r.make(NodeKind::GetPropAssign {
                prop_name,
                elements,
            }))
        }
        "set" => {
            let mut parameters = parameters.into_iter();
            match (parameters.next(), parameters.next()) {
                (Some(parameter), None) => Ok(r.make(NodeKind::SetPropAssign {
                    prop_name,
                    parameter: Box::new(parameter),
                    elements,
                })),
                _ => Err(production_error(
                    "Setter must have exactly one parameter",
                    prop_name.position,
                )),
            }
        }
        other => Err(production_error(
            format!("Unexpected '{}' in object literal", other),
            Some(introducer.position),
        )
        .with_lexeme(other)),
    }
}

fn member_expressions(g: &mut GrammarBuilder) {
    g.rule("member_expr", "primary_expr", pass);
    g.rule("member_expr", "function_expr", pass);
    g.rule("member_expr_nobf", "primary_expr_no_brace", pass);

    for suffix in ["", "_nobf"] {
        let member = format!("member_expr{}", suffix);
        let call = format!("call_expr{}", suffix);
        let new = format!("new_expr{}", suffix);

        g.rule(&member, &format!("{} LBRACKET expr RBRACKET", member), bracket);
        g.rule(&member, &format!("{} PERIOD identifier_name", member), dot);
        g.rule(&member, "NEW member_expr arguments", |r| {
            r.skip()?;
            let identifier = r.boxed()?;
            let args = Some(r.boxed()?);
            Ok(r.make(NodeKind::NewExpr { identifier, args }))
        });

        g.rule(&new, &member, pass);
        g.rule(&new, "NEW new_expr", |r| {
            r.skip()?;
            let identifier = r.boxed()?;
            Ok(r.make(NodeKind::NewExpr {
                identifier,
                args: None,
            }))
        });

        g.rule(&call, &format!("{} arguments", member), call_action);
        g.rule(&call, &format!("{} arguments", call), call_action);
        g.rule(&call, &format!("{} LBRACKET expr RBRACKET", call), bracket);
        g.rule(&call, &format!("{} PERIOD identifier_name", call), dot);

        let lhs = format!("left_hand_side_expr{}", suffix);
        g.rule(&lhs, &new, pass);
        g.rule(&lhs, &call, pass);
    }

    g.rule("arguments", "LPAREN RPAREN", |r| {
        Ok(r.make(NodeKind::Arguments { items: Vec::new() }))
    });
    g.rule("arguments", "LPAREN argument_list RPAREN", |r| {
        r.skip()?;
        let items = r.nodes()?;
        Ok(r.make(NodeKind::Arguments { items }))
    });
    g.rule("argument_list", "assignment_expr", list_start);
    g.rule(
        "argument_list",
        "argument_list COMMA assignment_expr",
        list_append_separated,
    );
}

fn bracket(r: &mut Reduction) -> JsResult<StackValue> {
    let node = r.boxed()?;
    r.skip()?;
    let expr = r.boxed()?;
    Ok(r.make(NodeKind::BracketAccessor { node, expr }))
}

fn dot(r: &mut Reduction) -> JsResult<StackValue> {
    let node = r.boxed()?;
    r.skip()?;
    let identifier = r.boxed()?;
    Ok(r.make(NodeKind::DotAccessor { node, identifier }))
}

fn call_action(r: &mut Reduction) -> JsResult<StackValue> {
    let identifier = r.boxed()?;
    let args = r.boxed()?;
    Ok(r.make(NodeKind::FunctionCall { identifier, args }))
}

fn operators(g: &mut GrammarBuilder) {
    // postfix and unary
    for suffix in ["", "_nobf"] {
        let postfix = format!("postfix_expr{}", suffix);
        let lhs = format!("left_hand_side_expr{}", suffix);
        g.rule(&postfix, &lhs, pass);
        g.rule(&postfix, &format!("{} PLUSPLUS", lhs), postfix_action);
        g.rule(&postfix, &format!("{} MINUSMINUS", lhs), postfix_action);

        let unary = format!("unary_expr{}", suffix);
        g.rule(&unary, &postfix, pass);
        g.rule(&unary, "unary_expr_common", pass);
    }
    for op in [
        "DELETE",
        "VOID",
        "TYPEOF",
        "PLUSPLUS",
        "PLUSPLUS_NL",
        "MINUSMINUS",
        "MINUSMINUS_NL",
        "PLUS",
        "MINUS",
        "BNOT",
        "NOT",
    ] {
        g.rule("unary_expr_common", &format!("{} unary_expr", op), |r| {
            let token = r.token()?;
            let op = UnaryOperator::from_str(&token.value)
                .ok_or_else(|| unknown_operator(&token))?;
            let value = r.boxed()?;
            Ok(r.make(NodeKind::UnaryExpr { op, value }))
        });
    }

    binary_level(g, "multiplicative_expr", "unary_expr", false, false, &["MULT", "DIV", "MOD"]);
    binary_level(g, "additive_expr", "multiplicative_expr", false, false, &["PLUS", "MINUS"]);
    binary_level(g, "shift_expr", "additive_expr", false, false, &["LSHIFT", "RSHIFT", "URSHIFT"]);
    binary_level(
        g,
        "relational_expr",
        "shift_expr",
        false,
        true,
        &["LT", "GT", "LE", "GE", "INSTANCEOF", "IN"],
    );
    binary_level(
        g,
        "equality_expr",
        "relational_expr",
        true,
        true,
        &["EQEQ", "NE", "STREQ", "STRNEQ"],
    );
    binary_level(g, "bitwise_and_expr", "equality_expr", true, true, &["BAND"]);
    binary_level(g, "bitwise_xor_expr", "bitwise_and_expr", true, true, &["BXOR"]);
    binary_level(g, "bitwise_or_expr", "bitwise_xor_expr", true, true, &["BOR"]);
    binary_level(g, "logical_and_expr", "bitwise_or_expr", true, true, &["AND"]);
    binary_level(g, "logical_or_expr", "logical_and_expr", true, true, &["OR"]);

    // conditional, assignment, comma
    for suffix in ["", "_nobf", "_noin"] {
        let conditional = format!("conditional_expr{}", suffix);
        let logical_or = format!("logical_or_expr{}", suffix);
        let assignment = format!("assignment_expr{}", suffix);
        // the alternate of a noin conditional is itself noin
        let alternate = if suffix == "_noin" {
            "assignment_expr_noin"
        } else {
            "assignment_expr"
        };
        g.rule(&conditional, &logical_or, pass);
        g.rule(
            &conditional,
            &format!("{} CONDOP assignment_expr COLON {}", logical_or, alternate),
            |r| {
                let predicate = r.boxed()?;
                r.skip()?;
                let consequent = r.boxed()?;
                r.skip()?;
                let alternate = r.boxed()?;
                Ok(r.make(NodeKind::Conditional {
                    predicate,
                    consequent,
                    alternate,
                }))
            },
        );

        let target = if suffix == "_nobf" {
            "left_hand_side_expr_nobf"
        } else {
            "left_hand_side_expr"
        };
        g.rule(&assignment, &conditional, pass);
        g.rule(
            &assignment,
            &format!("{} assignment_operator {}", target, alternate),
            |r| {
                let left = r.boxed()?;
                let token = r.token()?;
                let op = AssignmentOperator::from_str(&token.value)
                    .ok_or_else(|| unknown_operator(&token))?;
                let right = r.boxed()?;
                Ok(r.make(NodeKind::Assign { op, left, right }))
            },
        );

        let expr = format!("expr{}", suffix);
        g.rule(&expr, &assignment, pass);
        g.rule(&expr, &format!("{} COMMA {}", expr, alternate), |r| {
            let left = r.boxed()?;
            r.skip()?;
            let right = r.boxed()?;
            Ok(r.make(NodeKind::Comma { left, right }))
        });
    }

    for op in [
        "EQ",
        "MULTEQUAL",
        "DIVEQUAL",
        "MODEQUAL",
        "PLUSEQUAL",
        "MINUSEQUAL",
        "LSHIFTEQUAL",
        "RSHIFTEQUAL",
        "URSHIFTEQUAL",
        "ANDEQUAL",
        "XOREQUAL",
        "OREQUAL",
    ] {
        g.rule("assignment_operator", op, pass);
    }
}

/// Left-associative binary level `level: next | level OP next`, with its
/// `_nobf` variant and, when `has_noin`, its `_noin` variant.
fn binary_level(
    g: &mut GrammarBuilder,
    level: &str,
    next: &str,
    next_has_noin: bool,
    has_noin: bool,
    ops: &[&str],
) {
    let mut suffixes = vec!["", "_nobf"];
    if has_noin {
        suffixes.push("_noin");
    }
    for suffix in suffixes {
        let lhs = format!("{}{}", level, suffix);
        let (first, right) = match suffix {
            "_nobf" => (format!("{}_nobf", next), next.to_string()),
            "_noin" if next_has_noin => (format!("{}_noin", next), format!("{}_noin", next)),
            _ => (next.to_string(), next.to_string()),
        };
        g.rule(&lhs, &first, pass);
        for op in ops {
            if suffix == "_noin" && *op == "IN" {
                continue;
            }
            g.rule(&lhs, &format!("{} {} {}", lhs, op, right), binop);
        }
    }
}

fn binop(r: &mut Reduction) -> JsResult<StackValue> {
    let left = r.boxed()?;
    let token = r.token()?;
    let op = BinaryOperator::from_str(&token.value).ok_or_else(|| unknown_operator(&token))?;
    let right = r.boxed()?;
    Ok(r.make(NodeKind::BinOp { op, left, right }))
}

fn postfix_action(r: &mut Reduction) -> JsResult<StackValue> {
    let value = r.boxed()?;
    let token = r.token()?;
    let op = if token.kind == TokenKind::PlusPlus {
        UpdateOperator::Increment
    } else {
        UpdateOperator::Decrement
    };
    Ok(r.make(NodeKind::PostfixExpr { op, value }))
}

fn unknown_operator(token: &Token) -> core_types::JsError {
    production_error(format!("Unknown operator '{}'", token.value), Some(token.position))
        .with_lexeme(token.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_builds() {
        let grammar = grammar().unwrap();
        assert!(grammar.productions().len() > 200);
        assert!(grammar.nonterminal("statement").is_some());
        assert!(grammar.nonterminal("relational_expr_noin").is_some());
        assert!(grammar.nonterminal("bitwise_or_expr_nobf").is_some());
    }

    #[test]
    fn test_only_dangling_else_conflicts() {
        let tables = default_tables().unwrap();
        assert!(!tables.conflicts.is_empty());
        for conflict in &tables.conflicts {
            assert_eq!(conflict.kind, crate::tables::ConflictKind::ShiftReduce);
            assert_eq!(conflict.terminal, "ELSE", "{:?}", conflict);
        }
    }

    #[test]
    fn test_noin_relational_excludes_in() {
        let grammar = grammar().unwrap();
        assert!(grammar
            .productions()
            .iter()
            .all(|p| !p.text.starts_with("relational_expr_noin -> relational_expr_noin IN")));
        assert!(grammar
            .productions()
            .iter()
            .any(|p| p.text == "relational_expr -> relational_expr IN shift_expr"));
    }

    #[test]
    fn test_expression_statement_uses_nobf() {
        let grammar = grammar().unwrap();
        assert!(grammar
            .productions()
            .iter()
            .any(|p| p.text == "expr_statement -> expr_nobf semi"));
    }
}
