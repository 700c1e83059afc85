//! Rule definitions: one element sequence per node type
//!
//! [`es5`] holds the rules used by the pretty printer. [`es5_minify`] is the
//! same table without the comment rule, so attached comments are skipped.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parser::{Field, NodeType};

use crate::error::RuleError;
use crate::ruletypes::{Declare, Elements, Layout, Resolve, RuleElement, Token};

/// Rules keyed by node type
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    rules: HashMap<NodeType, Elements>,
}

impl Definitions {
    /// Build from rules, checking every attribute reference against the node schema
    pub fn new<I>(rules: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (NodeType, Vec<RuleElement>)>,
    {
        let mut table = HashMap::new();
        for (node_type, elements) in rules {
            validate(node_type, &elements)?;
            table.insert(node_type, Arc::from(elements));
        }
        Ok(Self { rules: table })
    }

    /// Rule for a node type
    pub fn get(&self, node_type: NodeType) -> Option<&Elements> {
        self.rules.get(&node_type)
    }

    /// True when a rule exists for `node_type`
    pub fn contains(&self, node_type: NodeType) -> bool {
        self.rules.contains_key(&node_type)
    }

    /// Copy without the rule for `node_type`
    pub fn without(&self, node_type: NodeType) -> Self {
        let mut rules = self.rules.clone();
        rules.remove(&node_type);
        Self { rules }
    }

    /// Number of node types with a rule
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rules are defined
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn validate(node_type: NodeType, elements: &[RuleElement]) -> Result<(), RuleError> {
    let check = |field: Field| {
        if node_type.has_field(field) {
            Ok(())
        } else {
            Err(RuleError::MissingAttribute {
                node_type: node_type.name().to_string(),
                field: field.as_str().to_string(),
            })
        }
    };
    for element in elements {
        match element {
            RuleElement::Token(Token::Text(_)) | RuleElement::Layout(_) => {}
            RuleElement::Token(Token::Attr(field) | Token::ElisionJoinAttr(field)) => {
                check(*field)?
            }
            RuleElement::Token(Token::JoinAttr { field, separator }) => {
                check(*field)?;
                validate(node_type, separator)?;
            }
            RuleElement::Token(Token::Optional { field, elements }) => {
                check(*field)?;
                validate(node_type, elements)?;
            }
            RuleElement::Deferred(deferred) => {
                if let Some(field) = deferred.field() {
                    check(field)?;
                }
            }
        }
    }
    Ok(())
}

const SPACE: RuleElement = RuleElement::Layout(Layout::Space);
const OPTIONAL_SPACE: RuleElement = RuleElement::Layout(Layout::OptionalSpace);
const NEWLINE: RuleElement = RuleElement::Layout(Layout::Newline);
const OPTIONAL_NEWLINE: RuleElement = RuleElement::Layout(Layout::OptionalNewline);
const INDENT: RuleElement = RuleElement::Layout(Layout::Indent);
const DEDENT: RuleElement = RuleElement::Layout(Layout::Dedent);
const SEMICOLON: RuleElement = RuleElement::Layout(Layout::Semicolon);

fn text(text: &'static str) -> RuleElement {
    RuleElement::Token(Token::Text(text))
}

fn attr(field: Field) -> RuleElement {
    RuleElement::Token(Token::Attr(field))
}

fn join(field: Field, separator: Vec<RuleElement>) -> RuleElement {
    RuleElement::Token(Token::JoinAttr {
        field,
        separator: Arc::from(separator),
    })
}

fn optional(field: Field, elements: Vec<RuleElement>) -> RuleElement {
    RuleElement::Token(Token::Optional {
        field,
        elements: Arc::from(elements),
    })
}

fn declare(field: Field) -> RuleElement {
    RuleElement::Deferred(Arc::new(Declare::for_field(field)))
}

/// `{`, the indented statement list, `}`
fn body(field: Field) -> Vec<RuleElement> {
    vec![
        text("{"),
        optional(
            field,
            vec![INDENT, NEWLINE, join(field, vec![NEWLINE]), DEDENT, NEWLINE],
        ),
        text("}"),
    ]
}

fn function(name: RuleElement) -> Vec<RuleElement> {
    let mut elements = vec![
        text("function"),
        name,
        text("("),
        join(Field::Parameters, vec![text(","), SPACE]),
        text(")"),
        SPACE,
    ];
    elements.extend(body(Field::Elements));
    elements
}

/// `case expr:` / `default:` followed by the indented statements
fn clause(head: Vec<RuleElement>) -> Vec<RuleElement> {
    let mut elements = head;
    elements.push(optional(
        Field::Elements,
        vec![INDENT, NEWLINE, join(Field::Elements, vec![NEWLINE]), DEDENT],
    ));
    elements
}

fn keyword_block(keyword: &'static str, head: Vec<RuleElement>) -> Vec<RuleElement> {
    let mut elements = vec![text(keyword), SPACE, text("(")];
    elements.extend(head);
    elements.extend([text(")"), SPACE, attr(Field::Statement)]);
    elements
}

fn binary() -> Vec<RuleElement> {
    vec![
        attr(Field::Left),
        SPACE,
        attr(Field::Op),
        SPACE,
        attr(Field::Right),
    ]
}

fn es5_rules() -> Vec<(NodeType, Vec<RuleElement>)> {
    use Field as F;
    use NodeType as N;

    vec![
        (
            N::Program,
            vec![join(F::Children, vec![NEWLINE]), OPTIONAL_NEWLINE],
        ),
        (N::Block, body(F::Children)),
        (
            N::VarStatement,
            vec![
                text("var"),
                SPACE,
                join(F::Children, vec![text(","), SPACE]),
                SEMICOLON,
            ],
        ),
        (
            N::VarDeclList,
            vec![text("var"), SPACE, join(F::Children, vec![text(","), SPACE])],
        ),
        (
            N::VarDecl,
            vec![
                declare(F::Identifier),
                optional(
                    F::Initializer,
                    vec![SPACE, text("="), SPACE, attr(F::Initializer)],
                ),
            ],
        ),
        (N::EmptyStatement, vec![text(";")]),
        (N::ExprStatement, vec![attr(F::Expr), SEMICOLON]),
        (
            N::If,
            vec![
                text("if"),
                SPACE,
                text("("),
                attr(F::Predicate),
                text(")"),
                SPACE,
                attr(F::Consequent),
                optional(
                    F::Alternate,
                    vec![SPACE, text("else"), SPACE, attr(F::Alternate)],
                ),
            ],
        ),
        (
            N::DoWhile,
            vec![
                text("do"),
                SPACE,
                attr(F::Statement),
                SPACE,
                text("while"),
                SPACE,
                text("("),
                attr(F::Predicate),
                text(")"),
                SEMICOLON,
            ],
        ),
        (N::While, keyword_block("while", vec![attr(F::Predicate)])),
        (
            N::For,
            keyword_block(
                "for",
                vec![
                    attr(F::Init),
                    text(";"),
                    optional(F::Cond, vec![SPACE, attr(F::Cond)]),
                    text(";"),
                    optional(F::Count, vec![SPACE, attr(F::Count)]),
                ],
            ),
        ),
        (
            N::ForIn,
            keyword_block(
                "for",
                vec![
                    attr(F::Item),
                    SPACE,
                    text("in"),
                    SPACE,
                    attr(F::Iterable),
                ],
            ),
        ),
        (
            N::Continue,
            vec![
                text("continue"),
                optional(F::Identifier, vec![SPACE, attr(F::Identifier)]),
                SEMICOLON,
            ],
        ),
        (
            N::Break,
            vec![
                text("break"),
                optional(F::Identifier, vec![SPACE, attr(F::Identifier)]),
                SEMICOLON,
            ],
        ),
        (
            N::Return,
            vec![
                text("return"),
                optional(F::Expr, vec![SPACE, attr(F::Expr)]),
                SEMICOLON,
            ],
        ),
        (N::With, keyword_block("with", vec![attr(F::Expr)])),
        (
            N::Switch,
            vec![
                text("switch"),
                SPACE,
                text("("),
                attr(F::Expr),
                text(")"),
                SPACE,
                attr(F::CaseBlock),
            ],
        ),
        (N::CaseBlock, body(F::Children)),
        (
            N::Case,
            clause(vec![text("case"), SPACE, attr(F::Expr), text(":")]),
        ),
        (N::Default, clause(vec![text("default"), text(":")])),
        (
            N::Label,
            vec![attr(F::Identifier), text(":"), SPACE, attr(F::Statement)],
        ),
        (
            N::Throw,
            vec![text("throw"), SPACE, attr(F::Expr), SEMICOLON],
        ),
        (
            N::Try,
            vec![
                text("try"),
                SPACE,
                attr(F::Statements),
                optional(F::Catch, vec![SPACE, attr(F::Catch)]),
                optional(F::Fin, vec![SPACE, attr(F::Fin)]),
            ],
        ),
        (
            N::Catch,
            vec![
                text("catch"),
                SPACE,
                text("("),
                declare(F::Identifier),
                text(")"),
                SPACE,
                attr(F::Elements),
            ],
        ),
        (N::Finally, vec![text("finally"), SPACE, attr(F::Elements)]),
        (N::Debugger, vec![text("debugger"), SEMICOLON]),
        (
            N::FuncDecl,
            function(optional(
                F::Identifier,
                vec![SPACE, declare(F::Identifier)],
            )),
        ),
        (
            N::FuncExpr,
            function(optional(
                F::Identifier,
                vec![SPACE, declare(F::Identifier)],
            )),
        ),
        (N::Identifier, vec![RuleElement::Deferred(Arc::new(Resolve))]),
        (N::PropIdentifier, vec![attr(F::Value)]),
        (N::This, vec![text("this")]),
        (N::Null, vec![text("null")]),
        (N::Boolean, vec![attr(F::Value)]),
        (N::Number, vec![attr(F::Value)]),
        (N::String, vec![attr(F::Value)]),
        (N::Regex, vec![attr(F::Value)]),
        (
            N::Array,
            vec![
                text("["),
                RuleElement::Token(Token::ElisionJoinAttr(F::Items)),
                text("]"),
            ],
        ),
        (N::Elision, vec![attr(F::Value)]),
        (
            N::Object,
            vec![
                text("{"),
                optional(
                    F::Properties,
                    vec![
                        INDENT,
                        NEWLINE,
                        join(F::Properties, vec![text(","), NEWLINE]),
                        DEDENT,
                        NEWLINE,
                    ],
                ),
                text("}"),
            ],
        ),
        (
            N::Property,
            vec![attr(F::Left), text(":"), SPACE, attr(F::Right)],
        ),
        (N::GetPropAssign, {
            let mut elements = vec![
                text("get"),
                SPACE,
                attr(F::PropName),
                text("("),
                text(")"),
                SPACE,
            ];
            elements.extend(body(F::Elements));
            elements
        }),
        (N::SetPropAssign, {
            let mut elements = vec![
                text("set"),
                SPACE,
                attr(F::PropName),
                text("("),
                attr(F::Parameter),
                text(")"),
                SPACE,
            ];
            elements.extend(body(F::Elements));
            elements
        }),
        (
            N::NewExpr,
            vec![text("new"), SPACE, attr(F::Identifier), attr(F::Args)],
        ),
        (
            N::FunctionCall,
            vec![attr(F::Identifier), attr(F::Args)],
        ),
        (
            N::Arguments,
            vec![
                text("("),
                join(F::Items, vec![text(","), SPACE]),
                text(")"),
            ],
        ),
        (
            N::BracketAccessor,
            vec![attr(F::Node), text("["), attr(F::Expr), text("]")],
        ),
        (
            N::DotAccessor,
            vec![
                attr(F::Node),
                OPTIONAL_SPACE,
                text("."),
                attr(F::Identifier),
            ],
        ),
        (N::Assign, binary()),
        (N::BinOp, binary()),
        (
            N::Conditional,
            vec![
                attr(F::Predicate),
                SPACE,
                text("?"),
                SPACE,
                attr(F::Consequent),
                SPACE,
                text(":"),
                SPACE,
                attr(F::Alternate),
            ],
        ),
        (
            N::UnaryExpr,
            vec![attr(F::Op), OPTIONAL_SPACE, attr(F::Value)],
        ),
        (N::PostfixExpr, vec![attr(F::Value), attr(F::Op)]),
        (
            N::Comma,
            vec![attr(F::Left), text(","), SPACE, attr(F::Right)],
        ),
        (
            N::GroupingOp,
            vec![text("("), attr(F::Expr), text(")")],
        ),
        (N::TemplateLiteral, vec![join(F::Children, Vec::new())]),
        (N::TemplateNoSub, vec![attr(F::Value)]),
        (N::TemplateHead, vec![attr(F::Value)]),
        (N::TemplateMiddle, vec![attr(F::Value)]),
        (N::TemplateTail, vec![attr(F::Value)]),
        (
            N::Comments,
            vec![join(F::Comments, vec![NEWLINE]), NEWLINE],
        ),
        (N::BlockComment, vec![attr(F::Value)]),
        (N::LineComment, vec![attr(F::Value)]),
    ]
}

static ES5: Lazy<Result<Arc<Definitions>, RuleError>> =
    Lazy::new(|| Definitions::new(es5_rules()).map(Arc::new));

static ES5_MINIFY: Lazy<Result<Arc<Definitions>, RuleError>> = Lazy::new(|| {
    es5()
        .map(|definitions| definitions.without(NodeType::Comments))
        .map(Arc::new)
});

/// Rules for every ES5 node type
pub fn es5() -> Result<Arc<Definitions>, RuleError> {
    ES5.clone()
}

/// [`es5`] without comment output
pub fn es5_minify() -> Result<Arc<Definitions>, RuleError> {
    ES5_MINIFY.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_es5_covers_every_node_type() {
        let definitions = es5().unwrap();
        for node_type in NodeType::ALL {
            assert!(definitions.contains(*node_type), "no rule for {}", node_type);
        }
    }

    #[test]
    fn test_minify_has_no_comment_rule() {
        let definitions = es5_minify().unwrap();
        assert!(!definitions.contains(NodeType::Comments));
        assert_eq!(definitions.len() + 1, es5().unwrap().len());
    }

    #[test]
    fn test_missing_attribute_rejected() {
        let result = Definitions::new([(NodeType::Number, vec![attr(Field::Left)])]);
        assert_eq!(
            result.unwrap_err(),
            RuleError::MissingAttribute {
                node_type: "Number".into(),
                field: "left".into(),
            }
        );
    }

    #[test]
    fn test_nested_separator_checked() {
        let rule = vec![join(Field::Children, vec![attr(Field::Expr)])];
        assert!(Definitions::new([(NodeType::Program, rule)]).is_err());
    }

    #[test]
    fn test_deferred_field_checked() {
        let rule = vec![declare(Field::Identifier)];
        assert!(Definitions::new([(NodeType::Number, rule)]).is_err());
    }
}
