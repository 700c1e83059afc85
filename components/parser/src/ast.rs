//! Abstract Syntax Tree node definitions
//!
//! Every node type has a fixed, named set of children (its schema, see
//! [`NodeType::fields`]). Renderers address children by [`Field`] through
//! [`Node::get`], so the schema doubles as the attribute vocabulary of the
//! unparser rules.

use std::fmt;

use core_types::SourcePosition;

/// An AST node: its variant, where it starts and the comments around it.
///
/// Equality is structural and ignores positions and comments.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node variant with its children
    pub kind: NodeKind,
    /// Position of the first token of the production that built the node
    pub position: Option<SourcePosition>,
    /// Leading comments (a [`NodeKind::Comments`] node)
    pub comments: Option<Box<Node>>,
    /// Comments after the last token: on the same line, or before the
    /// closing `}` / end of input (a [`NodeKind::Comments`] node)
    pub trailing_comments: Option<Box<Node>>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// AST node variants
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Complete program
    Program {
        /// Source elements
        children: Vec<Node>,
    },
    /// `{ ... }` block statement
    Block {
        /// Statements
        children: Vec<Node>,
    },
    /// `var a = 1, b;`
    VarStatement {
        /// Declarations
        children: Vec<Node>,
    },
    /// `var a = 1, b` inside a `for` header
    VarDeclList {
        /// Declarations
        children: Vec<Node>,
    },
    /// Single declarator
    VarDecl {
        /// Declared identifier
        identifier: Box<Node>,
        /// Initial value
        initializer: Option<Box<Node>>,
    },
    /// `;`
    EmptyStatement,
    /// Expression statement
    ExprStatement {
        /// The expression
        expr: Box<Node>,
    },
    /// `if` statement
    If {
        /// Condition
        predicate: Box<Node>,
        /// Then branch
        consequent: Box<Node>,
        /// Else branch
        alternate: Option<Box<Node>>,
    },
    /// `do ... while (...)`
    DoWhile {
        /// Loop body
        statement: Box<Node>,
        /// Condition
        predicate: Box<Node>,
    },
    /// `while (...) ...`
    While {
        /// Condition
        predicate: Box<Node>,
        /// Loop body
        statement: Box<Node>,
    },
    /// `for (init; cond; count) ...`
    For {
        /// Initializer (a `VarDeclList` or an expression)
        init: Option<Box<Node>>,
        /// Test
        cond: Option<Box<Node>>,
        /// Update
        count: Option<Box<Node>>,
        /// Loop body
        statement: Box<Node>,
    },
    /// `for (item in iterable) ...`
    ForIn {
        /// Loop variable (a `VarDeclList` or a left-hand-side expression)
        item: Box<Node>,
        /// Object being enumerated
        iterable: Box<Node>,
        /// Loop body
        statement: Box<Node>,
    },
    /// `continue label;`
    Continue {
        /// Optional label
        identifier: Option<Box<Node>>,
    },
    /// `break label;`
    Break {
        /// Optional label
        identifier: Option<Box<Node>>,
    },
    /// `return expr;`
    Return {
        /// Optional value
        expr: Option<Box<Node>>,
    },
    /// `with (expr) ...`
    With {
        /// Scope object
        expr: Box<Node>,
        /// Body
        statement: Box<Node>,
    },
    /// `switch (expr) { ... }`
    Switch {
        /// Discriminant
        expr: Box<Node>,
        /// Clauses
        case_block: Box<Node>,
    },
    /// Clauses of a `switch`
    CaseBlock {
        /// `Case` and `Default` nodes
        children: Vec<Node>,
    },
    /// `case expr: ...`
    Case {
        /// Test
        expr: Box<Node>,
        /// Statements
        elements: Vec<Node>,
    },
    /// `default: ...`
    Default {
        /// Statements
        elements: Vec<Node>,
    },
    /// `label: statement`
    Label {
        /// Label name
        identifier: Box<Node>,
        /// Labelled statement
        statement: Box<Node>,
    },
    /// `throw expr;`
    Throw {
        /// Thrown value
        expr: Box<Node>,
    },
    /// `try { } catch (e) { } finally { }`
    Try {
        /// Protected block
        statements: Box<Node>,
        /// Catch clause
        catch: Option<Box<Node>>,
        /// Finally clause
        fin: Option<Box<Node>>,
    },
    /// `catch (e) { }`
    Catch {
        /// Exception binding
        identifier: Box<Node>,
        /// Handler block
        elements: Box<Node>,
    },
    /// `finally { }`
    Finally {
        /// Cleanup block
        elements: Box<Node>,
    },
    /// `debugger;`
    Debugger,
    /// Function declaration
    FuncDecl {
        /// Function name
        identifier: Box<Node>,
        /// Parameter identifiers
        parameters: Vec<Node>,
        /// Body source elements
        elements: Vec<Node>,
    },
    /// Function expression
    FuncExpr {
        /// Optional function name
        identifier: Option<Box<Node>>,
        /// Parameter identifiers
        parameters: Vec<Node>,
        /// Body source elements
        elements: Vec<Node>,
    },
    /// Identifier reference or binding
    Identifier {
        /// Name
        value: String,
    },
    /// Property name in a member access or object literal
    PropIdentifier {
        /// Name
        value: String,
    },
    /// `this`
    This,
    /// `null`
    Null,
    /// `true` / `false`
    Boolean {
        /// Raw text
        value: String,
    },
    /// Numeric literal
    Number {
        /// Raw text
        value: String,
    },
    /// String literal
    String {
        /// Raw text, quotes included
        value: String,
    },
    /// Regular expression literal
    Regex {
        /// Raw text, slashes and flags included
        value: String,
    },
    /// `[a, , b]`
    Array {
        /// Elements interleaved with `Elision` nodes
        items: Vec<Node>,
    },
    /// A run of holes in an array literal
    Elision {
        /// Number of holes
        value: usize,
    },
    /// `{ a: 1 }`
    Object {
        /// Property assignments
        properties: Vec<Node>,
    },
    /// `name: value`
    Property {
        /// Property name
        left: Box<Node>,
        /// Value
        right: Box<Node>,
    },
    /// `get name() { }`
    GetPropAssign {
        /// Property name
        prop_name: Box<Node>,
        /// Body source elements
        elements: Vec<Node>,
    },
    /// `set name(v) { }`
    SetPropAssign {
        /// Property name
        prop_name: Box<Node>,
        /// Setter parameter
        parameter: Box<Node>,
        /// Body source elements
        elements: Vec<Node>,
    },
    /// `new Foo(args)`
    NewExpr {
        /// Constructor expression
        identifier: Box<Node>,
        /// Arguments, absent for `new Foo`
        args: Option<Box<Node>>,
    },
    /// `callee(args)`
    FunctionCall {
        /// Callee
        identifier: Box<Node>,
        /// Arguments node
        args: Box<Node>,
    },
    /// Argument list
    Arguments {
        /// Argument expressions
        items: Vec<Node>,
    },
    /// `node[expr]`
    BracketAccessor {
        /// Object
        node: Box<Node>,
        /// Key expression
        expr: Box<Node>,
    },
    /// `node.identifier`
    DotAccessor {
        /// Object
        node: Box<Node>,
        /// Property name
        identifier: Box<Node>,
    },
    /// Assignment
    Assign {
        /// Operator
        op: AssignmentOperator,
        /// Target
        left: Box<Node>,
        /// Value
        right: Box<Node>,
    },
    /// `predicate ? consequent : alternate`
    Conditional {
        /// Condition
        predicate: Box<Node>,
        /// Value when true
        consequent: Box<Node>,
        /// Value when false
        alternate: Box<Node>,
    },
    /// Binary or logical operation
    BinOp {
        /// Operator
        op: BinaryOperator,
        /// Left operand
        left: Box<Node>,
        /// Right operand
        right: Box<Node>,
    },
    /// Prefix operation
    UnaryExpr {
        /// Operator
        op: UnaryOperator,
        /// Operand
        value: Box<Node>,
    },
    /// Postfix `++` / `--`
    PostfixExpr {
        /// Operator
        op: UpdateOperator,
        /// Operand
        value: Box<Node>,
    },
    /// `left, right`
    Comma {
        /// Left expression
        left: Box<Node>,
        /// Right expression
        right: Box<Node>,
    },
    /// Parenthesized expression
    GroupingOp {
        /// Inner expression
        expr: Box<Node>,
    },
    /// Template literal
    TemplateLiteral {
        /// Template parts interleaved with substitution expressions
        children: Vec<Node>,
    },
    /// `` `text` ``
    TemplateNoSub {
        /// Raw text
        value: String,
    },
    /// `` `text${ ``
    TemplateHead {
        /// Raw text
        value: String,
    },
    /// `}text${`
    TemplateMiddle {
        /// Raw text
        value: String,
    },
    /// `` }text` ``
    TemplateTail {
        /// Raw text
        value: String,
    },
    /// Comments leading or trailing a statement
    Comments {
        /// `BlockComment` and `LineComment` nodes
        comments: Vec<Node>,
    },
    /// `/* ... */`
    BlockComment {
        /// Raw text
        value: String,
    },
    /// `// ...`
    LineComment {
        /// Raw text
        value: String,
    },
}

/// Binary and logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Modulo
    Mod,
    /// Equality
    Eq,
    /// Inequality
    NotEq,
    /// Strict equality
    StrictEq,
    /// Strict inequality
    StrictNotEq,
    /// Less than
    Lt,
    /// Less than or equal
    LtEq,
    /// Greater than
    Gt,
    /// Greater than or equal
    GtEq,
    /// Bitwise AND
    BitwiseAnd,
    /// Bitwise OR
    BitwiseOr,
    /// Bitwise XOR
    BitwiseXor,
    /// Left shift
    LeftShift,
    /// Right shift
    RightShift,
    /// Unsigned right shift
    UnsignedRightShift,
    /// Instanceof
    Instanceof,
    /// In
    In,
    /// Logical AND
    And,
    /// Logical OR
    Or,
}

impl BinaryOperator {
    /// Source spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::StrictEq => "===",
            BinaryOperator::StrictNotEq => "!==",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
            BinaryOperator::UnsignedRightShift => ">>>",
            BinaryOperator::Instanceof => "instanceof",
            BinaryOperator::In => "in",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    /// Parse a source spelling
    pub fn from_str(op: &str) -> Option<Self> {
        let op = match op {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Sub,
            "*" => BinaryOperator::Mul,
            "/" => BinaryOperator::Div,
            "%" => BinaryOperator::Mod,
            "==" => BinaryOperator::Eq,
            "!=" => BinaryOperator::NotEq,
            "===" => BinaryOperator::StrictEq,
            "!==" => BinaryOperator::StrictNotEq,
            "<" => BinaryOperator::Lt,
            "<=" => BinaryOperator::LtEq,
            ">" => BinaryOperator::Gt,
            ">=" => BinaryOperator::GtEq,
            "&" => BinaryOperator::BitwiseAnd,
            "|" => BinaryOperator::BitwiseOr,
            "^" => BinaryOperator::BitwiseXor,
            "<<" => BinaryOperator::LeftShift,
            ">>" => BinaryOperator::RightShift,
            ">>>" => BinaryOperator::UnsignedRightShift,
            "instanceof" => BinaryOperator::Instanceof,
            "in" => BinaryOperator::In,
            "&&" => BinaryOperator::And,
            "||" => BinaryOperator::Or,
            _ => return None,
        };
        Some(op)
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Negate
    Minus,
    /// Plus (type coercion)
    Plus,
    /// Logical NOT
    Not,
    /// Bitwise NOT
    BitwiseNot,
    /// Typeof
    Typeof,
    /// Void
    Void,
    /// Delete
    Delete,
    /// Prefix increment
    Increment,
    /// Prefix decrement
    Decrement,
}

impl UnaryOperator {
    /// Source spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::Typeof => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
            UnaryOperator::Increment => "++",
            UnaryOperator::Decrement => "--",
        }
    }

    /// Parse a source spelling
    pub fn from_str(op: &str) -> Option<Self> {
        let op = match op {
            "-" => UnaryOperator::Minus,
            "+" => UnaryOperator::Plus,
            "!" => UnaryOperator::Not,
            "~" => UnaryOperator::BitwiseNot,
            "typeof" => UnaryOperator::Typeof,
            "void" => UnaryOperator::Void,
            "delete" => UnaryOperator::Delete,
            "++" => UnaryOperator::Increment,
            "--" => UnaryOperator::Decrement,
            _ => return None,
        };
        Some(op)
    }
}

/// Postfix update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    /// ++
    Increment,
    /// --
    Decrement,
}

impl UpdateOperator {
    /// Source spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    /// Simple assignment (=)
    Assign,
    /// +=
    AddAssign,
    /// -=
    SubAssign,
    /// *=
    MulAssign,
    /// /=
    DivAssign,
    /// %=
    ModAssign,
    /// <<=
    LeftShiftAssign,
    /// >>=
    RightShiftAssign,
    /// >>>=
    UnsignedRightShiftAssign,
    /// &=
    BitwiseAndAssign,
    /// |=
    BitwiseOrAssign,
    /// ^=
    BitwiseXorAssign,
}

impl AssignmentOperator {
    /// Source spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubAssign => "-=",
            AssignmentOperator::MulAssign => "*=",
            AssignmentOperator::DivAssign => "/=",
            AssignmentOperator::ModAssign => "%=",
            AssignmentOperator::LeftShiftAssign => "<<=",
            AssignmentOperator::RightShiftAssign => ">>=",
            AssignmentOperator::UnsignedRightShiftAssign => ">>>=",
            AssignmentOperator::BitwiseAndAssign => "&=",
            AssignmentOperator::BitwiseOrAssign => "|=",
            AssignmentOperator::BitwiseXorAssign => "^=",
        }
    }

    /// Parse a source spelling
    pub fn from_str(op: &str) -> Option<Self> {
        let op = match op {
            "=" => AssignmentOperator::Assign,
            "+=" => AssignmentOperator::AddAssign,
            "-=" => AssignmentOperator::SubAssign,
            "*=" => AssignmentOperator::MulAssign,
            "/=" => AssignmentOperator::DivAssign,
            "%=" => AssignmentOperator::ModAssign,
            "<<=" => AssignmentOperator::LeftShiftAssign,
            ">>=" => AssignmentOperator::RightShiftAssign,
            ">>>=" => AssignmentOperator::UnsignedRightShiftAssign,
            "&=" => AssignmentOperator::BitwiseAndAssign,
            "|=" => AssignmentOperator::BitwiseOrAssign,
            "^=" => AssignmentOperator::BitwiseXorAssign,
            _ => return None,
        };
        Some(op)
    }
}

macro_rules! fields {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal, )*) => {
        /// Named child slot of a node
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Field {
            $( $(#[$doc])* $variant, )*
        }

        impl Field {
            /// Every field name
            pub const ALL: &'static [Field] = &[ $( Field::$variant, )* ];

            /// Attribute name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Field::$variant => $name, )*
                }
            }

            /// Look up a field by attribute name
            pub fn from_name(name: &str) -> Option<Field> {
                match name {
                    $( $name => Some(Field::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

fields! {
    /// `children`
    Children => "children",
    /// `identifier`
    Identifier => "identifier",
    /// `initializer`
    Initializer => "initializer",
    /// `expr`
    Expr => "expr",
    /// `predicate`
    Predicate => "predicate",
    /// `consequent`
    Consequent => "consequent",
    /// `alternate`
    Alternate => "alternate",
    /// `statement`
    Statement => "statement",
    /// `init`
    Init => "init",
    /// `cond`
    Cond => "cond",
    /// `count`
    Count => "count",
    /// `item`
    Item => "item",
    /// `iterable`
    Iterable => "iterable",
    /// `case_block`
    CaseBlock => "case_block",
    /// `elements`
    Elements => "elements",
    /// `statements`
    Statements => "statements",
    /// `catch`
    Catch => "catch",
    /// `fin`
    Fin => "fin",
    /// `parameters`
    Parameters => "parameters",
    /// `value`
    Value => "value",
    /// `items`
    Items => "items",
    /// `properties`
    Properties => "properties",
    /// `left`
    Left => "left",
    /// `right`
    Right => "right",
    /// `prop_name`
    PropName => "prop_name",
    /// `parameter`
    Parameter => "parameter",
    /// `args`
    Args => "args",
    /// `node`
    Node => "node",
    /// `op`
    Op => "op",
    /// `comments`
    Comments => "comments",
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A child slot's content
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    /// A single node
    Node(&'a Node),
    /// A list of nodes
    Nodes(&'a [Node]),
    /// Terminal text (names, raw literals, operators)
    Text(&'a str),
    /// A count (elision holes)
    Count(usize),
    /// An optional child that is not present
    Absent,
}

impl<'a> Child<'a> {
    /// True for an absent child or an empty list
    pub fn is_empty(&self) -> bool {
        match self {
            Child::Absent => true,
            Child::Nodes(nodes) => nodes.is_empty(),
            _ => false,
        }
    }

    fn opt(node: &'a Option<Box<Node>>) -> Self {
        match node {
            Some(node) => Child::Node(node),
            None => Child::Absent,
        }
    }
}

/// Node type tags, one per [`NodeKind`] variant
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Program,
    Block,
    VarStatement,
    VarDeclList,
    VarDecl,
    EmptyStatement,
    ExprStatement,
    If,
    DoWhile,
    While,
    For,
    ForIn,
    Continue,
    Break,
    Return,
    With,
    Switch,
    CaseBlock,
    Case,
    Default,
    Label,
    Throw,
    Try,
    Catch,
    Finally,
    Debugger,
    FuncDecl,
    FuncExpr,
    Identifier,
    PropIdentifier,
    This,
    Null,
    Boolean,
    Number,
    String,
    Regex,
    Array,
    Elision,
    Object,
    Property,
    GetPropAssign,
    SetPropAssign,
    NewExpr,
    FunctionCall,
    Arguments,
    BracketAccessor,
    DotAccessor,
    Assign,
    Conditional,
    BinOp,
    UnaryExpr,
    PostfixExpr,
    Comma,
    GroupingOp,
    TemplateLiteral,
    TemplateNoSub,
    TemplateHead,
    TemplateMiddle,
    TemplateTail,
    Comments,
    BlockComment,
    LineComment,
}

impl NodeType {
    /// Every node type
    pub const ALL: &'static [NodeType] = &[
        NodeType::Program,
        NodeType::Block,
        NodeType::VarStatement,
        NodeType::VarDeclList,
        NodeType::VarDecl,
        NodeType::EmptyStatement,
        NodeType::ExprStatement,
        NodeType::If,
        NodeType::DoWhile,
        NodeType::While,
        NodeType::For,
        NodeType::ForIn,
        NodeType::Continue,
        NodeType::Break,
        NodeType::Return,
        NodeType::With,
        NodeType::Switch,
        NodeType::CaseBlock,
        NodeType::Case,
        NodeType::Default,
        NodeType::Label,
        NodeType::Throw,
        NodeType::Try,
        NodeType::Catch,
        NodeType::Finally,
        NodeType::Debugger,
        NodeType::FuncDecl,
        NodeType::FuncExpr,
        NodeType::Identifier,
        NodeType::PropIdentifier,
        NodeType::This,
        NodeType::Null,
        NodeType::Boolean,
        NodeType::Number,
        NodeType::String,
        NodeType::Regex,
        NodeType::Array,
        NodeType::Elision,
        NodeType::Object,
        NodeType::Property,
        NodeType::GetPropAssign,
        NodeType::SetPropAssign,
        NodeType::NewExpr,
        NodeType::FunctionCall,
        NodeType::Arguments,
        NodeType::BracketAccessor,
        NodeType::DotAccessor,
        NodeType::Assign,
        NodeType::Conditional,
        NodeType::BinOp,
        NodeType::UnaryExpr,
        NodeType::PostfixExpr,
        NodeType::Comma,
        NodeType::GroupingOp,
        NodeType::TemplateLiteral,
        NodeType::TemplateNoSub,
        NodeType::TemplateHead,
        NodeType::TemplateMiddle,
        NodeType::TemplateTail,
        NodeType::Comments,
        NodeType::BlockComment,
        NodeType::LineComment,
    ];

    /// Stable type name
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::Program => "Program",
            NodeType::Block => "Block",
            NodeType::VarStatement => "VarStatement",
            NodeType::VarDeclList => "VarDeclList",
            NodeType::VarDecl => "VarDecl",
            NodeType::EmptyStatement => "EmptyStatement",
            NodeType::ExprStatement => "ExprStatement",
            NodeType::If => "If",
            NodeType::DoWhile => "DoWhile",
            NodeType::While => "While",
            NodeType::For => "For",
            NodeType::ForIn => "ForIn",
            NodeType::Continue => "Continue",
            NodeType::Break => "Break",
            NodeType::Return => "Return",
            NodeType::With => "With",
            NodeType::Switch => "Switch",
            NodeType::CaseBlock => "CaseBlock",
            NodeType::Case => "Case",
            NodeType::Default => "Default",
            NodeType::Label => "Label",
            NodeType::Throw => "Throw",
            NodeType::Try => "Try",
            NodeType::Catch => "Catch",
            NodeType::Finally => "Finally",
            NodeType::Debugger => "Debugger",
            NodeType::FuncDecl => "FuncDecl",
            NodeType::FuncExpr => "FuncExpr",
            NodeType::Identifier => "Identifier",
            NodeType::PropIdentifier => "PropIdentifier",
            NodeType::This => "This",
            NodeType::Null => "Null",
            NodeType::Boolean => "Boolean",
            NodeType::Number => "Number",
            NodeType::String => "String",
            NodeType::Regex => "Regex",
            NodeType::Array => "Array",
            NodeType::Elision => "Elision",
            NodeType::Object => "Object",
            NodeType::Property => "Property",
            NodeType::GetPropAssign => "GetPropAssign",
            NodeType::SetPropAssign => "SetPropAssign",
            NodeType::NewExpr => "NewExpr",
            NodeType::FunctionCall => "FunctionCall",
            NodeType::Arguments => "Arguments",
            NodeType::BracketAccessor => "BracketAccessor",
            NodeType::DotAccessor => "DotAccessor",
            NodeType::Assign => "Assign",
            NodeType::Conditional => "Conditional",
            NodeType::BinOp => "BinOp",
            NodeType::UnaryExpr => "UnaryExpr",
            NodeType::PostfixExpr => "PostfixExpr",
            NodeType::Comma => "Comma",
            NodeType::GroupingOp => "GroupingOp",
            NodeType::TemplateLiteral => "TemplateLiteral",
            NodeType::TemplateNoSub => "TemplateNoSub",
            NodeType::TemplateHead => "TemplateHead",
            NodeType::TemplateMiddle => "TemplateMiddle",
            NodeType::TemplateTail => "TemplateTail",
            NodeType::Comments => "Comments",
            NodeType::BlockComment => "BlockComment",
            NodeType::LineComment => "LineComment",
        }
    }

    /// Look up a node type by name
    pub fn from_name(name: &str) -> Option<NodeType> {
        NodeType::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// The fixed child schema of this node type, in rendering order
    pub fn fields(&self) -> &'static [Field] {
        use Field as F;
        match self {
            NodeType::Program
            | NodeType::Block
            | NodeType::VarStatement
            | NodeType::VarDeclList
            | NodeType::CaseBlock
            | NodeType::TemplateLiteral => &[F::Children],
            NodeType::VarDecl => &[F::Identifier, F::Initializer],
            NodeType::EmptyStatement
            | NodeType::Debugger
            | NodeType::This
            | NodeType::Null => &[],
            NodeType::ExprStatement
            | NodeType::Return
            | NodeType::Throw
            | NodeType::GroupingOp => &[F::Expr],
            NodeType::If | NodeType::Conditional => &[F::Predicate, F::Consequent, F::Alternate],
            NodeType::DoWhile => &[F::Statement, F::Predicate],
            NodeType::While => &[F::Predicate, F::Statement],
            NodeType::For => &[F::Init, F::Cond, F::Count, F::Statement],
            NodeType::ForIn => &[F::Item, F::Iterable, F::Statement],
            NodeType::Continue | NodeType::Break => &[F::Identifier],
            NodeType::With => &[F::Expr, F::Statement],
            NodeType::Switch => &[F::Expr, F::CaseBlock],
            NodeType::Case => &[F::Expr, F::Elements],
            NodeType::Default | NodeType::Finally => &[F::Elements],
            NodeType::Label => &[F::Identifier, F::Statement],
            NodeType::Try => &[F::Statements, F::Catch, F::Fin],
            NodeType::Catch => &[F::Identifier, F::Elements],
            NodeType::FuncDecl | NodeType::FuncExpr => {
                &[F::Identifier, F::Parameters, F::Elements]
            }
            NodeType::Identifier
            | NodeType::PropIdentifier
            | NodeType::Boolean
            | NodeType::Number
            | NodeType::String
            | NodeType::Regex
            | NodeType::Elision
            | NodeType::TemplateNoSub
            | NodeType::TemplateHead
            | NodeType::TemplateMiddle
            | NodeType::TemplateTail
            | NodeType::BlockComment
            | NodeType::LineComment => &[F::Value],
            NodeType::Array | NodeType::Arguments => &[F::Items],
            NodeType::Object => &[F::Properties],
            NodeType::Property | NodeType::Comma => &[F::Left, F::Right],
            NodeType::GetPropAssign => &[F::PropName, F::Elements],
            NodeType::SetPropAssign => &[F::PropName, F::Parameter, F::Elements],
            NodeType::NewExpr | NodeType::FunctionCall => &[F::Identifier, F::Args],
            NodeType::BracketAccessor => &[F::Node, F::Expr],
            NodeType::DotAccessor => &[F::Node, F::Identifier],
            NodeType::Assign | NodeType::BinOp => &[F::Op, F::Left, F::Right],
            NodeType::UnaryExpr | NodeType::PostfixExpr => &[F::Op, F::Value],
            NodeType::Comments => &[F::Comments],
        }
    }

    /// True when `field` belongs to this node type's schema
    pub fn has_field(&self, field: Field) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Node {
    /// Create a node without position or comments
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            position: None,
            comments: None,
            trailing_comments: None,
        }
    }

    /// Create a node at a position
    pub fn at(kind: NodeKind, position: Option<SourcePosition>) -> Self {
        Self {
            kind,
            position,
            comments: None,
            trailing_comments: None,
        }
    }

    /// Identifier node helper
    pub fn identifier(name: impl Into<String>) -> Self {
        Node::new(NodeKind::Identifier { value: name.into() })
    }

    /// Type tag of this node
    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Program { .. } => NodeType::Program,
            NodeKind::Block { .. } => NodeType::Block,
            NodeKind::VarStatement { .. } => NodeType::VarStatement,
            NodeKind::VarDeclList { .. } => NodeType::VarDeclList,
            NodeKind::VarDecl { .. } => NodeType::VarDecl,
            NodeKind::EmptyStatement => NodeType::EmptyStatement,
            NodeKind::ExprStatement { .. } => NodeType::ExprStatement,
            NodeKind::If { .. } => NodeType::If,
            NodeKind::DoWhile { .. } => NodeType::DoWhile,
            NodeKind::While { .. } => NodeType::While,
            NodeKind::For { .. } => NodeType::For,
            NodeKind::ForIn { .. } => NodeType::ForIn,
            NodeKind::Continue { .. } => NodeType::Continue,
            NodeKind::Break { .. } => NodeType::Break,
            NodeKind::Return { .. } => NodeType::Return,
            NodeKind::With { .. } => NodeType::With,
            NodeKind::Switch { .. } => NodeType::Switch,
            NodeKind::CaseBlock { .. } => NodeType::CaseBlock,
            NodeKind::Case { .. } => NodeType::Case,
            NodeKind::Default { .. } => NodeType::Default,
            NodeKind::Label { .. } => NodeType::Label,
            NodeKind::Throw { .. } => NodeType::Throw,
            NodeKind::Try { .. } => NodeType::Try,
            NodeKind::Catch { .. } => NodeType::Catch,
            NodeKind::Finally { .. } => NodeType::Finally,
            NodeKind::Debugger => NodeType::Debugger,
            NodeKind::FuncDecl { .. } => NodeType::FuncDecl,
            NodeKind::FuncExpr { .. } => NodeType::FuncExpr,
            NodeKind::Identifier { .. } => NodeType::Identifier,
            NodeKind::PropIdentifier { .. } => NodeType::PropIdentifier,
            NodeKind::This => NodeType::This,
            NodeKind::Null => NodeType::Null,
            NodeKind::Boolean { .. } => NodeType::Boolean,
            NodeKind::Number { .. } => NodeType::Number,
            NodeKind::String { .. } => NodeType::String,
            NodeKind::Regex { .. } => NodeType::Regex,
            NodeKind::Array { .. } => NodeType::Array,
            NodeKind::Elision { .. } => NodeType::Elision,
            NodeKind::Object { .. } => NodeType::Object,
            NodeKind::Property { .. } => NodeType::Property,
            NodeKind::GetPropAssign { .. } => NodeType::GetPropAssign,
            NodeKind::SetPropAssign { .. } => NodeType::SetPropAssign,
            NodeKind::NewExpr { .. } => NodeType::NewExpr,
            NodeKind::FunctionCall { .. } => NodeType::FunctionCall,
            NodeKind::Arguments { .. } => NodeType::Arguments,
            NodeKind::BracketAccessor { .. } => NodeType::BracketAccessor,
            NodeKind::DotAccessor { .. } => NodeType::DotAccessor,
            NodeKind::Assign { .. } => NodeType::Assign,
            NodeKind::Conditional { .. } => NodeType::Conditional,
            NodeKind::BinOp { .. } => NodeType::BinOp,
            NodeKind::UnaryExpr { .. } => NodeType::UnaryExpr,
            NodeKind::PostfixExpr { .. } => NodeType::PostfixExpr,
            NodeKind::Comma { .. } => NodeType::Comma,
            NodeKind::GroupingOp { .. } => NodeType::GroupingOp,
            NodeKind::TemplateLiteral { .. } => NodeType::TemplateLiteral,
            NodeKind::TemplateNoSub { .. } => NodeType::TemplateNoSub,
            NodeKind::TemplateHead { .. } => NodeType::TemplateHead,
            NodeKind::TemplateMiddle { .. } => NodeType::TemplateMiddle,
            NodeKind::TemplateTail { .. } => NodeType::TemplateTail,
            NodeKind::Comments { .. } => NodeType::Comments,
            NodeKind::BlockComment { .. } => NodeType::BlockComment,
            NodeKind::LineComment { .. } => NodeType::LineComment,
        }
    }

    /// Named-child access. Fields outside the node's schema are `Absent`.
    pub fn get(&self, field: Field) -> Child<'_> {
        use Field as F;
        use NodeKind as K;
        match (&self.kind, field) {
            (
                K::Program { children }
                | K::Block { children }
                | K::VarStatement { children }
                | K::VarDeclList { children }
                | K::CaseBlock { children }
                | K::TemplateLiteral { children },
                F::Children,
            ) => Child::Nodes(children),

            (K::VarDecl { identifier, .. }, F::Identifier) => Child::Node(identifier),
            (K::VarDecl { initializer, .. }, F::Initializer) => Child::opt(initializer),

            (
                K::ExprStatement { expr }
                | K::Throw { expr }
                | K::GroupingOp { expr }
                | K::With { expr, .. }
                | K::Switch { expr, .. }
                | K::Case { expr, .. }
                | K::BracketAccessor { expr, .. },
                F::Expr,
            ) => Child::Node(expr),
            (K::Return { expr }, F::Expr) => Child::opt(expr),

            (
                K::If { predicate, .. }
                | K::DoWhile { predicate, .. }
                | K::While { predicate, .. }
                | K::Conditional { predicate, .. },
                F::Predicate,
            ) => Child::Node(predicate),
            (
                K::If { consequent, .. } | K::Conditional { consequent, .. },
                F::Consequent,
            ) => Child::Node(consequent),
            (K::If { alternate, .. }, F::Alternate) => Child::opt(alternate),
            (K::Conditional { alternate, .. }, F::Alternate) => Child::Node(alternate),

            (
                K::DoWhile { statement, .. }
                | K::While { statement, .. }
                | K::For { statement, .. }
                | K::ForIn { statement, .. }
                | K::With { statement, .. }
                | K::Label { statement, .. },
                F::Statement,
            ) => Child::Node(statement),

            (K::For { init, .. }, F::Init) => Child::opt(init),
            (K::For { cond, .. }, F::Cond) => Child::opt(cond),
            (K::For { count, .. }, F::Count) => Child::opt(count),
            (K::ForIn { item, .. }, F::Item) => Child::Node(item),
            (K::ForIn { iterable, .. }, F::Iterable) => Child::Node(iterable),

            (
                K::Continue { identifier } | K::Break { identifier },
                F::Identifier,
            ) => Child::opt(identifier),
            (K::FuncExpr { identifier, .. }, F::Identifier) => Child::opt(identifier),
            (
                K::Label { identifier, .. }
                | K::Catch { identifier, .. }
                | K::FuncDecl { identifier, .. }
                | K::NewExpr { identifier, .. }
                | K::FunctionCall { identifier, .. }
                | K::DotAccessor { identifier, .. },
                F::Identifier,
            ) => Child::Node(identifier),

            (K::Switch { case_block, .. }, F::CaseBlock) => Child::Node(case_block),
            (
                K::Case { elements, .. }
                | K::Default { elements }
                | K::FuncDecl { elements, .. }
                | K::FuncExpr { elements, .. }
                | K::GetPropAssign { elements, .. }
                | K::SetPropAssign { elements, .. },
                F::Elements,
            ) => Child::Nodes(elements),
            (K::Catch { elements, .. } | K::Finally { elements }, F::Elements) => {
                Child::Node(elements)
            }

            (K::Try { statements, .. }, F::Statements) => Child::Node(statements),
            (K::Try { catch, .. }, F::Catch) => Child::opt(catch),
            (K::Try { fin, .. }, F::Fin) => Child::opt(fin),

            (
                K::FuncDecl { parameters, .. } | K::FuncExpr { parameters, .. },
                F::Parameters,
            ) => Child::Nodes(parameters),

            (
                K::Identifier { value }
                | K::PropIdentifier { value }
                | K::Boolean { value }
                | K::Number { value }
                | K::String { value }
                | K::Regex { value }
                | K::TemplateNoSub { value }
                | K::TemplateHead { value }
                | K::TemplateMiddle { value }
                | K::TemplateTail { value }
                | K::BlockComment { value }
                | K::LineComment { value },
                F::Value,
            ) => Child::Text(value),
            (K::Elision { value }, F::Value) => Child::Count(*value),
            (K::UnaryExpr { value, .. } | K::PostfixExpr { value, .. }, F::Value) => {
                Child::Node(value)
            }

            (K::Array { items } | K::Arguments { items }, F::Items) => Child::Nodes(items),
            (K::Object { properties }, F::Properties) => Child::Nodes(properties),

            (
                K::Property { left, .. }
                | K::Comma { left, .. }
                | K::Assign { left, .. }
                | K::BinOp { left, .. },
                F::Left,
            ) => Child::Node(left),
            (
                K::Property { right, .. }
                | K::Comma { right, .. }
                | K::Assign { right, .. }
                | K::BinOp { right, .. },
                F::Right,
            ) => Child::Node(right),

            (
                K::GetPropAssign { prop_name, .. } | K::SetPropAssign { prop_name, .. },
                F::PropName,
            ) => Child::Node(prop_name),
            (K::SetPropAssign { parameter, .. }, F::Parameter) => Child::Node(parameter),

            (K::NewExpr { args, .. }, F::Args) => Child::opt(args),
            (K::FunctionCall { args, .. }, F::Args) => Child::Node(args),

            (K::BracketAccessor { node, .. } | K::DotAccessor { node, .. }, F::Node) => {
                Child::Node(node)
            }

            (K::Assign { op, .. }, F::Op) => Child::Text(op.as_str()),
            (K::BinOp { op, .. }, F::Op) => Child::Text(op.as_str()),
            (K::UnaryExpr { op, .. }, F::Op) => Child::Text(op.as_str()),
            (K::PostfixExpr { op, .. }, F::Op) => Child::Text(op.as_str()),

            (K::Comments { comments }, F::Comments) => Child::Nodes(comments),

            _ => Child::Absent,
        }
    }

    /// Terminal text of identifier-like and literal nodes
    pub fn value(&self) -> Option<&str> {
        match self.get(Field::Value) {
            Child::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Child nodes in schema order
    pub fn children(&self) -> Vec<&Node> {
        let mut nodes = Vec::new();
        for field in self.node_type().fields() {
            match self.get(*field) {
                Child::Node(node) => nodes.push(node),
                Child::Nodes(list) => nodes.extend(list.iter()),
                _ => {}
            }
        }
        nodes
    }

    /// Debugging representation of the subtree
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.node_type().name());
        if let Some(position) = self.position {
            out.push_str(&format!(" @{}", position));
        }
        let mut first = true;
        for field in self.node_type().fields() {
            out.push_str(if first { " " } else { ", " });
            first = false;
            out.push_str(field.as_str());
            out.push('=');
            match self.get(*field) {
                Child::Node(node) => node.write_repr(out),
                Child::Nodes(nodes) => {
                    out.push('[');
                    for (i, node) in nodes.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        node.write_repr(out);
                    }
                    out.push(']');
                }
                Child::Text(text) => out.push_str(&format!("{:?}", text)),
                Child::Count(count) => out.push_str(&count.to_string()),
                Child::Absent => out.push_str("None"),
            }
        }
        out.push('>');
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: &str) -> Node {
        Node::new(NodeKind::Number {
            value: value.to_string(),
        })
    }

    #[test]
    fn test_binary_expression() {
        let expr = Node::new(NodeKind::BinOp {
            op: BinaryOperator::Add,
            left: Box::new(number("1")),
            right: Box::new(number("2")),
        });
        assert_eq!(expr.node_type(), NodeType::BinOp);
        assert!(matches!(expr.get(Field::Op), Child::Text("+")));
        assert_eq!(expr.children().len(), 2);
    }

    #[test]
    fn test_equality_ignores_position() {
        let a = Node::at(
            NodeKind::Identifier {
                value: "x".to_string(),
            },
            Some(SourcePosition::new(1, 1, 0)),
        );
        let b = Node::identifier("x");
        assert_eq!(a, b);
        assert_ne!(a, Node::identifier("y"));
    }

    #[test]
    fn test_optional_child_absent() {
        let stmt = Node::new(NodeKind::Return { expr: None });
        assert!(matches!(stmt.get(Field::Expr), Child::Absent));
        assert!(stmt.get(Field::Expr).is_empty());
    }

    #[test]
    fn test_field_outside_schema_is_absent() {
        let node = Node::identifier("x");
        assert!(matches!(node.get(Field::Left), Child::Absent));
        assert!(!NodeType::Identifier.has_field(Field::Left));
    }

    #[test]
    fn test_node_type_names_round_trip() {
        for node_type in NodeType::ALL {
            assert_eq!(NodeType::from_name(node_type.name()), Some(*node_type));
        }
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.as_str()), Some(*field));
        }
        assert_eq!(Field::from_name("nope"), None);
    }

    #[test]
    fn test_repr() {
        let node = Node::at(
            NodeKind::ExprStatement {
                expr: Box::new(Node::identifier("a")),
            },
            Some(SourcePosition::new(1, 1, 0)),
        );
        assert_eq!(node.repr(), "<ExprStatement @1:1 expr=<Identifier value=\"a\">>");
    }

    #[test]
    fn test_operator_spellings() {
        assert_eq!(BinaryOperator::from_str(">>>"), Some(BinaryOperator::UnsignedRightShift));
        assert_eq!(AssignmentOperator::from_str("|="), Some(AssignmentOperator::BitwiseOrAssign));
        assert_eq!(UnaryOperator::from_str("typeof").map(|o| o.as_str()), Some("typeof"));
    }
}
