//! Token kinds and token records produced by the lexer.
//!
//! Terminal names (`"ID"`, `"LBRACE"`, `"AUTOSEMI"`, ...) double as the
//! terminal vocabulary of the grammar, so [`TokenKind::from_name`] is how
//! grammar productions refer to terminals.

use core_types::SourcePosition;

macro_rules! token_kinds {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal, )*) => {
        /// Kind of a lexical token (and grammar terminal)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum TokenKind {
            $( $(#[$doc])* $variant, )*
        }

        impl TokenKind {
            /// Every token kind, in declaration order
            pub const ALL: &'static [TokenKind] = &[ $( TokenKind::$variant, )* ];

            /// Terminal name used by the grammar
            pub fn name(&self) -> &'static str {
                match self {
                    $( TokenKind::$variant => $name, )*
                }
            }

            /// Look up a token kind by its terminal name
            pub fn from_name(name: &str) -> Option<TokenKind> {
                match name {
                    $( $name => Some(TokenKind::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

token_kinds! {
    /// `break`
    Break => "BREAK",
    /// `case`
    Case => "CASE",
    /// `catch`
    Catch => "CATCH",
    /// `continue`
    Continue => "CONTINUE",
    /// `debugger`
    Debugger => "DEBUGGER",
    /// `default`
    Default => "DEFAULT",
    /// `delete`
    Delete => "DELETE",
    /// `do`
    Do => "DO",
    /// `else`
    Else => "ELSE",
    /// `finally`
    Finally => "FINALLY",
    /// `for`
    For => "FOR",
    /// `function`
    Function => "FUNCTION",
    /// `if`
    If => "IF",
    /// `in`
    In => "IN",
    /// `instanceof`
    Instanceof => "INSTANCEOF",
    /// `new`
    New => "NEW",
    /// `return`
    Return => "RETURN",
    /// `switch`
    Switch => "SWITCH",
    /// `this`
    This => "THIS",
    /// `throw`
    Throw => "THROW",
    /// `try`
    Try => "TRY",
    /// `typeof`
    Typeof => "TYPEOF",
    /// `var`
    Var => "VAR",
    /// `void`
    Void => "VOID",
    /// `while`
    While => "WHILE",
    /// `with`
    With => "WITH",
    /// `null`
    Null => "NULL",
    /// `true`
    True => "TRUE",
    /// `false`
    False => "FALSE",
    /// `class` (future reserved word)
    Class => "CLASS",
    /// `const` (future reserved word)
    Const => "CONST",
    /// `enum` (future reserved word)
    Enum => "ENUM",
    /// `export` (future reserved word)
    Export => "EXPORT",
    /// `extends` (future reserved word)
    Extends => "EXTENDS",
    /// `import` (future reserved word)
    Import => "IMPORT",
    /// `super` (future reserved word)
    Super => "SUPER",

    /// `.`
    Period => "PERIOD",
    /// `,`
    Comma => "COMMA",
    /// `;`
    Semi => "SEMI",
    /// `:`
    Colon => "COLON",
    /// `+`
    Plus => "PLUS",
    /// `-`
    Minus => "MINUS",
    /// `*`
    Mult => "MULT",
    /// `/`
    Div => "DIV",
    /// `%`
    Mod => "MOD",
    /// `&`
    BAnd => "BAND",
    /// `|`
    BOr => "BOR",
    /// `^`
    BXor => "BXOR",
    /// `~`
    BNot => "BNOT",
    /// `?`
    CondOp => "CONDOP",
    /// `!`
    Not => "NOT",
    /// `(`
    LParen => "LPAREN",
    /// `)`
    RParen => "RPAREN",
    /// `{`
    LBrace => "LBRACE",
    /// `}`
    RBrace => "RBRACE",
    /// `[`
    LBracket => "LBRACKET",
    /// `]`
    RBracket => "RBRACKET",
    /// `=`
    Eq => "EQ",
    /// `==`
    EqEq => "EQEQ",
    /// `!=`
    Ne => "NE",
    /// `===`
    StrEq => "STREQ",
    /// `!==`
    StrNeq => "STRNEQ",
    /// `<`
    Lt => "LT",
    /// `>`
    Gt => "GT",
    /// `<=`
    Le => "LE",
    /// `>=`
    Ge => "GE",
    /// `||`
    Or => "OR",
    /// `&&`
    And => "AND",
    /// `++`
    PlusPlus => "PLUSPLUS",
    /// `--`
    MinusMinus => "MINUSMINUS",
    /// `<<`
    LShift => "LSHIFT",
    /// `>>`
    RShift => "RSHIFT",
    /// `>>>`
    URShift => "URSHIFT",
    /// `+=`
    PlusEqual => "PLUSEQUAL",
    /// `-=`
    MinusEqual => "MINUSEQUAL",
    /// `*=`
    MultEqual => "MULTEQUAL",
    /// `/=`
    DivEqual => "DIVEQUAL",
    /// `<<=`
    LShiftEqual => "LSHIFTEQUAL",
    /// `>>=`
    RShiftEqual => "RSHIFTEQUAL",
    /// `>>>=`
    URShiftEqual => "URSHIFTEQUAL",
    /// `&=`
    AndEqual => "ANDEQUAL",
    /// `%=`
    ModEqual => "MODEQUAL",
    /// `^=`
    XorEqual => "XOREQUAL",
    /// `|=`
    OrEqual => "OREQUAL",

    /// Identifier name
    Id => "ID",
    /// Numeric literal
    Number => "NUMBER",
    /// String literal
    String => "STRING",
    /// Regular expression literal
    Regex => "REGEX",
    /// Template literal without substitutions
    TemplateNoSub => "TEMPLATE_NOSUB",
    /// Template literal text up to the first `${`
    TemplateHead => "TEMPLATE_HEAD",
    /// Template literal text between two substitutions
    TemplateMiddle => "TEMPLATE_MIDDLE",
    /// Template literal text after the last substitution
    TemplateTail => "TEMPLATE_TAIL",

    /// `// ...`
    LineComment => "LINE_COMMENT",
    /// `/* ... */`
    BlockComment => "BLOCK_COMMENT",

    /// Semicolon inserted by automatic semicolon insertion
    AutoSemi => "AUTOSEMI",
    /// `++` preceded by a line terminator
    PlusPlusNl => "PLUSPLUS_NL",
    /// `--` preceded by a line terminator
    MinusMinusNl => "MINUSMINUS_NL",
    /// End of input
    Eof => "EOF",
}

impl TokenKind {
    /// Map a reserved word to its token kind
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "catch" => TokenKind::Catch,
            "continue" => TokenKind::Continue,
            "debugger" => TokenKind::Debugger,
            "default" => TokenKind::Default,
            "delete" => TokenKind::Delete,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::Instanceof,
            "new" => TokenKind::New,
            "return" => TokenKind::Return,
            "switch" => TokenKind::Switch,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "with" => TokenKind::With,
            "null" => TokenKind::Null,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "class" => TokenKind::Class,
            "const" => TokenKind::Const,
            "enum" => TokenKind::Enum,
            "export" => TokenKind::Export,
            "extends" => TokenKind::Extends,
            "import" => TokenKind::Import,
            "super" => TokenKind::Super,
            _ => return None,
        };
        Some(kind)
    }

    /// Fixed spelling of keywords and punctuators
    pub fn spelling(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Continue => "continue",
            TokenKind::Debugger => "debugger",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::New => "new",
            TokenKind::Return => "return",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::With => "with",
            TokenKind::Null => "null",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Class => "class",
            TokenKind::Const => "const",
            TokenKind::Enum => "enum",
            TokenKind::Export => "export",
            TokenKind::Extends => "extends",
            TokenKind::Import => "import",
            TokenKind::Super => "super",
            TokenKind::Period => ".",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Colon => ":",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Mult => "*",
            TokenKind::Div => "/",
            TokenKind::Mod => "%",
            TokenKind::BAnd => "&",
            TokenKind::BOr => "|",
            TokenKind::BXor => "^",
            TokenKind::BNot => "~",
            TokenKind::CondOp => "?",
            TokenKind::Not => "!",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::StrEq => "===",
            TokenKind::StrNeq => "!==",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::Or => "||",
            TokenKind::And => "&&",
            TokenKind::PlusPlus | TokenKind::PlusPlusNl => "++",
            TokenKind::MinusMinus | TokenKind::MinusMinusNl => "--",
            TokenKind::LShift => "<<",
            TokenKind::RShift => ">>",
            TokenKind::URShift => ">>>",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::MultEqual => "*=",
            TokenKind::DivEqual => "/=",
            TokenKind::LShiftEqual => "<<=",
            TokenKind::RShiftEqual => ">>=",
            TokenKind::URShiftEqual => ">>>=",
            TokenKind::AndEqual => "&=",
            TokenKind::ModEqual => "%=",
            TokenKind::XorEqual => "^=",
            TokenKind::OrEqual => "|=",
            _ => return None,
        };
        Some(text)
    }

    /// True for reserved words, including literals and future reserved words
    pub fn is_keyword(&self) -> bool {
        *self <= TokenKind::Super
    }

    /// True for comment tokens
    pub fn is_comment(&self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// True for terminals the lexer never produces
    pub fn is_virtual(&self) -> bool {
        matches!(
            self,
            TokenKind::AutoSemi | TokenKind::PlusPlusNl | TokenKind::MinusMinusNl
        )
    }

    /// True when a `/` following this token is a division operator
    pub fn implies_division(&self) -> bool {
        matches!(
            self,
            TokenKind::Id
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::Regex
                | TokenKind::TemplateNoSub
                | TokenKind::TemplateTail
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,
    /// Raw lexeme as it appears in the source
    pub value: String,
    /// Position of the first character of the lexeme
    pub position: SourcePosition,
    /// A line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

impl Token {
    /// Create a token
    pub fn new(kind: TokenKind, value: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
            newline_before: false,
        }
    }

    /// 1-based line of the token
    pub fn line(&self) -> u32 {
        self.position.line
    }

    /// 1-based column of the token
    pub fn column(&self) -> u32 {
        self.position.column
    }

    /// Character offset of the token
    pub fn offset(&self) -> usize {
        self.position.offset
    }

    /// Printable description used in error messages
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.value),
        }
    }
}
