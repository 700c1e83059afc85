//! ECMAScript lexer - tokenizes source code into tokens
//!
//! Covers the ES5 lexical grammar plus ES2015 template literals. The lexer
//! is a lazy [`Iterator`] over `Result<Token, JsError>`; a lexical error
//! ends the session.

use core_types::{ErrorKind, JsError, JsResult, SourcePosition};
use serde::{Deserialize, Serialize};

use crate::error::{illegal_character, lexical_error};
use crate::token::{Token, TokenKind};

/// Options controlling the lexer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexerOptions {
    /// Emit comment tokens instead of discarding them
    pub with_comments: bool,
}

/// An open template literal awaiting the `}` that closes a substitution
#[derive(Debug, Clone, Copy)]
struct OpenTemplate {
    /// Unclosed `{` nested inside the current substitution
    depth: u32,
    /// Position of the opening backtick
    start: SourcePosition,
}

/// Lexer for ECMAScript source code
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    options: LexerOptions,
    /// A line terminator was seen since the last significant token
    newline_pending: bool,
    /// Kind of the last significant token, for regex/divide disambiguation
    previous: Option<TokenKind>,
    templates: Vec<OpenTemplate>,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self::with_options(source, LexerOptions::default())
    }

    /// Create a lexer with explicit options
    pub fn with_options(source: &str, options: LexerOptions) -> Self {
        let mut lexer = Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            options,
            newline_pending: false,
            previous: None,
            templates: Vec::new(),
            finished: false,
        };
        lexer.skip_hashbang();
        lexer
    }

    /// Tokenize a whole source, stopping at the first error
    pub fn tokenize(source: &str) -> JsResult<Vec<Token>> {
        Lexer::new(source).collect()
    }

    /// Skip hashbang comment (#!) at the beginning of the source
    fn skip_hashbang(&mut self) {
        if self.peek() == '#' && self.peek_next() == Some('!') {
            while !self.is_at_end() && !is_line_terminator(self.peek()) {
                self.advance();
            }
        }
    }

    /// Get the next token, returning an `EOF` token at the end of input
    pub fn next_token(&mut self) -> JsResult<Token> {
        if let Some(comment) = self.skip_whitespace_and_comments()? {
            return Ok(comment);
        }

        let mut token = if self.is_at_end() {
            Token::new(TokenKind::Eof, "", self.current_position())
        } else {
            self.scan_token()?
        };
        token.newline_before = self.newline_pending;
        self.newline_pending = false;
        self.previous = Some(token.kind);
        Ok(token)
    }

    /// Re-scan `token` as a regular expression (`as_regex`) or as a division
    /// operator, replacing the interpretation the lexer guessed.
    ///
    /// Only valid for the most recently returned significant token.
    pub fn rescan(&mut self, token: &Token, as_regex: bool) -> JsResult<Token> {
        tracing::trace!(
            target: "parser::lexer",
            offset = token.offset(),
            as_regex,
            "rescanning slash token"
        );
        self.position = token.position.offset;
        self.line = token.position.line;
        self.column = token.position.column;

        let start = self.current_position();
        self.advance();
        let mut rescanned = if as_regex {
            self.scan_regex(start)?
        } else if self.match_char('=') {
            self.make_token(TokenKind::DivEqual, start)
        } else {
            self.make_token(TokenKind::Div, start)
        };
        rescanned.newline_before = token.newline_before;
        self.previous = Some(rescanned.kind);
        Ok(rescanned)
    }

    fn scan_token(&mut self) -> JsResult<Token> {
        let start = self.current_position();
        let ch = self.advance();

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::BNot,
            '?' => TokenKind::CondOp,
            '{' => {
                if let Some(open) = self.templates.last_mut() {
                    open.depth += 1;
                }
                TokenKind::LBrace
            }
            '}' => {
                match self.templates.last_mut() {
                    Some(open) if open.depth == 0 => {
                        return self.scan_template_part(start, false);
                    }
                    Some(open) => open.depth -= 1,
                    None => {}
                }
                TokenKind::RBrace
            }
            '.' => {
                if self.peek().is_ascii_digit() {
                    return self.scan_number(start, '.');
                }
                TokenKind::Period
            }
            '+' => {
                if self.match_char('+') {
                    TokenKind::PlusPlus
                } else if self.match_char('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('-') {
                    TokenKind::MinusMinus
                } else if self.match_char('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('=') {
                    TokenKind::MultEqual
                } else {
                    TokenKind::Mult
                }
            }
            '%' => {
                if self.match_char('=') {
                    TokenKind::ModEqual
                } else {
                    TokenKind::Mod
                }
            }
            '^' => {
                if self.match_char('=') {
                    TokenKind::XorEqual
                } else {
                    TokenKind::BXor
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::And
                } else if self.match_char('=') {
                    TokenKind::AndEqual
                } else {
                    TokenKind::BAnd
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::Or
                } else if self.match_char('=') {
                    TokenKind::OrEqual
                } else {
                    TokenKind::BOr
                }
            }
            '=' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::StrEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::StrNeq
                    } else {
                        TokenKind::Ne
                    }
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.match_char('<') {
                    if self.match_char('=') {
                        TokenKind::LShiftEqual
                    } else {
                        TokenKind::LShift
                    }
                } else if self.match_char('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('>') {
                    if self.match_char('>') {
                        if self.match_char('=') {
                            TokenKind::URShiftEqual
                        } else {
                            TokenKind::URShift
                        }
                    } else if self.match_char('=') {
                        TokenKind::RShiftEqual
                    } else {
                        TokenKind::RShift
                    }
                } else if self.match_char('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '/' => {
                if self.previous.map_or(false, |kind| kind.implies_division()) {
                    if self.match_char('=') {
                        TokenKind::DivEqual
                    } else {
                        TokenKind::Div
                    }
                } else {
                    return self.scan_regex(start);
                }
            }
            '`' => return self.scan_template_part(start, true),
            '"' | '\'' => return self.scan_string(start, ch),
            '0'..='9' => return self.scan_number(start, ch),
            c if is_id_start(c) || c == '\\' => return self.scan_identifier(start, c),
            c => return Err(illegal_character(c, start)),
        };

        Ok(self.make_token(kind, start))
    }

    fn scan_string(&mut self, start: SourcePosition, quote: char) -> JsResult<Token> {
        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                return Err(lexical_error(
                    format!("Unterminated string literal '{}'", self.text_from(&start)),
                    start,
                ));
            }
            let ch = self.advance();
            if ch == quote {
                break;
            }
            if ch == '\\' {
                if self.is_at_end() {
                    continue;
                }
                // Escaped line terminators are line continuations
                self.advance_tracking();
            }
        }
        Ok(self.make_token(TokenKind::String, start))
    }

    /// Scan template text after an opening backtick (`from_backtick`) or
    /// after the `}` that closes a substitution.
    fn scan_template_part(&mut self, start: SourcePosition, from_backtick: bool) -> JsResult<Token> {
        let template_start = if from_backtick {
            start
        } else {
            match self.templates.pop() {
                Some(open) => open.start,
                None => start,
            }
        };

        loop {
            if self.is_at_end() {
                return Err(illegal_character('`', template_start));
            }
            match self.peek() {
                '`' => {
                    self.advance();
                    let kind = if from_backtick {
                        TokenKind::TemplateNoSub
                    } else {
                        TokenKind::TemplateTail
                    };
                    return Ok(self.make_token(kind, start));
                }
                '$' if self.peek_next() == Some('{') => {
                    self.advance();
                    self.advance();
                    self.templates.push(OpenTemplate {
                        depth: 0,
                        start: template_start,
                    });
                    let kind = if from_backtick {
                        TokenKind::TemplateHead
                    } else {
                        TokenKind::TemplateMiddle
                    };
                    return Ok(self.make_token(kind, start));
                }
                '\\' => {
                    self.advance();
                    if !self.is_at_end() {
                        self.advance_tracking();
                    }
                }
                _ => {
                    self.advance_tracking();
                }
            }
        }
    }

    /// Scan a regular expression literal whose opening `/` is consumed
    fn scan_regex(&mut self, start: SourcePosition) -> JsResult<Token> {
        let mut in_class = false;
        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                return Err(self.regex_error(start));
            }
            match self.advance() {
                '\\' => {
                    if self.is_at_end() || is_line_terminator(self.peek()) {
                        return Err(self.regex_error(start));
                    }
                    self.advance();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }

        while !self.is_at_end() && is_id_continue(self.peek()) {
            self.advance();
        }

        Ok(self.make_token(TokenKind::Regex, start))
    }

    fn regex_error(&self, start: SourcePosition) -> JsError {
        JsError::new(
            ErrorKind::Regex,
            format!("Error parsing regular expression '{}'", self.text_from(&start)),
            Some(start),
        )
        .with_lexeme(self.text_from(&start))
    }

    fn scan_number(&mut self, start: SourcePosition, first: char) -> JsResult<Token> {
        if first == '0' && matches!(self.peek(), 'x' | 'X') {
            self.advance();
            if !self.peek().is_ascii_hexdigit() {
                return Err(lexical_error(
                    format!("Missing hexadecimal digits after '{}'", self.text_from(&start)),
                    start,
                ));
            }
            while self.peek().is_ascii_hexdigit() {
                self.advance();
            }
            return self.finish_number(start);
        }

        if first == '0' && self.peek().is_ascii_digit() {
            // Legacy octal, unless an 8 or 9 makes it a decimal with a leading zero
            let mut octal = true;
            while self.peek().is_ascii_digit() {
                octal &= self.peek() < '8';
                self.advance();
            }
            if octal {
                return self.finish_number(start);
            }
        }

        if first != '.' {
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            if self.peek() == '.' {
                self.advance();
            }
        }
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if matches!(self.peek(), 'e' | 'E') {
            let digit_after = |offset: usize| {
                self.chars
                    .get(self.position + offset)
                    .map_or(false, |c| c.is_ascii_digit())
            };
            let has_sign = matches!(self.peek_next(), Some('+') | Some('-'));
            if digit_after(1) || (has_sign && digit_after(2)) {
                self.advance();
                if has_sign {
                    self.advance();
                }
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        self.finish_number(start)
    }

    /// A numeric literal may not run straight into an identifier or a digit
    fn finish_number(&self, start: SourcePosition) -> JsResult<Token> {
        let next = self.peek();
        if !self.is_at_end() && (is_id_start(next) || next == '\\' || next.is_ascii_digit()) {
            return Err(lexical_error(
                format!("Invalid numeric literal '{}{}'", self.text_from(&start), next),
                start,
            ));
        }
        Ok(self.make_token(TokenKind::Number, start))
    }

    fn scan_identifier(&mut self, start: SourcePosition, first: char) -> JsResult<Token> {
        let mut escaped = false;
        if first == '\\' {
            self.scan_unicode_escape(start)?;
            escaped = true;
        }

        loop {
            let ch = self.peek();
            if ch == '\\' {
                let escape_start = self.current_position();
                self.advance();
                self.scan_unicode_escape(escape_start)?;
                escaped = true;
            } else if !self.is_at_end() && is_id_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.text_from(&start);
        let kind = if escaped {
            TokenKind::Id
        } else {
            TokenKind::keyword(&text).unwrap_or(TokenKind::Id)
        };
        Ok(Token::new(kind, text, start))
    }

    /// Consume `uXXXX` after a backslash inside an identifier
    fn scan_unicode_escape(&mut self, backslash: SourcePosition) -> JsResult<()> {
        if !self.match_char('u') {
            return Err(illegal_character('\\', backslash));
        }
        for _ in 0..4 {
            if !self.peek().is_ascii_hexdigit() {
                return Err(illegal_character('\\', backslash));
            }
            self.advance();
        }
        Ok(())
    }

    /// Skip whitespace, line terminators and comments. Returns a comment
    /// token when comments are being emitted.
    fn skip_whitespace_and_comments(&mut self) -> JsResult<Option<Token>> {
        while !self.is_at_end() {
            match self.peek() {
                // ECMAScript WhiteSpace, including the Zs category
                ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}' |
                '\u{1680}' |
                '\u{2000}'..='\u{200A}' |
                '\u{202F}' | '\u{205F}' | '\u{3000}' => {
                    self.advance();
                }
                c if is_line_terminator(c) => {
                    self.advance_tracking();
                    self.newline_pending = true;
                }
                '/' if self.peek_next() == Some('/') => {
                    let start = self.current_position();
                    while !self.is_at_end() && !is_line_terminator(self.peek()) {
                        self.advance();
                    }
                    if self.options.with_comments {
                        return Ok(Some(self.make_comment(TokenKind::LineComment, start)));
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let start = self.current_position();
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while !self.is_at_end() {
                        if self.peek() == '*' && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        if self.advance_tracking() {
                            self.newline_pending = true;
                        }
                    }
                    if !closed {
                        return Err(lexical_error(
                            format!("Unterminated block comment '{}'", self.text_from(&start)),
                            start,
                        ));
                    }
                    if self.options.with_comments {
                        return Ok(Some(self.make_comment(TokenKind::BlockComment, start)));
                    }
                }
                _ => break,
            }
        }
        Ok(None)
    }

    fn make_comment(&self, kind: TokenKind, start: SourcePosition) -> Token {
        let mut token = self.make_token(kind, start);
        token.newline_before = self.newline_pending;
        token
    }

    fn make_token(&self, kind: TokenKind, start: SourcePosition) -> Token {
        Token::new(kind, self.text_from(&start), start)
    }

    fn text_from(&self, start: &SourcePosition) -> String {
        self.chars[start.offset..self.position].iter().collect()
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.position]
        }
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.position];
        self.position += 1;
        self.column += 1;
        ch
    }

    /// Advance one character, treating CRLF as a single line terminator.
    /// Returns true when a line terminator was consumed.
    fn advance_tracking(&mut self) -> bool {
        let ch = self.advance();
        if !is_line_terminator(ch) {
            return false;
        }
        if ch == '\r' && self.peek() == '\n' {
            self.position += 1;
        }
        self.line += 1;
        self.column = 1;
        true
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.position] != expected {
            false
        } else {
            self.position += 1;
            self.column += 1;
            true
        }
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }
}

impl Iterator for Lexer {
    type Item = JsResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => {
                self.finished = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Check if character is a line terminator
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Check if a character can start an identifier
pub fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

/// Check if a character can continue an identifier
pub fn is_id_continue(ch: char) -> bool {
    is_id_start(ch) || ch.is_alphanumeric() || ch == '\u{200C}' || ch == '\u{200D}'
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_lexer_empty_source() {
        let mut lexer = Lexer::new("");
        assert!(matches!(lexer.next_token().unwrap().kind, TokenKind::Eof));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_lexer_identifier() {
        let tokens = Lexer::tokenize("foo $bar _baz").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Id));
        assert_eq!(tokens[1].value, "$bar");
    }

    #[test]
    fn test_lexer_numbers_keep_raw_text() {
        let tokens = Lexer::tokenize("123.45 .5 0x1F 017 1e10 2E-3 5.").unwrap();
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["123.45", ".5", "0x1F", "017", "1e10", "2E-3", "5."]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_lexer_string() {
        let tokens = Lexer::tokenize(r#""hello" 'it\'s'"#).unwrap();
        assert_eq!(tokens[0].value, "\"hello\"");
        assert_eq!(tokens[1].value, "'it\\'s'");
    }

    #[test]
    fn test_lexer_string_line_continuation() {
        let tokens = Lexer::tokenize("'a\\\nb' c").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[1].line(), 2);
    }

    #[test]
    fn test_lexer_keywords() {
        assert_eq!(
            kinds("var function return typeof"),
            vec![
                TokenKind::Var,
                TokenKind::Function,
                TokenKind::Return,
                TokenKind::Typeof
            ]
        );
    }

    #[test]
    fn test_lexer_every_keyword() {
        for kind in TokenKind::ALL.iter().copied().filter(|kind| kind.is_keyword()) {
            let spelling = kind.spelling().unwrap();
            let tokens = Lexer::tokenize(spelling).unwrap();
            assert_eq!(tokens.len(), 1, "{}", spelling);
            assert_eq!(tokens[0].kind, kind);
            assert_eq!(tokens[0].value, spelling);
        }
    }

    #[rstest]
    #[case("0x")]
    #[case("0x;")]
    #[case("0Xg")]
    fn test_lexer_hex_without_digits(#[case] source: &str) {
        let err = Lexer::tokenize(source).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Lexical));
        assert_eq!(err.source_position.map(|p| p.offset), Some(0));
    }

    #[rstest]
    #[case("3in")]
    #[case("1.toString")]
    #[case("0x1Fz")]
    #[case("1e")]
    #[case("5$")]
    fn test_lexer_number_followed_by_identifier(#[case] source: &str) {
        let err = Lexer::tokenize(source).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Lexical));
    }

    #[test]
    fn test_lexer_leading_zero_decimals() {
        let tokens = Lexer::tokenize("09.5 08 019e2 07 3 in").unwrap();
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["09.5", "08", "019e2", "07", "3", "in"]);
        assert_eq!(tokens[5].kind, TokenKind::In);
    }

    #[test]
    fn test_lexer_punctuators_longest_match() {
        assert_eq!(
            kinds(">>>= === !== >>> <<= ++ --"),
            vec![
                TokenKind::URShiftEqual,
                TokenKind::StrEq,
                TokenKind::StrNeq,
                TokenKind::URShift,
                TokenKind::LShiftEqual,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus
            ]
        );
    }

    #[test]
    fn test_lexer_comments_skipped() {
        assert_eq!(
            kinds("a // line\n/* block */ b"),
            vec![TokenKind::Id, TokenKind::Id]
        );
    }

    #[test]
    fn test_lexer_comments_emitted() {
        let options = LexerOptions { with_comments: true };
        let tokens: Vec<Token> = Lexer::with_options("a // c\n/* d */ b", options)
            .collect::<JsResult<_>>()
            .unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Id,
                TokenKind::LineComment,
                TokenKind::BlockComment,
                TokenKind::Id
            ]
        );
        assert_eq!(tokens[1].value, "// c");
        assert!(tokens[3].newline_before);
    }

    #[test]
    fn test_lexer_regex_versus_division() {
        assert_eq!(
            kinds("a / b / c"),
            vec![
                TokenKind::Id,
                TokenKind::Div,
                TokenKind::Id,
                TokenKind::Div,
                TokenKind::Id
            ]
        );
        let tokens = Lexer::tokenize("x = /[/]+/gi").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Regex);
        assert_eq!(tokens[2].value, "/[/]+/gi");
    }

    #[test]
    fn test_lexer_rescan() {
        let mut lexer = Lexer::new(") /a/g");
        lexer.next_token().unwrap();
        let div = lexer.next_token().unwrap();
        assert_eq!(div.kind, TokenKind::Div);
        let regex = lexer.rescan(&div, true).unwrap();
        assert_eq!(regex.kind, TokenKind::Regex);
        assert_eq!(regex.value, "/a/g");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_lexer_template_parts() {
        let tokens = Lexer::tokenize("`a${b}c${ {d} }e`").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateHead,
                TokenKind::Id,
                TokenKind::TemplateMiddle,
                TokenKind::LBrace,
                TokenKind::Id,
                TokenKind::RBrace,
                TokenKind::TemplateTail
            ]
        );
        assert_eq!(tokens[0].value, "`a${");
        assert_eq!(tokens[2].value, "}c${");
        assert_eq!(tokens[6].value, "}e`");
    }

    #[test]
    fn test_lexer_template_nosub() {
        let tokens = Lexer::tokenize("`plain\ntext`").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::TemplateNoSub);
    }

    #[test]
    fn test_lexer_newline_before() {
        let tokens = Lexer::tokenize("a\nb c\r\nd").unwrap();
        let flags: Vec<bool> = tokens.iter().map(|t| t.newline_before).collect();
        assert_eq!(flags, vec![false, true, false, true]);
        assert_eq!(tokens[3].line(), 3);
        assert_eq!(tokens[3].column(), 1);
    }

    #[test]
    fn test_lexer_multiline_comment_counts_as_newline() {
        let tokens = Lexer::tokenize("a /*\n*/ b").unwrap();
        assert!(tokens[1].newline_before);
    }

    #[test]
    fn test_lexer_hashbang() {
        let tokens = Lexer::tokenize("#!/usr/bin/env node\nx").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].line(), 2);
    }

    #[test]
    fn test_lexer_illegal_backtick() {
        let err = Lexer::tokenize("`").unwrap_err();
        assert_eq!(err.to_string(), "Illegal character '`' at 1:1");
    }

    #[test]
    fn test_lexer_illegal_character() {
        let err = Lexer::tokenize("a @").unwrap_err();
        assert_eq!(err.to_string(), "Illegal character '@' at 1:3");
        assert!(err.is_lexical());
    }

    #[test]
    fn test_lexer_unterminated_string() {
        let err = Lexer::tokenize("x = 'abc").unwrap_err();
        assert_eq!(err.to_string(), "Unterminated string literal ''abc' at 1:5");
    }

    #[test]
    fn test_lexer_unterminated_comment() {
        let err = Lexer::tokenize("/* open").unwrap_err();
        assert!(err.message.starts_with("Unterminated block comment"));
    }

    #[test]
    fn test_lexer_regex_error_kind() {
        let err = Lexer::tokenize("x = /abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Regex);
        assert_eq!(err.to_string(), "Error parsing regular expression '/abc' at 1:5");
    }

    #[test]
    fn test_lexer_stops_after_error() {
        let mut lexer = Lexer::new("@ a");
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }
}
