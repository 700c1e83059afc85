//! Layout helpers: indentation state and token spacing

/// Indentation state for one unparse invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indentator {
    indent_str: String,
    depth: usize,
}

impl Indentator {
    /// Create with the string repeated once per indentation level
    pub fn new(indent_str: impl Into<String>) -> Self {
        Self {
            indent_str: indent_str.into(),
            depth: 0,
        }
    }

    /// Current depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// One level deeper
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// One level shallower, never below zero
    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// A line break followed by the current indentation
    pub fn newline(&self) -> String {
        let mut text = String::with_capacity(1 + self.indent_str.len() * self.depth);
        text.push('\n');
        for _ in 0..self.depth {
            text.push_str(&self.indent_str);
        }
        text
    }

    /// Like [`newline`](Self::newline) unless `before` already ends a line
    pub fn optional_newline(&self, before: Option<&str>) -> Option<String> {
        match before {
            None => None,
            Some(text) if text.ends_with('\n') => None,
            Some(_) => Some(self.newline()),
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\\' || !ch.is_ascii()
}

fn is_regex(text: &str) -> bool {
    text.len() > 1 && text.starts_with('/') && text.ends_with('/')
}

/// True when `before` and `after` would lex differently without a space between them
pub fn needs_space(before: &str, after: &str) -> bool {
    let (Some(last), Some(first)) = (before.chars().last(), after.chars().next()) else {
        return false;
    };
    if is_word_char(last) && is_word_char(first) {
        return true;
    }
    if matches!((last, first), ('+', '+') | ('-', '-') | ('/', '/')) {
        return true;
    }
    // regex flags would swallow the next word
    if is_regex(before) && is_word_char(first) {
        return true;
    }
    // `1.` would read as a decimal point
    first == '.' && before.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_indent_newline() {
        let mut indentator = Indentator::new("  ");
        indentator.indent();
        indentator.indent();
        assert_eq!(indentator.newline(), "\n    ");
        indentator.dedent();
        indentator.dedent();
        assert_eq!(indentator.newline(), "\n");
    }

    #[test]
    fn test_dedent_clamped() {
        let mut indentator = Indentator::new("\t");
        indentator.dedent();
        indentator.dedent();
        assert_eq!(indentator.depth(), 0);
        indentator.indent();
        assert_eq!(indentator.newline(), "\n\t");
    }

    #[test]
    fn test_optional_newline() {
        let indentator = Indentator::new("  ");
        assert_eq!(indentator.optional_newline(None), None);
        assert_eq!(indentator.optional_newline(Some("x;\n")), None);
        assert_eq!(indentator.optional_newline(Some("x;")), Some("\n".into()));
    }

    #[rstest]
    #[case("var", "a", true)]
    #[case("a", "=", false)]
    #[case("+", "+b", true)]
    #[case("-", "--", true)]
    #[case("+", "-", false)]
    #[case("/", "/re/", true)]
    #[case("/re/", "in", true)]
    #[case("/re/g", "in", true)]
    #[case("/re/", ")", false)]
    #[case("1", ".", true)]
    #[case("1.5", ".", false)]
    #[case("0x1", ".", false)]
    #[case("var", "\\u0061", true)]
    #[case("return", "\"x\"", false)]
    fn test_needs_space(#[case] before: &str, #[case] after: &str, #[case] expected: bool) {
        assert_eq!(needs_space(before, after), expected);
    }

    proptest! {
        #[test]
        fn test_depth_never_negative(steps in prop::collection::vec(any::<bool>(), 0..64)) {
            let mut indentator = Indentator::new("  ");
            let mut expected: usize = 0;
            for indent in steps {
                if indent {
                    indentator.indent();
                    expected += 1;
                } else {
                    indentator.dedent();
                    expected = expected.saturating_sub(1);
                }
            }
            prop_assert_eq!(indentator.depth(), expected);
            prop_assert_eq!(indentator.newline().len(), 1 + 2 * expected);
        }
    }
}
