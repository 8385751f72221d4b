//! Lightweight JavaScript token scanner.
//!
//! Splits module source into the few token classes the dev server cares
//! about: identifiers, string literals, template literal chunks, regex
//! literals and punctuation. Comments and whitespace are skipped.
//!
//! This is not a parser. It exists so import rewriting and template
//! expression prefixing never look inside string, template or regex
//! literal content.

use std::ops::Range;

/// Token class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident,
    /// String literal, with its quote byte.
    Str { quote: u8 },
    /// Raw template literal text: from a backtick or `}` up to and
    /// including the next `${` or closing backtick.
    TemplateChunk,
    /// Numeric literal.
    Number,
    /// Regular expression literal, including flags.
    Regex,
    /// Member access: `.` or `?.`.
    Dot,
    /// Any other operator or delimiter, one byte per token (`...` is one token).
    Punct(u8),
}

/// A scanned token: kind plus byte range into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Source text of this token.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Whether this token is the identifier `name`.
    #[must_use]
    pub fn is_ident(&self, source: &str, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == name
    }

    /// Byte range of a terminated string literal's contents (quotes excluded).
    #[must_use]
    pub fn string_contents(&self, source: &str) -> Option<Range<usize>> {
        let TokenKind::Str { quote } = self.kind else {
            return None;
        };
        let bytes = source.as_bytes();
        if self.end - self.start >= 2 && bytes[self.end - 1] == quote {
            Some(self.start + 1..self.end - 1)
        } else {
            None
        }
    }
}

/// Identifiers after which a `/` starts a regex rather than a division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Keywords whose parenthesized head may be followed by a regex statement.
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Scan the whole source into tokens.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    Scanner::new(source).run()
}

#[derive(Debug, Clone, Copy)]
enum Brace {
    Block,
    TemplateExpr,
}

struct Scanner<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    /// Whether the previous token allows a regex literal to follow.
    allow_regex: bool,
    braces: Vec<Brace>,
    /// One entry per open `(`: whether it opens a control statement head.
    parens: Vec<bool>,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            src: text.as_bytes(),
            pos: 0,
            allow_regex: true,
            braces: Vec::new(),
            parens: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            match c {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == b'/' => self.skip_line_comment(),
                b'/' if self.peek(1) == b'*' => self.skip_block_comment(),
                b'/' if self.allow_regex => self.scan_regex(),
                b'\'' | b'"' => self.scan_string(c),
                b'`' => {
                    let start = self.pos;
                    self.pos += 1;
                    self.scan_template(start);
                }
                b'{' => {
                    self.braces.push(Brace::Block);
                    self.push_punct(c, 1, true);
                }
                b'}' => match self.braces.pop() {
                    Some(Brace::TemplateExpr) => {
                        let start = self.pos;
                        self.pos += 1;
                        self.scan_template(start);
                    }
                    _ => self.push_punct(c, 1, false),
                },
                b'.' if self.peek(1).is_ascii_digit() => self.scan_number(),
                b'.' if self.peek(1) == b'.' && self.peek(2) == b'.' => {
                    self.push_punct(c, 3, true);
                }
                b'.' => self.push(TokenKind::Dot, self.pos, self.pos + 1, false),
                b'?' if self.peek(1) == b'.' && !self.peek(2).is_ascii_digit() => {
                    self.push(TokenKind::Dot, self.pos, self.pos + 2, false);
                }
                b'0'..=b'9' => self.scan_number(),
                b'(' => {
                    let control = self.follows_control_keyword();
                    self.parens.push(control);
                    self.push_punct(c, 1, true);
                }
                b')' => {
                    let control = self.parens.pop().unwrap_or(false);
                    self.push_punct(c, 1, control);
                }
                b']' => self.push_punct(c, 1, false),
                _ if is_ident_byte(c) => self.scan_ident(),
                _ => self.push_punct(c, 1, true),
            }
        }
        self.tokens
    }

    /// Whether the last token is `if`, `while`, `for` or `with` used as a
    /// keyword rather than a property name.
    fn follows_control_keyword(&self) -> bool {
        let n = self.tokens.len();
        let Some(last) = self.tokens.last() else {
            return false;
        };
        let after_dot = n >= 2 && self.tokens[n - 2].kind == TokenKind::Dot;
        last.kind == TokenKind::Ident
            && !after_dot
            && CONTROL_KEYWORDS.contains(&last.text(self.text))
    }

    fn peek(&self, offset: usize) -> u8 {
        self.src.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize, allow_regex: bool) {
        self.tokens.push(Token { kind, start, end });
        self.pos = end;
        self.allow_regex = allow_regex;
    }

    fn push_punct(&mut self, c: u8, len: usize, allow_regex: bool) {
        let start = self.pos;
        self.push(TokenKind::Punct(c), start, start + len, allow_regex);
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.src.len() {
            if self.src[self.pos] == b'*' && self.peek(1) == b'/' {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    fn scan_string(&mut self, quote: u8) {
        let start = self.pos;
        let mut pos = self.pos + 1;
        while pos < self.src.len() {
            match self.src[pos] {
                b'\\' => pos += 2,
                b'\n' => break,
                c if c == quote => {
                    pos += 1;
                    break;
                }
                _ => pos += 1,
            }
        }
        let end = pos.min(self.src.len());
        self.push(TokenKind::Str { quote }, start, end, false);
    }

    /// Scan template text starting after a backtick or a closing `}`.
    fn scan_template(&mut self, start: usize) {
        let mut pos = self.pos;
        while pos < self.src.len() {
            match self.src[pos] {
                b'\\' => pos += 2,
                b'`' => {
                    self.push(TokenKind::TemplateChunk, start, pos + 1, false);
                    return;
                }
                b'$' if self.src.get(pos + 1) == Some(&b'{') => {
                    self.braces.push(Brace::TemplateExpr);
                    self.push(TokenKind::TemplateChunk, start, pos + 2, true);
                    return;
                }
                _ => pos += 1,
            }
        }
        let end = self.src.len();
        self.push(TokenKind::TemplateChunk, start, end, false);
    }

    fn scan_regex(&mut self) {
        let start = self.pos;
        let mut pos = self.pos + 1;
        let mut in_class = false;
        while pos < self.src.len() {
            match self.src[pos] {
                b'\\' => {
                    pos += 2;
                    continue;
                }
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    pos += 1;
                    break;
                }
                b'\n' => break,
                _ => {}
            }
            pos += 1;
        }
        let mut end = pos.min(self.src.len());
        while end < self.src.len() && is_ident_byte(self.src[end]) {
            end += 1;
        }
        self.push(TokenKind::Regex, start, end, false);
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let mut pos = self.pos;
        while pos < self.src.len()
            && (self.src[pos].is_ascii_alphanumeric() || matches!(self.src[pos], b'.' | b'_'))
        {
            pos += 1;
        }
        self.push(TokenKind::Number, start, pos, false);
    }

    fn scan_ident(&mut self) {
        let start = self.pos;
        let mut pos = self.pos;
        while pos < self.src.len() && (is_ident_byte(self.src[pos]) || self.src[pos].is_ascii_digit())
        {
            pos += 1;
        }
        let word = &self.text[start..pos];
        let allow_regex = REGEX_PRECEDING_KEYWORDS.contains(&word);
        self.push(TokenKind::Ident, start, pos, allow_regex);
    }
}

/// Identifier start byte. Non-ASCII bytes are folded into identifiers so
/// token boundaries always fall on ASCII characters.
fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c == b'\\' || c >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .into_iter()
            .map(|t| (t.kind, t.text(source).to_string()))
            .collect()
    }

    #[test]
    fn test_skips_comments() {
        let source = "// import x from 'a'\n/* from 'b' */ foo";
        let tokens = kinds(source);
        assert_eq!(tokens, vec![(TokenKind::Ident, "foo".to_string())]);
    }

    #[test]
    fn test_string_literal() {
        let source = r#"from "vue""#;
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Str { quote: b'"' });
        let range = tokens[1].string_contents(source).unwrap();
        assert_eq!(&source[range], "vue");
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let source = r"'it\'s' x";
        let tokens = kinds(source);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].1, "x");
    }

    #[test]
    fn test_unterminated_string_has_no_contents() {
        let source = "'abc";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].string_contents(source).is_none());
    }

    #[test]
    fn test_template_literal_with_expression() {
        let source = "`a ${b} c` d";
        let tokens = kinds(source);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::TemplateChunk, "`a ${".to_string()),
                (TokenKind::Ident, "b".to_string()),
                (TokenKind::TemplateChunk, "} c`".to_string()),
                (TokenKind::Ident, "d".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_braces_in_template_expression() {
        let source = "`${ {a: 1}.a }` x";
        let tokens = kinds(source);
        assert_eq!(tokens.last().unwrap().1, "x");
        assert_eq!(tokens[tokens.len() - 2].1, "}`");
    }

    #[test]
    fn test_regex_vs_division() {
        let source = "a = b / c; r = /from 'x'/g;";
        let tokens = kinds(source);
        assert!(tokens
            .iter()
            .any(|(k, t)| *k == TokenKind::Regex && t == "/from 'x'/g"));
        assert!(tokens
            .iter()
            .any(|(k, t)| *k == TokenKind::Punct(b'/') && t == "/"));
    }

    #[test]
    fn test_regex_with_slash_in_class() {
        let source = "x = /[/]/.test(y)";
        let tokens = kinds(source);
        assert!(tokens.iter().any(|(k, t)| *k == TokenKind::Regex && t == "/[/]/"));
    }

    #[test]
    fn test_regex_after_return() {
        let source = "return /a/.test(b)";
        let tokens = kinds(source);
        assert_eq!(tokens[1].0, TokenKind::Regex);
    }

    #[test]
    fn test_regex_after_control_statement_head() {
        let source = "if (a) /from 'x'/.test(s)";
        let tokens = kinds(source);
        assert!(tokens
            .iter()
            .any(|(k, t)| *k == TokenKind::Regex && t == "/from 'x'/"));
    }

    #[test]
    fn test_division_after_call_parens() {
        let source = "f(a) / 2 / g(b)";
        let tokens = kinds(source);
        assert!(tokens.iter().all(|(k, _)| *k != TokenKind::Regex));
        assert_eq!(
            tokens
                .iter()
                .filter(|(k, _)| *k == TokenKind::Punct(b'/'))
                .count(),
            2
        );
    }

    #[test]
    fn test_property_named_if_is_not_control() {
        let source = "x.if(a) / 2";
        let tokens = kinds(source);
        assert!(tokens.iter().all(|(k, _)| *k != TokenKind::Regex));
    }

    #[test]
    fn test_optional_chaining_is_dot() {
        let source = "a?.b";
        let tokens = kinds(source);
        assert_eq!(tokens[1].0, TokenKind::Dot);
        assert_eq!(tokens[1].1, "?.");
    }

    #[test]
    fn test_ternary_with_decimal_is_not_dot() {
        let source = "a?.5:1";
        let tokens = kinds(source);
        assert_eq!(tokens[1].0, TokenKind::Punct(b'?'));
        assert_eq!(tokens[2].0, TokenKind::Number);
    }

    #[test]
    fn test_non_ascii_identifier() {
        let source = "const héllo = 'wörld'";
        let tokens = kinds(source);
        assert_eq!(tokens[1].1, "héllo");
        assert_eq!(tokens[3].1, "'wörld'");
    }
}
