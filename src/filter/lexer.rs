//! Character-level scanning primitives shared by the grammar.
//!
//! The grammar is context sensitive (a `-` is a slice separator inside `[]`
//! and a range inside `{}`), so instead of producing a token stream up front
//! the parser drives a [`Cursor`] and asks for the fragment it expects next.

/// Characters that never appear in an unquoted word
pub const BRACKETS: &[char] = &['(', ')', '[', ']', '{', '}'];

/// Result of trying to read a quoted string
#[derive(Debug, PartialEq)]
pub enum Quoted {
    /// The input does not start with a quote character
    NotQuoted,
    Text(String),
    /// An opening quote without a matching closing quote of the same kind
    Unterminated,
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `literal` if the input starts with it.
    pub fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume an ASCII keyword, ignoring case.
    pub fn eat_caseless(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        match rest.get(..keyword.len()) {
            Some(head) if head.eq_ignore_ascii_case(keyword) => {
                self.pos += keyword.len();
                true
            }
            _ => false,
        }
    }

    pub fn skip_ws(&mut self) -> usize {
        let skipped = self.take_while(char::is_whitespace);
        skipped.chars().count()
    }

    /// Mandatory separator: at least one whitespace character.
    pub fn eat_ws1(&mut self) -> bool {
        self.skip_ws() > 0
    }

    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        &rest[..len]
    }

    /// Optionally signed run of ASCII digits.
    pub fn signed_integer(&mut self) -> Option<i64> {
        let start = self.pos;
        let _ = self.eat("-") || self.eat("+");
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            self.pos = start;
            return None;
        }
        match self.src[start..self.pos].parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// Optionally signed decimal number with an optional fractional part.
    ///
    /// A dot is only consumed when digits follow it, so `30..40` reads `30`.
    pub fn signed_float(&mut self) -> Option<f64> {
        let start = self.pos;
        let _ = self.eat("-") || self.eat("+");
        if self.take_while(|c| c.is_ascii_digit()).is_empty() {
            self.pos = start;
            return None;
        }
        let before_fraction = self.pos;
        if self.eat(".") && self.take_while(|c| c.is_ascii_digit()).is_empty() {
            self.pos = before_fraction;
        }
        match self.src[start..self.pos].parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// Single- or double-quoted string without escapes.
    pub fn quoted(&mut self) -> Quoted {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Quoted::NotQuoted,
        };
        let body_start = self.pos + 1;
        match self.src[body_start..].find(quote) {
            Some(len) => {
                self.pos = body_start + len + 1;
                Quoted::Text(self.src[body_start..body_start + len].to_string())
            }
            None => Quoted::Unterminated,
        }
    }

    /// Unquoted value: printable characters up to whitespace or a bracket.
    ///
    /// Words may not begin with a quote so that a badly quoted value is
    /// reported instead of being read verbatim.
    pub fn safe_word(&mut self) -> Option<&'a str> {
        if matches!(self.peek(), Some('"' | '\'')) {
            return None;
        }
        let word = self.take_while(|c| !c.is_whitespace() && !c.is_control() && !BRACKETS.contains(&c));
        (!word.is_empty()).then_some(word)
    }
}
