//! Right-hand side literals of a comparison.

use super::iprange::Ipv4Range;
use super::lexer::{Cursor, Quoted, BRACKETS};
use std::fmt;

/// One entry of a numeric list: a number or an inclusive range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberEntry {
    Single(f64),
    Range { low: f64, high: f64 },
}

impl NumberEntry {
    pub fn contains(&self, n: f64) -> bool {
        match *self {
            NumberEntry::Single(value) => value == n,
            NumberEntry::Range { low, high } => low <= n && n <= high,
        }
    }
}

impl fmt::Display for NumberEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberEntry::Single(value) => write!(f, "{value}"),
            NumberEntry::Range { low, high } => write!(f, "{low}..{high}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted or unquoted single value; converted lazily by each evaluator
    Text(String),
    Strings(Vec<String>),
    Numbers(Vec<NumberEntry>),
    Addresses(Vec<Ipv4Range>),
}

impl Literal {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        !matches!(self, Literal::Text(_))
    }
}

/// Why a literal failed to parse; the parser attaches the filter text.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralError {
    MismatchedQuotes(usize),
    InvalidAddress(String),
    Syntax { position: usize, reason: String },
}

/// Parse a comparison value: quoted string, `{...}` list or unquoted word.
pub fn parse_literal(cursor: &mut Cursor<'_>) -> Result<Literal, LiteralError> {
    let position = cursor.pos();
    match cursor.quoted() {
        Quoted::Text(text) => return Ok(Literal::Text(text)),
        Quoted::Unterminated => return Err(LiteralError::MismatchedQuotes(position)),
        Quoted::NotQuoted => {}
    }
    if cursor.peek() == Some('{') {
        return parse_list(cursor);
    }
    match cursor.safe_word() {
        Some(word) => Ok(Literal::Text(word.to_string())),
        None => Err(LiteralError::Syntax {
            position,
            reason: "expected a value".to_string(),
        }),
    }
}

/// Parse `{ ... }`. Address ranges are tried first, then quoted strings, then
/// numbers; the first alternative that consumes the whole list wins.
fn parse_list(cursor: &mut Cursor<'_>) -> Result<Literal, LiteralError> {
    let start = cursor.pos();
    cursor.eat("{");
    let body_start = cursor.pos();

    let alternatives: [fn(&mut Cursor<'_>) -> Option<Literal>; 3] = [
        |c| delimited(c, |c| Ipv4Range::parse(c).ok()).map(Literal::Addresses),
        |c| delimited(c, quoted_entry).map(Literal::Strings),
        |c| delimited(c, number_entry).map(Literal::Numbers),
    ];
    for alternative in alternatives {
        cursor.reset(body_start);
        if let Some(literal) = alternative(cursor) {
            return Ok(literal);
        }
    }

    cursor.reset(body_start);
    cursor.skip_ws();
    let first = cursor.take_while(|c| c != ',' && c != '}' && !c.is_whitespace());
    if first.matches('.').count() >= 2 {
        let mut lookahead = Cursor::new(first);
        if let Err(reason) = Ipv4Range::parse(&mut lookahead) {
            return Err(LiteralError::InvalidAddress(format!("{first}: {reason}")));
        }
    }
    if first.starts_with(['"', '\'']) {
        let mut lookahead = Cursor::new(first);
        if lookahead.quoted() == Quoted::Unterminated {
            return Err(LiteralError::MismatchedQuotes(cursor.pos() - first.len()));
        }
    }
    Err(LiteralError::Syntax {
        position: start,
        reason: "invalid list literal".to_string(),
    })
}

/// `entry (, entry)* }` with optional whitespace around entries.
fn delimited<T>(
    cursor: &mut Cursor<'_>,
    entry: impl Fn(&mut Cursor<'_>) -> Option<T>,
) -> Option<Vec<T>> {
    let mut entries = Vec::new();
    loop {
        cursor.skip_ws();
        entries.push(entry(cursor)?);
        cursor.skip_ws();
        if cursor.eat(",") {
            continue;
        }
        return cursor.eat("}").then_some(entries);
    }
}

fn quoted_entry(cursor: &mut Cursor<'_>) -> Option<String> {
    match cursor.quoted() {
        Quoted::Text(text) => Some(text),
        _ => None,
    }
}

fn number_entry(cursor: &mut Cursor<'_>) -> Option<NumberEntry> {
    let low = cursor.signed_float()?;
    let before_op = cursor.pos();
    cursor.skip_ws();
    if cursor.eat("..") || cursor.eat("-") {
        cursor.skip_ws();
        if let Some(high) = cursor.signed_float() {
            return Some(NumberEntry::Range { low, high });
        }
    }
    cursor.reset(before_op);
    Some(NumberEntry::Single(low))
}

/// Render a string so that it reads back as the same literal.
pub fn quote(text: &str) -> String {
    let bare = !text.is_empty()
        && !text.starts_with(['"', '\''])
        && !text
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || BRACKETS.contains(&c));
    if bare {
        text.to_string()
    } else if text.contains('"') {
        format!("'{text}'")
    } else {
        format!("\"{text}\"")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
            let parts: Vec<String> = items.iter().map(render).collect();
            format!("{{{}}}", parts.join(", "))
        }
        match self {
            Literal::Text(text) => write!(f, "{}", quote(text)),
            Literal::Strings(items) => write!(
                f,
                "{}",
                list(items, |s| if s.contains('"') {
                    format!("'{s}'")
                } else {
                    format!("\"{s}\"")
                })
            ),
            Literal::Numbers(items) => write!(f, "{}", list(items, ToString::to_string)),
            Literal::Addresses(items) => write!(f, "{}", list(items, ToString::to_string)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> Literal {
        let mut cursor = Cursor::new(text);
        let literal = parse_literal(&mut cursor).expect("valid literal");
        assert!(cursor.is_eof(), "unparsed input: {}", cursor.rest());
        literal
    }

    #[test]
    fn test_words_and_quoted_strings() {
        assert_eq!(literal("Neo"), Literal::Text("Neo".to_string()));
        assert_eq!(literal("'The One'"), Literal::Text("The One".to_string()));
        assert_eq!(literal("\"\""), Literal::Text(String::new()));
        assert_eq!(
            parse_literal(&mut Cursor::new("\"Neo'")),
            Err(LiteralError::MismatchedQuotes(0))
        );
    }

    #[test]
    fn test_number_lists() {
        assert_eq!(
            literal("{ 30-40 }"),
            Literal::Numbers(vec![NumberEntry::Range { low: 30.0, high: 40.0 }])
        );
        assert_eq!(
            literal("{1, 2.5, -3..3}"),
            Literal::Numbers(vec![
                NumberEntry::Single(1.0),
                NumberEntry::Single(2.5),
                NumberEntry::Range { low: -3.0, high: 3.0 },
            ])
        );
    }

    #[test]
    fn test_string_lists() {
        assert_eq!(
            literal("{\"Neo\", 'Trinity'}"),
            Literal::Strings(vec!["Neo".to_string(), "Trinity".to_string()])
        );
    }

    #[test]
    fn test_address_lists_win_over_numbers() {
        match literal("{127.0.0.1, 10.0.0.0/8}") {
            Literal::Addresses(ranges) => assert_eq!(ranges.len(), 2),
            other => panic!("expected addresses, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_lists() {
        assert!(matches!(
            parse_literal(&mut Cursor::new("{127.0.0.300}")),
            Err(LiteralError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_literal(&mut Cursor::new("{Neo, Trinity}")),
            Err(LiteralError::Syntax { .. })
        ));
        assert!(matches!(
            parse_literal(&mut Cursor::new("{1, 2")),
            Err(LiteralError::Syntax { .. })
        ));
    }

    #[test]
    fn test_display_reads_back() {
        for text in ["Neo", "\"The One\"", "{30..40}", "{\"a\", \"b\"}", "{127.0.0.1}"] {
            let parsed = literal(text);
            assert_eq!(literal(&parsed.to_string()), parsed);
        }
    }
}
