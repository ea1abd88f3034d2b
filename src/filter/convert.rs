//! Conversions from literals and record values to the types the evaluators
//! compare. Every conversion returns `None` when the value does not have the
//! target type; evaluators use that to decide whether they apply.

use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::borrow::Cow;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Parse a number the way filter text spells it: floats when a dot is
/// present, `0x` hex, leading-zero octal, then plain decimal.
pub fn number_from_str(text: &str) -> Option<f64> {
    if text.contains('.') {
        return parse_float(text);
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    if let Some(octal) = text.strip_prefix('0') {
        if octal.is_empty() {
            return Some(0.0);
        }
        let octal = octal.strip_prefix('o').unwrap_or(octal);
        return i64::from_str_radix(octal, 8).ok().map(|n| n as f64);
    }
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().ok();
    }
    parse_float(text)
}

/// Plain float parsing that tolerates surrounding whitespace.
pub fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

/// Numbers from records. Booleans are not numbers.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => number_from_str(s),
        _ => None,
    }
}

/// Like [`number_from_value`] but only whole numbers.
pub fn integer_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        other => whole(number_from_value(other)?),
    }
}

pub fn integer_from_str(text: &str) -> Option<i64> {
    whole(number_from_str(text)?)
}

fn whole(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 9.2e18).then_some(n as i64)
}

/// Loose numeric coercion used for list membership, where `True` counts as 1.
pub fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => parse_float(s),
        _ => None,
    }
}

pub fn ipv4_from_str(text: &str) -> Option<Ipv4Addr> {
    if !text.contains('.') {
        return None;
    }
    text.parse().ok()
}

pub fn ipv4_from_value(value: &Value) -> Option<Ipv4Addr> {
    match value {
        Value::Ipv4(addr) => Some(*addr),
        Value::String(s) => ipv4_from_str(s),
        _ => None,
    }
}

pub fn ipv6_from_str(text: &str) -> Option<Ipv6Addr> {
    if !text.contains(':') {
        return None;
    }
    text.parse().ok()
}

pub fn ipv6_from_value(value: &Value) -> Option<Ipv6Addr> {
    match value {
        Value::Ipv6(addr) => Some(*addr),
        Value::String(s) => ipv6_from_str(s),
        _ => None,
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%b %d %Y",
    "%b %d, %Y",
];

/// Permissive date parsing.
///
/// Offsets are dropped in favour of the local wall-clock time. A bare year
/// means January 1st of that year; a bare eight digit run is `YYYYMMDD`.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.naive_local());
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return match text.len() {
            4 => NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1)?.and_hms_opt(0, 0, 0),
            8 => NaiveDate::parse_from_str(text, "%Y%m%d").ok()?.and_hms_opt(0, 0, 0),
            _ => None,
        };
    }
    None
}

/// Dates written in a filter. Numeric-looking text with a dot is a float,
/// never a date.
pub fn date_from_str(text: &str) -> Option<NaiveDateTime> {
    let numeric = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
    if text.contains('.') && numeric {
        return None;
    }
    parse_date(text)
}

pub fn date_from_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(date) => Some(*date),
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

/// String form of a record value; null has none.
pub fn string_from_value(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s)),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// Decode a string literal from filter text.
///
/// `\xNN` escapes become the code point `NN`, and text consisting only of
/// code points below 256 is then reinterpreted as UTF-8 bytes, so
/// `\xc3\xa9` reads as `é`. Text that is not valid in that form is kept.
pub fn decode_literal(text: &str) -> Cow<'_, str> {
    let unescaped = unescape_hex(text);
    let latin1: Option<Vec<u8>> = unescaped
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();
    match latin1.map(String::from_utf8) {
        Some(Ok(decoded)) if decoded != text => Cow::Owned(decoded),
        _ => match unescaped {
            Cow::Owned(s) => Cow::Owned(s),
            Cow::Borrowed(_) => Cow::Borrowed(text),
        },
    }
}

fn unescape_hex(text: &str) -> Cow<'_, str> {
    if !text.contains("\\x") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find("\\x") {
        out.push_str(&rest[..index]);
        let after = &rest[index + 2..];
        match after.get(..2).and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
            Some(byte) => {
                out.push(char::from(byte));
                rest = &after[2..];
            }
            None => {
                out.push_str("\\x");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
