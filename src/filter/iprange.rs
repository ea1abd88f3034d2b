//! IPv4 range specifiers used inside `{}` lists.
//!
//! ```text
//! 127.0.0.1            single address
//! 192.168.0.1/24       CIDR block
//! 192.168.0.1-10       range in the last octet
//! 192.168-169.*.1,2,3  per-octet lists, ranges and wildcards
//! ```
//!
//! A specifier is resolved to one inclusion set per octet; an address is in
//! the range when each of its octets is in the matching set.

use super::lexer::Cursor;
use std::fmt;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

/// Inclusive octet ranges accepted at one position of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetSet(pub Vec<RangeInclusive<u8>>);

impl OctetSet {
    pub fn contains(&self, octet: u8) -> bool {
        self.0.iter().any(|range| range.contains(&octet))
    }

    fn single(&self) -> Option<u8> {
        match self.0.as_slice() {
            [range] if range.start() == range.end() => Some(*range.start()),
            _ => None,
        }
    }
}

impl fmt::Display for OctetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.as_slice() == [0..=255] {
            return write!(f, "*");
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|range| {
                if range.start() == range.end() {
                    range.start().to_string()
                } else {
                    format!("{}-{}", range.start(), range.end())
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// A resolved IPv4 range specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Range {
    pub octets: [OctetSet; 4],
}

impl Ipv4Range {
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.octets
            .iter()
            .zip(addr.octets())
            .all(|(set, octet)| set.contains(octet))
    }

    /// Build the per-octet sets covered by `addr/prefix`.
    pub fn from_cidr(addr: Ipv4Addr, prefix: u8) -> Result<Self, String> {
        if prefix > 32 {
            return Err(format!("invalid prefix length /{prefix}"));
        }
        let mask = if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix))
        };
        let low = (u32::from(addr) & mask).to_be_bytes();
        let high = (u32::from(addr) | !mask).to_be_bytes();
        Ok(Self {
            octets: std::array::from_fn(|i| OctetSet(vec![low[i]..=high[i]])),
        })
    }

    /// Parse one specifier at the cursor.
    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self, String> {
        let start = cursor.pos();
        let mut octets = Vec::with_capacity(4);
        for index in 0..4 {
            if index > 0 && !cursor.eat(".") {
                cursor.reset(start);
                return Err(format!("expected four octets at position {}", cursor.pos()));
            }
            octets.push(parse_octet(cursor, index == 3)?);
        }

        let before_prefix = cursor.pos();
        if cursor.eat("/") {
            let Some(prefix) = cursor.signed_integer() else {
                cursor.reset(before_prefix);
                return Err(format!("expected prefix length at position {}", cursor.pos()));
            };
            let singles: Option<Vec<u8>> = octets.iter().map(OctetSet::single).collect();
            let Some(singles) = singles else {
                return Err("a prefix length requires a plain address".to_string());
            };
            let prefix = u8::try_from(prefix).map_err(|_| format!("invalid prefix length /{prefix}"))?;
            let addr = Ipv4Addr::new(singles[0], singles[1], singles[2], singles[3]);
            return Self::from_cidr(addr, prefix);
        }

        let octets: [OctetSet; 4] = octets
            .try_into()
            .map_err(|_| "expected four octets".to_string())?;
        Ok(Self { octets })
    }
}

impl fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.octets.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

fn parse_octet(cursor: &mut Cursor<'_>, last: bool) -> Result<OctetSet, String> {
    let mut ranges = Vec::new();
    loop {
        ranges.push(parse_octet_entry(cursor)?);
        let before_comma = cursor.pos();
        if !cursor.eat(",") {
            break;
        }
        // In the last octet a comma may also separate whole specifiers:
        // `10.0.0.1,10.0.0.2` lists two addresses, not octet `1,10`.
        if last && next_is_address(cursor) {
            cursor.reset(before_comma);
            break;
        }
        if !matches!(cursor.peek(), Some(c) if c.is_ascii_digit() || c == '*') {
            cursor.reset(before_comma);
            break;
        }
    }
    Ok(OctetSet(ranges))
}

fn next_is_address(cursor: &Cursor<'_>) -> bool {
    let mut lookahead = cursor.clone();
    lookahead.skip_ws();
    !lookahead.take_while(|c| c.is_ascii_digit()).is_empty() && lookahead.peek() == Some('.')
}

fn parse_octet_entry(cursor: &mut Cursor<'_>) -> Result<RangeInclusive<u8>, String> {
    if cursor.eat("*") {
        return Ok(0..=255);
    }
    let low = octet_number(cursor)?;
    let before_dash = cursor.pos();
    if cursor.eat("-") {
        match octet_number(cursor) {
            Ok(high) if high >= low => return Ok(low..=high),
            Ok(high) => return Err(format!("empty octet range {low}-{high}")),
            Err(_) => cursor.reset(before_dash),
        }
    }
    Ok(low..=low)
}

fn octet_number(cursor: &mut Cursor<'_>) -> Result<u8, String> {
    let pos = cursor.pos();
    let digits = cursor.take_while(|c| c.is_ascii_digit());
    if digits.is_empty() {
        return Err(format!("expected octet at position {pos}"));
    }
    digits.parse().map_err(|_| {
        cursor.reset(pos);
        format!("octet {digits} out of range")
    })
}
