//! Slice specifications (`[0]`, `[1:3]`, `[1-2]`, `[:2,3-4]`) and the
//! address-aware slicers that apply them. Custom [`Slicer`]s can be added
//! to a [`SlicerSet`].

use super::error::SliceError;
use super::lexer::Cursor;
use crate::value::Value;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::Range;
use std::sync::{Arc, LazyLock};

static MAC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(?:[:.-][0-9A-Fa-f]{2}){5}$").expect("valid mac regex")
});

/// One comma-separated entry of a slice specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceEntry {
    /// A single chunk (or character when no separator applies)
    Index(i64),
    /// Half-open range, `None` meaning open-ended
    Range { start: Option<i64>, end: Option<i64> },
}

/// A normalized slice specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSpec(pub Vec<SliceEntry>);

impl SliceSpec {
    pub fn entries(&self) -> &[SliceEntry] {
        &self.0
    }

    /// Parse `[...]` at the cursor. Returns `Ok(None)` when no `[` is present.
    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Option<SliceSpec>, String> {
        if !cursor.eat("[") {
            return Ok(None);
        }
        let mut entries = Vec::new();
        loop {
            cursor.skip_ws();
            entries.push(parse_entry(cursor)?);
            cursor.skip_ws();
            if cursor.eat(",") {
                continue;
            }
            if cursor.eat("]") {
                return Ok(Some(SliceSpec(entries)));
            }
            return Err(format!(
                "expected ',' or ']' in slice at position {}",
                cursor.pos()
            ));
        }
    }
}

impl std::str::FromStr for SliceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor::new(s.trim());
        match SliceSpec::parse(&mut cursor)? {
            Some(spec) if cursor.is_eof() => Ok(spec),
            Some(_) => Err(format!("unexpected input after slice: '{}'", cursor.rest())),
            None => Err(format!("expected '[' in slice '{s}'")),
        }
    }
}

fn parse_entry(cursor: &mut Cursor<'_>) -> Result<SliceEntry, String> {
    if cursor.eat(":") {
        cursor.skip_ws();
        let end = cursor
            .signed_integer()
            .ok_or_else(|| format!("expected slice end at position {}", cursor.pos()))?;
        return Ok(SliceEntry::Range {
            start: None,
            end: Some(end),
        });
    }

    let start = cursor
        .signed_integer()
        .ok_or_else(|| format!("expected slice index at position {}", cursor.pos()))?;
    let after_start = cursor.pos();
    cursor.skip_ws();

    if cursor.eat(":") {
        let before_end = cursor.pos();
        cursor.skip_ws();
        let end = cursor.signed_integer();
        if end.is_none() {
            cursor.reset(before_end);
        }
        return Ok(SliceEntry::Range {
            start: Some(start),
            end,
        });
    }

    if cursor.eat("-") {
        cursor.skip_ws();
        let end = cursor
            .signed_integer()
            .ok_or_else(|| format!("expected range end at position {}", cursor.pos()))?;
        return Ok(dash_range(start, end));
    }

    cursor.reset(after_start);
    Ok(SliceEntry::Index(start))
}

/// `a-b` is 1-based and inclusive; it becomes the half-open `[a-1, b)`.
/// A negative start is kept as written (counting from the end).
fn dash_range(start: i64, end: i64) -> SliceEntry {
    let start = if start < 0 { start } else { start - 1 };
    SliceEntry::Range {
        start: Some(start),
        end: Some(end),
    }
}

impl fmt::Display for SliceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|entry| match entry {
                SliceEntry::Index(i) => i.to_string(),
                SliceEntry::Range { start, end } => format!(
                    "{}:{}",
                    start.map(|s| s.to_string()).unwrap_or_default(),
                    end.map(|e| e.to_string()).unwrap_or_default()
                ),
            })
            .collect();
        write!(f, "[{}]", parts.join(","))
    }
}

/// Text prepared for slicing. Range bounds count chunks between
/// `separator`s, or characters when there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sliceable {
    pub text: String,
    pub separator: Option<char>,
}

/// Recognises one kind of value and says how it is sliced.
pub trait Slicer: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when `value` is not of this kind.
    fn prepare(&self, value: &Value) -> Option<Sliceable>;
}

fn scalar_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// MAC addresses, with one of `:`, `-` or `.` between all octets
pub struct MacSlicer;

impl Slicer for MacSlicer {
    fn name(&self) -> &'static str {
        "mac"
    }

    fn prepare(&self, value: &Value) -> Option<Sliceable> {
        let text = scalar_text(value);
        if !MAC_RE.is_match(&text) {
            return None;
        }
        let separator = text.chars().nth(2)?;
        if !text.chars().skip(2).step_by(3).all(|c| c == separator) {
            return None;
        }
        Some(Sliceable {
            text: text.into_owned(),
            separator: Some(separator),
        })
    }
}

pub struct Ipv4Slicer;

impl Slicer for Ipv4Slicer {
    fn name(&self) -> &'static str {
        "ipv4"
    }

    fn prepare(&self, value: &Value) -> Option<Sliceable> {
        let addr = match value {
            Value::Ipv4(addr) => *addr,
            other => scalar_text(other).parse::<Ipv4Addr>().ok()?,
        };
        Some(Sliceable {
            text: addr.to_string(),
            separator: Some('.'),
        })
    }
}

/// IPv6 addresses, sliced by the groups of their expanded form
pub struct Ipv6Slicer;

impl Slicer for Ipv6Slicer {
    fn name(&self) -> &'static str {
        "ipv6"
    }

    fn prepare(&self, value: &Value) -> Option<Sliceable> {
        let addr = match value {
            Value::Ipv6(addr) => *addr,
            other => scalar_text(other).parse::<Ipv6Addr>().ok()?,
        };
        Some(Sliceable {
            text: explode_ipv6(&addr),
            separator: Some(':'),
        })
    }
}

/// Ordered slicers; the first that recognises a value slices it, anything
/// else is sliced by characters.
#[derive(Clone)]
pub struct SlicerSet {
    slicers: Vec<Arc<dyn Slicer>>,
}

impl fmt::Debug for SlicerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Default for SlicerSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl SlicerSet {
    /// Slice everything by characters.
    pub fn empty() -> Self {
        Self {
            slicers: Vec::new(),
        }
    }

    /// MAC, then IPv4, then IPv6
    pub fn defaults() -> Self {
        Self::empty()
            .with(Arc::new(MacSlicer))
            .with(Arc::new(Ipv4Slicer))
            .with(Arc::new(Ipv6Slicer))
    }

    /// Append a slicer, tried after the ones already present.
    pub fn with(mut self, slicer: Arc<dyn Slicer>) -> Self {
        self.slicers.push(slicer);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.slicers.iter().map(|slicer| slicer.name()).collect()
    }

    pub fn prepare(&self, value: &Value) -> Sliceable {
        self.slicers
            .iter()
            .find_map(|slicer| slicer.prepare(value))
            .unwrap_or_else(|| Sliceable {
                text: scalar_text(value).into_owned(),
                separator: None,
            })
    }

    /// Null passes through so that absent fields stay absent; lists and maps
    /// cannot be sliced. Other scalars are sliced through their string form.
    pub fn slice(&self, spec: &SliceSpec, value: &Value) -> Result<Value, SliceError> {
        match value {
            Value::Null => return Ok(Value::Null),
            Value::List(_) | Value::Map(_) => return Err(SliceError::Unsliceable(value.kind())),
            _ => {}
        }
        let Sliceable { text, separator } = self.prepare(value);
        slice_text(spec, &text, separator).map(Value::String)
    }
}

/// Fully expanded IPv6 form: eight groups of four lowercase hex digits.
pub fn explode_ipv6(addr: &Ipv6Addr) -> String {
    addr.segments()
        .iter()
        .map(|segment| format!("{segment:04x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Apply a slice specification with the default slicers.
pub fn slice_value(spec: &SliceSpec, value: &Value) -> Result<Value, SliceError> {
    static DEFAULT_SLICERS: LazyLock<SlicerSet> = LazyLock::new(SlicerSet::defaults);
    DEFAULT_SLICERS.slice(spec, value)
}

/// Slice `text`, interpreting range bounds as chunk indices when a separator
/// is active and as character offsets otherwise.
pub fn slice_text(
    spec: &SliceSpec,
    text: &str,
    separator: Option<char>,
) -> Result<String, SliceError> {
    let chars: Vec<char> = text.chars().collect();
    let separator_positions: Vec<usize> = match separator {
        Some(sep) => chars
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| (c == sep).then_some(i))
            .collect(),
        None => Vec::new(),
    };
    let parts: Vec<String> = match separator {
        Some(sep) => text.split(sep).map(str::to_string).collect(),
        None => chars.iter().map(char::to_string).collect(),
    };

    // Bound `i` of a chunk range maps to the character after (left) or at
    // (right) the i-th separator; zero stays zero.
    let chunk_bound = |bound: i64, left: bool| -> Result<i64, SliceError> {
        if separator.is_none() || bound == 0 {
            return Ok(bound);
        }
        let idx = py_index(bound - 1, separator_positions.len())?;
        let position = separator_positions[idx] as i64;
        Ok(if left { position + 1 } else { position })
    };

    let mut pieces = Vec::with_capacity(spec.0.len());
    for entry in &spec.0 {
        match *entry {
            SliceEntry::Index(index) => {
                pieces.push(parts[py_index(index, parts.len())?].clone());
            }
            SliceEntry::Range { start, end } => {
                let start = start.map(|s| chunk_bound(s, true)).transpose()?;
                let end = end.map(|e| chunk_bound(e, false)).transpose()?;
                pieces.push(chars[py_range(start, end, chars.len())].iter().collect());
            }
        }
    }

    let joiner = separator.map(String::from).unwrap_or_default();
    Ok(pieces.join(&joiner))
}

/// Resolve a possibly negative index the way sequence indexing does.
fn py_index(index: i64, len: usize) -> Result<usize, SliceError> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved >= len as i64 {
        return Err(SliceError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// Clamp slice bounds the way sequence slicing does.
fn py_range(start: Option<i64>, end: Option<i64>, len: usize) -> Range<usize> {
    let len = len as i64;
    let clamp = |bound: i64| -> i64 {
        if bound < 0 {
            (bound + len).max(0)
        } else {
            bound.min(len)
        }
    };
    let start = start.map_or(0, clamp);
    let end = end.map_or(len, clamp);
    if end <= start {
        return 0..0;
    }
    start as usize..end as usize
}
