//! Display filter parsing and evaluation
//!
//! A display filter selects records with Wireshark-style expressions.
//!
//! # Syntax
//!
//! ```text
//! field                      Field is present and not empty
//! field op value             Compare a field with a value
//! field[slice] op value      Compare part of a field
//! func(field) op value       Compare a transformed field
//! not expr / !expr           Negation
//! expr and expr              Also && ; `or` / `||` and `xor` / `^^` / `^`
//! ( expr )                   Grouping
//! ```
//!
//! `not` binds tightest, then `xor`, then `and`, then `or`, so
//! `a or b and c` reads as `a or (b and c)`. Operators need whitespace on
//! both sides: `age==1` does not parse.
//!
//! # Comparison operators
//!
//! - `==` / `eq`, `!=` / `neq`
//! - `>=` / `ge`, `>` / `gt`, `<=` / `le`, `<` / `lt`
//! - `~=` / `contains`, `~` / `matches` (regular expression search)
//! - `in` with a `{}` list, `&` (bitwise and)
//!
//! # Values
//!
//! Unquoted words, `'single'` or `"double"` quoted strings, and lists:
//! `{1, 2..5, 7-9}`, `{"Neo", "Trinity"}` or `{10.0.0.0/8, 192.168.0-1.*}`.
//!
//! # Slices
//!
//! `[0]`, `[1:3]`, `[:2]`, `[2:]`, `[1-2]` (one-based, inclusive) and
//! comma-separated combinations. MAC, IPv4 and IPv6 values are sliced by
//! their groups, everything else by characters.
//!
//! # Examples
//!
//! ```text
//! name == Neo
//! age >= 32 and gender == male
//! gender == male and not (age > 35)
//! age in {30..40}
//! ipv4 in {10.2.2.2/24}
//! mac[0:2] == 00:83
//! len(name) == 3
//! ```

pub mod combinator;
pub mod convert;
pub mod display_filter;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod iprange;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod slice;

pub use display_filter::{DisplayFilter, Filtered};
pub use error::{EvaluationError, FunctionError, ParserError, SliceError};
pub use evaluator::{Evaluator, EvaluatorTable, TypedEvaluator};
pub use expression::{ComparisonOperator, Expression, FilterTree, LogicalOperator, Node};
pub use functions::{BUILTIN_FUNCTIONS, DEFAULT_FUNCTIONS, Function, FunctionTable};
pub use iprange::{Ipv4Range, OctetSet};
pub use literal::{Literal, NumberEntry};
pub use parser::Parser;
pub use slice::{
    Ipv4Slicer, Ipv6Slicer, MacSlicer, SliceEntry, SliceSpec, Sliceable, Slicer, SlicerSet, slice_value,
};
