//! Typed comparison of an expression literal against a record value.
//!
//! Each operator maps to an ordered list of [`TypedEvaluator`]s. The first
//! evaluator that can convert both sides decides, except that a `false` from
//! a non-`!=` operator lets the next accepting evaluator try.

use super::convert;
use super::expression::{ComparisonOperator, Expression};
use super::literal::Literal;
use crate::value::Value;
use log::debug;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

/// A comparison strategy for one target type
pub trait TypedEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether both sides convert to this evaluator's type. For a non-empty
    /// list item, at least one element has to convert.
    fn accepts(&self, literal: &Literal, item: &Value) -> bool;

    /// Compare one (scalar) item; `None` when a side does not convert.
    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool>;
}

fn accepts_scalar_or_any(item: &Value, converts: impl Fn(&Value) -> bool) -> bool {
    match item {
        Value::List(items) if !items.is_empty() => items.iter().any(converts),
        other => converts(other),
    }
}

fn compare<T: PartialOrd>(operator: ComparisonOperator, item: T, literal: T) -> Option<bool> {
    let ordering = item.partial_cmp(&literal)?;
    Some(match operator {
        ComparisonOperator::Eq => ordering == Ordering::Equal,
        ComparisonOperator::Ne => ordering != Ordering::Equal,
        ComparisonOperator::Ge => ordering != Ordering::Less,
        ComparisonOperator::Gt => ordering == Ordering::Greater,
        ComparisonOperator::Le => ordering != Ordering::Greater,
        ComparisonOperator::Lt => ordering == Ordering::Less,
        _ => return None,
    })
}

/// Floats, hex, octal and decimal numbers
pub struct NumberEvaluator;

impl TypedEvaluator for NumberEvaluator {
    fn name(&self) -> &'static str {
        "number"
    }

    fn accepts(&self, literal: &Literal, item: &Value) -> bool {
        literal.as_text().and_then(convert::number_from_str).is_some()
            && accepts_scalar_or_any(item, |v| convert::number_from_value(v).is_some())
    }

    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let expected = convert::number_from_str(literal.as_text()?)?;
        compare(operator, convert::number_from_value(item)?, expected)
    }
}

/// Whole numbers, used for the bitwise `&`
pub struct IntegerEvaluator;

impl TypedEvaluator for IntegerEvaluator {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn accepts(&self, literal: &Literal, item: &Value) -> bool {
        literal.as_text().and_then(convert::integer_from_str).is_some()
            && accepts_scalar_or_any(item, |v| convert::integer_from_value(v).is_some())
    }

    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let mask = convert::integer_from_str(literal.as_text()?)?;
        let item = convert::integer_from_value(item)?;
        match operator {
            ComparisonOperator::BitwiseAnd => Some(item & mask != 0),
            other => compare(other, item, mask),
        }
    }
}

pub struct Ipv4Evaluator;

impl TypedEvaluator for Ipv4Evaluator {
    fn name(&self) -> &'static str {
        "ipv4"
    }

    fn accepts(&self, literal: &Literal, item: &Value) -> bool {
        literal.as_text().and_then(convert::ipv4_from_str).is_some()
            && accepts_scalar_or_any(item, |v| convert::ipv4_from_value(v).is_some())
    }

    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let expected = convert::ipv4_from_str(literal.as_text()?)?;
        compare(operator, convert::ipv4_from_value(item)?, expected)
    }
}

pub struct Ipv6Evaluator;

impl TypedEvaluator for Ipv6Evaluator {
    fn name(&self) -> &'static str {
        "ipv6"
    }

    fn accepts(&self, literal: &Literal, item: &Value) -> bool {
        literal.as_text().and_then(convert::ipv6_from_str).is_some()
            && accepts_scalar_or_any(item, |v| convert::ipv6_from_value(v).is_some())
    }

    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let expected = convert::ipv6_from_str(literal.as_text()?)?;
        compare(operator, convert::ipv6_from_value(item)?, expected)
    }
}

pub struct DateEvaluator;

impl TypedEvaluator for DateEvaluator {
    fn name(&self) -> &'static str {
        "date"
    }

    fn accepts(&self, literal: &Literal, item: &Value) -> bool {
        literal.as_text().and_then(convert::date_from_str).is_some()
            && accepts_scalar_or_any(item, |v| convert::date_from_value(v).is_some())
    }

    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let expected = convert::date_from_str(literal.as_text()?)?;
        compare(operator, convert::date_from_value(item)?, expected)
    }
}

/// Distinct patterns kept compiled before the cache starts over.
const PATTERN_CACHE_LIMIT: usize = 128;

/// String equality, containment and regular expression search.
///
/// Compiled patterns are cached per evaluator, up to
/// [`PATTERN_CACHE_LIMIT`] of them; an invalid pattern never matches.
#[derive(Default)]
pub struct StringEvaluator {
    patterns: Mutex<HashMap<String, Option<Regex>>>,
}

impl StringEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn search(&self, pattern: &str, haystack: &str) -> bool {
        let compile = || Regex::new(pattern).ok();
        match self.patterns.lock() {
            Ok(mut cache) => {
                if cache.len() >= PATTERN_CACHE_LIMIT && !cache.contains_key(pattern) {
                    cache.clear();
                }
                cache
                    .entry(pattern.to_string())
                    .or_insert_with(compile)
                    .as_ref()
                    .is_some_and(|re| re.is_match(haystack))
            }
            Err(_) => compile().is_some_and(|re| re.is_match(haystack)),
        }
    }

    #[cfg(test)]
    fn cached_patterns(&self) -> usize {
        self.patterns.lock().map_or(0, |cache| cache.len())
    }
}

impl TypedEvaluator for StringEvaluator {
    fn name(&self) -> &'static str {
        "string"
    }

    fn accepts(&self, literal: &Literal, _item: &Value) -> bool {
        literal.as_text().is_some()
    }

    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let expected = convert::decode_literal(literal.as_text()?);
        let item = convert::string_from_value(item)?;
        match operator {
            ComparisonOperator::Eq => Some(item == expected),
            ComparisonOperator::Ne => Some(item != expected),
            ComparisonOperator::Contains => Some(item.contains(expected.as_ref())),
            ComparisonOperator::Matches => Some(self.search(&expected, &item)),
            _ => None,
        }
    }
}

/// `in` against address range lists
pub struct Ipv4RangeEvaluator;

impl TypedEvaluator for Ipv4RangeEvaluator {
    fn name(&self) -> &'static str {
        "ipv4-range"
    }

    fn accepts(&self, literal: &Literal, item: &Value) -> bool {
        matches!(literal, Literal::Addresses(_))
            && accepts_scalar_or_any(item, |v| convert::ipv4_from_value(v).is_some())
    }

    fn apply(&self, _operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let Literal::Addresses(ranges) = literal else {
            return None;
        };
        let addr = convert::ipv4_from_value(item)?;
        Some(ranges.iter().any(|range| range.contains(addr)))
    }
}

/// `in` against number or string lists
pub struct ListEvaluator;

impl TypedEvaluator for ListEvaluator {
    fn name(&self) -> &'static str {
        "list"
    }

    fn accepts(&self, literal: &Literal, _item: &Value) -> bool {
        literal.is_list()
    }

    fn apply(&self, _operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        match literal {
            Literal::Numbers(entries) => Some(
                convert::loose_number(item)
                    .is_some_and(|n| entries.iter().any(|entry| entry.contains(n))),
            ),
            Literal::Strings(entries) => Some(entries.iter().any(|entry| {
                match (convert::loose_number(item), convert::parse_float(entry)) {
                    (Some(a), Some(b)) => a == b,
                    _ => item.as_str() == Some(entry.as_str()),
                }
            })),
            Literal::Addresses(_) => Some(false),
            Literal::Text(_) => None,
        }
    }
}

/// Operator → ordered evaluators
#[derive(Clone, Default)]
pub struct EvaluatorTable {
    evaluators: BTreeMap<ComparisonOperator, Vec<Arc<dyn TypedEvaluator>>>,
}

impl fmt::Debug for EvaluatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (operator, evaluators) in &self.evaluators {
            let names: Vec<&str> = evaluators.iter().map(|e| e.name()).collect();
            map.entry(&operator.symbol(), &names);
        }
        map.finish()
    }
}

impl EvaluatorTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The full default mapping
    pub fn defaults() -> Self {
        use ComparisonOperator::*;

        let number: Arc<dyn TypedEvaluator> = Arc::new(NumberEvaluator);
        let ipv4: Arc<dyn TypedEvaluator> = Arc::new(Ipv4Evaluator);
        let ipv6: Arc<dyn TypedEvaluator> = Arc::new(Ipv6Evaluator);
        let date: Arc<dyn TypedEvaluator> = Arc::new(DateEvaluator);
        let string: Arc<dyn TypedEvaluator> = Arc::new(StringEvaluator::new());
        let integer: Arc<dyn TypedEvaluator> = Arc::new(IntegerEvaluator);
        let ipv4_range: Arc<dyn TypedEvaluator> = Arc::new(Ipv4RangeEvaluator);
        let list: Arc<dyn TypedEvaluator> = Arc::new(ListEvaluator);

        let mut table = Self::empty();
        for operator in [Eq, Ne] {
            table = table.with(operator, vec![number.clone(), ipv4.clone(), ipv6.clone(), string.clone()]);
        }
        table = table
            .with(Matches, vec![string.clone()])
            .with(Contains, vec![string]);
        for operator in [Ge, Gt, Le, Lt] {
            table = table.with(operator, vec![ipv4.clone(), ipv6.clone(), date.clone(), number.clone()]);
        }
        table
            .with(BitwiseAnd, vec![integer])
            .with(In, vec![ipv4_range, list])
    }

    /// Replace the evaluators used for `operator`.
    pub fn with(mut self, operator: ComparisonOperator, evaluators: Vec<Arc<dyn TypedEvaluator>>) -> Self {
        self.evaluators.insert(operator, evaluators);
        self
    }

    pub fn get(&self, operator: ComparisonOperator) -> &[Arc<dyn TypedEvaluator>] {
        self.evaluators.get(&operator).map_or(&[], Vec::as_slice)
    }
}

/// Decides a single leaf predicate against an already resolved value.
#[derive(Debug, Clone)]
pub struct Evaluator {
    table: EvaluatorTable,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorTable::defaults())
    }
}

impl Evaluator {
    pub fn new(table: EvaluatorTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &EvaluatorTable {
        &self.table
    }

    /// Never fails: values that do not convert simply do not match, except
    /// under `!=` where an impossible comparison counts as a difference.
    pub fn evaluate(&self, expression: &Expression, item: &Value) -> bool {
        let (Some(operator), Some(literal)) = (expression.operator, &expression.value) else {
            return item.is_present();
        };

        for evaluator in self.table.get(operator) {
            if !evaluator.accepts(literal, item) {
                continue;
            }
            let result = broadcast(evaluator.as_ref(), operator, literal, item);
            debug!(
                "{} evaluator: {} {operator} {literal} = {result}",
                evaluator.name(),
                item
            );
            if result || operator == ComparisonOperator::Ne {
                return result;
            }
        }
        false
    }
}

/// Lists match when any element does; under `!=` every element must differ.
fn broadcast(
    evaluator: &dyn TypedEvaluator,
    operator: ComparisonOperator,
    literal: &Literal,
    item: &Value,
) -> bool {
    let single = |value: &Value| {
        evaluator
            .apply(operator, literal, value)
            .unwrap_or(operator == ComparisonOperator::Ne)
    };
    match item {
        Value::List(items) if !items.is_empty() => {
            if operator == ComparisonOperator::Ne {
                items.iter().all(single)
            } else {
                items.iter().any(single)
            }
        }
        other => single(other),
    }
}
