use super::combinator;
use super::error::{EvaluationError, ParserError};
use super::evaluator::Evaluator;
use super::expression::{Expression, FilterTree};
use super::functions::FunctionTable;
use super::parser::Parser;
use super::slice::SlicerSet;
use crate::record::Record;
use crate::value::Value;
use log::warn;
use std::borrow::Cow;

/// Parses display filters and applies them to records.
///
/// ```
/// use dfql::filter::DisplayFilter;
/// use serde_json::json;
///
/// let records = vec![
///     json!({"name": "Neo", "age": 35}),
///     json!({"name": "Trinity", "age": 32}),
/// ];
/// let filter = DisplayFilter::new();
/// let matches: Vec<_> = filter
///     .filter("age >= 32 and name == Neo", &records)
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(matches, vec![&records[0]]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DisplayFilter {
    parser: Parser,
    evaluator: Evaluator,
    slicers: SlicerSet,
}

impl DisplayFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict filters to the given field paths.
    pub fn with_field_names<I, S>(self, field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = field_names.into_iter().map(Into::into).collect();
        Self {
            parser: Parser::new(Some(names), Some(self.parser.functions().clone())),
            ..self
        }
    }

    pub fn with_functions(self, functions: FunctionTable) -> Self {
        let names = self.parser.field_names().map(<[String]>::to_vec);
        Self {
            parser: Parser::new(names, Some(functions)),
            ..self
        }
    }

    pub fn with_evaluator(self, evaluator: Evaluator) -> Self {
        Self { evaluator, ..self }
    }

    /// Replace the slicers used for `field[...]`.
    pub fn with_slicers(self, slicers: SlicerSet) -> Self {
        Self { slicers, ..self }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn parse(&self, text: &str) -> Result<FilterTree, ParserError> {
        self.parser.parse(text)
    }

    /// The value an expression compares: the field, sliced, then passed
    /// through the expression's function.
    pub fn resolve<R: Record + ?Sized>(
        &self,
        expression: &Expression,
        record: &R,
    ) -> Result<Value, EvaluationError> {
        let mut value = record.resolve(&expression.field);
        if let Some(slice) = &expression.slice {
            value = self.slicers.slice(slice, &value)?;
        }
        if let Some(function) = &expression.function {
            value = function
                .call(&value)
                .map_err(|err| EvaluationError::Function {
                    name: function.name().to_string(),
                    message: err.to_string(),
                })?;
        }
        Ok(value)
    }

    /// Whether one record satisfies the tree. The empty tree matches all.
    pub fn matches<R: Record + ?Sized>(
        &self,
        tree: &FilterTree,
        record: &R,
    ) -> Result<bool, EvaluationError> {
        if tree.is_empty() {
            return Ok(true);
        }
        combinator::reduce(tree.nodes(), &mut |expression: &Expression| {
            let value = self.resolve(expression, record)?;
            Ok(self.evaluator.evaluate(expression, &value))
        })
    }

    /// Lazily yield the records matching an already parsed tree.
    pub fn apply<'a, I>(&'a self, tree: &'a FilterTree, records: I) -> Filtered<'a, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Record,
    {
        Filtered::new(self, Cow::Borrowed(tree), records.into_iter())
    }

    /// Parse `text` and lazily yield the matching records.
    pub fn filter<'a, I>(&'a self, text: &str, records: I) -> Result<Filtered<'a, I::IntoIter>, ParserError>
    where
        I: IntoIterator,
        I::Item: Record,
    {
        let tree = self.parse(text)?;
        Ok(Filtered::new(self, Cow::Owned(tree), records.into_iter()))
    }
}

/// Iterator over matching records, in input order.
///
/// Records whose evaluation fails on their own data (a slice out of range, a
/// function applied to the wrong type) are skipped with a warning. A
/// malformed tree is yielded once as an error and ends the iteration.
pub struct Filtered<'a, I> {
    filter: &'a DisplayFilter,
    tree: Cow<'a, FilterTree>,
    records: I,
    failed: bool,
}

impl<'a, I> Filtered<'a, I> {
    fn new(filter: &'a DisplayFilter, tree: Cow<'a, FilterTree>, records: I) -> Self {
        Self {
            filter,
            tree,
            records,
            failed: false,
        }
    }

    pub fn tree(&self) -> &FilterTree {
        &self.tree
    }
}

impl<I> Iterator for Filtered<'_, I>
where
    I: Iterator,
    I::Item: Record,
{
    type Item = Result<I::Item, EvaluationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for record in self.records.by_ref() {
            match self.filter.matches(&self.tree, &record) {
                Ok(true) => return Some(Ok(record)),
                Ok(false) => {}
                Err(err) if err.is_structural() => {
                    self.failed = true;
                    return Some(Err(err));
                }
                Err(err) => warn!("Skipping record: {err}"),
            }
        }
        None
    }
}
