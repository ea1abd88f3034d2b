//! Tabular rendering of filter results.

use crate::filter::{DisplayFilter, EvaluationError, ParserError};
use crate::sources::Dataset;
use crate::value::Value;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Create a table with the shared look and a bold header row.
pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

/// The records matching one query, with the time it took.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Value>,
    elapsed: Duration,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Value>, elapsed: Duration) -> Self {
        Self {
            columns,
            rows,
            elapsed,
        }
    }

    /// Run `text` against the dataset and collect the matches.
    pub fn query(
        filter: &DisplayFilter,
        text: &str,
        dataset: &Dataset,
    ) -> Result<ResultTable, QueryError> {
        let start = Instant::now();
        let rows = filter
            .filter(text, &dataset.records)?
            .map(|record| record.cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(dataset.columns.clone(), rows, start.elapsed()))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn footer(&self) -> String {
        let secs = self.elapsed.as_secs_f64();
        match self.rows.len() {
            0 => format!("Empty set ({secs:.2} secs)"),
            1 => format!("1 row in set ({secs:.2} secs)"),
            n => format!("{n} rows in set ({secs:.2} secs)"),
        }
    }

    /// The table followed by a blank line and the footer.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.rows.is_empty() {
            let headers: Vec<&str> = self.columns.iter().map(String::as_str).collect();
            let mut table = create_styled_table(&headers);
            for row in &self.rows {
                table.add_row(
                    self.columns
                        .iter()
                        .map(|column| Cell::new(cell_text(row.get_path(column)))),
                );
            }
            let _ = writeln!(out, "{table}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.footer());
        out
    }

    /// Matches as a pretty JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.rows)
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Field names a filter can reference, sorted.
///
/// Without `nested` these are the top-level keys of every record; with it,
/// nested maps are expanded into dotted leaf paths.
pub fn fields(records: &[Value], nested: bool) -> Vec<String> {
    let mut names = BTreeSet::new();
    for record in records {
        if let Value::Map(map) = record {
            for (key, value) in map {
                if nested {
                    collect_leaves(key, value, &mut names);
                } else {
                    names.insert(key.clone());
                }
            }
        }
    }
    names.into_iter().collect()
}

fn collect_leaves(prefix: &str, value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Map(map) if !map.is_empty() => {
            for (key, child) in map {
                collect_leaves(&format!("{prefix}.{key}"), child, names);
            }
        }
        _ => {
            names.insert(prefix.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Value {
        Value::from(value)
    }

    #[test]
    fn test_footer_wording() {
        let one = ResultTable::new(vec![], vec![record(json!({"a": "1"}))], Duration::from_secs(1));
        assert_eq!(one.footer(), "1 row in set (1.00 secs)");

        let two = ResultTable::new(
            vec![],
            vec![record(json!({})), record(json!({}))],
            Duration::from_millis(250),
        );
        assert_eq!(two.footer(), "2 rows in set (0.25 secs)");

        let none = ResultTable::new(vec![], vec![], Duration::from_secs(1));
        assert_eq!(none.footer(), "Empty set (1.00 secs)");
        assert_eq!(none.render(), "\nEmpty set (1.00 secs)\n");
    }

    #[test]
    fn test_render_contains_cells() {
        let table = ResultTable::new(
            vec!["a".into(), "aa".into(), "missing".into()],
            vec![record(json!({"a": "1234", "aa": 2}))],
            Duration::ZERO,
        );
        let rendered = table.render();
        assert!(rendered.contains("1234"));
        assert!(rendered.contains("aa"));
        assert!(rendered.ends_with("1 row in set (0.00 secs)\n"));
    }

    #[test]
    fn test_fields_top_level_and_nested() {
        let records = vec![
            record(json!({"a": "1234", "aa": "2", "aaa": "3"})),
            record(json!({"b": "1234"})),
            record(json!({"c": ["1", "2"]})),
            record(json!({"d": {"da": "4", "db": {"x": 1}}})),
        ];
        assert_eq!(fields(&records, false), vec!["a", "aa", "aaa", "b", "c", "d"]);
        assert_eq!(
            fields(&records, true),
            vec!["a", "aa", "aaa", "b", "c", "d.da", "d.db.x"]
        );
    }
}
