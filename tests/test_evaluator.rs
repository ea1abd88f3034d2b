use chrono::NaiveDate;
use dfql::Value;
use dfql::filter::evaluator::{NumberEvaluator, StringEvaluator};
use dfql::filter::{
    ComparisonOperator, DisplayFilter, Evaluator, EvaluatorTable, Expression, Literal,
    NumberEntry, Parser, TypedEvaluator,
};
use serde_json::json;
use std::net::Ipv4Addr;
use std::sync::Arc;

fn leaf(text: &str) -> Expression {
    Parser::default()
        .parse(text)
        .unwrap()
        .expressions()
        .first()
        .map(|e| (*e).clone())
        .unwrap()
}

fn evaluate(text: &str, value: impl Into<Value>) -> bool {
    Evaluator::default().evaluate(&leaf(text), &value.into())
}

#[test]
fn test_numbers_in_all_notations() {
    assert!(evaluate("f == 0x20", 32_i64));
    assert!(evaluate("f == 040", "32"));
    assert!(evaluate("f == 0o40", 32.0));
    assert!(evaluate("f < 1e3", "999"));
    assert!(!evaluate("f > 5", "abc"));
    assert!(!evaluate("f == 1", true));
}

#[test]
fn test_bitwise_and_needs_whole_numbers() {
    assert!(evaluate("f & 0x20", 48_i64));
    assert!(!evaluate("f & 0x20", 16_i64));
    assert!(evaluate("f & 4", "12"));
    assert!(!evaluate("f & 4", 12.5));
    assert!(!evaluate("f & 1.5", 3_i64));
}

#[test]
fn test_addresses_compare_numerically() {
    assert!(evaluate("f > 10.2.2.1", Ipv4Addr::new(10, 2, 2, 10)));
    assert!(evaluate("f < 10.10.0.0", "10.9.255.255"));
    assert!(evaluate("f == ::1", "0:0:0:0:0:0:0:1"));
    assert!(evaluate("f in {10.0.0.0/8, 172.16.0.0/12}", "172.20.1.1"));
    assert!(!evaluate("f in {10.0.0.0/8}", "11.0.0.1"));
}

#[test]
fn test_dates_in_several_formats() {
    let released = NaiveDate::from_ymd_opt(1999, 3, 31)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    assert!(evaluate("f > 1999/01/01", released));
    assert!(evaluate("f >= 1999-03-31", released));
    assert!(evaluate("f < 2000", "1999-12-31T23:59:59"));
    assert!(evaluate("f <= 19990331", "1999-03-31"));
}

#[test]
fn test_strings_and_patterns() {
    assert!(evaluate("f ~= bullet", "bullet-time"));
    assert!(evaluate("f ~ ^b.*e$", "bullet-time"));
    assert!(!evaluate("f ~ '^(unclosed'", "(unclosed"));
    assert!(evaluate("f == 'with space'", "with space"));
    assert!(evaluate("f == \"{'x': 'y'}\"", json!({"x": "y"})));
}

#[test]
fn test_in_lists() {
    assert!(evaluate("f in {1, 5..10}", 7_i64));
    assert!(evaluate("f in {1, 5..10}", "1"));
    assert!(evaluate("f in {1}", true));
    assert!(!evaluate("f in {2..3}", "abc"));
    assert!(evaluate("f in {\"a\", \"2\"}", 2.0));
    assert!(evaluate("f in {\"a\", \"b\"}", vec!["x", "b"]));
}

#[test]
fn test_list_items_broadcast() {
    let item = Value::from(json!([1, "two", 3.5]));
    let evaluator = Evaluator::default();
    assert!(evaluator.evaluate(&leaf("f == two"), &item));
    assert!(evaluator.evaluate(&leaf("f > 3"), &item));
    assert!(!evaluator.evaluate(&leaf("f != two"), &item));
    assert!(evaluator.evaluate(&leaf("f != four"), &item));
}

#[test]
fn test_expressions_built_by_hand() {
    let expression = Expression::compare(
        "f",
        ComparisonOperator::In,
        Literal::Numbers(vec![NumberEntry::Range { low: 1.0, high: 2.0 }]),
    );
    assert!(Evaluator::default().evaluate(&expression, &Value::Float(1.5)));
}

#[test]
fn test_empty_table_never_compares() {
    let evaluator = Evaluator::new(EvaluatorTable::empty());
    assert!(!evaluator.evaluate(&leaf("f == 1"), &Value::Integer(1)));
    assert!(evaluator.evaluate(&leaf("f"), &Value::Integer(1)));
}

struct CaselessEvaluator;

impl TypedEvaluator for CaselessEvaluator {
    fn name(&self) -> &'static str {
        "caseless"
    }

    fn accepts(&self, literal: &Literal, item: &Value) -> bool {
        literal.as_text().is_some() && item.as_str().is_some()
    }

    fn apply(&self, operator: ComparisonOperator, literal: &Literal, item: &Value) -> Option<bool> {
        let equal = item.as_str()?.eq_ignore_ascii_case(literal.as_text()?);
        match operator {
            ComparisonOperator::Eq => Some(equal),
            ComparisonOperator::Ne => Some(!equal),
            _ => None,
        }
    }
}

#[test]
fn test_custom_evaluators_replace_an_operator() {
    let caseless: Arc<dyn TypedEvaluator> = Arc::new(CaselessEvaluator);
    let number: Arc<dyn TypedEvaluator> = Arc::new(NumberEvaluator);
    let string: Arc<dyn TypedEvaluator> = Arc::new(StringEvaluator::new());
    let table = EvaluatorTable::defaults()
        .with(ComparisonOperator::Eq, vec![number, caseless])
        .with(ComparisonOperator::Contains, vec![string]);
    let filter = DisplayFilter::new().with_evaluator(Evaluator::new(table));

    let data = vec![json!({"name": "Neo", "age": 35}), json!({"name": "Trinity", "age": 32})];
    let count = |text: &str| filter.filter(text, &data).unwrap().filter_map(Result::ok).count();
    assert_eq!(count("name == NEO"), 1);
    assert_eq!(count("age == 0x23"), 1);
    assert_eq!(count("name ~= rin"), 1);
    assert_eq!(filter.parser().functions().names().count(), 3);
}
