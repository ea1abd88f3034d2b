//! Reduces a filter tree to a single boolean for one record.
//!
//! Every leaf is evaluated first and the resulting stream of booleans and
//! connectives is then folded: `not` applies to the operand right after it,
//! `xor` binds tighter than `and`, which binds tighter than `or`. Each level
//! groups left to right.

use super::error::EvaluationError;
use super::expression::{Expression, LogicalOperator, Node};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Bool(bool),
    Op(LogicalOperator),
}

/// Reduce `nodes` using `leaf` to decide each expression.
pub fn reduce<F>(nodes: &[Node], leaf: &mut F) -> Result<bool, EvaluationError>
where
    F: FnMut(&Expression) -> Result<bool, EvaluationError>,
{
    let mut tokens = Vec::with_capacity(nodes.len());
    for node in nodes {
        tokens.push(match node {
            Node::Expression(expression) => Token::Bool(leaf(expression)?),
            Node::Group(children) => Token::Bool(reduce(children, leaf)?),
            Node::Operator(op) => Token::Op(*op),
        });
    }
    fold(&tokens)
}

fn fold(tokens: &[Token]) -> Result<bool, EvaluationError> {
    let mut rest = tokens;
    let value = disjunction(&mut rest)?;
    match rest.first() {
        None => Ok(value),
        Some(other) => Err(EvaluationError::MalformedTree(format!(
            "expected a connective, found {other:?}"
        ))),
    }
}

// `or` binds loosest, then `and`, then `xor`.
fn disjunction(rest: &mut &[Token]) -> Result<bool, EvaluationError> {
    let mut acc = conjunction(rest)?;
    while eat(rest, LogicalOperator::Or) {
        let rhs = conjunction(rest)?;
        acc = acc || rhs;
    }
    Ok(acc)
}

fn conjunction(rest: &mut &[Token]) -> Result<bool, EvaluationError> {
    let mut acc = exclusive(rest)?;
    while eat(rest, LogicalOperator::And) {
        let rhs = exclusive(rest)?;
        acc = acc && rhs;
    }
    Ok(acc)
}

fn exclusive(rest: &mut &[Token]) -> Result<bool, EvaluationError> {
    let mut acc = operand(rest)?;
    while eat(rest, LogicalOperator::Xor) {
        acc ^= operand(rest)?;
    }
    Ok(acc)
}

fn eat(rest: &mut &[Token], op: LogicalOperator) -> bool {
    match rest.split_first() {
        Some((Token::Op(found), tail)) if *found == op => {
            *rest = tail;
            true
        }
        _ => false,
    }
}

fn operand(rest: &mut &[Token]) -> Result<bool, EvaluationError> {
    match rest.split_first() {
        Some((Token::Op(LogicalOperator::Not), tail)) => {
            *rest = tail;
            Ok(!operand(rest)?)
        }
        Some((Token::Bool(value), tail)) => {
            *rest = tail;
            Ok(*value)
        }
        Some((Token::Op(op), _)) => Err(EvaluationError::MalformedTree(format!(
            "connective '{op}' without a left operand"
        ))),
        None => Err(EvaluationError::MalformedTree(
            "missing operand".to_string(),
        )),
    }
}
