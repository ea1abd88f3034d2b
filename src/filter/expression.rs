//! The parsed form of a display filter.

use super::functions::Function;
use super::literal::Literal;
use super::slice::SliceSpec;
use std::fmt;

/// Comparison operators, canonicalized to their symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    Contains,
    Matches,
    In,
    BitwiseAnd,
}

impl ComparisonOperator {
    /// Spellings in the order they are tried; longer symbols precede their
    /// prefixes so `>=` is never read as `>`.
    pub const SPELLINGS: &'static [(&'static str, ComparisonOperator)] = &[
        ("==", ComparisonOperator::Eq),
        ("eq", ComparisonOperator::Eq),
        ("!=", ComparisonOperator::Ne),
        ("neq", ComparisonOperator::Ne),
        (">=", ComparisonOperator::Ge),
        ("ge", ComparisonOperator::Ge),
        (">", ComparisonOperator::Gt),
        ("gt", ComparisonOperator::Gt),
        ("<=", ComparisonOperator::Le),
        ("le", ComparisonOperator::Le),
        ("<", ComparisonOperator::Lt),
        ("lt", ComparisonOperator::Lt),
        ("~=", ComparisonOperator::Contains),
        ("contains", ComparisonOperator::Contains),
        ("~", ComparisonOperator::Matches),
        ("matches", ComparisonOperator::Matches),
        ("in", ComparisonOperator::In),
        ("&", ComparisonOperator::BitwiseAnd),
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Contains => "~=",
            ComparisonOperator::Matches => "~",
            ComparisonOperator::In => "in",
            ComparisonOperator::BitwiseAnd => "&",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::SPELLINGS
            .iter()
            .find(|(spelling, _)| spelling.eq_ignore_ascii_case(symbol))
            .map(|(_, op)| *op)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Boolean connectives between predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    Not,
    And,
    Or,
    Xor,
}

impl LogicalOperator {
    /// Canonical token, as it appears in a reduced token stream
    pub fn token(&self) -> &'static str {
        match self {
            LogicalOperator::Not => "not",
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
            LogicalOperator::Xor => "^",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOperator::Xor => "xor",
            other => other.token(),
        })
    }
}

/// A leaf predicate.
///
/// Without an operator the expression only tests that the field is present;
/// `value` is then `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub field: String,
    pub operator: Option<ComparisonOperator>,
    pub value: Option<Literal>,
    pub function: Option<Function>,
    pub slice: Option<SliceSpec>,
}

impl Expression {
    /// Bare existence test
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: None,
            value: None,
            function: None,
            slice: None,
        }
    }

    pub fn compare(field: impl Into<String>, operator: ComparisonOperator, value: Literal) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator),
            value: Some(value),
            function: None,
            slice: None,
        }
    }

    pub fn with_function(mut self, function: Function) -> Self {
        self.function = Some(function);
        self
    }

    pub fn with_slice(mut self, slice: SliceSpec) -> Self {
        self.slice = Some(slice);
        self
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subject = self.field.clone();
        if let Some(slice) = &self.slice {
            subject.push_str(&slice.to_string());
        }
        if let Some(function) = &self.function {
            subject = format!("{}({subject})", function.name());
        }
        match (&self.operator, &self.value) {
            (Some(op), Some(value)) => write!(f, "{subject} {op} {value}"),
            _ => write!(f, "{subject}"),
        }
    }
}

/// One element of a filter tree sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Expression(Expression),
    /// A parenthesized or operator-joined sub-sequence
    Group(Vec<Node>),
    Operator(LogicalOperator),
}

/// A parsed display filter.
///
/// The shape follows operator grouping: `a` is `[a]`, `a and b` is
/// `[[a, and, b]]`, `not a` is `[[not, a]]` and `a and (b or c)` is
/// `[[a, and, [b, or, c]]]`. The empty tree matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterTree(pub Vec<Node>);

impl FilterTree {
    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All leaf expressions, left to right
    pub fn expressions(&self) -> Vec<&Expression> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Expression>) {
            for node in nodes {
                match node {
                    Node::Expression(expression) => out.push(expression),
                    Node::Group(children) => walk(children, out),
                    Node::Operator(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.0, &mut out);
        out
    }
}

fn write_sequence(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    let mut first = true;
    for node in nodes {
        if !first {
            f.write_str(" ")?;
        }
        first = false;
        match node {
            Node::Expression(expression) => write!(f, "{expression}")?,
            Node::Operator(op) => write!(f, "{op}")?,
            Node::Group(children) => {
                f.write_str("(")?;
                write_sequence(f, children)?;
                f.write_str(")")?;
            }
        }
    }
    Ok(())
}

impl fmt::Display for FilterTree {
    /// Canonical filter text. Top-level groups are written without
    /// parentheses since the parser adds that level itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [Node::Group(children)] => write_sequence(f, children),
            nodes => write_sequence(f, nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_spellings_are_canonicalized() {
        assert_eq!(ComparisonOperator::from_symbol("EQ"), Some(ComparisonOperator::Eq));
        assert_eq!(ComparisonOperator::from_symbol("contains"), Some(ComparisonOperator::Contains));
        assert_eq!(ComparisonOperator::from_symbol("&&"), None);
        assert_eq!(ComparisonOperator::Matches.symbol(), "~");
    }

    #[test]
    fn test_display_expression() {
        let expression = Expression::compare(
            "name",
            ComparisonOperator::Eq,
            Literal::Text("The One".to_string()),
        );
        assert_eq!(expression.to_string(), "name == \"The One\"");
        assert_eq!(Expression::field("age").to_string(), "age");
    }

    #[test]
    fn test_display_tree() {
        let tree = FilterTree(vec![Node::Group(vec![
            Node::Expression(Expression::field("a")),
            Node::Operator(LogicalOperator::And),
            Node::Group(vec![
                Node::Expression(Expression::field("b")),
                Node::Operator(LogicalOperator::Xor),
                Node::Expression(Expression::field("c")),
            ]),
        ])]);
        assert_eq!(tree.to_string(), "a and (b xor c)");
        assert_eq!(tree.expressions().len(), 3);
    }
}
