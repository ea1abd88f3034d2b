use super::error::ParserError;
use super::expression::{ComparisonOperator, Expression, FilterTree, LogicalOperator, Node};
use super::functions::FunctionTable;
use super::lexer::Cursor;
use super::literal::{Literal, LiteralError, parse_literal};
use super::slice::SliceSpec;
use log::debug;

/// Spellings of the binary connectives, longest first within each family
const BINARY_OPERATORS: &[(&str, LogicalOperator)] = &[
    ("and", LogicalOperator::And),
    ("&&", LogicalOperator::And),
    ("or", LogicalOperator::Or),
    ("||", LogicalOperator::Or),
    ("xor", LogicalOperator::Xor),
    ("^^", LogicalOperator::Xor),
    ("^", LogicalOperator::Xor),
];

fn is_field_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Compiles display filter text into a [`FilterTree`].
///
/// The parser is configured once with an optional field allow-list and a
/// function table, then reused for any number of filters.
#[derive(Debug, Clone)]
pub struct Parser {
    field_names: Option<Vec<String>>,
    functions: FunctionTable,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl Parser {
    /// `field_names`: allow-list of valid field paths; `None` or an empty list
    /// accepts any `[A-Za-z0-9_.-]+` token.
    /// `functions`: `None` enables the default `len`, `lower` and `upper`.
    pub fn new(field_names: Option<Vec<String>>, functions: Option<FunctionTable>) -> Self {
        Self {
            field_names: field_names.filter(|names| !names.is_empty()),
            functions: functions.unwrap_or_else(FunctionTable::defaults),
        }
    }

    pub fn field_names(&self) -> Option<&[String]> {
        self.field_names.as_deref()
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Parse a display filter. Blank input yields the empty tree.
    pub fn parse(&self, text: &str) -> Result<FilterTree, ParserError> {
        if text.trim().is_empty() {
            return Ok(FilterTree::default());
        }

        let mut grammar = Grammar {
            parser: self,
            cursor: Cursor::new(text),
            filter: text,
        };
        grammar.cursor.skip_ws();
        let root = grammar.parse_binary()?;
        grammar.cursor.skip_ws();
        if !grammar.cursor.is_eof() {
            return Err(grammar.syntax(format!("unexpected '{}'", grammar.cursor.rest())));
        }

        let tree = FilterTree(vec![root]);
        debug!("Parsed display filter '{text}' into {tree:?}");
        Ok(tree)
    }
}

struct Grammar<'p, 's> {
    parser: &'p Parser,
    cursor: Cursor<'s>,
    filter: &'s str,
}

impl Grammar<'_, '_> {
    fn syntax(&self, reason: impl Into<String>) -> ParserError {
        ParserError::Syntax {
            filter: self.filter.to_string(),
            position: self.cursor.pos(),
            reason: reason.into(),
        }
    }

    /// operand (ws op ws operand)*, grouped flat when an operator is present
    fn parse_binary(&mut self) -> Result<Node, ParserError> {
        let first = self.parse_unary()?;
        let mut items = vec![first];
        while let Some(op) = self.binary_operator() {
            items.push(Node::Operator(op));
            items.push(self.parse_unary()?);
        }
        if items.len() == 1 {
            return Ok(items.remove(0));
        }
        Ok(Node::Group(items))
    }

    fn binary_operator(&mut self) -> Option<LogicalOperator> {
        let start = self.cursor.pos();
        if self.cursor.eat_ws1() {
            for (spelling, op) in BINARY_OPERATORS {
                let before = self.cursor.pos();
                if self.cursor.eat_caseless(spelling) && self.cursor.eat_ws1() {
                    return Some(*op);
                }
                self.cursor.reset(before);
            }
        }
        self.cursor.reset(start);
        None
    }

    /// `not` needs trailing whitespace, `!` does not
    fn not_operator(&mut self) -> bool {
        let start = self.cursor.pos();
        if self.cursor.eat_caseless("not") && self.cursor.eat_ws1() {
            return true;
        }
        self.cursor.reset(start);
        if self.cursor.peek() == Some('!') && !self.cursor.rest().starts_with("!=") {
            self.cursor.bump();
            self.cursor.skip_ws();
            return true;
        }
        false
    }

    fn parse_unary(&mut self) -> Result<Node, ParserError> {
        let start = self.cursor.pos();
        if !self.not_operator() {
            return self.parse_atom();
        }
        match self.parse_unary() {
            Ok(operand) => Ok(Node::Group(vec![Node::Operator(LogicalOperator::Not), operand])),
            Err(err) => {
                // A field may itself be called `not`.
                self.cursor.reset(start);
                match self.parse_expression() {
                    Ok(expression) if expression.operator.is_some() => {
                        Ok(Node::Expression(expression))
                    }
                    _ => Err(err),
                }
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Node, ParserError> {
        if !self.cursor.eat("(") {
            return self.parse_expression().map(Node::Expression);
        }
        self.cursor.skip_ws();
        if self.cursor.peek() == Some(')') {
            return Err(self.syntax("empty parentheses"));
        }
        let inner = self.parse_binary()?;
        self.cursor.skip_ws();
        if !self.cursor.eat(")") {
            return Err(self.syntax("expected ')'"));
        }
        Ok(inner)
    }

    fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        if let Some(expression) = self.parse_function_call()? {
            return Ok(expression);
        }

        let field = self.parse_field()?;
        let slice = self.parse_slice()?;
        match self.comparison()? {
            Some((operator, value)) => {
                let mut expression = Expression::compare(field, operator, value);
                expression.slice = slice;
                Ok(expression)
            }
            None if slice.is_some() => Err(self.syntax("a sliced field needs a comparison")),
            None => Ok(Expression::field(field)),
        }
    }

    /// `function(field[slice]) op value`; `Ok(None)` when no call is present.
    fn parse_function_call(&mut self) -> Result<Option<Expression>, ParserError> {
        let start = self.cursor.pos();
        let rest = self.cursor.rest();

        let function = self
            .parser
            .functions
            .longest_prefix(rest)
            .filter(|f| rest[f.name().len()..].starts_with('('))
            .cloned();
        let Some(function) = function else {
            let word = self.cursor.take_while(|c| c.is_alphanumeric() || c == '_');
            let is_call = !word.is_empty() && self.cursor.peek() == Some('(');
            self.cursor.reset(start);
            if is_call {
                return Err(ParserError::UnknownFunction {
                    filter: self.filter.to_string(),
                    name: word.to_string(),
                });
            }
            return Ok(None);
        };

        self.cursor.eat(function.name());
        self.cursor.eat("(");
        self.cursor.skip_ws();
        let field = self.parse_field()?;
        let slice = self.parse_slice()?;
        self.cursor.skip_ws();
        if !self.cursor.eat(")") {
            return Err(self.syntax("expected ')' after function argument"));
        }
        let Some((operator, value)) = self.comparison()? else {
            return Err(self.syntax(format!("{}() needs a comparison", function.name())));
        };

        let mut expression = Expression::compare(field, operator, value).with_function(function);
        expression.slice = slice;
        Ok(Some(expression))
    }

    fn parse_field(&mut self) -> Result<String, ParserError> {
        let rest = self.cursor.rest();
        if let Some(names) = &self.parser.field_names {
            let known = names
                .iter()
                .filter(|name| rest.starts_with(name.as_str()))
                .max_by_key(|name| name.len());
            if let Some(name) = known {
                self.cursor.eat(name);
                return Ok(name.clone());
            }
            let word = rest
                .split(|c: char| !is_field_char(c))
                .next()
                .unwrap_or_default();
            if word.is_empty() {
                return Err(self.syntax("expected a field name"));
            }
            return Err(ParserError::UnknownField {
                filter: self.filter.to_string(),
                field: word.to_string(),
            });
        }

        let field = self.cursor.take_while(is_field_char);
        if field.is_empty() {
            return Err(self.syntax("expected a field name"));
        }
        Ok(field.to_string())
    }

    fn parse_slice(&mut self) -> Result<Option<SliceSpec>, ParserError> {
        SliceSpec::parse(&mut self.cursor).map_err(|reason| ParserError::InvalidSlice {
            filter: self.filter.to_string(),
            reason,
        })
    }

    /// `ws op ws value`, or `Ok(None)` with the cursor untouched.
    fn comparison(&mut self) -> Result<Option<(ComparisonOperator, Literal)>, ParserError> {
        let start = self.cursor.pos();
        if !self.cursor.eat_ws1() {
            return Ok(None);
        }
        let after_ws = self.cursor.pos();
        let operator = ComparisonOperator::SPELLINGS.iter().find_map(|(spelling, op)| {
            self.cursor.reset(after_ws);
            (self.cursor.eat_caseless(spelling) && self.cursor.eat_ws1()).then_some(*op)
        });
        let Some(operator) = operator else {
            self.cursor.reset(start);
            return Ok(None);
        };

        let value = parse_literal(&mut self.cursor).map_err(|err| match err {
            LiteralError::MismatchedQuotes(position) => ParserError::MismatchedQuotes {
                filter: self.filter.to_string(),
                position,
            },
            LiteralError::InvalidAddress(reason) => ParserError::InvalidAddress {
                filter: self.filter.to_string(),
                reason,
            },
            LiteralError::Syntax { position, reason } => ParserError::Syntax {
                filter: self.filter.to_string(),
                position,
                reason,
            },
        })?;
        Ok(Some((operator, value)))
    }
}
