//! Named unary functions usable as `name(field)` in a filter.

use super::error::FunctionError;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type FunctionImpl = dyn Fn(&Value) -> Result<Value, FunctionError> + Send + Sync;

/// Names enabled when no function table is supplied
pub const DEFAULT_FUNCTIONS: &[&str] = &["len", "lower", "upper"];

/// Every builtin that can be enabled by name
pub const BUILTIN_FUNCTIONS: &[&str] = &["len", "lower", "upper", "trim", "ltrim", "rtrim"];

/// A function resolved at parse time and stored in the expression
#[derive(Clone)]
pub struct Function {
    name: String,
    apply: Arc<FunctionImpl>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        apply: impl Fn(&Value) -> Result<Value, FunctionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, value: &Value) -> Result<Value, FunctionError> {
        (self.apply)(value)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

/// The functions a parser accepts, keyed by name
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: BTreeMap<String, Function>,
}

impl FunctionTable {
    /// `len`, `lower` and `upper`
    pub fn defaults() -> Self {
        Self::builtins(DEFAULT_FUNCTIONS).unwrap_or_default()
    }

    /// A table without any function; `name(field)` never parses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Enable builtins by name. Returns the first unknown name as the error.
    pub fn builtins<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        let mut table = Self::empty();
        for name in names {
            let name = name.as_ref();
            let function = builtin(name).ok_or_else(|| name.to_string())?;
            table.functions.insert(name.to_string(), function);
        }
        Ok(table)
    }

    /// Register a custom function, replacing any function with the same name.
    pub fn with(
        mut self,
        name: impl Into<String>,
        apply: impl Fn(&Value) -> Result<Value, FunctionError> + Send + Sync + 'static,
    ) -> Self {
        let function = Function::new(name, apply);
        self.functions.insert(function.name.clone(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Longest registered name that `text` starts with.
    pub(crate) fn longest_prefix(&self, text: &str) -> Option<&Function> {
        self.functions
            .values()
            .filter(|function| text.starts_with(function.name.as_str()))
            .max_by_key(|function| function.name.len())
    }
}

fn builtin(name: &str) -> Option<Function> {
    let function = match name {
        "len" => Function::new(name, len),
        "lower" => Function::new(name, |v| map_str(v, "lower", str::to_lowercase)),
        "upper" => Function::new(name, |v| map_str(v, "upper", str::to_uppercase)),
        "trim" => Function::new(name, |v| map_str(v, "trim", |s| s.trim().to_string())),
        "ltrim" => Function::new(name, |v| map_str(v, "ltrim", |s| s.trim_start().to_string())),
        "rtrim" => Function::new(name, |v| map_str(v, "rtrim", |s| s.trim_end().to_string())),
        _ => return None,
    };
    Some(function)
}

fn len(value: &Value) -> Result<Value, FunctionError> {
    let count = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(FunctionError(format!(
                "len() is not defined for {}",
                other.kind()
            )));
        }
    };
    Ok(Value::Integer(count as i64))
}

fn map_str(
    value: &Value,
    name: &str,
    f: impl Fn(&str) -> String,
) -> Result<Value, FunctionError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(f(s))),
        other => Err(FunctionError(format!(
            "{name}() is not defined for {}",
            other.kind()
        ))),
    }
}
