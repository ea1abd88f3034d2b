use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Something a display filter can be applied to.
///
/// Field paths are dot-separated; resolving a path that does not exist
/// yields [`Value::Null`].
pub trait Record {
    fn resolve(&self, path: &str) -> Value;
}

impl Record for Value {
    fn resolve(&self, path: &str) -> Value {
        self.get_path(path).cloned().unwrap_or(Value::Null)
    }
}

impl Record for serde_json::Value {
    fn resolve(&self, path: &str) -> Value {
        let mut current = self;
        for segment in path.split('.') {
            match current.as_object().and_then(|map| map.get(segment)) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        Value::from(current)
    }
}

impl Record for BTreeMap<String, Value> {
    fn resolve(&self, path: &str) -> Value {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        match (self.get(head), rest) {
            (Some(value), None) => value.clone(),
            (Some(value), Some(rest)) => value.resolve(rest),
            (None, _) => Value::Null,
        }
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn resolve(&self, path: &str) -> Value {
        (**self).resolve(path)
    }
}

/// Zip positional rows with their field names into map records.
///
/// Rows shorter than the header leave the trailing fields absent; extra cells
/// are dropped.
pub fn records_from_rows<S: AsRef<str>>(field_names: &[S], rows: Vec<Vec<Value>>) -> Vec<Value> {
    rows.into_iter()
        .map(|row| {
            Value::Map(
                field_names
                    .iter()
                    .map(|name| name.as_ref().to_string())
                    .zip(row)
                    .collect(),
            )
        })
        .collect()
}

/// Turn any serializable object into a map record.
pub fn record_from_serialize<T: Serialize>(object: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(object).map(Value::from)
}
