//! Depth-first key search over nested maps and sequences.
//!
//! Independent of coercion; a container type can use either or both.

use crate::map::CoercingMap;
use crate::value::{MapValue, Value};
use indexmap::IndexMap;
use std::ops::ControlFlow;

/// Finds values stored under a key anywhere in a nested structure.
///
/// The walk is pre-order: a map is checked for the key before its values
/// are searched, and sequences are searched in element order.
///
/// # Examples
///
/// ```
/// use sovran_coerce::{DeepFind, Value};
/// use serde_json::json;
///
/// let users = Value::from(json!({
///     "users": [
///         {"location": {"address": "123 Street"}},
///         {"location": {"address": "234 Street"}}
///     ]
/// }));
///
/// let address = Value::from("address");
/// assert_eq!(users.deep_find(&address), Some(Value::from("123 Street")));
/// assert_eq!(
///     users.deep_find_all(&address),
///     Some(vec![Value::from("123 Street"), Value::from("234 Street")])
/// );
/// ```
pub trait DeepFind {
    /// The first value stored under `key`.
    fn deep_find(&self, key: &Value) -> Option<Value>;

    /// Every value stored under `key`, or `None` if there are none.
    fn deep_find_all(&self, key: &Value) -> Option<Vec<Value>>;

    fn deep_detect(&self, key: &Value) -> Option<Value> {
        self.deep_find(key)
    }

    fn deep_select(&self, key: &Value) -> Option<Vec<Value>> {
        self.deep_find_all(key)
    }
}

fn walk_value<'a, F>(key: &Value, value: &'a Value, visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&'a Value) -> ControlFlow<()>,
{
    match value {
        Value::Map(map) => walk_entries(key, map.entries(), visit),
        Value::Array(items) => items.iter().try_for_each(|item| walk_value(key, item, visit)),
        Value::Set(items) => items.iter().try_for_each(|item| walk_value(key, item, visit)),
        _ => ControlFlow::Continue(()),
    }
}

fn walk_entries<'a, F>(key: &Value, entries: &'a IndexMap<Value, Value>, visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&'a Value) -> ControlFlow<()>,
{
    if let Some(found) = entries.get(key) {
        visit(found)?;
    }
    entries
        .values()
        .try_for_each(|value| walk_value(key, value, visit))
}

fn find_first(key: &Value, entries: &IndexMap<Value, Value>) -> Option<Value> {
    let mut first = None;
    let _ = walk_entries(key, entries, &mut |found: &Value| {
        first = Some(found.clone());
        ControlFlow::Break(())
    });
    first
}

fn find_all(key: &Value, entries: &IndexMap<Value, Value>) -> Option<Vec<Value>> {
    let mut all = Vec::new();
    let _ = walk_entries(key, entries, &mut |found: &Value| {
        all.push(found.clone());
        ControlFlow::Continue(())
    });
    (!all.is_empty()).then_some(all)
}

impl DeepFind for MapValue {
    fn deep_find(&self, key: &Value) -> Option<Value> {
        find_first(key, self.entries())
    }

    fn deep_find_all(&self, key: &Value) -> Option<Vec<Value>> {
        find_all(key, self.entries())
    }
}

impl DeepFind for Value {
    fn deep_find(&self, key: &Value) -> Option<Value> {
        let mut first = None;
        let _ = walk_value(key, self, &mut |found: &Value| {
            first = Some(found.clone());
            ControlFlow::Break(())
        });
        first
    }

    fn deep_find_all(&self, key: &Value) -> Option<Vec<Value>> {
        let mut all = Vec::new();
        let _ = walk_value(key, self, &mut |found: &Value| {
            all.push(found.clone());
            ControlFlow::Continue(())
        });
        (!all.is_empty()).then_some(all)
    }
}

impl DeepFind for CoercingMap {
    fn deep_find(&self, key: &Value) -> Option<Value> {
        find_first(key, &self.entries())
    }

    fn deep_find_all(&self, key: &Value) -> Option<Vec<Value>> {
        find_all(key, &self.entries())
    }
}
