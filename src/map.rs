use crate::container::ContainerType;
use crate::error::{CoercionError, MapError};
use crate::value::{MapValue, Value};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe map whose writes are coerced by its container type
///
/// `CoercingMap` stores dynamically typed [`Value`]s in insertion order.
/// Every write runs through the [`ContainerType`]'s key and value rules
/// before it lands, and a write that fails to coerce leaves the map
/// untouched.
///
/// # Examples
///
/// ```
/// use sovran_coerce::{CoercingMap, ContainerType, Target, Value};
///
/// let order = ContainerType::define("Order");
/// order.coerce_key("quantity", Target::integer());
///
/// let map = CoercingMap::new(&order);
/// map.set(Value::sym("quantity"), "3")?;
/// map.set(Value::sym("note"), "3")?;
///
/// assert_eq!(map.get(Value::sym("quantity"))?, Value::Int(3));
/// assert_eq!(map.get(Value::sym("note"))?, Value::from("3"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct CoercingMap {
    kind: ContainerType,
    items: Arc<Mutex<IndexMap<Value, Value>>>,
}

impl CoercingMap {
    /// Creates a new, empty CoercingMap
    pub fn new(kind: &ContainerType) -> Self {
        Self {
            kind: kind.clone(),
            items: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    /// Creates a map and writes every pair through coercion.
    ///
    /// # Errors
    ///
    /// Returns the first `CoercionError`; no map is produced in that case.
    pub fn from_pairs<I, K, V>(kind: &ContainerType, pairs: I) -> Result<Self, CoercionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let map = Self::new(kind);
        let prepared = map.prepare_all(pairs)?;
        *map.items.lock() = prepared;
        Ok(map)
    }

    pub fn container_type(&self) -> &ContainerType {
        &self.kind
    }

    /// Coerces and stores a value
    ///
    /// # Errors
    ///
    /// Returns a `CoercionError` if the value cannot be converted into the
    /// target its key or class resolves to.
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), CoercionError> {
        let key = key.into();
        let value = self.kind.engine().prepare(&key, value.into())?;
        self.items.lock().insert(key, value);
        Ok(())
    }

    /// Retrieves a clone of a value from the map
    ///
    /// # Errors
    ///
    /// Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn get(&self, key: impl Into<Value>) -> Result<Value, MapError> {
        let key = key.into();
        let store = self.items.lock();
        store
            .get(&key)
            .cloned()
            .ok_or_else(|| MapError::KeyNotFound(key.to_string()))
    }

    /// Removes a value from the map
    ///
    /// Returns `true` if the key was present and removed.
    pub fn remove(&self, key: impl Into<Value>) -> bool {
        self.items.lock().shift_remove(&key.into()).is_some()
    }

    /// Applies a function to all key-value pairs in the map
    ///
    /// # Errors
    ///
    /// Returns the first error returned by the provided function.
    pub fn apply<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Value, &Value) -> Result<(), E>,
    {
        let store = self.items.lock();
        for (key, value) in store.iter() {
            f(key, value)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn contains_key(&self, key: impl Into<Value>) -> bool {
        self.items.lock().contains_key(&key.into())
    }

    /// Returns all keys in insertion order
    pub fn keys(&self) -> Vec<Value> {
        self.items.lock().keys().cloned().collect()
    }

    /// Returns all values in insertion order
    pub fn values(&self) -> Vec<Value> {
        self.items.lock().values().cloned().collect()
    }

    /// Gets a value by executing a closure with read access
    ///
    /// # Errors
    ///
    /// Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn with<F, R>(&self, key: impl Into<Value>, f: F) -> Result<R, MapError>
    where
        F: FnOnce(&Value) -> R,
    {
        let key = key.into();
        let store = self.items.lock();
        let value = store
            .get(&key)
            .ok_or_else(|| MapError::KeyNotFound(key.to_string()))?;
        Ok(f(value))
    }

    /// Modifies a stored value in place
    ///
    /// This is a raw mutation: the result is not coerced again, the same
    /// way mutating a nested value never passes through the container's
    /// write.
    ///
    /// # Errors
    ///
    /// Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn with_mut<F, R>(&self, key: impl Into<Value>, f: F) -> Result<R, MapError>
    where
        F: FnOnce(&mut Value) -> R,
    {
        let key = key.into();
        let mut store = self.items.lock();
        let value = store
            .get_mut(&key)
            .ok_or_else(|| MapError::KeyNotFound(key.to_string()))?;
        Ok(f(value))
    }

    /// Borrows a stored domain instance as its concrete type
    ///
    /// # Errors
    ///
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    /// - Returns `MapError::TypeMismatch` if the value is not a `T`
    pub fn with_object<T: 'static, F, R>(&self, key: impl Into<Value>, f: F) -> Result<R, MapError>
    where
        F: FnOnce(&T) -> R,
    {
        let key = key.into();
        let store = self.items.lock();
        let value = store
            .get(&key)
            .ok_or_else(|| MapError::KeyNotFound(key.to_string()))?;
        value.downcast_ref::<T>().map(f).ok_or(MapError::TypeMismatch)
    }

    /// Replaces the whole contents
    ///
    /// Keys missing from `pairs` are dropped and every pair is written
    /// through coercion. All pairs are coerced before anything changes, so a
    /// failure leaves the map as it was.
    pub fn replace<I, K, V>(&self, pairs: I) -> Result<(), CoercionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let prepared = self.prepare_all(pairs)?;
        *self.items.lock() = prepared;
        Ok(())
    }

    /// Writes every pair through coercion, keeping existing keys
    ///
    /// All-or-nothing, like [`replace`](Self::replace).
    pub fn update<I, K, V>(&self, pairs: I) -> Result<(), CoercionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let prepared = self.prepare_all(pairs)?;
        self.items.lock().extend(prepared);
        Ok(())
    }

    /// Snapshot as a map value tagged with this container's class.
    pub fn to_value(&self) -> Value {
        let entries = self.items.lock().clone();
        Value::Map(MapValue::from_entries(self.kind.class().clone(), entries))
    }

    pub(crate) fn entries(&self) -> IndexMap<Value, Value> {
        self.items.lock().clone()
    }

    fn prepare_all<I, K, V>(&self, pairs: I) -> Result<IndexMap<Value, Value>, CoercionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let engine = self.kind.engine();
        pairs
            .into_iter()
            .map(|(key, value)| -> Result<(Value, Value), CoercionError> {
                let key = key.into();
                let value = engine.prepare(&key, value.into())?;
                Ok((key, value))
            })
            .collect()
    }
}
