use crate::container::ContainerType;
use crate::engine::CoercionEngine;
use crate::error::CoercionError;
use crate::value::{MapValue, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// The write side of a map-like container.
///
/// Plain containers write as-is. [`Coerced`] implements the same trait by
/// coercing first, so a host can swap one for the other.
pub trait WriteMap {
    fn write(&mut self, key: Value, value: Value) -> Result<(), CoercionError>;
}

impl WriteMap for IndexMap<Value, Value> {
    fn write(&mut self, key: Value, value: Value) -> Result<(), CoercionError> {
        self.insert(key, value);
        Ok(())
    }
}

impl WriteMap for HashMap<Value, Value> {
    fn write(&mut self, key: Value, value: Value) -> Result<(), CoercionError> {
        self.insert(key, value);
        Ok(())
    }
}

impl WriteMap for MapValue {
    fn write(&mut self, key: Value, value: Value) -> Result<(), CoercionError> {
        self.insert(key, value);
        Ok(())
    }
}

/// Wraps a container so every write goes through a container type's
/// coercion rules before reaching the inner container.
///
/// Reads go straight to the inner container through `Deref`.
///
/// # Examples
///
/// ```
/// use sovran_coerce::{ContainerType, Target, Value, WriteMap};
/// use std::collections::HashMap;
///
/// let settings = ContainerType::define("Settings");
/// settings.coerce_key("port", Target::integer());
///
/// let mut map = settings.intercept(HashMap::<Value, Value>::new());
/// map.write(Value::sym("port"), Value::from("8080"))?;
///
/// assert_eq!(map.get(&Value::sym("port")), Some(&Value::Int(8080)));
/// # Ok::<(), sovran_coerce::CoercionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Coerced<W> {
    kind: ContainerType,
    inner: W,
}

impl<W: WriteMap> Coerced<W> {
    pub fn new(kind: &ContainerType, inner: W) -> Self {
        Self {
            kind: kind.clone(),
            inner,
        }
    }

    pub fn container_type(&self) -> &ContainerType {
        &self.kind
    }

    /// Writes without coercion.
    pub fn write_raw(&mut self, key: Value, value: Value) -> Result<(), CoercionError> {
        self.inner.write(key, value)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: WriteMap> WriteMap for Coerced<W> {
    fn write(&mut self, key: Value, value: Value) -> Result<(), CoercionError> {
        CoercionEngine::new(self.kind.rules()).set(&mut self.inner, key, value)
    }
}

impl<W> Deref for Coerced<W> {
    type Target = W;

    fn deref(&self) -> &W {
        &self.inner
    }
}

impl<W> DerefMut for Coerced<W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}
