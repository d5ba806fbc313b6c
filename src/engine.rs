use crate::convert::TypeConverterRegistry;
use crate::error::{CoercionError, ConversionError};
use crate::rules::CoercionRules;
use crate::target::Target;
use crate::value::{MapValue, Value};
use crate::write::WriteMap;

/// Runs the write pipeline for one container type: resolve the target
/// (key rule, else value rule), coerce, then hand the result to the raw
/// write.
pub struct CoercionEngine<'r> {
    rules: &'r CoercionRules,
}

impl<'r> CoercionEngine<'r> {
    pub fn new(rules: &'r CoercionRules) -> Self {
        Self { rules }
    }

    /// Coerces `value` for a write under `key` without writing it.
    ///
    /// # Errors
    ///
    /// Any conversion failure comes back as a [`CoercionError`].
    pub fn prepare(&self, key: &Value, value: Value) -> Result<Value, CoercionError> {
        let Some(target) = self.rules.target_for(key, &value) else {
            return Ok(value);
        };
        let source_class = value.class();
        match Self::coerce(value, Some(&target)) {
            Ok(converted) => {
                tracing::trace!(%key, from = %source_class, %target, "coerced");
                Ok(converted)
            }
            Err(cause) => {
                tracing::debug!(%key, from = %source_class, %target, %cause, "coercion failed");
                Err(CoercionError::new(key.clone(), source_class, target, cause))
            }
        }
    }

    /// Coerces and writes through `raw`. Nothing is written on failure.
    pub fn set<W>(&self, raw: &mut W, key: Value, value: Value) -> Result<(), CoercionError>
    where
        W: WriteMap + ?Sized,
    {
        let value = self.prepare(&key, value)?;
        raw.write(key, value)
    }

    /// Converts `value` into `target`.
    ///
    /// Nil values, absent targets and values that already satisfy the
    /// target come back unchanged. Collections are rebuilt element by
    /// element, with each element coerced recursively.
    pub fn coerce(value: Value, target: Option<&Target>) -> Result<Value, ConversionError> {
        let Some(target) = target else {
            return Ok(value);
        };
        if value.is_nil() || Self::should_skip(&value, target) {
            return Ok(value);
        }

        match target {
            Target::Map { class, key, value: slot } => {
                let mut map = MapValue::with_class(class.clone());
                for (k, v) in value.into_pairs()? {
                    map.insert(
                        Self::coerce(k, key.as_deref())?,
                        Self::coerce(v, slot.as_deref())?,
                    );
                }
                Ok(Value::Map(map))
            }
            Target::Array(element) => value
                .into_elements()?
                .into_iter()
                .map(|v| Self::coerce(v, element.as_deref()))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Target::Set(element) => value
                .into_elements()?
                .into_iter()
                .map(|v| Self::coerce(v, element.as_deref()))
                .collect::<Result<_, _>>()
                .map(Value::Set),
            Target::Transform(transform) => transform.call(value),
            Target::Class(class) => TypeConverterRegistry::global()
                .resolve(class)?
                .apply(value),
        }
    }

    /// Collections and transforms always run. A class target is skipped
    /// when the value is already an instance, or when the value answers the
    /// stand-in query for that class.
    pub fn should_skip(value: &Value, target: &Target) -> bool {
        let Target::Class(class) = target else {
            return false;
        };
        if value.class().is_a(class) {
            return true;
        }
        match value {
            Value::Object(object) => object.stands_in_for(class).unwrap_or(false),
            _ => false,
        }
    }
}
