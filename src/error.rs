use crate::class::Class;
use crate::target::Target;
use crate::value::Value;
use thiserror::Error;

/// Errors returned by the read side of [`CoercingMap`](crate::CoercingMap).
#[derive(Debug, Error)]
pub enum MapError {
    /// The requested key was not found
    #[error("Key not found in map: {0}")]
    KeyNotFound(String),
    /// The stored value is not of the requested concrete type
    #[error("Type mismatch for the requested key")]
    TypeMismatch,
}

/// A target class has no usable conversion strategy: it is not a primitive,
/// and neither it nor any ancestor carries a `coerce` or `construct` hook.
#[derive(Debug, Clone, Error)]
#[error("{0} is not a coercable type")]
pub struct UnsupportedTypeError(pub Class);

/// A single conversion step failed.
///
/// These never reach the caller of a coercing write directly; the write
/// boundary wraps them into a [`CoercionError`].
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedTypeError),

    /// The value has no conversion of the requested kind (e.g. a boolean
    /// asked for its symbol form).
    #[error("undefined method `{method}' for an instance of {class}")]
    NoConversion { method: &'static str, class: Class },

    #[error("can't convert {value} into {target}")]
    OutOfRange { value: String, target: &'static str },

    /// A collection target was given a value that cannot be iterated.
    #[error("{class} is not enumerable")]
    NotEnumerable { class: Class },

    /// A constructor wrote entries through another container type's rules
    /// and one of those writes failed.
    #[error(transparent)]
    Nested(Box<CoercionError>),

    /// Raised by user `coerce`/`construct` hooks and transforms.
    #[error("{0}")]
    Custom(String),
}

impl ConversionError {
    pub fn custom(message: impl Into<String>) -> Self {
        ConversionError::Custom(message.into())
    }
}

/// The only error a coercing write can produce.
///
/// Carries the key being written, the runtime class of the rejected value,
/// the target it was resolved to and the underlying cause.
#[derive(Debug, Error)]
#[error("Cannot coerce property {key} from {source_class} to {target}: {cause}")]
pub struct CoercionError {
    key: Value,
    source_class: Class,
    target: Target,
    #[source]
    cause: ConversionError,
}

impl CoercionError {
    pub(crate) fn new(key: Value, source_class: Class, target: Target, cause: ConversionError) -> Self {
        Self {
            key,
            source_class,
            target,
            cause,
        }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn source_class(&self) -> &Class {
        &self.source_class
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn cause(&self) -> &ConversionError {
        &self.cause
    }
}

/// Errors from loading a declarative rule file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid rule file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown class `{0}`")]
    UnknownClass(String),

    #[error("invalid type `{spec}`: {reason}")]
    Syntax { spec: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn test_error_display() {
        let err = CoercionError::new(
            Value::sym("count"),
            builtin::true_class(),
            Target::symbol(),
            ConversionError::NoConversion {
                method: "to_sym",
                class: builtin::true_class(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Cannot coerce property :count from TrueClass to Symbol: \
             undefined method `to_sym' for an instance of TrueClass"
        );

        let err = UnsupportedTypeError(builtin::object());
        assert_eq!(err.to_string(), "Object is not a coercable type");

        assert_eq!(
            MapError::KeyNotFound(":user".to_string()).to_string(),
            "Key not found in map: :user"
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = CoercionError::new(
            Value::from("k"),
            builtin::string(),
            Target::integer(),
            ConversionError::custom("boom"),
        );
        assert_eq!(err.source().map(|e| e.to_string()), Some("boom".to_string()));
        assert!(matches!(err.cause(), ConversionError::Custom(_)));
    }
}
