use crate::builtin;
use crate::class::Class;
use crate::error::ConversionError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

type TransformFn = dyn Fn(Value) -> Result<Value, ConversionError> + Send + Sync;

/// A conversion function used directly as a target.
#[derive(Clone)]
pub struct Transform(Arc<TransformFn>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Transform(Arc::new(f))
    }

    pub fn call(&self, value: Value) -> Result<Value, ConversionError> {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform")
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// What a value is coerced into.
///
/// Collection targets carry nested targets per slot; an empty slot leaves
/// those keys or elements untouched.
///
/// # Examples
///
/// ```
/// use sovran_coerce::Target;
///
/// let counts = Target::hash(Target::symbol(), Target::integer());
/// assert_eq!(counts.to_string(), "{Symbol => Integer}");
///
/// let tags = Target::set(Target::string());
/// assert!(tags.is_collection());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// A primitive or domain class.
    Class(Class),
    /// A map of `class` (a `Hash` or subclass) with per-slot targets.
    Map {
        class: Class,
        key: Option<Box<Target>>,
        value: Option<Box<Target>>,
    },
    Array(Option<Box<Target>>),
    Set(Option<Box<Target>>),
    Transform(Transform),
}

impl Target {
    pub fn class(class: &Class) -> Self {
        Target::Class(class.clone())
    }

    pub fn integer() -> Self {
        Target::Class(builtin::integer())
    }

    pub fn float() -> Self {
        Target::Class(builtin::float())
    }

    pub fn complex() -> Self {
        Target::Class(builtin::complex())
    }

    pub fn rational() -> Self {
        Target::Class(builtin::rational())
    }

    pub fn string() -> Self {
        Target::Class(builtin::string())
    }

    pub fn symbol() -> Self {
        Target::Class(builtin::symbol())
    }

    /// A plain `Hash` with separate key and value targets.
    pub fn hash(key: impl Into<Option<Target>>, value: impl Into<Option<Target>>) -> Self {
        Self::map(&builtin::hash(), key, value)
    }

    /// A plain `Hash` whose keys and values share one target.
    pub fn hash_of(both: Target) -> Self {
        Self::hash(both.clone(), both)
    }

    /// A map rebuilt as `class`, which should descend from `Hash`.
    pub fn map(
        class: &Class,
        key: impl Into<Option<Target>>,
        value: impl Into<Option<Target>>,
    ) -> Self {
        Target::Map {
            class: class.clone(),
            key: key.into().map(Box::new),
            value: value.into().map(Box::new),
        }
    }

    pub fn array(element: impl Into<Option<Target>>) -> Self {
        Target::Array(element.into().map(Box::new))
    }

    pub fn set(element: impl Into<Option<Target>>) -> Self {
        Target::Set(element.into().map(Box::new))
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Target::Transform(Transform::new(f))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Target::Map { .. } | Target::Array(_) | Target::Set(_))
    }
}

impl From<Class> for Target {
    fn from(class: Class) -> Self {
        Target::Class(class)
    }
}

impl From<&Class> for Target {
    fn from(class: &Class) -> Self {
        Target::class(class)
    }
}

impl From<Transform> for Target {
    fn from(transform: Transform) -> Self {
        Target::Transform(transform)
    }
}

fn write_slot(f: &mut fmt::Formatter<'_>, slot: &Option<Box<Target>>) -> fmt::Result {
    match slot {
        Some(target) => write!(f, "{target}"),
        None => f.write_str("nil"),
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Class(class) => write!(f, "{class}"),
            Target::Map { class, key, value } => {
                if *class != builtin::hash() {
                    write!(f, "{class}")?;
                }
                f.write_str("{")?;
                write_slot(f, key)?;
                f.write_str(" => ")?;
                write_slot(f, value)?;
                f.write_str("}")
            }
            Target::Array(element) => {
                f.write_str("[")?;
                write_slot(f, element)?;
                f.write_str("]")
            }
            Target::Set(element) => {
                f.write_str("#<Set: {")?;
                write_slot(f, element)?;
                f.write_str("}>")
            }
            Target::Transform(_) => f.write_str("#<Proc>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Target::integer().to_string(), "Integer");
        assert_eq!(Target::hash_of(Target::string()).to_string(), "{String => String}");
        assert_eq!(Target::hash(None, Target::float()).to_string(), "{nil => Float}");
        assert_eq!(Target::array(Target::symbol()).to_string(), "[Symbol]");
        assert_eq!(Target::set(Target::integer()).to_string(), "#<Set: {Integer}>");
        assert_eq!(Target::transform(Ok).to_string(), "#<Proc>");

        let special = Class::new("SpecialHash", &builtin::hash());
        assert_eq!(
            Target::map(&special, Target::symbol(), None).to_string(),
            "SpecialHash{Symbol => nil}"
        );
    }

    #[test]
    fn test_single_slot_map_fills_both_slots() {
        match Target::hash_of(Target::integer()) {
            Target::Map { key, value, .. } => {
                assert_eq!(key.as_deref(), Some(&Target::integer()));
                assert_eq!(value.as_deref(), Some(&Target::integer()));
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_transforms_compare_by_identity() {
        let t = Transform::new(Ok);
        assert_eq!(Target::Transform(t.clone()), Target::Transform(t));
        assert_ne!(Target::transform(Ok), Target::transform(Ok));
        assert!(!Target::transform(Ok).is_collection());
    }
}
