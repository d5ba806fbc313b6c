use crate::builtin;
use crate::class::{Class, Hook};
use crate::engine::CoercionEngine;
use crate::error::{ConversionError, UnsupportedTypeError};
use crate::primitive::Primitive;
use crate::value::{MapValue, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;

static REGISTRY: Lazy<TypeConverterRegistry> = Lazy::new(TypeConverterRegistry::new);

/// Resolves a conversion strategy for a target class.
///
/// Resolution order is fixed: the primitive table (exact built-in classes
/// only), then a `coerce` hook, then a `construct` hook. A domain class with
/// its own `coerce` always uses it, even if it descends from a primitive.
pub struct TypeConverterRegistry {
    primitives: IndexMap<Class, Primitive>,
}

impl TypeConverterRegistry {
    fn new() -> Self {
        let primitives = [
            (builtin::integer(), Primitive::Integer),
            (builtin::float(), Primitive::Float),
            (builtin::complex(), Primitive::Complex),
            (builtin::rational(), Primitive::Rational),
            (builtin::string(), Primitive::String),
            (builtin::symbol(), Primitive::Symbol),
        ]
        .into_iter()
        .collect();
        Self { primitives }
    }

    pub fn global() -> &'static Self {
        &REGISTRY
    }

    pub fn primitive(&self, class: &Class) -> Option<Primitive> {
        self.primitives.get(class).copied()
    }

    pub fn resolve(&self, target: &Class) -> Result<Converter, UnsupportedTypeError> {
        if let Some(primitive) = self.primitive(target) {
            return Ok(Converter::Primitive(primitive));
        }
        if let Some((_, hook)) = target.coerce_hook() {
            return Ok(Converter::Hook {
                class: target.clone(),
                hook: hook.clone(),
            });
        }
        if let Some((_, hook)) = target.construct_hook() {
            return Ok(Converter::Hook {
                class: target.clone(),
                hook: hook.clone(),
            });
        }
        Err(UnsupportedTypeError(target.clone()))
    }
}

/// A resolved conversion, ready to apply.
pub enum Converter {
    Primitive(Primitive),
    /// A class hook, called with the target class and the raw value.
    Hook { class: Class, hook: Hook },
}

impl Converter {
    pub fn apply(&self, value: Value) -> Result<Value, ConversionError> {
        match self {
            Converter::Primitive(primitive) => primitive.convert(value),
            Converter::Hook { class, hook } => hook(class, value),
        }
    }
}

pub(crate) fn construct_array(_class: &Class, value: Value) -> Result<Value, ConversionError> {
    value.into_elements().map(Value::Array)
}

pub(crate) fn construct_set(_class: &Class, value: Value) -> Result<Value, ConversionError> {
    value
        .into_elements()
        .map(|elements| Value::Set(elements.into_iter().collect()))
}

/// Builds a map of `class`. When the class has coercion installed, every
/// entry is written through its rules, as an initializer that assigns each
/// pair would.
pub(crate) fn construct_hash(class: &Class, value: Value) -> Result<Value, ConversionError> {
    let pairs = value.into_pairs()?;
    let mut map = MapValue::with_class(class.clone());
    match class.rules() {
        Some(rules) => {
            let engine = CoercionEngine::new(rules);
            for (key, value) in pairs {
                let value = engine
                    .prepare(&key, value)
                    .map_err(|e| ConversionError::Nested(Box::new(e)))?;
                map.insert(key, value);
            }
        }
        None => {
            for (key, value) in pairs {
                map.insert(key, value);
            }
        }
    }
    Ok(Value::Map(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    fn registry() -> &'static TypeConverterRegistry {
        TypeConverterRegistry::global()
    }

    #[test]
    fn test_primitives_resolve_first() {
        let converter = registry().resolve(&builtin::integer()).unwrap();
        assert!(matches!(converter, Converter::Primitive(Primitive::Integer)));
        assert_eq!(converter.apply(Value::from("12")).unwrap(), Value::Int(12));
    }

    #[test]
    fn test_only_exact_builtins_are_primitive() {
        assert_eq!(registry().primitive(&builtin::fixnum()), None);
        let custom = Class::new("MyString", &builtin::string());
        assert_eq!(registry().primitive(&custom), None);
    }

    #[test]
    fn test_coerce_beats_construct_and_primitive_lookalikes() {
        let money = Class::builder("Money")
            .parent(&builtin::integer())
            .coerce(|_, v| Ok(Value::from(format!("coerced {v}"))))
            .construct(|_, v| Ok(Value::from(format!("built {v}"))))
            .build();

        let converter = registry().resolve(&money).unwrap();
        assert_eq!(converter.apply(Value::Int(5)).unwrap(), Value::from("coerced 5"));
    }

    #[test]
    fn test_construct_receives_subclass() {
        let base = Class::builder("Base")
            .construct(|class, _| Ok(Value::from(class.name())))
            .build();
        let derived = Class::new("Derived", &base);

        let converter = registry().resolve(&derived).unwrap();
        assert_eq!(converter.apply(Value::Nil).unwrap(), Value::from("Derived"));
    }

    #[test]
    fn test_unsupported() {
        let opaque = Class::new("Opaque", &builtin::object());
        let err = registry().resolve(&opaque).err().unwrap();
        assert_eq!(err.0, opaque);
        assert!(registry().resolve(&builtin::object()).is_err());
    }

    #[test]
    fn test_builtin_collection_constructors() {
        let array = registry().resolve(&builtin::array()).unwrap();
        assert_eq!(
            array.apply(Value::set([1, 2])).unwrap(),
            Value::array([1, 2])
        );

        let set = registry().resolve(&builtin::set()).unwrap();
        assert_eq!(set.apply(Value::array([1, 1, 2])).unwrap(), Value::set([1, 2]));

        let hash = registry().resolve(&builtin::hash()).unwrap();
        assert_eq!(
            hash.apply(Value::array([Value::array(["a", "b"])])).unwrap(),
            Value::map([("a", "b")])
        );
        assert!(hash.apply(Value::Int(1)).is_err());
    }

    #[test]
    fn test_hash_subclass_constructor_writes_through_rules() {
        let class = Class::new("Scores", &builtin::hash());
        class
            .install_rules()
            .register_key(["points"], Target::integer());

        let converter = registry().resolve(&class).unwrap();
        let built = converter
            .apply(Value::map([("points", "10"), ("name", "x")]))
            .unwrap();

        let map = built.as_map().unwrap();
        assert_eq!(map.class(), &class);
        assert_eq!(map.get(&Value::from("points")), Some(&Value::Int(10)));
        assert_eq!(map.get(&Value::from("name")), Some(&Value::from("x")));
    }
}
