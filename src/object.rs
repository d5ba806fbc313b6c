use crate::class::Class;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A domain type that can live inside a [`Value`](crate::Value).
///
/// # Examples
///
/// ```
/// use sovran_coerce::{builtin, Class, Instance, Value};
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct User {
///     name: String,
///     class: Class,
/// }
///
/// impl Instance for User {
///     fn class(&self) -> Class {
///         self.class.clone()
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let class = Class::new("User", &builtin::object());
/// let value = Value::object(User { name: "a".into(), class: class.clone() });
///
/// assert_eq!(value.class(), class);
/// assert_eq!(value.downcast_ref::<User>().map(|u| u.name.as_str()), Some("a"));
/// ```
pub trait Instance: fmt::Debug + Send + Sync + 'static {
    fn class(&self) -> Class;

    fn as_any(&self) -> &dyn Any;

    /// Opt-in capability query; see [`StandIn`].
    fn as_stand_in(&self) -> Option<&dyn StandIn> {
        None
    }
}

/// Lets a value claim compatibility with a class it is not an instance of.
///
/// Test doubles standing in for a real domain type implement this so a
/// coercing write leaves them alone instead of converting them.
pub trait StandIn {
    fn stands_in_for(&self, class: &Class) -> bool;
}

/// A shared, type-erased domain instance.
///
/// Equality and hashing are by identity.
#[derive(Clone)]
pub struct Object {
    type_id: TypeId,
    value: Arc<dyn Instance>,
}

impl Object {
    pub fn new<T: Instance>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn class(&self) -> Class {
        self.value.class()
    }

    /// Check if the contained value is of type T
    pub fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Get a reference to the contained value if it is of type T
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if !self.is_type::<T>() {
            return None;
        }
        self.value.as_any().downcast_ref::<T>()
    }

    /// `None` when the instance does not implement the capability query.
    pub fn stands_in_for(&self, class: &Class) -> Option<bool> {
        self.value
            .as_stand_in()
            .map(|stand_in| stand_in.stands_in_for(class))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.value) as *const ()).hash(state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[derive(Debug)]
    struct Point(i64, i64);

    impl Instance for Point {
        fn class(&self) -> Class {
            builtin::object()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct Double(Class);

    impl Instance for Double {
        fn class(&self) -> Class {
            builtin::object()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_stand_in(&self) -> Option<&dyn StandIn> {
            Some(self)
        }
    }

    impl StandIn for Double {
        fn stands_in_for(&self, class: &Class) -> bool {
            self.0.is_a(class)
        }
    }

    #[test]
    fn test_downcast() {
        let object = Object::new(Point(1, 2));
        assert!(object.is_type::<Point>());
        assert_eq!(object.downcast_ref::<Point>().map(|p| p.0 + p.1), Some(3));
        assert!(object.downcast_ref::<Double>().is_none());
    }

    #[test]
    fn test_identity() {
        let a = Object::new(Point(1, 2));
        let b = Object::new(Point(1, 2));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_stand_in_query() {
        let user = Class::new("User", &builtin::object());
        let admin = Class::new("Admin", &user);

        let double = Object::new(Double(admin));
        assert_eq!(double.stands_in_for(&user), Some(true));
        assert_eq!(double.stands_in_for(&builtin::string()), Some(false));
        assert_eq!(Object::new(Point(0, 0)).stands_in_for(&user), None);
    }
}
