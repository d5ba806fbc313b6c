use crate::builtin;
use crate::error::ConversionError;
use crate::rules::CoercionRules;
use crate::value::Value;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// A class-level conversion hook.
///
/// Hooks are inherited: when a subclass has no hook of its own, the nearest
/// ancestor's hook runs and receives the subclass as its first argument.
pub type Hook = Arc<dyn Fn(&Class, Value) -> Result<Value, ConversionError> + Send + Sync>;

struct ClassInfo {
    name: String,
    superclass: Option<Class>,
    subclasses: RwLock<Vec<Weak<ClassInfo>>>,
    coerce: Option<Hook>,
    construct: Option<Hook>,
    rules: OnceCell<Arc<CoercionRules>>,
}

/// A handle to a runtime class.
///
/// Classes form a single-inheritance tree rooted at [`builtin::object`].
/// Handles are cheap to clone and compare by identity, so two classes with
/// the same name are still distinct.
///
/// # Examples
///
/// ```
/// use sovran_coerce::{builtin, Class};
///
/// let vehicle = Class::new("Vehicle", &builtin::object());
/// let car = Class::new("Car", &vehicle);
///
/// assert!(car.is_a(&vehicle));
/// assert!(!vehicle.is_a(&car));
/// assert_eq!(vehicle.descendants(), vec![car.clone()]);
/// ```
#[derive(Clone)]
pub struct Class(Arc<ClassInfo>);

impl Class {
    /// Defines a hookless class under `parent`.
    pub fn new(name: impl Into<String>, parent: &Class) -> Self {
        Self::builder(name).parent(parent).build()
    }

    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            parent: None,
            coerce: None,
            construct: None,
        }
    }

    pub(crate) fn root(name: &str) -> Self {
        Class(Arc::new(ClassInfo {
            name: name.to_string(),
            superclass: None,
            subclasses: RwLock::new(Vec::new()),
            coerce: None,
            construct: None,
            rules: OnceCell::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn superclass(&self) -> Option<&Class> {
        self.0.superclass.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.0.superclass.is_none()
    }

    /// Returns true if `self` is `other` or inherits from it.
    pub fn is_a(&self, other: &Class) -> bool {
        self.ancestors().any(|class| class == other)
    }

    /// Walks from `self` up to and including the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Direct subclasses that are still alive.
    pub fn subclasses(&self) -> Vec<Class> {
        self.0
            .subclasses
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .map(Class)
            .collect()
    }

    /// Every class currently defined below `self`, depth first.
    pub fn descendants(&self) -> Vec<Class> {
        let mut found = Vec::new();
        let mut stack = self.subclasses();
        stack.reverse();
        while let Some(class) = stack.pop() {
            let mut children = class.subclasses();
            children.reverse();
            stack.extend(children);
            found.push(class);
        }
        found
    }

    pub(crate) fn coerce_hook(&self) -> Option<(&Class, &Hook)> {
        self.ancestors()
            .find_map(|class| class.0.coerce.as_ref().map(|hook| (class, hook)))
    }

    pub(crate) fn construct_hook(&self) -> Option<(&Class, &Hook)> {
        self.ancestors()
            .find_map(|class| class.0.construct.as_ref().map(|hook| (class, hook)))
    }

    /// Coercion rules, if coercion has been installed on this class.
    pub(crate) fn rules(&self) -> Option<&Arc<CoercionRules>> {
        self.0.rules.get()
    }

    pub(crate) fn install_rules(&self) -> &Arc<CoercionRules> {
        self.0.rules.get_or_init(|| {
            tracing::debug!(class = %self, "installing coercion");
            Arc::new(CoercionRules::new())
        })
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const ()).hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Class").field(&self.0.name).finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Iterator over a class and its superclasses.
pub struct Ancestors<'a> {
    next: Option<&'a Class>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<&'a Class> {
        let current = self.next?;
        self.next = current.0.superclass.as_ref();
        Some(current)
    }
}

/// Builder for classes that carry conversion hooks.
///
/// # Examples
///
/// ```
/// use sovran_coerce::{Class, ConversionError, Value};
///
/// let celsius = Class::builder("Celsius")
///     .coerce(|_class, value| match value {
///         Value::Int(n) => Ok(Value::Float(n as f64)),
///         other => Err(ConversionError::custom(format!("not a temperature: {other}"))),
///     })
///     .build();
///
/// assert_eq!(celsius.name(), "Celsius");
/// ```
pub struct ClassBuilder {
    name: String,
    parent: Option<Class>,
    coerce: Option<Hook>,
    construct: Option<Hook>,
}

impl ClassBuilder {
    /// Defaults to [`builtin::object`] when not called.
    pub fn parent(mut self, parent: &Class) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Converts a raw value into this class. Takes precedence over
    /// [`construct`](Self::construct).
    pub fn coerce<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Class, Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.coerce = Some(Arc::new(hook));
        self
    }

    /// Builds a new instance of this class from a raw value.
    pub fn construct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Class, Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.construct = Some(Arc::new(hook));
        self
    }

    /// Registers the class under its parent.
    ///
    /// If the parent has coercion installed, the new class starts with a
    /// snapshot of the parent's key rules; later changes to the parent are
    /// not seen by the child.
    pub fn build(self) -> Class {
        let parent = self.parent.unwrap_or_else(builtin::object);
        let rules = match parent.rules() {
            Some(inherited) => {
                tracing::debug!(class = %self.name, parent = %parent, "snapshotting key coercions");
                OnceCell::with_value(Arc::new(inherited.inherit()))
            }
            None => OnceCell::new(),
        };
        let info = Arc::new(ClassInfo {
            name: self.name,
            superclass: Some(parent.clone()),
            subclasses: RwLock::new(Vec::new()),
            coerce: self.coerce,
            construct: self.construct,
            rules,
        });

        let mut siblings = parent.0.subclasses.write();
        siblings.retain(|weak| weak.strong_count() > 0);
        siblings.push(Arc::downgrade(&info));
        drop(siblings);

        Class(info)
    }
}
