use crate::builtin;
use crate::class::Class;
use crate::engine::CoercionEngine;
use crate::map::CoercingMap;
use crate::rules::{CoercionRules, KeyCoercionRuleSet, ValueCoercionRuleSet};
use crate::target::Target;
use crate::value::{Symbol, Value};
use crate::write::{Coerced, WriteMap};
use std::sync::Arc;

/// A map class with coercion installed.
///
/// Rules are declared once, usually at startup, and read on every write
/// to containers of this type.
///
/// # Examples
///
/// ```
/// use sovran_coerce::{builtin, ContainerType, Target, Value};
///
/// let tweet = ContainerType::define("Tweet");
/// tweet
///     .coerce_key("retweets", Target::integer())
///     .coerce_value(&builtin::float(), Target::string());
///
/// let reply = tweet.derive("Reply");
/// assert_eq!(reply.key_coercion(&Value::sym("retweets")), Some(Target::integer()));
/// assert_eq!(reply.value_coercion(&Value::Float(1.0)), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainerType {
    class: Class,
}

impl ContainerType {
    /// Defines a new `Hash` subclass with coercion installed.
    pub fn define(name: impl Into<String>) -> Self {
        Self::include(&Class::new(name, &builtin::hash()))
    }

    /// Defines a subtype. It starts with a snapshot of this type's key
    /// rules and no value rules.
    pub fn derive(&self, name: impl Into<String>) -> Self {
        Self::include(&Class::new(name, &self.class))
    }

    /// Installs coercion on an existing class. Idempotent.
    pub fn include(class: &Class) -> Self {
        class.install_rules();
        Self {
            class: class.clone(),
        }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn rules(&self) -> &Arc<CoercionRules> {
        self.class.install_rules()
    }

    pub fn engine(&self) -> CoercionEngine<'_> {
        CoercionEngine::new(self.rules())
    }

    /// Coerces writes under `key` into `into`.
    pub fn coerce_key(&self, key: impl Into<Symbol>, into: impl Into<Target>) -> &Self {
        self.rules().register_key([key.into()], into.into());
        self
    }

    /// Coerces writes under each of `keys` into `into`.
    pub fn coerce_keys<I, K>(&self, keys: I, into: impl Into<Target>) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Symbol>,
    {
        self.rules().register_key(keys, into.into());
        self
    }

    /// Coerces values whose class is exactly `from`.
    pub fn coerce_value(&self, from: &Class, into: impl Into<Target>) -> &Self {
        self.coerce_value_with(from, into, true)
    }

    /// Coerces values of `from` and of every subclass defined so far.
    pub fn coerce_value_lenient(&self, from: &Class, into: impl Into<Target>) -> &Self {
        self.coerce_value_with(from, into, false)
    }

    pub fn coerce_value_with(&self, from: &Class, into: impl Into<Target>, strict: bool) -> &Self {
        self.rules().register_value(from, into.into(), strict);
        self
    }

    pub fn key_coercion(&self, key: &Value) -> Option<Target> {
        self.rules().key_rule(key)
    }

    pub fn value_coercion(&self, value: &Value) -> Option<Target> {
        self.rules().value_rule(value)
    }

    /// The target a write of `value` under `key` would be coerced into.
    pub fn target_for(&self, key: &Value, value: &Value) -> Option<Target> {
        self.rules().target_for(key, value)
    }

    pub fn key_coercions(&self) -> KeyCoercionRuleSet {
        self.rules().key_coercions()
    }

    pub fn value_coercions(&self) -> ValueCoercionRuleSet {
        self.rules().value_coercions()
    }

    /// Wraps `inner` so its writes go through this type's rules.
    pub fn intercept<W: WriteMap>(&self, inner: W) -> Coerced<W> {
        Coerced::new(self, inner)
    }

    /// An empty thread-safe container of this type.
    pub fn instantiate(&self) -> CoercingMap {
        CoercingMap::new(self)
    }
}

impl From<ContainerType> for Target {
    fn from(kind: ContainerType) -> Self {
        Target::Class(kind.class)
    }
}

impl From<&ContainerType> for Target {
    fn from(kind: &ContainerType) -> Self {
        Target::class(&kind.class)
    }
}
