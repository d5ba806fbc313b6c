use crate::builtin;
use crate::class::Class;
use crate::target::Target;
use crate::value::{Symbol, Value};
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Explicit key → target rules for one container type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyCoercionRuleSet {
    rules: IndexMap<Symbol, Target>,
}

impl KeyCoercionRuleSet {
    /// Binds `target` to every key, replacing earlier rules for those keys.
    pub fn register<I, K>(&mut self, keys: I, target: Target)
    where
        I: IntoIterator<Item = K>,
        K: Into<Symbol>,
    {
        for key in keys {
            self.rules.insert(key.into(), target.clone());
        }
    }

    pub fn lookup(&self, key: &Value) -> Option<&Target> {
        Self::canonicalize(key).and_then(|symbol| self.rules.get(&symbol))
    }

    /// Strings and symbols share one canonical form; other keys have none
    /// and never match a key rule.
    pub fn canonicalize(key: &Value) -> Option<Symbol> {
        match key {
            Value::Sym(symbol) => Some(symbol.clone()),
            Value::Str(s) => Some(Symbol::new(s)),
            _ => None,
        }
    }

    pub fn rules(&self) -> &IndexMap<Symbol, Target> {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Value-class → target rules for one container type.
///
/// The strict tier matches a value's exact class. The lenient tier is
/// expanded when a rule is registered: the declared class, its ancestors
/// and every subclass defined at that moment get their own entry, so lookup
/// remains an exact-class match. The universal root and abstract categories
/// are never recorded. Classes defined after registration are not covered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueCoercionRuleSet {
    strict: IndexMap<Class, Target>,
    lenient: IndexMap<Class, Target>,
}

impl ValueCoercionRuleSet {
    pub fn register(&mut self, from: &Class, target: Target, strict: bool) {
        if let Some(members) = builtin::abstract_members(from) {
            for member in members {
                self.register(&member, target.clone(), strict);
            }
            return;
        }

        if strict {
            self.strict.insert(from.clone(), target);
            return;
        }
        let related = from.ancestors().cloned().chain(from.descendants());
        for class in related {
            if class.is_root() || builtin::abstract_members(&class).is_some() {
                continue;
            }
            self.lenient.insert(class, target.clone());
        }
    }

    pub fn lookup(&self, value: &Value) -> Option<&Target> {
        let class = value.class();
        self.strict
            .get(&class)
            .or_else(|| self.lenient.get(&class))
    }

    pub fn strict(&self) -> &IndexMap<Class, Target> {
        &self.strict
    }

    pub fn lenient(&self) -> &IndexMap<Class, Target> {
        &self.lenient
    }
}

/// The rule registries attached to one container type.
///
/// Registration takes a write lock; lookups only read.
#[derive(Debug, Default)]
pub struct CoercionRules {
    keys: RwLock<KeyCoercionRuleSet>,
    values: RwLock<ValueCoercionRuleSet>,
}

impl CoercionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for a subtype: a snapshot of the key rules and fresh value rules.
    pub fn inherit(&self) -> Self {
        Self {
            keys: RwLock::new(self.keys.read().clone()),
            values: RwLock::new(ValueCoercionRuleSet::default()),
        }
    }

    pub fn register_key<I, K>(&self, keys: I, target: Target)
    where
        I: IntoIterator<Item = K>,
        K: Into<Symbol>,
    {
        let keys: Vec<Symbol> = keys.into_iter().map(Into::into).collect();
        tracing::debug!(?keys, %target, "registering key coercion");
        self.keys.write().register(keys, target);
    }

    pub fn register_value(&self, from: &Class, target: Target, strict: bool) {
        tracing::debug!(%from, %target, strict, "registering value coercion");
        self.values.write().register(from, target, strict);
    }

    pub fn key_rule(&self, key: &Value) -> Option<Target> {
        self.keys.read().lookup(key).cloned()
    }

    pub fn value_rule(&self, value: &Value) -> Option<Target> {
        self.values.read().lookup(value).cloned()
    }

    /// The target a write of `value` under `key` resolves to. Key rules win.
    pub fn target_for(&self, key: &Value, value: &Value) -> Option<Target> {
        self.key_rule(key).or_else(|| self.value_rule(value))
    }

    pub fn key_coercions(&self) -> KeyCoercionRuleSet {
        self.keys.read().clone()
    }

    pub fn value_coercions(&self) -> ValueCoercionRuleSet {
        self.values.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_rules_canonicalize() {
        let mut keys = KeyCoercionRuleSet::default();
        keys.register(["user", "owner"], Target::string());

        assert_eq!(keys.lookup(&Value::sym("user")), Some(&Target::string()));
        assert_eq!(keys.lookup(&Value::from("owner")), Some(&Target::string()));
        assert_eq!(keys.lookup(&Value::Int(1)), None);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_key_rules_overwrite() {
        let mut keys = KeyCoercionRuleSet::default();
        keys.register(["count"], Target::string());
        keys.register(["count"], Target::integer());
        assert_eq!(keys.lookup(&Value::sym("count")), Some(&Target::integer()));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_strict_rules_match_exact_class() {
        let special = Class::new("SpecialHash", &builtin::hash());
        let mut values = ValueCoercionRuleSet::default();
        values.register(&builtin::hash(), Target::class(&special), true);

        assert!(values.lookup(&Value::map([("a", 1)])).is_some());
        let sub = Value::Map(crate::value::MapValue::with_class(special));
        assert!(values.lookup(&sub).is_none());
    }

    #[test]
    fn test_lenient_rules_cover_existing_subclasses() {
        let vehicle = Class::new("Vehicle", &builtin::object());
        let car = Class::new("Car", &vehicle);
        let garage = Class::new("Garage", &builtin::object());

        let mut values = ValueCoercionRuleSet::default();
        values.register(&vehicle, Target::class(&garage), false);
        let late = Class::new("Truck", &vehicle);

        assert!(values.lenient().contains_key(&vehicle));
        assert!(values.lenient().contains_key(&car));
        assert!(!values.lenient().contains_key(&late));
        assert!(!values.lenient().contains_key(&builtin::object()));
        assert!(values.strict().is_empty());
    }

    #[test]
    fn test_lenient_rules_cover_ancestors() {
        let vehicle = Class::new("Vehicle", &builtin::object());
        let car = Class::new("Car", &vehicle);
        let sports_car = Class::new("SportsCar", &car);
        let racer = Class::new("Racer", &sports_car);
        let truck = Class::new("Truck", &vehicle);

        let mut values = ValueCoercionRuleSet::default();
        values.register(&sports_car, Target::string(), false);

        let recorded: Vec<&Class> = values.lenient().keys().collect();
        assert_eq!(recorded, vec![&sports_car, &car, &vehicle, &racer]);
        assert!(!values.lenient().contains_key(&truck));
        assert!(values.strict().is_empty());
    }

    #[test]
    fn test_lenient_builtin_skips_abstract_ancestors() {
        let mut values = ValueCoercionRuleSet::default();
        values.register(&builtin::fixnum(), Target::string(), false);

        assert_eq!(values.lenient().len(), 1);
        assert!(values.lenient().contains_key(&builtin::fixnum()));
        assert!(!values.lenient().contains_key(&builtin::numeric()));
    }

    #[test]
    fn test_abstract_categories_expand() {
        let mut values = ValueCoercionRuleSet::default();
        values.register(&builtin::numeric(), Target::string(), true);

        assert!(!values.strict().contains_key(&builtin::numeric()));
        assert_eq!(values.strict().len(), 5);
        assert_eq!(values.lookup(&Value::Float(1.5)), Some(&Target::string()));
        assert_eq!(values.lookup(&Value::BigInt(i128::MAX)), Some(&Target::string()));
    }

    #[test]
    fn test_lenient_abstract_category_skips_the_category() {
        let mut values = ValueCoercionRuleSet::default();
        values.register(&builtin::integer(), Target::string(), false);

        assert!(!values.lenient().contains_key(&builtin::integer()));
        assert!(values.lenient().contains_key(&builtin::fixnum()));
        assert!(values.lenient().contains_key(&builtin::bignum()));
    }

    #[test]
    fn test_inherit_snapshots_keys_only() {
        let parent = CoercionRules::new();
        parent.register_key(["a"], Target::integer());
        parent.register_value(&builtin::string(), Target::symbol(), true);

        let child = parent.inherit();
        parent.register_key(["b"], Target::integer());

        assert!(child.key_rule(&Value::sym("a")).is_some());
        assert!(child.key_rule(&Value::sym("b")).is_none());
        assert!(child.value_rule(&Value::from("x")).is_none());
    }

    #[test]
    fn test_key_rule_precedence() {
        let rules = CoercionRules::new();
        rules.register_key(["id"], Target::integer());
        rules.register_value(&builtin::string(), Target::symbol(), true);

        assert_eq!(
            rules.target_for(&Value::sym("id"), &Value::from("7")),
            Some(Target::integer())
        );
        assert_eq!(
            rules.target_for(&Value::sym("name"), &Value::from("7")),
            Some(Target::symbol())
        );
        assert_eq!(rules.target_for(&Value::sym("name"), &Value::Int(7)), None);
    }
}
