//! Declarative coercion rules loaded from TOML.
//!
//! ```toml
//! [keys]
//! user = "User"
//! counts = "Hash<Symbol, Integer>"
//! tags = "Set<Symbol>"
//!
//! [[values]]
//! from = "Hash"
//! into = "SpecialHash"
//! strict = true
//! ```
//!
//! Type grammar: `Name`, `Array<T>`, `Set<T>`, `Hash<T>` (one target for
//! keys and values), `Hash<K, V>`, any `Hash` subclass in place of `Hash`,
//! and `_` for an empty slot.

use crate::builtin;
use crate::class::Class;
use crate::container::ContainerType;
use crate::error::ConfigError;
use crate::target::Target;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Classes that rule files may name. Built-ins are always present.
#[derive(Clone, Debug)]
pub struct ClassCatalog {
    classes: IndexMap<String, Class>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        let classes = builtin::all()
            .into_iter()
            .map(|class| (class.name().to_string(), class))
            .collect();
        Self { classes }
    }

    /// Makes `class` resolvable by its name, replacing any earlier entry.
    pub fn register(&mut self, class: &Class) -> &mut Self {
        self.classes.insert(class.name().to_string(), class.clone());
        self
    }

    pub fn with(mut self, class: &Class) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    /// Parses a type spec such as `Hash<Symbol, Array<Integer>>`.
    ///
    /// Returns `None` for the empty slot `_`.
    pub fn parse_target(&self, spec: &str) -> Result<Option<Target>, ConfigError> {
        let mut parser = SpecParser {
            spec,
            pos: 0,
            catalog: self,
        };
        let target = parser.target()?;
        parser.skip_ws();
        if parser.pos != spec.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(target)
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::new()
    }
}

struct SpecParser<'a> {
    spec: &'a str,
    pos: usize,
    catalog: &'a ClassCatalog,
}

impl<'a> SpecParser<'a> {
    fn error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Syntax {
            spec: self.spec.to_string(),
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &str {
        &self.spec[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<&'a str, ConfigError> {
        self.skip_ws();
        let spec: &'a str = self.spec;
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error(format!("expected a type name at offset {start}")));
        }
        self.pos += len;
        Ok(&spec[start..self.pos])
    }

    fn target(&mut self) -> Result<Option<Target>, ConfigError> {
        let name = self.ident()?;
        if name == "_" {
            return Ok(None);
        }
        let class = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownClass(name.to_string()))?;

        let mut params = Vec::new();
        if self.eat('<') {
            loop {
                params.push(self.target()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected `,` or `>`"));
            }
        }

        let array = builtin::array();
        let set = builtin::set();
        match params.len() {
            0 => Ok(Some(Target::Class(class))),
            1 if class == array => Ok(Some(Target::array(params.pop().flatten()))),
            1 if class == set => Ok(Some(Target::set(params.pop().flatten()))),
            1 if class.is_a(&builtin::hash()) => {
                let both = params.pop().flatten();
                Ok(Some(Target::map(&class, both.clone(), both)))
            }
            2 if class.is_a(&builtin::hash()) => {
                let value = params.pop().flatten();
                let key = params.pop().flatten();
                Ok(Some(Target::map(&class, key, value)))
            }
            n => Err(self.error(format!("{class} does not take {n} type parameter(s)"))),
        }
    }
}

/// One `[[values]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ValueRuleConfig {
    pub from: String,
    pub into: String,
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

/// A rule file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoercionConfig {
    #[serde(default)]
    pub keys: IndexMap<String, String>,
    #[serde(default)]
    pub values: Vec<ValueRuleConfig>,
}

impl CoercionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Registers every rule on `kind`.
    ///
    /// All entries are resolved first; if any fails nothing is registered.
    pub fn apply_to(&self, kind: &ContainerType, catalog: &ClassCatalog) -> Result<(), ConfigError> {
        let mut keys = Vec::with_capacity(self.keys.len());
        for (key, spec) in &self.keys {
            let target = catalog
                .parse_target(spec)?
                .ok_or_else(|| empty_target(spec))?;
            keys.push((key.as_str(), target));
        }

        let mut values = Vec::with_capacity(self.values.len());
        for rule in &self.values {
            let from = catalog
                .get(&rule.from)
                .ok_or_else(|| ConfigError::UnknownClass(rule.from.clone()))?;
            let target = catalog
                .parse_target(&rule.into)?
                .ok_or_else(|| empty_target(&rule.into))?;
            values.push((from, target, rule.strict));
        }

        tracing::debug!(
            kind = kind.name(),
            keys = keys.len(),
            values = values.len(),
            "applying coercion config"
        );
        for (key, target) in keys {
            kind.coerce_key(key, target);
        }
        for (from, target, strict) in values {
            kind.coerce_value_with(from, target, strict);
        }
        Ok(())
    }
}

fn empty_target(spec: &str) -> ConfigError {
    ConfigError::Syntax {
        spec: spec.to_string(),
        reason: "a rule needs a target".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_targets() {
        let catalog = ClassCatalog::new();
        let parse = |spec: &str| catalog.parse_target(spec).unwrap();

        assert_eq!(parse("Integer"), Some(Target::integer()));
        assert_eq!(parse("_"), None);
        assert_eq!(parse("Array<Symbol>"), Some(Target::array(Target::symbol())));
        assert_eq!(parse("Set< Integer >"), Some(Target::set(Target::integer())));
        assert_eq!(parse("Hash<String>"), Some(Target::hash_of(Target::string())));
        assert_eq!(
            parse("Hash<_, Array<Float>>"),
            Some(Target::hash(None, Target::array(Target::float())))
        );
    }

    #[test]
    fn test_parse_errors() {
        let catalog = ClassCatalog::new();
        assert!(matches!(
            catalog.parse_target("Widget"),
            Err(ConfigError::UnknownClass(name)) if name == "Widget"
        ));
        assert!(matches!(
            catalog.parse_target("Integer<String>"),
            Err(ConfigError::Syntax { .. })
        ));
        assert!(matches!(
            catalog.parse_target("Array<Integer"),
            Err(ConfigError::Syntax { .. })
        ));
        assert!(matches!(
            catalog.parse_target("Hash<String> extra"),
            Err(ConfigError::Syntax { .. })
        ));
    }

    #[test]
    fn test_hash_subclasses_parameterize() {
        let special = Class::new("Tally", &builtin::hash());
        let catalog = ClassCatalog::new().with(&special);
        assert_eq!(
            catalog.parse_target("Tally<Symbol, Integer>").unwrap(),
            Some(Target::map(&special, Target::symbol(), Target::integer()))
        );
    }

    #[test]
    fn test_apply_config() {
        let config = CoercionConfig::from_toml_str(
            r#"
            [keys]
            count = "Integer"
            tags = "Set<Symbol>"

            [[values]]
            from = "Float"
            into = "String"

            [[values]]
            from = "Numeric"
            into = "Rational"
            strict = false
            "#,
        )
        .unwrap();
        assert!(config.values[0].strict);

        let kind = ContainerType::define("Configured");
        config.apply_to(&kind, &ClassCatalog::new()).unwrap();

        assert_eq!(kind.key_coercion(&Value::sym("count")), Some(Target::integer()));
        assert_eq!(kind.value_coercion(&Value::Float(1.0)), Some(Target::string()));
        assert_eq!(kind.value_coercion(&Value::Int(1)), Some(Target::rational()));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let config = CoercionConfig::from_toml_str(
            r#"
            [keys]
            good = "Integer"
            bad = "Nope"
            "#,
        )
        .unwrap();
        let kind = ContainerType::define("Rejected");
        assert!(config.apply_to(&kind, &ClassCatalog::new()).is_err());
        assert!(kind.key_coercions().is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            CoercionConfig::from_toml_str("[keyz]\na = \"Integer\""),
            Err(ConfigError::Toml(_))
        ));
    }
}
