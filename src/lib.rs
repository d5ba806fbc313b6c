//! # sovran-coerce
//!
//! Map containers that coerce what you put into them.
//!
//! `sovran-coerce` lets a map type declare that the value stored under a
//! given key, or any value of a given class, should be converted into a
//! target type on every write. The write side of the container is wrapped
//! once, and every later assignment runs through the declared rules before
//! it lands.
//!
//! ## Key Features
//!
//! - **Key rules**: `:retweets` is always stored as an `Integer`
//! - **Value rules**: any `Float` written to the map becomes a `String`,
//!   either for the exact class or for it and its subclasses
//! - **Nested targets**: `Array<Symbol>`, `Set<Integer>` and
//!   `Hash<Symbol, Integer>` are rebuilt element by element
//! - **Domain classes**: your own types join in through `coerce` or
//!   `construct` hooks on their [`Class`]
//! - **Thread-safe**: [`CoercingMap`] is built on `Arc<Mutex<_>>`
//! - **Deep find**: [`DeepFind`] searches nested maps and sequences for a key
//!
//! ## Usage Examples
//!
//! ### Key Coercion
//!
//! ```rust
//! use sovran_coerce::{ContainerType, Target, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tweet = ContainerType::define("Tweet");
//!     tweet
//!         .coerce_key("retweets", Target::integer())
//!         .coerce_key("mentions", Target::array(Target::symbol()));
//!
//!     let map = tweet.instantiate();
//!     map.set(Value::sym("retweets"), "12")?;
//!     map.set(Value::sym("mentions"), Value::array(["alice", "bob"]))?;
//!     map.set(Value::sym("count"), "5")?;
//!
//!     assert_eq!(map.get(Value::sym("retweets"))?, Value::Int(12));
//!     assert_eq!(
//!         map.get(Value::sym("mentions"))?,
//!         Value::array([Value::sym("alice"), Value::sym("bob")])
//!     );
//!     // No rule covers :count, so it is stored as given.
//!     assert_eq!(map.get(Value::sym("count"))?, Value::from("5"));
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Value Coercion and Subclasses
//!
//! ```rust
//! use sovran_coerce::{builtin, Class, ContainerType, MapValue, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let special = ContainerType::define("SpecialHash");
//!     let strict = ContainerType::define("StrictBox");
//!     strict.coerce_value(&builtin::hash(), &special);
//!
//!     let map = strict.instantiate();
//!     map.set("plain", Value::map([("a", 1)]))?;
//!     assert_eq!(map.get("plain")?.class(), *special.class());
//!
//!     // Strict rules match the exact class only.
//!     let other = Class::new("OtherHash", &builtin::hash());
//!     map.set("other", Value::from(MapValue::with_class(other.clone())))?;
//!     assert_eq!(map.get("other")?.class(), other);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Domain Classes
//!
//! ```rust
//! use sovran_coerce::{Class, ContainerType, ConversionError, Instance, Value};
//! use std::any::Any;
//!
//! #[derive(Debug)]
//! struct User {
//!     name: String,
//!     class: Class,
//! }
//!
//! impl Instance for User {
//!     fn class(&self) -> Class {
//!         self.class.clone()
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let user = Class::builder("User")
//!         .construct(|class, value| {
//!             let name = value
//!                 .as_map()
//!                 .and_then(|map| map.get(&Value::sym("name")))
//!                 .and_then(Value::as_str)
//!                 .ok_or_else(|| ConversionError::custom("a user needs a name"))?;
//!             Ok(Value::object(User {
//!                 name: name.to_string(),
//!                 class: class.clone(),
//!             }))
//!         })
//!         .build();
//!
//!     let tweet = ContainerType::define("Tweet");
//!     tweet.coerce_key("user", &user);
//!
//!     let map = tweet.instantiate();
//!     map.set(Value::sym("user"), Value::map([(Value::sym("name"), "bob")]))?;
//!     let name = map.with_object(Value::sym("user"), |u: &User| u.name.clone())?;
//!     assert_eq!(name, "bob");
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Intercepting an Existing Map
//!
//! ```rust
//! use sovran_coerce::{ContainerType, Target, Value, WriteMap};
//! use std::collections::HashMap;
//!
//! let settings = ContainerType::define("Settings");
//! settings.coerce_key("port", Target::integer());
//!
//! let mut map = settings.intercept(HashMap::<Value, Value>::new());
//! map.write(Value::sym("port"), Value::from("8080")).unwrap();
//! assert_eq!(map.get(&Value::sym("port")), Some(&Value::Int(8080)));
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_coerce::{builtin, Class, ContainerType, ConversionError, Value};
//!
//! let opaque = Class::new("Opaque", &builtin::object());
//! let kind = ContainerType::define("Holder");
//! kind.coerce_key("thing", &opaque);
//!
//! let map = kind.instantiate();
//! match map.set(Value::sym("thing"), 1) {
//!     Ok(()) => println!("stored"),
//!     Err(e) => {
//!         assert_eq!(e.key(), &Value::sym("thing"));
//!         assert!(matches!(e.cause(), ConversionError::Unsupported(_)));
//!         println!("{e}");
//!     }
//! }
//! assert!(map.is_empty());
//! ```

pub mod builtin;
mod class;
mod config;
mod container;
mod convert;
mod engine;
mod error;
mod find;
mod map;
mod object;
mod primitive;
mod rules;
mod target;
mod value;
mod write;

pub use class::{Ancestors, Class, ClassBuilder, Hook};
pub use config::{ClassCatalog, CoercionConfig, ValueRuleConfig};
pub use container::ContainerType;
pub use convert::{Converter, TypeConverterRegistry};
pub use engine::CoercionEngine;
pub use error::{CoercionError, ConfigError, ConversionError, MapError, UnsupportedTypeError};
pub use find::DeepFind;
pub use map::CoercingMap;
pub use object::{Instance, Object, StandIn};
pub use primitive::Primitive;
pub use rules::{CoercionRules, KeyCoercionRuleSet, ValueCoercionRuleSet};
pub use target::{Target, Transform};
pub use value::{Complex, MapValue, Rational, Symbol, Value};
pub use write::{Coerced, WriteMap};
