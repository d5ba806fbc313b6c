use crate::builtin;
use crate::class::Class;
use crate::error::ConversionError;
use crate::object::Object;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An interned-style identifier, the canonical form of container keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: impl AsRef<str>) -> Self {
        Symbol(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol(Arc::from(name))
    }
}

impl From<&Symbol> for Symbol {
    fn from(symbol: &Symbol) -> Self {
        symbol.clone()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complex number. Compared and hashed by bit pattern.
#[derive(Clone, Copy, Debug)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl PartialEq for Complex {
    fn eq(&self, other: &Self) -> bool {
        self.re.to_bits() == other.re.to_bits() && self.im.to_bits() == other.im.to_bits()
    }
}

impl Eq for Complex {}

impl Hash for Complex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.re.to_bits().hash(state);
        self.im.to_bits().hash(state);
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.im.is_sign_negative() { '-' } else { '+' };
        write!(
            f,
            "({}{}{}i)",
            format_float(self.re),
            sign,
            format_float(self.im.abs())
        )
    }
}

/// A reduced fraction with a positive denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: i64,
}

impl Rational {
    /// Returns `None` for a zero denominator or when the reduced fraction
    /// does not fit in 64 bits.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        Self::from_i128(i128::from(num), i128::from(den))
    }

    pub(crate) fn from_i128(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let divisor = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1);
        let sign = if den < 0 { -1 } else { 1 };
        let divisor = i128::try_from(divisor).ok()?;
        let num = i64::try_from(sign * num / divisor).ok()?;
        let den = i64::try_from(sign * den / divisor).ok()?;
        Some(Self { num, den })
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> i64 {
        self.den
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Truncates toward zero.
    pub fn trunc(self) -> i64 {
        self.num / self.den
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}/{})", self.num, self.den)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// A map together with its class, so subclasses of `Hash` survive as values.
#[derive(Clone, Debug)]
pub struct MapValue {
    class: Class,
    entries: IndexMap<Value, Value>,
}

impl MapValue {
    pub fn new() -> Self {
        Self::with_class(builtin::hash())
    }

    pub fn with_class(class: Class) -> Self {
        Self {
            class,
            entries: IndexMap::new(),
        }
    }

    pub fn from_entries(class: Class, entries: IndexMap<Value, Value>) -> Self {
        Self { class, entries }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Value, Value> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &IndexMap<Value, Value> {
        &self.entries
    }

    pub fn into_entries(self) -> IndexMap<Value, Value> {
        self.entries
    }
}

impl Default for MapValue {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.entries == other.entries
    }
}

impl Eq for MapValue {}

impl Hash for MapValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Entry equality ignores order, so only order-free facts go in.
        self.class.hash(state);
        self.entries.len().hash(state);
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for MapValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_entries(builtin::hash(), entries)
    }
}

/// A dynamically typed value as stored in a coercing container.
///
/// Floats compare by bit pattern so every value can key a map.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    BigInt(i128),
    Float(f64),
    Complex(Complex),
    Rational(Rational),
    Str(String),
    Sym(Symbol),
    Array(Vec<Value>),
    Set(IndexSet<Value>),
    Map(MapValue),
    Object(Object),
}

impl Value {
    pub fn sym(name: impl AsRef<str>) -> Self {
        Value::Sym(Symbol::new(name))
    }

    /// Picks `Int` or `BigInt` depending on magnitude.
    pub fn integer(n: i128) -> Self {
        match i64::try_from(n) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::BigInt(n),
        }
    }

    pub fn array<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn set<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(entries.into_iter().collect())
    }

    pub fn object(object: impl crate::object::Instance) -> Self {
        Value::Object(Object::new(object))
    }

    /// The runtime class of this value.
    pub fn class(&self) -> Class {
        match self {
            Value::Nil => builtin::nil_class(),
            Value::Bool(true) => builtin::true_class(),
            Value::Bool(false) => builtin::false_class(),
            Value::Int(_) => builtin::fixnum(),
            Value::BigInt(_) => builtin::bignum(),
            Value::Float(_) => builtin::float(),
            Value::Complex(_) => builtin::complex(),
            Value::Rational(_) => builtin::rational(),
            Value::Str(_) => builtin::string(),
            Value::Sym(_) => builtin::symbol(),
            Value::Array(_) => builtin::array(),
            Value::Set(_) => builtin::set(),
            Value::Map(map) => map.class().clone(),
            Value::Object(object) => object.class(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Sym(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&IndexSet<Value>> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrows a domain instance as its concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_object().and_then(Object::downcast_ref)
    }

    /// Splits into elements. Maps enumerate as `[key, value]` pairs.
    pub fn into_elements(self) -> Result<Vec<Value>, ConversionError> {
        match self {
            Value::Array(items) => Ok(items),
            Value::Set(items) => Ok(items.into_iter().collect()),
            Value::Map(map) => Ok(map
                .into_entries()
                .into_iter()
                .map(|(k, v)| Value::Array(vec![k, v]))
                .collect()),
            other => Err(ConversionError::NotEnumerable {
                class: other.class(),
            }),
        }
    }

    /// Splits into key/value pairs. Sequences must hold two-element arrays.
    pub fn into_pairs(self) -> Result<Vec<(Value, Value)>, ConversionError> {
        match self {
            Value::Map(map) => Ok(map.into_entries().into_iter().collect()),
            Value::Array(_) | Value::Set(_) => self
                .into_elements()?
                .into_iter()
                .map(|element| match element {
                    Value::Array(pair) if pair.len() == 2 => {
                        let mut pair = pair.into_iter();
                        match (pair.next(), pair.next()) {
                            (Some(k), Some(v)) => Ok((k, v)),
                            _ => Err(ConversionError::custom("malformed pair")),
                        }
                    }
                    other => Err(ConversionError::custom(format!(
                        "wrong element type {} (expected array of two)",
                        other.class()
                    ))),
                })
                .collect(),
            other => Err(ConversionError::NotEnumerable {
                class: other.class(),
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::BigInt(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Complex(c) => c.hash(state),
            Value::Rational(r) => r.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Sym(s) => s.hash(state),
            Value::Array(items) => items.hash(state),
            Value::Set(items) => items.len().hash(state),
            Value::Map(map) => map.hash(state),
            Value::Object(object) => object.hash(state),
        }
    }
}

/// Inspect-style rendering: strings quoted, symbols prefixed with `:`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::BigInt(n) => write!(f, "{n}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Complex(c) => write!(f, "{c}"),
            Value::Rational(r) => write!(f, "{r}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Sym(s) => write!(f, ":{s}"),
            Value::Array(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Value::Set(items) => {
                f.write_str("#<Set: {")?;
                write_joined(f, items.iter())?;
                f.write_str("}>")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}=>{v}")?;
                }
                f.write_str("}")
            }
            Value::Object(object) => write!(f, "#<{}>", object.class()),
        }
    }
}

fn write_joined<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a Value>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

pub(crate) fn format_float(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        let text = if x > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{x:.1}")
    } else if x.abs() >= 1e16 {
        format!("{x:e}")
    } else {
        format!("{x}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Value::integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Sym(symbol)
    }
}

impl From<Complex> for Value {
    fn from(c: Complex) -> Self {
        Value::Complex(c)
    }
}

impl From<Rational> for Value {
    fn from(r: Rational) -> Self {
        Value::Rational(r)
    }
}

impl From<MapValue> for Value {
    fn from(map: MapValue) -> Self {
        Value::Map(map)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

/// JSON objects become plain `Hash` maps with string keys.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::integer(i128::from(u))
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::array(items),
            Json::Object(entries) => Value::map(entries),
        }
    }
}
