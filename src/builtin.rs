//! The built-in class tree.
//!
//! ```text
//! Object
//! ├── NilClass, TrueClass, FalseClass
//! ├── Numeric
//! │   ├── Integer ── Fixnum, Bignum
//! │   └── Float, Complex, Rational
//! ├── String, Symbol
//! └── Array, Set, Hash
//! ```
//!
//! `Integer` and `Numeric` are abstract: no value reports them as its class.

use crate::class::Class;
use crate::convert;
use once_cell::sync::Lazy;

static OBJECT: Lazy<Class> = Lazy::new(|| Class::root("Object"));
static NIL_CLASS: Lazy<Class> = Lazy::new(|| Class::new("NilClass", &OBJECT));
static TRUE_CLASS: Lazy<Class> = Lazy::new(|| Class::new("TrueClass", &OBJECT));
static FALSE_CLASS: Lazy<Class> = Lazy::new(|| Class::new("FalseClass", &OBJECT));
static NUMERIC: Lazy<Class> = Lazy::new(|| Class::new("Numeric", &OBJECT));
static INTEGER: Lazy<Class> = Lazy::new(|| Class::new("Integer", &NUMERIC));
static FIXNUM: Lazy<Class> = Lazy::new(|| Class::new("Fixnum", &INTEGER));
static BIGNUM: Lazy<Class> = Lazy::new(|| Class::new("Bignum", &INTEGER));
static FLOAT: Lazy<Class> = Lazy::new(|| Class::new("Float", &NUMERIC));
static COMPLEX: Lazy<Class> = Lazy::new(|| Class::new("Complex", &NUMERIC));
static RATIONAL: Lazy<Class> = Lazy::new(|| Class::new("Rational", &NUMERIC));
static STRING: Lazy<Class> = Lazy::new(|| Class::new("String", &OBJECT));
static SYMBOL: Lazy<Class> = Lazy::new(|| Class::new("Symbol", &OBJECT));
static ARRAY: Lazy<Class> = Lazy::new(|| {
    Class::builder("Array")
        .parent(&OBJECT)
        .construct(convert::construct_array)
        .build()
});
static SET: Lazy<Class> = Lazy::new(|| {
    Class::builder("Set")
        .parent(&OBJECT)
        .construct(convert::construct_set)
        .build()
});
static HASH: Lazy<Class> = Lazy::new(|| {
    Class::builder("Hash")
        .parent(&OBJECT)
        .construct(convert::construct_hash)
        .build()
});

/// The universal root.
pub fn object() -> Class {
    OBJECT.clone()
}

pub fn nil_class() -> Class {
    NIL_CLASS.clone()
}

pub fn true_class() -> Class {
    TRUE_CLASS.clone()
}

pub fn false_class() -> Class {
    FALSE_CLASS.clone()
}

/// Abstract: "any number".
pub fn numeric() -> Class {
    NUMERIC.clone()
}

/// Abstract: "any integer".
pub fn integer() -> Class {
    INTEGER.clone()
}

/// Integers that fit in 64 bits.
pub fn fixnum() -> Class {
    FIXNUM.clone()
}

/// Integers beyond 64 bits.
pub fn bignum() -> Class {
    BIGNUM.clone()
}

pub fn float() -> Class {
    FLOAT.clone()
}

pub fn complex() -> Class {
    COMPLEX.clone()
}

pub fn rational() -> Class {
    RATIONAL.clone()
}

pub fn string() -> Class {
    STRING.clone()
}

pub fn symbol() -> Class {
    SYMBOL.clone()
}

pub fn array() -> Class {
    ARRAY.clone()
}

pub fn set() -> Class {
    SET.clone()
}

pub fn hash() -> Class {
    HASH.clone()
}

/// Every built-in class, root first.
pub fn all() -> Vec<Class> {
    vec![
        object(),
        nil_class(),
        true_class(),
        false_class(),
        numeric(),
        integer(),
        fixnum(),
        bignum(),
        float(),
        complex(),
        rational(),
        string(),
        symbol(),
        array(),
        set(),
        hash(),
    ]
}

/// Looks up a built-in class by name.
pub fn by_name(name: &str) -> Option<Class> {
    all().into_iter().find(|class| class.name() == name)
}

/// The concrete members of an abstract numeric category, or `None` if
/// `class` is not abstract.
pub fn abstract_members(class: &Class) -> Option<Vec<Class>> {
    if *class == *INTEGER {
        Some(vec![fixnum(), bignum()])
    } else if *class == *NUMERIC {
        Some(vec![fixnum(), bignum(), float(), complex(), rational()])
    } else {
        None
    }
}
