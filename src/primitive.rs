//! Conversions behind the primitive targets.
//!
//! Text parsing is lenient in the usual scripting-runtime way: the longest
//! valid prefix is used and unparsable text yields zero.

use crate::error::ConversionError;
use crate::value::{format_float, Complex, Rational, Symbol, Value};

/// The built-in kinds with a fixed conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Integer,
    Float,
    Complex,
    Rational,
    String,
    Symbol,
}

impl Primitive {
    /// Name of the conversion, as reported in errors.
    pub fn method(self) -> &'static str {
        match self {
            Primitive::Integer => "to_i",
            Primitive::Float => "to_f",
            Primitive::Complex => "to_c",
            Primitive::Rational => "to_r",
            Primitive::String => "to_s",
            Primitive::Symbol => "to_sym",
        }
    }

    pub fn convert(self, value: Value) -> Result<Value, ConversionError> {
        match self {
            Primitive::Integer => to_integer(value),
            Primitive::Float => to_float(value).map(Value::Float),
            Primitive::Complex => to_complex(value).map(Value::Complex),
            Primitive::Rational => to_rational(value).map(Value::Rational),
            Primitive::String => Ok(Value::Str(to_text(&value))),
            Primitive::Symbol => to_symbol(value).map(Value::Sym),
        }
    }
}

fn no_conversion(method: &'static str, value: &Value) -> ConversionError {
    ConversionError::NoConversion {
        method,
        class: value.class(),
    }
}

fn out_of_range(value: &Value, target: &'static str) -> ConversionError {
    ConversionError::OutOfRange {
        value: value.to_string(),
        target,
    }
}

fn to_integer(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::Int(_) | Value::BigInt(_) => Ok(value),
        Value::Float(x) => float_to_integer(x).ok_or_else(|| out_of_range(&value, "Integer")),
        Value::Rational(r) => Ok(Value::Int(r.trunc())),
        Value::Complex(c) if c.im == 0.0 => {
            float_to_integer(c.re).ok_or_else(|| out_of_range(&value, "Integer"))
        }
        Value::Complex(_) => Err(out_of_range(&value, "Integer")),
        Value::Str(ref s) => leading_integer(s)
            .map(Value::integer)
            .ok_or_else(|| out_of_range(&value, "Integer")),
        other => Err(no_conversion("to_i", &other)),
    }
}

fn float_to_integer(x: f64) -> Option<Value> {
    if !x.is_finite() {
        return None;
    }
    let truncated = x.trunc();
    let limit = 2f64.powi(127);
    if truncated >= limit || truncated < -limit {
        return None;
    }
    Some(Value::integer(truncated as i128))
}

fn to_float(value: Value) -> Result<f64, ConversionError> {
    match value {
        Value::Float(x) => Ok(x),
        Value::Int(n) => Ok(n as f64),
        Value::BigInt(n) => Ok(n as f64),
        Value::Rational(r) => Ok(r.to_f64()),
        Value::Complex(c) if c.im == 0.0 => Ok(c.re),
        Value::Complex(_) => Err(out_of_range(&value, "Float")),
        Value::Str(s) => Ok(scan_float(s.trim_start()).map_or(0.0, |(x, _)| x)),
        other => Err(no_conversion("to_f", &other)),
    }
}

fn to_complex(value: Value) -> Result<Complex, ConversionError> {
    match value {
        Value::Complex(c) => Ok(c),
        Value::Str(s) => Ok(parse_complex(s.trim_start())),
        Value::Int(_) | Value::BigInt(_) | Value::Float(_) | Value::Rational(_) => {
            Ok(Complex::new(to_float(value)?, 0.0))
        }
        other => Err(no_conversion("to_c", &other)),
    }
}

fn to_rational(value: Value) -> Result<Rational, ConversionError> {
    let converted = match &value {
        Value::Rational(r) => Some(*r),
        Value::Int(n) => Rational::new(*n, 1),
        Value::BigInt(n) => Rational::from_i128(*n, 1),
        Value::Float(x) => rational_from_f64(*x),
        Value::Complex(c) if c.im == 0.0 => rational_from_f64(c.re),
        Value::Complex(_) => None,
        Value::Str(s) => parse_rational(s.trim_start()),
        other => return Err(no_conversion("to_r", other)),
    };
    converted.ok_or_else(|| out_of_range(&value, "Rational"))
}

/// The textual form: raw for strings and symbols, inspect-style otherwise.
pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        Value::Str(s) => s.clone(),
        Value::Sym(s) => s.as_str().to_string(),
        Value::Float(x) => format_float(*x),
        other => other.to_string(),
    }
}

fn to_symbol(value: Value) -> Result<Symbol, ConversionError> {
    match value {
        Value::Sym(s) => Ok(s),
        Value::Str(s) => Ok(Symbol::from(s)),
        other => Err(no_conversion("to_sym", &other)),
    }
}

/// Parses an optional sign and a run of digits (single underscores allowed
/// between digits) after leading whitespace. No digits means zero; `None`
/// means the number does not fit in 128 bits.
pub(crate) fn leading_integer(text: &str) -> Option<i128> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut acc: i128 = 0;
    let mut seen_digit = false;
    let mut after_underscore = false;
    for byte in digits.bytes() {
        match byte {
            b'0'..=b'9' => {
                acc = acc.checked_mul(10)?.checked_add(i128::from(byte - b'0'))?;
                seen_digit = true;
                after_underscore = false;
            }
            b'_' if seen_digit && !after_underscore => after_underscore = true,
            _ => break,
        }
    }
    Some(if negative { -acc } else { acc })
}

/// Scans the longest decimal float prefix; returns the value and the number
/// of bytes consumed, or `None` if there are no digits.
fn scan_float(text: &str) -> Option<(f64, usize)> {
    let bytes = text.as_bytes();
    let is_digit = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while is_digit(end) {
        end += 1;
    }
    let mut has_digits = end > int_start;
    if bytes.get(end) == Some(&b'.') && is_digit(end + 1) {
        end += 1;
        while is_digit(end) {
            end += 1;
        }
        has_digits = true;
    }
    if !has_digits {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while is_digit(exp_end) {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    text[..end].parse().ok().map(|x| (x, end))
}

fn parse_complex(text: &str) -> Complex {
    let unit = |rest: &str| match rest.as_bytes().first() {
        Some(b'+') if rest[1..].starts_with('i') => Some(1.0),
        Some(b'-') if rest[1..].starts_with('i') => Some(-1.0),
        Some(b'i') => Some(1.0),
        _ => None,
    };

    let Some((real, used)) = scan_float(text) else {
        return Complex::new(0.0, unit(text).unwrap_or(0.0));
    };
    let rest = &text[used..];
    if rest.starts_with('i') {
        return Complex::new(0.0, real);
    }
    if let Some(im) = unit(rest) {
        return Complex::new(real, im);
    }
    if matches!(rest.as_bytes().first(), Some(b'+' | b'-')) {
        if let Some((im, im_used)) = scan_float(rest) {
            if rest[im_used..].starts_with('i') {
                return Complex::new(real, im);
            }
        }
    }
    Complex::new(real, 0.0)
}

/// `n`, `n.frac`, `n/d` and `n.frac/d`; zero when nothing parses.
fn parse_rational(text: &str) -> Option<Rational> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            pos = 1;
            true
        }
        Some(b'+') => {
            pos = 1;
            false
        }
        _ => false,
    };

    let mut num: i128 = 0;
    let mut den: i128 = 1;
    let mut seen_digit = false;
    while let Some(d) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
        num = num.checked_mul(10)?.checked_add(i128::from(d - b'0'))?;
        seen_digit = true;
        pos += 1;
    }
    if !seen_digit {
        return Rational::new(0, 1);
    }
    if bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
        pos += 1;
        while let Some(d) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
            num = num.checked_mul(10)?.checked_add(i128::from(d - b'0'))?;
            den = den.checked_mul(10)?;
            pos += 1;
        }
    }
    if bytes.get(pos) == Some(&b'/') && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
        let divisor = leading_integer(&text[pos + 1..])?;
        den = den.checked_mul(divisor)?;
    }
    Rational::from_i128(if negative { -num } else { num }, den)
}

/// Exact conversion of a finite float.
fn rational_from_f64(x: f64) -> Option<Rational> {
    if !x.is_finite() {
        return None;
    }
    if x == 0.0 {
        return Rational::new(0, 1);
    }
    let bits = x.to_bits();
    let negative = bits >> 63 == 1;
    let raw_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mut mantissa, mut exp) = if raw_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), raw_exp - 1075)
    };

    if exp < 0 {
        let shift = mantissa.trailing_zeros().min(exp.unsigned_abs());
        mantissa >>= shift;
        exp += shift as i32;
    }
    let signed = if negative {
        -i128::from(mantissa)
    } else {
        i128::from(mantissa)
    };
    if exp >= 0 {
        if exp > 64 {
            return None;
        }
        Rational::from_i128(signed.checked_mul(1i128 << exp)?, 1)
    } else {
        let den_exp = exp.unsigned_abs();
        if den_exp > 62 {
            return None;
        }
        Rational::from_i128(signed, 1i128 << den_exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(primitive: Primitive, value: impl Into<Value>) -> Value {
        primitive.convert(value.into()).unwrap()
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(convert(Primitive::Integer, "42"), Value::Int(42));
        assert_eq!(convert(Primitive::Integer, "  -1_000abc"), Value::Int(-1000));
        assert_eq!(convert(Primitive::Integer, "abc"), Value::Int(0));
        assert_eq!(convert(Primitive::Integer, 3.99), Value::Int(3));
        assert_eq!(convert(Primitive::Integer, -3.99), Value::Int(-3));
        assert_eq!(
            convert(Primitive::Integer, "99999999999999999999"),
            Value::BigInt(99_999_999_999_999_999_999)
        );
        assert_eq!(
            convert(Primitive::Integer, Rational::new(7, 2).unwrap()),
            Value::Int(3)
        );
    }

    #[test]
    fn test_to_integer_failures() {
        assert!(matches!(
            Primitive::Integer.convert(Value::sym("five")),
            Err(ConversionError::NoConversion { method: "to_i", .. })
        ));
        assert!(matches!(
            Primitive::Integer.convert(Value::Float(f64::NAN)),
            Err(ConversionError::OutOfRange { .. })
        ));
        assert!(Primitive::Integer
            .convert(Value::Complex(Complex::new(1.0, 2.0)))
            .is_err());
        assert!(Primitive::Integer.convert(Value::array([1])).is_err());
    }

    #[test]
    fn test_float_to_integer_uses_full_i128_range() {
        assert_eq!(
            convert(Primitive::Integer, 1.7e38),
            Value::BigInt(1.7e38 as i128)
        );
        assert_eq!(
            convert(Primitive::Integer, -(2f64.powi(127))),
            Value::BigInt(i128::MIN)
        );
        assert!(matches!(
            Primitive::Integer.convert(Value::Float(2f64.powi(127))),
            Err(ConversionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_to_float() {
        assert_eq!(convert(Primitive::Float, "1.5kg"), Value::Float(1.5));
        assert_eq!(convert(Primitive::Float, ".5"), Value::Float(0.5));
        assert_eq!(convert(Primitive::Float, "2e3"), Value::Float(2000.0));
        assert_eq!(convert(Primitive::Float, "1e"), Value::Float(1.0));
        assert_eq!(convert(Primitive::Float, "nope"), Value::Float(0.0));
        assert_eq!(convert(Primitive::Float, 2), Value::Float(2.0));
        assert!(Primitive::Float.convert(Value::Bool(true)).is_err());
    }

    #[test]
    fn test_to_complex() {
        assert_eq!(
            convert(Primitive::Complex, "1+2i"),
            Value::Complex(Complex::new(1.0, 2.0))
        );
        assert_eq!(
            convert(Primitive::Complex, "3-i"),
            Value::Complex(Complex::new(3.0, -1.0))
        );
        assert_eq!(
            convert(Primitive::Complex, "2.5i"),
            Value::Complex(Complex::new(0.0, 2.5))
        );
        assert_eq!(
            convert(Primitive::Complex, "i"),
            Value::Complex(Complex::new(0.0, 1.0))
        );
        assert_eq!(convert(Primitive::Complex, 4), Value::Complex(Complex::new(4.0, 0.0)));
    }

    #[test]
    fn test_to_rational() {
        let r = |n, d| Value::Rational(Rational::new(n, d).unwrap());
        assert_eq!(convert(Primitive::Rational, "3/4"), r(3, 4));
        assert_eq!(convert(Primitive::Rational, "1.5"), r(3, 2));
        assert_eq!(convert(Primitive::Rational, "-0.25"), r(-1, 4));
        assert_eq!(convert(Primitive::Rational, "junk"), r(0, 1));
        assert_eq!(convert(Primitive::Rational, 0.5), r(1, 2));
        assert_eq!(
            convert(Primitive::Rational, 0.1),
            r(3_602_879_701_896_397, 36_028_797_018_963_968)
        );
        assert_eq!(convert(Primitive::Rational, 6), r(6, 1));
        assert!(Primitive::Rational.convert(Value::Float(1e-30)).is_err());
    }

    #[test]
    fn test_to_string_and_symbol() {
        assert_eq!(convert(Primitive::String, 5), Value::from("5"));
        assert_eq!(convert(Primitive::String, 2.0), Value::from("2.0"));
        assert_eq!(convert(Primitive::String, Value::sym("a")), Value::from("a"));
        assert_eq!(convert(Primitive::String, Value::array([1, 2])), Value::from("[1, 2]"));
        assert_eq!(convert(Primitive::Symbol, "name"), Value::sym("name"));
        assert!(matches!(
            Primitive::Symbol.convert(Value::Int(1)),
            Err(ConversionError::NoConversion { method: "to_sym", .. })
        ));
    }
}
