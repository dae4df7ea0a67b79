//! Runtime value representation for the GML VM.
//!
//! A [`Value`] is a dynamically-typed scalar. Every conversion is total:
//! no coercion ever fails, it falls back to a defined sentinel instead.

use std::borrow::Cow;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Rem, Shl, Shr, Sub};

use crate::kind::ValueKind;

/// Runtime value representation.
///
/// Values live on the operand stack, in instruction operands and in the
/// global and local variable tables.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Undefined,
    /// Double-precision real. All arithmetic produces this kind.
    Number(f64),
    /// Owned UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

// Structural equality, with bitwise comparison for numbers so that Value is
// usable as a plain data type in tests and tables. The language-level
// comparisons are `equals`, `less_than` and friends below.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Number `1` for true, `0` for false.
    ///
    /// Comparison and logical instructions produce numbers, not booleans.
    pub fn from_truth(truth: bool) -> Value {
        Value::Number(if truth { 1.0 } else { 0.0 })
    }

    /// Returns the kind tag for this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Numeric view of the value.
    ///
    /// Strings are parsed as a leading decimal literal; anything that does
    /// not parse yields `0`.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Undefined => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => parse_number_prefix(s).unwrap_or(0.0),
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// String view of the value.
    pub fn as_string(&self) -> Cow<'_, str> {
        match self {
            Value::Undefined => Cow::Borrowed("undefined"),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::String(s) => Cow::Borrowed(s),
            Value::Boolean(true) => Cow::Borrowed("true"),
            Value::Boolean(false) => Cow::Borrowed("false"),
        }
    }

    /// Truthiness: non-zero numbers, non-empty strings and `true`.
    pub fn as_boolean(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
        }
    }

    /// Converts to the given kind, producing a new value.
    pub fn convert(&self, kind: ValueKind) -> Value {
        match kind {
            ValueKind::Undefined => Value::Undefined,
            ValueKind::Number => Value::Number(self.as_number()),
            ValueKind::String => Value::String(self.as_string().into_owned()),
            ValueKind::Boolean => Value::Boolean(self.as_boolean()),
        }
    }

    // ---- Comparison ----

    /// Two strings compare as strings, everything else numerically.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.as_number() == other.as_number(),
        }
    }

    pub fn not_equals(&self, other: &Value) -> bool {
        !self.equals(other)
    }

    /// Byte-wise ordering for two strings, numeric ordering otherwise.
    pub fn less_than(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a < b,
            _ => self.as_number() < other.as_number(),
        }
    }

    pub fn less_equal(&self, other: &Value) -> bool {
        self.less_than(other) || self.equals(other)
    }

    pub fn greater_than(&self, other: &Value) -> bool {
        !self.less_equal(other)
    }

    pub fn greater_equal(&self, other: &Value) -> bool {
        !self.less_than(other)
    }

    // ---- Unary ----

    /// Bitwise complement of the value truncated to a 64-bit integer.
    pub fn complement(&self) -> Value {
        Value::Number(!truncate(self.as_number()) as f64)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Truncates toward zero into the 64-bit integer domain of the bitwise
/// operators. Out-of-range values saturate and NaN becomes zero.
fn truncate(n: f64) -> i64 {
    n as i64
}

macro_rules! numeric_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait for &Value {
            type Output = Value;

            fn $method(self, rhs: Self) -> Value {
                let $a = self.as_number();
                let $b = rhs.as_number();
                Value::Number($body)
            }
        }

        impl $trait for Value {
            type Output = Value;

            fn $method(self, rhs: Value) -> Value {
                (&self).$method(&rhs)
            }
        }
    };
}

macro_rules! integer_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait for &Value {
            type Output = Value;

            fn $method(self, rhs: Self) -> Value {
                let $a = truncate(self.as_number());
                let $b = truncate(rhs.as_number());
                Value::Number($body as f64)
            }
        }

        impl $trait for Value {
            type Output = Value;

            fn $method(self, rhs: Value) -> Value {
                (&self).$method(&rhs)
            }
        }
    };
}

numeric_op!(Add, add, |a, b| a + b);
numeric_op!(Sub, sub, |a, b| a - b);
numeric_op!(Mul, mul, |a, b| a * b);
// Division by zero yields 0, never infinity.
numeric_op!(Div, div, |a, b| if b == 0.0 { 0.0 } else { a / b });
// Floating remainder (fmod); a zero divisor gives NaN.
numeric_op!(Rem, rem, |a, b| a % b);

integer_op!(BitAnd, bitand, |a, b| a & b);
integer_op!(BitOr, bitor, |a, b| a | b);
integer_op!(BitXor, bitxor, |a, b| a ^ b);
// Shift counts wrap modulo 64.
integer_op!(Shl, shl, |a, b| a.wrapping_shl(b as u32));
integer_op!(Shr, shr, |a, b| a.wrapping_shr(b as u32));

impl Neg for &Value {
    type Output = Value;

    fn neg(self) -> Value {
        Value::Number(-self.as_number())
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        -&self
    }
}

/// Renders a number the way the scripting language prints it.
///
/// Integral values print without a decimal point. Everything else is
/// printed with six fractional digits, then trailing zeros and a dangling
/// decimal point are stripped.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == n.floor() {
        if n.abs() < 9.223_372_036_854_775_807e18 {
            return (n as i64).to_string();
        }
        return format!("{n:.0}");
    }

    let mut text = format!("{n:.6}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    text
}

/// Parses the longest leading numeric literal of `text`, in the manner of
/// C's `strtod`: leading whitespace is skipped, trailing garbage ignored.
///
/// Returns `None` when no literal is present or the literal is out of the
/// finite double range.
pub fn parse_number_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    let bytes = text.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let signed = |n: f64| if negative { -n } else { n };
    let rest = &text[pos..];

    let lower = rest.get(..8).unwrap_or(rest).to_ascii_lowercase();
    if lower.starts_with("inf") {
        return Some(signed(f64::INFINITY));
    }
    if lower.starts_with("nan") {
        return Some(f64::NAN);
    }

    if (rest.starts_with("0x") || rest.starts_with("0X"))
        && rest.as_bytes().get(2).is_some_and(|b| b.is_ascii_hexdigit())
    {
        let digits: String = rest[2..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        let value = digits
            .chars()
            .filter_map(|c| c.to_digit(16))
            .fold(0.0f64, |acc, d| acc * 16.0 + d as f64);
        return value.is_finite().then(|| signed(value));
    }

    let start = pos;
    let mut mantissa_digits = 0;
    let mut nonzero_digit = false;
    while let Some(b) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
        nonzero_digit |= *b != b'0';
        mantissa_digits += 1;
        pos += 1;
    }
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        while let Some(b) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
            nonzero_digit |= *b != b'0';
            mantissa_digits += 1;
            pos += 1;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
        let mut exp_end = pos + 1;
        if matches!(bytes.get(exp_end), Some(b'-') | Some(b'+')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(|b| b.is_ascii_digit()) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            pos = exp_end;
        }
    }

    let literal = &text[start..pos];
    let value: f64 = literal.parse().ok()?;
    if value.is_infinite() || value.is_subnormal() || (value == 0.0 && nonzero_digit) {
        return None;
    }
    Some(signed(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn string(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn kinds() {
        assert_eq!(Value::Undefined.kind(), ValueKind::Undefined);
        assert_eq!(num(1.0).kind(), ValueKind::Number);
        assert_eq!(string("a").kind(), ValueKind::String);
        assert_eq!(Value::Boolean(true).kind(), ValueKind::Boolean);
    }

    #[test]
    fn default_is_undefined() {
        assert!(Value::default().is_undefined());
    }

    // --- as_number ---

    #[test]
    fn number_from_each_kind() {
        assert_eq!(Value::Undefined.as_number(), 0.0);
        assert_eq!(num(2.5).as_number(), 2.5);
        assert_eq!(Value::Boolean(true).as_number(), 1.0);
        assert_eq!(Value::Boolean(false).as_number(), 0.0);
        assert_eq!(string("42").as_number(), 42.0);
    }

    #[test]
    fn number_from_string_prefix() {
        assert_eq!(string("  12.5abc").as_number(), 12.5);
        assert_eq!(string("-3e2x").as_number(), -300.0);
        assert_eq!(string("7e").as_number(), 7.0);
        assert_eq!(string(".5").as_number(), 0.5);
        assert_eq!(string("0x1A").as_number(), 26.0);
    }

    #[test]
    fn number_from_unparseable_string_is_zero() {
        assert_eq!(string("").as_number(), 0.0);
        assert_eq!(string("hello").as_number(), 0.0);
        assert_eq!(string("-").as_number(), 0.0);
        assert_eq!(string(".").as_number(), 0.0);
    }

    #[test]
    fn number_from_out_of_range_string_is_zero() {
        assert_eq!(string("1e999").as_number(), 0.0);
        assert_eq!(string("1e-999").as_number(), 0.0);
    }

    #[test]
    fn number_from_special_literals() {
        assert_eq!(string("inf").as_number(), f64::INFINITY);
        assert_eq!(string("-Infinity").as_number(), f64::NEG_INFINITY);
        assert!(string("nan").as_number().is_nan());
    }

    // --- as_string ---

    #[test]
    fn string_from_integral_number() {
        assert_eq!(num(8.0).as_string(), "8");
        assert_eq!(num(-42.0).as_string(), "-42");
        assert_eq!(num(0.0).as_string(), "0");
        assert_eq!(num(-0.0).as_string(), "0");
    }

    #[test]
    fn string_from_fractional_number() {
        assert_eq!(num(2.5).as_string(), "2.5");
        assert_eq!(num(0.1).as_string(), "0.1");
        assert_eq!(num(1.0 / 3.0).as_string(), "0.333333");
        assert_eq!(num(-0.25).as_string(), "-0.25");
    }

    #[test]
    fn string_from_tiny_fraction_rounds_away() {
        assert_eq!(num(1e-9).as_string(), "0");
        assert_eq!(num(-1e-9).as_string(), "-0");
    }

    #[test]
    fn string_from_huge_integral_number() {
        assert_eq!(num(1e20).as_string(), "100000000000000000000");
    }

    #[test]
    fn string_from_other_kinds() {
        assert_eq!(Value::Undefined.as_string(), "undefined");
        assert_eq!(Value::Boolean(true).as_string(), "true");
        assert_eq!(Value::Boolean(false).as_string(), "false");
        assert_eq!(string("abc").as_string(), "abc");
    }

    #[test]
    fn display_matches_as_string() {
        assert_eq!(num(3.5).to_string(), "3.5");
        assert_eq!(Value::Undefined.to_string(), "undefined");
    }

    // --- as_boolean ---

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.as_boolean());
        assert!(!num(0.0).as_boolean());
        assert!(num(-1.0).as_boolean());
        assert!(!string("").as_boolean());
        assert!(string("0").as_boolean());
        assert!(Value::Boolean(true).as_boolean());
    }

    // --- Arithmetic ---

    #[test]
    fn arithmetic_coerces_operands() {
        assert_eq!(&num(5.0) + &num(3.0), num(8.0));
        assert_eq!(&string("10") - &Value::Boolean(true), num(9.0));
        assert_eq!(&num(4.0) * &Value::Undefined, num(0.0));
        assert_eq!(&string("a") + &string("b"), num(0.0));
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(&num(10.0) / &num(0.0), num(0.0));
        assert_eq!(&num(10.0) / &string("zero"), num(0.0));
        assert_eq!(&num(9.0) / &num(2.0), num(4.5));
    }

    #[test]
    fn remainder_is_fmod() {
        assert_eq!(&num(7.5) % &num(2.0), num(1.5));
        assert_eq!(&num(-7.0) % &num(3.0), num(-1.0));
        assert!((&num(1.0) % &num(0.0)).as_number().is_nan());
    }

    #[test]
    fn negation() {
        assert_eq!(-&num(3.0), num(-3.0));
        assert_eq!(-&string("2"), num(-2.0));
    }

    // --- Bitwise ---

    #[test]
    fn bitwise_truncates_to_integers() {
        assert_eq!(&num(6.9) & &num(3.0), num(2.0));
        assert_eq!(&num(4.0) | &num(1.5), num(5.0));
        assert_eq!(&num(5.0) ^ &num(1.0), num(4.0));
        assert_eq!(num(0.0).complement(), num(-1.0));
    }

    #[test]
    fn shifts() {
        assert_eq!(&num(1.0) << &num(4.0), num(16.0));
        assert_eq!(&num(-16.0) >> &num(2.0), num(-4.0));
        assert_eq!(&num(1.0) << &num(64.0), num(1.0));
    }

    // --- Comparison ---

    #[test]
    fn string_pairs_compare_as_strings() {
        assert!(string("abc").equals(&string("abc")));
        assert!(string("abc").less_than(&string("abd")));
        assert!(string("10").less_than(&string("9")));
    }

    #[test]
    fn mixed_pairs_compare_numerically() {
        assert!(string("10").equals(&num(10.0)));
        assert!(Value::Boolean(true).equals(&num(1.0)));
        assert!(Value::Undefined.equals(&num(0.0)));
        assert!(num(2.0).less_than(&string("10")));
    }

    #[test]
    fn derived_relations() {
        let (a, b) = (num(1.0), num(2.0));
        assert!(a.not_equals(&b));
        assert!(a.less_equal(&b));
        assert!(a.less_equal(&a));
        assert!(b.greater_than(&a));
        assert!(b.greater_equal(&b));
        assert!(!a.greater_equal(&b));
    }

    #[test]
    fn nan_relations_follow_derivation() {
        let nan = num(f64::NAN);
        assert!(!nan.equals(&nan));
        assert!(!nan.less_than(&num(1.0)));
        assert!(nan.greater_than(&num(1.0)));
        assert!(nan.greater_equal(&num(1.0)));
    }

    // --- Logical ---

    #[test]
    fn from_truth_yields_number() {
        assert_eq!(Value::from_truth(true), num(1.0));
        assert_eq!(Value::from_truth(false), num(0.0));
    }

    // --- Conversion ---

    #[test]
    fn convert_does_not_mutate_source() {
        let source = string("12");
        assert_eq!(source.convert(ValueKind::Number), num(12.0));
        assert_eq!(source.convert(ValueKind::Boolean), Value::Boolean(true));
        assert_eq!(source, string("12"));
        assert_eq!(num(1.5).convert(ValueKind::String), string("1.5"));
        assert_eq!(num(1.5).convert(ValueKind::Undefined), Value::Undefined);
    }

    // --- Structural equality ---

    #[test]
    fn structural_equality_distinguishes_kinds() {
        assert_ne!(num(1.0), Value::Boolean(true));
        assert_ne!(num(0.0), Value::Undefined);
        assert_eq!(num(f64::NAN), num(f64::NAN));
    }
}
