use crate::error::XPath31Error;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub enum AtomicValue {
    String(String),
    UntypedAtomic(String),
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
}

impl AtomicValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicValue::String(_) => "xs:string",
            AtomicValue::UntypedAtomic(_) => "xs:untypedAtomic",
            AtomicValue::Boolean(_) => "xs:boolean",
            AtomicValue::Integer(_) => "xs:integer",
            AtomicValue::Decimal(_) => "xs:decimal",
            AtomicValue::Double(_) => "xs:double",
        }
    }

    pub fn to_string_value(&self) -> String {
        match self {
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => s.clone(),
            AtomicValue::Boolean(b) => b.to_string(),
            AtomicValue::Integer(i) => i.to_string(),
            AtomicValue::Decimal(d) => d.normalize().to_string(),
            AtomicValue::Double(d) => format_double(*d),
        }
    }

    /// The text of a string or untyped value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AtomicValue::Integer(_) | AtomicValue::Decimal(_) | AtomicValue::Double(_)
        )
    }

    /// `fn:number` semantics: anything that is not a valid number becomes NaN.
    pub fn to_double(&self) -> f64 {
        match self {
            AtomicValue::Double(d) => *d,
            AtomicValue::Integer(i) => *i as f64,
            AtomicValue::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            AtomicValue::Boolean(b) => f64::from(u8::from(*b)),
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => {
                parse_xs_double(s).unwrap_or(f64::NAN)
            }
        }
    }

    /// Casts to `xs:integer`. Numbers must be integral; strings must be
    /// integer literals.
    pub fn cast_to_integer(&self) -> Result<i64, XPath31Error> {
        let fail = || XPath31Error::InvalidCast {
            value: self.to_string_value(),
            from_type: self.type_name().to_string(),
            to_type: "xs:integer".to_string(),
        };
        match self {
            AtomicValue::Integer(i) => Ok(*i),
            AtomicValue::Decimal(d) if d.fract().is_zero() => d.to_i64().ok_or_else(fail),
            AtomicValue::Double(d)
                if d.is_finite() && d.fract() == 0.0 && d.abs() < i64::MAX as f64 =>
            {
                Ok(*d as i64)
            }
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => {
                s.trim().parse::<i64>().map_err(|_| fail())
            }
            _ => Err(fail()),
        }
    }

    fn numeric_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AtomicValue::Integer(a), AtomicValue::Integer(b)) => a == b,
            (AtomicValue::Decimal(a), AtomicValue::Decimal(b)) => a == b,
            (AtomicValue::Integer(a), AtomicValue::Decimal(b))
            | (AtomicValue::Decimal(b), AtomicValue::Integer(a)) => Decimal::from(*a) == *b,
            _ => {
                let (a, b) = (self.to_double(), other.to_double());
                a == b || (a.is_nan() && b.is_nan())
            }
        }
    }
}

/// Lexical `xs:double` parsing: decimal and exponent forms plus `INF`,
/// `-INF` and `NaN`. Surrounding whitespace is ignored.
pub fn parse_xs_double(text: &str) -> Option<f64> {
    let t = text.trim();
    match t {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ if t.is_empty() => None,
        _ if !t
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')) =>
        {
            None
        }
        _ => t.parse().ok(),
    }
}

/// Canonical `xs:double` lexical form.
fn format_double(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if d == 0.0 {
        return if d.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if (1e-6..1e6).contains(&d.abs()) {
        return d.to_string();
    }
    let sci = format!("{d:E}");
    match sci.split_once('E') {
        Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0E{exp}"),
        _ => sci,
    }
}

/// Same-key equality: numbers compare by value across types, NaN equals NaN,
/// strings and untyped values compare by text.
impl PartialEq for AtomicValue {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_str(), other.as_str()) {
            (Some(a), Some(b)) => return a == b,
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
        match (self, other) {
            (AtomicValue::Boolean(a), AtomicValue::Boolean(b)) => a == b,
            _ if self.is_numeric() && other.is_numeric() => self.numeric_eq(other),
            _ => false,
        }
    }
}

impl Eq for AtomicValue {}

impl Hash for AtomicValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            AtomicValue::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            _ => {
                2u8.hash(state);
                let d = self.to_double();
                let bits = if d.is_nan() {
                    u64::MAX
                } else if d == 0.0 {
                    0
                } else {
                    d.to_bits()
                };
                bits.hash(state);
            }
        }
    }
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_value())
    }
}

impl From<String> for AtomicValue {
    fn from(s: String) -> Self {
        AtomicValue::String(s)
    }
}

impl From<&str> for AtomicValue {
    fn from(s: &str) -> Self {
        AtomicValue::String(s.to_string())
    }
}

impl From<bool> for AtomicValue {
    fn from(b: bool) -> Self {
        AtomicValue::Boolean(b)
    }
}

impl From<i64> for AtomicValue {
    fn from(i: i64) -> Self {
        AtomicValue::Integer(i)
    }
}

impl From<f64> for AtomicValue {
    fn from(d: f64) -> Self {
        AtomicValue::Double(d)
    }
}

impl From<Decimal> for AtomicValue {
    fn from(d: Decimal) -> Self {
        AtomicValue::Decimal(d)
    }
}
