//! Ordering of atomic values for `array:sort`.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::collation::Collation;
use crate::error::XPath31Error;
use crate::types::AtomicValue;

/// Compares two atomic values the way `fn:sort` does: untyped values are
/// strings, `NaN` sorts before every other number and equals itself, and
/// strings use `collation`. Values of unrelated types are incomparable.
pub fn compare_atomic(
    a: &AtomicValue,
    b: &AtomicValue,
    collation: &dyn Collation,
) -> Result<Ordering, XPath31Error> {
    match (a, b) {
        (AtomicValue::Integer(x), AtomicValue::Integer(y)) => Ok(x.cmp(y)),
        (AtomicValue::Decimal(x), AtomicValue::Decimal(y)) => Ok(x.cmp(y)),
        (AtomicValue::Integer(x), AtomicValue::Decimal(y)) => Ok(Decimal::from(*x).cmp(y)),
        (AtomicValue::Decimal(x), AtomicValue::Integer(y)) => Ok(x.cmp(&Decimal::from(*y))),
        _ if a.is_numeric() && b.is_numeric() => {
            Ok(compare_doubles(a.to_double(), b.to_double()))
        }
        (AtomicValue::Boolean(x), AtomicValue::Boolean(y)) => Ok(x.cmp(y)),
        _ => match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) => Ok(collation.compare(x, y)),
            _ => Err(XPath31Error::type_error(
                "array:sort",
                1,
                format!("cannot compare {} with {}", a.type_name(), b.type_name()),
            )),
        },
    }
}

fn compare_doubles(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Lexicographic comparison of two atomized sort keys. A key that is a
/// proper prefix of the other sorts first.
pub fn compare_sort_keys(
    a: &[AtomicValue],
    b: &[AtomicValue],
    collation: &dyn Collation,
) -> Result<Ordering, XPath31Error> {
    for (x, y) in a.iter().zip(b) {
        let ord = compare_atomic(x, y, collation)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(a.len().cmp(&b.len()))
}
