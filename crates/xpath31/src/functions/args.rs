//! Argument extraction shared by the library functions. Positions in error
//! messages are 1-based like the function signatures.

use crate::error::XPath31Error;
use crate::types::{AtomicValue, XdmArray, XdmFunction, XdmItem, XdmMap, XdmValue};

pub(crate) type Args<N> = std::vec::IntoIter<XdmValue<N>>;

/// Checks the argument count and hands back an iterator over the arguments.
pub(crate) fn expect_arity<N>(
    function: &str,
    args: Vec<XdmValue<N>>,
    min: usize,
    max: usize,
) -> Result<Args<N>, XPath31Error> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        return Err(XPath31Error::arity(function, expected, args.len()));
    }
    Ok(args.into_iter())
}

/// The next argument; missing optional arguments read as the empty sequence.
pub(crate) fn next<N>(args: &mut Args<N>) -> XdmValue<N> {
    args.next().unwrap_or_default()
}

fn single<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<XdmItem<N>, XPath31Error> {
    value.into_single().map_err(|value| {
        XPath31Error::cardinality_error(
            format!("{function} argument {position}"),
            "exactly one item",
            value.len(),
        )
    })
}

pub(crate) fn array_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<XdmArray<N>, XPath31Error> {
    match single(function, position, value)? {
        XdmItem::Array(array) => Ok(array),
        other => Err(XPath31Error::type_error(
            function,
            position,
            format!("expected array(*), got {}", other.type_name()),
        )),
    }
}

pub(crate) fn map_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<XdmMap<N>, XPath31Error> {
    match single(function, position, value)? {
        XdmItem::Map(map) => Ok(map),
        other => Err(XPath31Error::type_error(
            function,
            position,
            format!("expected map(*), got {}", other.type_name()),
        )),
    }
}

/// An optional options map: the empty sequence means "no options".
pub(crate) fn options_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<Option<XdmMap<N>>, XPath31Error> {
    if value.is_empty() {
        return Ok(None);
    }
    map_arg(function, position, value).map(Some)
}

/// A function item of exactly `arity` parameters.
pub(crate) fn function_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
    arity: usize,
) -> Result<XdmFunction<N>, XPath31Error> {
    match single(function, position, value)? {
        XdmItem::Function(f) if f.arity() == arity => Ok(f),
        XdmItem::Function(f) => Err(XPath31Error::type_error(
            function,
            position,
            format!("expected a function of arity {arity}, got {f:?}"),
        )),
        other => Err(XPath31Error::type_error(
            function,
            position,
            format!("expected function(*), got {}", other.type_name()),
        )),
    }
}

pub(crate) fn atomic_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<AtomicValue, XPath31Error> {
    match single(function, position, value)? {
        XdmItem::Atomic(a) => Ok(a),
        other => Err(XPath31Error::type_error(
            function,
            position,
            format!("expected an atomic value, got {}", other.type_name()),
        )),
    }
}

pub(crate) fn integer_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<i64, XPath31Error> {
    atomic_arg(function, position, value)?.cast_to_integer()
}

/// Every item of `value` cast to `xs:integer`.
pub(crate) fn integers_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<Vec<i64>, XPath31Error> {
    value
        .into_iter()
        .map(|item| match item {
            XdmItem::Atomic(a) => a.cast_to_integer(),
            other => Err(XPath31Error::type_error(
                function,
                position,
                format!("expected xs:integer*, got {}", other.type_name()),
            )),
        })
        .collect()
}

/// An optional string; the empty sequence reads as `None`.
pub(crate) fn optional_string_arg<N>(
    function: &str,
    position: usize,
    value: XdmValue<N>,
) -> Result<Option<String>, XPath31Error> {
    if value.is_empty() {
        return Ok(None);
    }
    match atomic_arg(function, position, value)? {
        AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => Ok(Some(s)),
        other => Err(XPath31Error::type_error(
            function,
            position,
            format!("expected xs:string, got {}", other.type_name()),
        )),
    }
}

/// Short rendering of an argument for diagnostics.
pub(crate) fn describe<N>(value: &XdmValue<N>) -> String {
    match value.single() {
        Some(XdmItem::Atomic(a)) => a.to_string_value(),
        Some(item) => item.type_name().to_string(),
        None => format!("a sequence of {} items", value.len()),
    }
}

/// A single `xs:boolean` returned by a predicate function item.
pub(crate) fn predicate_result<N>(
    function: &str,
    value: XdmValue<N>,
) -> Result<bool, XPath31Error> {
    match value.into_single() {
        Ok(XdmItem::Atomic(AtomicValue::Boolean(b))) => Ok(b),
        Ok(other) => Err(XPath31Error::type_error(
            function,
            2,
            format!("predicate must return xs:boolean, got {}", other.type_name()),
        )),
        Err(value) => Err(XPath31Error::type_error(
            function,
            2,
            format!("predicate must return exactly one xs:boolean, got {} items", value.len()),
        )),
    }
}
