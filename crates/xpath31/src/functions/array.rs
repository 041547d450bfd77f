//! The `array:` function namespace.
//!
//! Every function takes its arguments by value. `array:put` and
//! `array:reverse` mutate the array they were handed and return it; all other
//! functions build a fresh array.

use log::trace;

use super::args::{
    array_arg, expect_arity, function_arg, integer_arg, integers_arg, next,
    optional_string_arg, predicate_result,
};
use super::hof::invoke_function;
use crate::compare::compare_sort_keys;
use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::sort::try_merge_sort_by;
use crate::types::{AtomicValue, XdmArray, XdmItem, XdmValue, flatten_items};
use xylem_datasource::DataSourceNode;

pub fn array_size<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:size", args, 1, 1)?;
    let array = array_arg("array:size", 1, next(&mut args))?;
    Ok(XdmValue::from_integer(array.size() as i64))
}

pub fn array_get<N: Clone>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:get", args, 2, 2)?;
    let array = array_arg("array:get", 1, next(&mut args))?;
    let position = integer_arg("array:get", 2, next(&mut args))?;
    array.get(position).cloned()
}

/// Replaces a member in the argument's own storage.
pub fn array_put<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:put", args, 3, 3)?;
    let mut array = array_arg("array:put", 1, next(&mut args))?;
    let position = integer_arg("array:put", 2, next(&mut args))?;
    array.put_in_place(position, next(&mut args))?;
    Ok(XdmValue::from_array(array))
}

pub fn array_append<N: Clone>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:append", args, 2, 2)?;
    let array = array_arg("array:append", 1, next(&mut args))?;
    Ok(XdmValue::from_array(array.with_appended(next(&mut args))))
}

pub fn array_subarray<N: Clone>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:subarray", args, 2, 3)?;
    let array = array_arg("array:subarray", 1, next(&mut args))?;
    let start = integer_arg("array:subarray", 2, next(&mut args))?;
    let length = match args.next() {
        Some(length) => Some(integer_arg("array:subarray", 3, length)?),
        None => None,
    };
    Ok(XdmValue::from_array(array.subarray(start, length)?))
}

pub fn array_remove<N: Clone>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:remove", args, 2, 2)?;
    let array = array_arg("array:remove", 1, next(&mut args))?;
    let positions = integers_arg("array:remove", 2, next(&mut args))?;
    Ok(XdmValue::from_array(array.without_positions(&positions)?))
}

pub fn array_insert_before<N: Clone>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:insert-before", args, 3, 3)?;
    let array = array_arg("array:insert-before", 1, next(&mut args))?;
    let position = integer_arg("array:insert-before", 2, next(&mut args))?;
    Ok(XdmValue::from_array(
        array.with_inserted(position, next(&mut args))?,
    ))
}

pub fn array_head<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:head", args, 1, 1)?;
    let array = array_arg("array:head", 1, next(&mut args))?;
    array
        .into_members()
        .into_iter()
        .next()
        .ok_or(XPath31Error::ArrayIndexOutOfBounds { index: 1, size: 0 })
}

pub fn array_tail<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:tail", args, 1, 1)?;
    let array = array_arg("array:tail", 1, next(&mut args))?;
    if array.is_empty() {
        return Err(XPath31Error::ArrayIndexOutOfBounds { index: 1, size: 0 });
    }
    let members = array.into_members().into_iter().skip(1).collect();
    Ok(XdmValue::from_array(XdmArray::from_members(members)))
}

/// Reverses the argument's own storage.
pub fn array_reverse<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:reverse", args, 1, 1)?;
    let mut array = array_arg("array:reverse", 1, next(&mut args))?;
    array.reverse_in_place();
    Ok(XdmValue::from_array(array))
}

/// `array:join($arrays as array(*)*)`.
pub fn array_join<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:join", args, 1, 1)?;
    let arrays = next(&mut args)
        .into_iter()
        .map(|item| match item {
            XdmItem::Array(array) => Ok(array),
            other => Err(XPath31Error::type_error(
                "array:join",
                1,
                format!("expected array(*)*, found {}", other.type_name()),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(XdmValue::from_array(XdmArray::join(arrays)))
}

/// Expands arrays, however deeply nested, into a flat sequence.
pub fn array_flatten<N: Clone>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:flatten", args, 1, 1)?;
    let input = next(&mut args);
    let mut out = Vec::with_capacity(input.len());
    flatten_items(input.items(), &mut out);
    Ok(XdmValue::from_items(out))
}

pub fn array_for_each<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:for-each", args, 2, 2)?;
    let array = array_arg("array:for-each", 1, next(&mut args))?;
    let action = function_arg("array:for-each", 2, next(&mut args), 1)?;
    let members = array
        .into_members()
        .into_iter()
        .map(|member| invoke_function(&action, vec![member], ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(XdmValue::from_array(XdmArray::from_members(members)))
}

pub fn array_filter<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:filter", args, 2, 2)?;
    let array = array_arg("array:filter", 1, next(&mut args))?;
    let predicate = function_arg("array:filter", 2, next(&mut args), 1)?;
    let mut kept = Vec::new();
    for member in array.into_members() {
        let verdict = invoke_function(&predicate, vec![member.clone()], ctx)?;
        if predicate_result("array:filter", verdict)? {
            kept.push(member);
        }
    }
    Ok(XdmValue::from_array(XdmArray::from_members(kept)))
}

pub fn array_fold_left<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:fold-left", args, 3, 3)?;
    let array = array_arg("array:fold-left", 1, next(&mut args))?;
    let zero = next(&mut args);
    let action = function_arg("array:fold-left", 3, next(&mut args), 2)?;
    array
        .into_members()
        .into_iter()
        .try_fold(zero, |acc, member| invoke_function(&action, vec![acc, member], ctx))
}

pub fn array_fold_right<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:fold-right", args, 3, 3)?;
    let array = array_arg("array:fold-right", 1, next(&mut args))?;
    let zero = next(&mut args);
    let action = function_arg("array:fold-right", 3, next(&mut args), 2)?;
    array
        .into_members()
        .into_iter()
        .rev()
        .try_fold(zero, |acc, member| invoke_function(&action, vec![member, acc], ctx))
}

/// Pairs members up to the length of the shorter array.
pub fn array_for_each_pair<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:for-each-pair", args, 3, 3)?;
    let first = array_arg("array:for-each-pair", 1, next(&mut args))?;
    let second = array_arg("array:for-each-pair", 2, next(&mut args))?;
    let action = function_arg("array:for-each-pair", 3, next(&mut args), 2)?;
    let members = first
        .into_members()
        .into_iter()
        .zip(second.into_members())
        .map(|(a, b)| invoke_function(&action, vec![a, b], ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(XdmValue::from_array(XdmArray::from_members(members)))
}

/// `array:sort($array, $collation?, $key?)`. Members are ordered by their
/// atomized key; equal keys keep their input order.
pub fn array_sort<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("array:sort", args, 1, 3)?;
    let array = array_arg("array:sort", 1, next(&mut args))?;
    let collation_uri = optional_string_arg("array:sort", 2, next(&mut args))?;
    let collation = ctx.collation(collation_uri.as_deref())?;
    let key_fn = match args.next() {
        Some(f) => Some(function_arg("array:sort", 3, f, 1)?),
        None => None,
    };

    let members = array.into_members();
    let keys: Vec<Vec<AtomicValue>> = members
        .iter()
        .map(|member| match &key_fn {
            Some(f) => invoke_function(f, vec![member.clone()], ctx).map(|k| k.atomize()),
            None => Ok(member.atomize()),
        })
        .collect::<Result<_, _>>()?;
    trace!(
        "array:sort over {} members with collation {}",
        members.len(),
        collation.uri()
    );

    let mut order: Vec<usize> = (0..members.len()).collect();
    try_merge_sort_by(&mut order, |&a, &b| {
        compare_sort_keys(&keys[a], &keys[b], collation.as_ref())
    })?;

    let mut slots: Vec<Option<XdmValue<N>>> = members.into_iter().map(Some).collect();
    let sorted = order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect();
    Ok(XdmValue::from_array(XdmArray::from_members(sorted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::UCA_URI;
    use crate::types::XdmFunction;
    use xylem_datasource::mock::MockNode;

    type Node = MockNode<'static>;
    type V = XdmValue<Node>;

    fn strings(values: &[&str]) -> V {
        V::from_array(XdmArray::from_items(
            values.iter().map(|s| XdmItem::Atomic((*s).into())),
        ))
    }

    fn ints(values: &[i64]) -> V {
        V::from_array(XdmArray::from_items(
            values.iter().map(|&i| XdmItem::Atomic(i.into())),
        ))
    }

    fn ctx() -> EvaluationContext<'static, Node> {
        EvaluationContext::new()
    }

    #[test]
    fn test_insert_before_middle_and_end() {
        let result = array_insert_before(vec![
            strings(&["a", "b", "c"]),
            V::from_integer(2),
            V::from_string("X"),
        ])
        .unwrap();
        assert_eq!(result, strings(&["a", "X", "b", "c"]));

        let appended =
            array_insert_before(vec![strings(&["a"]), V::from_integer(2), V::from_string("z")])
                .unwrap();
        assert_eq!(appended, strings(&["a", "z"]));

        let err =
            array_insert_before(vec![strings(&["a"]), V::from_integer(3), V::from_string("z")])
                .unwrap_err();
        assert!(matches!(err, XPath31Error::ArrayIndexOutOfBounds { index: 3, size: 1 }));
    }

    #[test]
    fn test_remove_listed_positions() {
        let result = array_remove(vec![
            strings(&["a", "b", "c", "d"]),
            V::from_atomics(vec![AtomicValue::from(2i64), AtomicValue::from(4i64)]),
        ])
        .unwrap();
        assert_eq!(result, strings(&["a", "c"]));
    }

    #[test]
    fn test_remove_rejects_non_integers() {
        let err = array_remove(vec![strings(&["a"]), V::from_string("one")]).unwrap_err();
        assert!(matches!(err, XPath31Error::InvalidCast { .. }));
    }

    #[test]
    fn test_subarray_bounds() {
        let letters = strings(&["a", "b", "c", "d", "e"]);
        let result =
            array_subarray(vec![letters.clone(), V::from_integer(2), V::from_integer(3)]).unwrap();
        assert_eq!(result, strings(&["b", "c", "d"]));

        let tail = array_subarray(vec![letters, V::from_integer(4)]).unwrap();
        assert_eq!(tail, strings(&["d", "e"]));

        let err = array_subarray(vec![strings(&["a"]), V::from_integer(1), V::from_integer(5)])
            .unwrap_err();
        assert!(matches!(err, XPath31Error::ArrayIndexOutOfBounds { .. }));

        let err = array_subarray(vec![strings(&["a"]), V::from_integer(1), V::from_integer(-1)])
            .unwrap_err();
        assert!(matches!(err, XPath31Error::NegativeLength { length: -1, .. }));
    }

    #[test]
    fn test_put_and_get_reject_position_zero() {
        assert!(array_put(vec![strings(&["a"]), V::from_integer(0), V::from_string("x")]).is_err());
        assert!(array_get(vec![strings(&["a"]), V::from_integer(2)]).is_err());
        let put = array_put(vec![
            strings(&["a", "b"]),
            V::from_integer(2),
            V::from_string("x"),
        ])
        .unwrap();
        assert_eq!(put, strings(&["a", "x"]));
    }

    #[test]
    fn test_head_and_tail() {
        assert_eq!(array_head(vec![strings(&["a", "b"])]).unwrap(), V::from_string("a"));
        assert_eq!(array_tail(vec![strings(&["a", "b"])]).unwrap(), strings(&["b"]));
        assert!(array_head(vec![strings(&[])]).is_err());
        assert!(array_tail(vec![strings(&[])]).is_err());
    }

    #[test]
    fn test_reverse_and_append() {
        assert_eq!(array_reverse(vec![ints(&[1, 2, 3])]).unwrap(), ints(&[3, 2, 1]));
        assert_eq!(array_append(vec![ints(&[1]), V::from_integer(2)]).unwrap(), ints(&[1, 2]));
    }

    #[test]
    fn test_append_sequence_becomes_one_member() {
        let appended = array_append(vec![
            ints(&[1]),
            V::from_atomics(vec![AtomicValue::from(2i64), AtomicValue::from(3i64)]),
        ])
        .unwrap();
        assert_eq!(array_size(vec![appended]).unwrap(), V::from_integer(2));
    }

    #[test]
    fn test_join_concatenates_and_rejects_non_arrays() {
        let seq = ints(&[1]).concat(ints(&[2, 3]));
        assert_eq!(array_join(vec![seq]).unwrap(), ints(&[1, 2, 3]));
        assert_eq!(array_join(vec![V::empty()]).unwrap(), ints(&[]));
        let err = array_join(vec![ints(&[1]).concat(V::from_integer(2))]).unwrap_err();
        assert!(matches!(err, XPath31Error::ArgumentType { .. }));
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let nested = V::from_array(XdmArray::from_members(vec![
            V::from_integer(1),
            ints(&[2, 3]),
            V::from_array(XdmArray::from_members(vec![ints(&[4]), V::from_integer(5)])),
        ]))
        .concat(V::from_integer(6));
        let once = array_flatten(vec![nested]).unwrap();
        let expected: V = (1..=6i64).map(|i| XdmItem::Atomic(i.into())).collect();
        assert_eq!(once, expected);
        assert_eq!(array_flatten(vec![once.clone()]).unwrap(), once);
    }

    fn negate() -> XdmFunction<Node> {
        XdmFunction::native(1, |args: Vec<V>| {
            let n = args[0].atomize()[0].cast_to_integer()?;
            Ok(V::from_integer(-n))
        })
    }

    fn minus() -> XdmFunction<Node> {
        XdmFunction::native(2, |args: Vec<V>| {
            let a = args[0].atomize()[0].cast_to_integer()?;
            let b = args[1].atomize()[0].cast_to_integer()?;
            Ok(V::from_integer(a - b))
        })
    }

    #[test]
    fn test_for_each_and_for_each_pair() {
        let ctx = ctx();
        let mapped =
            array_for_each(vec![ints(&[1, 2]), V::from_function(negate())], &ctx).unwrap();
        assert_eq!(mapped, ints(&[-1, -2]));

        let paired = array_for_each_pair(
            vec![ints(&[10, 20, 30]), ints(&[1, 2]), V::from_function(minus())],
            &ctx,
        )
        .unwrap();
        assert_eq!(paired, ints(&[9, 18]));
    }

    #[test]
    fn test_folds_respect_direction() {
        let ctx = ctx();
        let left = array_fold_left(
            vec![ints(&[1, 2, 3]), V::from_integer(0), V::from_function(minus())],
            &ctx,
        )
        .unwrap();
        // ((0 - 1) - 2) - 3
        assert_eq!(left, V::from_integer(-6));

        let right = array_fold_right(
            vec![ints(&[1, 2, 3]), V::from_integer(0), V::from_function(minus())],
            &ctx,
        )
        .unwrap();
        // 1 - (2 - (3 - 0))
        assert_eq!(right, V::from_integer(2));
    }

    #[test]
    fn test_fold_rejects_wrong_arity() {
        let err = array_fold_left(
            vec![ints(&[1]), V::from_integer(0), V::from_function(negate())],
            &ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, XPath31Error::ArgumentType { position: 3, .. }));
    }

    #[test]
    fn test_filter_keeps_matching_members() {
        let even = XdmFunction::native(1, |args: Vec<V>| {
            let n = args[0].atomize()[0].cast_to_integer()?;
            Ok(V::from_bool(n % 2 == 0))
        });
        let result =
            array_filter(vec![ints(&[1, 2, 3, 4]), V::from_function(even)], &ctx()).unwrap();
        assert_eq!(result, ints(&[2, 4]));
    }

    #[test]
    fn test_sort_numbers_with_nan_first() {
        let values = V::from_array(XdmArray::from_items(
            [3.0, f64::NAN, 1.0, 2.0].map(|d| XdmItem::Atomic(d.into())),
        ));
        let sorted = array_sort(vec![values], &ctx()).unwrap();
        let arr = sorted.first().and_then(XdmItem::as_array).unwrap();
        let doubles: Vec<f64> = arr.iter().map(|m| m.atomize()[0].to_double()).collect();
        assert!(doubles[0].is_nan());
        assert_eq!(&doubles[1..], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sort_with_collation_is_stable() {
        let words = strings(&["b", "A", "a", "B"]);
        let uca = V::from_string(format!("{UCA_URI}?strength=primary"));
        let sorted = array_sort(vec![words, uca], &ctx()).unwrap();
        assert_eq!(sorted, strings(&["A", "a", "b", "B"]));
    }

    #[test]
    fn test_sort_with_key_function() {
        let sorted = array_sort(
            vec![ints(&[1, 3, 2]), V::empty(), V::from_function(negate())],
            &ctx(),
        )
        .unwrap();
        assert_eq!(sorted, ints(&[3, 2, 1]));
    }

    #[test]
    fn test_sort_of_incomparable_members_fails() {
        let mixed = V::from_array(XdmArray::from_items(vec![
            XdmItem::Atomic(1i64.into()),
            XdmItem::Atomic("x".into()),
        ]));
        let err = array_sort(vec![mixed], &ctx()).unwrap_err();
        assert!(matches!(err, XPath31Error::ArgumentType { .. }));
    }

    #[test]
    fn test_sort_with_unknown_collation_fails() {
        let err = array_sort(vec![ints(&[1]), V::from_string("urn:nope")], &ctx()).unwrap_err();
        assert!(matches!(err, XPath31Error::Collation(_)));
    }
}
