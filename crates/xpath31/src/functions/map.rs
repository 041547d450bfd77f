//! The `map:` function namespace.

use super::args::{
    atomic_arg, describe, expect_arity, function_arg, map_arg, next, options_arg,
};
use super::hof::invoke_function;
use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::types::{AtomicValue, XdmArray, XdmItem, XdmMap, XdmValue};
use xylem_datasource::DataSourceNode;

/// How `map:merge` treats a key present in more than one input map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeDuplicates {
    Reject,
    #[default]
    UseFirst,
    UseLast,
    UseAny,
    Combine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    pub duplicates: MergeDuplicates,
}

impl MergeOptions {
    pub fn from_map<N>(options: Option<&XdmMap<N>>) -> Result<Self, XPath31Error> {
        let mut parsed = Self::default();
        let Some(value) = options.and_then(|o| o.get_str("duplicates")) else {
            return Ok(parsed);
        };
        let text = match value.single() {
            Some(XdmItem::Atomic(a)) => a.as_str().map(str::to_owned),
            _ => None,
        };
        parsed.duplicates = match text.as_deref() {
            Some("reject") => MergeDuplicates::Reject,
            Some("use-first") => MergeDuplicates::UseFirst,
            Some("use-last") => MergeDuplicates::UseLast,
            Some("use-any") => MergeDuplicates::UseAny,
            Some("combine") => MergeDuplicates::Combine,
            _ => {
                return Err(XPath31Error::unsupported_option(
                    "map:merge",
                    "duplicates",
                    describe(value),
                ));
            }
        };
        Ok(parsed)
    }
}

pub fn map_size<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:size", args, 1, 1)?;
    let map = map_arg("map:size", 1, next(&mut args))?;
    Ok(XdmValue::from_integer(map.size() as i64))
}

pub fn map_keys<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:keys", args, 1, 1)?;
    let map = map_arg("map:keys", 1, next(&mut args))?;
    Ok(XdmValue::from_atomics(map.keys().cloned().collect::<Vec<_>>()))
}

pub fn map_contains<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:contains", args, 2, 2)?;
    let map = map_arg("map:contains", 1, next(&mut args))?;
    let key = atomic_arg("map:contains", 2, next(&mut args))?;
    Ok(XdmValue::from_bool(map.contains_key(&key)))
}

pub fn map_get<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:get", args, 2, 2)?;
    let mut map = map_arg("map:get", 1, next(&mut args))?;
    let key = atomic_arg("map:get", 2, next(&mut args))?;
    Ok(map.remove(&key).unwrap_or_default())
}

pub fn map_put<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:put", args, 3, 3)?;
    let mut map = map_arg("map:put", 1, next(&mut args))?;
    let key = atomic_arg("map:put", 2, next(&mut args))?;
    map.insert(key, next(&mut args));
    Ok(XdmValue::from_map(map))
}

/// `map:remove($map, $keys as xs:anyAtomicType*)`.
pub fn map_remove<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:remove", args, 2, 2)?;
    let mut map = map_arg("map:remove", 1, next(&mut args))?;
    for item in next(&mut args) {
        match item {
            XdmItem::Atomic(key) => {
                map.remove(&key);
            }
            other => {
                return Err(XPath31Error::type_error(
                    "map:remove",
                    2,
                    format!("expected xs:anyAtomicType*, got {}", other.type_name()),
                ));
            }
        }
    }
    Ok(XdmValue::from_map(map))
}

pub fn map_entry<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:entry", args, 2, 2)?;
    let key = atomic_arg("map:entry", 1, next(&mut args))?;
    let mut map = XdmMap::with_capacity(1);
    map.insert(key, next(&mut args));
    Ok(XdmValue::from_map(map))
}

/// Searches maps and arrays in the input, at any depth, for entries with the
/// given key and returns their values as an array.
pub fn map_find<N: Clone>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:find", args, 2, 2)?;
    let input = next(&mut args);
    let key = atomic_arg("map:find", 2, next(&mut args))?;
    let mut found = Vec::new();
    find_in_items(input.items(), &key, &mut found);
    Ok(XdmValue::from_array(XdmArray::from_members(found)))
}

fn find_in_items<N: Clone>(
    items: &[XdmItem<N>],
    key: &AtomicValue,
    found: &mut Vec<XdmValue<N>>,
) {
    for item in items {
        match item {
            XdmItem::Map(map) => {
                for (k, value) in map.entries() {
                    if k == key {
                        found.push(value.clone());
                    }
                    find_in_items(value.items(), key, found);
                }
            }
            XdmItem::Array(array) => {
                for member in array.members() {
                    find_in_items(member.items(), key, found);
                }
            }
            _ => {}
        }
    }
}

pub fn map_for_each<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:for-each", args, 2, 2)?;
    let map = map_arg("map:for-each", 1, next(&mut args))?;
    let action = function_arg("map:for-each", 2, next(&mut args), 2)?;
    let mut result = XdmValue::empty();
    for (key, value) in map.into_entries() {
        result.extend(invoke_function(
            &action,
            vec![XdmValue::from_atomic(key), value],
            ctx,
        )?);
    }
    Ok(result)
}

/// `map:merge($maps as map(*)*, $options as map(*)?)`.
pub fn map_merge<N>(args: Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> {
    let mut args = expect_arity("map:merge", args, 1, 2)?;
    let maps = next(&mut args);
    let options = options_arg("map:merge", 2, next(&mut args))?;
    let options = MergeOptions::from_map(options.as_ref())?;

    let mut merged: XdmMap<N> = XdmMap::new();
    for item in maps {
        let map = match item {
            XdmItem::Map(map) => map,
            other => {
                return Err(XPath31Error::type_error(
                    "map:merge",
                    1,
                    format!("expected map(*)*, got {}", other.type_name()),
                ));
            }
        };
        for (key, value) in map.into_entries() {
            match (merged.get_mut(&key), options.duplicates) {
                (None, _) => {
                    merged.insert(key, value);
                }
                (Some(_), MergeDuplicates::Reject) => {
                    return Err(XPath31Error::DuplicateKey(key.to_string_value()));
                }
                (Some(_), MergeDuplicates::UseFirst | MergeDuplicates::UseAny) => {}
                (Some(existing), MergeDuplicates::UseLast) => *existing = value,
                (Some(existing), MergeDuplicates::Combine) => existing.extend(value),
            }
        }
    }
    Ok(XdmValue::from_map(merged))
}
