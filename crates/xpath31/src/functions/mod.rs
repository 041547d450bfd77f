mod args;
pub mod array;
pub mod hof;
pub mod json;
pub mod map;

use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::types::XdmValue;
use xylem_datasource::DataSourceNode;

/// Calls a library function by its prefixed name (`array:sort`,
/// `map:merge`, `fn:parse-json`). An unprefixed name is looked up in the
/// `fn` namespace.
pub fn call_function<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    };

    match (prefix, local) {
        (Some("array"), "size") => array::array_size(args),
        (Some("array"), "get") => array::array_get(args),
        (Some("array"), "put") => array::array_put(args),
        (Some("array"), "append") => array::array_append(args),
        (Some("array"), "subarray") => array::array_subarray(args),
        (Some("array"), "remove") => array::array_remove(args),
        (Some("array"), "insert-before") => array::array_insert_before(args),
        (Some("array"), "head") => array::array_head(args),
        (Some("array"), "tail") => array::array_tail(args),
        (Some("array"), "reverse") => array::array_reverse(args),
        (Some("array"), "join") => array::array_join(args),
        (Some("array"), "flatten") => array::array_flatten(args),
        (Some("array"), "for-each") => array::array_for_each(args, ctx),
        (Some("array"), "filter") => array::array_filter(args, ctx),
        (Some("array"), "fold-left") => array::array_fold_left(args, ctx),
        (Some("array"), "fold-right") => array::array_fold_right(args, ctx),
        (Some("array"), "for-each-pair") => array::array_for_each_pair(args, ctx),
        (Some("array"), "sort") => array::array_sort(args, ctx),

        (Some("map"), "size") => map::map_size(args),
        (Some("map"), "keys") => map::map_keys(args),
        (Some("map"), "contains") => map::map_contains(args),
        (Some("map"), "get") => map::map_get(args),
        (Some("map"), "put") => map::map_put(args),
        (Some("map"), "remove") => map::map_remove(args),
        (Some("map"), "entry") => map::map_entry(args),
        (Some("map"), "find") => map::map_find(args),
        (Some("map"), "for-each") => map::map_for_each(args, ctx),
        (Some("map"), "merge") => map::map_merge(args),

        (Some("fn") | None, "parse-json") => json::parse_json(args, ctx),
        (Some("fn") | None, "json-doc") => json::json_doc(args, ctx),
        (Some("fn") | None, "xml-to-json") => json::xml_to_json(args, ctx),

        _ => Err(XPath31Error::dynamic_error(format!("Unknown function: {name}"))),
    }
}
