//! `fn:xml-to-json`: validates the XML representation of JSON and writes it
//! back out as JSON text. [`value_to_json`] writes XDM maps and arrays the
//! same way.

use serde_json::{Map, Number, Value};
use xylem_datasource::{DataSourceNode, NodeType};

use super::options::XmlToJsonOptions;
use super::strings::unescape;
use super::xml_tree::FN_NAMESPACE;
use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::functions::args::{expect_arity, next, options_arg};
use crate::types::{AtomicValue, XdmItem, XdmValue, parse_xs_double};

/// Largest magnitude at which every integer is exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// `fn:xml-to-json($input as node()?, $options as map(*)?)`.
pub fn xml_to_json<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    _ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    const FUNCTION: &str = "fn:xml-to-json";
    let mut args = expect_arity(FUNCTION, args, 1, 2)?;
    let input = next(&mut args);
    let options = options_arg(FUNCTION, 2, next(&mut args))?;
    let options = XmlToJsonOptions::from_map(options.as_ref())?;
    let node = match input.into_single() {
        Ok(XdmItem::Node(node)) => node,
        Ok(other) => {
            return Err(XPath31Error::type_error(
                FUNCTION,
                1,
                format!("expected node(), got {}", other.type_name()),
            ));
        }
        Err(empty) if empty.is_empty() => return Ok(XdmValue::empty()),
        Err(many) => {
            return Err(XPath31Error::cardinality_error(FUNCTION, "node()?", many.len()));
        }
    };
    node_to_json(node, &options).map(XdmValue::from_string)
}

/// Converts a document node (with exactly one element child) or an element
/// in the function namespace to JSON text.
pub fn node_to_json<'a, N: DataSourceNode<'a>>(
    node: N,
    options: &XmlToJsonOptions,
) -> Result<String, XPath31Error> {
    let value = convert_element(outermost_element(node)?, Position::Outermost)?;
    write_json(&value, options)
}

/// Writes an XDM value as JSON text. Maps become objects in entry order,
/// arrays become arrays, the empty sequence becomes `null` and atomic values
/// become scalars. Nodes, functions, NaN and infinities and sequences of
/// more than one item have no JSON form.
pub fn value_to_json<N>(
    value: &XdmValue<N>,
    options: &XmlToJsonOptions,
) -> Result<String, XPath31Error> {
    write_json(&value_to_serde(value)?, options)
}

fn write_json(value: &Value, options: &XmlToJsonOptions) -> Result<String, XPath31Error> {
    let text = if options.indent {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map_err(|e| XPath31Error::dynamic_error(format!("JSON output: {e}")))
}

fn not_serializable(what: impl std::fmt::Display) -> XPath31Error {
    XPath31Error::dynamic_error(format!("JSON output cannot represent {what}"))
}

fn value_to_serde<N>(value: &XdmValue<N>) -> Result<Value, XPath31Error> {
    match value.items() {
        [] => Ok(Value::Null),
        [item] => item_to_serde(item),
        items => Err(not_serializable(format!("a sequence of {} items", items.len()))),
    }
}

fn item_to_serde<N>(item: &XdmItem<N>) -> Result<Value, XPath31Error> {
    match item {
        XdmItem::Atomic(atomic) => atomic_to_serde(atomic),
        XdmItem::Array(array) => array
            .iter()
            .map(value_to_serde)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        XdmItem::Map(map) => {
            let mut object = Map::new();
            for (key, member) in map.entries() {
                let key = key.to_string_value();
                if object.contains_key(&key) {
                    return Err(not_serializable(format!("two map keys spelled '{key}'")));
                }
                object.insert(key, value_to_serde(member)?);
            }
            Ok(Value::Object(object))
        }
        other => Err(not_serializable(other.type_name())),
    }
}

fn atomic_to_serde(atomic: &AtomicValue) -> Result<Value, XPath31Error> {
    match atomic {
        AtomicValue::String(s) | AtomicValue::UntypedAtomic(s) => Ok(Value::String(s.clone())),
        AtomicValue::Boolean(b) => Ok(Value::Bool(*b)),
        AtomicValue::Integer(i) => Ok(Value::Number(Number::from(*i))),
        AtomicValue::Decimal(_) | AtomicValue::Double(_) => {
            let value = atomic.to_double();
            if value.is_finite() {
                Ok(number_value(value))
            } else {
                Err(not_serializable(format!("the number {atomic}")))
            }
        }
    }
}

/// Checks that `node` is a valid XML representation of JSON.
pub fn validate_json_xml<'a, N: DataSourceNode<'a>>(node: N) -> Result<(), XPath31Error> {
    convert_element(outermost_element(node)?, Position::Outermost).map(|_| ())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// A `key` attribute here is ignored.
    Outermost,
    MapMember,
    ArrayMember,
}

fn invalid(message: impl Into<String>) -> XPath31Error {
    XPath31Error::InvalidJsonXml(message.into())
}

fn outermost_element<'a, N: DataSourceNode<'a>>(node: N) -> Result<N, XPath31Error> {
    match node.node_type() {
        NodeType::Element => Ok(node),
        NodeType::Root => {
            let mut element = None;
            for child in node.children() {
                match child.node_type() {
                    NodeType::Element if element.is_none() => element = Some(child),
                    NodeType::Element => {
                        return Err(invalid("document node has more than one element child"));
                    }
                    NodeType::Text if !child.string_value().trim().is_empty() => {
                        return Err(invalid("document node contains text"));
                    }
                    _ => {}
                }
            }
            element.ok_or_else(|| invalid("document node has no element child"))
        }
        other => Err(invalid(format!("expected a document or element node, got {other:?}"))),
    }
}

/// Attributes of a JSON element that matter to the conversion.
#[derive(Default)]
struct JsonAttributes {
    key: Option<String>,
    escaped_key: bool,
    escaped: bool,
}

fn flag(name: &str, value: &str) -> Result<bool, XPath31Error> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(invalid(format!("attribute {name}='{other}' is not a boolean"))),
    }
}

fn read_attributes<'a, N: DataSourceNode<'a>>(
    element: N,
    local: &str,
) -> Result<JsonAttributes, XPath31Error> {
    let mut attrs = JsonAttributes::default();
    for attr in element.attributes() {
        let name = attr.name().map(|q| q.local_part).unwrap_or_default();
        match attr.namespace_uri() {
            None => {}
            Some(FN_NAMESPACE) => {
                return Err(invalid(format!("attribute {name} in the function namespace")));
            }
            Some(_) => continue,
        }
        match name {
            "key" => attrs.key = Some(attr.string_value()),
            "escaped-key" => attrs.escaped_key = flag(name, &attr.string_value())?,
            "escaped" if local == "string" => attrs.escaped = flag(name, &attr.string_value())?,
            _ => return Err(invalid(format!("unexpected attribute {name} on <{local}>"))),
        }
    }
    Ok(attrs)
}

fn convert_element<'a, N: DataSourceNode<'a>>(
    element: N,
    position: Position,
) -> Result<Value, XPath31Error> {
    let local = element.name().map(|q| q.local_part).unwrap_or_default();
    if element.namespace_uri() != Some(FN_NAMESPACE) {
        return Err(invalid(format!("element <{local}> is not in namespace {FN_NAMESPACE}")));
    }
    let attrs = read_attributes(element, local)?;
    if attrs.key.is_some() && position == Position::ArrayMember {
        return Err(invalid(format!("<{local}> inside an array has a key")));
    }
    if attrs.escaped_key && attrs.key.is_none() {
        return Err(invalid(format!("<{local}> has escaped-key without a key")));
    }

    match local {
        "map" => convert_map(element),
        "array" => {
            let members = member_elements(element, local)?
                .into_iter()
                .map(|member| convert_element(member, Position::ArrayMember))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(members))
        }
        "string" => {
            let text = leaf_text(element, local)?;
            if attrs.escaped {
                unescape(&text)
                    .map(Value::String)
                    .map_err(|e| invalid(format!("<string escaped='true'>: {e}")))
            } else {
                Ok(Value::String(text))
            }
        }
        "number" => {
            let text = leaf_text(element, local)?;
            let value = parse_xs_double(text.trim())
                .filter(|d| d.is_finite())
                .ok_or_else(|| invalid(format!("'{}' is not a finite number", text.trim())))?;
            Ok(number_value(value))
        }
        "boolean" => {
            let text = leaf_text(element, local)?;
            match text.trim() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                other => Err(invalid(format!("'{other}' is not a boolean"))),
            }
        }
        "null" => {
            if !leaf_text(element, local)?.is_empty() {
                return Err(invalid("<null> must be empty"));
            }
            Ok(Value::Null)
        }
        other => Err(invalid(format!("unknown element <{other}>"))),
    }
}

fn convert_map<'a, N: DataSourceNode<'a>>(element: N) -> Result<Value, XPath31Error> {
    let mut map = Map::new();
    for member in member_elements(element, "map")? {
        let attrs = read_attributes(member, member.name().map_or("", |q| q.local_part))?;
        let Some(key) = attrs.key else {
            return Err(invalid("map member without a key attribute"));
        };
        let key = if attrs.escaped_key {
            unescape(&key).map_err(|e| invalid(format!("escaped key '{key}': {e}")))?
        } else {
            key
        };
        if map.contains_key(&key) {
            return Err(invalid(format!("duplicate key '{key}' in map")));
        }
        let value = convert_element(member, Position::MapMember)?;
        map.insert(key, value);
    }
    Ok(Value::Object(map))
}

/// Element children of a map or array; whitespace, comments and processing
/// instructions are skipped, other text is an error.
fn member_elements<'a, N: DataSourceNode<'a>>(
    element: N,
    local: &str,
) -> Result<Vec<N>, XPath31Error> {
    let mut members = Vec::new();
    for child in element.children() {
        match child.node_type() {
            NodeType::Element => members.push(child),
            NodeType::Text if !child.string_value().trim().is_empty() => {
                return Err(invalid(format!("<{local}> contains text")));
            }
            _ => {}
        }
    }
    Ok(members)
}

/// Text content of a leaf element, which may not have element children.
fn leaf_text<'a, N: DataSourceNode<'a>>(element: N, local: &str) -> Result<String, XPath31Error> {
    let mut text = String::new();
    for child in element.children() {
        match child.node_type() {
            NodeType::Element => {
                return Err(invalid(format!("<{local}> has child elements")));
            }
            NodeType::Text => text.push_str(&child.string_value()),
            _ => {}
        }
    }
    Ok(text)
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xylem_datasource::XmlDocument;

    const NS: &str = r#"xmlns="http://www.w3.org/2005/xpath-functions""#;

    fn to_json(xml: &str) -> Result<String, XPath31Error> {
        let doc = XmlDocument::parse(xml).unwrap();
        node_to_json(doc.root_node(), &XmlToJsonOptions::default())
    }

    fn wrap(body: &str) -> String {
        format!("<map {NS}>{body}</map>")
    }

    #[test]
    fn test_writes_members_in_document_order() {
        let xml = wrap(
            r#"
            <string key="name">Ann</string>
            <number key="age">42</number>
            <array key="tags"><boolean>true</boolean><null/><number>1.5</number></array>
            "#,
        );
        assert_eq!(
            to_json(&xml).unwrap(),
            r#"{"name":"Ann","age":42,"tags":[true,null,1.5]}"#
        );
    }

    #[test]
    fn test_indent_pretty_prints() {
        let xml = wrap(r#"<number key="a">1</number>"#);
        let doc = XmlDocument::parse(&xml).unwrap();
        let text = node_to_json(doc.root_node(), &XmlToJsonOptions { indent: true }).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_escaped_content_is_unescaped() {
        let xml = wrap(
            r#"<string key="aA" escaped-key="true" escaped="true">x\ny</string>"#,
        );
        assert_eq!(to_json(&xml).unwrap(), r#"{"aA":"x\ny"}"#);
    }

    #[test]
    fn test_accepts_an_element_directly() {
        let xml = format!("<array {NS}><string>x</string></array>");
        let doc = XmlDocument::parse(&xml).unwrap();
        let json = node_to_json(doc.document_element(), &XmlToJsonOptions::default()).unwrap();
        assert_eq!(json, r#"["x"]"#);
    }

    #[test]
    fn test_top_level_key_is_ignored() {
        let xml = format!(r#"<number key="x" {NS}>3</number>"#);
        assert_eq!(to_json(&xml).unwrap(), "3");
    }

    #[test]
    fn test_rejects_invalid_shapes() {
        let cases = [
            "<map><string>no key</string></map>".to_string(),
            wrap(r#"<number key="a">1</number><number key="a">2</number>"#),
            wrap("stray text"),
            format!(r#"<array {NS}><number key="k">1</number></array>"#),
            format!("<number {NS}>abc</number>"),
            format!("<number {NS}>INF</number>"),
            format!("<boolean {NS}>yes</boolean>"),
            format!("<null {NS}>x</null>"),
            format!("<string {NS}><string/></string>"),
            format!("<object {NS}/>"),
            format!(r#"<string color="red" {NS}>x</string>"#),
        ];
        for xml in cases {
            let err = to_json(&xml).unwrap_err();
            assert!(
                matches!(err, XPath31Error::InvalidJsonXml(_)),
                "{xml} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_foreign_attributes_and_whitespace_are_ignored() {
        let xml = format!(
            r#"<map {NS} xmlns:x="urn:x" x:note="hi">
                 <!-- comment -->
                 <boolean key="b"> 1 </boolean>
               </map>"#
        );
        assert_eq!(to_json(&xml).unwrap(), r#"{"b":true}"#);
    }

    #[test]
    fn test_values_write_as_json() {
        use crate::types::{XdmArray, XdmMap};
        use xylem_datasource::mock::MockNode;
        type V = XdmValue<MockNode<'static>>;

        let value = V::from_map(XdmMap::from_entries([
            (AtomicValue::from("big"), V::from_integer(9_007_199_254_740_993)),
            (AtomicValue::from("none"), V::empty()),
            (
                AtomicValue::from("list"),
                V::from_array(XdmArray::from_members(vec![
                    V::from_double(1e3),
                    V::from_double(-0.0),
                    V::from_bool(false),
                ])),
            ),
        ]));
        let text = value_to_json(&value, &XmlToJsonOptions::default()).unwrap();
        assert_eq!(text, r#"{"big":9007199254740993,"none":null,"list":[1000,0,false]}"#);
    }

    #[test]
    fn test_values_without_a_json_form_are_rejected() {
        use crate::types::{XdmArray, XdmFunction};
        use xylem_datasource::mock::MockNode;
        type V = XdmValue<MockNode<'static>>;

        let cases = [
            V::from_atomics([AtomicValue::from("a"), AtomicValue::from("b")]),
            V::from_double(f64::NAN),
            V::from_array(XdmArray::from_members(vec![V::from_double(f64::INFINITY)])),
            V::from_function(XdmFunction::builtin("array:size", 1)),
            V::from_map(crate::types::XdmMap::from_entries([
                (AtomicValue::from("1"), V::empty()),
                (AtomicValue::Integer(1), V::empty()),
            ])),
        ];
        for value in cases {
            let err = value_to_json(&value, &XmlToJsonOptions::default()).unwrap_err();
            assert!(matches!(err, XPath31Error::DynamicError(_)), "{value} gave {err:?}");
        }
    }

    #[test]
    fn test_function_wrapper_handles_empty_and_wrong_input() {
        use xylem_datasource::mock::MockNode;
        let ctx = EvaluationContext::<MockNode<'static>>::new();
        assert!(xml_to_json(vec![XdmValue::empty()], &ctx).unwrap().is_empty());
        let err = xml_to_json(vec![XdmValue::from_integer(1)], &ctx).unwrap_err();
        assert!(matches!(err, XPath31Error::ArgumentType { .. }));
    }
}
