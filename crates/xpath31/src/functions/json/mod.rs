//! The JSON bridge: `fn:parse-json`, `fn:json-doc`, `fn:json-to-xml` and
//! `fn:xml-to-json`.

pub mod options;
mod parse;
pub mod reader;
mod strings;
mod to_json;
mod xml_tree;

pub use options::{JsonDuplicates, JsonToXmlOptions, ParseJsonOptions, XmlToJsonOptions};
pub use parse::{json_doc, parse_json, parse_json_text, resolve_href};
pub use reader::{JsonNode, read_json};
pub use to_json::{node_to_json, validate_json_xml, value_to_json, xml_to_json};
pub use xml_tree::{FN_NAMESPACE, JsonXmlDocument, JsonXmlNode, json_text_to_xml};

use super::args::{expect_arity, next, optional_string_arg, options_arg};
use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::types::XdmValue;
use xylem_datasource::DataSourceNode;

/// `fn:json-to-xml($json-text as xs:string?, $options as map(*)?)`.
///
/// The result is a new document rather than an item of the caller's node
/// type, so this entry point is not reachable through `call_function`.
/// Returns `None` for an empty input.
pub fn json_to_xml<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<Option<JsonXmlDocument>, XPath31Error> {
    const FUNCTION: &str = "fn:json-to-xml";
    let mut args = expect_arity(FUNCTION, args, 1, 2)?;
    let text = optional_string_arg(FUNCTION, 1, next(&mut args))?;
    let options = options_arg(FUNCTION, 2, next(&mut args))?;
    let options = JsonToXmlOptions::from_map(options.as_ref())?;
    text.map(|text| json_text_to_xml(&text, &options, ctx))
        .transpose()
}
