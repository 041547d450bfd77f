//! `fn:parse-json` and `fn:json-doc`: JSON text to maps, arrays and atomics.

use std::path::Path;

use log::debug;
use url::Url;
use xylem_datasource::DataSourceNode;
use xylem_traits::ResourceError;

use super::options::{JsonDuplicates, ParseJsonOptions};
use super::reader::{JsonNode, read_json};
use super::strings::StringRenderer;
use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::functions::args::{expect_arity, next, optional_string_arg, options_arg};
use crate::types::{AtomicValue, XdmArray, XdmMap, XdmValue};

/// `fn:parse-json($json-text as xs:string?, $options as map(*)?)`.
pub fn parse_json<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    const FUNCTION: &str = "fn:parse-json";
    let mut args = expect_arity(FUNCTION, args, 1, 2)?;
    let text = optional_string_arg(FUNCTION, 1, next(&mut args))?;
    let options = options_arg(FUNCTION, 2, next(&mut args))?;
    let options = ParseJsonOptions::from_map(FUNCTION, options.as_ref())?;
    match text {
        Some(text) => parse_json_text(&text, &options, ctx),
        None => Ok(XdmValue::empty()),
    }
}

/// `fn:json-doc($href as xs:string?, $options as map(*)?)`.
///
/// The href is resolved against the context's base URI and fetched through
/// its resource provider.
pub fn json_doc<'a, N: DataSourceNode<'a>>(
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    const FUNCTION: &str = "fn:json-doc";
    let mut args = expect_arity(FUNCTION, args, 1, 2)?;
    let href = optional_string_arg(FUNCTION, 1, next(&mut args))?;
    let options = options_arg(FUNCTION, 2, next(&mut args))?;
    let options = ParseJsonOptions::from_map(FUNCTION, options.as_ref())?;
    let Some(href) = href else {
        return Ok(XdmValue::empty());
    };

    let uri = resolve_href(&href, ctx.base_uri());
    let provider = ctx.resource_provider().ok_or_else(|| XPath31Error::Resource {
        uri: uri.clone(),
        source: ResourceError::LoadFailed {
            uri: uri.clone(),
            message: "no resource provider configured".to_string(),
        },
    })?;
    let text = provider
        .fetch_text(&uri)
        .map_err(|source| XPath31Error::Resource {
            uri: uri.clone(),
            source,
        })?;
    debug!("json-doc: fetched '{}' via {} ({} bytes)", uri, provider.name(), text.len());
    parse_json_text(&text, &options, ctx)
}

/// Parses JSON text with already-validated options.
pub fn parse_json_text<'a, N: DataSourceNode<'a>>(
    text: &str,
    options: &ParseJsonOptions<N>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    let root = read_json(text, options.liberal)?;
    let builder = ValueBuilder {
        duplicates: options.duplicates,
        renderer: StringRenderer {
            escape: options.escape,
            fallback: options.fallback.as_ref(),
            ctx,
        },
    };
    builder.build(root)
}

/// Resolves `href` against `base`. URL bases use RFC 3986 resolution, plain
/// path bases are joined relative to their parent directory.
pub fn resolve_href(href: &str, base: Option<&str>) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    let Some(base) = base else {
        return href.to_string();
    };
    match Url::parse(base) {
        Ok(base) => base
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string()),
        Err(_) if href.starts_with('/') => href.to_string(),
        Err(_) => {
            let base_dir = Path::new(base).parent().unwrap_or(Path::new(""));
            normalize_path(&base_dir.join(href).to_string_lossy())
        }
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    if path.starts_with('/') {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    }
}

struct ValueBuilder<'r, 'c, N> {
    duplicates: JsonDuplicates,
    renderer: StringRenderer<'r, 'c, N>,
}

impl<'a, N: DataSourceNode<'a>> ValueBuilder<'_, '_, N> {
    fn build(&self, node: JsonNode) -> Result<XdmValue<N>, XPath31Error> {
        match node {
            JsonNode::Null => Ok(XdmValue::empty()),
            JsonNode::Bool(b) => Ok(XdmValue::from_bool(b)),
            JsonNode::Number(text) => text
                .parse::<f64>()
                .map(XdmValue::from_double)
                .map_err(|_| XPath31Error::MalformedJson(format!("invalid number '{text}'"))),
            JsonNode::String(s) => Ok(XdmValue::from_string(self.renderer.render(&s)?.text)),
            JsonNode::Array(members) => {
                let members = members
                    .into_iter()
                    .map(|m| self.build(m))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(XdmValue::from_array(XdmArray::from_members(members)))
            }
            JsonNode::Object(entries) => {
                let mut map = XdmMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = AtomicValue::String(self.renderer.render(&key)?.text);
                    if map.contains_key(&key) {
                        match self.duplicates {
                            JsonDuplicates::Reject => {
                                return Err(XPath31Error::DuplicateKey(key.to_string_value()));
                            }
                            JsonDuplicates::UseFirst | JsonDuplicates::Retain => continue,
                            JsonDuplicates::UseLast => {}
                        }
                    }
                    let value = self.build(value)?;
                    map.insert(key, value);
                }
                Ok(XdmValue::from_map(map))
            }
        }
    }
}
