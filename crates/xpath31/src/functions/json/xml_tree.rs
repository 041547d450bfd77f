//! `fn:json-to-xml`: the XML representation of JSON as an owned node arena.
//!
//! Node ids follow document order (an element, then its attributes, then its
//! children), so the derived ordering of [`JsonXmlNode`] is document order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use log::debug;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use xylem_datasource::{DataSourceNode, NodeType, QName};

use super::options::{JsonDuplicates, JsonToXmlOptions};
use super::reader::{JsonNode, JsonString, read_json};
use super::strings::{Rendered, StringRenderer};
use super::to_json::validate_json_xml;
use crate::context::EvaluationContext;
use crate::error::XPath31Error;

pub const FN_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions";

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Root,
    Element(&'static str),
    Attribute { name: &'static str, value: String },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
    attributes: Vec<usize>,
}

/// An owned document produced by `json-to-xml`.
#[derive(Debug)]
pub struct JsonXmlDocument {
    nodes: Vec<NodeData>,
}

impl JsonXmlDocument {
    fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
                attributes: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> JsonXmlNode<'_> {
        JsonXmlNode { doc: self, id: 0 }
    }

    pub fn document_element(&self) -> Option<JsonXmlNode<'_>> {
        self.nodes[0]
            .children
            .first()
            .map(|&id| JsonXmlNode { doc: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, kind: NodeKind, parent: usize) -> usize {
        let id = self.nodes.len();
        let is_attribute = matches!(kind, NodeKind::Attribute { .. });
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            attributes: Vec::new(),
        });
        let parent = &mut self.nodes[parent];
        if is_attribute {
            parent.attributes.push(id);
        } else {
            parent.children.push(id);
        }
        id
    }

    /// Serialises the document. The function namespace is declared as the
    /// default namespace on the outermost element.
    pub fn to_xml_string(&self) -> Result<String, XPath31Error> {
        let mut writer = Writer::new(Vec::new());
        for &child in &self.nodes[0].children {
            self.write_node(&mut writer, child, true)?;
        }
        String::from_utf8(writer.into_inner())
            .map_err(|e| XPath31Error::dynamic_error(format!("json-to-xml output: {e}")))
    }

    fn write_node(
        &self,
        writer: &mut Writer<Vec<u8>>,
        id: usize,
        outermost: bool,
    ) -> Result<(), XPath31Error> {
        let data = &self.nodes[id];
        let event = match &data.kind {
            NodeKind::Element(name) => {
                let mut start = BytesStart::new(*name);
                if outermost {
                    start.push_attribute(("xmlns", FN_NAMESPACE));
                }
                for &attr in &data.attributes {
                    if let NodeKind::Attribute { name, value } = &self.nodes[attr].kind {
                        start.push_attribute((*name, value.as_str()));
                    }
                }
                if data.children.is_empty() {
                    Event::Empty(start)
                } else {
                    write_event(writer, Event::Start(start))?;
                    for &child in &data.children {
                        self.write_node(writer, child, false)?;
                    }
                    Event::End(BytesEnd::new(*name))
                }
            }
            NodeKind::Text(text) => Event::Text(BytesText::new(text)),
            NodeKind::Root | NodeKind::Attribute { .. } => return Ok(()),
        };
        write_event(writer, event)
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XPath31Error> {
    writer
        .write_event(event)
        .map_err(|e| XPath31Error::dynamic_error(format!("json-to-xml output: {e}")))
}

/// A node handle into a [`JsonXmlDocument`].
#[derive(Clone, Copy)]
pub struct JsonXmlNode<'d> {
    doc: &'d JsonXmlDocument,
    id: usize,
}

impl<'d> JsonXmlNode<'d> {
    fn data(&self) -> &'d NodeData {
        &self.doc.nodes[self.id]
    }

    fn key(&self) -> (usize, usize) {
        (std::ptr::from_ref(self.doc) as usize, self.id)
    }

    fn collect_text(&self, out: &mut String) {
        match &self.data().kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Root | NodeKind::Element(_) => {
                for &child in &self.data().children {
                    JsonXmlNode { doc: self.doc, id: child }.collect_text(out);
                }
            }
            NodeKind::Attribute { .. } => {}
        }
    }
}

impl fmt::Debug for JsonXmlNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonXmlNode({}, {:?})", self.id, self.data().kind)
    }
}

impl PartialEq for JsonXmlNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for JsonXmlNode<'_> {}

impl PartialOrd for JsonXmlNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsonXmlNode<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for JsonXmlNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<'d> DataSourceNode<'d> for JsonXmlNode<'d> {
    fn node_type(&self) -> NodeType {
        match self.data().kind {
            NodeKind::Root => NodeType::Root,
            NodeKind::Element(_) => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text(_) => NodeType::Text,
        }
    }

    fn name(&self) -> Option<QName<'d>> {
        match &self.data().kind {
            NodeKind::Element(name) | NodeKind::Attribute { name, .. } => Some(QName::local(*name)),
            NodeKind::Root | NodeKind::Text(_) => None,
        }
    }

    fn namespace_uri(&self) -> Option<&'d str> {
        match self.data().kind {
            NodeKind::Element(_) => Some(FN_NAMESPACE),
            _ => None,
        }
    }

    fn string_value(&self) -> String {
        match &self.data().kind {
            NodeKind::Attribute { value, .. } => value.clone(),
            _ => {
                let mut out = String::new();
                self.collect_text(&mut out);
                out
            }
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        let doc = self.doc;
        Box::new(self.data().attributes.iter().map(move |&id| JsonXmlNode { doc, id }))
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        let doc = self.doc;
        Box::new(self.data().children.iter().map(move |&id| JsonXmlNode { doc, id }))
    }

    fn parent(&self) -> Option<Self> {
        self.data().parent.map(|id| JsonXmlNode { doc: self.doc, id })
    }
}

/// Converts JSON text into its XML representation.
pub fn json_text_to_xml<'a, N: DataSourceNode<'a>>(
    text: &str,
    options: &JsonToXmlOptions<N>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<JsonXmlDocument, XPath31Error> {
    let root = read_json(text, options.liberal)?;
    let mut builder = TreeBuilder {
        doc: JsonXmlDocument::new(),
        duplicates: options.duplicates,
        renderer: StringRenderer {
            escape: options.escape,
            fallback: options.fallback.as_ref(),
            ctx,
        },
    };
    builder.build(root, 0, None)?;
    let doc = builder.doc;
    debug!("json-to-xml: built {} nodes", doc.len());
    if options.validate {
        validate_json_xml(doc.root())?;
    }
    Ok(doc)
}

struct TreeBuilder<'r, 'c, N> {
    doc: JsonXmlDocument,
    duplicates: JsonDuplicates,
    renderer: StringRenderer<'r, 'c, N>,
}

impl<'a, N: DataSourceNode<'a>> TreeBuilder<'_, '_, N> {
    fn attribute(&mut self, owner: usize, name: &'static str, value: impl Into<String>) {
        self.doc.push(
            NodeKind::Attribute {
                name,
                value: value.into(),
            },
            owner,
        );
    }

    fn build(
        &mut self,
        node: JsonNode,
        parent: usize,
        key: Option<Rendered>,
    ) -> Result<(), XPath31Error> {
        let name = match &node {
            JsonNode::Null => "null",
            JsonNode::Bool(_) => "boolean",
            JsonNode::Number(_) => "number",
            JsonNode::String(_) => "string",
            JsonNode::Array(_) => "array",
            JsonNode::Object(_) => "map",
        };
        let id = self.doc.push(NodeKind::Element(name), parent);
        if let Some(key) = key {
            self.attribute(id, "key", key.text);
            if key.escaped {
                self.attribute(id, "escaped-key", "true");
            }
        }
        match node {
            JsonNode::Null => {}
            JsonNode::Bool(b) => {
                self.doc.push(NodeKind::Text(b.to_string()), id);
            }
            JsonNode::Number(text) => {
                self.doc.push(NodeKind::Text(text), id);
            }
            JsonNode::String(s) => {
                let rendered = self.renderer.render(&s)?;
                if rendered.escaped {
                    self.attribute(id, "escaped", "true");
                }
                if !rendered.text.is_empty() {
                    self.doc.push(NodeKind::Text(rendered.text), id);
                }
            }
            JsonNode::Array(members) => {
                for member in members {
                    self.build(member, id, None)?;
                }
            }
            JsonNode::Object(members) => {
                for (key, value) in self.select_members(members)? {
                    let key = self.renderer.render(&key)?;
                    self.build(value, id, Some(key))?;
                }
            }
        }
        Ok(())
    }

    fn select_members(
        &self,
        members: Vec<(JsonString, JsonNode)>,
    ) -> Result<Vec<(JsonString, JsonNode)>, XPath31Error> {
        match self.duplicates {
            JsonDuplicates::Retain => Ok(members),
            JsonDuplicates::Reject => {
                let mut seen = HashSet::new();
                for (key, _) in &members {
                    if !seen.insert(key) {
                        return Err(XPath31Error::DuplicateKey(key.to_string_lossy()));
                    }
                }
                Ok(members)
            }
            JsonDuplicates::UseFirst => {
                let mut seen = HashSet::new();
                Ok(members
                    .into_iter()
                    .filter(|(key, _)| seen.insert(key.clone()))
                    .collect())
            }
            JsonDuplicates::UseLast => {
                let last: HashMap<JsonString, usize> = members
                    .iter()
                    .enumerate()
                    .map(|(i, (key, _))| (key.clone(), i))
                    .collect();
                Ok(members
                    .into_iter()
                    .enumerate()
                    .filter(|(i, (key, _))| last.get(key) == Some(i))
                    .map(|(_, member)| member)
                    .collect())
            }
        }
    }
}
