//! `roxmltree` adapter: lets a parsed XML document feed the sorter and the
//! value model as a [`DataSourceNode`] store.

use super::{DataSourceNode, NodeType, QName};
use roxmltree::Node;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self { doc })
    }

    pub fn root_node(&self) -> XmlNode<'_, 'input> {
        XmlNode::Tree(self.doc.root())
    }

    /// The outermost element.
    pub fn document_element(&self) -> XmlNode<'_, 'input> {
        XmlNode::Tree(self.doc.root_element())
    }
}

/// A tree node or an attribute. roxmltree stores attributes as data on their
/// element, so an attribute handle is its owner plus a position.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    Tree(Node<'a, 'input>),
    Attribute { owner: Node<'a, 'input>, index: usize },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    pub fn inner(&self) -> Option<Node<'a, 'input>> {
        match self {
            XmlNode::Tree(node) => Some(*node),
            XmlNode::Attribute { .. } => None,
        }
    }

    /// Sort position: (tree node id, attribute slot). Slot 0 is the node itself
    /// so an element precedes its attributes, which precede its children.
    fn position(&self) -> (usize, usize) {
        match self {
            XmlNode::Tree(node) => (node.id().get_usize(), 0),
            XmlNode::Attribute { owner, index } => (owner.id().get_usize(), index + 1),
        }
    }

    /// Child elements with the given local name.
    pub fn elements_named<'n>(
        self,
        local_name: &'n str,
    ) -> impl Iterator<Item = XmlNode<'a, 'input>> + 'n
    where
        'a: 'n,
        'input: 'n,
    {
        self.inner()
            .into_iter()
            .flat_map(|node| node.children())
            .filter(move |n| n.is_element() && n.tag_name().name() == local_name)
            .map(XmlNode::Tree)
    }
}

impl<'a, 'input> PartialEq for XmlNode<'a, 'input> {
    fn eq(&self, other: &Self) -> bool {
        self.position() == other.position()
    }
}

impl<'a, 'input> Eq for XmlNode<'a, 'input> {}

impl<'a, 'input> PartialOrd for XmlNode<'a, 'input> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, 'input> Ord for XmlNode<'a, 'input> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position().cmp(&other.position())
    }
}

impl<'a, 'input> Hash for XmlNode<'a, 'input> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position().hash(state);
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a, 'a> {
    fn node_type(&self) -> NodeType {
        let node = match self {
            XmlNode::Tree(node) => node,
            XmlNode::Attribute { .. } => return NodeType::Attribute,
        };
        if node.is_root() {
            NodeType::Root
        } else if node.is_text() {
            NodeType::Text
        } else if node.is_comment() {
            NodeType::Comment
        } else if node.is_pi() {
            NodeType::ProcessingInstruction
        } else {
            NodeType::Element
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self {
            XmlNode::Tree(node) if node.is_element() => {
                let tag = node.tag_name();
                let prefix = tag.namespace().and_then(|ns| node.lookup_prefix(ns));
                Some(QName {
                    prefix,
                    local_part: tag.name(),
                })
            }
            XmlNode::Tree(node) => node.pi().map(|pi| QName::local(pi.target)),
            XmlNode::Attribute { owner, index } => owner.attributes().nth(*index).map(|attr| {
                let prefix = match attr.namespace() {
                    Some(XML_NAMESPACE) => Some("xml"),
                    Some(ns) => owner.lookup_prefix(ns),
                    None => None,
                };
                QName {
                    prefix,
                    local_part: attr.name(),
                }
            }),
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        match self {
            XmlNode::Tree(node) if node.is_element() => node.tag_name().namespace(),
            XmlNode::Tree(_) => None,
            XmlNode::Attribute { owner, index } => {
                owner.attributes().nth(*index).and_then(|attr| attr.namespace())
            }
        }
    }

    fn string_value(&self) -> String {
        match self {
            XmlNode::Tree(node) if node.is_element() || node.is_root() => node
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect(),
            XmlNode::Tree(node) if node.is_pi() => node
                .pi()
                .and_then(|pi| pi.value)
                .unwrap_or_default()
                .to_string(),
            XmlNode::Tree(node) => node.text().unwrap_or_default().to_string(),
            XmlNode::Attribute { owner, index } => owner
                .attributes()
                .nth(*index)
                .map(|attr| attr.value().to_string())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) => {
                let owner = *node;
                let count = node.attributes().len();
                Box::new((0..count).map(move |index| XmlNode::Attribute { owner, index }))
            }
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Tree(node) => Box::new(node.children().map(XmlNode::Tree)),
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            XmlNode::Tree(node) => node.parent().map(XmlNode::Tree),
            XmlNode::Attribute { owner, .. } => Some(XmlNode::Tree(*owner)),
        }
    }
}
