//! Defines the core abstraction for a navigable, read-only node store.
//!
//! The XDM value model, the sorter and the JSON bridge are written exclusively
//! against [`DataSourceNode`]. Nodes are opaque handles borrowed from whatever
//! store backs the transformation; this crate never owns node lifetimes.
use std::hash::Hash;

pub mod mock;
pub mod xml;

pub use mock::{MockNode, MockTree};
pub use xml::{XmlDocument, XmlNode};

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

impl<'a> QName<'a> {
    pub fn local(local_part: &'a str) -> Self {
        Self {
            prefix: None,
            local_part,
        }
    }
}

/// The kind of a node, aligned with the XDM node kinds this crate needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract for a node handle in a read-only, hierarchical store.
///
/// `Ord` must be document order: `a < b` exactly when `a` precedes `b` in the
/// source tree. The sorter relies on it as its final tie-break.
///
/// `'a` is the lifetime of the underlying store.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node. `None` for text, comment and root nodes.
    /// For a processing instruction this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI of an element or attribute name, if the store tracks it.
    fn namespace_uri(&self) -> Option<&'a str> {
        None
    }

    /// The string value as defined by `fn:string()`: text content for text
    /// nodes, concatenated descendant text for elements and the root, the
    /// value for attributes.
    fn string_value(&self) -> String;

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    fn parent(&self) -> Option<Self>;

    /// Looks up an attribute in no namespace by local name.
    fn attribute(&self, local_name: &str) -> Option<Self> {
        self.attributes().find(|attr| {
            attr.namespace_uri().is_none()
                && attr.name().is_some_and(|q| q.prefix.is_none() && q.local_part == local_name)
        })
    }
}

/// Document-order predicate: `true` when `a` appears before `b`.
pub fn is_node_before<'a, N: DataSourceNode<'a>>(a: &N, b: &N) -> bool {
    a < b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_node_before_follows_document_order() {
        let mut tree = MockTree::new();
        let root = tree.root_id();
        let first = tree.add_element(root, "first");
        let second = tree.add_element(root, "second");

        let a = tree.node(first);
        let b = tree.node(second);
        assert!(is_node_before(&a, &b));
        assert!(!is_node_before(&b, &a));
        assert!(!is_node_before(&a, &a));
    }

    #[test]
    fn test_attribute_lookup_ignores_prefixed_names() {
        let mut tree = MockTree::new();
        let root = tree.root_id();
        let item = tree.add_element(root, "item");
        tree.add_attribute(item, "price", "10");
        tree.add_prefixed_attribute(item, "xml", "lang", "en");

        let node = tree.node(item);
        assert_eq!(
            node.attribute("price").map(|a| a.string_value()),
            Some("10".to_string())
        );
        assert!(node.attribute("lang").is_none());
    }
}
