//! In-memory node store for tests and examples.
//!
//! Node ids are handed out in creation order and `Ord` compares ids, so a tree
//! built depth-first (parents before children, siblings left to right) has ids
//! in document order.

use super::{DataSourceNode, NodeType, QName};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
struct MockNodeData {
    node_type: NodeType,
    prefix: Option<String>,
    name: Option<String>,
    namespace: Option<String>,
    value: String,
    parent: Option<usize>,
    children: Vec<usize>,
    attributes: Vec<usize>,
}

impl MockNodeData {
    fn new(node_type: NodeType, parent: Option<usize>) -> Self {
        Self {
            node_type,
            prefix: None,
            name: None,
            namespace: None,
            value: String::new(),
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockTree {
    nodes: Vec<MockNodeData>,
}

impl Default for MockTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTree {
    /// Creates a tree holding only its root node (id 0).
    pub fn new() -> Self {
        Self {
            nodes: vec![MockNodeData::new(NodeType::Root, None)],
        }
    }

    pub fn root_id(&self) -> usize {
        0
    }

    pub fn root(&self) -> MockNode<'_> {
        self.node(0)
    }

    pub fn node(&self, id: usize) -> MockNode<'_> {
        MockNode { id, tree: self }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, data: MockNodeData) -> usize {
        let id = self.nodes.len();
        self.nodes.push(data);
        id
    }

    pub fn add_element(&mut self, parent: usize, name: &str) -> usize {
        self.add_element_ns(parent, name, None)
    }

    pub fn add_element_ns(&mut self, parent: usize, name: &str, namespace: Option<&str>) -> usize {
        let mut data = MockNodeData::new(NodeType::Element, Some(parent));
        data.name = Some(name.to_string());
        data.namespace = namespace.map(str::to_string);
        let id = self.push(data);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_text(&mut self, parent: usize, text: &str) -> usize {
        let mut data = MockNodeData::new(NodeType::Text, Some(parent));
        data.value = text.to_string();
        let id = self.push(data);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_attribute(&mut self, element: usize, name: &str, value: &str) -> usize {
        let mut data = MockNodeData::new(NodeType::Attribute, Some(element));
        data.name = Some(name.to_string());
        data.value = value.to_string();
        let id = self.push(data);
        self.nodes[element].attributes.push(id);
        id
    }

    pub fn add_prefixed_attribute(
        &mut self,
        element: usize,
        prefix: &str,
        name: &str,
        value: &str,
    ) -> usize {
        let id = self.add_attribute(element, name, value);
        self.nodes[id].prefix = Some(prefix.to_string());
        if prefix == "xml" {
            self.nodes[id].namespace = Some("http://www.w3.org/XML/1998/namespace".to_string());
        }
        id
    }

    /// Adds `<name>text</name>` under `parent` and returns the element id.
    pub fn add_text_element(&mut self, parent: usize, name: &str, text: &str) -> usize {
        let id = self.add_element(parent, name);
        self.add_text(id, text);
        id
    }

    fn collect_text(&self, id: usize, out: &mut String) {
        let data = &self.nodes[id];
        match data.node_type {
            NodeType::Text => out.push_str(&data.value),
            NodeType::Element | NodeType::Root => {
                for &child in &data.children {
                    self.collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

/// A node handle borrowing its tree.
#[derive(Debug, Clone, Copy)]
pub struct MockNode<'a> {
    pub id: usize,
    pub tree: &'a MockTree,
}

impl<'a> PartialEq for MockNode<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.tree, other.tree)
    }
}

impl<'a> Eq for MockNode<'a> {}

impl<'a> PartialOrd for MockNode<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Ord for MockNode<'a> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<'a> Hash for MockNode<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<'a> DataSourceNode<'a> for MockNode<'a> {
    fn node_type(&self) -> NodeType {
        self.tree.nodes[self.id].node_type
    }

    fn name(&self) -> Option<QName<'a>> {
        let data = &self.tree.nodes[self.id];
        data.name.as_deref().map(|local_part| QName {
            prefix: data.prefix.as_deref(),
            local_part,
        })
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        self.tree.nodes[self.id].namespace.as_deref()
    }

    fn string_value(&self) -> String {
        let data = &self.tree.nodes[self.id];
        match data.node_type {
            NodeType::Element | NodeType::Root => {
                let mut out = String::new();
                self.tree.collect_text(self.id, &mut out);
                out
            }
            _ => data.value.clone(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let tree = self.tree;
        Box::new(
            tree.nodes[self.id]
                .attributes
                .iter()
                .map(move |&id| MockNode { id, tree }),
        )
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let tree = self.tree;
        Box::new(
            tree.nodes[self.id]
                .children
                .iter()
                .map(move |&id| MockNode { id, tree }),
        )
    }

    fn parent(&self) -> Option<Self> {
        self.tree.nodes[self.id].parent.map(|id| MockNode {
            id,
            tree: self.tree,
        })
    }
}
