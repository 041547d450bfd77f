pub mod fixtures;

use xylem::xpath31::{
    EvaluationContext, Evaluator, Expression, Focus, XPath31Error, XdmItem, XdmValue,
};
use xylem::{DataSourceNode, XmlDocument, XmlNode};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub type Node<'d> = XmlNode<'d, 'd>;

/// Initialise logging once per test binary; later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A context whose evaluator is [`evaluate`] or any other stand-in.
pub fn context<'c, 'd>(
    evaluator: &'c dyn Evaluator<Node<'d>>,
) -> EvaluationContext<'c, Node<'d>> {
    EvaluationContext::new().with_evaluator(evaluator)
}

/// Child elements of the document element with the given name, in document
/// order.
pub fn elements<'d>(doc: &'d XmlDocument<'d>, name: &str) -> Vec<Node<'d>> {
    doc.document_element().elements_named(name).collect()
}

/// A stand-in for the host's XPath engine. Understands `.`, `name()`,
/// `position()`, `last()`, `count(current-group())` and `@attr`.
pub fn evaluate<'d>(
    expr: &Expression,
    focus: &Focus<'_, Node<'d>>,
) -> Result<XdmValue<Node<'d>>, XPath31Error> {
    match expr.source() {
        "position()" => return Ok(XdmValue::from_integer(focus.position as i64)),
        "last()" => return Ok(XdmValue::from_integer(focus.size as i64)),
        "count(current-group())" => {
            return Ok(XdmValue::from_integer(focus.current_group.len() as i64));
        }
        _ => {}
    }
    let node = match &focus.item {
        Some(XdmItem::Node(node)) => *node,
        Some(_) => return Err(XPath31Error::dynamic_error("context item is not a node")),
        None => return Err(XPath31Error::dynamic_error("context item is absent")),
    };
    match expr.source() {
        "." => Ok(XdmValue::from_node(node)),
        "name()" => Ok(XdmValue::from_string(
            node.name().map(|q| q.local_part).unwrap_or_default(),
        )),
        source => match source.strip_prefix('@') {
            Some(name) => Ok(node
                .attribute(name)
                .map(XdmValue::from_node)
                .unwrap_or_default()),
            None => Err(XPath31Error::dynamic_error(format!(
                "unsupported expression: {source}"
            ))),
        },
    }
}

/// The `name` attribute of each node, for compact assertions.
pub fn names(nodes: &[Node<'_>]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| n.attribute("name").map(|a| a.string_value()).unwrap_or_default())
        .collect()
}
