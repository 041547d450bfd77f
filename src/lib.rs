//! xylem: the value model and ordering core of an XSLT 3.0 / XPath 3.1
//! processor.
//!
//! The workspace is split the way the processor uses it:
//!
//! - [`datasource`]: the read-only node handle contract and a `roxmltree` adapter
//! - [`xpath31`]: XDM values, collations, the `array:`/`map:` libraries and the JSON bridge
//! - [`xslt`]: `xsl:sort` over node sequences and groups
//! - [`resource`]: resource providers backing `fn:json-doc`
//!
//! The most common types are re-exported at the crate root.

pub use xylem_datasource as datasource;
pub use xylem_resource as resource;
pub use xylem_traits as traits;
pub use xylem_xpath31 as xpath31;
pub use xylem_xslt as xslt;

pub use xylem_datasource::{DataSourceNode, NodeType, QName, XmlDocument, XmlNode};
pub use xylem_resource::{FilesystemResourceProvider, InMemoryResourceProvider};
pub use xylem_traits::{ResourceError, ResourceProvider};
pub use xylem_xpath31::functions::json::{JsonXmlDocument, json_to_xml};
pub use xylem_xpath31::{
    AtomicValue, CollationRegistry, EvaluationContext, Evaluator, Expression, Focus,
    XPath31Error, XdmArray, XdmFunction, XdmItem, XdmMap, XdmValue, call_function,
};
pub use xylem_xslt::{CaseOrder, Group, SortError, SortKeySpec, sort_groups, sort_nodes};
