//! XPath 3.1 value model and function library for an XSLT processor.
//!
//! Provides the XDM sequence types, collations, the stable merge sort used
//! by `array:sort` and `xsl:sort`, the `array:` and `map:` function
//! namespaces and the JSON bridge (`fn:parse-json`, `fn:json-doc`,
//! `fn:json-to-xml`, `fn:xml-to-json`).
//!
//! # Key Types
//!
//! - [`XdmValue`]: XDM sequence value (nodes, atomics, maps, arrays, functions)
//! - [`EvaluationContext`]: services injected by the host (evaluator,
//!   collations, resource provider, base URI)
//! - [`CollationRegistry`]: collation lookup by URI
//!
//! # Example
//!
//! ```ignore
//! use xylem_xpath31::{EvaluationContext, XdmValue, functions::call_function};
//!
//! let ctx = EvaluationContext::new();
//! let parsed = call_function("fn:parse-json", vec![XdmValue::from_string("[3, 1, 2]")], &ctx)?;
//! let sorted = call_function("array:sort", vec![parsed], &ctx)?;
//! ```

pub mod collation;
pub mod compare;
pub mod context;
pub mod error;
pub mod expr;
pub mod functions;
pub mod sort;
pub mod types;

pub use collation::{Collation, CollationKey, CollationRegistry, Strength, UcaCollation};
pub use context::{EvaluationContext, Evaluator, Focus};
pub use error::{ErrorKind, XPath31Error};
pub use expr::Expression;
pub use functions::call_function;
pub use functions::hof::invoke_function;
pub use sort::{merge_sort_by, try_merge_sort_by};
pub use types::{AtomicValue, XdmArray, XdmFunction, XdmItem, XdmMap, XdmValue};

pub use xylem_datasource::{DataSourceNode, NodeType, QName};
