//! `xsl:sort` for an XSLT 3.0 processor.
//!
//! The transformation engine hands over a node sequence or the groups built
//! by `xsl:for-each-group`, together with the `xsl:sort` specifications; this
//! crate evaluates each sort key once per item through the engine's
//! [`Evaluator`](xylem_xpath31::Evaluator) and returns the items in sorted
//! order. The sort is stable; full ties fall back to document order.

pub mod error;
pub mod sort_key;
pub mod sorter;

pub use error::SortError;
pub use sort_key::{CaseOrder, SortDataType, SortKeySpec, SortOrder};
pub use sorter::{Group, NodeSorter, SortRecord, sort_groups, sort_nodes};
