use thiserror::Error;
use xylem_xpath31::XPath31Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SortError {
    #[error("XPath evaluation error: {0}")]
    XPath(#[from] XPath31Error),

    /// Evaluating the `select` of a sort key failed for some item.
    #[error("Sort key {key_index} could not be evaluated: {message}")]
    KeyEvaluation { key_index: usize, message: String },

    /// Groups handed to `sort_groups` need at least one member.
    #[error("Group {position} has no members")]
    EmptyGroup { position: usize },
}
