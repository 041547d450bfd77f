use std::fmt;
use std::sync::Arc;

/// A compiled expression owned by the host engine.
///
/// This crate never inspects an expression; it only hands it back to the
/// [`Evaluator`](crate::context::Evaluator) together with a focus. The source
/// text is kept for diagnostics and as a lookup key for hosts that compile
/// lazily.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    source: Arc<str>,
}

impl Expression {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl From<&str> for Expression {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
