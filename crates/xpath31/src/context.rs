use std::fmt;
use std::sync::Arc;

use crate::collation::{Collation, CollationRegistry};
use crate::error::XPath31Error;
use crate::expr::Expression;
use crate::types::{XdmItem, XdmValue};
use xylem_traits::ResourceProvider;

/// The dynamic focus an expression is evaluated against.
#[derive(Debug, Clone)]
pub struct Focus<'f, N> {
    pub item: Option<XdmItem<N>>,
    /// 1-based context position.
    pub position: usize,
    pub size: usize,
    /// Members of the group being processed, empty outside grouping.
    pub current_group: &'f [N],
}

impl<'f, N> Focus<'f, N> {
    pub fn new(item: XdmItem<N>, position: usize, size: usize) -> Self {
        Self {
            item: Some(item),
            position,
            size,
            current_group: &[],
        }
    }

    pub fn with_group(mut self, group: &'f [N]) -> Self {
        self.current_group = group;
        self
    }

    pub fn empty() -> Self {
        Self {
            item: None,
            position: 0,
            size: 0,
            current_group: &[],
        }
    }
}

/// The host's expression engine, as seen by the function library and the
/// sorter. Only the host can parse and run XPath.
pub trait Evaluator<N> {
    fn evaluate(
        &self,
        expr: &Expression,
        focus: &Focus<'_, N>,
    ) -> Result<XdmValue<N>, XPath31Error>;

    /// Calls a function item whose body is an expression owned by the host.
    fn call(
        &self,
        name: Option<&str>,
        body: &Expression,
        _args: Vec<XdmValue<N>>,
    ) -> Result<XdmValue<N>, XPath31Error> {
        Err(XPath31Error::dynamic_error(format!(
            "cannot call {} ({}): evaluator does not support function items",
            name.unwrap_or("anonymous function"),
            body
        )))
    }
}

impl<N, F> Evaluator<N> for F
where
    F: Fn(&Expression, &Focus<'_, N>) -> Result<XdmValue<N>, XPath31Error>,
{
    fn evaluate(
        &self,
        expr: &Expression,
        focus: &Focus<'_, N>,
    ) -> Result<XdmValue<N>, XPath31Error> {
        self(expr, focus)
    }
}

/// Everything a library function may need beyond its arguments.
pub struct EvaluationContext<'c, N> {
    evaluator: Option<&'c dyn Evaluator<N>>,
    collations: Arc<CollationRegistry>,
    resources: Option<Arc<dyn ResourceProvider>>,
    base_uri: Option<String>,
}

impl<'c, N> EvaluationContext<'c, N> {
    pub fn new() -> Self {
        Self {
            evaluator: None,
            collations: Arc::new(CollationRegistry::default()),
            resources: None,
            base_uri: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: &'c dyn Evaluator<N>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_collations(mut self, collations: Arc<CollationRegistry>) -> Self {
        self.collations = collations;
        self
    }

    pub fn with_resource_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.resources = Some(provider);
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    pub fn evaluator(&self) -> Result<&'c dyn Evaluator<N>, XPath31Error> {
        self.evaluator
            .ok_or_else(|| XPath31Error::dynamic_error("no expression evaluator is configured"))
    }

    pub fn evaluate(
        &self,
        expr: &Expression,
        focus: &Focus<'_, N>,
    ) -> Result<XdmValue<N>, XPath31Error> {
        self.evaluator()?.evaluate(expr, focus)
    }

    pub fn collations(&self) -> &CollationRegistry {
        &self.collations
    }

    /// Resolves a collation URI; `None` selects the default collation.
    pub fn collation(&self, uri: Option<&str>) -> Result<Arc<dyn Collation>, XPath31Error> {
        self.collations.resolve(uri)
    }

    pub fn resource_provider(&self) -> Option<&Arc<dyn ResourceProvider>> {
        self.resources.as_ref()
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }
}

impl<N> Default for EvaluationContext<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for EvaluationContext<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("has_evaluator", &self.evaluator.is_some())
            .field("default_collation", &self.collations.default_uri())
            .field("resources", &self.resources)
            .field("base_uri", &self.base_uri)
            .finish()
    }
}
