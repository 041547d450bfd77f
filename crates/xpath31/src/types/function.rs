use std::fmt;
use std::sync::Arc;

use super::XdmValue;
use crate::error::XPath31Error;
use crate::expr::Expression;

pub type NativeFn<N> = dyn Fn(Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error>;

/// A function item.
pub enum XdmFunction<N> {
    /// A function of this library, dispatched by name (`array:sort`, `fn:parse-json`, ...).
    Builtin { name: String, arity: usize },
    /// A host closure.
    Native {
        name: Option<String>,
        arity: usize,
        func: Arc<NativeFn<N>>,
    },
    /// A stylesheet or inline function whose body only the host evaluator can run.
    External {
        name: Option<String>,
        arity: usize,
        body: Expression,
    },
    /// Partial application: `None` slots are filled from the call arguments in order.
    Partial {
        base: Box<XdmFunction<N>>,
        bound_args: Vec<Option<XdmValue<N>>>,
    },
}

impl<N> XdmFunction<N> {
    pub fn builtin(name: impl Into<String>, arity: usize) -> Self {
        Self::Builtin {
            name: name.into(),
            arity,
        }
    }

    pub fn native<F>(arity: usize, func: F) -> Self
    where
        F: Fn(Vec<XdmValue<N>>) -> Result<XdmValue<N>, XPath31Error> + 'static,
    {
        Self::Native {
            name: None,
            arity,
            func: Arc::new(func),
        }
    }

    pub fn external(name: Option<String>, arity: usize, body: Expression) -> Self {
        Self::External { name, arity, body }
    }

    pub fn partial(base: XdmFunction<N>, bound_args: Vec<Option<XdmValue<N>>>) -> Self {
        Self::Partial {
            base: Box::new(base),
            bound_args,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            XdmFunction::Builtin { arity, .. }
            | XdmFunction::Native { arity, .. }
            | XdmFunction::External { arity, .. } => *arity,
            XdmFunction::Partial { bound_args, .. } => {
                bound_args.iter().filter(|a| a.is_none()).count()
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            XdmFunction::Builtin { name, .. } => Some(name),
            XdmFunction::Native { name, .. } | XdmFunction::External { name, .. } => {
                name.as_deref()
            }
            XdmFunction::Partial { base, .. } => base.name(),
        }
    }
}

impl<N: Clone> Clone for XdmFunction<N> {
    fn clone(&self) -> Self {
        match self {
            XdmFunction::Builtin { name, arity } => XdmFunction::Builtin {
                name: name.clone(),
                arity: *arity,
            },
            XdmFunction::Native { name, arity, func } => XdmFunction::Native {
                name: name.clone(),
                arity: *arity,
                func: Arc::clone(func),
            },
            XdmFunction::External { name, arity, body } => XdmFunction::External {
                name: name.clone(),
                arity: *arity,
                body: body.clone(),
            },
            XdmFunction::Partial { base, bound_args } => XdmFunction::Partial {
                base: base.clone(),
                bound_args: bound_args.clone(),
            },
        }
    }
}

impl<N> fmt::Debug for XdmFunction<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XdmFunction::Partial { base, .. } => write!(f, "partial({base:?})#{}", self.arity()),
            _ => write!(
                f,
                "{}#{}",
                self.name().unwrap_or("(anonymous)"),
                self.arity()
            ),
        }
    }
}

/// Builtins and externals compare by name and arity, closures by identity.
impl<N> PartialEq for XdmFunction<N> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                XdmFunction::Builtin { name: n1, arity: a1 },
                XdmFunction::Builtin { name: n2, arity: a2 },
            ) => n1 == n2 && a1 == a2,
            (XdmFunction::Native { func: f1, .. }, XdmFunction::Native { func: f2, .. }) => {
                Arc::ptr_eq(f1, f2)
            }
            (
                XdmFunction::External {
                    arity: a1,
                    body: b1,
                    ..
                },
                XdmFunction::External {
                    arity: a2,
                    body: b2,
                    ..
                },
            ) => a1 == a2 && b1 == b2,
            _ => false,
        }
    }
}
