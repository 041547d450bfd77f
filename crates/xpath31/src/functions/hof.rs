use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::types::{XdmFunction, XdmValue};
use xylem_datasource::DataSourceNode;

/// Calls a function item. The argument count must match the item's arity.
pub fn invoke_function<'a, N: DataSourceNode<'a>>(
    func: &XdmFunction<N>,
    args: Vec<XdmValue<N>>,
    ctx: &EvaluationContext<'_, N>,
) -> Result<XdmValue<N>, XPath31Error> {
    if args.len() != func.arity() {
        return Err(XPath31Error::arity(
            func.name().unwrap_or("anonymous function"),
            func.arity().to_string(),
            args.len(),
        ));
    }

    match func {
        XdmFunction::Builtin { name, .. } => super::call_function(name, args, ctx),
        XdmFunction::Native { func, .. } => (**func)(args),
        XdmFunction::External { name, body, .. } => {
            ctx.evaluator()?.call(name.as_deref(), body, args)
        }
        XdmFunction::Partial { base, bound_args } => {
            let mut supplied = args.into_iter();
            let full_args = bound_args
                .iter()
                .map(|bound| match bound {
                    Some(value) => value.clone(),
                    None => supplied.next().unwrap_or_default(),
                })
                .collect();
            invoke_function(base, full_args, ctx)
        }
    }
}
