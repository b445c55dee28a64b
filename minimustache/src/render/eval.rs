use crate::compiler::ast;
use crate::error::{Error, ErrorKind};
use crate::render::State;
use crate::value::Value;

/// Renders an expression back into a short name for error messages.
fn expr_name(expr: &ast::Expr<'_>) -> String {
    match expr {
        ast::Expr::ImplicitIterator(_) => ".".into(),
        ast::Expr::Var(var) => var.id.into(),
        ast::Expr::GetAttr(attr) => match attr.expr {
            ast::Expr::ImplicitIterator(_) => format!(".{}", attr.name),
            ref base => format!("{}.{}", expr_name(base), attr.name),
        },
        ast::Expr::Filter(filter) => format!("{}(...)", expr_name(&filter.filter)),
    }
}

/// Evaluates an expression against the current context stack.
///
/// Identifiers that resolve nowhere evaluate to the undefined value
/// rather than failing, so only filter application can error here.
pub(crate) fn eval(expr: &ast::Expr<'_>, state: &State<'_>) -> Result<Value, Error> {
    let value = match expr {
        ast::Expr::ImplicitIterator(_) => {
            state.ctx.top().cloned().unwrap_or(Value::UNDEFINED)
        }
        ast::Expr::Var(var) => state.lookup(var.id).unwrap_or(Value::UNDEFINED),
        ast::Expr::GetAttr(attr) => {
            let base = ok!(eval(&attr.expr, state));
            if base.is_undefined() {
                // a missing base swallows the rest of the key path
                Value::UNDEFINED
            } else {
                base.get_attr(attr.name)
            }
        }
        ast::Expr::Filter(filter) => ok!(eval_filter(filter, state)),
    };
    value.validate()
}

fn eval_filter(filter: &ast::Filter<'_>, state: &State<'_>) -> Result<Value, Error> {
    let filter_value = ok!(eval(&filter.filter, state));
    let func = match filter_value.as_filter() {
        Some(func) => func,
        None => {
            return Err(Error::new(
                ErrorKind::NotAFilter,
                if filter_value.is_undefined() {
                    format!("filter {} is unknown", expr_name(&filter.filter))
                } else {
                    format!("{} does not resolve to a filter", expr_name(&filter.filter))
                },
            ));
        }
    };
    let arg = ok!(eval(&filter.arg, state));
    let rv = ok!(func(&arg));
    if filter.partial_application && rv.as_filter().is_none() {
        return Err(Error::new(
            ErrorKind::TooManyArguments,
            format!("too many arguments for filter {}", expr_name(&filter.filter)),
        ));
    }
    Ok(rv)
}
