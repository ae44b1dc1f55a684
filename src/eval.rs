//! Forward abstract evaluation of expressions.

use crate::env::Env;
use crate::ir::{Expr, ExprKind};
use crate::model::{Model, ModelEntry};
use crate::value::Value;

/// Evaluates expressions in abstract environments.
///
/// The evaluator must only be used on expressions whose every node has a
/// meaning in the model, in environments binding every variable they read.
/// The fixpoint engine checks this once for the whole program before
/// running; a violation here is a bug in the caller and panics.
#[derive(Debug, Clone, Copy)]
pub struct ExprEvaluator<'m> {
    model: &'m Model,
}

impl<'m> ExprEvaluator<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    pub fn eval(&self, expr: &Expr, env: &Env) -> Value {
        match (&expr.kind, self.model.entry(expr)) {
            (ExprKind::Ident(ident), _) => match env.get(ident.var) {
                Some(value) => *value,
                None => panic!("Variable '{}' is not bound in the environment", ident),
            },
            (ExprKind::Lit(_), Some(ModelEntry::Lit { value, .. })) => *value,
            (ExprKind::Unary { operand, .. }, Some(ModelEntry::Op { definition, .. })) => {
                let x = self.eval(operand, env);
                definition(&[x])
            }
            (ExprKind::Binary { lhs, rhs, .. }, Some(ModelEntry::Op { definition, .. })) => {
                let l = self.eval(lhs, env);
                let r = self.eval(rhs, env);
                definition(&[l, r])
            }
            _ => panic!("Expression '{}' ({}) has no meaning in the model", expr, expr.id),
        }
    }
}
