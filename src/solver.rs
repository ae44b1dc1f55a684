//! Backward constraint propagation through expressions.
//!
//! Given an expression and the abstract result it is expected to produce,
//! [`ExprSolver`] narrows an environment so that the expression can only
//! evaluate within the expected result. This is how `assume` statements
//! refine the state of the analysis.
//!
//! The narrowed environment over-approximates the exact solution: it never
//! loses a concrete environment in which the expression yields an expected
//! value. Conversely, an expression is reported infeasible (`None`) only
//! when no such concrete environment exists.

use crate::boolean::BoolSet;
use crate::domain::AbstractDomain;
use crate::env::Env;
use crate::eval::ExprEvaluator;
use crate::ir::{Expr, ExprKind};
use crate::model::{Model, ModelEntry};
use crate::value::Value;

#[derive(Debug, Clone, Copy)]
pub struct ExprSolver<'m> {
    model: &'m Model,
    evaluator: ExprEvaluator<'m>,
}

impl<'m> ExprSolver<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            evaluator: ExprEvaluator::new(model),
        }
    }

    /// Narrows `env` so that the predicate `expr` holds, or returns `None` if
    /// it cannot hold in any concrete environment described by `env`.
    pub fn solve(&self, expr: &Expr, env: &Env) -> Option<Env> {
        self.solve_expecting(expr, env, Value::Bool(BoolSet::TRUE))
    }

    /// Narrows `env` so that `expr` evaluates within `expected`.
    pub fn solve_expecting(&self, expr: &Expr, env: &Env, expected: Value) -> Option<Env> {
        let mut res = env.clone();
        self.refine(expr, &mut res, expected)?;
        Some(res)
    }

    fn refine(&self, expr: &Expr, env: &mut Env, expected: Value) -> Option<()> {
        let Some(entry) = self.model.entry(expr) else {
            panic!("Expression '{}' ({}) has no meaning in the model", expr, expr.id);
        };
        let domain = entry.domain();

        match &expr.kind {
            ExprKind::Ident(ident) => {
                let current = self.evaluator.eval(expr, env);
                let narrowed = domain.meet(&current, &expected);
                if domain.is_bottom(&narrowed) {
                    return None;
                }
                env.set(ident.var, narrowed);
                Some(())
            }
            ExprKind::Lit(_) => {
                let value = self.evaluator.eval(expr, env);
                (!domain.is_bottom(&domain.meet(&value, &expected))).then_some(())
            }
            ExprKind::Unary { operand, .. } => {
                let x = self.evaluator.eval(operand, env);
                let pre = self.invert(entry, &expected, &[x])?;
                self.refine(operand, env, pre[0])
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                let l = self.evaluator.eval(lhs, env);
                let r = self.evaluator.eval(rhs, env);
                let pre = self.invert(entry, &expected, &[l, r])?;
                self.refine(lhs, env, pre[0])?;
                self.refine(rhs, env, pre[1])
            }
        }
    }

    fn invert(&self, entry: &ModelEntry, expected: &Value, operands: &[Value]) -> Option<Vec<Value>> {
        match entry {
            ModelEntry::Op { inverse, .. } => {
                if operands.iter().any(Value::is_empty) {
                    return None;
                }
                let res = inverse(expected, operands)?;
                debug_assert_eq!(res.len(), operands.len());
                Some(res)
            }
            _ => panic!("Operation node has a non-operation model entry"),
        }
    }
}
