//! Static evaluation of constant expressions.
//!
//! Frontends and typers sometimes need the *concrete* value of an expression
//! that does not depend on any variable: the bounds of an integer range type,
//! the value of a static discriminant, and so on. [`ConstEvaluator`] folds
//! such expressions with arbitrary-precision integers, so bounds of 64-bit
//! types never overflow while being computed.
//!
//! Reaching an identifier yields [`ConstEvalError::NotConstant`], which is a
//! recoverable signal: the caller falls back to the abstract machinery.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::ir::{BinOp, Expr, ExprKind, UnOp};
use crate::types::ExprId;

/// A concrete constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Int(BigInt),
    Bool(bool),
    /// Any other literal (enumerator name, `null`, ...), kept by its spelling.
    Sym(Arc<str>),
}

impl ConstValue {
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            ConstValue::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parses the textual representation of a literal.
    pub fn parse(text: &str) -> ConstValue {
        match text {
            "true" => ConstValue::Bool(true),
            "false" => ConstValue::Bool(false),
            _ => match text.parse::<BigInt>() {
                Ok(i) => ConstValue::Int(i),
                Err(_) => ConstValue::Sym(Arc::from(text)),
            },
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Sym(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstEvalError {
    /// The expression depends on a variable.
    NotConstant { expr: String },
    /// The expression is constant but cannot be folded (operand kinds mismatch, ...).
    Unsupported { expr: String, reason: &'static str },
}

impl fmt::Display for ConstEvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstEvalError::NotConstant { expr } => write!(f, "'{}' is not a constant expression", expr),
            ConstEvalError::Unsupported { expr, reason } => {
                write!(f, "Cannot evaluate '{}' statically: {}", expr, reason)
            }
        }
    }
}

impl std::error::Error for ConstEvalError {}

/// Memoizing constant-expression evaluator.
///
/// Results (including failures) are cached per [`ExprId`] for the lifetime
/// of the evaluator, which should not outlive the program it evaluates.
#[derive(Debug, Default)]
pub struct ConstEvaluator {
    cache: HashMap<ExprId, Result<ConstValue, ConstEvalError>>,
}

impl ConstEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<ConstValue, ConstEvalError> {
        if let Some(res) = self.cache.get(&expr.id) {
            return res.clone();
        }
        let res = self.eval_uncached(expr);
        self.cache.insert(expr.id, res.clone());
        res
    }

    /// Evaluates `expr` to an integer.
    pub fn eval_int(&mut self, expr: &Expr) -> Result<BigInt, ConstEvalError> {
        match self.eval(expr)? {
            ConstValue::Int(i) => Ok(i),
            _ => Err(unsupported(expr, "not an integer")),
        }
    }

    fn eval_uncached(&mut self, expr: &Expr) -> Result<ConstValue, ConstEvalError> {
        match &expr.kind {
            ExprKind::Ident(_) => Err(ConstEvalError::NotConstant { expr: expr.to_string() }),
            ExprKind::Lit(text) => Ok(ConstValue::parse(text)),
            ExprKind::Unary { op, operand } => {
                let v = self.eval(operand)?;
                match (op, v) {
                    (UnOp::Not, ConstValue::Bool(b)) => Ok(ConstValue::Bool(!b)),
                    (UnOp::Neg, ConstValue::Int(i)) => Ok(ConstValue::Int(-i)),
                    _ => Err(unsupported(expr, "operand kind mismatch")),
                }
            }
            ExprKind::Binary { lhs, op, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                fold_binary(*op, l, r).ok_or_else(|| unsupported(expr, "operand kind mismatch"))
            }
        }
    }
}

fn unsupported(expr: &Expr, reason: &'static str) -> ConstEvalError {
    ConstEvalError::Unsupported {
        expr: expr.to_string(),
        reason,
    }
}

fn fold_binary(op: BinOp, l: ConstValue, r: ConstValue) -> Option<ConstValue> {
    use ConstValue::*;

    let res = match (op, l, r) {
        (BinOp::Eq, l, r) => Bool(l == r),
        (BinOp::Neq, l, r) => Bool(l != r),
        (BinOp::And, Bool(a), Bool(b)) => Bool(a && b),
        (BinOp::Or, Bool(a), Bool(b)) => Bool(a || b),
        (BinOp::Lt, Int(a), Int(b)) => Bool(a < b),
        (BinOp::Le, Int(a), Int(b)) => Bool(a <= b),
        (BinOp::Gt, Int(a), Int(b)) => Bool(a > b),
        (BinOp::Ge, Int(a), Int(b)) => Bool(a >= b),
        (BinOp::Add, Int(a), Int(b)) => Int(a + b),
        (BinOp::Sub, Int(a), Int(b)) => Int(a - b),
        (BinOp::Mul, Int(a), Int(b)) => Int(a * b),
        _ => return None,
    };
    Some(res)
}
