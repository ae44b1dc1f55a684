//! Semantic types and typers.
//!
//! A [`Typer`] maps the opaque [`TypeHint`]s a frontend attaches to IR nodes
//! to semantic [`Type`]s. Types are plain values; equal types denote the
//! same type, which is what lets the model share one domain per type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::consteval::{ConstEvalError, ConstEvaluator};
use crate::ir::{Expr, TypeHint};

/// A semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Boolean,
    /// Integers in `[min, max]`.
    Int { min: i64, max: i64 },
    /// Enumeration over the given literals, in declaration order.
    Enum { name: Arc<str>, literals: Vec<Arc<str>> },
    /// Access (pointer) type; its values are `null` or `valid`.
    Access { name: Arc<str> },
}

impl Type {
    pub fn int(min: i64, max: i64) -> Self {
        Type::Int { min, max }
    }

    pub fn enumeration(name: &str, literals: &[&str]) -> Self {
        Type::Enum {
            name: Arc::from(name),
            literals: literals.iter().map(|&l| Arc::from(l)).collect(),
        }
    }

    pub fn access(name: &str) -> Self {
        Type::Access { name: Arc::from(name) }
    }

    /// Integer type whose bounds are given by two static expressions.
    ///
    /// Bounds that do not fit in an `i64` are clamped to `i64` limits.
    pub fn int_range(lo: &Expr, hi: &Expr) -> Result<Type, ConstEvalError> {
        let mut ev = ConstEvaluator::new();
        let min = ev.eval_int(lo)?;
        let max = ev.eval_int(hi)?;
        let clamp = |v: num_bigint::BigInt, default: i64| i64::try_from(v).unwrap_or(default);
        Ok(Type::Int {
            min: clamp(min, i64::MIN),
            max: clamp(max, i64::MAX),
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "bool"),
            Type::Int { min, max } => write!(f, "range {} .. {}", min, max),
            Type::Enum { name, .. } => write!(f, "enum {}", name),
            Type::Access { name } => write!(f, "access {}", name),
        }
    }
}

/// Maps type hints to semantic types.
///
/// Returning `None` means the node is untyped: it is not part of the model.
pub trait Typer {
    fn from_hint(&self, hint: &TypeHint) -> Option<Type>;
}

impl<F> Typer for F
where
    F: Fn(&TypeHint) -> Option<Type>,
{
    fn from_hint(&self, hint: &TypeHint) -> Option<Type> {
        self(hint)
    }
}

/// A typer backed by an explicit hint registry.
#[derive(Debug, Clone, Default)]
pub struct HintTyper {
    types: HashMap<TypeHint, Type>,
}

impl HintTyper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hint` as denoting `ty`.
    pub fn with(mut self, hint: &str, ty: Type) -> Self {
        self.insert(hint, ty);
        self
    }

    pub fn insert(&mut self, hint: &str, ty: Type) {
        self.types.insert(TypeHint::from(hint), ty);
    }
}

impl Typer for HintTyper {
    fn from_hint(&self, hint: &TypeHint) -> Option<Type> {
        self.types.get(hint).cloned()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::ir::{BinOp, ProgramBuilder};

    #[test]
    fn test_hint_typer() {
        let typer = HintTyper::new().with("bool", Type::Boolean).with("int", Type::int(-5, 5));
        assert_eq!(typer.from_hint(&TypeHint::from("int")), Some(Type::int(-5, 5)));
        assert_eq!(typer.from_hint(&TypeHint::from("float")), None);
    }

    #[test]
    fn test_closure_typer() {
        let typer = |hint: &TypeHint| (hint.as_str() == "bool").then_some(Type::Boolean);
        assert_eq!(typer.from_hint(&TypeHint::from("bool")), Some(Type::Boolean));
        assert_eq!(typer.from_hint(&TypeHint::from("int")), None);
    }

    #[test]
    fn test_int_range() {
        let mut b = ProgramBuilder::new("p");
        let lo = b.lit("0", "int");
        let two = b.lit("2", "int");
        let eight = b.lit("8", "int");
        let hi = b.binary(two, BinOp::Mul, eight, "int");
        assert_eq!(Type::int_range(&lo, &hi), Ok(Type::int(0, 16)));

        let x = b.var("x", "int");
        let xe = b.ident(&x);
        assert!(Type::int_range(&lo, &xe).is_err());
    }
}
