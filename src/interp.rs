//! Interpretations of semantic types.
//!
//! An [`Interpretation`] is what a [`Type`] means to the analysis: the
//! abstract domain of its values, a provider of operation semantics over
//! that domain, and a builder turning literal text into abstract values.
//! A [`TypeInterpreter`] computes interpretations; [`StandardInterpreter`]
//! covers booleans, bounded integers, enumerations and access types.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::boolean::BoolSet;
use crate::finite::MAX_LITERALS;
use crate::interval::Interval;
use crate::ir::Op;
use crate::semantics::StandardSemantics;
use crate::typer::Type;
use crate::value::{Domain, DomainRef, Value};

/// Forward semantics of an operation: operand values to result value.
pub type Definition = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Inverse semantics of an operation.
///
/// Given the expected result and the current operand values, returns the
/// operand values that can produce (part of) the expected result, or `None`
/// when no operand values can.
pub type Inverse = Arc<dyn Fn(&Value, &[Value]) -> Option<Vec<Value>> + Send + Sync>;

/// Converts the text of a literal to the singleton value it denotes.
pub type LitBuilder = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Domains of the operands and of the result of an operation.
#[derive(Debug, Clone)]
pub struct Signature {
    pub operands: Vec<DomainRef>,
    pub result: DomainRef,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands: Vec<String> = self.operands.iter().map(|d| d.to_string()).collect();
        write!(f, "({}) -> {}", operands.join(", "), self.result)
    }
}

/// Source of operation semantics for some family of signatures.
pub trait SemanticsProvider: Send + Sync {
    fn definition(&self, op: Op, signature: &Signature) -> Option<Definition>;
    fn inverse(&self, op: Op, signature: &Signature) -> Option<Inverse>;
}

#[derive(Clone)]
pub struct Interpretation {
    pub domain: DomainRef,
    pub provider: Arc<dyn SemanticsProvider>,
    pub builder: LitBuilder,
}

impl fmt::Debug for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpretation").field("domain", &self.domain).finish_non_exhaustive()
    }
}

/// Maps semantic types to interpretations.
pub trait TypeInterpreter {
    fn from_type(&self, ty: &Type) -> Option<Interpretation>;
}

impl<F> TypeInterpreter for F
where
    F: Fn(&Type) -> Option<Interpretation>,
{
    fn from_type(&self, ty: &Type) -> Option<Interpretation> {
        self(ty)
    }
}

/// Interpreter for the standard types.
///
/// All interpretations it returns share a single semantics provider.
#[derive(Clone)]
pub struct StandardInterpreter {
    semantics: Arc<dyn SemanticsProvider>,
}

impl Default for StandardInterpreter {
    fn default() -> Self {
        Self {
            semantics: Arc::new(StandardSemantics),
        }
    }
}

impl StandardInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    fn interpretation(&self, domain: Domain, builder: LitBuilder) -> Interpretation {
        Interpretation {
            domain: Arc::new(domain),
            provider: self.semantics.clone(),
            builder,
        }
    }
}

impl TypeInterpreter for StandardInterpreter {
    fn from_type(&self, ty: &Type) -> Option<Interpretation> {
        match ty {
            Type::Boolean => {
                let builder: LitBuilder = Arc::new(|text: &str| match text {
                    "true" => Some(Value::Bool(BoolSet::TRUE)),
                    "false" => Some(Value::Bool(BoolSet::FALSE)),
                    _ => None,
                });
                Some(self.interpretation(Domain::boolean(), builder))
            }
            &Type::Int { min, max } => {
                if min > max {
                    return None;
                }
                let builder: LitBuilder = Arc::new(move |text: &str| {
                    let v = text.parse::<BigInt>().ok()?;
                    let v = i64::try_from(v).ok()?;
                    (min <= v && v <= max).then(|| Value::Int(Interval::constant(v)))
                });
                Some(self.interpretation(Domain::interval(min, max), builder))
            }
            Type::Enum { name, literals } => {
                if literals.len() > MAX_LITERALS {
                    return None;
                }
                let literals: Vec<&str> = literals.iter().map(|l| &**l).collect();
                Some(self.finite(name, &literals))
            }
            Type::Access { name } => Some(self.finite(name, &["null", "valid"])),
        }
    }
}

impl StandardInterpreter {
    fn finite(&self, name: &str, literals: &[&str]) -> Interpretation {
        let domain = Domain::finite(name, literals);
        let lookup = domain.clone();
        let builder: LitBuilder = Arc::new(move |text: &str| match &lookup {
            Domain::Finite(d) => d.literal(text).map(Value::Set),
            _ => None,
        });
        self.interpretation(domain, builder)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::ir::BinOp;

    #[test]
    fn test_int_builder() {
        let interp = StandardInterpreter::new().from_type(&Type::int(-5, 5)).unwrap();
        assert_eq!((interp.builder)("3"), Some(Value::Int(Interval::constant(3))));
        assert_eq!((interp.builder)("6"), None);
        assert_eq!((interp.builder)("99999999999999999999999"), None);
        assert_eq!((interp.builder)("x"), None);
        assert_eq!(interp.domain.to_string(), "int[-5, 5]");
    }

    #[test]
    fn test_access_builder() {
        let interp = StandardInterpreter::new().from_type(&Type::access("Ptr")).unwrap();
        let null = (interp.builder)("null").unwrap();
        assert_eq!(interp.domain.display(&null), "{null}");
        assert_eq!((interp.builder)("nil"), None);
    }

    #[test]
    fn test_empty_range_has_no_interpretation() {
        assert!(StandardInterpreter::new().from_type(&Type::int(1, 0)).is_none());
    }

    #[test]
    fn test_signature_display() {
        let int: DomainRef = Arc::new(Domain::interval(0, 3));
        let sig = Signature {
            operands: vec![int.clone(), int],
            result: Arc::new(Domain::boolean()),
        };
        assert_eq!(sig.to_string(), "(int[0, 3], int[0, 3]) -> bool");

        let semantics = StandardSemantics;
        assert!(semantics.definition(Op::Binary(BinOp::Lt), &sig).is_some());
        assert!(semantics.definition(Op::Binary(BinOp::Add), &sig).is_none());
    }
}
