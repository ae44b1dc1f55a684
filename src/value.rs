//! Dynamic abstract values and domains.
//!
//! Program variables of different types live side by side in one
//! environment, so the engine manipulates abstract values through two
//! closed sum types: [`Domain`] (which lattice) and [`Value`] (an element of
//! it). `Domain` implements [`AbstractDomain`] by dispatching to the concrete
//! lattice; a value is only ever combined with the domain it was produced by.
//!
//! Domains are shared through [`DomainRef`]s: the model hands out one
//! instance per semantic type, so every node of the same type refers to the
//! identical domain.

use std::fmt;
use std::sync::Arc;

use crate::boolean::{BoolSet, BooleanDomain};
use crate::domain::AbstractDomain;
use crate::finite::{ElemSet, FiniteDomain};
use crate::interval::{Interval, IntervalDomain};

/// Shared handle to a domain instance.
pub type DomainRef = Arc<Domain>;

/// An abstract value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(BoolSet),
    Int(Interval),
    Set(ElemSet),
}

impl Value {
    pub fn as_bools(&self) -> Option<BoolSet> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_interval(&self) -> Option<Interval> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<ElemSet> {
        match self {
            Value::Set(s) => Some(*s),
            _ => None,
        }
    }

    /// Number of concrete values represented.
    pub fn len(&self) -> u128 {
        match self {
            Value::Bool(b) => b.len() as u128,
            Value::Int(i) => i.size(),
            Value::Set(s) => s.len() as u128,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_singleton(&self) -> bool {
        self.len() == 1
    }

    /// Whether `false` is among the concrete values (only booleans can be).
    pub fn may_be_false(&self) -> bool {
        self.as_bools().is_some_and(|b| b.contains(false))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Set(s) => {
                let items: Vec<_> = s.iter().map(|i| format!("#{}", i)).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}

/// An abstract domain, chosen per semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Domain {
    Boolean(BooleanDomain),
    Interval(IntervalDomain),
    Finite(FiniteDomain),
}

macro_rules! dispatch_binary {
    ($self:ident, $a:ident, $b:ident, $method:ident) => {
        match ($self, $a, $b) {
            (Domain::Boolean(d), Value::Bool(x), Value::Bool(y)) => Value::Bool(d.$method(x, y)),
            (Domain::Interval(d), Value::Int(x), Value::Int(y)) => Value::Int(d.$method(x, y)),
            (Domain::Finite(d), Value::Set(x), Value::Set(y)) => Value::Set(d.$method(x, y)),
            _ => $self.mismatch($a, $b),
        }
    };
}

impl Domain {
    pub fn boolean() -> Self {
        Domain::Boolean(BooleanDomain)
    }

    pub fn interval(min: i64, max: i64) -> Self {
        Domain::Interval(IntervalDomain::new(min, max))
    }

    pub fn finite(name: &str, literals: &[&str]) -> Self {
        Domain::Finite(FiniteDomain::new(name, literals.iter().map(|&l| Arc::from(l)).collect()))
    }

    /// Whether `value` is an element of this kind of domain.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Domain::Boolean(_), Value::Bool(_)) | (Domain::Interval(_), Value::Int(_)) | (Domain::Finite(_), Value::Set(_))
        )
    }

    /// Whether values of `source` may be stored in a variable of this domain.
    ///
    /// Integers of any range fit (they are clamped on assignment), literal
    /// sets only fit the very same enumeration.
    pub fn can_hold(&self, source: &Domain) -> bool {
        match (self, source) {
            (Domain::Boolean(_), Domain::Boolean(_)) | (Domain::Interval(_), Domain::Interval(_)) => true,
            (Domain::Finite(a), Domain::Finite(b)) => a == b,
            _ => false,
        }
    }

    /// Restricts an integer value to the range of this domain. Other values
    /// are returned as they are.
    pub fn clamp(&self, value: Value) -> Value {
        match (self, value) {
            (Domain::Interval(d), Value::Int(i)) => Value::Int(d.clamp(&i)),
            _ => value,
        }
    }

    /// Renders a value of this domain (with literal names for finite domains).
    pub fn display(&self, value: &Value) -> String {
        match (self, value) {
            (Domain::Finite(d), Value::Set(s)) => d.display(*s),
            _ => value.to_string(),
        }
    }

    fn mismatch(&self, a: &Value, b: &Value) -> ! {
        panic!("Values {} and {} are not both elements of domain {}", a, b, self)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Boolean(_) => write!(f, "bool"),
            Domain::Interval(d) => write!(f, "int[{}, {}]", d.min(), d.max()),
            Domain::Finite(d) => write!(f, "{}", d),
        }
    }
}

impl AbstractDomain for Domain {
    type Element = Value;

    fn bottom(&self) -> Self::Element {
        match self {
            Domain::Boolean(d) => Value::Bool(d.bottom()),
            Domain::Interval(d) => Value::Int(d.bottom()),
            Domain::Finite(d) => Value::Set(d.bottom()),
        }
    }

    fn top(&self) -> Self::Element {
        match self {
            Domain::Boolean(d) => Value::Bool(d.top()),
            Domain::Interval(d) => Value::Int(d.top()),
            Domain::Finite(d) => Value::Set(d.top()),
        }
    }

    fn is_bottom(&self, elem: &Self::Element) -> bool {
        elem.is_empty()
    }

    fn is_top(&self, elem: &Self::Element) -> bool {
        match (self, elem) {
            (Domain::Boolean(d), Value::Bool(x)) => d.is_top(x),
            (Domain::Interval(d), Value::Int(x)) => d.is_top(x),
            (Domain::Finite(d), Value::Set(x)) => d.is_top(x),
            _ => self.mismatch(elem, elem),
        }
    }

    fn le(&self, elem1: &Self::Element, elem2: &Self::Element) -> bool {
        match (self, elem1, elem2) {
            (Domain::Boolean(d), Value::Bool(x), Value::Bool(y)) => d.le(x, y),
            (Domain::Interval(d), Value::Int(x), Value::Int(y)) => d.le(x, y),
            (Domain::Finite(d), Value::Set(x), Value::Set(y)) => d.le(x, y),
            _ => self.mismatch(elem1, elem2),
        }
    }

    fn join(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        dispatch_binary!(self, elem1, elem2, join)
    }

    fn meet(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        dispatch_binary!(self, elem1, elem2, meet)
    }

    fn widen(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        dispatch_binary!(self, elem1, elem2, widen)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_dispatch() {
        let domain = Domain::interval(0, 10);
        let a = Value::Int(Interval::new(0, 2));
        let b = Value::Int(Interval::new(5, 6));
        assert_eq!(domain.join(&a, &b), Value::Int(Interval::new(0, 6)));
        assert!(domain.is_bottom(&domain.meet(&a, &b)));
        assert_eq!(domain.widen(&a, &b), Value::Int(Interval::new(0, 10)));
        assert!(domain.is_top(&domain.top()));
    }

    #[test]
    fn test_value_queries() {
        assert!(Value::Bool(BoolSet::BOTH).may_be_false());
        assert!(!Value::Bool(BoolSet::TRUE).may_be_false());
        assert!(Value::Bool(BoolSet::FALSE).is_singleton());
        assert!(!Value::Int(Interval::new(0, 1)).may_be_false());
        assert_eq!(Value::Int(Interval::new(-5, 5)).len(), 11);
    }

    #[test]
    fn test_display() {
        let domain = Domain::finite("Shape", &["Circle", "Square"]);
        assert_eq!(domain.to_string(), "Shape");
        assert_eq!(domain.display(&domain.top()), "{Circle, Square}");
        assert_eq!(Domain::interval(-5, 5).to_string(), "int[-5, 5]");
    }

    #[test]
    fn test_can_hold_and_clamp() {
        let small = Domain::interval(-5, 5);
        let narrow = Domain::interval(0, 10);
        let shape = Domain::finite("Shape", &["Circle", "Square"]);
        let color = Domain::finite("Color", &["Red", "Green", "Blue"]);

        assert!(narrow.can_hold(&small));
        assert!(shape.can_hold(&Domain::finite("Shape", &["Circle", "Square"])));
        assert!(!shape.can_hold(&color));
        assert!(!narrow.can_hold(&Domain::boolean()));

        assert_eq!(narrow.clamp(small.top()), Value::Int(Interval::new(0, 5)));
        assert!(narrow.clamp(Value::Int(Interval::new(-5, -1))).is_empty());
        assert_eq!(shape.clamp(shape.top()), shape.top());
    }

    #[test]
    #[should_panic(expected = "are not both elements of domain")]
    fn test_mismatch_panics() {
        let domain = Domain::boolean();
        domain.join(&Value::Bool(BoolSet::TRUE), &Value::Int(Interval::constant(1)));
    }

    #[test]
    fn test_dynamic_lattice_axioms() {
        use crate::domain::tests::test_lattice_axioms;

        let domain = Domain::interval(-5, 5);
        let samples = vec![
            domain.bottom(),
            domain.top(),
            Value::Int(Interval::new(0, 2)),
            Value::Int(Interval::new(-3, 1)),
        ];
        test_lattice_axioms(&domain, &samples);
    }
}
