//! Forward and inverse semantics of the standard operations.
//!
//! Forward semantics compute the abstract result of an operation from the
//! abstract values of its operands. Inverse semantics go the other way:
//! given the expected result and the current operand values, they compute
//! operand values restricted to those that may produce the expected result.
//!
//! Every inverse is an over-approximation: it may keep operand values that
//! cannot produce the expected result, but never drops one that can. It
//! returns `None` only when no operand value can produce the expected
//! result, in which case the condition being solved is infeasible.
//!
//! Integer results are clamped to the range of the result domain.

use std::sync::Arc;

use crate::boolean::BoolSet;
use crate::finite::ElemSet;
use crate::interp::{Definition, Inverse, SemanticsProvider, Signature};
use crate::interval::Interval;
use crate::ir::{BinOp, Op, UnOp};
use crate::value::{Domain, Value};

/// Semantics of the standard operations over booleans, bounded integers and
/// finite (enumeration and access) domains.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSemantics;

/// Narrows a pair of operands to the values satisfying some relation.
type Narrowing<T> = fn(T, T) -> Option<(T, T)>;

#[derive(Debug, Clone, Copy)]
enum Shape {
    Bool,
    Int,
    Set,
}

fn shape(domain: &Domain) -> Shape {
    match domain {
        Domain::Boolean(_) => Shape::Bool,
        Domain::Interval(_) => Shape::Int,
        Domain::Finite(_) => Shape::Set,
    }
}

impl SemanticsProvider for StandardSemantics {
    fn definition(&self, op: Op, signature: &Signature) -> Option<Definition> {
        let operands: Vec<Shape> = signature.operands.iter().map(|d| shape(d)).collect();
        let result = &*signature.result;

        let def: Definition = match (op, operands.as_slice(), result) {
            (Op::Unary(UnOp::Not), [Shape::Bool], Domain::Boolean(_)) => {
                Arc::new(|args: &[Value]| Value::Bool(bools(&args[0]).map(|b| !b)))
            }
            (Op::Unary(UnOp::Neg), [Shape::Int], Domain::Interval(d)) => {
                let d = d.clone();
                Arc::new(move |args: &[Value]| Value::Int(d.clamp(&ints(&args[0]).neg())))
            }
            (Op::Binary(op), [Shape::Bool, Shape::Bool], Domain::Boolean(_)) => {
                let f = bool_op(op)?;
                Arc::new(move |args: &[Value]| Value::Bool(lift_bool(f, bools(&args[0]), bools(&args[1]))))
            }
            (Op::Binary(op), [Shape::Int, Shape::Int], Domain::Interval(d)) => {
                let f = int_arith(op)?;
                let d = d.clone();
                Arc::new(move |args: &[Value]| Value::Int(d.clamp(&f(&ints(&args[0]), &ints(&args[1])))))
            }
            (Op::Binary(op), [Shape::Int, Shape::Int], Domain::Boolean(_)) => {
                let f = int_compare(op)?;
                Arc::new(move |args: &[Value]| Value::Bool(f(ints(&args[0]), ints(&args[1]))))
            }
            (Op::Binary(op), [Shape::Set, Shape::Set], Domain::Boolean(_)) => {
                let f = set_compare(op)?;
                Arc::new(move |args: &[Value]| Value::Bool(f(sets(&args[0]), sets(&args[1]))))
            }
            _ => return None,
        };
        Some(def)
    }

    fn inverse(&self, op: Op, signature: &Signature) -> Option<Inverse> {
        let operands: Vec<Shape> = signature.operands.iter().map(|d| shape(d)).collect();
        let result = &*signature.result;

        let inv: Inverse = match (op, operands.as_slice(), result) {
            (Op::Unary(UnOp::Not), [Shape::Bool], Domain::Boolean(_)) => Arc::new(|expected: &Value, args: &[Value]| {
                let x = bools(&args[0]).intersect(bools(expected).map(|b| !b));
                (!x.is_empty()).then(|| vec![Value::Bool(x)])
            }),
            (Op::Unary(UnOp::Neg), [Shape::Int], Domain::Interval(_)) => Arc::new(|expected: &Value, args: &[Value]| {
                let x = ints(&args[0]).meet(&ints(expected).neg());
                (!x.is_empty()).then(|| vec![Value::Int(x)])
            }),
            (Op::Binary(op), [Shape::Bool, Shape::Bool], Domain::Boolean(_)) => {
                let f = bool_op(op)?;
                Arc::new(move |expected: &Value, args: &[Value]| {
                    let (l, r) = invert_bool(f, bools(expected), bools(&args[0]), bools(&args[1]))?;
                    Some(vec![Value::Bool(l), Value::Bool(r)])
                })
            }
            (Op::Binary(op), [Shape::Int, Shape::Int], Domain::Interval(_)) => {
                let f = int_arith_inverse(op)?;
                Arc::new(move |expected: &Value, args: &[Value]| {
                    let (l, r) = f(ints(expected), ints(&args[0]), ints(&args[1]))?;
                    Some(vec![Value::Int(l), Value::Int(r)])
                })
            }
            (Op::Binary(op), [Shape::Int, Shape::Int], Domain::Boolean(_)) => {
                let (when_true, when_false) = int_compare_cases(op)?;
                Arc::new(move |expected: &Value, args: &[Value]| {
                    let (l, r) = invert_relation(
                        bools(expected),
                        (ints(&args[0]), ints(&args[1])),
                        when_true,
                        when_false,
                        |(a, b), (c, d)| (a.join(&c), b.join(&d)),
                    )?;
                    Some(vec![Value::Int(l), Value::Int(r)])
                })
            }
            (Op::Binary(op), [Shape::Set, Shape::Set], Domain::Boolean(_)) => {
                let (when_true, when_false) = set_compare_cases(op)?;
                Arc::new(move |expected: &Value, args: &[Value]| {
                    let (l, r) = invert_relation(
                        bools(expected),
                        (sets(&args[0]), sets(&args[1])),
                        when_true,
                        when_false,
                        |(a, b), (c, d)| (a.union(c), b.union(d)),
                    )?;
                    Some(vec![Value::Set(l), Value::Set(r)])
                })
            }
            _ => return None,
        };
        Some(inv)
    }
}

fn bools(v: &Value) -> BoolSet {
    match v {
        Value::Bool(b) => *b,
        _ => panic!("Expected a boolean value, got {}", v),
    }
}

fn ints(v: &Value) -> Interval {
    match v {
        Value::Int(i) => *i,
        _ => panic!("Expected an integer value, got {}", v),
    }
}

fn sets(v: &Value) -> ElemSet {
    match v {
        Value::Set(s) => *s,
        _ => panic!("Expected a finite set value, got {}", v),
    }
}

// Booleans.

fn bool_op(op: BinOp) -> Option<fn(bool, bool) -> bool> {
    let f: fn(bool, bool) -> bool = match op {
        BinOp::And => |a: bool, b: bool| a && b,
        BinOp::Or => |a: bool, b: bool| a || b,
        BinOp::Eq => |a: bool, b: bool| a == b,
        BinOp::Neq => |a: bool, b: bool| a != b,
        _ => return None,
    };
    Some(f)
}

fn lift_bool(f: fn(bool, bool) -> bool, l: BoolSet, r: BoolSet) -> BoolSet {
    l.iter().flat_map(|a| r.iter().map(move |b| f(a, b))).collect()
}

/// Keeps the operand values that take part in a pair producing an expected result.
fn invert_bool(f: fn(bool, bool) -> bool, expected: BoolSet, l: BoolSet, r: BoolSet) -> Option<(BoolSet, BoolSet)> {
    let mut res = (BoolSet::EMPTY, BoolSet::EMPTY);
    for a in l.iter() {
        for b in r.iter() {
            if expected.contains(f(a, b)) {
                res.0 = res.0.union(BoolSet::of(a));
                res.1 = res.1.union(BoolSet::of(b));
            }
        }
    }
    (!res.0.is_empty()).then_some(res)
}

/// Combines the narrowings of the `true` and `false` outcomes of a relation.
fn invert_relation<T: Copy>(
    expected: BoolSet,
    operands: (T, T),
    when_true: Narrowing<T>,
    when_false: Narrowing<T>,
    join: impl Fn((T, T), (T, T)) -> (T, T),
) -> Option<(T, T)> {
    let (l, r) = operands;
    let t = if expected.contains(true) { when_true(l, r) } else { None };
    let f = if expected.contains(false) { when_false(l, r) } else { None };
    match (t, f) {
        (Some(t), Some(f)) => Some(join(t, f)),
        (t, f) => t.or(f),
    }
}

// Integers.

fn int_arith(op: BinOp) -> Option<fn(&Interval, &Interval) -> Interval> {
    let f: fn(&Interval, &Interval) -> Interval = match op {
        BinOp::Add => Interval::add,
        BinOp::Sub => Interval::sub,
        BinOp::Mul => Interval::mul,
        _ => return None,
    };
    Some(f)
}

type ArithInverse = fn(Interval, Interval, Interval) -> Option<(Interval, Interval)>;

fn int_arith_inverse(op: BinOp) -> Option<ArithInverse> {
    let f: ArithInverse = match op {
        // l + r = e  =>  l = e - r, r = e - l
        BinOp::Add => |e: Interval, l: Interval, r: Interval| nonempty(l.meet(&e.sub(&r)), r.meet(&e.sub(&l))),
        // l - r = e  =>  l = e + r, r = l - e
        BinOp::Sub => |e: Interval, l: Interval, r: Interval| nonempty(l.meet(&e.add(&r)), r.meet(&l.sub(&e))),
        // Intervals are not closed under division: only check feasibility.
        BinOp::Mul => |e: Interval, l: Interval, r: Interval| {
            if e.meet(&l.mul(&r)).is_empty() {
                None
            } else {
                nonempty(l, r)
            }
        },
        _ => return None,
    };
    Some(f)
}

fn nonempty(l: Interval, r: Interval) -> Option<(Interval, Interval)> {
    (!l.is_empty() && !r.is_empty()).then_some((l, r))
}

fn from_flags(may_be_true: bool, may_be_false: bool) -> BoolSet {
    let mut res = BoolSet::EMPTY;
    if may_be_true {
        res = res.union(BoolSet::TRUE);
    }
    if may_be_false {
        res = res.union(BoolSet::FALSE);
    }
    res
}

fn int_compare(op: BinOp) -> Option<fn(Interval, Interval) -> BoolSet> {
    let f: fn(Interval, Interval) -> BoolSet = match op {
        BinOp::Lt => lt,
        BinOp::Le => le,
        BinOp::Gt => |l: Interval, r: Interval| lt(r, l),
        BinOp::Ge => |l: Interval, r: Interval| le(r, l),
        BinOp::Eq => eq_int,
        BinOp::Neq => |l: Interval, r: Interval| eq_int(l, r).map(|b| !b),
        _ => return None,
    };
    Some(f)
}

fn lt(l: Interval, r: Interval) -> BoolSet {
    match (l.bounds(), r.bounds()) {
        (Some((l1, h1)), Some((l2, h2))) => from_flags(l1 < h2, h1 >= l2),
        _ => BoolSet::EMPTY,
    }
}

fn le(l: Interval, r: Interval) -> BoolSet {
    match (l.bounds(), r.bounds()) {
        (Some((l1, h1)), Some((l2, h2))) => from_flags(l1 <= h2, h1 > l2),
        _ => BoolSet::EMPTY,
    }
}

fn eq_int(l: Interval, r: Interval) -> BoolSet {
    if l.is_empty() || r.is_empty() {
        return BoolSet::EMPTY;
    }
    let same_constant = l.as_constant().is_some() && l == r;
    from_flags(!l.meet(&r).is_empty(), !same_constant)
}

fn int_compare_cases(op: BinOp) -> Option<(Narrowing<Interval>, Narrowing<Interval>)> {
    let cases: (Narrowing<Interval>, Narrowing<Interval>) = match op {
        BinOp::Lt => (narrow_lt, narrow_ge),
        BinOp::Le => (narrow_le, narrow_gt),
        BinOp::Gt => (narrow_gt, narrow_le),
        BinOp::Ge => (narrow_ge, narrow_lt),
        BinOp::Eq => (narrow_eq, narrow_neq),
        BinOp::Neq => (narrow_neq, narrow_eq),
        _ => return None,
    };
    Some(cases)
}

fn narrow_lt(l: Interval, r: Interval) -> Option<(Interval, Interval)> {
    let (_, rh) = r.bounds()?;
    let (ll, _) = l.bounds()?;
    nonempty(
        l.meet(&Interval::at_most(rh.saturating_sub(1))),
        r.meet(&Interval::at_least(ll.saturating_add(1))),
    )
}

fn narrow_le(l: Interval, r: Interval) -> Option<(Interval, Interval)> {
    let (_, rh) = r.bounds()?;
    let (ll, _) = l.bounds()?;
    nonempty(l.meet(&Interval::at_most(rh)), r.meet(&Interval::at_least(ll)))
}

fn narrow_gt(l: Interval, r: Interval) -> Option<(Interval, Interval)> {
    narrow_lt(r, l).map(|(r, l)| (l, r))
}

fn narrow_ge(l: Interval, r: Interval) -> Option<(Interval, Interval)> {
    narrow_le(r, l).map(|(r, l)| (l, r))
}

fn narrow_eq(l: Interval, r: Interval) -> Option<(Interval, Interval)> {
    let m = l.meet(&r);
    nonempty(m, m)
}

fn narrow_neq(l: Interval, r: Interval) -> Option<(Interval, Interval)> {
    let l2 = r.as_constant().map_or(l, |c| l.remove_end(c));
    let r2 = l.as_constant().map_or(r, |c| r.remove_end(c));
    nonempty(l2, r2)
}

// Finite domains.

fn set_compare(op: BinOp) -> Option<fn(ElemSet, ElemSet) -> BoolSet> {
    let f: fn(ElemSet, ElemSet) -> BoolSet = match op {
        BinOp::Eq => eq_set,
        BinOp::Neq => |l: ElemSet, r: ElemSet| eq_set(l, r).map(|b| !b),
        _ => return None,
    };
    Some(f)
}

fn eq_set(l: ElemSet, r: ElemSet) -> BoolSet {
    if l.is_empty() || r.is_empty() {
        return BoolSet::EMPTY;
    }
    let same_singleton = l.len() == 1 && l == r;
    from_flags(!l.intersect(r).is_empty(), !same_singleton)
}

fn set_compare_cases(op: BinOp) -> Option<(Narrowing<ElemSet>, Narrowing<ElemSet>)> {
    let cases: (Narrowing<ElemSet>, Narrowing<ElemSet>) = match op {
        BinOp::Eq => (narrow_eq_set, narrow_neq_set),
        BinOp::Neq => (narrow_neq_set, narrow_eq_set),
        _ => return None,
    };
    Some(cases)
}

fn nonempty_sets(l: ElemSet, r: ElemSet) -> Option<(ElemSet, ElemSet)> {
    (!l.is_empty() && !r.is_empty()).then_some((l, r))
}

fn narrow_eq_set(l: ElemSet, r: ElemSet) -> Option<(ElemSet, ElemSet)> {
    let m = l.intersect(r);
    nonempty_sets(m, m)
}

fn narrow_neq_set(l: ElemSet, r: ElemSet) -> Option<(ElemSet, ElemSet)> {
    let l2 = if r.len() == 1 { l.difference(r) } else { l };
    let r2 = if l.len() == 1 { r.difference(l) } else { r };
    nonempty_sets(l2, r2)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::value::DomainRef;

    fn int(min: i64, max: i64) -> DomainRef {
        Arc::new(Domain::interval(min, max))
    }

    fn boolean() -> DomainRef {
        Arc::new(Domain::boolean())
    }

    fn iv(l: i64, h: i64) -> Value {
        Value::Int(Interval::new(l, h))
    }

    fn sig(operands: Vec<DomainRef>, result: DomainRef) -> Signature {
        Signature { operands, result }
    }

    #[test]
    fn test_comparison_forward() {
        let s = sig(vec![int(-5, 5), int(-5, 5)], boolean());
        let gt = StandardSemantics.definition(Op::Binary(BinOp::Gt), &s).unwrap();
        assert_eq!(gt(&[iv(3, 3), iv(0, 0)]), Value::Bool(BoolSet::TRUE));
        assert_eq!(gt(&[iv(-5, 5), iv(0, 0)]), Value::Bool(BoolSet::BOTH));
        assert_eq!(gt(&[iv(-5, 0), iv(0, 0)]), Value::Bool(BoolSet::FALSE));
        assert_eq!(gt(&[Value::Int(Interval::empty()), iv(0, 0)]), Value::Bool(BoolSet::EMPTY));
    }

    #[test]
    fn test_comparison_inverse() {
        let s = sig(vec![int(-5, 5), int(-5, 5)], boolean());
        let gt = StandardSemantics.inverse(Op::Binary(BinOp::Gt), &s).unwrap();

        let t = Value::Bool(BoolSet::TRUE);
        let f = Value::Bool(BoolSet::FALSE);
        assert_eq!(gt(&t, &[iv(-5, 5), iv(0, 0)]), Some(vec![iv(1, 5), iv(0, 0)]));
        assert_eq!(gt(&f, &[iv(-5, 5), iv(0, 0)]), Some(vec![iv(-5, 0), iv(0, 0)]));
        assert_eq!(gt(&t, &[iv(-5, 0), iv(0, 0)]), None);
        assert_eq!(
            gt(&Value::Bool(BoolSet::BOTH), &[iv(-5, 5), iv(0, 0)]),
            Some(vec![iv(-5, 5), iv(0, 0)])
        );
    }

    #[test]
    fn test_equality_inverse() {
        let s = sig(vec![int(0, 10), int(0, 10)], boolean());
        let eq = StandardSemantics.inverse(Op::Binary(BinOp::Eq), &s).unwrap();
        let t = Value::Bool(BoolSet::TRUE);
        let f = Value::Bool(BoolSet::FALSE);

        assert_eq!(eq(&t, &[iv(0, 5), iv(3, 8)]), Some(vec![iv(3, 5), iv(3, 5)]));
        assert_eq!(eq(&f, &[iv(0, 5), iv(0, 0)]), Some(vec![iv(1, 5), iv(0, 0)]));
        assert_eq!(eq(&f, &[iv(2, 2), iv(2, 2)]), None);
        assert_eq!(eq(&t, &[iv(0, 1), iv(4, 5)]), None);
    }

    #[test]
    fn test_arithmetic() {
        let d = int(-5, 5);
        let s = sig(vec![d.clone(), d.clone()], d);
        let sub = StandardSemantics.definition(Op::Binary(BinOp::Sub), &s).unwrap();
        assert_eq!(sub(&[iv(3, 3), iv(1, 1)]), iv(2, 2));
        // Clamped to the result range.
        let add = StandardSemantics.definition(Op::Binary(BinOp::Add), &s).unwrap();
        assert_eq!(add(&[iv(4, 5), iv(4, 5)]), Value::Int(Interval::empty()));
        assert_eq!(add(&[iv(0, 5), iv(4, 5)]), iv(4, 5));

        let add_inv = StandardSemantics.inverse(Op::Binary(BinOp::Add), &s).unwrap();
        assert_eq!(add_inv(&iv(0, 0), &[iv(-5, 5), iv(2, 2)]), Some(vec![iv(-2, -2), iv(2, 2)]));
        let sub_inv = StandardSemantics.inverse(Op::Binary(BinOp::Sub), &s).unwrap();
        assert_eq!(sub_inv(&iv(0, 0), &[iv(-5, 5), iv(1, 1)]), Some(vec![iv(1, 1), iv(1, 1)]));
        let mul_inv = StandardSemantics.inverse(Op::Binary(BinOp::Mul), &s).unwrap();
        assert_eq!(mul_inv(&iv(5, 5), &[iv(0, 1), iv(0, 2)]), None);
    }

    #[test]
    fn test_boolean_inverse() {
        let b = boolean();
        let s = sig(vec![b.clone(), b.clone()], b.clone());
        let and = StandardSemantics.inverse(Op::Binary(BinOp::And), &s).unwrap();
        let both = Value::Bool(BoolSet::BOTH);
        assert_eq!(
            and(&Value::Bool(BoolSet::TRUE), &[both, both]),
            Some(vec![Value::Bool(BoolSet::TRUE), Value::Bool(BoolSet::TRUE)])
        );

        let not = StandardSemantics.inverse(Op::Unary(UnOp::Not), &sig(vec![b.clone()], b)).unwrap();
        assert_eq!(
            not(&Value::Bool(BoolSet::TRUE), &[Value::Bool(BoolSet::TRUE)]),
            None
        );
    }

    #[test]
    fn test_finite_equality() {
        let d: DomainRef = Arc::new(Domain::finite("Tag", &["A", "B", "C"]));
        let s = sig(vec![d.clone(), d.clone()], boolean());
        let eq = StandardSemantics.definition(Op::Binary(BinOp::Eq), &s).unwrap();
        let eq_inv = StandardSemantics.inverse(Op::Binary(BinOp::Eq), &s).unwrap();

        let all = Value::Set(ElemSet::full(3));
        let a = Value::Set(ElemSet::singleton(0));
        assert_eq!(eq(&[all, a]), Value::Bool(BoolSet::BOTH));
        assert_eq!(eq(&[a, a]), Value::Bool(BoolSet::TRUE));

        let not_a = Value::Set(ElemSet::singleton(1).union(ElemSet::singleton(2)));
        assert_eq!(eq_inv(&Value::Bool(BoolSet::FALSE), &[all, a]), Some(vec![not_a, a]));
        assert_eq!(eq_inv(&Value::Bool(BoolSet::TRUE), &[all, a]), Some(vec![a, a]));
    }

    #[test]
    fn test_unsupported_signature() {
        let s = sig(vec![boolean(), int(0, 1)], boolean());
        assert!(StandardSemantics.definition(Op::Binary(BinOp::And), &s).is_none());
        assert!(StandardSemantics.inverse(Op::Binary(BinOp::Lt), &s).is_none());
    }
}
