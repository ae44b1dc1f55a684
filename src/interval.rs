//! Interval abstract domain over a bounded integer range.
//!
//! The interval domain tracks a lower and an upper bound for a value.
//! It's simple, efficient, but loses relational information between variables.
//!
//! Every [`IntervalDomain`] is bounded by the range of the integer type it
//! represents (e.g. `[-128, 127]`), so its top element is that range and
//! widening extrapolates unstable bounds straight to the range limits.
//! Ascending chains therefore stabilize after at most two widening steps.

use std::cmp::{max, min};
use std::fmt;

use super::domain::AbstractDomain;

/// Interval: `[low, high]`, or empty.
///
/// The empty interval has a single canonical representation, so structural
/// equality coincides with set equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    low: i64,
    high: i64,
}

impl Interval {
    const EMPTY: Interval = Interval { low: 1, high: 0 };

    pub fn new(low: i64, high: i64) -> Self {
        if low > high {
            Self::EMPTY
        } else {
            Self { low, high }
        }
    }

    pub fn constant(value: i64) -> Self {
        Self { low: value, high: value }
    }

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    /// `(low, high)`, or `None` for the empty interval.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        if self.is_empty() {
            None
        } else {
            Some((self.low, self.high))
        }
    }

    pub fn low(&self) -> Option<i64> {
        self.bounds().map(|(l, _)| l)
    }

    pub fn high(&self) -> Option<i64> {
        self.bounds().map(|(_, h)| h)
    }

    /// The single value of a singleton interval.
    pub fn as_constant(&self) -> Option<i64> {
        match self.bounds() {
            Some((l, h)) if l == h => Some(l),
            _ => None,
        }
    }

    /// Number of integers in the interval.
    pub fn size(&self) -> u128 {
        match self.bounds() {
            Some((l, h)) => (h as i128 - l as i128 + 1) as u128,
            None => 0,
        }
    }

    /// All integers `<= bound`.
    pub fn at_most(bound: i64) -> Self {
        Interval::new(i64::MIN, bound)
    }

    /// All integers `>= bound`.
    pub fn at_least(bound: i64) -> Self {
        Interval::new(bound, i64::MAX)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.low <= value && value <= self.high
    }

    pub fn is_subset(&self, other: &Interval) -> bool {
        self.is_empty() || (other.low <= self.low && self.high <= other.high)
    }

    pub fn join(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval {
            low: min(self.low, other.low),
            high: max(self.high, other.high),
        }
    }

    pub fn meet(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Interval::new(max(self.low, other.low), min(self.high, other.high))
    }

    pub fn add(&self, other: &Interval) -> Interval {
        match (self.bounds(), other.bounds()) {
            (Some((l1, h1)), Some((l2, h2))) => Interval::new(l1.saturating_add(l2), h1.saturating_add(h2)),
            _ => Self::EMPTY,
        }
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        match (self.bounds(), other.bounds()) {
            (Some((l1, h1)), Some((l2, h2))) => Interval::new(l1.saturating_sub(h2), h1.saturating_sub(l2)),
            _ => Self::EMPTY,
        }
    }

    pub fn mul(&self, other: &Interval) -> Interval {
        match (self.bounds(), other.bounds()) {
            (Some((l1, h1)), Some((l2, h2))) => {
                let corners = [
                    l1.saturating_mul(l2),
                    l1.saturating_mul(h2),
                    h1.saturating_mul(l2),
                    h1.saturating_mul(h2),
                ];
                let low = corners.iter().copied().fold(i64::MAX, min);
                let high = corners.iter().copied().fold(i64::MIN, max);
                Interval::new(low, high)
            }
            _ => Self::EMPTY,
        }
    }

    pub fn neg(&self) -> Interval {
        match self.bounds() {
            Some((l, h)) => Interval::new(h.saturating_neg(), l.saturating_neg()),
            None => Self::EMPTY,
        }
    }

    /// Removes `value` from the interval when it sits on one of its ends.
    ///
    /// Intervals cannot represent holes, so an inner value is kept.
    pub fn remove_end(&self, value: i64) -> Interval {
        match self.bounds() {
            Some((l, h)) if l == value => Interval::new(l.saturating_add(1), h),
            Some((l, h)) if h == value => Interval::new(l, h.saturating_sub(1)),
            _ => *self,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            Some((l, h)) => write!(f, "[{}, {}]", l, h),
            None => write!(f, "∅"),
        }
    }
}

/// Interval domain of the integers in `[min, max]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntervalDomain {
    min: i64,
    max: i64,
}

impl IntervalDomain {
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub fn new(min: i64, max: i64) -> Self {
        assert!(min <= max, "Empty integer range [{}, {}]", min, max);
        Self { min, max }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Restricts an interval to the range of this domain.
    pub fn clamp(&self, interval: &Interval) -> Interval {
        interval.meet(&self.top())
    }
}

impl AbstractDomain for IntervalDomain {
    type Element = Interval;

    fn bottom(&self) -> Self::Element {
        Interval::empty()
    }

    fn top(&self) -> Self::Element {
        Interval::new(self.min, self.max)
    }

    fn is_bottom(&self, elem: &Self::Element) -> bool {
        elem.is_empty()
    }

    fn is_top(&self, elem: &Self::Element) -> bool {
        self.top().is_subset(elem)
    }

    fn le(&self, elem1: &Self::Element, elem2: &Self::Element) -> bool {
        elem1.is_subset(elem2)
    }

    fn join(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        elem1.join(elem2)
    }

    fn meet(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        elem1.meet(elem2)
    }

    fn widen(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        let (Some((l1, h1)), Some((l2, h2))) = (elem1.bounds(), elem2.bounds()) else {
            return elem1.join(elem2);
        };
        let low = if l2 < l1 { min(self.min, l2) } else { l1 };
        let high = if h2 > h1 { max(self.max, h2) } else { h1 };
        Interval::new(low, high)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_interval_operations() {
        let i1 = Interval::new(0, 10);
        let i2 = Interval::new(5, 15);

        assert_eq!(i1.join(&i2), Interval::new(0, 15));
        assert_eq!(i1.meet(&i2), Interval::new(5, 10));
        assert!(Interval::new(20, 30).meet(&i1).is_empty());
        assert_eq!(i1.add(&i2), Interval::new(5, 25));
        assert_eq!(i1.sub(&i2), Interval::new(-15, 5));
        assert_eq!(Interval::new(-2, 3).mul(&Interval::new(4, 5)), Interval::new(-10, 15));
        assert_eq!(i1.neg(), Interval::new(-10, 0));
    }

    #[test]
    fn test_empty_is_canonical() {
        assert_eq!(Interval::new(3, 1), Interval::empty());
        assert_eq!(Interval::new(3, 1).meet(&Interval::new(7, 2)), Interval::empty());
        assert_eq!(Interval::empty().size(), 0);
        assert_eq!(Interval::empty().to_string(), "∅");
    }

    #[test]
    fn test_remove_end() {
        let i = Interval::new(0, 5);
        assert_eq!(i.remove_end(0), Interval::new(1, 5));
        assert_eq!(i.remove_end(5), Interval::new(0, 4));
        assert_eq!(i.remove_end(3), i);
        assert!(Interval::constant(4).remove_end(4).is_empty());
    }

    #[test]
    fn test_widen_jumps_to_range_limits() {
        let domain = IntervalDomain::new(-128, 127);

        let widened = domain.widen(&Interval::constant(0), &Interval::new(0, 1));
        assert_eq!(widened, Interval::new(0, 127));

        let widened = domain.widen(&widened, &Interval::new(-1, 50));
        assert_eq!(widened, Interval::new(-128, 127));

        // Stable bounds are kept.
        let widened = domain.widen(&Interval::new(0, 10), &Interval::new(2, 8));
        assert_eq!(widened, Interval::new(0, 10));
    }

    #[test]
    fn test_interval_lattice_axioms() {
        use crate::domain::tests::test_lattice_axioms;

        let domain = IntervalDomain::new(-5, 5);
        let samples = vec![
            domain.bottom(),
            domain.top(),
            Interval::constant(0),
            Interval::constant(5),
            Interval::new(0, 3),
            Interval::new(-5, 2),
            Interval::new(1, 4),
        ];
        test_lattice_axioms(&domain, &samples);
    }
}
