//! Boolean domain: the powerset of `{false, true}`.
//!
//! This domain is exact (it loses no information), has height 2, and is
//! the domain of every condition: assumptions are solved by asking for the
//! pre-image of `{true}`, and checkers look for `false` in the value set of
//! a check expression.

use std::fmt;

use super::domain::AbstractDomain;

/// A subset of `{false, true}`, stored as a two-bit mask.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct BoolSet(u8);

impl BoolSet {
    pub const EMPTY: BoolSet = BoolSet(0b00);
    pub const FALSE: BoolSet = BoolSet(0b01);
    pub const TRUE: BoolSet = BoolSet(0b10);
    pub const BOTH: BoolSet = BoolSet(0b11);

    pub fn of(b: bool) -> Self {
        if b {
            BoolSet::TRUE
        } else {
            BoolSet::FALSE
        }
    }

    pub fn contains(self, b: bool) -> bool {
        self.0 & BoolSet::of(b).0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: BoolSet) -> BoolSet {
        BoolSet(self.0 | other.0)
    }

    pub fn intersect(self, other: BoolSet) -> BoolSet {
        BoolSet(self.0 & other.0)
    }

    pub fn is_subset(self, other: BoolSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// The booleans in this set, `false` first.
    pub fn iter(self) -> impl Iterator<Item = bool> {
        [false, true].into_iter().filter(move |&b| self.contains(b))
    }

    /// Image of this set under `f`.
    pub fn map(self, f: impl Fn(bool) -> bool) -> BoolSet {
        self.iter().map(f).collect()
    }
}

impl FromIterator<bool> for BoolSet {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        iter.into_iter().fold(BoolSet::EMPTY, |acc, b| acc.union(BoolSet::of(b)))
    }
}

impl fmt::Display for BoolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<_> = self.iter().map(|b| b.to_string()).collect();
        write!(f, "{{{}}}", items.join(", "))
    }
}

/// The boolean domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BooleanDomain;

impl AbstractDomain for BooleanDomain {
    type Element = BoolSet;

    fn bottom(&self) -> Self::Element {
        BoolSet::EMPTY
    }

    fn top(&self) -> Self::Element {
        BoolSet::BOTH
    }

    fn is_bottom(&self, elem: &Self::Element) -> bool {
        elem.is_empty()
    }

    fn is_top(&self, elem: &Self::Element) -> bool {
        *elem == BoolSet::BOTH
    }

    fn le(&self, elem1: &Self::Element, elem2: &Self::Element) -> bool {
        elem1.is_subset(*elem2)
    }

    fn join(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        elem1.union(*elem2)
    }

    fn meet(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        elem1.intersect(*elem2)
    }

    fn widen(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element {
        // Finite height: join already terminates.
        self.join(elem1, elem2)
    }
}
