//! Finite powerset domain over a fixed set of named literals.
//!
//! Used for enumeration types (including discriminants of variant records)
//! and for access types, whose literals are `null` and `valid`. The lattice
//! is the full powerset, so it is exact and has finite height.

use std::fmt;
use std::sync::Arc;

use super::domain::AbstractDomain;

/// Maximum number of literals a finite domain can hold.
pub const MAX_LITERALS: usize = 64;

/// Subset of the literals of a [`FiniteDomain`], as a bitmask over literal indices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ElemSet(u64);

impl ElemSet {
    pub const EMPTY: ElemSet = ElemSet(0);

    pub fn singleton(index: usize) -> Self {
        debug_assert!(index < MAX_LITERALS);
        ElemSet(1 << index)
    }

    /// The set of the first `n` literal indices.
    pub fn full(n: usize) -> Self {
        if n >= MAX_LITERALS {
            ElemSet(u64::MAX)
        } else {
            ElemSet((1u64 << n) - 1)
        }
    }

    pub fn contains(self, index: usize) -> bool {
        index < MAX_LITERALS && self.0 & (1 << index) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: ElemSet) -> ElemSet {
        ElemSet(self.0 | other.0)
    }

    pub fn intersect(self, other: ElemSet) -> ElemSet {
        ElemSet(self.0 & other.0)
    }

    pub fn difference(self, other: ElemSet) -> ElemSet {
        ElemSet(self.0 & !other.0)
    }

    pub fn is_subset(self, other: ElemSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Literal indices in this set, in increasing order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_LITERALS).filter(move |&i| self.contains(i))
    }
}

/// Powerset domain over named literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FiniteDomain {
    name: Arc<str>,
    literals: Vec<Arc<str>>,
}

impl FiniteDomain {
    /// # Panics
    ///
    /// Panics if there are more than [`MAX_LITERALS`] literals.
    pub fn new(name: impl Into<Arc<str>>, literals: Vec<Arc<str>>) -> Self {
        assert!(
            literals.len() <= MAX_LITERALS,
            "Finite domains hold at most {} literals",
            MAX_LITERALS
        );
        Self {
            name: name.into(),
            literals,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn literals(&self) -> &[Arc<str>] {
        &self.literals
    }

    pub fn index_of(&self, literal: &str) -> Option<usize> {
        self.literals.iter().position(|l| &**l == literal)
    }

    /// The singleton set of the literal spelled `literal`.
    pub fn literal(&self, literal: &str) -> Option<ElemSet> {
        self.index_of(literal).map(ElemSet::singleton)
    }

    /// Renders a set with this domain's literal names.
    pub fn display(&self, set: ElemSet) -> String {
        let names: Vec<&str> = set
            .iter()
            .filter_map(|i| self.literals.get(i))
            .map(|l| &**l)
            .collect();
        format!("{{{}}}", names.join(", "))
    }
}

impl fmt::Display for FiniteDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl AbstractDomain for FiniteDomain {
    type Element = ElemSet;

    fn bottom(&self) -> Self::Element {
        ElemSet::EMPTY
    }

    fn top(&self) -> Self::Element {
        ElemSet::full(self.literals.len())
    }

    fn is_bottom(&self, elem: &Self::Element) -> bool {
        elem.is_empty()
    }

    fn is_top(&self, elem: &Self::Element) -> bool {
        self.top().is_subset(*elem)
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
        self.join(elem1, elem2)
    }
}
