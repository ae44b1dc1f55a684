//! Core abstract domain trait and utilities.

use std::fmt::Debug;

/// Abstract domain interface.
///
/// An abstract domain represents a lattice structure used for
/// approximating sets of concrete values in static analysis.
///
/// # Lattice Properties
///
/// An abstract domain must satisfy:
/// - Reflexivity: `∀a. a ⊑ a`
/// - Transitivity: `∀a,b,c. a ⊑ b ∧ b ⊑ c ⇒ a ⊑ c`
/// - Antisymmetry: `∀a,b. a ⊑ b ∧ b ⊑ a ⇒ a = b`
/// - Join is an upper bound: `a ⊑ a ⊔ b` and `b ⊑ a ⊔ b`
/// - Widening dominates join: `a ⊔ b ⊑ a ∇ b`, and every chain
///   `x₀, x₁ = x₀ ∇ y₀, x₂ = x₁ ∇ y₁, ...` stabilizes in finitely many steps
pub trait AbstractDomain: Clone + Debug + Sized {
    /// The type representing abstract elements.
    type Element: Clone + Debug + PartialEq;

    /// Create the bottom element (⊥): represents the empty set.
    fn bottom(&self) -> Self::Element;

    /// Create the top element (⊤): represents all possible values.
    fn top(&self) -> Self::Element;

    /// Check if an element is bottom.
    fn is_bottom(&self, elem: &Self::Element) -> bool;

    /// Check if an element is top.
    fn is_top(&self, elem: &Self::Element) -> bool;

    /// Partial order: `elem1 ⊑ elem2` (elem1 is more precise than elem2).
    fn le(&self, elem1: &Self::Element, elem2: &Self::Element) -> bool;

    /// Join (`⊔`): least upper bound, over-approximation.
    fn join(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element;

    /// Meet (`⊓`): greatest lower bound, refinement.
    fn meet(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element;

    /// Widening (`∇`): accelerates convergence in fixpoint computation.
    ///
    /// Must satisfy: `elem1 ⊔ elem2 ⊑ elem1 ∇ elem2`.
    /// Each domain needs its own extrapolation; there is no default.
    fn widen(&self, elem1: &Self::Element, elem2: &Self::Element) -> Self::Element;

    /// Check equality of abstract elements.
    fn eq(&self, elem1: &Self::Element, elem2: &Self::Element) -> bool {
        self.le(elem1, elem2) && self.le(elem2, elem1)
    }

    /// Join multiple elements.
    fn join_many<I>(&self, elems: I) -> Self::Element
    where
        I: IntoIterator<Item = Self::Element>,
    {
        elems.into_iter().fold(self.bottom(), |acc, e| self.join(&acc, &e))
    }
}
