//! Trace merging policies.
//!
//! When several partitions reach the same program point, a
//! [`MergePredicate`] decides which of them are folded into one (trace
//! union, environment join) and which are kept apart. It is the single knob
//! controlling trace sensitivity: [`MergePredicate::Always`] gives a classic
//! trace-insensitive analysis, [`MergePredicate::Never`] keeps every
//! distinct set of visited nodes apart.
//!
//! Partitions whose traces visit the same nodes are always folded, whatever
//! the predicate.

use std::fmt;
use std::sync::Arc;

use crate::model::Model;
use crate::query::Partition;

/// Signature of user-supplied merge policies.
pub type MergeFn = dyn Fn(&Partition, &Partition, &Model) -> bool + Send + Sync;

#[derive(Clone, Default)]
pub enum MergePredicate {
    Always,
    Never,
    /// Merge when the nodes of one trace are all in the other.
    #[default]
    TraceIncluded,
    /// Merge when both traces visit the same nodes.
    TraceEqual,
    /// Merge when both environments are equal.
    EnvEqual,
    /// Merge when one environment is included in the other.
    EnvIncluded,
    /// Merge when one of the traces is longer than the given number of nodes.
    LongerThan(usize),
    And(Box<MergePredicate>, Box<MergePredicate>),
    Or(Box<MergePredicate>, Box<MergePredicate>),
    Custom(Arc<MergeFn>),
}

impl MergePredicate {
    pub fn and(self, other: MergePredicate) -> Self {
        MergePredicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: MergePredicate) -> Self {
        MergePredicate::Or(Box::new(self), Box::new(other))
    }

    pub fn custom(f: impl Fn(&Partition, &Partition, &Model) -> bool + Send + Sync + 'static) -> Self {
        MergePredicate::Custom(Arc::new(f))
    }

    pub fn should_merge(&self, a: &Partition, b: &Partition, model: &Model) -> bool {
        match self {
            MergePredicate::Always => true,
            MergePredicate::Never => false,
            MergePredicate::TraceIncluded => a.trace.is_subset(&b.trace) || b.trace.is_subset(&a.trace),
            MergePredicate::TraceEqual => a.trace.same_nodes(&b.trace),
            MergePredicate::EnvEqual => a.env == b.env,
            MergePredicate::EnvIncluded => a.env.le(&b.env, model) || b.env.le(&a.env, model),
            MergePredicate::LongerThan(n) => a.trace.len() > *n || b.trace.len() > *n,
            MergePredicate::And(p, q) => p.should_merge(a, b, model) && q.should_merge(a, b, model),
            MergePredicate::Or(p, q) => p.should_merge(a, b, model) || q.should_merge(a, b, model),
            MergePredicate::Custom(f) => f(a, b, model),
        }
    }

    /// Folds `partitions` until no two of them should be merged.
    ///
    /// The result depends only on the input sequence, not on hashing or
    /// allocation order.
    pub fn merge_all(&self, partitions: Vec<Partition>, model: &Model) -> Vec<Partition> {
        let mut res: Vec<Partition> = Vec::with_capacity(partitions.len());
        for part in partitions {
            let mut part = part;
            while let Some(i) = res
                .iter()
                .position(|q| q.trace.same_nodes(&part.trace) || self.should_merge(q, &part, model))
            {
                let q = res.remove(i);
                part = q.merge(&part, model);
            }
            res.push(part);
        }
        res
    }
}

impl fmt::Debug for MergePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePredicate::Always => write!(f, "Always"),
            MergePredicate::Never => write!(f, "Never"),
            MergePredicate::TraceIncluded => write!(f, "TraceIncluded"),
            MergePredicate::TraceEqual => write!(f, "TraceEqual"),
            MergePredicate::EnvEqual => write!(f, "EnvEqual"),
            MergePredicate::EnvIncluded => write!(f, "EnvIncluded"),
            MergePredicate::LongerThan(n) => write!(f, "LongerThan({})", n),
            MergePredicate::And(p, q) => write!(f, "And({:?}, {:?})", p, q),
            MergePredicate::Or(p, q) => write!(f, "Or({:?}, {:?})", p, q),
            MergePredicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
