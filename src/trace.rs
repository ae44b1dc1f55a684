//! Execution traces.
//!
//! A [`Trace`] is the set of CFG nodes an execution went through to reach a
//! program point, kept in the order they were first visited. Nodes are never
//! repeated, so the number of distinct traces of a program is finite even in
//! the presence of loops.
//!
//! Traces are compared as sets: two traces with the same nodes are the same
//! execution partition, whatever the order in which merging produced them.

use std::fmt;

use crate::types::NodeId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Trace {
    nodes: Vec<NodeId>,
}

impl Trace {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The nodes of the trace, in order of first visit.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// This trace followed by `node`.
    pub fn extended(&self, node: NodeId) -> Trace {
        let mut res = self.clone();
        if !res.contains(node) {
            res.nodes.push(node);
        }
        res
    }

    /// Nodes of `self`, then the nodes of `other` not in `self`.
    pub fn union(&self, other: &Trace) -> Trace {
        let mut res = self.clone();
        for &n in &other.nodes {
            if !res.contains(n) {
                res.nodes.push(n);
            }
        }
        res
    }

    pub fn is_subset(&self, other: &Trace) -> bool {
        self.nodes.iter().all(|&n| other.contains(n))
    }

    /// Set equality.
    pub fn same_nodes(&self, other: &Trace) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes.iter().map(|n| n.to_string()).collect();
        write!(f, "[{}]", nodes.join(", "))
    }
}

impl FromIterator<NodeId> for Trace {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        iter.into_iter().fold(Trace::empty(), |t, n| t.extended(n))
    }
}
