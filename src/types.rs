//! Type-safe identifiers for IR nodes, program variables and CFG nodes.
//!
//! These newtypes enforce compile-time distinction between the three kinds
//! of identities the engine keys its tables on. All of them are dense,
//! 0-indexed and allocated in creation order, which keeps every table
//! deterministic to iterate.

use std::fmt;

/// Identity of an IR expression or statement node.
///
/// Allocated by [`ProgramBuilder`][crate::ir::ProgramBuilder]; stable for the
/// lifetime of the program, and used as the key of [`Model`][crate::model::Model] entries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ExprId(u32);

impl ExprId {
    pub fn new(id: u32) -> Self {
        ExprId(id)
    }

    /// Returns the raw identifier as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a program variable.
///
/// Every occurrence of an identifier refers to its variable through this id,
/// and abstract environments are keyed by it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarId(u32);

impl VarId {
    pub fn new(id: u32) -> Self {
        VarId(id)
    }

    /// Returns the raw identifier as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identity of a CFG node (program point).
///
/// # Invariants
///
/// - Node ids index directly into the node table of their [`Cfg`][crate::cfg::Cfg]
/// - The entry node always has index 0
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw node index as a `usize`.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<NodeId> for usize {
    fn from(node: NodeId) -> Self {
        node.0
    }
}
