//! Control-flow graphs of IR programs.
//!
//! [`CfgBuilder`] lowers the structured statements of a [`Program`] into a
//! digraph of program points:
//!
//! - every atomic statement (`assign`, `read`, `use`, `assume`) becomes one
//!   node, chained to the node before it;
//! - a split lowers both branches from the same node and rejoins them at a
//!   fresh `split_join` node;
//! - a loop gets a `loop_start` node, entered from before the loop and from
//!   the end of its body, followed by a `loop_join` node for the exit.
//!   Loop heads are the only widening points.
//!
//! Nodes are numbered in creation order: the entry (`start0`) is node 0, and
//! a loop head is numbered before the nodes of its body. Every node is
//! reachable from the entry.

use std::fmt;

use crate::ir::{Expr, Program, Stmt};
use crate::purpose::{Purpose, PurposeKind};
use crate::types::NodeId;
use crate::utils::KeyCounter;

/// A program point.
#[derive(Debug, Clone)]
pub struct CfgNode<'p> {
    pub id: NodeId,
    /// Fresh name, unique in the graph (`assign3`, `loop_start0`, ...).
    pub name: String,
    pub widening_point: bool,
    /// The statement this node executes, if any.
    pub stmt: Option<&'p Stmt>,
}

/// An `assume` node tagged with a purpose.
#[derive(Debug, Clone, Copy)]
pub struct TaggedAssume<'p> {
    pub node: NodeId,
    pub expr: &'p Expr,
    pub purpose: &'p Purpose,
}

/// Control-flow graph of one program.
#[derive(Debug, Clone)]
pub struct Cfg<'p> {
    program: &'p Program,
    nodes: Vec<CfgNode<'p>>,
    edges: Vec<(NodeId, NodeId)>,
    succs: Vec<Vec<NodeId>>,
    preds: Vec<Vec<NodeId>>,
}

impl<'p> Cfg<'p> {
    pub fn build(program: &'p Program) -> Self {
        CfgBuilder::new().build(program)
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn entry(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[CfgNode<'p>] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &CfgNode<'p> {
        &self.nodes[id.index()]
    }

    pub fn node_named(&self, name: &str) -> Option<&CfgNode<'p>> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    pub fn succs(&self, id: NodeId) -> &[NodeId] {
        &self.succs[id.index()]
    }

    pub fn preds(&self, id: NodeId) -> &[NodeId] {
        &self.preds[id.index()]
    }

    /// All `assume` nodes whose purpose is of the given kind, in node order.
    pub fn assumes_with_purpose(&self, kind: PurposeKind) -> Vec<TaggedAssume<'p>> {
        self.nodes
            .iter()
            .filter_map(|n| match n.stmt {
                Some(Stmt::Assume {
                    expr,
                    purpose: Some(purpose),
                }) if purpose.is(kind) => Some(TaggedAssume {
                    node: n.id,
                    expr,
                    purpose,
                }),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Cfg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cfg of '{}' ({} nodes)", self.program.name(), self.nodes.len())?;
        for node in &self.nodes {
            let succs: Vec<&str> = self.succs(node.id).iter().map(|&s| self.node(s).name.as_str()).collect();
            write!(f, "  {}", node.name)?;
            if let Some(stmt) = node.stmt {
                write!(f, ": {}", stmt)?;
            }
            if node.widening_point {
                write!(f, " [widening]")?;
            }
            writeln!(f, " -> {}", succs.join(", "))?;
        }
        Ok(())
    }
}

/// Lowers structured statements into a [`Cfg`].
#[derive(Debug, Default)]
pub struct CfgBuilder<'p> {
    nodes: Vec<CfgNode<'p>>,
    edges: Vec<(NodeId, NodeId)>,
    names: KeyCounter,
}

impl<'p> CfgBuilder<'p> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            names: KeyCounter::new(),
        }
    }

    pub fn build(mut self, program: &'p Program) -> Cfg<'p> {
        let start = self.node("start", false, None);
        self.stmts(program.stmts(), start);

        let mut succs = vec![Vec::new(); self.nodes.len()];
        let mut preds = vec![Vec::new(); self.nodes.len()];
        for &(from, to) in &self.edges {
            succs[from.index()].push(to);
            preds[to.index()].push(from);
        }

        log::debug!(
            "Built cfg of '{}': {} nodes, {} edges",
            program.name(),
            self.nodes.len(),
            self.edges.len()
        );

        Cfg {
            program,
            nodes: self.nodes,
            edges: self.edges,
            succs,
            preds,
        }
    }

    fn node(&mut self, kind: &str, widening_point: bool, stmt: Option<&'p Stmt>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(CfgNode {
            id,
            name: self.names.fresh(kind),
            widening_point,
            stmt,
        });
        id
    }

    fn link(&mut self, from: NodeId, to: NodeId) {
        if !self.edges.contains(&(from, to)) {
            self.edges.push((from, to));
        }
    }

    fn stmts(&mut self, stmts: &'p [Stmt], mut cur: NodeId) -> NodeId {
        for stmt in stmts {
            cur = self.stmt(stmt, cur);
        }
        cur
    }

    /// Lowers `stmt` after node `cur`, returning the node it ends at.
    fn stmt(&mut self, stmt: &'p Stmt, cur: NodeId) -> NodeId {
        let kind = match stmt {
            Stmt::Assign { .. } => "assign",
            Stmt::Read { .. } => "read",
            Stmt::Use { .. } => "use",
            Stmt::Assume { .. } => "assume",
            Stmt::Split { fst, snd } => {
                let end_fst = self.stmts(fst, cur);
                let end_snd = self.stmts(snd, cur);
                let join = self.node("split_join", false, None);
                self.link(end_fst, join);
                self.link(end_snd, join);
                return join;
            }
            Stmt::Loop { body } => {
                let head = self.node("loop_start", true, None);
                self.link(cur, head);
                let end = self.stmts(body, head);
                self.link(end, head);
                let join = self.node("loop_join", false, None);
                self.link(head, join);
                return join;
            }
        };
        let n = self.node(kind, false, Some(stmt));
        self.link(cur, n);
        n
    }
}
