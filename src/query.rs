//! Analysis results and queries over them.
//!
//! An [`Analysis`] holds, for every CFG node, the partitions reaching the
//! point *after* the node's statement: one abstract environment per
//! execution trace kept apart by the merge policy. Checkers query it with
//! [`Analysis::eval_at`].

use std::fmt;

use crate::cfg::Cfg;
use crate::domain::AbstractDomain;
use crate::env::Env;
use crate::eval::ExprEvaluator;
use crate::ir::Expr;
use crate::model::Model;
use crate::trace::Trace;
use crate::types::{NodeId, VarId};
use crate::value::Value;

/// One execution partition: the nodes visited, and the resulting environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    pub trace: Trace,
    pub env: Env,
}

impl Partition {
    pub fn new(trace: Trace, env: Env) -> Self {
        Self { trace, env }
    }

    /// Folds two partitions: union of the traces, join of the environments.
    pub fn merge(&self, other: &Partition, model: &Model) -> Partition {
        Partition {
            trace: self.trace.union(&other.trace),
            env: self.env.join(&other.env, model),
        }
    }
}

/// Result of the abstract semantics of one program.
///
/// Immutable; queries never modify it and can be issued from several
/// threads at once.
#[derive(Debug, Clone)]
pub struct Analysis<'a> {
    pub(crate) cfg: Cfg<'a>,
    pub(crate) model: &'a Model,
    pub(crate) states: Vec<Vec<Partition>>,
    pub(crate) visits: Vec<usize>,
}

impl<'a> Analysis<'a> {
    pub fn cfg(&self) -> &Cfg<'a> {
        &self.cfg
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    /// Partitions reaching the point after `node`.
    pub fn states(&self, node: NodeId) -> &[Partition] {
        &self.states[node.index()]
    }

    /// Whether some execution reaches `node`.
    pub fn is_reachable(&self, node: NodeId) -> bool {
        !self.states(node).is_empty()
    }

    /// Number of times the engine processed `node`.
    pub fn visits(&self, node: NodeId) -> usize {
        self.visits[node.index()]
    }

    /// Total number of node visits.
    pub fn total_visits(&self) -> usize {
        self.visits.iter().sum()
    }

    /// Value of `var` after `node`, joined over all partitions.
    ///
    /// `None` if the variable is not tracked; bottom if the node is unreachable.
    pub fn value_at(&self, node: NodeId, var: VarId) -> Option<Value> {
        let domain = self.model.var_domain(var)?;
        let values = self.states(node).iter().filter_map(|p| p.env.get(var)).copied();
        Some(domain.join_many(values))
    }

    /// Values `expr` can take when executing `node`, per trace reaching it.
    ///
    /// `expr` is evaluated in every partition stored at the predecessors of
    /// `node` (the states *before* `node` executes), and each trace is
    /// extended with `node`. The entry node has no predecessors and yields
    /// nothing. Every node of `expr` must have a meaning in the model.
    pub fn eval_at<'s>(&'s self, node: NodeId, expr: &'s Expr) -> impl Iterator<Item = (Trace, Value)> + 's {
        let evaluator = ExprEvaluator::new(self.model);
        self.cfg
            .preds(node)
            .iter()
            .flat_map(move |&pred| self.states(pred).iter())
            .map(move |part| (part.trace.extended(node), evaluator.eval(expr, &part.env)))
    }
}

impl fmt::Display for Analysis<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.cfg.program();
        writeln!(f, "analysis of '{}'", program.name())?;
        for node in self.cfg.nodes() {
            write!(f, "{}", node.name)?;
            if let Some(stmt) = node.stmt {
                write!(f, ": {}", stmt)?;
            }
            writeln!(f, " (visited {} times)", self.visits(node.id))?;
            for part in self.states(node.id) {
                writeln!(f, "  {} => {}", part.trace, part.env.display(program, self.model))?;
            }
        }
        Ok(())
    }
}
