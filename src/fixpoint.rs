//! Trace-sensitive abstract semantics: the fixpoint engine.
//!
//! [`AbstractSemantics`] computes, for every node of a CFG, the partitions
//! (trace, environment) reaching the point after the node. It runs a
//! worklist algorithm:
//!
//! 1. the entry starts from the initial environment under the empty trace;
//! 2. a node's incoming partitions are the states of its predecessors; each
//!    goes through the node's transfer function and gets its trace extended
//!    with the node;
//! 3. the resulting partitions are folded by the merge predicate;
//! 4. at widening points (loop heads), each partition is widened with the
//!    previous partition of the same trace;
//! 5. when the state of a node changes, its successors are scheduled.
//!
//! The worklist always processes the smallest scheduled node id first, so
//! runs are deterministic. There is no iteration bound: termination follows
//! from the finite number of repetition-free traces and from widening.

use std::collections::BTreeSet;
use std::fmt;

use crate::cfg::Cfg;
use crate::domain::AbstractDomain;
use crate::env::Env;
use crate::eval::ExprEvaluator;
use crate::ir::{Expr, Program, Stmt};
use crate::merge::MergePredicate;
use crate::model::Model;
use crate::query::{Analysis, Partition};
use crate::solver::ExprSolver;
use crate::trace::Trace;
use crate::types::VarId;
use crate::value::Domain;

#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// An expression evaluated by the program has no meaning in the model.
    Untyped { expr: String },
    /// A variable written by the program is not tracked by the model.
    UntypedVariable { var: String },
    /// An assumption is not a boolean expression.
    NonBooleanAssumption { expr: String },
    /// An assigned expression produces values the variable cannot hold.
    DomainMismatch { var: String, expr: String },
    /// The initial environment binds a variable to a value outside its domain.
    InvalidInitialValue { var: String, value: String },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Untyped { expr } => write!(f, "Expression '{}' has no meaning in the model", expr),
            AnalysisError::UntypedVariable { var } => write!(f, "Variable '{}' is not tracked by the model", var),
            AnalysisError::NonBooleanAssumption { expr } => write!(f, "Assumption '{}' is not boolean", expr),
            AnalysisError::DomainMismatch { var, expr } => {
                write!(f, "Variable '{}' cannot hold the values of '{}'", var, expr)
            }
            AnalysisError::InvalidInitialValue { var, value } => {
                write!(f, "Initial value {} is not in the domain of variable '{}'", value, var)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Configuration of [`AbstractSemantics`].
#[derive(Debug, Clone, Default)]
pub struct SemanticsConfig {
    /// Policy folding partitions that reach the same node.
    pub merge_predicate: MergePredicate,
    /// Environment at the entry. Variables it does not bind start at top.
    pub initial_env: Option<Env>,
}

/// The abstract semantics of programs under one model.
#[derive(Debug, Clone)]
pub struct AbstractSemantics<'m> {
    model: &'m Model,
    config: SemanticsConfig,
}

impl<'m> AbstractSemantics<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self::with_config(model, SemanticsConfig::default())
    }

    pub fn with_config(model: &'m Model, config: SemanticsConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &SemanticsConfig {
        &self.config
    }

    /// Builds the CFG of `program` and computes its semantics.
    pub fn compute<'a>(&self, program: &'a Program) -> Result<Analysis<'a>, AnalysisError>
    where
        'm: 'a,
    {
        self.run(Cfg::build(program))
    }

    /// Computes the semantics of an already built CFG.
    pub fn run<'a>(&self, cfg: Cfg<'a>) -> Result<Analysis<'a>, AnalysisError>
    where
        'm: 'a,
    {
        self.check(&cfg)?;

        let model: &'a Model = self.model;
        let evaluator = ExprEvaluator::new(model);
        let solver = ExprSolver::new(model);
        let mut initial_env = Env::top(cfg.program(), model);
        if let Some(env) = &self.config.initial_env {
            for (var, value) in env.iter() {
                initial_env.set(var, *value);
            }
        }

        log::debug!(
            "Computing semantics of '{}' ({} nodes, merge predicate {:?})",
            cfg.program().name(),
            cfg.len(),
            self.config.merge_predicate
        );

        let mut states: Vec<Vec<Partition>> = vec![Vec::new(); cfg.len()];
        let mut visits = vec![0; cfg.len()];
        let mut worklist = BTreeSet::from([cfg.entry()]);

        while let Some(id) = worklist.pop_first() {
            visits[id.index()] += 1;
            let node = cfg.node(id);

            let mut incoming: Vec<Partition> = cfg
                .preds(id)
                .iter()
                .flat_map(|&pred| states[pred.index()].iter().cloned())
                .collect();
            if id == cfg.entry() {
                incoming.insert(0, Partition::new(Trace::empty(), initial_env.clone()));
            }

            let mut outgoing = Vec::with_capacity(incoming.len());
            for part in incoming {
                let trace = part.trace.extended(id);
                match transfer(node.stmt, part.env, model, &evaluator, &solver) {
                    Some(env) => outgoing.push(Partition::new(trace, env)),
                    None => log::trace!("Pruned infeasible partition {} at {}", trace, node.name),
                }
            }

            let mut new_state = self.config.merge_predicate.merge_all(outgoing, model);
            if node.widening_point {
                new_state = widen_state(&states[id.index()], new_state, model);
            }

            log::trace!(
                "Visit #{} of {}: {} partition(s)",
                visits[id.index()],
                node.name,
                new_state.len()
            );

            if new_state != states[id.index()] {
                states[id.index()] = new_state;
                worklist.extend(cfg.succs(id).iter().copied());
            }
        }

        let analysis = Analysis {
            cfg,
            model,
            states,
            visits,
        };
        log::debug!(
            "Semantics of '{}' converged after {} node visits",
            analysis.cfg.program().name(),
            analysis.total_visits()
        );
        Ok(analysis)
    }

    /// Checks once that every statement of the CFG can be interpreted.
    fn check(&self, cfg: &Cfg<'_>) -> Result<(), AnalysisError> {
        for node in cfg.nodes() {
            let Some(stmt) = node.stmt else { continue };
            match stmt {
                Stmt::Assign { var, expr } => {
                    self.check_var(&var.name, var.var)?;
                    self.check_expr(expr)?;
                    let target = self.model.var_domain(var.var);
                    let source = self.model.domain_of(expr);
                    if let (Some(target), Some(source)) = (target, source) {
                        if !target.can_hold(source) {
                            return Err(AnalysisError::DomainMismatch {
                                var: var.name.to_string(),
                                expr: expr.to_string(),
                            });
                        }
                    }
                }
                Stmt::Read { var } => self.check_var(&var.name, var.var)?,
                Stmt::Assume { expr, .. } => {
                    self.check_expr(expr)?;
                    if !matches!(self.model.domain_of(expr).map(|d| &**d), Some(Domain::Boolean(_))) {
                        return Err(AnalysisError::NonBooleanAssumption { expr: expr.to_string() });
                    }
                }
                Stmt::Use { .. } | Stmt::Split { .. } | Stmt::Loop { .. } => {}
            }
        }

        if let Some(env) = &self.config.initial_env {
            let program = cfg.program();
            for (var, value) in env.iter() {
                let name = match program.vars().iter().find(|decl| decl.id == var) {
                    Some(decl) => decl.name.to_string(),
                    None => var.to_string(),
                };
                let Some(domain) = self.model.var_domain(var) else {
                    return Err(AnalysisError::UntypedVariable { var: name });
                };
                if !domain.accepts(value) || !domain.le(value, &domain.top()) {
                    return Err(AnalysisError::InvalidInitialValue {
                        var: name,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_var(&self, name: &str, var: VarId) -> Result<(), AnalysisError> {
        match self.model.var_domain(var) {
            Some(_) => Ok(()),
            None => Err(AnalysisError::UntypedVariable { var: name.to_string() }),
        }
    }

    fn check_expr(&self, expr: &Expr) -> Result<(), AnalysisError> {
        for e in expr.nodes() {
            if self.model.entry(e).is_none() {
                return Err(AnalysisError::Untyped { expr: e.to_string() });
            }
            if let Some(ident) = e.as_ident() {
                self.check_var(&ident.name, ident.var)?;
            }
        }
        Ok(())
    }
}

/// Effect of a node's statement on one environment; `None` drops the partition.
fn transfer(
    stmt: Option<&Stmt>,
    mut env: Env,
    model: &Model,
    evaluator: &ExprEvaluator<'_>,
    solver: &ExprSolver<'_>,
) -> Option<Env> {
    let Some(stmt) = stmt else {
        return Some(env);
    };
    match stmt {
        Stmt::Assign { var, expr } => {
            let value = evaluator.eval(expr, &env);
            let value = match model.var_domain(var.var) {
                Some(domain) => domain.clamp(value),
                None => value,
            };
            if value.is_empty() {
                return None;
            }
            env.set(var.var, value);
            Some(env)
        }
        Stmt::Read { var } => {
            let top = model.var_domain(var.var)?.top();
            env.set(var.var, top);
            Some(env)
        }
        Stmt::Assume { expr, .. } => solver.solve(expr, &env),
        Stmt::Use { .. } | Stmt::Split { .. } | Stmt::Loop { .. } => Some(env),
    }
}

/// Widens each new partition with the old partition of the same trace.
///
/// Old partitions whose trace no longer appears are kept, unless a new
/// partition covers both their trace and their environment.
fn widen_state(old: &[Partition], new: Vec<Partition>, model: &Model) -> Vec<Partition> {
    let mut res: Vec<Partition> = new
        .into_iter()
        .map(|p| match old.iter().find(|o| o.trace.same_nodes(&p.trace)) {
            Some(o) => Partition::new(p.trace, o.env.widen(&p.env, model)),
            None => p,
        })
        .collect();

    for o in old {
        let covered = res
            .iter()
            .any(|p| p.trace.same_nodes(&o.trace) || (o.trace.is_subset(&p.trace) && o.env.le(&p.env, model)));
        if !covered {
            res.push(o.clone());
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::boolean::BoolSet;
    use crate::interp::StandardInterpreter;
    use crate::interval::Interval;
    use crate::ir::{BinOp, ProgramBuilder};
    use crate::model::ModelBuilder;
    use crate::typer::{HintTyper, Type};
    use crate::value::Value;

    fn build_model(program: &Program) -> Model {
        let typer = HintTyper::new().with("bool", Type::Boolean).with("int", Type::int(-5, 5));
        ModelBuilder::new(typer, StandardInterpreter::new()).of(&[program]).unwrap()
    }

    #[test]
    fn test_branch_with_constant_condition() {
        // x = 3; if x > 0 then y = x - 1 else y = 0
        let mut b = ProgramBuilder::new("branch");
        let x = b.var("x", "int");
        let y = b.var("y", "int");
        let three = b.lit("3", "int");
        let init = b.assign(&x, three);
        let xe = b.ident(&x);
        let zero = b.lit("0", "int");
        let cond = b.binary(xe, BinOp::Gt, zero, "bool");
        let xe = b.ident(&x);
        let one = b.lit("1", "int");
        let dec = b.binary(xe, BinOp::Sub, one, "int");
        let then_stmt = b.assign(&y, dec);
        let zero = b.lit("0", "int");
        let else_stmt = b.assign(&y, zero);
        let branch = b.if_then_else(cond, vec![then_stmt], vec![else_stmt]);
        let program = b.build(vec![init, branch]);

        let model = build_model(&program);
        let analysis = AbstractSemantics::new(&model).compute(&program).unwrap();
        let cfg = analysis.cfg();

        let join = cfg.node_named("split_join0").unwrap().id;
        let y_value = analysis.value_at(join, y.var).unwrap();
        assert!(y_value.as_interval().unwrap().is_subset(&Interval::new(0, 2)));
        assert_eq!(y_value, Value::Int(Interval::constant(2)));

        // The else branch is infeasible.
        let else_assume = cfg.node_named("assume1").unwrap().id;
        let else_assign = cfg.node_named("assign2").unwrap().id;
        assert!(!analysis.is_reachable(else_assume));
        assert!(!analysis.is_reachable(else_assign));
        assert_eq!(analysis.visits(else_assign), 0);
    }

    #[test]
    fn test_loop_terminates_with_widening() {
        // x = 0; while x < 5 do x = x + 1
        let mut b = ProgramBuilder::new("loop");
        let x = b.var("x", "int");
        let zero = b.lit("0", "int");
        let init = b.assign(&x, zero);
        let xe = b.ident(&x);
        let five = b.lit("5", "int");
        let cond = b.binary(xe, BinOp::Lt, five, "bool");
        let xe = b.ident(&x);
        let one = b.lit("1", "int");
        let inc = b.binary(xe, BinOp::Add, one, "int");
        let step = b.assign(&x, inc);
        let mut stmts = vec![init];
        stmts.extend(b.while_loop(cond, vec![step]));
        let program = b.build(stmts);

        let model = build_model(&program);
        let analysis = AbstractSemantics::new(&model).compute(&program).unwrap();
        let cfg = analysis.cfg();

        let head = cfg.node_named("loop_start0").unwrap().id;
        assert!(cfg.node(head).widening_point);
        assert_eq!(analysis.value_at(head, x.var), Some(Value::Int(Interval::new(0, 5))));
        assert!(analysis.visits(head) <= 5);

        let exit = cfg.node_named("assume1").unwrap().id;
        assert_eq!(analysis.value_at(exit, x.var), Some(Value::Int(Interval::constant(5))));
    }

    #[test]
    fn test_never_merge_keeps_branches_apart() {
        // read(x); if x > 0 then y = 1 else y = 0
        let mut b = ProgramBuilder::new("split");
        let x = b.var("x", "int");
        let y = b.var("y", "int");
        let input = b.read(&x);
        let xe = b.ident(&x);
        let zero = b.lit("0", "int");
        let cond = b.binary(xe, BinOp::Gt, zero, "bool");
        let one = b.lit("1", "int");
        let then_stmt = b.assign(&y, one);
        let zero = b.lit("0", "int");
        let else_stmt = b.assign(&y, zero);
        let branch = b.if_then_else(cond, vec![then_stmt], vec![else_stmt]);
        let program = b.build(vec![input, branch]);
        let model = build_model(&program);

        let config = SemanticsConfig {
            merge_predicate: MergePredicate::Never,
            initial_env: None,
        };
        let analysis = AbstractSemantics::with_config(&model, config).compute(&program).unwrap();
        let join = analysis.cfg().node_named("split_join0").unwrap().id;
        let states = analysis.states(join);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].env.get(x.var), Some(&Value::Int(Interval::new(1, 5))));
        assert_eq!(states[0].env.get(y.var), Some(&Value::Int(Interval::constant(1))));
        assert_eq!(states[1].env.get(x.var), Some(&Value::Int(Interval::new(-5, 0))));
        assert_eq!(states[1].env.get(y.var), Some(&Value::Int(Interval::constant(0))));

        // Neither branch trace includes the other: the default keeps them apart too.
        let analysis = AbstractSemantics::new(&model).compute(&program).unwrap();
        assert_eq!(analysis.states(join).len(), 2);

        let config = SemanticsConfig {
            merge_predicate: MergePredicate::Always,
            initial_env: None,
        };
        let analysis = AbstractSemantics::with_config(&model, config).compute(&program).unwrap();
        let states = analysis.states(join);
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].env.get(x.var), Some(&Value::Int(Interval::new(-5, 5))));
        assert_eq!(states[0].env.get(y.var), Some(&Value::Int(Interval::new(0, 1))));
    }

    #[test]
    fn test_initial_env() {
        let mut b = ProgramBuilder::new("init");
        let x = b.var("x", "int");
        let y = b.var("y", "int");
        let xe = b.ident(&x);
        let stmt = b.assign(&y, xe);
        let program = b.build(vec![stmt]);
        let model = build_model(&program);

        let config = SemanticsConfig {
            initial_env: Some(Env::new().with(x.var, Value::Int(Interval::new(1, 2)))),
            ..Default::default()
        };
        let analysis = AbstractSemantics::with_config(&model, config).compute(&program).unwrap();
        let assign = analysis.cfg().node_named("assign0").unwrap().id;
        assert_eq!(analysis.value_at(assign, y.var), Some(Value::Int(Interval::new(1, 2))));
        let start = analysis.cfg().entry();
        assert_eq!(analysis.value_at(start, y.var), Some(Value::Int(Interval::new(-5, 5))));
    }

    #[test]
    fn test_errors() {
        let mut b = ProgramBuilder::new("untyped_target");
        let z = b.var("z", "float");
        let one = b.lit("1", "int");
        let stmt = b.assign(&z, one);
        let program = b.build(vec![stmt]);
        let model = build_model(&program);
        let err = AbstractSemantics::new(&model).compute(&program).unwrap_err();
        assert!(matches!(err, AnalysisError::UntypedVariable { ref var } if var == "z"));

        let mut b = ProgramBuilder::new("untyped_expr");
        let w = b.untyped_var("w");
        let y = b.var("y", "int");
        let we = b.ident(&w);
        let stmt = b.assign(&y, we);
        let program = b.build(vec![stmt]);
        let model = build_model(&program);
        let err = AbstractSemantics::new(&model).compute(&program).unwrap_err();
        assert!(matches!(err, AnalysisError::Untyped { ref expr } if expr == "w"));

        let mut b = ProgramBuilder::new("int_assume");
        let x = b.var("x", "int");
        let xe = b.ident(&x);
        let stmt = b.assume(xe);
        let program = b.build(vec![stmt]);
        let model = build_model(&program);
        let err = AbstractSemantics::new(&model).compute(&program).unwrap_err();
        assert!(matches!(err, AnalysisError::NonBooleanAssumption { .. }));
        assert_eq!(err.to_string(), "Assumption 'x' is not boolean");
    }

    #[test]
    fn test_env_included_folds_branches() {
        // split { read(y) } { y = 1 }
        let mut b = ProgramBuilder::new("env_included");
        let y = b.var("y", "int");
        let input = b.read(&y);
        let one = b.lit("1", "int");
        let assign = b.assign(&y, one);
        let split = b.split(vec![input], vec![assign]);
        let program = b.build(vec![split]);
        let model = build_model(&program);

        let states_at_join = |merge_predicate: MergePredicate| {
            let config = SemanticsConfig {
                merge_predicate,
                initial_env: None,
            };
            let analysis = AbstractSemantics::with_config(&model, config).compute(&program).unwrap();
            let join = analysis.cfg().node_named("split_join0").unwrap().id;
            analysis.states(join).to_vec()
        };

        // Neither branch trace includes the other.
        assert_eq!(states_at_join(MergePredicate::default()).len(), 2);
        assert_eq!(states_at_join(MergePredicate::EnvEqual).len(), 2);

        let states = states_at_join(MergePredicate::EnvIncluded);
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].env.get(y.var), Some(&Value::Int(Interval::new(-5, 5))));
        assert_eq!(states[0].trace.len(), 4);
    }

    #[test]
    fn test_assignment_is_clamped_to_variable_range() {
        // read(e); x = e; assume(e < 0); x = e
        let mut b = ProgramBuilder::new("clamp");
        let e = b.var("e", "int");
        let x = b.var("x", "nat");
        let input = b.read(&e);
        let ee = b.ident(&e);
        let first = b.assign(&x, ee);
        let ee = b.ident(&e);
        let zero = b.lit("0", "int");
        let negative = b.binary(ee, BinOp::Lt, zero, "bool");
        let check = b.assume(negative);
        let ee = b.ident(&e);
        let second = b.assign(&x, ee);
        let program = b.build(vec![input, first, check, second]);

        let typer = HintTyper::new()
            .with("bool", Type::Boolean)
            .with("int", Type::int(-5, 5))
            .with("nat", Type::int(0, 10));
        let model = ModelBuilder::new(typer, StandardInterpreter::new()).of(&[&program]).unwrap();
        let analysis = AbstractSemantics::new(&model).compute(&program).unwrap();
        let cfg = analysis.cfg();

        let assign = cfg.node_named("assign0").unwrap().id;
        assert_eq!(analysis.value_at(assign, x.var), Some(Value::Int(Interval::new(0, 5))));

        // A negative `e` fits no value of `x`.
        let check = cfg.node_named("assume0").unwrap().id;
        assert!(analysis.is_reachable(check));
        let assign = cfg.node_named("assign1").unwrap().id;
        assert!(!analysis.is_reachable(assign));
    }

    #[test]
    fn test_domain_mismatch_errors() {
        // read(c); split { x = c } { x = 1 }
        let mut b = ProgramBuilder::new("mismatch");
        let x = b.var("x", "int");
        let c = b.var("c", "bool");
        let input = b.read(&c);
        let ce = b.ident(&c);
        let from_bool = b.assign(&x, ce);
        let one = b.lit("1", "int");
        let from_int = b.assign(&x, one);
        let split = b.split(vec![from_bool], vec![from_int]);
        let program = b.build(vec![input, split]);
        let model = build_model(&program);

        let config = SemanticsConfig {
            merge_predicate: MergePredicate::Always,
            initial_env: None,
        };
        let err = AbstractSemantics::with_config(&model, config).compute(&program).unwrap_err();
        assert!(matches!(err, AnalysisError::DomainMismatch { ref var, ref expr } if var == "x" && expr == "c"));
        assert_eq!(err.to_string(), "Variable 'x' cannot hold the values of 'c'");

        // Initial values must belong to the variable's domain.
        let mut b = ProgramBuilder::new("init");
        let x = b.var("x", "int");
        let input = b.read(&x);
        let program = b.build(vec![input]);
        let model = build_model(&program);

        for value in [Value::Bool(BoolSet::TRUE), Value::Int(Interval::new(7, 9))] {
            let config = SemanticsConfig {
                initial_env: Some(Env::new().with(x.var, value)),
                ..Default::default()
            };
            let err = AbstractSemantics::with_config(&model, config).compute(&program).unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidInitialValue { ref var, .. } if var == "x"));
        }
    }
}
