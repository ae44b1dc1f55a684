//! Intermediate representation analysed by the engine.
//!
//! A [`Program`] is an ordered sequence of structured statements ([`Stmt`])
//! over expressions ([`Expr`]). Both are closed sum types: every component
//! of the engine (CFG builder, evaluator, solver) matches them exhaustively,
//! so a new IR shape cannot be silently ignored anywhere.
//!
//! Programs are built once through a [`ProgramBuilder`], which allocates the
//! [`ExprId`]s and [`VarId`]s that the model and environments are keyed on,
//! and are immutable afterwards. Identities are never reused, even by
//! different builders.
//!
//! # Example
//!
//! ```
//! use absint_rs::ir::{BinOp, ProgramBuilder};
//!
//! let mut b = ProgramBuilder::new("example");
//! let x = b.var("x", "int");
//! let one = b.lit("1", "int");
//! let x_expr = b.ident(&x);
//! let sum = b.binary(x_expr, BinOp::Add, one, "int");
//! let stmt = b.assign(&x, sum);
//! let program = b.build(vec![stmt]);
//!
//! assert_eq!(program.stmts()[0].to_string(), "x = x + 1");
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::purpose::Purpose;
use crate::types::{ExprId, VarId};

/// Opaque type hint attached to IR nodes by a frontend.
///
/// The engine never interprets hints itself: a [`Typer`][crate::typer::Typer]
/// maps them to semantic types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHint(Arc<str>);

impl TypeHint {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        TypeHint(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeHint {
    fn from(name: &str) -> Self {
        TypeHint::new(name)
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unary operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnOp {
    /// Boolean negation: `!e`
    Not,
    /// Arithmetic negation: `-e`
    Neg,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Not => "!",
            UnOp::Neg => "-",
        }
    }
}

/// Binary operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinOp {
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
        }
    }
}

/// An operator of either arity, as used to look up operation semantics.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    Unary(UnOp),
    Binary(BinOp),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Unary(op) => write!(f, "unary '{}'", op.symbol()),
            Op::Binary(op) => write!(f, "binary '{}'", op.symbol()),
        }
    }
}

/// Reference to a program variable, as it appears in expressions and statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub var: VarId,
    pub name: Arc<str>,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Shape of an expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// Variable reference
    Ident(Ident),
    /// Literal in its concrete textual representation (numeral, enumerator name, ...)
    Lit(Arc<str>),
    /// Unary operation: `op e`
    Unary { op: UnOp, operand: Box<Expr> },
    /// Binary operation: `lhs op rhs`
    Binary { lhs: Box<Expr>, op: BinOp, rhs: Box<Expr> },
}

/// An expression node: its identity, its shape and its (optional) type hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub hint: Option<TypeHint>,
}

impl Expr {
    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// All nodes of this expression tree, in pre-order.
    pub fn nodes(&self) -> Vec<&Expr> {
        let mut res = Vec::new();
        let mut stack = vec![self];
        while let Some(e) = stack.pop() {
            res.push(e);
            match &e.kind {
                ExprKind::Ident(_) | ExprKind::Lit(_) => {}
                ExprKind::Unary { operand, .. } => stack.push(operand),
                ExprKind::Binary { lhs, rhs, .. } => {
                    stack.push(rhs);
                    stack.push(lhs);
                }
            }
        }
        res
    }

    fn is_compound(&self) -> bool {
        matches!(self.kind, ExprKind::Binary { .. })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Ident(ident) => write!(f, "{}", ident),
            ExprKind::Lit(text) => write!(f, "{}", text),
            ExprKind::Unary { op, operand } => {
                if operand.is_compound() {
                    write!(f, "{}({})", op.symbol(), operand)
                } else {
                    write!(f, "{}{}", op.symbol(), operand)
                }
            }
            ExprKind::Binary { lhs, op, rhs } => {
                let side = |f: &mut fmt::Formatter<'_>, e: &Expr| {
                    if e.is_compound() {
                        write!(f, "({})", e)
                    } else {
                        write!(f, "{}", e)
                    }
                };
                side(f, lhs)?;
                write!(f, " {} ", op.symbol())?;
                side(f, rhs)
            }
        }
    }
}

/// Declaration of a program variable.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub id: VarId,
    pub name: Arc<str>,
    pub hint: Option<TypeHint>,
    pub purpose: Option<Purpose>,
}

/// Structured IR statements.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `var = expr`
    Assign { var: Ident, expr: Expr },
    /// `read(var)`: the variable receives an unknown value.
    Read { var: Ident },
    /// `use(var)`: the variable is observed; no effect on the state.
    Use { var: Ident },
    /// `assume(expr)`: execution continues only where `expr` holds.
    Assume { expr: Expr, purpose: Option<Purpose> },
    /// Non-deterministic choice between two statement sequences.
    Split { fst: Vec<Stmt>, snd: Vec<Stmt> },
    /// Unbounded repetition of a body; exits happen only at the loop head.
    Loop { body: Vec<Stmt> },
}

impl Stmt {
    /// Whether this statement lowers to a single CFG node.
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Stmt::Split { .. } | Stmt::Loop { .. })
    }

    pub fn purpose(&self) -> Option<&Purpose> {
        match self {
            Stmt::Assume { purpose, .. } => purpose.as_ref(),
            _ => None,
        }
    }

    /// Expressions evaluated directly by this statement (not by nested ones).
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::Assign { expr, .. } | Stmt::Assume { expr, .. } => vec![expr],
            Stmt::Read { .. } | Stmt::Use { .. } | Stmt::Split { .. } | Stmt::Loop { .. } => vec![],
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Assign { var, expr } => write!(f, "{} = {}", var, expr),
            Stmt::Read { var } => write!(f, "read({})", var),
            Stmt::Use { var } => write!(f, "use({})", var),
            Stmt::Assume { expr, .. } => write!(f, "assume({})", expr),
            Stmt::Split { fst, snd } => write!(f, "split [{} | {}]", fst.len(), snd.len()),
            Stmt::Loop { body } => write!(f, "loop [{}]", body.len()),
        }
    }
}

/// A complete IR program: its variables and its statements.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    vars: Vec<VarDecl>,
    stmts: Vec<Stmt>,
}

impl Program {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    /// Declaration of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not declared by this program.
    pub fn var(&self, id: VarId) -> &VarDecl {
        match find_var(&self.vars, id) {
            Some(decl) => decl,
            None => panic!("Variable {} is not declared in program '{}'", id, self.name),
        }
    }

    /// Looks a variable up by its name.
    pub fn var_named(&self, name: &str) -> Option<&VarDecl> {
        self.vars.iter().find(|v| &*v.name == name)
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    /// All expression nodes of the program (every sub-expression of every
    /// statement, nested statements included), in program order.
    pub fn exprs(&self) -> Vec<&Expr> {
        fn walk<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a Expr>) {
            for stmt in stmts {
                match stmt {
                    Stmt::Split { fst, snd } => {
                        walk(fst, out);
                        walk(snd, out);
                    }
                    Stmt::Loop { body } => walk(body, out),
                    _ => {
                        for e in stmt.exprs() {
                            out.extend(e.nodes());
                        }
                    }
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.stmts, &mut out);
        out
    }
}

// Identities are unique across every program built in the process, so a
// single model can describe several programs at once.
static NEXT_EXPR: AtomicU32 = AtomicU32::new(0);
static NEXT_VAR: AtomicU32 = AtomicU32::new(0);

/// Variables are declared in increasing id order.
fn find_var(vars: &[VarDecl], id: VarId) -> Option<&VarDecl> {
    vars.binary_search_by_key(&id, |v| v.id).ok().map(|i| &vars[i])
}

/// Builder for [`Program`]s: allocates node and variable identities.
#[derive(Debug)]
pub struct ProgramBuilder {
    name: String,
    vars: Vec<VarDecl>,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
        }
    }

    fn fresh_expr(&mut self) -> ExprId {
        ExprId::new(NEXT_EXPR.fetch_add(1, Ordering::Relaxed))
    }

    fn declare(&mut self, name: &str, hint: Option<TypeHint>, purpose: Option<Purpose>) -> Ident {
        let id = VarId::new(NEXT_VAR.fetch_add(1, Ordering::Relaxed));
        let name: Arc<str> = Arc::from(name);
        self.vars.push(VarDecl {
            id,
            name: name.clone(),
            hint,
            purpose,
        });
        Ident { var: id, name }
    }

    /// Declares a typed variable.
    pub fn var(&mut self, name: &str, hint: impl Into<TypeHint>) -> Ident {
        self.declare(name, Some(hint.into()), None)
    }

    /// Declares a variable without type hint (not tracked by the analysis).
    pub fn untyped_var(&mut self, name: &str) -> Ident {
        self.declare(name, None, None)
    }

    /// Declares a typed temporary introduced by a frontend.
    pub fn synthetic_var(&mut self, name: &str, hint: impl Into<TypeHint>) -> Ident {
        self.declare(name, Some(hint.into()), Some(Purpose::SyntheticVariable))
    }

    /// Reference to a declared variable. The node inherits the variable's type hint.
    pub fn ident(&mut self, var: &Ident) -> Expr {
        let hint = find_var(&self.vars, var.var).and_then(|decl| decl.hint.clone());
        Expr {
            id: self.fresh_expr(),
            kind: ExprKind::Ident(var.clone()),
            hint,
        }
    }

    pub fn lit(&mut self, text: &str, hint: impl Into<TypeHint>) -> Expr {
        Expr {
            id: self.fresh_expr(),
            kind: ExprKind::Lit(Arc::from(text)),
            hint: Some(hint.into()),
        }
    }

    pub fn unary(&mut self, op: UnOp, operand: Expr, hint: impl Into<TypeHint>) -> Expr {
        Expr {
            id: self.fresh_expr(),
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            hint: Some(hint.into()),
        }
    }

    pub fn binary(&mut self, lhs: Expr, op: BinOp, rhs: Expr, hint: impl Into<TypeHint>) -> Expr {
        Expr {
            id: self.fresh_expr(),
            kind: ExprKind::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            },
            hint: Some(hint.into()),
        }
    }

    /// Boolean negation of `cond`, typed like `cond` itself.
    pub fn not(&mut self, cond: Expr) -> Expr {
        let hint = cond.hint.clone();
        Expr {
            id: self.fresh_expr(),
            kind: ExprKind::Unary {
                op: UnOp::Not,
                operand: Box::new(cond),
            },
            hint,
        }
    }

    pub fn assign(&mut self, var: &Ident, expr: Expr) -> Stmt {
        Stmt::Assign { var: var.clone(), expr }
    }

    pub fn read(&mut self, var: &Ident) -> Stmt {
        Stmt::Read { var: var.clone() }
    }

    pub fn use_var(&mut self, var: &Ident) -> Stmt {
        Stmt::Use { var: var.clone() }
    }

    pub fn assume(&mut self, expr: Expr) -> Stmt {
        Stmt::Assume { expr, purpose: None }
    }

    /// An assumption synthesized for a given purpose (a safety check, ...).
    pub fn assume_with(&mut self, expr: Expr, purpose: Purpose) -> Stmt {
        Stmt::Assume {
            expr,
            purpose: Some(purpose),
        }
    }

    pub fn split(&mut self, fst: Vec<Stmt>, snd: Vec<Stmt>) -> Stmt {
        Stmt::Split { fst, snd }
    }

    /// Lowers `if cond then fst else snd`: each branch of the split starts
    /// with the assumption of `cond` (resp. `!cond`).
    pub fn if_then_else(&mut self, cond: Expr, fst: Vec<Stmt>, snd: Vec<Stmt>) -> Stmt {
        let not_cond = self.not(cond.clone());

        let mut then_stmts = vec![self.assume(cond)];
        then_stmts.extend(fst);
        let mut else_stmts = vec![self.assume(not_cond)];
        else_stmts.extend(snd);

        self.split(then_stmts, else_stmts)
    }

    pub fn loop_stmt(&mut self, body: Vec<Stmt>) -> Stmt {
        Stmt::Loop { body }
    }

    /// Lowers `while cond do body` into `loop { assume(cond); body }; assume(!cond)`.
    pub fn while_loop(&mut self, cond: Expr, body: Vec<Stmt>) -> Vec<Stmt> {
        let not_cond = self.not(cond.clone());

        let mut loop_body = vec![self.assume(cond)];
        loop_body.extend(body);

        vec![self.loop_stmt(loop_body), self.assume(not_cond)]
    }

    pub fn build(self, stmts: Vec<Stmt>) -> Program {
        Program {
            name: self.name,
            vars: self.vars,
            stmts,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_ids_are_fresh() {
        let mut b = ProgramBuilder::new("p");
        let x = b.var("x", "int");
        let e1 = b.ident(&x);
        let e2 = b.lit("3", "int");
        assert_ne!(e1.id, e2.id);
        assert_eq!(e1.hint, Some(TypeHint::from("int")));
    }

    #[test]
    fn test_ids_are_unique_across_programs() {
        let mut b1 = ProgramBuilder::new("p1");
        let mut b2 = ProgramBuilder::new("p2");
        let x = b1.var("x", "int");
        let c = b2.var("c", "bool");
        let y = b1.var("y", "int");
        assert_ne!(x.var, c.var);

        let xe = b1.ident(&x);
        let ce = b2.ident(&c);
        assert_ne!(xe.id, ce.id);
        assert_eq!(ce.hint, Some(TypeHint::from("bool")));

        let p1 = b1.build(vec![]);
        assert_eq!(&*p1.var(y.var).name, "y");
        assert_eq!(&*p1.var(x.var).name, "x");
    }

    #[test]
    fn test_pretty_print() {
        let mut b = ProgramBuilder::new("p");
        let x = b.var("x", "int");
        let xe = b.ident(&x);
        let one = b.lit("1", "int");
        let sub = b.binary(xe, BinOp::Sub, one, "int");
        let zero = b.lit("0", "int");
        let cmp = b.binary(sub, BinOp::Gt, zero, "bool");
        assert_eq!(cmp.to_string(), "(x - 1) > 0");

        let neg = b.not(cmp);
        assert_eq!(neg.to_string(), "!((x - 1) > 0)");
    }

    #[test]
    fn test_if_then_else_seeds_assumptions() {
        let mut b = ProgramBuilder::new("p");
        let c = b.var("c", "bool");
        let ce = b.ident(&c);
        let split = b.if_then_else(ce, vec![], vec![]);

        match split {
            Stmt::Split { fst, snd } => {
                assert_eq!(fst.len(), 1);
                assert_eq!(snd.len(), 1);
                assert_eq!(fst[0].to_string(), "assume(c)");
                assert_eq!(snd[0].to_string(), "assume(!c)");
            }
            _ => panic!("expected a split"),
        }
    }

    #[test]
    fn test_program_exprs() {
        let mut b = ProgramBuilder::new("p");
        let x = b.var("x", "int");
        let xe = b.ident(&x);
        let ten = b.lit("10", "int");
        let cond = b.binary(xe, BinOp::Lt, ten, "bool");
        let stmts = b.while_loop(cond, vec![]);
        let program = b.build(stmts);

        // `x < 10` (3 nodes) in the loop, `!(x < 10)` (4 nodes) after it.
        assert_eq!(program.exprs().len(), 7);
        assert_eq!(program.var_named("x").map(|v| v.id), Some(x.var));
    }
}
