//! # absint-rs: trace-sensitive abstract interpretation
//!
//! **`absint-rs`** is a small abstract-interpretation engine for programs
//! lowered to a structured intermediate representation (IR). It proves or
//! refutes the feasibility of runtime errors, such as null dereferences or
//! accesses to record fields absent under the current discriminant.
//!
//! ## Pipeline
//!
//! 1. A frontend builds a [`Program`][crate::ir::Program] with the
//!    [`ProgramBuilder`][crate::ir::ProgramBuilder], tagging the
//!    assumptions it synthesizes for safety checks with a
//!    [`Purpose`][crate::purpose::Purpose].
//! 2. A [`ModelBuilder`][crate::model::ModelBuilder] maps every typed IR node
//!    to an abstract domain and to the forward and inverse semantics of its
//!    operator.
//! 3. [`AbstractSemantics`][crate::fixpoint::AbstractSemantics] lowers the
//!    program to a [`Cfg`][crate::cfg::Cfg] and computes, for every program
//!    point, the reachable abstract environments partitioned by execution
//!    trace.
//! 4. Checkers query the resulting [`Analysis`][crate::query::Analysis] with
//!    [`eval_at`][crate::query::Analysis::eval_at].
//!
//! ## Basic Usage
//!
//! ```rust
//! use absint_rs::fixpoint::AbstractSemantics;
//! use absint_rs::interp::StandardInterpreter;
//! use absint_rs::interval::Interval;
//! use absint_rs::ir::{BinOp, ProgramBuilder};
//! use absint_rs::model::ModelBuilder;
//! use absint_rs::typer::{HintTyper, Type};
//! use absint_rs::value::Value;
//!
//! // read(x); assume(x > 2)
//! let mut b = ProgramBuilder::new("example");
//! let x = b.var("x", "int");
//! let input = b.read(&x);
//! let xe = b.ident(&x);
//! let two = b.lit("2", "int");
//! let cond = b.binary(xe, BinOp::Gt, two, "bool");
//! let check = b.assume(cond);
//! let program = b.build(vec![input, check]);
//!
//! let typer = HintTyper::new().with("bool", Type::Boolean).with("int", Type::int(0, 10));
//! let model = ModelBuilder::new(typer, StandardInterpreter::new()).of(&[&program]).unwrap();
//! let analysis = AbstractSemantics::new(&model).compute(&program).unwrap();
//!
//! let node = analysis.cfg().node_named("assume0").unwrap().id;
//! assert_eq!(analysis.value_at(node, x.var), Some(Value::Int(Interval::new(3, 10))));
//! ```
//!
//! ## Core Components
//!
//! - **[`fixpoint`]**: the worklist engine.
//! - **[`solver`]**: backward narrowing of environments by conditions.
//! - **[`merge`]**: policies deciding which traces are kept apart.
//! - **[`checkers`]** and **[`dot`]**: findings and their visualization.

pub mod boolean;
pub mod cfg;
pub mod checkers;
pub mod consteval;
pub mod domain;
pub mod dot;
pub mod env;
pub mod eval;
pub mod finite;
pub mod fixpoint;
pub mod interp;
pub mod interval;
pub mod ir;
pub mod merge;
pub mod model;
pub mod purpose;
pub mod query;
pub mod semantics;
pub mod solver;
pub mod trace;
pub mod typer;
pub mod types;
pub mod utils;
pub mod value;
