//! Fixpoint engine benchmarks.
//!
//! Run with:
//! ```bash
//! cargo bench --bench fixpoint
//! ```

use absint_rs::fixpoint::{AbstractSemantics, SemanticsConfig};
use absint_rs::interp::StandardInterpreter;
use absint_rs::ir::{BinOp, Program, ProgramBuilder, Stmt};
use absint_rs::merge::MergePredicate;
use absint_rs::model::{Model, ModelBuilder};
use absint_rs::typer::{HintTyper, Type};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ============================================================================
// Helper: nested counting loops
// ============================================================================

/// `depth` nested loops, each counting its own variable up to 10, with a
/// branch on the parity-like test `x_i < 5` in the innermost body.
fn nested_loops(depth: usize) -> Program {
    let mut b = ProgramBuilder::new(format!("nested_{}", depth));
    let vars: Vec<_> = (0..depth).map(|i| b.var(&format!("x{}", i), "int")).collect();
    let y = b.var("y", "int");

    // Innermost body.
    let last = &vars[depth - 1];
    let xe = b.ident(last);
    let five = b.lit("5", "int");
    let cond = b.binary(xe, BinOp::Lt, five, "bool");
    let ye = b.ident(&y);
    let one = b.lit("1", "int");
    let inc = b.binary(ye, BinOp::Add, one, "int");
    let then_stmt = b.assign(&y, inc);
    let ye = b.ident(&y);
    let one = b.lit("1", "int");
    let dec = b.binary(ye, BinOp::Sub, one, "int");
    let else_stmt = b.assign(&y, dec);
    let mut body: Vec<Stmt> = vec![b.if_then_else(cond, vec![then_stmt], vec![else_stmt])];

    for x in vars.iter().rev() {
        let xe = b.ident(x);
        let one = b.lit("1", "int");
        let inc = b.binary(xe, BinOp::Add, one, "int");
        body.push(b.assign(x, inc));

        let xe = b.ident(x);
        let ten = b.lit("10", "int");
        let cond = b.binary(xe, BinOp::Lt, ten, "bool");
        let zero = b.lit("0", "int");
        let mut stmts = vec![b.assign(x, zero)];
        stmts.extend(b.while_loop(cond, body));
        body = stmts;
    }

    let zero = b.lit("0", "int");
    let mut stmts = vec![b.assign(&y, zero)];
    stmts.extend(body);
    b.build(stmts)
}

fn model_of(program: &Program) -> Model {
    let typer = HintTyper::new().with("bool", Type::Boolean).with("int", Type::int(-1000, 1000));
    ModelBuilder::new(typer, StandardInterpreter::new())
        .of(&[program])
        .unwrap()
}

// ============================================================================
// Benchmark: nesting depth
// ============================================================================

fn bench_nested_loops(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixpoint/nested_loops");
    group.sample_size(10);

    for depth in [1, 2, 3, 4] {
        let program = nested_loops(depth);
        let model = model_of(&program);
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, _| {
            b.iter(|| {
                let analysis = AbstractSemantics::new(&model).compute(black_box(&program)).unwrap();
                analysis.total_visits()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: merge predicates
// ============================================================================

fn bench_merge_predicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixpoint/merge_predicates");
    group.sample_size(10);

    let program = nested_loops(3);
    let model = model_of(&program);
    let predicates = [
        ("always", MergePredicate::Always),
        ("trace_included", MergePredicate::TraceIncluded),
        ("never", MergePredicate::Never),
    ];

    for (name, predicate) in predicates {
        let config = SemanticsConfig {
            merge_predicate: predicate,
            initial_env: None,
        };
        let semantics = AbstractSemantics::with_config(&model, config);
        group.bench_function(name, |b| {
            b.iter(|| {
                let analysis = semantics.compute(black_box(&program)).unwrap();
                analysis.total_visits()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nested_loops, bench_merge_predicates);

criterion_main!(benches);
