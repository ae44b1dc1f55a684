//! Null-dereference checking on a small hand-built program.
//!
//! ```text
//! read(p); read(n);
//! q = null;
//! if n > 0 then q = p;
//! if p != null then *p;
//! *q;
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --example null_deref -- --merge never --dot null_deref.dot
//! dot -Tpng null_deref.dot -o null_deref.png
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use absint_rs::checkers::find_null_derefs;
use absint_rs::fixpoint::{AbstractSemantics, SemanticsConfig};
use absint_rs::interp::StandardInterpreter;
use absint_rs::ir::{BinOp, Ident, Program, ProgramBuilder, Stmt};
use absint_rs::merge::MergePredicate;
use absint_rs::model::ModelBuilder;
use absint_rs::purpose::Purpose;
use absint_rs::typer::{HintTyper, Type};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Merge {
    Always,
    Never,
    TraceIncluded,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Trace merging policy.
    #[arg(long, value_enum, default_value_t = Merge::TraceIncluded)]
    merge: Merge,

    /// Write the annotated CFG to this DOT file.
    #[arg(long, value_name = "PATH")]
    dot: Option<PathBuf>,

    /// Print the computed states.
    #[arg(long)]
    dump: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

/// `assume(ptr != null)`, tagged as the check of dereferencing `ptr`.
fn deref(b: &mut ProgramBuilder, ptr: &Ident) -> Stmt {
    let pe = b.ident(ptr);
    let null = b.lit("null", "ptr");
    let cond = b.binary(pe, BinOp::Neq, null, "bool");
    let target = b.ident(ptr);
    b.assume_with(cond, Purpose::DerefCheck { expr: target })
}

fn build_program() -> Program {
    let mut b = ProgramBuilder::new("null_deref");
    let p = b.var("p", "ptr");
    let q = b.var("q", "ptr");
    let n = b.var("n", "int");

    let read_p = b.read(&p);
    let read_n = b.read(&n);
    let null = b.lit("null", "ptr");
    let init_q = b.assign(&q, null);

    let ne = b.ident(&n);
    let zero = b.lit("0", "int");
    let positive = b.binary(ne, BinOp::Gt, zero, "bool");
    let pe = b.ident(&p);
    let copy = b.assign(&q, pe);
    let maybe_copy = b.if_then_else(positive, vec![copy], vec![]);

    let pe = b.ident(&p);
    let null = b.lit("null", "ptr");
    let not_null = b.binary(pe, BinOp::Neq, null, "bool");
    let deref_p = deref(&mut b, &p);
    let guarded = b.if_then_else(not_null, vec![deref_p], vec![]);

    let deref_q = deref(&mut b, &q);

    b.build(vec![read_p, read_n, init_q, maybe_copy, guarded, deref_q])
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.debug {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let program = build_program();

    let typer = HintTyper::new()
        .with("bool", Type::Boolean)
        .with("int", Type::int(-100, 100))
        .with("ptr", Type::access("Ptr"));
    let model = ModelBuilder::new(typer, StandardInterpreter::new()).of(&[&program])?;

    let merge_predicate = match args.merge {
        Merge::Always => MergePredicate::Always,
        Merge::Never => MergePredicate::Never,
        Merge::TraceIncluded => MergePredicate::TraceIncluded,
    };
    let config = SemanticsConfig {
        merge_predicate,
        initial_env: None,
    };

    let time_analysis = std::time::Instant::now();
    let analysis = AbstractSemantics::with_config(&model, config).compute(&program)?;
    let time_analysis = time_analysis.elapsed();
    println!(
        "Analysis of '{}': {} nodes, {} visits, {:.3}s",
        program.name(),
        analysis.cfg().len(),
        analysis.total_visits(),
        time_analysis.as_secs_f64()
    );

    if args.dump {
        println!("{}", analysis);
    }

    let findings = find_null_derefs(&analysis);
    println!("Found {} finding(s):", findings.len());
    for finding in &findings {
        let node = analysis.cfg().node(finding.node);
        println!("- {}: {}", node.name, finding.message());
        println!("  along {}", finding.trace);
    }

    if let Some(path) = &args.dot {
        analysis.cfg().save_dot(path, &findings)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
