//! Checkers built on top of the analysis results.
//!
//! A checker collects the `assume` nodes tagged with one purpose kind and
//! evaluates the checked condition at each of them with
//! [`Analysis::eval_at`]. Every trace along which the condition may be false
//! is reported as a [`Finding`]: *precise* when the condition is known to be
//! false there, *potential* otherwise.

use std::fmt;

use crate::boolean::BoolSet;
use crate::purpose::{Purpose, PurposeKind};
use crate::query::Analysis;
use crate::trace::Trace;
use crate::types::NodeId;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The check node.
    pub node: NodeId,
    /// Path reaching the check, ending at `node`.
    pub trace: Trace,
    pub purpose: Purpose,
    /// The check fails on every execution following the trace.
    pub precise: bool,
}

impl Finding {
    pub fn message(&self) -> String {
        let prefix = if self.precise { "" } else { "(potential) " };
        match &self.purpose {
            Purpose::DerefCheck { expr } => format!("{}null dereference of '{}'", prefix, expr),
            Purpose::ExistCheck { field_name, .. } => format!("{}invalid field '{}'", prefix, field_name),
            other => format!("{}failed check {}", prefix, other),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} along {}", self.message(), self.node, self.trace)
    }
}

/// Reports the dereferences that may be performed on a null access value.
pub fn find_null_derefs(analysis: &Analysis<'_>) -> Vec<Finding> {
    find_failed_checks(analysis, PurposeKind::DerefCheck)
}

/// Reports the record field accesses that may be invalid under the current
/// value of the discriminant.
pub fn find_invalid_accesses(analysis: &Analysis<'_>) -> Vec<Finding> {
    find_failed_checks(analysis, PurposeKind::ExistCheck)
}

/// Generic checker: one finding per trace along which an `assume` tagged
/// with `kind` may not hold.
pub fn find_failed_checks(analysis: &Analysis<'_>, kind: PurposeKind) -> Vec<Finding> {
    let mut findings = Vec::new();
    for check in analysis.cfg().assumes_with_purpose(kind) {
        for (trace, value) in analysis.eval_at(check.node, check.expr) {
            if !value.may_be_false() {
                continue;
            }
            let precise = value == Value::Bool(BoolSet::FALSE);
            log::trace!("Check '{}' may fail along {} (precise: {})", check.expr, trace, precise);
            findings.push(Finding {
                node: check.node,
                trace,
                purpose: check.purpose.clone(),
                precise,
            });
        }
    }
    log::debug!(
        "Found {} failed {:?} check(s) in '{}'",
        findings.len(),
        kind,
        analysis.cfg().program().name()
    );
    findings
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::fixpoint::AbstractSemantics;
    use crate::interp::StandardInterpreter;
    use crate::ir::{BinOp, ProgramBuilder};
    use crate::model::ModelBuilder;
    use crate::typer::{HintTyper, Type};

    fn typer() -> HintTyper {
        HintTyper::new().with("bool", Type::Boolean).with("ptr", Type::access("Ptr"))
    }

    #[test]
    fn test_null_deref() {
        // read(p); use(*p) where the dereference is guarded only on one branch.
        let mut b = ProgramBuilder::new("deref");
        let p = b.var("p", "ptr");
        let input = b.read(&p);
        let pe = b.ident(&p);
        let null = b.lit("null", "ptr");
        let guard = b.binary(pe, BinOp::Neq, null, "bool");
        let branch = b.if_then_else(guard, vec![], vec![]);
        let pe = b.ident(&p);
        let null = b.lit("null", "ptr");
        let check = b.binary(pe, BinOp::Neq, null, "bool");
        let pe = b.ident(&p);
        let deref = b.assume_with(check, Purpose::DerefCheck { expr: pe });
        let program = b.build(vec![input, branch, deref]);

        let model = ModelBuilder::new(typer(), StandardInterpreter::new()).of(&[&program]).unwrap();
        let analysis = AbstractSemantics::new(&model).compute(&program).unwrap();
        let findings = find_null_derefs(&analysis);

        // Only the else branch (p == null) fails, definitely.
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert!(finding.precise);
        assert_eq!(finding.message(), "null dereference of 'p'");
        let else_assume = analysis.cfg().node_named("assume1").unwrap().id;
        assert!(finding.trace.contains(else_assume));
        assert!(find_invalid_accesses(&analysis).is_empty());
    }

    #[test]
    fn test_potential_null_deref() {
        let mut b = ProgramBuilder::new("deref");
        let p = b.var("p", "ptr");
        let input = b.read(&p);
        let pe = b.ident(&p);
        let null = b.lit("null", "ptr");
        let check = b.binary(pe, BinOp::Neq, null, "bool");
        let pe = b.ident(&p);
        let deref = b.assume_with(check, Purpose::DerefCheck { expr: pe });
        let program = b.build(vec![input, deref]);

        let model = ModelBuilder::new(typer(), StandardInterpreter::new()).of(&[&program]).unwrap();
        let analysis = AbstractSemantics::new(&model).compute(&program).unwrap();
        let findings = find_null_derefs(&analysis);
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].precise);
        assert_eq!(findings[0].message(), "(potential) null dereference of 'p'");
    }
}
