//! Purpose tags attached by frontends to synthesized IR nodes.
//!
//! A purpose records *why* a node exists (e.g. "this assumption encodes the
//! safety check of a dereference"). The engine treats purposes opaquely: it
//! only lets checkers find the assumptions tagged with a given
//! [`PurposeKind`].

use std::fmt;

use crate::ir::{Expr, TypeHint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purpose {
    /// The assumption checks that `expr` can be dereferenced.
    DerefCheck { expr: Expr },
    /// The assumption checks that field `field_name` of `accessed_expr` exists,
    /// given the current value of discriminant `discr_name`.
    ExistCheck {
        accessed_expr: Expr,
        field_name: String,
        discr_name: String,
    },
    /// The variable was created by the frontend (e.g. to hold a temporary).
    SyntheticVariable,
    /// The node is the translation of an assignment to a record field.
    FieldAssignment {
        field_index: usize,
        field_type_hint: TypeHint,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PurposeKind {
    DerefCheck,
    ExistCheck,
    SyntheticVariable,
    FieldAssignment,
}

impl Purpose {
    pub fn kind(&self) -> PurposeKind {
        match self {
            Purpose::DerefCheck { .. } => PurposeKind::DerefCheck,
            Purpose::ExistCheck { .. } => PurposeKind::ExistCheck,
            Purpose::SyntheticVariable => PurposeKind::SyntheticVariable,
            Purpose::FieldAssignment { .. } => PurposeKind::FieldAssignment,
        }
    }

    pub fn is(&self, kind: PurposeKind) -> bool {
        self.kind() == kind
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Purpose::DerefCheck { expr } => write!(f, "DerefCheck({})", expr),
            Purpose::ExistCheck {
                accessed_expr,
                field_name,
                discr_name,
            } => write!(f, "ExistCheck({}.{} by {})", accessed_expr, field_name, discr_name),
            Purpose::SyntheticVariable => write!(f, "SyntheticVariable"),
            Purpose::FieldAssignment {
                field_index,
                field_type_hint,
            } => write!(f, "FieldAssignment({}: {})", field_index, field_type_hint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ProgramBuilder;

    #[test]
    fn test_kind() {
        let mut b = ProgramBuilder::new("p");
        let p = b.var("p", "ptr");
        let expr = b.ident(&p);

        let purpose = Purpose::DerefCheck { expr };
        assert_eq!(purpose.kind(), PurposeKind::DerefCheck);
        assert!(purpose.is(PurposeKind::DerefCheck));
        assert!(!purpose.is(PurposeKind::ExistCheck));
        assert_eq!(purpose.to_string(), "DerefCheck(p)");
    }
}
