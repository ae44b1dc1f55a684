//! Models: what each IR node means to the analysis.
//!
//! A [`Model`] associates every typed expression node of one or more programs
//! with a [`ModelEntry`]: its abstract domain and, depending on the node
//! kind, its literal value or its operation semantics. It also records the
//! domain of every typed variable.
//!
//! Models are built by a [`ModelBuilder`], which composes a [`Typer`] (hint
//! to type) with a [`TypeInterpreter`] (type to interpretation) through two
//! caches. The caches make the composition idempotent: identical hints yield
//! the same type, and identical types yield the *same* domain instance, so
//! that values of nodes of the same type can be joined and widened together.
//! Several models built by the same builder share their domains.
//!
//! Every failure is a configuration error: the typer and interpreter do not
//! cover the programs being modeled.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::domain::AbstractDomain;
use crate::interp::{Definition, Interpretation, Inverse, LitBuilder, SemanticsProvider, Signature, TypeInterpreter};
use crate::ir::{Expr, ExprKind, Op, Program, TypeHint};
use crate::typer::{Type, Typer};
use crate::types::{ExprId, VarId};
use crate::value::{DomainRef, Value};

#[derive(Debug, Clone)]
pub enum ModelError {
    /// The typer produced a type the interpreter does not know.
    MissingInterpretation { hint: TypeHint, ty: Type },
    /// No semantics provider defines the operation for these domains.
    MissingDefinition { op: Op, signature: String, expr: String },
    /// No semantics provider inverts the operation for these domains.
    MissingInverse { op: Op, signature: String, expr: String },
    /// A literal cannot be represented in its domain.
    InvalidLiteral { text: String, domain: String, expr: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::MissingInterpretation { hint, ty } => {
                write!(f, "No interpretation for type '{}' (hint '{}')", ty, hint)
            }
            ModelError::MissingDefinition { op, signature, expr } => {
                write!(f, "No definition of {} for {} (in '{}')", op, signature, expr)
            }
            ModelError::MissingInverse { op, signature, expr } => {
                write!(f, "No inverse of {} for {} (in '{}')", op, signature, expr)
            }
            ModelError::InvalidLiteral { text, domain, expr } => {
                write!(f, "Literal '{}' is not a value of {} (in '{}')", text, domain, expr)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// What the model knows about one expression node.
#[derive(Clone)]
pub enum ModelEntry {
    Ident {
        domain: DomainRef,
    },
    Lit {
        domain: DomainRef,
        builder: LitBuilder,
        /// The literal's value, as computed by `builder`.
        value: Value,
    },
    Op {
        domain: DomainRef,
        op: Op,
        definition: Definition,
        inverse: Inverse,
    },
}

impl ModelEntry {
    pub fn domain(&self) -> &DomainRef {
        match self {
            ModelEntry::Ident { domain } | ModelEntry::Lit { domain, .. } | ModelEntry::Op { domain, .. } => domain,
        }
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelEntry::Ident { domain } => f.debug_struct("Ident").field("domain", domain).finish(),
            ModelEntry::Lit { domain, value, .. } => f
                .debug_struct("Lit")
                .field("domain", domain)
                .field("value", value)
                .finish_non_exhaustive(),
            ModelEntry::Op { domain, op, .. } => f
                .debug_struct("Op")
                .field("domain", domain)
                .field("op", op)
                .finish_non_exhaustive(),
        }
    }
}

/// Meaning of the typed nodes and variables of some programs.
///
/// Immutable once built; can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Model {
    entries: HashMap<ExprId, ModelEntry>,
    vars: BTreeMap<VarId, DomainRef>,
}

impl Model {
    pub fn get(&self, id: ExprId) -> Option<&ModelEntry> {
        self.entries.get(&id)
    }

    pub fn entry(&self, expr: &Expr) -> Option<&ModelEntry> {
        self.get(expr.id)
    }

    pub fn domain_of(&self, expr: &Expr) -> Option<&DomainRef> {
        self.entry(expr).map(ModelEntry::domain)
    }

    pub fn var_domain(&self, var: VarId) -> Option<&DomainRef> {
        self.vars.get(&var)
    }

    /// Typed variables and their domains, by increasing id.
    pub fn var_domains(&self) -> impl Iterator<Item = (VarId, &DomainRef)> + '_ {
        self.vars.iter().map(|(&v, d)| (v, d))
    }

    /// Number of modeled expression nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds [`Model`]s from a typer and a type interpreter.
pub struct ModelBuilder<T, I> {
    typer: T,
    interpreter: I,
    hint_cache: HashMap<TypeHint, Option<Type>>,
    type_cache: HashMap<Type, Option<Interpretation>>,
    lenient: bool,
}

impl<T: Typer, I: TypeInterpreter> ModelBuilder<T, I> {
    pub fn new(typer: T, interpreter: I) -> Self {
        Self {
            typer,
            interpreter,
            hint_cache: HashMap::new(),
            type_cache: HashMap::new(),
            lenient: false,
        }
    }

    /// In lenient mode, a literal its domain cannot represent is modeled as
    /// the top of the domain (with a warning) instead of failing the build.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    fn hint_to_type(&mut self, hint: &TypeHint) -> Option<Type> {
        if let Some(ty) = self.hint_cache.get(hint) {
            return ty.clone();
        }
        let ty = self.typer.from_hint(hint);
        self.hint_cache.insert(hint.clone(), ty.clone());
        ty
    }

    fn type_to_interp(&mut self, ty: &Type) -> Option<Interpretation> {
        if let Some(interp) = self.type_cache.get(ty) {
            return interp.clone();
        }
        let interp = self.interpreter.from_type(ty);
        self.type_cache.insert(ty.clone(), interp.clone());
        interp
    }

    /// Interpretation of a hint. `Ok(None)` means the hint denotes no type.
    fn interpret(&mut self, hint: &TypeHint) -> Result<Option<Interpretation>, ModelError> {
        let Some(ty) = self.hint_to_type(hint) else {
            return Ok(None);
        };
        match self.type_to_interp(&ty) {
            Some(interp) => Ok(Some(interp)),
            None => Err(ModelError::MissingInterpretation { hint: hint.clone(), ty }),
        }
    }

    /// Builds the model of the given programs.
    pub fn of(&mut self, programs: &[&Program]) -> Result<Model, ModelError> {
        let mut model = Model::default();
        let mut interps: HashMap<ExprId, Interpretation> = HashMap::new();
        let mut providers: Vec<Arc<dyn SemanticsProvider>> = Vec::new();

        let mut register = |interp: &Interpretation| {
            if !providers.iter().any(|p| Arc::ptr_eq(p, &interp.provider)) {
                providers.push(interp.provider.clone());
            }
        };

        let mut exprs: Vec<&Expr> = Vec::new();
        for program in programs {
            for var in program.vars() {
                let Some(hint) = &var.hint else { continue };
                if let Some(interp) = self.interpret(hint)? {
                    register(&interp);
                    model.vars.insert(var.id, interp.domain.clone());
                }
            }
            for expr in program.exprs() {
                let Some(hint) = &expr.hint else { continue };
                if let Some(interp) = self.interpret(hint)? {
                    register(&interp);
                    interps.insert(expr.id, interp);
                    exprs.push(expr);
                }
            }
        }

        for expr in exprs {
            let interp = &interps[&expr.id];
            if let Some(entry) = self.entry(expr, interp, &interps, &providers)? {
                model.entries.insert(expr.id, entry);
            }
        }

        log::debug!(
            "Built model of {} program(s): {} nodes, {} variables, {} semantics provider(s)",
            programs.len(),
            model.entries.len(),
            model.vars.len(),
            providers.len()
        );
        Ok(model)
    }

    fn entry(
        &self,
        expr: &Expr,
        interp: &Interpretation,
        interps: &HashMap<ExprId, Interpretation>,
        providers: &[Arc<dyn SemanticsProvider>],
    ) -> Result<Option<ModelEntry>, ModelError> {
        let domain = interp.domain.clone();
        let (op, operands): (Op, Vec<&Expr>) = match &expr.kind {
            ExprKind::Ident(_) => return Ok(Some(ModelEntry::Ident { domain })),
            ExprKind::Lit(text) => return self.literal(expr, text, interp).map(Some),
            ExprKind::Unary { op, operand } => (Op::Unary(*op), vec![operand]),
            ExprKind::Binary { lhs, op, rhs } => (Op::Binary(*op), vec![lhs, rhs]),
        };

        // An operation over an untyped operand has no meaning either.
        let Some(operand_domains) = operands
            .iter()
            .map(|e| interps.get(&e.id).map(|i| i.domain.clone()))
            .collect::<Option<Vec<_>>>()
        else {
            return Ok(None);
        };

        let signature = Signature {
            operands: operand_domains,
            result: domain.clone(),
        };
        let definition = providers
            .iter()
            .find_map(|p| p.definition(op, &signature))
            .ok_or_else(|| ModelError::MissingDefinition {
                op,
                signature: signature.to_string(),
                expr: expr.to_string(),
            })?;
        let inverse = providers
            .iter()
            .find_map(|p| p.inverse(op, &signature))
            .ok_or_else(|| ModelError::MissingInverse {
                op,
                signature: signature.to_string(),
                expr: expr.to_string(),
            })?;

        Ok(Some(ModelEntry::Op {
            domain,
            op,
            definition,
            inverse,
        }))
    }

    fn literal(&self, expr: &Expr, text: &str, interp: &Interpretation) -> Result<ModelEntry, ModelError> {
        let domain = interp.domain.clone();
        let value = match (interp.builder)(text) {
            Some(value) if domain.accepts(&value) => value,
            _ if self.lenient => {
                log::warn!("Literal '{}' is not a value of {}, using top", text, domain);
                domain.top()
            }
            _ => {
                return Err(ModelError::InvalidLiteral {
                    text: text.to_string(),
                    domain: domain.to_string(),
                    expr: expr.to_string(),
                })
            }
        };
        Ok(ModelEntry::Lit {
            domain,
            builder: interp.builder.clone(),
            value,
        })
    }
}
