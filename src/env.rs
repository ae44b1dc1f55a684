//! Abstract environments: one abstract value per tracked variable.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::AbstractDomain;
use crate::ir::Program;
use crate::model::Model;
use crate::types::VarId;
use crate::value::{Domain, Value};

/// Map from variables to abstract values.
///
/// Only typed variables are tracked. Lattice operations are variable-wise,
/// using the domain the model assigns to each variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Env {
    values: BTreeMap<VarId, Value>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every typed variable of `program` bound to the top of its domain.
    pub fn top(program: &Program, model: &Model) -> Self {
        let values = program
            .vars()
            .iter()
            .filter_map(|v| model.var_domain(v.id).map(|d| (v.id, d.top())))
            .collect();
        Self { values }
    }

    pub fn get(&self, var: VarId) -> Option<&Value> {
        self.values.get(&var)
    }

    pub fn set(&mut self, var: VarId, value: Value) {
        self.values.insert(var, value);
    }

    pub fn with(mut self, var: VarId, value: Value) -> Self {
        self.set(var, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Value)> + '_ {
        self.values.iter().map(|(&v, x)| (v, x))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// An environment is bottom as soon as one variable has no possible value.
    pub fn is_bottom(&self) -> bool {
        self.values.values().any(Value::is_empty)
    }

    pub fn join(&self, other: &Env, model: &Model) -> Env {
        self.combine(other, model, |d, a, b| d.join(a, b))
    }

    pub fn widen(&self, other: &Env, model: &Model) -> Env {
        self.combine(other, model, |d, a, b| d.widen(a, b))
    }

    pub fn le(&self, other: &Env, model: &Model) -> bool {
        self.values.iter().all(|(var, a)| match (other.values.get(var), model.var_domain(*var)) {
            (Some(b), Some(d)) => d.le(a, b),
            (Some(b), None) => a == b,
            (None, _) => a.is_empty(),
        })
    }

    /// Variable-wise combination. Variables bound on one side only keep their value.
    fn combine(&self, other: &Env, model: &Model, f: impl Fn(&Domain, &Value, &Value) -> Value) -> Env {
        let mut res = self.clone();
        for (&var, b) in &other.values {
            let value = match (self.values.get(&var), model.var_domain(var)) {
                (Some(a), Some(d)) => f(d.as_ref(), a, b),
                _ => *b,
            };
            res.values.insert(var, value);
        }
        res
    }

    /// Renders the environment with variable names and domain-specific
    /// value notation: `x = [3, 3], y = {Red, Green}`.
    pub fn display<'a>(&'a self, program: &'a Program, model: &'a Model) -> impl fmt::Display + 'a {
        EnvDisplay { env: self, program, model }
    }
}

struct EnvDisplay<'a> {
    env: &'a Env,
    program: &'a Program,
    model: &'a Model,
}

impl fmt::Display for EnvDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (var, value) in self.env.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            let name = &self.program.var(var).name;
            match self.model.var_domain(var) {
                Some(d) => write!(f, "{} = {}", name, d.display(value))?,
                None => write!(f, "{} = {}", name, value)?,
            }
        }
        Ok(())
    }
}
