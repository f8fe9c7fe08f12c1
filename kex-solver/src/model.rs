use crate::{Constraint, VarId};
use anyhow::{anyhow, Result};
use std::{collections::BTreeMap, ops::Index, time::Duration};

/// Anything variable values can be read from: a solved model or a mid-solve snapshot.
pub trait ValueSource {
    fn value(&self, var: VarId) -> Result<f64>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// A candidate incumbent is about to be accepted.
    Lazy,
    /// A fractional node solution may be tightened.
    Cut,
}

/// Snapshot handed to a callback. Values are read through `ValueSource`, constraints added
/// here are applied to the model before solving resumes.
#[derive(Debug, Clone)]
pub struct Incumbent {
    values: Vec<f64>,
    objective: f64,
    integral: bool,
    constraints: Vec<Constraint>,
    inconsistent: bool,
}

impl Incumbent {
    pub fn new(values: Vec<f64>, objective: f64, eps: f64) -> Self {
        let integral = values.iter().all(|v| (v - v.round()).abs() <= eps);
        Self {
            values,
            objective,
            integral,
            constraints: Vec::new(),
            inconsistent: false,
        }
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn is_integral(&self) -> bool {
        self.integral
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn take_constraints(&mut self) -> Vec<Constraint> {
        std::mem::take(&mut self.constraints)
    }

    /// Flags that the snapshot could not be interpreted. The surrounding solve then reports
    /// not-optimal.
    pub fn mark_inconsistent(&mut self) {
        self.inconsistent = true;
    }

    pub fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }
}

impl ValueSource for Incumbent {
    fn value(&self, var: VarId) -> Result<f64> {
        self.values
            .get(var.0)
            .copied()
            .ok_or_else(|| anyhow!("Variable {} is not part of the snapshot", var.0))
    }
}

pub trait Callback {
    fn call(&mut self, trigger: Trigger, incumbent: &mut Incumbent) -> Result<()>;
}

impl<F> Callback for F
where
    F: FnMut(Trigger, &mut Incumbent) -> Result<()>,
{
    fn call(&mut self, trigger: Trigger, incumbent: &mut Incumbent) -> Result<()> {
        self(trigger, incumbent)
    }
}

/// Maximisation model over binary variables.
pub trait Model: ValueSource + Send {
    fn name(&self) -> &str;

    fn add_binary_var(&mut self) -> VarId;

    fn set_objective(&mut self, objective: crate::LinExpr);

    fn add_constraint(&mut self, constraint: Constraint) -> Result<()>;

    /// Selects which solver events invoke the callback passed to `solve`.
    fn set_callback_triggers(&mut self, lazy: bool, cut: bool);

    /// Whether `Trigger::Cut` callbacks can ever see fractional values.
    fn produces_fractional_incumbents(&self) -> bool;

    /// Solves within `timeout`, returning `(objective, optimal)`. A timeout, an infeasible
    /// model or a backend fault all report `optimal == false`.
    fn solve(&mut self, timeout: Duration, callback: Option<&mut dyn Callback>) -> Result<(f64, bool)>;

    fn num_vars(&self) -> usize;

    fn num_constraints(&self) -> usize;
}

/// One binary variable per key.
#[derive(Debug, Clone)]
pub struct Vars<K: Ord + Clone> {
    vars: BTreeMap<K, VarId>,
}

impl<K: Ord + Clone> Vars<K> {
    pub fn new<I: IntoIterator<Item = K>>(model: &mut dyn Model, keys: I) -> Self {
        let mut vars = BTreeMap::new();
        for key in keys {
            if !vars.contains_key(&key) {
                vars.insert(key, model.add_binary_var());
            }
        }
        Self { vars }
    }

    pub fn get(&self, key: &K) -> Option<VarId> {
        self.vars.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, VarId)> {
        self.vars.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn values<S: ValueSource + ?Sized>(&self, source: &S) -> Result<BTreeMap<K, f64>> {
        self.vars
            .iter()
            .map(|(k, v)| Ok((k.clone(), source.value(*v)?)))
            .collect()
    }
}

impl<K: Ord + Clone> Index<&K> for Vars<K> {
    type Output = VarId;

    /// Panics when `key` was not part of the key collection, like `BTreeMap` indexing.
    fn index(&self, key: &K) -> &VarId {
        &self.vars[key]
    }
}
