use crate::{Callback, Constraint, Incumbent, LinExpr, Model, Sense, Trigger, ValueSource, VarId};
use anyhow::{anyhow, Result};
use log::{debug, warn};
use microlp::{ComparisonOp, OptimizationDirection, Problem};
use std::{
    panic::{self, AssertUnwindSafe},
    time::{Duration, Instant},
};

const INTEGRALITY_EPS: f64 = 1e-6;

enum Attempt {
    Solved { objective: f64, values: Vec<f64> },
    Infeasible,
    Faulted(String),
    TimedOut,
}

/// Pure-Rust backend. The model is kept as a description and rebuilt into a
/// `microlp::Problem` for every solve; lazy constraints are applied by re-solving until the
/// callback stops adding any.
///
/// `microlp` cannot be interrupted, so each round runs to completion on the calling thread and
/// the time limit is checked between rounds. A round that ends past the limit counts as a
/// timeout. Hard limits belong to the worker process that hosts the solve.
pub struct MicrolpModel {
    name: String,
    num_vars: usize,
    objective: LinExpr,
    constraints: Vec<Constraint>,
    lazy: bool,
    cut: bool,
    values: Option<Vec<f64>>,
    errored: bool,
}

impl MicrolpModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            num_vars: 0,
            objective: LinExpr::new(),
            constraints: Vec::new(),
            lazy: false,
            cut: false,
            values: None,
            errored: false,
        }
    }

    /// True once a backend fault was turned into the infeasible marker.
    pub fn errored(&self) -> bool {
        self.errored
    }

    fn check_vars(&self, expr: &LinExpr) -> Result<()> {
        match expr.max_var() {
            Some(var) if var.0 >= self.num_vars => Err(anyhow!(
                "Model {}: unknown variable {} (model has {})",
                self.name,
                var.0,
                self.num_vars
            )),
            _ => Ok(()),
        }
    }

    /// `x0 >= 1` and `x0 <= 0`: every later solve reports infeasible.
    fn force_infeasible(&mut self) {
        if self.num_vars == 0 {
            self.add_binary_var();
        }
        let x0 = LinExpr::term(VarId(0), 1.0);
        self.constraints.push(Constraint::ge(x0.clone(), 1.0));
        self.constraints.push(Constraint::le(x0, 0.0));
        self.errored = true;
        self.values = None;
    }

    fn trivially_infeasible(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| c.expr.merged().is_empty() && !c.is_satisfied(&[], INTEGRALITY_EPS))
    }

    fn build_problem(&self) -> Problem {
        let mut coeffs = vec![0.0; self.num_vars];
        for &(var, coeff) in self.objective.merged().terms() {
            coeffs[var.0] += coeff;
        }
        let mut problem = Problem::new(OptimizationDirection::Maximize);
        let vars: Vec<_> = coeffs.iter().map(|&c| problem.add_binary_var(c)).collect();
        for constraint in &self.constraints {
            let expr = constraint.expr.merged();
            if expr.is_empty() {
                continue;
            }
            let op = match constraint.sense {
                Sense::Eq => ComparisonOp::Eq,
                Sense::Le => ComparisonOp::Le,
                Sense::Ge => ComparisonOp::Ge,
            };
            problem.add_constraint(
                expr.terms()
                    .iter()
                    .map(|&(var, coeff)| (vars[var.0], coeff))
                    .collect::<Vec<_>>(),
                op,
                constraint.rhs,
            );
        }
        problem
    }

    fn run(&self, timeout: Duration) -> Attempt {
        if self.trivially_infeasible() {
            return Attempt::Infeasible;
        }
        let start = Instant::now();
        let problem = self.build_problem();
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| match problem.solve() {
            Ok(solution) => Attempt::Solved {
                objective: solution.objective(),
                values: solution
                    .iter()
                    .take(self.num_vars)
                    .map(|(_, value)| *value)
                    .collect(),
            },
            Err(microlp::Error::Infeasible) | Err(microlp::Error::Unbounded) => Attempt::Infeasible,
            Err(microlp::Error::InternalError(msg)) => Attempt::Faulted(msg),
        }))
        .unwrap_or_else(|_| Attempt::Faulted("solver panicked".to_string()));
        match attempt {
            Attempt::Solved { .. } if start.elapsed() > timeout => Attempt::TimedOut,
            attempt => attempt,
        }
    }
}

impl ValueSource for MicrolpModel {
    fn value(&self, var: VarId) -> Result<f64> {
        let values = self
            .values
            .as_ref()
            .ok_or_else(|| anyhow!("Model {} has no solution", self.name))?;
        values
            .get(var.0)
            .copied()
            .ok_or_else(|| anyhow!("Model {}: unknown variable {}", self.name, var.0))
    }
}

impl Model for MicrolpModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_binary_var(&mut self) -> VarId {
        let var = VarId(self.num_vars);
        self.num_vars += 1;
        var
    }

    fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    fn add_constraint(&mut self, constraint: Constraint) -> Result<()> {
        self.check_vars(&constraint.expr)?;
        self.constraints.push(constraint);
        Ok(())
    }

    fn set_callback_triggers(&mut self, lazy: bool, cut: bool) {
        self.lazy = lazy;
        self.cut = cut;
    }

    fn produces_fractional_incumbents(&self) -> bool {
        false
    }

    fn solve(
        &mut self,
        timeout: Duration,
        mut callback: Option<&mut dyn Callback>,
    ) -> Result<(f64, bool)> {
        self.values = None;
        if self.num_vars == 0 {
            if self.trivially_infeasible() {
                return Ok((0.0, false));
            }
            self.values = Some(Vec::new());
            return Ok((0.0, true));
        }
        let start = Instant::now();
        let mut rounds = 0;
        loop {
            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                warn!("Model {}: time limit reached", self.name);
                return Ok((0.0, false));
            }
            rounds += 1;
            let (objective, values) = match self.run(remaining) {
                Attempt::Solved { objective, values } => (objective, values),
                Attempt::Infeasible => {
                    debug!("Model {}: infeasible", self.name);
                    return Ok((0.0, false));
                }
                Attempt::TimedOut => {
                    warn!("Model {}: time limit reached", self.name);
                    return Ok((0.0, false));
                }
                Attempt::Faulted(msg) => {
                    warn!("Model {}: backend fault ({}), marking infeasible", self.name, msg);
                    self.force_infeasible();
                    return Ok((0.0, false));
                }
            };

            let callback = match callback.as_deref_mut() {
                Some(callback) if self.lazy || self.cut => callback,
                _ => {
                    self.values = Some(values);
                    return Ok((objective, true));
                }
            };
            let mut incumbent = Incumbent::new(values, objective, INTEGRALITY_EPS);
            let trigger = if self.lazy { Trigger::Lazy } else { Trigger::Cut };
            callback.call(trigger, &mut incumbent)?;
            if incumbent.is_inconsistent() {
                warn!("Model {}: inconsistent incumbent, marking infeasible", self.name);
                self.force_infeasible();
                return Ok((0.0, false));
            }
            let cuts = incumbent.take_constraints();
            if cuts.is_empty() {
                debug!("Model {}: accepted after {} rounds", self.name, rounds);
                self.values = Some(incumbent.values().to_vec());
                return Ok((objective, true));
            }
            debug!("Model {}: round {} added {} lazy constraints", self.name, rounds, cuts.len());
            for cut in cuts {
                if let Err(e) = self.add_constraint(cut) {
                    warn!("Model {}: {}, marking infeasible", self.name, e);
                    self.force_infeasible();
                    return Ok((0.0, false));
                }
            }
        }
    }

    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}
