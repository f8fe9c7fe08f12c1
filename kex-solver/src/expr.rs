use std::collections::HashMap;

/// Index of a variable inside the model that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

/// Ordered list of `(variable, coefficient)` terms.
///
/// Terms may repeat while an expression is being built; `merged` folds them before the
/// expression reaches a backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(var: VarId, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
        }
    }

    /// Sum of the given variables with coefficient 1.
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
        }
    }

    pub fn weighted<I: IntoIterator<Item = (VarId, f64)>>(terms: I) -> Self {
        Self {
            terms: terms.into_iter().collect(),
        }
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    /// Accumulates `scale * other` into this expression.
    pub fn add_expr(&mut self, other: &LinExpr, scale: f64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * scale)));
        self
    }

    pub fn plus(mut self, var: VarId, coeff: f64) -> Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn minus(mut self, other: &LinExpr) -> Self {
        self.add_expr(other, -1.0);
        self
    }

    /// One term per variable in first-seen order, zero coefficients dropped.
    pub fn merged(&self) -> LinExpr {
        let mut positions: HashMap<VarId, usize> = HashMap::new();
        let mut terms: Vec<(VarId, f64)> = Vec::with_capacity(self.terms.len());
        for &(var, coeff) in &self.terms {
            match positions.get(&var) {
                Some(&i) => terms[i].1 += coeff,
                None => {
                    positions.insert(var, terms.len());
                    terms.push((var, coeff));
                }
            }
        }
        terms.retain(|(_, c)| *c != 0.0);
        LinExpr { terms }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn max_var(&self) -> Option<VarId> {
        self.terms.iter().map(|(v, _)| *v).max()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Eq,
    Le,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(expr: LinExpr, sense: Sense, rhs: f64) -> Self {
        Self { expr, sense, rhs }
    }

    pub fn eq(expr: LinExpr, rhs: f64) -> Self {
        Self::new(expr, Sense::Eq, rhs)
    }

    pub fn le(expr: LinExpr, rhs: f64) -> Self {
        Self::new(expr, Sense::Le, rhs)
    }

    pub fn ge(expr: LinExpr, rhs: f64) -> Self {
        Self::new(expr, Sense::Ge, rhs)
    }

    pub fn is_satisfied(&self, values: &[f64], eps: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Eq => (lhs - self.rhs).abs() <= eps,
            Sense::Le => lhs <= self.rhs + eps,
            Sense::Ge => lhs >= self.rhs - eps,
        }
    }
}
