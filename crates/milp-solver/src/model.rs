use crate::error::{Result, SolverError};
use crate::solution::SolutionStatus;

/// A linear program in equality form, optionally with integer variables.
///
/// Minimize `c'x` subject to `A x = b` and `x_lb <= x <= x_ub`. Inequalities must
/// already carry their slack or surplus columns in `a`. The same type serves as
/// the root problem and as every branch-and-bound node.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Number of constraint rows
    pub m: usize,
    /// Number of structural variables
    pub n: usize,
    /// Constraint matrix, `m` rows of `n` coefficients
    pub a: Vec<Vec<f64>>,
    /// Right-hand side
    pub b: Vec<f64>,
    /// Objective coefficients (minimized)
    pub c: Vec<f64>,
    /// Lower bounds, may be `f64::NEG_INFINITY`
    pub x_lb: Vec<f64>,
    /// Upper bounds, may be `f64::INFINITY`
    pub x_ub: Vec<f64>,
    /// Integrality flags
    pub x_int: Vec<bool>,
    /// Solution values, set only when `status` is `Optimal`
    pub x: Option<Vec<f64>>,
    /// Objective value, set only when `status` is `Optimal`
    pub z: Option<f64>,
    pub status: SolutionStatus,
}

/// Side of a fractional value kept by a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// `x_ub[k] = floor(v)`
    Down,
    /// `x_lb[k] = ceil(v)`
    Up,
}

impl Model {
    /// Create a model with bounds `[0, inf)` and no integer variables
    pub fn new(a: Vec<Vec<f64>>, b: Vec<f64>, c: Vec<f64>) -> Self {
        let m = a.len();
        let n = c.len();
        Self {
            m,
            n,
            a,
            b,
            c,
            x_lb: vec![0.0; n],
            x_ub: vec![f64::INFINITY; n],
            x_int: vec![false; n],
            x: None,
            z: None,
            status: SolutionStatus::Unsolved,
        }
    }

    pub fn with_bounds(mut self, x_lb: Vec<f64>, x_ub: Vec<f64>) -> Self {
        self.x_lb = x_lb;
        self.x_ub = x_ub;
        self
    }

    pub fn with_integers(mut self, x_int: Vec<bool>) -> Self {
        self.x_int = x_int;
        self
    }

    pub fn num_integers(&self) -> usize {
        self.x_int.iter().filter(|&&flag| flag).count()
    }

    pub fn clear_solution(&mut self) {
        self.x = None;
        self.z = None;
        self.status = SolutionStatus::Unsolved;
    }

    /// Check dimensions and bounds before any indexing happens.
    ///
    /// Besides the shape invariants this rejects non-finite data and variables
    /// with no finite bound, since the simplex start places every structural
    /// variable at one of its bounds.
    pub fn validate(&self) -> Result<()> {
        if self.a.len() != self.m {
            return Err(invalid(format!("A has {} rows, expected m = {}", self.a.len(), self.m)));
        }
        for (i, row) in self.a.iter().enumerate() {
            if row.len() != self.n {
                return Err(invalid(format!("row {} of A has {} columns, expected n = {}", i, row.len(), self.n)));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(invalid(format!("A[{}][{}] is not finite", i, j)));
            }
        }
        check_len("b", self.b.len(), self.m)?;
        check_len("c", self.c.len(), self.n)?;
        check_len("xLB", self.x_lb.len(), self.n)?;
        check_len("xUB", self.x_ub.len(), self.n)?;
        check_len("xINT", self.x_int.len(), self.n)?;

        if let Some(i) = self.b.iter().position(|v| !v.is_finite()) {
            return Err(invalid(format!("b[{}] is not finite", i)));
        }
        if let Some(j) = self.c.iter().position(|v| !v.is_finite()) {
            return Err(invalid(format!("c[{}] is not finite", j)));
        }

        for j in 0..self.n {
            let (lb, ub) = (self.x_lb[j], self.x_ub[j]);
            if lb.is_nan() || ub.is_nan() {
                return Err(invalid(format!("bounds of variable {} are NaN", j)));
            }
            if lb == f64::INFINITY || ub == f64::NEG_INFINITY {
                return Err(invalid(format!("variable {} has bounds [{}, {}]", j, lb, ub)));
            }
            if lb > ub {
                return Err(invalid(format!("variable {} has xLB = {} > xUB = {}", j, lb, ub)));
            }
            if lb.is_infinite() && ub.is_infinite() {
                return Err(invalid(format!("variable {} is free; at least one bound must be finite", j)));
            }
        }
        Ok(())
    }

    /// Deep copy with one bound tightened around `value` and no solution attached.
    pub fn tightened(&self, index: usize, value: f64, branch: Branch) -> Model {
        let mut child = self.clone();
        match branch {
            Branch::Down => child.x_ub[index] = value.floor(),
            Branch::Up => child.x_lb[index] = value.ceil(),
        }
        child.clear_solution();
        child
    }
}

fn check_len(name: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(invalid(format!("{} has length {}, expected {}", name, actual, expected)));
    }
    Ok(())
}

fn invalid(message: String) -> SolverError {
    SolverError::InvalidModel(message)
}
