use tracing::{debug, trace};

use crate::error::{Result, SolverError};
use crate::model::Model;
use crate::solution::SolutionStatus;

/// Bounded-variable revised simplex and the branch-and-bound driver built on it
#[derive(Debug, Clone)]
pub struct Solver {
    /// Tolerance for reduced costs, pivot elements and bound checks
    pub(crate) tolerance: f64,
    /// Distance from `floor(x)` beyond which an integer variable is fractional
    pub(crate) integrality_tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            integrality_tolerance: 1e-4,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn integrality_tolerance(&self) -> f64 {
        self.integrality_tolerance
    }

    /// Solve the LP relaxation of `model`, ignoring `x_int`.
    ///
    /// Writes `status`, `x` and `z` on the model; the problem data is left untouched.
    pub fn solve(&self, model: &mut Model) -> Result<SolutionStatus> {
        model.validate()?;
        let outcome = self.run(model)?;
        Ok(outcome.apply(model))
    }

    /// Two-phase loop over a validated model
    pub(crate) fn run(&self, model: &Model) -> Result<LpOutcome> {
        let mut tableau = Tableau::new(model);
        let mut phase = Phase::One;
        let mut iteration = 0;

        loop {
            iteration += 1;
            tableau.price(model, phase);

            let s = match self.entering(&tableau, model.n) {
                Some(s) => s,
                None => match phase {
                    Phase::One => {
                        let infeasibility = tableau.basic_objective();
                        if infeasibility > self.tolerance {
                            debug!(iteration, infeasibility, "phase 1 optimal with positive artificials, infeasible");
                            return Ok(LpOutcome::Infeasible);
                        }
                        debug!(iteration, "phase 1 complete, switching to phase 2");
                        phase = Phase::Two;
                        tableau.load_costs(model);
                        continue;
                    }
                    Phase::Two => {
                        let x = tableau.x[..model.n].to_vec();
                        let z: f64 = x.iter().zip(&model.c).map(|(xj, cj)| cj * xj).sum();
                        debug!(iteration, z, "phase 2 optimal");
                        return Ok(LpOutcome::Optimal { x, z });
                    }
                },
            };

            tableau.compute_column(model, s);
            let (step, leaving) = self.ratio_test(&tableau, model, s);

            if step >= f64::INFINITY {
                return match phase {
                    Phase::One => Err(SolverError::Phase1DeadEnd { iteration }),
                    Phase::Two => {
                        debug!(iteration, entering = s, "no limiting bound in phase 2, unbounded");
                        Ok(LpOutcome::Unbounded)
                    }
                };
            }

            trace!(iteration, ?phase, entering = s, ?leaving, step, "pivot");
            tableau.step(s, step);
            match leaving {
                Some(r) => tableau.pivot(model, r, s, phase, self.tolerance),
                None => tableau.flip(s),
            }
        }
    }

    /// Dantzig rule over structural columns; the first minimum wins ties
    fn entering(&self, tableau: &Tableau, n: usize) -> Option<usize> {
        let mut best = -self.tolerance;
        let mut entering = None;
        for j in 0..n {
            let score = tableau.status[j].sign() * tableau.rc[j];
            if score < best {
                best = score;
                entering = Some(j);
            }
        }
        entering
    }

    /// Bounded ratio test. `None` as the leaving row means the entering variable
    /// flips to its opposite bound. Uses `<=` so later rows win exact ties.
    fn ratio_test(&self, tableau: &Tableau, model: &Model, s: usize) -> (f64, Option<usize>) {
        let sigma = tableau.status[s].sign();
        let mut min_ratio = model.x_ub[s] - model.x_lb[s];
        let mut leaving = None;

        for (i, &alpha) in tableau.column.iter().enumerate() {
            let j = tableau.basic[i];
            let (lb, ub) = tableau.bounds(model, j);
            let x = tableau.x[j];

            if -sigma * alpha > self.tolerance {
                let ratio = (x - ub) / (sigma * alpha);
                if ratio <= min_ratio {
                    min_ratio = ratio;
                    leaving = Some(i);
                }
            }
            if sigma * alpha > self.tolerance {
                let ratio = (x - lb) / (sigma * alpha);
                if ratio <= min_ratio {
                    min_ratio = ratio;
                    leaving = Some(i);
                }
            }
        }

        (min_ratio, leaving)
    }
}

/// Terminal state of one LP solve
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LpOutcome {
    Optimal { x: Vec<f64>, z: f64 },
    Infeasible,
    Unbounded,
}

impl LpOutcome {
    pub(crate) fn apply(self, model: &mut Model) -> SolutionStatus {
        model.clear_solution();
        model.status = match self {
            LpOutcome::Optimal { x, z } => {
                model.x = Some(x);
                model.z = Some(z);
                SolutionStatus::Optimal
            }
            LpOutcome::Infeasible => SolutionStatus::Infeasible,
            LpOutcome::Unbounded => SolutionStatus::Unbounded,
        };
        model.status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    One,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarStatus {
    Basic,
    NonbasicAtLower,
    NonbasicAtUpper,
}

impl VarStatus {
    /// Direction in which a nonbasic variable may move; zero for basics
    fn sign(self) -> f64 {
        match self {
            VarStatus::Basic => 0.0,
            VarStatus::NonbasicAtLower => 1.0,
            VarStatus::NonbasicAtUpper => -1.0,
        }
    }
}

/// Working state of one LP solve: values for the `n` structurals followed by
/// the `m` artificials, the basis and its explicit inverse.
struct Tableau {
    n: usize,
    x: Vec<f64>,
    status: Vec<VarStatus>,
    basic: Vec<usize>,
    binv: Vec<Vec<f64>>,
    /// Objective coefficients of the basic variables, by row
    cb: Vec<f64>,
    pi: Vec<f64>,
    rc: Vec<f64>,
    /// `Binv * A_s` for the current entering column
    column: Vec<f64>,
}

impl Tableau {
    /// All-artificial starting basis. Each structural sits at the bound with the
    /// smaller magnitude (upper on ties); artificial `i` takes column
    /// `sign(r_i) e_i` so that it starts at `|r_i| >= 0`.
    fn new(model: &Model) -> Self {
        let (m, n) = (model.m, model.n);
        let mut x = vec![0.0; n + m];
        let mut status = vec![VarStatus::Basic; n + m];

        for j in 0..n {
            let (lb, ub) = (model.x_lb[j], model.x_ub[j]);
            if lb.abs() < ub.abs() {
                x[j] = lb;
                status[j] = VarStatus::NonbasicAtLower;
            } else {
                x[j] = ub;
                status[j] = VarStatus::NonbasicAtUpper;
            }
        }

        let mut binv = vec![vec![0.0; m]; m];
        for i in 0..m {
            let activity: f64 = model.a[i].iter().zip(&x[..n]).map(|(aij, xj)| aij * xj).sum();
            let residual = model.b[i] - activity;
            binv[i][i] = if residual < 0.0 { -1.0 } else { 1.0 };
            x[n + i] = residual.abs();
        }

        Self {
            n,
            x,
            status,
            basic: (n..n + m).collect(),
            binv,
            cb: vec![1.0; m],
            pi: vec![0.0; m],
            rc: vec![0.0; n],
            column: vec![0.0; m],
        }
    }

    /// Simplex multipliers and reduced costs of the structural columns
    fn price(&mut self, model: &Model, phase: Phase) {
        let m = self.basic.len();
        for i in 0..m {
            self.pi[i] = (0..m).map(|k| self.cb[k] * self.binv[k][i]).sum();
        }
        for j in 0..self.n {
            let cost = match phase {
                Phase::One => 0.0,
                Phase::Two => model.c[j],
            };
            self.rc[j] = cost - (0..m).map(|i| self.pi[i] * model.a[i][j]).sum::<f64>();
        }
    }

    fn basic_objective(&self) -> f64 {
        self.cb.iter().zip(&self.basic).map(|(cb, &j)| cb * self.x[j]).sum()
    }

    /// Phase 2 costs: true costs for structural basics, zero for artificials
    fn load_costs(&mut self, model: &Model) {
        for (cb, &j) in self.cb.iter_mut().zip(&self.basic) {
            *cb = if j < self.n { model.c[j] } else { 0.0 };
        }
    }

    fn compute_column(&mut self, model: &Model, s: usize) {
        let m = self.basic.len();
        for i in 0..m {
            self.column[i] = (0..m).map(|k| self.binv[i][k] * model.a[k][s]).sum();
        }
    }

    fn bounds(&self, model: &Model, j: usize) -> (f64, f64) {
        if j < self.n {
            (model.x_lb[j], model.x_ub[j])
        } else {
            (0.0, f64::INFINITY)
        }
    }

    /// Move the entering variable by `step` and let the basics follow
    fn step(&mut self, s: usize, step: f64) {
        let delta = self.status[s].sign() * step;
        self.x[s] += delta;
        for (i, &j) in self.basic.iter().enumerate() {
            self.x[j] -= delta * self.column[i];
        }
    }

    /// Gauss-Jordan pivot of `binv` on row `r`, then swap `s` into the basis
    fn pivot(&mut self, model: &Model, r: usize, s: usize, phase: Phase, tol: f64) {
        let m = self.basic.len();
        let pivot = self.column[r];
        for i in 0..m {
            if i != r {
                let factor = self.column[i] / pivot;
                for k in 0..m {
                    self.binv[i][k] -= factor * self.binv[r][k];
                }
            }
        }
        for k in 0..m {
            self.binv[r][k] /= pivot;
        }

        self.status[s] = VarStatus::Basic;

        let leaving = self.basic[r];
        let (lb, ub) = self.bounds(model, leaving);
        let value = self.x[leaving];
        self.status[leaving] = if (value - ub).abs() < tol {
            VarStatus::NonbasicAtUpper
        } else if (value - lb).abs() < tol {
            VarStatus::NonbasicAtLower
        } else if (value - lb).abs() <= (value - ub).abs() {
            VarStatus::NonbasicAtLower
        } else {
            VarStatus::NonbasicAtUpper
        };

        self.cb[r] = match phase {
            Phase::One => 0.0,
            Phase::Two => model.c[s],
        };
        self.basic[r] = s;
    }

    fn flip(&mut self, s: usize) {
        self.status[s] = match self.status[s] {
            VarStatus::NonbasicAtLower => VarStatus::NonbasicAtUpper,
            _ => VarStatus::NonbasicAtLower,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: f64 = f64::INFINITY;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (j, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-6, "x[{}] = {} (expected {})", j, a, e);
        }
    }

    #[test]
    fn test_bounded_lp() {
        // min -10 x0 - x1
        //   2 x0 + x1 + s0 = 40
        //  20 x0 + x1 + s1 = 100
        //   2 <= x0 <= 3
        let mut model = Model::new(
            vec![vec![2.0, 1.0, 1.0, 0.0], vec![20.0, 1.0, 0.0, 1.0]],
            vec![40.0, 100.0],
            vec![-10.0, -1.0, 0.0, 0.0],
        )
        .with_bounds(vec![2.0, 0.0, 0.0, 0.0], vec![3.0, INF, INF, INF]);

        let status = Solver::new().solve(&mut model).unwrap();

        assert_eq!(status, SolutionStatus::Optimal);
        assert_eq!(model.status, SolutionStatus::Optimal);
        assert_close(model.x.as_ref().unwrap(), &[3.0, 34.0, 0.0, 6.0]);
        assert!((model.z.unwrap() + 64.0).abs() < 1e-6, "z = {:?} (expected -64)", model.z);
    }

    #[test]
    fn test_solve_leaves_problem_data_alone() {
        let original = Model::new(
            vec![vec![2.0, 1.0, 1.0, 0.0], vec![20.0, 1.0, 0.0, 1.0]],
            vec![40.0, 100.0],
            vec![-10.0, -1.0, 0.0, 0.0],
        )
        .with_bounds(vec![2.0, 0.0, 0.0, 0.0], vec![3.0, INF, INF, INF]);
        let mut model = original.clone();
        Solver::new().solve(&mut model).unwrap();

        assert_eq!(model.a, original.a);
        assert_eq!(model.b, original.b);
        assert_eq!(model.c, original.c);
        assert_eq!(model.x_lb, original.x_lb);
        assert_eq!(model.x_ub, original.x_ub);
        assert_eq!(model.x_int, original.x_int);
    }

    #[test]
    fn test_upper_bounds_via_flips() {
        // min -3 x0 - 2 x1,  x0 + x1 + s = 4,  x0, x1 in [0, 3]
        // Optimal: x0 = 3, x1 = 1, obj = -11
        let mut model = Model::new(vec![vec![1.0, 1.0, 1.0]], vec![4.0], vec![-3.0, -2.0, 0.0])
            .with_bounds(vec![0.0, 0.0, 0.0], vec![3.0, 3.0, INF]);

        let status = Solver::new().solve(&mut model).unwrap();

        assert_eq!(status, SolutionStatus::Optimal);
        assert_close(model.x.as_ref().unwrap(), &[3.0, 1.0, 0.0]);
        assert!((model.z.unwrap() + 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_constraints() {
        // max x + y,  x + y <= 4,  x - y <= 1
        let mut model = Model::new(
            vec![vec![1.0, 1.0, 1.0, 0.0], vec![1.0, -1.0, 0.0, 1.0]],
            vec![4.0, 1.0],
            vec![-1.0, -1.0, 0.0, 0.0],
        );

        Solver::new().solve(&mut model).unwrap();

        assert_eq!(model.status, SolutionStatus::Optimal);
        assert_close(model.x.as_ref().unwrap(), &[2.5, 1.5, 0.0, 0.0]);
        assert!((model.z.unwrap() + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_row() {
        // x0 + x1 = 5 with x0 <= 3, x1 <= 1
        let mut model = Model::new(vec![vec![1.0, 1.0]], vec![5.0], vec![1.0, 0.0])
            .with_bounds(vec![0.0, 0.0], vec![3.0, 1.0]);

        let status = Solver::new().solve(&mut model).unwrap();

        assert_eq!(status, SolutionStatus::Infeasible);
        assert!(model.x.is_none());
        assert!(model.z.is_none());
    }

    #[test]
    fn test_lower_bound_above_reachable() {
        // x0 + s = 1 but x0 >= 2
        let mut model = Model::new(vec![vec![1.0, 1.0]], vec![1.0], vec![1.0, 0.0])
            .with_bounds(vec![2.0, 0.0], vec![3.0, INF]);

        let status = Solver::new().solve(&mut model).unwrap();

        assert_eq!(status, SolutionStatus::Infeasible);
        assert!(model.x.is_none());
        assert!(model.z.is_none());
    }

    #[test]
    fn test_unbounded() {
        // min -x0,  x0 - x1 = 1
        let mut model = Model::new(vec![vec![1.0, -1.0]], vec![1.0], vec![-1.0, 0.0]);

        let status = Solver::new().solve(&mut model).unwrap();

        assert_eq!(status, SolutionStatus::Unbounded);
        assert!(model.x.is_none());
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let mut model = Model::new(vec![vec![1.0, 1.0]], vec![1.0], vec![1.0, 0.0])
            .with_bounds(vec![2.0, 0.0], vec![1.0, INF]);

        let err = Solver::new().solve(&mut model).unwrap_err();

        assert!(matches!(err, SolverError::InvalidModel(_)));
        assert_eq!(model.status, SolutionStatus::Unsolved);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let model = Model::new(
            vec![vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0], vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0], vec![0.5, 0.5, 1.0, 1.0, 0.0, 1.0]],
            vec![1.0, 1.0, 1.0],
            vec![-1.0, -1.0, -1.0, 0.0, 0.0, 0.0],
        );
        let mut first = model.clone();
        let mut second = model.clone();
        let solver = Solver::new();
        solver.solve(&mut first).unwrap();
        solver.solve(&mut second).unwrap();

        assert_eq!(first.status, SolutionStatus::Optimal);
        assert_eq!(first.status, second.status);
        assert_eq!(first.x, second.x);
        assert_eq!(first.z, second.z);
        assert!((first.z.unwrap() + 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_phase1_dead_end_is_an_error() {
        // every |alpha| is below the tolerance while the summed reduced cost is not
        let mut model = Model::new(vec![vec![9e-7], vec![9e-7]], vec![1.0, 1.0], vec![0.0]);

        let err = Solver::new().solve(&mut model).unwrap_err();

        assert!(matches!(err, SolverError::Phase1DeadEnd { .. }), "{:?}", err);
        assert_eq!(model.status, SolutionStatus::Unsolved);
        assert!(model.x.is_none());
    }

    #[test]
    fn test_ratio_tie_picks_last_row() {
        let model = Model::new(vec![vec![1.0], vec![1.0]], vec![1.0, 1.0], vec![-1.0]);
        let mut tableau = Tableau::new(&model);
        assert_eq!(tableau.basic, vec![1, 2]);
        assert_eq!(tableau.x, vec![0.0, 1.0, 1.0]);
        tableau.column = vec![1.0, 1.0];

        let (step, leaving) = Solver::new().ratio_test(&tableau, &model, 0);

        assert_eq!(step, 1.0);
        assert_eq!(leaving, Some(1));
    }

    #[test]
    fn test_ratio_equal_to_flip_distance_changes_basis() {
        let model = Model::new(vec![vec![1.0]], vec![1.0], vec![-1.0]).with_bounds(vec![0.0], vec![1.0]);
        let mut tableau = Tableau::new(&model);
        let solver = Solver::new();

        tableau.column = vec![1.0];
        assert_eq!(solver.ratio_test(&tableau, &model, 0), (1.0, Some(0)));

        // a row that allows a longer step leaves the bound flip in place
        tableau.column = vec![0.5];
        assert_eq!(solver.ratio_test(&tableau, &model, 0), (1.0, None));
    }

    #[test]
    fn test_entering_tie_picks_first_column() {
        // x2 starts at its upper bound 0, so a positive reduced cost improves
        let model = Model::new(vec![vec![1.0, 1.0, 1.0]], vec![1.0], vec![0.0, 0.0, 0.0])
            .with_bounds(vec![0.0, 0.0, -5.0], vec![INF, INF, 0.0]);
        let mut tableau = Tableau::new(&model);
        assert_eq!(tableau.status[2], VarStatus::NonbasicAtUpper);
        let solver = Solver::new();

        tableau.rc = vec![-2.0, -3.0, 3.0];
        assert_eq!(solver.entering(&tableau, model.n), Some(1));

        tableau.rc = vec![-2.0, -1.0, 3.0];
        assert_eq!(solver.entering(&tableau, model.n), Some(2));

        tableau.rc = vec![0.0, -1e-7, -1e-7];
        assert_eq!(solver.entering(&tableau, model.n), None);
    }
}
