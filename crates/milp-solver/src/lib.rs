mod branch;
mod error;
mod model;
mod simplex;
mod solution;

pub use branch::{NodeEvent, NodeOutcome, SearchObserver};
pub use error::{Result, SolverError};
pub use model::{Branch, Model};
pub use simplex::Solver;
pub use solution::{SearchStats, SolutionStatus};

/// Solve the LP relaxation of `model` with default tolerances
pub fn solve(model: &mut Model) -> Result<SolutionStatus> {
    Solver::new().solve(model)
}

/// Solve `model` by branch-and-bound with default tolerances
pub fn solve_milp(model: &mut Model) -> Result<SearchStats> {
    Solver::new().solve_milp(model)
}
