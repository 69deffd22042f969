/// Outcome of the most recent solve on a model
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolutionStatus {
    /// The model has not been solved yet (or was modified since)
    #[default]
    Unsolved,
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The objective can decrease without limit
    Unbounded,
}

impl SolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionStatus::Unsolved => "UNSOLVED",
            SolutionStatus::Optimal => "OPTIMAL",
            SolutionStatus::Infeasible => "INFEASIBLE",
            SolutionStatus::Unbounded => "UNBOUNDED",
        }
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected over one branch-and-bound run
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Final status written to the root model
    pub status: SolutionStatus,
    /// LP relaxations solved
    pub nodes: usize,
    /// Nodes discarded because their relaxation was infeasible
    pub fathomed_infeasible: usize,
    /// Nodes discarded because their relaxation could not beat the incumbent
    pub fathomed_by_bound: usize,
    /// Nodes whose relaxed solution was already integral
    pub integer_feasible: usize,
    /// How many times the incumbent was replaced
    pub incumbent_updates: usize,
    /// Nodes split into two children
    pub branched: usize,
    /// Largest worklist length observed
    pub peak_open: usize,
}
