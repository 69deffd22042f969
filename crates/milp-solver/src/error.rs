use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    /// Phase 1 found an improving column that no bound limits. The artificial
    /// objective should always be bounded below, so this is a numerical defect.
    #[error("Phase 1 ratio test found no limiting bound at iteration {iteration}")]
    Phase1DeadEnd { iteration: usize },
}

pub type Result<T> = std::result::Result<T, SolverError>;
