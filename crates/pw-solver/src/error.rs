//! Error types for solver setup.
//!
//! Non-convergence is not an error: it is reported through
//! `ClosureResult::converged` so the tick can keep its last valid state.

use pw_core::PwError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: &'static str },

    #[error("Invalid solver configuration: {what}")]
    InvalidConfig { what: &'static str },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for PwError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { what } => PwError::InvalidArg { what },
            SolverError::InvalidConfig { what } => PwError::InvalidArg { what },
        }
    }
}
