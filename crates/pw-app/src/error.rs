use std::path::PathBuf;

/// Failure reported to the CLI, with backend errors flattened to text.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("scenario: {0}")]
    Scenario(String),

    #[error("no scenario file at {path}")]
    ScenarioNotFound { path: PathBuf },

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("run store: {0}")]
    Results(String),

    #[error("no stored run {0}")]
    RunNotFound(String),

    #[error("bad request: {0}")]
    InvalidInput(String),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<pw_scenario::ScenarioError> for AppError {
    fn from(err: pw_scenario::ScenarioError) -> Self {
        AppError::Scenario(err.to_string())
    }
}

impl From<pw_scenario::ValidationError> for AppError {
    fn from(err: pw_scenario::ValidationError) -> Self {
        AppError::Scenario(err.to_string())
    }
}

impl From<pw_sim::SimError> for AppError {
    fn from(err: pw_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<pw_results::ResultsError> for AppError {
    fn from(err: pw_results::ResultsError) -> Self {
        match err {
            pw_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
