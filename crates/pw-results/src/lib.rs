//! Persisted heat-up runs.
//!
//! A run is keyed by a hash of its scenario and solver version, so asking
//! for the same heat-up twice reads it back instead of ticking it again.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("run store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed run file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no stored run with id {run_id}")]
    RunNotFound { run_id: String },

    #[error("cannot place run store: {message}")]
    InvalidPath { message: String },
}
