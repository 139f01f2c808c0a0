//! Shared application service layer for the heat-up engine.
//!
//! Frontends go through this crate to load scenarios, run or fetch cached
//! runs, drive a paced live session, and query stored telemetry.

pub mod error;
pub mod live;
pub mod progress;
pub mod query;
pub mod run_service;
pub mod scenario_service;

pub use error::{AppError, AppResult};
pub use live::{FrameStats, LiveSession};
pub use progress::{HeatupProgress, RunProgressEvent, RunStage};
pub use query::{
    RunSummary, extract_series, filter_events, get_run_summary, list_variables, mode_timeline,
};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    list_runs, load_events, load_run,
};
pub use scenario_service::{ScenarioSummary, load_scenario, summarize};
