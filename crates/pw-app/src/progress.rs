//! Progress events streamed while a run executes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingScenario,
    CheckingCache,
    LoadingCachedResult,
    BuildingPlant,
    Running,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::LoadingScenario => "loading scenario",
            RunStage::CheckingCache => "checking cache",
            RunStage::LoadingCachedResult => "loading cached run",
            RunStage::BuildingPlant => "building plant",
            RunStage::Running => "running",
            RunStage::SavingResults => "saving",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatupProgress {
    pub sim_time_s: f64,
    pub t_end_s: f64,
    pub fraction_complete: f64,
    pub tick: u64,
    /// Plant mode as `Regime/Phase`
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub heatup: Option<HeatupProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            heatup: None,
        }
    }
}
