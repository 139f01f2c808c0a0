//! Scenario loading and introspection.

use pw_scenario::Scenario;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// What a frontend shows after validating a scenario file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub version: u32,
    pub dt_s: f64,
    pub t_end_s: f64,
    pub ticks: u64,
    pub sg_nodes: usize,
    pub scheduled_flows: usize,
}

/// Load, migrate and validate a scenario file (YAML or JSON).
pub fn load_scenario(path: &Path) -> AppResult<Scenario> {
    if !path.exists() {
        return Err(AppError::ScenarioNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(pw_scenario::load(path)?)
}

pub fn summarize(scenario: &Scenario) -> ScenarioSummary {
    let time = &scenario.plant.time;
    ScenarioSummary {
        id: scenario.id.clone(),
        name: scenario.name.clone(),
        version: scenario.version,
        dt_s: time.dt_s,
        t_end_s: time.t_end_s,
        ticks: (time.t_end_s / time.dt_s).round() as u64,
        sg_nodes: scenario.plant.geometry.sg_nodes,
        scheduled_flows: scenario.schedule.len(),
    }
}
