//! Scenario schema definitions.
//!
//! Plant sections sit at the top level of the file next to the scenario
//! metadata; any section left out takes the plant defaults.

use pw_sim::{BoundarySource, PlantConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operator boundary flows on top of the automatic CVCS
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedule: Vec<ScheduledFlowDef>,
    #[serde(flatten)]
    pub plant: PlantConfig,
}

impl Scenario {
    /// Default plant with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            schedule: Vec::new(),
            plant: PlantConfig::default(),
        }
    }

    /// Schedule entries sorted by time.
    pub fn sorted_schedule(&self) -> Vec<ScheduledFlowDef> {
        let mut schedule = self.schedule.clone();
        schedule.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
        schedule
    }
}

/// A one-off boundary delta applied at a given simulated time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScheduledFlowDef {
    pub at_s: f64,
    pub source: FlowSourceDef,
    /// Signed mass delta; inflows positive, outflows negative
    pub delta_lb: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowSourceDef {
    Charging,
    Letdown,
    SealLeakoff,
    Relief,
    Makeup,
}

impl From<FlowSourceDef> for BoundarySource {
    fn from(def: FlowSourceDef) -> Self {
        match def {
            FlowSourceDef::Charging => BoundarySource::Charging,
            FlowSourceDef::Letdown => BoundarySource::Letdown,
            FlowSourceDef::SealLeakoff => BoundarySource::SealLeakoff,
            FlowSourceDef::Relief => BoundarySource::Relief,
            FlowSourceDef::Makeup => BoundarySource::Makeup,
        }
    }
}
