//! Scenario validation.

use crate::schema::Scenario;
use pw_sim::{BoundarySource, state::FlowDirection};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid plant configuration: {what}")]
    Plant { what: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }
    if scenario.id.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "id".to_string(),
            value: format!("{:?}", scenario.id),
            reason: "must not be empty".to_string(),
        });
    }

    scenario
        .plant
        .validate()
        .map_err(|e| ValidationError::Plant {
            what: e.to_string(),
        })?;

    let t_end = scenario.plant.time.t_end_s;
    for (i, entry) in scenario.schedule.iter().enumerate() {
        let field = |name: &str| format!("schedule[{i}].{name}");
        if !(entry.at_s.is_finite() && entry.at_s >= 0.0 && entry.at_s <= t_end) {
            return Err(ValidationError::InvalidValue {
                field: field("at_s"),
                value: entry.at_s.to_string(),
                reason: "must lie within the run".to_string(),
            });
        }
        let source = BoundarySource::from(entry.source);
        let sign_ok = entry.delta_lb.is_finite()
            && match source.direction() {
                FlowDirection::Inflow => entry.delta_lb >= 0.0,
                FlowDirection::Outflow => entry.delta_lb <= 0.0,
            };
        if !sign_ok {
            return Err(ValidationError::InvalidValue {
                field: field("delta_lb"),
                value: entry.delta_lb.to_string(),
                reason: format!("wrong sign for {}", source.name()),
            });
        }
    }

    Ok(())
}
