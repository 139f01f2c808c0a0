//! Scenario version migration.

use crate::ScenarioError;
use crate::schema::Scenario;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut scenario: Scenario) -> Result<Scenario, ScenarioError> {
    while scenario.version < LATEST_VERSION {
        scenario = migrate_one_version(scenario)?;
    }
    Ok(scenario)
}

fn migrate_one_version(scenario: Scenario) -> Result<Scenario, ScenarioError> {
    match scenario.version {
        0 => migrate_v0_to_v1(scenario),
        v => Err(ScenarioError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files predate forensics output; dumps stayed in memory.
fn migrate_v0_to_v1(mut scenario: Scenario) -> Result<Scenario, ScenarioError> {
    scenario.plant.forensics.output_dir = None;
    scenario.version = 1;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v0_upgrades() {
        let mut scenario = Scenario::new("old");
        scenario.version = 0;
        scenario.plant.forensics.output_dir = Some("/tmp/x".to_string());
        let migrated = migrate_to_latest(scenario).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert_eq!(migrated.plant.forensics.output_dir, None);
    }
}
