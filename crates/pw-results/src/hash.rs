//! Content-based hashing for run ids.

use pw_scenario::Scenario;
use sha2::{Digest, Sha256};

/// SHA-256 over the scenario JSON and the engine version.
pub fn compute_run_id(scenario: &Scenario, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let scenario_json = serde_json::to_string(scenario).unwrap_or_default();
    hasher.update(scenario_json.as_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_stability() {
        let scenario = Scenario::new("Test");
        let hash1 = compute_run_id(&scenario, "v1");
        let hash2 = compute_run_id(&scenario, "v1");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let scenario = Scenario::new("Test");
        let mut slower = scenario.clone();
        slower.plant.time.dt_s = 1.0;

        assert_ne!(
            compute_run_id(&scenario, "v1"),
            compute_run_id(&slower, "v1")
        );
        assert_ne!(
            compute_run_id(&scenario, "v1"),
            compute_run_id(&scenario, "v2")
        );
    }
}
