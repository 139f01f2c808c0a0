//! pw-scenario: heat-up scenario files.
//!
//! Scenarios are YAML or JSON. Every load migrates older schema versions
//! forward and validates before handing the scenario out.

pub mod migrate;
pub mod schema;
pub mod validate;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_scenario};

use std::path::Path;

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("scenario rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("cannot migrate scenario: {what}")]
    Migration { what: String },

    #[error("scenario file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad scenario YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("bad scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` is JSON, anything else is read as YAML.
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    fn parse(self, text: &str) -> ScenarioResult<Scenario> {
        Ok(match self {
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Json => serde_json::from_str(text)?,
        })
    }

    fn render(self, scenario: &Scenario) -> ScenarioResult<String> {
        Ok(match self {
            Format::Yaml => serde_yaml::to_string(scenario)?,
            Format::Json => serde_json::to_string_pretty(scenario)?,
        })
    }
}

fn read(path: &Path, format: Format) -> ScenarioResult<Scenario> {
    let scenario = migrate_to_latest(format.parse(&std::fs::read_to_string(path)?)?)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

fn write(path: &Path, scenario: &Scenario, format: Format) -> ScenarioResult<()> {
    validate_scenario(scenario)?;
    std::fs::write(path, format.render(scenario)?)?;
    Ok(())
}

/// Load a scenario, picking the format from the file extension.
pub fn load(path: &Path) -> ScenarioResult<Scenario> {
    read(path, Format::of(path))
}

pub fn load_yaml(path: &Path) -> ScenarioResult<Scenario> {
    read(path, Format::Yaml)
}

pub fn load_json(path: &Path) -> ScenarioResult<Scenario> {
    read(path, Format::Json)
}

/// Validate and write a scenario, picking the format from the extension.
pub fn save(path: &Path, scenario: &Scenario) -> ScenarioResult<()> {
    write(path, scenario, Format::of(path))
}

pub fn save_yaml(path: &Path, scenario: &Scenario) -> ScenarioResult<()> {
    write(path, scenario, Format::Yaml)
}

pub fn save_json(path: &Path, scenario: &Scenario) -> ScenarioResult<()> {
    write(path, scenario, Format::Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_picks_format() {
        assert_eq!(Format::of(Path::new("a/heatup.json")), Format::Json);
        assert_eq!(Format::of(Path::new("a/heatup.JSON")), Format::Json);
        assert_eq!(Format::of(Path::new("a/heatup.yaml")), Format::Yaml);
        assert_eq!(Format::of(Path::new("a/heatup")), Format::Yaml);
    }
}
