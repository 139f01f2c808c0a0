//! On-disk run cache.
//!
//! Each run gets its own directory under the store root holding the
//! manifest as pretty JSON and the telemetry and event log as JSON lines.

use crate::types::{EventRecord, RunManifest, TelemetryRecord};
use crate::{ResultsError, ResultsResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST: &str = "manifest.json";
const TELEMETRY: &str = "telemetry.jsonl";
const EVENTS: &str = "events.jsonl";

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store kept beside the scenario file in `.heatup/runs`.
    pub fn for_scenario(scenario_path: &Path) -> ResultsResult<Self> {
        let Some(scenario_dir) = scenario_path.parent() else {
            return Err(ResultsError::InvalidPath {
                message: format!("{} has no parent directory", scenario_path.display()),
            });
        };
        Self::new(scenario_dir.join(".heatup").join("runs"))
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).is_file()
    }

    /// Writes the telemetry and event log before the manifest, so a run
    /// interrupted mid-save is not reported by [`RunStore::has_run`].
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[TelemetryRecord],
        events: &[EventRecord],
    ) -> ResultsResult<()> {
        let dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&dir)?;
        write_jsonl(&dir.join(TELEMETRY), records)?;
        write_jsonl(&dir.join(EVENTS), events)?;
        fs::write(dir.join(MANIFEST), serde_json::to_string_pretty(manifest)?)?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_dir(run_id).join(MANIFEST);
        if !path.is_file() {
            return Err(not_found(run_id));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_telemetry(&self, run_id: &str) -> ResultsResult<Vec<TelemetryRecord>> {
        read_jsonl(&self.run_dir(run_id).join(TELEMETRY), run_id)
    }

    pub fn load_events(&self, run_id: &str) -> ResultsResult<Vec<EventRecord>> {
        read_jsonl(&self.run_dir(run_id).join(EVENTS), run_id)
    }

    /// Runs of one scenario, oldest first. Directories without a readable
    /// manifest are skipped.
    pub fn list_runs(&self, scenario_id: &str) -> ResultsResult<Vec<RunManifest>> {
        if !self.root_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().into_owned();
            match self.load_manifest(&run_id) {
                Ok(manifest) if manifest.scenario_id == scenario_id => runs.push(manifest),
                _ => {}
            }
        }
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let dir = self.run_dir(run_id);
        if dir.is_dir() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

fn not_found(run_id: &str) -> ResultsError {
    ResultsError::RunNotFound {
        run_id: run_id.to_string(),
    }
}

fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> ResultsResult<()> {
    let mut content = String::with_capacity(rows.len() * 256);
    for row in rows {
        content.push_str(&serde_json::to_string(row)?);
        content.push('\n');
    }
    Ok(fs::write(path, content)?)
}

fn read_jsonl<T: DeserializeOwned>(path: &Path, run_id: &str) -> ResultsResult<Vec<T>> {
    if !path.is_file() {
        return Err(not_found(run_id));
    }
    fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(ResultsError::from))
        .collect()
}
