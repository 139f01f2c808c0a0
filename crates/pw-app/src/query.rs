//! Query helpers over stored runs.

use pw_results::{EventRecord, TelemetryRecord};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub time_range: (f64, f64),
    pub record_count: usize,
    pub final_mode: String,
    pub variable_count: usize,
}

pub fn get_run_summary(records: &[TelemetryRecord]) -> AppResult<RunSummary> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    };

    Ok(RunSummary {
        time_range: (first.time_s, last.time_s),
        record_count: records.len(),
        final_mode: format!("{}/{}", last.regime, last.bubble_phase),
        variable_count: first.values.len(),
    })
}

/// Variable names present in the first record.
pub fn list_variables(records: &[TelemetryRecord]) -> Vec<String> {
    records
        .first()
        .map(|r| r.values.keys().cloned().collect())
        .unwrap_or_default()
}

/// `(time_s, value)` pairs for one variable.
pub fn extract_series(records: &[TelemetryRecord], variable: &str) -> AppResult<Vec<(f64, f64)>> {
    let series: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| r.values.get(variable).map(|v| (r.time_s, *v)))
        .collect();

    if series.is_empty() && !records.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Unknown variable: {}",
            variable
        )));
    }
    Ok(series)
}

/// Time of the first record in each plant mode, in order of appearance.
pub fn mode_timeline(records: &[TelemetryRecord]) -> Vec<(f64, String)> {
    let mut timeline: Vec<(f64, String)> = Vec::new();
    for record in records {
        let mode = format!("{}/{}", record.regime, record.bubble_phase);
        if timeline.last().is_none_or(|(_, last)| *last != mode) {
            timeline.push((record.time_s, mode));
        }
    }
    timeline
}

fn severity_rank(severity: &str) -> Option<u8> {
    match severity.to_ascii_uppercase().as_str() {
        "INFO" => Some(0),
        "ACTION" => Some(1),
        "ALERT" => Some(2),
        "ALARM" => Some(3),
        _ => None,
    }
}

/// Events at or above `min_severity` (INFO, ACTION, ALERT, ALARM).
pub fn filter_events<'a>(
    events: &'a [EventRecord],
    min_severity: &str,
) -> AppResult<Vec<&'a EventRecord>> {
    let min = severity_rank(min_severity).ok_or_else(|| {
        AppError::InvalidInput(format!("Unknown severity: {}", min_severity))
    })?;
    Ok(events
        .iter()
        .filter(|e| severity_rank(&e.severity).is_some_and(|r| r >= min))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(time_s: f64, regime: &str, phase: &str, pressure: f64) -> TelemetryRecord {
        let mut values = BTreeMap::new();
        values.insert("pressure_psia".to_string(), pressure);
        TelemetryRecord {
            tick: time_s as u64,
            time_s,
            regime: regime.to_string(),
            bubble_phase: phase.to_string(),
            values,
        }
    }

    #[test]
    fn series_and_summary() {
        let records = vec![
            record(0.0, "ColdShutdown", "Solid", 14.7),
            record(60.0, "SolidHeatup", "Solid", 300.0),
            record(120.0, "SolidHeatup", "Solid", 365.0),
        ];
        let series = extract_series(&records, "pressure_psia").unwrap();
        assert_eq!(series, vec![(0.0, 14.7), (60.0, 300.0), (120.0, 365.0)]);
        assert!(extract_series(&records, "nope").is_err());

        let summary = get_run_summary(&records).unwrap();
        assert_eq!(summary.time_range, (0.0, 120.0));
        assert_eq!(summary.final_mode, "SolidHeatup/Solid");
        assert_eq!(list_variables(&records), vec!["pressure_psia".to_string()]);

        let timeline = mode_timeline(&records);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[1], (60.0, "SolidHeatup/Solid".to_string()));
    }

    #[test]
    fn empty_run_has_no_summary() {
        assert!(get_run_summary(&[]).is_err());
        assert!(extract_series(&[], "pressure_psia").unwrap().is_empty());
    }

    #[test]
    fn severity_filter() {
        let events: Vec<EventRecord> = ["INFO", "ACTION", "ALERT", "ALARM"]
            .iter()
            .enumerate()
            .map(|(i, s)| EventRecord {
                tick: i as u64,
                sim_time_s: i as f64,
                severity: s.to_string(),
                message: String::new(),
            })
            .collect();
        assert_eq!(filter_events(&events, "info").unwrap().len(), 4);
        assert_eq!(filter_events(&events, "ALERT").unwrap().len(), 2);
        assert!(filter_events(&events, "loud").is_err());
    }
}
