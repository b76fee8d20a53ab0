//! Progress table as a keyed JSON mapping.
//!
//! On-disk key is "{task_id}_{user_id}" — the format the engine's historical
//! data files use. Keys are redundant with the record fields; on load we
//! trust the fields.

use anyhow::{Context, Result};
use dispatch_core::ProgressRecord;
use std::collections::BTreeMap;
use std::path::Path;

use crate::atomic::write_atomic;

pub fn progress_key(task_id: u32, user_id: u32) -> String {
    format!("{task_id}_{user_id}")
}

pub fn read_progress(path: &Path) -> Result<Vec<ProgressRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let map: BTreeMap<String, ProgressRecord> =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    Ok(map.into_values().collect())
}

pub fn write_progress(path: &Path, records: &[ProgressRecord]) -> Result<()> {
    let map: BTreeMap<String, &ProgressRecord> = records
        .iter()
        .map(|r| (progress_key(r.task_id, r.user_id), r))
        .collect();
    let json = serde_json::to_string_pretty(&map).context("encode progress table")?;
    write_atomic(path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dispatch_core::{ProgressStatus, ProgressUpdate};

    fn record(task_id: u32, user_id: u32) -> ProgressRecord {
        ProgressRecord {
            task_id,
            user_id,
            user_name: "Ava".to_string(),
            task_kind: "Design".to_string(),
            complexity: 0.5,
            deadline: 10.0,
            status: ProgressStatus::InProgress,
            start_time: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            updates: vec![ProgressUpdate {
                timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
                progress_percent: 40,
                notes: "wireframes".to_string(),
            }],
            completion_time: None,
            reported_time_taken: None,
            actual_duration: None,
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_progress(&dir.path().join("p.json")).unwrap().is_empty());
    }

    #[test]
    fn round_trip_keeps_records_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task_progress.json");
        let records = vec![record(1, 1), record(2, 1)];
        write_progress(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"1_1\""));
        assert!(text.contains("\"in_progress\""));

        let back = read_progress(&path).unwrap();
        assert_eq!(back, records);
    }
}
