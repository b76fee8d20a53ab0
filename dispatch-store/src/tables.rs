//! CSV tables for users, tasks, and results.
//!
//! Records serialize flat through serde, so the CSV headers are exactly the
//! struct field names. A missing file reads as an empty table.

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

use crate::atomic::write_atomic;

pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record.with_context(|| format!("parse {}", path.display()))?);
    }
    Ok(rows)
}

pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("encode row for {}", path.display()))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush csv for {}", path.display()))?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::{Task, User};

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<User> = read_table(&dir.path().join("users.csv")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn users_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        let users = vec![
            User {
                user_id: 1,
                name: "Ava".to_string(),
            },
            User {
                user_id: 2,
                name: "Ben, Jr.".to_string(), // comma must survive quoting
            },
        ];
        write_table(&path, &users).unwrap();
        let back: Vec<User> = read_table(&path).unwrap();
        assert_eq!(back, users);
    }

    #[test]
    fn tasks_round_trip_with_float_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.csv");
        let tasks = vec![Task {
            task_id: 1,
            kind: "Design".to_string(),
            complexity: 0.5,
            deadline: 10.0,
        }];
        write_table(&path, &tasks).unwrap();
        let back: Vec<Task> = read_table(&path).unwrap();
        assert_eq!(back, tasks);
    }

    #[test]
    fn malformed_row_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.csv");
        std::fs::write(&path, "task_id,kind,complexity,deadline\nnope,Design,0.5,10\n").unwrap();
        assert!(read_table::<Task>(&path).is_err());
    }
}
