//! dispatch-store: file-backed storage for the assignment engine.
//!
//! Users/tasks/results live as CSV tables, progress as a keyed JSON mapping,
//! the model as an opaque blob — all under one data directory, every write
//! atomic (temp-file-then-rename). Missing files load as empty state.

pub mod artifact;
pub mod atomic;
pub mod progress_file;
pub mod tables;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use dispatch_core::{ProgressRecord, ResultRecord, Storage, Task, User};

pub const USERS_FILE: &str = "users.csv";
pub const TASKS_FILE: &str = "tasks.csv";
pub const RESULTS_FILE: &str = "results.csv";
pub const PROGRESS_FILE: &str = "task_progress.json";
pub const MODEL_FILE: &str = "assignment_model.json";

/// Default data directory: ~/.dispatch
pub fn dispatch_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".dispatch"))
}

/// `Storage` backend over a single data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating the directory if needed).
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl Storage for FileStorage {
    fn load_users(&self) -> Result<Vec<User>> {
        tables::read_table(&self.path(USERS_FILE))
    }

    fn save_users(&self, users: &[User]) -> Result<()> {
        tables::write_table(&self.path(USERS_FILE), users)
    }

    fn load_tasks(&self) -> Result<Vec<Task>> {
        tables::read_table(&self.path(TASKS_FILE))
    }

    fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        tables::write_table(&self.path(TASKS_FILE), tasks)
    }

    fn load_results(&self) -> Result<Vec<ResultRecord>> {
        tables::read_table(&self.path(RESULTS_FILE))
    }

    fn save_results(&self, results: &[ResultRecord]) -> Result<()> {
        tables::write_table(&self.path(RESULTS_FILE), results)
    }

    fn load_progress(&self) -> Result<Vec<ProgressRecord>> {
        progress_file::read_progress(&self.path(PROGRESS_FILE))
    }

    fn save_progress(&self, records: &[ProgressRecord]) -> Result<()> {
        progress_file::write_progress(&self.path(PROGRESS_FILE), records)
    }

    fn load_model(&self) -> Result<Option<Vec<u8>>> {
        artifact::read_model(&self.path(MODEL_FILE))
    }

    fn save_model(&self, blob: &[u8]) -> Result<()> {
        artifact::write_model(&self.path(MODEL_FILE), blob)
    }
}
