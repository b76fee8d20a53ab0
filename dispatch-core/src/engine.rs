//! Engine facade: one context object owning the dataset, the scorer, and the
//! progress tracker, wired to a storage backend.
//!
//! Lifecycle is load-or-default on `open` and save-on-mutation afterwards.
//! Every operation validates before it mutates; if the durable write then
//! fails, the in-memory mutation is rolled back so memory and disk never
//! drift apart silently.
//!
//! Single-threaded by design: operations run to completion one at a time;
//! `retrain` is synchronous and proportional to the result log.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::error::EngineError;
use crate::features::build_training_set;
use crate::policy::{Assignment, pick_best};
use crate::progress::{ProgressRecord, ProgressStatus, ProgressTracker};
use crate::record::{
    ResultRecord, Task, User, validate_result_fields, validate_task_fields, validate_user_name,
};
use crate::scorer::Scorer;
use crate::stats::{DashboardSnapshot, snapshot};
use crate::store::Store;

/// Durable I/O the engine needs. Loads of missing data must come back empty
/// (or `None` for the model), not as errors; saves must be atomic per file.
pub trait Storage {
    fn load_users(&self) -> Result<Vec<User>>;
    fn save_users(&self, users: &[User]) -> Result<()>;

    fn load_tasks(&self) -> Result<Vec<Task>>;
    fn save_tasks(&self, tasks: &[Task]) -> Result<()>;

    fn load_results(&self) -> Result<Vec<ResultRecord>>;
    fn save_results(&self, results: &[ResultRecord]) -> Result<()>;

    fn load_progress(&self) -> Result<Vec<ProgressRecord>>;
    fn save_progress(&self, records: &[ProgressRecord]) -> Result<()>;

    fn load_model(&self) -> Result<Option<Vec<u8>>>;
    fn save_model(&self, blob: &[u8]) -> Result<()>;
}

/// Analytics payload returned when a result is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSummary {
    pub user_name: String,
    pub task_kind: String,
    pub time_taken: f64,
    pub quality: u8,
    /// Wall-clock hours from assignment to completion, when the pair was
    /// being tracked.
    pub actual_duration: Option<f64>,
    /// Percent margin vs the task's deadline budget; positive = under.
    pub deadline_margin_percent: f64,
}

pub struct Engine<S: Storage> {
    storage: S,
    store: Store,
    tracker: ProgressTracker,
    scorer: Scorer,
}

impl<S: Storage> Engine<S> {
    /// Load everything the backend has, defaulting to empty collections and
    /// an untrained scorer. A missing model artifact is not an error; a
    /// corrupt one is.
    pub fn open(storage: S) -> Result<Self, EngineError> {
        Self::open_with_scorer(storage, Scorer::new())
    }

    /// As `open`, with a caller-supplied scorer (tests seed the cold-start
    /// rng through this).
    pub fn open_with_scorer(storage: S, mut scorer: Scorer) -> Result<Self, EngineError> {
        let store = Store::new(
            storage.load_users()?,
            storage.load_tasks()?,
            storage.load_results()?,
        );
        let tracker = ProgressTracker::from_records(storage.load_progress()?);
        if let Some(blob) = storage.load_model()? {
            scorer.load_artifact(&blob)?;
        }
        Ok(Self {
            storage,
            store,
            tracker,
            scorer,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.store.users
    }

    pub fn tasks(&self) -> &[Task] {
        &self.store.tasks
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.store.results
    }

    pub fn progress(&self, task_id: u32, user_id: u32) -> Option<&ProgressRecord> {
        self.tracker.get(task_id, user_id)
    }

    pub fn is_trained(&self) -> bool {
        self.scorer.is_trained()
    }

    pub fn add_user(&mut self, name: &str) -> Result<User, EngineError> {
        validate_user_name(name)?;
        let user = self.store.add_user(name);
        if let Err(e) = self.storage.save_users(&self.store.users) {
            self.store.users.pop();
            return Err(e.into());
        }
        Ok(user)
    }

    pub fn remove_user(&mut self, user_id: u32) -> Result<User, EngineError> {
        if self.store.user(user_id).is_none() {
            return Err(EngineError::not_found("user", user_id));
        }
        let prev_users = self.store.users.clone();
        let prev_results = self.store.results.clone();
        let prev_tracker = self.tracker.clone();

        let user = self
            .store
            .remove_user(user_id)
            .ok_or_else(|| EngineError::not_found("user", user_id))?;
        self.tracker.remove_user(user_id);

        if let Err(e) = self.persist_entities() {
            self.store.users = prev_users;
            self.store.results = prev_results;
            self.tracker = prev_tracker;
            return Err(e.into());
        }
        Ok(user)
    }

    pub fn add_task(
        &mut self,
        kind: &str,
        complexity: f64,
        deadline: f64,
    ) -> Result<Task, EngineError> {
        validate_task_fields(kind, complexity, deadline)?;
        let task = self.store.add_task(kind, complexity, deadline);
        if let Err(e) = self.storage.save_tasks(&self.store.tasks) {
            self.store.tasks.pop();
            return Err(e.into());
        }
        Ok(task)
    }

    pub fn remove_task(&mut self, task_id: u32) -> Result<Task, EngineError> {
        if self.store.task(task_id).is_none() {
            return Err(EngineError::not_found("task", task_id));
        }
        let prev_tasks = self.store.tasks.clone();
        let prev_results = self.store.results.clone();
        let prev_tracker = self.tracker.clone();

        let task = self
            .store
            .remove_task(task_id)
            .ok_or_else(|| EngineError::not_found("task", task_id))?;
        self.tracker.remove_task(task_id);

        if let Err(e) = self.persist_entities() {
            self.store.tasks = prev_tasks;
            self.store.results = prev_results;
            self.tracker = prev_tracker;
            return Err(e.into());
        }
        Ok(task)
    }

    /// Assign one task to its best-scoring eligible user. `Ok(None)` means
    /// no user is eligible (everyone already has a result for it).
    pub fn assign(&mut self, task_id: u32) -> Result<Option<Assignment>, EngineError> {
        if self.store.users.is_empty() {
            return Err(EngineError::InsufficientData("no users to assign to"));
        }
        let task = self
            .store
            .task(task_id)
            .ok_or_else(|| EngineError::not_found("task", task_id))?
            .clone();

        let Some(assignment) = pick_best(&self.store, &mut self.scorer, &task) else {
            return Ok(None);
        };

        let prev_tracker = self.tracker.clone();
        let user = self
            .store
            .user(assignment.user_id)
            .ok_or_else(|| EngineError::not_found("user", assignment.user_id))?
            .clone();
        self.tracker.start(&task, &user, Utc::now());

        if let Err(e) = self.storage.save_progress(&self.progress_records()) {
            self.tracker = prev_tracker;
            return Err(e.into());
        }
        Ok(Some(assignment))
    }

    /// Assign every unresolved task: skips tasks that already have any
    /// recorded result and tasks with an active assignment for any user.
    /// Returns one entry per task attempted.
    pub fn assign_all_pending(&mut self) -> Result<Vec<(u32, Option<Assignment>)>, EngineError> {
        if self.store.users.is_empty() {
            return Err(EngineError::InsufficientData("no users to assign to"));
        }
        let pending: Vec<u32> = self
            .store
            .tasks
            .iter()
            .map(|t| t.task_id)
            .filter(|&id| !self.store.task_has_result(id) && !self.tracker.task_is_active(id))
            .collect();

        let mut out = Vec::with_capacity(pending.len());
        for task_id in pending {
            let assignment = self.assign(task_id)?;
            out.push((task_id, assignment));
        }
        Ok(out)
    }

    /// Append a progress report for a tracked assignment.
    pub fn record_progress(
        &mut self,
        task_id: u32,
        user_id: u32,
        percent: u8,
        notes: &str,
    ) -> Result<ProgressStatus, EngineError> {
        if percent > 100 {
            return Err(EngineError::Validation(format!(
                "progress percent must be 0..=100, got {percent}"
            )));
        }
        let prev_tracker = self.tracker.clone();
        let Some(status) = self.tracker.update(task_id, user_id, percent, notes, Utc::now()) else {
            return Err(EngineError::not_found(
                "progress record",
                format!("(task {task_id}, user {user_id})"),
            ));
        };
        if let Err(e) = self.storage.save_progress(&self.progress_records()) {
            self.tracker = prev_tracker;
            return Err(e.into());
        }
        Ok(status)
    }

    /// Record a completion outcome: appends to the result log and completes
    /// the matching progress record if one exists (a result for an untracked
    /// pair is accepted and leaves the tracker alone).
    pub fn record_result(
        &mut self,
        task_id: u32,
        user_id: u32,
        time_taken: f64,
        quality: u8,
    ) -> Result<CompletionSummary, EngineError> {
        validate_result_fields(time_taken, quality)?;
        let task = self
            .store
            .task(task_id)
            .ok_or_else(|| EngineError::not_found("task", task_id))?
            .clone();
        let user = self
            .store
            .user(user_id)
            .ok_or_else(|| EngineError::not_found("user", user_id))?
            .clone();

        let prev_results = self.store.results.clone();
        let prev_tracker = self.tracker.clone();

        self.store.push_result(ResultRecord {
            task_id,
            user_id,
            time_taken,
            quality,
        });
        let actual_duration = self
            .tracker
            .complete_from_result(task_id, user_id, time_taken, Utc::now())
            .and_then(|r| r.actual_duration);

        let persisted = self
            .storage
            .save_results(&self.store.results)
            .and_then(|()| self.storage.save_progress(&self.progress_records()));
        if let Err(e) = persisted {
            self.store.results = prev_results;
            self.tracker = prev_tracker;
            return Err(e.into());
        }

        Ok(CompletionSummary {
            user_name: user.name,
            task_kind: task.kind,
            time_taken,
            quality,
            actual_duration,
            deadline_margin_percent: (task.deadline - time_taken) / task.deadline * 100.0,
        })
    }

    /// Refit the model on the current result log and persist the artifact.
    /// Returns the number of training samples.
    pub fn retrain(&mut self) -> Result<usize, EngineError> {
        let Some(set) = build_training_set(&self.store) else {
            return Err(EngineError::InsufficientData(
                "no completed results to train on",
            ));
        };
        let prev_scorer = self.scorer.clone();
        self.scorer.train(&set);

        let blob = match self
            .scorer
            .to_artifact()
            .and_then(|blob| blob.context("scorer produced no artifact after training"))
        {
            Ok(blob) => blob,
            Err(e) => {
                self.scorer = prev_scorer;
                return Err(e.into());
            }
        };
        if let Err(e) = self.storage.save_model(&blob) {
            self.scorer = prev_scorer;
            return Err(e.into());
        }
        Ok(set.len())
    }

    /// Pure projection over the current state; mutates nothing.
    pub fn dashboard(&self) -> DashboardSnapshot {
        snapshot(
            &self.store,
            &self.tracker,
            self.scorer.is_trained(),
            Utc::now(),
        )
    }

    fn progress_records(&self) -> Vec<ProgressRecord> {
        self.tracker.records().cloned().collect()
    }

    fn persist_entities(&self) -> Result<()> {
        self.storage.save_users(&self.store.users)?;
        self.storage.save_tasks(&self.store.tasks)?;
        self.storage.save_results(&self.store.results)?;
        self.storage.save_progress(&self.progress_records())?;
        Ok(())
    }
}
