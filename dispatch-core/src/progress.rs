//! Per-assignment progress tracking.
//!
//! One record per (task_id, user_id) key, created at assignment time with a
//! snapshot of the task's metadata (so later task edits or deletions do not
//! rewrite history). Status advances assigned -> in_progress -> completed and
//! never regresses: once completed the record is frozen, though updates keep
//! appending to the history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::{Task, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Assigned,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// One timestamped progress report. History is append-only; entries are
/// never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub timestamp: DateTime<Utc>,
    pub progress_percent: u8,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub task_id: u32,
    pub user_id: u32,
    pub user_name: String,

    // Task snapshot at assignment time.
    pub task_kind: String,
    pub complexity: f64,
    pub deadline: f64,

    pub status: ProgressStatus,
    pub start_time: DateTime<Utc>,
    pub updates: Vec<ProgressUpdate>,
    pub completion_time: Option<DateTime<Utc>>,

    /// Hours reported by the caller when the result was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_time_taken: Option<f64>,
    /// Wall-clock hours from start to completion. May differ from
    /// `reported_time_taken`; both are kept for analytics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<f64>,
}

impl ProgressRecord {
    fn complete_at(&mut self, at: DateTime<Utc>) {
        self.status = ProgressStatus::Completed;
        self.completion_time = Some(at);
        let hours = (at - self.start_time).num_seconds() as f64 / 3600.0;
        self.actual_duration = Some(hours.max(0.0));
    }
}

/// Keyed map of progress records. BTreeMap keeps iteration order (and thus
/// persisted output and dashboard listings) deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressTracker {
    records: BTreeMap<(u32, u32), ProgressRecord>,
}

impl ProgressTracker {
    pub fn from_records(records: Vec<ProgressRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| ((r.task_id, r.user_id), r))
                .collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    pub fn get(&self, task_id: u32, user_id: u32) -> Option<&ProgressRecord> {
        self.records.get(&(task_id, user_id))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if any user holds an unfinished record for this task.
    pub fn task_is_active(&self, task_id: u32) -> bool {
        self.records
            .values()
            .any(|r| r.task_id == task_id && r.status.is_active())
    }

    /// Begin tracking a fresh assignment. Replaces any previous record for
    /// the key (a re-assignment starts a new attempt).
    pub fn start(&mut self, task: &Task, user: &User, now: DateTime<Utc>) {
        let record = ProgressRecord {
            task_id: task.task_id,
            user_id: user.user_id,
            user_name: user.name.clone(),
            task_kind: task.kind.clone(),
            complexity: task.complexity,
            deadline: task.deadline,
            status: ProgressStatus::Assigned,
            start_time: now,
            updates: Vec::new(),
            completion_time: None,
            reported_time_taken: None,
            actual_duration: None,
        };
        self.records.insert((task.task_id, user.user_id), record);
    }

    /// Append a progress report and advance status. Returns the status after
    /// the update, or `None` when no record exists for the key.
    ///
    /// A completed record stays completed: the update is still appended to
    /// the history, but status and completion_time are frozen.
    pub fn update(
        &mut self,
        task_id: u32,
        user_id: u32,
        percent: u8,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Option<ProgressStatus> {
        let record = self.records.get_mut(&(task_id, user_id))?;
        record.updates.push(ProgressUpdate {
            timestamp: now,
            progress_percent: percent,
            notes: notes.to_string(),
        });
        if record.status != ProgressStatus::Completed {
            if percent >= 100 {
                record.complete_at(now);
            } else {
                record.status = ProgressStatus::InProgress;
            }
        }
        Some(record.status)
    }

    /// Mark the key completed because a result was recorded for it. No-op
    /// when no record exists (a result may legitimately arrive for work that
    /// was never tracked). Already-completed records only gain the reported
    /// time; their completion_time stays put.
    pub fn complete_from_result(
        &mut self,
        task_id: u32,
        user_id: u32,
        time_taken: f64,
        now: DateTime<Utc>,
    ) -> Option<&ProgressRecord> {
        let record = self.records.get_mut(&(task_id, user_id))?;
        record.reported_time_taken = Some(time_taken);
        if record.status != ProgressStatus::Completed {
            record.complete_at(now);
        }
        Some(&*record)
    }

    /// Cascade: drop every record referencing the user.
    pub fn remove_user(&mut self, user_id: u32) {
        self.records.retain(|&(_, u), _| u != user_id);
    }

    /// Cascade: drop every record referencing the task.
    pub fn remove_task(&mut self, task_id: u32) {
        self.records.retain(|&(t, _), _| t != task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn task() -> Task {
        Task {
            task_id: 1,
            kind: "Design".to_string(),
            complexity: 0.5,
            deadline: 10.0,
        }
    }

    fn user() -> User {
        User {
            user_id: 1,
            name: "Ava".to_string(),
        }
    }

    fn tracker_with_one() -> ProgressTracker {
        let mut t = ProgressTracker::default();
        t.start(&task(), &user(), now());
        t
    }

    #[test]
    fn starts_assigned_with_empty_history() {
        let t = tracker_with_one();
        let r = t.get(1, 1).unwrap();
        assert_eq!(r.status, ProgressStatus::Assigned);
        assert!(r.updates.is_empty());
        assert!(r.completion_time.is_none());
        assert_eq!(r.task_kind, "Design");
    }

    #[test]
    fn partial_update_moves_to_in_progress() {
        let mut t = tracker_with_one();
        let status = t.update(1, 1, 40, "halfway-ish", now()).unwrap();
        assert_eq!(status, ProgressStatus::InProgress);
        assert_eq!(t.get(1, 1).unwrap().updates.len(), 1);
    }

    #[test]
    fn hundred_percent_completes() {
        let mut t = tracker_with_one();
        let later = now() + chrono::Duration::hours(2);
        let status = t.update(1, 1, 100, "", later).unwrap();
        assert_eq!(status, ProgressStatus::Completed);

        let r = t.get(1, 1).unwrap();
        assert_eq!(r.completion_time, Some(later));
        assert!((r.actual_duration.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn completed_status_is_frozen() {
        let mut t = tracker_with_one();
        t.update(1, 1, 100, "", now());
        let completion = t.get(1, 1).unwrap().completion_time;

        // A late lower-percent report appends but cannot regress status.
        let status = t.update(1, 1, 50, "late report", now()).unwrap();
        assert_eq!(status, ProgressStatus::Completed);
        let r = t.get(1, 1).unwrap();
        assert_eq!(r.completion_time, completion);
        assert_eq!(r.updates.len(), 2);
    }

    #[test]
    fn update_unknown_key_is_none() {
        let mut t = tracker_with_one();
        assert!(t.update(1, 2, 10, "", now()).is_none());
        assert!(t.update(9, 1, 10, "", now()).is_none());
    }

    #[test]
    fn result_completion_sets_both_durations() {
        let mut t = tracker_with_one();
        t.update(1, 1, 40, "", now());

        let later = now() + chrono::Duration::minutes(90);
        let r = t.complete_from_result(1, 1, 8.0, later).unwrap();
        assert_eq!(r.status, ProgressStatus::Completed);
        assert_eq!(r.reported_time_taken, Some(8.0));
        assert!((r.actual_duration.unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn result_after_completion_keeps_original_completion_time() {
        let mut t = tracker_with_one();
        let first = now() + chrono::Duration::hours(1);
        t.update(1, 1, 100, "", first);

        let r = t
            .complete_from_result(1, 1, 3.0, now() + chrono::Duration::hours(5))
            .unwrap();
        assert_eq!(r.completion_time, Some(first));
        assert_eq!(r.reported_time_taken, Some(3.0));
    }

    #[test]
    fn cascades_remove_matching_keys() {
        let mut t = tracker_with_one();
        let other = Task {
            task_id: 2,
            ..task()
        };
        t.start(&other, &user(), now());

        t.remove_task(1);
        assert!(t.get(1, 1).is_none());
        assert!(t.get(2, 1).is_some());

        t.remove_user(1);
        assert!(t.is_empty());
    }

    #[test]
    fn task_is_active_only_while_unresolved() {
        let mut t = tracker_with_one();
        assert!(t.task_is_active(1));
        t.update(1, 1, 30, "", now());
        assert!(t.task_is_active(1));
        t.update(1, 1, 100, "", now());
        assert!(!t.task_is_active(1));
    }
}
