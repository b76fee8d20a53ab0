//! Dashboard projections: pure read paths over the store and tracker.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::progress::{ProgressStatus, ProgressTracker};
use crate::store::Store;

/// Aggregates over the whole result log. Absent until the first result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub completed: usize,
    pub mean_quality: f64,
    pub mean_time_taken: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPerformance {
    pub user_id: u32,
    pub user_name: String,
    pub tasks_done: usize,
    pub mean_quality: f64,
    pub mean_time_taken: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkillLevel {
    Expert,
    Good,
    Learning,
}

impl SkillLevel {
    /// Expert at mean quality >= 4, Good at >= 3, Learning below.
    fn from_mean_quality(q: f64) -> Self {
        if q >= 4.0 {
            Self::Expert
        } else if q >= 3.0 {
            Self::Good
        } else {
            Self::Learning
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expert => "Expert",
            Self::Good => "Good",
            Self::Learning => "Learning",
        }
    }
}

/// Discovered skill bucket: one per (user, task kind) with history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillEntry {
    pub user_id: u32,
    pub user_name: String,
    pub task_kind: String,
    pub tasks_done: usize,
    pub mean_quality: f64,
    pub mean_time_taken: f64,
    pub level: SkillLevel,
}

/// An unresolved assignment, for the "active tasks" listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveAssignment {
    pub task_id: u32,
    pub user_id: u32,
    pub user_name: String,
    pub task_kind: String,
    pub complexity: f64,
    pub deadline: f64,
    pub status: ProgressStatus,
    pub hours_elapsed: f64,
    pub latest_percent: Option<u8>,
    pub latest_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub totals: Option<Totals>,
    pub user_performance: Vec<UserPerformance>,
    pub skills: Vec<SkillEntry>,
    pub active: Vec<ActiveAssignment>,
    pub model_trained: bool,
}

fn mean(sum: f64, n: usize) -> f64 {
    sum / n as f64
}

pub fn snapshot(
    store: &Store,
    tracker: &ProgressTracker,
    model_trained: bool,
    now: DateTime<Utc>,
) -> DashboardSnapshot {
    let totals = (!store.results.is_empty()).then(|| {
        let n = store.results.len();
        Totals {
            completed: n,
            mean_quality: mean(store.results.iter().map(|r| f64::from(r.quality)).sum(), n),
            mean_time_taken: mean(store.results.iter().map(|r| r.time_taken).sum(), n),
        }
    });

    // Per-user aggregates, in store (ascending id) order.
    let mut user_performance = Vec::new();
    let mut skills = Vec::new();
    for user in &store.users {
        let mine: Vec<_> = store
            .results
            .iter()
            .filter(|r| r.user_id == user.user_id)
            .collect();
        if mine.is_empty() {
            continue;
        }
        user_performance.push(UserPerformance {
            user_id: user.user_id,
            user_name: user.name.clone(),
            tasks_done: mine.len(),
            mean_quality: mean(mine.iter().map(|r| f64::from(r.quality)).sum(), mine.len()),
            mean_time_taken: mean(mine.iter().map(|r| r.time_taken).sum(), mine.len()),
        });

        // Bucket this user's results by task kind (inner join with tasks;
        // results whose task was deleted contribute nothing here).
        let mut kinds: Vec<String> = Vec::new();
        for r in &mine {
            if let Some(task) = store.task(r.task_id) {
                if !kinds.contains(&task.kind) {
                    kinds.push(task.kind.clone());
                }
            }
        }
        for kind in kinds {
            let bucket: Vec<_> = mine
                .iter()
                .filter(|r| store.task(r.task_id).is_some_and(|t| t.kind == kind))
                .collect();
            let q = mean(
                bucket.iter().map(|r| f64::from(r.quality)).sum(),
                bucket.len(),
            );
            skills.push(SkillEntry {
                user_id: user.user_id,
                user_name: user.name.clone(),
                task_kind: kind,
                tasks_done: bucket.len(),
                mean_quality: q,
                mean_time_taken: mean(bucket.iter().map(|r| r.time_taken).sum(), bucket.len()),
                level: SkillLevel::from_mean_quality(q),
            });
        }
    }

    let active = tracker
        .records()
        .filter(|r| r.status.is_active())
        .map(|r| {
            let latest = r.updates.last();
            ActiveAssignment {
                task_id: r.task_id,
                user_id: r.user_id,
                user_name: r.user_name.clone(),
                task_kind: r.task_kind.clone(),
                complexity: r.complexity,
                deadline: r.deadline,
                status: r.status,
                hours_elapsed: ((now - r.start_time).num_seconds() as f64 / 3600.0).max(0.0),
                latest_percent: latest.map(|u| u.progress_percent),
                latest_notes: latest
                    .filter(|u| !u.notes.is_empty())
                    .map(|u| u.notes.clone()),
            }
        })
        .collect();

    DashboardSnapshot {
        totals,
        user_performance,
        skills,
        active,
        model_trained,
    }
}
